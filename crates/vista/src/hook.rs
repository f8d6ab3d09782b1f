//! The render step of the request lifecycle.
//!
//! Two pieces cooperate per request:
//!
//! - [`RenderStage`] sits first in every render-enabled action's pipeline
//!   and leaves a [`RenderContext`] record in the request context. Being
//!   first, it runs even when a later handler fails.
//! - [`RenderHook`] is a finalize interceptor. It takes the record, resolves
//!   a template, renders it and rewrites the intent's outcome.
//!
//! # Phases
//!
//! ```text
//! Pending → Resolving → Rendering → Finalizing → Done
//!              │
//!              └─ no template → Done (intent untouched)
//! ```
//!
//! The record is consumed by the hook, so a request resolves at most once.

use std::sync::Arc;

use async_trait::async_trait;
use vista_dispatch::{Action, FinalizeInterceptor, Intent, IntentError, Phase, RequestContext, Stage};
use vista_render::{Locals, Renderer};

use crate::resolve::{resolve_for_channel, RENDER_EVENT};

/// Stage kind of the render stage.
pub const RENDER_STAGE: &str = "render";

/// Where a request is in its render lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RenderPhase {
    /// Pipeline ran; finalize not reached yet.
    Pending,
    /// Choosing a template.
    Resolving,
    /// The renderer is working.
    Rendering,
    /// Notifying `after render` observers.
    Finalizing,
    /// Finished; the host finalize continues.
    Done,
}

/// Per-request render record, stored in [`RequestContext::extensions`].
#[derive(Debug, Clone)]
pub struct RenderContext {
    phase: RenderPhase,
    notify_after: bool,
}

impl RenderContext {
    /// Creates a record in the `Pending` phase.
    pub fn new(notify_after: bool) -> Self {
        Self {
            phase: RenderPhase::Pending,
            notify_after,
        }
    }

    /// The current phase.
    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// Whether `after render` observers must be called.
    pub fn notify_after(&self) -> bool {
        self.notify_after
    }

    fn advance(&mut self, next: RenderPhase, action: &str) {
        debug_assert!(next > self.phase, "render phases only move forward");
        tracing::trace!(action = %action, from = ?self.phase, to = ?next, "Render phase");
        self.phase = next;
    }
}

/// Payload of the `after render` event.
#[derive(Debug, Clone)]
pub struct AfterRender {
    /// The template that was rendered.
    pub template: String,
    /// The rendered HTML, or the error that replaced the intent's error.
    pub outcome: Result<String, IntentError>,
}

/// Pipeline stage that arms the render hook for one request.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderStage;

impl Stage for RenderStage {
    fn kind(&self) -> &str {
        RENDER_STAGE
    }

    fn run(&self, action: &Action, _: &mut Intent, ctx: &mut RequestContext) -> anyhow::Result<()> {
        let notify_after = action.events().has(Phase::After, RENDER_EVENT);
        ctx.extensions.insert(RenderContext::new(notify_after));
        Ok(())
    }
}

/// Finalize interceptor that renders the resolved template.
#[derive(Debug, Clone)]
pub struct RenderHook {
    renderer: Arc<Renderer>,
    channel: String,
}

impl RenderHook {
    /// Creates a hook rendering with `renderer`. `channel` tags log events.
    pub fn new(renderer: Arc<Renderer>, channel: impl Into<String>) -> Self {
        Self {
            renderer,
            channel: channel.into(),
        }
    }

    /// The renderer in use.
    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }
}

#[async_trait]
impl FinalizeInterceptor for RenderHook {
    async fn before_send(&self, action: &Action, intent: &mut Intent, ctx: &mut RequestContext) {
        let Some(mut record) = ctx.extensions.remove::<RenderContext>() else {
            return;
        };

        record.advance(RenderPhase::Resolving, action.name());
        let Some(template) = resolve_for_channel(action, intent, &self.channel) else {
            record.advance(RenderPhase::Done, action.name());
            return;
        };

        record.advance(RenderPhase::Rendering, action.name());
        let outcome = self
            .renderer
            .render(&template, Locals::from(&*intent))
            .await
            .map_err(IntentError::from);

        match &outcome {
            Ok(html) => {
                intent.clear_error();
                intent.set_raw_result(html.as_str());
            }
            Err(err) => {
                tracing::warn!(
                    channel = %self.channel,
                    action = %action.name(),
                    template = %template,
                    error = %err,
                    "Failed to render template"
                );
                intent.set_error(err.clone());
            }
        }

        record.advance(RenderPhase::Finalizing, action.name());
        if record.notify_after() {
            action
                .events()
                .fire(Phase::After, RENDER_EVENT, intent, &AfterRender { template, outcome });
        }
        record.advance(RenderPhase::Done, action.name());
    }
}
