//! The `.render(...)` surface on actions.
//!
//! [`RenderActionExt`] adds render rules to an [`Action`] while it is being
//! built. The first rule marks the action render-enabled: its [`RuleSet`]
//! is stored in the action's extensions and a [`RenderStage`] is inserted at
//! the front of the pipeline.
//!
//! ```rust
//! use vista::{RenderActionExt, TemplateSource, When};
//! use vista_dispatch::Action;
//!
//! let action = Action::new("users.show")
//!     .alias("GET", "/users/:id")
//!     .handle(|_| Ok(()))
//!     .render_when("users/show.jinja", When::Success)
//!     .render_when("404.html", 404)
//!     .render_when("error.html", "error")
//!     .render(TemplateSource::dynamic(|intent| Some(format!("{}.jinja", intent.action()))));
//!
//! assert!(action.is_render_enabled());
//! assert_eq!(action.stages()[0].kind(), "render");
//! ```

use std::sync::Arc;

use vista_dispatch::{Action, Intent};

use crate::hook::{AfterRender, RenderStage};
use crate::resolve::{BeforeRender, RENDER_EVENT};
use crate::rules::{IntoWhen, ParseWhenError, RuleSet, TemplateSource, When};

/// Render rule registration for [`Action`].
pub trait RenderActionExt: Sized {
    /// Renders `source` for every outcome not covered by a more specific rule.
    fn render(self, source: impl Into<TemplateSource>) -> Self;

    /// Renders `source` when the outcome matches `when`.
    ///
    /// `when` is a [`When`], a status code, or the text `"success"`,
    /// `"error"` or a decimal status. Unrecognized text is logged and
    /// registers nothing.
    fn render_when(self, source: impl Into<TemplateSource>, when: impl IntoWhen) -> Self;

    /// Observes the template chosen for a request, before it renders.
    fn before_render<F>(self, f: F) -> Self
    where
        F: Fn(&Intent, &BeforeRender) + Send + Sync + 'static;

    /// Observes the render outcome, before the response is produced.
    fn after_render<F>(self, f: F) -> Self
    where
        F: Fn(&Intent, &AfterRender) + Send + Sync + 'static;

    /// Returns true once any render rule was registered.
    fn is_render_enabled(&self) -> bool;

    /// The registered rules.
    fn render_rules(&self) -> Option<&RuleSet>;
}

impl RenderActionExt for Action {
    fn render(self, source: impl Into<TemplateSource>) -> Self {
        add_rule(self, source.into(), Ok(None))
    }

    fn render_when(self, source: impl Into<TemplateSource>, when: impl IntoWhen) -> Self {
        add_rule(self, source.into(), when.into_when().map(Some))
    }

    fn before_render<F>(self, f: F) -> Self
    where
        F: Fn(&Intent, &BeforeRender) + Send + Sync + 'static,
    {
        self.before(RENDER_EVENT, f)
    }

    fn after_render<F>(self, f: F) -> Self
    where
        F: Fn(&Intent, &AfterRender) + Send + Sync + 'static,
    {
        self.after(RENDER_EVENT, f)
    }

    fn is_render_enabled(&self) -> bool {
        self.extensions().contains::<RuleSet>()
    }

    fn render_rules(&self) -> Option<&RuleSet> {
        self.extensions().get::<RuleSet>()
    }
}

fn add_rule(
    mut action: Action,
    source: TemplateSource,
    when: Result<Option<When>, ParseWhenError>,
) -> Action {
    if !action.is_render_enabled() {
        action.extensions_mut().insert(RuleSet::new());
        action.insert_stage(0, Arc::new(RenderStage));
    }

    let name = action.name().to_string();
    match when {
        Ok(when) => {
            if let Some(rules) = action.extensions_mut().get_mut::<RuleSet>() {
                rules.add(&name, source, when);
            }
        }
        Err(err) => {
            tracing::warn!(action = %name, template = ?source, error = %err, "Ignoring render rule");
        }
    }
    action
}
