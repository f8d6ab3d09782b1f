//! Template resolution at finalize time.

use vista_dispatch::{Action, Intent, Phase};

use crate::options::DEFAULT_CHANNEL;
use crate::rules::RuleSet;

/// Name of the lifecycle event fired around rendering.
pub const RENDER_EVENT: &str = "render";

/// Payload of the `before render` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeforeRender {
    /// The template about to be rendered.
    pub template: String,
}

/// Picks the template `action` renders for `intent`.
///
/// Returns `None` when the action has no rules, the intent already carries a
/// raw result, or no rule yields a name. When a template is selected the
/// action's `before render` observers run once with it.
///
/// A panicking dynamic rule is logged on the default channel.
pub fn resolve_template(action: &Action, intent: &Intent) -> Option<String> {
    resolve_for_channel(action, intent, DEFAULT_CHANNEL)
}

/// [`resolve_template`], logging under `channel`.
pub fn resolve_for_channel(action: &Action, intent: &Intent, channel: &str) -> Option<String> {
    let rules = action.extensions().get::<RuleSet>()?;
    let template = rules.select_with(intent, |panic| {
        tracing::error!(
            channel = %channel,
            action = %action.name(),
            panic = %panic.0,
            "Captured a panic in a dynamic render rule"
        );
    })?;

    tracing::trace!(channel = %channel, action = %action.name(), template = %template, "Resolved render template");
    action.events().fire(
        Phase::Before,
        RENDER_EVENT,
        intent,
        &BeforeRender {
            template: template.clone(),
        },
    );
    Some(template)
}
