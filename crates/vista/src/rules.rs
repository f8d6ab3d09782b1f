//! Render rules: which template an action renders for which outcome.
//!
//! Every render-enabled action owns one [`RuleSet`]. Rules are added while
//! the action is built and read-only afterwards.
//!
//! # Priority
//!
//! | Registration | Slot | Order |
//! |--------------|------|-------|
//! | `When::Status(code)` | `errors` | prepended: the latest registration is tried first |
//! | `When::Error` | `errors` | appended: the earliest registration is tried first |
//! | `When::Success` | `success` | first registration wins |
//! | no condition | `all` | first registration wins |
//!
//! For an intent in error, the first rule whose status equals the error
//! status is used; failing that, the first rule without a status. If the
//! chosen rule yields nothing, the `all` rule is the fallback.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use vista_dispatch::Intent;
use vista_render::panic_message;

/// Function computing a template name from the intent being finalized.
pub type TemplateFn = dyn Fn(&Intent) -> Option<String> + Send + Sync;

/// Where a rule's template name comes from.
#[derive(Clone)]
pub enum TemplateSource {
    /// A fixed template name.
    Static(String),
    /// A name computed per request. `None` or an empty name means "no template".
    Dynamic(Arc<TemplateFn>),
}

impl TemplateSource {
    /// Wraps a per-request template function.
    ///
    /// ```rust
    /// use vista::TemplateSource;
    ///
    /// let source = TemplateSource::dynamic(|intent| {
    ///     intent.result().map(|_| "found.jinja".to_string())
    /// });
    /// assert!(!source.is_static());
    /// ```
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Intent) -> Option<String> + Send + Sync + 'static,
    {
        TemplateSource::Dynamic(Arc::new(f))
    }

    /// Returns true for a fixed template name.
    pub fn is_static(&self) -> bool {
        matches!(self, TemplateSource::Static(_))
    }

    /// Produces the template name for `intent`.
    ///
    /// A panicking function yields [`RulePanic`]; an empty name yields `None`.
    pub fn evaluate(&self, intent: &Intent) -> Result<Option<String>, RulePanic> {
        let name = match self {
            TemplateSource::Static(name) => Some(name.clone()),
            TemplateSource::Dynamic(f) => catch_unwind(AssertUnwindSafe(|| f(intent)))
                .map_err(|payload| RulePanic(panic_message(payload.as_ref())))?,
        };
        Ok(name.filter(|name| !name.is_empty()))
    }
}

/// A dynamic render rule panicked; holds the panic message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dynamic render rule panicked: {0}")]
pub struct RulePanic(pub String);

impl From<&str> for TemplateSource {
    fn from(name: &str) -> Self {
        TemplateSource::Static(name.to_string())
    }
}

impl From<String> for TemplateSource {
    fn from(name: String) -> Self {
        TemplateSource::Static(name)
    }
}

impl fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::Static(name) => f.debug_tuple("Static").field(name).finish(),
            TemplateSource::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

/// The outcome a rule is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    /// The intent finished without error.
    Success,
    /// The intent finished with any error.
    Error,
    /// The intent finished with an error of this status.
    Status(u16),
}

impl From<u16> for When {
    fn from(status: u16) -> Self {
        When::Status(status)
    }
}

/// A textual condition that is neither `success`, `error` nor a status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized render condition: {0:?}")]
pub struct ParseWhenError(pub String);

impl FromStr for When {
    type Err = ParseWhenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(When::Success),
            "error" => Ok(When::Error),
            other => other
                .parse::<u16>()
                .map(When::Status)
                .map_err(|_| ParseWhenError(other.to_string())),
        }
    }
}

/// Conversion into a render condition, possibly failing for text.
pub trait IntoWhen {
    /// Performs the conversion.
    fn into_when(self) -> Result<When, ParseWhenError>;
}

impl IntoWhen for When {
    fn into_when(self) -> Result<When, ParseWhenError> {
        Ok(self)
    }
}

impl IntoWhen for u16 {
    fn into_when(self) -> Result<When, ParseWhenError> {
        Ok(When::Status(self))
    }
}

impl IntoWhen for i32 {
    fn into_when(self) -> Result<When, ParseWhenError> {
        u16::try_from(self)
            .map(When::Status)
            .map_err(|_| ParseWhenError(self.to_string()))
    }
}

impl IntoWhen for &str {
    fn into_when(self) -> Result<When, ParseWhenError> {
        self.parse()
    }
}

impl IntoWhen for String {
    fn into_when(self) -> Result<When, ParseWhenError> {
        self.parse()
    }
}

/// Which outcomes a stored rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliesTo {
    /// Successful intents.
    Success,
    /// Intents in error; `Some(status)` narrows to one status.
    Error(Option<u16>),
    /// Every outcome.
    Always,
}

/// One registered render rule.
#[derive(Debug, Clone)]
pub struct RenderRule {
    source: TemplateSource,
    applies_to: AppliesTo,
}

impl RenderRule {
    /// Creates a rule.
    pub fn new(source: TemplateSource, applies_to: AppliesTo) -> Self {
        Self { source, applies_to }
    }

    /// The template source.
    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// The outcomes this rule applies to.
    pub fn applies_to(&self) -> AppliesTo {
        self.applies_to
    }

    /// The error status this rule is narrowed to, if any.
    pub fn status(&self) -> Option<u16> {
        match self.applies_to {
            AppliesTo::Error(status) => status,
            _ => None,
        }
    }

    fn template(&self, intent: &Intent, on_panic: &mut dyn FnMut(RulePanic)) -> Option<String> {
        self.source.evaluate(intent).unwrap_or_else(|panic| {
            on_panic(panic);
            None
        })
    }
}

/// The render rules of one action.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    success: Option<RenderRule>,
    errors: Vec<RenderRule>,
    all: Option<RenderRule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule. `None` means "always".
    ///
    /// Empty static names are ignored, as are second success and second
    /// "always" rules. `action` is used for logging only.
    pub fn add(&mut self, action: &str, source: TemplateSource, when: Option<When>) {
        if let TemplateSource::Static(name) = &source {
            if name.is_empty() {
                tracing::warn!(action = %action, "Ignoring render rule with an empty template name");
                return;
            }
        }

        match when {
            Some(When::Status(status)) => {
                self.errors
                    .insert(0, RenderRule::new(source, AppliesTo::Error(Some(status))));
            }
            Some(When::Error) => {
                self.errors.push(RenderRule::new(source, AppliesTo::Error(None)));
            }
            Some(When::Success) => {
                if self.success.is_some() {
                    tracing::warn!(
                        action = %action,
                        template = ?source,
                        "Action already has a success template, ignoring"
                    );
                    return;
                }
                self.success = Some(RenderRule::new(source, AppliesTo::Success));
            }
            None => {
                if self.all.is_some() {
                    tracing::warn!(
                        action = %action,
                        template = ?source,
                        "Action already has a global template, ignoring"
                    );
                    return;
                }
                self.all = Some(RenderRule::new(source, AppliesTo::Always));
            }
        }
    }

    /// The success rule.
    pub fn success(&self) -> Option<&RenderRule> {
        self.success.as_ref()
    }

    /// The error rules, in evaluation order.
    pub fn errors(&self) -> &[RenderRule] {
        &self.errors
    }

    /// The rule applying to every outcome.
    pub fn all(&self) -> Option<&RenderRule> {
        self.all.as_ref()
    }

    /// Returns true if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.success.is_none() && self.errors.is_empty() && self.all.is_none()
    }

    /// Picks the template for `intent` without firing any event.
    ///
    /// Intents that already carry a raw result never render. A panicking
    /// dynamic rule counts as yielding nothing.
    pub fn select(&self, intent: &Intent) -> Option<String> {
        self.select_with(intent, |_| {})
    }

    /// Like [`select`](RuleSet::select), handing every dynamic rule panic to
    /// `on_panic`.
    pub fn select_with(&self, intent: &Intent, mut on_panic: impl FnMut(RulePanic)) -> Option<String> {
        if intent.has_raw_result() {
            return None;
        }

        let primary = match intent.error() {
            Some(err) => self.error_rule(err.status),
            None => self.success.as_ref(),
        };

        primary
            .and_then(|rule| rule.template(intent, &mut on_panic))
            .or_else(|| {
                self.all
                    .as_ref()
                    .and_then(|rule| rule.template(intent, &mut on_panic))
            })
    }

    fn error_rule(&self, status: u16) -> Option<&RenderRule> {
        self.errors
            .iter()
            .find(|rule| rule.status() == Some(status))
            .or_else(|| self.errors.iter().find(|rule| rule.status().is_none()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vista_dispatch::IntentError;

    fn failed(status: u16) -> Intent {
        let mut intent = Intent::new("test", json!(null));
        intent.set_error(IntentError::new("TEST.FAIL", "failed").with_status(status));
        intent
    }

    fn succeeded() -> Intent {
        let mut intent = Intent::new("test", json!(null));
        intent.set_result(json!({"ok": true}));
        intent
    }

    #[test]
    fn test_when_from_str() {
        assert_eq!("success".parse::<When>(), Ok(When::Success));
        assert_eq!("error".parse::<When>(), Ok(When::Error));
        assert_eq!("404".parse::<When>(), Ok(When::Status(404)));
        assert_eq!(
            "sometimes".parse::<When>(),
            Err(ParseWhenError("sometimes".to_string()))
        );
    }

    #[test]
    fn test_status_rules_are_prepended() {
        let mut rules = RuleSet::new();
        rules.add("t", "first.html".into(), Some(When::Status(404)));
        rules.add("t", "second.html".into(), Some(When::Status(404)));

        assert_eq!(rules.select(&failed(404)).as_deref(), Some("second.html"));
    }

    #[test]
    fn test_error_rules_are_appended() {
        let mut rules = RuleSet::new();
        rules.add("t", "first.html".into(), Some(When::Error));
        rules.add("t", "second.html".into(), Some(When::Error));

        assert_eq!(rules.errors()[0].status(), None);
        assert_eq!(rules.select(&failed(500)).as_deref(), Some("first.html"));
    }

    #[test]
    fn test_status_match_beats_generic_error() {
        let mut rules = RuleSet::new();
        rules.add("t", "error.html".into(), Some(When::Error));
        rules.add("t", "404.html".into(), Some(When::Status(404)));

        assert_eq!(rules.select(&failed(404)).as_deref(), Some("404.html"));
        assert_eq!(rules.select(&failed(403)).as_deref(), Some("error.html"));
    }

    #[test]
    fn test_error_without_match_falls_back_to_all() {
        let mut rules = RuleSet::new();
        rules.add("t", "404.html".into(), Some(When::Status(404)));
        rules.add("t", "page.html".into(), None);

        assert_eq!(rules.select(&failed(500)).as_deref(), Some("page.html"));
    }

    #[test]
    fn test_success_falls_back_to_all() {
        let mut rules = RuleSet::new();
        rules.add("t", TemplateSource::dynamic(|_| None), Some(When::Success));
        rules.add("t", "page.html".into(), None);

        assert_eq!(rules.select(&succeeded()).as_deref(), Some("page.html"));
    }

    #[test]
    fn test_no_matching_rule_selects_nothing() {
        let mut rules = RuleSet::new();
        rules.add("t", "404.html".into(), Some(When::Status(404)));

        assert_eq!(rules.select(&succeeded()), None);
        assert_eq!(rules.select(&failed(500)), None);
    }

    #[test]
    fn test_raw_result_never_renders() {
        let mut rules = RuleSet::new();
        rules.add("t", "page.html".into(), None);

        let mut intent = succeeded();
        intent.set_raw_result("<p>already</p>");
        assert_eq!(rules.select(&intent), None);
    }

    #[test]
    fn test_duplicate_success_and_all_keep_first() {
        let mut rules = RuleSet::new();
        rules.add("t", "a.html".into(), Some(When::Success));
        rules.add("t", "b.html".into(), Some(When::Success));
        rules.add("t", "c.html".into(), None);
        rules.add("t", "d.html".into(), None);

        assert!(matches!(
            rules.success().unwrap().source(),
            TemplateSource::Static(name) if name == "a.html"
        ));
        assert!(matches!(
            rules.all().unwrap().source(),
            TemplateSource::Static(name) if name == "c.html"
        ));
    }

    #[test]
    fn test_empty_static_name_is_ignored() {
        let mut rules = RuleSet::new();
        rules.add("t", "".into(), None);
        assert!(rules.is_empty());
    }

    #[test]
    fn test_dynamic_rule_sees_intent() {
        let mut rules = RuleSet::new();
        rules.add(
            "t",
            TemplateSource::dynamic(|intent| {
                let ok = intent.result().and_then(|r| r["ok"].as_bool())?;
                let name = if ok { "ok.jinja" } else { "ko.jinja" };
                Some(name.to_string())
            }),
            None,
        );

        assert_eq!(rules.select(&succeeded()).as_deref(), Some("ok.jinja"));
    }

    #[test]
    fn test_panicking_dynamic_rule_is_nothing() {
        let source = TemplateSource::dynamic(|_| panic!("rule exploded"));
        assert_eq!(
            source.evaluate(&succeeded()),
            Err(RulePanic("rule exploded".to_string()))
        );

        let mut rules = RuleSet::new();
        rules.add("t", source, Some(When::Success));
        rules.add("t", "fallback.html".into(), None);
        assert_eq!(rules.select(&succeeded()).as_deref(), Some("fallback.html"));

        let mut panics = Vec::new();
        let selected = rules.select_with(&succeeded(), |panic| panics.push(panic.0));
        assert_eq!(selected.as_deref(), Some("fallback.html"));
        assert_eq!(panics, vec!["rule exploded".to_string()]);
    }

    #[test]
    fn test_dynamic_empty_name_is_nothing() {
        let source = TemplateSource::dynamic(|_| Some(String::new()));
        assert_eq!(source.evaluate(&succeeded()), Ok(None));
    }

    #[test]
    fn test_template_source_debug() {
        assert_eq!(format!("{:?}", TemplateSource::from("a.html")), "Static(\"a.html\")");
        assert_eq!(format!("{:?}", TemplateSource::dynamic(|_| None)), "Dynamic(<fn>)");
    }
}
