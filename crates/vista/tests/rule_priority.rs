use proptest::prelude::*;
use serde_json::json;
use vista::{RuleSet, TemplateSource, When};
use vista_dispatch::{Intent, IntentError};

fn failed(status: u16) -> Intent {
    let mut intent = Intent::new("prop", json!(null));
    intent.set_error(IntentError::new("PROP.FAIL", "failed").with_status(status));
    intent
}

proptest! {
    // The most recent registration for a status wins
    #[test]
    fn latest_status_rule_wins(
        status in 400u16..600,
        names in prop::collection::vec("[a-z]{1,8}", 1..6),
    ) {
        let mut rules = RuleSet::new();
        for name in &names {
            rules.add("prop", TemplateSource::from(format!("{}.html", name)), Some(When::Status(status)));
        }
        let expected = format!("{}.html", names.last().unwrap());
        prop_assert_eq!(rules.select(&failed(status)), Some(expected));
    }

    // Status rules beat generic ones regardless of registration order
    #[test]
    fn status_rule_beats_generic(status in 400u16..600, generic_first in any::<bool>()) {
        let mut rules = RuleSet::new();
        if generic_first {
            rules.add("prop", "generic.html".into(), Some(When::Error));
            rules.add("prop", "status.html".into(), Some(When::Status(status)));
        } else {
            rules.add("prop", "status.html".into(), Some(When::Status(status)));
            rules.add("prop", "generic.html".into(), Some(When::Error));
        }
        prop_assert_eq!(rules.select(&failed(status)), Some("status.html".to_string()));

        let other = if status == 599 { 400 } else { status + 1 };
        prop_assert_eq!(rules.select(&failed(other)), Some("generic.html".to_string()));
    }

    // The earliest generic error rule wins
    #[test]
    fn earliest_generic_rule_wins(count in 1usize..6, status in 400u16..600) {
        let mut rules = RuleSet::new();
        for i in 0..count {
            rules.add("prop", TemplateSource::from(format!("e{}.html", i)), Some(When::Error));
        }
        prop_assert_eq!(rules.select(&failed(status)), Some("e0.html".to_string()));
    }

    // Successful intents never pick error rules
    #[test]
    fn success_ignores_error_rules(status in 400u16..600, has_all in any::<bool>()) {
        let mut rules = RuleSet::new();
        rules.add("prop", "status.html".into(), Some(When::Status(status)));
        rules.add("prop", "generic.html".into(), Some(When::Error));
        if has_all {
            rules.add("prop", "all.html".into(), None);
        }

        let intent = Intent::new("prop", json!(null));
        let expected = if has_all { Some("all.html".to_string()) } else { None };
        prop_assert_eq!(rules.select(&intent), expected);
    }
}
