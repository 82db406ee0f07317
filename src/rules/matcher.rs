//! Rule selection.
//!
//! # Design Decisions
//! - First match wins, in document order
//! - Matching runs against the normalized path (no leading/trailing slash)
//! - Regex patterns are compiled once at load time; `regex::Regex` keeps no
//!   match state between calls
//! - Unsupported or uncompilable conditions never match

use crate::rules::model::{Condition, RedirectRule, RuleSet};

impl Condition {
    /// Returns true if the normalized path satisfies this condition.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Condition::ExactMatch(value) => path == value,
            Condition::PrefixMatch(value) => path.starts_with(value.as_str()),
            Condition::Regexp { regex: Some(re), .. } => re.is_match(path),
            Condition::Regexp { regex: None, .. } | Condition::Unsupported { .. } => false,
        }
    }
}

/// Find the first rule whose condition matches `path`.
pub fn find_rule<'a>(path: &str, rules: &'a RuleSet) -> Option<&'a RedirectRule> {
    rules.iter().find(|rule| rule.condition.matches(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(value: serde_json::Value) -> RuleSet {
        RuleSet::from_json_value(value, None).unwrap()
    }

    fn rule(kind: &str, value: &str, uri: &str) -> serde_json::Value {
        json!({"condition": {"key": {"type": kind, "value": value}}, "redirect": {"statusCode": 301, "uri": uri}})
    }

    #[test]
    fn test_exact_match_ignores_other_rules() {
        let set = rules(json!([
            rule("exactMatch", "about-us", "/wrong"),
            rule("prefixMatch", "zzz", "/wrong"),
            rule("exactMatch", "about", "/right"),
        ]));
        let found = find_rule("about", &set).unwrap();
        assert_eq!(found.redirect.uri, crate::rules::RedirectTarget::Uri("/right".into()));
    }

    #[test]
    fn test_prefix_first_in_order_wins() {
        let set = rules(json!([
            rule("prefixMatch", "docs", "/first"),
            rule("prefixMatch", "docs/v1", "/second"),
        ]));
        let found = find_rule("docs/v1/intro", &set).unwrap();
        assert_eq!(found.redirect.uri, crate::rules::RedirectTarget::Uri("/first".into()));
    }

    #[test]
    fn test_regexp_is_stateless_across_calls() {
        let set = rules(json!([rule("regexp", "^blog/(.*)$", "/articles/$1")]));
        // Repeated evaluation against the same compiled pattern keeps matching.
        for _ in 0..3 {
            assert!(find_rule("blog/hello", &set).is_some());
        }
        assert!(find_rule("news/hello", &set).is_none());
    }

    #[test]
    fn test_unsupported_never_matches() {
        let set = rules(json!([
            rule("contains", "", "/x"),
            rule("regexp", "[", "/y"),
        ]));
        assert!(find_rule("", &set).is_none());
        assert!(find_rule("[", &set).is_none());
    }

    #[test]
    fn test_empty_rule_set() {
        assert!(find_rule("anything", &RuleSet::empty()).is_none());
    }
}
