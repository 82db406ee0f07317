//! Destination URL construction.

use crate::rules::model::{Condition, RedirectRule, RedirectTarget};
use crate::rules::template::replace_first;

/// Build the `Location` value for a matched rule.
///
/// `path` is the normalized request path and `origin` the `scheme://host`
/// computed from the request. The caller appends the request query string.
pub fn build_location(rule: &RedirectRule, path: &str, origin: &str) -> String {
    let target = &rule.redirect.uri;

    let mut location = match &rule.condition {
        Condition::Regexp { regex, .. } => {
            let template = match target {
                RedirectTarget::Uri(uri) => uri.as_str(),
                RedirectTarget::Location(loc) => loc.path.as_str(),
            };
            match regex {
                Some(re) => replace_first(re, path, template),
                // Unreachable through the matcher; keep the path untouched.
                None => path.to_string(),
            }
        }
        _ => match target {
            RedirectTarget::Uri(uri) => uri.clone(),
            RedirectTarget::Location(loc) => {
                format!("{}{}", loc.origin().unwrap_or(origin), loc.path)
            }
        },
    };

    if let RedirectTarget::Location(loc) = target {
        if let Some(qs) = loc.querystring() {
            append_query(&mut location, qs);
        }
    }

    location
}

/// Append `query` using `?` or `&` depending on whether `url` already has a
/// query component. An empty query leaves `url` unchanged.
pub fn append_query(url: &mut String, query: &str) {
    if query.is_empty() {
        return;
    }
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(query);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use serde_json::json;

    const ORIGIN: &str = "https://site.example";

    fn single(rule: serde_json::Value) -> RedirectRule {
        RuleSet::from_json_value(json!([rule]), None)
            .unwrap()
            .iter()
            .next()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_regexp_capture_substitution() {
        let rule = single(json!({
            "condition": {"key": {"type": "regexp", "value": "^blog/(.*)$"}},
            "redirect": {"uri": "/articles/$1", "statusCode": 301}
        }));
        assert_eq!(build_location(&rule, "blog/hello", ORIGIN), "/articles/hello");
    }

    #[test]
    fn test_regexp_object_target_uses_path_as_template() {
        let rule = single(json!({
            "condition": {"key": {"type": "regexp", "value": "^shop/(.*)$"}},
            "redirect": {"uri": {"path": "https://store.example/$1", "origin": "https://ignored.example", "querystring": "ref=site"}, "statusCode": 302}
        }));
        assert_eq!(
            build_location(&rule, "shop/shoes", ORIGIN),
            "https://store.example/shoes?ref=site"
        );
    }

    #[test]
    fn test_string_target_verbatim() {
        let rule = single(json!({
            "condition": {"key": {"type": "exactMatch", "value": "old"}},
            "redirect": {"uri": "https://elsewhere.example/new?x=1", "statusCode": 301}
        }));
        assert_eq!(build_location(&rule, "old", ORIGIN), "https://elsewhere.example/new?x=1");
    }

    #[test]
    fn test_object_target_uses_request_origin() {
        let rule = single(json!({
            "condition": {"key": {"type": "prefixMatch", "value": "legacy"}},
            "redirect": {"uri": {"path": "/archive/"}, "statusCode": 302}
        }));
        assert_eq!(build_location(&rule, "legacy/page", ORIGIN), "https://site.example/archive/");
    }

    #[test]
    fn test_object_target_explicit_origin_wins() {
        let rule = single(json!({
            "condition": {"key": {"type": "exactMatch", "value": "x"}},
            "redirect": {"uri": {"origin": "https://other.example", "path": "/x"}, "statusCode": 301}
        }));
        assert_eq!(build_location(&rule, "x", ORIGIN), "https://other.example/x");
        assert_eq!(build_location(&rule, "x", "https://another-host.example"), "https://other.example/x");
    }

    #[test]
    fn test_target_querystring_separator() {
        let rule = single(json!({
            "condition": {"key": {"type": "exactMatch", "value": "x"}},
            "redirect": {"uri": {"path": "/search?q=1", "querystring": "lang=en"}, "statusCode": 301}
        }));
        assert_eq!(build_location(&rule, "x", ORIGIN), "https://site.example/search?q=1&lang=en");
    }

    #[test]
    fn test_append_query() {
        let mut url = "/a".to_string();
        append_query(&mut url, "");
        assert_eq!(url, "/a");
        append_query(&mut url, "x=1");
        assert_eq!(url, "/a?x=1");
        append_query(&mut url, "y=2");
        assert_eq!(url, "/a?x=1&y=2");
    }
}
