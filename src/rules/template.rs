//! Replacement templates for `regexp` rules.
//!
//! Templates use the `$`-reference syntax common to redirect rule files:
//!
//! | Token     | Expands to                              |
//! |-----------|-----------------------------------------|
//! | `$$`      | a literal `$`                           |
//! | `$&`      | the whole match                         |
//! | `` $` ``  | the text before the match               |
//! | `$'`      | the text after the match                |
//! | `$n`/`$nn`| capture group `n` (1-99), if it exists  |
//! | `$<name>` | the named capture group, when the pattern has any |
//!
//! References to groups that do not exist are emitted literally; groups that
//! exist but did not participate in the match expand to nothing. In a pattern
//! without named groups `$<` is plain text.

use regex::{Captures, Regex};

/// Replace the first match of `regex` in `haystack` with the expanded
/// template. Returns `haystack` unchanged when nothing matches.
pub fn replace_first(regex: &Regex, haystack: &str, template: &str) -> String {
    let Some(caps) = regex.captures(haystack) else {
        return haystack.to_string();
    };
    let Some(whole) = caps.get(0) else {
        return haystack.to_string();
    };

    let mut out = String::with_capacity(haystack.len() + template.len());
    out.push_str(&haystack[..whole.start()]);
    expand(template, regex, &caps, haystack, &mut out);
    out.push_str(&haystack[whole.end()..]);
    out
}

fn expand(template: &str, regex: &Regex, caps: &Captures<'_>, haystack: &str, out: &mut String) {
    let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
    let groups = caps.len().saturating_sub(1);
    let has_named_groups = regex.capture_names().flatten().next().is_some();
    let bytes = template.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' || i + 1 >= bytes.len() {
            i += 1;
            continue;
        }

        let (expansion, consumed): (Option<&str>, usize) = match bytes[i + 1] {
            b'$' => (Some("$"), 2),
            b'&' => (Some(&haystack[whole.0..whole.1]), 2),
            b'`' => (Some(&haystack[..whole.0]), 2),
            b'\'' => (Some(&haystack[whole.1..]), 2),
            b'0'..=b'9' => match group_reference(&bytes[i + 1..], groups) {
                Some((index, len)) => (Some(caps.get(index).map_or("", |m| m.as_str())), 1 + len),
                None => (None, 0),
            },
            b'<' if has_named_groups => match template[i + 2..].find('>') {
                Some(end) => {
                    let name = &template[i + 2..i + 2 + end];
                    (Some(caps.name(name).map_or("", |m| m.as_str())), 3 + end)
                }
                None => (None, 0),
            },
            _ => (None, 0),
        };

        match expansion {
            Some(text) => {
                out.push_str(&template[literal_start..i]);
                out.push_str(text);
                i += consumed;
                literal_start = i;
            }
            None => i += 1,
        }
    }

    out.push_str(&template[literal_start..]);
}

/// Resolve `$n` / `$nn`: two digits win when they name an existing group.
fn group_reference(digits: &[u8], groups: usize) -> Option<(usize, usize)> {
    let first = (digits[0] - b'0') as usize;
    if let Some(second) = digits.get(1).filter(|b| b.is_ascii_digit()) {
        let two = first * 10 + (second - b'0') as usize;
        if (1..=groups).contains(&two) {
            return Some((two, 2));
        }
    }
    (1..=groups).contains(&first).then_some((first, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace(pattern: &str, haystack: &str, template: &str) -> String {
        replace_first(&Regex::new(pattern).unwrap(), haystack, template)
    }

    #[test]
    fn test_numbered_groups() {
        assert_eq!(replace("^blog/(.*)$", "blog/hello", "/articles/$1"), "/articles/hello");
        assert_eq!(
            replace(r"^(\d{4})/(\d{2})/(.*)$", "2024/05/post", "/$3?y=$1&m=$2"),
            "/post?y=2024&m=05"
        );
    }

    #[test]
    fn test_only_first_match_replaced() {
        assert_eq!(replace("a", "banana", "o"), "bonana");
    }

    #[test]
    fn test_partial_match_keeps_surroundings() {
        assert_eq!(replace("old", "docs/old/page", "new"), "docs/new/page");
    }

    #[test]
    fn test_no_match_returns_input() {
        assert_eq!(replace("^x", "abc", "/y"), "abc");
    }

    #[test]
    fn test_special_tokens() {
        assert_eq!(replace("b", "abc", "[$&]"), "a[b]c");
        assert_eq!(replace("b", "abc", "$`"), "aac");
        assert_eq!(replace("b", "abc", "$'"), "acc");
        assert_eq!(replace("b", "abc", "$$"), "a$c");
    }

    #[test]
    fn test_missing_group_is_literal() {
        assert_eq!(replace("^(a)$", "a", "$2-$1"), "$2-a");
        assert_eq!(replace("^a$", "a", "x$"), "x$");
        assert_eq!(replace("^a$", "a", "$0"), "$0");
    }

    #[test]
    fn test_two_digit_fallback_to_one() {
        // Only one group: "$10" reads as group 1 followed by "0".
        assert_eq!(replace("^(a)$", "a", "$10"), "a0");
    }

    #[test]
    fn test_named_groups() {
        assert_eq!(
            replace(r"^docs/(?P<slug>[^/]+)$", "docs/intro", "/guide/$<slug>/"),
            "/guide/intro/"
        );
        assert_eq!(replace("^(a)$", "a", "$<nope"), "$<nope");
    }

    #[test]
    fn test_angle_reference_literal_without_named_groups() {
        assert_eq!(replace("^(a)$", "a", "x$<n>y"), "x$<n>y");
        assert_eq!(replace("^(?P<n>a)$", "a", "x$<other>y"), "xy");
    }

    #[test]
    fn test_optional_group_not_participating() {
        assert_eq!(replace("^a(b)?$", "a", "[$1]"), "[]");
    }
}
