//! Value matchers shared by attribute and style rules.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

/// A caller-supplied predicate over a raw attribute or style value.
pub type ValuePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Decides whether a single attribute or style value is acceptable.
///
/// Regular expressions are searched, not anchored: add `^...$` to a pattern
/// when the whole value must match.
#[derive(Clone)]
pub enum Matcher {
    /// Keep the value when the regex finds a match in it.
    Regex(Regex),
    /// Keep the value when the predicate returns `true`.
    Predicate(ValuePredicate),
    /// Keep the value when every whitespace- or comma-separated token is one
    /// of the listed values (ASCII case-insensitive).
    Enum(Vec<String>),
}

impl Matcher {
    /// Returns `true` if `value` is acceptable.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Matcher::Regex(re) => re.is_match(value),
            Matcher::Predicate(predicate) => predicate(value),
            Matcher::Enum(allowed) => {
                let mut tokens = value
                    .split(|c: char| c.is_ascii_whitespace() || c == ',')
                    .filter(|t| !t.is_empty())
                    .peekable();
                tokens.peek().is_some()
                    && tokens.all(|t| allowed.iter().any(|a| a.eq_ignore_ascii_case(t)))
            }
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
            Matcher::Enum(values) => f.debug_tuple("Enum").field(values).finish(),
        }
    }
}

/// A single allow rule: keep unconditionally, or keep when the matcher
/// accepts the value.
#[derive(Clone, Debug, Default)]
pub(crate) struct Rule {
    pub(crate) matcher: Option<Matcher>,
}

impl Rule {
    pub(crate) fn new(matcher: Option<Matcher>) -> Self {
        Self { matcher }
    }

    /// Attribute semantics: a rule without a matcher keeps any value.
    pub(crate) fn accepts(&self, value: &str) -> bool {
        self.matcher.as_ref().is_none_or(|m| m.accepts(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_matcher_searches_value() {
        let m = Matcher::Regex(Regex::new(r"[0-9]+%?").unwrap());
        assert!(m.accepts("50%"));
        assert!(m.accepts("width 50"));
        assert!(!m.accepts("auto"));
    }

    #[test]
    fn predicate_matcher_calls_closure() {
        let m = Matcher::Predicate(Arc::new(|v: &str| v.len() < 4));
        assert!(m.accepts("abc"));
        assert!(!m.accepts("abcd"));
    }

    #[test]
    fn enum_matcher_requires_every_token() {
        let m = Matcher::Enum(vec!["left".into(), "right".into()]);
        assert!(m.accepts("LEFT"));
        assert!(m.accepts("left right"));
        assert!(m.accepts("left,right"));
        assert!(!m.accepts("left center"));
        assert!(!m.accepts(""));
        assert!(!m.accepts(" , "));
    }

    #[test]
    fn rule_without_matcher_keeps_anything() {
        let rule = Rule::default();
        assert!(rule.accepts(""));
        assert!(rule.accepts("javascript:alert(1)"));
    }

    #[test]
    fn debug_hides_predicate_body() {
        let m = Matcher::Predicate(Arc::new(|_: &str| true));
        assert_eq!(format!("{m:?}"), "Predicate(..)");
    }
}
