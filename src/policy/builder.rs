//! Intermediate builders returned by [`Policy::allow_attrs`],
//! [`Policy::allow_styles`] and [`Policy::allow_no_attrs`].
//!
//! Each builder borrows the policy mutably and hands it back from its
//! terminating method, so rule definitions chain:
//!
//! ```
//! use html_policy::Policy;
//! use regex::Regex;
//!
//! let mut policy = Policy::new();
//! policy
//!     .allow_attrs(&["dir"])
//!     .matching_enum(&["ltr", "rtl", "auto"])
//!     .globally()
//!     .allow_styles(&["color"])
//!     .matching(Regex::new(r"^#[0-9a-f]{6}$").unwrap())
//!     .on_elements(&["span"]);
//! ```

use std::sync::Arc;

use regex::Regex;

use super::{Matcher, Policy, Rule};
use crate::error::Result;

fn lowercase_all(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|n| n.trim().to_ascii_lowercase())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Pending attribute rule. Created by [`Policy::allow_attrs`].
#[must_use = "an attribute rule has no effect until on_elements, on_elements_matching or globally is called"]
pub struct AttrPolicyBuilder<'p> {
    policy: &'p mut Policy,
    attrs: Vec<String>,
    matcher: Option<Matcher>,
}

impl<'p> AttrPolicyBuilder<'p> {
    pub(crate) fn new(policy: &'p mut Policy, attrs: &[&str]) -> Self {
        Self {
            policy,
            attrs: lowercase_all(attrs),
            matcher: None,
        }
    }

    /// Keep a value only when `regex` finds a match in it.
    pub fn matching(mut self, regex: Regex) -> Self {
        self.matcher = Some(Matcher::Regex(regex));
        self
    }

    /// Compile `pattern` and keep a value only when it matches.
    ///
    /// Returns [`SanitizeError::InvalidPattern`](crate::SanitizeError::InvalidPattern)
    /// if the pattern does not compile.
    pub fn matching_pattern(self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        Ok(self.matching(regex))
    }

    /// Keep a value only when `predicate` returns `true` for it.
    pub fn matching_fn<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.matcher = Some(Matcher::Predicate(Arc::new(predicate)));
        self
    }

    /// Keep a value only when each of its tokens is one of `values`.
    pub fn matching_enum(mut self, values: &[&str]) -> Self {
        self.matcher = Some(Matcher::Enum(
            values.iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    /// Apply the rule to the named elements, allowing them as well.
    pub fn on_elements(self, elements: &[&str]) -> &'p mut Policy {
        let Self {
            policy,
            attrs,
            matcher,
        } = self;
        for element in lowercase_all(elements) {
            let rules = policy.allow_element(&element);
            for attr in &attrs {
                rules.insert(attr.clone(), Rule::new(matcher.clone()));
            }
        }
        policy
    }

    /// Apply the rule to every element whose name matches `pattern`,
    /// allowing those elements as well.
    pub fn on_elements_matching(self, pattern: Regex) -> &'p mut Policy {
        let Self {
            policy,
            attrs,
            matcher,
        } = self;
        let entry = policy.pattern_rule(pattern);
        for attr in attrs {
            entry.attrs.insert(attr, Rule::new(matcher.clone()));
        }
        policy
    }

    /// Apply the rule to every allowed element.
    pub fn globally(self) -> &'p mut Policy {
        let Self {
            policy,
            attrs,
            matcher,
        } = self;
        for attr in attrs {
            policy.global_attrs.insert(attr, Rule::new(matcher.clone()));
        }
        policy
    }
}

/// Pending inline-style rule. Created by [`Policy::allow_styles`].
///
/// Without a matcher, values that could run script or fetch a resource
/// (`url(...)`, `expression(...)` and similar) are still rejected.
#[must_use = "a style rule has no effect until on_elements, on_elements_matching or globally is called"]
pub struct StylePolicyBuilder<'p> {
    policy: &'p mut Policy,
    properties: Vec<String>,
    matcher: Option<Matcher>,
}

impl<'p> StylePolicyBuilder<'p> {
    pub(crate) fn new(policy: &'p mut Policy, properties: &[&str]) -> Self {
        Self {
            policy,
            properties: lowercase_all(properties),
            matcher: None,
        }
    }

    /// Keep a declaration only when `regex` finds a match in its value.
    pub fn matching(mut self, regex: Regex) -> Self {
        self.matcher = Some(Matcher::Regex(regex));
        self
    }

    /// Compile `pattern` and keep a declaration only when its value matches.
    pub fn matching_pattern(self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        Ok(self.matching(regex))
    }

    /// Keep a declaration only when `predicate` accepts its value.
    pub fn matching_fn<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.matcher = Some(Matcher::Predicate(Arc::new(predicate)));
        self
    }

    /// Keep a declaration only when each token of its value is one of `values`.
    pub fn matching_enum(mut self, values: &[&str]) -> Self {
        self.matcher = Some(Matcher::Enum(
            values.iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    /// Apply the rule to `style` attributes on the named elements.
    ///
    /// The elements themselves still have to be allowed.
    pub fn on_elements(self, elements: &[&str]) -> &'p mut Policy {
        let Self {
            policy,
            properties,
            matcher,
        } = self;
        for element in lowercase_all(elements) {
            let rules = policy.element_styles.entry(element).or_default();
            for property in &properties {
                rules.insert(property.clone(), Rule::new(matcher.clone()));
            }
        }
        policy
    }

    /// Apply the rule to `style` attributes on elements matching `pattern`.
    pub fn on_elements_matching(self, pattern: Regex) -> &'p mut Policy {
        let Self {
            policy,
            properties,
            matcher,
        } = self;
        let entry = policy.style_pattern_rule(pattern);
        for property in properties {
            entry.attrs.insert(property, Rule::new(matcher.clone()));
        }
        policy
    }

    /// Apply the rule to `style` attributes on every allowed element.
    pub fn globally(self) -> &'p mut Policy {
        let Self {
            policy,
            properties,
            matcher,
        } = self;
        for property in properties {
            policy
                .global_styles
                .insert(property, Rule::new(matcher.clone()));
        }
        policy
    }
}

/// Marks elements as worth keeping even when no attribute survives.
/// Created by [`Policy::allow_no_attrs`].
#[must_use = "no elements are marked until on_elements or on_elements_matching is called"]
pub struct NoAttrsBuilder<'p> {
    policy: &'p mut Policy,
}

impl<'p> NoAttrsBuilder<'p> {
    pub(crate) fn new(policy: &'p mut Policy) -> Self {
        Self { policy }
    }

    /// Mark the named elements, allowing them as well.
    pub fn on_elements(self, elements: &[&str]) -> &'p mut Policy {
        let policy = self.policy;
        for element in lowercase_all(elements) {
            policy.allow_element(&element);
            policy.no_attrs_elements.insert(element);
        }
        policy
    }

    /// Mark every element whose name matches `pattern`, allowing them as well.
    pub fn on_elements_matching(self, pattern: Regex) -> &'p mut Policy {
        let policy = self.policy;
        if !policy
            .no_attrs_patterns
            .iter()
            .any(|re| re.as_str() == pattern.as_str())
        {
            policy.no_attrs_patterns.push(pattern.clone());
        }
        policy.pattern_rule(pattern);
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SanitizeError;

    #[test]
    fn on_elements_allows_element_and_attr() {
        let mut policy = Policy::new();
        policy.allow_attrs(&["HREF"]).on_elements(&["A"]);
        assert!(policy.is_element_allowed("a"));
        assert!(policy.attr_rule("a", "href").is_some());
    }

    #[test]
    fn later_rule_replaces_earlier_for_same_key() {
        let mut policy = Policy::new();
        policy
            .allow_attrs(&["width"])
            .matching_enum(&["10"])
            .on_elements(&["img"])
            .allow_attrs(&["width"])
            .matching_enum(&["20"])
            .on_elements(&["img"]);
        let rule = policy.attr_rule("img", "width").unwrap();
        assert!(rule.accepts("20"));
        assert!(!rule.accepts("10"));
    }

    #[test]
    fn rules_for_different_attrs_are_additive() {
        let mut policy = Policy::new();
        policy
            .allow_attrs(&["alt"])
            .on_elements(&["img"])
            .allow_attrs(&["src"])
            .on_elements(&["img"]);
        assert!(policy.attr_rule("img", "alt").is_some());
        assert!(policy.attr_rule("img", "src").is_some());
    }

    #[test]
    fn matching_pattern_reports_bad_regex() {
        let mut policy = Policy::new();
        let err = policy
            .allow_attrs(&["class"])
            .matching_pattern("([a-z]")
            .err()
            .unwrap();
        assert!(matches!(err, SanitizeError::InvalidPattern(_)));
    }

    #[test]
    fn matching_fn_is_stored() {
        let mut policy = Policy::new();
        policy
            .allow_attrs(&["title"])
            .matching_fn(|v| v.starts_with("ok"))
            .globally();
        let rule = policy.attr_rule("div", "title").unwrap();
        assert!(rule.accepts("ok then"));
        assert!(!rule.accepts("nope"));
    }

    #[test]
    fn style_rules_do_not_allow_elements() {
        let mut policy = Policy::new();
        policy.allow_styles(&["Color"]).on_elements(&["span"]);
        assert!(!policy.is_element_allowed("span"));
        assert!(policy.style_rule("span", "color").is_some());
        assert!(policy.has_style_rules_for("span"));
        assert!(!policy.has_style_rules_for("div"));
    }

    #[test]
    fn style_pattern_scope() {
        let mut policy = Policy::new();
        policy
            .allow_styles(&["margin"])
            .on_elements_matching(Regex::new("^h[1-6]$").unwrap());
        assert!(policy.style_rule("h2", "margin").is_some());
        assert!(policy.style_rule("p", "margin").is_none());
    }

    #[test]
    fn no_attrs_marks_and_allows() {
        let mut policy = Policy::new();
        policy.allow_no_attrs().on_elements(&["my-tag"]);
        assert!(policy.is_element_allowed("my-tag"));
        assert!(policy.allows_no_attrs("my-tag"));

        policy
            .allow_no_attrs()
            .on_elements_matching(Regex::new("^x-").unwrap());
        assert!(policy.is_element_allowed("x-box"));
        assert!(policy.allows_no_attrs("x-box"));
    }
}
