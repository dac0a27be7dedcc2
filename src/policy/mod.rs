//! The allowlist a sanitizer enforces.
//!
//! A [`Policy`] starts out empty (nothing allowed) and is configured through
//! chainable `&mut self` methods. Once configured it is only ever read:
//! every sanitize method takes `&self`, so one policy can serve any number of
//! concurrent calls. Wrap it in a [`SanitizerHandle`](crate::SanitizerHandle)
//! or an `Arc` to share it.
//!
//! Rule resolution for an `(element, attribute)` pair is, in order:
//!
//! 1. a rule registered for the exact element name,
//! 2. the first element pattern (in registration order) that matches the
//!    element and has a rule for the attribute,
//! 3. a global rule.
//!
//! Within one scope the latest rule for a key replaces the earlier one; rules
//! for different keys never interact. Style properties resolve the same way.

mod builder;
mod matcher;
pub mod patterns;
mod presets;
mod sandbox;

pub use builder::{AttrPolicyBuilder, NoAttrsBuilder, StylePolicyBuilder};
pub use matcher::{Matcher, ValuePredicate};
pub use sandbox::SandboxValue;

pub(crate) use matcher::Rule;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use url::Url;

/// A caller-supplied check run on URLs of a registered scheme.
pub type UrlPredicate = Arc<dyn Fn(&Url) -> bool + Send + Sync>;

/// A caller-supplied rewrite applied to validated absolute `src` URLs.
pub type SrcRewriter = Arc<dyn Fn(&mut Url) + Send + Sync>;

/// Elements that stay meaningful even when every attribute was stripped.
const DEFAULT_NO_ATTRS_ELEMENTS: &[&str] = &[
    "abbr", "acronym", "address", "article", "aside", "audio", "b", "bdi", "blockquote", "body",
    "br", "button", "canvas", "caption", "center", "cite", "code", "col", "colgroup", "datalist",
    "dd", "del", "details", "dfn", "div", "dl", "dt", "em", "fieldset", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "i",
    "ins", "kbd", "li", "mark", "marquee", "nav", "ol", "optgroup", "option", "p", "picture",
    "pre", "q", "rp", "rt", "ruby", "s", "samp", "script", "section", "select", "small", "source",
    "span", "strike", "strong", "style", "sub", "summary", "sup", "svg", "table", "tbody", "td",
    "textarea", "tfoot", "th", "thead", "title", "time", "tr", "tt", "u", "ul", "var", "video",
    "wbr",
];

/// Elements whose whole content is dropped when they are not allowed.
const DEFAULT_SKIP_CONTENT_ELEMENTS: &[&str] = &[
    "frameset", "iframe", "noembed", "noframes", "noscript", "nostrike", "object", "script",
    "style", "title",
];

/// Elements whose content is executable and never escaped when emitted.
const RAW_UNSAFE_ELEMENTS: &[&str] = &["script", "style"];

/// How the sanitizer treats an element's tags and content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ElementAction {
    /// Run the attribute rules and emit the tags.
    Allow,
    /// Drop the tags, keep the content.
    Strip,
    /// Drop the tags and everything between them.
    Skip,
}

pub(crate) struct PatternRule {
    pub(crate) pattern: Regex,
    pub(crate) attrs: HashMap<String, Rule>,
}

/// A set of allow rules for elements, attributes, inline styles and URLs.
///
/// # Example
///
/// ```
/// use html_policy::Policy;
///
/// let mut policy = Policy::new();
/// policy
///     .allow_elements(&["p", "b"])
///     .allow_attrs(&["href"])
///     .on_elements(&["a"])
///     .allow_url_schemes(&["https"])
///     .require_no_follow_on_links(true);
///
/// assert_eq!(
///     policy.sanitize(r#"<p onclick="x()">Hi <a href="https://example.com/">there</a></p>"#),
///     r#"<p>Hi <a href="https://example.com/" rel="nofollow">there</a></p>"#,
/// );
/// ```
pub struct Policy {
    pub(crate) elements: HashMap<String, HashMap<String, Rule>>,
    pub(crate) element_patterns: Vec<PatternRule>,
    pub(crate) global_attrs: HashMap<String, Rule>,

    pub(crate) element_styles: HashMap<String, HashMap<String, Rule>>,
    pub(crate) pattern_styles: Vec<PatternRule>,
    pub(crate) global_styles: HashMap<String, Rule>,

    pub(crate) url_schemes: HashMap<String, Option<UrlPredicate>>,
    pub(crate) rewrite_src: Option<SrcRewriter>,

    pub(crate) no_attrs_elements: HashSet<String>,
    pub(crate) no_attrs_patterns: Vec<Regex>,
    pub(crate) skip_content: HashSet<String>,
    pub(crate) content_only: HashSet<String>,
    pub(crate) sandbox_values: Option<Vec<SandboxValue>>,

    pub(crate) require_parseable_urls: bool,
    pub(crate) allow_relative_urls: bool,
    pub(crate) require_no_follow: bool,
    pub(crate) require_no_follow_fully_qualified: bool,
    pub(crate) require_no_referrer: bool,
    pub(crate) require_no_referrer_fully_qualified: bool,
    pub(crate) add_target_blank: bool,
    pub(crate) require_cross_origin_anonymous: bool,
    pub(crate) allow_comments: bool,
    pub(crate) allow_doc_type: bool,
    pub(crate) add_space_on_strip: bool,
    pub(crate) allow_data_attributes: bool,
    pub(crate) allow_unsafe: bool,
    pub(crate) reject_empty_input: bool,
}

impl Policy {
    /// Create an empty policy that allows nothing.
    ///
    /// Sanitizing with it strips every tag and keeps only escaped text
    /// (minus the content of elements such as `script` and `style`).
    pub fn new() -> Self {
        Self {
            elements: HashMap::new(),
            element_patterns: Vec::new(),
            global_attrs: HashMap::new(),
            element_styles: HashMap::new(),
            pattern_styles: Vec::new(),
            global_styles: HashMap::new(),
            url_schemes: HashMap::new(),
            rewrite_src: None,
            no_attrs_elements: DEFAULT_NO_ATTRS_ELEMENTS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            no_attrs_patterns: Vec::new(),
            skip_content: DEFAULT_SKIP_CONTENT_ELEMENTS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            content_only: HashSet::new(),
            sandbox_values: None,
            require_parseable_urls: false,
            allow_relative_urls: false,
            require_no_follow: false,
            require_no_follow_fully_qualified: false,
            require_no_referrer: false,
            require_no_referrer_fully_qualified: false,
            add_target_blank: false,
            require_cross_origin_anonymous: false,
            allow_comments: false,
            allow_doc_type: false,
            add_space_on_strip: false,
            allow_data_attributes: false,
            allow_unsafe: false,
            reject_empty_input: false,
        }
    }

    /// Allow the named elements. They still need at least one surviving
    /// attribute unless they are allowed without attributes.
    pub fn allow_elements(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.allow_element(&name.to_ascii_lowercase());
        }
        self
    }

    /// Allow every element whose name matches `pattern`.
    pub fn allow_elements_matching(&mut self, pattern: Regex) -> &mut Self {
        self.pattern_rule(pattern);
        self
    }

    /// Start an attribute rule for the named attributes.
    ///
    /// Finish it with [`on_elements`](AttrPolicyBuilder::on_elements),
    /// [`on_elements_matching`](AttrPolicyBuilder::on_elements_matching) or
    /// [`globally`](AttrPolicyBuilder::globally).
    pub fn allow_attrs(&mut self, names: &[&str]) -> AttrPolicyBuilder<'_> {
        AttrPolicyBuilder::new(self, names)
    }

    /// Start a style rule for the named CSS properties.
    pub fn allow_styles(&mut self, properties: &[&str]) -> StylePolicyBuilder<'_> {
        StylePolicyBuilder::new(self, properties)
    }

    /// Start marking elements as meaningful without any attribute.
    pub fn allow_no_attrs(&mut self) -> NoAttrsBuilder<'_> {
        NoAttrsBuilder::new(self)
    }

    /// Drop the named elements together with everything inside them.
    pub fn skip_elements_content(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            let name = name.to_ascii_lowercase();
            self.content_only.remove(&name);
            self.skip_content.insert(name);
        }
        self
    }

    /// Drop the tags of the named elements but keep their (escaped) content,
    /// even for elements whose content is skipped by default.
    pub fn allow_elements_content(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            let name = name.to_ascii_lowercase();
            self.skip_content.remove(&name);
            self.content_only.insert(name);
        }
        self
    }

    /// Allow URLs with the given schemes. Implies
    /// [`require_parseable_urls(true)`](Self::require_parseable_urls).
    ///
    /// A scheme registered earlier with a custom predicate keeps it.
    pub fn allow_url_schemes(&mut self, schemes: &[&str]) -> &mut Self {
        self.require_parseable_urls = true;
        for scheme in schemes {
            self.url_schemes
                .entry(scheme.to_ascii_lowercase())
                .or_insert(None);
        }
        self
    }

    /// Allow URLs with `scheme` when `predicate` accepts the parsed URL.
    /// Re-registering a scheme replaces only that scheme's predicate.
    pub fn allow_url_scheme_with_custom_policy<F>(&mut self, scheme: &str, predicate: F) -> &mut Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        self.require_parseable_urls = true;
        self.url_schemes
            .insert(scheme.to_ascii_lowercase(), Some(Arc::new(predicate)));
        self
    }

    /// Rewrite every validated absolute `src` URL before it is emitted.
    pub fn rewrite_src<F>(&mut self, rewrite: F) -> &mut Self
    where
        F: Fn(&mut Url) + Send + Sync + 'static,
    {
        self.rewrite_src = Some(Arc::new(rewrite));
        self
    }

    /// Validate URL-bearing attributes (`href`, `src`, `cite`) against the
    /// registered schemes.
    pub fn require_parseable_urls(&mut self, require: bool) -> &mut Self {
        self.require_parseable_urls = require;
        self
    }

    /// Accept relative and protocol-relative URLs. Implies
    /// [`require_parseable_urls(true)`](Self::require_parseable_urls).
    pub fn allow_relative_urls(&mut self, allow: bool) -> &mut Self {
        self.require_parseable_urls = true;
        self.allow_relative_urls = allow;
        self
    }

    /// Ensure `rel` contains `nofollow` on every link with an `href`.
    pub fn require_no_follow_on_links(&mut self, require: bool) -> &mut Self {
        self.require_no_follow = require;
        self
    }

    /// Ensure `rel` contains `nofollow` on links to another host.
    pub fn require_no_follow_on_fully_qualified_links(&mut self, require: bool) -> &mut Self {
        self.require_no_follow_fully_qualified = require;
        self
    }

    /// Ensure `rel` contains `noreferrer` on every link with an `href`.
    pub fn require_no_referrer_on_links(&mut self, require: bool) -> &mut Self {
        self.require_no_referrer = require;
        self
    }

    /// Ensure `rel` contains `noreferrer` on links to another host.
    pub fn require_no_referrer_on_fully_qualified_links(&mut self, require: bool) -> &mut Self {
        self.require_no_referrer_fully_qualified = require;
        self
    }

    /// Force `target="_blank"` (and `rel="noopener"`) on `a` elements that
    /// link to another host.
    pub fn add_target_blank_to_fully_qualified_links(&mut self, require: bool) -> &mut Self {
        self.add_target_blank = require;
        self
    }

    /// Force `crossorigin="anonymous"` on `audio`, `img`, `link`, `script`
    /// and `video`.
    pub fn require_cross_origin_anonymous(&mut self, require: bool) -> &mut Self {
        self.require_cross_origin_anonymous = require;
        self
    }

    /// Force a `sandbox` attribute on every `iframe`, keeping only the given
    /// tokens from any existing value.
    pub fn require_sandbox_on_iframe(&mut self, allowed: &[SandboxValue]) -> &mut Self {
        let values = self.sandbox_values.get_or_insert_with(Vec::new);
        for value in allowed {
            if !values.contains(value) {
                values.push(*value);
            }
        }
        self
    }

    /// Keep HTML comments verbatim.
    pub fn allow_comments(&mut self, allow: bool) -> &mut Self {
        self.allow_comments = allow;
        self
    }

    /// Keep `<!DOCTYPE>` declarations.
    pub fn allow_doc_type(&mut self, allow: bool) -> &mut Self {
        self.allow_doc_type = allow;
        self
    }

    /// Write a single space wherever an element tag is stripped, so that
    /// words on either side do not run together.
    pub fn add_space_when_stripping_tag(&mut self, add: bool) -> &mut Self {
        self.add_space_on_strip = add;
        self
    }

    /// Keep well-formed `data-*` attributes on every allowed element.
    pub fn allow_data_attributes(&mut self, allow: bool) -> &mut Self {
        self.allow_data_attributes = allow;
        self
    }

    /// Emit allowed `script` and `style` elements with their raw content.
    ///
    /// Without this, both are dropped with their content even when allowed.
    pub fn allow_unsafe(&mut self, allow: bool) -> &mut Self {
        self.allow_unsafe = allow;
        self
    }

    /// Make [`try_sanitize`](Self::try_sanitize) and the streaming variants
    /// return [`SanitizeError::EmptyInput`](crate::SanitizeError::EmptyInput)
    /// for blank input instead of an empty string.
    pub fn reject_empty_input(&mut self, reject: bool) -> &mut Self {
        self.reject_empty_input = reject;
        self
    }

    pub(crate) fn allow_element(&mut self, name: &str) -> &mut HashMap<String, Rule> {
        self.skip_content.remove(name);
        self.elements.entry(name.to_string()).or_default()
    }

    pub(crate) fn pattern_rule(&mut self, pattern: Regex) -> &mut PatternRule {
        pattern_entry(&mut self.element_patterns, pattern)
    }

    pub(crate) fn style_pattern_rule(&mut self, pattern: Regex) -> &mut PatternRule {
        pattern_entry(&mut self.pattern_styles, pattern)
    }

    fn matches_pattern(&self, element: &str) -> bool {
        self.element_patterns
            .iter()
            .any(|p| p.pattern.is_match(element))
    }

    /// Whether an element name is allowed by an exact or pattern rule.
    pub(crate) fn is_element_allowed(&self, element: &str) -> bool {
        self.elements.contains_key(element) || self.matches_pattern(element)
    }

    pub(crate) fn element_action(&self, element: &str) -> ElementAction {
        if self.skip_content.contains(element) {
            return ElementAction::Skip;
        }
        if RAW_UNSAFE_ELEMENTS.contains(&element) && !self.allow_unsafe {
            return if self.content_only.contains(element) {
                ElementAction::Strip
            } else {
                ElementAction::Skip
            };
        }
        if self.is_element_allowed(element) {
            ElementAction::Allow
        } else {
            ElementAction::Strip
        }
    }

    pub(crate) fn attr_rule(&self, element: &str, attr: &str) -> Option<&Rule> {
        if let Some(rule) = self.elements.get(element).and_then(|rules| rules.get(attr)) {
            return Some(rule);
        }
        if let Some(rule) = first_pattern_rule(&self.element_patterns, element, attr) {
            return Some(rule);
        }
        self.global_attrs.get(attr)
    }

    pub(crate) fn style_rule(&self, element: &str, property: &str) -> Option<&Rule> {
        if let Some(rule) = self
            .element_styles
            .get(element)
            .and_then(|rules| rules.get(property))
        {
            return Some(rule);
        }
        if let Some(rule) = first_pattern_rule(&self.pattern_styles, element, property) {
            return Some(rule);
        }
        self.global_styles.get(property)
    }

    pub(crate) fn has_style_rules_for(&self, element: &str) -> bool {
        !self.global_styles.is_empty()
            || self
                .element_styles
                .get(element)
                .is_some_and(|rules| !rules.is_empty())
            || self
                .pattern_styles
                .iter()
                .any(|p| p.pattern.is_match(element))
    }

    pub(crate) fn allows_no_attrs(&self, element: &str) -> bool {
        self.no_attrs_elements.contains(element)
            || self.no_attrs_patterns.iter().any(|re| re.is_match(element))
    }
}

fn pattern_entry(rules: &mut Vec<PatternRule>, pattern: Regex) -> &mut PatternRule {
    let existing = rules
        .iter()
        .position(|p| p.pattern.as_str() == pattern.as_str());
    let index = match existing {
        Some(index) => index,
        None => {
            rules.push(PatternRule {
                pattern,
                attrs: HashMap::new(),
            });
            rules.len() - 1
        }
    };
    &mut rules[index]
}

fn first_pattern_rule<'a>(rules: &'a [PatternRule], element: &str, key: &str) -> Option<&'a Rule> {
    rules
        .iter()
        .filter(|p| p.pattern.is_match(element))
        .find_map(|p| p.attrs.get(key))
}

impl Default for Policy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut elements: Vec<&String> = self.elements.keys().collect();
        elements.sort();
        let mut schemes: Vec<&String> = self.url_schemes.keys().collect();
        schemes.sort();
        f.debug_struct("Policy")
            .field("elements", &elements)
            .field("element_patterns", &self.element_patterns.len())
            .field("global_attrs", &self.global_attrs.len())
            .field("url_schemes", &schemes)
            .field("require_parseable_urls", &self.require_parseable_urls)
            .field("allow_relative_urls", &self.allow_relative_urls)
            .field("allow_unsafe", &self.allow_unsafe)
            .finish_non_exhaustive()
    }
}
