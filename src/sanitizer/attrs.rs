//! Per-element attribute resolution and the link, crossorigin and sandbox
//! adjustments applied to the attributes that survive.

use super::style::filter_style;
use super::tokens::Attribute;
use super::url::{CheckedUrl, is_url_attr, validate_url};
use crate::policy::Policy;

const LINK_ELEMENTS: &[&str] = &["a", "area", "base", "link"];
const CROSS_ORIGIN_ELEMENTS: &[&str] = &["audio", "img", "link", "script", "video"];

/// `data-*` attributes that are safe to pass through: a non-empty suffix
/// that does not start with `xml` and contains no `;` or uppercase letters.
pub(crate) fn is_data_attribute(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("data-") else {
        return false;
    };
    !rest.is_empty()
        && !rest
            .get(..3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("xml"))
        && !rest.chars().any(|c| c == ';' || c.is_ascii_uppercase())
}

/// Run every attribute of `element` through the policy and return the
/// survivors, in source order, with link safety applied.
pub(crate) fn resolve_attrs(element: &str, attrs: Vec<Attribute>, policy: &Policy) -> Vec<Attribute> {
    let mut kept = Vec::with_capacity(attrs.len());
    // Whether a surviving `href` points at another host.
    let mut href: Option<bool> = None;

    for attr in attrs {
        let name = attr.name.to_ascii_lowercase();

        if policy.allow_data_attributes && is_data_attribute(&name) {
            kept.push(Attribute::new(name, attr.value));
            continue;
        }

        if name == "style" && policy.has_style_rules_for(element) {
            let filtered = filter_style(element, &attr.value, policy);
            if filtered.is_empty() {
                tracing::trace!("Dropping empty style attribute on <{element}>");
            } else {
                kept.push(Attribute::new(name, filtered));
            }
            continue;
        }

        let Some(rule) = policy.attr_rule(element, &name) else {
            tracing::trace!("Dropping {name} on <{element}>: no rule");
            continue;
        };
        let value = attr.value.trim();
        if !rule.accepts(value) {
            tracing::trace!("Dropping {name} on <{element}>: value rejected");
            continue;
        }

        if !is_url_attr(element, &name) {
            kept.push(Attribute::new(name, attr.value));
            continue;
        }

        let Some(mut url) = validate_url(value, policy) else {
            continue;
        };
        if name == "src" {
            if let (Some(rewrite), CheckedUrl::Absolute(parsed)) = (&policy.rewrite_src, &mut url) {
                rewrite(parsed);
            }
        }
        if name == "href" {
            href = Some(url.is_fully_qualified());
        }
        kept.push(Attribute::new(name, url.into_string()));
    }

    if kept.is_empty() {
        return kept;
    }

    if LINK_ELEMENTS.contains(&element) {
        if let Some(fully_qualified) = href {
            apply_link_safety(element, fully_qualified, &mut kept, policy);
        }
    }

    if policy.require_cross_origin_anonymous && CROSS_ORIGIN_ELEMENTS.contains(&element) {
        set_attr(&mut kept, "crossorigin", "anonymous".to_string());
    }

    kept
}

/// Apply the `iframe` sandbox requirement, if any, to `attrs`.
///
/// Runs after the wrapper decision so that an emitted `iframe` always
/// carries a `sandbox` attribute.
pub(crate) fn apply_sandbox(element: &str, attrs: &mut Vec<Attribute>, policy: &Policy) {
    let Some(allowed) = &policy.sandbox_values else {
        return;
    };
    if element != "iframe" {
        return;
    }

    let mut tokens: Vec<&'static str> = Vec::new();
    if let Some(existing) = attrs.iter().find(|a| a.name == "sandbox") {
        for token in existing.value.split_ascii_whitespace() {
            let known = allowed
                .iter()
                .map(|v| v.as_str())
                .find(|v| v.eq_ignore_ascii_case(token));
            if let Some(known) = known {
                if !tokens.contains(&known) {
                    tokens.push(known);
                }
            }
        }
    }
    set_attr(attrs, "sandbox", tokens.join(" "));
}

fn apply_link_safety(element: &str, fully_qualified: bool, attrs: &mut Vec<Attribute>, policy: &Policy) {
    let mut rel_tokens: Vec<&str> = Vec::new();
    if policy.require_no_follow || (fully_qualified && policy.require_no_follow_fully_qualified) {
        rel_tokens.push("nofollow");
    }
    if policy.require_no_referrer
        || (fully_qualified && policy.require_no_referrer_fully_qualified)
    {
        rel_tokens.push("noreferrer");
    }

    let mut append_target = false;
    if element == "a" && fully_qualified && policy.add_target_blank {
        match attrs.iter_mut().find(|a| a.name == "target") {
            Some(target) => target.value = "_blank".to_string(),
            None => append_target = true,
        }
    }

    let blank_target = append_target
        || attrs
            .iter()
            .any(|a| a.name == "target" && a.value.trim().eq_ignore_ascii_case("_blank"));
    if blank_target {
        rel_tokens.push("noopener");
    }

    if !rel_tokens.is_empty() {
        match attrs.iter_mut().find(|a| a.name == "rel") {
            Some(rel) => {
                let mut merged: Vec<String> = Vec::new();
                for token in rel
                    .value
                    .split_ascii_whitespace()
                    .chain(rel_tokens.iter().copied())
                {
                    if !merged.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                        merged.push(token.to_string());
                    }
                }
                rel.value = merged.join(" ");
            }
            None => attrs.push(Attribute::new("rel", rel_tokens.join(" "))),
        }
    }

    if append_target {
        attrs.push(Attribute::new("target", "_blank"));
    }
}

/// Overwrite `name` in place, or append it.
fn set_attr(attrs: &mut Vec<Attribute>, name: &str, value: String) {
    match attrs.iter_mut().find(|a| a.name == name) {
        Some(attr) => attr.value = value,
        None => attrs.push(Attribute::new(name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SandboxValue;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<Attribute> {
        pairs.iter().map(|(n, v)| Attribute::new(*n, *v)).collect()
    }

    fn render(attrs: &[Attribute]) -> String {
        attrs
            .iter()
            .map(|a| format!("{}={:?}", a.name, a.value))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn link_policy() -> Policy {
        let mut policy = Policy::new();
        policy
            .allow_attrs(&["href", "rel", "target"])
            .on_elements(&["a"])
            .allow_url_schemes(&["https"])
            .allow_relative_urls(true);
        policy
    }

    #[test]
    fn data_attribute_names() {
        assert!(is_data_attribute("data-id"));
        assert!(is_data_attribute("data-x-y"));
        assert!(!is_data_attribute("data-"));
        assert!(!is_data_attribute("data-xmlfoo"));
        assert!(!is_data_attribute("data-XMLfoo"));
        assert!(!is_data_attribute("data-a;b"));
        assert!(!is_data_attribute("data-camelCase"));
        assert!(!is_data_attribute("dataset"));
    }

    #[test]
    fn unknown_attributes_are_dropped() {
        let mut policy = Policy::new();
        policy.allow_attrs(&["title"]).on_elements(&["p"]);
        let out = resolve_attrs(
            "p",
            attrs(&[("onclick", "x()"), ("title", "hi")]),
            &policy,
        );
        assert_eq!(render(&out), r#"title="hi""#);
    }

    #[test]
    fn matcher_sees_trimmed_value() {
        let mut policy = Policy::new();
        policy
            .allow_attrs(&["width"])
            .matching_pattern("^[0-9]+$")
            .unwrap()
            .on_elements(&["img"]);
        let out = resolve_attrs("img", attrs(&[("width", " 10 ")]), &policy);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn nofollow_added_to_links() {
        let mut policy = link_policy();
        policy.require_no_follow_on_links(true);
        let out = resolve_attrs("a", attrs(&[("href", "/local")]), &policy);
        assert_eq!(render(&out), r#"href="/local" rel="nofollow""#);
    }

    #[test]
    fn fully_qualified_variants_ignore_local_links() {
        let mut policy = link_policy();
        policy
            .require_no_follow_on_fully_qualified_links(true)
            .require_no_referrer_on_fully_qualified_links(true);
        let local = resolve_attrs("a", attrs(&[("href", "/local")]), &policy);
        assert_eq!(render(&local), r#"href="/local""#);

        let external = resolve_attrs("a", attrs(&[("href", "//example.com/")]), &policy);
        assert_eq!(
            render(&external),
            r#"href="//example.com/" rel="nofollow noreferrer""#
        );
    }

    #[test]
    fn rel_tokens_merge_without_duplicates() {
        let mut policy = link_policy();
        policy.require_no_follow_on_links(true).require_no_referrer_on_links(true);
        let out = resolve_attrs(
            "a",
            attrs(&[("rel", "author NOFOLLOW"), ("href", "https://example.com/")]),
            &policy,
        );
        assert_eq!(
            render(&out),
            r#"rel="author NOFOLLOW noreferrer" href="https://example.com/""#
        );
    }

    #[test]
    fn target_blank_forced_after_rel() {
        let mut policy = link_policy();
        policy
            .require_no_follow_on_links(true)
            .add_target_blank_to_fully_qualified_links(true);
        let out = resolve_attrs("a", attrs(&[("href", "https://example.com/")]), &policy);
        assert_eq!(
            render(&out),
            r#"href="https://example.com/" rel="nofollow noopener" target="_blank""#
        );
    }

    #[test]
    fn existing_target_overwritten_in_place() {
        let mut policy = link_policy();
        policy.add_target_blank_to_fully_qualified_links(true);
        let out = resolve_attrs(
            "a",
            attrs(&[("target", "_self"), ("href", "https://example.com/")]),
            &policy,
        );
        assert_eq!(
            render(&out),
            r#"target="_blank" href="https://example.com/" rel="noopener""#
        );
    }

    #[test]
    fn user_blank_target_gets_noopener() {
        let policy = link_policy();
        let out = resolve_attrs(
            "a",
            attrs(&[("href", "/x"), ("target", "_blank")]),
            &policy,
        );
        assert_eq!(render(&out), r#"href="/x" target="_blank" rel="noopener""#);
    }

    #[test]
    fn rejected_href_skips_link_safety() {
        let mut policy = link_policy();
        policy.require_no_follow_on_links(true);
        let out = resolve_attrs("a", attrs(&[("href", "javascript:alert(1)")]), &policy);
        assert!(out.is_empty());
    }

    #[test]
    fn src_rewrite_applies_to_absolute_urls() {
        let mut policy = Policy::new();
        policy
            .allow_attrs(&["src"])
            .on_elements(&["img"])
            .allow_url_schemes(&["https"])
            .allow_relative_urls(true)
            .rewrite_src(|url| {
                url.set_query(Some("proxied=1"));
            });
        let out = resolve_attrs("img", attrs(&[("src", "https://cdn.example/a.png")]), &policy);
        assert_eq!(render(&out), r#"src="https://cdn.example/a.png?proxied=1""#);
        let out = resolve_attrs("img", attrs(&[("src", "/a.png")]), &policy);
        assert_eq!(render(&out), r#"src="/a.png""#);
    }

    #[test]
    fn crossorigin_forced_on_media() {
        let mut policy = Policy::new();
        policy
            .allow_attrs(&["src", "crossorigin"])
            .on_elements(&["img"])
            .require_cross_origin_anonymous(true);
        let out = resolve_attrs(
            "img",
            attrs(&[("crossorigin", "use-credentials"), ("src", "a.png")]),
            &policy,
        );
        assert_eq!(render(&out), r#"crossorigin="anonymous" src="a.png""#);
        assert!(resolve_attrs("img", Vec::new(), &policy).is_empty());
    }

    #[test]
    fn sandbox_tokens_filtered() {
        let mut policy = Policy::new();
        policy.require_sandbox_on_iframe(&[SandboxValue::AllowForms, SandboxValue::AllowScripts]);
        let mut out = attrs(&[
            ("src", "x"),
            ("sandbox", "allow-scripts allow-top-navigation allow-scripts allow-forms"),
        ]);
        apply_sandbox("iframe", &mut out, &policy);
        assert_eq!(render(&out), r#"src="x" sandbox="allow-scripts allow-forms""#);

        let mut out = attrs(&[("src", "x")]);
        apply_sandbox("iframe", &mut out, &policy);
        assert_eq!(render(&out), r#"src="x" sandbox="""#);
    }

    #[test]
    fn style_attribute_uses_style_rules() {
        let mut policy = Policy::new();
        policy
            .allow_elements(&["p"])
            .allow_styles(&["color"])
            .on_elements(&["p"]);
        let out = resolve_attrs("p", attrs(&[("style", "color: red; top: 0")]), &policy);
        assert_eq!(render(&out), r#"style="color: red""#);
        let out = resolve_attrs("p", attrs(&[("style", "top: 0")]), &policy);
        assert!(out.is_empty());
    }

    #[test]
    fn data_attributes_when_enabled() {
        let mut policy = Policy::new();
        policy.allow_elements(&["div"]).allow_data_attributes(true);
        let out = resolve_attrs(
            "div",
            attrs(&[("data-id", "7"), ("data-xmlx", "1"), ("onclick", "x")]),
            &policy,
        );
        assert_eq!(render(&out), r#"data-id="7""#);
    }
}
