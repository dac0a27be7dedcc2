//! Filtering of inline `style` attribute values, one declaration at a time.

use std::sync::LazyLock;

use regex::Regex;

use crate::policy::Policy;

/// Constructs that can run script or pull in a resource from a style value.
/// Applied when a style rule has no matcher of its own.
static UNSAFE_STYLE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(expression\s*\(|url\s*\(|image-set\s*\(|javascript\s*:|vbscript\s*:|-moz-binding|behaviou?r|@import|\\)",
    )
    .expect("UNSAFE_STYLE_VALUE regex is valid")
});

/// Split a style value into `(property, value)` pairs.
///
/// Declarations are separated by `;` outside of quotes and parentheses, and
/// each one is split at its first `:`. Pieces without a colon or with an
/// empty property are skipped.
pub(crate) fn declarations(style: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in style.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' | '\'' => match quote {
                Some(q) if q == c => quote = None,
                None => quote = Some(c),
                Some(_) => {}
            },
            '(' if quote.is_none() => depth += 1,
            ')' if quote.is_none() => depth = depth.saturating_sub(1),
            ';' if quote.is_none() && depth == 0 => {
                if let Some(decl) = split_declaration(&style[start..i]) {
                    out.push(decl);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if let Some(decl) = split_declaration(&style[start..]) {
        out.push(decl);
    }
    out
}

fn split_declaration(piece: &str) -> Option<(&str, &str)> {
    let (property, value) = piece.split_once(':')?;
    let property = property.trim();
    if property.is_empty() {
        return None;
    }
    Some((property, value.trim()))
}

/// Keep only the declarations the policy allows on `element`.
///
/// Returns an empty string when nothing survives.
pub(crate) fn filter_style(element: &str, style: &str, policy: &Policy) -> String {
    let mut kept: Vec<String> = Vec::new();
    for (property, value) in declarations(style) {
        let key = property.to_ascii_lowercase();
        let allowed = match policy.style_rule(element, &key) {
            Some(rule) => match &rule.matcher {
                Some(matcher) => matcher.accepts(value),
                None => !UNSAFE_STYLE_VALUE.is_match(value),
            },
            None => false,
        };
        if allowed {
            kept.push(format!("{property}: {value}"));
        } else {
            tracing::trace!("Dropping style declaration {property} on <{element}>");
        }
    }
    kept.join("; ")
}
