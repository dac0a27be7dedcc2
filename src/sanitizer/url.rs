//! Validation of URL-valued attributes against the policy's scheme rules.

use std::sync::LazyLock;

use url::{ParseError, Url};

use crate::policy::Policy;

const RELATIVE_HOST: &str = "relative.invalid";

/// Base that relative references are resolved against. Anything that
/// resolves to another host leaves the page.
static RELATIVE_BASE: LazyLock<Option<Url>> =
    LazyLock::new(|| Url::parse(&format!("http://{RELATIVE_HOST}/")).ok());

fn resolve(raw: &str) -> Option<Url> {
    RELATIVE_BASE.as_ref().and_then(|base| base.join(raw).ok())
}

fn is_off_site(url: &Url) -> bool {
    url.host_str().is_some_and(|host| host != RELATIVE_HOST)
}

/// Whether `attr` carries a URL on `element`.
pub(crate) fn is_url_attr(element: &str, attr: &str) -> bool {
    match attr {
        "href" => matches!(element, "a" | "area" | "base" | "link"),
        "cite" => matches!(element, "blockquote" | "del" | "ins" | "q"),
        "src" => matches!(
            element,
            "audio" | "embed" | "iframe" | "img" | "input" | "script" | "track" | "video"
        ),
        _ => false,
    }
}

/// A URL that passed validation.
#[derive(Debug)]
pub(crate) enum CheckedUrl {
    /// Emitted in its normalized form.
    Absolute(Url),
    /// Emitted as written except for `\`, which browsers read as `/`.
    Relative { reference: String, off_site: bool },
    /// URL checks are off; emitted exactly as written.
    Unchecked(String),
}

impl CheckedUrl {
    /// Host-bearing URLs point somewhere else and get the fully-qualified
    /// link treatment. Relative references count when they resolve to
    /// another host, as `//host/` and `/\host/` do.
    pub(crate) fn is_fully_qualified(&self) -> bool {
        match self {
            CheckedUrl::Absolute(url) => url.host().is_some(),
            CheckedUrl::Relative { off_site, .. } => *off_site,
            CheckedUrl::Unchecked(raw) => resolve(raw).is_some_and(|url| is_off_site(&url)),
        }
    }

    pub(crate) fn into_string(self) -> String {
        match self {
            CheckedUrl::Absolute(url) => url.into(),
            CheckedUrl::Relative { reference, .. } => reference,
            CheckedUrl::Unchecked(raw) => raw,
        }
    }
}

/// Check `raw` against the policy's URL rules. `None` drops the attribute.
pub(crate) fn validate_url(raw: &str, policy: &Policy) -> Option<CheckedUrl> {
    if !policy.require_parseable_urls {
        return Some(CheckedUrl::Unchecked(raw.to_string()));
    }

    if raw.bytes().any(|b| b.is_ascii_whitespace()) {
        tracing::trace!("Rejecting URL containing whitespace: {raw}");
        return None;
    }

    match Url::parse(raw) {
        Ok(url) => {
            let allowed = match policy.url_schemes.get(url.scheme()) {
                Some(Some(predicate)) => predicate(&url),
                Some(None) => true,
                None => false,
            };
            if allowed {
                Some(CheckedUrl::Absolute(url))
            } else {
                tracing::trace!("Rejecting URL with disallowed scheme: {}", url.scheme());
                None
            }
        }
        Err(ParseError::RelativeUrlWithoutBase) if policy.allow_relative_urls => {
            let meaningful = !raw.trim_matches(|c| c == '#' || c == '?').is_empty();
            match resolve(raw) {
                Some(url) if meaningful => Some(CheckedUrl::Relative {
                    reference: raw.replace('\\', "%5C"),
                    off_site: is_off_site(&url),
                }),
                _ => {
                    tracing::trace!("Rejecting unusable relative URL: {raw}");
                    None
                }
            }
        }
        Err(e) => {
            tracing::trace!("Rejecting unparseable URL {raw}: {e}");
            None
        }
    }
}
