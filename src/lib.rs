//! # html_policy
//!
//! An allowlist-based HTML sanitizer for untrusted markup.
//!
//! ## Overview
//!
//! A [`Policy`] declares which elements, attributes, attribute values,
//! inline style declarations and URL schemes may appear in the output.
//! Everything else is removed: unknown elements lose their tags but keep
//! their (escaped) text, while elements such as `script` and `style` are
//! dropped together with their content.
//!
//! Sanitizing is a single streaming pass over the tokens of the input. No
//! document tree is built, so memory use stays flat regardless of input
//! size, and a policy can be shared by any number of threads.
//!
//! ## Quick start
//!
//! ```rust
//! use html_policy::Policy;
//!
//! let mut policy = Policy::new();
//! policy
//!     .allow_elements(&["p", "em", "strong"])
//!     .allow_attrs(&["href"])
//!     .on_elements(&["a"])
//!     .allow_url_schemes(&["https"])
//!     .require_no_follow_on_links(true)
//!     .add_target_blank_to_fully_qualified_links(true);
//!
//! let clean = policy.sanitize(
//!     r#"<p>See <a href="https://example.com/" onmouseover="steal()">this</a><script>evil()</script></p>"#,
//! );
//! assert_eq!(
//!     clean,
//!     r#"<p>See <a href="https://example.com/" rel="nofollow noopener" target="_blank">this</a></p>"#,
//! );
//! ```
//!
//! Ready-made policies are available as [`Policy::strict`],
//! [`Policy::strip_tags`] and [`Policy::ugc`].
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `async` | **yes** | Enables [`SanitizerHandle`], which runs sanitize calls on tokio's blocking pool with optional deadlines. |

pub mod error;
#[cfg(feature = "async")]
pub mod handle;
pub mod policy;
pub mod sanitizer;

pub use error::{Result, SanitizeError};
#[cfg(feature = "async")]
pub use handle::SanitizerHandle;
pub use policy::{
    AttrPolicyBuilder, Matcher, NoAttrsBuilder, Policy, SandboxValue, SrcRewriter,
    StylePolicyBuilder, UrlPredicate, ValuePredicate, patterns,
};
pub use sanitizer::Sanitizer;
pub use sanitizer::tokens::{Attribute, Doctype, HtmlTokens, Token, TokenIter, TokenSource};
