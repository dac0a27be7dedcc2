//! The single-pass token sanitizer.
//!
//! Tokens are pulled from a [`TokenSource`] one at a time and either
//! written out (possibly with fewer attributes), replaced by nothing (or a
//! space), or swallowed together with everything up to the matching end tag.
//! Nothing is buffered beyond the current token and the stack of open
//! elements, so output is produced while input is still being read.
//!
//! Submodules:
//!
//! - [`tokens`] -- the token model and the `html5ever` adapter.
//! - `attrs` -- attribute resolution and link safety.
//! - `style` -- inline `style` filtering.
//! - `url` -- URL validation.
//! - `output` -- serialization.

mod attrs;
mod output;
mod style;
pub mod tokens;
mod url;

use std::collections::HashMap;
use std::io::{self, Read, Write};

use self::attrs::{apply_sandbox, resolve_attrs};
use self::output::{IoSink, Sink};
use self::tokens::{Attribute, HtmlTokens, Token, TokenSource};
use crate::error::{Result, SanitizeError};
use crate::policy::{ElementAction, Policy};

/// Anything that turns untrusted markup into safe markup.
///
/// Implemented by [`Policy`] and [`SanitizerHandle`](crate::SanitizerHandle),
/// so code that only needs to clean strings can accept either.
pub trait Sanitizer: Send + Sync {
    /// Return the sanitized form of `html`, or an empty string on failure.
    fn sanitize(&self, html: &str) -> String;
}

impl Sanitizer for Policy {
    fn sanitize(&self, html: &str) -> String {
        Policy::sanitize(self, html)
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Disposition {
    Emitted,
    Stripped,
    Skipped,
}

#[derive(Debug)]
struct OpenElement {
    disposition: Disposition,
    /// Closed entries stay in place until everything above them is closed
    /// too, so indices held elsewhere stay valid.
    closed: bool,
}

/// Per-call sanitizer state.
///
/// Every operation on the open-element stack is amortized O(1), so hostile
/// input such as thousands of unmatched end tags stays linear.
struct Engine<'p, S> {
    policy: &'p Policy,
    sink: S,
    open: Vec<OpenElement>,
    /// Indices of the open entries for each element name, innermost last.
    by_name: HashMap<String, Vec<usize>>,
    /// Indices of `Skipped` entries, outermost first. The last one is always
    /// open; closed ones before it are passed over by `skip_floor`.
    skipped: Vec<usize>,
    /// Position in `skipped` of the outermost open `Skipped` entry.
    skip_floor: usize,
    /// Number of open `Skipped` entries.
    skip_depth: usize,
    /// Set right after an emitted `script`/`style` start tag: its text is
    /// written unescaped.
    raw_text: bool,
}

impl<'p, S: Sink> Engine<'p, S> {
    fn new(policy: &'p Policy, sink: S) -> Self {
        Self {
            policy,
            sink,
            open: Vec::new(),
            by_name: HashMap::new(),
            skipped: Vec::new(),
            skip_floor: 0,
            skip_depth: 0,
            raw_text: false,
        }
    }

    fn run<T: TokenSource>(&mut self, mut source: T) -> Result<()> {
        while let Some(token) = source.next_token()? {
            self.process(token)?;
        }
        Ok(())
    }

    fn into_sink(self) -> S {
        self.sink
    }

    fn process(&mut self, token: Token) -> Result<()> {
        match token {
            Token::StartTag { name, attrs } => self.start_tag(name, attrs, false)?,
            Token::SelfClosingTag { name, attrs } => self.start_tag(name, attrs, true)?,
            Token::EndTag { name } => self.end_tag(name)?,
            Token::Text(text) => {
                if self.skip_depth > 0 {
                    return Ok(());
                }
                if self.raw_text {
                    self.sink.write_str(&text)?;
                } else {
                    self.sink.write_escaped(&text)?;
                }
            }
            Token::Comment(text) => {
                if self.skip_depth == 0 && self.policy.allow_comments {
                    self.sink.write_comment(&text)?;
                }
            }
            Token::Doctype(doctype) => {
                if self.skip_depth == 0 && self.policy.allow_doc_type {
                    self.sink.write_doctype(&doctype)?;
                }
            }
            Token::Error(message) => return Err(SanitizeError::Tokenizer(message)),
            Token::Unsupported(kind) => return Err(SanitizeError::UnsupportedToken(kind)),
        }
        Ok(())
    }

    fn push(&mut self, name: String, disposition: Disposition) {
        let index = self.open.len();
        if disposition == Disposition::Skipped {
            self.skip_depth += 1;
            self.skipped.push(index);
        }
        self.by_name.entry(name).or_default().push(index);
        self.open.push(OpenElement {
            disposition,
            closed: false,
        });
    }

    /// Mark the entry at `index` closed and drop any closed entries left on
    /// top of the stack.
    fn close(&mut self, index: usize) {
        let Some(entry) = self.open.get_mut(index) else {
            return;
        };
        entry.closed = true;
        if entry.disposition == Disposition::Skipped {
            self.skip_depth -= 1;
            if self.skip_depth == 0 {
                self.skipped.clear();
                self.skip_floor = 0;
            } else {
                let open = &self.open;
                while self.skipped.last().is_some_and(|&i| open[i].closed) {
                    self.skipped.pop();
                }
                while self
                    .skipped
                    .get(self.skip_floor)
                    .is_some_and(|&i| open[i].closed)
                {
                    self.skip_floor += 1;
                }
            }
        }
        while self.open.last().is_some_and(|e| e.closed) {
            self.open.pop();
        }
    }

    fn space(&mut self) -> io::Result<()> {
        if self.policy.add_space_on_strip {
            self.sink.write_str(" ")?;
        }
        Ok(())
    }

    fn start_tag(&mut self, name: String, attrs: Vec<Attribute>, self_closing: bool) -> io::Result<()> {
        let name = name.to_ascii_lowercase();
        self.raw_text = false;
        let has_content = !self_closing && !is_void(&name);
        let action = self.policy.element_action(&name);

        if self.skip_depth > 0 {
            if has_content {
                let disposition = match action {
                    ElementAction::Skip => Disposition::Skipped,
                    _ => Disposition::Stripped,
                };
                self.push(name, disposition);
            }
            return Ok(());
        }

        match action {
            ElementAction::Skip => {
                tracing::debug!("Skipping <{name}> and its content");
                self.space()?;
                if has_content {
                    self.push(name, Disposition::Skipped);
                }
            }
            ElementAction::Strip => {
                tracing::debug!("Stripping <{name}>");
                self.space()?;
                if has_content {
                    self.push(name, Disposition::Stripped);
                }
            }
            ElementAction::Allow => {
                let mut attrs = resolve_attrs(&name, attrs, self.policy);
                if attrs.is_empty() && !self.policy.allows_no_attrs(&name) {
                    tracing::trace!("Stripping <{name}>: no attributes left");
                    self.space()?;
                    if has_content {
                        self.push(name, Disposition::Stripped);
                    }
                    return Ok(());
                }
                apply_sandbox(&name, &mut attrs, self.policy);
                self.sink.write_start_tag(&name, &attrs, self_closing)?;
                if has_content {
                    self.raw_text = matches!(name.as_str(), "script" | "style");
                    self.push(name, Disposition::Emitted);
                }
            }
        }
        Ok(())
    }

    fn end_tag(&mut self, name: String) -> io::Result<()> {
        let name = name.to_ascii_lowercase();
        self.raw_text = false;

        // While skipping, only elements opened inside the skipped subtree
        // can be closed.
        let floor = if self.skip_depth > 0 {
            self.skipped.get(self.skip_floor).copied().unwrap_or(0)
        } else {
            0
        };

        let found = self
            .by_name
            .get_mut(&name)
            .and_then(|indices| match indices.last().copied() {
                Some(index) if index >= floor => indices.pop(),
                _ => None,
            });
        let Some(index) = found else {
            if self.skip_depth > 0 {
                return Ok(());
            }
            if self.policy.element_action(&name) == ElementAction::Allow && !is_void(&name) {
                self.sink.write_end_tag(&name)?;
            } else {
                self.space()?;
            }
            return Ok(());
        };

        let disposition = self.open[index].disposition;
        self.close(index);
        match disposition {
            Disposition::Emitted => {
                if self.skip_depth == 0 {
                    self.sink.write_end_tag(&name)?;
                }
            }
            Disposition::Stripped | Disposition::Skipped => {
                if self.skip_depth == 0 {
                    self.space()?;
                }
            }
        }
        Ok(())
    }
}

impl Policy {
    /// Sanitize `html`, returning an empty string if anything goes wrong.
    ///
    /// Whitespace-only input yields an empty string.
    ///
    /// ```
    /// use html_policy::Policy;
    ///
    /// let mut policy = Policy::new();
    /// policy.allow_elements(&["b"]);
    /// assert_eq!(
    ///     policy.sanitize("<b>bold</b><script>alert(1)</script>"),
    ///     "<b>bold</b>"
    /// );
    /// ```
    pub fn sanitize(&self, html: &str) -> String {
        match self.try_sanitize(html) {
            Ok(out) => out,
            Err(e) => {
                tracing::debug!("Sanitize failed, returning empty output: {e}");
                String::new()
            }
        }
    }

    /// Sanitize `html`, reporting failures instead of hiding them.
    pub fn try_sanitize(&self, html: &str) -> Result<String> {
        if html.trim_ascii().is_empty() {
            return self.blank_input().map(|()| String::new());
        }
        self.sanitize_tokens(HtmlTokens::new(html.as_bytes()))
    }

    /// Sanitize UTF-8 bytes. Invalid sequences become U+FFFD.
    pub fn sanitize_bytes(&self, html: &[u8]) -> Result<String> {
        if html.trim_ascii().is_empty() {
            return self.blank_input().map(|()| String::new());
        }
        self.sanitize_tokens(HtmlTokens::new(html))
    }

    /// Read and sanitize markup from `reader` in fixed-size chunks.
    pub fn sanitize_reader<R: Read>(&self, reader: R) -> Result<String> {
        let mut tokens = HtmlTokens::new(reader);
        if tokens.is_blank()? {
            return self.blank_input().map(|()| String::new());
        }
        self.sanitize_tokens(tokens)
    }

    /// Read markup from `reader` and write the sanitized form to `writer`
    /// as it is produced.
    ///
    /// On error, `writer` may already hold part of the output.
    pub fn sanitize_to_writer<R: Read, W: Write>(&self, reader: R, writer: W) -> Result<()> {
        let mut tokens = HtmlTokens::new(reader);
        if tokens.is_blank()? {
            return self.blank_input();
        }
        let mut engine = Engine::new(self, IoSink::new(writer));
        engine.run(tokens)?;
        engine.into_sink().flush()?;
        Ok(())
    }

    /// Sanitize the tokens produced by any [`TokenSource`].
    pub fn sanitize_tokens<T: TokenSource>(&self, tokens: T) -> Result<String> {
        let mut engine = Engine::new(self, String::new());
        engine.run(tokens)?;
        Ok(engine.into_sink())
    }

    fn blank_input(&self) -> Result<()> {
        if self.reject_empty_input {
            Err(SanitizeError::EmptyInput)
        } else {
            Ok(())
        }
    }
}
