//! The token model the sanitizer consumes, and an adapter that produces it
//! from markup with `html5ever`'s standalone tokenizer.
//!
//! The engine only ever pulls tokens through [`TokenSource`], so any lexer
//! can drive it. [`HtmlTokens`] is the built-in source: it reads bytes from
//! any [`Read`] in fixed-size chunks, decodes them as UTF-8 (lossily) and
//! feeds them to the tokenizer, which switches into raw-text modes for
//! elements such as `script`, `style` and `textarea` just like a browser.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    self as h5, BufferQueue, TagKind, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

use crate::error::Result;

const CHUNK_SIZE: usize = 8 * 1024;

/// One attribute of a start or self-closing tag, in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A `<!DOCTYPE>` declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Doctype {
    pub name: Option<String>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// A lexical unit of markup.
///
/// Element and attribute names are expected in lowercase; text and
/// attribute values are expected with character references already decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    StartTag { name: String, attrs: Vec<Attribute> },
    EndTag { name: String },
    SelfClosingTag { name: String, attrs: Vec<Attribute> },
    Text(String),
    Comment(String),
    Doctype(Doctype),
    /// A lexical error the source could not recover from. Aborts the call.
    Error(String),
    /// A token kind the source cannot map onto this model. Aborts the call.
    Unsupported(String),
}

/// A pull-based stream of [`Token`]s.
pub trait TokenSource {
    /// Return the next token, or `Ok(None)` once the input is exhausted.
    fn next_token(&mut self) -> Result<Option<Token>>;
}

impl<T: TokenSource + ?Sized> TokenSource for &mut T {
    fn next_token(&mut self) -> Result<Option<Token>> {
        (**self).next_token()
    }
}

/// A [`TokenSource`] over an in-memory sequence of tokens.
///
/// ```
/// use html_policy::{Policy, Token, TokenIter};
///
/// let tokens = TokenIter::new(vec![
///     Token::StartTag { name: "b".into(), attrs: vec![] },
///     Token::Text("bold & brave".into()),
///     Token::EndTag { name: "b".into() },
/// ]);
///
/// let mut policy = Policy::new();
/// policy.allow_elements(&["b"]);
/// assert_eq!(policy.sanitize_tokens(tokens).unwrap(), "<b>bold &amp; brave</b>");
/// ```
#[derive(Debug)]
pub struct TokenIter<I> {
    inner: I,
}

impl<I: Iterator<Item = Token>> TokenIter<I> {
    pub fn new(tokens: impl IntoIterator<Item = Token, IntoIter = I>) -> Self {
        Self {
            inner: tokens.into_iter(),
        }
    }
}

impl<I: Iterator<Item = Token>> TokenSource for TokenIter<I> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        Ok(self.inner.next())
    }
}

/// Collects converted tokens and tells the tokenizer when to switch into a
/// raw-text state.
#[derive(Default)]
struct Collector {
    tokens: RefCell<VecDeque<Token>>,
}

impl Collector {
    fn push(&self, token: Token) {
        self.tokens.borrow_mut().push_back(token);
    }
}

/// Content model of the elements whose text the tokenizer must not parse
/// as markup.
fn raw_text_mode(name: &str) -> Option<TokenSinkResult<()>> {
    match name {
        "script" => Some(TokenSinkResult::RawData(RawKind::ScriptData)),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
            Some(TokenSinkResult::RawData(RawKind::Rawtext))
        }
        "textarea" | "title" => Some(TokenSinkResult::RawData(RawKind::Rcdata)),
        "plaintext" => Some(TokenSinkResult::Plaintext),
        _ => None,
    }
}

fn convert_attrs(attrs: Vec<html5ever::Attribute>) -> Vec<Attribute> {
    attrs
        .into_iter()
        .map(|a| Attribute::new(a.name.local.as_ref(), a.value.as_ref()))
        .collect()
}

impl TokenSink for Collector {
    type Handle = ();

    fn process_token(&self, token: h5::Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            h5::Token::TagToken(tag) => {
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::EndTag => self.push(Token::EndTag { name }),
                    TagKind::StartTag => {
                        let mode = raw_text_mode(&name);
                        let attrs = convert_attrs(tag.attrs);
                        // Browsers ignore the self-closing flag on raw-text
                        // elements; their content still follows.
                        if tag.self_closing && mode.is_none() {
                            self.push(Token::SelfClosingTag { name, attrs });
                        } else {
                            self.push(Token::StartTag { name, attrs });
                        }
                        if let Some(mode) = mode {
                            return mode;
                        }
                    }
                }
            }
            h5::Token::CharacterTokens(text) => self.push(Token::Text(text.to_string())),
            h5::Token::CommentToken(text) => self.push(Token::Comment(text.to_string())),
            h5::Token::DoctypeToken(doctype) => self.push(Token::Doctype(Doctype {
                name: doctype.name.map(|s| s.to_string()),
                public_id: doctype.public_id.map(|s| s.to_string()),
                system_id: doctype.system_id.map(|s| s.to_string()),
            })),
            h5::Token::ParseError(e) => tracing::trace!("Recoverable markup error: {e}"),
            h5::Token::NullCharacterToken | h5::Token::EOFToken => {}
        }
        TokenSinkResult::Continue
    }
}

/// Incremental wrapper around the `html5ever` tokenizer that accepts raw
/// bytes split at arbitrary points.
struct HtmlTokenizer {
    inner: Tokenizer<Collector>,
    input: BufferQueue,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last chunk.
    carry: Vec<u8>,
}

impl HtmlTokenizer {
    fn new() -> Self {
        Self {
            inner: Tokenizer::new(Collector::default(), TokenizerOpts::default()),
            input: BufferQueue::default(),
            carry: Vec::new(),
        }
    }

    fn feed_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.input.push_back(StrTendril::from_slice(text));
        let _ = self.inner.feed(&self.input);
    }

    fn feed_bytes(&mut self, bytes: &[u8]) {
        self.carry.extend_from_slice(bytes);

        let mut text = String::with_capacity(self.carry.len());
        let mut rest: &[u8] = &self.carry;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let consumed = self.carry.len() - rest.len();
        self.carry.drain(..consumed);
        self.feed_str(&text);
    }

    fn finish(&mut self) {
        if !self.carry.is_empty() {
            let tail = String::from_utf8_lossy(&self.carry).into_owned();
            self.carry.clear();
            self.feed_str(&tail);
        }
        self.inner.end();
    }

    fn pop_token(&mut self) -> Option<Token> {
        self.inner.sink.tokens.borrow_mut().pop_front()
    }
}

/// A [`TokenSource`] that tokenizes markup read from `R`.
///
/// Input is read in 8 KiB chunks. Leading ASCII whitespace is held back
/// until the first other byte arrives, so an input made only of whitespace
/// produces no tokens at all (see [`is_blank`](Self::is_blank)).
pub struct HtmlTokens<R> {
    reader: R,
    tokenizer: HtmlTokenizer,
    chunk: Vec<u8>,
    pending: Vec<u8>,
    seen_content: bool,
    eof: bool,
}

impl<R: Read> HtmlTokens<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            tokenizer: HtmlTokenizer::new(),
            chunk: vec![0; CHUNK_SIZE],
            pending: Vec::new(),
            seen_content: false,
            eof: false,
        }
    }

    /// Read ahead until the first non-whitespace byte or the end of input,
    /// and report whether the input is empty or whitespace-only.
    pub fn is_blank(&mut self) -> Result<bool> {
        while !self.seen_content && !self.eof {
            self.fill()?;
        }
        Ok(!self.seen_content)
    }

    fn fill(&mut self) -> Result<()> {
        let n = loop {
            match self.reader.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };

        if n == 0 {
            self.eof = true;
            if self.seen_content {
                self.tokenizer.finish();
            }
            return Ok(());
        }

        let bytes = &self.chunk[..n];
        if self.seen_content {
            self.tokenizer.feed_bytes(bytes);
        } else if bytes.iter().all(u8::is_ascii_whitespace) {
            self.pending.extend_from_slice(bytes);
        } else {
            self.seen_content = true;
            let pending = std::mem::take(&mut self.pending);
            self.tokenizer.feed_bytes(&pending);
            self.tokenizer.feed_bytes(bytes);
        }
        Ok(())
    }
}

impl<R: Read> TokenSource for HtmlTokens<R> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            if let Some(token) = self.tokenizer.pop_token() {
                return Ok(Some(token));
            }
            if self.eof {
                return Ok(None);
            }
            self.fill()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn collect(html: &str) -> Vec<Token> {
        collect_from(html.as_bytes())
    }

    fn collect_from(reader: impl Read) -> Vec<Token> {
        let mut source = HtmlTokens::new(reader);
        let mut tokens = Vec::new();
        while let Some(token) = source.next_token().unwrap() {
            tokens.push(token);
        }
        merge_text(tokens)
    }

    fn merge_text(tokens: Vec<Token>) -> Vec<Token> {
        let mut merged: Vec<Token> = Vec::new();
        for token in tokens {
            if let (Some(Token::Text(prev)), Token::Text(next)) = (merged.last_mut(), &token) {
                prev.push_str(next);
                continue;
            }
            merged.push(token);
        }
        merged
    }

    fn text(s: &str) -> Token {
        Token::Text(s.to_string())
    }

    /// Yields one byte per read and fails every other call with `Interrupted`.
    struct Trickle<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            match self.data.split_first() {
                Some((first, rest)) => {
                    buf[0] = *first;
                    self.data = rest;
                    Ok(1)
                }
                None => Ok(0),
            }
        }
    }

    #[test]
    fn tags_text_and_attributes() {
        let tokens = collect(r#"<P Class="x">a &amp; b<BR/></p>"#);
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "p".into(),
                    attrs: vec![Attribute::new("class", "x")],
                },
                text("a & b"),
                Token::SelfClosingTag {
                    name: "br".into(),
                    attrs: vec![],
                },
                Token::EndTag { name: "p".into() },
            ]
        );
    }

    #[test]
    fn script_content_is_raw_text() {
        let tokens = collect("<script>if (a < b) { x = '<b>'; }</script>");
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "script".into(),
                    attrs: vec![],
                },
                text("if (a < b) { x = '<b>'; }"),
                Token::EndTag {
                    name: "script".into()
                },
            ]
        );
    }

    #[test]
    fn self_closing_script_still_opens_raw_text() {
        let tokens = collect("<script/>alert(1)</script>");
        assert_eq!(
            tokens[0],
            Token::StartTag {
                name: "script".into(),
                attrs: vec![],
            }
        );
        assert_eq!(tokens[1], text("alert(1)"));
    }

    #[test]
    fn comments_and_doctype() {
        let tokens = collect("<!DOCTYPE html><!-- note -->");
        assert_eq!(
            tokens,
            vec![
                Token::Doctype(Doctype {
                    name: Some("html".into()),
                    ..Doctype::default()
                }),
                Token::Comment(" note ".into()),
            ]
        );
    }

    #[test]
    fn split_utf8_and_interrupted_reads() {
        let html = "<b>héllo wörld ✓</b>";
        let tokens = collect_from(Trickle {
            data: html.as_bytes(),
            interrupt: false,
        });
        assert_eq!(tokens, collect(html));
        assert_eq!(tokens[1], text("héllo wörld ✓"));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let tokens = collect_from(&b"a\xffb"[..]);
        assert_eq!(tokens, vec![text("a\u{FFFD}b")]);
    }

    #[test]
    fn whitespace_only_input_is_blank() {
        let mut source = HtmlTokens::new(&b" \n\t "[..]);
        assert!(source.is_blank().unwrap());
        assert_eq!(source.next_token().unwrap(), None);

        let mut source = HtmlTokens::new(&b"  x"[..]);
        assert!(!source.is_blank().unwrap());
        assert_eq!(source.next_token().unwrap(), Some(text("  x")));
    }

    #[test]
    fn token_iter_yields_in_order() {
        let mut source = TokenIter::new(vec![text("a"), text("b")]);
        assert_eq!(source.next_token().unwrap(), Some(text("a")));
        assert_eq!(source.next_token().unwrap(), Some(text("b")));
        assert_eq!(source.next_token().unwrap(), None);
    }
}
