//! Serialization of sanitized tokens.

use std::fmt::Write as _;
use std::io::{self, Write};

use super::tokens::{Attribute, Doctype};

/// Where the engine writes its output.
pub(crate) trait Sink {
    fn write_str(&mut self, s: &str) -> io::Result<()>;

    /// Write `text` with `& < > " '` replaced by character references.
    fn write_escaped(&mut self, text: &str) -> io::Result<()> {
        let mut last = 0;
        for (i, b) in text.bytes().enumerate() {
            let entity = match b {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&#34;",
                b'\'' => "&#39;",
                _ => continue,
            };
            self.write_str(&text[last..i])?;
            self.write_str(entity)?;
            last = i + 1;
        }
        self.write_str(&text[last..])
    }

    fn write_start_tag(&mut self, name: &str, attrs: &[Attribute], self_closing: bool) -> io::Result<()> {
        self.write_str("<")?;
        self.write_str(name)?;
        for attr in attrs {
            self.write_str(" ")?;
            self.write_str(&attr.name)?;
            self.write_str("=\"")?;
            self.write_escaped(&attr.value)?;
            self.write_str("\"")?;
        }
        self.write_str(if self_closing { "/>" } else { ">" })
    }

    fn write_end_tag(&mut self, name: &str) -> io::Result<()> {
        self.write_str("</")?;
        self.write_str(name)?;
        self.write_str(">")
    }

    fn write_comment(&mut self, text: &str) -> io::Result<()> {
        self.write_str("<!--")?;
        self.write_str(text)?;
        self.write_str("-->")
    }

    fn write_doctype(&mut self, doctype: &Doctype) -> io::Result<()> {
        let mut out = String::from("<!DOCTYPE");
        if let Some(name) = &doctype.name {
            let _ = write!(out, " {name}");
        }
        match (&doctype.public_id, &doctype.system_id) {
            (Some(public), Some(system)) => {
                let _ = write!(out, " PUBLIC {} {}", quote_id(public), quote_id(system));
            }
            (Some(public), None) => {
                let _ = write!(out, " PUBLIC {}", quote_id(public));
            }
            (None, Some(system)) => {
                let _ = write!(out, " SYSTEM {}", quote_id(system));
            }
            (None, None) => {}
        }
        out.push('>');
        self.write_str(&out)
    }
}

/// Quote a doctype identifier with whichever quote character it does not
/// contain. Identifiers have no escape syntax, so a stray `'` is dropped
/// when both kinds are present.
fn quote_id(id: &str) -> String {
    if !id.contains('"') {
        format!("\"{id}\"")
    } else {
        format!("'{}'", id.replace('\'', ""))
    }
}

impl Sink for String {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.push_str(s);
        Ok(())
    }
}

/// Adapts an [`io::Write`] to [`Sink`].
pub(crate) struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner }
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Sink for IoSink<W> {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.inner.write_all(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        let mut out = String::new();
        out.write_escaped(r#"<a href="x">Tom & Jerry's</a>"#).unwrap();
        assert_eq!(
            out,
            "&lt;a href=&#34;x&#34;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn escape_keeps_multibyte_text() {
        let mut out = String::new();
        out.write_escaped("café <ü>").unwrap();
        assert_eq!(out, "café &lt;ü&gt;");
    }

    #[test]
    fn start_tag_quotes_and_escapes_values() {
        let mut out = String::new();
        out.write_start_tag(
            "a",
            &[
                Attribute::new("href", "/x?a=1&b=2"),
                Attribute::new("title", "say \"hi\""),
            ],
            false,
        )
        .unwrap();
        out.write_end_tag("a").unwrap();
        assert_eq!(
            out,
            r#"<a href="/x?a=1&amp;b=2" title="say &#34;hi&#34;"></a>"#
        );
    }

    #[test]
    fn self_closing_and_comment() {
        let mut out = String::new();
        out.write_start_tag("br", &[], true).unwrap();
        out.write_comment(" c ").unwrap();
        assert_eq!(out, "<br/><!-- c -->");
    }

    #[test]
    fn doctype_forms() {
        let mut out = String::new();
        out.write_doctype(&Doctype {
            name: Some("html".into()),
            ..Doctype::default()
        })
        .unwrap();
        assert_eq!(out, "<!DOCTYPE html>");

        let mut out = String::new();
        out.write_doctype(&Doctype {
            name: Some("html".into()),
            public_id: Some("-//W3C//DTD HTML 4.01//EN".into()),
            system_id: Some("http://www.w3.org/TR/html4/strict.dtd".into()),
        })
        .unwrap();
        assert_eq!(
            out,
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#
        );
    }

    #[test]
    fn doctype_ids_keep_embedded_quotes() {
        let mut out = String::new();
        out.write_doctype(&Doctype {
            name: Some("html".into()),
            public_id: Some(r#"a"b"#.into()),
            system_id: Some("it's".into()),
        })
        .unwrap();
        assert_eq!(out, r#"<!DOCTYPE html PUBLIC 'a"b' "it's">"#);
    }

    #[test]
    fn io_sink_writes_bytes() {
        let mut sink = IoSink::new(Vec::new());
        sink.write_escaped("1 < 2").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.inner, b"1 &lt; 2");
    }
}
