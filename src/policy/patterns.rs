//! Ready-made value patterns for common attribute and style rules.
//!
//! All patterns are anchored at both ends, so they match whole values only.

use std::sync::LazyLock;

use regex::Regex;

/// `align` on table cells and columns.
pub static CELL_ALIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(center|justify|left|right|char)$").expect("CELL_ALIGN regex is valid")
});

/// `valign` on table cells and rows.
pub static CELL_VERTICAL_ALIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(baseline|bottom|middle|top)$").expect("CELL_VERTICAL_ALIGN regex is valid")
});

/// Text direction for `dir`.
pub static DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(rtl|ltr|auto)$").expect("DIRECTION regex is valid"));

/// `align` on images.
pub static IMAGE_ALIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(left|right|top|texttop|middle|absmiddle|baseline|bottom|absbottom)$")
        .expect("IMAGE_ALIGN regex is valid")
});

/// Unsigned whole numbers.
pub static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("INTEGER regex is valid"));

/// ISO 8601 dates and times, as used by `datetime`.
pub static ISO8601: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^([\+-]?\d{4})((-?)((0[1-9]|1[0-2])",
        r"([12]\d|0[1-9]|3[01])?|W([0-4]\d|5[0-2])",
        r"(-?[1-7])?|(00[1-9]|0[1-9]\d|[12]\d{2}|3([0-5]\d|6[1-6])))",
        r"([T\s]((([01]\d|2[0-3])((:?)[0-5]\d)?|24:?00)([\.,]\d+[^:])?)?",
        r"([0-5]\d([\.,]\d+)?)?([zZ]|([\+-])",
        r"([01]\d|2[0-3]):?([0-5]\d)?)?)?)?$",
    ))
    .expect("ISO8601 regex is valid")
});

/// `type` on `ol`, `ul` and `li`.
pub static LIST_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(circle|disc|square|a|i|1)$").expect("LIST_TYPE regex is valid")
});

/// A single identifier such as an `id` or a `headers` entry.
pub static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-_\$]+$").expect("NAME regex is valid"));

/// Space-separated tokens such as a `class` list.
pub static SPACE_SEPARATED_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\p{L}\p{N}_-]+$").expect("SPACE_SEPARATED_TOKENS regex is valid")
});

/// Signed decimal numbers.
pub static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$").expect("NUMBER regex is valid")
});

/// Whole numbers with an optional trailing `%`.
pub static NUMBER_OR_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+%?$").expect("NUMBER_OR_PERCENT regex is valid"));

/// Human-readable prose, for `alt`, `title`, `summary` and the like.
pub static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}\s\-_',:\[\]!\./\\\(\)&]*$").expect("PARAGRAPH regex is valid")
});

/// Media type prefix of an inline image `data:` URL, up to the payload.
pub static DATA_URI_IMAGE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^image/(gif|jpeg|png|webp);base64,").expect("DATA_URI_IMAGE_PREFIX regex is valid")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_match_whole_values() {
        assert!(CELL_ALIGN.is_match("Center"));
        assert!(!CELL_ALIGN.is_match("centered"));
        assert!(INTEGER.is_match("42"));
        assert!(!INTEGER.is_match("42px"));
        assert!(NUMBER_OR_PERCENT.is_match("50%"));
        assert!(!NUMBER_OR_PERCENT.is_match("50%;"));
        assert!(NUMBER.is_match("-1.5"));
        assert!(LIST_TYPE.is_match("I"));
        assert!(!LIST_TYPE.is_match("roman"));
    }

    #[test]
    fn iso8601_accepts_common_forms() {
        assert!(ISO8601.is_match("2009-05-19"));
        assert!(ISO8601.is_match("2009-05-19T14:39Z"));
        assert!(ISO8601.is_match("2009-W21-2"));
        assert!(!ISO8601.is_match("19 May 2009"));
    }

    #[test]
    fn paragraph_rejects_markup_characters() {
        assert!(PARAGRAPH.is_match("A picture of a cat, (sleeping)."));
        assert!(!PARAGRAPH.is_match("<b>bold</b>"));
        assert!(!PARAGRAPH.is_match("say \"hi\""));
    }

    #[test]
    fn data_uri_prefix() {
        assert!(DATA_URI_IMAGE_PREFIX.is_match("image/png;base64,iVBORw0K"));
        assert!(!DATA_URI_IMAGE_PREFIX.is_match("text/html;base64,PGI+"));
    }
}
