//! Preset policies and convenience bundles of common rules.

use regex::Regex;

use super::Policy;
use super::patterns::{
    CELL_ALIGN, CELL_VERTICAL_ALIGN, DATA_URI_IMAGE_PREFIX, DIRECTION, IMAGE_ALIGN, INTEGER,
    ISO8601, LIST_TYPE, NUMBER, NUMBER_OR_PERCENT, PARAGRAPH, SPACE_SEPARATED_TOKENS,
};

impl Policy {
    /// A policy that strips every element and attribute, keeping escaped
    /// text only.
    pub fn strict() -> Self {
        Self::new()
    }

    /// Like [`strict`](Self::strict), but stripped tags become a single
    /// space so adjacent words stay apart.
    ///
    /// ```
    /// use html_policy::Policy;
    ///
    /// let policy = Policy::strip_tags();
    /// assert_eq!(policy.sanitize("one<br>two"), "one two");
    /// ```
    pub fn strip_tags() -> Self {
        let mut policy = Self::new();
        policy.add_space_when_stripping_tag(true);
        policy
    }

    /// A policy for rich user-generated content, such as rendered Markdown.
    ///
    /// Keeps text formatting, lists, tables, images and links with the
    /// `mailto`, `http` and `https` schemes. Links get `rel="nofollow"`.
    pub fn ugc() -> Self {
        let mut policy = Self::new();

        policy
            .allow_standard_attributes()
            .allow_standard_urls()
            .allow_lists()
            .allow_tables()
            .allow_images();

        policy
            .allow_attrs(&["class"])
            .matching(SPACE_SEPARATED_TOKENS.clone())
            .globally()
            .allow_attrs(&["href"])
            .on_elements(&["a"])
            .allow_attrs(&["cite"])
            .on_elements(&["blockquote", "del", "ins", "q"])
            .allow_attrs(&["datetime"])
            .matching(ISO8601.clone())
            .on_elements(&["del", "ins", "time"])
            .allow_attrs(&["open"])
            .matching(Regex::new(r"(?i)^(|open)$").expect("open regex is valid"))
            .on_elements(&["details"])
            .allow_attrs(&["value", "min", "max", "low", "high", "optimum"])
            .matching(NUMBER.clone())
            .on_elements(&["meter"])
            .allow_attrs(&["value", "max"])
            .matching(NUMBER.clone())
            .on_elements(&["progress"]);

        policy.allow_elements(&[
            "abbr", "acronym", "article", "aside", "b", "bdi", "bdo", "blockquote", "br", "cite",
            "code", "del", "details", "dfn", "div", "em", "figcaption", "figure", "footer", "h1",
            "h2", "h3", "h4", "h5", "h6", "header", "hr", "i", "ins", "kbd", "mark", "p", "pre",
            "q", "rp", "rt", "ruby", "s", "samp", "section", "small", "span", "strike", "strong",
            "sub", "summary", "sup", "time", "tt", "u", "var", "wbr",
        ]);

        policy
    }

    /// Allow `dir`, `lang`, `id` and `title` on every allowed element.
    pub fn allow_standard_attributes(&mut self) -> &mut Self {
        self.allow_attrs(&["dir"])
            .matching(DIRECTION.clone())
            .globally()
            .allow_attrs(&["lang"])
            .matching(Regex::new(r"^[a-zA-Z]{2,20}$").expect("lang regex is valid"))
            .globally()
            .allow_attrs(&["id"])
            .matching(Regex::new(r"^[a-zA-Z0-9:\-_\.]+$").expect("id regex is valid"))
            .globally()
            .allow_attrs(&["title"])
            .matching(PARAGRAPH.clone())
            .globally()
    }

    /// Require parseable URLs with the `mailto`, `http` or `https` scheme,
    /// accept relative URLs and add `rel="nofollow"` to links.
    pub fn allow_standard_urls(&mut self) -> &mut Self {
        self.require_parseable_urls(true)
            .allow_relative_urls(true)
            .allow_url_schemes(&["mailto", "http", "https"])
            .require_no_follow_on_links(true)
    }

    /// Allow `img` with `align`, `alt`, `height`, `width` and `src`.
    ///
    /// Pulls in [`allow_standard_urls`](Self::allow_standard_urls), so
    /// `data:` images stay blocked.
    pub fn allow_images(&mut self) -> &mut Self {
        self.allow_attrs(&["align"])
            .matching(IMAGE_ALIGN.clone())
            .on_elements(&["img"])
            .allow_attrs(&["alt"])
            .matching(PARAGRAPH.clone())
            .on_elements(&["img"])
            .allow_attrs(&["height", "width"])
            .matching(NUMBER_OR_PERCENT.clone())
            .on_elements(&["img"])
            .allow_standard_urls()
            .allow_attrs(&["src"])
            .on_elements(&["img"])
    }

    /// Allow `data:` URLs on `img` when they carry a base64 image payload
    /// of a common type (gif, jpeg, png, webp).
    ///
    /// Only the media type prefix and the base64 alphabet are checked; the
    /// payload is not decoded.
    pub fn allow_data_uri_images(&mut self) -> &mut Self {
        self.allow_attrs(&["src"]).on_elements(&["img"]);
        self.allow_url_scheme_with_custom_policy("data", |url| {
            if url.cannot_be_a_base() && url.query().is_none() && url.fragment().is_none() {
                let path = url.path();
                if let Some(found) = DATA_URI_IMAGE_PREFIX.find(path) {
                    let payload = &path[found.end()..];
                    return !payload.is_empty()
                        && payload
                            .bytes()
                            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='));
                }
            }
            false
        })
    }

    /// Allow ordered, unordered and definition lists.
    pub fn allow_lists(&mut self) -> &mut Self {
        self.allow_attrs(&["type"])
            .matching(LIST_TYPE.clone())
            .on_elements(&["ol", "ul", "li"])
            .allow_attrs(&["value"])
            .matching(INTEGER.clone())
            .on_elements(&["li"])
            .allow_elements(&["dl", "dt", "dd"])
    }

    /// Allow tables with their structural elements and layout attributes.
    pub fn allow_tables(&mut self) -> &mut Self {
        const CELLS: &[&str] = &["td", "th"];
        const COLUMNS: &[&str] = &["col", "colgroup"];
        const ROW_GROUPS: &[&str] = &["thead", "tbody", "tfoot", "tr"];

        self.allow_attrs(&["height", "width"])
            .matching(NUMBER_OR_PERCENT.clone())
            .on_elements(&["table"])
            .allow_attrs(&["summary"])
            .matching(PARAGRAPH.clone())
            .on_elements(&["table"])
            .allow_elements(&["caption", "table"]);

        self.allow_attrs(&["align"])
            .matching(CELL_ALIGN.clone())
            .on_elements(COLUMNS)
            .allow_attrs(&["height", "width", "span"])
            .matching(NUMBER_OR_PERCENT.clone())
            .on_elements(COLUMNS)
            .allow_attrs(&["valign"])
            .matching(CELL_VERTICAL_ALIGN.clone())
            .on_elements(COLUMNS);

        self.allow_attrs(&["align"])
            .matching(CELL_ALIGN.clone())
            .on_elements(ROW_GROUPS)
            .allow_attrs(&["valign"])
            .matching(CELL_VERTICAL_ALIGN.clone())
            .on_elements(ROW_GROUPS);

        self.allow_attrs(&["abbr"])
            .matching(PARAGRAPH.clone())
            .on_elements(CELLS)
            .allow_attrs(&["align"])
            .matching(CELL_ALIGN.clone())
            .on_elements(CELLS)
            .allow_attrs(&["colspan", "rowspan"])
            .matching(NUMBER.clone())
            .on_elements(CELLS)
            .allow_attrs(&["headers"])
            .matching(SPACE_SEPARATED_TOKENS.clone())
            .on_elements(CELLS)
            .allow_attrs(&["height", "width"])
            .matching(NUMBER_OR_PERCENT.clone())
            .on_elements(CELLS)
            .allow_attrs(&["scope"])
            .matching(Regex::new(r"(?i)^(?:row|col)(?:group)?$").expect("scope regex is valid"))
            .on_elements(CELLS)
            .allow_attrs(&["valign"])
            .matching(CELL_VERTICAL_ALIGN.clone())
            .on_elements(CELLS)
            .allow_attrs(&["nowrap"])
            .matching(Regex::new(r"(?i)^(|nowrap)$").expect("nowrap regex is valid"))
            .on_elements(CELLS)
    }

    /// Allow a conservative set of inline styles on every allowed element,
    /// plus `span` so styled runs of text survive.
    pub fn allow_styling(&mut self) -> &mut Self {
        self.allow_styles(&["color", "background-color"])
            .matching(
                Regex::new(r"(?i)^(#[0-9a-f]{3,8}|[a-z]+|rgba?\(\s*[0-9.,%\s]+\))$")
                    .expect("color regex is valid"),
            )
            .globally()
            .allow_styles(&["text-align"])
            .matching_enum(&["left", "right", "center", "justify", "start", "end"])
            .globally()
            .allow_styles(&["font-weight"])
            .matching_enum(&[
                "normal", "bold", "bolder", "lighter", "100", "200", "300", "400", "500", "600",
                "700", "800", "900",
            ])
            .globally()
            .allow_styles(&["font-style"])
            .matching_enum(&["normal", "italic", "oblique"])
            .globally()
            .allow_styles(&["text-decoration"])
            .matching_enum(&["none", "underline", "overline", "line-through"])
            .globally()
            .allow_elements(&["span"])
    }
}
