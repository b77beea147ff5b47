//! Shared utility functions for storage-format rendering.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use pulldown_cmark::HeadingLevel;

/// Characters that are percent-encoded when a URL is written into markup.
///
/// Existing `%XX` sequences and URL delimiters are left untouched.
const URL_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// Escape character data (`&`, `<`, `>`).
pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    quick_xml::escape::partial_escape(text)
}

/// Escape an attribute value (`&`, `<`, `>`, `'`, `"`).
pub(crate) fn escape_attr(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}

/// Make a URL safe to place inside an `href`/`value` attribute.
///
/// # Examples
///
/// ```
/// use cfpub_renderer::escape_url;
///
/// assert_eq!(escape_url("a b.md?x=1&y=2"), "a%20b.md?x=1&amp;y=2");
/// ```
pub fn escape_url(url: &str) -> String {
    let encoded = utf8_percent_encode(url, URL_UNSAFE).to_string();
    escape_attr(&encoded).into_owned()
}

/// Language of a fenced code block: the first word of its info string.
pub(crate) fn fence_language(info: &str) -> Option<&str> {
    info.split_whitespace().next()
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
