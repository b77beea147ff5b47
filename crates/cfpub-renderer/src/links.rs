//! URL classification for images and links.

use percent_encoding::percent_decode_str;
use url::{ParseError, Url};

use crate::util::escape_url;

/// Prefix of placeholder tokens substituted for relative link targets.
pub const PLACEHOLDER_PREFIX: &str = "cfpub-internal-link-";

/// A link to another document that is resolved after publishing.
///
/// The rendered body carries `placeholder` in place of the real target until
/// the target page's URL is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelativeLink {
    /// Target path relative to the linking document, percent-decoded.
    pub path: String,
    /// Anchor part of the link, without `#` (empty when absent).
    pub fragment: String,
    /// Unique token written into the body as the link target.
    pub placeholder: String,
    /// Link target exactly as written in the source.
    pub original: String,
    /// `original`, escaped for use as an attribute value.
    pub escaped_original: String,
}

impl RelativeLink {
    /// Build a link record with a fresh random placeholder.
    pub(crate) fn new(path: String, fragment: String, original: &str) -> Self {
        Self {
            path,
            fragment,
            placeholder: format!("{PLACEHOLDER_PREFIX}{}", uuid::Uuid::new_v4()),
            original: original.to_owned(),
            escaped_original: escape_url(original),
        }
    }
}

/// Path, query and fragment of a URL without scheme or authority.
struct Components<'a> {
    path: &'a str,
    fragment: &'a str,
}

fn split_components(url: &str) -> Components<'_> {
    let (rest, fragment) = url.split_once('#').unwrap_or((url, ""));
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    Components { path, fragment }
}

/// Whether the URL carries a network authority (`//host`).
///
/// URLs that fail to parse for reasons other than missing a base are
/// classified by their shape.
pub(crate) fn has_authority(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.has_host(),
        Err(ParseError::RelativeUrlWithoutBase) => url.starts_with("//"),
        Err(_) => url.starts_with("//") || url.contains("://"),
    }
}

/// Percent-decoded local path of an image source without authority.
pub(crate) fn local_path(src: &str) -> String {
    let components = split_components(src);
    decode(components.path)
}

/// Classify a link target as relative to the current document.
///
/// A relative link has no scheme, no authority and a non-empty path.
/// Returns `(decoded path, fragment)` for relative links.
pub(crate) fn relative_target(url: &str) -> Option<(String, String)> {
    match Url::parse(url) {
        Err(ParseError::RelativeUrlWithoutBase) if !url.starts_with("//") => {
            let components = split_components(url);
            if components.path.is_empty() {
                None
            } else {
                Some((decode(components.path), components.fragment.to_owned()))
            }
        }
        _ => None,
    }
}

fn decode(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}
