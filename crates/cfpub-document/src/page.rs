//! In-memory page model.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use cfpub_renderer::RelativeLink;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::error::{DocumentError, DuplicateTitle};

/// Kind of Confluence content a page is published as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Regular page.
    #[default]
    Page,
    /// Blog post.
    Blogpost,
}

impl ContentType {
    /// Value used by the REST API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Blogpost => "blogpost",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page" => Ok(Self::Page),
            "blogpost" => Ok(Self::Blogpost),
            other => Err(format!(
                "invalid content type '{other}' (expected 'page' or 'blogpost')"
            )),
        }
    }
}

/// A document (or directory) to be published as one Confluence page.
///
/// At most one of `parent_id` and `parent_title` is used: an id wins, a
/// title is looked up remotely, and neither makes a top-level page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    /// Page title.
    pub title: Option<String>,
    /// Title before any prefix was applied.
    pub original_title: Option<String>,
    /// Storage format body.
    pub body: String,
    /// Content type.
    pub content_type: ContentType,
    /// Local files to attach, relative to the source document.
    pub attachments: Vec<PathBuf>,
    /// Links to other documents awaiting resolution.
    pub relative_links: Vec<RelativeLink>,
    /// Source document, absent for folder pages.
    pub file_path: Option<PathBuf>,
    /// Id of an existing page to update.
    pub page_id: Option<String>,
    /// Id of the parent page.
    pub parent_id: Option<String>,
    /// Title of the parent page.
    pub parent_title: Option<String>,
    /// Destination space key.
    pub space: String,
    /// Labels: `None` leaves remote labels alone, empty clears them when
    /// labels are replaced.
    pub labels: Option<Vec<String>>,
}

impl Page {
    /// Create an empty page standing in for a directory.
    pub fn folder(title: impl Into<String>, parent_title: Option<String>) -> Self {
        Self {
            title: Some(title.into()),
            parent_title,
            ..Self::default()
        }
    }

    /// Whether this page represents a directory rather than a document.
    pub fn is_folder(&self) -> bool {
        self.file_path.is_none()
    }

    /// Title or an empty string.
    pub fn title_str(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Hex SHA-1 of the body.
    ///
    /// Attachments and labels are not included.
    pub fn content_hash(&self) -> String {
        sha1_hex(self.body.as_bytes())
    }
}

/// Hex SHA-1 digest of `data`.
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Reject a batch in which two pages share a title.
///
/// Titles are compared exactly. Every page involved in a collision is
/// reported, grouped by title in order of first appearance.
///
/// # Errors
///
/// Returns [`DocumentError::DuplicateTitles`] when any title repeats.
pub fn validate_unique_titles(pages: &[Page]) -> Result<(), DocumentError> {
    let mut titles: Vec<&str> = Vec::new();
    for page in pages {
        let title = page.title_str();
        if !titles.contains(&title) {
            titles.push(title);
        }
    }

    let duplicates: Vec<DuplicateTitle> = titles
        .into_iter()
        .filter(|title| pages.iter().filter(|p| p.title_str() == *title).count() > 1)
        .flat_map(move |title| {
            pages
                .iter()
                .filter(move |p| p.title_str() == title)
                .map(|p| DuplicateTitle {
                    title: p.title_str().to_owned(),
                    file_path: p.file_path.clone(),
                })
        })
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(DocumentError::DuplicateTitles(duplicates))
    }
}
