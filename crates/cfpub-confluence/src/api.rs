//! Trait seam between publishing logic and the Confluence REST API.

use std::path::Path;

use cfpub_document::ContentType;

use crate::error::ConfluenceError;
use crate::types::{Attachment, Page, Space};

/// Expansions requested when looking up a page to update.
pub const PAGE_EXPANSIONS: &[&str] = &["space", "ancestors", "history", "version", "metadata.labels"];

/// How to find an existing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLookup<'a> {
    /// By content id.
    Id(&'a str),
    /// By exact title within a space.
    Title {
        /// Page title.
        title: &'a str,
        /// Space key.
        space: &'a str,
        /// Content type.
        content_type: ContentType,
    },
}

/// Content of a page to create.
#[derive(Debug, Clone, Copy)]
pub struct NewPage<'a> {
    /// Space key.
    pub space: &'a str,
    /// Page title.
    pub title: &'a str,
    /// Storage format body.
    pub body: &'a str,
    /// Content type.
    pub content_type: ContentType,
    /// Parent page id; none creates a top-level page.
    pub parent_id: Option<&'a str>,
    /// Version message.
    pub message: Option<&'a str>,
    /// Initial labels.
    pub labels: Option<&'a [String]>,
}

/// Changes to apply to an existing page.
#[derive(Debug, Clone, Copy)]
pub struct PageUpdate<'a> {
    /// Storage format body.
    pub body: &'a str,
    /// Content type.
    pub content_type: ContentType,
    /// New parent page id; none keeps the current parent.
    pub parent_id: Option<&'a str>,
    /// Version message.
    pub message: Option<&'a str>,
    /// Labels replacing the current set; none leaves labels alone.
    pub labels: Option<&'a [String]>,
    /// Mark the new version as a minor edit.
    pub minor_edit: bool,
}

/// File to upload as an attachment.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentUpload<'a> {
    /// Local file.
    pub path: &'a Path,
    /// Attachment filename on the page.
    pub filename: &'a str,
    /// Version comment.
    pub comment: &'a str,
}

/// Confluence operations needed for publishing (enables testing with fake
/// implementations).
pub trait ConfluenceApi {
    /// Find a page, returning `None` when it does not exist.
    fn get_page(&self, lookup: PageLookup<'_>, expand: &[&str]) -> Result<Option<Page>, ConfluenceError>;

    /// Create a page.
    fn create_page(&self, page: &NewPage<'_>) -> Result<Page, ConfluenceError>;

    /// Publish a new version of `page`.
    ///
    /// The title is kept and the version number incremented.
    fn update_page(&self, page: &Page, update: &PageUpdate<'_>) -> Result<Page, ConfluenceError>;

    /// Find an attachment of `page` by filename.
    fn get_attachment(&self, page: &Page, filename: &str) -> Result<Option<Attachment>, ConfluenceError>;

    /// Attach a new file to `page`.
    fn create_attachment(
        &self,
        page: &Page,
        upload: &AttachmentUpload<'_>,
    ) -> Result<Attachment, ConfluenceError>;

    /// Upload a new version of an existing attachment.
    fn update_attachment(
        &self,
        page: &Page,
        existing: &Attachment,
        upload: &AttachmentUpload<'_>,
    ) -> Result<Attachment, ConfluenceError>;

    /// Add labels to `page`, keeping the ones it already has.
    fn add_labels(&self, page: &Page, labels: &[String]) -> Result<(), ConfluenceError>;

    /// Fetch a space.
    fn get_space(&self, key: &str, expand: &[&str]) -> Result<Space, ConfluenceError>;

    /// Absolute web URL of `page`.
    fn page_url(&self, page: &Page) -> String;
}
