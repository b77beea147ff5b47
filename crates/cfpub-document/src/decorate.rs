//! Batch-wide settings applied to pages before publishing.

use std::path::Path;

use cfpub_renderer::StorageRenderer;

use crate::assemble::assemble_file;
use crate::error::DocumentError;
use crate::page::{ContentType, Page};

/// Text used for a preface or postface given without content.
pub const DEFAULT_NOTICE: &str = "**Contents are auto-generated, do not edit.**";

/// Settings shared by every page of a batch.
#[derive(Clone, Debug, Default)]
pub struct PageDefaults {
    /// Destination space key.
    pub space: String,
    /// Existing page to update (single-page batches only).
    pub page_id: Option<String>,
    /// Content type of every page.
    pub content_type: ContentType,
    /// Parent title for top-level pages.
    pub parent_title: Option<String>,
    /// Parent id for pages without a parent title.
    pub parent_id: Option<String>,
    /// Prefix prepended to titles as `"{prefix} - {title}"`.
    pub prefix: Option<String>,
    /// Markup inserted before each body.
    pub preface: String,
    /// Markup appended after each body.
    pub postface: String,
}

impl PageDefaults {
    /// Decorate a page with the batch settings.
    ///
    /// Pages without a parent title are top-level in the batch and hang off
    /// the configured parent. Parent titles computed by the walker get the
    /// prefix, since the folder pages they name are prefixed too.
    pub fn apply(&self, page: &mut Page) {
        page.space.clone_from(&self.space);
        page.page_id.clone_from(&self.page_id);
        page.content_type = self.content_type;

        match (&page.parent_title, &self.prefix) {
            (None, _) => page.parent_title.clone_from(&self.parent_title),
            (Some(parent), Some(prefix)) => {
                page.parent_title = Some(format!("{prefix} - {parent}"));
            }
            (Some(_), None) => {}
        }
        if page.parent_title.is_none() && page.parent_id.is_none() {
            page.parent_id.clone_from(&self.parent_id);
        }

        page.original_title.clone_from(&page.title);
        if let Some(prefix) = &self.prefix {
            page.title = Some(format!("{prefix} - {}", page.title_str()));
        }

        if !self.preface.is_empty() {
            page.body.insert_str(0, &self.preface);
        }
        if !self.postface.is_empty() {
            page.body.push_str(&self.postface);
        }
    }
}

/// Render a preface or postface from markdown text.
///
/// Fragments never strip headers or reflow text.
pub fn render_fragment(markdown: &str) -> String {
    StorageRenderer::new().render(markdown).body
}

/// Render a preface or postface from a markdown file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or has malformed frontmatter.
pub fn render_fragment_file(path: &Path) -> Result<String, DocumentError> {
    Ok(assemble_file(path, &StorageRenderer::new())?.body)
}
