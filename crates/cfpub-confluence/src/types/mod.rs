//! Confluence API types.

mod attachment;
mod page;
mod space;

use serde::Deserialize;

pub use attachment::Attachment;
pub use page::{Ancestor, Label, LabelArray, Links, Metadata, Page, Version};
pub use space::{ContentRef, Space};

/// Paged list of results.
///
/// Serde ignores unknown fields like `limit` and `_links`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultList<T> {
    /// Results of this page.
    pub results: Vec<T>,
    /// Number of results.
    #[serde(default)]
    pub size: usize,
}
