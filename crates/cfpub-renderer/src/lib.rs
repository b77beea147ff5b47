//! Markdown to Confluence storage format renderer.
//!
//! [`StorageRenderer`] turns a markdown document into storage-format markup
//! in a single pass over pulldown-cmark events, collecting alongside the
//! markup:
//!
//! - the page title (first level-1 heading)
//! - local images that must be uploaded as attachments
//! - relative links to other documents, replaced by placeholder tokens
//!   until the target page's URL is known
//!
//! Macros such as the `code` block are built with [`ConfluenceTag`], which
//! renders namespaced elements with sorted attributes.

mod links;
mod renderer;
mod state;
mod tag;
mod util;

pub use links::{PLACEHOLDER_PREFIX, RelativeLink};
pub use renderer::{RenderResult, StorageRenderer};
pub use tag::{AC_NAMESPACE, ConfluenceTag, RI_NAMESPACE};
pub use util::escape_url;
