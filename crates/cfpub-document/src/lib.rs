//! Page model and document loading for cfpub.
//!
//! Turns markdown sources into [`Page`]s ready for publishing:
//!
//! - [`Frontmatter`] reads the optional YAML header of a document
//! - [`assemble_file`] renders a document and fills in its title and labels
//! - [`TreeWalker`] mirrors a directory tree as a page hierarchy
//! - [`LinkIndex`] resolves links between documents of one batch
//! - [`PageDefaults`] applies batch-wide settings before publishing

mod assemble;
mod collect;
mod decorate;
mod error;
mod frontmatter;
mod page;
mod relative_links;
mod walker;

pub use assemble::{assemble, assemble_file, assemble_text, read_text};
pub use collect::{Collection, Collector, is_multi_document};
pub use decorate::{DEFAULT_NOTICE, PageDefaults, render_fragment, render_fragment_file};
pub use error::{DocumentError, DuplicateTitle, InvalidLink, LinkError};
pub use frontmatter::{Frontmatter, parse_block};
pub use page::{ContentType, Page, sha1_hex, validate_unique_titles};
pub use relative_links::{LinkIndex, link_target, normalize_path, restore_placeholders};
pub use walker::{PAGES_FILE, TreeWalker, WalkOptions, beautify};
