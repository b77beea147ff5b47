//! Confluence publishing for cfpub.
//!
//! This crate provides:
//! - [`ConfluenceClient`]: REST API client with bearer token or basic authentication
//! - [`ConfluenceApi`]: the operations publishing needs, implemented by the client
//! - [`PageUpserter`]: create, update or skip decisions for pages and attachments
//! - [`Publisher`]: batch publishing with relative link fixups
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cfpub_confluence::{ConfluenceClient, Credentials, PublishOptions, Publisher};
//! use cfpub_document::{PageDefaults, assemble_text};
//! use cfpub_renderer::StorageRenderer;
//!
//! let client = ConfluenceClient::new(
//!     "https://wiki.example.com/rest/api/",
//!     &Credentials::Token("token".to_owned()),
//!     false,
//! );
//! let mut pages = vec![assemble_text("# Hello\n\nWorld\n", &StorageRenderer::new())?];
//! let defaults = PageDefaults {
//!     space: "DOCS".to_owned(),
//!     ..PageDefaults::default()
//! };
//!
//! let publisher = Publisher::new(&client, PublishOptions::default());
//! let index = publisher.prepare(&mut pages, &defaults)?;
//! let report = publisher.publish(&mut pages, index)?;
//! println!("{} page(s) published", report.pages.len());
//! # Ok(())
//! # }
//! ```

// API seam
mod api;
pub use api::{AttachmentUpload, ConfluenceApi, NewPage, PAGE_EXPANSIONS, PageLookup, PageUpdate};

// API client
mod client;
pub use client::{ConfluenceClient, Credentials};

// Types returned by the API
pub mod types;

// Upsert decisions
mod upsert;
pub use upsert::{
    PageUpserter, UpsertAction, UpsertOptions, UpsertResult, content_hash_marker, file_sha1,
    versioned_message,
};

// Batch publishing
mod publish;
pub use publish::{
    AttachmentReport, PageReport, PublishOptions, PublishReport, Publisher, prepare_batch,
};

// Errors
pub mod error;
pub use error::{ConfluenceError, PublishError, UpsertError};

#[cfg(test)]
mod fake;
