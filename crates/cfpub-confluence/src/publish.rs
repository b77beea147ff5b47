//! Batch publishing with relative link fixups.
//!
//! Publishing runs in three steps:
//!
//! 1. [`Publisher::prepare`] rejects duplicate titles, inventories the
//!    documents of the batch and checks that relative links stay inside it.
//! 2. [`Publisher::publish`] upserts every page in order, then its
//!    attachments, recording the URL each document ended up at.
//! 3. Pages with relative links get their placeholders replaced by those
//!    URLs and are published again as a minor edit.
//!
//! The first failure stops the run.

use std::path::PathBuf;

use cfpub_document::{LinkIndex, Page, PageDefaults, validate_unique_titles};
use tracing::info;

use crate::api::ConfluenceApi;
use crate::error::{PublishError, UpsertError};
use crate::types::Page as RemotePage;
use crate::upsert::{PageUpserter, UpsertAction, UpsertOptions};

/// Settings for a publishing run.
#[derive(Clone, Debug, Default)]
pub struct PublishOptions {
    /// Settings passed to every upsert.
    pub upsert: UpsertOptions,
    /// Replace relative links between documents with page URLs.
    pub enable_relative_links: bool,
    /// Keep the original target of links that cannot be resolved instead of
    /// failing.
    pub ignore_relative_link_errors: bool,
}

/// Outcome for one attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentReport {
    /// Attachment filename.
    pub filename: String,
    /// What was done.
    pub action: UpsertAction,
}

/// Outcome for one page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageReport {
    /// Page title.
    pub title: String,
    /// What was done.
    pub action: UpsertAction,
    /// Web URL of the page.
    pub url: String,
    /// Attachments in upload order.
    pub attachments: Vec<AttachmentReport>,
}

/// Outcome of a publishing run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Pages in publishing order.
    pub pages: Vec<PageReport>,
    /// Source documents republished after their relative links were
    /// replaced.
    pub relinked: Vec<PathBuf>,
}

impl PublishReport {
    /// Number of pages with the given outcome.
    pub fn count(&self, action: UpsertAction) -> usize {
        self.pages.iter().filter(|p| p.action == action).count()
    }
}

/// Check a batch and apply the batch-wide settings to every page.
///
/// Nothing is sent to Confluence, so dry runs use this on its own. Returns
/// the link index to pass to [`Publisher::publish`].
///
/// # Errors
///
/// Returns [`PublishError::Input`] when titles collide, or
/// [`PublishError::Links`] when a relative link points outside the batch
/// and link errors are not ignored.
pub fn prepare_batch(
    pages: &mut [Page],
    defaults: &PageDefaults,
    options: &PublishOptions,
) -> Result<LinkIndex, PublishError> {
    validate_unique_titles(pages)?;

    let index = if options.enable_relative_links {
        let index = LinkIndex::from_pages(pages);
        if !options.ignore_relative_link_errors {
            index.validate(pages)?;
        }
        index
    } else {
        LinkIndex::default()
    };

    for page in pages.iter_mut() {
        defaults.apply(page);
    }
    Ok(index)
}

/// Publishes a batch of pages through a [`ConfluenceApi`].
pub struct Publisher<'a, C: ConfluenceApi + ?Sized> {
    upserter: PageUpserter<'a, C>,
    options: PublishOptions,
}

impl<'a, C: ConfluenceApi + ?Sized> Publisher<'a, C> {
    /// Create a publisher.
    #[must_use]
    pub fn new(client: &'a C, options: PublishOptions) -> Self {
        Self {
            upserter: PageUpserter::new(client),
            options,
        }
    }

    /// Check a batch and apply the batch-wide settings to every page.
    ///
    /// See [`prepare_batch`].
    ///
    /// # Errors
    ///
    /// Returns the errors of [`prepare_batch`].
    pub fn prepare(&self, pages: &mut [Page], defaults: &PageDefaults) -> Result<LinkIndex, PublishError> {
        prepare_batch(pages, defaults, &self.options)
    }

    /// Publish prepared pages, then fix up their relative links.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Page`] for the first page that fails, or
    /// [`PublishError::Links`] when a link target was never published and
    /// link errors are not ignored.
    pub fn publish(&self, pages: &mut [Page], mut index: LinkIndex) -> Result<PublishReport, PublishError> {
        let mut report = PublishReport::default();

        for page in pages.iter() {
            let (page_report, remote) = self.publish_page(page).map_err(|source| PublishError::Page {
                title: page.title_str().to_owned(),
                source,
            })?;
            if self.options.enable_relative_links
                && let Some(path) = &page.file_path
            {
                index.record(path, page_report.url.clone());
            }
            info!(title = %page_report.title, id = %remote.id, action = %page_report.action, "Published page");
            report.pages.push(page_report);
        }

        if self.options.enable_relative_links {
            self.relink(pages, &index, &mut report)?;
        }
        Ok(report)
    }

    fn publish_page(&self, page: &Page) -> Result<(PageReport, RemotePage), UpsertError> {
        let result = self.upserter.upsert_page(page, &self.options.upsert)?;
        let remote = result.response;

        let mut attachments = Vec::with_capacity(page.attachments.len());
        for attachment in &page.attachments {
            let uploaded = self
                .upserter
                .upsert_attachment(&remote, page, attachment, &self.options.upsert)?;
            attachments.push(AttachmentReport {
                filename: uploaded.response.title,
                action: uploaded.action,
            });
        }

        let page_report = PageReport {
            title: page.title_str().to_owned(),
            action: result.action,
            url: self.upserter.client().page_url(&remote),
            attachments,
        };
        Ok((page_report, remote))
    }

    /// Replace placeholders with published URLs and republish changed pages.
    fn relink(&self, pages: &mut [Page], index: &LinkIndex, report: &mut PublishReport) -> Result<(), PublishError> {
        let options = UpsertOptions {
            minor_edit: true,
            ..self.options.upsert.clone()
        };

        for page in pages.iter_mut().filter(|p| !p.relative_links.is_empty()) {
            if !index.resolve_page(page, self.options.ignore_relative_link_errors)? {
                continue;
            }
            let Some(path) = page.file_path.clone() else {
                continue;
            };

            info!(page = %path.display(), "Page has updated relative links, republishing");
            self.upserter
                .upsert_page(page, &options)
                .map_err(|source| PublishError::Page {
                    title: page.title_str().to_owned(),
                    source,
                })?;
            report.relinked.push(path);
        }
        Ok(())
    }
}
