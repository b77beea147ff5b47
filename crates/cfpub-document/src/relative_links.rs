//! Resolution of links between documents of one batch.
//!
//! Rendered bodies carry placeholder tokens instead of relative link targets.
//! A [`LinkIndex`] maps every document of the batch to the URL it was
//! published at, so the placeholders can be replaced once all pages exist.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use cfpub_renderer::RelativeLink;

use crate::error::{InvalidLink, LinkError};
use crate::page::Page;

/// Published location of every document in a batch, keyed by absolute path.
#[derive(Clone, Debug, Default)]
pub struct LinkIndex {
    urls: HashMap<PathBuf, Option<String>>,
}

impl LinkIndex {
    /// Register every document of the batch with an unknown URL.
    ///
    /// Folder pages are not link targets and are left out.
    pub fn from_pages(pages: &[Page]) -> Self {
        let urls = pages
            .iter()
            .filter_map(|page| page.file_path.as_deref())
            .map(|path| (normalize_path(path), None))
            .collect();
        Self { urls }
    }

    /// Number of documents in the index.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether the index has no documents.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Whether `path` is a document of the batch.
    pub fn contains(&self, path: &Path) -> bool {
        self.urls.contains_key(&normalize_path(path))
    }

    /// Check that every relative link targets a document of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidLinks`] listing every link whose target is
    /// not in the index.
    pub fn validate(&self, pages: &[Page]) -> Result<(), LinkError> {
        let invalid: Vec<InvalidLink> = pages
            .iter()
            .filter_map(|page| page.file_path.as_deref().map(|path| (path, page)))
            .flat_map(|(path, page)| {
                page.relative_links
                    .iter()
                    .filter(|link| !self.urls.contains_key(&link_target(path, link)))
                    .map(|link| InvalidLink {
                        page: path.to_path_buf(),
                        link: link.path.clone(),
                    })
            })
            .collect();

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(LinkError::InvalidLinks(invalid))
        }
    }

    /// Record the URL a document was published at.
    pub fn record(&mut self, path: &Path, url: impl Into<String>) {
        self.urls.insert(normalize_path(path), Some(url.into()));
    }

    /// URL of the document at `path`, if it has been published.
    pub fn url(&self, path: &Path) -> Option<&str> {
        self.urls.get(&normalize_path(path))?.as_deref()
    }

    /// Replace the placeholders in a page body with published URLs.
    ///
    /// Unresolved links are restored to their original target when
    /// `tolerate_errors` is set. Returns whether the body changed.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Unresolved`] for the first link whose target has
    /// no URL when errors are not tolerated. The body is left unchanged.
    pub fn resolve_page(&self, page: &mut Page, tolerate_errors: bool) -> Result<bool, LinkError> {
        let Some(path) = page.file_path.as_deref() else {
            return Ok(false);
        };

        let mut body = page.body.clone();
        for link in &page.relative_links {
            let replacement = match self.urls.get(&link_target(path, link)) {
                Some(Some(url)) => url.as_str(),
                _ if tolerate_errors => {
                    tracing::warn!(page = %path.display(), link = %link.path, "Unresolved relative link, keeping original target");
                    link.escaped_original.as_str()
                }
                _ => {
                    return Err(LinkError::Unresolved {
                        page: path.to_path_buf(),
                        link: link.path.clone(),
                    });
                }
            };
            body = body.replace(&link.placeholder, replacement);
        }

        let changed = body != page.body;
        page.body = body;
        Ok(changed)
    }
}

/// Put the original link targets back in place of placeholders.
///
/// Returns whether the body changed.
pub fn restore_placeholders(page: &mut Page) -> bool {
    let mut changed = false;
    for link in &page.relative_links {
        if page.body.contains(&link.placeholder) {
            page.body = page.body.replace(&link.placeholder, &link.escaped_original);
            changed = true;
        }
    }
    changed
}

/// Absolute path of the document a link points at.
pub fn link_target(page_path: &Path, link: &RelativeLink) -> PathBuf {
    let base = page_path.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&base.join(&link.path))
}

/// Canonical form of `path` used as an index key.
///
/// Existing paths are canonicalized. Missing ones are made absolute and
/// cleaned up lexically.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
