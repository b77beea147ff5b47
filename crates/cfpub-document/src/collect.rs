//! Gathering the pages of a batch from command-line inputs.

use std::path::PathBuf;

use cfpub_renderer::StorageRenderer;

use crate::assemble::{assemble_file, assemble_text};
use crate::error::DocumentError;
use crate::page::Page;
use crate::relative_links::restore_placeholders;
use crate::walker::{TreeWalker, WalkOptions};

/// Pages gathered from a set of inputs.
#[derive(Debug, Default)]
pub struct Collection {
    /// Pages in input order, folders before their children.
    pub pages: Vec<Page>,
    /// Inputs that do not exist.
    pub missing: Vec<PathBuf>,
    /// Relative links were found but dropped because only one page remained.
    pub relative_links_ignored: bool,
}

/// Turns files, directories and standard input into pages.
#[derive(Clone, Copy, Debug, Default)]
pub struct Collector {
    walk: WalkOptions,
    renderer: StorageRenderer,
    relative_links: bool,
}

impl Collector {
    /// Create a collector.
    ///
    /// `renderer` carries the text options; relative link extraction is
    /// controlled by `relative_links` alone.
    pub fn new(walk: WalkOptions, renderer: StorageRenderer, relative_links: bool) -> Self {
        Self {
            walk,
            renderer,
            relative_links,
        }
    }

    /// Load every input path.
    ///
    /// Directories are walked. Files get relative link extraction only when
    /// there are several inputs. When the batch ends up with a single page,
    /// `title` replaces its title and any relative links are restored to
    /// their original targets.
    ///
    /// # Errors
    ///
    /// Returns the first error that is not a missing input.
    pub fn collect(&self, inputs: &[PathBuf], title: Option<&str>) -> Result<Collection, DocumentError> {
        let mut collection = Collection::default();
        let file_renderer = self
            .renderer
            .relative_links(self.relative_links && inputs.len() > 1);

        for input in inputs {
            if input.is_dir() {
                let walker = TreeWalker::new(self.walk, self.renderer.relative_links(self.relative_links));
                collection.pages.extend(walker.walk(input)?);
                continue;
            }
            match assemble_file(input, &file_renderer) {
                Ok(page) => collection.pages.push(page),
                Err(DocumentError::FileNotFound(path)) => {
                    tracing::warn!(path = %path.display(), "Input does not exist, skipping");
                    collection.missing.push(path);
                }
                Err(e) => return Err(e),
            }
        }

        if let [only] = collection.pages.as_mut_slice() {
            if let Some(title) = title {
                only.title = Some(title.to_owned());
            }
            if !only.relative_links.is_empty() {
                restore_placeholders(only);
                only.relative_links.clear();
                collection.relative_links_ignored = true;
            }
        }

        Ok(collection)
    }

    /// Load a single document from text read off standard input.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::MissingTitle`] when neither the document nor
    /// `title` provides a title.
    pub fn collect_text(&self, text: &str, title: Option<&str>) -> Result<Page, DocumentError> {
        let mut page = assemble_text(text, &self.renderer.relative_links(false))?;
        if let Some(title) = title {
            page.title = Some(title.to_owned());
        }
        if page.title.as_deref().is_none_or(str::is_empty) {
            return Err(DocumentError::MissingTitle);
        }
        Ok(page)
    }
}

/// Whether `inputs` name more than one document.
///
/// A title or page id can only be given for a single document.
pub fn is_multi_document(inputs: &[PathBuf]) -> bool {
    inputs.len() > 1 || inputs.iter().any(|input| input.is_dir())
}
