//! Error types for document loading and link resolution.

use std::fmt::Write;
use std::path::PathBuf;

/// Error while turning source documents into pages.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Source file does not exist.
    #[error("File {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// Source file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Frontmatter `labels` is not a list of strings.
    #[error("{}the labels section in the frontmatter must be a list of strings", location(.path.as_ref()))]
    InvalidLabels {
        /// Document containing the frontmatter, when known.
        path: Option<PathBuf>,
    },

    /// A document has no title and none was supplied.
    #[error("A title is required: the document has none and no title was given")]
    MissingTitle,

    /// Several pages of one batch share a title.
    #[error("{}", duplicate_report(.0))]
    DuplicateTitles(Vec<DuplicateTitle>),

    /// Directory walk failed.
    #[error("Failed to walk {}: {message}", path.display())]
    Walk {
        /// Directory being walked.
        path: PathBuf,
        /// Error reported by the walker.
        message: String,
    },
}

/// A page whose title collides with another page of the batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateTitle {
    /// The shared title.
    pub title: String,
    /// Source file of the page, absent for folder pages.
    pub file_path: Option<PathBuf>,
}

fn location(path: Option<&PathBuf>) -> String {
    path.map(|p| format!("{}: ", p.display())).unwrap_or_default()
}

fn duplicate_report(duplicates: &[DuplicateTitle]) -> String {
    let mut report = String::from(
        "Some documents have the same title, but all Confluence pages in the same space \
         must have different titles.\nThese are the documents (and path, if available) \
         with identical titles:",
    );
    for duplicate in duplicates {
        let path = duplicate
            .file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let _ = write!(report, "\n{}\t{path}", duplicate.title);
    }
    report
}

/// Error in the relative link protocol.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Links point at documents outside the batch.
    #[error("{}", invalid_report(.0))]
    InvalidLinks(Vec<InvalidLink>),

    /// A link target was not published, so its URL is unknown.
    #[error("Page {} has a relative link to {link}, which was not uploaded correctly", page.display())]
    Unresolved {
        /// Document containing the link.
        page: PathBuf,
        /// Link path as written (decoded).
        link: String,
    },
}

/// A relative link whose target is not part of the batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidLink {
    /// Document containing the link.
    pub page: PathBuf,
    /// Link path as written (decoded).
    pub link: String,
}

fn invalid_report(links: &[InvalidLink]) -> String {
    let mut report = String::from("Some of the pages to be uploaded have invalid relative links:");
    for link in links {
        let _ = write!(
            report,
            "\nPage {} has a relative link to {}, which is not in the list of pages to be uploaded",
            link.page.display(),
            link.link
        );
    }
    report
}
