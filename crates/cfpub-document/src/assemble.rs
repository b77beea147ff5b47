//! Document assembly: frontmatter + rendered markdown → [`Page`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cfpub_renderer::StorageRenderer;

use crate::error::DocumentError;
use crate::frontmatter::Frontmatter;
use crate::page::Page;

/// Build a page from the lines of a markdown document.
///
/// The title is the frontmatter `title` if present, otherwise the first
/// level-1 heading. Frontmatter `labels` populate the page labels.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidLabels`] if frontmatter labels are not a
/// list.
pub fn assemble(lines: &[&str], renderer: &StorageRenderer) -> Result<Page, DocumentError> {
    let frontmatter = Frontmatter::extract(lines)?;
    let body: String = lines[frontmatter.end_line..].concat();
    let rendered = renderer.render(&body);

    Ok(Page {
        title: frontmatter.title.or(rendered.title),
        body: rendered.body,
        attachments: rendered.attachments.into_iter().map(PathBuf::from).collect(),
        relative_links: rendered.relative_links,
        labels: frontmatter.labels,
        ..Page::default()
    })
}

/// Build a page from markdown text.
///
/// # Errors
///
/// See [`assemble`].
pub fn assemble_text(text: &str, renderer: &StorageRenderer) -> Result<Page, DocumentError> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    assemble(&lines, renderer)
}

/// Build a page from a markdown file.
///
/// Falls back to the file name without extension when the document has no
/// title.
///
/// # Errors
///
/// Returns [`DocumentError::FileNotFound`] or [`DocumentError::Io`] if the
/// file cannot be read, and [`DocumentError::InvalidLabels`] for bad labels.
pub fn assemble_file(path: &Path, renderer: &StorageRenderer) -> Result<Page, DocumentError> {
    let text = read_text(path)?;
    let mut page = assemble_text(&text, renderer).map_err(|err| match err {
        DocumentError::InvalidLabels { .. } => DocumentError::InvalidLabels {
            path: Some(path.to_path_buf()),
        },
        other => other,
    })?;

    if page.title.as_deref().is_none_or(str::is_empty) {
        page.title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }
    page.file_path = Some(path.to_path_buf());

    Ok(page)
}

/// Read a text file, detecting its encoding when it is not UTF-8.
///
/// # Errors
///
/// Returns [`DocumentError::FileNotFound`] or [`DocumentError::Io`].
pub fn read_text(path: &Path) -> Result<String, DocumentError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            DocumentError::FileNotFound(path.to_path_buf())
        } else {
            DocumentError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let bytes = err.into_bytes();
            let mut detector = chardetng::EncodingDetector::new();
            detector.feed(&bytes, true);
            let encoding = detector.guess(None, true);
            tracing::debug!(path = %path.display(), encoding = encoding.name(), "Decoding non-UTF-8 document");
            let (text, _, _) = encoding.decode(&bytes);
            Ok(text.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_frontmatter_title_wins() {
        let text = "---\ntitle: X\n---\n# Y\n\nbody\n";
        let page = assemble_text(text, &StorageRenderer::new()).unwrap();
        assert_eq!(page.title.as_deref(), Some("X"));
        assert_eq!(page.body, "<h1>Y</h1>\n<p>body</p>\n");
    }

    #[test]
    fn test_heading_title_without_frontmatter() {
        let page = assemble_text("# Y\n\nbody\n", &StorageRenderer::new()).unwrap();
        assert_eq!(page.title.as_deref(), Some("Y"));
    }

    #[test]
    fn test_file_stem_fallback() {
        let dir = create_test_dir();
        let path = dir.path().join("release-notes.md");
        fs::write(&path, "no heading here\n").unwrap();

        let page = assemble_file(&path, &StorageRenderer::new()).unwrap();
        assert_eq!(page.title.as_deref(), Some("release-notes"));
        assert_eq!(page.file_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_frontmatter_labels() {
        let text = "---\nlabels:\n  - a\n  - b\n---\ntext\n";
        let page = assemble_text(text, &StorageRenderer::new()).unwrap();
        assert_eq!(page.labels, Some(vec!["a".to_owned(), "b".to_owned()]));
        assert_eq!(page.body, "<p>text</p>\n");
    }

    #[test]
    fn test_no_labels_means_untouched() {
        let page = assemble_text("text\n", &StorageRenderer::new()).unwrap();
        assert_eq!(page.labels, None);
    }

    #[test]
    fn test_invalid_labels_report_path() {
        let dir = create_test_dir();
        let path = dir.path().join("bad.md");
        fs::write(&path, "---\nlabels: nope\n---\ntext\n").unwrap();

        let err = assemble_file(&path, &StorageRenderer::new()).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::InvalidLabels { path: Some(ref p) } if p == &path
        ));
    }

    #[test]
    fn test_strip_header_and_newlines() {
        let renderer = StorageRenderer::new()
            .strip_header(true)
            .remove_text_newlines(true);
        let page = assemble_text("# Title\n\nLine1\nLine2\n", &renderer).unwrap();
        assert_eq!(page.title.as_deref(), Some("Title"));
        assert_eq!(page.body, "<p>Line1 Line2</p>\n");
    }

    #[test]
    fn test_attachments_and_links_collected() {
        let renderer = StorageRenderer::new().relative_links(true);
        let page = assemble_text("![x](img/a.png) [b](b.md)\n", &renderer).unwrap();
        assert_eq!(page.attachments, vec![PathBuf::from("img/a.png")]);
        assert_eq!(page.relative_links.len(), 1);
        assert_eq!(page.relative_links[0].path, "b.md");
    }

    #[test]
    fn test_missing_file() {
        let dir = create_test_dir();
        let err = assemble_file(&dir.path().join("nope.md"), &StorageRenderer::new()).unwrap_err();
        assert!(matches!(err, DocumentError::FileNotFound(_)));
    }

    #[test]
    fn test_read_legacy_encoding() {
        let dir = create_test_dir();
        let path = dir.path().join("latin1.md");
        // "Café déjà vu" in windows-1252
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode("# Café déjà vu\n\nÀ bientôt, ça va très bien.\n");
        fs::write(&path, &bytes).unwrap();

        let text = read_text(&path).unwrap();
        assert!(text.starts_with("# Café déjà vu"));

        let page = assemble_file(&path, &StorageRenderer::new()).unwrap();
        assert_eq!(page.title.as_deref(), Some("Café déjà vu"));
    }
}
