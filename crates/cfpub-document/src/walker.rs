//! Directory tree discovery.
//!
//! Walking happens in two phases. The scan lists every directory under the
//! root in pre-order together with the markdown files it directly contains,
//! honoring git ignore rules. The build phase then turns listings into pages,
//! computing each folder's title and the parent title of every document from
//! the folder policies in [`WalkOptions`].
//!
//! The root directory never becomes a page. Its documents are top-level.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use cfpub_renderer::StorageRenderer;
use serde::Deserialize;

use crate::assemble::assemble_file;
use crate::error::DocumentError;
use crate::page::Page;

/// Name of the sidecar file that can override a folder title.
pub const PAGES_FILE: &str = ".pages";

/// Folder policies applied while walking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct WalkOptions {
    /// A folder with exactly one document is replaced by that document.
    pub collapse_single_pages: bool,
    /// Folders without documents of their own get no page.
    pub skip_empty: bool,
    /// Like `skip_empty`, but the next folder down is titled with its path
    /// relative to the nearest folder with documents.
    pub collapse_empty: bool,
    /// Folder titles get dashes and underscores replaced by spaces and a
    /// capital first letter.
    pub beautify_folders: bool,
    /// Read folder titles from `.pages` files.
    pub use_pages_file: bool,
    /// Skip files and folders ignored by git.
    pub use_gitignore: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            collapse_single_pages: false,
            skip_empty: false,
            collapse_empty: false,
            beautify_folders: false,
            use_pages_file: false,
            use_gitignore: true,
        }
    }
}

/// Markdown content of one directory.
#[derive(Debug)]
struct DirListing {
    path: PathBuf,
    markdown_files: Vec<PathBuf>,
    has_subdirs: bool,
}

/// Per-folder state consulted by descendants.
#[derive(Debug, Default)]
struct FolderInfo {
    n_files: usize,
    /// Title children of this folder are parented to.
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PagesFile {
    title: Option<String>,
}

/// Builds the page hierarchy for a directory of markdown documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeWalker {
    options: WalkOptions,
    renderer: StorageRenderer,
}

impl TreeWalker {
    /// Create a walker rendering documents with `renderer`.
    pub fn new(options: WalkOptions, renderer: StorageRenderer) -> Self {
        Self { options, renderer }
    }

    /// Walk `root` and return its pages in pre-order.
    ///
    /// Folder pages precede the documents and folders nested in them.
    /// Documents that cannot be read are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Walk`] if `root` is not a directory and
    /// [`DocumentError::InvalidLabels`] if a document has malformed labels.
    pub fn walk(&self, root: &Path) -> Result<Vec<Page>, DocumentError> {
        if !root.is_dir() {
            return Err(DocumentError::Walk {
                path: root.to_path_buf(),
                message: "not a directory".to_owned(),
            });
        }

        let listings = self.scan(root);
        self.build(root, &listings)
    }

    fn scan(&self, root: &Path) -> Vec<DirListing> {
        let mut listings: Vec<DirListing> = Vec::new();
        let mut index: HashMap<PathBuf, usize> = HashMap::new();

        let walker = ignore::WalkBuilder::new(root)
            .hidden(false)
            .ignore(false)
            .parents(true)
            .git_ignore(self.options.use_gitignore)
            .git_exclude(self.options.use_gitignore)
            .git_global(false)
            .require_git(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read directory entry, skipping");
                    continue;
                }
            };
            let path = entry.path();
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());

            if is_dir {
                if let Some(&parent) = path.parent().and_then(|p| index.get(p)) {
                    listings[parent].has_subdirs = true;
                }
                index.insert(path.to_path_buf(), listings.len());
                listings.push(DirListing {
                    path: path.to_path_buf(),
                    markdown_files: Vec::new(),
                    has_subdirs: false,
                });
            } else if is_markdown(path)
                && let Some(&parent) = path.parent().and_then(|p| index.get(p))
            {
                listings[parent].markdown_files.push(path.to_path_buf());
            }
        }

        listings
    }

    fn build(&self, root: &Path, listings: &[DirListing]) -> Result<Vec<Page>, DocumentError> {
        let options = &self.options;
        let mut folders: HashMap<&Path, FolderInfo> = HashMap::new();
        let mut pages = Vec::new();

        for listing in listings {
            let path = listing.path.as_path();
            let n_files = listing.markdown_files.len();
            let is_root = path == root;
            let collapse_single = !is_root && n_files == 1 && options.collapse_single_pages;

            // Title documents of this folder are parented to.
            let mut parent_title = None;
            // Title of this folder's own page, if it gets one.
            let mut folder_title = None;
            let mut folder_parent_title = None;

            if !is_root {
                let folder_parent = if options.skip_empty || options.collapse_empty {
                    non_empty_ancestor(path, root, &folders)
                } else {
                    path.parent().unwrap_or(root)
                };
                folder_parent_title = folders
                    .get(folder_parent)
                    .and_then(|info| info.title.clone());

                if collapse_single {
                    parent_title.clone_from(&folder_parent_title);
                } else {
                    let title = if options.beautify_folders {
                        beautify(&dir_name(path))
                    } else if options.collapse_empty {
                        relative_title(path, folder_parent)
                    } else {
                        dir_name(path)
                    };
                    parent_title = Some(title.clone());
                    folder_title = Some(title);
                }

                if options.use_pages_file
                    && let Some(title) = read_pages_title(path)
                {
                    parent_title = Some(title.clone());
                    folder_title = Some(title);
                }
            }

            let has_children = n_files > 0
                || (listing.has_subdirs && !options.skip_empty && !options.collapse_empty);
            if let Some(title) = &folder_title
                && has_children
            {
                pages.push(Page::folder(title.clone(), folder_parent_title));
            }
            folders.insert(
                path,
                FolderInfo {
                    n_files,
                    title: folder_title,
                },
            );

            for file in &listing.markdown_files {
                let mut page = match assemble_file(file, &self.renderer) {
                    Ok(page) => page,
                    Err(e @ DocumentError::InvalidLabels { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(path = %file.display(), error = %e, "Failed to load document, skipping");
                        continue;
                    }
                };
                page.parent_title.clone_from(&parent_title);

                // Pages below this folder hang off the collapsed document.
                if collapse_single && let Some(info) = folders.get_mut(path) {
                    info.title.clone_from(&page.title);
                }
                pages.push(page);
            }
        }

        Ok(pages)
    }
}

fn is_markdown(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(".md"))
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Nearest walked ancestor that directly contains documents, or the root.
fn non_empty_ancestor<'a>(
    path: &Path,
    root: &'a Path,
    folders: &HashMap<&'a Path, FolderInfo>,
) -> &'a Path {
    path.ancestors()
        .skip(1)
        .find_map(|ancestor| {
            folders
                .get_key_value(ancestor)
                .filter(|(_, info)| info.n_files > 0)
                .map(|(key, _)| *key)
        })
        .unwrap_or(root)
}

fn relative_title(path: &Path, ancestor: &Path) -> String {
    let relative = path.strip_prefix(ancestor).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn read_pages_title(dir: &Path) -> Option<String> {
    let path = dir.join(PAGES_FILE);
    if !path.is_file() {
        return None;
    }
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read pages file, skipping");
            return None;
        }
    };
    match serde_yaml::from_str::<PagesFile>(&contents) {
        Ok(pages) => pages.title,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Invalid pages file, skipping");
            None
        }
    }
}

/// Turn a directory name into a display title.
///
/// ```
/// use cfpub_document::beautify;
///
/// assert_eq!(beautify("another_yucky-folder"), "Another yucky folder");
/// ```
pub fn beautify(name: &str) -> String {
    let spaced = name.replace(['-', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
