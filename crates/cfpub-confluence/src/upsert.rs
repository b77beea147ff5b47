//! Create, update or skip decisions for pages and attachments.
//!
//! With `only_changed` set, every version message carries a trailing
//! `[v<sha1>]` marker of the published content. A later run compares the
//! marker against the local content and skips the write when they match.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use cfpub_document::{ContentType, Page};
use regex::Regex;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::api::{AttachmentUpload, ConfluenceApi, NewPage, PAGE_EXPANSIONS, PageLookup, PageUpdate};
use crate::error::UpsertError;
use crate::types::{Attachment, Page as RemotePage};

/// Content hash marker, only recognised at the very end of a message.
static CONTENT_HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[v([a-f0-9]{40})]$").unwrap());

/// Chunk size used when hashing attachment files.
const HASH_CHUNK_SIZE: usize = 4096;

/// What an upsert did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertAction {
    /// A new object was created.
    Created,
    /// A new version of an existing object was published.
    Updated,
    /// The remote object was already up to date.
    Skipped,
}

impl fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
        })
    }
}

/// Outcome of an upsert together with the remote object it left behind.
#[derive(Clone, Debug)]
pub struct UpsertResult<T> {
    /// What was done.
    pub action: UpsertAction,
    /// Remote object after the operation.
    pub response: T,
}

/// Settings for page and attachment upserts.
#[derive(Clone, Debug, Default)]
pub struct UpsertOptions {
    /// Version message.
    pub message: Option<String>,
    /// Skip writes when the remote content hash matches.
    pub only_changed: bool,
    /// Replace remote labels instead of adding to them.
    pub replace_all_labels: bool,
    /// Mark updates as minor edits.
    pub minor_edit: bool,
}

/// Creates or updates pages and attachments through a [`ConfluenceApi`].
pub struct PageUpserter<'a, C: ConfluenceApi + ?Sized> {
    client: &'a C,
    /// Home page id per space key.
    homepages: RefCell<HashMap<String, Option<String>>>,
}

impl<'a, C: ConfluenceApi + ?Sized> PageUpserter<'a, C> {
    /// Create an upserter.
    #[must_use]
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            homepages: RefCell::new(HashMap::new()),
        }
    }

    /// The client this upserter talks to.
    pub fn client(&self) -> &'a C {
        self.client
    }

    /// Create `page` remotely, or update the existing page of the same
    /// title (or id).
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError::ParentNotFound`] when the parent title does not
    /// exist in the space, or [`UpsertError::Confluence`] when a remote call
    /// fails.
    pub fn upsert_page(
        &self,
        page: &Page,
        options: &UpsertOptions,
    ) -> Result<UpsertResult<RemotePage>, UpsertError> {
        let title = page.title_str();
        let lookup = match page.page_id.as_deref() {
            Some(id) => PageLookup::Id(id),
            None => PageLookup::Title {
                title,
                space: &page.space,
                content_type: page.content_type,
            },
        };
        let existing = self.client.get_page(lookup, PAGE_EXPANSIONS)?;
        let parent_id = self.resolve_parent(page)?;

        let hash = page.content_hash();
        let message = if options.only_changed {
            Some(versioned_message(options.message.as_deref(), &hash))
        } else {
            options.message.clone()
        };

        let Some(existing) = existing else {
            info!(title, "Creating page");
            let created = self.client.create_page(&NewPage {
                space: &page.space,
                title,
                body: &page.body,
                content_type: page.content_type,
                parent_id: parent_id.as_deref(),
                message: message.as_deref(),
                labels: page.labels.as_deref(),
            })?;
            return Ok(UpsertResult {
                action: UpsertAction::Created,
                response: created,
            });
        };

        let to_top_level = parent_id.is_none() && self.needs_move_to_top(&existing, &page.space)?;
        let needs_update = !options.only_changed
            || to_top_level
            || parent_id
                .as_deref()
                .is_some_and(|id| existing.parent_id() != Some(id))
            || (options.replace_all_labels && labels_differ(&existing, page.labels.as_deref()))
            || content_hash_marker(existing.version.message.as_deref().unwrap_or_default())
                != Some(hash.as_str());

        let (action, response) = if needs_update {
            // Top-level pages hang off the space home page.
            let new_parent = if to_top_level {
                self.homepage(&page.space)?
            } else {
                parent_id
            };
            info!(title, id = %existing.id, "Updating page");
            let updated = self.client.update_page(
                &existing,
                &PageUpdate {
                    body: &page.body,
                    content_type: page.content_type,
                    parent_id: new_parent.as_deref(),
                    message: message.as_deref(),
                    labels: if options.replace_all_labels {
                        page.labels.as_deref()
                    } else {
                        None
                    },
                    minor_edit: options.minor_edit,
                },
            )?;
            (UpsertAction::Updated, updated)
        } else {
            info!(title, id = %existing.id, "Page is up to date, skipping");
            (UpsertAction::Skipped, existing.clone())
        };

        if action != UpsertAction::Skipped
            && !options.replace_all_labels
            && let Some(labels) = page.labels.as_deref()
            && !labels.is_empty()
            && labels_differ(&existing, Some(labels))
        {
            debug!(title, ?labels, "Adding labels");
            self.client.add_labels(&response, labels)?;
        }

        Ok(UpsertResult { action, response })
    }

    /// Upload one attachment of `page` to the remote page `remote`.
    ///
    /// Relative paths are resolved against the directory of the page's
    /// source document.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError::Io`] when the file cannot be read, or
    /// [`UpsertError::Confluence`] when a remote call fails.
    pub fn upsert_attachment(
        &self,
        remote: &RemotePage,
        page: &Page,
        attachment: &Path,
        options: &UpsertOptions,
    ) -> Result<UpsertResult<Attachment>, UpsertError> {
        let path = attachment_path(page, attachment);
        let io_error = |source| UpsertError::Io {
            path: path.clone(),
            source,
        };
        std::fs::metadata(&path).map_err(io_error)?;

        let hash = if options.only_changed {
            Some(file_sha1(&path).map_err(io_error)?)
        } else {
            None
        };
        let comment = match &hash {
            Some(hash) => versioned_message(options.message.as_deref(), hash),
            None => options.message.clone().unwrap_or_default(),
        };

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let upload = AttachmentUpload {
            path: &path,
            filename: &filename,
            comment: &comment,
        };

        let Some(existing) = self.client.get_attachment(remote, &filename)? else {
            info!(filename, page = %remote.id, "Uploading attachment");
            let created = self.client.create_attachment(remote, &upload)?;
            return Ok(UpsertResult {
                action: UpsertAction::Created,
                response: created,
            });
        };

        if let Some(hash) = &hash
            && content_hash_marker(existing.version_message().unwrap_or_default())
                == Some(hash.as_str())
        {
            info!(filename, page = %remote.id, "Attachment is up to date, skipping");
            return Ok(UpsertResult {
                action: UpsertAction::Skipped,
                response: existing,
            });
        }

        info!(filename, page = %remote.id, "Updating attachment");
        let updated = self.client.update_attachment(remote, &existing, &upload)?;
        Ok(UpsertResult {
            action: UpsertAction::Updated,
            response: updated,
        })
    }

    /// Parent page id: the explicit id, or the id of the page titled
    /// `parent_title` in the same space.
    fn resolve_parent(&self, page: &Page) -> Result<Option<String>, UpsertError> {
        if let Some(id) = &page.parent_id {
            return Ok(Some(id.clone()));
        }
        let Some(parent_title) = &page.parent_title else {
            return Ok(None);
        };

        let parent = self.client.get_page(
            PageLookup::Title {
                title: parent_title,
                space: &page.space,
                content_type: ContentType::Page,
            },
            &[],
        )?;
        match parent {
            Some(parent) => Ok(Some(parent.id)),
            None => Err(UpsertError::ParentNotFound {
                title: parent_title.clone(),
            }),
        }
    }

    /// Whether `remote` must be moved to the top of its space.
    ///
    /// Top-level pages either have no ancestors or only the space home page.
    /// Without a home page there is nothing to move the page under, so only
    /// pages without ancestors count as top-level and nested ones are left
    /// where they are.
    fn needs_move_to_top(&self, remote: &RemotePage, space: &str) -> Result<bool, UpsertError> {
        if remote.ancestors.is_empty() {
            return Ok(false);
        }
        let Some(homepage) = self.homepage(space)? else {
            warn!(
                title = %remote.title,
                space,
                "Space has no home page, cannot move page to the top level"
            );
            return Ok(false);
        };
        Ok(!matches!(remote.ancestors.as_slice(), [only] if only.id == homepage))
    }

    fn homepage(&self, space: &str) -> Result<Option<String>, UpsertError> {
        if let Some(cached) = self.homepages.borrow().get(space) {
            return Ok(cached.clone());
        }
        let homepage = self
            .client
            .get_space(space, &["homepage"])?
            .homepage
            .map(|home| home.id);
        self.homepages
            .borrow_mut()
            .insert(space.to_owned(), homepage.clone());
        Ok(homepage)
    }
}

/// Hash recorded at the end of a version message, if any.
pub fn content_hash_marker(message: &str) -> Option<&str> {
    CONTENT_HASH_RE
        .captures(message)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Version message carrying a content hash marker.
///
/// ```
/// use cfpub_confluence::versioned_message;
///
/// let hash = "1eebdf4fdc9fc7bf283031b93f9aef3338de9052";
/// assert_eq!(versioned_message(Some("sync"), hash), format!("sync [v{hash}]"));
/// assert_eq!(versioned_message(None, hash), format!("[v{hash}]"));
/// ```
pub fn versioned_message(message: Option<&str>, hash: &str) -> String {
    match message.filter(|m| !m.is_empty()) {
        Some(message) => format!("{message} [v{hash}]"),
        None => format!("[v{hash}]"),
    }
}

/// Hex SHA-1 of a file, read in fixed-size chunks.
///
/// # Errors
///
/// Returns the I/O error of opening or reading the file.
pub fn file_sha1(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn attachment_path(page: &Page, attachment: &Path) -> PathBuf {
    match page.file_path.as_deref().and_then(Path::parent) {
        Some(dir) => dir.join(attachment),
        None => attachment.to_path_buf(),
    }
}

/// Whether the remote label names differ from `labels` as sets.
fn labels_differ(remote: &RemotePage, labels: Option<&[String]>) -> bool {
    let Some(labels) = labels else {
        return false;
    };
    let wanted: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
    remote.label_names() != wanted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{Call, FakeConfluence};
    use pretty_assertions::assert_eq;

    fn page(title: &str, body: &str) -> Page {
        Page {
            title: Some(title.to_owned()),
            body: body.to_owned(),
            space: "DOCS".to_owned(),
            ..Page::default()
        }
    }

    fn only_changed() -> UpsertOptions {
        UpsertOptions {
            message: Some("sync".to_owned()),
            only_changed: true,
            ..UpsertOptions::default()
        }
    }

    fn labels(names: &[&str]) -> Option<Vec<String>> {
        Some(names.iter().map(|n| (*n).to_owned()).collect())
    }

    #[test]
    fn test_content_hash_marker_at_end() {
        let hash = "1eebdf4fdc9fc7bf283031b93f9aef3338de9052";
        assert_eq!(content_hash_marker(&format!("sync [v{hash}]")), Some(hash));
        assert_eq!(content_hash_marker(&format!("[v{hash}]")), Some(hash));
    }

    #[test]
    fn test_content_hash_marker_not_at_end() {
        let hash = "1eebdf4fdc9fc7bf283031b93f9aef3338de9052";
        assert_eq!(content_hash_marker(&format!("[v{hash}] later edit")), None);
        assert_eq!(content_hash_marker("[vABC]"), None);
        assert_eq!(content_hash_marker(""), None);
    }

    #[test]
    fn test_versioned_message_empty() {
        assert_eq!(versioned_message(Some(""), "ab"), "[vab]");
    }

    #[test]
    fn test_file_sha1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, "test content").unwrap();
        assert_eq!(
            file_sha1(&path).unwrap(),
            "1eebdf4fdc9fc7bf283031b93f9aef3338de9052"
        );
    }

    #[test]
    fn test_file_sha1_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();
        assert_eq!(file_sha1(&path).unwrap(), cfpub_document::sha1_hex(&data));
    }

    #[test]
    fn test_create_then_skip() {
        let fake = FakeConfluence::new();
        let upserter = PageUpserter::new(&fake);
        let page = page("Guide", "<p>hi</p>\n");

        let first = upserter.upsert_page(&page, &only_changed()).unwrap();
        let second = upserter.upsert_page(&page, &only_changed()).unwrap();

        assert_eq!(first.action, UpsertAction::Created);
        assert_eq!(second.action, UpsertAction::Skipped);
        assert_eq!(fake.calls().len(), 1);
        assert_eq!(
            fake.page("Guide").unwrap().version.message,
            Some(format!("sync [v{}]", page.content_hash()))
        );
    }

    #[test]
    fn test_changed_body_updates() {
        let fake = FakeConfluence::new();
        let upserter = PageUpserter::new(&fake);
        upserter
            .upsert_page(&page("Guide", "<p>one</p>\n"), &only_changed())
            .unwrap();

        let result = upserter
            .upsert_page(&page("Guide", "<p>two</p>\n"), &only_changed())
            .unwrap();

        assert_eq!(result.action, UpsertAction::Updated);
        assert_eq!(fake.body("Guide").as_deref(), Some("<p>two</p>\n"));
    }

    #[test]
    fn test_always_updates_without_only_changed() {
        let fake = FakeConfluence::new();
        let upserter = PageUpserter::new(&fake);
        let page = page("Guide", "<p>hi</p>\n");
        let options = UpsertOptions::default();

        upserter.upsert_page(&page, &options).unwrap();
        let result = upserter.upsert_page(&page, &options).unwrap();

        assert_eq!(result.action, UpsertAction::Updated);
        assert_eq!(
            fake.calls()[1],
            Call::UpdatePage {
                id: "100".to_owned(),
                parent_id: None,
                message: None,
                labels: None,
                minor_edit: false,
            }
        );
    }

    #[test]
    fn test_parent_resolved_by_title() {
        let fake = FakeConfluence::new();
        let parent = fake.seed_page("Parent", None, None, &[]);
        let upserter = PageUpserter::new(&fake);
        let mut page = page("Child", "");
        page.parent_title = Some("Parent".to_owned());

        upserter.upsert_page(&page, &UpsertOptions::default()).unwrap();

        assert_eq!(fake.page("Child").unwrap().parent_id(), Some(parent.as_str()));
    }

    #[test]
    fn test_parent_not_found() {
        let fake = FakeConfluence::new();
        let upserter = PageUpserter::new(&fake);
        let mut page = page("Child", "");
        page.parent_title = Some("Missing".to_owned());

        let err = upserter
            .upsert_page(&page, &UpsertOptions::default())
            .unwrap_err();

        assert!(matches!(err, UpsertError::ParentNotFound { ref title } if title == "Missing"));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_parent_change_forces_update() {
        let fake = FakeConfluence::new();
        let old_parent = fake.seed_page("Old", None, None, &[]);
        let new_parent = fake.seed_page("New", None, None, &[]);
        let mut page = page("Child", "<p>same</p>\n");
        let marker = versioned_message(Some("sync"), &page.content_hash());
        fake.seed_page("Child", Some(&old_parent), Some(&marker), &[]);
        page.parent_id = Some(new_parent.clone());

        let result = PageUpserter::new(&fake)
            .upsert_page(&page, &only_changed())
            .unwrap();

        assert_eq!(result.action, UpsertAction::Updated);
        assert_eq!(fake.page("Child").unwrap().parent_id(), Some(new_parent.as_str()));
    }

    #[test]
    fn test_move_to_top_level() {
        let fake = FakeConfluence::with_homepage("1");
        let section = fake.seed_page("Section", None, None, &[]);
        let page = page("Child", "<p>same</p>\n");
        let marker = versioned_message(Some("sync"), &page.content_hash());
        fake.seed_page("Child", Some(&section), Some(&marker), &[]);

        let result = PageUpserter::new(&fake)
            .upsert_page(&page, &only_changed())
            .unwrap();

        assert_eq!(result.action, UpsertAction::Updated);
        assert!(matches!(
            &fake.calls()[0],
            Call::UpdatePage { parent_id: Some(id), .. } if id == "1"
        ));
    }

    #[test]
    fn test_top_level_under_homepage_skips() {
        let fake = FakeConfluence::with_homepage("1");
        let page = page("Top", "<p>same</p>\n");
        let marker = versioned_message(Some("sync"), &page.content_hash());
        fake.seed_page("Top", None, Some(&marker), &[]);
        let upserter = PageUpserter::new(&fake);

        let first = upserter.upsert_page(&page, &only_changed()).unwrap();
        let second = upserter.upsert_page(&page, &only_changed()).unwrap();

        assert_eq!(first.action, UpsertAction::Skipped);
        assert_eq!(second.action, UpsertAction::Skipped);
        assert_eq!(fake.space_lookups(), 1);
    }

    #[test]
    fn test_space_without_homepage() {
        let fake = FakeConfluence::new();
        let section = fake.seed_page("Section", None, None, &[]);
        let top = page("Top", "<p>same</p>\n");
        let nested = page("Child", "<p>same</p>\n");
        fake.seed_page(
            "Top",
            None,
            Some(&versioned_message(Some("sync"), &top.content_hash())),
            &[],
        );
        fake.seed_page(
            "Child",
            Some(&section),
            Some(&versioned_message(Some("sync"), &nested.content_hash())),
            &[],
        );
        let upserter = PageUpserter::new(&fake);

        for _ in 0..2 {
            let results = [
                upserter.upsert_page(&top, &only_changed()).unwrap(),
                upserter.upsert_page(&nested, &only_changed()).unwrap(),
            ];
            assert!(results.iter().all(|r| r.action == UpsertAction::Skipped));
        }
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_replace_labels_when_sets_differ() {
        let fake = FakeConfluence::new();
        let mut page = page("Guide", "<p>same</p>\n");
        let marker = versioned_message(Some("sync"), &page.content_hash());
        fake.seed_page("Guide", None, Some(&marker), &["x", "y"]);
        page.labels = labels(&["y", "z"]);
        let options = UpsertOptions {
            replace_all_labels: true,
            ..only_changed()
        };

        let result = PageUpserter::new(&fake).upsert_page(&page, &options).unwrap();

        assert_eq!(result.action, UpsertAction::Updated);
        assert!(matches!(
            &fake.calls()[0],
            Call::UpdatePage { labels: Some(l), .. } if *l == ["y", "z"]
        ));
        assert_eq!(
            fake.page("Guide").unwrap().label_names(),
            BTreeSet::from(["y", "z"])
        );
    }

    #[test]
    fn test_label_order_does_not_matter() {
        let fake = FakeConfluence::new();
        let mut page = page("Guide", "<p>same</p>\n");
        let marker = versioned_message(Some("sync"), &page.content_hash());
        fake.seed_page("Guide", None, Some(&marker), &["x", "y"]);
        page.labels = labels(&["y", "x"]);
        let options = UpsertOptions {
            replace_all_labels: true,
            ..only_changed()
        };

        let result = PageUpserter::new(&fake).upsert_page(&page, &options).unwrap();

        assert_eq!(result.action, UpsertAction::Skipped);
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_additive_labels_on_update() {
        let fake = FakeConfluence::new();
        fake.seed_page("Guide", None, Some("old"), &["x"]);
        let mut page = page("Guide", "<p>new</p>\n");
        page.labels = labels(&["z"]);

        let result = PageUpserter::new(&fake)
            .upsert_page(&page, &only_changed())
            .unwrap();

        assert_eq!(result.action, UpsertAction::Updated);
        let calls = fake.calls();
        assert!(matches!(&calls[0], Call::UpdatePage { labels: None, .. }));
        assert!(matches!(&calls[1], Call::AddLabels { labels, .. } if *labels == ["z"]));
    }

    #[test]
    fn test_no_additive_labels_when_skipped() {
        let fake = FakeConfluence::new();
        let mut page = page("Guide", "<p>same</p>\n");
        let marker = versioned_message(Some("sync"), &page.content_hash());
        fake.seed_page("Guide", None, Some(&marker), &["x"]);
        page.labels = labels(&["z"]);

        let result = PageUpserter::new(&fake)
            .upsert_page(&page, &only_changed())
            .unwrap();

        assert_eq!(result.action, UpsertAction::Skipped);
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_lookup_by_page_id() {
        let fake = FakeConfluence::new();
        let id = fake.seed_page("Old title", None, None, &[]);
        let mut page = page("New title", "<p>body</p>\n");
        page.page_id = Some(id.clone());

        let result = PageUpserter::new(&fake)
            .upsert_page(&page, &UpsertOptions::default())
            .unwrap();

        assert_eq!(result.action, UpsertAction::Updated);
        assert_eq!(result.response.id, id);
    }

    #[test]
    fn test_attachment_create_then_skip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/pic.png"), b"PNG").unwrap();
        let fake = FakeConfluence::new();
        let upserter = PageUpserter::new(&fake);
        let mut page = page("Guide", "");
        page.file_path = Some(dir.path().join("guide.md"));
        let remote = upserter.upsert_page(&page, &only_changed()).unwrap().response;

        let first = upserter
            .upsert_attachment(&remote, &page, Path::new("img/pic.png"), &only_changed())
            .unwrap();
        let second = upserter
            .upsert_attachment(&remote, &page, Path::new("img/pic.png"), &only_changed())
            .unwrap();

        assert_eq!(first.action, UpsertAction::Created);
        assert_eq!(second.action, UpsertAction::Skipped);
        assert_eq!(
            fake.calls()[1],
            Call::CreateAttachment {
                page_id: remote.id.clone(),
                filename: "pic.png".to_owned(),
                comment: format!("sync [v{}]", cfpub_document::sha1_hex(b"PNG")),
            }
        );
    }

    #[test]
    fn test_attachment_changed_updates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.png"), b"NEW").unwrap();
        let fake = FakeConfluence::new();
        let id = fake.seed_page("Guide", None, None, &[]);
        fake.seed_attachment(&id, "pic.png", &versioned_message(None, &cfpub_document::sha1_hex(b"OLD")));
        let remote = fake.page("Guide").unwrap();
        let mut page = page("Guide", "");
        page.file_path = Some(dir.path().join("guide.md"));

        let result = PageUpserter::new(&fake)
            .upsert_attachment(&remote, &page, Path::new("pic.png"), &only_changed())
            .unwrap();

        assert_eq!(result.action, UpsertAction::Updated);
        assert!(matches!(&fake.calls()[0], Call::UpdateAttachment { .. }));
    }

    #[test]
    fn test_attachment_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeConfluence::new();
        let remote = RemotePage {
            id: "1".to_owned(),
            ..RemotePage::default()
        };
        let mut page = page("Guide", "");
        page.file_path = Some(dir.path().join("guide.md"));

        let err = PageUpserter::new(&fake)
            .upsert_attachment(&remote, &page, Path::new("gone.png"), &only_changed())
            .unwrap_err();

        assert!(matches!(err, UpsertError::Io { ref path, .. } if path.ends_with("gone.png")));
    }
}
