//! In-memory Confluence used by tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::api::{AttachmentUpload, ConfluenceApi, NewPage, PageLookup, PageUpdate};
use crate::error::ConfluenceError;
use crate::types::{Ancestor, Attachment, ContentRef, Label, LabelArray, Links, Metadata, Page, Space, Version};

/// A write made against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    CreatePage {
        title: String,
        parent_id: Option<String>,
        message: Option<String>,
        labels: Option<Vec<String>>,
    },
    UpdatePage {
        id: String,
        parent_id: Option<String>,
        message: Option<String>,
        labels: Option<Vec<String>>,
        minor_edit: bool,
    },
    CreateAttachment {
        page_id: String,
        filename: String,
        comment: String,
    },
    UpdateAttachment {
        attachment_id: String,
        comment: String,
    },
    AddLabels {
        page_id: String,
        labels: Vec<String>,
    },
}

#[derive(Default)]
pub(crate) struct FakeConfluence {
    pages: RefCell<Vec<Page>>,
    bodies: RefCell<HashMap<String, String>>,
    attachments: RefCell<Vec<(String, Attachment)>>,
    calls: RefCell<Vec<Call>>,
    homepage: Option<String>,
    fail_title: Option<String>,
    next_id: Cell<u64>,
    space_lookups: Cell<usize>,
}

impl FakeConfluence {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Cell::new(100),
            ..Self::default()
        }
    }

    /// Space whose home page is `id` (created as a page titled "Home").
    pub(crate) fn with_homepage(id: &str) -> Self {
        let fake = Self {
            homepage: Some(id.to_owned()),
            ..Self::new()
        };
        fake.pages.borrow_mut().push(Page {
            id: id.to_owned(),
            content_type: "page".to_owned(),
            title: "Home".to_owned(),
            version: Version {
                number: 1,
                message: None,
            },
            ..Page::default()
        });
        fake
    }

    /// Make every write for a page with this title fail.
    pub(crate) fn failing_on(mut self, title: &str) -> Self {
        self.fail_title = Some(title.to_owned());
        self
    }

    /// Add an existing remote page and return its id.
    pub(crate) fn seed_page(
        &self,
        title: &str,
        parent_id: Option<&str>,
        message: Option<&str>,
        labels: &[&str],
    ) -> String {
        let id = self.allocate_id();
        let page = Page {
            id: id.clone(),
            content_type: "page".to_owned(),
            title: title.to_owned(),
            version: Version {
                number: 1,
                message: message.map(str::to_owned),
            },
            ancestors: self.ancestors_for(parent_id),
            metadata: Some(metadata(labels.iter().map(|l| (*l).to_owned()))),
            links: Some(links(&id)),
        };
        self.pages.borrow_mut().push(page);
        id
    }

    /// Add an existing attachment to a page.
    pub(crate) fn seed_attachment(&self, page_id: &str, filename: &str, message: &str) {
        let attachment = Attachment {
            id: self.allocate_id(),
            title: filename.to_owned(),
            version: Some(Version {
                number: 1,
                message: Some(message.to_owned()),
            }),
        };
        self.attachments
            .borrow_mut()
            .push((page_id.to_owned(), attachment));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn page(&self, title: &str) -> Option<Page> {
        self.pages.borrow().iter().find(|p| p.title == title).cloned()
    }

    pub(crate) fn body(&self, title: &str) -> Option<String> {
        let id = self.page(title)?.id;
        self.bodies.borrow().get(&id).cloned()
    }

    pub(crate) fn space_lookups(&self) -> usize {
        self.space_lookups.get()
    }

    fn allocate_id(&self) -> String {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id.to_string()
    }

    fn ancestors_for(&self, parent_id: Option<&str>) -> Vec<Ancestor> {
        let Some(parent_id) = parent_id else {
            return self
                .homepage
                .iter()
                .map(|id| Ancestor { id: id.clone() })
                .collect();
        };
        let mut chain = self
            .pages
            .borrow()
            .iter()
            .find(|p| p.id == parent_id)
            .map(|p| p.ancestors.clone())
            .unwrap_or_default();
        chain.push(Ancestor {
            id: parent_id.to_owned(),
        });
        chain
    }

    fn check_failure(&self, title: &str) -> Result<(), ConfluenceError> {
        if self.fail_title.as_deref() == Some(title) {
            return Err(ConfluenceError::HttpResponse {
                status: 500,
                body: "boom".to_owned(),
            });
        }
        Ok(())
    }
}

fn metadata(labels: impl Iterator<Item = String>) -> Metadata {
    Metadata {
        labels: Some(LabelArray {
            results: labels
                .map(|name| Label {
                    name,
                    prefix: Some("global".to_owned()),
                })
                .collect(),
        }),
    }
}

fn links(id: &str) -> Links {
    Links {
        base: Some("https://wiki.example.com".to_owned()),
        webui: Some(format!("/pages/{id}")),
    }
}

impl ConfluenceApi for FakeConfluence {
    fn get_page(&self, lookup: PageLookup<'_>, _expand: &[&str]) -> Result<Option<Page>, ConfluenceError> {
        let pages = self.pages.borrow();
        let found = match lookup {
            PageLookup::Id(id) => pages.iter().find(|p| p.id == id),
            PageLookup::Title {
                title,
                content_type,
                ..
            } => pages
                .iter()
                .find(|p| p.title == title && p.content_type == content_type.as_str()),
        };
        Ok(found.cloned())
    }

    fn create_page(&self, page: &NewPage<'_>) -> Result<Page, ConfluenceError> {
        self.check_failure(page.title)?;
        self.calls.borrow_mut().push(Call::CreatePage {
            title: page.title.to_owned(),
            parent_id: page.parent_id.map(str::to_owned),
            message: page.message.map(str::to_owned),
            labels: page.labels.map(<[String]>::to_vec),
        });

        let id = self.allocate_id();
        let created = Page {
            id: id.clone(),
            content_type: page.content_type.as_str().to_owned(),
            title: page.title.to_owned(),
            version: Version {
                number: 1,
                message: page.message.map(str::to_owned),
            },
            ancestors: self.ancestors_for(page.parent_id),
            metadata: Some(metadata(page.labels.unwrap_or_default().iter().cloned())),
            links: Some(links(&id)),
        };
        self.bodies.borrow_mut().insert(id, page.body.to_owned());
        self.pages.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn update_page(&self, page: &Page, update: &PageUpdate<'_>) -> Result<Page, ConfluenceError> {
        self.check_failure(&page.title)?;
        self.calls.borrow_mut().push(Call::UpdatePage {
            id: page.id.clone(),
            parent_id: update.parent_id.map(str::to_owned),
            message: update.message.map(str::to_owned),
            labels: update.labels.map(<[String]>::to_vec),
            minor_edit: update.minor_edit,
        });

        let ancestors = update.parent_id.map(|id| self.ancestors_for(Some(id)));
        let mut pages = self.pages.borrow_mut();
        let stored = pages
            .iter_mut()
            .find(|p| p.id == page.id)
            .ok_or(ConfluenceError::HttpResponse {
                status: 404,
                body: "not found".to_owned(),
            })?;
        stored.version = Version {
            number: stored.version.number + 1,
            message: update.message.map(str::to_owned),
        };
        if let Some(ancestors) = ancestors {
            // Moving under the home page makes the page top-level.
            stored.ancestors = if self.homepage.as_deref() == update.parent_id {
                ancestors.into_iter().take(1).collect()
            } else {
                ancestors
            };
        }
        if let Some(labels) = update.labels {
            stored.metadata = Some(metadata(labels.iter().cloned()));
        }
        self.bodies
            .borrow_mut()
            .insert(page.id.clone(), update.body.to_owned());

        // Like the REST API, update responses carry no expanded labels.
        let mut response = stored.clone();
        response.metadata = None;
        Ok(response)
    }

    fn get_attachment(&self, page: &Page, filename: &str) -> Result<Option<Attachment>, ConfluenceError> {
        Ok(self
            .attachments
            .borrow()
            .iter()
            .find(|(page_id, a)| *page_id == page.id && a.title == filename)
            .map(|(_, a)| a.clone()))
    }

    fn create_attachment(
        &self,
        page: &Page,
        upload: &AttachmentUpload<'_>,
    ) -> Result<Attachment, ConfluenceError> {
        std::fs::metadata(upload.path)?;
        self.calls.borrow_mut().push(Call::CreateAttachment {
            page_id: page.id.clone(),
            filename: upload.filename.to_owned(),
            comment: upload.comment.to_owned(),
        });
        let attachment = Attachment {
            id: self.allocate_id(),
            title: upload.filename.to_owned(),
            version: Some(Version {
                number: 1,
                message: Some(upload.comment.to_owned()),
            }),
        };
        self.attachments
            .borrow_mut()
            .push((page.id.clone(), attachment.clone()));
        Ok(attachment)
    }

    fn update_attachment(
        &self,
        _page: &Page,
        existing: &Attachment,
        upload: &AttachmentUpload<'_>,
    ) -> Result<Attachment, ConfluenceError> {
        self.calls.borrow_mut().push(Call::UpdateAttachment {
            attachment_id: existing.id.clone(),
            comment: upload.comment.to_owned(),
        });
        let mut attachment = existing.clone();
        attachment.version = Some(Version {
            number: existing.version.as_ref().map_or(1, |v| v.number + 1),
            message: Some(upload.comment.to_owned()),
        });
        Ok(attachment)
    }

    fn add_labels(&self, page: &Page, labels: &[String]) -> Result<(), ConfluenceError> {
        self.calls.borrow_mut().push(Call::AddLabels {
            page_id: page.id.clone(),
            labels: labels.to_vec(),
        });
        Ok(())
    }

    fn get_space(&self, key: &str, _expand: &[&str]) -> Result<Space, ConfluenceError> {
        self.space_lookups.set(self.space_lookups.get() + 1);
        Ok(Space {
            key: key.to_owned(),
            homepage: self.homepage.as_ref().map(|id| ContentRef { id: id.clone() }),
        })
    }

    fn page_url(&self, page: &Page) -> String {
        page.web_url().unwrap_or_default()
    }
}
