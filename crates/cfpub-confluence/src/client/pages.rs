//! Page operations for Confluence API.

use serde_json::{Value, json};
use tracing::info;
use ureq::http::Method;

use super::ConfluenceClient;
use crate::api::{NewPage, PageLookup, PageUpdate};
use crate::error::ConfluenceError;
use crate::types::{Page, ResultList};

impl ConfluenceClient {
    /// Find a page by id or by title within a space.
    ///
    /// A title search returns abbreviated results, so the first match is
    /// fetched again by id with the requested expansions.
    pub(crate) fn find_page(
        &self,
        lookup: PageLookup<'_>,
        expand: &[&str],
    ) -> Result<Option<Page>, ConfluenceError> {
        match lookup {
            PageLookup::Id(page_id) => self.get_page_by_id(page_id, expand).map(Some),
            PageLookup::Title {
                title,
                space,
                content_type,
            } => {
                let url = format!("{}/content", self.api_url());
                info!("Looking up {content_type} '{title}' in space {space}");

                let mut body = self.execute(|| {
                    self.agent
                        .get(&url)
                        .query("title", title)
                        .query("type", content_type.as_str())
                        .query("spaceKey", space)
                        .header("Authorization", &self.auth_header)
                        .header("Accept", "application/json")
                        .call()
                })?;
                let found: ResultList<Page> = body.read_json()?;

                match found.results.first() {
                    Some(first) => self.get_page_by_id(&first.id, expand).map(Some),
                    None => Ok(None),
                }
            }
        }
    }

    /// Get page by ID with optional field expansion.
    fn get_page_by_id(&self, page_id: &str, expand: &[&str]) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), page_id);
        let expand = expand.join(",");

        info!("Getting page {}", page_id);

        let mut body = self.execute(|| {
            let mut request = self.agent.get(&url);
            if !expand.is_empty() {
                request = request.query("expand", &expand);
            }
            request
                .header("Authorization", &self.auth_header)
                .header("Accept", "application/json")
                .call()
        })?;

        Ok(body.read_json()?)
    }

    /// Create a page.
    pub(crate) fn create_page(&self, page: &NewPage<'_>) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content", self.api_url());

        let mut payload = json!({
            "title": page.title,
            "type": page.content_type.as_str(),
            "space": {"key": page.space},
            "body": {
                "storage": {
                    "value": page.body,
                    "representation": "storage"
                }
            }
        });
        if let Some(parent_id) = page.parent_id {
            payload["ancestors"] = json!([{"id": content_id(parent_id)}]);
        }
        if let Some(message) = page.message {
            payload["version"] = json!({"message": message});
        }
        if let Some(labels) = page.labels {
            payload["metadata"] = json!({"labels": label_objects(labels)});
        }

        info!("Creating {} '{}' in space {}", page.content_type, page.title, page.space);

        let created = self.send_json(&Method::POST, &url, &payload)?;
        info!("Created page {}", created.id);
        Ok(created)
    }

    /// Update existing page (auto-increments version).
    pub(crate) fn update_page(
        &self,
        page: &Page,
        update: &PageUpdate<'_>,
    ) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), page.id);
        let version = page.version.number;

        let mut payload = json!({
            "version": {
                "number": version + 1,
                "minorEdit": update.minor_edit
            },
            "title": page.title,
            "type": update.content_type.as_str(),
            "body": {
                "storage": {
                    "value": update.body,
                    "representation": "storage"
                }
            }
        });
        if let Some(parent_id) = update.parent_id {
            payload["ancestors"] = json!([{"id": content_id(parent_id)}]);
        }
        if let Some(message) = update.message {
            payload["version"]["message"] = json!(message);
        }
        if let Some(labels) = update.labels {
            payload["metadata"] = json!({"labels": label_objects(labels)});
        }

        info!(
            "Updating page {} from version {} to {}",
            page.id,
            version,
            version + 1
        );

        let updated = self.send_json(&Method::PUT, &url, &payload)?;
        info!(
            "Updated page {} to version {}",
            updated.id, updated.version.number
        );
        Ok(updated)
    }

    fn send_json(&self, method: &Method, url: &str, payload: &Value) -> Result<Page, ConfluenceError> {
        let payload_bytes = serde_json::to_vec(payload)?;

        let mut body = self.execute(|| {
            let request = if *method == Method::PUT {
                self.agent.put(url)
            } else {
                self.agent.post(url)
            };
            request
                .header("Authorization", &self.auth_header)
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .send(&payload_bytes[..])
        })?;

        Ok(body.read_json()?)
    }

    /// Web URL of a page.
    ///
    /// Falls back to the `viewpage.action` URL when the response carries no
    /// web UI link.
    pub(crate) fn get_page_url(&self, page: &Page) -> String {
        page.web_url().unwrap_or_else(|| {
            format!(
                "{}/pages/viewpage.action?pageId={}",
                self.site_url, page.id
            )
        })
    }
}

/// Numeric ids are sent as numbers, anything else verbatim.
fn content_id(id: &str) -> Value {
    id.parse::<u64>().map_or_else(|_| json!(id), |n| json!(n))
}

/// Label list in the shape the REST API expects.
pub(super) fn label_objects(labels: &[String]) -> Value {
    labels
        .iter()
        .map(|name| json!({"prefix": "global", "name": name}))
        .collect()
}
