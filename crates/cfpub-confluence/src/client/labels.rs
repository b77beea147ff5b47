//! Label operations for Confluence API.

use tracing::info;

use super::ConfluenceClient;
use super::pages::label_objects;
use crate::error::ConfluenceError;
use crate::types::Page;

impl ConfluenceClient {
    /// Add labels to a page. Existing labels are kept.
    pub(crate) fn add_labels(&self, page: &Page, labels: &[String]) -> Result<(), ConfluenceError> {
        let url = format!("{}/content/{}/label", self.api_url(), page.id);
        let payload_bytes = serde_json::to_vec(&label_objects(labels))?;

        info!("Adding labels {:?} to page {}", labels, page.id);

        self.execute(|| {
            self.agent
                .post(&url)
                .header("Authorization", &self.auth_header)
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .send(&payload_bytes[..])
        })?;

        Ok(())
    }
}
