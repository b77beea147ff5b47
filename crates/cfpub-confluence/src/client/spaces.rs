//! Space operations for Confluence API.

use tracing::info;

use super::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::Space;

impl ConfluenceClient {
    /// Get a space with optional field expansion.
    pub(crate) fn get_space(&self, key: &str, expand: &[&str]) -> Result<Space, ConfluenceError> {
        let url = format!("{}/space/{}", self.api_url(), key);
        let expand = expand.join(",");

        info!("Getting space {}", key);

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
}
