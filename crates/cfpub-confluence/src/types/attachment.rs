//! Confluence attachment types.

use serde::Deserialize;

use super::Version;

/// Confluence attachment.
///
/// Only includes fields that are actually used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    /// Attachment ID.
    pub id: String,
    /// Attachment title/filename.
    pub title: String,
    /// Latest version, when expanded.
    #[serde(default)]
    pub version: Option<Version>,
}

impl Attachment {
    /// Message of the latest version.
    pub fn version_message(&self) -> Option<&str> {
        self.version.as_ref()?.message.as_deref()
    }
}
