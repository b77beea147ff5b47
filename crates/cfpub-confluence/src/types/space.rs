//! Confluence space types.

use serde::Deserialize;

/// Confluence space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Space {
    /// Space key.
    pub key: String,
    /// Home page, when expanded.
    #[serde(default)]
    pub homepage: Option<ContentRef>,
}

/// Reference to a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentRef {
    /// Content ID.
    pub id: String,
}
