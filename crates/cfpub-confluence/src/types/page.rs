//! Confluence page types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Confluence content (page or blog post).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Page {
    /// Content ID.
    pub id: String,
    /// Content type ("page" or "blogpost").
    #[serde(rename = "type", default)]
    pub content_type: String,
    /// Page title.
    pub title: String,
    /// Version information.
    #[serde(default)]
    pub version: Version,
    /// Ancestor chain from the space root down to the direct parent.
    #[serde(default)]
    pub ancestors: Vec<Ancestor>,
    /// Expanded metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
    /// Hypermedia links.
    #[serde(rename = "_links", default)]
    pub links: Option<Links>,
}

impl Page {
    /// Id of the direct parent, if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.ancestors.last().map(|a| a.id.as_str())
    }

    /// Names of the labels on the page.
    pub fn label_names(&self) -> BTreeSet<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.labels.as_ref())
            .map(|labels| labels.results.iter().map(|l| l.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Web URL from `_links`, when both parts are present.
    pub fn web_url(&self) -> Option<String> {
        let links = self.links.as_ref()?;
        Some(format!("{}{}", links.base.as_deref()?, links.webui.as_deref()?))
    }
}

/// Content version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Version {
    /// Version number.
    pub number: u32,
    /// Version message/comment.
    #[serde(default)]
    pub message: Option<String>,
}

/// Entry of an ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Ancestor {
    /// Content ID.
    pub id: String,
}

/// Content metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Metadata {
    /// Labels, when expanded.
    #[serde(default)]
    pub labels: Option<LabelArray>,
}

/// Expanded label list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LabelArray {
    /// Labels.
    #[serde(default)]
    pub results: Vec<Label>,
}

/// Content label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Label {
    /// Label name.
    pub name: String,
    /// Label prefix ("global" for user labels).
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Hypermedia links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Links {
    /// Site base URL.
    #[serde(default)]
    pub base: Option<String>,
    /// Web UI link, relative to `base`.
    #[serde(default)]
    pub webui: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_expanded_page() {
        let json = r#"{
            "id": "123",
            "type": "page",
            "title": "Guide",
            "version": {"number": 4, "message": "sync [v1eebdf4fdc9fc7bf283031b93f9aef3338de9052]"},
            "ancestors": [{"id": "1", "type": "page"}, {"id": "7", "type": "page"}],
            "metadata": {"labels": {"results": [{"prefix": "global", "name": "b"}, {"prefix": "global", "name": "a"}], "size": 2}},
            "_links": {"base": "https://wiki.example.com", "webui": "/display/DOCS/Guide"}
        }"#;
        let page: Page = serde_json::from_str(json).unwrap();
        assert_eq!(page.parent_id(), Some("7"));
        assert_eq!(page.label_names().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(page.version.number, 4);
        assert_eq!(
            page.web_url().as_deref(),
            Some("https://wiki.example.com/display/DOCS/Guide")
        );
    }

    #[test]
    fn test_deserialize_minimal_page() {
        let page: Page = serde_json::from_str(r#"{"id": "5", "title": "T"}"#).unwrap();
        assert_eq!(page.parent_id(), None);
        assert!(page.label_names().is_empty());
        assert_eq!(page.web_url(), None);
    }
}
