//! Builder for namespaced storage-format elements.
//!
//! Confluence macros and resource references are plain XML elements under
//! the `ac:` and `ri:` prefixes. [`ConfluenceTag`] builds such an element tree
//! and serializes it deterministically:
//!
//! ```
//! use cfpub_renderer::ConfluenceTag;
//!
//! let tag = ConfluenceTag::new("parameter")
//!     .attr("name", "language")
//!     .text("rust");
//! assert_eq!(
//!     tag.render(),
//!     "<ac:parameter ac:name=\"language\">rust</ac:parameter>\n"
//! );
//! ```

use std::collections::BTreeMap;

use crate::util::{escape_attr, escape_text};

/// Namespace of macro and structural elements.
pub const AC_NAMESPACE: &str = "ac";

/// Namespace of resource identifiers (attachments, URLs, pages).
pub const RI_NAMESPACE: &str = "ri";

/// A single storage-format element with namespaced attributes.
///
/// Attributes are kept sorted by name so rendering is stable. Children are
/// rendered before the element's own text, and every element (nested ones
/// included) is followed by a newline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfluenceTag {
    name: String,
    namespace: &'static str,
    attributes: BTreeMap<String, String>,
    children: Vec<ConfluenceTag>,
    text: String,
    cdata: bool,
}

impl ConfluenceTag {
    /// Create an element in the `ac:` namespace.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: AC_NAMESPACE,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: String::new(),
            cdata: false,
        }
    }

    /// Create an element in the `ri:` namespace.
    #[must_use]
    pub fn resource(name: impl Into<String>) -> Self {
        Self::new(name).namespace(RI_NAMESPACE)
    }

    /// Move the element (and its attributes) into another namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: &'static str) -> Self {
        self.namespace = namespace;
        self
    }

    /// Set an attribute. The namespace prefix is added on render.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set escaped text content.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self.cdata = false;
        self
    }

    /// Set text content wrapped in a CDATA section.
    #[must_use]
    pub fn cdata(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self.cdata = true;
        self
    }

    /// Append a child element in place.
    pub fn push(&mut self, child: ConfluenceTag) {
        self.children.push(child);
    }

    /// Serialize the element tree.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        let qualified = format!("{}:{}", self.namespace, self.name);

        out.push('<');
        out.push_str(&qualified);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(self.namespace);
            out.push(':');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        out.push('>');

        for child in &self.children {
            child.render_into(out);
        }

        if self.cdata {
            push_cdata(&self.text, out);
        } else {
            out.push_str(&escape_text(&self.text));
        }

        out.push_str("</");
        out.push_str(&qualified);
        out.push_str(">\n");
    }
}

/// Write `text` as CDATA, splitting around any embedded `]]>`.
fn push_cdata(text: &str, out: &mut String) {
    out.push_str("<![CDATA[");
    out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]>");
}
