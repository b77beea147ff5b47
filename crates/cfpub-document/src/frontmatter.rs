//! YAML frontmatter extraction.
//!
//! A document may start with a metadata block:
//!
//! ```text
//! ---
//! title: Release notes
//! labels:
//!   - changelog
//! ---
//! # Body starts here
//! ```
//!
//! Anything that is not exactly this shape (no opening `---` on the first
//! line, no closing `---`, an empty block, invalid YAML, or YAML that is not
//! a mapping) is treated as "no frontmatter" and the lines are left alone.

use serde_yaml::{Mapping, Value};

use crate::error::DocumentError;

const DELIMITER: &str = "---";

/// Metadata recognized in frontmatter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frontmatter {
    /// Title overriding the heading-derived title.
    pub title: Option<String>,
    /// Page labels.
    pub labels: Option<Vec<String>>,
    /// Index of the first body line (0 without frontmatter).
    pub end_line: usize,
}

impl Frontmatter {
    /// Extract frontmatter from the lines of a document.
    ///
    /// Lines may or may not keep their line terminators.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidLabels`] if `labels` is present but is
    /// not a list of scalar values.
    pub fn extract(lines: &[&str]) -> Result<Self, DocumentError> {
        let Some((mapping, end_line)) = parse_block(lines) else {
            return Ok(Self::default());
        };

        let title = mapping.get("title").and_then(scalar_to_string);
        let labels = match mapping.get("labels") {
            None => None,
            Some(Value::Sequence(items)) => Some(
                items
                    .iter()
                    .map(|item| {
                        scalar_to_string(item).ok_or(DocumentError::InvalidLabels { path: None })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err(DocumentError::InvalidLabels { path: None }),
        };

        Ok(Self {
            title,
            labels,
            end_line,
        })
    }
}

/// Locate and parse the leading YAML block.
///
/// Returns the mapping and the index of the line after the closing
/// delimiter.
pub fn parse_block(lines: &[&str]) -> Option<(Mapping, usize)> {
    if !is_delimiter(lines.first()?) {
        return None;
    }

    let closing = lines.iter().skip(1).position(|line| is_delimiter(line))? + 1;
    let yaml: String = lines[1..closing].concat();
    if yaml.trim().is_empty() {
        return None;
    }

    // Lines without terminators need to be joined back up.
    let yaml = if lines[1].ends_with('\n') {
        yaml
    } else {
        lines[1..closing].join("\n")
    };

    match serde_yaml::from_str::<Value>(&yaml) {
        Ok(Value::Mapping(mapping)) => Some((mapping, closing + 1)),
        _ => None,
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == DELIMITER
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
