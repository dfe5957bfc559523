//! Converts extracted elements into retrieval documents.

use crate::error::{Error, Result};
use crate::extract::{ElementKind, RawElement};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Metadata keys every document carries. They always win over extraction
/// metadata with the same name.
pub const BASE_METADATA_KEYS: [&str; 3] = ["type", "path", "name"];

/// Retrieval-ready unit: rendered content plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl DocumentRecord {
    /// `metadata.type` as a string, if present.
    pub fn doc_type(&self) -> Option<&str> {
        self.metadata.get("type").and_then(Value::as_str)
    }
}

/// Renders one element. Fails without producing a partial record.
pub fn convert(element: &RawElement) -> Result<DocumentRecord> {
    let content = match element.kind {
        ElementKind::Text => {
            let style = serde_json::to_string_pretty(&element.style).map_err(|e| {
                Error::Conversion(format!("style of `{}` is not serialisable: {e}", element.name))
            })?;
            format!(
                "Text Content: {}\nLocation: {}\nStyle: {}",
                element.content, element.path, style
            )
        }
        ElementKind::Frame => {
            if element.name.is_empty() {
                return Err(Error::Conversion(format!(
                    "frame element at `{}` has no name",
                    element.path
                )));
            }
            let description = element
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or("No description");
            format!(
                "Frame: {}\nDescription: {}\nPath: {}",
                element.name, description, element.path
            )
        }
    };

    Ok(DocumentRecord {
        content,
        metadata: merge_metadata(element),
    })
}

fn merge_metadata(element: &RawElement) -> Map<String, Value> {
    let base = [
        ("type", Value::String(element.kind.as_str().to_string())),
        ("path", Value::String(element.path.clone())),
        ("name", Value::String(element.name.clone())),
    ];

    let mut metadata = element.extra.clone();
    for (key, value) in base {
        if let Some(previous) = metadata.insert(key.to_string(), value.clone()) {
            if previous != value {
                warn!(
                    key,
                    discarded = %previous,
                    element = %element.name,
                    "Extraction metadata collides with a base key; keeping the base value"
                );
            }
        }
    }
    metadata
}
