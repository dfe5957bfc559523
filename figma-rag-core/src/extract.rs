//! Tree extraction: flattens a node tree into an ordered list of [`RawElement`]s.
//!
//! Text nodes and named containers (frame, group, section) become elements.
//! Every other node is transparent: it emits nothing but its children are
//! still visited. Output is pre-order, so a container precedes its contents.

use crate::node::{Node, NodeKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

/// The element kinds the extractor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Frame,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Frame => "frame",
        }
    }
}

/// A flattened, typed record for one relevant node.
///
/// `path` is the slash-joined names of the node's ancestors and does not
/// include the node's own name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub content: String,
    #[serde(default)]
    pub style: Map<String, Value>,
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Kind-specific metadata carried into the converted document.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

/// Extracts every text and named container element below `node`.
pub fn extract(node: &Node, path: &str) -> Vec<RawElement> {
    let mut elements = Vec::new();
    visit(node, path, &mut elements);
    debug!(count = elements.len(), root = %node.name, "Extracted elements from node tree");
    elements
}

fn visit(node: &Node, path: &str, results: &mut Vec<RawElement>) {
    match node.kind() {
        NodeKind::Text => results.push(text_element(node, path)),
        NodeKind::Container(_) if !node.name.is_empty() => {
            results.push(frame_element(node, path))
        }
        _ => {}
    }

    if node.children.is_empty() {
        return;
    }
    let child_path = node.child_path(path);
    for child in &node.children {
        visit(child, &child_path, results);
    }
}

fn text_element(node: &Node, path: &str) -> RawElement {
    let style = node.style.clone().unwrap_or_default();
    let constraints = node.constraints.clone().unwrap_or_else(|| json!({}));

    let mut extra = Map::new();
    extra.insert("id".into(), Value::String(node.id.clone()));
    extra.insert("path".into(), Value::String(path.to_string()));
    extra.insert("style".into(), Value::Object(style.clone()));
    extra.insert("constraints".into(), constraints);

    RawElement {
        kind: ElementKind::Text,
        content: node.characters.clone().unwrap_or_default(),
        style,
        path: path.to_string(),
        name: node.name.clone(),
        id: node.id.clone(),
        description: None,
        extra,
    }
}

fn frame_element(node: &Node, path: &str) -> RawElement {
    let mut extra = Map::new();
    extra.insert("id".into(), Value::String(node.id.clone()));
    extra.insert("path".into(), Value::String(path.to_string()));
    extra.insert(
        "background".into(),
        node.background.clone().unwrap_or_else(|| json!([])),
    );
    extra.insert(
        "layoutMode".into(),
        Value::String(node.layout_mode.clone().unwrap_or_default()),
    );
    extra.insert(
        "counterAxisSizingMode".into(),
        Value::String(node.counter_axis_sizing_mode.clone().unwrap_or_default()),
    );

    RawElement {
        kind: ElementKind::Frame,
        content: format!("Frame: {}", node.name),
        style: Map::new(),
        path: path.to_string(),
        name: node.name.clone(),
        id: node.id.clone(),
        description: node.description.clone(),
        extra,
    }
}
