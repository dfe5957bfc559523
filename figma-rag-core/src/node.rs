//! Typed view of the node tree returned by the design-tool API.
//!
//! Nodes are open JSON objects. Only the fields the extractor consumes are
//! typed; everything else is kept verbatim in [`Node::extra`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One entry of the remote document tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub node_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<Node>,

    /// Literal text of a text node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Value>,
    #[serde(rename = "layoutMode", default, skip_serializing_if = "Option::is_none")]
    pub layout_mode: Option<String>,
    #[serde(
        rename = "counterAxisSizingMode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub counter_axis_sizing_mode: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An explicit `null` reads the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Frame,
    Group,
    Section,
}

/// Classification of a node by its `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Text,
    Container(ContainerKind),
    Other(&'a str),
}

impl Node {
    /// Tags match case-insensitively, so `TEXT` and `Text` are both text nodes.
    pub fn kind(&self) -> NodeKind<'_> {
        let tag = self.node_type.as_str();
        if tag.eq_ignore_ascii_case("TEXT") {
            NodeKind::Text
        } else if tag.eq_ignore_ascii_case("FRAME") {
            NodeKind::Container(ContainerKind::Frame)
        } else if tag.eq_ignore_ascii_case("GROUP") {
            NodeKind::Container(ContainerKind::Group)
        } else if tag.eq_ignore_ascii_case("SECTION") {
            NodeKind::Container(ContainerKind::Section)
        } else {
            NodeKind::Other(tag)
        }
    }

    /// Path handed to this node's children.
    pub fn child_path(&self, path: &str) -> String {
        if path.is_empty() {
            self.name.clone()
        } else {
            format!("{path}/{}", self.name)
        }
    }
}

/// Body of a `GET /v1/files/{key}` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub document: Option<Node>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DesignFile {
    /// Parses a file response of any nesting depth.
    ///
    /// `serde_json` stops at 128 levels by default, which a design file
    /// reaches at about 64 nested nodes. The limit is lifted here and the
    /// stack grows on demand instead.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        let mut de = serde_json::Deserializer::from_slice(bytes);
        de.disable_recursion_limit();
        let file = DesignFile::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(file)
    }
}
