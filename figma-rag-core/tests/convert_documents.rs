use figma_rag_core::context::RunContext;
use figma_rag_core::convert::{convert, DocumentRecord};
use figma_rag_core::error::Error;
use figma_rag_core::extract::{extract, ElementKind, RawElement};
use figma_rag_core::node::Node;
use figma_rag_core::pipeline::{convert_all, read_jsonl, write_jsonl};
use serde_json::{json, Map};
use tempfile::tempdir;

fn text_element(content: &str, path: &str) -> RawElement {
    let style = json!({"fontSize": 12}).as_object().unwrap().clone();
    let mut extra = Map::new();
    extra.insert("id".into(), json!("9:9"));
    extra.insert("style".into(), json!(style.clone()));
    RawElement {
        kind: ElementKind::Text,
        content: content.to_string(),
        style,
        path: path.to_string(),
        name: "Caption".to_string(),
        id: "9:9".to_string(),
        description: None,
        extra,
    }
}

fn frame_element(name: &str, description: Option<&str>) -> RawElement {
    RawElement {
        kind: ElementKind::Frame,
        content: format!("Frame: {name}"),
        style: Map::new(),
        path: "Page".to_string(),
        name: name.to_string(),
        id: "1:1".to_string(),
        description: description.map(str::to_string),
        extra: Map::new(),
    }
}

#[test]
fn text_document_embeds_content_location_and_pretty_style() {
    let doc = convert(&text_element("Hello", "Page/Card")).unwrap();

    assert!(doc.content.starts_with("Text Content: Hello\nLocation: Page/Card\nStyle: {"));
    assert!(doc.content.contains("\"fontSize\": 12"));
    assert_eq!(doc.metadata.get("type"), Some(&json!("text")));
    assert_eq!(doc.metadata.get("path"), Some(&json!("Page/Card")));
    assert_eq!(doc.metadata.get("name"), Some(&json!("Caption")));
    assert_eq!(doc.metadata.get("id"), Some(&json!("9:9")));
}

#[test]
fn frame_document_defaults_description() {
    let doc = convert(&frame_element("Hero", None)).unwrap();
    assert_eq!(doc.content, "Frame: Hero\nDescription: No description\nPath: Page");

    let doc = convert(&frame_element("Hero", Some(""))).unwrap();
    assert!(doc.content.contains("Description: No description"));

    let doc = convert(&frame_element("Hero", Some("Landing banner"))).unwrap();
    assert!(doc.content.contains("Description: Landing banner"));
    assert_eq!(doc.metadata.get("type"), Some(&json!("frame")));
}

#[test]
fn base_metadata_keys_win_over_extra() {
    let mut element = text_element("Hi", "Real/Path");
    element.extra.insert("type".into(), json!("spoofed"));
    element.extra.insert("path".into(), json!("Other/Path"));
    element.extra.insert("name".into(), json!("Spoof"));
    element.extra.insert("custom".into(), json!(true));

    let doc = convert(&element).unwrap();

    assert_eq!(doc.metadata.get("type"), Some(&json!("text")));
    assert_eq!(doc.metadata.get("path"), Some(&json!("Real/Path")));
    assert_eq!(doc.metadata.get("name"), Some(&json!("Caption")));
    assert_eq!(doc.metadata.get("custom"), Some(&json!(true)));
}

#[test]
fn unnamed_frame_fails_conversion() {
    let err = convert(&frame_element("", None)).unwrap_err();
    assert!(matches!(err, Error::Conversion(_)));
}

#[test]
fn convert_all_drops_failing_elements_and_keeps_order() {
    let ctx = RunContext::silent("test");
    let elements = vec![
        text_element("first", "A"),
        frame_element("", None),
        text_element("third", "C"),
    ];

    let documents = convert_all(&ctx, &elements);

    assert_eq!(documents.len(), 2);
    assert!(documents[0].content.contains("first"));
    assert!(documents[1].content.contains("third"));
}

#[test]
fn unknown_element_kind_is_rejected_when_reading() {
    let raw = r#"{"type":"component","content":"x","path":"","name":"n"}"#;
    assert!(serde_json::from_str::<RawElement>(raw).is_err());
}

#[test]
fn serialized_documents_round_trip_through_jsonl() {
    let tree: Node = serde_json::from_value(json!({
        "type": "FRAME",
        "name": "Page1",
        "children": [
            {"type": "TEXT", "name": "T1", "characters": "Hello", "style": {"fontWeight": 700}},
            {"type": "TEXT", "name": "T2", "characters": "Ünïcödé ✓"}
        ]
    }))
    .unwrap();
    let ctx = RunContext::silent("test");
    let documents = convert_all(&ctx, &extract(&tree, ""));

    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/out.jsonl");
    write_jsonl(&documents, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), documents.len());
    assert!(text.ends_with('\n'));

    let back: Vec<DocumentRecord> = read_jsonl(&path).unwrap();
    assert_eq!(back, documents);
    assert!(back.iter().all(|d| !d.content.is_empty()));
}
