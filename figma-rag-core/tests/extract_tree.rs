use figma_rag_core::extract::{extract, ElementKind};
use figma_rag_core::node::{DesignFile, Node};
use serde_json::json;

fn node(value: serde_json::Value) -> Node {
    serde_json::from_value(value).expect("valid node json")
}

#[test]
fn frame_with_text_child_yields_frame_then_text() {
    let tree = node(json!({
        "type": "FRAME",
        "name": "Page1",
        "children": [{"type": "TEXT", "characters": "Hello", "name": "T1"}]
    }));

    let elements = extract(&tree, "");

    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].kind, ElementKind::Frame);
    assert_eq!(elements[0].path, "");
    assert_eq!(elements[0].name, "Page1");
    assert_eq!(elements[0].content, "Frame: Page1");

    assert_eq!(elements[1].kind, ElementKind::Text);
    assert_eq!(elements[1].path, "Page1");
    assert_eq!(elements[1].content, "Hello");
    assert_eq!(elements[1].name, "T1");
}

#[test]
fn elements_come_out_in_pre_order_with_ancestor_paths() {
    let tree = node(json!({
        "type": "DOCUMENT",
        "name": "Document",
        "children": [{
            "type": "CANVAS",
            "name": "Page 1",
            "children": [
                {
                    "type": "FRAME",
                    "name": "Header",
                    "children": [
                        {"type": "TEXT", "name": "Title", "characters": "Welcome"},
                        {
                            "type": "GROUP",
                            "name": "Nav",
                            "children": [{"type": "TEXT", "name": "Link", "characters": "Home"}]
                        }
                    ]
                },
                {"type": "TEXT", "name": "Footer", "characters": "(c) 2024"}
            ]
        }]
    }));

    let elements = extract(&tree, "");
    let seen: Vec<(&str, &str)> = elements
        .iter()
        .map(|e| (e.name.as_str(), e.path.as_str()))
        .collect();

    assert_eq!(
        seen,
        vec![
            ("Header", "Document/Page 1"),
            ("Title", "Document/Page 1/Header"),
            ("Nav", "Document/Page 1/Header"),
            ("Link", "Document/Page 1/Header/Nav"),
            ("Footer", "Document/Page 1"),
        ]
    );
}

#[test]
fn unnamed_containers_and_other_nodes_emit_nothing_but_are_traversed() {
    let tree = node(json!({
        "type": "FRAME",
        "name": "",
        "children": [{
            "type": "RECTANGLE",
            "name": "Shape",
            "children": [{"type": "TEXT", "name": "Label", "characters": "Inside"}]
        }]
    }));

    let elements = extract(&tree, "Root");

    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].name, "Label");
    assert_eq!(elements[0].path, "Root//Shape");
}

#[test]
fn text_element_carries_style_and_constraints() {
    let tree = node(json!({
        "type": "TEXT",
        "id": "1:2",
        "name": "Heading",
        "characters": "Big",
        "style": {"fontFamily": "Inter", "fontSize": 32},
        "constraints": {"vertical": "TOP", "horizontal": "LEFT"}
    }));

    let elements = extract(&tree, "Page");
    let text = &elements[0];

    assert_eq!(text.id, "1:2");
    assert_eq!(text.style.get("fontFamily"), Some(&json!("Inter")));
    assert_eq!(text.extra.get("id"), Some(&json!("1:2")));
    assert_eq!(text.extra.get("path"), Some(&json!("Page")));
    assert_eq!(text.extra.get("constraints"), Some(&json!({"vertical": "TOP", "horizontal": "LEFT"})));
}

#[test]
fn frame_element_carries_layout_fields_with_defaults() {
    let with_layout = node(json!({
        "type": "SECTION",
        "id": "3:4",
        "name": "Cards",
        "description": "Card gallery",
        "layoutMode": "HORIZONTAL",
        "background": [{"type": "SOLID"}]
    }));
    let bare = node(json!({"type": "GROUP", "name": "Bare"}));

    let frame = &extract(&with_layout, "")[0];
    assert_eq!(frame.description.as_deref(), Some("Card gallery"));
    assert_eq!(frame.extra.get("layoutMode"), Some(&json!("HORIZONTAL")));
    assert_eq!(frame.extra.get("counterAxisSizingMode"), Some(&json!("")));
    assert_eq!(frame.extra.get("background"), Some(&json!([{"type": "SOLID"}])));

    let bare = &extract(&bare, "")[0];
    assert_eq!(bare.description, None);
    assert_eq!(bare.extra.get("background"), Some(&json!([])));
    assert_eq!(bare.extra.get("layoutMode"), Some(&json!("")));
}

#[test]
fn text_without_characters_has_empty_content() {
    let tree = node(json!({"type": "TEXT", "name": "Empty"}));
    let elements = extract(&tree, "");
    assert_eq!(elements[0].content, "");
}

#[test]
fn deep_tree_from_raw_response_is_fully_extracted() {
    let depth = 70;
    let mut body = String::from(r#"{"name":"Deep","document":"#);
    for level in 0..depth {
        body.push_str(&format!(r#"{{"type":"FRAME","name":"F{level}","children":["#));
    }
    body.push_str(r#"{"type":"TEXT","name":"Leaf","characters":"bottom"}"#);
    body.push_str(&"]}".repeat(depth));
    body.push('}');

    let file = DesignFile::from_slice(body.as_bytes()).expect("deep response parses");
    let elements = extract(&file.document.expect("document"), "");

    assert_eq!(elements.len(), depth + 1);
    let leaf = elements.last().unwrap();
    assert_eq!(leaf.kind, ElementKind::Text);
    assert_eq!(leaf.content, "bottom");
    assert_eq!(leaf.path.split('/').count(), depth);
    assert!(leaf.path.ends_with("F68/F69"));
}

#[test]
fn null_name_on_unconsumed_node_does_not_abort_extraction() {
    let tree = node(json!({
        "type": "FRAME",
        "name": "Page1",
        "children": [
            {"type": "RECTANGLE", "name": null},
            {"type": "TEXT", "name": "T1", "characters": "Hi"}
        ]
    }));

    let elements = extract(&tree, "");

    assert_eq!(elements.len(), 2);
    assert_eq!(elements[1].name, "T1");
    assert_eq!(elements[1].path, "Page1");
}
