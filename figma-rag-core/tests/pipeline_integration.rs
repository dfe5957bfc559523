use figma_rag_core::context::RunContext;
use figma_rag_core::contract::{MockDesignSource, MockProgressReporter};
use figma_rag_core::convert::DocumentRecord;
use figma_rag_core::error::Error;
use figma_rag_core::node::DesignFile;
use figma_rag_core::pipeline::{fetch_elements, process_file, read_jsonl, write_jsonl};
use mockall::Sequence;
use serde_json::{json, Value};
use tempfile::tempdir;

fn source_returning(file: Value) -> MockDesignSource {
    let mut source = MockDesignSource::new();
    source.expect_fetch_file().times(1).returning(move |_| {
        Ok(serde_json::from_value::<DesignFile>(file.clone()).expect("valid file json"))
    });
    source
}

fn sample_file() -> Value {
    json!({
        "name": "Design System",
        "document": {
            "type": "DOCUMENT",
            "name": "Document",
            "children": [{
                "type": "CANVAS",
                "name": "Components",
                "children": [{
                    "type": "FRAME",
                    "name": "Button",
                    "layoutMode": "HORIZONTAL",
                    "children": [
                        {"type": "TEXT", "name": "Label", "characters": "Submit", "style": {"fontSize": 14}}
                    ]
                }]
            }]
        }
    })
}

#[tokio::test]
async fn process_file_writes_one_line_per_document() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("components.jsonl");
    let source = source_returning(sample_file());
    let ctx = RunContext::silent("convert");

    let documents = process_file(&ctx, &source, "file-key", &output)
        .await
        .expect("pipeline should succeed");

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].doc_type(), Some("frame"));
    assert_eq!(documents[1].doc_type(), Some("text"));
    assert_eq!(
        documents[1].metadata.get("path"),
        Some(&json!("Document/Components/Button"))
    );

    let persisted: Vec<DocumentRecord> = read_jsonl(&output).unwrap();
    assert_eq!(persisted, documents);
}

#[tokio::test]
async fn empty_document_produces_empty_valid_file() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("empty.jsonl");
    let source = source_returning(json!({
        "name": "Blank",
        "document": {"type": "DOCUMENT", "name": "Document", "children": []}
    }));
    let ctx = RunContext::silent("convert");

    let documents = process_file(&ctx, &source, "blank", &output).await.unwrap();

    assert!(documents.is_empty());
    assert!(output.exists());
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}

#[tokio::test]
async fn missing_document_root_is_an_api_error() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("never.jsonl");
    let source = source_returning(json!({"name": "No Root"}));
    let ctx = RunContext::silent("convert");

    let err = process_file(&ctx, &source, "broken", &output).await.unwrap_err();

    assert!(matches!(err, Error::InvalidResponse(_)));
    assert!(!output.exists());
}

#[tokio::test]
async fn remote_errors_propagate_without_writing() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("never.jsonl");
    let mut source = MockDesignSource::new();
    source
        .expect_fetch_file()
        .times(1)
        .returning(|_| Err(Error::remote(403, Some("{\"err\":\"forbidden\"}".into()))));
    let ctx = RunContext::silent("convert");

    let err = process_file(&ctx, &source, "secret", &output).await.unwrap_err();

    match err {
        Error::Remote { status, message, .. } => {
            assert_eq!(status, 403);
            assert!(message.contains("Access forbidden"));
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn repeated_runs_produce_byte_identical_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("stable.jsonl");
    let ctx = RunContext::silent("convert");

    process_file(&ctx, &source_returning(sample_file()), "k", &output)
        .await
        .unwrap();
    let first = std::fs::read(&output).unwrap();

    process_file(&ctx, &source_returning(sample_file()), "k", &output)
        .await
        .unwrap();
    let second = std::fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn existing_output_is_overwritten() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.jsonl");
    std::fs::write(&output, "stale line 1\nstale line 2\nstale line 3\n").unwrap();
    let ctx = RunContext::silent("convert");

    process_file(&ctx, &source_returning(sample_file()), "k", &output)
        .await
        .unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(!text.contains("stale"));
    assert_eq!(text.lines().count(), 2);
}

#[tokio::test]
async fn fetch_elements_reports_file_summary() {
    let source = source_returning(sample_file());
    let ctx = RunContext::silent("inspect");

    let (summary, elements) = fetch_elements(&ctx, &source, "abc").await.unwrap();

    assert_eq!(summary.file_key, "abc");
    assert_eq!(summary.name, "Design System");
    assert_eq!(summary.root_type, "DOCUMENT");
    assert_eq!(elements.len(), 2);
}

#[tokio::test]
async fn stages_are_reported_in_pipeline_order() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.jsonl");
    let mut seq = Sequence::new();
    let mut progress = MockProgressReporter::new();
    for expected in [
        "Fetching file content",
        "Extracting elements",
        "Converting 2 elements",
        "Saving results",
    ] {
        progress
            .expect_stage()
            .withf(move |name| name == expected)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        if expected.starts_with("Converting") {
            progress.expect_advance().times(2).in_sequence(&mut seq).return_const(());
        }
    }
    let ctx = RunContext::new("convert", Box::new(progress));

    process_file(&ctx, &source_returning(sample_file()), "k", &output)
        .await
        .unwrap();
}

#[tokio::test]
async fn unwritable_output_is_a_fatal_file_error() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "plain file").unwrap();
    let output = blocker.join("out.jsonl");
    let ctx = RunContext::silent("convert");

    let result = process_file(&ctx, &source_returning(sample_file()), "k", &output).await;

    match result {
        Err(Error::FileOperation { path, .. }) => assert!(path.starts_with(&blocker)),
        other => panic!("expected a file operation error, got {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "plain file");
}

#[cfg(unix)]
#[test]
fn rewriting_output_keeps_its_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let output = dir.path().join("out.jsonl");
    std::fs::write(&output, "old\n").unwrap();
    std::fs::set_permissions(&output, std::fs::Permissions::from_mode(0o640)).unwrap();

    write_jsonl(&[json!({"a": 1})], &output).unwrap();

    let mode = std::fs::metadata(&output).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "{\"a\":1}\n");
}

#[cfg(unix)]
#[test]
fn new_output_is_not_private_to_the_owner() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let output = dir.path().join("fresh.jsonl");
    let reference = dir.path().join("reference");
    std::fs::File::create(&reference).unwrap();

    write_jsonl::<serde_json::Value>(&[], &output).unwrap();

    let mode = |p: &std::path::Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&output), mode(&reference));
}
