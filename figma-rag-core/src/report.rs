//! Summaries over extracted elements and persisted document files.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use crate::convert::{DocumentRecord, BASE_METADATA_KEYS};
use crate::error::{Error, Result};
use crate::extract::RawElement;

/// Number of elements per kind, ordered by kind name.
pub fn element_counts(elements: &[RawElement]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for element in elements {
        *counts.entry(element.kind.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Number of documents per `metadata.type` (`unknown` when missing).
pub fn document_type_counts(documents: &[DocumentRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for doc in documents {
        let doc_type = doc.doc_type().unwrap_or("unknown").to_string();
        *counts.entry(doc_type).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineIssue {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub valid: usize,
    pub issues: Vec<LineIssue>,
    /// The raw lines of every valid record, for callers that want to look for duplicates.
    pub lines: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Checks a single record: non-empty content and the base metadata keys as strings.
pub fn check_record(record: &DocumentRecord) -> std::result::Result<(), String> {
    if record.content.trim().is_empty() {
        return Err("content is empty".to_string());
    }
    for key in BASE_METADATA_KEYS {
        match record.metadata.get(key) {
            Some(Value::String(_)) => {}
            Some(other) => return Err(format!("metadata.{key} must be a string, got {other}")),
            None => return Err(format!("metadata.{key} is missing")),
        }
    }
    Ok(())
}

/// Validates every line of a JSONL document file without stopping at the first problem.
pub fn validate_jsonl(path: &Path) -> Result<ValidationReport> {
    let file = File::open(path).map_err(|e| Error::file_operation(path, "open", e))?;
    let mut report = ValidationReport::default();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| Error::file_operation(path, "read", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let checked = serde_json::from_str::<DocumentRecord>(&line)
            .map_err(|e| format!("not a document record: {e}"))
            .and_then(|record| check_record(&record));
        match checked {
            Ok(()) => {
                report.valid += 1;
                report.lines.push(line);
            }
            Err(message) => report.issues.push(LineIssue {
                line: index + 1,
                message,
            }),
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub average_content_chars: f64,
    pub max_content_chars: usize,
}

pub fn document_stats(documents: &[DocumentRecord]) -> DocumentStats {
    let lengths: Vec<usize> = documents.iter().map(|d| d.content.chars().count()).collect();
    let total_chars: usize = lengths.iter().sum();
    DocumentStats {
        total: documents.len(),
        by_type: document_type_counts(documents),
        average_content_chars: if documents.is_empty() {
            0.0
        } else {
            total_chars as f64 / documents.len() as f64
        },
        max_content_chars: lengths.into_iter().max().unwrap_or(0),
    }
}
