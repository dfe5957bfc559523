//! High-level pipeline: fetch → extract → convert → serialize for one design file.
//!
//! # Responsibilities
//! - One fetch per run through a [`DesignSource`]; fetch failures are fatal.
//! - Element-level conversion failures are logged and the element is dropped.
//! - Output is written as JSON Lines via a temporary file that is persisted
//!   over the target path, so an interrupted write never leaves a half file
//!   at the destination.
//!
//! # Navigation
//! - Main entrypoint: [`process_file`]
//! - Supporting functions: [`fetch_elements`], [`convert_all`], [`write_jsonl`], [`read_jsonl`]

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, Instrument};

use crate::context::RunContext;
use crate::contract::DesignSource;
use crate::convert::{convert, DocumentRecord};
use crate::error::{Error, Result};
use crate::extract::{extract, RawElement};

/// What was fetched, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub file_key: String,
    pub name: String,
    pub root_type: String,
}

/// Fetches the file and flattens its document tree.
pub async fn fetch_elements<S>(
    ctx: &RunContext,
    source: &S,
    file_key: &str,
) -> Result<(FileSummary, Vec<RawElement>)>
where
    S: DesignSource + ?Sized,
{
    ctx.stage("Fetching file content");
    let file = source
        .fetch_file(file_key)
        .instrument(ctx.span().clone())
        .await
        .map_err(|e| {
            ctx.span()
                .in_scope(|| error!(file_key, error = %e, "[PIPELINE][ERROR] Fetch failed"));
            e
        })?;

    let document = match file.document {
        Some(document) => document,
        None => {
            ctx.span()
                .in_scope(|| error!(file_key, "[PIPELINE][ERROR] Response has no document root"));
            return Err(Error::InvalidResponse(
                "Invalid file content received from Figma: missing `document`".to_string(),
            ));
        }
    };

    ctx.stage("Extracting elements");
    let elements = ctx.span().in_scope(|| {
        let elements = extract(&document, "");
        info!(file_key, count = elements.len(), "[PIPELINE] Extraction finished");
        elements
    });

    let summary = FileSummary {
        file_key: file_key.to_string(),
        name: file.name.unwrap_or_else(|| "Unnamed File".to_string()),
        root_type: if document.node_type.is_empty() {
            "Unknown".to_string()
        } else {
            document.node_type.clone()
        },
    };
    Ok((summary, elements))
}

/// Converts every element, skipping the ones that fail.
pub fn convert_all(ctx: &RunContext, elements: &[RawElement]) -> Vec<DocumentRecord> {
    ctx.stage(&format!("Converting {} elements", elements.len()));
    let _entered = ctx.span().enter();

    let mut documents = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        match convert(element) {
            Ok(doc) => {
                debug!(name = %element.name, path = %element.path, "Converted element");
                documents.push(doc);
            }
            Err(e) => {
                error!(
                    name = %element.name,
                    path = %element.path,
                    error = %e,
                    "Error processing element; skipping"
                );
            }
        }
        ctx.advance(index + 1, elements.len());
    }

    info!(
        converted = documents.len(),
        skipped = elements.len() - documents.len(),
        "[PIPELINE] Conversion finished"
    );
    documents
}

/// Runs the whole file pipeline and returns the converted documents.
pub async fn process_file<S>(
    ctx: &RunContext,
    source: &S,
    file_key: &str,
    output_path: &Path,
) -> Result<Vec<DocumentRecord>>
where
    S: DesignSource + ?Sized,
{
    ctx.span()
        .in_scope(|| info!(file_key, output = %output_path.display(), "[PIPELINE] Starting file pipeline"));

    let (_summary, elements) = fetch_elements(ctx, source, file_key).await?;
    let documents = convert_all(ctx, &elements);

    ctx.stage("Saving results");
    ctx.span().in_scope(|| write_jsonl(&documents, output_path))?;

    ctx.span().in_scope(|| {
        info!(
            file_key,
            documents = documents.len(),
            output = %output_path.display(),
            "[PIPELINE] File pipeline complete"
        )
    });
    Ok(documents)
}

/// Writes one compact JSON object per line, replacing any existing file.
pub fn write_jsonl<T: Serialize>(records: &[T], path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| {
        error!(error = ?e, path = %dir.display(), "Failed to create output directory");
        Error::file_operation(dir, "create directory", e)
    })?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(".figma-rag").suffix(".tmp");
    // the replaced file keeps its mode; a new one gets what `File::create` would give it
    let existing = fs::metadata(path).ok().map(|meta| meta.permissions());
    if existing.is_none() {
        if let Some(permissions) = new_file_permissions() {
            builder.permissions(permissions);
        }
    }
    let tmp = builder.tempfile_in(dir).map_err(|e| {
        error!(error = ?e, dir = %dir.display(), "Failed to create temp file for output");
        Error::file_operation(dir, "create temp file in", e)
    })?;
    if let Some(permissions) = existing {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| Error::file_operation(path, "set permissions on", e))?;
    }

    {
        let mut writer = BufWriter::new(tmp.as_file());
        for record in records {
            serde_json::to_writer(&mut writer, record)
                .map_err(io::Error::from)
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(|e| Error::file_operation(path, "write", e))?;
        }
        writer
            .flush()
            .map_err(|e| Error::file_operation(path, "write", e))?;
    }

    tmp.persist(path).map_err(|e| {
        error!(error = ?e.error, path = %path.display(), "Failed to persist output file");
        Error::file_operation(path, "persist", e.error)
    })?;

    info!(count = records.len(), path = %path.display(), "Saved JSONL output");
    Ok(())
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    // 0o666 before the process umask, as for `File::create`
    Some(fs::Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

/// Reads a JSON Lines file. Blank lines are skipped.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| Error::file_operation(path, "open", e))?;
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| Error::file_operation(path, "read", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            Error::file_operation(
                path,
                "parse",
                io::Error::new(io::ErrorKind::InvalidData, format!("line {}: {e}", index + 1)),
            )
        })?;
        records.push(record);
    }
    Ok(records)
}
