//! LLM enrichment of extracted elements, in batches with whole-batch retry.
//!
//! Each element is sent to the model with a fixed system instruction and a
//! user prompt embedding the element as JSON. The response must be a JSON
//! object of the [`ProcessedElement`] shape; it is rendered into a Markdown
//! [`DocumentRecord`].
//!
//! A batch attempt succeeds only when every element in it succeeds. A failed
//! attempt is repeated up to `retry_attempts` times in total; once exhausted,
//! every element of the batch is reported in [`BatchOutcome::failed`] and none
//! of the batch's documents are emitted.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn, Instrument};

use crate::context::RunContext;
use crate::contract::{CompletionClient, CompletionRequest};
use crate::convert::DocumentRecord;
use crate::error::{Error, Result};
use crate::extract::RawElement;
use crate::pipeline::write_jsonl;

pub const SYSTEM_PROMPT: &str = r#"You are a design system documentation expert. Your task is to analyze Figma design elements and create clear, structured documentation.
Please format your response as JSON with the following structure:
{
    "element_type": "type of the design element",
    "title": "clear name/title",
    "description": "comprehensive description",
    "context": "usage context and location",
    "style_tokens": {"key style information"},
    "usage_guidelines": "how to use this element",
    "related_elements": ["related components or styles"]
}"#;

#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub model: String,
    pub temperature: f32,
    pub batch_size: usize,
    /// Total attempts per batch, including the first.
    pub retry_attempts: u32,
    /// Elements of one batch in flight at once.
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub retry_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        crate::config::LlmSettings::default().batch_config()
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Configuration("batch_size must be at least 1".into()));
        }
        if self.retry_attempts == 0 {
            return Err(Error::Configuration("retry_attempts must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(Error::Configuration("concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

/// Structured documentation the model returns for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedElement {
    pub element_type: String,
    pub title: String,
    pub description: String,
    pub context: String,
    #[serde(default)]
    pub style_tokens: Map<String, Value>,
    #[serde(default)]
    pub usage_guidelines: String,
    #[serde(default)]
    pub related_elements: Vec<String>,
}

/// An element that could not be enriched, with the last error seen for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedElement {
    pub element: RawElement,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub documents: Vec<DocumentRecord>,
    pub failed: Vec<FailedElement>,
}

impl BatchOutcome {
    /// Writes the documents, and the failures only when there are any.
    ///
    /// Without failures, a failure file left by an earlier run is removed.
    pub fn persist(&self, success_path: &Path, failure_path: &Path) -> Result<()> {
        write_jsonl(&self.documents, success_path)?;
        if !self.failed.is_empty() {
            return write_jsonl(&self.failed, failure_path);
        }
        match fs::remove_file(failure_path) {
            Ok(()) => {
                info!(path = %failure_path.display(), "Removed stale failure file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::file_operation(failure_path, "remove", e)),
        }
    }
}

pub fn user_prompt(element: &RawElement) -> Result<String> {
    let data = serde_json::to_string_pretty(element)
        .map_err(|e| Error::Conversion(format!("element `{}` is not serialisable: {e}", element.name)))?;
    Ok(format!(
        "Please analyze this Figma design element and provide structured documentation:\n\n\
         Element Data:\n{data}\n\n\
         Focus on making the content useful for designers and developers using the design system.\n\
         Ensure your response is valid JSON matching the specified structure."
    ))
}

/// Parses a model reply. A surrounding Markdown code fence is tolerated.
pub fn parse_response(text: &str) -> Result<ProcessedElement> {
    let body = strip_code_fence(text);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::Schema(format!("Failed to parse model response as JSON: {e}")))?;
    if !value.is_object() {
        return Err(Error::Schema(format!(
            "expected a JSON object, got {}",
            json_type_name(&value)
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| Error::Schema(format!("response does not match the expected shape: {e}")))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // drop the info string, e.g. "json"
    match rest.find('\n') {
        Some(newline) => rest[newline + 1..].trim(),
        None => rest.trim(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Renders a processed element into its final document.
pub fn render(processed: &ProcessedElement, source: &RawElement) -> Result<DocumentRecord> {
    let style = serde_json::to_string_pretty(&processed.style_tokens)
        .map_err(|e| Error::Conversion(format!("style tokens are not serialisable: {e}")))?;

    let content = format!(
        "# {title}\n\n\
         ## Description\n{description}\n\n\
         ## Usage Guidelines\n{usage}\n\n\
         ## Context\n{context}\n\n\
         ## Style Information\n{style}\n\n\
         ## Related Elements\n{related}",
        title = processed.title,
        description = processed.description,
        usage = processed.usage_guidelines,
        context = processed.context,
        style = style,
        related = processed.related_elements.join(", "),
    )
    .trim()
    .to_string();

    let mut metadata = Map::new();
    metadata.insert("element_type".into(), Value::String(processed.element_type.clone()));
    metadata.insert("title".into(), Value::String(processed.title.clone()));
    metadata.insert("context".into(), Value::String(processed.context.clone()));
    metadata.insert(
        "related_elements".into(),
        Value::Array(
            processed
                .related_elements
                .iter()
                .cloned()
                .map(Value::String)
                .collect(),
        ),
    );
    metadata.insert("style_tokens".into(), Value::Object(processed.style_tokens.clone()));
    metadata.insert("type".into(), Value::String(source.kind.as_str().to_string()));
    metadata.insert("path".into(), Value::String(source.path.clone()));
    metadata.insert("name".into(), Value::String(source.name.clone()));
    metadata.insert("id".into(), Value::String(source.id.clone()));

    Ok(DocumentRecord { content, metadata })
}

pub struct BatchProcessor<C> {
    client: C,
    config: BatchConfig,
}

impl<C: CompletionClient> BatchProcessor<C> {
    pub fn new(client: C, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Prompt → model → parse → render for a single element.
    pub async fn process_element(&self, element: &RawElement) -> Result<DocumentRecord> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            user: user_prompt(element)?,
            temperature: self.config.temperature,
        };

        let timeout = self.config.request_timeout;
        let text = tokio::time::timeout(timeout, self.client.complete(request))
            .await
            .map_err(|_| Error::Timeout(timeout))??;

        let processed = parse_response(&text)?;
        debug!(name = %element.name, title = %processed.title, "Model response parsed");
        render(&processed, element)
    }

    /// One attempt over a batch. Results keep element order.
    async fn attempt_batch(&self, batch: &[RawElement]) -> Vec<Result<DocumentRecord>> {
        stream::iter(batch.iter().map(|element| self.process_element(element)))
            .buffered(self.config.concurrency)
            .collect()
            .await
    }

    /// Processes all elements batch by batch.
    pub async fn batch_process(&self, ctx: &RunContext, elements: &[RawElement]) -> BatchOutcome {
        let batch_size = self.config.batch_size;
        let total_batches = elements.len().div_ceil(batch_size);
        let mut outcome = BatchOutcome::default();
        let mut done = 0;

        ctx.span().in_scope(|| {
            info!(
                elements = elements.len(),
                batches = total_batches,
                batch_size,
                retry_attempts = self.config.retry_attempts,
                "[BATCH] Starting batch processing"
            )
        });

        for (index, batch) in elements.chunks(batch_size).enumerate() {
            let batch_no = index + 1;
            ctx.stage(&format!("Processing batch {batch_no}/{total_batches}"));

            match self.run_batch(batch_no, batch).instrument(ctx.span().clone()).await {
                Ok(documents) => outcome.documents.extend(documents),
                Err(failed) => outcome.failed.extend(failed),
            }

            done += batch.len();
            ctx.advance(done, elements.len());
        }

        ctx.span().in_scope(|| {
            info!(
                documents = outcome.documents.len(),
                failed = outcome.failed.len(),
                "[BATCH] Batch processing complete"
            )
        });
        outcome
    }

    /// Retries one batch until an attempt has no failures or attempts run out.
    async fn run_batch(
        &self,
        batch_no: usize,
        batch: &[RawElement],
    ) -> std::result::Result<Vec<DocumentRecord>, Vec<FailedElement>> {
        let attempts = self.config.retry_attempts;
        let mut last_errors: Vec<Option<String>> = vec![None; batch.len()];

        for attempt in 1..=attempts {
            let results = self.attempt_batch(batch).await;

            let mut documents = Vec::with_capacity(batch.len());
            let mut errors = vec![None; batch.len()];
            for (slot, result) in results.into_iter().enumerate() {
                match result {
                    Ok(doc) => documents.push(doc),
                    Err(e) => {
                        warn!(
                            batch = batch_no,
                            attempt,
                            name = %batch[slot].name,
                            error = %e,
                            "Element failed during batch attempt"
                        );
                        errors[slot] = Some(e.to_string());
                    }
                }
            }

            let failures = errors.iter().filter(|e| e.is_some()).count();
            if failures == 0 {
                info!(batch = batch_no, attempt, size = batch.len(), "[BATCH] Batch succeeded");
                return Ok(documents);
            }

            warn!(
                batch = batch_no,
                attempt,
                attempts,
                failures,
                "[BATCH] Batch attempt failed"
            );
            last_errors = errors;

            if attempt < attempts && !self.config.retry_delay.is_zero() {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        let failures = last_errors.iter().filter(|e| e.is_some()).count();
        error!(
            batch = batch_no,
            attempts,
            size = batch.len(),
            "[BATCH][ERROR] Batch failed after all attempts; marking every element as failed"
        );
        let batch_message = format!(
            "batch {batch_no} failed after {attempts} attempt(s): {failures} of {} element(s) failed on the final attempt",
            batch.len()
        );
        Err(batch
            .iter()
            .zip(last_errors)
            .map(|(element, error)| FailedElement {
                element: element.clone(),
                error: error.unwrap_or_else(|| batch_message.clone()),
            })
            .collect())
    }
}
