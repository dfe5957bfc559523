///
/// This module implements the CLI interface for figma-rag: command parsing,
/// token resolution, wiring of the HTTP clients into the core pipelines, and
/// user-visible output.
///
/// All business logic (extraction, conversion, batching, retry) lives in
/// `figma-rag-core`. This module is glue only.
///
/// ## How To Use
/// - From a shell: `figma-rag --help`.
/// - Programmatically: call [`run`] with a parsed [`Cli`].
use crate::console::{self, ConsoleProgress};
use crate::figma::FigmaClient;
use crate::load_config::{load_config, resolve_secret, FIGMA_TOKEN_ENV, OPENAI_KEY_ENV};
use crate::openai::OpenAiClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figma_rag_core::batch::BatchProcessor;
use figma_rag_core::config::Config;
use figma_rag_core::context::RunContext;
use figma_rag_core::convert::DocumentRecord;
use figma_rag_core::pipeline::{fetch_elements, process_file, read_jsonl};
use figma_rag_core::report::{document_stats, document_type_counts, element_counts, validate_jsonl};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const FILE_URL_PATTERN: &str = r"figma\.com/(?:file|design|proto|board)/([A-Za-z0-9]+)";

const TOKEN_HELP: &str = "\
To get your Figma access token:

1. Log in to Figma (https://www.figma.com)
2. Go to Account Settings (click your profile picture, then Settings)
3. Scroll to the \"Access tokens\" section
4. Click \"Generate new token\"
5. Give it a name (e.g. \"RAG Converter\")
6. Copy the token immediately; it is shown only once

Pass it with --access-token or set FIGMA_ACCESS_TOKEN.
The `process` command also needs a model API key: --api-key or OPENAI_API_KEY.

To get your file key:
The file key is in your Figma file URL:
https://www.figma.com/file/XXXXXXXXXXXXX/FileName
                           ^^^^^^^^^^^^^ this is your file key
The full URL can also be passed wherever a file key is expected.

Note: make sure you have access permissions to the file.";

/// CLI for figma-rag: convert Figma designs to RAG-optimized JSONL.
#[derive(Parser)]
#[clap(
    name = "figma-rag",
    version,
    about = "Convert Figma designs to RAG-optimized format",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Optional YAML settings file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect a Figma file and show available content
    Inspect {
        /// Figma file key or file URL
        file: String,
        /// Figma API access token (or FIGMA_ACCESS_TOKEN)
        #[clap(long = "access-token", short = 't')]
        access_token: Option<String>,
    },
    /// Convert Figma design elements to RAG-optimized JSONL
    Convert {
        /// Figma file key or file URL
        file: String,
        /// Figma API access token (or FIGMA_ACCESS_TOKEN)
        #[clap(long = "access-token", short = 't')]
        access_token: Option<String>,
        /// Output file path
        #[clap(long, short, default_value = "components.jsonl")]
        output: PathBuf,
        /// Show detailed processing information
        #[clap(long, short)]
        verbose: bool,
    },
    /// Extract elements and document them with a language model, in batches
    Process {
        /// Figma file key or file URL
        file: String,
        /// Figma API access token (or FIGMA_ACCESS_TOKEN)
        #[clap(long = "access-token", short = 't')]
        access_token: Option<String>,
        /// Model API key (or OPENAI_API_KEY)
        #[clap(long = "api-key")]
        api_key: Option<String>,
        /// Output file path; failures go to `<stem>.failed.jsonl` next to it
        #[clap(long, short, default_value = "processed.jsonl")]
        output: PathBuf,
        #[clap(long)]
        batch_size: Option<usize>,
        #[clap(long)]
        retry_attempts: Option<u32>,
        #[clap(long)]
        model: Option<String>,
        /// Elements of a batch processed concurrently
        #[clap(long)]
        concurrency: Option<usize>,
    },
    /// Check that every line of a JSONL file is a valid document record
    Validate {
        /// JSONL file to check
        input: PathBuf,
    },
    /// Show statistics for a JSONL document file
    Stats {
        /// JSONL file to summarise
        input: PathBuf,
    },
    /// Show how to get a Figma access token and file key
    Help,
}

/// Accepts a bare file key or any Figma file/design URL.
pub fn parse_file_key(input: &str) -> Result<String> {
    let input = input.trim();
    if input.contains("figma.com") {
        let pattern = Regex::new(FILE_URL_PATTERN)?;
        let captures = pattern
            .captures(input)
            .with_context(|| format!("Could not find a file key in URL `{input}`"))?;
        return Ok(captures[1].to_string());
    }
    if input.is_empty() {
        anyhow::bail!("File key must not be empty");
    }
    Ok(input.to_string())
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Inspect { file, access_token } => inspect(&config, &file, access_token).await,
        Commands::Convert {
            file,
            access_token,
            output,
            verbose,
        } => convert(&config, &file, access_token, &output, verbose).await,
        Commands::Process {
            file,
            access_token,
            api_key,
            output,
            batch_size,
            retry_attempts,
            model,
            concurrency,
        } => {
            let mut config = config;
            if let Some(batch_size) = batch_size {
                config.llm.batch_size = batch_size;
            }
            if let Some(retry_attempts) = retry_attempts {
                config.llm.retry_attempts = retry_attempts;
            }
            if let Some(model) = model {
                config.llm.model = model;
            }
            if let Some(concurrency) = concurrency {
                config.llm.concurrency = concurrency;
            }
            process(&config, &file, access_token, api_key, &output).await
        }
        Commands::Validate { input } => validate(&input),
        Commands::Stats { input } => stats(&input),
        Commands::Help => {
            console::panel("Getting Started", TOKEN_HELP);
            Ok(())
        }
    }
}

fn figma_client(config: &Config, access_token: Option<String>) -> Result<FigmaClient> {
    let token = resolve_secret(access_token, FIGMA_TOKEN_ENV).with_context(|| {
        format!(
            "No access token provided. Please provide it via --access-token or set {FIGMA_TOKEN_ENV} environment variable."
        )
    })?;
    FigmaClient::new(&config.figma, token)
}

fn run_context(command: &str) -> RunContext {
    RunContext::new(command, Box::new(ConsoleProgress::new()))
}

async fn inspect(config: &Config, file: &str, access_token: Option<String>) -> Result<()> {
    let file_key = parse_file_key(file)?;
    let client = figma_client(config, access_token)?;
    let ctx = run_context("inspect");

    let (summary, elements) = fetch_elements(&ctx, &client, &file_key)
        .await
        .context("Failed to access Figma file")?;
    drop(ctx);

    console::panel("Connection Success", "Successfully accessed Figma file!");
    if elements.is_empty() {
        console::warning_panel("Warning", "No content found in this file.");
        return Ok(());
    }
    console::panel(
        "File Information",
        &format!(
            "File Name: {}\nFile Type: {}\nTotal Elements: {}",
            summary.name,
            summary.root_type,
            elements.len()
        ),
    );
    let counts = element_counts(&elements);
    console::table(
        &format!("File Content Summary: {}", summary.name),
        counts.iter().map(|(kind, count)| (kind.as_str(), *count)),
    );
    Ok(())
}

async fn convert(
    config: &Config,
    file: &str,
    access_token: Option<String>,
    output: &Path,
    verbose: bool,
) -> Result<()> {
    let file_key = parse_file_key(file)?;
    let client = figma_client(config, access_token)?;
    let ctx = run_context("convert");

    let documents = process_file(&ctx, &client, &file_key, output)
        .await
        .context("Conversion failed")?;
    drop(ctx);

    if verbose {
        let counts = document_type_counts(&documents);
        let lines: Vec<String> = counts
            .iter()
            .map(|(doc_type, count)| format!("- {count} {doc_type} elements"))
            .collect();
        console::panel(
            "Details",
            &format!("Processed {} elements\n{}", documents.len(), lines.join("\n")),
        );
    }
    console::panel(
        "Success",
        &format!(
            "Successfully converted {} elements to {}",
            documents.len(),
            output.display()
        ),
    );
    Ok(())
}

fn failure_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "processed".to_string());
    output.with_file_name(format!("{stem}.failed.jsonl"))
}

async fn process(
    config: &Config,
    file: &str,
    access_token: Option<String>,
    api_key: Option<String>,
    output: &Path,
) -> Result<()> {
    let file_key = parse_file_key(file)?;
    let figma = figma_client(config, access_token)?;
    let api_key = resolve_secret(api_key, OPENAI_KEY_ENV).with_context(|| {
        format!("No API key provided. Please provide it via --api-key or set {OPENAI_KEY_ENV} environment variable.")
    })?;
    let model = OpenAiClient::new(&config.llm, api_key)?;
    let processor = BatchProcessor::new(model, config.llm.batch_config())?;
    let ctx = run_context("process");

    let (_summary, elements) = fetch_elements(&ctx, &figma, &file_key)
        .await
        .context("Failed to access Figma file")?;
    let outcome = processor.batch_process(&ctx, &elements).await;

    ctx.stage("Saving results");
    let failed_output = failure_path(output);
    outcome
        .persist(output, &failed_output)
        .context("Failed to save results")?;
    drop(ctx);

    let mut body = format!(
        "Elements: {}\nDocumented: {}\nFailed: {}\nOutput: {}",
        elements.len(),
        outcome.documents.len(),
        outcome.failed.len(),
        output.display()
    );
    if !outcome.failed.is_empty() {
        body.push_str(&format!("\nFailed elements: {}", failed_output.display()));
    }
    console::panel("Summary", &body);
    Ok(())
}

fn validate(input: &Path) -> Result<()> {
    let report = validate_jsonl(input).context("Validation could not read the file")?;

    let mut seen = HashSet::new();
    let duplicates = report
        .lines
        .iter()
        .filter(|line| !seen.insert(Sha256::digest(line.as_bytes())))
        .count();

    let mut body = format!(
        "Valid records: {}\nInvalid records: {}\nDuplicate records: {}",
        report.valid,
        report.issues.len(),
        duplicates
    );
    for issue in &report.issues {
        body.push_str(&format!("\nline {}: {}", issue.line, issue.message));
    }
    console::panel("Validation", &body);

    if !report.is_valid() {
        anyhow::bail!(
            "{} invalid record(s) in {}",
            report.issues.len(),
            input.display()
        );
    }
    Ok(())
}

fn stats(input: &Path) -> Result<()> {
    let documents: Vec<DocumentRecord> = read_jsonl(input).context("Failed to read documents")?;
    let stats = document_stats(&documents);

    console::panel(
        "Statistics",
        &format!(
            "Documents: {}\nAverage content length: {:.1} chars\nLongest content: {} chars",
            stats.total, stats.average_content_chars, stats.max_content_chars
        ),
    );
    console::table(
        "Documents by type",
        stats.by_type.iter().map(|(t, count)| (t.as_str(), *count)),
    );
    Ok(())
}
