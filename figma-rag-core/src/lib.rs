#![doc = "figma-rag-core: core logic library for figma-rag."]

//! This crate holds the data model and pipelines that turn a Figma file into
//! retrieval documents: tree extraction, document conversion, JSONL output and
//! LLM batch enrichment. Network clients and the command line live in the
//! `figma-rag` crate and plug in through the traits in [`contract`].

pub mod batch;
pub mod config;
pub mod context;
pub mod contract;
pub mod convert;
pub mod error;
pub mod extract;
pub mod node;
pub mod pipeline;
pub mod report;

pub use error::{Error, Result};
