//! # contract: interfaces to the collaborators the pipelines depend on
//!
//! The core never talks HTTP or renders to a terminal itself. Instead it is
//! handed implementations of the traits below:
//!
//! - [`DesignSource`] fetches a design file's node tree.
//! - [`CompletionClient`] runs one chat completion against a language model.
//! - [`ProgressReporter`] receives stage and progress notifications.
//!
//! ## Mocking & Testing
//! All traits are annotated for `mockall`; the generated `Mock*` types are
//! exported when the `test-export-mocks` feature is on (the default), so
//! dependents can drive the pipelines deterministically.

use async_trait::async_trait;
use mockall::automock;

use crate::error::Error;
use crate::node::DesignFile;

/// Read access to design files.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DesignSource: Send + Sync {
    /// Fetch the complete file, including its `document` root, in one call.
    ///
    /// Implementors map connectivity failures to [`Error::Transport`],
    /// elapsed time budgets to [`Error::Timeout`] and non-success statuses to
    /// [`Error::Remote`].
    async fn fetch_file(&self, file_key: &str) -> Result<DesignFile, Error>;
}

/// A single chat-style completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Access to a chat completion model.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the text content of the first choice.
    async fn complete(&self, request: CompletionRequest) -> Result<String, Error>;
}

/// Progress notifications emitted by the pipelines.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ProgressReporter: Send + Sync {
    /// A new named stage has started.
    fn stage(&self, name: &str);

    /// `done` out of `total` units of the current stage are finished.
    fn advance(&self, done: usize, total: usize);
}

/// Reporter that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn stage(&self, _name: &str) {}
    fn advance(&self, _done: usize, _total: usize) {}
}
