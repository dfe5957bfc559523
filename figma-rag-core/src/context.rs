//! Per-invocation run context.
//!
//! One [`RunContext`] is created per command and handed to every pipeline
//! stage. It owns the tracing span that groups the run's events and the
//! progress reporter. Dropping it closes the run.

use crate::contract::{NoopProgress, ProgressReporter};
use std::time::Instant;
use tracing::{info, Span};
use uuid::Uuid;

pub struct RunContext {
    span: Span,
    progress: Box<dyn ProgressReporter>,
    run_id: Uuid,
    started: Instant,
}

impl RunContext {
    pub fn new(command: &str, progress: Box<dyn ProgressReporter>) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", command, run_id = %run_id);
        span.in_scope(|| info!("Run started"));
        Self {
            span,
            progress,
            run_id,
            started: Instant::now(),
        }
    }

    /// Context without progress output, for tests and library callers.
    pub fn silent(command: &str) -> Self {
        Self::new(command, Box::new(NoopProgress))
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Announces a stage to the reporter and the log.
    pub fn stage(&self, name: &str) {
        self.span.in_scope(|| info!(stage = name, "Stage started"));
        self.progress.stage(name);
    }

    pub fn advance(&self, done: usize, total: usize) {
        self.progress.advance(done, total);
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        self.span.in_scope(|| info!(elapsed_ms, "Run finished"));
    }
}
