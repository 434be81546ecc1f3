//! Coordinator configuration.

use std::time::Duration;

use holo_parser::ParserOptions;
use serde::{Deserialize, Serialize};

/// Default number of files dispatched per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Options for [`ParallelParser`](crate::ParallelParser).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelOptions {
    /// Worker threads; zero parses on the calling thread.
    pub worker_count: usize,
    pub batch_size: usize,
    /// Emit a progress event after every file.
    pub enable_progress: bool,
    /// Parse sequentially when workers cannot be started, instead of failing.
    pub fallback_to_sequential: bool,
    /// A task running longer than this fails with `task-timeout`. Off when
    /// unset.
    pub task_timeout_ms: Option<u64>,
    /// Options every file is parsed with.
    pub parser: ParserOptions,
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            batch_size: DEFAULT_BATCH_SIZE,
            enable_progress: true,
            fallback_to_sequential: true,
            task_timeout_ms: None,
            parser: ParserOptions::default(),
        }
    }
}

impl ParallelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Files per batch (at least one).
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn enable_progress(mut self, enable: bool) -> Self {
        self.enable_progress = enable;
        self
    }

    pub fn fallback_to_sequential(mut self, fallback: bool) -> Self {
        self.fallback_to_sequential = fallback;
        self
    }

    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    pub fn parser(mut self, parser: ParserOptions) -> Self {
        self.parser = parser;
        self
    }

    /// The per-task timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }

    pub(crate) fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
