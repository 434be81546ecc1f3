//! Parallel multi-file parsing for HoloScript+.
//! HoloScript+ 并行多文件解析。
//!
//! [`ParallelParser`] spreads files over a pool of worker threads, then
//! merges what every file exports into one [`SymbolTable`] and records who
//! imports what in a [`DependencyGraph`].

mod coordinator;
mod error;
mod options;
mod progress;
mod protocol;
mod symbols;
mod task;
mod worker;

pub use coordinator::{ParallelParseResult, ParallelParser};
pub use error::ParallelError;
pub use options::{DEFAULT_BATCH_SIZE, ParallelOptions};
pub use progress::{ProgressCallback, ProgressEvent};
pub use protocol::{Export, ParseTaskResult, SourceFile, SymbolKind, TaskId, WorkerRequest, WorkerResponse};
pub use symbols::{DependencyGraph, Symbol, SymbolTable};
pub use task::{collect_exports, execute};
pub use worker::WORKER_STACK_SIZE;
