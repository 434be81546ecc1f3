//! Messages between the coordinator and its workers.
//!
//! Everything crossing a channel is owned; workers share no state with the
//! coordinator.

use std::time::Duration;

use holo_diagnostic::Diagnostic;
use holo_parser::ParserOptions;
use holo_syntax::{ImportDecl, Node};
use serde::{Deserialize, Serialize};

/// Coordinator-assigned task identity.
pub type TaskId = u64;

/// A file to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// What kind of top-level construct a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Element,
    Template,
    Composition,
    Function,
}

/// A name a file makes available to others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub name: String,
    pub kind: SymbolKind,
}

/// Outcome of parsing one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseTaskResult {
    pub file_path: String,
    /// None when the task itself failed
    pub ast: Option<Node>,
    pub success: bool,
    /// Errors followed by warnings
    pub diagnostics: Vec<Diagnostic>,
    pub exports: Vec<Export>,
    pub imports: Vec<ImportDecl>,
    pub elapsed: Duration,
}

impl ParseTaskResult {
    /// A result for a file whose task never produced a parse.
    pub fn failed(file_path: impl Into<String>, diagnostic: Diagnostic, elapsed: Duration) -> Self {
        Self {
            file_path: file_path.into(),
            ast: None,
            success: false,
            diagnostics: vec![diagnostic],
            exports: Vec::new(),
            imports: Vec::new(),
            elapsed,
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

/// Work sent to a worker.
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    pub task_id: TaskId,
    pub path: String,
    pub content: String,
    pub options: ParserOptions,
}

/// A worker's answer to a [`WorkerRequest`].
#[derive(Debug, Clone)]
pub struct WorkerResponse {
    pub task_id: TaskId,
    pub worker: usize,
    pub result: ParseTaskResult,
}

/// Coordinator → worker.
#[derive(Debug)]
pub(crate) enum Command {
    Parse(WorkerRequest),
    Shutdown,
}

/// Worker → coordinator.
#[derive(Debug)]
pub(crate) enum Event {
    /// A worker picked up a task; its timeout starts now
    Started { task_id: TaskId, worker: usize },
    Finished(WorkerResponse),
}
