//! Errors of the parallel coordinator.
//! 并行协调器的错误。

use std::io;
use thiserror::Error;

/// Errors that fail a whole `parse_files` call.
///
/// A file that fails to parse is never one of these; it becomes a failed
/// [`ParseTaskResult`](crate::ParseTaskResult).
#[derive(Debug, Error)]
pub enum ParallelError {
    /// The worker pool could not be started and sequential fallback is off.
    /// 无法启动工作线程。
    #[error("failed to spawn parse worker: {0}")]
    WorkerSpawn(#[from] io::Error),

    /// `shutdown` was called before this request.
    /// 协调器已关闭。
    #[error("parallel parser has been shut down")]
    ShutDown,
}
