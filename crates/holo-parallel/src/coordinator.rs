//! The parallel parse coordinator.
//! 并行解析协调器。

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use holo_diagnostic::{Diagnostic, ErrorCode};
use tracing::{debug, info, warn};

use crate::error::ParallelError;
use crate::options::ParallelOptions;
use crate::progress::{ProgressCallback, ProgressEvent, ProgressTracker};
use crate::protocol::{Event, ParseTaskResult, SourceFile, TaskId, WorkerRequest};
use crate::symbols::{DependencyGraph, SymbolTable, link, unresolved_imports};
use crate::task::{self, failure};
use crate::worker::WorkerPool;

/// How long the coordinator waits for an event before checking on its
/// workers.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The merged outcome of a `parse_files` call.
#[derive(Debug, Clone)]
pub struct ParallelParseResult {
    /// Per-file results by path. A path given twice keeps its later file.
    pub results: BTreeMap<String, ParseTaskResult>,
    pub total_elapsed: Duration,
    pub success_count: usize,
    pub fail_count: usize,
    pub symbol_table: SymbolTable,
    pub dependency_graph: DependencyGraph,
    /// Cross-file warnings, such as imports nothing exports
    pub warnings: Vec<Diagnostic>,
}

impl ParallelParseResult {
    pub fn get(&self, path: &str) -> Option<&ParseTaskResult> {
        self.results.get(path)
    }

    /// Did every file parse without errors?
    pub fn all_succeeded(&self) -> bool {
        self.fail_count == 0
    }

    /// Results of files that failed, by path.
    pub fn failures(&self) -> impl Iterator<Item = &ParseTaskResult> {
        self.results.values().filter(|r| !r.success)
    }
}

/// A task handed to the pool and not yet answered.
struct Pending {
    index: usize,
    path: String,
    /// When a worker picked the task up, and which one
    running: Option<(Instant, usize)>,
}

/// Parses many files across a pool of worker threads.
///
/// Files are sorted largest first and dispatched in batches. When the pool
/// cannot be started, or `worker_count` is zero, every file is parsed on the
/// calling thread instead; results look the same either way.
///
/// ```
/// use holo_parallel::{ParallelOptions, ParallelParser, SourceFile};
///
/// let mut parser = ParallelParser::new(ParallelOptions::new().worker_count(2));
/// let result = parser
///     .parse_files(vec![
///         SourceFile::new("a.holo", "orb \"A\" {}"),
///         SourceFile::new("b.holo", "cube \"B\" {}"),
///     ])
///     .unwrap();
/// assert_eq!(result.success_count, 2);
/// assert!(result.symbol_table.contains("B"));
/// parser.shutdown();
/// ```
pub struct ParallelParser {
    options: ParallelOptions,
    pool: Option<WorkerPool>,
    progress: Option<ProgressCallback>,
    next_task: TaskId,
    shut_down: bool,
}

impl ParallelParser {
    pub fn new(options: ParallelOptions) -> Self {
        Self {
            options,
            pool: None,
            progress: None,
            next_task: 0,
            shut_down: false,
        }
    }

    pub fn options(&self) -> &ParallelOptions {
        &self.options
    }

    /// Receive a [`ProgressEvent`] after every file, when progress is
    /// enabled. Replaces any previous callback.
    pub fn on_progress(&mut self, callback: impl FnMut(&ProgressEvent) + Send + 'static) {
        self.progress = Some(Box::new(callback));
    }

    /// Parse every file and merge the results.
    ///
    /// A file failing, even by a fault inside its worker, only fails that
    /// file's result. The call itself fails only after `shutdown`, or when
    /// workers cannot start and sequential fallback is disabled.
    pub fn parse_files(&mut self, files: Vec<SourceFile>) -> Result<ParallelParseResult, ParallelError> {
        if self.shut_down {
            return Err(ParallelError::ShutDown);
        }
        let start = Instant::now();
        let total = files.len();
        let queue = self.prepare(files);
        let use_workers = self.ensure_pool()?;

        let mut slots: Vec<Option<ParseTaskResult>> = vec![None; total];
        let callback = if self.options.enable_progress {
            self.progress.as_mut()
        } else {
            None
        };
        let mut tracker = ProgressTracker::new(total, callback);

        match self.pool.as_mut() {
            Some(pool) if use_workers => {
                let timeout = self.options.timeout();
                let batch_size = self.options.effective_batch_size();
                let mut queue = queue.into_iter().peekable();
                let mut batch_no = 0;
                while queue.peek().is_some() {
                    let batch: Vec<_> = queue.by_ref().take(batch_size).collect();
                    debug!(batch = batch_no, files = batch.len(), "dispatching batch");
                    run_batch(pool, batch, timeout, &mut tracker, &mut slots);
                    batch_no += 1;
                }
            }
            _ => {
                debug!(files = total, "parsing sequentially");
                for (index, request) in queue {
                    let result = task::execute(&request);
                    tracker.record(&result.file_path, result.success);
                    slots[index] = Some(result);
                }
            }
        }

        let ordered: Vec<ParseTaskResult> = slots.into_iter().flatten().collect();
        let (symbol_table, dependency_graph) = link(&ordered);
        let warnings = unresolved_imports(&ordered, &symbol_table);
        let success_count = ordered.iter().filter(|r| r.success).count();
        let fail_count = ordered.len() - success_count;
        let total_elapsed = start.elapsed();

        info!(
            files = total,
            succeeded = success_count,
            failed = fail_count,
            symbols = symbol_table.len(),
            ?total_elapsed,
            "parsed files"
        );

        Ok(ParallelParseResult {
            results: ordered.into_iter().map(|r| (r.file_path.clone(), r)).collect(),
            total_elapsed,
            success_count,
            fail_count,
            symbol_table,
            dependency_graph,
            warnings,
        })
    }

    /// Requests in dispatch order, largest file first, each tagged with its
    /// input index. Equal sizes keep input order.
    fn prepare(&mut self, files: Vec<SourceFile>) -> Vec<(usize, WorkerRequest)> {
        let mut indexed: Vec<(usize, SourceFile)> = files.into_iter().enumerate().collect();
        indexed.sort_by(|a, b| b.1.content.len().cmp(&a.1.content.len()));
        indexed
            .into_iter()
            .map(|(index, file)| {
                let task_id = self.next_task;
                self.next_task += 1;
                let request = WorkerRequest {
                    task_id,
                    path: file.path,
                    content: file.content,
                    options: self.options.parser,
                };
                (index, request)
            })
            .collect()
    }

    /// Start the pool if needed. Ok(false) means parse sequentially.
    fn ensure_pool(&mut self) -> Result<bool, ParallelError> {
        if self.options.worker_count == 0 {
            return Ok(false);
        }
        if self.pool.is_some() {
            return Ok(true);
        }
        match WorkerPool::start(self.options.worker_count) {
            Ok(pool) => {
                self.pool = Some(pool);
                Ok(true)
            }
            Err(err) if self.options.fallback_to_sequential => {
                warn!(error = %err, "cannot start workers, falling back to sequential parsing");
                Ok(false)
            }
            Err(err) => Err(ParallelError::WorkerSpawn(err)),
        }
    }

    /// Stop the workers. Safe to call any number of times; later
    /// `parse_files` calls fail with [`ParallelError::ShutDown`].
    pub fn shutdown(&mut self) {
        if let Some(mut pool) = self.pool.take() {
            pool.shutdown();
        }
        self.shut_down = true;
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl Drop for ParallelParser {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Dispatch one batch and wait until every task in it is answered, timed
/// out or lost.
fn run_batch(
    pool: &mut WorkerPool,
    batch: Vec<(usize, WorkerRequest)>,
    timeout: Option<Duration>,
    tracker: &mut ProgressTracker<'_>,
    slots: &mut [Option<ParseTaskResult>],
) {
    let mut pending: HashMap<TaskId, Pending> = HashMap::with_capacity(batch.len());
    for (index, request) in batch {
        let task_id = request.task_id;
        let path = request.path.clone();
        if pool.submit(request) {
            pending.insert(
                task_id,
                Pending {
                    index,
                    path,
                    running: None,
                },
            );
        } else {
            let result = failure(&path, ErrorCode::WorkerFailure, "no worker accepted the task".into(), Duration::ZERO);
            tracker.record(&path, false);
            slots[index] = Some(result);
        }
    }

    while !pending.is_empty() {
        match pool.events().recv_timeout(next_wait(&pending, timeout)) {
            Ok(Event::Started { task_id, worker }) => {
                if let Some(task) = pending.get_mut(&task_id) {
                    task.running = Some((Instant::now(), worker));
                }
            }
            Ok(Event::Finished(response)) => match pending.remove(&response.task_id) {
                Some(task) => {
                    tracker.record(&task.path, response.result.success);
                    slots[task.index] = Some(response.result);
                }
                None => debug!(task = response.task_id, worker = response.worker, "discarding late result"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                abandon(&mut pending, "worker pool disconnected", tracker, slots);
                break;
            }
        }

        if let Some(limit) = timeout {
            expire(pool, &mut pending, limit, tracker, slots);
        }
        if !pending.is_empty() && pool.is_dead() {
            abandon(&mut pending, "every worker has stopped", tracker, slots);
        }
    }
}

/// Time until the earliest running task times out, capped by the poll
/// interval.
fn next_wait(pending: &HashMap<TaskId, Pending>, timeout: Option<Duration>) -> Duration {
    let Some(limit) = timeout else {
        return POLL_INTERVAL;
    };
    pending
        .values()
        .filter_map(|task| task.running)
        .map(|(started, _)| limit.saturating_sub(started.elapsed()))
        .min()
        .map_or(POLL_INTERVAL, |left| left.min(POLL_INTERVAL))
}

/// Fail every task that has run longer than `limit` and replace its worker.
fn expire(
    pool: &mut WorkerPool,
    pending: &mut HashMap<TaskId, Pending>,
    limit: Duration,
    tracker: &mut ProgressTracker<'_>,
    slots: &mut [Option<ParseTaskResult>],
) {
    let mut expired: Vec<TaskId> = pending
        .iter()
        .filter(|(_, task)| task.running.is_some_and(|(started, _)| started.elapsed() >= limit))
        .map(|(id, _)| *id)
        .collect();
    expired.sort_unstable();

    for task_id in expired {
        let Some(task) = pending.remove(&task_id) else {
            continue;
        };
        let (started, worker) = task.running.unwrap_or((Instant::now(), 0));
        warn!(file = %task.path, worker, ?limit, "parse task timed out");

        let detail = format!("no result after {:?}", limit);
        let result = failure(&task.path, ErrorCode::TaskTimeout, detail, started.elapsed());
        tracker.record(&task.path, false);
        slots[task.index] = Some(result);

        if let Err(err) = pool.replace(worker) {
            warn!(error = %err, "cannot start replacement worker");
        }
    }
}

/// Fail every pending task with `worker-failure`.
fn abandon(
    pending: &mut HashMap<TaskId, Pending>,
    reason: &str,
    tracker: &mut ProgressTracker<'_>,
    slots: &mut [Option<ParseTaskResult>],
) {
    let mut tasks: Vec<Pending> = pending.drain().map(|(_, task)| task).collect();
    tasks.sort_by_key(|task| task.index);
    for task in tasks {
        warn!(file = %task.path, reason, "parse task lost");
        tracker.record(&task.path, false);
        slots[task.index] = Some(failure(&task.path, ErrorCode::WorkerFailure, reason.to_string(), Duration::ZERO));
    }
}
