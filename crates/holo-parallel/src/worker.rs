//! The worker thread pool.
//! 工作线程池。

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, warn};

use crate::protocol::{Command, Event, WorkerRequest, WorkerResponse};
use crate::task;

/// Stack size of a worker thread. Parsing recurses once per nesting level.
pub const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

struct WorkerHandle {
    id: usize,
    thread: JoinHandle<()>,
    /// Set when the worker was replaced; it exits after its current task
    retired: Arc<AtomicBool>,
}

/// Fixed-size pool of parse workers fed from one shared queue. A worker
/// takes the next task as soon as it finishes the previous one.
pub(crate) struct WorkerPool {
    commands: Sender<Command>,
    queue: Receiver<Command>,
    events_tx: Sender<Event>,
    events: Receiver<Event>,
    workers: Vec<WorkerHandle>,
    /// Replaced workers that may still be running
    retired: Vec<WorkerHandle>,
    next_id: usize,
}

impl WorkerPool {
    /// Start `count` workers. Fails if any of them cannot be spawned.
    pub(crate) fn start(count: usize) -> io::Result<Self> {
        let (commands, queue) = unbounded();
        let (events_tx, events) = unbounded();
        let mut pool = Self {
            commands,
            queue,
            events_tx,
            events,
            workers: Vec::with_capacity(count),
            retired: Vec::new(),
            next_id: 0,
        };

        for _ in 0..count {
            if let Err(err) = pool.spawn_worker() {
                pool.shutdown();
                return Err(err);
            }
        }
        debug!(workers = count, "worker pool started");
        Ok(pool)
    }

    fn spawn_worker(&mut self) -> io::Result<()> {
        let id = self.next_id;
        let retired = Arc::new(AtomicBool::new(false));
        let thread = {
            let queue = self.queue.clone();
            let events = self.events_tx.clone();
            let retired = Arc::clone(&retired);
            thread::Builder::new()
                .name(format!("holo-worker-{}", id))
                .stack_size(WORKER_STACK_SIZE)
                .spawn(move || worker_loop(id, queue, events, retired))?
        };
        self.next_id += 1;
        self.workers.push(WorkerHandle {
            id,
            thread,
            retired,
        });
        Ok(())
    }

    /// Queue a task. False when no worker can receive it.
    pub(crate) fn submit(&self, request: WorkerRequest) -> bool {
        self.commands.send(Command::Parse(request)).is_ok()
    }

    pub(crate) fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Abandon a stalled worker and start a new one in its place. The old
    /// thread is detached; whatever it sends later is ignored.
    pub(crate) fn replace(&mut self, worker: usize) -> io::Result<()> {
        if let Some(at) = self.workers.iter().position(|w| w.id == worker) {
            let stalled = self.workers.swap_remove(at);
            stalled.retired.store(true, Ordering::Release);
            warn!(worker, "replacing stalled worker");
            self.retired.push(stalled);
        }
        self.spawn_worker()
    }

    #[cfg(test)]
    pub(crate) fn size(&self) -> usize {
        self.workers.len()
    }

    /// True when no worker is left to run tasks.
    pub(crate) fn is_dead(&self) -> bool {
        self.workers.iter().all(|w| w.thread.is_finished())
    }

    /// Stop every worker and wait for the live ones. Retired workers get a
    /// stop message too but are not waited for.
    pub(crate) fn shutdown(&mut self) {
        self.retired.retain(|w| !w.thread.is_finished());
        for _ in 0..self.workers.len() + self.retired.len() {
            // Fails only when every worker is already gone
            let _ = self.commands.send(Command::Shutdown);
        }
        self.retired.clear();
        for worker in self.workers.drain(..) {
            if worker.thread.join().is_err() {
                warn!(worker = worker.id, "worker exited abnormally");
            }
        }
        debug!("worker pool stopped");
    }
}

fn worker_loop(id: usize, queue: Receiver<Command>, events: Sender<Event>, retired: Arc<AtomicBool>) {
    debug!(worker = id, "worker started");
    while let Ok(Command::Parse(request)) = queue.recv() {
        let task_id = request.task_id;
        if events.send(Event::Started { task_id, worker: id }).is_err() {
            break;
        }
        let result = task::execute(&request);
        let response = WorkerResponse {
            task_id,
            worker: id,
            result,
        };
        if events.send(Event::Finished(response)).is_err() || retired.load(Ordering::Acquire) {
            break;
        }
    }
    debug!(worker = id, "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use holo_parser::ParserOptions;
    use std::time::Duration;

    fn request(task_id: u64, content: &str) -> WorkerRequest {
        WorkerRequest {
            task_id,
            path: format!("file{}.holo", task_id),
            content: content.to_string(),
            options: ParserOptions::default(),
        }
    }

    #[test]
    fn test_pool_answers_every_task() {
        let mut pool = WorkerPool::start(2).unwrap();
        assert_eq!(pool.size(), 2);
        for id in 0..4 {
            assert!(pool.submit(request(id, "orb \"A\" {}")));
        }

        let mut finished = Vec::new();
        while finished.len() < 4 {
            match pool.events().recv_timeout(Duration::from_secs(10)).unwrap() {
                Event::Started { .. } => {}
                Event::Finished(response) => {
                    assert!(response.result.success);
                    finished.push(response.task_id);
                }
            }
        }
        finished.sort_unstable();
        assert_eq!(finished, vec![0, 1, 2, 3]);
        pool.shutdown();
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn test_replace_keeps_pool_size() {
        let mut pool = WorkerPool::start(1).unwrap();
        pool.replace(0).unwrap();
        assert_eq!(pool.size(), 1);
        assert!(!pool.is_dead());
        pool.shutdown();
    }
}
