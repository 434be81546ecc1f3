//! Progress reporting.

use serde::{Deserialize, Serialize};

/// Emitted after every file completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub total: usize,
    /// Files finished so far, failed ones included
    pub completed: usize,
    pub failed: usize,
    pub current_file: String,
    /// 0.0 to 100.0
    pub percentage: f64,
}

impl ProgressEvent {
    pub fn new(total: usize, completed: usize, failed: usize, current_file: impl Into<String>) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            completed as f64 * 100.0 / total as f64
        };
        Self {
            total,
            completed,
            failed,
            current_file: current_file.into(),
            percentage,
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

/// Callback receiving progress events.
pub type ProgressCallback = Box<dyn FnMut(&ProgressEvent) + Send>;

/// Counts completions and forwards events to the callback, if any.
pub(crate) struct ProgressTracker<'a> {
    total: usize,
    completed: usize,
    failed: usize,
    callback: Option<&'a mut ProgressCallback>,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(total: usize, callback: Option<&'a mut ProgressCallback>) -> Self {
        Self {
            total,
            completed: 0,
            failed: 0,
            callback,
        }
    }

    pub(crate) fn record(&mut self, file: &str, success: bool) {
        self.completed += 1;
        if !success {
            self.failed += 1;
        }
        if let Some(callback) = self.callback.as_deref_mut() {
            callback(&ProgressEvent::new(self.total, self.completed, self.failed, file));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_percentage() {
        let event = ProgressEvent::new(4, 1, 0, "a.holo");
        assert!((event.percentage - 25.0).abs() < f64::EPSILON);
        assert!(!event.is_done());
        assert!(ProgressEvent::new(0, 0, 0, "").is_done());
    }

    #[test]
    fn test_tracker_counts_failures() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut callback: ProgressCallback = Box::new(move |event| sink.lock().unwrap().push(event.clone()));

        let mut tracker = ProgressTracker::new(2, Some(&mut callback));
        tracker.record("a.holo", true);
        tracker.record("b.holo", false);

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].completed, 2);
        assert_eq!(events[1].failed, 1);
        assert_eq!(events[1].current_file, "b.holo");
        assert!(events[1].is_done());
    }
}
