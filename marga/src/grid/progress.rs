//! Progress observers for the grid sweep.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;

/// Receives the completed-cell count after every finished batch (grid row).
///
/// Called from worker threads, one call at a time; successive counts are
/// strictly increasing and the last one equals the total.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

/// Observer that logs about `updates` progress lines per sweep.
#[derive(Debug)]
pub struct LogProgress {
    updates: usize,
    last_bucket: AtomicUsize,
}

impl LogProgress {
    pub fn new(updates: usize) -> Self {
        Self {
            updates: updates.max(1),
            last_bucket: AtomicUsize::new(0),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(25)
    }
}

impl ProgressObserver for LogProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        if total == 0 {
            return;
        }
        let bucket = completed * self.updates / total;
        if self.last_bucket.fetch_max(bucket, Ordering::Relaxed) < bucket {
            info!(
                "[Grid] Configuration space: {}/{} cells ({:.0}%)",
                completed,
                total,
                100.0 * completed as f64 / total as f64
            );
        }
    }
}
