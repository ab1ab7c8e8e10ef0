//! Configuration for the configuration-space sweep.

use serde::{Deserialize, Serialize};

/// Worker pool settings for the parallel grid sweep.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Maximum worker threads. `0` uses the available hardware concurrency.
    /// Default: 0
    pub max_threads: usize,
}

impl SweepConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for the thread cap.
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    /// Number of worker threads the sweep will actually use.
    pub fn effective_threads(&self) -> usize {
        let hardware = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if self.max_threads == 0 {
            hardware
        } else {
            self.max_threads
        }
    }
}
