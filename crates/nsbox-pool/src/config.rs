use crate::error::{PoolError, Result};

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 4;

/// Default declared queue capacity. One slot is always left empty, so the
/// queue holds at most `queue_capacity - 1` jobs.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Configuration for a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Declared capacity of the circular job queue.
    pub queue_capacity: usize,
}

impl PoolConfig {
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            workers,
            queue_capacity,
        }
    }

    /// Jobs that can wait in the queue at once.
    pub fn usable_capacity(&self) -> usize {
        self.queue_capacity.saturating_sub(1)
    }

    /// Reject configurations that cannot produce a working pool.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PoolError::InvalidConfig(
                "at least one worker is required".to_string(),
            ));
        }
        if self.queue_capacity < 2 {
            return Err(PoolError::InvalidConfig(format!(
                "queue capacity must be at least 2 (got {})",
                self.queue_capacity
            )));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_leaves_one_slot_unused() {
        let config = PoolConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.usable_capacity(), 15);
    }

    #[test]
    fn rejects_unusable_configs() {
        assert!(PoolConfig::new(0, 16).validate().is_err());
        assert!(PoolConfig::new(1, 1).validate().is_err());
        assert!(PoolConfig::new(1, 0).validate().is_err());
        assert!(PoolConfig::new(1, 2).validate().is_ok());
    }
}
