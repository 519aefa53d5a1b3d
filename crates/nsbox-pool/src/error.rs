/// Errors that can occur in worker pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The configuration cannot produce a working pool.
    #[error("invalid pool config: {0}")]
    InvalidConfig(String),

    /// A worker thread could not be started.
    #[error("failed to spawn worker {index}: {source}")]
    Spawn {
        index: usize,
        source: std::io::Error,
    },

    /// The pool has been shut down and accepts no more jobs.
    #[error("submit called after shutdown")]
    Shutdown,

    /// A worker thread terminated by panicking.
    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}

pub type Result<T> = std::result::Result<T, PoolError>;
