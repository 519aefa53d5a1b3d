/// Errors that can occur in pipe transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Creating the pipe pair failed.
    #[error("failed to create pipe: {0}")]
    Pipe(std::io::Error),

    /// An I/O error occurred on the pipe.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed its end before the transfer completed.
    #[error("stream closed after {transferred} of {expected} bytes")]
    Closed { expected: usize, transferred: usize },
}

impl TransportError {
    /// True when the stream hit EOF before a single byte of the transfer moved.
    pub fn is_clean_close(&self) -> bool {
        matches!(self, TransportError::Closed { transferred: 0, .. })
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
