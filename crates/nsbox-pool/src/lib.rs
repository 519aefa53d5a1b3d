//! Bounded worker pool for nsbox packet dispatch.
//!
//! A fixed number of worker threads drain a circular job queue. Submission
//! blocks while the queue is full; shutdown drains what was queued, joins the
//! workers and is final.

pub mod config;
pub mod error;
pub mod pool;

pub use config::{PoolConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
pub use error::{PoolError, Result};
pub use pool::{Job, WorkerPool};
