//! Owned pipe transport for nsbox.
//!
//! This is the lowest layer. It provides:
//! - [`PipeReader`] / [`PipeWriter`]: the two ends of a unidirectional pipe
//! - [`read_full`] / [`write_full`]: transfers that retry short and interrupted I/O
//! - [`fatal`]: the process-wide fail-fast policy used by every layer above
//!
//! Everything else builds on the descriptors provided here.

pub mod error;
pub mod fatal;
pub mod io;
pub mod stream;

pub use error::{Result, TransportError};
pub use fatal::{fail_fast, OrFailFast};
pub use io::{read_full, write_full};
pub use stream::{pipe, PipeReader, PipeWriter};
