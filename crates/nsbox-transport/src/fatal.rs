//! Process-wide fail-fast policy.
//!
//! nsbox has no recoverable error channel for setup failures, protocol
//! violations or broken transfers: a desynchronized byte stream or a half-built
//! sandbox cannot be repaired. Every layer reports such conditions through
//! this module, which logs a diagnostic and aborts the detecting process.

use std::fmt::Display;
use std::io::Write;

/// Log `context: err` and abort the process.
pub fn fail_fast(context: &str, err: &dyn Display) -> ! {
    tracing::error!(context, error = %err, "fatal condition, aborting");

    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "fatal: {context}: {err}");
    let _ = stderr.flush();

    std::process::abort()
}

/// Escalate an error to [`fail_fast`].
pub trait OrFailFast<T> {
    /// Unwrap the value, or abort the process with `context` and the error text.
    fn or_fail_fast(self, context: &str) -> T;
}

impl<T, E: Display> OrFailFast<T> for Result<T, E> {
    fn or_fail_fast(self, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => fail_fast(context, &err),
        }
    }
}
