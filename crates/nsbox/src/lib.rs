//! Unprivileged namespace sandbox with a packet channel to the guest.
//!
//! nsbox splits the calling process into a host-side parent and a sandboxed
//! child, connects them with two pipes, and serves the guest's packets from a
//! bounded worker pool.
//!
//! # Crate Structure
//!
//! - [`transport`] - Owned pipe ends, full transfers, fail-fast policy
//! - [`frame`] - Byte buffer, packet codec and registry, the duplex `IpcChannel`
//! - [`pool`] - Bounded FIFO worker pool
//! - [`launch`] - User namespace setup and the `clone3` split
//! - [`service`] - The parent's receive/dispatch loop

/// Re-export transport types.
pub mod transport {
    pub use nsbox_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use nsbox_frame::*;
}

/// Re-export pool types.
pub mod pool {
    pub use nsbox_pool::*;
}

/// Re-export launcher types.
pub mod launch {
    pub use nsbox_launch::*;
}

pub mod service;
