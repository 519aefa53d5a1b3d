//! Unprivileged namespace sandbox for nsbox.
//!
//! [`Launcher::launch`] turns the calling process into two: a parent that
//! stays in the original namespaces (apart from the new user namespace) and a
//! child that runs as a mapped root inside fresh mount, pid, ipc and network
//! namespaces. The two roles talk over a pair of pipes wired crosswise:
//!
//! ```text
//!   parent                         child
//!   read  A  <──── pipe A ─────   write A
//!   write B  ───── pipe B ────>   read  B
//! ```
//!
//! Linux only. The launcher must run while the process is still
//! single-threaded; the kernel refuses `unshare(CLONE_NEWUSER)` otherwise.

pub mod clone;
pub mod config;
pub mod error;
pub mod idmap;
pub mod launcher;
pub mod namespaces;
pub mod pipes;
pub mod signals;

pub use clone::{clone3, Fork, CLONE_CLEAR_SIGHAND};
pub use config::LaunchConfig;
pub use error::{LaunchError, Result};
pub use idmap::IdMapWriter;
pub use launcher::{ChildSetup, Launcher};
pub use namespaces::Namespaces;
pub use pipes::{CrossedPipes, RoleEnds};
