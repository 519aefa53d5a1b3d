use tracing::debug;

use crate::error::{LaunchError, Result};

/// Reset all signal handlers in the new process to their defaults (Linux 5.5+).
pub const CLONE_CLEAR_SIGHAND: u64 = 0x1_0000_0000;

/// `struct clone_args` from `<linux/sched.h>` (CLONE_ARGS_SIZE_VER2).
#[repr(C)]
#[derive(Debug, Default)]
struct CloneArgs {
    flags: u64,
    pidfd: u64,
    child_tid: u64,
    parent_tid: u64,
    exit_signal: u64,
    stack: u64,
    stack_size: u64,
    tls: u64,
    set_tid: u64,
    set_tid_size: u64,
    cgroup: u64,
}

/// Which side of a process split the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fork {
    /// The original process; `child` is the new process id as seen from here.
    Parent { child: libc::pid_t },
    /// The new process.
    Child,
}

/// Duplicate the process with `clone3(2)`, fork-style, applying `flags` atomically.
///
/// The child is reported to the parent with `SIGCHLD` and runs on a
/// copy-on-write image of the parent's stack.
///
/// # Safety
///
/// Only the calling thread exists in the child. The caller must ensure no
/// other thread holds a lock or state the child goes on to use.
pub unsafe fn clone3(flags: u64) -> Result<Fork> {
    let mut args = CloneArgs {
        flags,
        exit_signal: libc::SIGCHLD as u64,
        ..CloneArgs::default()
    };

    let rc = libc::syscall(
        libc::SYS_clone3,
        &mut args as *mut CloneArgs,
        std::mem::size_of::<CloneArgs>(),
    );

    match rc {
        -1 => Err(LaunchError::Clone(std::io::Error::last_os_error())),
        0 => Ok(Fork::Child),
        pid => {
            debug!(pid, flags = format_args!("{flags:#x}"), "clone3 split");
            Ok(Fork::Parent {
                child: pid as libc::pid_t,
            })
        }
    }
}
