use crate::error::{LaunchError, Result};

extern "C" fn exit_immediately(_signal: libc::c_int) {
    // SAFETY: `_exit` is async-signal-safe.
    unsafe { libc::_exit(0) }
}

/// Terminate the process with status 0 as soon as `signal` arrives.
///
/// Nothing is flushed or unwound; transfers in flight are abandoned.
pub fn exit_on_signal(signal: i32) -> Result<()> {
    // SAFETY: an all-zero `sigaction` is a valid starting value.
    let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
    action.sa_sigaction = exit_immediately as extern "C" fn(libc::c_int) as libc::sighandler_t;

    // SAFETY: `action` is initialized and outlives both calls.
    let rc = unsafe {
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(signal, &action, std::ptr::null_mut())
    };
    if rc != 0 {
        return Err(LaunchError::Signal {
            signal,
            source: std::io::Error::last_os_error(),
        });
    }
    Ok(())
}

/// Ask the kernel to send `signal` to this process when its parent dies.
pub fn set_parent_death_signal(signal: i32) -> Result<()> {
    // SAFETY: PR_SET_PDEATHSIG takes a single integer argument.
    let rc = unsafe { libc::prctl(libc::PR_SET_PDEATHSIG, signal as libc::c_ulong) };
    if rc != 0 {
        return Err(LaunchError::DeathSignal(std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run `body` in a forked child and return its exit status.
    fn in_child(body: fn() -> i32) -> i32 {
        // SAFETY: the child only runs `body`, which calls async-signal-safe functions.
        let pid = unsafe { libc::fork() };
        assert!(pid >= 0, "fork failed");
        if pid == 0 {
            unsafe { libc::_exit(body()) }
        }

        let mut status = 0;
        // SAFETY: `pid` is our own child.
        assert_eq!(unsafe { libc::waitpid(pid, &mut status, 0) }, pid);
        assert!(libc::WIFEXITED(status));
        libc::WEXITSTATUS(status)
    }

    #[test]
    fn handler_exits_with_zero() {
        let status = in_child(|| {
            if exit_on_signal(libc::SIGUSR2).is_err() {
                return 2;
            }
            unsafe { libc::raise(libc::SIGUSR2) };
            3
        });
        assert_eq!(status, 0);
    }

    #[test]
    fn death_signal_is_recorded() {
        let status = in_child(|| {
            if set_parent_death_signal(libc::SIGUSR1).is_err() {
                return 2;
            }
            let mut signal: libc::c_int = 0;
            unsafe { libc::prctl(libc::PR_GET_PDEATHSIG, &mut signal as *mut libc::c_int) };
            if signal == libc::SIGUSR1 {
                0
            } else {
                4
            }
        });
        assert_eq!(status, 0);
    }

    #[test]
    fn invalid_signal_rejected() {
        assert!(matches!(
            exit_on_signal(libc::SIGKILL),
            Err(LaunchError::Signal { signal, .. }) if signal == libc::SIGKILL
        ));
    }
}
