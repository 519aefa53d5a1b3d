use std::path::Path;

use nsbox_transport::{OrFailFast, PipeReader, PipeWriter};
use tracing::{debug, info, info_span};

use crate::clone::{clone3, Fork, CLONE_CLEAR_SIGHAND};
use crate::config::LaunchConfig;
use crate::error::{LaunchError, Result};
use crate::idmap::IdMapWriter;
use crate::pipes::CrossedPipes;
use crate::signals::{exit_on_signal, set_parent_death_signal};

/// Hook run inside the child after it entered its namespaces, before the
/// child entry point. Populating the mount namespace belongs here.
pub type ChildSetup = Box<dyn FnOnce() -> std::io::Result<()>>;

/// Builds the sandbox and splits the process into parent and child roles.
pub struct Launcher {
    config: LaunchConfig,
    id_maps: IdMapWriter,
    child_setup: Option<ChildSetup>,
}

impl Launcher {
    pub fn new(config: LaunchConfig) -> Self {
        Self {
            config,
            id_maps: IdMapWriter::new(),
            child_setup: None,
        }
    }

    /// True if this kernel exposes user namespaces.
    pub fn is_supported() -> bool {
        Path::new("/proc/self/ns/user").exists()
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Run `setup` in the child before its entry point. A failure is fatal.
    pub fn with_child_setup<F>(mut self, setup: F) -> Self
    where
        F: FnOnce() -> std::io::Result<()> + 'static,
    {
        self.child_setup = Some(Box::new(setup));
        self
    }

    /// Build the sandbox, split, and run one entry point per process.
    ///
    /// The parent calls `parent(child_pid, read_a, write_b)` and the child
    /// calls `child(read_b, write_a)`; each process exits with its entry
    /// point's return value. The parent also exits with status 0 as soon as
    /// the child terminates, and the child as soon as the parent dies.
    ///
    /// Any failure while building the sandbox aborts the process with a
    /// diagnostic naming the failed step. Must be called while the process
    /// is single-threaded.
    pub fn launch<P, C>(self, parent: P, child: C) -> !
    where
        P: FnOnce(libc::pid_t, PipeReader, PipeWriter) -> i32,
        C: FnOnce(PipeReader, PipeWriter) -> i32,
    {
        let Self {
            config,
            id_maps,
            child_setup,
        } = self;
        config.validate().or_fail_fast("launch config");

        // SAFETY: getuid/getgid cannot fail.
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };

        enter_user_namespace().or_fail_fast("unshare(CLONE_NEWUSER)");
        id_maps.map_root(uid, gid).or_fail_fast("id map");
        let pipes = CrossedPipes::new().or_fail_fast("pipe");

        // Must precede the split: the child may exit before the parent runs
        // again. CLONE_CLEAR_SIGHAND resets it in the child.
        exit_on_signal(libc::SIGCHLD).or_fail_fast("sigaction(SIGCHLD)");

        info!(
            uid,
            gid,
            namespaces = ?config.namespaces.names(),
            "entering sandbox"
        );
        let flags = config.namespaces.clone_flags() | CLONE_CLEAR_SIGHAND;
        // SAFETY: the caller guarantees the process is single-threaded.
        let split = unsafe { clone3(flags) }.or_fail_fast("clone3");

        let (parent_ends, child_ends) = pipes.into_ends();
        let code = match split {
            Fork::Parent { child: pid } => {
                drop(child_ends);
                let _role =
                    info_span!("sandbox", role = "parent", pid = std::process::id()).entered();
                debug!(child = pid, "parent role started");
                parent(pid, parent_ends.read, parent_ends.write)
            }
            Fork::Child => {
                // Both roles share one stderr from here on.
                let _role =
                    info_span!("sandbox", role = "child", pid = std::process::id()).entered();
                arm_death_signal(config.death_signal).or_fail_fast("parent death signal");
                drop(parent_ends);

                if let Some(hostname) = &config.hostname {
                    set_hostname(hostname).or_fail_fast("sethostname");
                }
                if let Some(setup) = child_setup {
                    setup()
                        .map_err(LaunchError::ChildSetup)
                        .or_fail_fast("child setup");
                }
                child(child_ends.read, child_ends.write)
            }
        };

        std::process::exit(code)
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new(LaunchConfig::default())
    }
}

fn enter_user_namespace() -> Result<()> {
    // SAFETY: unshare only affects the calling process.
    if unsafe { libc::unshare(libc::CLONE_NEWUSER) } != 0 {
        return Err(LaunchError::UserNamespace(std::io::Error::last_os_error()));
    }
    Ok(())
}

fn arm_death_signal(signal: i32) -> Result<()> {
    set_parent_death_signal(signal)?;
    if signal != libc::SIGKILL {
        exit_on_signal(signal)?;
    }
    Ok(())
}

fn set_hostname(hostname: &str) -> Result<()> {
    // SAFETY: the pointer and length describe `hostname`'s bytes.
    let rc = unsafe { libc::sethostname(hostname.as_ptr().cast(), hostname.len()) };
    if rc != 0 {
        return Err(LaunchError::Hostname(std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::Namespaces;

    #[test]
    fn child_setup_is_stored() {
        let launcher = Launcher::default().with_child_setup(|| Ok(()));
        assert!(launcher.child_setup.is_some());
        assert_eq!(launcher.config().namespaces, Namespaces::default());
    }

    #[test]
    fn support_probe_matches_procfs() {
        assert_eq!(
            Launcher::is_supported(),
            Path::new("/proc/self/ns/user").exists()
        );
    }
}
