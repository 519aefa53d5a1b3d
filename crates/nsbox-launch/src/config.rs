use crate::error::{LaunchError, Result};
use crate::namespaces::Namespaces;

/// Longest hostname the kernel accepts (`HOST_NAME_MAX`).
const HOST_NAME_MAX: usize = 64;

/// Highest signal number on Linux (`_NSIG - 1`).
const MAX_SIGNAL: i32 = 64;

/// Launch configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Namespaces the child is cloned into.
    pub namespaces: Namespaces,

    /// Signal delivered to the child when the parent dies; the child exits on it.
    /// `SIGKILL` is accepted and needs no handler.
    pub death_signal: i32,

    /// Hostname applied inside the child. Requires `namespaces.uts`.
    pub hostname: Option<String>,
}

impl LaunchConfig {
    /// Check the configuration before anything irreversible happens.
    pub fn validate(&self) -> Result<()> {
        if self.death_signal <= 0 || self.death_signal > MAX_SIGNAL {
            return Err(LaunchError::InvalidConfig(format!(
                "death signal {} is not a valid signal number",
                self.death_signal
            )));
        }
        if self.death_signal == libc::SIGSTOP {
            return Err(LaunchError::InvalidConfig(
                "death signal cannot be SIGSTOP".to_string(),
            ));
        }

        if let Some(hostname) = &self.hostname {
            if !self.namespaces.uts {
                return Err(LaunchError::InvalidConfig(
                    "a hostname requires the uts namespace".to_string(),
                ));
            }
            if hostname.is_empty() || hostname.len() > HOST_NAME_MAX {
                return Err(LaunchError::InvalidConfig(format!(
                    "hostname must be 1..={HOST_NAME_MAX} bytes"
                )));
            }
        }
        Ok(())
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            namespaces: Namespaces::default(),
            death_signal: libc::SIGUSR1,
            hostname: None,
        }
    }
}
