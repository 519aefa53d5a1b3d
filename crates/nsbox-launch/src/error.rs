use std::path::PathBuf;

use nsbox_transport::TransportError;

/// Errors that can occur while building the sandbox.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The launch configuration is inconsistent.
    #[error("invalid launch config: {0}")]
    InvalidConfig(String),

    /// `unshare(CLONE_NEWUSER)` was refused.
    #[error("failed to enter a new user namespace: {0}")]
    UserNamespace(std::io::Error),

    /// Writing one of the id-map pseudo-files failed.
    #[error("failed to write {path}: {source}")]
    IdMap {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Creating the crosswise pipes failed.
    #[error(transparent)]
    Pipe(#[from] TransportError),

    /// The `clone3` process split failed.
    #[error("clone3 failed: {0}")]
    Clone(std::io::Error),

    /// Installing a signal handler failed.
    #[error("failed to install handler for signal {signal}: {source}")]
    Signal {
        signal: i32,
        source: std::io::Error,
    },

    /// `prctl(PR_SET_PDEATHSIG)` failed.
    #[error("failed to set parent death signal: {0}")]
    DeathSignal(std::io::Error),

    /// `sethostname` failed inside the UTS namespace.
    #[error("failed to set hostname: {0}")]
    Hostname(std::io::Error),

    /// The caller-supplied child setup hook failed.
    #[error("child setup failed: {0}")]
    ChildSetup(std::io::Error),
}

pub type Result<T> = std::result::Result<T, LaunchError>;
