use std::fmt;

use nsbox::frame::FrameError;
use nsbox::launch::LaunchError;
use nsbox::pool::PoolError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const USAGE: i32 = 64;
/// `EX_UNAVAILABLE`: the host cannot build the sandbox.
pub const SANDBOX_UNAVAILABLE: i32 = 69;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    let code = match err {
        FrameError::Disconnected
        | FrameError::ConnectionClosed
        | FrameError::Transport(_)
        | FrameError::LengthOutOfBounds(_)
        | FrameError::UnknownPacketId(_) => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn pool_error(context: &str, err: PoolError) -> CliError {
    let code = match err {
        PoolError::InvalidConfig(_) => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn launch_error(context: &str, err: LaunchError) -> CliError {
    let code = match err {
        LaunchError::InvalidConfig(_) => USAGE,
        LaunchError::UserNamespace(_) => SANDBOX_UNAVAILABLE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_usage_errors() {
        let err = pool_error("pool", PoolError::InvalidConfig("workers".into()));
        assert_eq!(err.code, USAGE);
        assert!(err.message.starts_with("pool: "));

        let err = launch_error("launch", LaunchError::InvalidConfig("hostname".into()));
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn peer_failures_are_plain_failures() {
        assert_eq!(frame_error("probe", FrameError::Disconnected).code, FAILURE);
        assert_eq!(frame_error("probe", FrameError::UnknownPacketId(9)).code, FAILURE);
        assert_eq!(frame_error("probe", FrameError::Poisoned("read")).code, INTERNAL);
    }
}
