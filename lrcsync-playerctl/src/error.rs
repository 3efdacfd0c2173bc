use lrcsync_core::CoreError;
use thiserror::Error;

/// Errors from talking to `playerctl`.
#[derive(Debug, Error)]
pub enum PlayerctlError {
    /// The `playerctl` binary is not installed.
    #[error("playerctl is not installed")]
    NotInstalled,

    /// `playerctl` exited unsuccessfully for a reason other than "no players".
    #[error("playerctl failed: {stderr}")]
    CommandFailed { stderr: String },

    /// `playerctl` answered with something that is not the requested format.
    #[error("Unexpected playerctl output: '{output}'")]
    UnexpectedOutput { output: String },

    /// Failed to spawn or wait for the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PlayerctlError> for CoreError {
    fn from(e: PlayerctlError) -> Self {
        Self::PlayerUnreachable {
            reason: e.to_string(),
        }
    }
}

/// Convenience type alias for Results with `PlayerctlError`.
pub type Result<T> = std::result::Result<T, PlayerctlError>;
