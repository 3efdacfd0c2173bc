use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Lyric file errors
    #[error("Malformed timestamp '{tag}' on line {line}")]
    MalformedTimestamp { line: usize, tag: String },

    #[error("Line '{text}' has an empty or invalid duration")]
    EmptyOrInvalidDuration { text: String },

    #[error("No valid lines in {}", path.display())]
    NoLyricLines { path: PathBuf },

    #[error("{} already contains word-level timing", path.display())]
    AlreadyWordLevel { path: PathBuf },

    // External capabilities (non-fatal, callers degrade)
    #[error("Onset detection unavailable: {reason}")]
    OnsetCapabilityUnavailable { reason: String },

    #[error("Audio probe failed: {reason}")]
    AudioProbeFailed { reason: String },

    #[error("Media player unreachable: {reason}")]
    PlayerUnreachable { reason: String },

    #[error("No lyric file matches track {track}")]
    NoMatchingLyricFile { track: String },

    // Startup errors (fatal)
    #[error("Config file not found at {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigJsonError(#[source] serde_json::Error),

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Invalid argument: {message}")]
    InvalidCliArgument { message: String },

    #[error("Failed to parse font table {}: {source}", path.display())]
    FontParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown font '{name}' (available: {available})")]
    UnknownFont { name: String, available: String },

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CoreError {
    /// Whether the error only degrades behavior instead of stopping a run.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OnsetCapabilityUnavailable { .. }
                | Self::AudioProbeFailed { .. }
                | Self::PlayerUnreachable { .. }
                | Self::NoMatchingLyricFile { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
