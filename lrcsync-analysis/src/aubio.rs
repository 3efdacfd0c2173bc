//! Onset detection with `aubioonset`.

use crate::tool::{find_in_path, run_tool};
use async_trait::async_trait;
use lrcsync_core::time::secs_to_duration;
use lrcsync_core::{CoreError, OnsetDetector};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Name of the aubio onset binary
pub const AUBIO_ONSET_PROGRAM: &str = "aubioonset";

/// [`OnsetDetector`] backed by `aubioonset -i <file>`.
#[derive(Debug, Clone)]
pub struct AubioOnsetDetector {
    program: PathBuf,
    timeout: Duration,
}

impl AubioOnsetDetector {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: PathBuf::from(AUBIO_ONSET_PROGRAM),
            timeout,
        }
    }

    /// Use a specific binary instead of `aubioonset` from `PATH`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Build a detector when `aubioonset` is installed.
    #[must_use]
    pub fn locate(timeout: Duration) -> Option<Self> {
        find_in_path(AUBIO_ONSET_PROGRAM).map(|program| Self::new(timeout).with_program(program))
    }
}

#[async_trait]
impl OnsetDetector for AubioOnsetDetector {
    fn name(&self) -> &'static str {
        "aubio"
    }

    async fn detect(&self, audio: &Path) -> lrcsync_core::Result<Vec<Duration>> {
        let stdout = run_tool(
            &self.program,
            &[OsStr::new("-i"), audio.as_os_str()],
            self.timeout,
        )
        .await
        .map_err(|e| CoreError::OnsetCapabilityUnavailable {
            reason: e.to_string(),
        })?;

        let onsets = parse_onsets(&stdout);
        debug!("aubioonset reported {} onsets for {}", onsets.len(), audio.display());
        Ok(onsets)
    }
}

/// Parse one onset time in seconds per line, ignoring anything else.
#[must_use]
pub fn parse_onsets(output: &str) -> Vec<Duration> {
    output
        .lines()
        .filter_map(|line| line.trim().parse::<f64>().ok())
        .filter_map(secs_to_duration)
        .collect()
}
