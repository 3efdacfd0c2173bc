use crate::tool::{find_in_path, run_tool};
use async_trait::async_trait;
use lrcsync_core::time::secs_to_duration;
use lrcsync_core::{AudioProbe, CoreError};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const FFPROBE_PROGRAM: &str = "ffprobe";

const FFPROBE_ARGS: [&str; 6] = [
    "-v",
    "error",
    "-show_entries",
    "format=duration",
    "-of",
    "default=noprint_wrappers=1:nokey=1",
];

/// [`AudioProbe`] that reads the container duration with `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: PathBuf,
    timeout: Duration,
}

impl FfprobeProbe {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: PathBuf::from(FFPROBE_PROGRAM),
            timeout,
        }
    }

    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Build a probe when `ffprobe` is installed.
    #[must_use]
    pub fn locate(timeout: Duration) -> Option<Self> {
        find_in_path(FFPROBE_PROGRAM).map(|program| Self::new(timeout).with_program(program))
    }
}

#[async_trait]
impl AudioProbe for FfprobeProbe {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn duration(&self, audio: &Path) -> lrcsync_core::Result<Duration> {
        let mut args: Vec<&OsStr> = FFPROBE_ARGS.iter().map(OsStr::new).collect();
        args.push(audio.as_os_str());

        let stdout = run_tool(&self.program, &args, self.timeout)
            .await
            .map_err(|e| CoreError::AudioProbeFailed {
                reason: e.to_string(),
            })?;

        parse_duration(&stdout).ok_or_else(|| CoreError::AudioProbeFailed {
            reason: format!(
                "no duration reported for {}: '{}'",
                audio.display(),
                stdout.trim()
            ),
        })
    }
}

/// Parse the first line of ffprobe's duration output (`N/A` yields `None`).
#[must_use]
pub fn parse_duration(output: &str) -> Option<Duration> {
    let secs = output.lines().next()?.trim().parse::<f64>().ok()?;
    if secs <= 0.0 {
        return None;
    }
    secs_to_duration(secs)
}
