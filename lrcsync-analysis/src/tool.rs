//! Bounded execution of external command-line tools.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::trace;

/// Failure of one tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The binary is not installed or not on `PATH`.
    #[error("{program} is not installed")]
    Missing { program: String },

    /// The tool ran longer than allowed and was killed.
    #[error("{program} timed out after {}s", timeout.as_secs_f64())]
    TimedOut { program: String, timeout: Duration },

    /// The tool exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Run `program` with `args`, returning its stdout.
///
/// The child is killed when `timeout` elapses.
///
/// # Errors
///
/// Returns [`ToolError`] when the program is missing, times out, or fails.
pub async fn run_tool(
    program: &Path,
    args: &[&OsStr],
    timeout: Duration,
) -> Result<String, ToolError> {
    let name = program.display().to_string();
    trace!("Running {} {:?}", name, args);

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ToolError::Missing {
                    program: name.clone(),
                }
            } else {
                ToolError::Io(e)
            }
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ToolError::TimedOut {
            program: name.clone(),
            timeout,
        })??;

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: name,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Look `name` up on `PATH`.
#[must_use]
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_tool_captures_stdout() {
        let out = run_tool(
            Path::new("sh"),
            &[OsStr::new("-c"), OsStr::new("echo 0.5")],
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(out.trim(), "0.5");
    }

    #[tokio::test]
    async fn test_run_tool_missing_binary() {
        let err = run_tool(
            Path::new("lrcsync-no-such-tool"),
            &[],
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Missing { .. }));
    }

    #[tokio::test]
    async fn test_run_tool_failure_status() {
        let err = run_tool(
            Path::new("sh"),
            &[OsStr::new("-c"), OsStr::new("echo oops >&2; exit 3")],
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Failed { ref stderr, .. } if stderr == "oops"));
    }

    #[tokio::test]
    async fn test_run_tool_timeout() {
        let err = run_tool(
            Path::new("sh"),
            &[OsStr::new("-c"), OsStr::new("sleep 5")],
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::TimedOut { .. }));
    }

    #[test]
    fn test_find_in_path() {
        assert!(find_in_path("sh").is_some());
        assert!(find_in_path("lrcsync-no-such-tool").is_none());
    }
}
