//! [`PlayerSource`] backed by the `playerctl` command.

use crate::error::{PlayerctlError, Result};
use async_trait::async_trait;
use lrcsync_core::{PlaybackState, PlayerSource, TrackId};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::trace;

const FIELD_SEPARATOR: &str = "|||";

/// Everything one query needs, in a single `playerctl` call.
const METADATA_FORMAT: &str =
    "{{status}}|||{{position}}|||{{xesam:url}}|||{{artist}}|||{{title}}";

/// Queries an MPRIS player through `playerctl metadata`.
///
/// The observation instant is the midpoint of the call, so half of the
/// process round-trip is attributed to the position the player reported.
#[derive(Debug, Clone)]
pub struct PlayerctlSource {
    program: PathBuf,
    player: Option<String>,
}

impl PlayerctlSource {
    /// Query `player`, or whichever player `playerctl` picks when `None`.
    #[must_use]
    pub fn new(player: Option<String>) -> Self {
        Self {
            program: PathBuf::from("playerctl"),
            player,
        }
    }

    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if let Some(player) = &self.player {
            args.push(format!("--player={player}"));
        }
        args.push("metadata".to_string());
        args.push("--format".to_string());
        args.push(METADATA_FORMAT.to_string());
        args
    }

    /// Run `playerctl`, returning `None` when no player is running.
    async fn run(&self) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PlayerctlError::NotInstalled
                } else {
                    PlayerctlError::Io(e)
                }
            })?;

        if output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()));
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if is_no_player_message(&stderr) {
            return Ok(None);
        }
        Err(PlayerctlError::CommandFailed { stderr })
    }
}

#[async_trait]
impl PlayerSource for PlayerctlSource {
    fn name(&self) -> &'static str {
        "playerctl"
    }

    async fn query(&self) -> lrcsync_core::Result<Option<PlaybackState>> {
        let started = Instant::now();
        let output = self.run().await?;
        let observed_at = started + started.elapsed() / 2;

        let Some(stdout) = output else {
            trace!("playerctl: no players");
            return Ok(None);
        };
        Ok(parse_metadata(&stdout, observed_at)?)
    }
}

fn is_no_player_message(stderr: &str) -> bool {
    stderr.contains("No players found") || stderr.contains("No player could handle")
}

/// Parse one line of [`METADATA_FORMAT`] output.
///
/// A stopped player, or one that reports nothing identifying a track,
/// yields `None`.
///
/// # Errors
///
/// Returns [`PlayerctlError::UnexpectedOutput`] if a field is missing or the
/// status or position can not be read.
pub fn parse_metadata(output: &str, observed_at: Instant) -> Result<Option<PlaybackState>> {
    let line = output.trim_end_matches(['\n', '\r']);
    let unexpected = || PlayerctlError::UnexpectedOutput {
        output: line.to_string(),
    };

    let mut fields = line.splitn(5, FIELD_SEPARATOR);
    let (Some(status), Some(position), Some(url), Some(artist), Some(title)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(unexpected());
    };

    let is_playing = match status.trim() {
        "Playing" => true,
        "Paused" => false,
        "Stopped" => return Ok(None),
        _ => return Err(unexpected()),
    };

    let position = match position.trim() {
        "" => Duration::ZERO,
        micros => Duration::from_micros(micros.parse::<u64>().map_err(|_| unexpected())?),
    };

    let track = TrackId::new(
        path_from_url(url.trim()),
        Some(artist.trim().to_string()),
        Some(title.trim().to_string()),
    );
    if track == TrackId::default() {
        return Ok(None);
    }

    Ok(Some(PlaybackState::new(
        track,
        position,
        is_playing,
        observed_at,
    )))
}

/// Local path of a `file://` URL, percent-decoded.
fn path_from_url(url: &str) -> Option<PathBuf> {
    let encoded = url.strip_prefix("file://")?;
    let decoded = urlencoding::decode(encoded).ok()?;
    Some(PathBuf::from(decoded.into_owned()))
}
