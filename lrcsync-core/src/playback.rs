use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Identity of the track a player reports.
///
/// Two observations refer to the same track when all three fields are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TrackId {
    /// Local file backing the track, when the player exposes one
    pub path: Option<PathBuf>,
    pub artist: Option<String>,
    pub title: Option<String>,
}

impl TrackId {
    #[must_use]
    pub fn new(path: Option<PathBuf>, artist: Option<String>, title: Option<String>) -> Self {
        Self {
            path,
            artist: artist.filter(|a| !a.trim().is_empty()),
            title: title.filter(|t| !t.trim().is_empty()),
        }
    }

    /// File stem of the track's path, if any.
    #[must_use]
    pub fn stem(&self) -> Option<&str> {
        self.path.as_ref()?.file_stem()?.to_str()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.artist, &self.title, &self.path) {
            (Some(artist), Some(title), _) => write!(f, "{artist} - {title}"),
            (None, Some(title), _) => f.write_str(title),
            (_, None, Some(path)) => write!(f, "{}", path.display()),
            (Some(artist), None, None) => write!(f, "{artist} - (untitled)"),
            (None, None, None) => f.write_str("(unknown track)"),
        }
    }
}

/// One sample of the player's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub track: TrackId,
    /// Raw position reported by the player
    pub position: Duration,
    pub is_playing: bool,
    /// When the sample was taken
    pub observed_at: Instant,
}

impl PlaybackState {
    #[must_use]
    pub const fn new(
        track: TrackId,
        position: Duration,
        is_playing: bool,
        observed_at: Instant,
    ) -> Self {
        Self {
            track,
            position,
            is_playing,
            observed_at,
        }
    }
}

/// Outcome of one player poll, as published to the render loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerObservation {
    /// A player reported a track
    Playing(PlaybackState),
    /// The player is reachable but has no track loaded
    NoTrack { observed_at: Instant },
    /// The player query failed or timed out
    Unreachable { observed_at: Instant },
}

impl PlayerObservation {
    #[must_use]
    pub const fn observed_at(&self) -> Instant {
        match self {
            Self::Playing(state) => state.observed_at,
            Self::NoTrack { observed_at } | Self::Unreachable { observed_at } => *observed_at,
        }
    }
}
