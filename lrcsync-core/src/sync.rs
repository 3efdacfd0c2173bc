use crate::lrc::LrcFile;
use crate::matcher::LyricMatcher;
use crate::playback::PlayerObservation;
use crate::tracker::{PositionTracker, TrackerEvent};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Active line and word for a playback position.
///
/// Both are `None` on the idle display: before the first line, in a gap
/// between lines, after the last line, or with no lyrics loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LyricCursor {
    pub line: Option<usize>,
    pub word: Option<usize>,
}

impl LyricCursor {
    pub const IDLE: Self = Self {
        line: None,
        word: None,
    };

    /// Locate `position` in `lyrics` by binary search.
    #[must_use]
    pub fn at(lyrics: &LrcFile, position: Duration) -> Self {
        let Some(line) = lyrics.line_index_at(position) else {
            return Self::IDLE;
        };
        Self {
            line: Some(line),
            word: lyrics.lines[line].word_index_at(position),
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.line.is_none()
    }
}

/// Lyric state of the current track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsStatus {
    /// No track is playing
    NoTrack,
    Loaded,
    /// A track is playing but no lyric file matched or it failed to load
    NotFound,
}

/// Engine that synchronizes playback state and lyrics.
///
/// Owned by the render loop: it consumes player observations, keeps the
/// position estimate, and reloads lyrics whenever the track changes.
pub struct SyncEngine {
    tracker: PositionTracker,
    matcher: LyricMatcher,
    lyrics: Option<LrcFile>,
    status: LyricsStatus,
}

impl SyncEngine {
    #[must_use]
    pub const fn new(tracker: PositionTracker, matcher: LyricMatcher) -> Self {
        Self {
            tracker,
            matcher,
            lyrics: None,
            status: LyricsStatus::NoTrack,
        }
    }

    /// Feed one player observation, reloading lyrics on track changes.
    pub async fn apply(&mut self, observation: &PlayerObservation) -> Vec<TrackerEvent> {
        let events = self.tracker.observe(observation);

        for event in &events {
            match event {
                TrackerEvent::TrackChanged { track, .. } => {
                    self.lyrics = None;
                    match self.matcher.load(track).await {
                        Ok(lyrics) => {
                            self.lyrics = Some(lyrics);
                            self.status = LyricsStatus::Loaded;
                        }
                        Err(e) if e.is_recoverable() => {
                            info!("{}", e);
                            self.status = LyricsStatus::NotFound;
                        }
                        Err(e) => {
                            warn!("Failed to load lyrics for {}: {}", track, e);
                            self.status = LyricsStatus::NotFound;
                        }
                    }
                }
                TrackerEvent::Stopped => {
                    self.lyrics = None;
                    self.status = LyricsStatus::NoTrack;
                }
                _ => {}
            }
        }

        events
    }

    /// Estimated playback position at `now`.
    #[must_use]
    pub fn position(&self, now: Instant) -> Option<Duration> {
        self.tracker.estimate(now)
    }

    /// Active line and word at `now`.
    #[must_use]
    pub fn cursor(&self, now: Instant) -> LyricCursor {
        match (&self.lyrics, self.tracker.estimate(now)) {
            (Some(lyrics), Some(position)) => LyricCursor::at(lyrics, position),
            _ => LyricCursor::IDLE,
        }
    }

    #[must_use]
    pub const fn lyrics(&self) -> Option<&LrcFile> {
        self.lyrics.as_ref()
    }

    #[must_use]
    pub const fn status(&self) -> LyricsStatus {
        self.status
    }

    #[must_use]
    pub const fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lrc::LrcFormat;
    use crate::playback::{PlaybackState, TrackId};

    fn lyrics() -> LrcFile {
        LrcFile::parse("[00:01.00]<00:01.00>one <00:02.00>two <00:03.00>\n[00:05.00]<00:05.00>three <00:06.00>\n")
            .unwrap()
    }

    #[test]
    fn test_cursor_at() {
        let lrc = lyrics();
        let at = |ms| LyricCursor::at(&lrc, Duration::from_millis(ms));
        assert!(at(500).is_idle());
        assert_eq!(at(1_000), LyricCursor { line: Some(0), word: Some(0) });
        assert_eq!(at(2_999), LyricCursor { line: Some(0), word: Some(1) });
        assert!(at(4_000).is_idle());
        assert_eq!(at(5_500), LyricCursor { line: Some(1), word: Some(0) });
        assert!(at(6_000).is_idle());
    }

    #[tokio::test]
    async fn test_engine_loads_on_track_change_and_clears_on_stop() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Band - Song.wlrc"),
            lyrics().serialize(LrcFormat::Word, &[]),
        )
        .unwrap();

        let mut engine = SyncEngine::new(
            PositionTracker::default(),
            LyricMatcher::new(dir.path(), LrcFormat::Word),
        );
        let t0 = Instant::now();
        let track = TrackId::new(None, Some("Band".into()), Some("Song".into()));
        engine
            .apply(&PlayerObservation::Playing(PlaybackState::new(
                track,
                Duration::from_millis(900),
                true,
                t0,
            )))
            .await;

        assert_eq!(engine.status(), LyricsStatus::Loaded);
        assert_eq!(
            engine.cursor(t0 + Duration::from_millis(1_200)),
            LyricCursor { line: Some(0), word: Some(1) }
        );

        engine
            .apply(&PlayerObservation::NoTrack {
                observed_at: t0 + Duration::from_secs(2),
            })
            .await;
        assert_eq!(engine.status(), LyricsStatus::NoTrack);
        assert!(engine.cursor(t0 + Duration::from_secs(2)).is_idle());
    }

    #[tokio::test]
    async fn test_engine_idle_without_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = SyncEngine::new(
            PositionTracker::default(),
            LyricMatcher::new(dir.path(), LrcFormat::Word),
        );
        let t0 = Instant::now();
        engine
            .apply(&PlayerObservation::Playing(PlaybackState::new(
                TrackId::new(None, None, Some("Unknown".into())),
                Duration::from_secs(10),
                true,
                t0,
            )))
            .await;
        assert_eq!(engine.status(), LyricsStatus::NotFound);
        assert!(engine.cursor(t0).is_idle());
    }
}
