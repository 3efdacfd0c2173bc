//! Playback position estimation.
//!
//! The [`PositionTracker`] turns sparse, jittery player samples into a
//! continuous position estimate. Between samples the estimate advances with
//! wall-clock time; each sample either snaps the estimate (seek, pause,
//! resume, track change) or nudges it toward the reported position.

use crate::config::VisualizerConfig;
use crate::playback::{PlaybackState, PlayerObservation, TrackId};
use crate::time::DurationExt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Events emitted while tracking playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// A different track is now playing (or paused)
    TrackChanged { track: TrackId, position: Duration },
    /// The player no longer reports a track
    Stopped,
    /// The position jumped further than interpolation error allows
    Seeked { from: Duration, to: Duration },
    Paused { position: Duration },
    Resumed { position: Duration },
    /// The player stopped answering; the estimate is frozen
    PlayerLost,
    PlayerRestored,
}

/// Tracker tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    pub seek_threshold: Duration,
    /// Fraction of the observed drift applied per sample, in `(0, 1]`
    pub drift_correction: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            seek_threshold: Duration::from_secs(1),
            drift_correction: 0.5,
        }
    }
}

impl From<&VisualizerConfig> for TrackerSettings {
    fn from(config: &VisualizerConfig) -> Self {
        Self {
            seek_threshold: config.seek_threshold(),
            drift_correction: config.drift_correction,
        }
    }
}

/// Continuously-estimated playback position for the current track.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    settings: TrackerSettings,
    track: Option<TrackId>,
    anchor_position: Duration,
    anchor_at: Option<Instant>,
    playing: bool,
    lost: bool,
}

impl PositionTracker {
    #[must_use]
    pub const fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            track: None,
            anchor_position: Duration::ZERO,
            anchor_at: None,
            playing: false,
            lost: false,
        }
    }

    #[must_use]
    pub const fn track(&self) -> Option<&TrackId> {
        self.track.as_ref()
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing && !self.lost
    }

    #[must_use]
    pub const fn is_player_lost(&self) -> bool {
        self.lost
    }

    /// Estimated position at `now`, or `None` when no track is known.
    ///
    /// While playing the estimate advances with elapsed time; while paused or
    /// while the player is unreachable it stays frozen.
    #[must_use]
    pub fn estimate(&self, now: Instant) -> Option<Duration> {
        self.track.as_ref()?;
        Some(self.estimate_unchecked(now))
    }

    fn estimate_unchecked(&self, now: Instant) -> Duration {
        match self.anchor_at {
            Some(at) if self.is_playing() => {
                self.anchor_position + now.saturating_duration_since(at)
            }
            _ => self.anchor_position,
        }
    }

    /// Feed one poll result and return the events it causes.
    pub fn observe(&mut self, observation: &PlayerObservation) -> Vec<TrackerEvent> {
        match observation {
            PlayerObservation::Unreachable { observed_at } => self.on_unreachable(*observed_at),
            PlayerObservation::NoTrack { .. } => {
                let mut events = self.restore();
                self.playing = false;
                if self.track.take().is_some() {
                    info!("Playback stopped");
                    events.push(TrackerEvent::Stopped);
                }
                events
            }
            PlayerObservation::Playing(state) => {
                let mut events = self.restore();
                events.extend(self.on_sample(state));
                events
            }
        }
    }

    fn on_unreachable(&mut self, at: Instant) -> Vec<TrackerEvent> {
        if self.lost {
            return Vec::new();
        }
        // Freeze at the current estimate before marking the player lost
        self.anchor_position = self.estimate_unchecked(at);
        self.anchor_at = Some(at);
        self.lost = true;
        warn!("Media player unreachable, holding position");
        vec![TrackerEvent::PlayerLost]
    }

    fn restore(&mut self) -> Vec<TrackerEvent> {
        if self.lost {
            self.lost = false;
            info!("Media player reachable again");
            vec![TrackerEvent::PlayerRestored]
        } else {
            Vec::new()
        }
    }

    fn on_sample(&mut self, state: &PlaybackState) -> Vec<TrackerEvent> {
        let raw = state.position;
        let at = state.observed_at;

        if self.track.as_ref() != Some(&state.track) {
            info!("Now playing: {}", state.track);
            self.track = Some(state.track.clone());
            self.snap(raw, at);
            self.playing = state.is_playing;
            return vec![TrackerEvent::TrackChanged {
                track: state.track.clone(),
                position: raw,
            }];
        }

        let mut events = Vec::new();
        let estimate = self.estimate_unchecked(at);
        let drift = raw.distance(estimate);

        if drift > self.settings.seek_threshold {
            debug!("Seek detected: {:?} -> {:?}", estimate, raw);
            events.push(TrackerEvent::Seeked {
                from: estimate,
                to: raw,
            });
            self.snap(raw, at);
        } else if !state.is_playing || !self.playing {
            // Paused playback, and the sample that resumes it, anchor at raw
            self.snap(raw, at);
        } else {
            self.anchor_position = self.corrected(estimate, raw);
            self.anchor_at = Some(at);
        }

        if state.is_playing != self.playing {
            self.playing = state.is_playing;
            events.push(if state.is_playing {
                TrackerEvent::Resumed { position: raw }
            } else {
                TrackerEvent::Paused { position: raw }
            });
        }

        events
    }

    fn snap(&mut self, position: Duration, at: Instant) {
        self.anchor_position = position;
        self.anchor_at = Some(at);
    }

    /// `estimate + (raw - estimate) * drift_correction`
    fn corrected(&self, estimate: Duration, raw: Duration) -> Duration {
        let gap = raw.distance(estimate);
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let step = Duration::from_nanos(
            (gap.as_nanos() as f64 * self.settings.drift_correction).round() as u64,
        );
        if raw >= estimate {
            estimate + step
        } else {
            estimate.saturating_sub(step)
        }
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(TrackerSettings::default())
    }
}
