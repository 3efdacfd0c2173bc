//! Render loop: consumes player observations and redraws on change.

use crate::font::Font;
use crate::render::{compose, draw, Frame};
use crossterm::terminal;
use lrcsync_core::{
    LyricCursor, LyricsStatus, PlayerObservation, SyncEngine, TrackId, VisualizerConfig,
};
use lrcsync_playerctl::ObservationReceiver;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Terminal size assumed when it can not be queried
const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Everything that decides what is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub track: Option<TrackId>,
    pub status: LyricsStatus,
    pub cursor: LyricCursor,
    pub size: (u16, u16),
}

/// Redraw when the scene changes, and at least every `interval`.
#[derive(Debug, Clone)]
pub struct RedrawPolicy {
    interval: Duration,
    last: Option<(Scene, Instant)>,
}

impl RedrawPolicy {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    #[must_use]
    pub fn should_redraw(&self, scene: &Scene, now: Instant) -> bool {
        match &self.last {
            None => true,
            Some((last, drawn_at)) => {
                last != scene || now.saturating_duration_since(*drawn_at) >= self.interval
            }
        }
    }

    pub fn mark_drawn(&mut self, scene: Scene, now: Instant) {
        self.last = Some((scene, now));
    }
}

/// The live lyric display.
pub struct Visualizer<'a> {
    engine: SyncEngine,
    font: &'a Font,
    redraw: RedrawPolicy,
    refresh_rate: Duration,
    colors_enabled: bool,
}

impl<'a> Visualizer<'a> {
    #[must_use]
    pub fn new(engine: SyncEngine, font: &'a Font, config: &VisualizerConfig) -> Self {
        Self {
            engine,
            font,
            redraw: RedrawPolicy::new(config.redraw_interval()),
            refresh_rate: config.refresh_rate(),
            colors_enabled: config.colors_enabled,
        }
    }

    /// Feed one player observation to the sync engine.
    pub async fn observe(&mut self, observation: &PlayerObservation) {
        for event in self.engine.apply(observation).await {
            debug!("Tracker event: {:?}", event);
        }
    }

    #[must_use]
    pub fn scene(&self, now: Instant, size: (u16, u16)) -> Scene {
        Scene {
            track: self.engine.tracker().track().cloned(),
            status: self.engine.status(),
            cursor: self.engine.cursor(now),
            size,
        }
    }

    /// Lay out the screen for `cursor`.
    #[must_use]
    pub fn frame(&self, cursor: LyricCursor, (width, height): (u16, u16)) -> Frame {
        let line = cursor
            .line
            .and_then(|i| self.engine.lyrics().and_then(|l| l.lines.get(i)));
        compose(line, cursor.word, self.font, width, height)
    }

    /// Draw if the redraw policy asks for it. Returns whether a frame was drawn.
    ///
    /// # Errors
    ///
    /// Returns any error from writing to `out`.
    pub fn tick<W: Write>(&mut self, out: &mut W, now: Instant, size: (u16, u16)) -> io::Result<bool> {
        let scene = self.scene(now, size);
        if !self.redraw.should_redraw(&scene, now) {
            return Ok(false);
        }

        let frame = self.frame(scene.cursor, size);
        draw(out, &frame, self.colors_enabled)?;
        self.redraw.mark_drawn(scene, now);
        Ok(true)
    }

    /// Run until cancelled or the poller goes away.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub async fn run<W: Write>(
        mut self,
        mut observations: ObservationReceiver,
        cancel_token: CancellationToken,
        out: &mut W,
    ) -> io::Result<()> {
        info!("Starting render loop");

        let mut ticker = tokio::time::interval(self.refresh_rate);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    info!("Render loop shutting down gracefully");
                    break;
                }
                changed = observations.changed() => {
                    if changed.is_err() {
                        warn!("Player poller stopped, leaving render loop");
                        break;
                    }
                    let observation = observations.borrow_and_update().clone();
                    if let Some(observation) = observation {
                        self.observe(&observation).await;
                    }
                }
                _ = ticker.tick() => {
                    let size = terminal::size().unwrap_or(FALLBACK_SIZE);
                    self.tick(out, Instant::now(), size)?;
                }
            }
        }

        Ok(())
    }
}
