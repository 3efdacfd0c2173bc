//! Player polling task.

use lrcsync_core::{CoreError, DurationExt, PlayerObservation, PlayerSource, VisualizerConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Longest wait between polls while the player keeps failing
pub const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Consecutive failures after which the poller logs at error level
const ERROR_LOG_THRESHOLD: u32 = 5;

/// Latest-value channel carrying the most recent observation.
pub type ObservationReceiver = watch::Receiver<Option<PlayerObservation>>;

/// Polls a [`PlayerSource`] and publishes every result on a watch channel.
///
/// Only the latest observation is kept; a slow consumer skips stale ones.
pub struct PlayerPoller {
    source: Arc<dyn PlayerSource>,
    poll_interval: Duration,
    query_timeout: Duration,
    sender: watch::Sender<Option<PlayerObservation>>,
    cancel_token: CancellationToken,
}

impl PlayerPoller {
    /// Create a new poller
    ///
    /// # Arguments
    /// * `source` - Player to query
    /// * `poll_interval` - Delay between polls
    /// * `query_timeout` - Longest a single query may take before the player counts as unreachable
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    #[must_use]
    pub fn new(
        source: Arc<dyn PlayerSource>,
        poll_interval: Duration,
        query_timeout: Duration,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            source,
            poll_interval,
            query_timeout,
            sender,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Create a poller using the visualizer's poll interval and player timeout.
    #[must_use]
    pub fn from_config(
        source: Arc<dyn PlayerSource>,
        config: &VisualizerConfig,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self::new(
            source,
            config.poll_interval(),
            config.player_timeout(),
            cancel_token,
        )
    }

    /// Receive observations published from now on.
    #[must_use]
    pub fn subscribe(&self) -> ObservationReceiver {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start polling in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Query the player once and publish the outcome.
    ///
    /// # Errors
    ///
    /// Returns the query error after publishing
    /// [`PlayerObservation::Unreachable`] for it.
    pub async fn poll_once(&self) -> Result<(), CoreError> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.query_timeout, self.source.query())
            .await
            .unwrap_or_else(|_| {
                Err(CoreError::PlayerUnreachable {
                    reason: format!(
                        "{} did not answer within {}ms",
                        self.source.name(),
                        self.query_timeout.as_millis_u64()
                    ),
                })
            });

        let (observation, outcome) = match result {
            Ok(Some(state)) => (PlayerObservation::Playing(state), Ok(())),
            Ok(None) => (
                PlayerObservation::NoTrack {
                    observed_at: Instant::now(),
                },
                Ok(()),
            ),
            Err(e) => (
                PlayerObservation::Unreachable {
                    observed_at: started,
                },
                Err(e),
            ),
        };

        self.sender.send_replace(Some(observation));
        outcome
    }

    /// Poll until cancelled.
    pub async fn run(&self) {
        info!("Starting {} player poller", self.source.name());

        let mut consecutive_errors: u32 = 0;

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Poller shutting down gracefully");
                    break;
                }
                () = tokio::time::sleep(self.poll_interval) => {
                    match self.poll_once().await {
                        Ok(()) => {
                            if consecutive_errors > 0 {
                                info!("Player reachable again after {} failed polls", consecutive_errors);
                            }
                            consecutive_errors = 0;
                        }
                        Err(e) => {
                            consecutive_errors = consecutive_errors.saturating_add(1);
                            let backoff = backoff_delay(consecutive_errors);

                            if consecutive_errors >= ERROR_LOG_THRESHOLD {
                                error!(
                                    "Player unreachable {} times in a row, waiting {}ms: {}",
                                    consecutive_errors,
                                    backoff.as_millis_u64(),
                                    e
                                );
                            } else {
                                warn!("Poll error (attempt {}): {}", consecutive_errors, e);
                            }

                            tokio::select! {
                                () = self.cancel_token.cancelled() => {
                                    info!("Poller shutting down gracefully");
                                    break;
                                }
                                () = tokio::time::sleep(backoff) => {
                                    debug!("Retrying player after backoff");
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Exponential backoff: 100ms * 2^errors, capped at [`MAX_BACKOFF`].
#[must_use]
pub fn backoff_delay(consecutive_errors: u32) -> Duration {
    // Exponent capped at 10, so the product stays far from overflow
    let backoff_ms = 100_u64.saturating_mul(2_u64.saturating_pow(consecutive_errors.min(10)));
    Duration::from_millis(backoff_ms.min(MAX_BACKOFF.as_millis_u64()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lrcsync_core::{PlaybackState, TrackId};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Answer = lrcsync_core::Result<Option<PlaybackState>>;

    /// Answers from a script, then keeps reporting no track.
    struct ScriptedSource {
        answers: Mutex<VecDeque<Answer>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(answers: Vec<Answer>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PlayerSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn query(&self) -> Answer {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.answers.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    fn playing(title: &str, position_ms: u64) -> Answer {
        Ok(Some(PlaybackState::new(
            TrackId::new(None, None, Some(title.into())),
            Duration::from_millis(position_ms),
            true,
            Instant::now(),
        )))
    }

    fn unreachable() -> Answer {
        Err(CoreError::PlayerUnreachable {
            reason: "no bus".into(),
        })
    }

    fn poller(source: ScriptedSource) -> PlayerPoller {
        PlayerPoller::new(
            Arc::new(source),
            Duration::from_millis(50),
            Duration::from_millis(500),
            None,
        )
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(1), Duration::from_millis(200));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
        assert_eq!(backoff_delay(6), MAX_BACKOFF);
        assert_eq!(backoff_delay(u32::MAX), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn test_poll_once_publishes_each_outcome() {
        let poller = poller(ScriptedSource::new(vec![playing("A", 1_000), unreachable()]));
        let rx = poller.subscribe();
        assert!(rx.borrow().is_none());

        poller.poll_once().await.unwrap();
        assert!(matches!(
            *rx.borrow(),
            Some(PlayerObservation::Playing(ref s)) if s.position == Duration::from_millis(1_000)
        ));

        assert!(poller.poll_once().await.is_err());
        assert!(matches!(
            *rx.borrow(),
            Some(PlayerObservation::Unreachable { .. })
        ));

        poller.poll_once().await.unwrap();
        assert!(matches!(*rx.borrow(), Some(PlayerObservation::NoTrack { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_player_counts_as_unreachable() {
        let mut source = ScriptedSource::new(vec![playing("A", 0)]);
        source.delay = Duration::from_secs(10);
        let poller = poller(source);
        let rx = poller.subscribe();

        let err = poller.poll_once().await.unwrap_err();
        assert!(matches!(err, CoreError::PlayerUnreachable { .. }));
        assert!(matches!(
            *rx.borrow(),
            Some(PlayerObservation::Unreachable { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_publishes_until_cancelled() {
        let source = Arc::new(ScriptedSource::new(vec![
            playing("A", 0),
            unreachable(),
            unreachable(),
            playing("A", 500),
        ]));
        let token = CancellationToken::new();
        let poller = Arc::new(PlayerPoller::new(
            Arc::clone(&source) as Arc<dyn PlayerSource>,
            Duration::from_millis(50),
            Duration::from_millis(500),
            Some(token.clone()),
        ));
        let mut rx = poller.subscribe();
        let handle = Arc::clone(&poller).start();

        let mut seen = Vec::new();
        while seen.len() < 4 {
            rx.changed().await.unwrap();
            seen.push(rx.borrow_and_update().clone());
        }

        assert!(matches!(seen[0], Some(PlayerObservation::Playing(_))));
        assert!(matches!(seen[1], Some(PlayerObservation::Unreachable { .. })));
        assert!(matches!(seen[2], Some(PlayerObservation::Unreachable { .. })));
        assert!(matches!(seen[3], Some(PlayerObservation::Playing(ref s)) if s.position == Duration::from_millis(500)));

        token.cancel();
        handle.await.unwrap();
        assert!(source.calls.load(Ordering::SeqCst) >= 4);
    }
}
