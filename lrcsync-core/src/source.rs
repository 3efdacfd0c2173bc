//! Media player source trait.

use crate::error::Result;
use crate::playback::PlaybackState;
use async_trait::async_trait;

/// Trait for sources that report what a media player is playing.
///
/// A source answers one query at a time; polling cadence, timeouts and
/// backoff belong to the caller. Implementations should:
///
/// - Return `Ok(None)` when the player is reachable but has no track
/// - Return [`CoreError::PlayerUnreachable`](crate::CoreError::PlayerUnreachable)
///   when the player can not be queried
/// - Stamp the returned [`PlaybackState`] with the instant it was observed
#[async_trait]
pub trait PlayerSource: Send + Sync {
    /// Returns a human-readable name for this source.
    fn name(&self) -> &'static str;

    /// Query the player once.
    ///
    /// # Errors
    ///
    /// Returns an error if the player is unreachable or its answer is unusable.
    async fn query(&self) -> Result<Option<PlaybackState>>;
}
