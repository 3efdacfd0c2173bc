//! Onset detection capability and onset collections.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// External onset analysis capability.
///
/// Implementations run an analysis tool over an audio file and report every
/// detected onset. A missing tool is reported as
/// [`CoreError::OnsetCapabilityUnavailable`](crate::CoreError::OnsetCapabilityUnavailable)
/// so callers can fall back to even word timing.
#[async_trait]
pub trait OnsetDetector: Send + Sync {
    /// Returns a human-readable name for this detector.
    fn name(&self) -> &'static str;

    /// Detect onsets in the given audio file, in the order the tool reports them.
    ///
    /// # Errors
    ///
    /// Returns an error if the analysis tool is missing, fails, or times out.
    async fn detect(&self, audio: &Path) -> Result<Vec<Duration>>;
}

/// All onsets detected for one audio file, sorted and de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnsetTrack {
    onsets: Vec<Duration>,
}

impl OnsetTrack {
    /// Build a track from raw detector output.
    ///
    /// Onsets are sorted, then every onset closer than `min_gap` to the
    /// previously kept one is dropped.
    #[must_use]
    pub fn new(mut onsets: Vec<Duration>, min_gap: Duration) -> Self {
        onsets.sort_unstable();

        let mut kept: Vec<Duration> = Vec::with_capacity(onsets.len());
        for onset in onsets {
            match kept.last() {
                Some(&last) if onset.saturating_sub(last) < min_gap || onset == last => {}
                _ => kept.push(onset),
            }
        }

        Self { onsets: kept }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.onsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.onsets.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Duration] {
        &self.onsets
    }

    /// Onsets confined to `[start, end]`.
    #[must_use]
    pub fn within(&self, start: Duration, end: Duration) -> OnsetSet {
        let from = self.onsets.partition_point(|&o| o < start);
        let to = self.onsets.partition_point(|&o| o <= end);
        OnsetSet {
            onsets: self.onsets.get(from..to).unwrap_or_default().to_vec(),
        }
    }
}

/// Ordered onsets belonging to one phrase interval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnsetSet {
    onsets: Vec<Duration>,
}

impl OnsetSet {
    /// Build a set from arbitrary onsets; they are sorted and exact duplicates removed.
    #[must_use]
    pub fn new(mut onsets: Vec<Duration>) -> Self {
        onsets.sort_unstable();
        onsets.dedup();
        Self { onsets }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.onsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.onsets.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Duration] {
        &self.onsets
    }

    /// Onsets strictly inside `(start, end)`.
    #[must_use]
    pub fn interior(&self, start: Duration, end: Duration) -> &[Duration] {
        let from = self.onsets.partition_point(|&o| o <= start);
        let to = self.onsets.partition_point(|&o| o < end);
        self.onsets.get(from..to).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_millis(v)).collect()
    }

    #[test]
    fn test_onset_track_sorts_and_drops_close_onsets() {
        let track = OnsetTrack::new(ms(&[500, 100, 150, 190, 120, 900]), Duration::from_millis(80));
        assert_eq!(track.as_slice(), ms(&[100, 190, 500, 900]).as_slice());
    }

    #[test]
    fn test_onset_track_zero_gap_removes_duplicates() {
        let track = OnsetTrack::new(ms(&[100, 100, 200]), Duration::ZERO);
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn test_within_is_inclusive() {
        let track = OnsetTrack::new(ms(&[100, 200, 300, 400]), Duration::ZERO);
        let set = track.within(Duration::from_millis(200), Duration::from_millis(300));
        assert_eq!(set.as_slice(), ms(&[200, 300]).as_slice());
        assert!(track
            .within(Duration::from_millis(450), Duration::from_millis(900))
            .is_empty());
    }

    #[test]
    fn test_interior_is_exclusive() {
        let set = OnsetSet::new(ms(&[300, 100, 200, 300]));
        assert_eq!(set.len(), 3);
        let interior = set.interior(Duration::from_millis(100), Duration::from_millis(300));
        assert_eq!(interior, ms(&[200]).as_slice());
    }
}
