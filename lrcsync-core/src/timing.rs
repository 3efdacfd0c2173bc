//! Word timing synthesis.
//!
//! Turns a phrase-level line into word-level timing, either by distributing
//! the line duration evenly over its words or by aligning word starts to
//! detected onsets. The result always satisfies the line invariant: the first
//! word starts at the line start, the last word ends at the line end, and word
//! intervals partition the line in order.

use crate::error::{CoreError, Result};
use crate::lrc::{LrcLine, LrcWord, WordSync};
use crate::onset::OnsetSet;
use crate::text;
use crate::time::fraction;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// Configured word timing mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordTimingMode {
    #[default]
    Even,
    Onset,
}

impl WordTimingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Even => "even",
            Self::Onset => "onset",
        }
    }
}

impl std::fmt::Display for WordTimingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How word starts are chosen for one line.
#[derive(Debug, Clone, Copy)]
pub enum TimingStrategy<'a> {
    Even,
    OnsetAligned(&'a OnsetSet),
}

/// Synthesize word timing for one line.
///
/// Lines that already carry word timing are returned as-is. A line with no
/// words or a non-positive duration is returned with no words and marked
/// [`WordSync::Unsynced`].
#[must_use]
pub fn synthesize(line: &LrcLine, strategy: TimingStrategy<'_>) -> LrcLine {
    if line.sync == WordSync::Synced {
        return line.clone();
    }

    if let Err(e) = check_timable(line) {
        trace!("{}, leaving it unsynced", e);
        return LrcLine {
            words: Vec::new(),
            sync: WordSync::Unsynced,
            ..line.clone()
        };
    }
    let words = text::split_words(&line.text);

    let starts = match strategy {
        TimingStrategy::Even => even_starts(line.start_time, line.end_time, words.len()),
        TimingStrategy::OnsetAligned(onsets) => {
            onset_starts(line.start_time, line.end_time, words.len(), onsets)
        }
    };

    let timed = words
        .iter()
        .enumerate()
        .map(|(i, word)| LrcWord {
            start_time: starts[i],
            end_time: starts.get(i + 1).copied().unwrap_or(line.end_time),
            text: (*word).to_string(),
        })
        .collect();

    LrcLine {
        words: timed,
        sync: WordSync::Synced,
        ..line.clone()
    }
}

/// Check a line has words and a positive duration to spread them over.
///
/// # Errors
///
/// Returns [`CoreError::EmptyOrInvalidDuration`] otherwise.
pub fn check_timable(line: &LrcLine) -> Result<()> {
    if line.end_time <= line.start_time || text::split_words(&line.text).is_empty() {
        return Err(CoreError::EmptyOrInvalidDuration {
            text: line.text.clone(),
        });
    }
    Ok(())
}

/// Synthesize every line with the even strategy.
#[must_use]
pub fn synthesize_even(lines: &[LrcLine]) -> Vec<LrcLine> {
    lines
        .iter()
        .map(|line| synthesize(line, TimingStrategy::Even))
        .collect()
}

/// `n` starts spread evenly over `[start, end)`.
fn even_starts(start: Duration, end: Duration, n: usize) -> Vec<Duration> {
    let duration = end.saturating_sub(start);
    (0..n).map(|i| start + fraction(duration, i, n)).collect()
}

fn onset_starts(start: Duration, end: Duration, n: usize, onsets: &OnsetSet) -> Vec<Duration> {
    let interior = onsets.interior(start, end);
    let boundaries = n.saturating_sub(1);

    if boundaries == 0 || interior.is_empty() {
        return even_starts(start, end, n);
    }

    if interior.len() <= boundaries {
        return greedy_starts(start, end, n, interior);
    }

    let mut starts = Vec::with_capacity(n);
    starts.push(start);
    starts.extend(most_regular_subset(start, end, interior, boundaries));
    starts
}

/// Assign onsets to words left to right; words left over once the onsets run
/// out share the remaining interval evenly with the last assigned word.
fn greedy_starts(start: Duration, end: Duration, n: usize, interior: &[Duration]) -> Vec<Duration> {
    let mut starts = Vec::with_capacity(n);
    starts.push(start);

    let mut cursor = start;
    for &onset in interior {
        if starts.len() == n {
            break;
        }
        if onset > cursor {
            starts.push(onset);
            cursor = onset;
        }
    }

    let remaining = n - starts.len();
    if remaining > 0 {
        let span = end.saturating_sub(cursor);
        let shares = remaining + 1;
        starts.extend((1..shares).map(|j| cursor + fraction(span, j, shares)));
    }

    starts
}

/// Pick exactly `k` of the interior onsets so that the resulting word
/// durations have minimal variance. Since the durations always sum to the
/// line duration, this minimizes the sum of squared gaps.
///
/// `cost[j][i]` is the best cost of gaps up to onset `i` being the `j+1`-th
/// selected boundary. Ties keep the lowest predecessor and the lowest final
/// onset index.
fn most_regular_subset(
    start: Duration,
    end: Duration,
    interior: &[Duration],
    k: usize,
) -> Vec<Duration> {
    let m = interior.len();
    let gap = |a: Duration, b: Duration| -> u128 {
        let nanos = b.saturating_sub(a).as_nanos();
        nanos * nanos
    };

    let mut cost = vec![vec![u128::MAX; m]; k];
    let mut prev = vec![vec![usize::MAX; m]; k];

    for (slot, &onset) in cost[0].iter_mut().zip(interior) {
        *slot = gap(start, onset);
    }
    for j in 1..k {
        for i in j..m {
            for p in (j - 1)..i {
                if cost[j - 1][p] == u128::MAX {
                    continue;
                }
                let candidate = cost[j - 1][p].saturating_add(gap(interior[p], interior[i]));
                if candidate < cost[j][i] {
                    cost[j][i] = candidate;
                    prev[j][i] = p;
                }
            }
        }
    }

    let mut best: Option<(u128, usize)> = None;
    for i in (k - 1)..m {
        if cost[k - 1][i] == u128::MAX {
            continue;
        }
        let total = cost[k - 1][i].saturating_add(gap(interior[i], end));
        if best.map_or(true, |(best_total, _)| total < best_total) {
            best = Some((total, i));
        }
    }

    let Some((_, mut i)) = best else {
        return interior.iter().take(k).copied().collect();
    };
    let mut chosen = vec![Duration::ZERO; k];
    for j in (0..k).rev() {
        chosen[j] = interior[i];
        if j > 0 {
            i = prev[j][i];
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn starts(line: &LrcLine) -> Vec<Duration> {
        line.words.iter().map(|w| w.start_time).collect()
    }

    fn assert_partitions(line: &LrcLine) {
        assert_eq!(line.sync, WordSync::Synced);
        assert_eq!(line.words.first().unwrap().start_time, line.start_time);
        assert_eq!(line.words.last().unwrap().end_time, line.end_time);
        for pair in line.words.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
            assert!(pair[0].start_time <= pair[1].start_time);
        }
        for word in &line.words {
            assert!(word.start_time <= word.end_time);
            assert!(word.start_time >= line.start_time && word.end_time <= line.end_time);
        }
    }

    #[test]
    fn test_even_distribution() {
        let line = LrcLine::new(ms(10_000), ms(12_000), "one two three four");
        let out = synthesize(&line, TimingStrategy::Even);
        assert_eq!(starts(&out), vec![ms(10_000), ms(10_500), ms(11_000), ms(11_500)]);
        assert_eq!(out.words[3].text, "four");
        assert_partitions(&out);
    }

    #[test]
    fn test_onset_picks_most_regular_subset() {
        let line = LrcLine::new(ms(10_000), ms(12_400), "are you there");
        let onsets = OnsetSet::new(vec![ms(10_100), ms(10_600), ms(11_900), ms(13_000)]);
        let out = synthesize(&line, TimingStrategy::OnsetAligned(&onsets));
        assert_eq!(starts(&out), vec![ms(10_000), ms(10_600), ms(11_900)]);
        assert_eq!(out.words[2].end_time, ms(12_400));
        assert_partitions(&out);
    }

    #[test]
    fn test_onset_fewer_than_boundaries_falls_back_to_even() {
        let line = LrcLine::new(ms(0), ms(4_000), "a b c d");
        let onsets = OnsetSet::new(vec![ms(1_000)]);
        let out = synthesize(&line, TimingStrategy::OnsetAligned(&onsets));
        assert_eq!(starts(&out), vec![ms(0), ms(1_000), ms(2_000), ms(3_000)]);
        assert_partitions(&out);
    }

    #[test]
    fn test_onset_exact_count_uses_every_onset() {
        let line = LrcLine::new(ms(0), ms(3_000), "x y z");
        let onsets = OnsetSet::new(vec![ms(400), ms(2_500)]);
        let out = synthesize(&line, TimingStrategy::OnsetAligned(&onsets));
        assert_eq!(starts(&out), vec![ms(0), ms(400), ms(2_500)]);
    }

    #[test]
    fn test_onset_ignores_onsets_outside_line() {
        let line = LrcLine::new(ms(1_000), ms(2_000), "left right");
        let onsets = OnsetSet::new(vec![ms(500), ms(1_000), ms(2_000), ms(2_500)]);
        let out = synthesize(&line, TimingStrategy::OnsetAligned(&onsets));
        assert_eq!(starts(&out), vec![ms(1_000), ms(1_500)]);
    }

    #[test]
    fn test_single_word_spans_line() {
        let line = LrcLine::new(ms(5_000), ms(6_000), "hey");
        let onsets = OnsetSet::new(vec![ms(5_500)]);
        let out = synthesize(&line, TimingStrategy::OnsetAligned(&onsets));
        assert_eq!(out.words.len(), 1);
        assert_partitions(&out);
    }

    #[test]
    fn test_tied_subsets_prefer_lower_indices() {
        // Every pair of onsets gives the same squared-gap sum
        let line = LrcLine::new(ms(0), ms(4_000), "a b c");
        let onsets = OnsetSet::new(vec![ms(1_000), ms(2_000), ms(3_000)]);
        let out = synthesize(&line, TimingStrategy::OnsetAligned(&onsets));
        assert_eq!(starts(&out), vec![ms(0), ms(1_000), ms(2_000)]);
    }

    #[test]
    fn test_invalid_lines_are_unsynced() {
        let zero = LrcLine::new(ms(3_000), ms(3_000), "no time");
        let out = synthesize(&zero, TimingStrategy::Even);
        assert_eq!(out.sync, WordSync::Unsynced);
        assert!(out.words.is_empty());
        assert_eq!(out.start_time, ms(3_000));

        let empty = LrcLine::new(ms(0), ms(1_000), "   ");
        assert_eq!(synthesize(&empty, TimingStrategy::Even).sync, WordSync::Unsynced);

        assert!(matches!(
            check_timable(&zero),
            Err(CoreError::EmptyOrInvalidDuration { ref text }) if text == "no time"
        ));
        assert!(check_timable(&empty).is_err());
        assert!(check_timable(&LrcLine::new(ms(0), ms(1), "ok")).is_ok());
    }

    #[test]
    fn test_invariant_holds_for_many_onset_layouts() {
        let line = LrcLine::new(ms(20_000), ms(23_700), "w1 w2 w3 w4 w5 w6");
        for count in 0..12_u64 {
            let onsets: Vec<Duration> = (0..count)
                .map(|i| ms(19_800 + (i * 977) % 4_200))
                .collect();
            let set = OnsetSet::new(onsets);
            let out = synthesize(&line, TimingStrategy::OnsetAligned(&set));
            assert_eq!(out.words.len(), 6);
            assert_partitions(&out);
        }
    }
}
