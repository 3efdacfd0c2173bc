//! Phrase segmentation.
//!
//! Long phrase-level lines are split recursively at natural boundaries until
//! every piece satisfies both the duration and the word-count limits. Time is
//! divided in proportion to word counts, and every boundary is computed once
//! and shared by both neighbours, so the pieces tile the original interval.

use crate::config::ProcessorConfig;
use crate::lrc::{LrcLine, WordSync};
use crate::text;
use crate::time::fraction;
use std::time::Duration;
use tracing::trace;

/// Limits that decide whether a phrase is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLimits {
    pub max_phrase_duration: Duration,
    pub max_words_per_phrase: usize,
    /// Cut after every comma-terminated word before applying the limits
    pub split_on_commas: bool,
}

impl Default for SegmentLimits {
    fn default() -> Self {
        Self {
            max_phrase_duration: Duration::from_millis(2500),
            max_words_per_phrase: 8,
            split_on_commas: false,
        }
    }
}

impl From<&ProcessorConfig> for SegmentLimits {
    fn from(config: &ProcessorConfig) -> Self {
        Self {
            max_phrase_duration: config.max_phrase_duration(),
            max_words_per_phrase: config.max_words_per_phrase,
            split_on_commas: config.split_on_commas,
        }
    }
}

/// Kind of boundary a split may use, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BoundaryKind {
    Punctuation,
    Conjunction,
}

/// Splits overlong phrases into shorter sub-phrases.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseSegmenter {
    limits: SegmentLimits,
}

impl PhraseSegmenter {
    #[must_use]
    pub const fn new(limits: SegmentLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub const fn limits(&self) -> &SegmentLimits {
        &self.limits
    }

    /// Segment every line of a track, preserving order.
    #[must_use]
    pub fn segment_all(&self, lines: &[LrcLine]) -> Vec<LrcLine> {
        lines.iter().flat_map(|line| self.segment(line)).collect()
    }

    /// Segment one line.
    ///
    /// Lines that already carry word timing, lines without words and lines
    /// within both limits are returned unchanged.
    #[must_use]
    pub fn segment(&self, line: &LrcLine) -> Vec<LrcLine> {
        let words = text::split_words(&line.text);
        if line.sync == WordSync::Synced || words.is_empty() {
            return vec![line.clone()];
        }

        let has_commas = self.limits.split_on_commas
            && words[..words.len() - 1]
                .iter()
                .any(|w| text::ends_with_comma(w));
        if !has_commas && self.within_limits(line.duration(), words.len()) {
            return vec![line.clone()];
        }

        let mut pieces = Vec::new();
        if has_commas {
            let n = words.len();
            let duration = line.duration();
            let mut cuts: Vec<usize> = (1..n)
                .filter(|&k| text::ends_with_comma(words[k - 1]))
                .collect();
            cuts.push(n);

            let mut from = 0;
            let mut piece_start = line.start_time;
            for cut in cuts {
                let piece_end = if cut == n {
                    line.end_time
                } else {
                    line.start_time + fraction(duration, cut, n)
                };
                self.split_recursive(piece_start, piece_end, &words[from..cut], &mut pieces);
                from = cut;
                piece_start = piece_end;
            }
        } else {
            self.split_recursive(line.start_time, line.end_time, &words, &mut pieces);
        }

        trace!(
            "Segmented '{}' into {} sub-phrases",
            line.text,
            pieces.len()
        );
        pieces
    }

    fn within_limits(&self, duration: Duration, word_count: usize) -> bool {
        duration <= self.limits.max_phrase_duration
            && word_count <= self.limits.max_words_per_phrase
    }

    fn split_recursive(
        &self,
        start: Duration,
        end: Duration,
        words: &[&str],
        out: &mut Vec<LrcLine>,
    ) {
        let n = words.len();
        let duration = end.saturating_sub(start);
        // A single word can not be split further
        if n <= 1 || self.within_limits(duration, n) {
            out.push(LrcLine::new(start, end, words.join(" ")));
            return;
        }

        let k = choose_split(words);
        let boundary = start + fraction(duration, k, n);
        self.split_recursive(start, boundary, &words[..k], out);
        self.split_recursive(boundary, end, &words[k..], out);
    }
}

/// Choose the word index to split before (`1..n`).
///
/// Punctuation boundaries win over conjunctions, which win over the midpoint
/// index. Within a kind, the boundary whose proportional time position is
/// nearest the temporal midpoint wins, then the lowest index.
fn choose_split(words: &[&str]) -> usize {
    let n = words.len();
    let mut best: Option<(BoundaryKind, usize, usize)> = None;

    for k in 1..n {
        let kind = if text::ends_with_break(words[k - 1]) {
            BoundaryKind::Punctuation
        } else if text::is_conjunction(words[k]) {
            BoundaryKind::Conjunction
        } else {
            continue;
        };
        // Boundary k sits at k/n of the duration; distance to 1/2 scaled by 2n
        let distance = (2 * k).abs_diff(n);

        let better = best.map_or(true, |(best_kind, best_distance, _)| {
            (kind, distance) < (best_kind, best_distance)
        });
        if better {
            best = Some((kind, distance, k));
        }
    }

    best.map_or_else(|| n.div_ceil(2), |(_, _, k)| k)
}
