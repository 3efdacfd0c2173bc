use crate::error::{CoreError, Result};
use crate::text;
use crate::time::DurationExt;
use std::fmt::Write as _;
use std::time::Duration;

/// Seconds allotted per syllable when the end of the final line has to be guessed.
const SECS_PER_SYLLABLE: f64 = 0.25;

/// Parsed LRC file containing metadata and timed lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LrcFile {
    pub metadata: LrcMetadata,
    pub lines: Vec<LrcLine>,
}

/// LRC metadata from ID tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LrcMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub length: Option<Duration>,
    pub offset: i64, // milliseconds, can be negative
}

/// Word timing state of a line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WordSync {
    /// Phrase-level only, words not yet synthesized
    #[default]
    Pending,
    /// Words partition the line interval
    Synced,
    /// Word timing could not be derived (empty text or non-positive duration)
    Unsynced,
}

/// A single line (phrase) of lyrics with timing
#[derive(Debug, Clone, PartialEq)]
pub struct LrcLine {
    pub start_time: Duration,
    pub end_time: Duration,
    pub text: String,
    /// Word-level timing, empty unless `sync` is [`WordSync::Synced`]
    pub words: Vec<LrcWord>,
    pub sync: WordSync,
}

/// Word-level timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrcWord {
    pub start_time: Duration,
    pub end_time: Duration,
    pub text: String,
}

/// Output encoding for [`LrcFile::serialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LrcFormat {
    /// `[mm:ss.xx]text`
    Phrase,
    /// `[mm:ss.xx]<mm:ss.xx>word <mm:ss.xx>word <mm:ss.xx>`
    Word,
}

impl LrcFormat {
    /// File extension used for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Phrase => "lrc",
            Self::Word => "wlrc",
        }
    }
}

/// One timestamped entry before end times are resolved.
#[derive(Debug)]
struct RawEntry {
    start_time: Duration,
    text: String,
    words: Option<Vec<(Duration, String)>>,
    explicit_end: Option<Duration>,
}

impl RawEntry {
    fn is_end_marker(&self) -> bool {
        self.text.is_empty() && self.words.is_none()
    }
}

impl LrcFile {
    /// Parse an LRC string into an `LrcFile`.
    ///
    /// The end of the final line comes from an explicit end tag, else the
    /// `[length:]` tag, else a syllable-based estimate.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedTimestamp`] when a tag looks like a
    /// timestamp but cannot be parsed.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with_track_length(input, None)
    }

    /// Parse an LRC string, using `track_length` (typically the probed audio
    /// duration) to close the final line when it lies after that line's start.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedTimestamp`] when a tag looks like a
    /// timestamp but cannot be parsed.
    pub fn parse_with_track_length(input: &str, track_length: Option<Duration>) -> Result<Self> {
        let mut metadata = LrcMetadata::default();
        let mut entries = Vec::new();

        for (index, line) in input.lines().enumerate() {
            let line_number = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Try to parse as ID tag first
            if let Some((tag, value)) = parse_id_tag(line) {
                match tag.to_lowercase().as_str() {
                    "ti" => metadata.title = Some(value),
                    "ar" => metadata.artist = Some(value),
                    "al" => metadata.album = Some(value),
                    "au" => metadata.author = Some(value),
                    "by" => metadata.creator = Some(value),
                    "length" => metadata.length = parse_timestamp(&value),
                    "offset" => {
                        if let Ok(offset) = value.parse::<i64>() {
                            metadata.offset = offset;
                        }
                    }
                    _ => {} // Ignore unknown tags
                }
                continue;
            }

            entries.extend(parse_lyric_line(line, line_number)?);
        }

        // Apply offset to all entries
        if metadata.offset != 0 {
            for entry in &mut entries {
                entry.start_time = apply_offset(entry.start_time, metadata.offset);
                entry.explicit_end = entry
                    .explicit_end
                    .map(|end| apply_offset(end, metadata.offset));
                if let Some(ref mut words) = entry.words {
                    for (start, _) in words {
                        *start = apply_offset(*start, metadata.offset);
                    }
                }
            }
        }

        // Stable sort keeps an end marker ahead of a line sharing its timestamp
        entries.sort_by_key(|e| e.start_time);

        let lines = resolve_lines(entries, &metadata, track_length);

        Ok(Self { metadata, lines })
    }

    /// Whether any line already carries word-level timing.
    #[must_use]
    pub fn is_word_level(&self) -> bool {
        self.lines.iter().any(|l| l.sync == WordSync::Synced)
    }

    /// Find the active line for a playback position.
    ///
    /// The active line is the last one starting at or before `position`,
    /// provided `position` has not yet reached that line's end. Lines are
    /// sorted, so this is a binary search.
    #[must_use]
    pub fn line_index_at(&self, position: Duration) -> Option<usize> {
        let after = self.lines.partition_point(|l| l.start_time <= position);
        let index = after.checked_sub(1)?;
        (position < self.lines[index].end_time).then_some(index)
    }

    /// Find the active line for a playback position.
    #[must_use]
    pub fn current_line(&self, position: Duration) -> Option<&LrcLine> {
        self.line_index_at(position).map(|i| &self.lines[i])
    }

    /// Serialize to LRC text: `header_comments` as `#` lines, then metadata
    /// tags (the offset is already applied and is not written), then lines.
    #[must_use]
    pub fn serialize(&self, format: LrcFormat, header_comments: &[String]) -> String {
        let mut out = String::new();

        for comment in header_comments {
            let _ = writeln!(out, "# {comment}");
        }

        let tags = [
            ("ti", self.metadata.title.as_deref()),
            ("ar", self.metadata.artist.as_deref()),
            ("al", self.metadata.album.as_deref()),
            ("au", self.metadata.author.as_deref()),
            ("by", self.metadata.creator.as_deref()),
        ];
        let mut wrote_tag = false;
        for (tag, value) in tags {
            if let Some(value) = value {
                let _ = writeln!(out, "[{tag}:{value}]");
                wrote_tag = true;
            }
        }
        if let Some(length) = self.metadata.length {
            let _ = writeln!(out, "[length:{}]", format_timestamp(length));
            wrote_tag = true;
        }
        if wrote_tag {
            out.push('\n');
        }

        for (i, line) in self.lines.iter().enumerate() {
            let word_tagged = format == LrcFormat::Word
                && line.sync == WordSync::Synced
                && !line.words.is_empty();

            let _ = write!(out, "[{}]", format_timestamp(line.start_time));
            if word_tagged {
                for word in &line.words {
                    let _ = write!(out, "<{}>{} ", format_timestamp(word.start_time), word.text);
                }
                let _ = writeln!(out, "<{}>", format_timestamp(line.end_time));
                continue;
            }
            let _ = writeln!(out, "{}", line.text);

            let closed_by_next = self.lines.get(i + 1).is_some_and(|next| {
                next.start_time.as_centis_rounded() == line.end_time.as_centis_rounded()
            });
            if !closed_by_next {
                let _ = writeln!(out, "[{}]", format_timestamp(line.end_time));
            }
        }

        out
    }
}

impl LrcLine {
    /// A phrase-level line with no word timing yet.
    pub fn new(start_time: Duration, end_time: Duration, text: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
            words: Vec::new(),
            sync: WordSync::Pending,
        }
    }

    /// Line duration, zero if the end precedes the start.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_time.saturating_sub(self.start_time)
    }

    /// Number of whitespace-separated words in the text.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Find the active word for a position within this line, using the same
    /// rule as [`LrcFile::line_index_at`].
    #[must_use]
    pub fn word_index_at(&self, position: Duration) -> Option<usize> {
        let after = self.words.partition_point(|w| w.start_time <= position);
        let index = after.checked_sub(1)?;
        (position < self.words[index].end_time).then_some(index)
    }
}

/// Turn sorted raw entries into lines with resolved end times.
fn resolve_lines(
    entries: Vec<RawEntry>,
    metadata: &LrcMetadata,
    track_length: Option<Duration>,
) -> Vec<LrcLine> {
    let next_starts: Vec<Option<Duration>> = (0..entries.len())
        .map(|i| entries.get(i + 1).map(|e| e.start_time))
        .collect();

    let mut lines = Vec::with_capacity(entries.len());
    for (entry, next_start) in entries.into_iter().zip(next_starts) {
        if entry.is_end_marker() {
            continue;
        }

        let end_time = entry
            .explicit_end
            .or(next_start)
            .unwrap_or_else(|| estimate_final_end(&entry, metadata, track_length))
            .max(entry.start_time);

        match entry.words {
            Some(mut raw_words) => {
                raw_words.sort_by_key(|(start, _)| *start);
                let mut words: Vec<LrcWord> = Vec::with_capacity(raw_words.len());
                for (i, (start, word_text)) in raw_words.iter().enumerate() {
                    let word_end = raw_words.get(i + 1).map_or(end_time, |(next, _)| *next);
                    let start = (*start).clamp(entry.start_time, end_time);
                    words.push(LrcWord {
                        start_time: start,
                        end_time: word_end.clamp(start, end_time),
                        text: word_text.clone(),
                    });
                }
                if let Some(first) = words.first_mut() {
                    first.start_time = entry.start_time;
                }
                lines.push(LrcLine {
                    start_time: entry.start_time,
                    end_time,
                    text: entry.text,
                    words,
                    sync: WordSync::Synced,
                });
            }
            None => lines.push(LrcLine::new(entry.start_time, end_time, entry.text)),
        }
    }
    lines
}

/// End of the last line when nothing after it closes it.
fn estimate_final_end(
    entry: &RawEntry,
    metadata: &LrcMetadata,
    track_length: Option<Duration>,
) -> Duration {
    if let Some(length) = track_length.filter(|l| *l > entry.start_time) {
        return length;
    }
    if let Some(length) = metadata.length.filter(|l| *l > entry.start_time) {
        return length;
    }
    #[allow(clippy::cast_precision_loss)]
    let syllables = text::phrase_syllables(&entry.text) as f64;
    entry
        .start_time
        .saturating_add(Duration::from_secs_f64(syllables * SECS_PER_SYLLABLE))
}

/// Format a duration as `mm:ss.xx`, rounded to the nearest centisecond.
#[must_use]
pub fn format_timestamp(duration: Duration) -> String {
    let centis = duration.as_centis_rounded();
    let hundredths = centis % 100;
    let total_secs = centis / 100;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;

    format!("{minutes:02}:{seconds:02}.{hundredths:02}")
}

/// Parse an ID tag like [ti:Title] or [ar:Artist]
fn parse_id_tag(line: &str) -> Option<(String, String)> {
    if !line.starts_with('[') || !line.contains(':') {
        return None;
    }

    let end = line.find(']')?;
    let content = &line[1..end];

    let first_colon = content.find(':')?;
    let tag = &content[..first_colon];

    // Timestamps start with a digit, tags with a letter
    if !tag.chars().next().is_some_and(char::is_alphabetic) {
        return None;
    }

    let value = content[first_colon + 1..].trim().to_string();
    Some((tag.to_string(), value))
}

/// Whether bracket content is meant to be a timestamp (starts with a digit).
fn looks_like_timestamp(content: &str) -> bool {
    content.trim().starts_with(|c: char| c.is_ascii_digit())
}

/// Parse a lyric line like [00:12.34]Hello world or [00:12.34][00:15.67]Same lyrics
fn parse_lyric_line(line: &str, line_number: usize) -> Result<Vec<RawEntry>> {
    let mut remaining = line;
    let mut timestamps = Vec::new();

    // Extract all timestamps at the beginning
    while remaining.starts_with('[') {
        let Some(end) = remaining.find(']') else {
            break;
        };
        let bracket_content = &remaining[1..end];
        if !looks_like_timestamp(bracket_content) {
            break;
        }
        let time = parse_timestamp(bracket_content).ok_or_else(|| CoreError::MalformedTimestamp {
            line: line_number,
            tag: bracket_content.to_string(),
        })?;
        timestamps.push(time);
        remaining = &remaining[end + 1..];
    }

    if timestamps.is_empty() {
        return Ok(Vec::new());
    }

    let text = remaining.trim();
    let (words, explicit_end) = parse_enhanced_words(text, line_number)?;

    let text = words.as_ref().map_or_else(
        || text.to_string(),
        |w| {
            w.iter()
                .map(|(_, word)| word.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        },
    );

    // Create an entry for each timestamp (handles multi-timestamp lines)
    Ok(timestamps
        .into_iter()
        .map(|start_time| RawEntry {
            start_time,
            text: text.clone(),
            words: words.clone(),
            explicit_end,
        })
        .collect())
}

/// Parse a timestamp string like "00:12.34" or "00:12:34"
fn parse_timestamp(s: &str) -> Option<Duration> {
    let parts: Vec<&str> = s.trim().split(':').collect();

    match parts.as_slice() {
        [minutes, seconds] => {
            // mm:ss.xx or mm:ss
            let minutes: u64 = minutes.parse().ok()?;
            Duration::from_secs(minutes.checked_mul(60)?).checked_add(parse_seconds(seconds)?)
        }
        [minutes, seconds, hundredths] => {
            // mm:ss:xx (hundredths)
            let minutes: u64 = minutes.parse().ok()?;
            let seconds: u64 = seconds.parse().ok()?;
            let hundredths: u64 = hundredths.parse().ok()?;
            if seconds >= 60 || hundredths >= 100 {
                return None;
            }

            let millis = minutes
                .checked_mul(60)?
                .checked_add(seconds)?
                .checked_mul(1000)?
                .checked_add(hundredths * 10)?;
            Some(Duration::from_millis(millis))
        }
        _ => None,
    }
}

/// Parse `ss` or `ss.fff` without going through floating point.
fn parse_seconds(s: &str) -> Option<Duration> {
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() || !all_digits(whole) || !all_digits(frac) || frac.len() > 9 {
        return None;
    }

    let secs: u64 = whole.parse().ok()?;
    if secs >= 60 {
        return None;
    }
    let nanos: u32 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<9}").parse().ok()?
    };

    Some(Duration::new(secs, nanos))
}

type EnhancedWords = (Option<Vec<(Duration, String)>>, Option<Duration>);

/// Parse enhanced LRC word timing: `<mm:ss.xx>word <mm:ss.xx>word <mm:ss.xx>`.
///
/// A trailing tag with no word after it is the end of the last word.
fn parse_enhanced_words(text: &str, line_number: usize) -> Result<EnhancedWords> {
    if !text.starts_with('<') {
        return Ok((None, None));
    }

    let mut words = Vec::new();
    let mut explicit_end = None;
    let mut remaining = text;

    while let Some(rest) = remaining.strip_prefix('<') {
        let Some(end) = rest.find('>') else {
            break;
        };
        let tag = &rest[..end];
        if !looks_like_timestamp(tag) {
            break;
        }
        let start_time = parse_timestamp(tag).ok_or_else(|| CoreError::MalformedTimestamp {
            line: line_number,
            tag: tag.to_string(),
        })?;
        let after = &rest[end + 1..];

        // The word runs until the next tag or the end of the line
        let word_end = after.find('<').unwrap_or(after.len());
        let word_text = after[..word_end].trim();
        if word_text.is_empty() {
            explicit_end = Some(start_time);
        } else {
            words.push((start_time, word_text.to_string()));
            explicit_end = None;
        }
        remaining = after[word_end..].trim_start();
    }

    if words.is_empty() {
        Ok((None, None))
    } else {
        Ok((Some(words), explicit_end))
    }
}

/// Apply a millisecond offset to a duration (can be negative)
fn apply_offset(duration: Duration, offset_ms: i64) -> Duration {
    let magnitude = Duration::from_millis(offset_ms.unsigned_abs());
    if offset_ms >= 0 {
        duration.saturating_add(magnitude)
    } else {
        duration.saturating_sub(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_parse_simple_lrc() {
        let input = "[00:12.34]Hello world";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].start_time, ms(12340));
        assert_eq!(result.lines[0].text, "Hello world");
        assert_eq!(result.lines[0].sync, WordSync::Pending);
    }

    #[test]
    fn test_parse_multiple_lines_resolves_ends() {
        let input = r"
[00:05.00]First line
[00:10.00]Second line
[00:15.00]Third line
";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.lines.len(), 3);
        assert_eq!(result.lines[0].end_time, ms(10000));
        assert_eq!(result.lines[1].end_time, ms(15000));
        // "Third line" = 2 syllables * 0.25s
        assert_eq!(result.lines[2].end_time, ms(15500));
    }

    #[test]
    fn test_final_line_uses_track_length() {
        let input = "[00:05.00]Only line";
        let result =
            LrcFile::parse_with_track_length(input, Some(Duration::from_secs(9))).unwrap();
        assert_eq!(result.lines[0].end_time, Duration::from_secs(9));
    }

    #[test]
    fn test_final_line_uses_length_tag() {
        let input = "[length:00:30.00]\n[00:05.00]Only line";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.metadata.length, Some(Duration::from_secs(30)));
        assert_eq!(result.lines[0].end_time, Duration::from_secs(30));
    }

    #[test]
    fn test_end_marker_closes_line() {
        let input = r"
[00:05.00]First
[00:07.50]
[00:10.00]Second
";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].end_time, ms(7500));
        assert_eq!(result.lines[1].start_time, ms(10000));
    }

    #[test]
    fn test_parse_id_tags() {
        let input = r"
[ti:Song Title]
[ar:Artist Name]
[al:Album Name]
[by:Someone]
[00:05.00]Lyrics here
";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.metadata.title, Some("Song Title".to_string()));
        assert_eq!(result.metadata.artist, Some("Artist Name".to_string()));
        assert_eq!(result.metadata.album, Some("Album Name".to_string()));
        assert_eq!(result.metadata.creator, Some("Someone".to_string()));
    }

    #[test]
    fn test_parse_offset() {
        let input = "[offset:500]\n[00:10.00]Test";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.lines[0].start_time, ms(10500));
    }

    #[test]
    fn test_parse_negative_offset() {
        let input = "[offset:-500]\n[00:10.00]Test";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.lines[0].start_time, ms(9500));
    }

    #[test]
    fn test_comments_skipped() {
        let input = "# Processed\n[00:01.00]Hi";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.lines.len(), 1);
    }

    #[test]
    fn test_malformed_timestamp() {
        let input = "[00:05.00]Fine\n[00:1x.00]Broken";
        let err = LrcFile::parse(input).unwrap_err();
        assert!(matches!(err, CoreError::MalformedTimestamp { line: 2, .. }));
    }

    #[test]
    fn test_malformed_word_timestamp() {
        let input = "[00:05.00]<00:05.00>a <0a:06.00>b";
        assert!(matches!(
            LrcFile::parse(input),
            Err(CoreError::MalformedTimestamp { line: 1, .. })
        ));
    }

    #[test]
    fn test_out_of_range_timestamps_are_malformed() {
        for input in [
            "[99999999999999999:00:00]hi",
            "[307445734561825860:59.00]hi",
            "[00:75:00]hi",
            "[00:05.00]<00:05.00>a <99999999999999999:00:00>b",
        ] {
            assert!(
                matches!(
                    LrcFile::parse(input),
                    Err(CoreError::MalformedTimestamp { line: 1, .. })
                ),
                "{input}"
            );
        }
    }

    #[test]
    fn test_huge_offset_saturates() {
        let input = "[offset:9223372036854775807]\n[00:01.00]hi";
        assert!(LrcFile::parse(input).is_ok());
    }

    #[test]
    fn test_parse_cjk_lyrics() {
        let input = "[00:05.00]你好世界";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.lines[0].text, "你好世界");
    }

    #[test]
    fn test_parse_word_level_line() {
        let input = "[00:12.34]<00:12.34>Hello <00:13.00>world <00:14.00>";
        let result = LrcFile::parse(input).unwrap();
        let line = &result.lines[0];
        assert_eq!(line.sync, WordSync::Synced);
        assert_eq!(line.text, "Hello world");
        assert_eq!(line.end_time, ms(14000));
        assert_eq!(line.words.len(), 2);
        assert_eq!(line.words[0].end_time, ms(13000));
        assert_eq!(line.words[1].start_time, ms(13000));
        assert_eq!(line.words[1].end_time, ms(14000));
        assert!(result.is_word_level());
    }

    #[test]
    fn test_word_level_without_end_tag_runs_to_next_line() {
        let input = "[00:01.00]<00:01.00>a <00:02.00>b\n[00:04.00]next";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.lines[0].end_time, ms(4000));
        assert_eq!(result.lines[0].words[1].end_time, ms(4000));
    }

    #[test]
    fn test_parse_multi_timestamp_line() {
        let input = "[00:05.00][00:15.00]Repeated lyric\n[00:20.00]";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].text, "Repeated lyric");
        assert_eq!(result.lines[1].text, "Repeated lyric");
        assert_eq!(result.lines[0].start_time, ms(5000));
        assert_eq!(result.lines[1].start_time, ms(15000));
        assert_eq!(result.lines[1].end_time, ms(20000));
    }

    #[test]
    fn test_alternative_timestamp_format() {
        let input = "[00:12:34]Hello world";
        let result = LrcFile::parse(input).unwrap();
        assert_eq!(result.lines[0].start_time, ms(12340));
    }

    #[test]
    fn test_line_index_at() {
        let input = r"
[00:05.00]First
[00:10.00]Second
[00:12.00]
[00:15.00]Third
[00:18.00]
";
        let lrc = LrcFile::parse(input).unwrap();

        assert_eq!(lrc.line_index_at(Duration::from_secs(0)), None);
        assert_eq!(lrc.line_index_at(Duration::from_secs(5)), Some(0));
        assert_eq!(lrc.line_index_at(Duration::from_secs(7)), Some(0));
        assert_eq!(lrc.line_index_at(Duration::from_secs(11)), Some(1));
        // Gap between the end marker and the next line
        assert_eq!(lrc.line_index_at(Duration::from_secs(13)), None);
        assert_eq!(lrc.line_index_at(Duration::from_secs(16)), Some(2));
        assert_eq!(lrc.line_index_at(Duration::from_secs(18)), None);
        assert_eq!(lrc.current_line(Duration::from_secs(16)).unwrap().text, "Third");
    }

    #[test]
    fn test_line_index_at_empty() {
        let lrc = LrcFile::default();
        assert_eq!(lrc.line_index_at(Duration::from_secs(3)), None);
    }

    #[test]
    fn test_word_index_at() {
        let lrc = LrcFile::parse("[00:01.00]<00:01.00>a <00:02.00>b <00:03.00>").unwrap();
        let line = &lrc.lines[0];
        assert_eq!(line.word_index_at(ms(500)), None);
        assert_eq!(line.word_index_at(ms(1000)), Some(0));
        assert_eq!(line.word_index_at(ms(2500)), Some(1));
        assert_eq!(line.word_index_at(ms(3000)), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(ms(12340)), "00:12.34");
        assert_eq!(format_timestamp(Duration::from_secs(90)), "01:30.00");
        assert_eq!(format_timestamp(ms(5 * 60 * 1000 + 45 * 1000 + 670)), "05:45.67");
        assert_eq!(format_timestamp(ms(59_996)), "01:00.00");
    }

    #[test]
    fn test_serialize_phrase_with_end_markers() {
        let lrc = LrcFile {
            metadata: LrcMetadata {
                title: Some("Song".to_string()),
                ..Default::default()
            },
            lines: vec![
                LrcLine::new(ms(5000), ms(7000), "Hello world"),
                LrcLine::new(ms(10000), ms(12000), "Second line"),
            ],
        };

        let serialized = lrc.serialize(LrcFormat::Phrase, &["made by test".to_string()]);
        assert!(serialized.starts_with("# made by test\n[ti:Song]\n"));
        assert!(serialized.contains("[00:05.00]Hello world\n[00:07.00]\n[00:10.00]Second line\n[00:12.00]\n"));

        let reparsed = LrcFile::parse(&serialized).unwrap();
        assert_eq!(reparsed.lines, lrc.lines);
    }

    #[test]
    fn test_serialize_word_level_round_trip() {
        let input = "[00:10.00]<00:10.00>hello <00:10.80>world <00:11.60>\n[00:12.00]plain line\n[00:13.00]\n";
        let lrc = LrcFile::parse(input).unwrap();
        let serialized = lrc.serialize(LrcFormat::Word, &[]);
        assert_eq!(serialized, input);
    }

    #[test]
    fn test_word_level_round_trip_rounds_to_centis() {
        let lines = [
            LrcLine::new(ms(10_003), ms(11_004), "one two three"),
            LrcLine::new(ms(11_004), ms(12_500), "four five"),
        ];
        let timed = crate::timing::synthesize_even(&lines);
        assert_ne!(timed[0].words[1].start_time, timed[0].words[1].start_time.round_to_centis());

        let file = LrcFile {
            metadata: LrcMetadata::default(),
            lines: timed.clone(),
        };
        let reparsed = LrcFile::parse(&file.serialize(LrcFormat::Word, &[])).unwrap();

        assert_eq!(reparsed.lines.len(), timed.len());
        for (original, parsed) in timed.iter().zip(&reparsed.lines) {
            assert_eq!(parsed.start_time, original.start_time.round_to_centis());
            assert_eq!(parsed.end_time, original.end_time.round_to_centis());
            assert_eq!(parsed.words.len(), original.words.len());
            for (a, b) in original.words.iter().zip(&parsed.words) {
                assert_eq!(b.text, a.text);
                assert_eq!(b.start_time, a.start_time.round_to_centis());
                assert_eq!(b.end_time, a.end_time.round_to_centis());
            }
        }
    }
}
