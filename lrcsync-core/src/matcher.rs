//! Resolving the playing track to a synthesized lyric file.

use crate::error::{CoreError, Result};
use crate::lrc::{LrcFile, LrcFormat};
use crate::playback::TrackId;
use crate::text::normalize_for_match;
use crate::timing;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Finds and loads the lyric file for a track.
#[derive(Debug, Clone)]
pub struct LyricMatcher {
    lyric_dir: PathBuf,
    format: LrcFormat,
}

impl LyricMatcher {
    pub fn new(lyric_dir: impl Into<PathBuf>, format: LrcFormat) -> Self {
        Self {
            lyric_dir: lyric_dir.into(),
            format,
        }
    }

    #[must_use]
    pub fn lyric_dir(&self) -> &Path {
        &self.lyric_dir
    }

    #[must_use]
    pub const fn format(&self) -> LrcFormat {
        self.format
    }

    /// Locate the lyric file for `track`.
    ///
    /// Tried in order: a sibling of the track's file, `<lyric_dir>/<stem>`,
    /// any file under the lyric directory whose normalized stem equals the
    /// normalized artist and title, then any whose normalized stem equals
    /// the normalized track stem.
    #[must_use]
    pub fn find(&self, track: &TrackId) -> Option<PathBuf> {
        let ext = self.format.extension();

        if let Some(path) = &track.path {
            let sibling = path.with_extension(ext);
            if sibling.is_file() {
                return Some(sibling);
            }
        }

        let stem = track.stem();
        if let Some(stem) = stem {
            let direct = self.lyric_dir.join(format!("{stem}.{ext}"));
            if direct.is_file() {
                return Some(direct);
            }
        }

        let mut candidates = Vec::new();
        collect_files(&self.lyric_dir, ext, &mut candidates);
        candidates.sort();

        let normalized_stem = |path: &Path| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(normalize_for_match)
        };

        let by_tags = match (&track.artist, &track.title) {
            (Some(artist), Some(title)) => Some(normalize_for_match(&format!("{artist}{title}"))),
            (None, Some(title)) => Some(normalize_for_match(title)),
            _ => None,
        };
        let by_stem = stem.map(normalize_for_match);

        for wanted in [by_tags, by_stem].into_iter().flatten() {
            if wanted.is_empty() {
                continue;
            }
            if let Some(found) = candidates
                .iter()
                .find(|c| normalized_stem(c).as_deref() == Some(wanted.as_str()))
            {
                return Some(found.clone());
            }
        }

        None
    }

    /// Find, read and parse the lyric file for `track`.
    ///
    /// Phrase-level files get even word timing on load, so every line of the
    /// returned track carries words (or is marked unsynced).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoMatchingLyricFile`] when no file matches, or an
    /// I/O or parse error when the matched file can not be loaded.
    pub async fn load(&self, track: &TrackId) -> Result<LrcFile> {
        let matcher = self.clone();
        let wanted = track.clone();
        let found = tokio::task::spawn_blocking(move || matcher.find(&wanted))
            .await
            .map_err(|e| CoreError::IoError(std::io::Error::other(e)))?;

        let Some(path) = found else {
            debug!("No lyric file for {}", track);
            return Err(CoreError::NoMatchingLyricFile {
                track: track.to_string(),
            });
        };

        let content = tokio::fs::read_to_string(&path).await?;
        let mut lrc = LrcFile::parse(&content)?;
        if !lrc.is_word_level() {
            lrc.lines = timing::synthesize_even(&lrc.lines);
        }

        info!("Loaded {} ({} lines)", path.display(), lrc.lines.len());
        Ok(lrc)
    }
}

fn collect_files(dir: &Path, ext: &str, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.filter_map(|e| e.ok().map(|e| e.path())) {
        if path.is_dir() {
            collect_files(&path, ext, out);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        {
            out.push(path);
        }
    }
}
