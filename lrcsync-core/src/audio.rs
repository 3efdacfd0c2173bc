//! Audio file lookup and duration probing.

use crate::error::Result;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::trace;

/// Extensions recognized as audio files, in lookup priority order.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "m4a", "ogg", "opus", "wav", "wma", "aac"];

/// External capability reporting the duration of an audio file.
#[async_trait]
pub trait AudioProbe: Send + Sync {
    /// Returns a human-readable name for this probe.
    fn name(&self) -> &'static str;

    /// Probe the playable duration of `audio`.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe tool is missing, fails, or times out.
    async fn duration(&self, audio: &Path) -> Result<Duration>;
}

/// Whether the path has one of the [`AUDIO_EXTENSIONS`].
#[must_use]
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

/// Locate the audio file belonging to a lyric file.
///
/// Tried in order: a sibling with the same stem, the mirrored location
/// under `audio_dir` (`relative_dir` is the lyric file's directory relative
/// to the lyric root), `audio_dir/<stem>.<ext>`, then a recursive,
/// case-insensitive stem search under `audio_dir`.
#[must_use]
pub fn find_audio_for_lrc(
    lrc_path: &Path,
    relative_dir: Option<&Path>,
    audio_dir: Option<&Path>,
) -> Option<PathBuf> {
    let stem = lrc_path.file_stem()?.to_str()?;

    if let Some(found) = lrc_path.parent().and_then(|dir| with_any_extension(dir, stem)) {
        return Some(found);
    }

    let audio_dir = audio_dir?;
    if let Some(found) = relative_dir
        .filter(|rel| !rel.as_os_str().is_empty())
        .and_then(|rel| with_any_extension(&audio_dir.join(rel), stem))
    {
        return Some(found);
    }
    if let Some(found) = with_any_extension(audio_dir, stem) {
        return Some(found);
    }

    let wanted = stem.to_lowercase();
    let found = search_by_stem(audio_dir, &wanted);
    if found.is_none() {
        trace!("No audio found for {}", lrc_path.display());
    }
    found
}

fn with_any_extension(dir: &Path, stem: &str) -> Option<PathBuf> {
    AUDIO_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}

fn search_by_stem(dir: &Path, wanted: &str) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    let mut subdirs = Vec::new();
    for path in entries {
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let matches = is_audio_file(&path)
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.to_lowercase() == wanted);
        if matches {
            return Some(path);
        }
    }

    subdirs.iter().find_map(|sub| search_by_stem(sub, wanted))
}
