//! Offline batch processing: phrase-level lyric files in, segmented and
//! word-timed lyric files out.

use crate::audio::{find_audio_for_lrc, AudioProbe};
use crate::config::ProcessorConfig;
use crate::error::{CoreError, Result};
use crate::lrc::{LrcFile, LrcFormat, WordSync};
use crate::onset::{OnsetDetector, OnsetTrack};
use crate::segment::{PhraseSegmenter, SegmentLimits};
use crate::timing::{self, TimingStrategy, WordTimingMode};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Extension of the phrase-level input files.
const INPUT_EXTENSION: &str = "lrc";

/// One file to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Directory of `input` relative to the lyric root, used to find mirrored audio
    pub relative_dir: Option<PathBuf>,
}

/// Why a file was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OutputExists,
    AlreadyWordLevel,
    /// `require_audio` is set and no audio file was found
    NoAudio,
}

/// Result of processing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Written {
        output: PathBuf,
        lines: usize,
        timing: WordTimingMode,
    },
    Skipped(SkipReason),
}

/// Summary of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    /// Input path and error message of every failed file, sorted by path
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed.len()
    }
}

/// Find the input lyric files under `lrc_dir` and map them into `output_dir`.
///
/// With `preserve_structure` the search is recursive and the relative layout
/// is mirrored; otherwise only the top level is scanned and outputs are flat.
///
/// # Errors
///
/// Returns an error if `lrc_dir` can not be read.
pub fn discover_jobs(
    lrc_dir: &Path,
    output_dir: &Path,
    format: LrcFormat,
    preserve_structure: bool,
) -> Result<Vec<Job>> {
    let mut inputs = Vec::new();
    collect_inputs(lrc_dir, preserve_structure, &mut inputs)?;
    inputs.sort();

    Ok(inputs
        .into_iter()
        .map(|input| {
            let relative = input.strip_prefix(lrc_dir).unwrap_or(&input).to_path_buf();
            let relative_dir = relative.parent().map(Path::to_path_buf);
            let output = if preserve_structure {
                output_dir.join(&relative)
            } else {
                output_dir.join(relative.file_name().unwrap_or(relative.as_os_str()))
            }
            .with_extension(format.extension());
            Job {
                input,
                output,
                relative_dir,
            }
        })
        .collect())
}

fn collect_inputs(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                collect_inputs(&path, recursive, out)?;
            }
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(INPUT_EXTENSION))
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Processes lyric files with the configured segmentation and word timing.
pub struct Processor {
    config: ProcessorConfig,
    format: LrcFormat,
    audio_dir: Option<PathBuf>,
    detector: Option<Arc<dyn OnsetDetector>>,
    probe: Option<Arc<dyn AudioProbe>>,
}

impl Processor {
    #[must_use]
    pub const fn new(config: ProcessorConfig, format: LrcFormat) -> Self {
        Self {
            config,
            format,
            audio_dir: None,
            detector: None,
            probe: None,
        }
    }

    #[must_use]
    pub fn with_audio_dir(mut self, audio_dir: Option<PathBuf>) -> Self {
        self.audio_dir = audio_dir;
        self
    }

    #[must_use]
    pub fn with_onset_detector(mut self, detector: Arc<dyn OnsetDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    #[must_use]
    pub fn with_audio_probe(mut self, probe: Arc<dyn AudioProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Process every job on a bounded pool of `workers` concurrent tasks.
    ///
    /// Per-file errors are logged and recorded; the batch always runs to the end.
    pub async fn run_batch(self: &Arc<Self>, jobs: Vec<Job>) -> BatchReport {
        let permits = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();

        info!(
            "Processing {} files with {} workers",
            jobs.len(),
            self.config.workers
        );

        let mut inputs = HashMap::with_capacity(jobs.len());
        for job in jobs {
            let permits = Arc::clone(&permits);
            let processor = Arc::clone(self);
            let input = job.input.clone();
            let handle = tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let outcome = processor.process_file(&job).await;
                (job, outcome)
            });
            inputs.insert(handle.id(), input);
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (job, Ok(FileOutcome::Written { output, lines, timing })))) => {
                    info!(
                        "Wrote {} ({} lines, {} timing)",
                        output.display(),
                        lines,
                        timing
                    );
                    debug!("Source: {}", job.input.display());
                    report.processed += 1;
                }
                Ok((_, (job, Ok(FileOutcome::Skipped(reason))))) => {
                    info!("Skipped {}: {:?}", job.input.display(), reason);
                    report.skipped += 1;
                }
                Ok((_, (job, Err(e @ CoreError::AlreadyWordLevel { .. })))) => {
                    info!("Skipped {}: {}", job.input.display(), e);
                    report.skipped += 1;
                }
                Ok((_, (job, Err(e)))) => {
                    error!("Failed to process {}: {}", job.input.display(), e);
                    report.failed.push((job.input, e.to_string()));
                }
                Err(e) => {
                    let input = inputs.remove(&e.id()).unwrap_or_default();
                    error!("Processing task for {} failed: {}", input.display(), e);
                    report.failed.push((input, e.to_string()));
                }
            }
        }

        report.failed.sort();
        report
    }

    /// Process one lyric file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoLyricLines`] for inputs without a single timed
    /// line, [`CoreError::AlreadyWordLevel`] for inputs that already carry
    /// word timing, or any read, parse, or write error.
    pub async fn process_file(&self, job: &Job) -> Result<FileOutcome> {
        if !self.config.overwrite && tokio::fs::try_exists(&job.output).await.unwrap_or(false) {
            return Ok(FileOutcome::Skipped(SkipReason::OutputExists));
        }

        let content = tokio::fs::read_to_string(&job.input).await?;
        let audio = self.locate_audio(job).await;
        if audio.is_none() && self.config.require_audio {
            return Ok(FileOutcome::Skipped(SkipReason::NoAudio));
        }
        let track_length = self.probe_duration(audio.as_deref()).await;

        let lrc = LrcFile::parse_with_track_length(&content, track_length)?;
        if lrc.lines.is_empty() {
            return Err(CoreError::NoLyricLines {
                path: job.input.clone(),
            });
        }
        if lrc.is_word_level() {
            return Err(CoreError::AlreadyWordLevel {
                path: job.input.clone(),
            });
        }

        let onsets = if self.format == LrcFormat::Word
            && self.config.word_timing == WordTimingMode::Onset
        {
            self.detect_onsets(audio.as_deref(), &job.input).await
        } else {
            None
        };
        let timing = if onsets.is_some() {
            WordTimingMode::Onset
        } else {
            WordTimingMode::Even
        };

        let processed = self.transform(lrc, onsets.as_ref());
        let unsynced = processed
            .lines
            .iter()
            .filter(|l| l.sync == WordSync::Unsynced)
            .count();
        if unsynced > 0 {
            warn!(
                "{}: {} lines could not be word-timed",
                job.input.display(),
                unsynced
            );
        }

        let header = vec![
            "Processed by lrcsync".to_string(),
            format!("Word timing: {timing}"),
        ];
        let serialized = processed.serialize(self.format, &header);

        if let Some(parent) = job.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&job.output, serialized).await?;

        Ok(FileOutcome::Written {
            output: job.output.clone(),
            lines: processed.lines.len(),
            timing,
        })
    }

    /// Drop short lines, segment, and (for word-level output) synthesize word timing.
    #[must_use]
    pub fn transform(&self, mut lrc: LrcFile, onsets: Option<&OnsetTrack>) -> LrcFile {
        let min_duration = self.config.min_phrase_duration();
        if !min_duration.is_zero() {
            let before = lrc.lines.len();
            lrc.lines.retain(|line| line.duration() >= min_duration);
            debug!("Dropped {} short lines", before - lrc.lines.len());
        }

        let segmenter = PhraseSegmenter::new(SegmentLimits::from(&self.config));
        let lines = segmenter.segment_all(&lrc.lines);

        lrc.lines = match self.format {
            LrcFormat::Phrase => lines,
            LrcFormat::Word => lines
                .iter()
                .map(|line| match onsets {
                    Some(track) => {
                        let set = track.within(line.start_time, line.end_time);
                        timing::synthesize(line, TimingStrategy::OnsetAligned(&set))
                    }
                    None => timing::synthesize(line, TimingStrategy::Even),
                })
                .collect(),
        };
        lrc
    }

    async fn locate_audio(&self, job: &Job) -> Option<PathBuf> {
        let input = job.input.clone();
        let relative_dir = job.relative_dir.clone();
        let audio_dir = self.audio_dir.clone();
        tokio::task::spawn_blocking(move || {
            find_audio_for_lrc(&input, relative_dir.as_deref(), audio_dir.as_deref())
        })
        .await
        .ok()
        .flatten()
    }

    async fn probe_duration(&self, audio: Option<&Path>) -> Option<std::time::Duration> {
        let (probe, audio) = (self.probe.as_ref()?, audio?);
        match probe.duration(audio).await {
            Ok(duration) => Some(duration),
            Err(e) => {
                debug!("{} could not probe {}: {}", probe.name(), audio.display(), e);
                None
            }
        }
    }

    async fn detect_onsets(&self, audio: Option<&Path>, input: &Path) -> Option<OnsetTrack> {
        let Some(detector) = &self.detector else {
            warn!("Onset timing requested but no onset detector is available, using even timing");
            return None;
        };
        let Some(audio) = audio else {
            info!("No audio found for {}, using even timing", input.display());
            return None;
        };

        match detector.detect(audio).await {
            Ok(raw) => {
                let track = OnsetTrack::new(raw, self.config.min_onset_gap());
                debug!("{} found {} onsets in {}", detector.name(), track.len(), audio.display());
                Some(track)
            }
            Err(e) => {
                warn!("{}, using even timing for {}", e, input.display());
                None
            }
        }
    }
}
