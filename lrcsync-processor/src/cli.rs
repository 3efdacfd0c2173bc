use clap::Parser;
use lrcsync_core::{CoreError, LrcFormat, ProcessorConfig, Result, WordTimingMode};
use std::path::{Path, PathBuf};

/// Split phrase-level LRC files into short phrases and synthesize word timing.
#[derive(Debug, Parser)]
#[command(name = "lrcsync-process", version, about)]
pub struct Cli {
    /// Directory containing phrase-level .lrc files
    #[arg(long, value_name = "DIR")]
    pub lrc_dir: PathBuf,

    /// Directory the processed files are written to
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Directory with the matching audio files (onset detection and track length)
    #[arg(long, value_name = "DIR")]
    pub audio_dir: Option<PathBuf>,

    /// Write word-level .wlrc files instead of segmented .lrc files
    #[arg(long)]
    pub wlrc: bool,

    /// Config file (TOML, or JSON with a .json extension)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Replace output files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Number of files processed concurrently
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Split lines longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub max_phrase_duration: Option<f64>,

    /// Drop lines shorter than this many seconds (0 keeps every line)
    #[arg(long, value_name = "SECS")]
    pub min_phrase_duration: Option<f64>,

    /// Split lines with more words than this
    #[arg(long, value_name = "N")]
    pub max_words: Option<usize>,

    /// Cut lines after every comma before length-based splitting
    #[arg(long, overrides_with = "no_split_commas")]
    pub split_commas: bool,

    /// Only split lines that exceed the duration or word limits
    #[arg(long, overrides_with = "split_commas")]
    pub no_split_commas: bool,

    /// Align word starts to onsets detected with aubioonset
    #[arg(long)]
    pub onset_detection: bool,

    /// Skip lyric files that have no matching audio file
    #[arg(long, overrides_with = "no_require_audio")]
    pub require_audio: bool,

    /// Process lyric files without audio, estimating the final line end
    #[arg(long, overrides_with = "require_audio")]
    pub no_require_audio: bool,

    /// Only log warnings and errors
    #[arg(long, short)]
    pub quiet: bool,
}

impl Cli {
    #[must_use]
    pub const fn format(&self) -> LrcFormat {
        if self.wlrc {
            LrcFormat::Word
        } else {
            LrcFormat::Phrase
        }
    }

    /// Command-line flags win over the config file.
    pub fn apply_overrides(&self, config: &mut ProcessorConfig) {
        if self.overwrite {
            config.overwrite = true;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(secs) = self.max_phrase_duration {
            config.max_phrase_duration = secs;
        }
        if let Some(secs) = self.min_phrase_duration {
            config.min_phrase_duration = secs;
        }
        if let Some(words) = self.max_words {
            config.max_words_per_phrase = words;
        }
        if self.split_commas {
            config.split_on_commas = true;
        } else if self.no_split_commas {
            config.split_on_commas = false;
        }
        if self.onset_detection {
            config.word_timing = WordTimingMode::Onset;
        }
        if self.require_audio {
            config.require_audio = true;
        } else if self.no_require_audio {
            config.require_audio = false;
        }
    }

    /// Default log filter when `RUST_LOG` is not set.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Check the input directories exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCliArgument`] naming the first missing directory.
    pub fn validate(&self) -> Result<()> {
        require_dir("--lrc-dir", &self.lrc_dir)?;
        if let Some(audio_dir) = &self.audio_dir {
            require_dir("--audio-dir", audio_dir)?;
        }
        if self.workers == Some(0) {
            return Err(invalid("--workers must be at least 1"));
        }
        if self.max_words == Some(0) {
            return Err(invalid("--max-words must be at least 1"));
        }
        if let Some(secs) = self.max_phrase_duration {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(invalid(format!(
                    "--max-phrase-duration must be positive, got {secs}"
                )));
            }
        }
        if let Some(secs) = self.min_phrase_duration {
            if !(secs.is_finite() && secs >= 0.0) {
                return Err(invalid(format!(
                    "--min-phrase-duration must not be negative, got {secs}"
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidCliArgument {
        message: message.into(),
    }
}

fn require_dir(flag: &str, path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(invalid(format!("{flag} {} is not a directory", path.display())))
    }
}
