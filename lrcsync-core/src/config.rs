use crate::error::{CoreError, Result};
use crate::timing::WordTimingMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LrcsyncConfig {
    pub processor: ProcessorConfig,
    pub visualizer: VisualizerConfig,
    /// Settings of the lyric fetch stage; recognized so shared config files load
    pub puller: PullerConfig,
}

/// Offline processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorConfig {
    /// Seconds
    pub max_phrase_duration: f64,
    pub max_words_per_phrase: usize,
    /// Seconds; lines shorter than this are dropped, 0 disables
    pub min_phrase_duration: f64,
    pub split_on_commas: bool,
    /// Skip lyric files with no matching audio file instead of estimating
    pub require_audio: bool,
    pub word_timing: WordTimingMode,
    /// Seconds
    pub min_onset_gap: f64,
    pub preserve_structure: bool,
    pub overwrite: bool,
    pub workers: usize,
    pub tool_timeout_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_phrase_duration: 2.5,
            max_words_per_phrase: 8,
            min_phrase_duration: 0.0,
            split_on_commas: false,
            require_audio: false,
            word_timing: WordTimingMode::Even,
            min_onset_gap: 0.08,
            preserve_structure: true,
            overwrite: false,
            workers: 4,
            tool_timeout_secs: 30,
        }
    }
}

impl ProcessorConfig {
    #[must_use]
    pub fn max_phrase_duration(&self) -> Duration {
        secs(self.max_phrase_duration)
    }

    #[must_use]
    pub fn min_phrase_duration(&self) -> Duration {
        secs(self.min_phrase_duration)
    }

    #[must_use]
    pub fn min_onset_gap(&self) -> Duration {
        secs(self.min_onset_gap)
    }

    #[must_use]
    pub const fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        require_positive("processor.max_phrase_duration", self.max_phrase_duration)?;
        require_non_negative("processor.min_phrase_duration", self.min_phrase_duration)?;
        require_non_negative("processor.min_onset_gap", self.min_onset_gap)?;
        require_at_least_one("processor.max_words_per_phrase", self.max_words_per_phrase)?;
        require_at_least_one("processor.workers", self.workers)?;
        if self.tool_timeout_secs == 0 {
            return Err(invalid("processor.tool_timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

/// Live visualizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualizerConfig {
    pub default_font: String,
    /// Render tick, seconds
    pub refresh_rate: f64,
    /// Player poll interval, seconds
    pub poll_interval: f64,
    /// Seconds
    pub player_timeout: f64,
    /// Seconds
    pub seek_threshold: f64,
    /// Fraction of the observed drift applied per sample, in `(0, 1]`
    pub drift_correction: f64,
    /// Seconds
    pub redraw_interval: f64,
    pub colors_enabled: bool,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            default_font: "block".to_string(),
            refresh_rate: 0.05,
            poll_interval: 0.05,
            player_timeout: 0.5,
            seek_threshold: 1.0,
            drift_correction: 0.5,
            redraw_interval: 1.0,
            colors_enabled: true,
        }
    }
}

impl VisualizerConfig {
    #[must_use]
    pub fn refresh_rate(&self) -> Duration {
        secs(self.refresh_rate)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        secs(self.poll_interval)
    }

    #[must_use]
    pub fn player_timeout(&self) -> Duration {
        secs(self.player_timeout)
    }

    #[must_use]
    pub fn seek_threshold(&self) -> Duration {
        secs(self.seek_threshold)
    }

    #[must_use]
    pub fn redraw_interval(&self) -> Duration {
        secs(self.redraw_interval)
    }

    fn validate(&self) -> Result<()> {
        if self.default_font.trim().is_empty() {
            return Err(invalid("visualizer.default_font must not be empty"));
        }
        require_positive("visualizer.refresh_rate", self.refresh_rate)?;
        require_positive("visualizer.poll_interval", self.poll_interval)?;
        require_positive("visualizer.player_timeout", self.player_timeout)?;
        require_positive("visualizer.seek_threshold", self.seek_threshold)?;
        require_positive("visualizer.redraw_interval", self.redraw_interval)?;
        if !(self.drift_correction > 0.0 && self.drift_correction <= 1.0) {
            return Err(invalid(format!(
                "visualizer.drift_correction must be in (0, 1], got {}",
                self.drift_correction
            )));
        }
        Ok(())
    }
}

/// Lyric fetch stage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PullerConfig {
    pub search_threads: usize,
    pub download_threads: usize,
    pub preserve_structure: bool,
}

impl Default for PullerConfig {
    fn default() -> Self {
        Self {
            search_threads: 5,
            download_threads: 5,
            preserve_structure: true,
        }
    }
}

impl PullerConfig {
    fn validate(&self) -> Result<()> {
        require_at_least_one("puller.search_threads", self.search_threads)?;
        require_at_least_one("puller.download_threads", self.download_threads)
    }
}

impl LrcsyncConfig {
    /// Get the configuration directory path (~/.config/lrcsync/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/lrcsync/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, the default config file is
    /// used when present, otherwise built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing (explicit path only), cannot be
    /// read or parsed, or holds out-of-range values.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(CoreError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = Self::config_path();
                if !default_path.exists() {
                    debug!("No config file at {}, using defaults", default_path.display());
                    return Ok(Self::default());
                }
                default_path
            }
        };

        info!("Loading config from {}", path.display());
        Self::from_file(&path)
    }

    /// Read and validate a config file; `.json` files are parsed as JSON,
    /// everything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::ConfigParseError`] for malformed TOML or unknown
    /// fields, and [`CoreError::ConfigInvalid`] for out-of-range values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::ConfigJsonError`] for malformed JSON or unknown
    /// fields, and [`CoreError::ConfigInvalid`] for out-of-range values.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content).map_err(CoreError::ConfigJsonError)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.processor.validate()?;
        self.visualizer.validate()?;
        self.puller.validate()
    }
}

fn secs(value: f64) -> Duration {
    crate::time::secs_to_duration(value).unwrap_or(Duration::ZERO)
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.into(),
    }
}

/// The value must convert to a non-zero duration; sub-nanosecond values round to zero.
fn require_positive(field: &str, value: f64) -> Result<()> {
    if crate::time::secs_to_duration(value).is_some_and(|d| !d.is_zero()) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be a positive number of seconds, got {value}")))
    }
}

fn require_non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must not be negative, got {value}")))
    }
}

fn require_at_least_one(field: &str, value: usize) -> Result<()> {
    if value >= 1 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be at least 1")))
    }
}
