use clap::Parser;
use lrcsync_core::{CoreError, LrcFormat, Result, VisualizerConfig};
use std::path::PathBuf;

/// Show the lyrics of the track playing in an MPRIS player, word by word.
#[derive(Debug, Parser)]
#[command(name = "lrcsync-vis", version, about)]
pub struct Cli {
    /// Directory containing the processed lyric files
    #[arg(long, value_name = "DIR")]
    pub lrc_dir: PathBuf,

    /// Look for word-level .wlrc files instead of .lrc
    #[arg(long)]
    pub wlrc: bool,

    /// JSON file with additional fonts
    #[arg(long, value_name = "FILE")]
    pub custom_fonts: Option<PathBuf>,

    /// Font to render with (defaults to visualizer.default_font)
    #[arg(long, value_name = "NAME")]
    pub font: Option<String>,

    /// Config file (TOML, or JSON with a .json extension)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Render tick in seconds
    #[arg(long, value_name = "SECONDS")]
    pub refresh_rate: Option<f64>,

    /// Player to follow, as named by `playerctl --list-all`
    #[arg(long, value_name = "NAME")]
    pub player: Option<String>,
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

    /// Font named on the command line, else the configured default.
    #[must_use]
    pub fn font_name<'a>(&'a self, config: &'a VisualizerConfig) -> &'a str {
        self.font.as_deref().unwrap_or(&config.default_font)
    }

    pub fn apply_overrides(&self, config: &mut VisualizerConfig) {
        if let Some(refresh_rate) = self.refresh_rate {
            config.refresh_rate = refresh_rate;
        }
    }

    /// Check the paths given on the command line exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCliArgument`] for the first bad path.
    pub fn validate(&self) -> Result<()> {
        if !self.lrc_dir.is_dir() {
            return Err(CoreError::InvalidCliArgument {
                message: format!("--lrc-dir {} is not a directory", self.lrc_dir.display()),
            });
        }
        if let Some(fonts) = &self.custom_fonts {
            if !fonts.is_file() {
                return Err(CoreError::InvalidCliArgument {
                    message: format!("--custom-fonts {} does not exist", fonts.display()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_overrides() {
        let cli = Cli::try_parse_from([
            "lrcsync-vis",
            "--lrc-dir",
            "lyrics",
            "--wlrc",
            "--font",
            "plain",
            "--refresh-rate",
            "0.1",
        ])
        .unwrap();
        assert_eq!(cli.format(), LrcFormat::Word);

        let mut config = VisualizerConfig::default();
        cli.apply_overrides(&mut config);
        assert!((config.refresh_rate - 0.1).abs() < f64::EPSILON);
        assert_eq!(cli.font_name(&config), "plain");
    }

    #[test]
    fn test_font_defaults_to_config() {
        let cli = Cli::try_parse_from(["lrcsync-vis", "--lrc-dir", "lyrics"]).unwrap();
        let config = VisualizerConfig {
            default_font: "thin".to_string(),
            ..VisualizerConfig::default()
        };
        assert_eq!(cli.format(), LrcFormat::Phrase);
        assert_eq!(cli.font_name(&config), "thin");
    }

    #[test]
    fn test_validate_paths() {
        let dir = tempfile::tempdir().unwrap();
        let lyrics = dir.path().display().to_string();
        let ok = Cli::try_parse_from(["lrcsync-vis", "--lrc-dir", lyrics.as_str()]).unwrap();
        assert!(ok.validate().is_ok());

        let missing_fonts = Cli::try_parse_from([
            "lrcsync-vis",
            "--lrc-dir",
            lyrics.as_str(),
            "--custom-fonts",
            "/nonexistent/fonts.json",
        ])
        .unwrap();
        assert!(matches!(
            missing_fonts.validate(),
            Err(CoreError::InvalidCliArgument { .. })
        ));
    }
}
