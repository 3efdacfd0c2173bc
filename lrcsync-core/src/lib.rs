pub mod audio;
pub mod config;
pub mod error;
pub mod lrc;
pub mod matcher;
pub mod onset;
pub mod paths;
pub mod pipeline;
pub mod playback;
pub mod segment;
pub mod source;
pub mod sync;
pub mod text;
pub mod time;
pub mod timing;
pub mod tracker;

pub use audio::{find_audio_for_lrc, AudioProbe, AUDIO_EXTENSIONS};
pub use config::{LrcsyncConfig, ProcessorConfig, PullerConfig, VisualizerConfig};

pub use error::{CoreError, Result};
pub use lrc::{format_timestamp, LrcFile, LrcFormat, LrcLine, LrcMetadata, LrcWord, WordSync};
pub use matcher::LyricMatcher;
pub use onset::{OnsetDetector, OnsetSet, OnsetTrack};
pub use paths::{cache_dir, config_dir, config_path, log_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use pipeline::{discover_jobs, BatchReport, FileOutcome, Job, Processor, SkipReason};
pub use playback::{PlaybackState, PlayerObservation, TrackId};
pub use segment::{PhraseSegmenter, SegmentLimits};
pub use source::PlayerSource;
pub use sync::{LyricCursor, LyricsStatus, SyncEngine};
pub use time::DurationExt;
pub use timing::{check_timable, synthesize, synthesize_even, TimingStrategy, WordTimingMode};
pub use tracker::{PositionTracker, TrackerEvent, TrackerSettings};
