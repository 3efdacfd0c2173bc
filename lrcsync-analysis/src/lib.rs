//! External audio analysis tools behind the core capability traits.
//!
//! - [`AubioOnsetDetector`] implements [`lrcsync_core::OnsetDetector`]
//! - [`FfprobeProbe`] implements [`lrcsync_core::AudioProbe`]
//!
//! Every invocation is bounded by a timeout and the child process is killed
//! when it expires.

pub mod aubio;
pub mod ffprobe;
pub mod tool;

pub use aubio::{AubioOnsetDetector, AUBIO_ONSET_PROGRAM};
pub use ffprobe::{FfprobeProbe, FFPROBE_PROGRAM};
pub use tool::{find_in_path, run_tool, ToolError};
