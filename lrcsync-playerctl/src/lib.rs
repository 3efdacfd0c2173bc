//! MPRIS player integration through `playerctl`.
//!
//! [`PlayerctlSource`] answers single queries; [`PlayerPoller`] runs them on
//! an interval and publishes the latest [`PlayerObservation`] on a watch
//! channel for the render loop.
//!
//! [`PlayerObservation`]: lrcsync_core::PlayerObservation

pub mod error;
pub mod poller;
pub mod source;

pub use error::PlayerctlError;
pub use poller::{backoff_delay, ObservationReceiver, PlayerPoller, MAX_BACKOFF};
pub use source::{parse_metadata, PlayerctlSource};
