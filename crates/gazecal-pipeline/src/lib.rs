//! Calibration session protocol and persistence.
//!
//! This crate drives the point-by-point calibration data collection
//! protocol on top of the feature extraction in `gazecal-core` and the
//! fitting in `gazecal-linear`:
//!
//! - [`grid`] generates the on-screen target layout,
//! - [`session`] is the collection state machine (head-stability gating,
//!   sample validation, per-point windows, completion),
//! - [`patterns`] accumulates landmark-signature diagnostics,
//! - [`artifact`] defines the persisted calibration document and the
//!   store that locates previous calibrations,
//! - [`boundary`] classifies predicted gaze against the viewing area,
//! - [`stop`] is the cooperative cancellation contract for host loops.
//!
//! The session is single-owner and synchronous: one frame in, one outcome
//! out. Hosts embedding it in a threaded application must serialize frame
//! feeds themselves.

pub mod artifact;
pub mod boundary;
pub mod grid;
pub mod patterns;
pub mod session;
pub mod stop;

pub use artifact::{ArtifactError, CalibrationArtifact, CalibrationStore};
pub use boundary::{is_engaged, GazeClassifier, GazeSample, ViewingBounds};
pub use grid::calibration_grid;
pub use patterns::{LandmarkPattern, MappingQuality, PatternRecorder, PointMapping};
pub use session::{
    CalibrationSession, FrameOutcome, RejectReason, SessionOptions, SessionProgress, SkipError,
};
pub use stop::{StopFlag, Stoppable};
