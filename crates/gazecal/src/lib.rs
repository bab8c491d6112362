//! High-level entry crate for the `gaze-calibration-rs` toolbox.
//!
//! The engine converts noisy per-frame eye-landmark measurements into a
//! mapping from eye-feature space to screen pixel space, robust to head
//! jitter, landmark noise, and outliers.
//!
//! ## Calibration workflow
//!
//! ```no_run
//! use std::time::Instant;
//! use gazecal::pipeline::{CalibrationSession, CalibrationStore, FrameOutcome, SessionOptions};
//!
//! # fn next_frame() -> Option<gazecal::core::LandmarkFrame> { None }
//! # fn main() -> anyhow::Result<()> {
//! let mut session = CalibrationSession::new(1920, 1080, SessionOptions::default());
//! let store = CalibrationStore::single("calibrations");
//!
//! while !session.is_complete() {
//!     // Host UI shows session.current_target() and triggers collection
//!     // when the user fixates it.
//!     session.begin_collection();
//!
//!     while session.is_collecting() {
//!         match next_frame() {
//!             Some(frame) => {
//!                 session.process_frame(&frame, 640.0, 480.0, Instant::now());
//!             }
//!             None => {
//!                 session.note_detection_lost(Instant::now());
//!             }
//!         }
//!     }
//! }
//!
//! if let Some(artifact) = session.artifact() {
//!     store.save(&artifact)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Applying a stored calibration
//!
//! ```no_run
//! use gazecal::core::Vec2;
//! use gazecal::pipeline::{CalibrationStore, GazeClassifier};
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = CalibrationStore::single("calibrations");
//! let path = store.latest().expect("calibrate first");
//! let artifact = store.load(&path)?;
//!
//! let mut classifier = GazeClassifier::new(artifact.model().clone(), 1920, 1080);
//! let sample = classifier.classify(Vec2::new(317.0, 242.0));
//! println!("gaze at {:.0},{:.0}", sample.screen.x, sample.screen.y);
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! - [`core`]: landmark frames, per-eye feature extraction, signatures.
//! - [`linear`]: outlier trimming, ridge regression, model application.
//! - [`pipeline`]: the collection session, persistence, classification.

pub use gazecal_core as core;
pub use gazecal_linear as linear;
pub use gazecal_pipeline as pipeline;

pub use gazecal_core::{estimate_gaze, head_position, LandmarkFrame, Real, Vec2};
pub use gazecal_linear::{apply, fit_transform, remove_outliers, TransformModel};
pub use gazecal_pipeline::{
    CalibrationArtifact, CalibrationSession, CalibrationStore, GazeClassifier, SessionOptions,
};
