//! Core primitives for `gaze-calibration-rs`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec2`, ...),
//! - the facial landmark frame model and fixed landmark index tables,
//! - per-eye feature extraction (iris center, gaze vector, quality),
//! - landmark signature extraction for diagnostics.
//!
//! Feature extraction pipeline:
//! `landmark frame → per-eye analysis → binocular combination → gaze point`
//!
//! All extraction is fallible-by-degradation: missing landmarks lower the
//! quality score or trigger fallbacks, they never abort a frame.

/// Linear algebra type aliases and small statistics helpers.
pub mod math;
/// Facial landmark frame model and fixed index tables.
pub mod landmarks;
/// Per-eye gaze feature extraction and binocular combination.
pub mod features;
/// Landmark signature extraction for pattern diagnostics.
pub mod signature;
/// Synthetic landmark frames for workspace test suites.
pub mod test_utils;

pub use features::*;
pub use landmarks::*;
pub use math::*;
pub use signature::*;
