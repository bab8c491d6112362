//! The calibration collection state machine.
//!
//! A session walks a fixed target list point by point:
//!
//! ```text
//! AwaitingStart(i) ──begin_collection──▶ Collecting(i)
//! Collecting(i)    ──45 valid frames──▶ AwaitingStart(i+1)
//! AwaitingStart(N) ─────────────────────▶ Complete (fit + artifact data)
//! ```
//!
//! While collecting, every frame passes two gates before its gaze sample is
//! accepted: the head must stay within 12 px of the baseline captured at
//! collection start (a moved head re-anchors the baseline and restarts the
//! point's window; the regression assumes a fixed head pose), and the
//! extracted eye position must pass loose sanity bounds. Rejections discard
//! the sample and keep collecting; they are reported, never raised.
//!
//! The stability gate only protects a single target's window. Slow head
//! drift *across* targets is tolerated by design and will show up in the
//! final accuracy figures instead.
//!
//! The session owns its buffers exclusively and is synchronous; hosts must
//! serialize frame feeds (single-writer discipline) and check their stop
//! signal between frames.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gazecal_core::{
    estimate_gaze, extract_signature, head_position, variance_per_axis, LandmarkFrame, Real, Vec2,
};
use gazecal_linear::{fit_transform, remove_outliers, FitOptions, TransformModel};

use crate::artifact::{ArtifactError, CalibrationArtifact, CalibrationStore, TIMESTAMP_FORMAT};
use crate::grid::calibration_grid;
use crate::patterns::PatternRecorder;

/// Options controlling the collection protocol.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Valid samples required per calibration target.
    pub frames_per_point: usize,

    /// Head displacement (px) from the baseline that restarts the current
    /// target's window.
    pub head_move_threshold: Real,

    /// Detection gaps shorter than this do not count as lost tracking.
    pub detection_grace: Duration,

    /// Upper sanity bounds for extracted eye positions, `[x, y]` in source
    /// frame pixels. Positions outside `[0, x]×[0, y]` are discarded.
    pub eye_bounds: [Real; 2],

    /// Per-axis variance limit for the per-target quality diagnostic.
    pub point_variance_limit: Real,

    /// Minimum samples for the per-target diagnostic to count as good.
    pub min_point_samples: usize,

    /// Fitting options applied at session completion.
    pub fit: FitOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            frames_per_point: 45,
            head_move_threshold: 12.0,
            detection_grace: Duration::from_secs(2),
            eye_bounds: [1000.0, 800.0],
            point_variance_limit: 100.0,
            min_point_samples: 10,
            fit: FitOptions::default(),
        }
    }
}

/// Why a frame's sample was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Eye position outside the sanity bounds.
    OutOfBounds,
    /// Exact (0, 0), treated as a detector sentinel.
    ZeroSentinel,
    /// NaN or infinite coordinate.
    NonFinite,
}

/// Result of feeding one frame (or one detection gap) to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Session is not collecting (or already complete); frame ignored.
    Idle,
    /// No usable detection this frame; `within_grace` is false once the
    /// gap exceeds the grace period.
    NoDetection { within_grace: bool },
    /// Head moved beyond the threshold; window restarted.
    HeadMoved { distance: Real },
    /// Sample discarded by the validity gate.
    Rejected(RejectReason),
    /// Sample accepted; `frames` valid samples collected for this target.
    Collected { frames: usize },
    /// Target finished; `good_quality` is the variance diagnostic.
    PointComplete { index: usize, good_quality: bool },
    /// All targets finished; the transformation has been fit.
    Complete,
}

/// Read-mostly progress snapshot for host UIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProgress {
    pub current_point: usize,
    pub total_points: usize,
    pub frames_collected: usize,
    pub frames_per_point: usize,
    pub collecting: bool,
    pub complete: bool,
}

#[derive(Debug, Error)]
pub enum SkipError {
    /// No previous calibration exists; the session must be completed.
    #[error("no previous calibration file found; complete a calibration first")]
    NoPreviousCalibration,
    #[error(transparent)]
    Load(#[from] ArtifactError),
}

/// A calibration data-collection session.
///
/// Owns the accumulated buffers exclusively; not thread-safe by design.
pub struct CalibrationSession {
    options: SessionOptions,
    screen: [u32; 2],
    points: Vec<Vec2>,
    current_point: usize,
    eye_data: Vec<Vec2>,
    screen_data: Vec<Vec2>,
    collection_frames: usize,
    collecting: bool,
    baseline_head: Option<Vec2>,
    point_quality: Vec<bool>,
    patterns: PatternRecorder,
    last_detection: Option<Instant>,
    complete: bool,
    model: Option<TransformModel>,
}

impl CalibrationSession {
    pub fn new(screen_w: u32, screen_h: u32, options: SessionOptions) -> Self {
        let points = calibration_grid(screen_w, screen_h);
        debug!(
            "calibration session over {} targets on {screen_w}x{screen_h}",
            points.len()
        );
        Self {
            options,
            screen: [screen_w, screen_h],
            points,
            current_point: 0,
            eye_data: Vec::new(),
            screen_data: Vec::new(),
            collection_frames: 0,
            collecting: false,
            baseline_head: None,
            point_quality: Vec::new(),
            patterns: PatternRecorder::new(),
            last_detection: None,
            complete: false,
            model: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// The fitted (or skipped-in) transformation, once complete.
    pub fn model(&self) -> Option<&TransformModel> {
        self.model.as_ref()
    }

    pub fn targets(&self) -> &[Vec2] {
        &self.points
    }

    /// The target the user should fixate now.
    pub fn current_target(&self) -> Option<Vec2> {
        self.points.get(self.current_point).copied()
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            current_point: self.current_point,
            total_points: self.points.len(),
            frames_collected: self.collection_frames,
            frames_per_point: self.options.frames_per_point,
            collecting: self.collecting,
            complete: self.complete,
        }
    }

    /// Accumulated raw samples (pre outlier removal), index-paired.
    pub fn samples(&self) -> (&[Vec2], &[Vec2]) {
        (&self.eye_data, &self.screen_data)
    }

    /// Per-target variance diagnostics for completed targets.
    pub fn point_quality(&self) -> &[bool] {
        &self.point_quality
    }

    /// Start collecting for the current target. Returns false when the
    /// session is complete, already collecting, or out of targets.
    pub fn begin_collection(&mut self) -> bool {
        if self.complete || self.collecting || self.current_point >= self.points.len() {
            return false;
        }
        self.collecting = true;
        self.collection_frames = 0;
        self.baseline_head = None;
        debug!("collecting target {}", self.current_point + 1);
        true
    }

    /// Report a frame with no usable face detection.
    pub fn note_detection_lost(&mut self, now: Instant) -> FrameOutcome {
        let within_grace = self
            .last_detection
            .is_some_and(|t| now.duration_since(t) < self.options.detection_grace);
        FrameOutcome::NoDetection { within_grace }
    }

    /// Feed one detected landmark frame.
    ///
    /// `frame_w`/`frame_h` are the source (camera) frame dimensions the
    /// landmark coordinates are normalized against.
    pub fn process_frame(
        &mut self,
        frame: &LandmarkFrame,
        frame_w: Real,
        frame_h: Real,
        now: Instant,
    ) -> FrameOutcome {
        if !frame.is_full_detection() {
            return self.note_detection_lost(now);
        }
        self.last_detection = Some(now);

        if self.complete || !self.collecting {
            return FrameOutcome::Idle;
        }

        let head = head_position(frame, frame_w, frame_h);
        match self.baseline_head {
            None => self.baseline_head = Some(head),
            Some(baseline) => {
                let distance = (head - baseline).norm();
                if distance > self.options.head_move_threshold {
                    debug!("head moved {distance:.1} px; restarting target window");
                    self.collection_frames = 0;
                    self.baseline_head = Some(head);
                    return FrameOutcome::HeadMoved { distance };
                }
            }
        }

        let gaze = estimate_gaze(frame, frame_w, frame_h);
        if let Some(reason) = self.validity_rejection(gaze.point) {
            debug!("discarding eye sample {:?}: {reason:?}", gaze.point);
            return FrameOutcome::Rejected(reason);
        }

        let target = self.points[self.current_point];
        let signature = extract_signature(frame, frame_w, frame_h);
        self.eye_data.push(gaze.point);
        self.screen_data.push(target);
        self.patterns
            .record(target, signature, gaze.point, self.screen[0], self.screen[1]);
        self.collection_frames += 1;

        if self.collection_frames < self.options.frames_per_point {
            return FrameOutcome::Collected {
                frames: self.collection_frames,
            };
        }

        self.finish_point(target)
    }

    fn validity_rejection(&self, eye: Vec2) -> Option<RejectReason> {
        if !eye.x.is_finite() || !eye.y.is_finite() {
            return Some(RejectReason::NonFinite);
        }
        let [max_x, max_y] = self.options.eye_bounds;
        if eye.x < 0.0 || eye.x > max_x || eye.y < 0.0 || eye.y > max_y {
            return Some(RejectReason::OutOfBounds);
        }
        if eye.x == 0.0 && eye.y == 0.0 {
            return Some(RejectReason::ZeroSentinel);
        }
        None
    }

    fn finish_point(&mut self, target: Vec2) -> FrameOutcome {
        let window_start = self.eye_data.len() - self.options.frames_per_point;
        let good_quality = self.validate_point_window(&self.eye_data[window_start..]);
        if !good_quality {
            warn!(
                "target {} window variance above limit; keeping samples anyway",
                self.current_point + 1
            );
        }
        self.point_quality.push(good_quality);
        self.patterns.finalize_point(self.current_point, target);

        let index = self.current_point;
        self.current_point += 1;
        self.collection_frames = 0;
        self.collecting = false;
        self.baseline_head = None;

        if self.current_point >= self.points.len() {
            self.finish_session();
            FrameOutcome::Complete
        } else {
            FrameOutcome::PointComplete {
                index,
                good_quality,
            }
        }
    }

    /// Variance diagnostic over one target's sample window.
    fn validate_point_window(&self, window: &[Vec2]) -> bool {
        if window.len() < self.options.min_point_samples {
            return false;
        }
        let var = variance_per_axis(window);
        var.x < self.options.point_variance_limit && var.y < self.options.point_variance_limit
    }

    fn finish_session(&mut self) {
        debug!(
            "all targets collected; fitting transformation from {} samples",
            self.eye_data.len()
        );
        let (eye, screen) = remove_outliers(&self.eye_data, &self.screen_data);
        match fit_transform(&eye, &screen, &self.options.fit) {
            Ok(model) => {
                debug!(
                    "calibration accuracy: {:.1} px rmse",
                    model.accuracy.total_rmse
                );
                self.model = Some(model);
            }
            Err(err) => {
                // Unreachable under the normal protocol (every target
                // contributes a full window); the session still terminates.
                warn!("transformation fit failed: {err}");
                self.model = None;
            }
        }
        self.complete = true;
    }

    /// Discard all progress and return to the first target.
    pub fn reset(&mut self) {
        self.current_point = 0;
        self.collection_frames = 0;
        self.collecting = false;
        self.eye_data.clear();
        self.screen_data.clear();
        self.baseline_head = None;
        self.point_quality.clear();
        self.patterns.reset();
        self.complete = false;
        self.model = None;
        debug!("calibration session reset");
    }

    /// Skip collection by adopting the most recent persisted calibration.
    ///
    /// Refused when the store has none; the session stays unresolved so the
    /// host can ask the user to calibrate.
    pub fn skip_with_previous(&mut self, store: &CalibrationStore) -> Result<PathBuf, SkipError> {
        let path = store.latest().ok_or(SkipError::NoPreviousCalibration)?;
        let artifact = store.load(&path)?;
        debug!(
            "skipping calibration; reusing {} ({:.1} px rmse)",
            path.display(),
            artifact.transformation_matrix.accuracy.total_rmse
        );
        self.model = Some(artifact.transformation_matrix);
        self.collecting = false;
        self.complete = true;
        Ok(path)
    }

    /// Assemble the persistable artifact for a completed session.
    ///
    /// `None` until the session is complete with a fitted model.
    pub fn artifact(&self) -> Option<CalibrationArtifact> {
        let model = self.model.clone()?;
        if !self.complete {
            return None;
        }
        Some(CalibrationArtifact {
            transformation_matrix: model,
            landmark_screen_mapping: self.patterns.mappings().clone(),
            screen_region_landmarks: self.patterns.region_patterns(),
            landmark_patterns: self.patterns.patterns().to_vec(),
            calibration_points: self.points.iter().map(|p| [p.x, p.y]).collect(),
            screen_resolution: self.screen,
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            total_data_points: self.eye_data.len(),
            calibration_type: "landmark_based".to_string(),
            mapping_quality: self.patterns.mapping_quality(),
        })
    }
}
