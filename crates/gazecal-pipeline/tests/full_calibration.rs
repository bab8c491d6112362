//! End-to-end calibration flow: collect, fit, persist, reuse, classify.

use std::time::Instant;

use gazecal_core::test_utils::FaceBuilder;
use gazecal_core::{Real, Vec2};
use gazecal_linear::{apply, TransformKind};
use gazecal_pipeline::{
    CalibrationSession, CalibrationStore, FrameOutcome, GazeClassifier, SessionOptions, SkipError,
};

const SCREEN: [u32; 2] = [1920, 1080];
const FRAME_W: Real = 640.0;
const FRAME_H: Real = 480.0;

/// Synthetic frame whose iris displacement is linear in the target
/// position, giving an exactly learnable eye-to-screen relation.
fn frame_for(target: Vec2) -> gazecal_core::LandmarkFrame {
    let dx = 0.02 * (target.x / SCREEN[0] as Real - 0.5);
    let dy = 0.015 * (target.y / SCREEN[1] as Real - 0.5);
    FaceBuilder::new().iris_offset(Vec2::new(dx, dy)).build()
}

fn run_to_completion(session: &mut CalibrationSession) {
    let now = Instant::now();
    while !session.is_complete() {
        assert!(session.begin_collection());
        let target = session.current_target().unwrap();
        for _ in 0..45 {
            let out = session.process_frame(&frame_for(target), FRAME_W, FRAME_H, now);
            assert!(
                matches!(
                    out,
                    FrameOutcome::Collected { .. }
                        | FrameOutcome::PointComplete { .. }
                        | FrameOutcome::Complete
                ),
                "unexpected outcome {out:?}"
            );
        }
    }
}

#[test]
fn collected_session_fits_a_linear_model() {
    let mut session = CalibrationSession::new(SCREEN[0], SCREEN[1], SessionOptions::default());
    run_to_completion(&mut session);

    let model = session.model().expect("model after completion");
    // The synthetic relation has no curvature, so the polynomial must not
    // win even with 1300+ samples.
    assert_eq!(model.transformation_type, TransformKind::Linear);

    // Raw buffers hold every accepted sample, pre outlier removal.
    let (eye, screen) = session.samples();
    assert_eq!(eye.len(), 45 * session.targets().len());
    assert_eq!(eye.len(), screen.len());

    // The fitted model reproduces its own training data within the
    // reported accuracy.
    let mut worst: Real = 0.0;
    for (e, s) in model.eye_data.iter().zip(&model.screen_data) {
        let p = apply(model, Vec2::new(e[0], e[1]));
        let err = (p - Vec2::new(s[0], s[1])).norm();
        worst = worst.max(err);
    }
    assert!(worst <= model.accuracy.total_rmse * 4.0 + 1.0);
}

#[test]
fn artifact_round_trip_supports_skip() {
    let dir = tempfile::tempdir().unwrap();
    let store = CalibrationStore::single(dir.path());

    // A fresh session cannot skip: nothing persisted yet.
    let mut fresh = CalibrationSession::new(SCREEN[0], SCREEN[1], SessionOptions::default());
    assert!(matches!(
        fresh.skip_with_previous(&store),
        Err(SkipError::NoPreviousCalibration)
    ));
    assert!(!fresh.is_complete());

    // Complete one run and persist it.
    let mut session = CalibrationSession::new(SCREEN[0], SCREEN[1], SessionOptions::default());
    run_to_completion(&mut session);
    let artifact = session.artifact().unwrap();
    let saved = store.save(&artifact).unwrap();

    // Now the skip path resolves to the saved file.
    let path = fresh.skip_with_previous(&store).unwrap();
    assert_eq!(path, saved);
    assert!(fresh.is_complete());
    assert_eq!(
        fresh.model().unwrap().transformation_type,
        session.model().unwrap().transformation_type
    );
}

#[test]
fn persisted_document_has_the_expected_shape() {
    let mut session = CalibrationSession::new(SCREEN[0], SCREEN[1], SessionOptions::default());
    run_to_completion(&mut session);
    let artifact = session.artifact().unwrap();

    let value = serde_json::to_value(&artifact).unwrap();
    let matrix = &value["transformation_matrix"];
    assert_eq!(matrix["x_coeffs"].as_array().unwrap().len(), 6);
    assert_eq!(matrix["y_coeffs"].as_array().unwrap().len(), 6);
    assert!(matrix["normalization"]["eye_mean"].is_array());
    assert!(matrix["accuracy"]["total_rmse"].is_number());
    assert_eq!(matrix["transformation_type"], "linear");

    assert_eq!(value["calibration_type"], "landmark_based");
    assert_eq!(value["screen_resolution"][0], 1920);
    assert_eq!(value["calibration_points"].as_array().unwrap().len(), 29);
    assert!(value["landmark_screen_mapping"]["point_0"]["pattern_count"].is_number());
    assert!(value["mapping_quality"]["total_mappings"].is_number());
}

#[test]
fn classifier_built_from_completed_session() {
    let mut session = CalibrationSession::new(SCREEN[0], SCREEN[1], SessionOptions::default());
    run_to_completion(&mut session);
    let model = session.model().unwrap().clone();

    let mut classifier = GazeClassifier::new(model.clone(), SCREEN[0], SCREEN[1]);

    // An eye position from the training set classifies inside the viewing
    // area and, held steady, as engaged.
    let eye = Vec2::new(model.eye_data[0][0], model.eye_data[0][1]);
    let mut sample = classifier.classify(eye);
    for _ in 0..12 {
        sample = classifier.classify(eye);
    }
    assert!(sample.within_bounds);
    assert!(sample.engaged);
}
