//! Run a complete calibration session on synthetic frames and print the
//! resulting accuracy, then reload the saved artifact through the store.

use std::time::Instant;

use gazecal::core::test_utils::FaceBuilder;
use gazecal::core::{Real, Vec2};
use gazecal::pipeline::{CalibrationSession, CalibrationStore, SessionOptions};

const SCREEN: [u32; 2] = [1920, 1080];

fn frame_for(target: Vec2) -> gazecal::LandmarkFrame {
    let dx = 0.02 * (target.x / SCREEN[0] as Real - 0.5);
    let dy = 0.015 * (target.y / SCREEN[1] as Real - 0.5);
    FaceBuilder::new().iris_offset(Vec2::new(dx, dy)).build()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut session = CalibrationSession::new(SCREEN[0], SCREEN[1], SessionOptions::default());
    let now = Instant::now();

    while !session.is_complete() {
        session.begin_collection();
        let target = session.current_target().expect("target while incomplete");
        for _ in 0..45 {
            session.process_frame(&frame_for(target), 640.0, 480.0, now);
        }
        let progress = session.progress();
        println!(
            "point {}/{} done",
            progress.current_point, progress.total_points
        );
    }

    let model = session.model().expect("fit model");
    println!(
        "fit {:?} transformation, rmse {:.2} px",
        model.transformation_type, model.accuracy.total_rmse
    );

    let dir = tempfile::tempdir()?;
    let store = CalibrationStore::single(dir.path());
    let artifact = session.artifact().expect("artifact");
    let path = store.save(&artifact)?;
    println!("saved to {}", path.display());

    let reloaded = store.load(&path)?;
    println!(
        "reloaded model rmse {:.2} px from {} samples",
        reloaded.model().accuracy.total_rmse,
        reloaded.total_data_points
    );

    Ok(())
}
