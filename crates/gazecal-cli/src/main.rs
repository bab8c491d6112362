use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use gazecal_core::{Real, Vec2};
use gazecal_linear::{fit_transform, remove_outliers, FitOptions};
use gazecal_pipeline::CalibrationStore;

/// Command-line tools for gaze calibration artifacts.
#[derive(Debug, Parser)]
#[command(author, version, about = "Gaze calibration fitting and inspection")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fit a transformation from a JSON file of paired eye/screen samples.
    Fit {
        /// Path to JSON with `eye_data` and `screen_data` arrays of [x, y].
        #[arg(long)]
        input: PathBuf,

        /// Skip outlier trimming before the fit.
        #[arg(long)]
        no_trim: bool,
    },

    /// Summarize a saved calibration artifact.
    Inspect {
        /// Path to a calibration JSON file.
        #[arg(long)]
        file: PathBuf,
    },

    /// Print the newest calibration file across the given directories.
    Latest {
        /// Directory to search; repeatable.
        #[arg(long = "dir", required = true)]
        dirs: Vec<PathBuf>,
    },
}

/// Paired samples accepted by `fit`.
#[derive(Debug, Deserialize)]
struct FitDataset {
    eye_data: Vec<[Real; 2]>,
    screen_data: Vec<[Real; 2]>,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

fn run_fit(input: &Path, no_trim: bool) -> Result<String> {
    let dataset: FitDataset = load_json_file(input)?;
    if dataset.eye_data.len() != dataset.screen_data.len() {
        bail!(
            "eye_data and screen_data lengths differ ({} vs {})",
            dataset.eye_data.len(),
            dataset.screen_data.len()
        );
    }

    let eye: Vec<Vec2> = dataset.eye_data.iter().map(|p| Vec2::new(p[0], p[1])).collect();
    let screen: Vec<Vec2> = dataset
        .screen_data
        .iter()
        .map(|p| Vec2::new(p[0], p[1]))
        .collect();

    let (eye, screen) = if no_trim {
        (eye, screen)
    } else {
        remove_outliers(&eye, &screen)
    };

    let model = fit_transform(&eye, &screen, &FitOptions::default())?;
    Ok(serde_json::to_string_pretty(&model)?)
}

fn run_inspect(file: &Path) -> Result<String> {
    let store = CalibrationStore::new(Vec::new());
    let artifact = store.load(file)?;
    let model = artifact.model();
    let summary = serde_json::json!({
        "file": file.display().to_string(),
        "transformation_type": model.transformation_type,
        "rmse_x": model.accuracy.rmse_x,
        "rmse_y": model.accuracy.rmse_y,
        "total_rmse": model.accuracy.total_rmse,
        "training_samples": model.eye_data.len(),
        "calibration_points": artifact.calibration_points.len(),
        "screen_resolution": artifact.screen_resolution,
        "timestamp": artifact.timestamp,
        "mapping_quality": artifact.mapping_quality,
    });
    Ok(serde_json::to_string_pretty(&summary)?)
}

fn run_latest(dirs: Vec<PathBuf>) -> Result<String> {
    let store = CalibrationStore::new(dirs);
    match store.latest() {
        Some(path) => Ok(path.display().to_string()),
        None => bail!("no calibration file found in the given directories"),
    }
}

fn try_main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let output = match args.command {
        Command::Fit { input, no_trim } => run_fit(&input, no_trim)?,
        Command::Inspect { file } => run_inspect(&file)?,
        Command::Latest { dirs } => run_latest(dirs)?,
    };
    println!("{output}");
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
