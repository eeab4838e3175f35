use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;

use parkscan_core::capacity::capacity_estimator::SpotType;
use parkscan_core::detection::domain::parking_space_detector::ParkingSpaceDetector;
use parkscan_core::detection::infrastructure::overlay_mask_renderer::OverlayMaskRenderer;
use parkscan_core::detection::infrastructure::worker_thread_detector::WorkerThreadDetector;
use parkscan_core::job::job_file::load_job;
use parkscan_core::job::result_writer::{write_masks, write_result};
use parkscan_core::merging::domain::merge_config::AreaStrategy;
use parkscan_core::pipeline::analysis_result::JobStatus;
use parkscan_core::pipeline::analysis_settings::AnalysisSettings;
use parkscan_core::pipeline::analyze_parking_use_case::{AnalyzeParkingUseCase, ProgressCallback};
use parkscan_core::pipeline::pipeline_logger::StdoutPipelineLogger;

/// Parking-space analysis of map tiles.
#[derive(Parser)]
#[command(name = "parkscan")]
struct Cli {
    /// Job file (JSON) listing tiles and their recorded detections.
    job: PathBuf,

    /// Output file for the JSON result (stdout when omitted).
    output: Option<PathBuf>,

    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Store the effective settings in the user config directory.
    #[arg(long)]
    save_settings: bool,

    /// Ground resolution of the tile imagery in meters per pixel.
    #[arg(long)]
    meters_per_pixel: Option<f64>,

    /// Parking spot type: standard or compact.
    #[arg(long)]
    spot_type: Option<String>,

    /// Area of merged spaces: sum_of_parts or from_geometry.
    #[arg(long)]
    area_strategy: Option<String>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// IoU threshold for merging within a tile (0.0-1.0).
    #[arg(long)]
    iou_threshold: Option<f64>,

    /// Overlap threshold relative to the smaller fragment (0.0-1.0).
    #[arg(long)]
    min_overlap: Option<f64>,

    /// Merge fragments within this many pixels of each other.
    #[arg(long)]
    max_distance: Option<f64>,

    /// Disable merging within tiles.
    #[arg(long)]
    no_tile_merge: bool,

    /// Disable merging across tiles.
    #[arg(long)]
    no_global_merge: bool,

    /// Directory for per-tile PNG images with the detections drawn on them.
    #[arg(long)]
    masks: Option<PathBuf>,

    /// Run the detector on a dedicated worker thread.
    #[arg(long)]
    worker_thread: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let settings = resolve_settings(&cli)?;
    let params = settings.to_params()?;
    if cli.save_settings {
        let path = settings.save()?;
        log::info!("Settings saved to {}", path.display());
    }

    let (tiles, replay) = load_job(&cli.job)?;
    log::info!("Loaded {} tiles from {}", tiles.len(), cli.job.display());

    let detector: Box<dyn ParkingSpaceDetector> = if cli.worker_thread {
        Box::new(WorkerThreadDetector::spawn(Box::new(replay)))
    } else {
        Box::new(replay)
    };

    let progress: ProgressCallback = Box::new(|percent| {
        eprint!("\rAnalysing tiles... {percent}%");
        true
    });

    let mut use_case = AnalyzeParkingUseCase::new(
        detector,
        None,
        Box::new(StdoutPipelineLogger::new()),
        params,
        Some(progress),
        None,
    );
    if cli.masks.is_some() {
        use_case = use_case.with_mask_renderer(Box::new(OverlayMaskRenderer::default()));
    }
    let result = use_case.execute(&tiles)?;
    eprintln!();

    if !result.failed_tiles.is_empty() {
        log::warn!("Failed tiles: {:?}", result.failed_tiles);
    }
    if result.status == JobStatus::Cancelled {
        log::warn!("Analysis cancelled; result is partial");
    }
    log::info!(
        "{} spaces, capacity {}, {} vehicles ({})",
        result.total_spaces,
        result.total_capacity,
        result.total_vehicles_detected,
        result.occupancy.status
    );

    write_result(&result, cli.output.as_deref())?;
    if let Some(output) = &cli.output {
        log::info!("Result written to {}", output.display());
    }
    if let Some(dir) = &cli.masks {
        let written = write_masks(&result, dir)?;
        log::info!("{} detection masks written to {}", written.len(), dir.display());
    }
    Ok(())
}

/// Settings file (explicit or default) with the command-line overrides
/// applied.
fn resolve_settings(cli: &Cli) -> Result<AnalysisSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.settings {
        Some(path) => AnalysisSettings::load_from(path)?,
        None => AnalysisSettings::load(),
    };

    if let Some(mpp) = cli.meters_per_pixel {
        settings.meters_per_pixel = mpp;
    }
    if let Some(spot) = &cli.spot_type {
        settings.spot_type = SpotType::from_str(spot)?;
    }
    if let Some(strategy) = &cli.area_strategy {
        settings.area_strategy = AreaStrategy::from_str(strategy)?;
    }
    if let Some(confidence) = cli.confidence {
        settings.detection_confidence = confidence;
    }
    if let Some(iou) = cli.iou_threshold {
        settings.tile_merge.iou_threshold = iou;
    }
    if let Some(overlap) = cli.min_overlap {
        settings.tile_merge.min_overlap_area = overlap;
    }
    if let Some(distance) = cli.max_distance {
        settings.tile_merge.max_distance = Some(distance);
    }
    if cli.no_tile_merge {
        settings.tile_merge.enabled = false;
    }
    if cli.no_global_merge {
        settings.global_merge.enabled = false;
    }
    Ok(settings)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.job.exists() {
        return Err(format!("Job file not found: {}", cli.job.display()).into());
    }
    if let Some(path) = &cli.settings {
        if !path.exists() {
            return Err(format!("Settings file not found: {}", path.display()).into());
        }
    }
    check_unit("Confidence", cli.confidence)?;
    check_unit("IoU threshold", cli.iou_threshold)?;
    check_unit("Overlap threshold", cli.min_overlap)?;
    if let Some(mpp) = cli.meters_per_pixel {
        if mpp <= 0.0 {
            return Err(format!("Meters per pixel must be positive, got {mpp}").into());
        }
    }
    if let Some(distance) = cli.max_distance {
        if !(distance.is_finite() && distance > 0.0) {
            return Err(format!("Max distance must be positive, got {distance}").into());
        }
    }
    if let Some(spot) = &cli.spot_type {
        if SpotType::from_str(spot).is_err() {
            return Err(format!("Spot type must be 'standard' or 'compact', got '{spot}'").into());
        }
    }
    if let Some(strategy) = &cli.area_strategy {
        if AreaStrategy::from_str(strategy).is_err() {
            return Err(format!(
                "Area strategy must be 'sum_of_parts' or 'from_geometry', got '{strategy}'"
            )
            .into());
        }
    }
    if let Some(dir) = &cli.masks {
        if dir.is_file() {
            return Err(format!("Mask directory is a file: {}", dir.display()).into());
        }
    }
    if cli.output.as_deref() == Some(cli.job.as_path()) {
        return Err("Output file must differ from the job file".into());
    }
    Ok(())
}

fn check_unit(name: &str, value: Option<f64>) -> Result<(), Box<dyn std::error::Error>> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => {
            Err(format!("{name} must be between 0.0 and 1.0, got {v}").into())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn job_file() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.json");
        fs::write(&path, r#"{"tiles": []}"#).unwrap();
        (dir, path)
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("parkscan").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_valid_arguments_accepted() {
        let (_dir, job) = job_file();
        let cli = parse(&[
            job.to_str().unwrap(),
            "--spot-type",
            "compact",
            "--area-strategy",
            "from_geometry",
            "--confidence",
            "0.4",
        ]);
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_missing_job_rejected() {
        let cli = parse(&["/nonexistent/job.json"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let (_dir, job) = job_file();
        let cli = parse(&[job.to_str().unwrap(), "--iou-threshold", "1.5"]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("IoU threshold"));
    }

    #[test]
    fn test_zero_max_distance_rejected() {
        let (_dir, job) = job_file();
        let cli = parse(&[job.to_str().unwrap(), "--max-distance", "0"]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("Max distance must be positive"));
    }

    #[test]
    fn test_mask_directory_must_not_be_file() {
        let (dir, job) = job_file();
        let cli = parse(&[job.to_str().unwrap(), "--masks", job.to_str().unwrap()]);
        assert!(validate(&cli).is_err());

        let masks = dir.path().join("masks");
        let cli = parse(&[job.to_str().unwrap(), "--masks", masks.to_str().unwrap()]);
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_unknown_spot_type_rejected() {
        let (_dir, job) = job_file();
        let cli = parse(&[job.to_str().unwrap(), "--spot-type", "bus"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_output_equal_to_job_rejected() {
        let (_dir, job) = job_file();
        let cli = parse(&[job.to_str().unwrap(), job.to_str().unwrap()]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_overrides_applied_to_settings() {
        let (dir, job) = job_file();
        let settings_path = dir.path().join("settings.json");
        fs::write(&settings_path, r#"{"meters_per_pixel": 0.1}"#).unwrap();
        let cli = parse(&[
            job.to_str().unwrap(),
            "--settings",
            settings_path.to_str().unwrap(),
            "--max-distance",
            "20",
            "--no-global-merge",
        ]);

        let settings = resolve_settings(&cli).unwrap();
        assert_eq!(settings.meters_per_pixel, 0.1);
        assert_eq!(settings.tile_merge.max_distance, Some(20.0));
        assert!(!settings.global_merge.enabled);
        assert!(settings.tile_merge.enabled);
    }
}
