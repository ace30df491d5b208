use std::env;
use std::path::Path;
use truck_volume::config::report::{self, DetectionSource, MaskSources};
use truck_volume::config::site;
use truck_volume::detection::{DetectionSnapshot, SnapshotPair};
use truck_volume::mask::io::{load_mask, read_json_file, write_json_file, OwnedMaskU8};
use truck_volume::mask::MaskU8;
use truck_volume::persistence::{CalibrationPersistence, JsonFilePersistence};
use truck_volume::volume::VolumeEstimator;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let mut config = report::load_config(Path::new(&config_path))?;

    let store = JsonFilePersistence::new(&config.calibration)
        .load()
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    if store.is_empty() {
        log::warn!(
            "no calibration in {}; using the uncalibrated estimate",
            config.calibration.display()
        );
    }
    if config.estimator.height.truck_bed_height.is_none() {
        if let Some(site) = config.site.as_deref().and_then(site::load_optional) {
            config.estimator.height.truck_bed_height = site.truck_bed_height;
        }
    }

    let pair = match &config.detections {
        DetectionSource::Stats(path) => read_json_file::<SnapshotPair>(path)?,
        DetectionSource::Masks(sources) => snapshots_from_masks(sources)?,
        DetectionSource::Inline(pair) => *pair,
    };

    let estimator = VolumeEstimator::new(&store, &config.estimator);
    let volume_report = estimator.generate_volume_report(&pair);
    println!("{}", volume_report.summary());
    if let Some(path) = &config.output.report_json {
        write_json_file(path, &volume_report)?;
        println!("Saved report to {}", path.display());
    }
    Ok(())
}

fn snapshots_from_masks(sources: &MaskSources) -> Result<SnapshotPair, String> {
    let load = |paths: &[std::path::PathBuf]| -> Result<DetectionSnapshot, String> {
        let owned = paths
            .iter()
            .map(|p| load_mask(p))
            .collect::<Result<Vec<OwnedMaskU8>, String>>()?;
        let views: Vec<MaskU8<'_>> = owned.iter().map(OwnedMaskU8::as_view).collect();
        Ok(DetectionSnapshot::from_masks_u8(sources.fps, &views))
    };
    Ok(SnapshotPair::new(load(&sources.camera1)?, load(&sources.camera2)?))
}

fn usage() -> String {
    "Usage: volume_report <config.json>".to_string()
}
