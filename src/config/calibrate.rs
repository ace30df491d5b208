use crate::calibration::{MeasurementSet, SessionPlan};
use crate::persistence::DEFAULT_CALIBRATION_PATH;
use crate::types::{CameraId, PixelPoint};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Input of the `calibrate` tool.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrateConfig {
    pub camera: CameraId,
    #[serde(default)]
    pub plan: SessionPlan,
    /// Clicked corners in canonical order (two or four, per `plan`).
    pub points: Vec<PixelPoint>,
    /// Measurements to use without prompting; override the site config.
    #[serde(default)]
    pub measurements: MeasurementSet,
    /// Optional site config providing presets and solver options.
    #[serde(default)]
    pub site: Option<PathBuf>,
    /// Calibration file to update.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_CALIBRATION_PATH)
}

pub fn load_config(path: &Path) -> Result<CalibrateConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
