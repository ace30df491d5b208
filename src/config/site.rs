use crate::calibration::MeasurementSet;
use crate::geometry::SolverOptions;
use crate::types::CameraId;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_SITE_CONFIG_PATH: &str = "./calibration.json";

/// Site-wide measurements known before any calibration session: per-camera
/// edge lengths, camera heights and lens distances, and the bed height.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    /// Load-surface height above ground (meters).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truck_bed_height: Option<f64>,
    pub solver: SolverOptions,
    pub cameras: BTreeMap<CameraId, MeasurementSet>,
}

impl SiteConfig {
    pub fn measurements(&self, camera: CameraId) -> Option<&MeasurementSet> {
        self.cameras.get(&camera)
    }
}

pub fn load_config(path: &Path) -> Result<SiteConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

/// Loads the site config when present. A missing or unreadable file is
/// logged and treated as "no presets".
pub fn load_optional(path: &Path) -> Option<SiteConfig> {
    if !path.exists() {
        warn!("site config {} not found; continuing without presets", path.display());
        return None;
    }
    match load_config(path) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("{e}; continuing without presets");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Corner, Edge, Measurement};

    #[test]
    fn parses_camel_case_site_config() {
        let config: SiteConfig = serde_json::from_str(
            r#"{
                "truckBedHeight": 1.2,
                "cameras": {
                    "camera1": {
                        "edgeDistances": {"P1-P2": 2.4, "D13": 4.0},
                        "cameraHeight": 3.5,
                        "cameraDistances": {"P1": 9.0}
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.truck_bed_height, Some(1.2));
        assert_eq!(config.solver, SolverOptions::default());
        let cam1 = config.measurements(CameraId::Camera1).unwrap();
        assert_eq!(cam1.get(Measurement::Edge(Edge::P1_P3)), Some(4.0));
        assert_eq!(cam1.get(Measurement::CameraDistance(Corner::P1)), Some(9.0));
        assert!(config.measurements(CameraId::Camera2).is_none());
    }

    #[test]
    fn nested_solver_keys_are_camel_case() {
        let config: SiteConfig = serde_json::from_str(
            r#"{"solver": {"imageWidth": 1280, "imageHeight": 720, "focalFraction": 0.7}}"#,
        )
        .unwrap();
        assert_eq!(config.solver.image_width, 1280.0);
        assert_eq!(config.solver.image_height, 720.0);
        assert_eq!(config.solver.focal_fraction, 0.7);
    }

    #[test]
    fn missing_file_is_not_fatal() {
        assert!(load_optional(Path::new("/nonexistent/site-config.json")).is_none());
    }
}
