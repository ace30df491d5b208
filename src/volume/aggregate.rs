use super::camera::{
    camera_volume_2d, camera_volume_3d, camera_volume_basic, CameraVolume, VolumeMethod,
};
use super::options::AggregationOptions;
use crate::calibration::{CalibrationStore, CalibrationTier};
use crate::detection::SnapshotPair;
use crate::estimator::HeightEstimator;
use crate::types::CameraId;
use log::debug;
use serde::Serialize;

/// Combined volume before corrections.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub method: VolumeMethod,
    pub cubic_meters: f64,
    /// Both cameras, each at the best method its calibration allows.
    pub cameras: Vec<CameraVolume>,
    pub stereo_weighted: bool,
}

impl Aggregate {
    pub fn contributors(&self) -> impl Iterator<Item = &CameraVolume> {
        self.cameras.iter().filter(|c| c.weight > 0.0)
    }
}

/// Best per-camera figure: 3D, then 2D, then the uncalibrated factor.
pub fn best_camera_volume(
    camera: CameraId,
    pair: &SnapshotPair,
    store: &CalibrationStore,
    estimator: &HeightEstimator,
    options: &AggregationOptions,
) -> CameraVolume {
    let snapshot = pair.get(camera);
    camera_volume_3d(camera, snapshot, store, estimator)
        .or_else(|stale| {
            debug!("{stale}; trying the 2D method");
            camera_volume_2d(camera, snapshot, store, estimator)
        })
        .unwrap_or_else(|stale| {
            debug!("{stale}; using the uncalibrated factor");
            camera_volume_basic(camera, snapshot, options.basic_scale_factor)
        })
}

/// Combines both cameras, preferring 3D over 2D over the uncalibrated
/// estimate. Only cameras at the chosen method with a non-zero detected area
/// contribute, so a missing camera never dilutes the other.
pub fn aggregate(
    store: &CalibrationStore,
    pair: &SnapshotPair,
    estimator: &HeightEstimator,
    options: &AggregationOptions,
) -> Aggregate {
    let mut cameras: Vec<CameraVolume> = CameraId::ALL
        .iter()
        .map(|c| best_camera_volume(*c, pair, store, estimator, options))
        .collect();

    let method = if !store.cameras_at_least(CalibrationTier::Full3d).is_empty() {
        VolumeMethod::Calibrated3d
    } else if !store.cameras_at_least(CalibrationTier::Basic2d).is_empty() {
        VolumeMethod::Calibrated2d
    } else {
        let cubic_meters = pair.average_area() * options.basic_scale_factor;
        for c in &mut cameras {
            c.weight = 0.5;
        }
        return Aggregate {
            method: VolumeMethod::Uncalibrated,
            cubic_meters,
            cameras,
            stereo_weighted: false,
        };
    };

    let eligible: Vec<usize> = cameras
        .iter()
        .enumerate()
        .filter(|(_, c)| c.method == method && pair.get(c.camera).detected_area_pixels > 0.0)
        .map(|(i, _)| i)
        .collect();

    let stereo_weighted =
        method == VolumeMethod::Calibrated3d && options.stereo_weighting && eligible.len() == 2;
    let raw_weights: Vec<f64> = eligible
        .iter()
        .map(|&i| {
            if stereo_weighted {
                store
                    .get(cameras[i].camera)
                    .map(|r| r.quality_score())
                    .unwrap_or(0.0)
            } else {
                1.0
            }
        })
        .collect();
    let total: f64 = raw_weights.iter().sum();
    let mut cubic_meters = 0.0;
    if total > 0.0 {
        for (&i, w) in eligible.iter().zip(raw_weights) {
            cameras[i].weight = w / total;
            cubic_meters += cameras[i].weight * cameras[i].cubic_meters;
        }
    }
    debug!(
        "aggregate {:?}: {} contributor(s) -> {cubic_meters:.4} m³",
        method,
        eligible.len()
    );
    Aggregate {
        method,
        cubic_meters,
        cameras,
        stereo_weighted,
    }
}
