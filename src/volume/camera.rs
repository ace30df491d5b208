use crate::calibration::{CalibrationRecord, CalibrationStore, CalibrationTier};
use crate::detection::DetectionSnapshot;
use crate::error::StaleCalibrationError;
use crate::estimator::{HeightEstimate, HeightEstimator, ViewGeometry};
use crate::types::CameraId;
use serde::Serialize;

/// Method behind a volume figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VolumeMethod {
    #[serde(rename = "3d")]
    Calibrated3d,
    #[serde(rename = "2d")]
    Calibrated2d,
    #[serde(rename = "basic")]
    Uncalibrated,
}

impl VolumeMethod {
    /// Lowest calibration tier that can serve the method.
    pub fn required_tier(self) -> CalibrationTier {
        match self {
            VolumeMethod::Calibrated3d => CalibrationTier::Full3d,
            VolumeMethod::Calibrated2d => CalibrationTier::Basic2d,
            VolumeMethod::Uncalibrated => CalibrationTier::Uncalibrated,
        }
    }
}

/// One camera's share of the estimate.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraVolume {
    pub camera: CameraId,
    pub method: VolumeMethod,
    pub cubic_meters: f64,
    pub area_square_meters: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<HeightEstimate>,
    /// Share in the aggregate; zero when the camera did not contribute.
    pub weight: f64,
    pub degraded: bool,
}

fn record_for(
    store: &CalibrationStore,
    camera: CameraId,
    required: CalibrationTier,
) -> Result<&CalibrationRecord, StaleCalibrationError> {
    let actual = store.tier(camera);
    match store.get(camera) {
        Some(record) if actual >= required => Ok(record),
        _ => Err(StaleCalibrationError {
            camera,
            required,
            actual,
        }),
    }
}

/// Volume from the enhanced height model; needs a `FULL_3D` calibration.
pub fn camera_volume_3d(
    camera: CameraId,
    snapshot: &DetectionSnapshot,
    store: &CalibrationStore,
    estimator: &HeightEstimator,
) -> Result<CameraVolume, StaleCalibrationError> {
    let record = record_for(store, camera, CalibrationTier::Full3d)?;
    let stale = || StaleCalibrationError {
        camera,
        required: CalibrationTier::Full3d,
        actual: record.tier(),
    };
    let view = ViewGeometry {
        camera_height: record.camera_height().ok_or_else(stale)?,
        avg_camera_distance: record.average_camera_distance().ok_or_else(stale)?,
    };
    let height = estimator.enhanced(snapshot.detected_area_pixels, record.polygon_area_px(), &view);
    Ok(volume_from(camera, VolumeMethod::Calibrated3d, snapshot, record, height))
}

/// Volume from the basic height model; needs at least `BASIC_2D`.
pub fn camera_volume_2d(
    camera: CameraId,
    snapshot: &DetectionSnapshot,
    store: &CalibrationStore,
    estimator: &HeightEstimator,
) -> Result<CameraVolume, StaleCalibrationError> {
    let record = record_for(store, camera, CalibrationTier::Basic2d)?;
    let height = estimator.basic(snapshot.detected_area_pixels, record.polygon_area_px());
    Ok(volume_from(camera, VolumeMethod::Calibrated2d, snapshot, record, height))
}

/// Uncalibrated figure: detected pixels times a fixed factor.
pub fn camera_volume_basic(
    camera: CameraId,
    snapshot: &DetectionSnapshot,
    scale_factor: f64,
) -> CameraVolume {
    CameraVolume {
        camera,
        method: VolumeMethod::Uncalibrated,
        cubic_meters: snapshot.detected_area_pixels * scale_factor,
        area_square_meters: 0.0,
        height: None,
        weight: 0.0,
        degraded: false,
    }
}

fn volume_from(
    camera: CameraId,
    method: VolumeMethod,
    snapshot: &DetectionSnapshot,
    record: &CalibrationRecord,
    height: HeightEstimate,
) -> CameraVolume {
    let ppm = record.pixels_per_meter();
    let area = snapshot.detected_area_pixels / (ppm * ppm);
    CameraVolume {
        camera,
        method,
        cubic_meters: area * height.height,
        area_square_meters: area,
        height: Some(height),
        weight: 0.0,
        degraded: record.degraded(),
    }
}
