use super::record::CalibrationTier;
use super::session::SessionPlan;
use crate::types::{CameraId, Corner, Measurement};
use serde::Serialize;

/// Progress notifications emitted by the calibration manager, drained by
/// whatever front-end drives the workflow.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CalibrationEvent {
    Started {
        camera: CameraId,
        plan: SessionPlan,
    },
    /// A new session began while an older calibration is still active.
    RecalibrationStarted {
        camera: CameraId,
        previous_tier: CalibrationTier,
    },
    PipelinePaused {
        camera: CameraId,
    },
    PipelineResumed {
        camera: CameraId,
    },
    PointAccepted {
        camera: CameraId,
        corner: Corner,
        remaining: usize,
    },
    MeasurementAccepted {
        camera: CameraId,
        measurement: Measurement,
        value: f64,
    },
    MeasurementRejected {
        camera: CameraId,
        measurement: Measurement,
        reason: String,
    },
    Calibrated {
        camera: CameraId,
        tier: CalibrationTier,
        pixels_per_meter: f64,
        degraded: bool,
    },
    Failed {
        camera: CameraId,
        reason: String,
    },
    Cancelled {
        camera: CameraId,
    },
    Reset {
        camera: CameraId,
    },
    PersistenceFailed {
        reason: String,
    },
}

impl CalibrationEvent {
    /// Camera the event refers to, if any.
    pub fn camera(&self) -> Option<CameraId> {
        match self {
            CalibrationEvent::Started { camera, .. }
            | CalibrationEvent::RecalibrationStarted { camera, .. }
            | CalibrationEvent::PipelinePaused { camera }
            | CalibrationEvent::PipelineResumed { camera }
            | CalibrationEvent::PointAccepted { camera, .. }
            | CalibrationEvent::MeasurementAccepted { camera, .. }
            | CalibrationEvent::MeasurementRejected { camera, .. }
            | CalibrationEvent::Calibrated { camera, .. }
            | CalibrationEvent::Failed { camera, .. }
            | CalibrationEvent::Cancelled { camera }
            | CalibrationEvent::Reset { camera } => Some(*camera),
            CalibrationEvent::PersistenceFailed { .. } => None,
        }
    }
}
