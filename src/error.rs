//! Error taxonomy.
//!
//! Geometry and validation errors abort only the calibration session of the
//! camera they occurred on. Persistence errors are demoted to warnings by the
//! calibration manager. A stale calibration is never surfaced to callers of
//! the volume estimator; the aggregator falls back to the next-lower method.

use crate::calibration::{CalibrationTier, SessionPhase};
use crate::types::{CameraId, Measurement};

/// Solver-level failure. Fatal to the calibration attempt that produced it.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
    #[error("no real solution: {0}")]
    NoRealSolution(String),
    #[error("invalid geometry input: {0}")]
    InvalidInput(String),
}

/// A measurement value that is not finite or not strictly positive.
///
/// Recoverable: the session re-prompts the same measurement.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{measurement} must be a finite value greater than zero (got {value})")]
pub struct InputValidationError {
    pub measurement: Measurement,
    pub value: f64,
}

/// The caller asked for a method the camera's calibration tier cannot serve.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{camera} is calibrated at tier {actual:?}, {required:?} required")]
pub struct StaleCalibrationError {
    pub camera: CameraId,
    pub required: CalibrationTier,
    pub actual: CalibrationTier,
}

/// The detection pipeline did not acknowledge a pause request.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("pipeline control failed for {camera}: {reason}")]
pub struct PipelineError {
    pub camera: CameraId,
    pub reason: String,
}

/// Failures of calibration session operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    #[error("no calibration session in progress for {0}")]
    NotStarted(CameraId),
    #[error("a calibration session is already in progress for {0}")]
    SessionInProgress(CameraId),
    #[error("operation not valid in phase {actual:?} (expected {expected:?})")]
    WrongPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    #[error("point ({x}, {y}) is not a finite pixel coordinate")]
    InvalidPoint { x: f64, y: f64 },
    #[error(transparent)]
    InputValidation(#[from] InputValidationError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("no edge has both a pixel length and a positive real-world length")]
    NoScaleEdges,
    #[error("calibration produced a non-finite value: {0}")]
    NonFinite(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Save/load failures of the calibration file.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("calibration file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("calibration file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported calibration file version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("invalid calibration record for {camera}: {reason}")]
    InvalidRecord { camera: CameraId, reason: String },
}
