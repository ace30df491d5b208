//! Per-camera calibration state machine.
//!
//! `CollectingPoints → CollectingMeasurements → Solving → Calibrated`.
//! The session owns no I/O: the manager drives it and decides what happens
//! around it (pipeline pause, storing the record, persistence).
//!
//! Measurements are asked in a fixed order: the five edges P1-P2, P1-P3,
//! P2-P3, P2-P4, P3-P4, then (3D only) the camera height and the lens
//! distances to P1..P4. Values already present in the presets are taken
//! without asking.

use super::measurements::{is_valid_measurement, MeasurementSet};
use super::record::{CalibrationRecord, RecordParts};
use crate::error::{CalibrationError, GeometryError, InputValidationError};
use crate::geometry::{
    is_simple_quad, solve_quad_2d, solve_quad_3d, CameraGeometry, PinholeProjector, QuadLengths,
    SolverOptions,
};
use crate::types::{CameraId, Corner, Edge, Measurement, PixelPoint};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Idle,
    CollectingPoints,
    CollectingMeasurements,
    Solving,
    Calibrated,
}

/// How many corners the operator clicks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManualPoints {
    /// P1 and P2; P3 and P4 are solved.
    #[default]
    Two,
    /// All four corners are clicked and only the scale is derived.
    Four,
}

impl ManualPoints {
    pub fn count(self) -> usize {
        match self {
            ManualPoints::Two => 2,
            ManualPoints::Four => 4,
        }
    }
}

/// What a session collects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionPlan {
    pub manual_points: ManualPoints,
    /// Also ask for camera height and lens-to-corner distances.
    pub want_3d: bool,
}

impl SessionPlan {
    pub fn basic() -> Self {
        Self::default()
    }

    pub fn full_3d() -> Self {
        Self {
            want_3d: true,
            ..Self::default()
        }
    }

    /// Measurements requested, in prompt order.
    pub fn measurements(&self) -> Vec<Measurement> {
        let mut list: Vec<Measurement> =
            Edge::REQUIRED.iter().map(|e| Measurement::Edge(*e)).collect();
        if self.want_3d {
            list.push(Measurement::CameraHeight);
            list.extend(Corner::ALL.iter().map(|c| Measurement::CameraDistance(*c)));
        }
        list
    }
}

/// Result of accepting a clicked point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOutcome {
    pub corner: Corner,
    pub points_remaining: usize,
    pub phase: SessionPhase,
}

/// Result of accepting a measurement value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementOutcome {
    pub measurement: Measurement,
    pub measurements_remaining: usize,
    pub phase: SessionPhase,
}

#[derive(Clone, Debug)]
pub struct CalibrationSession {
    camera: CameraId,
    plan: SessionPlan,
    phase: SessionPhase,
    points: Vec<PixelPoint>,
    pending: VecDeque<Measurement>,
    collected: MeasurementSet,
    presets: MeasurementSet,
}

impl CalibrationSession {
    pub fn new(camera: CameraId, plan: SessionPlan, presets: MeasurementSet) -> Self {
        Self {
            camera,
            plan,
            phase: SessionPhase::CollectingPoints,
            points: Vec::with_capacity(plan.manual_points.count()),
            pending: VecDeque::new(),
            collected: MeasurementSet::default(),
            presets,
        }
    }

    #[inline]
    pub fn camera(&self) -> CameraId {
        self.camera
    }

    #[inline]
    pub fn plan(&self) -> SessionPlan {
        self.plan
    }

    #[inline]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }

    pub fn collected(&self) -> &MeasurementSet {
        &self.collected
    }

    /// Measurement the operator should be asked for next.
    pub fn current_measurement(&self) -> Option<Measurement> {
        match self.phase {
            SessionPhase::CollectingMeasurements => self.pending.front().copied(),
            _ => None,
        }
    }

    pub fn measurements_remaining(&self) -> usize {
        self.pending.len()
    }

    fn expect_phase(&self, expected: SessionPhase) -> Result<(), CalibrationError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CalibrationError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    pub fn add_point(&mut self, point: PixelPoint) -> Result<PointOutcome, CalibrationError> {
        self.expect_phase(SessionPhase::CollectingPoints)?;
        if !point[0].is_finite() || !point[1].is_finite() {
            return Err(CalibrationError::InvalidPoint {
                x: point[0],
                y: point[1],
            });
        }
        let corner = Corner::from_index(self.points.len()).ok_or(CalibrationError::WrongPhase {
            expected: SessionPhase::CollectingPoints,
            actual: self.phase,
        })?;
        self.points.push(point);
        debug!(
            "{}: {corner} = ({:.1}, {:.1})",
            self.camera, point[0], point[1]
        );
        let required = self.plan.manual_points.count();
        if self.points.len() == required {
            self.enter_measurements();
        }
        Ok(PointOutcome {
            corner,
            points_remaining: required - self.points.len(),
            phase: self.phase,
        })
    }

    fn enter_measurements(&mut self) {
        self.phase = SessionPhase::CollectingMeasurements;
        for m in self.plan.measurements() {
            match self.presets.get(m) {
                Some(v) if is_valid_measurement(v) => self.collected.set(m, v),
                Some(v) => {
                    warn!("{}: ignoring configured {m} = {v}; asking instead", self.camera);
                    self.pending.push_back(m);
                }
                None => self.pending.push_back(m),
            }
        }
        if self.pending.is_empty() {
            self.phase = SessionPhase::Solving;
        }
    }

    /// Records the value for [`Self::current_measurement`]. An invalid value
    /// leaves the session where it was so the same question can be repeated.
    pub fn submit(&mut self, value: f64) -> Result<MeasurementOutcome, CalibrationError> {
        self.expect_phase(SessionPhase::CollectingMeasurements)?;
        let measurement = self.pending.front().copied().ok_or(CalibrationError::WrongPhase {
            expected: SessionPhase::CollectingMeasurements,
            actual: SessionPhase::Solving,
        })?;
        if !is_valid_measurement(value) {
            return Err(InputValidationError { measurement, value }.into());
        }
        self.pending.pop_front();
        self.collected.set(measurement, value);
        if self.pending.is_empty() {
            self.phase = SessionPhase::Solving;
        }
        Ok(MeasurementOutcome {
            measurement,
            measurements_remaining: self.pending.len(),
            phase: self.phase,
        })
    }

    /// Runs the solver once and builds the record. On success the session
    /// becomes `Calibrated`; on failure it stays in `Solving` and the caller
    /// is expected to discard it.
    pub fn solve(
        &mut self,
        options: &SolverOptions,
    ) -> Result<CalibrationRecord, CalibrationError> {
        self.expect_phase(SessionPhase::Solving)?;
        let (corners, degraded) = self.solve_corners(options)?;
        let record = CalibrationRecord::from_parts(RecordParts {
            corners,
            edge_distances: self.collected.edge_distances.clone(),
            camera_distances: self.collected.camera_distances.clone(),
            camera_height: self.collected.camera_height,
            degraded,
        })?;
        self.phase = SessionPhase::Calibrated;
        Ok(record)
    }

    fn solve_corners(
        &self,
        options: &SolverOptions,
    ) -> Result<([PixelPoint; 4], bool), CalibrationError> {
        if let ManualPoints::Four = self.plan.manual_points {
            let mut corners = [[0.0; 2]; 4];
            corners.copy_from_slice(&self.points[..4]);
            // Clicked order is P1..P4 (TL, TR, BL, BR); a crossed order folds the bed.
            if !is_simple_quad(&corners) {
                return Err(GeometryError::Degenerate(
                    "clicked corners do not form a simple quadrilateral".to_string(),
                )
                .into());
            }
            return Ok((corners, false));
        }
        let lengths = self.lengths()?;
        let (p1, p2) = (self.points[0], self.points[1]);
        let solution = match self.camera_geometry() {
            Some(camera) if self.plan.want_3d => {
                let projector = PinholeProjector::new(options)?;
                solve_quad_3d(p1, p2, &lengths, &camera, &projector)?
            }
            _ => solve_quad_2d(p1, p2, &lengths)?,
        };
        if solution.degraded {
            warn!("{}: corners solved with planar fallback", self.camera);
        }
        Ok((solution.corners, solution.degraded))
    }

    fn lengths(&self) -> Result<QuadLengths, CalibrationError> {
        let get = |edge: Edge| {
            self.collected
                .edge_distances
                .get(&edge)
                .copied()
                .ok_or(InputValidationError {
                    measurement: Measurement::Edge(edge),
                    value: f64::NAN,
                })
        };
        Ok(QuadLengths {
            d12: get(Edge::P1_P2)?,
            d13: get(Edge::P1_P3)?,
            d23: get(Edge::P2_P3)?,
            d24: get(Edge::P2_P4)?,
            d34: get(Edge::P3_P4)?,
        })
    }

    fn camera_geometry(&self) -> Option<CameraGeometry> {
        let height = self.collected.camera_height?;
        let mut distances = [0.0; 4];
        for corner in Corner::ALL {
            distances[corner.index()] = *self.collected.camera_distances.get(&corner)?;
        }
        Some(CameraGeometry { height, distances })
    }
}
