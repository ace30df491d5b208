use super::record::{CalibrationRecord, CalibrationTier};
use crate::types::CameraId;
use std::collections::BTreeMap;

/// Finalized calibrations keyed by camera. A camera without a record is
/// `Uncalibrated`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalibrationStore {
    records: BTreeMap<CameraId, CalibrationRecord>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, camera: CameraId) -> Option<&CalibrationRecord> {
        self.records.get(&camera)
    }

    /// Replaces any previous record of `camera`, returning it.
    pub fn insert(
        &mut self,
        camera: CameraId,
        record: CalibrationRecord,
    ) -> Option<CalibrationRecord> {
        self.records.insert(camera, record)
    }

    pub fn remove(&mut self, camera: CameraId) -> Option<CalibrationRecord> {
        self.records.remove(&camera)
    }

    pub fn tier(&self, camera: CameraId) -> CalibrationTier {
        self.get(camera)
            .map(CalibrationRecord::tier)
            .unwrap_or(CalibrationTier::Uncalibrated)
    }

    pub fn is_calibrated(&self, camera: CameraId) -> bool {
        self.tier(camera) > CalibrationTier::Uncalibrated
    }

    pub fn has_basic(&self, camera: CameraId) -> bool {
        self.get(camera).is_some_and(CalibrationRecord::has_basic)
    }

    pub fn has_3d(&self, camera: CameraId) -> bool {
        self.get(camera).is_some_and(CalibrationRecord::has_3d)
    }

    /// Cameras whose tier is at least `tier`, in camera order.
    pub fn cameras_at_least(&self, tier: CalibrationTier) -> Vec<CameraId> {
        CameraId::ALL
            .into_iter()
            .filter(|c| self.tier(*c) >= tier)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CameraId, &CalibrationRecord)> {
        self.records.iter().map(|(c, r)| (*c, r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
