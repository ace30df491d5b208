use crate::types::{Corner, Edge, Measurement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Real-world measurements for one camera, either typed in during a session
/// or supplied up front by the site configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeasurementSet {
    pub edge_distances: BTreeMap<Edge, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_height: Option<f64>,
    pub camera_distances: BTreeMap<Corner, f64>,
}

impl MeasurementSet {
    pub fn get(&self, measurement: Measurement) -> Option<f64> {
        match measurement {
            Measurement::Edge(edge) => self.edge_distances.get(&edge).copied(),
            Measurement::CameraHeight => self.camera_height,
            Measurement::CameraDistance(corner) => self.camera_distances.get(&corner).copied(),
        }
    }

    pub fn set(&mut self, measurement: Measurement, value: f64) {
        match measurement {
            Measurement::Edge(edge) => {
                self.edge_distances.insert(edge, value);
            }
            Measurement::CameraHeight => self.camera_height = Some(value),
            Measurement::CameraDistance(corner) => {
                self.camera_distances.insert(corner, value);
            }
        }
    }

    /// Values from `other` override the ones already present.
    pub fn merge(&mut self, other: &MeasurementSet) {
        for (edge, d) in &other.edge_distances {
            self.edge_distances.insert(*edge, *d);
        }
        if other.camera_height.is_some() {
            self.camera_height = other.camera_height;
        }
        for (corner, d) in &other.camera_distances {
            self.camera_distances.insert(*corner, *d);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edge_distances.is_empty()
            && self.camera_height.is_none()
            && self.camera_distances.is_empty()
    }
}

/// A measurement value accepted by the workflow: finite and strictly positive.
#[inline]
pub fn is_valid_measurement(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
