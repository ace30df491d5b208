use crate::estimator::HeightOptions;
use serde::{Deserialize, Serialize};

/// Truck body, each with a fixed shape correction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruckType {
    Flatbed,
    Dump,
    Container,
    Pickup,
}

impl TruckType {
    pub fn factor(self) -> f64 {
        match self {
            TruckType::Flatbed => 0.95,
            TruckType::Dump => 1.05,
            TruckType::Container => 1.0,
            TruckType::Pickup => 0.9,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregationOptions {
    /// Cubic meters per detected pixel when no camera is calibrated.
    pub basic_scale_factor: f64,
    /// Weight two 3D cameras by calibration quality instead of averaging.
    pub stereo_weighting: bool,
    pub truck_type: Option<TruckType>,
    /// Multiplier supplied by the caller for the loaded material.
    pub material_density: Option<f64>,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            basic_scale_factor: 0.01,
            stereo_weighting: true,
            truck_type: None,
            material_density: None,
        }
    }
}

/// Everything the volume estimator can be tuned with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EstimatorOptions {
    pub height: HeightOptions,
    pub aggregation: AggregationOptions,
}
