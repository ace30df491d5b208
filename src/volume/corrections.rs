use super::options::{AggregationOptions, TruckType};
use crate::calibration::is_valid_measurement;
use log::warn;
use serde::Serialize;

/// Detection-confidence factor keyed on the total object count.
pub fn detection_factor(total_objects: u32) -> f64 {
    match total_objects {
        n if n >= 20 => 1.0,
        n if n >= 10 => 0.95,
        n if n >= 5 => 0.9,
        n if n >= 2 => 0.8,
        _ => 0.7,
    }
}

/// Multipliers applied to the aggregated volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCorrections {
    pub detection: f64,
    pub truck_type: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truck: Option<TruckType>,
    pub material_density: f64,
}

impl AppliedCorrections {
    pub fn from_options(total_objects: u32, options: &AggregationOptions) -> Self {
        let material_density = match options.material_density {
            Some(d) if is_valid_measurement(d) => d,
            Some(d) => {
                warn!("ignoring material density {d}; it must be finite and positive");
                1.0
            }
            None => 1.0,
        };
        Self {
            detection: detection_factor(total_objects),
            truck_type: options.truck_type.map(TruckType::factor).unwrap_or(1.0),
            truck: options.truck_type,
            material_density,
        }
    }

    pub fn combined(&self) -> f64 {
        self.detection * self.truck_type * self.material_density
    }
}
