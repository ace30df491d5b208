use serde::{Deserialize, Serialize};

/// Tunables of the height model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeightOptions {
    /// Height reported for an empty bed (meters).
    pub min_height: f64,
    /// Height reported for a fully covered bed (meters).
    pub max_height: f64,
    /// Ground distance beyond which the distance correction kicks in (meters).
    pub reference_distance: f64,
    /// Distance correction per meter beyond `reference_distance`.
    pub distance_penalty_per_m: f64,
    /// Largest angle correction, reached at a horizontal view.
    pub max_angle_boost: f64,
    /// Camera-to-bed height ratio below which the steep-view boost applies.
    pub steep_ratio_threshold: f64,
    /// Steep-view boost per unit of ratio below the threshold.
    pub steep_boost_per_unit: f64,
    /// Load-surface height above ground (meters), when known.
    pub truck_bed_height: Option<f64>,
}

impl Default for HeightOptions {
    fn default() -> Self {
        Self {
            min_height: 0.1,
            max_height: 2.5,
            reference_distance: 5.0,
            distance_penalty_per_m: 0.05,
            max_angle_boost: 0.3,
            steep_ratio_threshold: 2.5,
            steep_boost_per_unit: 0.1,
            truck_bed_height: None,
        }
    }
}
