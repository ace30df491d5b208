//! Pixel-per-meter scale and calibration quality.
//!
//! The scale is the mean of `pixelLength / realLength` over every edge
//! (sides and diagonals) that has both lengths. Averaging dampens a single
//! bad measurement, and the spread of the ratios doubles as a quality signal.

use super::measurements::is_valid_measurement;
use super::record::CalibrationQuality;
use crate::error::CalibrationError;
use crate::geometry::distance;
use crate::types::{Edge, PixelPoint};
use serde::Serialize;
use std::collections::BTreeMap;

/// Scale derived from a set of corners and real edge lengths.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleEstimate {
    pub pixels_per_meter: f64,
    pub edges_used: usize,
    /// Coefficient of variation of the per-edge ratios.
    pub spread: f64,
}

pub fn estimate_scale(
    corners: &[PixelPoint; 4],
    edges: &BTreeMap<Edge, f64>,
) -> Result<ScaleEstimate, CalibrationError> {
    let ratios: Vec<f64> = edges
        .iter()
        .filter(|(_, real)| is_valid_measurement(**real))
        .filter_map(|(edge, real)| {
            let (a, b) = edge.corners();
            let px = distance(corners[a.index()], corners[b.index()]);
            (px.is_finite() && px > 0.0).then(|| px / real)
        })
        .collect();
    if ratios.is_empty() {
        return Err(CalibrationError::NoScaleEdges);
    }
    let n = ratios.len() as f64;
    let mean = ratios.iter().sum::<f64>() / n;
    let var = ratios.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n;
    if !mean.is_finite() || mean <= 0.0 {
        return Err(CalibrationError::NonFinite(format!("pixels per meter = {mean}")));
    }
    Ok(ScaleEstimate {
        pixels_per_meter: mean,
        edges_used: ratios.len(),
        spread: var.sqrt() / mean,
    })
}

/// Rates a calibration from the agreement of its edges. A planar fallback
/// during solving caps the rating at fair; one edge alone cannot be rated.
pub fn rate_quality(scale: &ScaleEstimate, degraded: bool) -> Option<CalibrationQuality> {
    if scale.edges_used < 2 {
        return None;
    }
    let rating = if scale.spread < 0.02 {
        CalibrationQuality::Excellent
    } else if scale.spread < 0.05 {
        CalibrationQuality::Good
    } else if scale.spread < 0.10 {
        CalibrationQuality::Fair
    } else {
        CalibrationQuality::Poor
    };
    if degraded && rating > CalibrationQuality::Fair {
        Some(CalibrationQuality::Fair)
    } else {
        Some(rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side_px: f64) -> [PixelPoint; 4] {
        [[0.0, 0.0], [side_px, 0.0], [0.0, side_px], [side_px, side_px]]
    }

    fn unit_edges() -> BTreeMap<Edge, f64> {
        let mut edges = BTreeMap::new();
        edges.insert(Edge::P1_P2, 1.0);
        edges.insert(Edge::P1_P3, 1.0);
        edges.insert(Edge::P2_P3, 2f64.sqrt());
        edges.insert(Edge::P3_P4, 1.0);
        edges
    }

    #[test]
    fn scale_is_mean_of_edge_ratios() {
        let est = estimate_scale(&square(10.0), &unit_edges()).unwrap();
        assert!((est.pixels_per_meter - 10.0).abs() < 1e-9);
        assert_eq!(est.edges_used, 4);
        assert!(est.spread < 1e-9);
    }

    #[test]
    fn scale_follows_uniform_pixel_rescaling() {
        let base = estimate_scale(&square(10.0), &unit_edges()).unwrap();
        for k in [0.5, 2.0, 3.7] {
            let scaled = estimate_scale(&square(10.0 * k), &unit_edges()).unwrap();
            assert!((scaled.pixels_per_meter - base.pixels_per_meter * k).abs() < 1e-9);
        }
    }

    #[test]
    fn unusable_edges_are_excluded() {
        let mut edges = unit_edges();
        edges.insert(Edge::P2_P4, 0.0);
        edges.insert(Edge::P1_P4, f64::NAN);
        let est = estimate_scale(&square(10.0), &edges).unwrap();
        assert_eq!(est.edges_used, 4);

        let mut none = BTreeMap::new();
        none.insert(Edge::P1_P2, 0.0);
        assert_eq!(
            estimate_scale(&square(10.0), &none),
            Err(CalibrationError::NoScaleEdges)
        );
    }

    #[test]
    fn quality_degrades_with_spread() {
        let est = |spread| ScaleEstimate {
            pixels_per_meter: 10.0,
            edges_used: 5,
            spread,
        };
        assert_eq!(rate_quality(&est(0.01), false), Some(CalibrationQuality::Excellent));
        assert_eq!(rate_quality(&est(0.03), false), Some(CalibrationQuality::Good));
        assert_eq!(rate_quality(&est(0.07), false), Some(CalibrationQuality::Fair));
        assert_eq!(rate_quality(&est(0.30), false), Some(CalibrationQuality::Poor));
        assert_eq!(rate_quality(&est(0.01), true), Some(CalibrationQuality::Fair));
        assert_eq!(rate_quality(&est(0.30), true), Some(CalibrationQuality::Poor));
        let single = ScaleEstimate {
            edges_used: 1,
            ..est(0.0)
        };
        assert_eq!(rate_quality(&single, false), None);
    }
}
