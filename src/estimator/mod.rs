//! Height/area estimator.
//!
//! Turns a detected pixel area and the calibrated bed polygon area into a
//! pile height. The basic model interpolates linearly on the fill ratio
//! between `min_height` and `max_height`. The enhanced model, used for
//! 3D-calibrated cameras, follows a square-root fill curve and multiplies in
//! angle, distance and steep-view corrections before clamping.

mod height;
mod options;

pub use height::{
    fill_ratio, HeightCorrections, HeightEstimate, HeightEstimator, HeightMethod, ViewGeometry,
};
pub use options::HeightOptions;
