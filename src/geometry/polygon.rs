use super::EPS;
use crate::types::PixelPoint;

#[inline]
pub fn distance(a: PixelPoint, b: PixelPoint) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

/// Cross product `(a − o) × (b − o)`. Positive when `b` is clockwise of `a`
/// around `o` on screen (y down), i.e. "below" the `o→a` direction.
#[inline]
pub fn cross(o: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Shoelace area of a polygon given in cyclic vertex order.
pub fn polygon_area(points: &[PixelPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        twice += p[0] * q[1] - q[0] * p[1];
    }
    0.5 * twice.abs()
}

/// Reorders canonical corners (TL, TR, BL, BR) into cyclic order (TL, TR, BR, BL).
#[inline]
pub fn quad_cyclic(corners: &[PixelPoint; 4]) -> [PixelPoint; 4] {
    [corners[0], corners[1], corners[3], corners[2]]
}

/// Area in pixels² of a quadrilateral given in canonical corner order.
pub fn quad_area(corners: &[PixelPoint; 4]) -> f64 {
    polygon_area(&quad_cyclic(corners))
}

/// True when the quadrilateral (canonical order) has non-zero area and its
/// opposite sides do not cross.
pub fn is_simple_quad(corners: &[PixelPoint; 4]) -> bool {
    if corners.iter().any(|p| !p[0].is_finite() || !p[1].is_finite()) {
        return false;
    }
    let q = quad_cyclic(corners);
    if polygon_area(&q) <= EPS {
        return false;
    }
    !segments_cross(q[0], q[1], q[2], q[3]) && !segments_cross(q[1], q[2], q[3], q[0])
}

fn segments_cross(a: PixelPoint, b: PixelPoint, c: PixelPoint, d: PixelPoint) -> bool {
    let d1 = cross(a, b, c);
    let d2 = cross(a, b, d);
    let d3 = cross(c, d, a);
    let d4 = cross(c, d, b);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_area_uses_cyclic_order() {
        let corners = [[0.0, 0.0], [10.0, 0.0], [0.0, 5.0], [10.0, 5.0]];
        assert!((quad_area(&corners) - 50.0).abs() < 1e-12);
        assert!(is_simple_quad(&corners));
    }

    #[test]
    fn swapped_bottom_corners_fold_the_quad() {
        let corners = [[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 5.0]];
        assert!(!is_simple_quad(&corners));
    }

    #[test]
    fn cross_sign_matches_screen_below() {
        assert!(cross([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]) > 0.0);
        assert!(cross([0.0, 0.0], [1.0, 0.0], [0.0, -1.0]) < 0.0);
    }
}
