//! Point-in-polygon inclusion for closed rings in ROC space.

/// Far-away ray targets. All lie outside the unit square, so each ray
/// from a point of ROC space leaves any band polygon.
const RAY_TARGETS: [(f64, f64); 3] = [(1.1, -0.1), (1.1, 1.1), (-0.1, -0.1)];

/// Whether `(x, y)` lies inside the closed ring `polygon`.
///
/// Three rays are cast from the point toward [`RAY_TARGETS`]; a ray votes
/// "inside" when it crosses an odd number of polygon edges. The point is
/// inside when at least two rays agree. Crossings are strict: an edge
/// endpoint lying exactly on a ray does not count, and the majority vote
/// absorbs the resulting single-ray errors.
///
/// The ring is expected closed (last vertex equal to the first); edges are
/// taken between consecutive vertices only.
pub fn point_in_polygon(x: f64, y: f64, polygon: &[(f64, f64)]) -> bool {
    let mut votes = 0;
    for &(px, py) in &RAY_TARGETS {
        let ray = ((x, y), (px, py));
        let crossings = polygon
            .windows(2)
            .filter(|edge| intersects(ray, (edge[0], edge[1])))
            .count();
        if crossings % 2 == 1 {
            votes += 1;
        }
    }
    votes >= 2
}

type Segment = ((f64, f64), (f64, f64));

/// Strict segment intersection: the endpoints of each segment lie on
/// opposite sides of the line through the other.
fn intersects(s1: Segment, s2: Segment) -> bool {
    let side1 = line_eval(s1, s2.0) * line_eval(s1, s2.1);
    let side2 = line_eval(s2, s1.0) * line_eval(s2, s1.1);
    side1 < 0.0 && side2 < 0.0
}

/// Cartesian equation `a·x + b·y + c` of the line through `seg`, evaluated
/// at `p`. Zero on the line.
fn line_eval(seg: Segment, p: (f64, f64)) -> f64 {
    let ((x1, y1), (x2, y2)) = seg;
    let a = y2 - y1;
    let b = x1 - x2;
    let c = -(a * x1 + b * y1);
    a * p.0 + b * p.1 + c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<(f64, f64)> {
        vec![(0.2, 0.2), (0.8, 0.2), (0.8, 0.8), (0.2, 0.8), (0.2, 0.2)]
    }

    #[test]
    fn interior_points_are_inside() {
        assert!(point_in_polygon(0.4, 0.5, &square()));
        assert!(point_in_polygon(0.31, 0.77, &square()));
    }

    #[test]
    fn outside_points() {
        assert!(!point_in_polygon(0.1, 0.5, &square()));
        assert!(!point_in_polygon(0.9, 0.9, &square()));
        assert!(!point_in_polygon(0.5, 0.05, &square()));
    }

    #[test]
    fn concave_ring() {
        // L-shaped ring with a notch at the top right
        let ring = vec![
            (0.1, 0.1),
            (0.9, 0.1),
            (0.9, 0.5),
            (0.5, 0.5),
            (0.5, 0.9),
            (0.1, 0.9),
            (0.1, 0.1),
        ];
        assert!(point_in_polygon(0.3, 0.7, &ring));
        assert!(point_in_polygon(0.7, 0.3, &ring));
        assert!(!point_in_polygon(0.7, 0.7, &ring));
    }

    #[test]
    fn degenerate_polygons_contain_nothing() {
        assert!(!point_in_polygon(0.5, 0.5, &[]));
        assert!(!point_in_polygon(0.5, 0.5, &[(0.5, 0.5)]));
    }
}
