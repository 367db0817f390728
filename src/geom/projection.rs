use crate::Point;
use crate::Vector;
use serde::Serialize;

/// Orthonormal basis for projecting 3D points onto a 2D plane and back.
///
/// `u`, `v` and `n` form a right-handed frame, so a loop that is
/// counter-clockwise around `n` stays counter-clockwise in `(u, v)`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlaneBasis {
    pub origin: Point,
    pub u: Vector,
    pub v: Vector,
    pub n: Vector,
}

impl PlaneBasis {
    /// Creates a `PlaneBasis` from an origin point and a normal vector.
    pub fn from_normal(origin: Point, normal: Vector) -> Option<Self> {
        let n = normal.normalize().ok()?;
        let helper = if n.dz.abs() < 0.9 {
            Vector::new(0.0, 0.0, 1.0)
        } else {
            Vector::new(0.0, 1.0, 0.0)
        };

        let u = helper.cross(&n).normalize().ok()?;
        let v = n.cross(&u).normalize().ok()?;

        Some(Self { origin, u, v, n })
    }

    /// Projects a 3D point onto the 2D plane, returning (u, v) coordinates.
    pub fn project(&self, p: Point) -> (f64, f64) {
        let r = p - self.origin;
        (r.dot(&self.u), r.dot(&self.v))
    }

    /// Signed distance of `p` from the plane, positive on the normal side.
    pub fn height(&self, p: Point) -> f64 {
        (p - self.origin).dot(&self.n)
    }

    /// Unprojects 2D (u, v) coordinates back to a 3D point on the plane.
    pub fn unproject(&self, x: f64, y: f64) -> Point {
        self.origin + self.u * x + self.v * y
    }
}

/// Signed area of a 2D loop (positive when counter-clockwise).
pub fn signed_area_2d(pts: &[(f64, f64)]) -> f64 {
    let n = pts.len();
    let mut acc = 0.0;
    for i in 0..n {
        let (x0, y0) = pts[i];
        let (x1, y1) = pts[(i + 1) % n];
        acc += x0 * y1 - x1 * y0;
    }
    0.5 * acc
}

/// Area centroid of a 2D loop, or `None` when the loop has no area.
pub fn centroid_2d(pts: &[(f64, f64)]) -> Option<(f64, f64)> {
    let a = signed_area_2d(pts);
    if a.abs() < f64::EPSILON {
        return None;
    }
    let n = pts.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let (x0, y0) = pts[i];
        let (x1, y1) = pts[(i + 1) % n];
        let cross = x0 * y1 - x1 * y0;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    Some((cx / (6.0 * a), cy / (6.0 * a)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_normal_roundtrip() {
        let origin = Point::new(1.0, 2.0, 3.0);
        let normal = Vector::new(0.0, 0.0, 1.0);
        let basis = PlaneBasis::from_normal(origin, normal).unwrap();
        let p = Point::new(2.0, 3.0, 3.0);
        let (u, v) = basis.project(p);
        let back = basis.unproject(u, v);
        assert!(p.is_close_tol(&back, 1e-12));
        assert!(basis.height(p).abs() < 1e-12);
    }

    #[test]
    fn test_basis_is_right_handed() {
        for normal in [
            Vector::new(0.0, -1.0, 0.0),
            Vector::new(0.0, 0.0, -1.0),
            Vector::new(1.0, 1.0, 0.3),
        ] {
            let basis = PlaneBasis::from_normal(Point::new(0., 0., 0.), normal).unwrap();
            let n = basis.u.cross(&basis.v);
            assert!((n.dot(&basis.n) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_normal_has_no_basis() {
        let basis = PlaneBasis::from_normal(Point::new(0., 0., 0.), Vector::new(0., 0., 0.));
        assert!(basis.is_none());
    }

    #[test]
    fn test_area_and_centroid_2d() {
        let sq = [(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)];
        assert!((signed_area_2d(&sq) - 2.0).abs() < 1e-12);
        let (cx, cy) = centroid_2d(&sq).unwrap();
        assert!((cx - 1.0).abs() < 1e-12 && (cy - 0.5).abs() < 1e-12);

        let cw: Vec<(f64, f64)> = sq.iter().rev().copied().collect();
        assert!((signed_area_2d(&cw) + 2.0).abs() < 1e-12);
    }
}
