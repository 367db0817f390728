//! Ray casting against planar polygons.

use crate::{Point, Polygon, Vector};

/// Hits closer than this to the ray origin are ignored (self-intersection guard).
pub const RAY_EPS: f64 = 1e-9;

/// A ray defined by an origin point and a unit direction vector.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point,
    pub direction: Vector,
}

impl Ray {
    /// Creates a new ray. The direction is normalized; `None` for a zero direction.
    pub fn new(origin: Point, direction: Vector) -> Option<Self> {
        let direction = direction.normalize().ok()?;
        Some(Self { origin, direction })
    }

    /// Creates a ray from two points (origin to target).
    pub fn from_points(origin: Point, target: Point) -> Option<Self> {
        Self::new(origin, target - origin)
    }

    /// Returns `origin + t * direction`.
    pub fn point_at(&self, t: f64) -> Point {
        self.origin + self.direction * t
    }

    /// Ray parameter where the ray crosses the polygon's plane, if in front of the origin.
    fn plane_hit(&self, polygon: &Polygon) -> Option<f64> {
        let (a, b, c, d) = polygon.plane_coefficients();
        let denom = a * self.direction.dx + b * self.direction.dy + c * self.direction.dz;
        if denom.abs() < 1e-12 {
            return None; // parallel
        }
        let t = -(a * self.origin.x + b * self.origin.y + c * self.origin.z + d) / denom;
        (t > RAY_EPS).then_some(t)
    }

    /// Calculates the intersection of this ray with a polygon.
    ///
    /// Returns `Some((t, point))` for a hit in front of the origin. Edges count as hits.
    pub fn intersect_polygon(&self, polygon: &Polygon) -> Option<(f64, Point)> {
        let t = self.plane_hit(polygon)?;
        let pt = self.point_at(t);
        polygon.is_point_inside(pt, true).then_some((t, pt))
    }

    /// Closest hit among `polygons` as `(t, point, index)`.
    ///
    /// On equal distance the lower index wins.
    pub fn intersect_polygons(&self, polygons: &[&Polygon]) -> Option<(f64, Point, usize)> {
        let mut closest: Option<(f64, Point, usize)> = None;
        for (idx, polygon) in polygons.iter().enumerate() {
            if let Some((t, pt)) = self.intersect_polygon(polygon)
                && closest.is_none_or(|(best, _, _)| t < best)
            {
                closest = Some((t, pt, idx));
            }
        }
        closest
    }
}
