use crate::geom::point::Point;
use crate::geom::ray::Ray;
use serde::Serialize;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Bounding box of all points, or `None` for an empty slice.
    pub fn from_points(pts: &[Point]) -> Option<Self> {
        let first = *pts.first()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for p in &pts[1..] {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.min.z = bbox.min.z.min(p.z);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
            bbox.max.z = bbox.max.z.max(p.z);
        }
        Some(bbox)
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(
            0.5 * (self.min.x + self.max.x),
            0.5 * (self.min.y + self.max.y),
            0.5 * (self.min.z + self.max.z),
        )
    }

    /// Index of the longest axis (0 = x, 1 = y, 2 = z).
    pub fn longest_axis(&self) -> usize {
        let ext = [
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        ];
        if ext[0] >= ext[1] && ext[0] >= ext[2] {
            0
        } else if ext[1] >= ext[2] {
            1
        } else {
            2
        }
    }

    /// Returns the ray parameter at which the ray enters the box,
    /// or `None` if the ray misses it or enters beyond `t_max`.
    ///
    /// Slab test. Rays starting inside the box return `Some(0.0)`.
    pub fn ray_entry(&self, ray: &Ray, t_max: f64) -> Option<f64> {
        let origin = [ray.origin.x, ray.origin.y, ray.origin.z];
        let dir = [ray.direction.dx, ray.direction.dy, ray.direction.dz];
        let lo = [self.min.x, self.min.y, self.min.z];
        let hi = [self.max.x, self.max.y, self.max.z];

        let mut t0 = 0.0_f64;
        let mut t1 = t_max;
        for axis in 0..3 {
            if dir[axis].abs() < 1e-15 {
                // Parallel to the slab
                if origin[axis] < lo[axis] || origin[axis] > hi[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir[axis];
            let mut ta = (lo[axis] - origin[axis]) * inv;
            let mut tb = (hi[axis] - origin[axis]) * inv;
            if ta > tb {
                std::mem::swap(&mut ta, &mut tb);
            }
            t0 = t0.max(ta);
            t1 = t1.min(tb);
            if t0 > t1 {
                return None;
            }
        }
        Some(t0)
    }

    /// Grows the box by `margin` on every side.
    pub fn inflate(&self, margin: f64) -> Self {
        Self {
            min: Point::new(self.min.x - margin, self.min.y - margin, self.min.z - margin),
            max: Point::new(self.max.x + margin, self.max.y + margin, self.max.z + margin),
        }
    }
}
