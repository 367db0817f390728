//! Planar polygon with cached plane frame, area and centroid.

use crate::geom::PLANE_TOL;
use crate::geom::bboxes::BoundingBox;
use crate::geom::projection::{PlaneBasis, centroid_2d, signed_area_2d};
use crate::{Point, Vector};
use anyhow::{Result, anyhow};
use serde::Serialize;

/// Polygons with less area than this are degenerate.
pub const MIN_AREA: f64 = 1e-12;

#[derive(Debug, Clone, Serialize)]
pub struct Polygon {
    pub name: String,
    pts: Vec<Point>,
    /// Unit normal. Vertices run counter-clockwise around it.
    pub vn: Vector,
    area: f64,
    centroid: Point,
    #[serde(skip)]
    basis: PlaneBasis,
    #[serde(skip)]
    pts2d: Vec<(f64, f64)>,
    #[serde(skip)]
    bbox: BoundingBox,
}

impl Polygon {
    /// Creates a planar polygon.
    ///
    /// The normal follows the vertex order (right-hand rule) unless `normal`
    /// is given, in which case the vertices are reordered to match it.
    /// Fails for fewer than 3 distinct vertices, zero area, or non-planar input.
    pub fn new(name: &str, pts: Vec<Point>, normal: Option<Vector>) -> Result<Self> {
        let mut pts = remove_repeated(pts);
        if pts.len() < 3 {
            return Err(anyhow!(
                "Polygon '{name}' needs at least 3 distinct vertices, got {}",
                pts.len()
            ));
        }

        let newell = Vector::newell(&pts);
        if newell.length() * 0.5 < MIN_AREA {
            return Err(anyhow!("Polygon '{name}' has zero area"));
        }
        let mut vn = newell.normalize()?;
        if let Some(n) = normal {
            let n = n.normalize()?;
            if n.dot(&vn) < 0. {
                pts.reverse();
            }
            vn = n;
        }

        let basis = PlaneBasis::from_normal(pts[0], vn)
            .ok_or_else(|| anyhow!("Polygon '{name}' has no valid plane"))?;
        if let Some(p) = pts.iter().find(|p| basis.height(**p).abs() > PLANE_TOL) {
            return Err(anyhow!("Polygon '{name}' is not planar (vertex {p})"));
        }

        let pts2d: Vec<(f64, f64)> = pts.iter().map(|p| basis.project(*p)).collect();
        let area = signed_area_2d(&pts2d).abs();
        if area < MIN_AREA {
            return Err(anyhow!("Polygon '{name}' has zero area"));
        }
        let (cx, cy) =
            centroid_2d(&pts2d).ok_or_else(|| anyhow!("Polygon '{name}' has no centroid"))?;
        let centroid = basis.unproject(cx, cy);
        let bbox = BoundingBox::from_points(&pts)
            .ok_or_else(|| anyhow!("Polygon '{name}' has no vertices"))?;

        Ok(Self {
            name: name.to_string(),
            pts,
            vn,
            area,
            centroid,
            basis,
            pts2d,
            bbox,
        })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.pts
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn centroid(&self) -> Point {
        self.centroid
    }

    pub fn basis(&self) -> &PlaneBasis {
        &self.basis
    }

    /// Vertices expressed in the polygon's own plane frame.
    pub fn vertices_2d(&self) -> &[(f64, f64)] {
        &self.pts2d
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Plane equation coefficients `(a, b, c, d)` with `ax + by + cz + d = 0`.
    pub fn plane_coefficients(&self) -> (f64, f64, f64, f64) {
        let p0 = self.pts[0];
        let d = -(self.vn.dx * p0.x + self.vn.dy * p0.y + self.vn.dz * p0.z);
        (self.vn.dx, self.vn.dy, self.vn.dz, d)
    }

    /// Checks if a point lies inside the polygon.
    ///
    /// The point must be on the polygon's plane (within [`PLANE_TOL`]).
    /// If `boundary_in` is true, points on edges or vertices count as inside.
    pub fn is_point_inside(&self, ptest: Point, boundary_in: bool) -> bool {
        if self.basis.height(ptest).abs() > PLANE_TOL {
            return false;
        }
        let (x, y) = self.basis.project(ptest);

        let n = self.pts2d.len();
        for i in 0..n {
            if distance_to_segment_2d((x, y), self.pts2d[i], self.pts2d[(i + 1) % n]) < PLANE_TOL
            {
                return boundary_in;
            }
        }

        // Crossing number
        let mut inside = false;
        for i in 0..n {
            let (x0, y0) = self.pts2d[i];
            let (x1, y1) = self.pts2d[(i + 1) % n];
            if (y0 > y) != (y1 > y) {
                let x_cross = x0 + (y - y0) * (x1 - x0) / (y1 - y0);
                if x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

/// Drops consecutive duplicate vertices (including a closing vertex equal to the first).
fn remove_repeated(pts: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(pts.len());
    for p in pts {
        if out.last().is_none_or(|last| !last.is_close_tol(&p, PLANE_TOL)) {
            out.push(p);
        }
    }
    while out.len() > 1 && out[0].is_close_tol(&out[out.len() - 1], PLANE_TOL) {
        out.pop();
    }
    out
}

fn distance_to_segment_2d(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0. {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0., 1.)
    } else {
        0.
    };
    let (qx, qy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - qx).powi(2) + (p.1 - qy).powi(2)).sqrt()
}
