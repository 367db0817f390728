//! Grid discretization of planar polygons.
//!
//! A polygon is cut by a regular grid laid out in its own plane frame.
//! Every grid cell is clipped against the polygon, so the faces of a
//! discretized polygon tile it exactly and their areas add up to the
//! polygon's area.

use crate::geom::polygon::MIN_AREA;
use crate::geom::projection::signed_area_2d;
use crate::{Point, Polygon, Vector};
use anyhow::{Context, Result, anyhow};
use serde::Serialize;

/// A sub-polygon of a discretized input polygon.
#[derive(Debug, Clone, Serialize)]
pub struct MeshFace {
    pub polygon: Polygon,
    /// Index of the input polygon this face was cut from.
    pub parent: usize,
}

impl MeshFace {
    pub fn area(&self) -> f64 {
        self.polygon.area()
    }

    pub fn centroid(&self) -> Point {
        self.polygon.centroid()
    }

    pub fn normal(&self) -> Vector {
        self.polygon.vn
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Mesh {
    faces: Vec<MeshFace>,
}

impl Mesh {
    /// Discretizes every polygon at `grid_size` and collects the faces in input order.
    pub fn from_polygons(polygons: &[Polygon], grid_size: f64) -> Result<Self> {
        let mut mesh = Self::default();
        for (parent, polygon) in polygons.iter().enumerate() {
            mesh.add_polygon(polygon, parent, grid_size)?;
        }
        Ok(mesh)
    }

    /// Discretizes one polygon and appends its faces under `parent`.
    ///
    /// Returns the number of faces added. On error the mesh is left unchanged.
    pub fn add_polygon(&mut self, polygon: &Polygon, parent: usize, grid_size: f64) -> Result<usize> {
        let pieces = subdivide_polygon(polygon, grid_size)
            .with_context(|| format!("Failed to discretize polygon '{}'", polygon.name))?;
        let count = pieces.len();
        self.faces
            .extend(pieces.into_iter().map(|polygon| MeshFace { polygon, parent }));
        Ok(count)
    }

    pub fn faces(&self) -> &[MeshFace] {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Total area of all faces.
    pub fn area(&self) -> f64 {
        self.faces.iter().map(|f| f.area()).sum()
    }
}

/// Splits `polygon` into faces no larger than `grid_size` along either in-plane axis.
///
/// The grid is aligned with the polygon's plane frame and spans its 2D bounding
/// box with equally sized cells. Cells that do not overlap the polygon are dropped.
pub fn subdivide_polygon(polygon: &Polygon, grid_size: f64) -> Result<Vec<Polygon>> {
    if !grid_size.is_finite() || grid_size <= 0. {
        return Err(anyhow!("Grid size must be positive, got {grid_size}"));
    }

    let pts2d = polygon.vertices_2d();
    let (mut xmin, mut xmax) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut ymin, mut ymax) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in pts2d {
        xmin = xmin.min(x);
        xmax = xmax.max(x);
        ymin = ymin.min(y);
        ymax = ymax.max(y);
    }

    let nx = cell_count(xmax - xmin, grid_size);
    let ny = cell_count(ymax - ymin, grid_size);
    let dx = (xmax - xmin) / nx as f64;
    let dy = (ymax - ymin) / ny as f64;
    let xs: Vec<f64> = (0..=nx)
        .map(|i| if i == nx { xmax } else { xmin + i as f64 * dx })
        .collect();
    let ys: Vec<f64> = (0..=ny)
        .map(|j| if j == ny { ymax } else { ymin + j as f64 * dy })
        .collect();

    let basis = polygon.basis();
    let mut faces = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let piece = clip_to_rect(pts2d, xs[i], xs[i + 1], ys[j], ys[j + 1]);
            if piece.len() < 3 || signed_area_2d(&piece).abs() < MIN_AREA {
                continue;
            }
            let pts: Vec<Point> = piece.iter().map(|&(x, y)| basis.unproject(x, y)).collect();
            let name = format!("{}_{}_{}", polygon.name, i, j);
            faces.push(Polygon::new(&name, pts, Some(polygon.vn))?);
        }
    }
    Ok(faces)
}

fn cell_count(extent: f64, grid_size: f64) -> usize {
    // Tolerance keeps an exact multiple of the grid from spilling into an extra cell
    ((extent / grid_size) - 1e-9).ceil().max(1.) as usize
}

/// Sutherland-Hodgman clipping of a 2D loop against an axis-aligned rectangle.
fn clip_to_rect(subject: &[(f64, f64)], x0: f64, x1: f64, y0: f64, y1: f64) -> Vec<(f64, f64)> {
    let mut out: Vec<(f64, f64)> = subject.to_vec();
    for edge in 0..4 {
        if out.is_empty() {
            break;
        }
        let input = std::mem::take(&mut out);
        let inside = |p: (f64, f64)| match edge {
            0 => p.0 >= x0,
            1 => p.0 <= x1,
            2 => p.1 >= y0,
            _ => p.1 <= y1,
        };
        let crossing = |a: (f64, f64), b: (f64, f64)| match edge {
            0 | 1 => {
                let c = if edge == 0 { x0 } else { x1 };
                let t = (c - a.0) / (b.0 - a.0);
                (c, a.1 + t * (b.1 - a.1))
            }
            _ => {
                let c = if edge == 2 { y0 } else { y1 };
                let t = (c - a.1) / (b.1 - a.1);
                (a.0 + t * (b.0 - a.0), c)
            }
        };

        let n = input.len();
        for k in 0..n {
            let cur = input[k];
            let prev = input[(k + n - 1) % n];
            match (inside(prev), inside(cur)) {
                (true, true) => out.push(cur),
                (true, false) => out.push(crossing(prev, cur)),
                (false, true) => {
                    out.push(crossing(prev, cur));
                    out.push(cur);
                }
                (false, false) => {}
            }
        }
    }
    out
}
