pub mod bboxes;
pub mod mesh;
pub mod point;
pub mod polygon;
pub mod projection;
pub mod ray;
pub mod room;
pub mod vector;

/// Geometric precision
pub const EPS: f64 = 1e-13;

/// Tolerance for coplanarity and point-on-edge checks (length units).
pub const PLANE_TOL: f64 = 1e-6;
