use crate::Point;
use crate::geom::EPS;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Vector {
    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self { dx, dy, dz }
    }

    pub fn from_points(beg: Point, end: Point) -> Self {
        end - beg
    }

    /// Cross product between 2 vectors.
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            dx: self.dy * other.dz - self.dz * other.dy,
            dy: self.dz * other.dx - self.dx * other.dz,
            dz: self.dx * other.dy - self.dy * other.dx,
        }
    }

    /// Dot product between 2 vectors.
    pub fn dot(&self, other: &Self) -> f64 {
        self.dx * other.dx + self.dy * other.dy + self.dz * other.dz
    }

    /// Returns the length of the vector.
    pub fn length(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)).sqrt()
    }

    pub fn is_close(&self, other: &Self) -> bool {
        (self.dx - other.dx).abs() < EPS
            && (self.dy - other.dy).abs() < EPS
            && (self.dz - other.dz).abs() < EPS
    }

    /// Normalizes the vector (divides by its length) and returns a copy.
    pub fn normalize(&self) -> Result<Self> {
        let len = self.length();
        if len < EPS {
            Err(anyhow!("Cannot normalize a zero-length vector"))
        } else {
            Ok(Self {
                dx: self.dx / len,
                dy: self.dy / len,
                dz: self.dz / len,
            })
        }
    }

    /// Rotates the vector counter-clockwise about the +Z axis by `angle` (radians).
    pub fn rotate_z(&self, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            dx: self.dx * c - self.dy * s,
            dy: self.dx * s + self.dy * c,
            dz: self.dz,
        }
    }

    /// Newell normal of a closed loop of points (not normalized).
    ///
    /// The length of the returned vector equals twice the enclosed area,
    /// so a zero vector means a degenerate loop.
    pub fn newell(pts: &[Point]) -> Self {
        let n = pts.len();
        let mut vn = Self::new(0., 0., 0.);
        for i in 0..n {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            vn.dx += (a.y - b.y) * (a.z + b.z);
            vn.dy += (a.z - b.z) * (a.x + b.x);
            vn.dz += (a.x - b.x) * (a.y + b.y);
        }
        vn
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(
            f,
            "Vector({:.prec$}, {:.prec$}, {:.prec$})",
            self.dx,
            self.dy,
            self.dz,
            prec = prec
        )
    }
}

impl Add for Vector {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            dx: self.dx + other.dx,
            dy: self.dy + other.dy,
            dz: self.dz + other.dz,
        }
    }
}

impl Sub for Vector {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            dx: self.dx - other.dx,
            dy: self.dy - other.dy,
            dz: self.dz - other.dz,
        }
    }
}

impl Mul<f64> for Vector {
    type Output = Self;
    fn mul(self, other: f64) -> Self {
        Self {
            dx: self.dx * other,
            dy: self.dy * other,
            dz: self.dz * other,
        }
    }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.dx, -self.dy, -self.dz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_and_dot() {
        let x = Vector::new(1., 0., 0.);
        let y = Vector::new(0., 1., 0.);
        assert!(x.cross(&y).is_close(&Vector::new(0., 0., 1.)));
        assert_eq!(x.dot(&y), 0.);
    }

    #[test]
    fn test_normalize() -> Result<()> {
        let v = Vector::new(3., 0., 4.).normalize()?;
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!(Vector::new(0., 0., 0.).normalize().is_err());
        Ok(())
    }

    #[test]
    fn test_rotate_z_quarter_turn() {
        let v = Vector::new(0., 1., 0.5).rotate_z(std::f64::consts::FRAC_PI_2);
        assert!((v.dx + 1.0).abs() < 1e-12);
        assert!(v.dy.abs() < 1e-12);
        assert_eq!(v.dz, 0.5);
    }

    #[test]
    fn test_newell_unit_square() {
        let pts = [
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(1., 1., 0.),
            Point::new(0., 1., 0.),
        ];
        let vn = Vector::newell(&pts);
        assert!(vn.is_close(&Vector::new(0., 0., 2.)));
    }

    #[test]
    fn test_neg() {
        let v = -Vector::new(1., -2., 3.);
        assert!(v.is_close(&Vector::new(-1., 2., -3.)));
    }
}
