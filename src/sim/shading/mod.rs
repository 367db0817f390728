//! Shade benefit analysis.
//!
//! Scores each patch of a building's shading devices by how much cooling it
//! avoids (help) and how much useful solar heat it blocks (harm), given the
//! loads of an energy simulation run without the shades:
//!
//! 1. [`solar`] turns the simulation period into sunlit sun vectors.
//! 2. [`geometry`] discretizes shades into source meshes and glazing into sample points.
//! 3. [`intersect`] casts a ray from every sample point toward every sun position.
//! 4. [`loads`] joins the lagged load series to each aperture group.
//! 5. [`aggregate`] accumulates help and harm per shade face.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod geometry;
pub mod intersect;
pub mod loads;
pub mod result;
pub mod simulation;
pub mod solar;

pub use aggregate::FaceScore;
pub use config::{Location, ShadeBenefitConfig};
pub use error::ShadeError;
pub use loads::{LoadTriple, SimulationSeries};
pub use result::{GroupSummary, ShadeBenefitResult};
pub use simulation::ShadeBenefitSimulation;
pub use solar::{AnalysisPeriod, SunPath, SunVector, Timestamp};
