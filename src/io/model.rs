//! JSON model files.
//!
//! A model file holds the rooms to analyze (with their shades) and optional
//! context geometry. Load series and results use their own serde layouts.

use crate::geom::room::{Room, Shade};
use crate::sim::shading::{ShadeBenefitResult, SimulationSeries};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Geometry input of a shade benefit analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShadeModel {
    pub rooms: Vec<Room>,
    /// Occluding geometry that is never scored.
    #[serde(default)]
    pub context: Vec<Shade>,
}

/// Writes a model to a JSON file.
pub fn write_model(path: &Path, model: &ShadeModel) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, model)
        .with_context(|| format!("Failed to serialize model to: {}", path.display()))?;

    Ok(())
}

/// Reads a model from a JSON file.
pub fn read_model(path: &Path) -> Result<ShadeModel> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let model: ShadeModel = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to deserialize model from: {}", path.display()))?;

    Ok(model)
}

/// Reads simulated load series from a JSON file.
pub fn read_series(path: &Path) -> Result<SimulationSeries> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to deserialize load series from: {}", path.display()))
}

/// Writes an analysis result to a JSON file.
pub fn write_result(path: &Path, result: &ShadeBenefitResult) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), result)
        .with_context(|| format!("Failed to serialize result to: {}", path.display()))
}
