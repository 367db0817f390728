use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::error::ShadeError;
use super::solar::AnalysisPeriod;

/// Geographic site of the analyzed building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Degrees, positive north.
    pub latitude: f64,
    /// Degrees, positive east.
    pub longitude: f64,
    /// Time zone of the simulation clock in hours from UTC.
    pub utc_offset: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            utc_offset: 0.0,
        }
    }
}

/// Configuration for a shade benefit analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadeBenefitConfig {
    pub location: Location,
    /// Counter-clockwise angle from +Y to north in degrees.
    pub north_angle: f64,
    /// Period and timestep the load series were simulated for.
    pub period: AnalysisPeriod,
    /// Maximum shade face dimension (model length units).
    pub grid_size: f64,
    /// Hours between solar gain entering a room and its effect on the loads.
    pub lag_time: f64,
    /// Ray intersection workers. `None` uses all cores but one.
    pub workers: Option<usize>,
    /// Distance sample points are lifted off the glazing along its normal.
    pub sample_offset: f64,
}

impl ShadeBenefitConfig {
    pub fn new() -> Self {
        Self {
            location: Location::default(),
            north_angle: 0.0,
            period: AnalysisPeriod::new(),
            grid_size: 0.25,
            lag_time: 0.0,
            workers: None,
            sample_offset: 0.001,
        }
    }

    /// Parses and validates a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse shade benefit config")?;
        config.validate()?;
        Ok(config)
    }

    /// Thermal lag in timesteps.
    pub fn lag_steps(&self) -> usize {
        (self.period.timestep as f64 * self.lag_time).round().max(0.0) as usize
    }

    /// Size of the ray intersection worker pool.
    pub fn effective_workers(&self) -> usize {
        effective_workers(self.workers)
    }

    /// Checks everything that can be checked without geometry or load data.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> { Err(ShadeError::Configuration(msg).into()) };

        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return fail(format!("grid size must be positive, got {}", self.grid_size));
        }
        if !self.lag_time.is_finite() || self.lag_time < 0.0 {
            return fail(format!(
                "lag time must be a non-negative number of hours, got {}",
                self.lag_time
            ));
        }
        if !self.sample_offset.is_finite() || self.sample_offset < 0.0 {
            return fail(format!(
                "sample offset must be non-negative, got {}",
                self.sample_offset
            ));
        }
        if !self.north_angle.is_finite() {
            return fail("north angle must be finite".to_string());
        }
        let loc = &self.location;
        if !(-90.0..=90.0).contains(&loc.latitude) {
            return fail(format!("latitude {} is outside [-90, 90]", loc.latitude));
        }
        if !(-180.0..=180.0).contains(&loc.longitude) {
            return fail(format!("longitude {} is outside [-180, 180]", loc.longitude));
        }
        if !(-12.0..=14.0).contains(&loc.utc_offset) {
            return fail(format!("UTC offset {} is outside [-12, 14]", loc.utc_offset));
        }

        self.period.validate()?;

        let steps = self.period.step_count();
        let lag = self.lag_steps();
        if lag >= steps {
            return fail(format!(
                "lag of {lag} steps must be shorter than the {steps} step period"
            ));
        }
        Ok(())
    }
}

impl Default for ShadeBenefitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker pool size: `min(requested, cores - 1)`, at least 1.
pub fn effective_workers(requested: Option<usize>) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let cap = cores.saturating_sub(1).max(1);
    requested.unwrap_or(cap).min(cap).max(1)
}
