//! Correlation of simulated load series with the geometry.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::error::ShadeError;
use crate::Identifier;
use crate::vecutils::{roll, sum_series};

/// Time series returned by the external energy simulation.
///
/// Cooling and heating are keyed by room (or zone) identifier, transmitted
/// solar by aperture identifier. Keys are matched case-insensitively and every
/// series must cover the full simulation timestep array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationSeries {
    #[serde(default)]
    pub cooling: HashMap<String, Vec<f64>>,
    #[serde(default)]
    pub heating: HashMap<String, Vec<f64>>,
    #[serde(default)]
    pub transmitted_solar: HashMap<String, Vec<f64>>,
}

impl SimulationSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse simulation series")
    }

    pub fn with_room(mut self, room: &str, cooling: Vec<f64>, heating: Vec<f64>) -> Self {
        self.cooling.insert(room.to_string(), cooling);
        self.heating.insert(room.to_string(), heating);
        self
    }

    pub fn with_aperture(mut self, aperture: &str, solar: Vec<f64>) -> Self {
        self.transmitted_solar.insert(aperture.to_string(), solar);
        self
    }
}

/// Loads of one room at one timestep, lag already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadTriple {
    pub cooling: f64,
    pub heating: f64,
    /// Transmitted solar of the aperture group.
    pub solar: f64,
}

/// Lagged load series of one aperture group.
#[derive(Debug, Clone)]
pub struct GroupLoads {
    pub cooling: Vec<f64>,
    pub heating: Vec<f64>,
    pub solar: Vec<f64>,
}

impl GroupLoads {
    pub fn triple(&self, step: usize) -> Option<LoadTriple> {
        Some(LoadTriple {
            cooling: *self.cooling.get(step)?,
            heating: *self.heating.get(step)?,
            solar: *self.solar.get(step)?,
        })
    }

    pub fn len(&self) -> usize {
        self.solar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solar.is_empty()
    }
}

/// Joins simulation series to rooms and apertures by identifier.
#[derive(Debug)]
pub struct LoadCorrelator<'a> {
    cooling: HashMap<Identifier, &'a [f64]>,
    heating: HashMap<Identifier, &'a [f64]>,
    solar: HashMap<Identifier, &'a [f64]>,
    step_count: usize,
    lag_steps: usize,
}

impl<'a> LoadCorrelator<'a> {
    /// Indexes `series` by identifier.
    ///
    /// Fails if two keys of one series differ only by case.
    pub fn new(series: &'a SimulationSeries, step_count: usize, lag_steps: usize) -> Result<Self> {
        if lag_steps >= step_count {
            return Err(ShadeError::Configuration(format!(
                "lag of {lag_steps} steps must be shorter than the {step_count} step period"
            ))
            .into());
        }
        Ok(Self {
            cooling: key_series(&series.cooling, "cooling")?,
            heating: key_series(&series.heating, "heating")?,
            solar: key_series(&series.transmitted_solar, "transmitted solar")?,
            step_count,
            lag_steps,
        })
    }

    pub fn lag_steps(&self) -> usize {
        self.lag_steps
    }

    /// Loads for a group: the room's cooling and heating rolled forward by the
    /// lag, and the summed transmitted solar of its apertures (not rolled).
    pub fn group_loads(&self, load_key: &Identifier, aperture_ids: &[Identifier]) -> Result<GroupLoads> {
        let mut cooling = self.lookup(&self.cooling, load_key, "cooling")?.to_vec();
        let mut heating = self.lookup(&self.heating, load_key, "heating")?.to_vec();
        roll(&mut cooling, self.lag_steps);
        roll(&mut heating, self.lag_steps);

        let solar_series = aperture_ids
            .iter()
            .map(|id| self.lookup(&self.solar, id, "transmitted solar"))
            .collect::<Result<Vec<_>>>()?;
        let solar = sum_series(&solar_series).ok_or_else(|| {
            ShadeError::DataMismatch("transmitted solar series differ in length".to_string())
        })?;

        Ok(GroupLoads {
            cooling,
            heating,
            solar,
        })
    }

    fn lookup(
        &self,
        map: &HashMap<Identifier, &'a [f64]>,
        id: &Identifier,
        what: &str,
    ) -> Result<&'a [f64]> {
        let values = map.get(id).copied().ok_or_else(|| {
            ShadeError::DataMismatch(format!("no {what} series for '{id}'"))
        })?;
        if values.len() != self.step_count {
            return Err(ShadeError::DataMismatch(format!(
                "{what} series for '{id}' has {} values, expected {}",
                values.len(),
                self.step_count
            ))
            .into());
        }
        Ok(values)
    }
}

fn key_series<'a>(
    map: &'a HashMap<String, Vec<f64>>,
    what: &str,
) -> Result<HashMap<Identifier, &'a [f64]>> {
    let mut keyed = HashMap::with_capacity(map.len());
    for (key, values) in map {
        if keyed.insert(Identifier::new(key), values.as_slice()).is_some() {
            return Err(ShadeError::DataMismatch(format!(
                "{what} series key '{key}' is ambiguous (differs from another key only by case)"
            ))
            .into());
        }
    }
    Ok(keyed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> SimulationSeries {
        SimulationSeries::new()
            .with_room("ROOM_A", vec![0., 1., 2., 3.], vec![10., 11., 12., 13.])
            .with_aperture("Win_1", vec![5., 5., 5., 5.])
            .with_aperture("win_2", vec![1., 2., 3., 4.])
    }

    fn mismatch(err: anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<ShadeError>(),
            Some(ShadeError::DataMismatch(_))
        )
    }

    #[test]
    fn test_lag_rolls_loads_not_solar() -> Result<()> {
        let s = series();
        let corr = LoadCorrelator::new(&s, 4, 1)?;
        let loads = corr.group_loads(&"room_a".into(), &["WIN_2".into()])?;
        assert_eq!(loads.cooling, vec![3., 0., 1., 2.]);
        assert_eq!(loads.heating, vec![13., 10., 11., 12.]);
        assert_eq!(loads.solar, vec![1., 2., 3., 4.]);
        assert_eq!(
            loads.triple(1),
            Some(LoadTriple {
                cooling: 0.,
                heating: 10.,
                solar: 2.
            })
        );
        assert_eq!(loads.triple(4), None);
        Ok(())
    }

    #[test]
    fn test_solar_summed_over_group() -> Result<()> {
        let s = series();
        let corr = LoadCorrelator::new(&s, 4, 0)?;
        let loads = corr.group_loads(&"Room_A".into(), &["win_1".into(), "win_2".into()])?;
        assert_eq!(loads.solar, vec![6., 7., 8., 9.]);
        assert_eq!(loads.cooling, vec![0., 1., 2., 3.]);
        assert_eq!(loads.len(), 4);
        Ok(())
    }

    #[test]
    fn test_missing_key_is_data_mismatch() -> Result<()> {
        let s = series();
        let corr = LoadCorrelator::new(&s, 4, 0)?;
        assert!(mismatch(
            corr.group_loads(&"room_b".into(), &["win_1".into()])
                .unwrap_err()
        ));
        assert!(mismatch(
            corr.group_loads(&"room_a".into(), &["win_3".into()])
                .unwrap_err()
        ));
        Ok(())
    }

    #[test]
    fn test_length_mismatch() -> Result<()> {
        let s = series();
        let corr = LoadCorrelator::new(&s, 5, 0)?;
        assert!(mismatch(
            corr.group_loads(&"room_a".into(), &["win_1".into()])
                .unwrap_err()
        ));
        Ok(())
    }

    #[test]
    fn test_ambiguous_keys() {
        let s = series().with_aperture("WIN_1", vec![0.; 4]);
        assert!(mismatch(LoadCorrelator::new(&s, 4, 0).unwrap_err()));
    }

    #[test]
    fn test_lag_must_be_shorter_than_period() {
        let s = series();
        let err = LoadCorrelator::new(&s, 4, 4).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShadeError>(),
            Some(ShadeError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_json() -> Result<()> {
        let s = SimulationSeries::from_json(
            r#"{"cooling": {"r": [1, 2]}, "heating": {"r": [0, 0]}, "transmitted_solar": {"w": [3, 4]}}"#,
        )?;
        let corr = LoadCorrelator::new(&s, 2, 0)?;
        let loads = corr.group_loads(&"R".into(), &["W".into()])?;
        assert_eq!(loads.solar, vec![3., 4.]);
        Ok(())
    }
}
