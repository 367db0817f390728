//! Sun positions over an analysis period.
//!
//! Timestamps are local standard time on a non-leap year. The model's north
//! may be rotated away from +Y; sun directions are rotated into model axes.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::config::Location;
use super::error::ShadeError;
use crate::Vector;

/// Sub-hourly timesteps an energy simulation can report at.
pub const VALID_TIMESTEPS: [u32; 12] = [1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30, 60];

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn days_in_month(month: u32) -> Option<u32> {
    DAYS_IN_MONTH.get(month.checked_sub(1)? as usize).copied()
}

/// One step of the simulation timestep array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl Timestamp {
    pub fn new(month: u32, day: u32, hour: u32, minute: u32) -> Self {
        Self {
            month,
            day,
            hour,
            minute,
        }
    }

    /// Builds the timestamp for a day of the year (1-365).
    pub fn from_day_of_year(day_of_year: u16, hour: u32, minute: u32) -> Option<Self> {
        let mut remaining = u32::from(day_of_year);
        if remaining == 0 {
            return None;
        }
        for (i, &days) in DAYS_IN_MONTH.iter().enumerate() {
            if remaining <= days {
                return Some(Self::new(i as u32 + 1, remaining, hour, minute));
            }
            remaining -= days;
        }
        None
    }

    /// Day of the year, 1 for January 1st.
    pub fn day_of_year(&self) -> u16 {
        let before: u32 = DAYS_IN_MONTH
            .iter()
            .take(self.month.saturating_sub(1) as usize)
            .sum();
        (before + self.day) as u16
    }

    /// Clock time in fractional hours.
    pub fn hour_of_day(&self) -> f64 {
        self.hour as f64 + self.minute as f64 / 60.0
    }

    pub fn is_valid(&self) -> bool {
        days_in_month(self.month).is_some_and(|d| self.day >= 1 && self.day <= d)
            && self.hour < 24
            && self.minute < 60
    }
}

/// Date and hour range the energy simulation was run for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPeriod {
    pub start_month: u32,
    pub start_day: u32,
    pub start_hour: u32,
    pub end_month: u32,
    pub end_day: u32,
    pub end_hour: u32,
    /// Timesteps per hour.
    pub timestep: u32,
}

impl AnalysisPeriod {
    /// Whole year at hourly resolution.
    pub fn new() -> Self {
        Self {
            start_month: 1,
            start_day: 1,
            start_hour: 0,
            end_month: 12,
            end_day: 31,
            end_hour: 23,
            timestep: 1,
        }
    }

    /// Same hours on every day between two dates (inclusive).
    pub fn days(start: (u32, u32), end: (u32, u32), hours: (u32, u32), timestep: u32) -> Self {
        Self {
            start_month: start.0,
            start_day: start.1,
            start_hour: hours.0,
            end_month: end.0,
            end_day: end.1,
            end_hour: hours.1,
            timestep,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> { Err(ShadeError::Configuration(msg).into()) };
        if !VALID_TIMESTEPS.contains(&self.timestep) {
            return fail(format!(
                "timestep must be one of {VALID_TIMESTEPS:?}, got {}",
                self.timestep
            ));
        }
        let start = Timestamp::new(self.start_month, self.start_day, self.start_hour, 0);
        let end = Timestamp::new(self.end_month, self.end_day, self.end_hour, 0);
        if !start.is_valid() {
            return fail(format!(
                "invalid period start {}/{} {}h",
                self.start_month, self.start_day, self.start_hour
            ));
        }
        if !end.is_valid() {
            return fail(format!(
                "invalid period end {}/{} {}h",
                self.end_month, self.end_day, self.end_hour
            ));
        }
        if self.start_hour > self.end_hour {
            return fail(format!(
                "start hour {} is after end hour {}",
                self.start_hour, self.end_hour
            ));
        }
        Ok(())
    }

    /// Number of days covered. Periods ending before they start wrap over the new year.
    pub fn day_count(&self) -> usize {
        let start = Timestamp::new(self.start_month, self.start_day, 0, 0).day_of_year() as usize;
        let end = Timestamp::new(self.end_month, self.end_day, 0, 0).day_of_year() as usize;
        if end >= start {
            end - start + 1
        } else {
            365 - start + end + 1
        }
    }

    pub fn step_count(&self) -> usize {
        let hours = (self.end_hour.saturating_sub(self.start_hour) + 1) as usize;
        self.day_count() * hours * self.timestep as usize
    }

    /// Ordered timestep array of the period.
    pub fn timestamps(&self) -> Vec<Timestamp> {
        let timestep = self.timestep.max(1);
        let start = Timestamp::new(self.start_month, self.start_day, 0, 0).day_of_year();
        let mut stamps = Vec::with_capacity(self.step_count());
        for d in 0..self.day_count() {
            let doy = ((start as usize - 1 + d) % 365 + 1) as u16;
            for hour in self.start_hour..=self.end_hour {
                for s in 0..timestep {
                    if let Some(ts) = Timestamp::from_day_of_year(doy, hour, s * 60 / timestep) {
                        stamps.push(ts);
                    }
                }
            }
        }
        stamps
    }
}

impl Default for AnalysisPeriod {
    fn default() -> Self {
        Self::new()
    }
}

/// Solar position (azimuth and elevation angles).
#[derive(Debug, Clone, Copy)]
pub struct SolarPosition {
    /// Solar altitude angle in degrees (0 = horizon, 90 = zenith).
    pub altitude: f64,
    /// Solar azimuth angle in degrees from north, clockwise (0=N, 90=E, 180=S, 270=W).
    pub azimuth: f64,
}

impl SolarPosition {
    /// Calculates the solar position using the Spencer algorithm.
    ///
    /// - `latitude`: in degrees (positive north)
    /// - `longitude`: in degrees (positive east)
    /// - `utc_offset`: time zone of the clock time, in hours
    /// - `day_of_year`: 1-365
    /// - `hour`: local standard time in hours (0-24)
    pub fn calculate(
        latitude: f64,
        longitude: f64,
        utc_offset: f64,
        day_of_year: u16,
        hour: f64,
    ) -> Self {
        let lat = latitude.to_radians();

        // Day angle (Spencer)
        let gamma =
            2.0 * std::f64::consts::PI * (day_of_year as f64 - 1.0 + (hour - 12.0) / 24.0) / 365.0;

        // Solar declination (Spencer approximation)
        let declination = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
            - 0.006758 * (2.0 * gamma).cos()
            + 0.000907 * (2.0 * gamma).sin()
            - 0.002697 * (3.0 * gamma).cos()
            + 0.00148 * (3.0 * gamma).sin();

        // Equation of time in minutes
        let eot = 229.18
            * (0.000075 + 0.001868 * gamma.cos()
                - 0.032077 * gamma.sin()
                - 0.014615 * (2.0 * gamma).cos()
                - 0.040849 * (2.0 * gamma).sin());

        let solar_time = hour + (4.0 * (longitude - 15.0 * utc_offset) + eot) / 60.0;

        // Hour angle (15 degrees per hour from solar noon)
        let hour_angle = (solar_time - 12.0) * 15.0_f64.to_radians();

        // Solar altitude
        let sin_alt =
            lat.sin() * declination.sin() + lat.cos() * declination.cos() * hour_angle.cos();
        let altitude = sin_alt.clamp(-1.0, 1.0).asin().to_degrees();

        // Solar azimuth
        let cos_azimuth = (declination.sin() * lat.cos()
            - declination.cos() * lat.sin() * hour_angle.cos())
            / altitude.to_radians().cos().max(1e-10);

        let mut azimuth = cos_azimuth.clamp(-1.0, 1.0).acos().to_degrees();
        if hour_angle.sin() > 0.0 {
            azimuth = 360.0 - azimuth;
        }

        Self { altitude, azimuth }
    }

    /// Returns true if the sun is above the horizon.
    pub fn is_above_horizon(&self) -> bool {
        self.altitude > 0.0
    }

    /// Unit vector pointing toward the sun, with north = +Y and east = +X.
    pub fn to_direction(&self) -> Vector {
        let alt = self.altitude.to_radians();
        let azi = self.azimuth.to_radians();

        let x = alt.cos() * azi.sin();
        let y = alt.cos() * azi.cos();
        let z = alt.sin();

        Vector::new(x, y, z)
    }
}

/// Sun direction at one sunlit timestep.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SunVector {
    /// Index into the simulation timestep array.
    pub step: usize,
    pub altitude: f64,
    pub azimuth: f64,
    /// Unit vector from the ground up to the sun, in model axes.
    pub to_sun: Vector,
}

impl SunVector {
    /// Direction sunlight travels (sun to ground).
    pub fn light_direction(&self) -> Vector {
        -self.to_sun
    }
}

/// Sun path of a site, expressed in model axes.
#[derive(Debug, Clone, Copy)]
pub struct SunPath {
    pub location: Location,
    /// Counter-clockwise angle from +Y to north, in degrees.
    pub north_angle: f64,
}

impl SunPath {
    pub fn new(location: Location, north_angle: f64) -> Self {
        Self {
            location,
            north_angle,
        }
    }

    pub fn position(&self, ts: &Timestamp) -> SolarPosition {
        SolarPosition::calculate(
            self.location.latitude,
            self.location.longitude,
            self.location.utc_offset,
            ts.day_of_year(),
            ts.hour_of_day(),
        )
    }

    /// Sun vector at `step`, or `None` if the sun is not above the horizon.
    pub fn sun_vector(&self, step: usize, ts: &Timestamp) -> Option<SunVector> {
        let pos = self.position(ts);
        if !pos.is_above_horizon() {
            return None;
        }
        Some(SunVector {
            step,
            altitude: pos.altitude,
            azimuth: pos.azimuth,
            to_sun: pos.to_direction().rotate_z(self.north_angle.to_radians()),
        })
    }

    /// Sun vectors for all sunlit entries of `timestamps`, in timestep order.
    pub fn sun_vectors(&self, timestamps: &[Timestamp]) -> Vec<SunVector> {
        timestamps
            .iter()
            .enumerate()
            .filter_map(|(step, ts)| self.sun_vector(step, ts))
            .collect()
    }
}
