use std::time::Instant;

use anyhow::{Context, Result};

use super::aggregate::score_faces;
use super::config::ShadeBenefitConfig;
use super::error::ShadeError;
use super::geometry::ShadeIndex;
use super::intersect::RayIntersector;
use super::loads::{GroupLoads, LoadCorrelator, SimulationSeries};
use super::result::ShadeBenefitResult;
use super::solar::{SunPath, SunVector, Timestamp};
use crate::geom::room::{Room, Shade};
use crate::sim::engine::PolygonScene;

/// Shade benefit analysis of a model's shaded apertures.
///
/// Construction validates the config and discretizes the geometry once.
/// [`run`](Self::run) can then score any number of load series simulated
/// for the same period.
pub struct ShadeBenefitSimulation {
    config: ShadeBenefitConfig,
    index: ShadeIndex,
    context: Option<PolygonScene>,
    timestamps: Vec<Timestamp>,
    sun_vectors: Vec<SunVector>,
}

impl ShadeBenefitSimulation {
    /// Prepares the analysis.
    ///
    /// `rooms` must be the original geometry with shades attached; the energy
    /// simulation runs on [`strip_shades`](crate::geom::room::strip_shades) of it.
    /// `context` is occluding geometry that is never scored.
    pub fn new(rooms: &[Room], context: &[Shade], config: ShadeBenefitConfig) -> Result<Self> {
        config.validate()?;

        let timestamps = config.period.timestamps();
        let sun_vectors =
            SunPath::new(config.location, config.north_angle).sun_vectors(&timestamps);

        let mut index = ShadeIndex::build(rooms, config.grid_size, config.sample_offset)?;
        let context = index.context_scene(context);

        tracing::info!(
            groups = index.groups.len(),
            source_faces = index.face_count(),
            sample_points = index.sample_point_count(),
            context_polygons = context.as_ref().map_or(0, |c| c.len()),
            timesteps = timestamps.len(),
            sun_vectors = sun_vectors.len(),
            skipped_polygons = index.skipped_polygons,
            "Prepared shade benefit analysis"
        );

        Ok(Self {
            config,
            index,
            context,
            timestamps,
            sun_vectors,
        })
    }

    /// Replaces the computed sun vectors, e.g. with ones derived from a weather file.
    ///
    /// Steps must be strictly increasing and index into the period's timestep
    /// array. Every vector must point above the horizon.
    pub fn with_sun_vectors(mut self, mut sun_vectors: Vec<SunVector>) -> Result<Self> {
        let step_count = self.timestamps.len();
        let mut previous: Option<usize> = None;
        for sun in &mut sun_vectors {
            let step = sun.step;
            if step >= step_count {
                return Err(ShadeError::Configuration(format!(
                    "sun vector step {step} is outside the {step_count} step period"
                ))
                .into());
            }
            if let Some(prev) = previous
                && step <= prev
            {
                return Err(ShadeError::Configuration(format!(
                    "sun vector steps must be strictly increasing, got {step} after {prev}"
                ))
                .into());
            }
            sun.to_sun = sun
                .to_sun
                .normalize()
                .with_context(|| format!("Invalid sun vector at step {step}"))?;
            if sun.to_sun.dz <= 0.0 {
                return Err(ShadeError::Configuration(format!(
                    "sun vector at step {step} is not above the horizon"
                ))
                .into());
            }
            previous = Some(step);
        }
        self.sun_vectors = sun_vectors;
        Ok(self)
    }

    pub fn config(&self) -> &ShadeBenefitConfig {
        &self.config
    }

    pub fn index(&self) -> &ShadeIndex {
        &self.index
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn sun_vectors(&self) -> &[SunVector] {
        &self.sun_vectors
    }

    /// Scores every shade face against the simulated loads.
    pub fn run(&self, series: &SimulationSeries) -> Result<ShadeBenefitResult> {
        let started = Instant::now();

        // Join every group to its series before casting any rays
        let correlator =
            LoadCorrelator::new(series, self.timestamps.len(), self.config.lag_steps())?;
        let loads = self
            .index
            .groups
            .iter()
            .map(|g| correlator.group_loads(&g.load_key, &g.aperture_ids))
            .collect::<Result<Vec<GroupLoads>>>()?;

        let workers = self.config.effective_workers();
        tracing::info!(
            workers,
            lag_steps = correlator.lag_steps(),
            rays = self.index.sample_point_count() * self.sun_vectors.len(),
            "Casting sun rays"
        );

        let mut result = ShadeBenefitResult::new();
        result.sun_vectors = self.sun_vectors.clone();
        result.skipped_polygons = self.index.skipped_polygons;

        for (group, loads) in self.index.groups.iter().zip(&loads) {
            let source = PolygonScene::new(
                group
                    .source_mesh
                    .faces()
                    .iter()
                    .map(|f| f.polygon.clone())
                    .collect(),
            );
            let engine = RayIntersector::new(&source, self.context.as_ref(), group.normal);
            let blocking = engine
                .run(&group.sample_points, &self.sun_vectors, workers)
                .with_context(|| format!("Ray casting failed for room '{}'", group.room_id))?;
            let scores = score_faces(
                &group.source_mesh,
                &blocking,
                loads,
                group.sample_points.len(),
            )?;

            tracing::debug!(
                room = %group.room_id,
                blocked = blocking.blocked_count(),
                context_occluded = blocking.context_occluded.len(),
                behind = blocking.behind,
                unblocked = blocking.unblocked,
                "Scored aperture group"
            );

            result.blocked_rays += blocking.blocked_count();
            result.context_occluded_rays += blocking.context_occluded.len();
            result.behind_rays += blocking.behind;
            result.sample_points.extend_from_slice(&group.sample_points);
            result.push_group(
                group.room_id.clone(),
                group.aperture_ids.clone(),
                group.source_mesh.faces(),
                &scores,
            );
        }

        tracing::info!(
            faces = result.face_count(),
            blocked_rays = result.blocked_rays,
            context_occluded_rays = result.context_occluded_rays,
            total_net = result.total_net(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Shade benefit analysis complete"
        );
        Ok(result)
    }
}
