//! Sun ray casting from glazing sample points toward the shades.
//!
//! Work is split by sample point across a dedicated rayon pool. Each point
//! yields its own trace and the traces are merged in point order, so the
//! blocking map is identical for any worker count.

use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::Result;
use rayon::prelude::*;

use super::error::ShadeError;
use super::solar::SunVector;
use crate::geom::ray::Ray;
use crate::sim::engine::PolygonScene;
use crate::{Point, Vector};

/// Which source faces block which rays, plus counts of rays that were not scored.
#[derive(Debug, Clone, Default)]
pub struct BlockingMap {
    /// For each source face, the `(sample point index, timestep index)` pairs
    /// it was the nearest blocker for, ordered by point then timestep.
    pub face_hits: Vec<Vec<(usize, usize)>>,
    /// Rays blocked by context geometry, as `(sample point index, timestep index)`.
    pub context_occluded: Vec<(usize, usize)>,
    /// Rays skipped because the sun was behind the glazing.
    pub behind: usize,
    /// Rays that reached the sky unblocked.
    pub unblocked: usize,
}

impl BlockingMap {
    pub fn blocked_count(&self) -> usize {
        self.face_hits.iter().map(|h| h.len()).sum()
    }
}

/// Per-point result, merged into a [`BlockingMap`].
#[derive(Debug, Default)]
struct PointTrace {
    hits: Vec<(usize, usize)>,
    occluded: Vec<usize>,
    behind: usize,
    unblocked: usize,
}

pub struct RayIntersector<'a> {
    source: &'a PolygonScene,
    context: Option<&'a PolygonScene>,
    /// Outward normal of the glazing the rays leave from.
    normal: Vector,
}

impl<'a> RayIntersector<'a> {
    pub fn new(source: &'a PolygonScene, context: Option<&'a PolygonScene>, normal: Vector) -> Self {
        Self {
            source,
            context,
            normal,
        }
    }

    /// Casts one ray per sample point and sun vector using `workers` threads.
    ///
    /// A panic in any worker aborts the whole run with [`ShadeError::WorkerFailure`].
    pub fn run(&self, points: &[Point], suns: &[SunVector], workers: usize) -> Result<BlockingMap> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
            .map_err(|e| ShadeError::WorkerFailure(format!("failed to build thread pool: {e}")))?;

        let traces: Vec<PointTrace> = catch_unwind(AssertUnwindSafe(|| {
            pool.install(|| {
                points
                    .par_iter()
                    .map(|&origin| self.trace_point(origin, suns))
                    .collect()
            })
        }))
        .map_err(|payload| ShadeError::WorkerFailure(panic_message(payload.as_ref())))?;

        Ok(self.merge(traces))
    }

    /// Same as [`run`](Self::run) on the calling thread.
    pub fn run_serial(&self, points: &[Point], suns: &[SunVector]) -> BlockingMap {
        let traces = points
            .iter()
            .map(|&origin| self.trace_point(origin, suns))
            .collect();
        self.merge(traces)
    }

    fn trace_point(&self, origin: Point, suns: &[SunVector]) -> PointTrace {
        let mut trace = PointTrace::default();
        for sun in suns {
            if self.normal.dot(&sun.to_sun) <= 0.0 {
                trace.behind += 1;
                continue;
            }
            let Some(ray) = Ray::new(origin, sun.to_sun) else {
                trace.behind += 1;
                continue;
            };
            if self.context.is_some_and(|ctx| ctx.is_occluded(&ray)) {
                trace.occluded.push(sun.step);
                continue;
            }
            match self.source.find_target_surface(&ray) {
                Some((face, _)) => trace.hits.push((face, sun.step)),
                None => trace.unblocked += 1,
            }
        }
        trace
    }

    fn merge(&self, traces: Vec<PointTrace>) -> BlockingMap {
        let mut map = BlockingMap {
            face_hits: vec![Vec::new(); self.source.len()],
            ..Default::default()
        };
        for (point, trace) in traces.into_iter().enumerate() {
            for (face, step) in trace.hits {
                map.face_hits[face].push((point, step));
            }
            map.context_occluded
                .extend(trace.occluded.into_iter().map(|step| (point, step)));
            map.behind += trace.behind;
            map.unblocked += trace.unblocked;
        }
        map
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
