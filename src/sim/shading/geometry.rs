//! Indexing of shaded apertures into source and sample meshes.
//!
//! Within a room, shaded exterior apertures facing the same way are analyzed
//! together as one group. Each group has a source mesh (its shades, scored)
//! and a sample mesh (its glazing, whose face centroids are the ray origins).

use anyhow::Result;

use super::error::ShadeError;
use crate::geom::room::{Room, Shade};
use crate::sim::engine::PolygonScene;
use crate::{Identifier, Mesh, Point, Polygon, Vector};

/// Sample meshes are this many times finer than the source mesh.
pub const SAMPLE_REFINEMENT: f64 = 1.75;

/// Apertures whose normals agree above this dot product share a group.
const NORMAL_MATCH: f64 = 0.999;

/// Shaded apertures of one room that face the same direction.
#[derive(Debug, Clone)]
pub struct ShadedGroup {
    pub room_id: Identifier,
    /// Key of the room's cooling and heating series.
    pub load_key: Identifier,
    /// Apertures of the group; sample mesh face parents index into this.
    pub aperture_ids: Vec<Identifier>,
    /// Shades of the group; source mesh face parents index into this.
    pub shade_ids: Vec<Identifier>,
    /// Outward unit normal shared by the group's apertures.
    pub normal: Vector,
    pub source_mesh: Mesh,
    pub sample_mesh: Mesh,
    /// Ray origins, one per sample mesh face.
    pub sample_points: Vec<Point>,
}

/// Groups under construction for one room.
struct PendingGroup {
    normal: Vector,
    apertures: Vec<(Identifier, Polygon)>,
    shades: Vec<(Identifier, Polygon)>,
}

/// All shaded groups of a model.
#[derive(Debug, Clone, Default)]
pub struct ShadeIndex {
    pub groups: Vec<ShadedGroup>,
    /// Degenerate polygons left out of the analysis.
    pub skipped_polygons: usize,
}

impl ShadeIndex {
    /// Discretizes the shades and glazing of every shaded exterior aperture.
    ///
    /// Rooms are only read. Degenerate polygons are logged, counted and skipped.
    pub fn build(rooms: &[Room], grid_size: f64, sample_offset: f64) -> Result<Self> {
        let shaded: usize = rooms.iter().map(|r| r.shaded_apertures().count()).sum();
        if shaded == 0 {
            return Err(ShadeError::Configuration(
                "no exterior apertures with shades found in the input rooms".to_string(),
            )
            .into());
        }
        if !grid_size.is_finite() || grid_size <= 0.0 {
            return Err(ShadeError::Configuration(format!(
                "grid size must be positive, got {grid_size}"
            ))
            .into());
        }

        let mut index = Self::default();
        for room in rooms {
            let mut pending: Vec<PendingGroup> = Vec::new();
            for aperture in room.shaded_apertures() {
                let glazing = match Polygon::new(
                    aperture.identifier.as_str(),
                    aperture.vertices.clone(),
                    None,
                ) {
                    Ok(p) => p,
                    Err(e) => {
                        index.skip("aperture", aperture.identifier.as_str(), &e);
                        continue;
                    }
                };

                let mut shades = Vec::with_capacity(aperture.shades.len());
                for shade in &aperture.shades {
                    match Polygon::new(shade.identifier.as_str(), shade.vertices.clone(), None) {
                        Ok(p) => shades.push((shade.identifier.clone(), p)),
                        Err(e) => index.skip("shade", shade.identifier.as_str(), &e),
                    }
                }
                if shades.is_empty() {
                    tracing::debug!(
                        aperture = %aperture.identifier,
                        "No valid shades left, aperture not analyzed"
                    );
                    continue;
                }

                let normal = glazing.vn;
                let entry = (aperture.identifier.clone(), glazing);
                match pending
                    .iter_mut()
                    .find(|g| g.normal.dot(&normal) > NORMAL_MATCH)
                {
                    Some(group) => {
                        group.apertures.push(entry);
                        group.shades.extend(shades);
                    }
                    None => pending.push(PendingGroup {
                        normal,
                        apertures: vec![entry],
                        shades,
                    }),
                }
            }

            for group in pending {
                if let Some(group) = index.mesh_group(room, group, grid_size, sample_offset) {
                    index.groups.push(group);
                }
            }
        }

        if index.groups.is_empty() {
            return Err(ShadeError::Configuration(format!(
                "all {shaded} shaded apertures have degenerate geometry"
            ))
            .into());
        }
        Ok(index)
    }

    fn mesh_group(
        &mut self,
        room: &Room,
        group: PendingGroup,
        grid_size: f64,
        sample_offset: f64,
    ) -> Option<ShadedGroup> {
        let mut source_mesh = Mesh::default();
        for (parent, (_, polygon)) in group.shades.iter().enumerate() {
            if let Err(e) = source_mesh.add_polygon(polygon, parent, grid_size) {
                self.skip("shade", &polygon.name, &e);
            }
        }
        let mut sample_mesh = Mesh::default();
        let sample_grid = grid_size / SAMPLE_REFINEMENT;
        for (parent, (_, polygon)) in group.apertures.iter().enumerate() {
            if let Err(e) = sample_mesh.add_polygon(polygon, parent, sample_grid) {
                self.skip("aperture", &polygon.name, &e);
            }
        }
        if source_mesh.is_empty() || sample_mesh.is_empty() {
            tracing::debug!(room = %room.identifier, "Group has no faces after discretization");
            return None;
        }

        let sample_points = sample_mesh
            .faces()
            .iter()
            .map(|f| f.centroid() + f.normal() * sample_offset)
            .collect();

        tracing::debug!(
            room = %room.identifier,
            apertures = group.apertures.len(),
            shades = group.shades.len(),
            source_faces = source_mesh.len(),
            sample_points = sample_mesh.len(),
            "Indexed shaded aperture group"
        );

        Some(ShadedGroup {
            room_id: room.identifier.clone(),
            load_key: room.load_key(),
            aperture_ids: group.apertures.into_iter().map(|(id, _)| id).collect(),
            shade_ids: group.shades.into_iter().map(|(id, _)| id).collect(),
            normal: group.normal,
            source_mesh,
            sample_mesh,
            sample_points,
        })
    }

    /// Builds the occlusion scene from context geometry; `None` if nothing valid remains.
    pub fn context_scene(&mut self, context: &[Shade]) -> Option<PolygonScene> {
        let mut polygons = Vec::with_capacity(context.len());
        for shade in context {
            match Polygon::new(shade.identifier.as_str(), shade.vertices.clone(), None) {
                Ok(p) => polygons.push(p),
                Err(e) => self.skip("context", shade.identifier.as_str(), &e),
            }
        }
        (!polygons.is_empty()).then(|| PolygonScene::new(polygons))
    }

    fn skip(&mut self, kind: &str, name: &str, err: &anyhow::Error) {
        self.skipped_polygons += 1;
        let err = ShadeError::GeometryDegenerate(format!("{kind} '{name}': {err:#}"));
        tracing::warn!(error = %err, "Skipping polygon");
    }

    pub fn face_count(&self) -> usize {
        self.groups.iter().map(|g| g.source_mesh.len()).sum()
    }

    pub fn sample_point_count(&self) -> usize {
        self.groups.iter().map(|g| g.sample_points.len()).sum()
    }
}
