use std::ops::Range;

use serde::Serialize;

use super::aggregate::FaceScore;
use super::solar::SunVector;
use crate::{Identifier, MeshFace, Point};

/// Per-group totals, with the group's slice of the result face arrays.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub room_id: Identifier,
    pub aperture_ids: Vec<Identifier>,
    /// Indices of the group's faces in [`ShadeBenefitResult::faces`].
    pub face_range: Range<usize>,
    /// Area-weighted sum of face help.
    pub total_help: f64,
    /// Area-weighted sum of face harm.
    pub total_harm: f64,
}

/// Result of a shade benefit analysis.
///
/// `faces`, `help`, `harm` and `net` are parallel arrays over all source
/// mesh faces of all groups, in group order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShadeBenefitResult {
    pub faces: Vec<MeshFace>,
    /// Cooling avoided per unit face area (non-negative).
    pub help: Vec<f64>,
    /// Useful solar heat lost per unit face area (non-positive).
    pub harm: Vec<f64>,
    pub net: Vec<f64>,
    pub sun_vectors: Vec<SunVector>,
    /// Ray origins of all groups, in group order.
    pub sample_points: Vec<Point>,
    pub groups: Vec<GroupSummary>,
    /// Degenerate polygons left out of the analysis.
    pub skipped_polygons: usize,
    /// Rays blocked by context geometry and therefore not scored.
    pub context_occluded_rays: usize,
    /// Rays skipped because the sun was behind the glazing.
    pub behind_rays: usize,
    /// Rays blocked by a shade face.
    pub blocked_rays: usize,
}

impl ShadeBenefitResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the faces and scores of one group.
    pub fn push_group(
        &mut self,
        room_id: Identifier,
        aperture_ids: Vec<Identifier>,
        faces: &[MeshFace],
        scores: &[FaceScore],
    ) {
        let start = self.faces.len();
        let mut total_help = 0.0;
        let mut total_harm = 0.0;
        for (face, score) in faces.iter().zip(scores) {
            total_help += score.help * face.area();
            total_harm += score.harm * face.area();
            self.faces.push(face.clone());
            self.help.push(score.help);
            self.harm.push(score.harm);
            self.net.push(score.net);
        }
        self.groups.push(GroupSummary {
            room_id,
            aperture_ids,
            face_range: start..self.faces.len(),
            total_help,
            total_harm,
        });
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn score(&self, face: usize) -> Option<FaceScore> {
        Some(FaceScore {
            help: *self.help.get(face)?,
            harm: *self.harm.get(face)?,
            net: *self.net.get(face)?,
        })
    }

    /// Area-weighted help over all faces.
    pub fn total_help(&self) -> f64 {
        self.groups.iter().map(|g| g.total_help).sum()
    }

    /// Area-weighted harm over all faces.
    pub fn total_harm(&self) -> f64 {
        self.groups.iter().map(|g| g.total_harm).sum()
    }

    pub fn total_net(&self) -> f64 {
        self.total_help() + self.total_harm()
    }
}
