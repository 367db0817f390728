use anyhow::Result;
use serde::Serialize;

use super::error::ShadeError;
use super::intersect::BlockingMap;
use super::loads::GroupLoads;
use crate::Mesh;

/// Help, harm and net benefit of one source face, per unit area.
///
/// `help` is non-negative and `harm` non-positive; `net = help + harm`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FaceScore {
    pub help: f64,
    pub harm: f64,
    pub net: f64,
}

impl FaceScore {
    fn from_sums(help: f64, harm: f64, area: f64, point_count: usize) -> Self {
        if point_count == 0 || area <= 0.0 {
            return Self::default();
        }
        let help = help / area / point_count as f64;
        let harm = harm / area / point_count as f64;
        Self {
            help,
            harm,
            net: help + harm,
        }
    }
}

/// Scores every face of a group's source mesh.
///
/// For each ray a face blocked at timestep `t`, the face gains
/// `min(cooling, solar)` of help when cooling is positive and loses
/// `min(heating, solar)` when heating is positive. Sums are divided by the
/// face area and by the group's sample point count.
pub fn score_faces(
    mesh: &Mesh,
    blocking: &BlockingMap,
    loads: &GroupLoads,
    point_count: usize,
) -> Result<Vec<FaceScore>> {
    if blocking.face_hits.len() != mesh.len() {
        return Err(ShadeError::DataMismatch(format!(
            "blocking map covers {} faces, mesh has {}",
            blocking.face_hits.len(),
            mesh.len()
        ))
        .into());
    }

    let mut scores = Vec::with_capacity(mesh.len());
    for (face, hits) in mesh.faces().iter().zip(&blocking.face_hits) {
        let mut help = 0.0;
        let mut harm = 0.0;
        for &(_, step) in hits {
            let triple = loads.triple(step).ok_or_else(|| {
                ShadeError::DataMismatch(format!(
                    "timestep {step} is outside the {} step load series",
                    loads.len()
                ))
            })?;
            if triple.cooling > 0.0 {
                help += triple.cooling.min(triple.solar);
            }
            if triple.heating > 0.0 {
                harm -= triple.heating.min(triple.solar);
            }
        }
        scores.push(FaceScore::from_sums(help, harm, face.area(), point_count));
    }
    Ok(scores)
}
