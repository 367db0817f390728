pub mod bvh;

use crate::geom::bboxes::BoundingBox;
use crate::geom::ray::Ray;
use crate::{Point, Polygon};

use self::bvh::Bvh;

/// Flattened polygon set with a spatial index for ray queries.
#[derive(Debug, Clone, Default)]
pub struct PolygonScene {
    /// All polygons in the scene, in insertion order.
    pub polygons: Vec<Polygon>,
    bvh: Bvh,
    bbox: Option<BoundingBox>,
}

impl PolygonScene {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        let bvh = Bvh::build(&polygons);
        let all_pts: Vec<Point> = polygons
            .iter()
            .flat_map(|p| p.vertices().iter().copied())
            .collect();
        let bbox = BoundingBox::from_points(&all_pts);
        Self {
            polygons,
            bvh,
            bbox,
        }
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Scene bounding box, `None` for an empty scene.
    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    /// Finds the closest polygon in the ray's direction.
    ///
    /// Returns (polygon_index, distance) or None if nothing is hit.
    pub fn find_target_surface(&self, ray: &Ray) -> Option<(usize, f64)> {
        self.bvh.closest_hit(ray, &self.polygons)
    }

    /// Checks whether anything in the scene blocks the ray.
    pub fn is_occluded(&self, ray: &Ray) -> bool {
        self.bvh.any_hit(ray, &self.polygons)
    }
}
