//! Bounding volume hierarchy over polygons.

use crate::Polygon;
use crate::geom::bboxes::BoundingBox;
use crate::geom::ray::Ray;

/// Maximum number of polygons stored in a leaf.
const LEAF_SIZE: usize = 4;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bbox: BoundingBox,
        start: usize,
        count: usize,
    },
    Inner {
        bbox: BoundingBox,
        left: usize,
        right: usize,
    },
}

impl Node {
    fn bbox(&self) -> &BoundingBox {
        match self {
            Node::Leaf { bbox, .. } | Node::Inner { bbox, .. } => bbox,
        }
    }
}

/// Binary BVH with median splits on the longest axis.
///
/// Stores polygon indices only; queries take the polygon slice the tree was built from.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
    order: Vec<usize>,
}

impl Bvh {
    pub fn build(polygons: &[Polygon]) -> Self {
        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * polygons.len() / LEAF_SIZE + 1),
            order: (0..polygons.len()).collect(),
        };
        if polygons.is_empty() {
            return bvh;
        }
        let boxes: Vec<BoundingBox> = polygons.iter().map(|p| *p.bbox()).collect();
        bvh.build_node(&boxes, 0, polygons.len());
        bvh
    }

    /// Builds the subtree over `order[start..end]` and returns its node index.
    fn build_node(&mut self, boxes: &[BoundingBox], start: usize, end: usize) -> usize {
        let bbox = self.order[start..end]
            .iter()
            .map(|&i| boxes[i])
            .reduce(|a, b| a.union(&b))
            .unwrap_or(boxes[self.order[start]]);

        let node_idx = self.nodes.len();
        let count = end - start;
        if count <= LEAF_SIZE {
            self.nodes.push(Node::Leaf { bbox, start, count });
            return node_idx;
        }

        // Split on the longest axis of the centroid spread
        let centers: Vec<_> = self.order[start..end]
            .iter()
            .map(|&i| boxes[i].center())
            .collect();
        let axis = BoundingBox::from_points(&centers)
            .map(|b| b.longest_axis())
            .unwrap_or(0);
        let key = |i: &usize| {
            let c = boxes[*i].center();
            match axis {
                0 => c.x,
                1 => c.y,
                _ => c.z,
            }
        };
        let mid = count / 2;
        self.order[start..end].select_nth_unstable_by(mid, |a, b| {
            key(a).total_cmp(&key(b)).then(a.cmp(b))
        });

        // Placeholder, patched once the children exist
        self.nodes.push(Node::Leaf { bbox, start, count });
        let left = self.build_node(boxes, start, start + mid);
        let right = self.build_node(boxes, start + mid, end);
        self.nodes[node_idx] = Node::Inner { bbox, left, right };
        node_idx
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nearest polygon hit by the ray as `(polygon_index, distance)`.
    ///
    /// Ties are broken toward the lower polygon index so results do not
    /// depend on traversal order.
    pub fn closest_hit(&self, ray: &Ray, polygons: &[Polygon]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        self.traverse(ray, |idx, t_limit| {
            if let Some((t, _)) = ray.intersect_polygon(&polygons[idx]) {
                let better = match best {
                    None => true,
                    Some((best_idx, best_t)) => t < best_t || (t == best_t && idx < best_idx),
                };
                if better && t <= t_limit {
                    best = Some((idx, t));
                }
            }
            let limit = best.map_or(f64::INFINITY, |(_, t)| t);
            (false, limit)
        });
        best
    }

    /// True if the ray hits any polygon.
    pub fn any_hit(&self, ray: &Ray, polygons: &[Polygon]) -> bool {
        let mut hit = false;
        self.traverse(ray, |idx, _| {
            hit = ray.intersect_polygon(&polygons[idx]).is_some();
            (hit, f64::INFINITY)
        });
        hit
    }

    /// Walks nodes whose boxes the ray enters before the current limit.
    ///
    /// `visit` receives a polygon index and the current limit and returns
    /// `(stop, new_limit)`.
    fn traverse<F>(&self, ray: &Ray, mut visit: F)
    where
        F: FnMut(usize, f64) -> (bool, f64),
    {
        if self.nodes.is_empty() {
            return;
        }
        let mut limit = f64::INFINITY;
        let mut stack = vec![0usize];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            // Boxes of planar faces are flat; a small pad keeps grazing rays in
            if node.bbox().inflate(1e-9).ray_entry(ray, limit).is_none() {
                continue;
            }
            match node {
                Node::Leaf { start, count, .. } => {
                    for &idx in &self.order[*start..*start + *count] {
                        let (stop, new_limit) = visit(idx, limit);
                        if stop {
                            return;
                        }
                        limit = new_limit;
                    }
                }
                Node::Inner { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, Vector};
    use anyhow::Result;

    /// Row of unit squares in the plane z = `z`, along +x.
    fn tiles(n: usize, z: f64) -> Result<Vec<Polygon>> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                Polygon::new(
                    &format!("tile_{i}"),
                    vec![
                        Point::new(x, 0., z),
                        Point::new(x + 1., 0., z),
                        Point::new(x + 1., 1., z),
                        Point::new(x, 1., z),
                    ],
                    None,
                )
            })
            .collect()
    }

    #[test]
    fn test_matches_brute_force() -> Result<()> {
        let mut polys = tiles(37, 2.0)?;
        polys.extend(tiles(37, 5.0)?);
        let bvh = Bvh::build(&polys);
        let refs: Vec<&Polygon> = polys.iter().collect();

        for k in 0..50 {
            let x = 0.37 + k as f64 * 0.731;
            let dir = Vector::new(0.1 * ((k % 7) as f64 - 3.), 0.05, 1.0);
            let ray = Ray::new(Point::new(x, 0.5, 0.), dir).unwrap();
            let expected = ray.intersect_polygons(&refs).map(|(t, _, idx)| (idx, t));
            let got = bvh.closest_hit(&ray, &polys);
            match (expected, got) {
                (None, None) => {}
                (Some((ei, et)), Some((gi, gt))) => {
                    assert!((et - gt).abs() < 1e-9);
                    assert_eq!(polys[ei].bbox().min.z, polys[gi].bbox().min.z);
                }
                other => panic!("mismatch for ray {k}: {other:?}"),
            }
            assert_eq!(bvh.any_hit(&ray, &polys), expected.is_some());
        }
        Ok(())
    }

    #[test]
    fn test_nearest_layer_wins() -> Result<()> {
        let mut polys = tiles(10, 5.0)?;
        polys.extend(tiles(10, 2.0)?);
        let bvh = Bvh::build(&polys);
        let ray = Ray::new(Point::new(3.5, 0.5, 0.), Vector::new(0., 0., 1.)).unwrap();
        let (idx, t) = bvh.closest_hit(&ray, &polys).unwrap();
        assert_eq!(idx, 13);
        assert!((t - 2.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_empty_tree() {
        let bvh = Bvh::build(&[]);
        assert!(bvh.is_empty());
        let ray = Ray::new(Point::new(0., 0., 0.), Vector::new(0., 0., 1.)).unwrap();
        assert!(bvh.closest_hit(&ray, &[]).is_none());
        assert!(!bvh.any_hit(&ray, &[]));
    }
}
