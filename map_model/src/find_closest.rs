use rstar::{PointDistance, RTree, RTreeObject, AABB};

use geom::Pt2D;

use crate::{Lanelet, LaneletID};

/// Indexes lanelets by their bounding boxes. Candidates come back ordered by distance from the
/// query point to the bounding box, which never exceeds the distance to the lanelet itself.
#[derive(Clone, Default)]
pub struct LaneletIndex {
    tree: RTree<IndexedLanelet>,
}

#[derive(Clone)]
struct IndexedLanelet {
    id: LaneletID,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedLanelet {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for IndexedLanelet {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope.distance_2(point)
    }
}

impl LaneletIndex {
    pub fn new<'a, I: IntoIterator<Item = &'a Lanelet>>(lanelets: I) -> LaneletIndex {
        let entries = lanelets
            .into_iter()
            .map(|l| {
                let (min, max) = l.polygon().get_bounds().corners();
                IndexedLanelet {
                    id: l.id,
                    envelope: AABB::from_corners(min, max),
                }
            })
            .collect();
        LaneletIndex {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Lanelets in increasing order of bounding-box distance from the point.
    pub fn nearest(&self, pt: Pt2D) -> impl Iterator<Item = LaneletID> + '_ {
        self.tree
            .nearest_neighbor_iter(&[pt.x(), pt.y()])
            .map(|entry| entry.id)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
