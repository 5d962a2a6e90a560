//! Figures out which lanelets a geofence covers.
//!
//! A geofence is a sequence of points tracing a path along the road, in the direction of travel.
//! Every lanelet containing a point is a candidate. A candidate counts if the path leaves it
//! through its end, or if the path moves towards its end while staying inside it. At the last
//! point there's nowhere further to go, so candidates there only count if they directly follow
//! something already found. That rules out parallel lanes that merely overlap the endpoint.

use std::collections::HashSet;

use geom::{Angle, CoordinateTransform, Distance, Line, Pt2D};
use map_model::{ElementID, LaneletID, Map, RoutingGraph, TrafficRules};

use crate::{BroadcasterConfig, GeofenceError, Point3};

/// Returns the affected lanelets in the order they were found, without duplicates. `georeference`
/// describes the map's frame, and `proj` the frame of `points`.
pub fn get_affected_parts(
    map: Option<&Map>,
    georeference: &str,
    proj: &str,
    points: &[Point3],
    transform: &dyn CoordinateTransform,
    config: &BroadcasterConfig,
) -> Result<Vec<ElementID>, GeofenceError> {
    let map = map.ok_or_else(|| {
        GeofenceError::InvalidState("the base map isn't loaded yet".to_string())
    })?;
    if georeference.is_empty() {
        return Err(GeofenceError::InvalidState(
            "the georeference is empty, so geofence points can't be transformed into the map frame"
                .to_string(),
        ));
    }

    let mut pts = Vec::with_capacity(points.len());
    for pt in points {
        let converted = transform
            .transform(proj, georeference, [pt.x, pt.y, pt.z])
            .map_err(GeofenceError::Transform)?;
        pts.push(converted);
    }

    let mut affected = AffectedSet::default();
    for (idx, pt) in pts.iter().enumerate() {
        let candidates = lanelets_containing(map, *pt, config.max_lane_width);

        if idx + 1 == pts.len() {
            let rules = TrafficRules::for_participant(config.routing_participant);
            for l in filter_successors(map, &rules, &candidates, &affected.found) {
                affected.insert(l);
            }
            break;
        }

        let next = pts[idx + 1];
        let path = Line::new(*pt, next);
        for id in candidates {
            let lanelet = map.get_l(id);
            if lanelet.end_line().intersects(&path) {
                affected.insert(id);
            } else if lanelet.polygon().contains_pt(next) && !affected.contains(id) {
                let to_end = lanelet.end_line().middle().vector_from(*pt);
                let along_path = next.vector_from(*pt);
                if Angle::between_vectors(to_end, along_path)
                    .map(|angle| angle.is_acute())
                    .unwrap_or(false)
                {
                    affected.insert(id);
                }
            }
        }
    }

    debug!(
        "Geofence with {} points affects {:?}",
        pts.len(),
        affected.found
    );
    Ok(affected.found.into_iter().map(ElementID::Lanelet).collect())
}

/// Lanelets strictly containing the point, searching no farther than `max_dist`.
fn lanelets_containing(map: &Map, pt: Pt2D, max_dist: Distance) -> Vec<LaneletID> {
    let mut result = Vec::new();
    map.nearest_lanelets_until(pt, |box_dist, lanelet| {
        if box_dist > max_dist {
            return true;
        }
        if lanelet.polygon().contains_pt(pt) {
            result.push(lanelet.id);
        }
        false
    });
    result
}

/// Keeps the candidates that directly follow one of the roots.
fn filter_successors(
    map: &Map,
    rules: &TrafficRules,
    candidates: &[LaneletID],
    roots: &[LaneletID],
) -> Vec<LaneletID> {
    if candidates.is_empty() || roots.is_empty() {
        return Vec::new();
    }
    let graph = RoutingGraph::build(map, rules);
    let mut result = Vec::new();
    for root in roots {
        for next in graph.following(*root) {
            if candidates.contains(&next) && !result.contains(&next) {
                result.push(next);
            }
        }
    }
    result
}

#[derive(Default)]
struct AffectedSet {
    found: Vec<LaneletID>,
    seen: HashSet<LaneletID>,
}

impl AffectedSet {
    fn insert(&mut self, id: LaneletID) {
        if self.seen.insert(id) {
            self.found.push(id);
        }
    }

    fn contains(&self, id: LaneletID) -> bool {
        self.seen.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use abstutil::Timer;
    use geom::LocalProjection;
    use map_model::{Lanelet, LaneletType, MapConfig};

    use super::*;

    const FRAME: &str = "+proj=tmerc +lat_0=0 +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m";

    fn straight(id: usize, from: (f64, f64), to: (f64, f64)) -> Lanelet {
        Lanelet::straight(
            LaneletID(id),
            Pt2D::new(from.0, from.1),
            Pt2D::new(to.0, to.1),
            Distance::meters(4.0),
            LaneletType::Road,
        )
        .unwrap()
    }

    fn map(lanelets: Vec<Lanelet>) -> Map {
        Map::create(
            "resolver".to_string(),
            lanelets,
            Vec::new(),
            Vec::new(),
            MapConfig::default(),
            &mut Timer::throwaway(),
        )
        .unwrap()
    }

    fn resolve(map: &Map, pts: &[(f64, f64)]) -> Vec<ElementID> {
        let points: Vec<Point3> = pts.iter().map(|(x, y)| Point3::new(*x, *y, 0.0)).collect();
        get_affected_parts(
            Some(map),
            FRAME,
            FRAME,
            &points,
            &LocalProjection,
            &BroadcasterConfig::default(),
        )
        .unwrap()
    }

    fn lanelets(ids: &[usize]) -> Vec<ElementID> {
        ids.iter()
            .map(|id| ElementID::Lanelet(LaneletID(*id)))
            .collect()
    }

    #[test]
    fn aligned_points_inside_one_lanelet() {
        let map = map(vec![straight(1, (0.0, 0.0), (10.0, 0.0))]);
        assert_eq!(resolve(&map, &[(2.0, 0.0), (6.0, 0.0)]), lanelets(&[1]));
        // Tracing the lanelet backwards doesn't count
        assert!(resolve(&map, &[(6.0, 0.0), (2.0, 0.0)]).is_empty());
    }

    #[test]
    fn successor_kept_but_parallel_lanelet_excluded() {
        let map = map(vec![
            straight(1, (0.0, 0.0), (10.0, 0.0)),
            straight(2, (10.0, 0.0), (20.0, 0.0)),
            // Overlaps 2, but isn't connected to 1
            straight(3, (12.0, 1.0), (22.0, 1.0)),
        ]);
        assert_eq!(resolve(&map, &[(5.0, 0.0), (15.0, 0.0)]), lanelets(&[1, 2]));
        assert_eq!(
            resolve(&map, &[(5.0, 0.0), (8.0, 0.0), (15.0, 0.5)]),
            lanelets(&[1, 2])
        );
    }

    #[test]
    fn degenerate_point_counts() {
        let map = map(vec![straight(1, (0.0, 0.0), (10.0, 0.0))]);
        assert!(resolve(&map, &[]).is_empty());
        // A single point has nothing to follow
        assert!(resolve(&map, &[(5.0, 0.0)]).is_empty());
    }

    #[test]
    fn search_cutoff() {
        let map = map(vec![straight(1, (0.0, 0.0), (10.0, 0.0))]);
        let config = BroadcasterConfig {
            max_lane_width: Distance::meters(1.0),
            ..Default::default()
        };
        let mut found = Vec::new();
        map.nearest_lanelets_until(Pt2D::new(5.0, 0.0), |_, l| {
            found.push(l.id);
            false
        });
        assert_eq!(found, vec![LaneletID(1)]);
        assert!(lanelets_containing(&map, Pt2D::new(5.0, 4.0), config.max_lane_width).is_empty());
        assert_eq!(
            lanelets_containing(&map, Pt2D::new(5.0, 1.5), config.max_lane_width),
            vec![LaneletID(1)]
        );
    }

    #[test]
    fn preconditions() {
        let map = map(vec![straight(1, (0.0, 0.0), (10.0, 0.0))]);
        let points = vec![Point3::new(2.0, 0.0, 0.0), Point3::new(6.0, 0.0, 0.0)];
        let config = BroadcasterConfig::default();
        assert!(matches!(
            get_affected_parts(None, FRAME, FRAME, &points, &LocalProjection, &config),
            Err(GeofenceError::InvalidState(_))
        ));
        assert!(matches!(
            get_affected_parts(Some(&map), "", FRAME, &points, &LocalProjection, &config),
            Err(GeofenceError::InvalidState(_))
        ));
        assert!(matches!(
            get_affected_parts(
                Some(&map),
                FRAME,
                "+proj=utm +zone=18",
                &points,
                &LocalProjection,
                &config
            ),
            Err(GeofenceError::Transform(_))
        ));
    }

    #[test]
    fn geodetic_points() {
        // One meter east of the origin is about 9e-6 degrees of longitude at the equator
        let map = map(vec![straight(1, (0.0, 0.0), (10.0, 0.0))]);
        let deg_per_meter = 1.0 / 111_195.0;
        let points = vec![
            Point3::new(2.0 * deg_per_meter, 0.0, 0.0),
            Point3::new(6.0 * deg_per_meter, 0.0, 0.0),
        ];
        let affected = get_affected_parts(
            Some(&map),
            FRAME,
            "EPSG:4326",
            &points,
            &LocalProjection,
            &BroadcasterConfig::default(),
        )
        .unwrap();
        assert_eq!(affected, lanelets(&[1]));
    }
}
