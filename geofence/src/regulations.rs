//! Swaps the speed limits on a geofence's affected elements, and later puts the old ones back.
//!
//! One regulatory element may govern several elements at once, so everything that will be
//! replaced is recorded before anything is removed. Removing a regulatory element detaches it from
//! every element in the map, not just the affected ones.
//!
//! Active geofences stack per element. Whatever a geofence captured when it applied is what sat
//! directly below it. When a geofence that isn't on top of an element reverts, the one directly
//! above inherits its captured limits, so they come back when that one reverts.

use std::collections::BTreeSet;

use map_model::{ElementID, Map, RegulatoryElement, RegulatoryElementID};

use crate::{Geofence, GeofenceError};

/// Removes the speed limits from every affected element, recording what was there, then attaches
/// the geofence's regulation if it has one. Elements missing from the map are skipped and
/// reported; the rest are still updated. Applying an already-applied geofence does nothing.
pub fn apply_regulation(map: &mut Map, geofence: &mut Geofence) -> Vec<GeofenceError> {
    if geofence.applied {
        warn!("Geofence {} is already applied; not applying again", geofence.id);
        return Vec::new();
    }
    let mut errors = Vec::new();

    let mut prior = Vec::new();
    for el in &geofence.affected_parts {
        match map.regulatory_elements_of(*el) {
            Some(ids) => {
                for id in ids {
                    if let Some(regem) = map.maybe_get_regem(*id) {
                        if regem.is_speed_limit() {
                            prior.push((*el, regem.clone()));
                        }
                    }
                }
            }
            None => {
                error!("Applying geofence {}: {} isn't in the map", geofence.id, el);
                errors.push(GeofenceError::InconsistentMap(*el));
            }
        }
    }

    for (_, regem) in &prior {
        map.remove_regulatory_element(regem.id);
    }

    match geofence.regulation {
        Some(ref intent) => {
            let regem = intent.regulatory_element();
            for el in &geofence.affected_parts {
                if !map.element_exists(*el) {
                    continue;
                }
                if let Err(err) = map.attach_regulatory_element(*el, regem.clone()) {
                    error!("Applying geofence {}: {}", geofence.id, err);
                }
            }
        }
        None => {
            info!(
                "Geofence {} has no speed limit of its own; affected elements have none for now",
                geofence.id
            );
        }
    }

    debug!(
        "Geofence {} replaced {} speed limits on {} elements",
        geofence.id,
        prior.len(),
        geofence.affected_parts.len()
    );
    geofence.prior_regulations.extend(prior);
    geofence.applied = true;
    errors
}

/// Undoes `apply_regulation`. `applied_later` lists the other active geofences that were applied
/// after this one, oldest first.
///
/// On each affected element where this geofence is on top, the current speed limits are removed
/// and the captured ones reattached. Where a later geofence also covers the element, the map is
/// left alone and that geofence inherits this one's captured limits instead. Elements missing from
/// the map are skipped and reported once each. Reverting a geofence that isn't applied does
/// nothing.
pub fn revert_regulation(
    map: &mut Map,
    geofence: &mut Geofence,
    applied_later: &mut [&mut Geofence],
) -> Vec<GeofenceError> {
    if !geofence.applied {
        warn!("Geofence {} isn't applied; nothing to revert", geofence.id);
        return Vec::new();
    }
    let mut errors = Vec::new();
    let mut missing: BTreeSet<ElementID> = BTreeSet::new();

    let mut on_top = Vec::new();
    for el in &geofence.affected_parts {
        let captured = captured_for(geofence, *el);
        match applied_later
            .iter_mut()
            .find(|g| g.applied && g.affected_parts.contains(el))
        {
            Some(above) => {
                debug!(
                    "Geofence {} hands {} speed limits on {} to geofence {}",
                    geofence.id,
                    captured.len(),
                    el,
                    above.id
                );
                above.prior_regulations.retain(|(x, _)| x != el);
                above
                    .prior_regulations
                    .extend(captured.into_iter().map(|regem| (*el, regem)));
            }
            None => on_top.push((*el, captured)),
        }
    }

    let mut current: BTreeSet<RegulatoryElementID> = BTreeSet::new();
    for (el, _) in &on_top {
        match map.regulatory_elements_of(*el) {
            Some(ids) => {
                for id in ids {
                    if map
                        .maybe_get_regem(*id)
                        .map(|regem| regem.is_speed_limit())
                        .unwrap_or(false)
                    {
                        current.insert(*id);
                    }
                }
            }
            None => {
                if missing.insert(*el) {
                    error!("Reverting geofence {}: {} isn't in the map", geofence.id, el);
                    errors.push(GeofenceError::InconsistentMap(*el));
                }
            }
        }
    }
    for id in current {
        map.remove_regulatory_element(id);
    }

    for (el, captured) in on_top {
        if !map.element_exists(el) {
            continue;
        }
        for regem in captured {
            if let Err(err) = map.attach_regulatory_element(el, regem) {
                error!("Reverting geofence {}: {}", geofence.id, err);
            }
        }
    }

    geofence.prior_regulations.clear();
    geofence.applied = false;
    errors
}

fn captured_for(geofence: &Geofence, el: ElementID) -> Vec<RegulatoryElement> {
    geofence
        .prior_regulations
        .iter()
        .filter(|(x, regem)| *x == el && regem.is_speed_limit())
        .map(|(_, regem)| regem.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use abstutil::Timer;
    use geom::{Distance, Duration, Pt2D, Speed, Time};
    use map_model::{Lanelet, LaneletID, LaneletType, MapConfig, Regulation, RegulatoryElement};

    use super::*;
    use crate::{GeofenceId, GeofenceSchedule, RegulationIntent};

    fn l(id: usize) -> ElementID {
        ElementID::Lanelet(LaneletID(id))
    }

    fn map_with_limits(limits: Vec<(usize, f64)>) -> Map {
        let mut lanelets = Vec::new();
        for id in 1..=3 {
            let y = 10.0 * id as f64;
            lanelets.push(
                Lanelet::straight(
                    LaneletID(id),
                    Pt2D::new(0.0, y),
                    Pt2D::new(10.0, y),
                    Distance::meters(4.0),
                    LaneletType::Road,
                )
                .unwrap(),
            );
        }
        let mut map = Map::create(
            "regulations".to_string(),
            lanelets,
            Vec::new(),
            Vec::new(),
            MapConfig::default(),
            &mut Timer::throwaway(),
        )
        .unwrap();
        for (id, mph) in limits {
            let regem = RegulatoryElement {
                id: map.new_regulatory_element_id(),
                regulation: Regulation::MaxSpeed(Speed::miles_per_hour(mph)),
            };
            map.attach_regulatory_element(l(id), regem).unwrap();
        }
        map
    }

    fn geofence(map: &mut Map, mph: f64, affected: Vec<ElementID>) -> Geofence {
        let schedule = GeofenceSchedule::new(
            Time::EPOCH,
            Time::EPOCH + Duration::DAY,
            Duration::ZERO,
            Duration::DAY,
            Duration::DAY,
            Duration::ZERO,
        );
        let regem = RegulatoryElement {
            id: map.new_regulatory_element_id(),
            regulation: Regulation::MaxSpeed(Speed::miles_per_hour(mph)),
        };
        let mut g = Geofence::new(
            GeofenceId([1; 16]),
            schedule,
            Some(RegulationIntent::MaxSpeedLimit(regem)),
        );
        g.affected_parts = affected;
        g
    }

    fn speed_limits(map: &Map, el: ElementID) -> Vec<Regulation> {
        map.regulatory_elements_of(el)
            .unwrap()
            .iter()
            .map(|id| map.get_regem(*id).regulation.clone())
            .filter(|r| r.is_speed_limit())
            .collect()
    }

    #[test]
    fn apply_without_prior_limit() {
        let mut map = map_with_limits(Vec::new());
        let mut g = geofence(&mut map, 45.0, vec![l(1)]);

        assert!(apply_regulation(&mut map, &mut g).is_empty());
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(45.0))]
        );
        assert!(g.prior_regulations.is_empty());
        assert!(g.applied);

        assert!(revert_regulation(&mut map, &mut g, &mut []).is_empty());
        assert!(speed_limits(&map, l(1)).is_empty());
        assert!(!g.applied);
    }

    #[test]
    fn apply_over_existing_limit() {
        let mut map = map_with_limits(vec![(1, 35.0)]);
        let before = map.regulatory_elements_of(l(1)).unwrap().to_vec();
        let mut g = geofence(&mut map, 45.0, vec![l(1)]);

        apply_regulation(&mut map, &mut g);
        assert_eq!(g.prior_regulations.len(), 1);
        assert_eq!(
            g.prior_regulations[0].1.regulation,
            Regulation::MaxSpeed(Speed::miles_per_hour(35.0))
        );
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(45.0))]
        );

        revert_regulation(&mut map, &mut g, &mut []);
        assert_eq!(map.regulatory_elements_of(l(1)).unwrap(), &before[..]);
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(35.0))]
        );
        assert!(g.prior_regulations.is_empty());
    }

    #[test]
    fn shared_prior_limit() {
        // Lanelets 1 and 2 share one speed limit
        let mut map = map_with_limits(Vec::new());
        let shared = RegulatoryElement {
            id: map.new_regulatory_element_id(),
            regulation: Regulation::MaxSpeed(Speed::miles_per_hour(30.0)),
        };
        map.attach_regulatory_element(l(1), shared.clone()).unwrap();
        map.attach_regulatory_element(l(2), shared.clone()).unwrap();
        map.attach_regulatory_element(l(3), shared.clone()).unwrap();

        let mut g = geofence(&mut map, 50.0, vec![l(1), l(2)]);
        apply_regulation(&mut map, &mut g);
        assert_eq!(
            g.prior_regulations,
            vec![(l(1), shared.clone()), (l(2), shared.clone())]
        );
        // Removing the shared element detaches it from lanelet 3 too
        assert!(speed_limits(&map, l(3)).is_empty());

        revert_regulation(&mut map, &mut g, &mut []);
        for el in [l(1), l(2)] {
            assert_eq!(map.regulatory_elements_of(el).unwrap(), &[shared.id][..]);
        }
        assert_eq!(map.get_regem(shared.id), &shared);
    }

    #[test]
    fn idempotent_apply_and_revert() {
        let mut map = map_with_limits(vec![(1, 35.0)]);
        let mut g = geofence(&mut map, 45.0, vec![l(1)]);

        assert!(revert_regulation(&mut map, &mut g, &mut []).is_empty());
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(35.0))]
        );

        apply_regulation(&mut map, &mut g);
        apply_regulation(&mut map, &mut g);
        assert_eq!(g.prior_regulations.len(), 1);

        revert_regulation(&mut map, &mut g, &mut []);
        revert_regulation(&mut map, &mut g, &mut []);
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(35.0))]
        );
    }

    #[test]
    fn missing_elements_are_skipped() {
        let mut map = map_with_limits(vec![(1, 35.0)]);
        let mut g = geofence(&mut map, 45.0, vec![l(9), l(1)]);

        let errors = apply_regulation(&mut map, &mut g);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], GeofenceError::InconsistentMap(el) if el == l(9)));
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(45.0))]
        );

        let errors = revert_regulation(&mut map, &mut g, &mut []);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(35.0))]
        );
    }

    #[test]
    fn no_regulation_strips_then_restores() {
        let mut map = map_with_limits(vec![(1, 35.0)]);
        let mut g = geofence(&mut map, 45.0, vec![l(1)]);
        g.regulation = None;
        assert!(apply_regulation(&mut map, &mut g).is_empty());
        assert!(g.applied);
        assert!(speed_limits(&map, l(1)).is_empty());

        assert!(revert_regulation(&mut map, &mut g, &mut []).is_empty());
        assert!(!g.applied);
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(35.0))]
        );
    }

    #[test]
    fn nested_geofences() {
        let mut map = map_with_limits(vec![(1, 35.0)]);
        let mut outer = geofence(&mut map, 45.0, vec![l(1)]);
        let mut inner = geofence(&mut map, 20.0, vec![l(1)]);

        apply_regulation(&mut map, &mut outer);
        apply_regulation(&mut map, &mut inner);
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(20.0))]
        );
        revert_regulation(&mut map, &mut inner, &mut []);
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(45.0))]
        );
        revert_regulation(&mut map, &mut outer, &mut []);
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(35.0))]
        );
    }

    #[test]
    fn earlier_geofence_expires_first() {
        let mut map = map_with_limits(vec![(1, 35.0)]);
        let mut first = geofence(&mut map, 45.0, vec![l(1), l(2)]);
        let mut second = geofence(&mut map, 20.0, vec![l(1)]);

        apply_regulation(&mut map, &mut first);
        apply_regulation(&mut map, &mut second);

        // The second geofence stays in force on lanelet 1, but lanelet 2 is only covered by the
        // first
        assert!(revert_regulation(&mut map, &mut first, &mut [&mut second]).is_empty());
        assert!(!first.applied);
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(20.0))]
        );
        assert!(speed_limits(&map, l(2)).is_empty());
        assert_eq!(
            second.prior_regulations,
            vec![(
                l(1),
                RegulatoryElement {
                    id: RegulatoryElementID(0),
                    regulation: Regulation::MaxSpeed(Speed::miles_per_hour(35.0)),
                }
            )]
        );

        revert_regulation(&mut map, &mut second, &mut []);
        assert_eq!(
            speed_limits(&map, l(1)),
            vec![Regulation::MaxSpeed(Speed::miles_per_hour(35.0))]
        );
        assert!(speed_limits(&map, l(2)).is_empty());
        assert!(map
            .all_regulatory_elements()
            .all(|regem| regem.id == RegulatoryElementID(0)));
    }
}
