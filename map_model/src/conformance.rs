//! Normalizes a freshly loaded map before anyone queries or publishes it.

use abstutil::Timer;

use crate::{ElementID, Map, Participant, Regulation, RegulatoryElement};

/// Drops attachments to regulatory elements that the layer doesn't have, collapses duplicate
/// attachments, and if the map's config has a default speed limit, gives every vehicle lanelet
/// without one a shared maximum speed element.
pub fn ensure_compliance(map: &mut Map, timer: &mut Timer) {
    timer.start("ensure map compliance");

    let elements: Vec<ElementID> = map
        .all_lanelets()
        .map(|l| ElementID::Lanelet(l.id))
        .chain(map.all_areas().map(|a| ElementID::Area(a.id)))
        .collect();
    let mut dropped = 0;
    for id in elements {
        let known: Vec<_> = match map.regulatory_elements_of(id) {
            Some(list) => list
                .iter()
                .filter(|r| map.maybe_get_regem(**r).is_some())
                .cloned()
                .collect(),
            None => continue,
        };
        dropped += map.retain_attachments(id, |r| known.contains(r));
    }
    if dropped > 0 {
        timer.warn(format!(
            "Dropped {} dangling or duplicate regulatory element attachments",
            dropped
        ));
    }

    if let Some(speed) = map.get_config().default_speed_limit {
        let missing: Vec<ElementID> = map
            .all_lanelets()
            .filter(|l| l.subtype.allows(Participant::VehicleCar))
            .filter(|l| {
                !l.regulatory_elements.iter().any(|r| {
                    map.maybe_get_regem(*r)
                        .map(|regem| matches!(regem.regulation, Regulation::MaxSpeed(_)))
                        .unwrap_or(false)
                })
            })
            .map(|l| ElementID::Lanelet(l.id))
            .collect();
        if !missing.is_empty() {
            let regem = RegulatoryElement {
                id: map.new_regulatory_element_id(),
                regulation: Regulation::MaxSpeed(speed),
            };
            for id in &missing {
                if let Err(err) = map.attach_regulatory_element(*id, regem.clone()) {
                    timer.warn(format!("Couldn't add default speed limit: {}", err));
                }
            }
            timer.note(format!(
                "Added default speed limit {} to {} lanelets",
                speed,
                missing.len()
            ));
        }
    }

    timer.stop("ensure map compliance");
}
