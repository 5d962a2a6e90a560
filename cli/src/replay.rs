use std::collections::BTreeSet;

use anyhow::Result;

use geofence::{get_affected_parts, Broadcaster, ControlMessage, GeofenceScheduler};
use geom::{LocalProjection, Time};
use map_model::{ElementID, Map};

/// Feeds every geofence to a broadcaster, then moves the clock forward in fixed steps. After each
/// step where something activated or deactivated, prints the speed limits on every element any
/// geofence covers.
pub fn run(
    map_path: String,
    georeference: String,
    geofences_path: String,
    until: f64,
    step: f64,
    config: Option<String>,
) -> Result<()> {
    if !step.is_finite() || step <= 0.0 {
        bail!("--step must be positive, not {}", step);
    }
    let config = crate::load_config(config)?;
    let messages: Vec<ControlMessage> = abstutil::from_json(&fs_err::read(geofences_path)?)?;

    let (scheduler, events) = GeofenceScheduler::new();
    let broadcaster = Broadcaster::new(
        Box::new(|bytes: Vec<u8>| debug!("Base map published ({} bytes)", bytes.len())),
        scheduler.clone(),
        events,
        Box::new(LocalProjection),
        config.clone(),
    );
    broadcaster.base_map_update(&fs_err::read(map_path)?)?;
    broadcaster.georeference_update(georeference.clone());

    let mut watching = BTreeSet::new();
    let mut start = until;
    for msg in &messages {
        let affected = broadcaster
            .with_current_map(|map| {
                get_affected_parts(
                    Some(map),
                    &georeference,
                    &msg.proj,
                    &msg.points,
                    &LocalProjection,
                    &config,
                )
            })
            .ok_or_else(|| anyhow!("the base map didn't load"))??;
        watching.extend(affected);
        let id = broadcaster.geofence_received(msg)?;
        println!("Registered geofence {} ({:?})", id, msg.control_type);
        start = start.min(msg.schedule.start.inner_seconds());
    }

    println!("Before any geofences:");
    print_speed_limits(&broadcaster, &watching);

    let mut now = start.max(0.0);
    loop {
        let events = scheduler.advance(Time::seconds_since_epoch(now));
        if events > 0 {
            broadcaster.process_events();
            println!("At {} ({} transitions):", Time::seconds_since_epoch(now), events);
            print_speed_limits(&broadcaster, &watching);
        }
        if now >= until {
            break;
        }
        now = (now + step).min(until);
    }
    broadcaster.shutdown();
    Ok(())
}

fn print_speed_limits(broadcaster: &Broadcaster, watching: &BTreeSet<ElementID>) {
    broadcaster.with_current_map(|map| {
        for id in watching {
            println!("  {}: {}", id, describe_speed_limits(map, *id));
        }
    });
}

fn describe_speed_limits(map: &Map, id: ElementID) -> String {
    let regems = match map.regulatory_elements_of(id) {
        Some(regems) => regems,
        None => return "missing from the map".to_string(),
    };
    let limits: Vec<String> = regems
        .iter()
        .filter_map(|r| map.maybe_get_regem(*r))
        .filter(|r| r.is_speed_limit())
        .map(|r| r.regulation.describe())
        .collect();
    if limits.is_empty() {
        "no speed limit".to_string()
    } else {
        limits.join(", ")
    }
}
