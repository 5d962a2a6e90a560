use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use abstutil::Timer;
use geom::{CoordinateTransform, Distance, Speed};
use map_model::{conformance, Map, Regulation, RegulatoryElement};

use crate::geofence::lock_geofence;
use crate::{
    apply_regulation, get_affected_parts, revert_regulation, BroadcasterConfig, ControlMessage,
    ControlType, Geofence, GeofenceError, GeofenceEvent, GeofenceId, GeofenceSchedule,
    GeofenceScheduler, RegulationIntent, SharedGeofence,
};

/// Receives the normalized base map, encoded the same way inbound maps are.
pub type PublishMapCallback = Box<dyn Fn(Vec<u8>) + Send + Sync>;

/// Owns the live map and keeps it in sync with active geofences. Every entry point holds one lock
/// for its whole body, so map replacement, geofence registration, activation, and deactivation
/// never interleave.
pub struct Broadcaster {
    world: Mutex<WorldState>,
    scheduler: GeofenceScheduler,
    /// Taken by `run_event_loop`
    events: Mutex<Option<Receiver<GeofenceEvent>>>,
    transform: Box<dyn CoordinateTransform + Send + Sync>,
    publish: PublishMapCallback,
}

struct WorldState {
    /// As received and normalized; never modified afterwards.
    base_map: Option<Map>,
    /// Geofences change this one.
    current_map: Option<Map>,
    georeference: String,
    map_loaded: bool,
    config: BroadcasterConfig,
    /// Applied geofences, oldest first
    active: Vec<SharedGeofence>,
}

impl Broadcaster {
    /// `events` must be the receiver that came with `scheduler`.
    pub fn new(
        publish: PublishMapCallback,
        scheduler: GeofenceScheduler,
        events: Receiver<GeofenceEvent>,
        transform: Box<dyn CoordinateTransform + Send + Sync>,
        config: BroadcasterConfig,
    ) -> Broadcaster {
        Broadcaster {
            world: Mutex::new(WorldState {
                base_map: None,
                current_map: None,
                georeference: String::new(),
                map_loaded: false,
                config,
                active: Vec::new(),
            }),
            scheduler,
            events: Mutex::new(Some(events)),
            transform,
            publish,
        }
    }

    fn lock_world(&self) -> MutexGuard<'_, WorldState> {
        self.world
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Decodes and normalizes a new base map, replaces both copies, and publishes the normalized
    /// base map. Expected once per session; later calls are logged but handled the same way.
    /// Geofences that were already resolved keep referring to elements by ID.
    pub fn base_map_update(&self, raw: &[u8]) -> Result<(), GeofenceError> {
        let mut world = self.lock_world();
        if world.map_loaded {
            warn!("Received the base map more than once; replacing it anyway");
        } else {
            info!("Received the base map ({} bytes)", raw.len());
        }

        let mut timer = Timer::new("load base map");
        timer.start("decode");
        let decoded = Map::from_binary(raw);
        timer.stop("decode");
        let mut base = decoded.map_err(|err| {
            error!("Couldn't decode the base map: {:#}", err);
            GeofenceError::MapDecode(err)
        })?;
        if world.config.map.default_speed_limit.is_some() {
            base.set_config(world.config.map.clone());
        }
        conformance::ensure_compliance(&mut base, &mut timer);
        let current = base.clone();

        match base.to_binary() {
            Ok(bytes) => {
                timer.note(format!("Publishing {} ({} bytes)", base.get_name(), bytes.len()));
                (self.publish)(bytes);
            }
            Err(err) => {
                error!("Couldn't encode the normalized base map for publishing: {:#}", err);
            }
        }

        world.base_map = Some(base);
        world.current_map = Some(current);
        world.map_loaded = true;
        Ok(())
    }

    /// Describes the base map's frame. Only checked when a geofence is resolved.
    pub fn georeference_update(&self, georeference: String) {
        let mut world = self.lock_world();
        info!("Georeference is now {}", georeference);
        world.georeference = georeference;
    }

    /// Builds a geofence from the message, resolves which map elements it affects right away, and
    /// hands it to the scheduler. Fails without changing anything if the map or georeference
    /// isn't set up yet, or if the points can't be transformed.
    pub fn geofence_received(&self, msg: &ControlMessage) -> Result<GeofenceId, GeofenceError> {
        let mut world = self.lock_world();
        let world = &mut *world;
        let id = GeofenceId(msg.id);

        let affected_parts = get_affected_parts(
            world.current_map.as_ref(),
            &world.georeference,
            &msg.proj,
            &msg.points,
            self.transform.as_ref(),
            &world.config,
        )?;
        let map = world.current_map.as_mut().ok_or_else(|| {
            GeofenceError::InvalidState("the base map isn't loaded yet".to_string())
        })?;

        let regulation = regulation_intent(map, msg);
        let schedule = GeofenceSchedule::from_message(&msg.schedule);
        let mut geofence = Geofence::new(id, schedule, regulation);
        geofence.affected_parts = affected_parts;
        info!(
            "New geofence {} ({:?}) affects {} elements",
            id,
            msg.control_type,
            geofence.affected_parts.len()
        );

        if !self.scheduler.add_geofence(geofence.into_shared()) {
            warn!("Geofence {} won't ever be active", id);
        }
        Ok(id)
    }

    /// Applies the geofence's regulation to the current map. Problems are logged and only affect
    /// this geofence.
    pub fn on_activate(&self, shared: &SharedGeofence) {
        let mut world = self.lock_world();
        let world = &mut *world;
        let mut geofence = lock_geofence(shared);
        info!("Activating geofence {}", geofence.id);
        let map = match world.current_map.as_mut() {
            Some(map) => map,
            None => {
                error!("Can't activate geofence {}; no map is loaded", geofence.id);
                return;
            }
        };
        let errors = apply_regulation(map, &mut geofence);
        if !errors.is_empty() {
            warn!(
                "Geofence {} activated with {} inconsistencies",
                geofence.id,
                errors.len()
            );
        }
        if geofence.applied && !world.active.iter().any(|g| Arc::ptr_eq(g, shared)) {
            world.active.push(shared.clone());
        }
    }

    /// Restores what the geofence replaced, or hands it to a geofence applied later on the same
    /// elements. Afterwards the geofence has no recorded prior regulations, even if something went
    /// wrong.
    pub fn on_deactivate(&self, shared: &SharedGeofence) {
        let mut world = self.lock_world();
        let world = &mut *world;
        let position = world.active.iter().position(|g| Arc::ptr_eq(g, shared));
        let later: Vec<SharedGeofence> = match position {
            Some(idx) => {
                world.active.remove(idx);
                world.active[idx..].to_vec()
            }
            None => Vec::new(),
        };
        let mut geofence = lock_geofence(shared);
        info!("Deactivating geofence {}", geofence.id);
        match world.current_map.as_mut() {
            Some(map) => {
                let mut guards: Vec<_> = later.iter().map(lock_geofence).collect();
                let mut applied_later: Vec<&mut Geofence> =
                    guards.iter_mut().map(|g| &mut **g).collect();
                let errors = revert_regulation(map, &mut geofence, &mut applied_later);
                if !errors.is_empty() {
                    warn!(
                        "Geofence {} deactivated with {} inconsistencies",
                        geofence.id,
                        errors.len()
                    );
                }
            }
            None => {
                error!("Can't deactivate geofence {}; no map is loaded", geofence.id);
            }
        }
        geofence.prior_regulations.clear();
    }

    pub fn handle_event(&self, event: GeofenceEvent) {
        match event {
            GeofenceEvent::Activated(g) => self.on_activate(&g),
            GeofenceEvent::Deactivated(g) => self.on_deactivate(&g),
        }
    }

    /// Handles every event that's already waiting, without blocking. Returns how many there were.
    /// Once `run_event_loop` has started, that thread handles everything and this returns 0.
    pub fn process_events(&self) -> usize {
        let events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let events = match events.as_ref() {
            Some(events) => events,
            None => {
                debug!("The event loop owns the geofence events; not processing them here");
                return 0;
            }
        };
        let mut count = 0;
        for event in events.try_iter() {
            self.handle_event(event);
            count += 1;
        }
        count
    }

    /// Handles events on a background thread as they arrive. The thread exits after the
    /// scheduler shuts down and the remaining events are handled. Only the first call starts a
    /// loop; later ones return a thread that exits right away.
    pub fn run_event_loop(self: Arc<Self>) -> JoinHandle<()> {
        let events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        thread::spawn(move || {
            let events = match events {
                Some(events) => events,
                None => {
                    warn!("The geofence event loop is already running");
                    return;
                }
            };
            for event in events.iter() {
                self.handle_event(event);
            }
            info!("Geofence event channel closed; stopping the event loop");
        })
    }

    /// Stops scheduling. Geofences that are active right now stay applied.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    pub fn scheduler(&self) -> &GeofenceScheduler {
        &self.scheduler
    }

    /// Only affects geofences received afterwards.
    pub fn set_max_lane_width(&self, width: Distance) {
        let mut world = self.lock_world();
        info!("Max lane width is now {}", width);
        world.config.max_lane_width = width;
    }

    pub fn config(&self) -> BroadcasterConfig {
        self.lock_world().config.clone()
    }

    pub fn is_map_loaded(&self) -> bool {
        self.lock_world().map_loaded
    }

    /// Reads the map geofences modify, while holding the lock. None before the first base map.
    pub fn with_current_map<T, F: FnOnce(&Map) -> T>(&self, f: F) -> Option<T> {
        let world = self.lock_world();
        world.current_map.as_ref().map(f)
    }

    /// Reads the normalized map as it was received, while holding the lock.
    pub fn with_base_map<T, F: FnOnce(&Map) -> T>(&self, f: F) -> Option<T> {
        let world = self.lock_world();
        world.base_map.as_ref().map(f)
    }
}

/// Only speed limit control types produce a regulation. Each gets a fresh regulatory element ID
/// from the map.
fn regulation_intent(map: &mut Map, msg: &ControlMessage) -> Option<RegulationIntent> {
    match msg.control_type {
        ControlType::MaxSpeed => speed_limit(msg).map(|speed| {
            RegulationIntent::MaxSpeedLimit(RegulatoryElement {
                id: map.new_regulatory_element_id(),
                regulation: Regulation::MaxSpeed(speed),
            })
        }),
        ControlType::MinSpeed => speed_limit(msg).map(|speed| {
            RegulationIntent::MinSpeedLimit(RegulatoryElement {
                id: map.new_regulatory_element_id(),
                regulation: Regulation::MinSpeed(speed),
            })
        }),
        ControlType::Closed
        | ControlType::MaxHeight
        | ControlType::MaxWeight
        | ControlType::Unknown => None,
    }
}

fn speed_limit(msg: &ControlMessage) -> Option<Speed> {
    if !msg.control_value.is_finite() {
        warn!(
            "Ignoring {:?} geofence with value {}",
            msg.control_type, msg.control_value
        );
        return None;
    }
    Some(Speed::miles_per_hour(msg.control_value))
}
