//! Turns geofence schedules into activation and deactivation events. Time only moves when
//! `advance` is called, so whoever drives the clock (a timer thread, a replay, a test) decides
//! how events interleave with everything else.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use geom::Time;

use crate::geofence::lock_geofence;
use crate::{GeofenceId, GeofenceSchedule, SharedGeofence};

/// Sent in the order the transitions happen. A geofence is always activated before it's
/// deactivated, and never activated twice in a row.
#[derive(Clone)]
pub enum GeofenceEvent {
    Activated(SharedGeofence),
    Deactivated(SharedGeofence),
}

impl GeofenceEvent {
    pub fn geofence(&self) -> &SharedGeofence {
        match self {
            GeofenceEvent::Activated(g) | GeofenceEvent::Deactivated(g) => g,
        }
    }
}

/// Cheap to clone; all clones share the same state and feed the same channel.
#[derive(Clone)]
pub struct GeofenceScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

struct SchedulerState {
    /// None after `shutdown`
    sender: Option<Sender<GeofenceEvent>>,
    entries: Vec<Entry>,
    /// The last time passed to `advance`
    now: Option<Time>,
}

struct Entry {
    geofence: SharedGeofence,
    id: GeofenceId,
    schedule: GeofenceSchedule,
    /// Some while a window is active, holding when it ends
    active_until: Option<Time>,
    /// The next window to activate, with its start pushed back to when the previous one ended
    /// if they overlap
    next_window: Option<(Time, Time)>,
}

impl Entry {
    /// When this entry next needs attention, and whether that's a deactivation.
    fn next_transition(&self) -> Option<(Time, bool)> {
        if let Some(end) = self.active_until {
            return Some((end, true));
        }
        self.next_window.map(|(start, _)| (start, false))
    }
}

impl GeofenceScheduler {
    /// The receiver gets every event, in order. Dropping it just makes later events vanish.
    pub fn new() -> (GeofenceScheduler, Receiver<GeofenceEvent>) {
        let (sender, receiver) = channel();
        let scheduler = GeofenceScheduler {
            state: Arc::new(Mutex::new(SchedulerState {
                sender: Some(sender),
                entries: Vec::new(),
                now: None,
            })),
        };
        (scheduler, receiver)
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Windows that already ended before the last `advance` are never activated. Returns false
    /// if the geofence will never be active.
    pub fn add_geofence(&self, geofence: SharedGeofence) -> bool {
        let mut state = self.lock();
        if state.sender.is_none() {
            warn!("Scheduler is shut down; ignoring new geofence");
            return false;
        }
        let (id, schedule) = {
            let g = lock_geofence(&geofence);
            (g.id, g.schedule.clone())
        };
        let next_window = schedule.next_window(state.now.unwrap_or(Time::EPOCH));
        match next_window {
            Some((start, end)) => {
                debug!("Geofence {} first active from {} to {}", id, start, end);
            }
            None => {
                warn!("Geofence {} has no upcoming active windows; ignoring it", id);
                return false;
            }
        }
        state.entries.push(Entry {
            geofence,
            id,
            schedule,
            active_until: None,
            next_window,
        });
        true
    }

    /// Emits every transition due by `now`, in time order. At the same instant, deactivations
    /// come before activations, and otherwise geofences go in the order they were added. Returns
    /// the number of events sent.
    pub fn advance(&self, now: Time) -> usize {
        let mut state = self.lock();
        if let Some(prev) = state.now {
            if now < prev {
                warn!("Scheduler asked to go back in time from {} to {}", prev, now);
                return 0;
            }
        }
        state.now = Some(now);

        let mut count = 0;
        loop {
            let mut best: Option<(usize, Time, bool)> = None;
            for (idx, entry) in state.entries.iter().enumerate() {
                if let Some((at, deactivate)) = entry.next_transition() {
                    if at > now {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some((_, best_at, best_deactivate)) => {
                            at < best_at || (at == best_at && deactivate && !best_deactivate)
                        }
                    };
                    if better {
                        best = Some((idx, at, deactivate));
                    }
                }
            }
            let (idx, at, deactivate) = match best {
                Some(x) => x,
                None => break,
            };

            let event = if deactivate {
                let entry = &mut state.entries[idx];
                entry.active_until = None;
                entry.next_window = entry
                    .schedule
                    .next_window(at)
                    .map(|(start, end)| (start.max(at), end));
                info!("Geofence {} deactivates at {}", entry.id, at);
                GeofenceEvent::Deactivated(entry.geofence.clone())
            } else {
                let entry = &mut state.entries[idx];
                let (_, end) = match entry.next_window.take() {
                    Some(window) => window,
                    None => continue,
                };
                entry.active_until = Some(end);
                info!("Geofence {} activates at {}", entry.id, at);
                GeofenceEvent::Activated(entry.geofence.clone())
            };

            match state.sender {
                Some(ref sender) => {
                    if sender.send(event).is_err() {
                        warn!("Nobody is listening for geofence events anymore");
                    }
                }
                None => {
                    warn!("Scheduler is shut down; dropping a geofence event");
                }
            }
            count += 1;

            let entry = &state.entries[idx];
            if entry.active_until.is_none() && entry.next_window.is_none() {
                debug!("Geofence {} has no more windows; dropping it", entry.id);
                state.entries.remove(idx);
            }
        }
        count
    }

    /// Forgets every geofence and closes the channel, so a receiver blocked waiting for events
    /// wakes up once it has drained the rest.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.sender = None;
        state.entries.clear();
        info!("Geofence scheduler shut down");
    }

    pub fn num_geofences(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn now(&self) -> Option<Time> {
        self.lock().now
    }
}
