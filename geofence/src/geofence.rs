use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use map_model::{ElementID, RegulatoryElement};

use crate::GeofenceSchedule;

/// Copied verbatim from the control message; never interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeofenceId(pub [u8; 16]);

impl fmt::Display for GeofenceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// The regulation a geofence imposes while it's active. The regulatory element already has an ID
/// from the map it was resolved against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RegulationIntent {
    MaxSpeedLimit(RegulatoryElement),
    MinSpeedLimit(RegulatoryElement),
}

impl RegulationIntent {
    pub fn regulatory_element(&self) -> &RegulatoryElement {
        match self {
            RegulationIntent::MaxSpeedLimit(regem) | RegulationIntent::MinSpeedLimit(regem) => {
                regem
            }
        }
    }
}

/// A traffic-control change, pending or active.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub id: GeofenceId,
    pub schedule: GeofenceSchedule,
    /// None for control types that don't change speed limits.
    pub regulation: Option<RegulationIntent>,
    /// Resolved once, when the geofence is received. Insertion order, no duplicates.
    pub affected_parts: Vec<ElementID>,
    /// What each affected element had before this geofence was applied. Empty until then, and
    /// cleared once reverted. One element may appear several times, and one regulatory element
    /// may be recorded for several elements.
    pub prior_regulations: Vec<(ElementID, RegulatoryElement)>,
    /// Set by apply, cleared by revert.
    pub applied: bool,
}

impl Geofence {
    pub fn new(
        id: GeofenceId,
        schedule: GeofenceSchedule,
        regulation: Option<RegulationIntent>,
    ) -> Geofence {
        Geofence {
            id,
            schedule,
            regulation,
            affected_parts: Vec::new(),
            prior_regulations: Vec::new(),
            applied: false,
        }
    }

    pub fn into_shared(self) -> SharedGeofence {
        Arc::new(Mutex::new(self))
    }
}

/// The scheduler and the broadcaster both hold on to a geofence; the broadcaster only touches it
/// while also holding the map lock.
pub type SharedGeofence = Arc<Mutex<Geofence>>;

/// Recovers from a poisoned lock instead of panicking.
pub(crate) fn lock_geofence(geofence: &SharedGeofence) -> MutexGuard<'_, Geofence> {
    geofence.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
