//! Applies time-bounded traffic-control geofences (like a temporary speed limit through a work
//! zone) to a live road map, and reverts them exactly once they expire.
//!
//! The pieces, leaves first:
//!
//! - `resolver` figures out which lanelets a geofence's geometry covers.
//! - `regulations` swaps speed limits on those lanelets and puts the old ones back later.
//! - `GeofenceScheduler` turns each geofence's schedule into activation and deactivation events.
//! - `Broadcaster` owns the map, builds geofences from control messages, and reacts to the events,
//!   all under one lock.

#[macro_use]
extern crate log;

use serde::{Deserialize, Serialize};

use geom::Distance;
use map_model::{MapConfig, Participant};

pub use crate::broadcaster::{Broadcaster, PublishMapCallback};
pub use crate::error::GeofenceError;
pub use crate::geofence::{Geofence, GeofenceId, RegulationIntent, SharedGeofence};
pub use crate::messages::{
    ControlMessage, ControlSchedule, ControlType, DailyWindow, Point3, Repeat,
};
pub use crate::resolver::get_affected_parts;
pub use crate::regulations::{apply_regulation, revert_regulation};
pub use crate::schedule::GeofenceSchedule;
pub use crate::scheduler::{GeofenceEvent, GeofenceScheduler};

mod broadcaster;
mod error;
mod geofence;
mod messages;
mod regulations;
mod resolver;
mod schedule;
mod scheduler;

/// Tunes how geofences get resolved against the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BroadcasterConfig {
    /// The spatial search around each geofence point gives up on lanelets farther away than this.
    pub max_lane_width: Distance,
    /// Whose traffic rules decide which lanelets connect, when filtering the last geofence point.
    pub routing_participant: Participant,
    /// Applied to every base map before conformance.
    pub map: MapConfig,
}

impl Default for BroadcasterConfig {
    fn default() -> BroadcasterConfig {
        BroadcasterConfig {
            max_lane_width: Distance::meters(4.0),
            routing_participant: Participant::VehicleCar,
            map: MapConfig::default(),
        }
    }
}

impl BroadcasterConfig {
    pub fn from_json(raw: &[u8]) -> anyhow::Result<BroadcasterConfig> {
        abstutil::from_json(raw)
    }
}
