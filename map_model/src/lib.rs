//! The road network an automated vehicle drives on, as a set of lanelets (directed lane segments
//! bounded by a left and right linestring), areas, and the regulatory elements (speed limits,
//! access rules, stop lines) attached to them. Supports the spatial and topological queries that
//! traffic-control geofences need: nearest-neighbor search, containment, and a routing graph.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use abstutil::{deserialize_btreemap, serialize_btreemap};
use geom::Speed;

pub use crate::find_closest::LaneletIndex;
pub use crate::objects::area::{Area, AreaID};
pub use crate::objects::lanelet::{Lanelet, LaneletID, LaneletType};
pub use crate::objects::regulatory::{
    Participant, Regulation, RegulatoryElement, RegulatoryElementID,
};
pub use crate::objects::ElementID;
pub use crate::routing::{RoutingGraph, TrafficRules};

pub mod conformance;
mod find_closest;
mod map;
mod objects;
mod routing;

/// A complete map. Lanelets, areas, and regulatory elements each have their own ID space.
/// Elements refer to the regulatory elements governing them by ID only; the layer owns the
/// elements themselves.
#[derive(Clone, Serialize, Deserialize)]
pub struct Map {
    name: String,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    lanelets: BTreeMap<LaneletID, Lanelet>,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    areas: BTreeMap<AreaID, Area>,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    regulatory_elements: BTreeMap<RegulatoryElementID, RegulatoryElement>,
    /// Never reused, even after the element with the previous ID is removed.
    next_regulatory_element_id: usize,
    config: MapConfig,

    // Derived from lanelet geometry; rebuilt after loading.
    #[serde(skip_serializing, skip_deserializing)]
    lanelet_index: LaneletIndex,
}

/// Options affecting how a map is normalized after loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct MapConfig {
    /// If set, vehicle lanelets without any speed limit get one of these during conformance.
    pub default_speed_limit: Option<Speed>,
}
