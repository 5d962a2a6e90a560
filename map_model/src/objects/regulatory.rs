use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use geom::Speed;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegulatoryElementID(pub usize);

impl fmt::Display for RegulatoryElementID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RegulatoryElement #{}", self.0)
    }
}

/// Road users, as distinguished by traffic rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Participant {
    VehicleCar,
    VehicleTruck,
    VehicleBus,
    Bicycle,
    Pedestrian,
}

impl Participant {
    pub fn is_vehicle(self) -> bool {
        match self {
            Participant::VehicleCar | Participant::VehicleTruck | Participant::VehicleBus => true,
            Participant::Bicycle | Participant::Pedestrian => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Regulation {
    MaxSpeed(Speed),
    MinSpeed(Speed),
    /// Only these participants may enter.
    RegionAccess { participants: BTreeSet<Participant> },
    StopLine,
}

impl Regulation {
    /// Speed limits are what traffic-control geofences replace. Adding a variant here forces a
    /// decision about whether it's one.
    pub fn is_speed_limit(&self) -> bool {
        match self {
            Regulation::MaxSpeed(_) | Regulation::MinSpeed(_) => true,
            Regulation::RegionAccess { .. } | Regulation::StopLine => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Regulation::MaxSpeed(speed) => format!("maximum speed {}", speed),
            Regulation::MinSpeed(speed) => format!("minimum speed {}", speed),
            Regulation::RegionAccess { participants } => {
                format!("access only for {:?}", participants)
            }
            Regulation::StopLine => "stop line".to_string(),
        }
    }
}

/// A rule that can govern several lanelets and areas at once. It's shared by ID: removing it from
/// the map's regulatory layer detaches it everywhere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryElement {
    pub id: RegulatoryElementID,
    pub regulation: Regulation,
}

impl RegulatoryElement {
    pub fn is_speed_limit(&self) -> bool {
        self.regulation.is_speed_limit()
    }
}

impl fmt::Display for RegulatoryElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.regulation.describe())
    }
}
