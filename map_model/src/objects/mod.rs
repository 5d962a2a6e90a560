use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AreaID, LaneletID};

pub mod area;
pub mod lanelet;
pub mod regulatory;

/// Refers to anything that regulatory elements can govern.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementID {
    Lanelet(LaneletID),
    Area(AreaID),
}

impl fmt::Display for ElementID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ElementID::Lanelet(id) => write!(f, "{}", id),
            ElementID::Area(id) => write!(f, "{}", id),
        }
    }
}

impl From<LaneletID> for ElementID {
    fn from(id: LaneletID) -> ElementID {
        ElementID::Lanelet(id)
    }
}

impl From<AreaID> for ElementID {
    fn from(id: AreaID) -> ElementID {
        ElementID::Area(id)
    }
}
