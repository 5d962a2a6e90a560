use std::fmt;

use serde::{Deserialize, Serialize};

use geom::Polygon;

use crate::RegulatoryElementID;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaID(pub usize);

impl fmt::Display for AreaID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Area #{}", self.0)
    }
}

/// An undirected region, like a parking lot or plaza. Areas never take part in routing or
/// geofence resolution, but regulatory elements can still govern them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaID,
    pub polygon: Polygon,
    pub regulatory_elements: Vec<RegulatoryElementID>,
}
