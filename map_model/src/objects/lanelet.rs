use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{Distance, Line, PolyLine, Polygon, Pt2D};

use crate::{Participant, RegulatoryElementID};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneletID(pub usize);

impl fmt::Display for LaneletID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Lanelet #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneletType {
    Road,
    Highway,
    BicycleLane,
    Crosswalk,
    Walkway,
}

impl LaneletType {
    /// Who may use this type of lanelet at all, before any access restrictions.
    pub fn allows(self, participant: Participant) -> bool {
        match self {
            LaneletType::Road => participant != Participant::Pedestrian,
            LaneletType::Highway => participant.is_vehicle(),
            LaneletType::BicycleLane => participant == Participant::Bicycle,
            LaneletType::Crosswalk | LaneletType::Walkway => participant == Participant::Pedestrian,
        }
    }
}

/// A directed stretch of lane. Travel goes from the first points of both bounds towards the last
/// points; the left bound is on the left in that direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lanelet {
    pub id: LaneletID,
    pub subtype: LaneletType,
    pub left_bound: PolyLine,
    pub right_bound: PolyLine,
    /// Attached by reference; the map's regulatory layer owns the elements.
    pub regulatory_elements: Vec<RegulatoryElementID>,

    polygon: Polygon,
}

impl Lanelet {
    pub fn new(
        id: LaneletID,
        subtype: LaneletType,
        left_bound: PolyLine,
        right_bound: PolyLine,
    ) -> Result<Lanelet> {
        let polygon = Polygon::between_bounds(&left_bound, &right_bound)
            .map_err(|err| anyhow!("{} has a degenerate outline: {}", id, err))?;
        Ok(Lanelet {
            id,
            subtype,
            left_bound,
            right_bound,
            regulatory_elements: Vec::new(),
            polygon,
        })
    }

    /// A straight lanelet centered on the line from `start` to `end`.
    pub fn straight(
        id: LaneletID,
        start: Pt2D,
        end: Pt2D,
        width: Distance,
        subtype: LaneletType,
    ) -> Result<Lanelet> {
        if start == end {
            bail!("{} would have zero length", id);
        }
        let angle = start.angle_to(end);
        let half = width / 2.0;
        let shift = |pt: Pt2D, degs: f64| pt.project_away(half, angle.rotate_degs(degs));
        let left = PolyLine::new(vec![shift(start, 90.0), shift(end, 90.0)])?;
        let right = PolyLine::new(vec![shift(start, -90.0), shift(end, -90.0)])?;
        Lanelet::new(id, subtype, left, right)
    }

    /// The outline formed by the left bound followed by the reversed right bound.
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// The segment joining the last point of the left bound to the last point of the right bound.
    /// Leaving the lanelet in the direction of travel means crossing this.
    pub fn end_line(&self) -> Line {
        Line::new(self.left_bound.last_pt(), self.right_bound.last_pt())
    }
}
