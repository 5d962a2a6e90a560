use std::fmt;

use geo::Intersects;
use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Pt2D};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line(pt1, pt2)
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> Distance {
        self.0.dist_to(self.1)
    }

    pub fn angle(&self) -> Angle {
        self.0.angle_to(self.1)
    }

    pub fn middle(&self) -> Pt2D {
        self.0.midpoint(self.1)
    }

    pub fn reversed(&self) -> Line {
        Line(self.1, self.0)
    }

    /// True if the segments share any point, including touching endpoints and collinear overlap.
    pub fn intersects(&self, other: &Line) -> bool {
        self.to_geo().intersects(&other.to_geo())
    }

    fn to_geo(self) -> geo::Line<f64> {
        geo::Line::new(self.0, self.1)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line({} to {})", self.0, self.1)
    }
}
