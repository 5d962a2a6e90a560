use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, EPSILON_DIST};

/// This represents world-space in meters, in the map's own reference frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        if !x.is_finite() || !y.is_finite() {
            panic!("Bad Pt2D {}, {}", x, y);
        }

        Pt2D { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn dist_to(self, to: Pt2D) -> Distance {
        Distance::meters(((self.x - to.x).powi(2) + (self.y - to.y).powi(2)).sqrt())
    }

    pub fn approx_eq(self, other: Pt2D, threshold: Distance) -> bool {
        self.dist_to(other) <= threshold
    }

    pub fn angle_to(self, to: Pt2D) -> Angle {
        Angle::new_rads((to.y - self.y).atan2(to.x - self.x))
    }

    pub fn offset(self, dx: f64, dy: f64) -> Pt2D {
        Pt2D::new(self.x + dx, self.y + dy)
    }

    pub fn project_away(self, dist: Distance, theta: Angle) -> Pt2D {
        let (sin, cos) = theta.normalized_radians().sin_cos();
        Pt2D::new(
            self.x + dist.inner_meters() * cos,
            self.y + dist.inner_meters() * sin,
        )
    }

    /// The midpoint of the straight line between two points.
    pub fn midpoint(self, other: Pt2D) -> Pt2D {
        Pt2D::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Treats both points as vectors from the origin and returns `self - other`, as (dx, dy).
    pub fn vector_from(self, other: Pt2D) -> (f64, f64) {
        (self.x - other.x, self.y - other.y)
    }

    /// Rounds to a grid of `EPSILON_DIST`, so that points meant to coincide (like the end of one
    /// lanelet's boundary and the start of the next) hash the same.
    pub fn to_snapped_hashable(self) -> HashablePt2D {
        let step = EPSILON_DIST.inner_meters();
        HashablePt2D::new((self.x / step).round() * step, (self.y / step).round() * step)
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x, self.y)
    }
}

impl From<Pt2D> for geo::Coordinate<f64> {
    fn from(pt: Pt2D) -> Self {
        geo::Coordinate { x: pt.x, y: pt.y }
    }
}

impl From<Pt2D> for geo::Point<f64> {
    fn from(pt: Pt2D) -> Self {
        geo::Point::new(pt.x, pt.y)
    }
}

/// This isn't opinionated about what the (x, y) represents. Enables hashing and ordering, so it
/// can key a map.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct HashablePt2D {
    x: OrderedFloat<f64>,
    y: OrderedFloat<f64>,
}

impl HashablePt2D {
    pub fn new(x: f64, y: f64) -> HashablePt2D {
        HashablePt2D {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
        }
    }
}
