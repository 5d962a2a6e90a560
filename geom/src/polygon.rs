use std::fmt;

use anyhow::Result;
use geo::Contains;
use serde::{Deserialize, Serialize};

use crate::{Bounds, PolyLine, Pt2D};

/// A simple polygon without holes. The first and last points may or may not match; the ring is
/// closed implicitly.
#[derive(PartialEq, Serialize, Deserialize, Clone, Debug)]
pub struct Polygon {
    points: Vec<Pt2D>,
}

impl Polygon {
    pub fn new(points: Vec<Pt2D>) -> Result<Polygon> {
        let mut distinct = points.clone();
        if distinct.len() > 1 && distinct[0] == distinct[distinct.len() - 1] {
            distinct.pop();
        }
        if distinct.len() < 3 {
            bail!("A polygon needs at least 3 distinct points, got {}", distinct.len());
        }
        Ok(Polygon { points })
    }

    /// The outline of the strip between two roughly parallel boundaries running the same
    /// direction, like the left and right side of a lane.
    pub fn between_bounds(left: &PolyLine, right: &PolyLine) -> Result<Polygon> {
        let mut pts = left.points().clone();
        pts.extend(right.reversed().into_points());
        Polygon::new(pts)
    }

    /// Axis-aligned rectangle with the given corners.
    pub fn rectangle(min: Pt2D, max: Pt2D) -> Result<Polygon> {
        Polygon::new(vec![
            min,
            Pt2D::new(max.x(), min.y()),
            max,
            Pt2D::new(min.x(), max.y()),
        ])
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.points
    }

    pub fn get_bounds(&self) -> Bounds {
        Bounds::from(&self.points)
    }

    /// Does this polygon contain the point in its interior? Points exactly on the boundary don't
    /// count.
    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        self.to_geo().contains(&geo::Point::from(pt))
    }

    fn to_geo(&self) -> geo::Polygon<f64> {
        let exterior: Vec<geo::Coordinate<f64>> =
            self.points.iter().map(|pt| (*pt).into()).collect();
        geo::Polygon::new(exterior.into(), Vec::new())
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Polygon with {} points", self.points.len())?;
        for pt in &self.points {
            writeln!(f, "  {}", pt)?;
        }
        Ok(())
    }
}
