//! Geometry and units shared by the map store and the geofence core. Everything here is in a flat
//! 2D world space measured in meters, except for `LonLat`, which is geodetic.

#[macro_use]
extern crate anyhow;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use crate::angle::Angle;
pub use crate::bounds::Bounds;
pub use crate::distance::Distance;
pub use crate::duration::Duration;
pub use crate::gps::LonLat;
pub use crate::line::Line;
pub use crate::polygon::Polygon;
pub use crate::polyline::PolyLine;
pub use crate::projection::{CoordinateTransform, LocalProjection, ProjString};
pub use crate::pt::{HashablePt2D, Pt2D};
pub use crate::speed::Speed;
pub use crate::time::Time;

mod angle;
mod bounds;
mod distance;
mod duration;
mod gps;
mod line;
mod polygon;
mod polyline;
mod projection;
mod pt;
mod speed;
mod time;

/// Two points closer than this are considered the same.
pub const EPSILON_DIST: Distance = Distance::const_meters(0.01);

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Serializes a trimmed `f64` as an `i32` to save space.
fn serialize_f64<S: Serializer>(x: &f64, s: S) -> Result<S::Ok, S::Error> {
    // So a trimmed f64's range becomes 2**31 / 10,000 =~ 214,000, which is plenty
    // We MUST round here, the same as trim_f64. The unit test demonstrates why.
    let int = (x * 10_000.0).round() as i32;
    int.serialize(s)
}

/// Deserializes a trimmed `f64` from an `i32`.
fn deserialize_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let x = <i32>::deserialize(d)?;
    Ok(x as f64 / 10_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_f64_survives_serialization() {
        // 1.00005 * 10_000 truncates to 10_000 but rounds to 10_001.
        let x = trim_f64(1.000_05);
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::new(&mut buf);
        serialize_f64(&x, &mut ser).unwrap();
        let mut de = serde_json::Deserializer::from_slice(&buf);
        assert_eq!(deserialize_f64(&mut de).unwrap(), x);
    }
}
