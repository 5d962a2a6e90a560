use std::fmt;

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// longitude is x, latitude is y
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    /// Meters east and north of `origin`, using an equirectangular approximation. Good enough
    /// within a few kilometers of the origin, which covers any one map.
    pub fn offset_from(self, origin: LonLat) -> (f64, f64) {
        let lat0 = origin.latitude.to_radians();
        let dx = (self.longitude - origin.longitude).to_radians() * lat0.cos();
        let dy = (self.latitude - origin.latitude).to_radians();
        (dx * EARTH_RADIUS_METERS, dy * EARTH_RADIUS_METERS)
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({0}, {1})", self.longitude, self.latitude)
    }
}
