use std::{cmp, fmt};

use serde::{Deserialize, Serialize};

use crate::{deserialize_f64, serialize_f64, trim_f64};

/// In meters per second.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Speed(
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")] f64,
);

// By construction, Speed is a finite f64 with trimmed precision.
impl Eq for Speed {}

#[allow(clippy::derive_ord_xor_partial_ord)] // false positive
impl Ord for Speed {
    fn cmp(&self, other: &Speed) -> cmp::Ordering {
        self.partial_cmp(other).unwrap_or(cmp::Ordering::Equal)
    }
}

impl Speed {
    pub const ZERO: Speed = Speed(0.0);

    pub fn meters_per_second(value: f64) -> Speed {
        if !value.is_finite() {
            panic!("Bad Speed {}", value);
        }

        Speed(trim_f64(value))
    }

    pub fn miles_per_hour(value: f64) -> Speed {
        Speed::meters_per_second(0.44704 * value)
    }

    pub fn inner_meters_per_second(self) -> f64 {
        self.0
    }

    pub fn to_miles_per_hour(self) -> f64 {
        self.0 / 0.44704
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} mph", self.to_miles_per_hour().round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mph_conversions() {
        let limit = Speed::miles_per_hour(45.0);
        assert_eq!(limit.to_string(), "45 mph");
        assert!(Speed::miles_per_hour(35.0) < limit);
    }
}
