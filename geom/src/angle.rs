use std::fmt;

use serde::{Deserialize, Serialize};

/// An angle, stored in radians.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        Angle(rads)
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle(degs.to_radians())
    }

    /// The interior angle between two vectors, in [0, pi]. If either vector has no length, the
    /// angle is undefined and this returns None.
    pub fn between_vectors(v1: (f64, f64), v2: (f64, f64)) -> Option<Angle> {
        let len1 = v1.0.hypot(v1.1);
        let len2 = v2.0.hypot(v2.1);
        if len1 == 0.0 || len2 == 0.0 {
            return None;
        }
        // atan2 of the cross and dot products is stable near 0 and pi, unlike acos of the
        // normalized dot product.
        let cross = v1.0 * v2.1 - v1.1 * v2.0;
        let dot = v1.0 * v2.0 + v1.1 * v2.1;
        Some(Angle(cross.abs().atan2(dot)))
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        Angle(self.0 + degrees.to_radians())
    }

    /// Always in [0, 2pi)
    pub fn normalized_radians(self) -> f64 {
        let rads = self.0 % (2.0 * std::f64::consts::PI);
        if rads < 0.0 {
            rads + 2.0 * std::f64::consts::PI
        } else {
            rads
        }
    }

    /// Always in [0, 360)
    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }

    /// Is this angle strictly less than a right angle? Only meaningful for interior angles.
    pub fn is_acute(self) -> bool {
        self.0 >= 0.0 && self.0 < std::f64::consts::FRAC_PI_2
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_angles() {
        let east = (1.0, 0.0);
        assert_eq!(Angle::between_vectors(east, (5.0, 0.0)), Some(Angle::ZERO));
        let right = Angle::between_vectors(east, (0.0, -3.0)).unwrap();
        assert!((right.normalized_degrees() - 90.0).abs() < 1e-9);
        assert!(!right.is_acute());
        let back = Angle::between_vectors(east, (-2.0, 0.0)).unwrap();
        assert!((back.normalized_degrees() - 180.0).abs() < 1e-9);
        assert!(Angle::between_vectors(east, (1.0, 1.0)).unwrap().is_acute());
        assert_eq!(Angle::between_vectors(east, (0.0, 0.0)), None);
    }
}
