//! The inbound traffic-control message, as it arrives over the wire.

use serde::{Deserialize, Serialize};

use geom::{Duration, Time};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub id: [u8; 16],
    pub control_type: ControlType,
    /// Interpreted according to `control_type`. Speeds are in miles per hour.
    pub control_value: f64,
    /// The coordinate reference system `points` are expressed in.
    pub proj: String,
    pub points: Vec<Point3>,
    pub schedule: ControlSchedule,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlType {
    MaxSpeed,
    MinSpeed,
    Closed,
    MaxHeight,
    MaxWeight,
    /// Anything a newer sender might use.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Point3 {
        Point3 { x, y, z }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlSchedule {
    pub start: Time,
    pub end: Time,
    /// Only active during this part of each day. All day if missing.
    #[serde(default)]
    pub between: Option<DailyWindow>,
    #[serde(default)]
    pub repeat: Option<Repeat>,
}

/// Offsets from midnight UTC.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyWindow {
    pub start: Duration,
    pub end: Duration,
}

/// Within the daily window, active for `duration` once every `interval`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Repeat {
    pub duration: Duration,
    pub interval: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_message() {
        let raw = r#"{
            "id": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
            "control_type": "MAXSPEED",
            "control_value": 45.0,
            "proj": "EPSG:4326",
            "points": [{"x": -77.15, "y": 38.95}, {"x": -77.149, "y": 38.95, "z": 3.0}],
            "schedule": {"start": 0.0, "end": 86400.0, "repeat": {"duration": 60.0, "interval": 3600.0}}
        }"#;
        let msg: ControlMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.control_type, ControlType::MaxSpeed);
        assert_eq!(msg.points[0].z, 0.0);
        assert_eq!(msg.points[1].z, 3.0);
        assert_eq!(msg.schedule.between, None);
        assert_eq!(
            msg.schedule.repeat,
            Some(Repeat {
                duration: Duration::seconds(60.0),
                interval: Duration::hours(1),
            })
        );
    }

    #[test]
    fn unknown_control_types() {
        let parsed: ControlType = serde_json::from_str("\"LATPERM\"").unwrap();
        assert_eq!(parsed, ControlType::Unknown);
        let parsed: ControlType = serde_json::from_str("\"MINSPEED\"").unwrap();
        assert_eq!(parsed, ControlType::MinSpeed);
    }
}
