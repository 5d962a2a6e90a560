use std::{cmp, fmt, ops};

use serde::{Deserialize, Serialize};

/// Seconds, possibly negative. Schedules use these for offsets within a day and for repeat
/// periods.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Duration(f64);

// Never NaN
impl Eq for Duration {}

#[allow(clippy::derive_ord_xor_partial_ord)]
impl Ord for Duration {
    fn cmp(&self, other: &Duration) -> cmp::Ordering {
        self.partial_cmp(other).unwrap_or(cmp::Ordering::Equal)
    }
}

impl Duration {
    pub const ZERO: Duration = Duration::const_seconds(0.0);
    pub const DAY: Duration = Duration::const_seconds(86_400.0);

    pub fn seconds(value: f64) -> Duration {
        if !value.is_finite() {
            panic!("Bad Duration {}", value);
        }
        Duration(value)
    }

    pub fn minutes(mins: usize) -> Duration {
        Duration::seconds(60.0 * mins as f64)
    }

    pub fn hours(hours: usize) -> Duration {
        Duration::seconds(3600.0 * hours as f64)
    }

    pub const fn const_seconds(value: f64) -> Duration {
        Duration(value)
    }

    pub fn inner_seconds(self) -> f64 {
        self.0
    }
}

/// Like `2h05m30.5s`, dropping leading units that are zero.
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 < 0.0 {
            write!(f, "-")?;
        }
        let total = self.0.abs();
        let hours = (total / 3600.0).floor();
        let minutes = ((total - hours * 3600.0) / 60.0).floor();
        let seconds = total - hours * 3600.0 - minutes * 60.0;
        if hours > 0.0 {
            write!(f, "{}h{:02}m", hours, minutes)?;
        } else if minutes > 0.0 {
            write!(f, "{}m", minutes)?;
        }
        write!(f, "{}s", (seconds * 10.0).round() / 10.0)
    }
}

impl ops::Add for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Duration {
        Duration::seconds(self.0 + other.0)
    }
}

impl ops::Sub for Duration {
    type Output = Duration;

    fn sub(self, other: Duration) -> Duration {
        Duration::seconds(self.0 - other.0)
    }
}

impl ops::Mul<f64> for Duration {
    type Output = Duration;

    fn mul(self, factor: f64) -> Duration {
        Duration::seconds(self.0 * factor)
    }
}
