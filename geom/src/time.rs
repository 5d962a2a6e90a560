use std::{cmp, fmt, ops};

use serde::{Deserialize, Serialize};

use crate::Duration;

/// An absolute point in time, in seconds since the platform's epoch (UTC). Can't be negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Time(f64);

// By construction, Time is a finite f64.
impl Eq for Time {}

#[allow(clippy::derive_ord_xor_partial_ord)] // false positive
impl Ord for Time {
    fn cmp(&self, other: &Time) -> cmp::Ordering {
        self.partial_cmp(other).unwrap_or(cmp::Ordering::Equal)
    }
}

impl Time {
    pub const EPOCH: Time = Time(0.0);

    pub fn seconds_since_epoch(value: f64) -> Time {
        if !value.is_finite() || value < 0.0 {
            panic!("Bad Time {}", value);
        }

        Time(value)
    }

    pub fn inner_seconds(self) -> f64 {
        self.0
    }

    /// Midnight (UTC) of the day containing this time.
    pub fn day_start(self) -> Time {
        let day = Duration::DAY.inner_seconds();
        Time((self.0 / day).floor() * day)
    }

    /// How long since midnight (UTC)?
    pub fn time_of_day(self) -> Duration {
        self - self.day_start()
    }

    /// (day, hours, minutes, seconds, centiseconds)
    fn get_parts(self) -> (usize, usize, usize, usize, usize) {
        let mut remainder = self.0;
        let days = (remainder / Duration::DAY.inner_seconds()).floor();
        remainder -= days * Duration::DAY.inner_seconds();
        let hours = (remainder / 3600.0).floor();
        remainder -= hours * 3600.0;
        let minutes = (remainder / 60.0).floor();
        remainder -= minutes * 60.0;
        let seconds = remainder.floor();
        remainder -= seconds;
        let centis = (remainder / 0.01).floor();

        (
            days as usize,
            hours as usize,
            minutes as usize,
            seconds as usize,
            centis as usize,
        )
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (days, hours, minutes, seconds, centis) = self.get_parts();
        write!(
            f,
            "day {0} {1:02}:{2:02}:{3:02}.{4:02}",
            days, hours, minutes, seconds, centis
        )
    }
}

impl ops::Add<Duration> for Time {
    type Output = Time;

    fn add(self, other: Duration) -> Time {
        Time::seconds_since_epoch(self.0 + other.inner_seconds())
    }
}

impl ops::AddAssign<Duration> for Time {
    fn add_assign(&mut self, other: Duration) {
        *self = *self + other;
    }
}

impl ops::Sub for Time {
    type Output = Duration;

    fn sub(self, other: Time) -> Duration {
        Duration::seconds(self.0 - other.0)
    }
}
