use serde::{Deserialize, Serialize};

use geom::{Duration, Time};

use crate::ControlSchedule;

/// When a geofence is in force. Between `schedule_start` and `schedule_end`, every day has
/// windows starting at `control_start` and then every `control_interval`, as long as they start
/// before `control_end`. Each window lasts `control_duration`, cut short by `control_end` and the
/// overall schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeofenceSchedule {
    pub schedule_start: Time,
    pub schedule_end: Time,
    /// Offsets from midnight UTC
    pub control_start: Duration,
    pub control_end: Duration,
    pub control_duration: Duration,
    /// Zero means once a day.
    pub control_interval: Duration,
}

impl GeofenceSchedule {
    /// Nonsensical values are clamped instead of rejected. A schedule that can never be active
    /// just produces no windows.
    pub fn new(
        schedule_start: Time,
        schedule_end: Time,
        control_start: Duration,
        control_end: Duration,
        control_duration: Duration,
        control_interval: Duration,
    ) -> GeofenceSchedule {
        let clamp_time = |t: Time| {
            if t.inner_seconds() < 0.0 {
                Time::EPOCH
            } else {
                t
            }
        };
        let clamp_offset = |d: Duration| d.max(Duration::ZERO).min(Duration::DAY);
        GeofenceSchedule {
            schedule_start: clamp_time(schedule_start),
            schedule_end: clamp_time(schedule_end),
            control_start: clamp_offset(control_start),
            control_end: clamp_offset(control_end),
            control_duration: control_duration.max(Duration::ZERO),
            control_interval: control_interval.max(Duration::ZERO),
        }
    }

    /// A missing daily window means all day. Without a repeat, each day has one window covering
    /// the whole daily window.
    pub fn from_message(msg: &ControlSchedule) -> GeofenceSchedule {
        let (control_start, control_end) = match msg.between {
            Some(window) => (window.start, window.end),
            None => (Duration::ZERO, Duration::DAY),
        };
        let (control_duration, control_interval) = match msg.repeat {
            Some(repeat) => (repeat.duration, repeat.interval),
            None => (control_end - control_start, Duration::ZERO),
        };
        GeofenceSchedule::new(
            msg.start,
            msg.end,
            control_start,
            control_end,
            control_duration,
            control_interval,
        )
    }

    pub fn schedule_started(&self, now: Time) -> bool {
        now >= self.schedule_start
    }

    pub fn schedule_expired(&self, now: Time) -> bool {
        now >= self.schedule_end
    }

    /// The earliest window that hasn't ended by `now`, as (start, end). It may have started
    /// already. Windows that touch, like consecutive all-day windows, count as one.
    pub fn next_window(&self, now: Time) -> Option<(Time, Time)> {
        let (start, mut end) = self.next_single_window(now)?;
        while let Some((next_start, next_end)) = self.next_single_window(end) {
            if next_start > end {
                break;
            }
            end = next_end;
        }
        Some((start, end))
    }

    fn next_single_window(&self, now: Time) -> Option<(Time, Time)> {
        if self.schedule_end <= self.schedule_start
            || self.control_end <= self.control_start
            || self.control_duration <= Duration::ZERO
        {
            return None;
        }

        let mut day = now.max(self.schedule_start).day_start();
        while day < self.schedule_end {
            // Skip straight past the windows that certainly ended before now
            let mut k = if self.control_interval > Duration::ZERO && now > day {
                let elapsed = (now - day) - self.control_start - self.control_duration;
                (elapsed.inner_seconds() / self.control_interval.inner_seconds())
                    .floor()
                    .max(0.0)
            } else {
                0.0
            };

            loop {
                let offset = self.control_start + self.control_interval * k;
                if offset >= self.control_end {
                    break;
                }
                let start = (day + offset).max(self.schedule_start);
                let end = (day + (offset + self.control_duration).min(self.control_end))
                    .min(self.schedule_end);
                if start < end && end > now {
                    return Some((start, end));
                }
                if self.control_interval == Duration::ZERO {
                    break;
                }
                k += 1.0;
            }

            day += Duration::DAY;
        }
        None
    }
}
