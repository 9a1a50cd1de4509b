use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Remaining time until the deadline, split the way the countdown screen
/// renders it. Once the deadline passes every field clamps to zero and
/// `expired` flips; nothing else reacts to expiry.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub expired: bool,
}

impl TimeLeft {
    pub fn until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let difference_ms = deadline.timestamp_millis() - now.timestamp_millis();
        if difference_ms <= 0 {
            return Self {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 0,
                expired: difference_ms < 0,
            };
        }

        Self {
            days: difference_ms / (1000 * 60 * 60 * 24),
            hours: (difference_ms / (1000 * 60 * 60)) % 24,
            minutes: (difference_ms / 1000 / 60) % 60,
            seconds: (difference_ms / 1000) % 60,
            expired: false,
        }
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}
