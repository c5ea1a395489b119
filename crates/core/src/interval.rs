use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Unit of an [`Interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    fn millis(&self) -> u64 {
        match self {
            TimeUnit::Milliseconds => 1,
            TimeUnit::Seconds => 1_000,
            TimeUnit::Minutes => 60_000,
            TimeUnit::Hours => 3_600_000,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
        }
    }
}

/// Collection interval of a task.
///
/// Equality, ordering and hashing use the normalized magnitude, so
/// `30 seconds` and `30000 milliseconds` are the same interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Interval {
    pub duration: u64,
    pub unit: TimeUnit,
}

impl Interval {
    pub const fn new(duration: u64, unit: TimeUnit) -> Self {
        Self { duration, unit }
    }

    pub const fn millis(duration: u64) -> Self {
        Self::new(duration, TimeUnit::Milliseconds)
    }

    pub const fn seconds(duration: u64) -> Self {
        Self::new(duration, TimeUnit::Seconds)
    }

    pub const fn minutes(duration: u64) -> Self {
        Self::new(duration, TimeUnit::Minutes)
    }

    /// Normalized magnitude in milliseconds (saturating).
    pub fn as_millis(&self) -> u64 {
        self.duration.saturating_mul(self.unit.millis())
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.as_millis())
    }

    pub fn is_zero(&self) -> bool {
        self.duration == 0
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.as_millis() == other.as_millis()
    }
}

impl Eq for Interval {}

impl Hash for Interval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_millis().hash(state);
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_millis().cmp(&other.as_millis())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.duration, self.unit.suffix())
    }
}
