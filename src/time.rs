//! Rational time primitives for the document coordinate space.
//!
//! A `RationalTime` is a tick count measured against a rate (ticks per
//! second), the same measure/rate split editorial documents use, so a
//! 23.976 clip and a 30fps track can coexist without rounding drift.
//! Cross-rate arithmetic rescales the right-hand side to the left-hand
//! rate: a 24fps playhead stays a 24fps playhead through add/sub chains.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::{Add, Sub};

/// A point in time (or a span, when used as a duration) at a given rate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RationalTime {
    value: f64,
    rate: f64,
}

impl RationalTime {
    pub fn new(value: f64, rate: f64) -> Self {
        Self { value, rate }
    }

    pub fn from_seconds(seconds: f64, rate: f64) -> Self {
        Self { value: seconds * rate, rate }
    }

    pub fn from_frames(frames: i64, rate: f64) -> Self {
        Self { value: frames as f64, rate }
    }

    pub fn value(self) -> f64 {
        self.value
    }

    pub fn rate(self) -> f64 {
        self.rate
    }

    pub fn to_seconds(self) -> f64 {
        self.value / self.rate
    }

    /// Whole-frame index, truncated toward negative infinity.
    pub fn to_frames(self) -> i64 {
        self.value.floor() as i64
    }

    /// A rate is only meaningful when strictly positive.
    pub fn is_valid(self) -> bool {
        self.rate > 0.0
    }

    /// Same instant expressed at a different rate.
    pub fn rescaled_to(self, rate: f64) -> Self {
        Self {
            value: self.value * (rate / self.rate),
            rate,
        }
    }

    /// Nearest whole tick at this rate (frame snapping).
    pub fn round(self) -> Self {
        Self {
            value: self.value.round(),
            rate: self.rate,
        }
    }

    /// Largest whole tick not after this instant.
    pub fn floor(self) -> Self {
        Self {
            value: self.value.floor(),
            rate: self.rate,
        }
    }
}

impl Default for RationalTime {
    fn default() -> Self {
        Self { value: 0.0, rate: 1.0 }
    }
}

impl Add for RationalTime {
    type Output = RationalTime;

    fn add(self, rhs: RationalTime) -> RationalTime {
        let rhs = rhs.rescaled_to(self.rate);
        RationalTime::new(self.value + rhs.value, self.rate)
    }
}

impl Sub for RationalTime {
    type Output = RationalTime;

    fn sub(self, rhs: RationalTime) -> RationalTime {
        let rhs = rhs.rescaled_to(self.rate);
        RationalTime::new(self.value - rhs.value, self.rate)
    }
}

impl PartialEq for RationalTime {
    fn eq(&self, other: &Self) -> bool {
        self.value * other.rate == other.value * self.rate
    }
}

impl PartialOrd for RationalTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.value * other.rate).partial_cmp(&(other.value * self.rate))
    }
}

/// A half-open span: start plus duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    start_time: RationalTime,
    duration: RationalTime,
}

impl TimeRange {
    pub fn new(start_time: RationalTime, duration: RationalTime) -> Self {
        Self { start_time, duration }
    }

    pub fn start_time(self) -> RationalTime {
        self.start_time
    }

    pub fn duration(self) -> RationalTime {
        self.duration
    }

    pub fn end_time_exclusive(self) -> RationalTime {
        self.start_time + self.duration
    }

    /// Last tick inside the range (one tick short of the exclusive end).
    pub fn end_time_inclusive(self) -> RationalTime {
        let end = self.end_time_exclusive();
        RationalTime::new(end.value() - 1.0, end.rate())
    }

    pub fn contains(self, t: RationalTime) -> bool {
        self.start_time <= t && t < self.end_time_exclusive()
    }
}
