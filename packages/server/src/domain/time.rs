//! Session time with a clock abstraction for testability.

use std::{
    fmt,
    ops::Sub,
    sync::atomic::{AtomicI64, Ordering},
    time::Instant,
};

use chrono::TimeDelta;

/// Microsecond-resolution time elapsed since the tracking session started.
///
/// `TuioTime::UNDEFINED` sorts before every defined time, so a freshly created
/// component accepts any first sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TuioTime {
    micros: i64,
}

impl TuioTime {
    /// Time value that has not been set yet
    pub const UNDEFINED: TuioTime = TuioTime { micros: i64::MIN };

    /// Session start
    pub const ZERO: TuioTime = TuioTime { micros: 0 };

    pub fn from_micros(micros: i64) -> Self {
        Self { micros }
    }

    pub fn from_millis(millis: i64) -> Self {
        Self {
            micros: millis.saturating_mul(1_000),
        }
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self {
            micros: (secs * 1_000_000.0).round() as i64,
        }
    }

    pub fn micros(&self) -> i64 {
        self.micros
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.micros as f64 / 1_000_000.0
    }

    pub fn is_defined(&self) -> bool {
        *self != Self::UNDEFINED
    }

    /// Returns `self` when defined, otherwise `fallback`
    pub fn or(self, fallback: TuioTime) -> TuioTime {
        if self.is_defined() { self } else { fallback }
    }
}

impl Default for TuioTime {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl Sub for TuioTime {
    type Output = TimeDelta;

    /// Elapsed time between two samples. Undefined operands count as zero.
    fn sub(self, rhs: TuioTime) -> TimeDelta {
        let lhs = if self.is_defined() { self.micros } else { 0 };
        let rhs = if rhs.is_defined() { rhs.micros } else { 0 };
        TimeDelta::microseconds(lhs.saturating_sub(rhs))
    }
}

impl fmt::Display for TuioTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_defined() {
            write!(f, "{:.6}s", self.as_secs_f64())
        } else {
            write!(f, "undefined")
        }
    }
}

/// Seconds in a `TimeDelta` as `f32`, for motion math
pub fn delta_secs(delta: TimeDelta) -> f32 {
    match delta.num_microseconds() {
        Some(micros) => micros as f32 / 1_000_000.0,
        None => delta.num_milliseconds() as f32 / 1_000.0,
    }
}

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current session time
    fn now(&self) -> TuioTime;
}

/// Monotonic system clock measuring time since its creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> TuioTime {
        let elapsed = self.origin.elapsed();
        TuioTime::from_micros(i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX))
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: TuioTime,
}

impl FixedClock {
    pub fn new(fixed_time: TuioTime) -> Self {
        Self { fixed_time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> TuioTime {
        self.fixed_time
    }
}

/// Clock advanced by hand, for driving frame sequences in tests
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicI64,
}

impl ManualClock {
    pub fn new(start: TuioTime) -> Self {
        Self {
            micros: AtomicI64::new(start.micros()),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        let step = delta.num_microseconds().unwrap_or(i64::MAX);
        self.micros.fetch_add(step, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TuioTime {
        TuioTime::from_micros(self.micros.load(Ordering::SeqCst))
    }
}
