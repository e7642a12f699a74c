//!
//! Temporal quantification in a simulation context.
//!
//! Every rank runs its own event loop on its own thread, so the notion
//! of "now" is tracked per thread. Only the dispatch loop of a rank
//! advances it.
//!
//! ```rust
//! # use pingpong::time::*;
//! let t = SimTime::ZERO + Duration::from_secs(2);
//! assert_eq!(t, SimTime::from_secs_f64(2.0));
//! assert_eq!(t.to_string(), "2s");
//! ```

pub use std::time::Duration;

use std::cell::Cell;
use std::error::Error;
use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

thread_local! {
    static NOW: Cell<SimTime> = const { Cell::new(SimTime::ZERO) };
}

///
/// A specific point of time in the simulation.
///
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimTime(Duration);

impl SimTime {
    /// The start of every simulation.
    pub const ZERO: SimTime = SimTime(Duration::ZERO);

    /// The largest representable point in time.
    pub const MAX: SimTime = SimTime(Duration::MAX);

    /// Returns the current simulation time of the runtime
    /// driving the calling thread.
    #[must_use]
    pub fn now() -> Self {
        NOW.with(Cell::get)
    }

    pub(crate) fn set_now(time: SimTime) {
        NOW.with(|now| now.set(time));
    }

    /// Creates a point in time from a number of seconds since the start.
    ///
    /// # Panics
    ///
    /// Panics if `secs` is negative, not finite or overflows.
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        SimTime(Duration::from_secs_f64(secs))
    }

    /// Creates a point in time from a number of seconds since the start,
    /// returning `None` if `secs` is negative, not finite or overflows.
    #[must_use]
    pub fn try_from_secs_f64(secs: f64) -> Option<Self> {
        Duration::try_from_secs_f64(secs).ok().map(SimTime)
    }

    /// Creates a point in time from a duration since the start.
    #[must_use]
    pub const fn from_duration(dur: Duration) -> Self {
        SimTime(dur)
    }

    /// The duration since the start of the simulation.
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    /// Seconds since the start of the simulation.
    #[must_use]
    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Adds a duration, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Duration) -> Option<SimTime> {
        self.0.checked_add(rhs).map(SimTime)
    }

    /// Adds a duration, clamping at [`SimTime::MAX`].
    #[must_use]
    pub fn saturating_add(self, rhs: Duration) -> SimTime {
        SimTime(self.0.saturating_add(rhs))
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> Self::Output {
        self.checked_add(rhs)
            .expect("Overflow when adding Duration to SimTime")
    }
}

impl AddAssign<Duration> for SimTime {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl Sub for SimTime {
    type Output = Duration;

    fn sub(self, rhs: SimTime) -> Self::Output {
        self.0.saturating_sub(rhs.0)
    }
}

impl From<f64> for SimTime {
    fn from(secs: f64) -> Self {
        SimTime::from_secs_f64(secs)
    }
}

impl From<Duration> for SimTime {
    fn from(dur: Duration) -> Self {
        SimTime(dur)
    }
}

impl Debug for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == SimTime::MAX {
            write!(f, "inf")
        } else {
            Debug::fmt(&self.0, f)
        }
    }
}

/// Parses a number of seconds, such as `2.5`.
impl FromStr for SimTime {
    type Err = ParseSimTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseSimTimeError(s.to_string());
        let secs = s.trim().parse::<f64>().map_err(|_| invalid())?;
        SimTime::try_from_secs_f64(secs).ok_or_else(invalid)
    }
}

/// A string that does not describe a representable point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSimTimeError(String);

impl Display for ParseSimTimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid time '{}', expected a non-negative number of seconds",
            self.0
        )
    }
}

impl Error for ParseSimTimeError {}
