//! Call rates and period arithmetic for the scheduler
//!
//! Threaded systems run on their own timer at a rate given in Hz; the tick
//! loop paces itself the same way.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default rate for threaded systems and the tick loop (144 Hz, ~6.94ms).
pub const DEFAULT_CALL_RATE_HZ: f64 = 144.0;

/// Invocations per second. Always finite and greater than zero once
/// constructed through [`CallRate::new`].
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CallRate(f64);

#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
#[error("call rate must be a finite number of invocations per second above zero, got {0}")]
pub struct InvalidCallRate(pub f64);

impl CallRate {
    pub fn new(hz: f64) -> Result<Self, InvalidCallRate> {
        if hz.is_finite() && hz > 0.0 {
            Ok(Self(hz))
        } else {
            Err(InvalidCallRate(hz))
        }
    }

    #[inline]
    pub fn hz(self) -> f64 {
        self.0
    }

    /// Time between invocation starts.
    pub fn period(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0)
    }
}

impl Default for CallRate {
    fn default() -> Self {
        Self(DEFAULT_CALL_RATE_HZ)
    }
}

impl TryFrom<f64> for CallRate {
    type Error = InvalidCallRate;

    fn try_from(hz: f64) -> Result<Self, Self::Error> {
        Self::new(hz)
    }
}

impl From<CallRate> for f64 {
    fn from(rate: CallRate) -> Self {
        rate.0
    }
}

impl fmt::Display for CallRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz", self.0)
    }
}
