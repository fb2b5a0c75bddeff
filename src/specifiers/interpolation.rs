//! Interpolation envelope for accelerandi and ritardandi

use serde::{Deserialize, Serialize};

use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};

/// Start, stop and written duration of an accelerando or ritardando
///
/// Durations run from `start_duration` to `stop_duration`; every note is
/// written as `written_duration` with a multiplier carrying its real length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interpolation {
    pub start_duration: Duration,
    pub stop_duration: Duration,
    pub written_duration: Duration,
}

impl Default for Interpolation {
    fn default() -> Self {
        Self {
            start_duration: duration::duration(1, 8),
            stop_duration: duration::duration(1, 16),
            written_duration: duration::duration(1, 16),
        }
    }
}

impl Interpolation {
    pub fn new(start: Duration, stop: Duration, written: Duration) -> Result<Self> {
        let interpolation = Self {
            start_duration: start,
            stop_duration: stop,
            written_duration: written,
        };
        interpolation.validate()?;
        Ok(interpolation)
    }

    /// All three durations must be positive
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("start duration", self.start_duration),
            ("stop duration", self.stop_duration),
            ("written duration", self.written_duration),
        ] {
            if value <= duration::zero() {
                return Err(RhythmError::non_positive(name, value));
            }
        }
        Ok(())
    }

    /// Swap start and stop: accelerando becomes ritardando
    pub fn reverse(&self) -> Self {
        Self {
            start_duration: self.stop_duration,
            stop_duration: self.start_duration,
            written_duration: self.written_duration,
        }
    }

    /// True when notes get shorter from start to stop
    pub fn is_accelerando(&self) -> bool {
        self.stop_duration < self.start_duration
    }
}
