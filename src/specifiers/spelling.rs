//! Spelling: how durations split into notated leaves

use serde::{Deserialize, Serialize};

use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};

/// Forbidden-duration ceilings and split direction
///
/// Any leaf whose written duration would reach or exceed a forbidden
/// duration is split into smaller tied (or adjacent, for rests) leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Spelling {
    pub forbidden_note_duration: Option<Duration>,
    pub forbidden_rest_duration: Option<Duration>,
    pub increase_monotonic: bool,
}

impl Spelling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forbid_notes(mut self, duration: Duration) -> Self {
        self.forbidden_note_duration = Some(duration);
        self
    }

    pub fn forbid_rests(mut self, duration: Duration) -> Self {
        self.forbidden_rest_duration = Some(duration);
        self
    }

    pub fn increase_monotonic(mut self, increase_monotonic: bool) -> Self {
        self.increase_monotonic = increase_monotonic;
        self
    }

    /// Forbidden durations must be of the form 1/2^k
    pub fn validate(&self) -> Result<()> {
        for forbidden in [self.forbidden_note_duration, self.forbidden_rest_duration]
            .into_iter()
            .flatten()
        {
            if forbidden <= duration::zero() {
                return Err(RhythmError::non_positive("forbidden duration", forbidden));
            }
            if *forbidden.numer() != 1 || !duration::is_dyadic(forbidden) {
                return Err(RhythmError::invalid_count(
                    *forbidden.numer(),
                    format!("forbidden duration {}", forbidden),
                ));
            }
        }
        Ok(())
    }

    /// Ceiling that applies to leaves of the given kind
    pub fn forbidden_duration(&self, is_note: bool) -> Option<Duration> {
        if is_note {
            self.forbidden_note_duration
        } else {
            self.forbidden_rest_duration
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::duration::duration as d;

    #[test]
    fn test_validate() {
        assert!(Spelling::new().forbid_notes(d(1, 4)).validate().is_ok());
        assert!(Spelling::new().forbid_notes(d(3, 8)).validate().is_err());
        assert!(Spelling::new().forbid_rests(d(1, 3)).validate().is_err());
    }
}
