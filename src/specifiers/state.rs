//! Generator state threaded between successive maker calls
//!
//! Each maker reads the previous call's state and returns a fresh one.
//! Fields serialize in alphabetical order; keys a maker never writes are
//! omitted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
    /// Target durations processed so far; rotates per-target parameter cycles
    pub durations_consumed: i64,
    /// The last note did not end on a talea boundary
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub incomplete_last_note: bool,
    pub logical_ties_produced: i64,
    /// Talea weight read so far, in units of the talea denominator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub talea_weight_consumed: Option<i64>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// State after a call that consumed `durations` targets and produced
    /// `logical_ties` logical ties
    ///
    /// An incomplete last note in the previous call continues into this one,
    /// so its logical tie is not counted twice.
    pub fn next(&self, durations: usize, logical_ties: usize) -> Self {
        let mut logical_ties_produced = self.logical_ties_produced + logical_ties as i64;
        if self.incomplete_last_note {
            logical_ties_produced -= 1;
        }
        Self {
            durations_consumed: self.durations_consumed + durations as i64,
            incomplete_last_note: false,
            logical_ties_produced,
            talea_weight_consumed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_state() {
        let previous = State {
            durations_consumed: 2,
            incomplete_last_note: true,
            logical_ties_produced: 7,
            talea_weight_consumed: Some(12),
        };
        let next = previous.next(3, 5);
        assert_eq!(next.durations_consumed, 5);
        assert_eq!(next.logical_ties_produced, 11);
        assert!(!next.incomplete_last_note);
    }

    #[test]
    fn test_sorted_keys_and_omission() {
        let state = State::new().next(2, 4);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"durations_consumed":2,"logical_ties_produced":4}"#);

        let state = State {
            incomplete_last_note: true,
            talea_weight_consumed: Some(9),
            ..state
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"{"durations_consumed":2,"incomplete_last_note":true,"logical_ties_produced":4,"talea_weight_consumed":9}"#
        );
        let back: State = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert_eq!(serde_json::from_str::<State>("{}").unwrap(), State::new());
    }
}
