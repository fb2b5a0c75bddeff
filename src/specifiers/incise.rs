//! Incise: prefix/suffix carving for incised rhythms

use serde::{Deserialize, Serialize};

use crate::error::{Result, RhythmError};
use crate::models::duration;

/// Shape of an incised rhythm
///
/// Each target duration becomes `prefix + middle + suffix`. Prefixes and
/// suffixes are read from their own signed taleas, `prefix_counts[i]`
/// (`suffix_counts[i]`) entries for target `i`. The middle is divided by
/// `body_proportion`, left whole when that is `None`, or filled with a rest.
///
/// `talea_denominator` has no default; every other field does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Incise {
    pub talea_denominator: i64,
    #[serde(default = "whole_body")]
    pub body_proportion: Option<Vec<i64>>,
    #[serde(default)]
    pub fill_with_rests: bool,
    #[serde(default)]
    pub outer_tuplets_only: bool,
    #[serde(default)]
    pub prefix_counts: Vec<usize>,
    #[serde(default)]
    pub prefix_talea: Vec<i64>,
    #[serde(default)]
    pub suffix_counts: Vec<usize>,
    #[serde(default)]
    pub suffix_talea: Vec<i64>,
}

fn whole_body() -> Option<Vec<i64>> {
    Some(vec![1])
}

impl Incise {
    pub fn new(talea_denominator: i64) -> Result<Self> {
        let incise = Self {
            talea_denominator,
            body_proportion: whole_body(),
            fill_with_rests: false,
            outer_tuplets_only: false,
            prefix_counts: Vec::new(),
            prefix_talea: Vec::new(),
            suffix_counts: Vec::new(),
            suffix_talea: Vec::new(),
        };
        incise.validate()?;
        Ok(incise)
    }

    pub fn prefix(mut self, talea: Vec<i64>, counts: Vec<usize>) -> Self {
        self.prefix_talea = talea;
        self.prefix_counts = counts;
        self
    }

    pub fn suffix(mut self, talea: Vec<i64>, counts: Vec<usize>) -> Self {
        self.suffix_talea = talea;
        self.suffix_counts = counts;
        self
    }

    pub fn body_proportion(mut self, proportion: Option<Vec<i64>>) -> Self {
        self.body_proportion = proportion;
        self
    }

    pub fn fill_with_rests(mut self, fill_with_rests: bool) -> Self {
        self.fill_with_rests = fill_with_rests;
        self
    }

    pub fn outer_tuplets_only(mut self, outer_tuplets_only: bool) -> Self {
        self.outer_tuplets_only = outer_tuplets_only;
        self
    }

    /// Check the invariants a maker relies on
    pub fn validate(&self) -> Result<()> {
        if !duration::is_positive_power_of_two(self.talea_denominator) {
            return Err(RhythmError::InvalidDenominator(self.talea_denominator));
        }
        if !self.prefix_talea.is_empty() && self.prefix_counts.is_empty() {
            return Err(RhythmError::MissingCounts("prefix".to_string()));
        }
        if !self.suffix_talea.is_empty() && self.suffix_counts.is_empty() {
            return Err(RhythmError::MissingCounts("suffix".to_string()));
        }
        if let Some(proportion) = &self.body_proportion {
            if proportion.is_empty() || proportion.contains(&0) {
                return Err(RhythmError::InvalidProportion(proportion.clone()));
            }
        }
        Ok(())
    }
}
