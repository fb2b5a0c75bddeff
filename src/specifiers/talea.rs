//! Talea: a cyclic pattern of signed counts over a shared denominator
//!
//! Positive counts are notes, negative counts are rests. An optional
//! preamble is read once before the counts start cycling, and optional end
//! counts replace the tail of whatever a maker reads. At most one count may
//! be a fill placeholder (`"+"` for notes, `"-"` for rests) that a maker
//! expands to cover whatever weight the explicit counts leave over.
//!
//! Taleas never mutate: `advance` returns a new talea whose preamble holds
//! the unread remainder of the cycle it stopped in.

use std::convert::TryFrom;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};
use crate::utils::sequence;
use crate::utils::Cyclic;

// ============================================================================
// Counts
// ============================================================================

/// One entry of a talea
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCount", into = "RawCount")]
pub enum Count {
    /// Signed count: positive for notes, negative for rests
    Value(i64),
    /// `"+"`: notes filling the remaining weight
    FillNotes,
    /// `"-"`: rests filling the remaining weight
    FillRests,
}

impl Count {
    pub fn value(&self) -> Option<i64> {
        match self {
            Count::Value(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !matches!(self, Count::Value(_))
    }
}

impl From<i64> for Count {
    fn from(n: i64) -> Self {
        Count::Value(n)
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Count::Value(n) => write!(f, "{}", n),
            Count::FillNotes => write!(f, "+"),
            Count::FillRests => write!(f, "-"),
        }
    }
}

/// JSON shape of a count: an integer or one of "+" / "-"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCount {
    Int(i64),
    Text(String),
}

impl TryFrom<RawCount> for Count {
    type Error = String;

    fn try_from(raw: RawCount) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawCount::Int(n) => Ok(Count::Value(n)),
            RawCount::Text(text) => match text.as_str() {
                "+" => Ok(Count::FillNotes),
                "-" => Ok(Count::FillRests),
                other => Err(format!("unknown talea count {:?}", other)),
            },
        }
    }
}

impl From<Count> for RawCount {
    fn from(count: Count) -> Self {
        match count {
            Count::Value(n) => RawCount::Int(n),
            other => RawCount::Text(other.to_string()),
        }
    }
}

// ============================================================================
// Talea
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTalea")]
pub struct Talea {
    counts: Vec<Count>,
    denominator: i64,
    end_counts: Vec<i64>,
    preamble: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTalea {
    counts: Vec<Count>,
    denominator: i64,
    #[serde(default)]
    end_counts: Vec<i64>,
    #[serde(default)]
    preamble: Vec<i64>,
}

impl TryFrom<RawTalea> for Talea {
    type Error = RhythmError;

    fn try_from(raw: RawTalea) -> Result<Self> {
        Talea::new(raw.counts, raw.denominator)?
            .with_preamble(raw.preamble)?
            .with_end_counts(raw.end_counts)
    }
}

impl Talea {
    /// Create a talea, validating denominator and counts
    pub fn new(counts: Vec<Count>, denominator: i64) -> Result<Self> {
        if !duration::is_positive_power_of_two(denominator) {
            return Err(RhythmError::InvalidDenominator(denominator));
        }
        if counts.is_empty() {
            return Err(RhythmError::invalid_count(0, "empty talea counts"));
        }
        if counts.iter().any(|c| *c == Count::Value(0)) {
            return Err(RhythmError::invalid_count(0, "talea counts"));
        }
        if counts.iter().filter(|c| c.is_placeholder()).count() > 1 {
            return Err(RhythmError::UnsupportedPlaceholder(
                "add a second placeholder to".to_string(),
            ));
        }
        Ok(Self {
            counts,
            denominator,
            end_counts: Vec::new(),
            preamble: Vec::new(),
        })
    }

    /// Talea with integer counts only
    pub fn from_counts(counts: &[i64], denominator: i64) -> Result<Self> {
        Self::new(counts.iter().map(|&n| Count::Value(n)).collect(), denominator)
    }

    pub fn with_preamble(mut self, preamble: Vec<i64>) -> Result<Self> {
        if preamble.contains(&0) {
            return Err(RhythmError::invalid_count(0, "talea preamble"));
        }
        if !preamble.is_empty() && self.has_placeholder() {
            return Err(RhythmError::FillPlaceholderWithPreamble);
        }
        self.preamble = preamble;
        Ok(self)
    }

    pub fn with_end_counts(mut self, end_counts: Vec<i64>) -> Result<Self> {
        if end_counts.contains(&0) {
            return Err(RhythmError::invalid_count(0, "talea end counts"));
        }
        self.end_counts = end_counts;
        Ok(self)
    }

    pub fn counts(&self) -> &[Count] {
        &self.counts
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn end_counts(&self) -> &[i64] {
        &self.end_counts
    }

    pub fn preamble(&self) -> &[i64] {
        &self.preamble
    }

    /// Number of counts, preamble excluded
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn has_placeholder(&self) -> bool {
        self.counts.iter().any(Count::is_placeholder)
    }

    /// Counts as integers; fails on a placeholder
    pub fn integer_counts(&self, operation: &str) -> Result<Vec<i64>> {
        self.counts
            .iter()
            .map(|c| {
                c.value()
                    .ok_or_else(|| RhythmError::UnsupportedPlaceholder(operation.to_string()))
            })
            .collect()
    }

    /// Weight of one cycle of counts; undefined with a placeholder
    pub fn period(&self) -> Result<i64> {
        Ok(sequence::weight(&self.integer_counts("compute the period of")?))
    }

    /// True when `position` lands on a count boundary
    ///
    /// Positions are cumulative weights counted from 1. The preamble
    /// boundaries are checked first; after the preamble, positions are
    /// reduced modulo the period.
    pub fn contains(&self, position: i64) -> Result<bool> {
        if position <= 0 {
            return Err(RhythmError::invalid_count(position, "talea position"));
        }
        let mut preamble_weight = 0;
        for count in &self.preamble {
            preamble_weight += count.abs();
            if preamble_weight == position {
                return Ok(true);
            }
        }
        let counts = self.integer_counts("test membership in")?;
        let period = sequence::weight(&counts);
        let position = (position - preamble_weight).rem_euclid(period);
        let mut boundary = 0;
        for count in &counts {
            if boundary == position {
                return Ok(true);
            }
            boundary += count.abs();
        }
        Ok(false)
    }

    /// Talea with `weight` consumed from the front
    ///
    /// Weight comes off the preamble first, then off as many repetitions of
    /// the counts as needed. Whatever is left of the last repetition becomes
    /// the new preamble; counts and end counts are unchanged.
    pub fn advance(&self, weight: i64) -> Result<Talea> {
        if weight < 0 {
            return Err(RhythmError::NegativeWeight(weight));
        }
        if weight == 0 {
            return Ok(self.clone());
        }
        let preamble_weight = sequence::weight(&self.preamble);
        let preamble = if weight < preamble_weight {
            remainder_after(&self.preamble, weight)
        } else if weight == preamble_weight {
            Vec::new()
        } else {
            let counts = self.integer_counts("advance")?;
            let period = sequence::weight(&counts);
            let excess = weight - preamble_weight;
            let cycles = (excess + period - 1) / period;
            let repeated: Vec<i64> = counts
                .iter()
                .copied()
                .cycle()
                .take(counts.len() * cycles as usize)
                .collect();
            remainder_after(&repeated, excess)
        };
        Ok(Talea {
            counts: self.counts.clone(),
            denominator: self.denominator,
            end_counts: self.end_counts.clone(),
            preamble,
        })
    }

    /// `(count, denominator)` at index `i` of the endless preamble + counts cycle
    pub fn get(&self, i: i64) -> (Count, i64) {
        let cycle = self.cycle();
        let count = cycle.get(i).copied().unwrap_or(Count::Value(0));
        (count, self.denominator)
    }

    /// `(count, denominator)` pairs for indices `start..stop`
    pub fn slice(&self, start: i64, stop: i64) -> Vec<(Count, i64)> {
        self.cycle()
            .slice(start, stop)
            .into_iter()
            .map(|count| (count, self.denominator))
            .collect()
    }

    /// Preamble then one cycle of counts, as durations
    pub fn durations(&self) -> Result<Vec<Duration>> {
        let counts = self.integer_counts("iterate")?;
        Ok(self
            .preamble
            .iter()
            .chain(counts.iter())
            .map(|&n| duration::duration(n, self.denominator))
            .collect())
    }

    fn cycle(&self) -> Cyclic<Count> {
        let items = self
            .preamble
            .iter()
            .map(|&n| Count::Value(n))
            .chain(self.counts.iter().copied())
            .collect();
        Cyclic::new(items)
    }
}

/// Items left after cutting `weight` off the front of `items`
fn remainder_after(items: &[i64], weight: i64) -> Vec<i64> {
    let mut parts = sequence::split_by_weights(items, &[weight], false, true);
    if parts.len() > 1 {
        parts.pop().unwrap_or_default()
    } else {
        Vec::new()
    }
}
