//! Error types for rhythm generation
//!
//! Three kinds of failure exist. Precondition violations (malformed input)
//! are reported as soon as a value is constructed or a maker is called.
//! Structural impossibilities (a talea that is too short, end counts that do
//! not fit) are expected conditions a caller may recover from. Internal
//! errors indicate a bug in this crate and should never be seen.
//!
//! Every maker is all-or-nothing: an error means no partial result.

use thiserror::Error;

use crate::models::Duration;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, RhythmError>;

/// Top-level error type for rhythm makers and rewrite commands
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RhythmError {
    // ------------------------------------------------------------------
    // Precondition violations
    // ------------------------------------------------------------------
    /// Denominator is not a (positive) power of two
    #[error("Denominator {0} must be a positive power of two")]
    InvalidDenominator(i64),

    /// A count list contains a value it may not contain (e.g. zero)
    #[error("Invalid count {count} in {context}")]
    InvalidCount { count: i64, context: String },

    /// `Talea::advance` was asked to consume a negative weight
    #[error("Weight {0} must be nonnegative")]
    NegativeWeight(i64),

    /// A duration that must be positive is not
    #[error("{context} must be positive, got {duration}")]
    NonPositiveDuration { context: String, duration: Duration },

    /// A duration whose denominator is not a power of two where one is required
    #[error("Nondyadic durations not implemented: {0}")]
    NonDyadicDuration(Duration),

    /// Prefix or suffix talea supplied without matching counts
    #[error("{0} talea requires nonempty {0} counts")]
    MissingCounts(String),

    /// Proportion is empty or contains zero
    #[error("Invalid proportion {0:?}")]
    InvalidProportion(Vec<i64>),

    /// Fill placeholder ('+' or '-') combined with a preamble
    #[error("Talea with a fill placeholder can not also have a preamble")]
    FillPlaceholderWithPreamble,

    /// Operation is undefined for taleas with a fill placeholder
    #[error("Can not {0} a talea containing a fill placeholder")]
    UnsupportedPlaceholder(String),

    /// Music and split durations disagree
    #[error("Total duration of splits is {expected} but duration of music is {actual}")]
    DurationMismatch { expected: Duration, actual: Duration },

    /// Time signature is malformed
    #[error("Invalid time signature {0}/{1}")]
    InvalidTimeSignature(i64, i64),

    /// Leaf selection is out of range or empty
    #[error("Invalid selection {start}..{stop} of {length} leaves")]
    InvalidSelection {
        start: usize,
        stop: usize,
        length: usize,
    },

    /// A textual duration such as "3/8" could not be parsed
    #[error("Can not parse duration {0:?}")]
    DurationParse(String),

    // ------------------------------------------------------------------
    // Structural impossibilities
    // ------------------------------------------------------------------
    /// `read_talea_once_only` requested but preamble + talea is too short
    #[error("{available} (preamble + talea weight) is too short to read {required} once")]
    TaleaTooShort { available: i64, required: i64 },

    /// End counts weigh more than everything read from the talea
    #[error("End counts weight {end_weight} exceeds talea weight read {read_weight}")]
    EndCountsTooLong { end_weight: i64, read_weight: i64 },

    /// End counts straddle a target boundary
    #[error("End counts {0:?} do not partition exactly into the target durations")]
    EndCountsMisaligned(Vec<i64>),

    /// Explicit counts already exceed the weight the fill placeholder must cover
    #[error("Fill placeholder would have weight {0}")]
    FillUnderflow(i64),

    /// An accelerando target too short for its notes on the rounding grid
    #[error("Accelerando of {notes} notes of at least {grid} each does not fit in {target}")]
    AccelerandoTooShort {
        target: Duration,
        notes: usize,
        grid: Duration,
    },

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------
    /// A LilyPond template failed to compile or render
    #[error("Template rendering failed: {0}")]
    Template(String),

    // ------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------
    /// Broken internal invariant (a bug in this crate)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RhythmError {
    /// Shorthand for an invalid-count error
    pub fn invalid_count(count: i64, context: impl Into<String>) -> Self {
        RhythmError::InvalidCount {
            count,
            context: context.into(),
        }
    }

    /// Shorthand for a non-positive duration error
    pub fn non_positive(context: impl Into<String>, duration: Duration) -> Self {
        RhythmError::NonPositiveDuration {
            context: context.into(),
            duration,
        }
    }
}
