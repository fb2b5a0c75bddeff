//! Request and response types for the WASM API
//!
//! Requests arrive as plain JSON objects. Target durations and time
//! signatures are `"n/d"` strings; maker options use the serde shapes of
//! their native types, so a duration inside options is a `[n, d]` pair.

use serde::{Deserialize, Serialize};

use crate::makers::{AccelerandoOptions, EvenDivisionOptions, IncisedOptions, TaleaOptions};
use crate::renderers::lilypond::LilyPondSettings;
use crate::specifiers::{Count, Incise, Spelling, State};

/// Post-processing and rendering shared by every request
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct OutputOptions {
    /// One per measure; empty means one measure per target duration
    pub time_signatures: Vec<String>,
    /// Beam the leaves of each top-level tuplet
    pub beam: bool,
    pub rewrite_rest_filled_tuplets: bool,
    pub extract_trivial_tuplets: bool,
    /// Tuplet numbers show the tuplet's duration as a rhythm
    pub tuplet_number_durations: bool,
    /// Augmented, nondyadic and 1:1 tuplets show their full ratio
    pub tuplet_number_fractions: bool,
    pub hide_trivial_tuplets: bool,
    pub rewrite_meter: bool,
    pub lilypond: LilyPondSettings,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TaleaRequest {
    pub durations: Vec<String>,
    pub counts: Vec<Count>,
    pub denominator: i64,
    #[serde(default)]
    pub options: TaleaOptions,
    #[serde(default)]
    pub output: OutputOptions,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EvenDivisionRequest {
    pub durations: Vec<String>,
    pub denominators: Vec<i64>,
    #[serde(default)]
    pub options: EvenDivisionOptions,
    #[serde(default)]
    pub output: OutputOptions,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IncisedRequest {
    pub durations: Vec<String>,
    pub incise: Incise,
    #[serde(default)]
    pub options: IncisedOptions,
    #[serde(default)]
    pub output: OutputOptions,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccelerandoRequest {
    pub durations: Vec<String>,
    #[serde(default)]
    pub options: AccelerandoOptions,
    #[serde(default)]
    pub output: OutputOptions,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NoteRequest {
    pub durations: Vec<String>,
    #[serde(default)]
    pub spelling: Spelling,
    #[serde(default)]
    pub output: OutputOptions,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TupletsRequest {
    pub durations: Vec<String>,
    pub proportions: Vec<Vec<i64>>,
    #[serde(default)]
    pub output: OutputOptions,
}

/// Rendered document plus the state to pass to the next call
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Response {
    pub lilypond: String,
    /// Absent for stateless makers
    pub state: Option<State>,
}
