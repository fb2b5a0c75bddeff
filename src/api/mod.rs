//! Rhythm makers WASM API
//!
//! JavaScript-facing entry points. Every export deserializes a JSON-shaped
//! request, runs the matching native `*_request` function and returns
//! `{ lilypond, state }`.
//!
//! # Module Structure
//!
//! - `helpers`: serialization, console logging and error conversion
//! - `types`: request and response shapes
//! - `generate`: one operation per rhythm maker

pub mod helpers;
pub mod types;
pub mod generate;

pub use generate::{
    accelerando_request, even_division_request, generate_accelerando, generate_even_division,
    generate_incised, generate_note, generate_talea, generate_tuplets, incised_request, note_request,
    parse_time_signature, talea_request, tuplets_request,
};
pub use types::{
    AccelerandoRequest, EvenDivisionRequest, IncisedRequest, NoteRequest, OutputOptions, Response,
    TaleaRequest, TupletsRequest,
};
