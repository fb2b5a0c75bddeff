//! Renderers module for rhythm makers
//!
//! Converts component trees into textual notation formats.

pub mod lilypond;

// Re-export commonly used types
pub use lilypond::{generate_lilypond_document, LilyPondSettings};
