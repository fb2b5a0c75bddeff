//! Rhythm Makers
//!
//! Builds rhythmic material from target durations: taleas, incised
//! figures, even divisions, accelerandi and plain notes, plus the rewrite
//! passes that clean up the resulting tuplets, ties and beams. Output is a
//! notation tree that renders to LilyPond. The crate also compiles to a
//! WASM module exposing each maker to JavaScript.

pub mod error;
pub mod models;
pub mod utils;
pub mod specifiers;
pub mod makers;
pub mod commands;
pub mod renderers;
pub mod api;

// Re-export commonly used types
pub use error::{Result, RhythmError};
pub use models::{Component, Duration, Leaf, LeafKind, Staff, Tag, TimeSignature, Tuplet, Voice};
pub use specifiers::{Count, Incise, Interpolation, Spelling, State, Talea};

#[cfg(all(feature = "console_log", feature = "console_error_panic_hook"))]
use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[cfg(all(feature = "console_log", feature = "console_error_panic_hook"))]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    // A logger may already be installed by the host page
    let _ = console_log::init_with_level(log::Level::Debug);

    log::info!("Rhythm makers WASM module initialized");
}
