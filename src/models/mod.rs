//! Models module for rhythm generation
//!
//! This module contains the exact-duration arithmetic, the notation
//! component tree the makers build, provenance tags and meters.

pub mod components;
pub mod duration;
pub mod meter;
pub mod tag;

// Re-export commonly used types
pub use components::*;
pub use duration::Duration;
pub use meter::{Meter, MeterNode, Staff, TimeSignature};
pub use tag::Tag;
