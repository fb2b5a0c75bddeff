//! Utility modules for rhythm generation
//!
//! This module contains weight-based sequence helpers and the cyclic
//! sequence wrapper used by the makers.

pub mod cyclic;
pub mod sequence;

// Re-export commonly used types
pub use cyclic::Cyclic;
pub use sequence::PartWeights;
