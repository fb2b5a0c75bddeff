//! Specifiers: immutable configuration records for the makers

pub mod incise;
pub mod interpolation;
pub mod spelling;
pub mod state;
pub mod talea;

pub use incise::Incise;
pub use interpolation::Interpolation;
pub use spelling::Spelling;
pub use state::State;
pub use talea::{Count, Talea};
