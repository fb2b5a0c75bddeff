//! Rhythm makers
//!
//! Each maker turns a list of target durations into tuplets (or leaves)
//! lasting exactly those durations. Stateful makers take the previous call's
//! `State` in their options and return the next one alongside the music.

pub mod accelerando;
pub mod even_division;
pub mod incised;
pub mod leaves;
pub mod multiplied_duration;
pub mod note;
pub mod talea;
pub mod tuplet;

pub use accelerando::{accelerando, interpolate_divide, AccelerandoOptions, Division, Exponent};
pub use even_division::{even_division, EvenDivisionOptions};
pub use incised::{incised, IncisedOptions};
pub use leaves::{make_components, make_leaves, make_tuplet, package_tuplets};
pub use multiplied_duration::multiplied_duration;
pub use note::note;
pub use talea::{talea, TaleaOptions};
pub use tuplet::tuplet;

use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};
use crate::models::{Component, Tuplet};

/// Every target duration must be positive
pub(crate) fn check_durations(durations: &[Duration]) -> Result<()> {
    match durations.iter().find(|&&d| d <= duration::zero()) {
        Some(&bad) => Err(RhythmError::non_positive("target duration", bad)),
        None => Ok(()),
    }
}

/// Targets rescaled to a shared denominator that `talea_denominator` divides
///
/// Returns the scaled numerators, the shared denominator and the factor that
/// turns talea counts into scaled units.
pub(crate) fn scale_durations(durations: &[Duration], talea_denominator: i64) -> (Vec<i64>, i64, i64) {
    let lcd = durations
        .iter()
        .fold(talea_denominator, |acc, d| duration::lcm(acc, *d.denom()));
    let numerators = durations
        .iter()
        .map(|d| d.numer() * (lcd / d.denom()))
        .collect();
    (numerators, lcd, lcd / talea_denominator)
}

/// Normalize the ratio of `tuplet` and of every tuplet nested in it
pub(crate) fn normalize_nested(tuplet: &mut Tuplet) {
    tuplet.normalize_ratio();
    for component in tuplet.components.iter_mut() {
        if let Component::Tuplet(inner) = component {
            normalize_nested(inner);
        }
    }
}
