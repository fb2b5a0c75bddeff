//! Accelerando rhythm maker
//!
//! Notes are all written with the interpolation's written duration; their
//! real lengths come from multipliers. The lengths are sampled from a curve
//! running from the start duration to the stop duration, rescaled in floating
//! point to fill the target, rounded to 1/1024, and the last multiplier is then
//! solved exactly so the tuplet lasts precisely the target duration.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::check_durations;
use super::leaves::make_leaves;
use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};
use crate::models::{logical_tie_count, Component, Leaf, LeafKind, Multiplier, Tag, Tuplet};
use crate::specifiers::{Interpolation, Spelling, State};
use crate::utils::{sequence, Cyclic};

/// Denominator durations are rounded to before the exact correction
const ROUNDING_DENOMINATOR: i64 = 1024;

/// Shape of the interpolation curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Exponent {
    Cosine,
    /// `y1 * (1 - mu^e) + y2 * mu^e`; above 1 lingers near the start value
    Power(f64),
}

impl Default for Exponent {
    fn default() -> Self {
        Exponent::Cosine
    }
}

/// Result of `interpolate_divide`
#[derive(Debug, Clone, PartialEq)]
pub enum Division {
    /// Floating-point durations summing to the total
    Durations(Vec<f64>),
    /// The total is shorter than start + stop
    TooSmall,
}

/// Keyword options of `accelerando`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelerandoOptions {
    /// Read cyclically, one per target; empty means the default interpolation
    pub interpolations: Vec<Interpolation>,
    pub exponent: Exponent,
    pub previous_state: State,
    pub spelling: Spelling,
    pub tag: Tag,
}

/// One accelerando (or ritardando) tuplet per duration
pub fn accelerando(durations: &[Duration], options: &AccelerandoOptions) -> Result<(Vec<Tuplet>, State)> {
    check_durations(durations)?;
    options.spelling.validate()?;
    for interpolation in &options.interpolations {
        interpolation.validate()?;
    }
    let tag = options.tag.append_function("accelerando");
    let interpolations = if options.interpolations.is_empty() {
        vec![Interpolation::default()]
    } else {
        options.interpolations.clone()
    };
    let interpolations = Cyclic::new(sequence::rotate(
        &interpolations,
        -options.previous_state.durations_consumed,
    ));

    let mut tuplets = Vec::with_capacity(durations.len());
    for (i, &target) in durations.iter().enumerate() {
        let interpolation = interpolations.get(i as i64).copied().unwrap_or_default();
        tuplets.push(make_accelerando(target, &interpolation, options, &tag)?);
    }
    let state = options
        .previous_state
        .next(durations.len(), logical_tie_count(&tuplets));
    log::debug!("accelerando: {} tuplets", tuplets.len());
    Ok((tuplets, state))
}

fn make_accelerando(
    target: Duration,
    interpolation: &Interpolation,
    options: &AccelerandoOptions,
    tag: &Tag,
) -> Result<Tuplet> {
    let floats = match interpolate_divide(
        target,
        interpolation.start_duration,
        interpolation.stop_duration,
        options.exponent,
    )? {
        Division::Durations(floats) => floats,
        Division::TooSmall => {
            log::trace!("accelerando: {} too small to interpolate", target);
            let components = make_leaves(target, LeafKind::Note, &options.spelling, tag);
            return Ok(Tuplet::trivial(components).with_tag(tag.clone()));
        }
    };
    let written = interpolation.written_duration;
    let mut notes: Vec<Leaf> = floats
        .iter()
        .map(|&value| {
            let numerator = ((value * ROUNDING_DENOMINATOR as f64).round() as i64).max(1);
            let rounded = duration::duration(numerator, ROUNDING_DENOMINATOR);
            Leaf::note(written)
                .with_multiplier(Multiplier::from_duration(rounded / written))
                .with_tag(tag.clone())
        })
        .collect();
    fix_rounding_error(&mut notes, target, written)?;
    let mut tuplet = Tuplet::trivial(notes.into_iter().map(Component::from).collect()).with_tag(tag.clone());
    tuplet.feather_beam = true;
    Ok(tuplet)
}

/// Solve the last note's multiplier so the notes last exactly `target`
///
/// When the other notes already reach the target, the excess is taken
/// from the longest notes first, none going below one grid unit.
fn fix_rounding_error(notes: &mut [Leaf], target: Duration, written: Duration) -> Result<()> {
    let total = duration::sum(notes.iter().map(Leaf::duration));
    if total == target {
        return Ok(());
    }
    let (last, rest) = match notes.split_last_mut() {
        Some(split) => split,
        None => return Err(RhythmError::Internal("accelerando without notes".to_string())),
    };
    let needed = target - duration::sum(rest.iter().map(Leaf::duration));
    if needed > duration::zero() {
        last.multiplier = Some(Multiplier::from_duration(needed / written));
        return Ok(());
    }
    rebalance(notes, total - target, written)
}

fn rebalance(notes: &mut [Leaf], mut excess: Duration, written: Duration) -> Result<()> {
    let grid = duration::duration(1, ROUNDING_DENOMINATOR);
    let target = duration::sum(notes.iter().map(Leaf::duration)) - excess;
    let mut order: Vec<usize> = (0..notes.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(notes[i].duration()));
    for i in order {
        if excess == duration::zero() {
            break;
        }
        let current = notes[i].duration();
        let taken = (current - grid).min(excess);
        if taken <= duration::zero() {
            continue;
        }
        notes[i].multiplier = Some(Multiplier::from_duration((current - taken) / written));
        excess -= taken;
    }
    if excess > duration::zero() {
        return Err(RhythmError::AccelerandoTooShort {
            target,
            notes: notes.len(),
            grid,
        });
    }
    log::trace!("accelerando: rebalanced {} notes into {}", notes.len(), target);
    Ok(())
}

/// Divide `total` into durations interpolated from `start` to `stop`
///
/// The curve is sampled at the running sum's position within the total
/// until the total is reached; the samples are then scaled to sum to the
/// total.
pub fn interpolate_divide(
    total: Duration,
    start: Duration,
    stop: Duration,
    exponent: Exponent,
) -> Result<Division> {
    if total <= duration::zero() {
        return Err(RhythmError::non_positive("total duration", total));
    }
    if start <= duration::zero() {
        return Err(RhythmError::non_positive("start duration", start));
    }
    if stop <= duration::zero() {
        return Err(RhythmError::non_positive("stop duration", stop));
    }
    if total < start + stop {
        return Ok(Division::TooSmall);
    }
    let total = duration::to_f64(total);
    let (y1, y2) = (duration::to_f64(start), duration::to_f64(stop));
    let mut durations = Vec::new();
    let mut partial_sum = 0.0;
    while partial_sum < total {
        let mu = partial_sum / total;
        let value = match exponent {
            Exponent::Cosine => interpolate_cosine(y1, y2, mu),
            Exponent::Power(e) => interpolate_exponential(y1, y2, mu, e),
        };
        durations.push(value);
        partial_sum += value;
    }
    let sum: f64 = durations.iter().sum();
    Ok(Division::Durations(
        durations.into_iter().map(|d| d * total / sum).collect(),
    ))
}

fn interpolate_cosine(y1: f64, y2: f64, mu: f64) -> f64 {
    let mu2 = (1.0 - (mu * PI).cos()) / 2.0;
    y1 * (1.0 - mu2) + y2 * mu2
}

fn interpolate_exponential(y1: f64, y2: f64, mu: f64, exponent: f64) -> f64 {
    let weight = mu.powf(exponent);
    y1 * (1.0 - weight) + y2 * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::duration::duration as d;

    fn floats(division: Division) -> Vec<f64> {
        match division {
            Division::Durations(values) => values,
            Division::TooSmall => panic!("expected durations"),
        }
    }

    #[test]
    fn test_interpolate_divide_linear() {
        let values = floats(
            interpolate_divide(d(10, 1), d(1, 1), d(1, 1), Exponent::Power(1.0)).unwrap(),
        );
        assert_eq!(values.len(), 10);
        assert!(values.iter().all(|v| (v - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_interpolate_divide_cosine() {
        let values =
            floats(interpolate_divide(d(10, 1), d(5, 1), d(1, 1), Exponent::Cosine).unwrap());
        assert_eq!(values.len(), 4);
        assert!((values[0] - 4.798).abs() < 1e-3);
        assert!((values.iter().sum::<f64>() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_divide_edges() {
        assert_eq!(
            interpolate_divide(d(1, 8), d(1, 8), d(1, 16), Exponent::Cosine).unwrap(),
            Division::TooSmall
        );
        assert!(interpolate_divide(d(0, 1), d(1, 8), d(1, 16), Exponent::Cosine).is_err());
        assert!(interpolate_divide(d(1, 2), d(-1, 8), d(1, 16), Exponent::Cosine).is_err());
    }

    #[test]
    fn test_interpolate_exponential() {
        assert!((interpolate_exponential(100.0, 200.0, 0.25, 2.0) - 106.25).abs() < 1e-9);
        assert!((interpolate_exponential(100.0, 200.0, 0.5, 1.0) - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_accelerando_is_exact() {
        let targets = [d(4, 8), d(3, 8), d(5, 16)];
        let (tuplets, state) = accelerando(&targets, &AccelerandoOptions::default()).unwrap();
        for (tuplet, target) in tuplets.iter().zip(targets) {
            assert_eq!(tuplet.duration(), target);
            assert!(tuplet.is_trivial());
            assert!(tuplet.feather_beam);
            assert!(tuplet.leaves().iter().all(|l| l.written_duration == d(1, 16)));
        }
        assert_eq!(state.durations_consumed, 3);
    }

    #[test]
    fn test_too_small_is_plain_note() {
        let (tuplets, _) = accelerando(&[d(1, 8)], &AccelerandoOptions::default()).unwrap();
        let leaves = tuplets[0].leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].written_duration, d(1, 8));
        assert!(leaves[0].multiplier.is_none());
        assert!(!tuplets[0].feather_beam);
    }

    #[test]
    fn test_interpolations_rotate_with_state() {
        let options = AccelerandoOptions {
            interpolations: vec![
                Interpolation::default(),
                Interpolation::default().reverse(),
            ],
            previous_state: State {
                durations_consumed: 1,
                ..State::default()
            },
            ..AccelerandoOptions::default()
        };
        let (tuplets, _) = accelerando(&[d(1, 2)], &options).unwrap();
        let leaves = tuplets[0].leaves();
        // Ritardando: the first note is the shortest
        assert!(leaves[0].duration() < leaves[leaves.len() - 1].duration());
    }

    fn multiplied(values: &[Duration], written: Duration) -> Vec<Leaf> {
        values
            .iter()
            .map(|&value| Leaf::note(written).with_multiplier(Multiplier::from_duration(value / written)))
            .collect()
    }

    #[test]
    fn test_rounding_excess_taken_from_longest_notes() {
        let mut notes = multiplied(&[d(1, 4), d(1, 4), d(1, 1024)], d(1, 16));
        fix_rounding_error(&mut notes, d(1, 4), d(1, 16)).unwrap();
        let durations: Vec<Duration> = notes.iter().map(Leaf::duration).collect();
        assert_eq!(durations, vec![d(1, 1024), d(254, 1024), d(1, 1024)]);
        assert!(notes.iter().all(|note| note.written_duration == d(1, 16)));
    }

    #[test]
    fn test_rounding_excess_too_large_for_grid() {
        let mut notes = multiplied(&[d(1, 1024), d(1, 1024)], d(1, 16));
        assert_eq!(
            fix_rounding_error(&mut notes, d(1, 2048), d(1, 16)),
            Err(RhythmError::AccelerandoTooShort {
                target: d(1, 2048),
                notes: 2,
                grid: d(1, 1024),
            })
        );
    }
}
