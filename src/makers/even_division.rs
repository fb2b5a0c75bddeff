//! Even-division rhythm maker
//!
//! Fills each target with equal notes of `1/denominator`, plus or minus a
//! per-target number of extra notes. The tuplet ratio is written with the
//! note count as its numerator, so seven sixteenths in 3/8 read 7:6.

use serde::{Deserialize, Serialize};

use super::check_durations;
use super::leaves::make_leaves;
use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};
use crate::models::{logical_tie_count, Component, Leaf, LeafKind, Tag, Tuplet, TupletRatio};
use crate::specifiers::{Spelling, State};
use crate::utils::{sequence, Cyclic};

/// Keyword options of `even_division`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvenDivisionOptions {
    pub extra_counts: Vec<i64>,
    pub previous_state: State,
    pub spelling: Spelling,
    pub tag: Tag,
}

/// One even-division tuplet per duration
///
/// `denominators` and extra counts are read cyclically, starting where the
/// previous call left off.
pub fn even_division(
    durations: &[Duration],
    denominators: &[i64],
    options: &EvenDivisionOptions,
) -> Result<(Vec<Tuplet>, State)> {
    check_durations(durations)?;
    options.spelling.validate()?;
    if denominators.is_empty() {
        return Err(RhythmError::invalid_count(0, "empty denominators"));
    }
    if let Some(&bad) = denominators
        .iter()
        .find(|&&d| !duration::is_positive_power_of_two(d))
    {
        return Err(RhythmError::InvalidDenominator(bad));
    }
    let tag = options.tag.append_function("even_division");
    let consumed = options.previous_state.durations_consumed;
    let denominators = Cyclic::new(sequence::rotate(denominators, -consumed));
    let extra_counts = if options.extra_counts.is_empty() {
        vec![0]
    } else {
        options.extra_counts.clone()
    };
    let extra_counts = Cyclic::new(sequence::rotate(&extra_counts, -consumed));

    let mut tuplets = Vec::with_capacity(durations.len());
    for (i, &target) in durations.iter().enumerate() {
        if !duration::is_dyadic(target) {
            return Err(RhythmError::NonDyadicDuration(target));
        }
        let denominator = denominators.get(i as i64).copied().unwrap_or(1);
        let extra_count = extra_counts.get(i as i64).copied().unwrap_or(0);
        tuplets.push(divide(target, denominator, extra_count, &options.spelling, &tag));
    }

    let state = options
        .previous_state
        .next(durations.len(), logical_tie_count(&tuplets));
    log::debug!("even_division: {} tuplets", tuplets.len());
    Ok((tuplets, state))
}

fn divide(target: Duration, denominator: i64, extra_count: i64, spelling: &Spelling, tag: &Tag) -> Tuplet {
    let note = duration::duration(1, denominator);
    if target < note * 2 {
        let components = make_leaves(target, LeafKind::Note, spelling, tag);
        return Tuplet::trivial(components).with_tag(tag.clone());
    }
    let unprolated = (target / note).to_integer().max(1);
    let extra = if extra_count > 0 {
        extra_count % unprolated
    } else if extra_count < 0 {
        let modulus = (unprolated + 1) / 2;
        -(extra_count.abs() % modulus)
    } else {
        0
    };
    let note_count = unprolated + extra;
    log::trace!("even_division: {} into {} x {}", target, note_count, note);
    let notes: Vec<Component> = (0..note_count)
        .map(|_| Leaf::note(note).with_tag(tag.clone()).into())
        .collect();
    let mut tuplet = Tuplet::from_duration(target, notes).with_tag(tag.clone());
    let ratio = tuplet.ratio;
    if ratio.numerator < note_count {
        let scalar = note_count / ratio.numerator;
        tuplet.ratio = TupletRatio::new(ratio.numerator * scalar, ratio.denominator * scalar);
    }
    tuplet
}
