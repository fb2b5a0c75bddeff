//! Talea rhythm maker
//!
//! Reads a cyclic pattern of counts against the target durations. All
//! arithmetic happens on integers in a unit shared by the targets and the
//! talea denominator: counts, preamble, end counts and extra counts are
//! scaled into that unit, the count stream is cut at the (prolated) target
//! numerators, and only then are the pieces turned back into durations.
//!
//! Pieces of one talea count that land in different targets are tied back
//! together, so a count that straddles a barline still sounds as one note.

use serde::{Deserialize, Serialize};

use super::leaves::{make_components, package_tuplets};
use super::{check_durations, normalize_nested, scale_durations};
use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};
use crate::models::{leaves, leaves_mut, logical_tie_count, LeafKind, Tag, Tuplet};
use crate::specifiers::{Count, Spelling, State, Talea};
use crate::utils::sequence::{self, PartWeights};
use crate::utils::Cyclic;

/// Keyword options of `talea`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaleaOptions {
    /// Weight to skip before reading, applied before the previous state
    pub advance: i64,
    pub end_counts: Vec<i64>,
    /// Per-target count added to (or removed from) the target numerator
    pub extra_counts: Vec<i64>,
    pub preamble: Vec<i64>,
    pub previous_state: State,
    pub read_talea_once_only: bool,
    pub spelling: Spelling,
    pub tag: Tag,
}

/// One tuplet per duration, filled by reading `counts` cyclically
pub fn talea(
    durations: &[Duration],
    counts: &[Count],
    denominator: i64,
    options: &TaleaOptions,
) -> Result<(Vec<Tuplet>, State)> {
    check_durations(durations)?;
    options.spelling.validate()?;
    let tag = options.tag.append_function("talea");
    let talea = Talea::new(counts.to_vec(), denominator)?
        .with_preamble(options.preamble.clone())?
        .with_end_counts(options.end_counts.clone())?
        .advance(options.advance)?;

    let previous_state = &options.previous_state;
    let previous_weight = previous_state.talea_weight_consumed.unwrap_or(0);
    // A fill placeholder is re-expanded against each call's targets
    let advanced = if talea.has_placeholder() {
        talea
    } else {
        talea.advance(previous_weight)?
    };
    let extra_counts = sequence::rotate(&options.extra_counts, -previous_state.durations_consumed);

    let (numerators, lcd, multiplier) = scale_durations(durations, advanced.denominator());
    let scale = |items: &[i64]| -> Vec<i64> { items.iter().map(|n| n * multiplier).collect() };
    let scaled_counts: Vec<Count> = advanced
        .counts()
        .iter()
        .map(|count| match count {
            Count::Value(n) => Count::Value(n * multiplier),
            other => *other,
        })
        .collect();
    let reading = read_numerators(
        &numerators,
        &scale(advanced.preamble()),
        &scaled_counts,
        &Cyclic::new(scale(&extra_counts)),
        &scale(advanced.end_counts()),
        options.read_talea_once_only,
    )?;
    let weight_consumed: i64 = reading.lists.iter().map(|list| sequence::weight(list)).sum();
    log::trace!("talea numerator lists {:?} over denominator {}", reading.lists, lcd);

    let mut leaf_counts = Vec::new();
    let mut component_lists = Vec::new();
    for list in &reading.lists {
        let mut components = Vec::new();
        for &numerator in list {
            let made = make_components(
                &[duration::duration(numerator, lcd)],
                &options.spelling,
                &tag,
            );
            leaf_counts.push(leaves(&made).len());
            components.extend(made);
        }
        component_lists.push(components);
    }
    let mut tuplets = if extra_counts.is_empty() {
        component_lists
            .into_iter()
            .map(|components| Tuplet::trivial(components).with_tag(tag.clone()))
            .collect()
    } else {
        package_tuplets(durations, component_lists, &tag)?
    };

    let flat: Vec<i64> = reading.lists.concat();
    apply_ties(
        &mut tuplets,
        &flat,
        &leaf_counts,
        &scale(advanced.preamble()),
        &reading.talea,
        advanced.end_counts().len(),
    )?;
    for tuplet in tuplets.iter_mut() {
        normalize_nested(tuplet);
    }

    let mut state = previous_state.next(durations.len(), logical_tie_count(&tuplets));
    let units = weight_consumed / multiplier;
    if weight_consumed % multiplier != 0 {
        log::warn!(
            "talea weight consumed {}/{} is not a whole number of talea units; flooring",
            weight_consumed,
            multiplier
        );
    }
    if !advanced.has_placeholder() && 0 < weight_consumed {
        let on_boundary = weight_consumed % multiplier == 0 && advanced.contains(units)?;
        let ends_on_note = leaves(&tuplets)
            .last()
            .map_or(false, |leaf| leaf.kind == LeafKind::Note);
        state.incomplete_last_note = !on_boundary && ends_on_note;
    }
    state.talea_weight_consumed = Some(previous_weight + units);
    log::debug!(
        "talea: {} durations, {} tuplets, weight consumed {}",
        durations.len(),
        tuplets.len(),
        units
    );
    Ok((tuplets, state))
}

/// Counts read for each target, plus the integer talea actually read
struct Reading {
    lists: Vec<Vec<i64>>,
    talea: Vec<i64>,
}

fn read_numerators(
    numerators: &[i64],
    preamble: &[i64],
    counts: &[Count],
    extra_counts: &Cyclic<i64>,
    end_counts: &[i64],
    read_talea_once_only: bool,
) -> Result<Reading> {
    let prolated: Vec<i64> = numerators
        .iter()
        .enumerate()
        .map(|(i, &numerator)| {
            // Residue keeps the sign of the extra count: -7 against 3 is -1
            let extra = extra_counts.get(i as i64).copied().unwrap_or(0);
            numerator + extra % numerator
        })
        .collect();
    let talea = expand_placeholder(counts, prolated.iter().sum())?;
    let mut lists = split_to_weights(preamble, &talea, &prolated, read_talea_once_only)?;

    if !end_counts.is_empty() {
        let end_weight = sequence::weight(end_counts);
        let list_weights: Vec<i64> = lists.iter().map(|list| sequence::weight(list)).collect();
        let flat: Vec<i64> = lists.concat();
        let read_weight = sequence::weight(&flat);
        if read_weight < end_weight {
            return Err(RhythmError::EndCountsTooLong {
                end_weight,
                read_weight,
            });
        }
        let mut replaced = sequence::truncate_to_weight(&flat, read_weight - end_weight);
        replaced.extend_from_slice(end_counts);
        lists = sequence::partition_by_weights(&replaced, &list_weights, PartWeights::Exact, false, false)
            .ok_or_else(|| RhythmError::EndCountsMisaligned(end_counts.to_vec()))?;
    }
    Ok(Reading { lists, talea })
}

/// Replace a '+' or '-' placeholder with the weight that makes the talea
/// exactly `total`
fn expand_placeholder(counts: &[Count], total: i64) -> Result<Vec<i64>> {
    let explicit: i64 = counts.iter().filter_map(Count::value).map(i64::abs).sum();
    counts
        .iter()
        .map(|count| match count {
            Count::Value(n) => Ok(*n),
            Count::FillNotes | Count::FillRests => {
                let implicit = total - explicit;
                if implicit <= 0 {
                    return Err(RhythmError::FillUnderflow(implicit));
                }
                Ok(if *count == Count::FillRests { -implicit } else { implicit })
            }
        })
        .collect()
}

/// Preamble then repetitions of `talea`, cut at `weights`
fn split_to_weights(
    preamble: &[i64],
    talea: &[i64],
    weights: &[i64],
    read_talea_once_only: bool,
) -> Result<Vec<Vec<i64>>> {
    let preamble_weight = sequence::weight(preamble);
    let talea_weight = sequence::weight(talea);
    let total: i64 = weights.iter().sum();
    if read_talea_once_only && preamble_weight + talea_weight < total {
        return Err(RhythmError::TaleaTooShort {
            available: preamble_weight + talea_weight,
            required: total,
        });
    }
    let stream = if total <= preamble_weight {
        sequence::truncate_to_weight(preamble, total)
    } else {
        let mut stream = preamble.to_vec();
        stream.extend(sequence::repeat_to_weight(talea, total - preamble_weight));
        stream
    };
    Ok(sequence::split_by_weights(&stream, weights, true, false))
}

/// Tie together the leaves that came from one preamble or talea count
///
/// `flat` holds the signed counts read, in order, and `leaf_counts` how many
/// leaves each produced. Parts containing a rest are left alone. Leaves of
/// the final `end_count_len` counts are not tied to what precedes them.
fn apply_ties(
    tuplets: &mut [Tuplet],
    flat: &[i64],
    leaf_counts: &[usize],
    preamble: &[i64],
    talea: &[i64],
    end_count_len: usize,
) -> Result<()> {
    let preamble_weights: Vec<i64> = preamble.iter().map(|n| n.abs()).collect();
    let talea_weights: Vec<i64> = talea.iter().map(|n| n.abs()).collect();
    let total = sequence::weight(flat);
    let parts = if total <= sequence::weight(preamble) {
        sequence::partition_by_weights(flat, &preamble_weights, PartWeights::More, true, true)
    } else {
        sequence::partition_by_weights(flat, &preamble_weights, PartWeights::Exact, false, false)
            .and_then(|mut parts| {
                let used: usize = parts.iter().map(Vec::len).sum();
                let rest = sequence::partition_by_weights(
                    &flat[used..],
                    &talea_weights,
                    PartWeights::More,
                    true,
                    true,
                )?;
                parts.extend(rest);
                Some(parts)
            })
    }
    .ok_or_else(|| RhythmError::EndCountsMisaligned(flat[flat.len() - end_count_len..].to_vec()))?;

    let mut all = leaves_mut(tuplets);
    let mut count_index = 0;
    let mut leaf_index = 0;
    for part in parts {
        let part_leaves: usize = leaf_counts[count_index..count_index + part.len()].iter().sum();
        let range = leaf_index..leaf_index + part_leaves;
        count_index += part.len();
        leaf_index += part_leaves;
        if part.iter().any(|&n| n < 0) || range.len() < 2 {
            continue;
        }
        for leaf in &mut all[range.start..range.end - 1] {
            leaf.indicators.tie = true;
        }
    }

    let first_end_count = flat.len().saturating_sub(end_count_len);
    let mut leaf_start = leaf_counts[..first_end_count].iter().sum::<usize>();
    for &count in &leaf_counts[first_end_count..] {
        if leaf_start > 0 {
            all[leaf_start - 1].indicators.tie = false;
        }
        leaf_start += count;
    }
    Ok(())
}
