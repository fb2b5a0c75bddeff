//! Beaming
//!
//! A leaf is beamable when it is a note with at least one flag, or a rest
//! or skip when rests are beamed. Beams are attached to maximal runs of
//! beamable leaves: start beam on the first leaf of the run, stop beam on
//! the last.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::ties::check_selection;
use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};
use crate::models::{BeamCount, GrowDirection, Leaf, LeafKind};

/// Number of beams kept across a span-beam boundary
const SPAN_BEAM_COUNT: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamOptions {
    /// Beam runs made of a single leaf
    pub beam_lone_notes: bool,
    /// Rests and skips continue a run instead of breaking it
    pub beam_rests: bool,
}

fn is_beamable(leaf: &Leaf, beam_rests: bool) -> bool {
    match leaf.kind {
        LeafKind::Note => duration::flag_count(leaf.written_duration) > 0,
        LeafKind::Rest | LeafKind::Skip | LeafKind::MultimeasureRest => beam_rests,
    }
}

fn beamable_runs(leaves: &[&mut Leaf], beam_rests: bool) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, leaf) in leaves.iter().enumerate() {
        match (is_beamable(leaf, beam_rests), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..leaves.len());
    }
    runs
}

pub fn detach_beams_from_leaves(leaves: &mut [&mut Leaf]) {
    for leaf in leaves.iter_mut() {
        leaf.indicators.detach_beams();
    }
}

/// Beam each run of beamable leaves
pub fn beam(leaves: &mut [&mut Leaf], options: &BeamOptions) {
    for run in beamable_runs(leaves, options.beam_rests) {
        if run.len() == 1 && !options.beam_lone_notes {
            continue;
        }
        leaves[run.start].indicators.start_beam = true;
        leaves[run.end - 1].indicators.stop_beam = true;
    }
}

/// Rebeam each leaf list on its own
pub fn attach_beams_to_runs_by_leaf_list(leaf_lists: &mut [Vec<&mut Leaf>], options: &BeamOptions) {
    for leaf_list in leaf_lists.iter_mut() {
        detach_beams_from_leaves(leaf_list);
        beam(leaf_list, options);
    }
}

/// Beam across all leaf lists, thinning the beam to one at list boundaries
pub fn attach_span_beams_to_runs_across_leaf_lists(
    leaf_lists: &mut [Vec<&mut Leaf>],
    options: &BeamOptions,
) {
    let mut boundaries = Vec::new();
    let mut count = 0;
    for leaf_list in leaf_lists.iter() {
        count += leaf_list.len();
        boundaries.push(count);
    }
    boundaries.pop();
    boundaries.dedup();

    let mut leaves: Vec<&mut Leaf> = leaf_lists
        .iter_mut()
        .flat_map(|list| list.iter_mut().map(|leaf| &mut **leaf))
        .collect();
    detach_beams_from_leaves(&mut leaves);
    beam(&mut leaves, options);

    for boundary in boundaries {
        if boundary == 0 || boundary >= leaves.len() {
            continue;
        }
        let (left, right) = (boundary - 1, boundary);
        if !is_beamable(&leaves[left], options.beam_rests) || !is_beamable(&leaves[right], options.beam_rests) {
            continue;
        }
        let left_count = leaves[left]
            .indicators
            .beam_count
            .map_or(duration::flag_count(leaves[left].written_duration), |c| c.left);
        leaves[left].indicators.beam_count = Some(BeamCount {
            left: left_count,
            right: SPAN_BEAM_COUNT,
        });
        leaves[right].indicators.beam_count = Some(BeamCount {
            left: SPAN_BEAM_COUNT,
            right: duration::flag_count(leaves[right].written_duration),
        });
    }
}

/// Index ranges of the leaves that exactly fill each beat
///
/// `durations` are the sounding leaf durations of one measure, in order.
/// A beat whose contained leaves do not add up to the beat (because a
/// leaf straddles one of its edges) gets an empty range.
pub fn make_beamable_groups(durations: &[Duration], beats: &[Duration]) -> Result<Vec<Range<usize>>> {
    let total = duration::sum(durations.iter().copied());
    let expected = duration::sum(beats.iter().copied());
    if total != expected {
        return Err(RhythmError::DurationMismatch {
            expected,
            actual: total,
        });
    }
    let mut spans = Vec::with_capacity(durations.len());
    let mut offset = duration::zero();
    for &value in durations {
        spans.push((offset, offset + value));
        offset += value;
    }

    let mut groups = Vec::with_capacity(beats.len());
    let mut beat_start = duration::zero();
    for &beat in beats {
        let beat_stop = beat_start + beat;
        let members: Vec<usize> = spans
            .iter()
            .enumerate()
            .filter(|(_, (start, stop))| beat_start <= *start && *stop <= beat_stop)
            .map(|(i, _)| i)
            .collect();
        let group = match (members.first(), members.last()) {
            (Some(&first), Some(&last)) if spans[last].1 - spans[first].0 == beat => first..last + 1,
            _ => 0..0,
        };
        groups.push(group);
        beat_start = beat_stop;
    }
    Ok(groups)
}

/// Feather the beams of each list: toward the shorter end
pub fn override_beam_grow_direction(leaf_lists: &mut [Vec<&mut Leaf>]) {
    for leaf_list in leaf_lists.iter_mut() {
        let (first, last) = match (leaf_list.first(), leaf_list.last()) {
            (Some(first), Some(last)) => (first.duration(), last.duration()),
            _ => continue,
        };
        let direction = if last < first {
            Some(GrowDirection::Right)
        } else if first < last {
            Some(GrowDirection::Left)
        } else {
            None
        };
        if let (Some(direction), Some(leaf)) = (direction, leaf_list.first_mut()) {
            leaf.indicators.beam_grow_direction = Some(direction);
        }
    }
}

/// Remove beams from the leaves at `selection`
///
/// With `smart`, a beam cut open by the removal is closed again: a beam
/// left open before the selection gets a stop on the leaf just before it,
/// and a beam left without a start after the selection gets a start on
/// the leaf just after it.
pub fn unbeam(leaves: &mut [&mut Leaf], selection: Range<usize>, smart: bool) -> Result<()> {
    check_selection(&selection, leaves.len())?;
    for leaf in leaves[selection.clone()].iter_mut() {
        leaf.indicators.detach_beams();
    }
    if !smart {
        return Ok(());
    }

    let mut unmatched_start = false;
    for leaf in leaves[..selection.start].iter().rev() {
        if leaf.indicators.stop_beam {
            break;
        }
        if leaf.indicators.start_beam {
            unmatched_start = true;
            break;
        }
    }
    let mut unmatched_stop = false;
    for leaf in leaves[selection.end..].iter() {
        if leaf.indicators.start_beam {
            break;
        }
        if leaf.indicators.stop_beam {
            unmatched_stop = true;
            break;
        }
    }

    if unmatched_start {
        log::trace!("unbeam: closing beam before leaf {}", selection.start);
        leaves[selection.start - 1].indicators.stop_beam = true;
    }
    if unmatched_stop {
        log::trace!("unbeam: reopening beam after leaf {}", selection.end - 1);
        leaves[selection.end].indicators.start_beam = true;
    }
    Ok(())
}
