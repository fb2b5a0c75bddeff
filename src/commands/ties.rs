//! Tie and leaf utilities
//!
//! These work on a flattened list of mutable leaves, usually
//! `voice.leaves_mut()` or one list per tuplet. "Previous" and "next" leaf
//! mean the neighbours in that list.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};
use crate::models::{Leaf, LeafKind, Multiplier, Tag};

/// Which tied leaves `replace_ties_with_repeat_ties` rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieThreshold {
    /// Leave every tie alone
    Never,
    /// Rewrite every tie
    Always,
    /// Rewrite ties on leaves lasting at least this long
    AtLeast(Duration),
}

impl Default for TieThreshold {
    fn default() -> Self {
        TieThreshold::Always
    }
}

impl TieThreshold {
    pub fn admits(&self, value: Duration) -> bool {
        match self {
            TieThreshold::Never => false,
            TieThreshold::Always => true,
            TieThreshold::AtLeast(threshold) => *threshold <= value,
        }
    }
}

/// Tie every note to the leaf after it
pub fn attach_ties_to_pleaves(leaves: &mut [&mut Leaf]) {
    for leaf in leaves.iter_mut().filter(|leaf| leaf.is_pleaf()) {
        leaf.indicators.tie = true;
    }
}

/// Tie every note back to the leaf before it
pub fn attach_repeat_ties_to_pleaves(leaves: &mut [&mut Leaf]) {
    for leaf in leaves.iter_mut().filter(|leaf| leaf.is_pleaf()) {
        leaf.indicators.repeat_tie = true;
    }
}

pub fn detach_ties_from_leaves(leaves: &mut [&mut Leaf]) {
    for leaf in leaves.iter_mut() {
        leaf.indicators.tie = false;
        leaf.indicators.repeat_tie = false;
    }
}

/// Move ties forward onto the next note as repeat ties
///
/// A tie is moved only when the next leaf is a note without a repeat tie
/// and the tied leaf's duration passes `threshold`.
pub fn replace_ties_with_repeat_ties(leaves: &mut [&mut Leaf], threshold: TieThreshold) {
    let mut targets = Vec::new();
    for i in 0..leaves.len() {
        if !leaves[i].indicators.tie {
            continue;
        }
        let next = match leaves.get(i + 1) {
            Some(next) => next,
            None => continue,
        };
        if !next.is_pleaf() || next.indicators.repeat_tie {
            continue;
        }
        if !threshold.admits(leaves[i].duration()) {
            continue;
        }
        leaves[i].indicators.tie = false;
        targets.push(i + 1);
    }
    for i in targets {
        leaves[i].indicators.repeat_tie = true;
    }
}

/// Turn rests and skips into notes with the same written duration and multiplier
pub fn replace_leaves_with_notes(leaves: &mut [&mut Leaf], tag: &Tag) {
    let tag = tag.append_function("replace_leaves_with_notes");
    for leaf in leaves.iter_mut() {
        if leaf.kind == LeafKind::Note {
            continue;
        }
        **leaf = replacement(leaf, LeafKind::Note, &tag);
    }
}

/// Turn the leaves at `selection` into rests
///
/// Ties that would dangle are detached: the tie on the leaf before each
/// replaced leaf and the repeat tie on the leaf after it.
pub fn replace_leaves_with_rests(
    leaves: &mut [&mut Leaf],
    selection: Range<usize>,
    tag: &Tag,
) -> Result<()> {
    check_selection(&selection, leaves.len())?;
    let tag = tag.append_function("replace_leaves_with_rests");
    for i in selection {
        let rest = replacement(&leaves[i], LeafKind::Rest, &tag);
        *leaves[i] = rest;
        if i > 0 {
            leaves[i - 1].indicators.tie = false;
        }
        if let Some(next) = leaves.get_mut(i + 1) {
            next.indicators.repeat_tie = false;
        }
    }
    Ok(())
}

fn replacement(leaf: &Leaf, kind: LeafKind, tag: &Tag) -> Leaf {
    let mut new = Leaf::new(kind, leaf.written_duration).with_tag(tag.clone());
    new.multiplier = leaf.multiplier;
    new.indicators.beam_count = leaf.indicators.beam_count;
    new.indicators.start_beam = leaf.indicators.start_beam;
    new.indicators.stop_beam = leaf.indicators.stop_beam;
    if kind == LeafKind::Note {
        new.indicators.tie = leaf.indicators.tie;
        new.indicators.repeat_tie = leaf.indicators.repeat_tie;
    }
    new
}

/// Write every leaf at `written_duration`, with a multiplier keeping its length
pub fn respell_leaves_written_duration_and_dmp(leaves: &mut [&mut Leaf], written_duration: Duration) {
    for leaf in leaves.iter_mut() {
        let old = leaf.written_duration;
        if old == written_duration {
            continue;
        }
        let fraction = old / written_duration;
        leaf.written_duration = written_duration;
        leaf.multiplier = Some(Multiplier::from_duration(fraction));
    }
}

pub(crate) fn check_selection(selection: &Range<usize>, length: usize) -> Result<()> {
    if selection.start >= selection.end || selection.end > length {
        return Err(RhythmError::InvalidSelection {
            start: selection.start,
            stop: selection.end,
            length,
        });
    }
    Ok(())
}
