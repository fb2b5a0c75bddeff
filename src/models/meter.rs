//! Time signatures, meter trees and meter rewriting
//!
//! A `Meter` is a tree of durations: the root spans one measure, each level
//! below divides its parent into beats and subbeats. The offsets of the nodes
//! at each depth form the meter's offset inventory, which drives both beaming
//! (depth 1 gives the beats) and `Meter::rewrite`, which re-spells logical
//! ties so they line up with the metrical grid.

use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};

use super::components::{is_tied, Component, Leaf, LeafKind, Voice};
use super::duration::{self, Duration};
use crate::error::{Result, RhythmError};

/// Depths below the tree keep halving; this caps the search
const MAX_REWRITE_DEPTH: usize = 12;

// ============================================================================
// Time signatures
// ============================================================================

/// Time signature `numerator/denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: i64,
    pub denominator: i64,
}

impl TimeSignature {
    pub fn new(numerator: i64, denominator: i64) -> Result<Self> {
        if numerator <= 0 || denominator <= 0 {
            return Err(RhythmError::InvalidTimeSignature(numerator, denominator));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Time signature whose pair is the duration's reduced fraction
    pub fn from_duration(value: Duration) -> Result<Self> {
        Self::new(*value.numer(), *value.denom())
    }

    pub fn pair(&self) -> (i64, i64) {
        (self.numerator, self.denominator)
    }

    pub fn duration(&self) -> Duration {
        duration::duration(self.numerator, self.denominator)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A voice paired with the time signatures of its measures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub time_signatures: Vec<TimeSignature>,
    pub voice: Voice,
}

impl Staff {
    /// Measure durations, one per time signature
    pub fn measure_durations(&self) -> Vec<Duration> {
        self.time_signatures.iter().map(TimeSignature::duration).collect()
    }
}

// ============================================================================
// Meter trees
// ============================================================================

/// One node of a meter tree; nodes without children are beats of the
/// smallest notated size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterNode {
    pub duration: Duration,
    pub children: Vec<MeterNode>,
}

impl MeterNode {
    fn leaf(duration: Duration) -> Self {
        Self {
            duration,
            children: Vec::new(),
        }
    }
}

/// Metrical hierarchy for one time signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    time_signature: TimeSignature,
    root: MeterNode,
}

impl Meter {
    /// Best-guess meter for a time signature
    ///
    /// The numerator is factored into primes (ascending); two leading twos
    /// fuse into a four. Factors 2, 3 and 4 divide a node into equal
    /// children; larger factors group into threes and twos, e.g. 7 becomes
    /// 3+2+2 (2+2+3 when `increase_monotonic`).
    pub fn new(time_signature: TimeSignature, increase_monotonic: bool) -> Self {
        let mut factors = prime_factors(time_signature.numerator);
        if factors.len() > 1 && factors[0] == 2 && factors[1] == 2 {
            factors.splice(0..2, [4]);
        }
        let mut root = MeterNode::leaf(time_signature.duration());
        let unit = duration::duration(1, time_signature.denominator);
        if factors.is_empty() {
            root.children.push(MeterNode::leaf(unit));
        } else {
            grow(&mut root, &factors, unit, increase_monotonic);
        }
        Self {
            time_signature,
            root,
        }
    }

    pub fn from_pair(numerator: i64, denominator: i64) -> Result<Self> {
        Ok(Self::new(TimeSignature::new(numerator, denominator)?, false))
    }

    /// Meter with explicit top-level groupings in units of the denominator,
    /// e.g. 7/8 as `[2, 2, 3]`
    pub fn from_groupings(time_signature: TimeSignature, groupings: &[i64]) -> Result<Self> {
        if groupings.iter().any(|&g| g <= 0)
            || groupings.iter().sum::<i64>() != time_signature.numerator
        {
            return Err(RhythmError::InvalidProportion(groupings.to_vec()));
        }
        let unit = duration::duration(1, time_signature.denominator);
        let children = groupings
            .iter()
            .map(|&count| MeterNode {
                duration: unit * count,
                children: (0..count).map(|_| MeterNode::leaf(unit)).collect(),
            })
            .collect();
        Ok(Self {
            time_signature,
            root: MeterNode {
                duration: time_signature.duration(),
                children,
            },
        })
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn pair(&self) -> (i64, i64) {
        self.time_signature.pair()
    }

    pub fn duration(&self) -> Duration {
        self.root.duration
    }

    pub fn root(&self) -> &MeterNode {
        &self.root
    }

    /// Sorted offsets of the nodes at each depth, from the root down
    ///
    /// Each list includes both 0 and the measure duration.
    pub fn depthwise_offset_inventory(&self) -> Vec<Vec<Duration>> {
        let mut inventory = Vec::new();
        let mut level: Vec<(&MeterNode, Duration)> = vec![(&self.root, duration::zero())];
        while !level.is_empty() {
            let mut offsets: Vec<Duration> = level.iter().map(|(_, start)| *start).collect();
            offsets.push(self.duration());
            offsets.dedup();
            inventory.push(offsets);

            let mut next = Vec::new();
            for (node, start) in &level {
                let mut offset = *start;
                for child in &node.children {
                    next.push((child, offset));
                    offset += child.duration;
                }
            }
            level = next;
        }
        inventory
    }

    /// Durations of the beats: the differences between depth-1 offsets
    pub fn beat_durations(&self) -> Vec<Duration> {
        let inventory = self.depthwise_offset_inventory();
        let offsets = inventory.get(1).or_else(|| inventory.first());
        match offsets {
            Some(offsets) => offsets.windows(2).map(|w| w[1] - w[0]).collect(),
            None => vec![self.duration()],
        }
    }

    /// Offsets at `depth`; below the tree each interval is halved per level
    fn offsets_at_depth(&self, inventory: &[Vec<Duration>], depth: usize) -> Vec<Duration> {
        if depth < inventory.len() {
            return inventory[depth].clone();
        }
        let mut offsets = inventory.last().cloned().unwrap_or_default();
        for _ in inventory.len()..=depth {
            let mut halved = Vec::with_capacity(offsets.len() * 2);
            for pair in offsets.windows(2) {
                halved.push(pair[0]);
                halved.push((pair[0] + pair[1]) / 2);
            }
            if let Some(last) = offsets.last() {
                halved.push(*last);
            }
            offsets = halved;
        }
        offsets
    }

    /// Re-spell the logical ties of one measure of components
    ///
    /// Only top-level leaves are rewritten. Tuplets, containers, leaves with
    /// multipliers and multimeasure rests are left alone but still advance
    /// the offset. When `boundary_depth` is given, logical ties crossing an
    /// offset at that depth are always split there.
    pub fn rewrite(
        &self,
        components: &mut Vec<Component>,
        boundary_depth: Option<usize>,
    ) -> Result<()> {
        let total = super::components::sum_durations(components);
        if total != self.duration() {
            return Err(RhythmError::DurationMismatch {
                expected: self.duration(),
                actual: total,
            });
        }
        let inventory = self.depthwise_offset_inventory();
        let old = std::mem::take(components);
        let mut offset = duration::zero();
        let mut run: Vec<Leaf> = Vec::new();
        let mut run_start = duration::zero();

        for component in old {
            let component_duration = component.duration();
            match component {
                Component::Leaf(leaf)
                    if leaf.multiplier.is_none() && leaf.kind != LeafKind::MultimeasureRest =>
                {
                    let continues = run.last().map_or(false, |prev| is_tied(prev, &leaf));
                    if !continues && !run.is_empty() {
                        self.flush_run(&mut run, run_start, &inventory, boundary_depth, components);
                    }
                    if run.is_empty() {
                        run_start = offset;
                    }
                    run.push(leaf);
                }
                other => {
                    if !run.is_empty() {
                        self.flush_run(&mut run, run_start, &inventory, boundary_depth, components);
                    }
                    components.push(other);
                }
            }
            offset += component_duration;
        }
        if !run.is_empty() {
            self.flush_run(&mut run, run_start, &inventory, boundary_depth, components);
        }
        Ok(())
    }

    fn flush_run(
        &self,
        run: &mut Vec<Leaf>,
        start: Duration,
        inventory: &[Vec<Duration>],
        boundary_depth: Option<usize>,
        out: &mut Vec<Component>,
    ) {
        let leaves = std::mem::take(run);
        let stop = start + duration::sum(leaves.iter().map(|l| l.duration()));

        let mut pieces = Vec::new();
        let mut bounds = vec![start];
        if let Some(depth) = boundary_depth {
            let offsets = self.offsets_at_depth(inventory, depth);
            bounds.extend(offsets.into_iter().filter(|&o| start < o && o < stop));
        }
        bounds.push(stop);
        for pair in bounds.windows(2) {
            self.spell(pair[0], pair[1], 0, inventory, &mut pieces);
        }

        let unchanged = pieces.len() == leaves.len()
            && pieces
                .iter()
                .zip(&leaves)
                .all(|(piece, leaf)| *piece == leaf.written_duration);
        if unchanged {
            out.extend(leaves.into_iter().map(Component::Leaf));
            return;
        }
        trace!(
            "meter {}: respelled {} leaves at {} as {:?}",
            self.time_signature,
            leaves.len(),
            start,
            pieces
        );
        out.extend(respell(&leaves, &pieces).into_iter().map(Component::Leaf));
    }

    fn spell(
        &self,
        start: Duration,
        stop: Duration,
        depth: usize,
        inventory: &[Vec<Duration>],
        out: &mut Vec<Duration>,
    ) {
        let length = stop - start;
        if depth > MAX_REWRITE_DEPTH {
            out.extend(canonic_parts(length));
            return;
        }
        let offsets = self.offsets_at_depth(inventory, depth);
        let starts_on = offsets.contains(&start);
        let stops_on = offsets.contains(&stop);
        if duration::is_assignable(length) && (starts_on || stops_on) {
            out.push(length);
            return;
        }
        let interior: Vec<Duration> = offsets
            .iter()
            .copied()
            .filter(|&o| start < o && o < stop)
            .collect();
        let split = if starts_on {
            interior.last()
        } else {
            interior.first()
        };
        match split {
            Some(&split) => {
                self.spell(start, split, depth, inventory, out);
                self.spell(split, stop, depth, inventory, out);
            }
            None => self.spell(start, stop, depth + 1, inventory, out),
        }
    }
}

/// Rebuild a logical tie with new written durations
fn respell(leaves: &[Leaf], pieces: &[Duration]) -> Vec<Leaf> {
    let (first, last) = match (leaves.first(), leaves.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };
    let count = pieces.len();
    pieces
        .iter()
        .enumerate()
        .map(|(i, &piece)| {
            let mut leaf = Leaf::new(first.kind, piece).with_tag(first.tag.clone());
            if first.is_pleaf() {
                leaf.indicators.tie = if i + 1 < count {
                    true
                } else {
                    last.indicators.tie
                };
                leaf.indicators.repeat_tie = i == 0 && first.indicators.repeat_tie;
            }
            leaf
        })
        .collect()
}

/// Binary runs of a dyadic duration's numerator, largest first
fn canonic_parts(value: Duration) -> Vec<Duration> {
    let denominator = *value.denom();
    duration::canonic_parts(*value.numer())
        .into_iter()
        .map(|part| duration::duration(part, denominator))
        .collect()
}

fn grow(node: &mut MeterNode, factors: &[i64], unit: Duration, increase_monotonic: bool) {
    let (factor, rest) = match factors.split_first() {
        Some((factor, rest)) => (*factor, rest),
        None => return,
    };
    let child_duration = node.duration / factor;
    let groupings: Vec<i64> = if factor <= 4 {
        vec![1; factor as usize]
    } else {
        let mut parts = vec![3];
        let mut total = 3;
        while total < factor {
            if increase_monotonic {
                parts.insert(0, 2);
            } else {
                parts.push(2);
            }
            total += 2;
        }
        parts
    };
    for grouping in groupings {
        let mut child = MeterNode::leaf(child_duration * grouping);
        if !rest.is_empty() {
            grow(&mut child, rest, unit, increase_monotonic);
        } else if grouping > 1 {
            child.children = (0..grouping).map(|_| MeterNode::leaf(unit)).collect();
        }
        node.children.push(child);
    }
}

/// Prime factors of `n` in ascending order
fn prime_factors(mut n: i64) -> Vec<i64> {
    let mut factors = Vec::new();
    let mut divisor = 2;
    while n > 1 {
        while n % divisor == 0 {
            factors.push(divisor);
            n /= divisor;
        }
        divisor += 1;
    }
    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::duration::duration as d;

    #[test]
    fn test_prime_factors() {
        assert_eq!(prime_factors(12), vec![2, 2, 3]);
        assert_eq!(prime_factors(7), vec![7]);
        assert_eq!(prime_factors(1), Vec::<i64>::new());
    }

    #[test]
    fn test_best_guess_beats() {
        let beats = |n, den| Meter::from_pair(n, den).unwrap().beat_durations();
        assert_eq!(beats(4, 4), vec![d(1, 4); 4]);
        assert_eq!(beats(6, 8), vec![d(3, 8); 2]);
        assert_eq!(beats(5, 8), vec![d(3, 8), d(2, 8)]);
        assert_eq!(beats(7, 4), vec![d(3, 4), d(2, 4), d(2, 4)]);
        assert_eq!(beats(12, 8), vec![d(3, 8); 4]);
    }

    #[test]
    fn test_increase_monotonic_groupings() {
        let meter = Meter::new(TimeSignature::new(7, 8).unwrap(), true);
        assert_eq!(meter.beat_durations(), vec![d(2, 8), d(2, 8), d(3, 8)]);
    }

    #[test]
    fn test_depthwise_offset_inventory() {
        let meter = Meter::from_pair(6, 8).unwrap();
        let inventory = meter.depthwise_offset_inventory();
        assert_eq!(inventory[0], vec![d(0, 1), d(3, 4)]);
        assert_eq!(inventory[1], vec![d(0, 1), d(3, 8), d(3, 4)]);
        assert_eq!(inventory[2].len(), 7);
    }

    #[test]
    fn test_from_groupings() {
        let ts = TimeSignature::new(7, 8).unwrap();
        let meter = Meter::from_groupings(ts, &[2, 2, 3]).unwrap();
        assert_eq!(meter.beat_durations(), vec![d(1, 4), d(1, 4), d(3, 8)]);
        assert!(Meter::from_groupings(ts, &[2, 2]).is_err());
    }

    #[test]
    fn test_rewrite_splits_unassignable_note() {
        // 5/8 note starting a 4/4 measure, then a dotted quarter
        let meter = Meter::from_pair(4, 4).unwrap();
        let mut components: Vec<Component> =
            vec![Leaf::note(d(5, 8)).into(), Leaf::note(d(3, 8)).into()];
        meter.rewrite(&mut components, None).unwrap();
        let written: Vec<Duration> = components.iter().map(|c| c.duration()).collect();
        assert_eq!(written, vec![d(1, 2), d(1, 8), d(3, 8)]);
        assert!(components[0].as_leaf().unwrap().indicators.tie);
        assert!(!components[1].as_leaf().unwrap().indicators.tie);

        let mut again = components.clone();
        meter.rewrite(&mut again, None).unwrap();
        assert_eq!(again, components);
    }

    #[test]
    fn test_rewrite_fuses_tied_notes() {
        let meter = Meter::from_pair(2, 4).unwrap();
        let mut first = Leaf::note(d(1, 4));
        first.indicators.tie = true;
        let mut components: Vec<Component> = vec![first.into(), Leaf::note(d(1, 4)).into()];
        meter.rewrite(&mut components, None).unwrap();
        assert_eq!(components, vec![Component::Leaf(Leaf::note(d(1, 2)))]);
    }

    #[test]
    fn test_rewrite_boundary_depth() {
        let meter = Meter::from_pair(2, 4).unwrap();
        let mut components: Vec<Component> = vec![Leaf::note(d(1, 2)).into()];
        meter.rewrite(&mut components, Some(1)).unwrap();
        assert_eq!(components.len(), 2);
        assert!(components[0].as_leaf().unwrap().indicators.tie);
    }

    #[test]
    fn test_rewrite_duration_mismatch() {
        let meter = Meter::from_pair(3, 4).unwrap();
        let mut components: Vec<Component> = vec![Leaf::note(d(1, 2)).into()];
        assert!(meter.rewrite(&mut components, None).is_err());
    }

    #[test]
    fn test_canonic_parts() {
        assert_eq!(canonic_parts(d(5, 16)), vec![d(4, 16), d(1, 16)]);
        assert_eq!(canonic_parts(d(13, 16)), vec![d(12, 16), d(1, 16)]);
        assert_eq!(canonic_parts(d(7, 16)), vec![d(7, 16)]);
    }
}
