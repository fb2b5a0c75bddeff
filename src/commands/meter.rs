//! Measures and meter rewriting
//!
//! `wrap_in_time_signature_voice` pairs maker output with time signatures;
//! `split_measures` cuts the music at the barlines and `rewrite_meter`
//! respells each measure against its meter and rebeams it by beat.

use std::collections::VecDeque;
use std::ops::Range;

use super::beams::{beam, detach_beams_from_leaves, make_beamable_groups, BeamOptions};
use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};
use crate::models::{
    leaves_mut, prolated_durations, sum_durations, Component, Container, Leaf, Meter, Multiplier, Staff,
    TimeSignature, Tuplet, Voice,
};

/// Name of the voice holding generated music
pub const MUSIC_VOICE_NAME: &str = "RhythmMaker.Music";

// ============================================================================
// Wrapping
// ============================================================================

/// Put `components` in a voice under `time_signatures`
///
/// Every tuplet must be nonempty with a normalized ratio.
pub fn wrap_in_time_signature_voice(
    components: Vec<Component>,
    time_signatures: &[TimeSignature],
) -> Result<Staff> {
    check_tuplets(&components)?;
    Ok(Staff {
        time_signatures: time_signatures.to_vec(),
        voice: Voice::new(MUSIC_VOICE_NAME, components),
    })
}

fn check_tuplets(components: &[Component]) -> Result<()> {
    for component in components {
        match component {
            Component::Tuplet(tuplet) => {
                if tuplet.is_empty() {
                    return Err(RhythmError::Internal("empty tuplet".to_string()));
                }
                if !tuplet.ratio.is_normalized() {
                    return Err(RhythmError::Internal(format!(
                        "tuplet ratio {}:{} is not normalized",
                        tuplet.ratio.numerator, tuplet.ratio.denominator
                    )));
                }
                check_tuplets(&tuplet.components)?;
            }
            Component::Container(container) => check_tuplets(&container.components)?,
            Component::Leaf(_) => {}
        }
    }
    Ok(())
}

// ============================================================================
// Splitting
// ============================================================================

/// Split `components` so that a component boundary falls at the end of each
/// duration
///
/// Split notes become tied chains; split tuplets become two tuplets with the
/// same ratio.
pub fn split_measures(components: &mut Vec<Component>, durations: &[Duration]) -> Result<()> {
    let expected = duration::sum(durations.iter().copied());
    let actual = sum_durations(components);
    if expected != actual {
        return Err(RhythmError::DurationMismatch { expected, actual });
    }
    let mut boundaries = Vec::with_capacity(durations.len());
    let mut offset = duration::zero();
    for &measure in durations {
        offset += measure;
        boundaries.push(offset);
    }
    boundaries.pop();
    let old = std::mem::take(components);
    *components = split_at(old, &boundaries);
    log::debug!("split_measures: {} measures, {} components", durations.len(), components.len());
    Ok(())
}

/// Index ranges of the components in each measure
///
/// Every measure boundary must already fall between components.
pub fn group_by_measure(components: &[Component], durations: &[Duration]) -> Result<Vec<Range<usize>>> {
    let mut groups = Vec::with_capacity(durations.len());
    let mut index = 0;
    let mut offset = duration::zero();
    let mut measure_stop = duration::zero();
    for &measure in durations {
        measure_stop += measure;
        let start = index;
        while index < components.len() && offset < measure_stop {
            offset += components[index].duration();
            index += 1;
        }
        if offset != measure_stop {
            return Err(RhythmError::Internal(format!(
                "measure boundary at {} falls inside a component",
                measure_stop
            )));
        }
        groups.push(start..index);
    }
    Ok(groups)
}

fn split_at(components: Vec<Component>, boundaries: &[Duration]) -> Vec<Component> {
    let mut result = Vec::with_capacity(components.len());
    let mut queue: VecDeque<Component> = components.into();
    let mut offset = duration::zero();
    while let Some(component) = queue.pop_front() {
        let stop = offset + component.duration();
        match boundaries.iter().find(|&&b| offset < b && b < stop) {
            Some(&boundary) => {
                let (left, right) = split_component(component, boundary - offset);
                for piece in right.into_iter().rev() {
                    queue.push_front(piece);
                }
                for piece in left {
                    offset += piece.duration();
                    result.push(piece);
                }
            }
            None => {
                offset = stop;
                result.push(component);
            }
        }
    }
    result
}

/// Components before and after `at`, which lies strictly inside them
fn partition_at(components: Vec<Component>, at: Duration) -> (Vec<Component>, Vec<Component>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut offset = duration::zero();
    for component in split_at(components, &[at]) {
        if offset < at {
            offset += component.duration();
            left.push(component);
        } else {
            right.push(component);
        }
    }
    (left, right)
}

fn split_component(component: Component, at: Duration) -> (Vec<Component>, Vec<Component>) {
    match component {
        Component::Leaf(leaf) => {
            let (left, right) = split_leaf(leaf, at);
            (
                left.into_iter().map(Component::from).collect(),
                right.into_iter().map(Component::from).collect(),
            )
        }
        Component::Tuplet(tuplet) => {
            let Tuplet {
                ratio,
                components,
                feather_beam,
                notation,
                tag,
            } = tuplet;
            let (left, right) = partition_at(components, at / ratio.multiplier());
            let half = |components| Tuplet {
                ratio,
                components,
                feather_beam,
                notation: notation.clone(),
                tag: tag.clone(),
            };
            (vec![half(left).into()], vec![half(right).into()])
        }
        Component::Container(container) => {
            let (left, right) = partition_at(container.components, at);
            (
                vec![Container { components: left, tag: container.tag.clone() }.into()],
                vec![Container { components: right, tag: container.tag }.into()],
            )
        }
    }
}

/// Split a leaf into a chain before `at` and a chain after it
fn split_leaf(leaf: Leaf, at: Duration) -> (Vec<Leaf>, Vec<Leaf>) {
    let total = leaf.duration();
    let mut left = spell_piece(&leaf, at);
    let mut right = spell_piece(&leaf, total - at);
    let mut chain: Vec<&mut Leaf> = left.iter_mut().chain(right.iter_mut()).collect();
    let last = chain.len() - 1;
    for (i, piece) in chain.iter_mut().enumerate() {
        if leaf.is_pleaf() {
            piece.indicators.tie = i < last || leaf.indicators.tie;
            piece.indicators.repeat_tie = i == 0 && leaf.indicators.repeat_tie;
        }
        if i == 0 {
            piece.indicators.start_beam = leaf.indicators.start_beam;
            piece.indicators.beam_count = leaf.indicators.beam_count;
            piece.indicators.beam_grow_direction = leaf.indicators.beam_grow_direction;
        }
        if i == last {
            piece.indicators.stop_beam = leaf.indicators.stop_beam;
        }
    }
    (left, right)
}

/// Leaves of the same kind lasting `value`
///
/// Dyadic values are written as binary runs; anything else keeps the
/// leaf's written duration and takes a multiplier.
fn spell_piece(leaf: &Leaf, value: Duration) -> Vec<Leaf> {
    if leaf.multiplier.is_none() && duration::is_dyadic(value) {
        let denominator = *value.denom();
        return duration::canonic_parts(*value.numer())
            .into_iter()
            .map(|part| {
                Leaf::new(leaf.kind, duration::duration(part, denominator)).with_tag(leaf.tag.clone())
            })
            .collect();
    }
    let multiplier = Multiplier::from_duration(value / leaf.written_duration);
    vec![Leaf::new(leaf.kind, leaf.written_duration)
        .with_multiplier(multiplier)
        .with_tag(leaf.tag.clone())]
}

// ============================================================================
// Meter rewriting
// ============================================================================

/// Split the voice into measures, respell each against its meter and rebeam
///
/// Each measure uses the best-guess meter of its time signature unless a
/// reference meter with the same pair is given. Beams are stripped from
/// leaves outside tuplets; then each beat filled exactly by whole
/// leaves is beamed, rests excluded. Leaves inside tuplets count with
/// their prolated durations.
pub fn rewrite_meter(staff: &mut Staff, boundary_depth: Option<usize>, reference_meters: &[Meter]) -> Result<()> {
    let meters: Vec<Meter> = staff
        .time_signatures
        .iter()
        .map(|&time_signature| Meter::new(time_signature, false))
        .collect();
    let durations = staff.measure_durations();
    split_measures(&mut staff.voice.components, &durations)?;
    let ranges = group_by_measure(&staff.voice.components, &durations)?;

    let mut remaining = std::mem::take(&mut staff.voice.components);
    let mut measures = Vec::with_capacity(ranges.len());
    for range in ranges.iter().rev() {
        measures.push(remaining.split_off(range.start));
    }
    measures.reverse();

    for (meter, mut measure) in meters.iter().zip(measures) {
        let meter = reference_meters
            .iter()
            .find(|reference| reference.pair() == meter.pair())
            .unwrap_or(meter);
        detach_beams_from_leaves(&mut nontupletted_leaves(&mut measure));
        meter.rewrite(&mut measure, boundary_depth)?;
        let groups = make_beamable_groups(&prolated_durations(&measure), &meter.beat_durations())?;
        let mut leaves = leaves_mut(&mut measure);
        for group in groups {
            if group.is_empty() {
                continue;
            }
            let group = &mut leaves[group];
            detach_beams_from_leaves(group);
            beam(group, &BeamOptions::default());
        }
        staff.voice.components.extend(measure);
    }
    log::debug!("rewrite_meter: {} measures", meters.len());
    Ok(())
}

fn nontupletted_leaves(components: &mut [Component]) -> Vec<&mut Leaf> {
    let mut out = Vec::new();
    for component in components.iter_mut() {
        match component {
            Component::Leaf(leaf) => out.push(leaf),
            Component::Container(container) => out.extend(nontupletted_leaves(&mut container.components)),
            Component::Tuplet(_) => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::duration::duration as d;
    use crate::models::{LeafKind, TupletRatio};

    fn written(components: &[Component]) -> Vec<Duration> {
        crate::models::leaves(components)
            .iter()
            .map(|leaf| leaf.written_duration)
            .collect()
    }

    #[test]
    fn test_split_note_across_barline() {
        let mut components: Vec<Component> =
            vec![Leaf::note(d(1, 2)).into(), Leaf::note(d(1, 4)).into()];
        split_measures(&mut components, &[d(1, 4), d(1, 2)]).unwrap();
        assert_eq!(written(&components), vec![d(1, 4), d(1, 4), d(1, 4)]);
        assert!(components[0].as_leaf().unwrap().indicators.tie);
        assert!(!components[1].as_leaf().unwrap().indicators.tie);
        assert_eq!(group_by_measure(&components, &[d(1, 4), d(1, 2)]).unwrap(), vec![0..1, 1..3]);
    }

    #[test]
    fn test_split_unassignable_piece() {
        let mut components: Vec<Component> = vec![Leaf::note(d(1, 1)).into()];
        split_measures(&mut components, &[d(5, 16), d(11, 16)]).unwrap();
        assert_eq!(written(&components), vec![d(4, 16), d(1, 16), d(8, 16), d(3, 16)]);
        let leaves = crate::models::leaves(&components);
        assert!(leaves[..3].iter().all(|leaf| leaf.indicators.tie));
        assert!(!leaves[3].indicators.tie);
    }

    #[test]
    fn test_split_rest_is_untied() {
        let mut components: Vec<Component> = vec![Leaf::rest(d(1, 2)).into()];
        split_measures(&mut components, &[d(1, 4), d(1, 4)]).unwrap();
        let leaves = crate::models::leaves(&components);
        assert!(leaves.iter().all(|leaf| leaf.kind == LeafKind::Rest && !leaf.indicators.tie));
    }

    #[test]
    fn test_split_tuplet_keeps_ratio() {
        let triplet = Tuplet::new(TupletRatio::new(3, 2), vec![Leaf::note(d(1, 8)).into(); 3]);
        let mut components: Vec<Component> = vec![triplet.into()];
        split_measures(&mut components, &[d(1, 8), d(1, 8)]).unwrap();
        assert_eq!(components.len(), 2);
        for component in &components {
            let tuplet = component.as_tuplet().unwrap();
            assert_eq!(tuplet.ratio, TupletRatio::new(3, 2));
            assert_eq!(tuplet.duration(), d(1, 8));
        }
        assert_eq!(written(&components), vec![d(1, 8), d(1, 16), d(1, 16), d(1, 8)]);
    }

    #[test]
    fn test_split_duration_mismatch() {
        let mut components: Vec<Component> = vec![Leaf::note(d(1, 2)).into()];
        assert_eq!(
            split_measures(&mut components, &[d(1, 4)]).unwrap_err(),
            RhythmError::DurationMismatch {
                expected: d(1, 4),
                actual: d(1, 2)
            }
        );
    }

    #[test]
    fn test_wrap_checks_tuplets() {
        let ts = [TimeSignature::new(1, 4).unwrap()];
        let good: Vec<Component> = vec![Tuplet::trivial(vec![Leaf::note(d(1, 4)).into()]).into()];
        let staff = wrap_in_time_signature_voice(good, &ts).unwrap();
        assert_eq!(staff.voice.name, MUSIC_VOICE_NAME);

        let unnormalized: Vec<Component> =
            vec![Tuplet::new(TupletRatio::new(3, 1), vec![Leaf::note(d(1, 4)).into(); 3]).into()];
        assert!(wrap_in_time_signature_voice(unnormalized, &ts).is_err());
        let empty: Vec<Component> = vec![Tuplet::trivial(vec![]).into()];
        assert!(wrap_in_time_signature_voice(empty, &ts).is_err());
    }

    #[test]
    fn test_rewrite_meter_splits_at_beats_and_barlines() {
        let ts = TimeSignature::new(3, 4).unwrap();
        let components: Vec<Component> =
            vec![Leaf::note(d(5, 8)).into(), Leaf::note(d(7, 8)).into()];
        let mut staff = wrap_in_time_signature_voice(components, &[ts, ts]).unwrap();
        rewrite_meter(&mut staff, None, &[]).unwrap();
        let leaves = staff.voice.leaves();
        let durations: Vec<Duration> = leaves.iter().map(|l| l.written_duration).collect();
        assert_eq!(durations, vec![d(1, 2), d(1, 8), d(1, 8), d(3, 4)]);
        let ties: Vec<bool> = leaves.iter().map(|l| l.indicators.tie).collect();
        assert_eq!(ties, vec![true, false, true, false]);
        // The two eighths fill the last beat of the first measure
        assert!(leaves[1].indicators.start_beam && leaves[2].indicators.stop_beam);
    }

    #[test]
    fn test_rewrite_meter_beams_by_beat() {
        let ts = TimeSignature::new(2, 4).unwrap();
        let components: Vec<Component> = vec![Leaf::note(d(1, 8)).into(); 4];
        let mut staff = wrap_in_time_signature_voice(components, &[ts]).unwrap();
        rewrite_meter(&mut staff, None, &[]).unwrap();
        let beams: Vec<(bool, bool)> = staff
            .voice
            .leaves()
            .iter()
            .map(|l| (l.indicators.start_beam, l.indicators.stop_beam))
            .collect();
        assert_eq!(beams, vec![(true, false), (false, true), (true, false), (false, true)]);
    }

    #[test]
    fn test_rewrite_meter_beams_triplet_by_beat() {
        let ts = TimeSignature::new(2, 4).unwrap();
        let triplet = Tuplet::new(TupletRatio::new(3, 2), vec![Leaf::note(d(1, 8)).into(); 6]);
        let mut staff = wrap_in_time_signature_voice(vec![triplet.into()], &[ts]).unwrap();
        rewrite_meter(&mut staff, None, &[]).unwrap();
        let starts: Vec<bool> = staff.voice.leaves().iter().map(|l| l.indicators.start_beam).collect();
        let stops: Vec<bool> = staff.voice.leaves().iter().map(|l| l.indicators.stop_beam).collect();
        assert_eq!(starts, vec![true, false, false, true, false, false]);
        assert_eq!(stops, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_rewrite_meter_uses_reference_meter() {
        let ts = TimeSignature::new(6, 8).unwrap();
        let reference = Meter::from_groupings(ts, &[2, 2, 2]).unwrap();
        let components: Vec<Component> = vec![Leaf::note(d(1, 8)).into(); 6];
        let mut staff = wrap_in_time_signature_voice(components, &[ts]).unwrap();
        rewrite_meter(&mut staff, None, &[reference]).unwrap();
        let starts = staff
            .voice
            .leaves()
            .iter()
            .filter(|l| l.indicators.start_beam)
            .count();
        assert_eq!(starts, 3);
    }
}
