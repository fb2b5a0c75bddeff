// Scenarios for the non-talea rhythm makers

use rhythm_makers::makers::{
    accelerando, even_division, incised, multiplied_duration, note, tuplet, AccelerandoOptions,
    EvenDivisionOptions, IncisedOptions,
};
use rhythm_makers::models::duration::{self, duration as d, Duration};
use rhythm_makers::models::{leaves, logical_tie_count, sum_durations, LeafKind, TupletRatio};
use rhythm_makers::{Incise, Interpolation, RhythmError, Spelling, Tag};

fn signed_written(leaves: &[&rhythm_makers::Leaf]) -> Vec<Duration> {
    leaves
        .iter()
        .map(|leaf| match leaf.kind {
            LeafKind::Rest => -leaf.written_duration,
            _ => leaf.written_duration,
        })
        .collect()
}

#[test]
fn test_even_division_extra_counts_modulation() {
    let options = EvenDivisionOptions {
        extra_counts: vec![0, 1, 2],
        ..EvenDivisionOptions::default()
    };
    let (tuplets, _) = even_division(&[d(3, 8); 5], &[16], &options).unwrap();
    let ratios: Vec<TupletRatio> = tuplets.iter().map(|t| t.ratio).collect();
    assert_eq!(
        ratios,
        vec![
            TupletRatio::new(6, 6),
            TupletRatio::new(7, 6),
            TupletRatio::new(8, 6),
            TupletRatio::new(6, 6),
            TupletRatio::new(7, 6),
        ]
    );
    assert_eq!(sum_durations(&tuplets), d(15, 8));
}

#[test]
fn test_incised_prefix_rest() {
    let incise = Incise::new(16).unwrap().prefix(vec![-1], vec![1]);
    let tuplets = incised(&[d(5, 16); 4], &incise, &IncisedOptions::default()).unwrap();
    for tuplet in &tuplets {
        assert!(tuplet.is_trivial());
        assert_eq!(signed_written(&tuplet.leaves()), vec![d(-1, 16), d(1, 4)]);
    }
}

#[test]
fn test_incised_rejects_talea_without_counts() {
    let incise = Incise::new(16).unwrap().prefix(vec![-1], vec![]);
    assert!(matches!(
        incised(&[d(1, 4)], &incise, &IncisedOptions::default()),
        Err(RhythmError::MissingCounts(_))
    ));
}

#[test]
fn test_note_forbidden_duration_splitting() {
    let spelling = Spelling::new().forbid_notes(d(1, 4));
    let components = note(&[d(7, 16)], &spelling, &Tag::default()).unwrap();
    let all = leaves(&components);
    assert!(all.len() > 1);
    assert!(all.iter().all(|leaf| leaf.written_duration < d(1, 4)));
    assert!(all[..all.len() - 1].iter().all(|leaf| leaf.indicators.tie));
    assert_eq!(sum_durations(&components), d(7, 16));
    assert_eq!(logical_tie_count(&components), 1);
}

#[test]
fn test_accelerando_sums_exactly() {
    let options = AccelerandoOptions {
        interpolations: vec![
            Interpolation::new(d(1, 8), d(1, 32), d(1, 16)).unwrap(),
            Interpolation::new(d(1, 32), d(1, 8), d(1, 16)).unwrap(),
        ],
        ..AccelerandoOptions::default()
    };
    let targets = [d(5, 8), d(3, 4), d(1, 8)];
    let (tuplets, state) = accelerando(&targets, &options).unwrap();
    for (tuplet, target) in tuplets.iter().zip(targets) {
        assert_eq!(tuplet.duration(), target);
    }
    // 1/8 is too short to interpolate and becomes one plain note
    assert_eq!(tuplets[2].leaves().len(), 1);
    assert_eq!(state.durations_consumed, 3);
}

#[test]
fn test_tuplet_proportions() {
    let tuplets = tuplet(&[d(1, 2), d(3, 8)], &[vec![1, -1, 1]], &Tag::default()).unwrap();
    assert_eq!(tuplets[0].leaves()[1].kind, LeafKind::Rest);
    for (tuplet, target) in tuplets.iter().zip([d(1, 2), d(3, 8)]) {
        assert_eq!(tuplet.duration(), target);
        assert!(tuplet.ratio.is_normalized());
    }
}

#[test]
fn test_multiplied_duration_keeps_written_value() {
    let leaves = multiplied_duration(&[d(3, 16), d(5, 8)], LeafKind::Note, d(1, 1), &Tag::default()).unwrap();
    assert!(leaves.iter().all(|leaf| leaf.written_duration == d(1, 1)));
    assert_eq!(
        duration::sum(leaves.iter().map(|leaf| leaf.duration())),
        d(13, 16)
    );
}

#[test]
fn test_makers_reject_nonpositive_durations() {
    let result = note(&[d(1, 4), d(0, 1)], &Spelling::default(), &Tag::default());
    assert!(matches!(result, Err(RhythmError::NonPositiveDuration { .. })));
}
