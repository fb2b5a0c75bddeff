// Talea rhythm maker across successive calls

use rhythm_makers::makers::{talea, TaleaOptions};
use rhythm_makers::models::duration::{duration as d, Duration};
use rhythm_makers::models::{leaves, Tuplet};
use rhythm_makers::{Count, State};

fn counts(values: &[i64]) -> Vec<Count> {
    values.iter().map(|&n| Count::Value(n)).collect()
}

fn written(tuplets: &[Tuplet]) -> Vec<Vec<Duration>> {
    tuplets
        .iter()
        .map(|t| t.leaves().iter().map(|l| l.written_duration).collect())
        .collect()
}

#[test]
fn test_basic_talea_reading() {
    let (tuplets, _) = talea(&[d(3, 8), d(4, 8)], &counts(&[1, 2, 3, 4]), 16, &TaleaOptions::default())
        .expect("talea should succeed");

    // 3/8 reads 1, 2, 3; 4/8 continues with 4, 1, 2 and cuts the 3 down to 1
    assert_eq!(
        written(&tuplets),
        vec![
            vec![d(1, 16), d(1, 8), d(3, 16)],
            vec![d(1, 4), d(1, 16), d(1, 8), d(1, 16)],
        ]
    );
    assert!(tuplets.iter().all(|t| t.is_trivial()));
}

#[test]
fn test_state_threads_through_calls() {
    let pattern = counts(&[1, 2, 3, 4]);
    let (_, state) = talea(&[d(3, 8), d(4, 8)], &pattern, 16, &TaleaOptions::default()).unwrap();
    assert!(state.incomplete_last_note);

    let options = TaleaOptions {
        previous_state: state,
        ..TaleaOptions::default()
    };
    let (tuplets, state) = talea(&[d(3, 8)], &pattern, 16, &options).unwrap();

    // The rest of the interrupted 3 and then the 4
    assert_eq!(written(&tuplets), vec![vec![d(1, 8), d(1, 4)]]);
    assert_eq!(state.durations_consumed, 3);
    assert_eq!(state.talea_weight_consumed, Some(20));
    // The continued note is not counted twice
    assert_eq!(state.logical_ties_produced, 8);
    assert!(!state.incomplete_last_note);
}

#[test]
fn test_state_round_trips_through_json() {
    let (_, state) = talea(&[d(3, 8), d(4, 8)], &counts(&[1, 2, 3, 4]), 16, &TaleaOptions::default())
        .unwrap();
    let json = serde_json::to_string(&state).unwrap();
    assert_eq!(
        json,
        r#"{"durations_consumed":2,"incomplete_last_note":true,"logical_ties_produced":7,"talea_weight_consumed":14}"#
    );
    let parsed: State = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, state);
}

#[test]
fn test_unwritten_state_keys_are_omitted() {
    let state = State {
        durations_consumed: 4,
        logical_ties_produced: 9,
        ..State::default()
    };
    let json = serde_json::to_string(&state).unwrap();
    assert_eq!(json, r#"{"durations_consumed":4,"logical_ties_produced":9}"#);

    let parsed: State = serde_json::from_str(r#"{"durations_consumed":4}"#).unwrap();
    assert_eq!(parsed.logical_ties_produced, 0);
    assert_eq!(parsed.talea_weight_consumed, None);
}

#[test]
fn test_duration_conservation_with_rests_and_extra_counts() {
    let targets = [d(5, 16), d(3, 8), d(1, 4), d(7, 16), d(1, 2)];
    let options = TaleaOptions {
        extra_counts: vec![2, 0, -1],
        preamble: vec![-3],
        ..TaleaOptions::default()
    };
    let (tuplets, state) = talea(&targets, &counts(&[2, -1, 1, 3]), 16, &options).unwrap();
    assert_eq!(tuplets.len(), targets.len());
    for (tuplet, target) in tuplets.iter().zip(targets) {
        assert_eq!(tuplet.duration(), target);
        assert!(tuplet.ratio.is_normalized());
    }
    assert_eq!(state.durations_consumed, 5);
    assert!(!leaves(&tuplets).is_empty());
}
