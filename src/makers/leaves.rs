//! Leaf spelling
//!
//! Turns exact durations into notated leaves. A dyadic duration becomes one
//! leaf per binary run of its numerator (13/16 is 3/4 + 1/16), tied together
//! when the leaves are notes. Pieces that reach a forbidden duration are cut
//! into smaller pieces first. A non-dyadic duration is spelled at a dyadic
//! written value and wrapped in a tuplet that restores its real length.

use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};
use crate::models::{Component, Leaf, LeafKind, Tag, Tuplet, TupletRatio};
use crate::specifiers::Spelling;

// ============================================================================
// Leaves
// ============================================================================

/// Leaves of kind `kind` lasting exactly `duration`
///
/// Returns bare leaves for dyadic durations and a single tuplet otherwise.
pub fn make_leaves(duration: Duration, kind: LeafKind, spelling: &Spelling, tag: &Tag) -> Vec<Component> {
    debug_assert!(duration > duration::zero(), "leaf duration must be positive");
    if duration::is_dyadic(duration) {
        return make_tied_leaves(duration, kind, spelling, tag)
            .into_iter()
            .map(Component::from)
            .collect();
    }
    let denominator = *duration.denom();
    let multiplier = duration::duration(
        duration::greatest_power_of_two_less_equal(denominator),
        denominator,
    );
    let leaves = make_tied_leaves(duration / multiplier, kind, spelling, tag);
    let tuplet = Tuplet::new(
        TupletRatio::from_multiplier(multiplier),
        leaves.into_iter().map(Component::from).collect(),
    )
    .with_tag(tag.clone());
    vec![tuplet.into()]
}

/// Notes for positive durations and rests for negative ones
pub fn make_components(durations: &[Duration], spelling: &Spelling, tag: &Tag) -> Vec<Component> {
    let mut components = Vec::new();
    for &value in durations {
        debug_assert!(value != duration::zero());
        let kind = if value > duration::zero() {
            LeafKind::Note
        } else {
            LeafKind::Rest
        };
        components.extend(make_leaves(duration::abs(value), kind, spelling, tag));
    }
    components
}

fn make_tied_leaves(duration: Duration, kind: LeafKind, spelling: &Spelling, tag: &Tag) -> Vec<Leaf> {
    let forbidden = match kind {
        LeafKind::Note => spelling.forbidden_note_duration,
        LeafKind::Rest => spelling.forbidden_rest_duration,
        LeafKind::Skip | LeafKind::MultimeasureRest => None,
    };
    let (mut numerators, denominator) = match forbidden {
        Some(forbidden) if forbidden <= duration => {
            // Common denominator in which the forbidden duration has an even numerator
            let denominator = duration::lcm(2 * forbidden.denom(), *duration.denom());
            let forbidden_numerator = forbidden.numer() * (denominator / forbidden.denom());
            let numerator = duration.numer() * (denominator / duration.denom());
            let preferred = forbidden_numerator / 2;
            let mut numerators = Vec::new();
            for part in duration::canonic_parts(numerator) {
                if forbidden_numerator <= part {
                    numerators.extend(parts_less_than_double(part, preferred));
                } else {
                    numerators.push(part);
                }
            }
            (numerators, denominator)
        }
        _ => (duration::canonic_parts(*duration.numer()), *duration.denom()),
    };
    if spelling.increase_monotonic {
        numerators.reverse();
    }
    let count = numerators.len();
    numerators
        .into_iter()
        .enumerate()
        .map(|(i, numerator)| {
            let mut leaf =
                Leaf::new(kind, duration::duration(numerator, denominator)).with_tag(tag.clone());
            leaf.indicators.tie = kind == LeafKind::Note && i + 1 < count;
            leaf
        })
        .collect()
}

/// Pieces of `m` while at least `2m` remains, then the remainder
fn parts_less_than_double(n: i64, m: i64) -> Vec<i64> {
    let mut parts = Vec::new();
    let mut current = n;
    while 2 * m <= current {
        parts.push(m);
        current -= m;
    }
    parts.push(current);
    parts
}

// ============================================================================
// Tuplets
// ============================================================================

/// Tuplet lasting `duration` whose contents follow `proportion`
///
/// Positive entries are notes and negative entries rests. The unit of the
/// contents is chosen so the proportion's weight lands near the duration's
/// numerator; the tuplet ratio absorbs the difference.
pub fn make_tuplet(duration: Duration, proportion: &[i64], tag: &Tag) -> Result<Tuplet> {
    if proportion.is_empty() || proportion.contains(&0) {
        return Err(RhythmError::InvalidProportion(proportion.to_vec()));
    }
    if duration <= duration::zero() {
        return Err(RhythmError::non_positive("tuplet duration", duration));
    }
    let spelling = Spelling::default();
    if let [only] = proportion {
        let kind = if *only > 0 { LeafKind::Note } else { LeafKind::Rest };
        let components = make_leaves(duration, kind, &spelling, tag);
        return Ok(Tuplet::trivial(components).with_tag(tag.clone()));
    }
    let weight = proportion.iter().map(|x| x.abs()).sum::<i64>();
    let exponent = ((weight as f64).log2() - (*duration.numer() as f64).log2()).trunc() as i64;
    let denominator = if exponent >= 0 {
        duration.denom() << exponent
    } else {
        (duration.denom() >> -exponent).max(1)
    };
    let mut components = Vec::new();
    for &x in proportion {
        let kind = if x > 0 { LeafKind::Note } else { LeafKind::Rest };
        let piece = duration::duration(x.abs(), denominator);
        components.extend(make_leaves(piece, kind, &spelling, tag));
    }
    Ok(Tuplet::from_duration(duration, components).with_tag(tag.clone()))
}

/// Wrap each component list in a tuplet lasting the matching target duration
pub fn package_tuplets(
    durations: &[Duration],
    component_lists: Vec<Vec<Component>>,
    tag: &Tag,
) -> Result<Vec<Tuplet>> {
    if durations.len() != component_lists.len() {
        return Err(RhythmError::Internal(format!(
            "{} durations for {} component lists",
            durations.len(),
            component_lists.len()
        )));
    }
    durations
        .iter()
        .zip(component_lists)
        .map(|(&target, components)| {
            if components.is_empty() {
                return Err(RhythmError::Internal(format!(
                    "no components to fill {}",
                    target
                )));
            }
            Ok(Tuplet::from_duration(target, components).with_tag(tag.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::duration::duration as d;
    use crate::models::leaves;

    fn written(components: &[Component]) -> Vec<Duration> {
        leaves(components).iter().map(|l| l.written_duration).collect()
    }

    #[test]
    fn test_canonic_spelling_is_tied() {
        let components = make_leaves(d(13, 16), LeafKind::Note, &Spelling::default(), &Tag::default());
        assert_eq!(written(&components), vec![d(3, 4), d(1, 16)]);
        let all = leaves(&components);
        assert!(all[0].indicators.tie);
        assert!(!all[1].indicators.tie);
    }

    #[test]
    fn test_rests_are_not_tied() {
        let components = make_leaves(d(5, 16), LeafKind::Rest, &Spelling::default(), &Tag::default());
        assert_eq!(written(&components), vec![d(1, 4), d(1, 16)]);
        assert!(leaves(&components).iter().all(|l| !l.indicators.tie));
    }

    #[test]
    fn test_forbidden_note_duration() {
        let spelling = Spelling::new().forbid_notes(d(1, 4));
        let components = make_leaves(d(7, 16), LeafKind::Note, &spelling, &Tag::default());
        assert_eq!(written(&components), vec![d(1, 8), d(1, 8), d(3, 16)]);
        assert!(written(&components).iter().all(|&w| w < d(1, 4)));

        let components = make_leaves(d(1, 4), LeafKind::Note, &spelling, &Tag::default());
        assert_eq!(written(&components), vec![d(1, 8), d(1, 8)]);

        // The ceiling only applies to notes
        let components = make_leaves(d(7, 16), LeafKind::Rest, &spelling, &Tag::default());
        assert_eq!(written(&components), vec![d(7, 16)]);
    }

    #[test]
    fn test_increase_monotonic() {
        let spelling = Spelling::new().increase_monotonic(true);
        let components = make_leaves(d(5, 16), LeafKind::Note, &spelling, &Tag::default());
        assert_eq!(written(&components), vec![d(1, 16), d(1, 4)]);
    }

    #[test]
    fn test_nondyadic_duration_in_tuplet() {
        let components = make_leaves(d(5, 12), LeafKind::Note, &Spelling::default(), &Tag::default());
        assert_eq!(components.len(), 1);
        let tuplet = components[0].as_tuplet().unwrap();
        assert_eq!(tuplet.ratio, TupletRatio::new(3, 2));
        assert_eq!(written(&components), vec![d(1, 2), d(1, 8)]);
        assert_eq!(tuplet.duration(), d(5, 12));
    }

    #[test]
    fn test_make_components_signs() {
        let components = make_components(&[d(1, 8), d(-1, 4)], &Spelling::default(), &Tag::default());
        let all = leaves(&components);
        assert_eq!(all[0].kind, LeafKind::Note);
        assert_eq!(all[1].kind, LeafKind::Rest);
    }

    #[test]
    fn test_make_tuplet() {
        let tuplet = make_tuplet(d(1, 2), &[1, 1, 1], &Tag::default()).unwrap();
        assert_eq!(tuplet.ratio, TupletRatio::new(3, 2));
        assert_eq!(written(&tuplet.components), vec![d(1, 4); 3]);

        let tuplet = make_tuplet(d(1, 4), &[1, -1, 2], &Tag::default()).unwrap();
        assert!(tuplet.is_trivial());
        assert_eq!(tuplet.leaves()[1].kind, LeafKind::Rest);
        assert_eq!(tuplet.duration(), d(1, 4));

        let tuplet = make_tuplet(d(5, 16), &[1], &Tag::default()).unwrap();
        assert!(tuplet.is_trivial());
        assert_eq!(tuplet.duration(), d(5, 16));

        assert!(make_tuplet(d(1, 4), &[1, 0], &Tag::default()).is_err());
    }

    #[test]
    fn test_package_tuplets() {
        let lists = vec![
            make_components(&[d(1, 16); 7], &Spelling::default(), &Tag::default()),
        ];
        let tuplets = package_tuplets(&[d(3, 8)], lists, &Tag::default()).unwrap();
        assert_eq!(tuplets[0].ratio, TupletRatio::new(7, 6));
        assert!(package_tuplets(&[d(3, 8)], vec![vec![]], &Tag::default()).is_err());
    }
}
