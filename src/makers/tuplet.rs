//! Tuplet rhythm maker: one tuplet per duration, shaped by a proportion

use super::leaves::make_tuplet;
use super::{check_durations, normalize_nested};
use crate::error::{Result, RhythmError};
use crate::models::duration::Duration;
use crate::models::{Tag, Tuplet};
use crate::utils::Cyclic;

/// Tuplets whose contents follow `proportions`, read cyclically
///
/// Positive proportion entries are notes, negative entries rests. Ratios
/// are normalized so the multiplier lies strictly between 1/2 and 2.
pub fn tuplet(durations: &[Duration], proportions: &[Vec<i64>], tag: &Tag) -> Result<Vec<Tuplet>> {
    check_durations(durations)?;
    if proportions.is_empty() {
        return Err(RhythmError::InvalidProportion(Vec::new()));
    }
    let tag = tag.append_function("tuplet");
    let proportions = Cyclic::new(proportions.to_vec());
    let mut tuplets = Vec::with_capacity(durations.len());
    for (i, &target) in durations.iter().enumerate() {
        let proportion = proportions.get(i as i64).cloned().unwrap_or_default();
        let mut tuplet = make_tuplet(target, &proportion, &tag)?;
        normalize_nested(&mut tuplet);
        tuplets.push(tuplet);
    }
    log::debug!("tuplet: {} tuplets", tuplets.len());
    Ok(tuplets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::duration::duration as d;
    use crate::models::{LeafKind, TupletRatio};

    #[test]
    fn test_three_two_tuplets() {
        let targets = [d(1, 2), d(3, 8), d(5, 16), d(5, 16)];
        let tuplets = tuplet(&targets, &[vec![3, 2]], &Tag::default()).unwrap();
        for (tuplet, target) in tuplets.iter().zip(targets) {
            assert_eq!(tuplet.duration(), target);
            assert!(tuplet.ratio.is_normalized());
            assert_eq!(tuplet.leaves().len(), 2);
        }
        assert_eq!(tuplets[0].ratio, TupletRatio::new(5, 4));
    }

    #[test]
    fn test_rest_entries_and_cycling() {
        let targets = [d(1, 4), d(1, 4)];
        let tuplets = tuplet(&targets, &[vec![1, -1], vec![1, 1, 1]], &Tag::default()).unwrap();
        assert_eq!(tuplets[0].leaves()[1].kind, LeafKind::Rest);
        assert!(tuplets[0].is_trivial());
        assert_eq!(tuplets[1].ratio, TupletRatio::new(3, 2));
    }

    #[test]
    fn test_rejects_bad_proportions() {
        assert!(tuplet(&[d(1, 4)], &[], &Tag::default()).is_err());
        assert!(tuplet(&[d(1, 4)], &[vec![1, 0]], &Tag::default()).is_err());
    }
}
