//! Multiplied-duration rhythm maker
//!
//! One leaf per duration, all written with the same duration and carrying
//! a multiplier for their real length: `c'1 * 3/16`.

use super::check_durations;
use crate::error::{Result, RhythmError};
use crate::models::duration::{self, Duration};
use crate::models::{Leaf, LeafKind, Multiplier, Tag};

/// Leaves of `kind` written as `written` and multiplied to each duration
///
/// The multiplier is kept over the least common multiple of the target's
/// denominator and its own, so 1/4 written as a half note reads `* 2/4`.
pub fn multiplied_duration(
    durations: &[Duration],
    kind: LeafKind,
    written: Duration,
    tag: &Tag,
) -> Result<Vec<Leaf>> {
    check_durations(durations)?;
    if written <= duration::zero() {
        return Err(RhythmError::non_positive("written duration", written));
    }
    if !duration::is_dyadic(written) {
        return Err(RhythmError::NonDyadicDuration(written));
    }
    let tag = tag.append_function("multiplied_duration");
    Ok(durations
        .iter()
        .map(|&target| {
            let fraction = target / written;
            let denominator = duration::lcm(*target.denom(), *fraction.denom());
            let (numerator, denominator) = duration::pair_with_denominator(fraction, denominator);
            Leaf::new(kind, written)
                .with_multiplier(Multiplier::new(numerator, denominator))
                .with_tag(tag.clone())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::duration::duration as d;

    #[test]
    fn test_whole_note_multipliers() {
        let targets = [d(1, 4), d(3, 16), d(5, 8), d(1, 3)];
        let leaves = multiplied_duration(&targets, LeafKind::Note, d(1, 1), &Tag::default()).unwrap();
        let multipliers: Vec<(i64, i64)> = leaves
            .iter()
            .map(|l| {
                let m = l.multiplier.unwrap();
                (m.numerator, m.denominator)
            })
            .collect();
        assert_eq!(multipliers, vec![(1, 4), (3, 16), (5, 8), (1, 3)]);
        for (leaf, target) in leaves.iter().zip(targets) {
            assert_eq!(leaf.duration(), target);
        }
    }

    #[test]
    fn test_nonreduced_multiplier() {
        let leaves = multiplied_duration(&[d(1, 4)], LeafKind::Rest, d(1, 2), &Tag::default()).unwrap();
        assert_eq!(leaves[0].multiplier, Some(Multiplier::new(2, 4)));
        assert_eq!(leaves[0].kind, LeafKind::Rest);
    }

    #[test]
    fn test_rejects_bad_written_duration() {
        assert!(multiplied_duration(&[d(1, 4)], LeafKind::Note, d(0, 1), &Tag::default()).is_err());
        assert!(multiplied_duration(&[d(1, 4)], LeafKind::Note, d(1, 3), &Tag::default()).is_err());
    }
}
