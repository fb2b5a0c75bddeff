//! Incised rhythm maker
//!
//! Each target becomes prefix + middle + suffix. Prefixes and suffixes are
//! read from their own signed taleas; the middle is whatever weight is left.
//! With `outer_tuplets_only` only the first target gets a prefix and only
//! the last gets a suffix.

use serde::{Deserialize, Serialize};

use super::leaves::{make_components, package_tuplets};
use super::{check_durations, scale_durations};
use crate::error::Result;
use crate::models::duration::{self, Duration};
use crate::models::{Tag, Tuplet};
use crate::specifiers::{Incise, Spelling};
use crate::utils::sequence;
use crate::utils::Cyclic;

/// Keyword options of `incised`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncisedOptions {
    pub extra_counts: Vec<i64>,
    pub spelling: Spelling,
    pub tag: Tag,
}

/// One incised tuplet per duration
pub fn incised(durations: &[Duration], incise: &Incise, options: &IncisedOptions) -> Result<Vec<Tuplet>> {
    check_durations(durations)?;
    incise.validate()?;
    options.spelling.validate()?;
    let tag = options.tag.append_function("incised");

    let (numerators, lcd, multiplier) = scale_durations(durations, incise.talea_denominator);
    let scale = |items: &[i64]| -> Vec<i64> { items.iter().map(|n| n * multiplier).collect() };
    let counts = IncisedCounts {
        prefix_talea: Cyclic::new(scale(&incise.prefix_talea)),
        prefix_counts: Cyclic::or_default_items(incise.prefix_counts.clone(), vec![0]),
        suffix_talea: Cyclic::new(scale(&incise.suffix_talea)),
        suffix_counts: Cyclic::or_default_items(incise.suffix_counts.clone(), vec![0]),
        extra_counts: Cyclic::or_default_items(scale(&options.extra_counts), vec![0]),
    };
    let numerator_lists = if incise.outer_tuplets_only {
        outer_numerator_lists(&numerators, &counts, incise)
    } else {
        numerator_lists(&numerators, &counts, incise)
    };
    log::trace!("incised numerator lists {:?} over denominator {}", numerator_lists, lcd);

    let component_lists = numerator_lists
        .iter()
        .map(|list| {
            let durations: Vec<Duration> = list
                .iter()
                .filter(|&&n| n != 0)
                .map(|&n| duration::duration(n, lcd))
                .collect();
            make_components(&durations, &options.spelling, &tag)
        })
        .collect();
    let tuplets = package_tuplets(durations, component_lists, &tag)?;
    log::debug!("incised: {} tuplets", tuplets.len());
    Ok(tuplets)
}

/// Prefix, suffix and extra counts, already in scaled units
struct IncisedCounts {
    prefix_talea: Cyclic<i64>,
    prefix_counts: Cyclic<usize>,
    suffix_talea: Cyclic<i64>,
    suffix_counts: Cyclic<usize>,
    extra_counts: Cyclic<i64>,
}

impl IncisedCounts {
    /// `numerator` grown by the extra count, taken modulo the numerator
    ///
    /// The residue is never negative, so a negative extra count wraps
    /// around: `-1` on a numerator of 4 gives 7.
    fn prolated(&self, numerator: i64, index: usize) -> i64 {
        let extra = self.extra_counts.get(index as i64).copied().unwrap_or(0);
        numerator + extra.rem_euclid(numerator)
    }

    fn count(cycle: &Cyclic<usize>, index: usize) -> i64 {
        cycle.get(index as i64).copied().unwrap_or(0) as i64
    }
}

fn numerator_lists(numerators: &[i64], counts: &IncisedCounts, incise: &Incise) -> Vec<Vec<i64>> {
    let mut prefix_index = 0;
    let mut suffix_index = 0;
    let mut lists = Vec::new();
    for (i, &numerator) in numerators.iter().enumerate() {
        let prefix_length = IncisedCounts::count(&counts.prefix_counts, i);
        let suffix_length = IncisedCounts::count(&counts.suffix_counts, i);
        let prefix = counts.prefix_talea.slice(prefix_index, prefix_index + prefix_length);
        let suffix = counts.suffix_talea.slice(suffix_index, suffix_index + suffix_length);
        prefix_index += prefix_length;
        suffix_index += suffix_length;
        let numerator = counts.prolated(numerator, i);
        lists.push(incise_numerator(numerator, &prefix, &suffix, incise));
    }
    lists
}

fn outer_numerator_lists(numerators: &[i64], counts: &IncisedCounts, incise: &Incise) -> Vec<Vec<i64>> {
    let prefix = counts
        .prefix_talea
        .slice(0, IncisedCounts::count(&counts.prefix_counts, 0));
    let suffix = counts
        .suffix_talea
        .slice(0, IncisedCounts::count(&counts.suffix_counts, 0));
    let last = numerators.len().saturating_sub(1);
    numerators
        .iter()
        .enumerate()
        .map(|(i, &numerator)| {
            let numerator = counts.prolated(numerator, i);
            let prefix: &[i64] = if i == 0 { &prefix } else { &[] };
            let suffix: &[i64] = if i == last { &suffix } else { &[] };
            incise_numerator(numerator, prefix, suffix, incise)
        })
        .collect()
}

/// `prefix + middle + suffix` for one target of weight `numerator`
///
/// A prefix heavier than the target is cut to fit; the suffix is cut to
/// whatever the prefix leaves.
fn incise_numerator(numerator: i64, prefix: &[i64], suffix: &[i64], incise: &Incise) -> Vec<i64> {
    let prefix_weight = sequence::weight(prefix);
    let suffix_weight = sequence::weight(suffix);
    let middle = numerator - prefix_weight - suffix_weight;
    let prefix = if numerator < prefix_weight {
        sequence::truncate_to_weight(prefix, numerator)
    } else {
        prefix.to_vec()
    };
    let suffix_space = numerator - prefix_weight;
    let suffix = if suffix_space <= 0 {
        Vec::new()
    } else if suffix_space < suffix_weight {
        sequence::truncate_to_weight(suffix, suffix_space)
    } else {
        suffix.to_vec()
    };
    let mut result = prefix;
    result.extend(middle_numerators(middle, incise));
    result.extend(suffix);
    result
}

fn middle_numerators(middle: i64, incise: &Incise) -> Vec<i64> {
    if middle <= 0 {
        return Vec::new();
    }
    if incise.fill_with_rests {
        return vec![-middle];
    }
    match &incise.body_proportion {
        Some(proportion) if !incise.outer_tuplets_only => sequence::divide_by_proportion(middle, proportion),
        _ => vec![middle],
    }
}
