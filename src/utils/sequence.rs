//! Weight-based sequence operations
//!
//! The weight of a sequence is the sum of the absolute values of its items.
//! Splitting cuts items at weight boundaries (keeping each piece's sign);
//! partitioning groups whole items without cutting them.

use crate::models::duration::{self, Duration};

/// Sum of absolute values
pub fn weight(items: &[i64]) -> i64 {
    items.iter().map(|x| x.abs()).sum()
}

/// Rotate right by `n` (left when negative)
pub fn rotate<T: Clone>(items: &[T], n: i64) -> Vec<T> {
    if items.is_empty() {
        return Vec::new();
    }
    let len = items.len() as i64;
    let shift = n.rem_euclid(len) as usize;
    let split = items.len() - shift;
    items[split..]
        .iter()
        .chain(items[..split].iter())
        .cloned()
        .collect()
}

/// Cut `items` into parts of the given weights
///
/// Items straddling a boundary are split into two pieces of the same sign.
/// With `cyclic` the weights repeat until the items run out; otherwise what
/// is left after the last weight forms a final part, kept only when
/// `overhang` is set. An incomplete final cyclic part is likewise kept only
/// with `overhang`.
pub fn split_by_weights(items: &[i64], weights: &[i64], cyclic: bool, overhang: bool) -> Vec<Vec<i64>> {
    let mut result = Vec::new();
    let mut current: Vec<i64> = Vec::new();
    let mut current_weight = 0;
    let mut weight_index = 0;
    let next_target = |index: usize| -> Option<i64> {
        if weights.is_empty() {
            None
        } else if cyclic {
            Some(weights[index % weights.len()])
        } else {
            weights.get(index).copied()
        }
    };

    for &item in items {
        let sign = item.signum();
        let mut remaining = item.abs();
        while remaining > 0 {
            let target = match next_target(weight_index) {
                Some(target) => target,
                None => {
                    current.push(sign * remaining);
                    current_weight += remaining;
                    break;
                }
            };
            let needed = target - current_weight;
            if remaining < needed {
                current.push(sign * remaining);
                current_weight += remaining;
                remaining = 0;
            } else {
                if needed > 0 {
                    current.push(sign * needed);
                }
                result.push(std::mem::take(&mut current));
                current_weight = 0;
                remaining -= needed;
                weight_index += 1;
            }
        }
    }
    if !current.is_empty() && overhang {
        result.push(current);
    }
    result
}

/// Repeat `items` cyclically until their weight is exactly `total`,
/// truncating the final item
pub fn repeat_to_weight(items: &[i64], total: i64) -> Vec<i64> {
    let mut result = Vec::new();
    if items.is_empty() || weight(items) == 0 {
        return result;
    }
    let mut current = 0;
    for &item in items.iter().cycle() {
        if current >= total {
            break;
        }
        let available = total - current;
        if item.abs() <= available {
            result.push(item);
            current += item.abs();
        } else {
            result.push(item.signum() * available);
            current = total;
        }
    }
    result
}

/// Keep items up to weight `total`, truncating the last one kept
pub fn truncate_to_weight(items: &[i64], total: i64) -> Vec<i64> {
    let mut result = Vec::new();
    let mut current = 0;
    for &item in items {
        if current >= total {
            break;
        }
        let available = total - current;
        if item.abs() <= available {
            result.push(item);
            current += item.abs();
        } else {
            result.push(item.signum() * available);
            current = total;
        }
    }
    result
}

/// How `partition_by_weights` treats a part that overshoots its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartWeights {
    /// Parts must hit their weight exactly
    Exact,
    /// A part closes as soon as it reaches or passes its weight
    More,
}

/// Group whole items into consecutive parts by weight
///
/// Returns `None` when `PartWeights::Exact` is requested and an item
/// straddles a boundary.
pub fn partition_by_weights(
    items: &[i64],
    weights: &[i64],
    mode: PartWeights,
    cyclic: bool,
    overhang: bool,
) -> Option<Vec<Vec<i64>>> {
    let mut result = Vec::new();
    let mut current: Vec<i64> = Vec::new();
    let mut current_weight = 0;
    let mut weight_index = 0;

    for &item in items {
        let target = if weights.is_empty() {
            None
        } else if cyclic {
            Some(weights[weight_index % weights.len()])
        } else {
            weights.get(weight_index).copied()
        };
        current.push(item);
        let target = match target {
            Some(target) => target,
            None => continue,
        };
        current_weight += item.abs();
        if current_weight == target || (mode == PartWeights::More && target < current_weight) {
            result.push(std::mem::take(&mut current));
            current_weight = 0;
            weight_index += 1;
        } else if target < current_weight {
            return None;
        }
    }
    if !current.is_empty() && overhang {
        result.push(current);
    }
    Some(result)
}

/// Divide `total` into integer parts proportional to `proportion`
///
/// Parts are floored quotas with the leftover units handed to the largest
/// remainders, earlier parts winning ties. A negative proportion entry
/// yields a negative part.
pub fn divide_by_proportion(total: i64, proportion: &[i64]) -> Vec<i64> {
    let denominator = weight(proportion);
    if denominator == 0 {
        return Vec::new();
    }
    let mut parts: Vec<i64> = proportion
        .iter()
        .map(|p| total * p.abs() / denominator)
        .collect();
    let mut remainders: Vec<(i64, usize)> = proportion
        .iter()
        .enumerate()
        .map(|(i, p)| (total * p.abs() % denominator, i))
        .collect();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    let leftover = total - parts.iter().sum::<i64>();
    for &(_, index) in remainders.iter().take(leftover as usize) {
        parts[index] += 1;
    }
    parts
        .into_iter()
        .zip(proportion)
        .map(|(part, p)| if *p < 0 { -part } else { part })
        .collect()
}

/// Integers as whole-number durations divided by `denominator`
pub fn to_durations(items: &[i64], denominator: i64) -> Vec<Duration> {
    items
        .iter()
        .map(|&n| duration::duration(n, denominator))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate() {
        assert_eq!(rotate(&[1, 2, 3], 1), vec![3, 1, 2]);
        assert_eq!(rotate(&[1, 2, 3], -1), vec![2, 3, 1]);
        assert_eq!(rotate(&[1, 2, 3], -4), vec![2, 3, 1]);
    }

    #[test]
    fn test_split_by_weights() {
        let parts = split_by_weights(&[1, 2, 3, 4, 1, 2, 3, 4], &[6, 8], false, false);
        assert_eq!(parts, vec![vec![1, 2, 3], vec![4, 1, 2, 1]]);

        let parts = split_by_weights(&[3, -5], &[2], true, true);
        assert_eq!(parts, vec![vec![2], vec![1, -1], vec![-2], vec![-2]]);

        let parts = split_by_weights(&[4, 4], &[3], false, true);
        assert_eq!(parts, vec![vec![3], vec![1, 4]]);
    }

    #[test]
    fn test_repeat_and_truncate() {
        assert_eq!(repeat_to_weight(&[1, -2, 3], 8), vec![1, -2, 3, 1, -1]);
        assert_eq!(truncate_to_weight(&[4, -4, 4], 6), vec![4, -2]);
    }

    #[test]
    fn test_partition_by_weights() {
        let items = [2, 2, 4, -2];
        let parts = partition_by_weights(&items, &[4], PartWeights::Exact, true, true).unwrap();
        assert_eq!(parts, vec![vec![2, 2], vec![4], vec![-2]]);

        let parts = partition_by_weights(&items, &[3], PartWeights::More, true, true).unwrap();
        assert_eq!(parts, vec![vec![2, 2], vec![4], vec![-2]]);

        assert!(partition_by_weights(&items, &[3], PartWeights::Exact, true, true).is_none());

        let parts = partition_by_weights(&items, &[4], PartWeights::Exact, false, false).unwrap();
        assert_eq!(parts, vec![vec![2, 2]]);
    }

    #[test]
    fn test_divide_by_proportion() {
        assert_eq!(divide_by_proportion(10, &[1, 1, 1]), vec![4, 3, 3]);
        assert_eq!(divide_by_proportion(8, &[1, 2, 1]), vec![2, 4, 2]);
        assert_eq!(divide_by_proportion(5, &[1, -1]), vec![3, -2]);
    }
}
