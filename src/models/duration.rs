//! Exact rational durations
//!
//! Durations are `num_rational::Rational64` values (always reduced, positive
//! denominator). This module collects the small amount of duration
//! arithmetic the makers need on top of `Ratio`: assignability, dyadic
//! checks, power-of-two rounding, and LilyPond duration strings.

use num_rational::Rational64;

use crate::error::{Result, RhythmError};

/// Exact duration as a fraction of a whole note
pub type Duration = Rational64;

/// Create a duration from a numerator/denominator pair
pub fn duration(numerator: i64, denominator: i64) -> Duration {
    Duration::new(numerator, denominator)
}

/// The zero duration
pub fn zero() -> Duration {
    Duration::from_integer(0)
}

/// Absolute value of a duration
pub fn abs(value: Duration) -> Duration {
    if value < zero() {
        -value
    } else {
        value
    }
}

/// Sum of durations (zero for an empty iterator)
pub fn sum<I>(durations: I) -> Duration
where
    I: IntoIterator<Item = Duration>,
{
    durations.into_iter().fold(zero(), |acc, d| acc + d)
}

/// Sum of absolute values
pub fn weight<I>(durations: I) -> Duration
where
    I: IntoIterator<Item = Duration>,
{
    durations.into_iter().fold(zero(), |acc, d| acc + abs(d))
}

/// Compute GCD of two numbers
pub fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Compute LCM of two numbers
pub fn lcm(a: i64, b: i64) -> i64 {
    if a == 0 || b == 0 {
        0
    } else {
        (a / gcd(a, b) * b).abs()
    }
}

/// True when `n` is 1, 2, 4, 8, ...
pub fn is_positive_power_of_two(n: i64) -> bool {
    n > 0 && (n & (n - 1)) == 0
}

/// True when the duration's denominator is a power of two
pub fn is_dyadic(value: Duration) -> bool {
    is_positive_power_of_two(*value.denom())
}

/// True when `n` is a positive integer whose binary form is `1+0*`
///
/// These are the numerators that can be written with a single notehead
/// plus dots: 1, 2, 3, 4, 6, 7, 8, 12, 14, 15, ...
pub fn is_assignable_integer(n: i64) -> bool {
    if n <= 0 {
        return false;
    }
    let stripped = n >> n.trailing_zeros();
    (stripped & (stripped + 1)) == 0
}

/// True when the duration can be written as one (possibly dotted) leaf
pub fn is_assignable(value: Duration) -> bool {
    zero() < value
        && value < Duration::from_integer(16)
        && is_dyadic(value)
        && is_assignable_integer(*value.numer())
}

/// Greatest power of two less than or equal to positive `n`
pub fn greatest_power_of_two_less_equal(n: i64) -> i64 {
    debug_assert!(n > 0);
    1 << (63 - n.leading_zeros())
}

/// Smallest duration of the form `2^k` (k may be negative) not less than `value`
pub fn equal_or_greater_power_of_two(value: Duration) -> Duration {
    debug_assert!(value > zero());
    let mut result = Duration::from_integer(1);
    while result < value {
        result *= 2;
    }
    while result / 2 >= value {
        result /= 2;
    }
    result
}

/// Convert to floating point
pub fn to_f64(value: Duration) -> f64 {
    *value.numer() as f64 / *value.denom() as f64
}

/// Express `value` over `denominator` when that is exact
///
/// Returns the (possibly nonreduced) pair, or the reduced pair when
/// `denominator` is not a multiple of the reduced denominator.
pub fn pair_with_denominator(value: Duration, denominator: i64) -> (i64, i64) {
    if denominator % value.denom() == 0 {
        let factor = denominator / value.denom();
        (value.numer() * factor, denominator)
    } else {
        (*value.numer(), *value.denom())
    }
}

/// Binary runs of a positive integer, largest first: 13 -> [12, 1]
///
/// Every part is an assignable integer.
pub fn canonic_parts(n: i64) -> Vec<i64> {
    let mut parts = Vec::new();
    let mut run = 0;
    let width = 64 - n.max(0).leading_zeros();
    for shift in (0..width).rev() {
        let bit = 1i64 << shift;
        if n & bit != 0 {
            run += bit;
        } else if run != 0 {
            parts.push(run);
            run = 0;
        }
    }
    if run != 0 {
        parts.push(run);
    }
    parts
}

/// Number of flags (or beams) on a written duration: 1/8 has one, 1/16 two
pub fn flag_count(value: Duration) -> u32 {
    if value <= zero() {
        return 0;
    }
    let floor_log2 = if is_dyadic(value) {
        (63 - value.numer().leading_zeros() as i64) - value.denom().trailing_zeros() as i64
    } else {
        to_f64(value).log2().floor() as i64
    };
    (-floor_log2 - 2).max(0) as u32
}

/// Number of dots needed to write an assignable duration
pub fn dot_count(value: Duration) -> Option<u32> {
    if !is_assignable(value) {
        return None;
    }
    Some(value.numer().count_ones() - 1)
}

/// LilyPond duration string ("4", "8.", "\breve") for an assignable duration
pub fn lilypond_duration_string(value: Duration) -> Option<String> {
    let dots = dot_count(value)?;
    let numerator = *value.numer();
    let top_bit = 63 - numerator.leading_zeros() as i64;
    let denominator_exponent = value.denom().trailing_zeros() as i64;
    let log = denominator_exponent - top_bit;
    let base = match log {
        l if l >= 0 => format!("{}", 1i64 << l),
        -1 => "\\breve".to_string(),
        -2 => "\\longa".to_string(),
        -3 => "\\maxima".to_string(),
        _ => return None,
    };
    Some(format!("{}{}", base, ".".repeat(dots as usize)))
}

/// Parse "3/8", "1" or "-1/16" into a duration
pub fn parse_duration(text: &str) -> Result<Duration> {
    let text = text.trim();
    let parse = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| RhythmError::DurationParse(text.to_string()))
    };
    match text.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator = parse(numerator)?;
            let denominator = parse(denominator)?;
            if denominator == 0 {
                return Err(RhythmError::DurationParse(text.to_string()));
            }
            Ok(duration(numerator, denominator))
        }
        None => Ok(Duration::from_integer(parse(text)?)),
    }
}
