//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a signed coordinate to an array index, returning `None` for
/// negative values.
#[must_use]
pub fn coord_to_index(value: i32) -> Option<usize> {
    cast::<i32, usize>(value)
}

/// Convert a grid dimension to the signed domain used by positions,
/// clamping oversized values instead of wrapping.
#[must_use]
pub fn dim_to_i32(value: u32) -> i32 {
    cast::<u32, i32>(value).unwrap_or(i32::MAX)
}

/// Convert a count to f64 while allowing precision loss in a single place.
#[must_use]
pub fn count_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Ratio of `part` over `whole`, returning 0.0 for an empty denominator.
#[must_use]
pub fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        count_to_f64(part) / count_to_f64(whole)
    }
}
