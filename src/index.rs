//! Index resolution and growth policy helpers.

/// Resolve a signed element index against the current length.
///
/// Non-negative indices count from the front and clamp to `length`; negative
/// indices count from the back (`-1` lands just before the last element,
/// `-length` at the very front) and clamp to `0`. Out-of-range magnitudes
/// clamp to the nearest bound by contract rather than failing.
#[inline]
pub(crate) fn clamp_index(at: isize, length: usize) -> usize {
    if at >= 0 {
        (at as usize).min(length)
    } else {
        length - at.unsigned_abs().min(length)
    }
}

pub(crate) const fn min_non_zero_cap<T>() -> usize {
    if core::mem::size_of::<T>() == 1 {
        8
    } else if core::mem::size_of::<T>() <= 1024 {
        4
    } else {
        1
    }
}

/// Doubling growth for amortized append/insert on the content-aware proxy.
/// Never returns less than `minimum`.
#[inline]
pub(crate) fn next_capacity<T>(prev: usize, minimum: usize) -> usize {
    let preferred = if prev == 0 {
        min_non_zero_cap::<T>()
    } else {
        prev.saturating_mul(2)
    };
    preferred.max(minimum)
}
