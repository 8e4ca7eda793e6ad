//! Two-value storage primitive backing the proxies and [`OwnedPtr`].
//!
//! [`OwnedPtr`]: crate::owned::OwnedPtr

use const_default::ConstDefault;

/// Stores a `(first, second)` pair, where `first` is typically an allocator
/// adapter or a deleter and `second` a data pointer.
///
/// When `F` is zero-sized (a stateless allocator wrapped in an
/// [`AllocAdapter`]) the pair occupies exactly `size_of::<S>()` bytes; Rust's
/// zero-sized fields give the empty-member elision for free. This is a layout
/// optimization, not a correctness requirement.
///
/// [`AllocAdapter`]: crate::alloc::AllocAdapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompressedPair<F, S> {
    first: F,
    second: S,
}

impl<F, S> CompressedPair<F, S> {
    #[inline]
    pub const fn new(first: F, second: S) -> Self {
        Self { first, second }
    }

    #[inline]
    pub fn first(&self) -> &F {
        &self.first
    }

    #[inline]
    pub fn first_mut(&mut self) -> &mut F {
        &mut self.first
    }

    #[inline]
    pub fn second(&self) -> &S {
        &self.second
    }

    #[inline]
    pub fn second_mut(&mut self) -> &mut S {
        &mut self.second
    }

    /// Mutable access to both halves at once.
    #[inline]
    pub fn parts_mut(&mut self) -> (&mut F, &mut S) {
        (&mut self.first, &mut self.second)
    }

    #[inline]
    pub fn into_parts(self) -> (F, S) {
        (self.first, self.second)
    }
}

impl<F: Default, S: Default> Default for CompressedPair<F, S> {
    #[inline]
    fn default() -> Self {
        Self::new(F::default(), S::default())
    }
}

impl<F: ConstDefault, S: ConstDefault> ConstDefault for CompressedPair<F, S> {
    const DEFAULT: Self = Self::new(F::DEFAULT, S::DEFAULT);
}

#[cfg(test)]
mod tests {
    use super::CompressedPair;
    use core::mem::size_of;

    #[derive(Debug, Default, Clone, Copy)]
    struct Empty;

    #[test]
    fn zst_first_costs_nothing() {
        assert_eq!(
            size_of::<CompressedPair<Empty, *mut u8>>(),
            size_of::<*mut u8>()
        );
    }

    #[test]
    fn stateful_first_is_stored() {
        assert!(size_of::<CompressedPair<usize, *mut u8>>() >= size_of::<usize>() * 2);
    }
}
