//! The memory-proxy contract and its two implementations.
//!
//! A proxy manages one contiguous, possibly-owned region of elements. It can
//! wrap externally owned memory (a capture driver's buffer) without taking
//! ownership, or allocate and own its region, and supports in-place resize,
//! append, insert, and remove with the dual positive/negative index
//! convention described on the individual operations.

use core::slice;

use crate::error::ProxyError;

mod content;
mod sized;

pub use self::content::ContentAwareProxy;
pub use self::sized::SizeAwareProxy;

/// The abstract contract implemented by every proxy variant.
///
/// All mutating operations are atomic from the caller's point of view: a
/// failure detected before any mutation leaves the proxy untouched, and a
/// failure that strikes mid-mutation forces the well-defined null state
/// (`data == null`, `length == 0`, not owning). Failures are values; no
/// operation panics.
pub trait MemProxy {
    type Elem: Copy;

    /// Count of meaningful elements currently stored.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this proxy is responsible for releasing its region.
    fn is_owning(&self) -> bool;

    /// True iff the proxy is in the null state (no data).
    fn is_null(&self) -> bool;

    fn as_ptr(&self) -> *const Self::Elem;

    fn as_mut_ptr(&mut self) -> *mut Self::Elem;

    #[inline]
    fn as_slice(&self) -> &[Self::Elem] {
        let len = self.len();
        if len == 0 {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.as_ptr(), len) }
        }
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [Self::Elem] {
        let len = self.len();
        if len == 0 {
            &mut []
        } else {
            unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
        }
    }

    /// Hand the data pointer to the caller and reset to the null state.
    /// Ownership transfers out regardless of the previous owning flag.
    fn release(&mut self) -> *mut Self::Elem;

    /// Release the current region (when owned) and adopt `(ptr, length,
    /// owning)` wholesale. A null `ptr` yields the null state. If releasing
    /// the current region fails, the proxy is forced to the null state and
    /// the failure reported.
    ///
    /// # Safety
    /// A non-null `ptr` must reference `length` initialized elements, valid
    /// for the lifetime of the proxy; with `owning == true` it must have been
    /// allocated from this proxy's allocator with that element count.
    unsafe fn reset(
        &mut self,
        ptr: *mut Self::Elem,
        length: usize,
        owning: bool,
    ) -> Result<(), ProxyError>;

    /// Resize the underlying region to `new_size` elements, filling any newly
    /// allocated elements with `fill`. `reallocate(0, _)` is equivalent to
    /// [`clear`](MemProxy::clear). See the implementations for their exact
    /// growth semantics.
    fn reallocate(&mut self, new_size: usize, fill: Self::Elem) -> Result<(), ProxyError>;

    /// Release the region when owned and return to the null state.
    fn clear(&mut self) -> Result<(), ProxyError>;

    /// Append `count` copies of `fill`. Appending zero elements is a trivial
    /// success.
    fn append_fill(&mut self, count: usize, fill: Self::Elem) -> Result<(), ProxyError>;

    /// Append a slice of elements.
    #[inline]
    fn append_slice(&mut self, src: &[Self::Elem]) -> Result<(), ProxyError> {
        unsafe { self.append_from(src.as_ptr(), src.len()) }
    }

    /// Append `count` elements read from `src`. A null `src` with non-zero
    /// `count` is rejected as [`ProxyError::NullSource`] with no mutation.
    ///
    /// # Safety
    /// A non-null `src` must be valid for reading `count` elements. The
    /// source may alias this proxy's own storage only if no growth is
    /// required; growth moves the storage out from under the source.
    unsafe fn append_from(&mut self, src: *const Self::Elem, count: usize)
        -> Result<(), ProxyError>;

    /// Insert `count` copies of `fill` at the resolved index.
    ///
    /// Non-negative `at` in `[0, len]` counts from the front (inserting at
    /// `len` degenerates to an append). Negative `at` counts from the back:
    /// `-1` inserts immediately before the last element and `-len` at the
    /// very front. Out-of-range magnitudes clamp to the nearest bound.
    fn insert_fill(&mut self, at: isize, count: usize, fill: Self::Elem)
        -> Result<(), ProxyError>;

    /// Insert a slice of elements at the resolved index.
    #[inline]
    fn insert_slice(&mut self, at: isize, src: &[Self::Elem]) -> Result<(), ProxyError> {
        unsafe { self.insert_from(at, src.as_ptr(), src.len()) }
    }

    /// Insert `count` elements read from `src` at the resolved index. Same
    /// index convention as [`insert_fill`](MemProxy::insert_fill); same null
    /// handling and safety contract as [`append_from`](MemProxy::append_from),
    /// with the addition that the source must not overlap the shifted tail.
    ///
    /// # Safety
    /// See [`append_from`](MemProxy::append_from).
    unsafe fn insert_from(
        &mut self,
        at: isize,
        src: *const Self::Elem,
        count: usize,
    ) -> Result<(), ProxyError>;

    /// Remove `count` elements starting at the resolved index, using the
    /// same index convention as insert. Removing zero elements or removing
    /// from an empty proxy is a trivial success; a removal range reaching the
    /// end is a pure truncation.
    fn remove(&mut self, at: isize, count: usize) -> Result<(), ProxyError>;
}
