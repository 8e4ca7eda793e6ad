//! A move-only owning pointer with a pluggable deleter.

use core::fmt;
use core::ptr::{self, NonNull};

use crate::alloc::{array_layout, Global, RawAlloc, RawAllocDefault};
use crate::pair::CompressedPair;

/// Destroys a pointer's referent and releases its storage.
pub trait Deleter<T> {
    /// # Safety
    /// `ptr` must be owned by the caller and match this deleter's contract
    /// (for allocator-backed deleters, a block obtained from an equivalent
    /// allocator with the same element count).
    unsafe fn delete(&self, ptr: NonNull<T>);
}

/// A deleter which releases a block of `count` elements through a
/// [`RawAlloc`]. Release failures are contained; a deleter cannot fail.
#[derive(Debug, Clone)]
pub struct AllocDeleter<A: RawAlloc = Global> {
    alloc: A,
    count: usize,
}

impl<A: RawAlloc> AllocDeleter<A> {
    #[inline]
    pub const fn new(alloc: A, count: usize) -> Self {
        Self { alloc, count }
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl<A: RawAllocDefault> AllocDeleter<A> {
    /// A deleter for a single element allocated from the default allocator.
    pub const SINGLE: Self = Self::new(A::DEFAULT, 1);
}

impl<T, A: RawAlloc> Deleter<T> for AllocDeleter<A> {
    #[inline]
    unsafe fn delete(&self, ptr: NonNull<T>) {
        if self.count == 0 {
            return;
        }
        if let Ok(layout) = array_layout::<T>(self.count) {
            let _ = self.alloc.try_release(ptr.cast(), layout);
        }
    }
}

/// Unique ownership of a raw pointer, destroyed through a deleter held
/// alongside it in a [`CompressedPair`].
///
/// The pointer is either null (empty) or owned. Dropping an owned pointer
/// invokes the deleter; [`release`](OwnedPtr::release) transfers the pointer
/// out without invoking it. There is no `Clone`: ownership only moves, and a
/// moved-from value cannot be touched again, so the "source forced to empty"
/// rule holds without any bookkeeping.
pub struct OwnedPtr<T, D: Deleter<T>> {
    inner: CompressedPair<D, *mut T>,
}

impl<T, D: Deleter<T>> OwnedPtr<T, D> {
    /// Construct an empty pointer with the given deleter.
    #[inline]
    pub const fn empty_in(deleter: D) -> Self {
        Self {
            inner: CompressedPair::new(deleter, ptr::null_mut()),
        }
    }

    /// Take ownership of `ptr`, to be destroyed with `deleter`.
    ///
    /// # Safety
    /// A non-null `ptr` must be valid and owned by the caller, and must match
    /// the deleter's contract.
    #[inline]
    pub unsafe fn from_raw_in(ptr: *mut T, deleter: D) -> Self {
        Self {
            inner: CompressedPair::new(deleter, ptr),
        }
    }

    #[inline]
    pub fn get(&self) -> *mut T {
        *self.inner.second()
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.inner.second().is_null()
    }

    #[inline]
    pub fn deleter(&self) -> &D {
        self.inner.first()
    }

    /// Replace the held pointer, invoking the deleter on the previous one if
    /// it was non-null.
    ///
    /// # Safety
    /// Same contract as [`from_raw_in`](OwnedPtr::from_raw_in).
    pub unsafe fn reset(&mut self, ptr: *mut T) {
        let (deleter, slot) = self.inner.parts_mut();
        let prev = core::mem::replace(slot, ptr);
        if let Some(prev) = NonNull::new(prev) {
            deleter.delete(prev);
        }
    }

    /// Transfer the pointer to the caller without invoking the deleter,
    /// leaving this value empty.
    #[inline]
    pub fn release(&mut self) -> *mut T {
        core::mem::replace(self.inner.second_mut(), ptr::null_mut())
    }
}

impl<T, D: Deleter<T> + Default> Default for OwnedPtr<T, D> {
    #[inline]
    fn default() -> Self {
        Self::empty_in(D::default())
    }
}

impl<T, D: Deleter<T>> Drop for OwnedPtr<T, D> {
    fn drop(&mut self) {
        if let Some(ptr) = NonNull::new(*self.inner.second()) {
            unsafe { self.inner.first().delete(ptr) };
        }
    }
}

impl<T, D: Deleter<T> + fmt::Debug> fmt::Debug for OwnedPtr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedPtr")
            .field("ptr", self.inner.second())
            .field("deleter", self.inner.first())
            .finish()
    }
}
