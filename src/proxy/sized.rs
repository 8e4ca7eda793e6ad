use core::fmt;
use core::mem;
use core::ptr;

use const_default::ConstDefault;

use crate::alloc::{AllocAdapter, Global, RawAlloc, RawAllocDefault};
use crate::error::ProxyError;
use crate::index::clamp_index;
use crate::pair::CompressedPair;
use crate::proxy::MemProxy;

/// A memory proxy whose length doubles as its allocated size: no headroom is
/// ever retained, and every size change performs a full
/// allocate-copy-release cycle.
///
/// This variant exists for memory-constrained use; it follows the same state
/// machine, index conventions, and failure discipline as
/// [`ContentAwareProxy`](crate::proxy::ContentAwareProxy) with
/// `capacity == length` at all times.
pub struct SizeAwareProxy<T: Copy, A: RawAlloc = Global> {
    store: CompressedPair<AllocAdapter<T, A>, *mut T>,
    length: usize,
    owning: bool,
}

impl<T: Copy, A: RawAllocDefault> SizeAwareProxy<T, A> {
    /// Construct a proxy in the null state, using the default allocator.
    pub const fn new() -> Self {
        Self::new_in(A::DEFAULT)
    }

    /// Wrap `length` elements at `ptr`, using the default allocator for any
    /// future growth.
    ///
    /// # Safety
    /// Same contract as [`MemProxy::reset`].
    pub unsafe fn from_raw_parts(ptr: *mut T, length: usize, owning: bool) -> Self {
        Self::from_raw_parts_in(ptr, length, owning, A::DEFAULT)
    }
}

impl<T: Copy, A: RawAlloc> SizeAwareProxy<T, A> {
    /// Construct a proxy in the null state with an explicit allocator.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            store: CompressedPair::new(AllocAdapter::new(alloc), ptr::null_mut()),
            length: 0,
            owning: false,
        }
    }

    /// Wrap `length` elements at `ptr` with an explicit allocator. A null
    /// `ptr` yields the null state.
    ///
    /// # Safety
    /// Same contract as [`MemProxy::reset`].
    pub unsafe fn from_raw_parts_in(ptr: *mut T, length: usize, owning: bool, alloc: A) -> Self {
        let mut proxy = Self::new_in(alloc);
        if !ptr.is_null() {
            *proxy.store.second_mut() = ptr;
            proxy.length = length;
            proxy.owning = owning;
        }
        proxy
    }

    #[inline]
    fn data(&self) -> *mut T {
        *self.store.second()
    }

    #[inline]
    fn adapter(&self) -> &AllocAdapter<T, A> {
        self.store.first()
    }

    #[inline]
    fn force_null(&mut self) {
        *self.store.second_mut() = ptr::null_mut();
        self.length = 0;
        self.owning = false;
    }

    #[inline]
    fn safe_to_delete(&self) -> bool {
        self.owning && !self.data().is_null()
    }

    #[inline]
    fn safe_to_copy(&self) -> bool {
        !self.data().is_null() && self.length > 0
    }

    fn release_current(&self) -> bool {
        if self.safe_to_delete() {
            unsafe { self.adapter().deallocate(self.data(), self.length) }
        } else {
            true
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn is_owning(&self) -> bool {
        self.owning
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.data().is_null()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        if self.length == 0 {
            &[]
        } else {
            unsafe { core::slice::from_raw_parts(self.data(), self.length) }
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.length == 0 {
            &mut []
        } else {
            unsafe { core::slice::from_raw_parts_mut(self.data(), self.length) }
        }
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        self.adapter().allocator()
    }

    #[inline]
    pub fn allocator_mut(&mut self) -> &mut A {
        self.store.first_mut().allocator_mut()
    }

    #[inline]
    pub fn set_allocator(&mut self, alloc: A) {
        self.store.first_mut().set_allocator(alloc);
    }

    pub fn clear(&mut self) -> Result<(), ProxyError> {
        let ok = self.release_current();
        self.force_null();
        if ok {
            Ok(())
        } else {
            Err(ProxyError::ReleaseError)
        }
    }

    /// Allocate a fresh block of `new_length` elements, populate it from the
    /// old block via `populate(new, old)`, release the old block, and adopt
    /// the new one. Allocation failure leaves the proxy untouched; a release
    /// failure frees the new block and forces the null state.
    fn rebuild<F>(&mut self, new_length: usize, populate: F) -> Result<(), ProxyError>
    where
        F: FnOnce(*mut T, *const T),
    {
        debug_assert!(new_length > 0);
        let Some(block) = self.adapter().allocate(new_length) else {
            return Err(ProxyError::AllocError);
        };
        let new_data = block.as_ptr();
        populate(new_data, self.data());
        if !self.release_current() {
            unsafe { self.adapter().deallocate(new_data, new_length) };
            self.force_null();
            return Err(ProxyError::ReleaseError);
        }
        *self.store.second_mut() = new_data;
        self.length = new_length;
        self.owning = true;
        Ok(())
    }

    /// Resize to exactly `new_length` elements, filling any new elements with
    /// `fill`. Unlike the content-aware variant, any change of length incurs
    /// a full reallocation; `reallocate(0, _)` clears and a request equal to
    /// the current length is a no-op.
    pub fn reallocate(&mut self, new_length: usize, fill: T) -> Result<(), ProxyError> {
        if new_length == 0 {
            return self.clear();
        }
        if new_length == self.length {
            return Ok(());
        }
        let keep = self.length.min(new_length);
        self.rebuild(new_length, |new_data, old_data| unsafe {
            for idx in 0..new_length {
                new_data.add(idx).write(fill);
            }
            if keep > 0 {
                ptr::copy_nonoverlapping(old_data, new_data, keep);
            }
        })
    }

    pub fn append_fill(&mut self, count: usize, fill: T) -> Result<(), ProxyError> {
        if count == 0 {
            return Ok(());
        }
        let Some(new_length) = self.length.checked_add(count) else {
            return Err(ProxyError::CapacityLimit);
        };
        let keep = self.length;
        self.rebuild(new_length, |new_data, old_data| unsafe {
            if keep > 0 {
                ptr::copy_nonoverlapping(old_data, new_data, keep);
            }
            for idx in keep..new_length {
                new_data.add(idx).write(fill);
            }
        })
    }

    #[inline]
    pub fn append_slice(&mut self, src: &[T]) -> Result<(), ProxyError> {
        unsafe { self.append_from(src.as_ptr(), src.len()) }
    }

    /// # Safety
    /// See [`MemProxy::append_from`]. Since every append reallocates, the
    /// source must not alias this proxy's own storage.
    pub unsafe fn append_from(&mut self, src: *const T, count: usize) -> Result<(), ProxyError> {
        if count == 0 {
            return Ok(());
        }
        if src.is_null() {
            return Err(ProxyError::NullSource);
        }
        let Some(new_length) = self.length.checked_add(count) else {
            return Err(ProxyError::CapacityLimit);
        };
        let keep = self.length;
        self.rebuild(new_length, |new_data, old_data| {
            if keep > 0 {
                ptr::copy_nonoverlapping(old_data, new_data, keep);
            }
            ptr::copy_nonoverlapping(src, new_data.add(keep), count);
        })
    }

    pub fn insert_fill(&mut self, at: isize, count: usize, fill: T) -> Result<(), ProxyError> {
        if count == 0 {
            return Ok(());
        }
        let index = clamp_index(at, self.length);
        if index == self.length {
            return self.append_fill(count, fill);
        }
        let Some(new_length) = self.length.checked_add(count) else {
            return Err(ProxyError::CapacityLimit);
        };
        let tail = self.length - index;
        self.rebuild(new_length, |new_data, old_data| unsafe {
            if index > 0 {
                ptr::copy_nonoverlapping(old_data, new_data, index);
            }
            for idx in 0..count {
                new_data.add(index + idx).write(fill);
            }
            ptr::copy_nonoverlapping(old_data.add(index), new_data.add(index + count), tail);
        })
    }

    #[inline]
    pub fn insert_slice(&mut self, at: isize, src: &[T]) -> Result<(), ProxyError> {
        unsafe { self.insert_from(at, src.as_ptr(), src.len()) }
    }

    /// # Safety
    /// See [`MemProxy::insert_from`]. Since every insert reallocates, the
    /// source must not alias this proxy's own storage.
    pub unsafe fn insert_from(
        &mut self,
        at: isize,
        src: *const T,
        count: usize,
    ) -> Result<(), ProxyError> {
        if count == 0 {
            return Ok(());
        }
        if src.is_null() {
            return Err(ProxyError::NullSource);
        }
        let index = clamp_index(at, self.length);
        if index == self.length {
            return self.append_from(src, count);
        }
        let Some(new_length) = self.length.checked_add(count) else {
            return Err(ProxyError::CapacityLimit);
        };
        let tail = self.length - index;
        self.rebuild(new_length, |new_data, old_data| {
            if index > 0 {
                ptr::copy_nonoverlapping(old_data, new_data, index);
            }
            ptr::copy_nonoverlapping(src, new_data.add(index), count);
            ptr::copy_nonoverlapping(old_data.add(index), new_data.add(index + count), tail);
        })
    }

    /// Remove `count` elements at the resolved index. With no capacity to
    /// retain, removal re-shrinks the allocation: truncation rebuilds at the
    /// shorter length (or clears when nothing remains) and interior removal
    /// rebuilds without the removed range.
    pub fn remove(&mut self, at: isize, count: usize) -> Result<(), ProxyError> {
        if count == 0 || self.length == 0 {
            return Ok(());
        }
        let index = clamp_index(at, self.length);
        let end = index.saturating_add(count);
        if end >= self.length {
            if index == 0 {
                return self.clear();
            }
            return self.rebuild(index, |new_data, old_data| unsafe {
                ptr::copy_nonoverlapping(old_data, new_data, index);
            });
        }
        let tail = self.length - end;
        self.rebuild(self.length - count, |new_data, old_data| unsafe {
            if index > 0 {
                ptr::copy_nonoverlapping(old_data, new_data, index);
            }
            ptr::copy_nonoverlapping(old_data.add(end), new_data.add(index), tail);
        })
    }

    /// # Safety
    /// See [`MemProxy::reset`].
    pub unsafe fn reset(
        &mut self,
        ptr: *mut T,
        length: usize,
        owning: bool,
    ) -> Result<(), ProxyError> {
        let ok = self.release_current();
        self.force_null();
        if !ok {
            return Err(ProxyError::ReleaseError);
        }
        if !ptr.is_null() {
            *self.store.second_mut() = ptr;
            self.length = length;
            self.owning = owning;
        }
        Ok(())
    }

    pub fn release(&mut self) -> *mut T {
        let ptr = self.data();
        self.force_null();
        ptr
    }
}

impl<T: Copy, A: RawAlloc + Clone> SizeAwareProxy<T, A> {
    /// Replace this proxy's contents with a deep copy of `source`; same
    /// contract as
    /// [`ContentAwareProxy::try_clone_from`](crate::proxy::ContentAwareProxy::try_clone_from)
    /// with `capacity == length`.
    pub fn try_clone_from(&mut self, source: &Self) -> Result<(), ProxyError> {
        let ok = self.release_current();
        self.force_null();
        self.store
            .first_mut()
            .set_allocator(source.allocator().clone());
        if !ok {
            return Err(ProxyError::ReleaseError);
        }
        if !source.safe_to_copy() {
            return Err(ProxyError::NullSource);
        }
        let Some(block) = self.adapter().allocate(source.length) else {
            return Err(ProxyError::AllocError);
        };
        unsafe {
            ptr::copy_nonoverlapping(source.data(), block.as_ptr(), source.length);
        }
        *self.store.second_mut() = block.as_ptr();
        self.length = source.length;
        self.owning = true;
        Ok(())
    }

    /// Produce a deep copy of this proxy. Requires the safe-to-copy state.
    pub fn try_clone(&self) -> Result<Self, ProxyError> {
        let mut copy = Self::new_in(self.allocator().clone());
        copy.try_clone_from(self)?;
        Ok(copy)
    }

    /// Move the current state out, leaving this proxy in the null state with
    /// an equivalent allocator.
    pub fn take(&mut self) -> Self {
        let empty = Self::new_in(self.allocator().clone());
        mem::replace(self, empty)
    }
}

impl<T: Copy, A: RawAlloc> MemProxy for SizeAwareProxy<T, A> {
    type Elem = T;

    #[inline]
    fn len(&self) -> usize {
        self.length
    }

    #[inline]
    fn is_owning(&self) -> bool {
        self.owning
    }

    #[inline]
    fn is_null(&self) -> bool {
        SizeAwareProxy::is_null(self)
    }

    #[inline]
    fn as_ptr(&self) -> *const T {
        self.data()
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut T {
        self.data()
    }

    #[inline]
    fn release(&mut self) -> *mut T {
        SizeAwareProxy::release(self)
    }

    #[inline]
    unsafe fn reset(&mut self, ptr: *mut T, length: usize, owning: bool) -> Result<(), ProxyError> {
        SizeAwareProxy::reset(self, ptr, length, owning)
    }

    #[inline]
    fn reallocate(&mut self, new_size: usize, fill: T) -> Result<(), ProxyError> {
        SizeAwareProxy::reallocate(self, new_size, fill)
    }

    #[inline]
    fn clear(&mut self) -> Result<(), ProxyError> {
        SizeAwareProxy::clear(self)
    }

    #[inline]
    fn append_fill(&mut self, count: usize, fill: T) -> Result<(), ProxyError> {
        SizeAwareProxy::append_fill(self, count, fill)
    }

    #[inline]
    unsafe fn append_from(&mut self, src: *const T, count: usize) -> Result<(), ProxyError> {
        SizeAwareProxy::append_from(self, src, count)
    }

    #[inline]
    fn insert_fill(&mut self, at: isize, count: usize, fill: T) -> Result<(), ProxyError> {
        SizeAwareProxy::insert_fill(self, at, count, fill)
    }

    #[inline]
    unsafe fn insert_from(
        &mut self,
        at: isize,
        src: *const T,
        count: usize,
    ) -> Result<(), ProxyError> {
        SizeAwareProxy::insert_from(self, at, src, count)
    }

    #[inline]
    fn remove(&mut self, at: isize, count: usize) -> Result<(), ProxyError> {
        SizeAwareProxy::remove(self, at, count)
    }
}

impl<T: Copy, A: RawAllocDefault> Default for SizeAwareProxy<T, A> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, A: RawAllocDefault> ConstDefault for SizeAwareProxy<T, A> {
    const DEFAULT: Self = Self::new_in(A::DEFAULT);
}

impl<T: Copy, A: RawAlloc> Drop for SizeAwareProxy<T, A> {
    fn drop(&mut self) {
        if self.safe_to_delete() {
            // release failures cannot propagate out of drop
            let _ = unsafe { self.adapter().deallocate(self.data(), self.length) };
        }
    }
}

impl<T: Copy, A: RawAlloc> fmt::Debug for SizeAwareProxy<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeAwareProxy")
            .field("data", &self.data())
            .field("length", &self.length)
            .field("owning", &self.owning)
            .finish()
    }
}
