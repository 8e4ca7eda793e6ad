use core::fmt;
use core::mem;
use core::ptr;

use const_default::ConstDefault;

use crate::alloc::{AllocAdapter, Global, RawAlloc, RawAllocDefault};
use crate::error::ProxyError;
use crate::index::{clamp_index, next_capacity};
use crate::pair::CompressedPair;
use crate::proxy::MemProxy;

/// A memory proxy which tracks allocated capacity separately from used
/// length, enabling amortized growth and capacity reuse after removal.
///
/// This is the richer variant and the one other buffer code should prefer;
/// [`SizeAwareProxy`](crate::proxy::SizeAwareProxy) trades the capacity field
/// for exact allocations.
///
/// Invariants: `capacity >= length`; a null data pointer implies
/// `length == 0`, `capacity == 0`, and not owning (the null state); a
/// non-owning proxy never releases its region, even on drop.
pub struct ContentAwareProxy<T: Copy, A: RawAlloc = Global> {
    store: CompressedPair<AllocAdapter<T, A>, *mut T>,
    length: usize,
    capacity: usize,
    owning: bool,
}

impl<T: Copy, A: RawAllocDefault> ContentAwareProxy<T, A> {
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

impl<T: Copy, A: RawAlloc> ContentAwareProxy<T, A> {
    /// Construct a proxy in the null state with an explicit allocator.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            store: CompressedPair::new(AllocAdapter::new(alloc), ptr::null_mut()),
            length: 0,
            capacity: 0,
            owning: false,
        }
    }

    /// Wrap `length` elements at `ptr` with an explicit allocator. A null
    /// `ptr` yields the null state; otherwise capacity starts equal to
    /// `length`.
    ///
    /// # Safety
    /// Same contract as [`MemProxy::reset`].
    pub unsafe fn from_raw_parts_in(ptr: *mut T, length: usize, owning: bool, alloc: A) -> Self {
        let mut proxy = Self::new_in(alloc);
        if !ptr.is_null() {
            *proxy.store.second_mut() = ptr;
            proxy.length = length;
            proxy.capacity = length;
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
        self.capacity = 0;
        self.owning = false;
    }

    #[inline]
    fn safe_to_delete(&self) -> bool {
        self.owning && !self.data().is_null()
    }

    #[inline]
    fn safe_to_copy(&self) -> bool {
        !self.data().is_null() && self.capacity > 0
    }

    /// Release the current region when safe-to-delete; fields are untouched.
    /// Reports whether the allocator accepted the release.
    fn release_current(&self) -> bool {
        if self.safe_to_delete() {
            unsafe { self.adapter().deallocate(self.data(), self.capacity) }
        } else {
            true
        }
    }

    /// Count of elements the allocation can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
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

    /// Grow the allocation to exactly `new_capacity` elements.
    ///
    /// `new_capacity == 0` is equivalent to [`clear`](Self::clear); a request
    /// at or below the current capacity is a success no-op (capacity is never
    /// shrunk implicitly). On growth the new block is filled with `fill`
    /// before the existing elements are copied over, ownership becomes true,
    /// and length is clamped to the new capacity.
    ///
    /// Allocation failure leaves the proxy untouched. A release failure on
    /// the old block frees the new block and forces the null state.
    pub fn reallocate(&mut self, new_capacity: usize, fill: T) -> Result<(), ProxyError> {
        if new_capacity == 0 {
            return self.clear();
        }
        if new_capacity <= self.capacity {
            return Ok(());
        }
        self.grow_exact(new_capacity, Some(fill))
    }

    fn grow_exact(&mut self, new_capacity: usize, fill: Option<T>) -> Result<(), ProxyError> {
        debug_assert!(new_capacity > self.capacity);
        let Some(block) = self.adapter().allocate(new_capacity) else {
            return Err(ProxyError::AllocError);
        };
        let new_data = block.as_ptr();
        unsafe {
            if let Some(fill) = fill {
                for idx in 0..new_capacity {
                    new_data.add(idx).write(fill);
                }
            }
            let keep = self.length.min(new_capacity);
            if keep > 0 {
                ptr::copy_nonoverlapping(self.data(), new_data, keep);
            }
        }
        if !self.release_current() {
            // the old block is already doomed; free the new one rather than leak it
            unsafe { self.adapter().deallocate(new_data, new_capacity) };
            self.force_null();
            return Err(ProxyError::ReleaseError);
        }
        *self.store.second_mut() = new_data;
        self.length = self.length.min(new_capacity);
        self.capacity = new_capacity;
        self.owning = true;
        Ok(())
    }

    /// Amortized growth used by append and insert: doubles the current
    /// capacity, never settling below `needed`.
    fn ensure_capacity(&mut self, needed: usize, fill: Option<T>) -> Result<(), ProxyError> {
        if needed <= self.capacity {
            return Ok(());
        }
        let target = next_capacity::<T>(self.capacity, needed);
        self.grow_exact(target, fill)
    }

    pub fn append_fill(&mut self, count: usize, fill: T) -> Result<(), ProxyError> {
        if count == 0 {
            return Ok(());
        }
        let Some(needed) = self.length.checked_add(count) else {
            return Err(ProxyError::CapacityLimit);
        };
        self.ensure_capacity(needed, Some(fill))?;
        unsafe {
            let tail = self.data().add(self.length);
            for idx in 0..count {
                tail.add(idx).write(fill);
            }
        }
        self.length = needed;
        Ok(())
    }

    #[inline]
    pub fn append_slice(&mut self, src: &[T]) -> Result<(), ProxyError> {
        unsafe { self.append_from(src.as_ptr(), src.len()) }
    }

    /// # Safety
    /// See [`MemProxy::append_from`].
    pub unsafe fn append_from(&mut self, src: *const T, count: usize) -> Result<(), ProxyError> {
        if count == 0 {
            return Ok(());
        }
        if src.is_null() {
            return Err(ProxyError::NullSource);
        }
        let Some(needed) = self.length.checked_add(count) else {
            return Err(ProxyError::CapacityLimit);
        };
        self.ensure_capacity(needed, None)?;
        // overlap-safe: the source may alias the existing storage
        ptr::copy(src, self.data().add(self.length), count);
        self.length = needed;
        Ok(())
    }

    pub fn insert_fill(&mut self, at: isize, count: usize, fill: T) -> Result<(), ProxyError> {
        if count == 0 {
            return Ok(());
        }
        let index = clamp_index(at, self.length);
        if index == self.length {
            return self.append_fill(count, fill);
        }
        let Some(needed) = self.length.checked_add(count) else {
            return Err(ProxyError::CapacityLimit);
        };
        self.ensure_capacity(needed, Some(fill))?;
        unsafe {
            let base = self.data();
            ptr::copy(base.add(index), base.add(index + count), self.length - index);
            for idx in 0..count {
                base.add(index + idx).write(fill);
            }
        }
        self.length = needed;
        Ok(())
    }

    #[inline]
    pub fn insert_slice(&mut self, at: isize, src: &[T]) -> Result<(), ProxyError> {
        unsafe { self.insert_from(at, src.as_ptr(), src.len()) }
    }

    /// # Safety
    /// See [`MemProxy::insert_from`].
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
        let Some(needed) = self.length.checked_add(count) else {
            return Err(ProxyError::CapacityLimit);
        };
        self.ensure_capacity(needed, None)?;
        let base = self.data();
        ptr::copy(base.add(index), base.add(index + count), self.length - index);
        ptr::copy(src, base.add(index), count);
        self.length = needed;
        Ok(())
    }

    pub fn remove(&mut self, at: isize, count: usize) -> Result<(), ProxyError> {
        if count == 0 || self.length == 0 {
            return Ok(());
        }
        let index = clamp_index(at, self.length);
        let end = index.saturating_add(count);
        if end >= self.length {
            // pure truncation; capacity is retained for reuse
            self.length = index;
            return Ok(());
        }
        unsafe {
            let base = self.data();
            ptr::copy(base.add(end), base.add(index), self.length - end);
        }
        self.length -= count;
        Ok(())
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
            self.capacity = length;
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

impl<T: Copy, A: RawAlloc + Clone> ContentAwareProxy<T, A> {
    /// Replace this proxy's contents with a deep copy of `source`.
    ///
    /// The current region is released first and the source's allocator is
    /// adopted. The source must be safe-to-copy (non-null data and non-zero
    /// capacity); otherwise this proxy is left in the null state and
    /// [`ProxyError::NullSource`] returned. On success the whole capacity is
    /// copied, and this proxy owns the new block.
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
        let Some(block) = self.adapter().allocate(source.capacity) else {
            return Err(ProxyError::AllocError);
        };
        unsafe {
            ptr::copy_nonoverlapping(source.data(), block.as_ptr(), source.capacity);
        }
        *self.store.second_mut() = block.as_ptr();
        self.length = source.length;
        self.capacity = source.capacity;
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

impl<T: Copy, A: RawAlloc> MemProxy for ContentAwareProxy<T, A> {
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
        ContentAwareProxy::is_null(self)
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
        ContentAwareProxy::release(self)
    }

    #[inline]
    unsafe fn reset(&mut self, ptr: *mut T, length: usize, owning: bool) -> Result<(), ProxyError> {
        ContentAwareProxy::reset(self, ptr, length, owning)
    }

    #[inline]
    fn reallocate(&mut self, new_size: usize, fill: T) -> Result<(), ProxyError> {
        ContentAwareProxy::reallocate(self, new_size, fill)
    }

    #[inline]
    fn clear(&mut self) -> Result<(), ProxyError> {
        ContentAwareProxy::clear(self)
    }

    #[inline]
    fn append_fill(&mut self, count: usize, fill: T) -> Result<(), ProxyError> {
        ContentAwareProxy::append_fill(self, count, fill)
    }

    #[inline]
    unsafe fn append_from(&mut self, src: *const T, count: usize) -> Result<(), ProxyError> {
        ContentAwareProxy::append_from(self, src, count)
    }

    #[inline]
    fn insert_fill(&mut self, at: isize, count: usize, fill: T) -> Result<(), ProxyError> {
        ContentAwareProxy::insert_fill(self, at, count, fill)
    }

    #[inline]
    unsafe fn insert_from(
        &mut self,
        at: isize,
        src: *const T,
        count: usize,
    ) -> Result<(), ProxyError> {
        ContentAwareProxy::insert_from(self, at, src, count)
    }

    #[inline]
    fn remove(&mut self, at: isize, count: usize) -> Result<(), ProxyError> {
        ContentAwareProxy::remove(self, at, count)
    }
}

impl<T: Copy, A: RawAllocDefault> Default for ContentAwareProxy<T, A> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, A: RawAllocDefault> ConstDefault for ContentAwareProxy<T, A> {
    const DEFAULT: Self = Self::new_in(A::DEFAULT);
}

impl<T: Copy, A: RawAlloc> Drop for ContentAwareProxy<T, A> {
    fn drop(&mut self) {
        if self.safe_to_delete() {
            // release failures cannot propagate out of drop
            let _ = unsafe { self.adapter().deallocate(self.data(), self.capacity) };
        }
    }
}

impl<T: Copy, A: RawAlloc> fmt::Debug for ContentAwareProxy<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAwareProxy")
            .field("data", &self.data())
            .field("length", &self.length)
            .field("capacity", &self.capacity)
            .field("owning", &self.owning)
            .finish()
    }
}
