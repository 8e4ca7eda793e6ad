//! Allocator abstraction and the element-typed adapter used by the proxies.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

#[cfg(feature = "alloc")]
use alloc_crate::alloc::{alloc as raw_alloc, dealloc as raw_dealloc};
#[cfg(feature = "alloc")]
use core::mem::transmute;

use const_default::ConstDefault;

use crate::error::ProxyError;

#[inline]
pub(crate) fn array_layout<T>(count: usize) -> Result<Layout, ProxyError> {
    Layout::array::<T>(count).map_err(ProxyError::LayoutError)
}

/// A source of raw memory blocks.
///
/// Release is fallible by contract: an allocator-internal failure during
/// release must surface as a value at this boundary, never as a panic
/// crossing the proxy layer. The stock allocators never fail to release.
pub trait RawAlloc: fmt::Debug {
    fn try_alloc(&self, layout: Layout) -> Result<NonNull<[u8]>, ProxyError>;

    /// # Safety
    /// `ptr` must denote a block currently allocated by this allocator with
    /// the given layout.
    unsafe fn try_release(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), ProxyError>;
}

/// An allocator with a process-wide default instance, constructible in const
/// context.
pub trait RawAllocDefault: RawAlloc + Clone {
    const DEFAULT: Self;
}

/// The global heap allocator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "alloc", derive(Default, Copy))]
pub struct Global;

#[cfg(feature = "alloc")]
impl RawAlloc for Global {
    #[inline]
    fn try_alloc(&self, layout: Layout) -> Result<NonNull<[u8]>, ProxyError> {
        let ptr = if layout.size() == 0 {
            // FIXME: use Layout::dangling when stabilized
            unsafe { NonNull::new_unchecked(transmute(layout.align())) }
        } else {
            let Some(ptr) = NonNull::new(unsafe { raw_alloc(layout) }) else {
                return Err(ProxyError::AllocError);
            };
            ptr
        };
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    #[inline]
    unsafe fn try_release(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), ProxyError> {
        if layout.size() > 0 {
            raw_dealloc(ptr.as_ptr(), layout);
        }
        Ok(())
    }
}

#[cfg(not(feature = "alloc"))]
// Stub implementation to allow Global as the default allocator type.
// Because the type can't be created, errors will still be detected at compile time if used.
impl RawAlloc for Global {
    fn try_alloc(&self, _layout: Layout) -> Result<NonNull<[u8]>, ProxyError> {
        unimplemented!();
    }

    unsafe fn try_release(&self, _ptr: NonNull<u8>, _layout: Layout) -> Result<(), ProxyError> {
        unimplemented!();
    }
}

#[cfg(feature = "alloc")]
impl RawAllocDefault for Global {
    const DEFAULT: Self = Global;
}

#[cfg(feature = "zeroize")]
/// An allocator wrapper which scrubs the contents of each block before
/// releasing it, for buffers that may hold sensitive payload data.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZeroizingAlloc<A>(pub A);

#[cfg(feature = "zeroize")]
impl<A: RawAlloc> RawAlloc for ZeroizingAlloc<A> {
    #[inline]
    fn try_alloc(&self, layout: Layout) -> Result<NonNull<[u8]>, ProxyError> {
        self.0.try_alloc(layout)
    }

    #[inline]
    unsafe fn try_release(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), ProxyError> {
        use zeroize::Zeroize;
        if layout.size() > 0 {
            let mem = core::slice::from_raw_parts_mut(ptr.as_ptr(), layout.size());
            mem.zeroize();
        }
        self.0.try_release(ptr, layout)
    }
}

#[cfg(feature = "zeroize")]
impl<A: RawAllocDefault> RawAllocDefault for ZeroizingAlloc<A> {
    const DEFAULT: Self = ZeroizingAlloc(A::DEFAULT);
}

#[cfg(feature = "allocator-api2")]
/// Adapts any `allocator_api2` allocator to the `RawAlloc` contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApiAlloc<A>(pub A);

#[cfg(feature = "allocator-api2")]
impl<A: allocator_api2::alloc::Allocator + fmt::Debug> RawAlloc for ApiAlloc<A> {
    #[inline]
    fn try_alloc(&self, layout: Layout) -> Result<NonNull<[u8]>, ProxyError> {
        self.0.allocate(layout).map_err(|_| ProxyError::AllocError)
    }

    #[inline]
    unsafe fn try_release(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), ProxyError> {
        self.0.deallocate(ptr, layout);
        Ok(())
    }
}

/// Wraps one allocator instance by value and exposes element-count
/// allocation for a fixed element type `T`.
///
/// This is the only path the proxies use to obtain or release memory. No
/// failure escapes it as a panic: a failed allocation becomes `None` and a
/// failed release becomes `false`.
pub struct AllocAdapter<T, A: RawAlloc = Global> {
    alloc: A,
    _elem: PhantomData<T>,
}

impl<T, A: RawAlloc> AllocAdapter<T, A> {
    #[inline]
    pub const fn new(alloc: A) -> Self {
        Self {
            alloc,
            _elem: PhantomData,
        }
    }

    /// Allocate a block of `count` elements, or `None` if the allocator
    /// fails or the layout is not representable. A zero count is reported
    /// as a failure; the proxies never request an empty block.
    #[inline]
    pub fn allocate(&self, count: usize) -> Option<NonNull<T>> {
        if count == 0 {
            return None;
        }
        let layout = array_layout::<T>(count).ok()?;
        let ptr = self.alloc.try_alloc(layout).ok()?;
        Some(ptr.cast())
    }

    /// Release a block of `count` elements. A null pointer or zero count is
    /// a no-op success. A release failure from the underlying allocator is
    /// contained and reported as `false`.
    ///
    /// # Safety
    /// A non-null `ptr` must have been returned by `allocate(count)` on an
    /// adapter wrapping an equivalent allocator instance.
    #[inline]
    pub unsafe fn deallocate(&self, ptr: *mut T, count: usize) -> bool {
        let Some(ptr) = NonNull::new(ptr) else {
            return true;
        };
        if count == 0 {
            return true;
        }
        let Ok(layout) = array_layout::<T>(count) else {
            return false;
        };
        self.alloc.try_release(ptr.cast(), layout).is_ok()
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.alloc
    }

    #[inline]
    pub fn set_allocator(&mut self, alloc: A) {
        self.alloc = alloc;
    }
}

impl<T, A: RawAlloc + Clone> Clone for AllocAdapter<T, A> {
    #[inline]
    fn clone(&self) -> Self {
        Self::new(self.alloc.clone())
    }
}

impl<T, A: RawAllocDefault> Default for AllocAdapter<T, A> {
    #[inline]
    fn default() -> Self {
        Self::new(A::DEFAULT)
    }
}

impl<T, A: RawAllocDefault> ConstDefault for AllocAdapter<T, A> {
    const DEFAULT: Self = Self::new(A::DEFAULT);
}

impl<T, A: RawAlloc> fmt::Debug for AllocAdapter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocAdapter")
            .field("alloc", &self.alloc)
            .finish()
    }
}
