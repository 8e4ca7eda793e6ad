#![allow(dead_code)]

use core::alloc::Layout;
use core::ptr::NonNull;
use std::alloc::{alloc as raw_alloc, dealloc as raw_dealloc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use mem_proxy::{ProxyError, RawAlloc};

#[derive(Debug, Default)]
pub struct AllocState {
    pub allocs: AtomicUsize,
    pub releases: AtomicUsize,
    pub fail_allocs: AtomicBool,
    pub fail_releases: AtomicBool,
}

impl AllocState {
    pub fn alloc_count(&self) -> usize {
        self.allocs.load(Ordering::Relaxed)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }

    pub fn fail_allocs(&self, fail: bool) {
        self.fail_allocs.store(fail, Ordering::Relaxed);
    }

    pub fn fail_releases(&self, fail: bool) {
        self.fail_releases.store(fail, Ordering::Relaxed);
    }
}

/// A heap allocator which counts allocations and releases, and can be
/// switched to fail either operation to exercise the failure-recovery paths.
#[derive(Debug, Clone, Copy)]
pub struct CountingAlloc(pub &'static AllocState);

impl CountingAlloc {
    pub fn new() -> Self {
        Self(Box::leak(Box::new(AllocState::default())))
    }

    pub fn state(&self) -> &'static AllocState {
        self.0
    }
}

impl RawAlloc for CountingAlloc {
    fn try_alloc(&self, layout: Layout) -> Result<NonNull<[u8]>, ProxyError> {
        if self.0.fail_allocs.load(Ordering::Relaxed) {
            return Err(ProxyError::AllocError);
        }
        let ptr =
            NonNull::new(unsafe { raw_alloc(layout) }).ok_or(ProxyError::AllocError)?;
        self.0.allocs.fetch_add(1, Ordering::Relaxed);
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn try_release(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), ProxyError> {
        if self.0.fail_releases.load(Ordering::Relaxed) {
            // the block is intentionally leaked; the caller is being tested
            // on its recovery, not on reclaiming doomed memory
            return Err(ProxyError::ReleaseError);
        }
        raw_dealloc(ptr.as_ptr(), layout);
        self.0.releases.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
