#![cfg(all(feature = "alloc", feature = "zeroize"))]

use core::alloc::Layout;
use core::cell::RefCell;
use core::ptr::NonNull;
use core::slice;

use mem_proxy::{
    ContentAwareProxy, Global, ProxyError, RawAlloc, SizeAwareProxy, ZeroizingAlloc,
    ZeroizingProxy,
};

const SECRET: &[u8] = &[0xA5, 0x5A, 0xC3, 0x3C, 0x99];

/// Records the contents of every released block before forwarding the
/// release, so tests can inspect what the scrubbing wrapper left behind.
#[derive(Debug)]
struct ReleaseLog<A: RawAlloc> {
    alloc: A,
    released: RefCell<Vec<Vec<u8>>>,
}

impl<A: RawAlloc> ReleaseLog<A> {
    fn new(alloc: A) -> Self {
        Self {
            alloc,
            released: RefCell::new(Vec::new()),
        }
    }
}

impl<A: RawAlloc> RawAlloc for &ReleaseLog<A> {
    fn try_alloc(&self, layout: Layout) -> Result<NonNull<[u8]>, ProxyError> {
        self.alloc.try_alloc(layout)
    }

    unsafe fn try_release(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), ProxyError> {
        let cp = Vec::from(slice::from_raw_parts(ptr.as_ptr(), layout.size()));
        self.released.borrow_mut().push(cp);
        self.alloc.try_release(ptr, layout)
    }
}

#[test]
fn release_log_captures_contents() {
    // check functioning of the release log itself, without scrubbing
    let log = ReleaseLog::new(Global);
    let mut p = ContentAwareProxy::<u8, _>::new_in(&log);
    p.append_slice(SECRET).unwrap();
    drop(p);
    let released = log.released.borrow();
    assert_eq!(released.len(), 1);
    assert!(released[0].starts_with(SECRET));
}

#[test]
fn scrubs_on_drop() {
    let log = ReleaseLog::new(Global);
    let mut p = ContentAwareProxy::<u8, _>::new_in(ZeroizingAlloc(&log));
    p.append_slice(SECRET).unwrap();
    drop(p);
    let released = log.released.borrow();
    assert_eq!(released.len(), 1);
    assert!(released[0].iter().all(|b| *b == 0));
}

#[test]
fn scrubs_old_block_on_growth() {
    let log = ReleaseLog::new(Global);
    let mut p = ContentAwareProxy::<u8, _>::new_in(ZeroizingAlloc(&log));
    p.append_slice(SECRET).unwrap();
    let cap = p.capacity();
    p.reallocate(cap + 100, 0).unwrap();
    assert_eq!(&p.as_slice()[..SECRET.len()], SECRET);
    let released = log.released.borrow();
    assert_eq!(released.len(), 1);
    assert!(released[0].iter().all(|b| *b == 0));
}

#[test]
fn scrubs_on_clear() {
    let log = ReleaseLog::new(Global);
    let mut p = SizeAwareProxy::<u8, _>::new_in(ZeroizingAlloc(&log));
    p.append_slice(SECRET).unwrap();
    p.clear().unwrap();
    assert!(p.is_null());
    let released = log.released.borrow();
    assert_eq!(released.len(), 1);
    assert!(released[0].iter().all(|b| *b == 0));
}

#[test]
fn zeroizing_proxy_alias() {
    let mut p = ZeroizingProxy::<u8>::new();
    p.append_slice(SECRET).unwrap();
    p.insert_fill(0, 2, 0).unwrap();
    p.remove(-1, 1).unwrap();
    assert_eq!(p.len(), SECRET.len() + 1);
}
