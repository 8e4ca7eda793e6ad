use core::ptr;

use rstest::rstest;

use mem_proxy::{MemProxy, ProxyError, SizeAwareProxy};

mod common;
use common::CountingAlloc;

const SLICE: &[u8] = &[1, 2, 3, 4, 5];

fn filled(data: &[u8]) -> SizeAwareProxy<u8> {
    let mut p = SizeAwareProxy::<u8>::new();
    p.append_slice(data).unwrap();
    p
}

#[test]
fn new_is_null_state() {
    let p = SizeAwareProxy::<u8>::new();
    assert!(p.is_null());
    assert_eq!(p.len(), 0);
    assert!(!p.is_owning());
    assert!(p.as_ptr().is_null());
}

#[test]
fn reallocate_sets_length_and_fills() {
    let mut p = SizeAwareProxy::<u8>::new();
    p.reallocate(4, 7).unwrap();
    assert_eq!(p.as_slice(), &[7, 7, 7, 7]);
    assert_eq!(p.len(), 4);
    assert!(p.is_owning());
}

#[test]
fn reallocate_same_length_is_noop() {
    let mut p = filled(SLICE);
    let data = p.as_ptr();
    p.reallocate(5, 0).unwrap();
    assert_eq!(p.as_ptr(), data);
    assert_eq!(p.as_slice(), SLICE);
}

#[test]
fn reallocate_shrink_copies_prefix() {
    let mut p = filled(SLICE);
    p.reallocate(3, 0).unwrap();
    assert_eq!(p.as_slice(), &[1, 2, 3]);
}

#[test]
fn reallocate_grow_preserves_prefix() {
    let mut p = filled(SLICE);
    p.reallocate(7, 9).unwrap();
    assert_eq!(p.as_slice(), &[1, 2, 3, 4, 5, 9, 9]);
}

#[test]
fn reallocate_zero_clears() {
    let mut p = filled(SLICE);
    p.reallocate(0, 0).unwrap();
    assert!(p.is_null());
    assert_eq!(p.len(), 0);
    assert!(!p.is_owning());
}

#[test]
fn every_growth_reallocates_exactly() {
    let alloc = CountingAlloc::new();
    let mut p = SizeAwareProxy::<u8, CountingAlloc>::new_in(alloc);
    for idx in 0..10u8 {
        p.append_fill(1, idx).unwrap();
        assert_eq!(p.len(), idx as usize + 1);
    }
    // one allocation per append, and every old block released
    assert_eq!(alloc.state().alloc_count(), 10);
    assert_eq!(alloc.state().release_count(), 9);
}

#[test]
fn append_zero_is_trivial_success() {
    let mut p = filled(SLICE);
    let data = p.as_ptr();
    p.append_fill(0, 0).unwrap();
    p.append_slice(&[]).unwrap();
    assert_eq!(p.as_ptr(), data);
    assert_eq!(p.as_slice(), SLICE);
}

#[test]
fn append_null_source_rejected_without_mutation() {
    let mut p = filled(SLICE);
    let res = unsafe { p.append_from(ptr::null(), 3) };
    assert_eq!(res, Err(ProxyError::NullSource));
    assert_eq!(p.as_slice(), SLICE);
}

#[test]
fn insert_and_remove_concrete_scenario() {
    let mut p = filled(SLICE);
    p.insert_fill(2, 2, 0).unwrap();
    assert_eq!(p.as_slice(), &[1, 2, 0, 0, 3, 4, 5]);
    assert_eq!(p.len(), 7);
    p.remove(2, 2).unwrap();
    assert_eq!(p.as_slice(), SLICE);
    // re-shrunk: length doubles as the allocated size
    assert_eq!(p.len(), 5);
}

#[rstest]
#[case::back_one(-1, 4)]
#[case::back_full(-5, 0)]
#[case::back_mid(-3, 2)]
fn insert_negative_index_equivalence(#[case] neg: isize, #[case] pos: isize) {
    let mut a = filled(SLICE);
    let mut b = filled(SLICE);
    a.insert_fill(neg, 2, 0).unwrap();
    b.insert_fill(pos, 2, 0).unwrap();
    assert_eq!(a.as_slice(), b.as_slice());
}

#[test]
fn insert_out_of_range_clamps() {
    let mut front = filled(SLICE);
    front.insert_fill(-100, 1, 9).unwrap();
    assert_eq!(front.as_slice(), &[9, 1, 2, 3, 4, 5]);

    let mut back = filled(SLICE);
    back.insert_fill(100, 1, 9).unwrap();
    assert_eq!(back.as_slice(), &[1, 2, 3, 4, 5, 9]);
}

#[test]
fn insert_slice_interior() {
    let mut p = filled(SLICE);
    p.insert_slice(1, &[8, 9]).unwrap();
    assert_eq!(p.as_slice(), &[1, 8, 9, 2, 3, 4, 5]);
}

#[test]
fn remove_truncation_reshrinks_allocation() {
    let alloc = CountingAlloc::new();
    let mut p = SizeAwareProxy::<u8, CountingAlloc>::new_in(alloc);
    p.append_slice(SLICE).unwrap();
    let before = alloc.state().alloc_count();
    p.remove(3, 100).unwrap();
    assert_eq!(p.as_slice(), &[1, 2, 3]);
    // truncation still reallocates; no headroom is retained
    assert_eq!(alloc.state().alloc_count(), before + 1);
}

#[test]
fn remove_everything_clears() {
    let mut p = filled(SLICE);
    p.remove(0, 5).unwrap();
    assert!(p.is_null());
    assert_eq!(p.len(), 0);
    assert!(!p.is_owning());
}

#[test]
fn remove_from_empty_is_trivial_success() {
    let mut p = SizeAwareProxy::<u8>::new();
    p.remove(0, 3).unwrap();
    assert!(p.is_null());
}

#[test]
fn remove_negative_index() {
    let mut p = filled(SLICE);
    p.remove(-2, 1).unwrap();
    assert_eq!(p.as_slice(), &[1, 2, 3, 5]);
}

#[test]
fn try_clone_is_deep() {
    let p = filled(SLICE);
    let copy = p.try_clone().unwrap();
    assert_eq!(copy.as_slice(), p.as_slice());
    assert_ne!(copy.as_ptr(), p.as_ptr());
    assert!(copy.is_owning());
}

#[test]
fn try_clone_from_unsafe_source_forces_null() {
    let src = SizeAwareProxy::<u8>::new();
    let mut dst = filled(SLICE);
    assert_eq!(dst.try_clone_from(&src), Err(ProxyError::NullSource));
    assert!(dst.is_null());
}

#[test]
fn take_drains_source() {
    let mut p = filled(SLICE);
    let moved = p.take();
    assert!(p.is_null());
    assert!(!p.is_owning());
    assert_eq!(moved.as_slice(), SLICE);
}

#[test]
fn release_and_adopt_round_trip() {
    let mut p = filled(SLICE);
    let len = p.len();
    let ptr = p.release();
    assert!(p.is_null());
    // length equals the allocated size for this variant, so the adopting
    // proxy frees with the correct count
    let adopted = unsafe { SizeAwareProxy::<u8>::from_raw_parts(ptr, len, true) };
    assert_eq!(adopted.as_slice(), SLICE);
}

#[test]
fn reset_adopts_foreign_memory_non_owning() {
    let alloc = CountingAlloc::new();
    let mut backing = [10u8, 11, 12];
    let mut p = SizeAwareProxy::<u8, CountingAlloc>::new_in(alloc);
    unsafe { p.reset(backing.as_mut_ptr(), backing.len(), false).unwrap() };
    assert_eq!(p.as_slice(), &[10, 11, 12]);
    assert!(!p.is_owning());
    drop(p);
    assert_eq!(alloc.state().release_count(), 0);
}

#[test]
fn alloc_failure_leaves_proxy_untouched() {
    let alloc = CountingAlloc::new();
    let mut p = SizeAwareProxy::<u8, CountingAlloc>::new_in(alloc);
    p.append_slice(SLICE).unwrap();
    alloc.state().fail_allocs(true);
    assert_eq!(p.append_fill(1, 0), Err(ProxyError::AllocError));
    assert_eq!(p.remove(1, 2), Err(ProxyError::AllocError));
    assert_eq!(p.as_slice(), SLICE);
    assert!(p.is_owning());
}

#[test]
fn release_failure_forces_null_state() {
    let alloc = CountingAlloc::new();
    let mut p = SizeAwareProxy::<u8, CountingAlloc>::new_in(alloc);
    p.append_slice(SLICE).unwrap();
    alloc.state().fail_releases(true);
    assert_eq!(p.append_fill(1, 0), Err(ProxyError::ReleaseError));
    assert!(p.is_null());
    assert_eq!(p.len(), 0);
    assert!(!p.is_owning());
}

#[test]
fn trait_object_dispatch() {
    let mut p = SizeAwareProxy::<u8>::new();
    let proxy: &mut dyn MemProxy<Elem = u8> = &mut p;
    proxy.append_fill(4, 1).unwrap();
    proxy.remove(0, 2).unwrap();
    assert_eq!(proxy.as_slice(), &[1, 1]);
}
