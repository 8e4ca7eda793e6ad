//! Allocator-parameterized memory proxies for packet buffers.
//!
//! A proxy backs one contiguous owned-or-borrowed region of elements with
//! resize, append, insert, and remove operations, abstracting over pluggable
//! allocation through [`RawAlloc`]. Two variants are provided:
//! [`ContentAwareProxy`] tracks capacity separately from length for amortized
//! growth, while [`SizeAwareProxy`] keeps no headroom and reallocates exactly.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(test)]
#[macro_use]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc as alloc_crate;

pub mod alloc;

pub(crate) mod error;

pub(crate) mod index;

pub mod owned;

pub mod pair;

pub mod proxy;

pub use {
    self::alloc::{AllocAdapter, Global, RawAlloc, RawAllocDefault},
    self::error::ProxyError,
    self::owned::{AllocDeleter, Deleter, OwnedPtr},
    self::pair::CompressedPair,
    self::proxy::{ContentAwareProxy, MemProxy, SizeAwareProxy},
};

#[cfg(feature = "zeroize")]
pub use self::alloc::ZeroizingAlloc;

#[cfg(feature = "allocator-api2")]
pub use self::alloc::ApiAlloc;

#[cfg(feature = "zeroize")]
/// A content-aware proxy which scrubs released blocks, for sensitive payloads.
pub type ZeroizingProxy<T> = ContentAwareProxy<T, ZeroizingAlloc<Global>>;
