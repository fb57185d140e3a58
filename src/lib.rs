#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod chain;

pub mod encode;

mod error;

pub mod hash;

/// A separate-chaining hash map.
///
/// This module provides [`HashMap`], its iterators, and the [`Builder`] used
/// to configure capacity, seed, and hasher.
pub mod hash_map;

pub use encode::EncodingError;
pub use error::Error;
pub use error::Result;
#[cfg(feature = "foldhash")]
pub use hash::FoldHash;
pub use hash::ByteHasher;
pub use hash::Murmur3;
pub use hash_map::Builder;
pub use hash_map::HashMap;
