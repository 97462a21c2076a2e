//! # fast-hashtable
//!
//! Two hash tables for restricted integer key domains, plus a sharding
//! wrapper that lifts one of the restrictions.
//!
//! - [`BoundedIntMap`]: a growable map from keys in `[0, max_key()]` to `i64`
//!   values. Every bucket is one presence word and a row of value slots, so
//!   lookups are a division, a remainder and a bit test.
//! - [`ShardedBoundedIntMap`]: lazily allocated [`BoundedIntMap`] shards that
//!   cover the full non-negative `i64` key range.
//! - [`LongSetBuilder`] / [`FrozenLongSet`]: a set of non-negative `i64`s
//!   that buffers inserts, then freezes them into a table whose size is
//!   searched so that no bucket is much longer than a binary search would be.
//! - [`LongSet`]: the same set behind one type, with phase misuse reported
//!   as [`Error`]s.
//!
//! Mutations are strict (a negative key is an [`Error::OutOfRange`]) while
//! queries are permissive (anything that cannot be present is absent).
//!
//! ## Example
//!
//! ```rust
//! use fast_hashtable::BoundedIntMap;
//!
//! let mut map = BoundedIntMap::new();
//! map.put(7, 700)?;
//! map.put(map.max_key() + 1, 1)?; // grows
//!
//! assert_eq!(map.get(7), Some(700));
//! assert!(!map.contains_key(-1));
//! assert!(map.put(-1, 0).is_err());
//! # Ok::<(), fast_hashtable::Error>(())
//! ```

#![deny(unsafe_code)]

mod bounded;
mod config;
mod error;
mod frozen;
mod long_set;
pub mod prime;
mod sharded;

pub use bounded::{BoundedIntMap, Iter};
pub use config::SizingConfig;
pub use error::{Error, Result};
pub use frozen::{FinalizeReport, FrozenLongSet, LongSetBuilder, LookupStats};
pub use long_set::LongSet;
pub use sharded::ShardedBoundedIntMap;

/// Slots per [`BoundedIntMap`] bucket: the bit width of a presence word.
pub const WORD_BITS: u32 = u32::BITS;

#[cfg(test)]
mod proptests;
