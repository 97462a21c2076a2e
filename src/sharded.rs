//! Extends [`BoundedIntMap`] to the full non-negative `i64` key range by
//! spreading keys over lazily allocated fixed-width shards.

use crate::bounded::BoundedIntMap;
use crate::error::{Error, Result};
use std::collections::BTreeMap;

const SHARD_CAPACITY: usize = 1 << 16;

/// [`BoundedIntMap`] shards keyed by `key / SHARD_WIDTH`.
///
/// Shards are created on the first `put` that lands in them and the directory
/// only holds allocated shards, so memory follows the number of occupied key
/// ranges rather than the largest key. A missing shard answers every query
/// with "absent".
#[derive(Clone, Default)]
pub struct ShardedBoundedIntMap {
    shards: BTreeMap<u64, BoundedIntMap>,
}

impl ShardedBoundedIntMap {
    /// Number of keys covered by each shard.
    pub const SHARD_WIDTH: i64 = SHARD_CAPACITY as i64;

    pub fn new() -> Self {
        Self {
            shards: BTreeMap::new(),
        }
    }

    /// Splits a key into `(shard index, key inside the shard)`, or `None` for
    /// a negative key.
    #[inline]
    fn split(key: i64) -> Option<(u64, i64)> {
        let idx = u64::try_from(key / Self::SHARD_WIDTH).ok()?;
        (key >= 0).then_some((idx, key % Self::SHARD_WIDTH))
    }

    #[inline]
    fn shard(&self, key: i64) -> Option<(&BoundedIntMap, i64)> {
        let (idx, inner) = Self::split(key)?;
        let shard = self.shards.get(&idx)?;
        Some((shard, inner))
    }

    /// Inserts `value` under `key`, returning the previous value, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a negative key.
    pub fn put(&mut self, key: i64, value: i64) -> Result<Option<i64>> {
        let Some((idx, inner)) = Self::split(key) else {
            return Err(Error::OutOfRange { key });
        };
        let shard = self.shards.entry(idx).or_insert_with(|| {
            log::trace!("allocating int map shard {idx}");
            BoundedIntMap::with_capacity(SHARD_CAPACITY)
        });
        shard.put(inner, value)
    }

    #[inline]
    pub fn contains_key(&self, key: i64) -> bool {
        self.shard(key)
            .is_some_and(|(shard, inner)| shard.contains_key(inner))
    }

    #[inline]
    pub fn get(&self, key: i64) -> Option<i64> {
        let (shard, inner) = self.shard(key)?;
        shard.get(inner)
    }

    /// Buffer form of [`get`](Self::get), with the same contract as
    /// [`BoundedIntMap::get_into`]: `[1, value]` on a hit, `out` untouched on
    /// a miss.
    pub fn get_into(&self, key: i64, out: &mut [i64; 2]) -> bool {
        match self.shard(key) {
            Some((shard, inner)) => shard.get_into(inner, out),
            None => false,
        }
    }

    /// Number of live entries across all shards.
    pub fn len(&self) -> usize {
        self.shards.values().map(BoundedIntMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.values().all(BoundedIntMap::is_empty)
    }

    /// Number of allocated shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Keys covered up to the end of the highest allocated shard.
    pub fn max_size(&self) -> u64 {
        self.shards
            .last_key_value()
            .map_or(0, |(&idx, _)| (idx + 1) * SHARD_CAPACITY as u64)
    }

    /// Largest key of the highest allocated shard, or `-1` when there is
    /// none.
    pub fn max_key(&self) -> i64 {
        self.shards.last_key_value().map_or(-1, |(&idx, _)| {
            idx as i64 * Self::SHARD_WIDTH + (Self::SHARD_WIDTH - 1)
        })
    }

    /// Approximate heap footprint in bytes.
    pub fn memory_usage(&self) -> usize {
        self.shards.len() * std::mem::size_of::<(u64, BoundedIntMap)>()
            + self
                .shards
                .values()
                .map(BoundedIntMap::memory_usage)
                .sum::<usize>()
    }

    /// Iterates over `(key, value)` pairs in ascending global key order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.shards.iter().flat_map(|(&idx, shard)| {
            let base = idx as i64 * Self::SHARD_WIDTH;
            shard.iter().map(move |(key, value)| (base + key, value))
        })
    }
}

impl std::fmt::Debug for ShardedBoundedIntMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Lists entries as `((k,v)(k,v)...)` in ascending global key order.
impl std::fmt::Display for ShardedBoundedIntMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (key, value) in self.iter() {
            write!(f, "({key},{value})")?;
        }
        write!(f, ")")
    }
}
