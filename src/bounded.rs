//! A map from bounded non-negative integer keys to `i64` values.
//!
//! Keys are split into a bucket index and a bit index:
//! `bucket = key % bucket_count`, `bit = key / bucket_count`. Each bucket owns
//! one presence word (bit set => slot occupied) and `WORD_BITS` value slots,
//! so no tombstones or sentinel values are needed.

use crate::error::{Error, Result};
use crate::WORD_BITS;

type Word = u32;

const W: usize = WORD_BITS as usize;

/// A growable map keyed by integers in `[0, max_key()]`.
///
/// Inserting a key beyond `max_key()` doubles the bucket count (possibly
/// several times) and rehashes every live entry. Queries with negative or
/// out-of-range keys report "absent" instead of failing.
///
/// Storage is dense up to `max_key()`, so memory follows the largest key
/// ever inserted, not the number of entries. Use
/// [`ShardedBoundedIntMap`](crate::ShardedBoundedIntMap) for large or sparse
/// keys.
#[derive(Clone)]
pub struct BoundedIntMap {
    /// One presence word per bucket.
    presence: Vec<Word>,
    /// `WORD_BITS` slots per bucket, indexed `bucket * WORD_BITS + bit`.
    values: Vec<i64>,
    len: usize,
}

impl BoundedIntMap {
    /// Number of buckets of a map created with [`BoundedIntMap::new`].
    pub const DEFAULT_BUCKET_COUNT: usize = 2048;

    /// Creates an empty map holding keys up to
    /// `DEFAULT_BUCKET_COUNT * WORD_BITS - 1` without growing.
    pub fn new() -> Self {
        Self::with_buckets(Self::DEFAULT_BUCKET_COUNT)
    }

    /// Creates an empty map able to hold at least `min_capacity` keys
    /// (`0..min_capacity`) without growing.
    ///
    /// The capacity is rounded up to a multiple of `WORD_BITS`, and is never
    /// smaller than one bucket.
    pub fn with_capacity(min_capacity: usize) -> Self {
        Self::with_buckets(min_capacity.div_ceil(W).max(1))
    }

    fn with_buckets(bucket_count: usize) -> Self {
        Self {
            presence: vec![0; bucket_count],
            values: vec![0; bucket_count * W],
            len: 0,
        }
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.presence.len()
    }

    /// Number of keys the map can hold without growing.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.bucket_count() * W
    }

    /// Largest key that can be inserted without growing.
    #[inline]
    pub fn max_key(&self) -> i64 {
        self.max_size() as i64 - 1
    }

    /// Approximate heap footprint in bytes.
    pub fn memory_usage(&self) -> usize {
        self.presence.capacity() * std::mem::size_of::<Word>()
            + self.values.capacity() * std::mem::size_of::<i64>()
    }

    #[inline]
    fn position(&self, key: u64) -> (usize, usize) {
        let buckets = self.bucket_count() as u64;
        ((key % buckets) as usize, (key / buckets) as usize)
    }

    /// Maps `key` to its `(bucket, bit)` position, or `None` if the key
    /// cannot be stored at the current size.
    #[inline]
    fn slot(&self, key: i64) -> Option<(usize, usize)> {
        let key = u64::try_from(key).ok()?;
        let (bucket, bit) = self.position(key);
        (bit < W).then_some((bucket, bit))
    }

    /// Inserts `value` under `key`, returning the previous value, if any.
    ///
    /// Grows the map when `key > max_key()`. Growth allocates about
    /// 8.5 bytes per key in `[0, key]` whether or not those keys are present:
    /// a key of `1 << 40` alone asks for roughly 9 TB. Large or sparse keys
    /// belong in a [`ShardedBoundedIntMap`](crate::ShardedBoundedIntMap).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a negative key; the map is left
    /// untouched.
    pub fn put(&mut self, key: i64, value: i64) -> Result<Option<i64>> {
        let Ok(ukey) = u64::try_from(key) else {
            return Err(Error::OutOfRange { key });
        };
        if key > self.max_key() {
            self.grow_to_fit(ukey);
        }

        let (bucket, bit) = self.position(ukey);
        let mask: Word = 1 << bit;
        let idx = bucket * W + bit;

        let old = if self.presence[bucket] & mask == 0 {
            self.presence[bucket] |= mask;
            self.len += 1;
            None
        } else {
            Some(self.values[idx])
        };
        self.values[idx] = value;
        Ok(old)
    }

    /// Returns whether `key` holds a value. Never fails.
    #[inline]
    pub fn contains_key(&self, key: i64) -> bool {
        match self.slot(key) {
            Some((bucket, bit)) => self.presence[bucket] & (1 << bit) != 0,
            None => false,
        }
    }

    /// Returns the value stored under `key`. Never fails.
    #[inline]
    pub fn get(&self, key: i64) -> Option<i64> {
        let (bucket, bit) = self.slot(key)?;
        if self.presence[bucket] & (1 << bit) == 0 {
            return None;
        }
        Some(self.values[bucket * W + bit])
    }

    /// Buffer form of [`get`](Self::get): on a hit writes `[1, value]` into
    /// `out` and returns `true`; on a miss returns `false` and leaves `out`
    /// as it was.
    pub fn get_into(&self, key: i64, out: &mut [i64; 2]) -> bool {
        match self.get(key) {
            Some(value) => {
                *out = [1, value];
                true
            }
            None => false,
        }
    }

    /// Doubles the bucket count until `key` fits, then rehashes once.
    #[cold]
    fn grow_to_fit(&mut self, key: u64) {
        let mut buckets = self.bucket_count();
        while (buckets as u64) * u64::from(WORD_BITS) <= key {
            buckets *= 2;
        }
        self.rehash(buckets);
    }

    fn rehash(&mut self, new_buckets: usize) {
        let old_buckets = self.bucket_count();
        log::trace!(
            "growing int map from {old_buckets} to {new_buckets} buckets ({} entries)",
            self.len
        );

        let presence = std::mem::replace(&mut self.presence, vec![0; new_buckets]);
        let values = std::mem::replace(&mut self.values, vec![0; new_buckets * W]);

        for (bucket, &word) in presence.iter().enumerate() {
            let mut word = word;
            while word != 0 {
                let bit = word.trailing_zeros() as usize;
                word &= word - 1;

                let key = bit * old_buckets + bucket;
                let new_bucket = key % new_buckets;
                let new_bit = key / new_buckets;
                self.presence[new_bucket] |= 1 << new_bit;
                self.values[new_bucket * W + new_bit] = values[bucket * W + bit];
            }
        }
    }

    /// Iterates over `(key, value)` pairs in ascending key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            map: self,
            bit: 0,
            bucket: 0,
            remaining: self.len,
        }
    }
}

impl Default for BoundedIntMap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BoundedIntMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Lists entries as `((k,v)(k,v)...)` in ascending key order.
impl std::fmt::Display for BoundedIntMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (key, value) in self.iter() {
            write!(f, "({key},{value})")?;
        }
        write!(f, ")")
    }
}

/// Ascending-key iterator over a [`BoundedIntMap`].
///
/// Since `key = bit * bucket_count + bucket` with `bucket < bucket_count`,
/// scanning bit-major then bucket-minor visits keys in ascending order.
pub struct Iter<'a> {
    map: &'a BoundedIntMap,
    bit: usize,
    bucket: usize,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let buckets = self.map.bucket_count();
        while self.bit < W {
            while self.bucket < buckets {
                let bucket = self.bucket;
                self.bucket += 1;
                if self.map.presence[bucket] & (1 << self.bit) != 0 {
                    self.remaining -= 1;
                    let key = (self.bit * buckets + bucket) as i64;
                    return Some((key, self.map.values[bucket * W + self.bit]));
                }
            }
            self.bucket = 0;
            self.bit += 1;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl std::iter::FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a BoundedIntMap {
    type Item = (i64, i64);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
