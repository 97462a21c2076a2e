//! A set of non-negative `i64`s that is filled once and then frozen into a
//! lookup-only hash table.
//!
//! [`LongSetBuilder`] buffers inserted values without hashing them. Calling
//! [`LongSetBuilder::finalize`] picks a prime bucket count by searching
//! geometrically growing candidates until the longest bucket is short
//! compared to a binary search over the same items, then lays every bucket
//! out back to back in a single array.
//!
//! ```
//! use fast_hashtable::LongSetBuilder;
//!
//! let mut builder = LongSetBuilder::new();
//! builder.add_all(&[4, 8, 15, 16, 23, 42]);
//! builder.add(-1); // ignored
//!
//! let set = builder.finalize();
//! assert!(set.contains(15));
//! assert!(!set.contains(14));
//! assert!(!set.contains(-1));
//! ```

use crate::config::SizingConfig;
use crate::prime::next_prime;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::atomic::{AtomicU64, AtomicUsize};

const POS_BITS: u32 = 0x7fff_ffff;

// =============================================================================
// Hashing
// =============================================================================

/// Bucket of `value` in a table of `buckets` buckets.
///
/// Folds the two 32-bit halves together, triples with wrap-around, clears the
/// sign bit and reduces modulo the bucket count.
#[inline]
pub(crate) fn bucket_of(value: u64, buckets: usize) -> usize {
    let folded = (value as u32) ^ ((value >> 32) as u32);
    let mixed = folded.wrapping_mul(3) & POS_BITS;
    mixed as usize % buckets
}

/// Per-bucket item counts for `buckets` buckets, plus the largest count.
fn histogram(batches: &[Vec<u64>], buckets: usize) -> (Vec<usize>, usize) {
    let mut fill = vec![0usize; buckets];
    for &value in batches.iter().flatten() {
        fill[bucket_of(value, buckets)] += 1;
    }
    let max = fill.iter().copied().max().unwrap_or(0);
    (fill, max)
}

// =============================================================================
// Open phase
// =============================================================================

/// Collects values for a [`FrozenLongSet`].
///
/// Negative values are silently dropped. Nothing is hashed until
/// [`finalize`](Self::finalize).
#[derive(Clone, Debug, Default)]
pub struct LongSetBuilder {
    batches: Vec<Vec<u64>>,
    len: usize,
    config: SizingConfig,
}

impl LongSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder that can take `expected_size` single values without
    /// reallocating.
    pub fn with_expected_size(expected_size: usize) -> Self {
        Self {
            batches: vec![Vec::with_capacity(expected_size)],
            ..Self::default()
        }
    }

    /// Creates a builder whose finalize step uses `config`.
    #[must_use]
    pub fn with_config(mut self, config: SizingConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of accepted (non-negative) values so far, duplicates included.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Approximate heap footprint of the buffered values in bytes.
    pub fn memory_usage(&self) -> usize {
        self.batches.capacity() * std::mem::size_of::<Vec<u64>>()
            + self
                .batches
                .iter()
                .map(|batch| batch.capacity() * std::mem::size_of::<u64>())
                .sum::<usize>()
    }

    /// Buffers `value`, unless it is negative.
    pub fn add(&mut self, value: i64) {
        let Ok(value) = u64::try_from(value) else {
            return;
        };
        match self.batches.last_mut() {
            Some(batch) => batch.push(value),
            None => self.batches.push(vec![value]),
        }
        self.len += 1;
    }

    /// Buffers every non-negative value of `values` as a new batch.
    pub fn add_all(&mut self, values: &[i64]) {
        let batch: Vec<u64> = values
            .iter()
            .filter_map(|&value| u64::try_from(value).ok())
            .collect();
        if batch.is_empty() {
            return;
        }
        self.len += batch.len();
        self.batches.push(batch);
    }

    /// Buffers the first `count` values of `values` (all of them if there
    /// are fewer).
    pub fn add_prefix(&mut self, values: &[i64], count: usize) {
        self.add_all(&values[..count.min(values.len())]);
    }

    /// Picks the bucket count, returning it with its histogram and the
    /// bookkeeping for the report.
    fn search(&self) -> Search {
        let size = self.len;
        let wc = SizingConfig::binary_search_worst_case(size);
        let target = self.config.target_max_fill(size);

        if size == 0 {
            return Search {
                buckets: 1,
                fill: vec![0],
                target,
                binary_search_worst_case: wc,
                candidates: 0,
            };
        }

        let ceiling = self.config.size_ceiling(size);
        let mut m = next_prime(size.saturating_mul(2).saturating_add(1));
        let mut candidates = 0;
        let mut best: Option<(usize, Vec<usize>, usize)> = None;

        loop {
            let (fill, max) = histogram(&self.batches, m);
            candidates += 1;
            log::trace!("candidate of {m} buckets for {size} values: longest bucket {max}");

            let done = max <= target;
            let improves = match &best {
                Some((_, _, best_max)) => max < *best_max,
                None => true,
            };
            if improves {
                best = Some((m, fill, max));
            }
            if done {
                break;
            }

            let next = self.config.next_candidate(m);
            if next > ceiling {
                break;
            }
            m = next;
        }

        let (buckets, fill, _) = best.unwrap_or_else(|| (m, vec![0; m], 0));
        Search {
            buckets,
            fill,
            target,
            binary_search_worst_case: wc,
            candidates,
        }
    }

    /// Freezes the buffered values into a [`FrozenLongSet`].
    ///
    /// Duplicates are stored once. The buffer is released when this returns.
    pub fn finalize(self) -> FrozenLongSet {
        let Search {
            buckets,
            fill: mut starts,
            target,
            binary_search_worst_case,
            candidates,
        } = self.search();

        // Turn the histogram into bucket start offsets.
        let mut offset = 0;
        for start in &mut starts {
            let count = *start;
            *start = offset;
            offset += count;
        }
        starts.push(offset);

        let mut slots = vec![0u64; self.len];
        let mut fill = vec![0usize; buckets];
        for &value in self.batches.iter().flatten() {
            let b = bucket_of(value, buckets);
            let start = starts[b];
            let end = start + fill[b];
            if !slots[start..end].contains(&value) {
                slots[end] = value;
                fill[b] += 1;
            }
        }
        drop(self.batches);

        // Close the gaps left by duplicates.
        let mut write = 0;
        for b in 0..buckets {
            let start = starts[b];
            slots.copy_within(start..start + fill[b], write);
            starts[b] = write;
            write += fill[b];
        }
        starts[buckets] = write;
        slots.truncate(write);

        let max_bucket_len = fill.iter().copied().max().unwrap_or(0);
        let report = FinalizeReport {
            len: self.len,
            distinct_len: write,
            bucket_count: buckets,
            binary_search_worst_case,
            target_max_fill: target,
            max_bucket_len,
            candidates_tried: candidates,
        };
        log::debug!("finalized long set: {report:?}");

        FrozenLongSet {
            starts: starts.into_boxed_slice(),
            values: slots.into_boxed_slice(),
            report,
            counters: Counters::default(),
        }
    }
}

struct Search {
    buckets: usize,
    fill: Vec<usize>,
    target: usize,
    binary_search_worst_case: u32,
    candidates: usize,
}

// =============================================================================
// Closed phase
// =============================================================================

/// Outcome of the finalize step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalizeReport {
    /// Accepted values, duplicates included.
    pub len: usize,
    /// Distinct values stored.
    pub distinct_len: usize,
    /// Chosen bucket count (prime, or 1 for an empty set).
    pub bucket_count: usize,
    /// `ceil(log2(len))`.
    pub binary_search_worst_case: u32,
    /// Longest bucket the search aimed for.
    pub target_max_fill: usize,
    /// Longest bucket actually stored.
    pub max_bucket_len: usize,
    /// Number of bucket counts evaluated.
    pub candidates_tried: usize,
}

/// Snapshot of the lookup counters of a [`FrozenLongSet`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Calls to `contains`.
    pub lookups: u64,
    /// Unequal comparisons made across all lookups.
    pub collisions: u64,
    /// Most unequal comparisons made by a single lookup.
    pub max_collisions: usize,
}

impl LookupStats {
    /// Average collisions per lookup, `0.0` before the first lookup.
    pub fn collisions_per_lookup(&self) -> f64 {
        if self.lookups == 0 {
            return 0.0;
        }
        self.collisions as f64 / self.lookups as f64
    }
}

#[derive(Debug, Default)]
struct Counters {
    lookups: AtomicU64,
    collisions: AtomicU64,
    max_collisions: AtomicUsize,
}

/// An immutable set of non-negative `i64`s, built by [`LongSetBuilder`].
///
/// Bucket `i` is `values[starts[i]..starts[i + 1]]`. Lookup counters are
/// relaxed atomics, so a shared reference can be queried from many threads.
pub struct FrozenLongSet {
    starts: Box<[usize]>,
    values: Box<[u64]>,
    report: FinalizeReport,
    counters: Counters,
}

impl FrozenLongSet {
    /// Returns whether `value` was added before finalizing.
    ///
    /// Negative values are never members.
    pub fn contains(&self, value: i64) -> bool {
        self.counters.lookups.fetch_add(1, Relaxed);

        let Ok(value) = u64::try_from(value) else {
            return false;
        };

        let b = bucket_of(value, self.bucket_count());
        let bucket = &self.values[self.starts[b]..self.starts[b + 1]];

        let (found, misses) = match bucket.iter().position(|&v| v == value) {
            Some(idx) => (true, idx),
            None => (false, bucket.len()),
        };

        if misses > 0 {
            self.counters.collisions.fetch_add(misses as u64, Relaxed);
            self.counters.max_collisions.fetch_max(misses, Relaxed);
        }
        found
    }

    /// Accepted values, duplicates included.
    #[inline]
    pub fn len(&self) -> usize {
        self.report.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct values stored.
    #[inline]
    pub fn distinct_len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.starts.len() - 1
    }

    pub fn max_bucket_len(&self) -> usize {
        self.report.max_bucket_len
    }

    pub fn report(&self) -> &FinalizeReport {
        &self.report
    }

    /// Heap footprint of the bucket offsets and values in bytes.
    pub fn memory_usage(&self) -> usize {
        self.starts.len() * std::mem::size_of::<usize>()
            + self.values.len() * std::mem::size_of::<u64>()
    }

    pub fn stats(&self) -> LookupStats {
        LookupStats {
            lookups: self.counters.lookups.load(Relaxed),
            collisions: self.counters.collisions.load(Relaxed),
            max_collisions: self.counters.max_collisions.load(Relaxed),
        }
    }

    /// Average collisions per lookup so far.
    pub fn lookup_statistics(&self) -> f64 {
        self.stats().collisions_per_lookup()
    }

    /// Most collisions seen by a single lookup so far.
    pub fn max_collisions(&self) -> usize {
        self.counters.max_collisions.load(Relaxed)
    }

    pub fn lookup_count(&self) -> u64 {
        self.counters.lookups.load(Relaxed)
    }

    /// Iterates over the distinct values in bucket order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = i64> + '_ {
        self.values.iter().map(|&v| v as i64)
    }
}

impl std::fmt::Debug for FrozenLongSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut values: Vec<i64> = self.iter().collect();
        values.sort_unstable();
        f.debug_set().entries(values).finish()
    }
}
