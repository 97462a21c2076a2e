//! Tuning knobs for the table-size search run by
//! [`LongSetBuilder::finalize`](crate::LongSetBuilder::finalize).

/// Controls how the finalize step searches for a bucket count.
///
/// The search starts at the first prime above `2 * size + 1` and grows the
/// candidate geometrically until the longest bucket is short enough, or the
/// candidate would exceed `max_table_ratio * size`.
#[derive(Clone, Debug, PartialEq)]
pub struct SizingConfig {
    pub(crate) growth_factor: f64,
    pub(crate) max_table_ratio: usize,
    pub(crate) collision_divisor: u32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
            max_table_ratio: Self::DEFAULT_MAX_TABLE_RATIO,
            collision_divisor: Self::DEFAULT_COLLISION_DIVISOR,
        }
    }
}

impl SizingConfig {
    /// Default multiplier between consecutive candidate sizes.
    pub const DEFAULT_GROWTH_FACTOR: f64 = 1.25;

    /// Default ceiling on buckets per stored item.
    pub const DEFAULT_MAX_TABLE_RATIO: usize = 5;

    /// Default divisor applied to the binary-search worst case.
    pub const DEFAULT_COLLISION_DIVISOR: u32 = 4;

    /// Smallest ratio that still leaves room for the first candidate.
    const MIN_TABLE_RATIO: usize = 3;

    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the multiplier between consecutive candidate sizes.
    ///
    /// Values that are not greater than 1 (or not finite) are ignored.
    #[must_use]
    pub fn growth_factor(mut self, factor: f64) -> Self {
        if factor.is_finite() && factor > 1.0 {
            self.growth_factor = factor;
        }
        self
    }

    /// Sets the ceiling on buckets per item.
    ///
    /// The ratio is raised to 3 if smaller.
    #[must_use]
    pub fn max_table_ratio(mut self, ratio: usize) -> Self {
        self.max_table_ratio = ratio.max(Self::MIN_TABLE_RATIO);
        self
    }

    /// Sets the divisor applied to `ceil(log2(size))` to obtain the target
    /// longest bucket.
    #[must_use]
    pub fn collision_divisor(mut self, divisor: u32) -> Self {
        self.collision_divisor = divisor.max(1);
        self
    }

    /// Worst-case comparisons of a binary search over `size` sorted items.
    pub(crate) fn binary_search_worst_case(size: usize) -> u32 {
        if size <= 1 {
            0
        } else {
            usize::BITS - (size - 1).leading_zeros()
        }
    }

    /// Longest bucket the search is content with for `size` items.
    pub(crate) fn target_max_fill(&self, size: usize) -> usize {
        let wc = Self::binary_search_worst_case(size);
        (wc / self.collision_divisor).max(1) as usize
    }

    /// Largest bucket count the search may try for `size` items.
    pub(crate) fn size_ceiling(&self, size: usize) -> usize {
        size.saturating_mul(self.max_table_ratio)
    }

    /// Next candidate after `m`, always strictly larger.
    pub(crate) fn next_candidate(&self, m: usize) -> usize {
        let grown = (m as f64 * self.growth_factor).ceil() as usize;
        crate::prime::next_prime(grown.max(m + 1))
    }
}
