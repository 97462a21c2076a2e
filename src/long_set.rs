//! A single-object view of the two set phases, for callers that cannot keep
//! the builder and the frozen set apart in their types.
//!
//! Phase misuse is reported as an [`Error`] and never changes the set.

use crate::config::SizingConfig;
use crate::error::{Error, Result};
use crate::frozen::{FrozenLongSet, LongSetBuilder};

enum State {
    Open(LongSetBuilder),
    Finalized(FrozenLongSet),
}

/// A set of non-negative `i64`s that accepts values until
/// [`finalize_set`](Self::finalize_set) and answers membership queries only
/// afterwards.
///
/// ```
/// use fast_hashtable::{Error, LongSet};
///
/// let mut set = LongSet::new();
/// set.add(3)?;
/// assert_eq!(set.contains(3), Err(Error::NotFinalized));
///
/// set.finalize_set()?;
/// assert_eq!(set.contains(3), Ok(true));
/// assert_eq!(set.add(4), Err(Error::AlreadyFinalized));
/// # Ok::<(), Error>(())
/// ```
pub struct LongSet {
    state: State,
}

impl LongSet {
    pub fn new() -> Self {
        Self::from_builder(LongSetBuilder::new())
    }

    /// Creates an open set sized for about `expected_size` values.
    pub fn with_expected_size(expected_size: usize) -> Self {
        Self::from_builder(LongSetBuilder::with_expected_size(expected_size))
    }

    /// Creates an open set whose finalize step uses `config`.
    pub fn with_config(config: SizingConfig) -> Self {
        Self::from_builder(LongSetBuilder::new().with_config(config))
    }

    fn from_builder(builder: LongSetBuilder) -> Self {
        Self {
            state: State::Open(builder),
        }
    }

    fn builder_mut(&mut self) -> Result<&mut LongSetBuilder> {
        match &mut self.state {
            State::Open(builder) => Ok(builder),
            State::Finalized(_) => Err(Error::AlreadyFinalized),
        }
    }

    #[inline]
    pub fn is_finalized(&self) -> bool {
        matches!(self.state, State::Finalized(_))
    }

    /// Adds `value`; negative values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinalized`] after [`finalize_set`](Self::finalize_set).
    pub fn add(&mut self, value: i64) -> Result<()> {
        self.builder_mut()?.add(value);
        Ok(())
    }

    /// Adds every value of `values`; negative values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinalized`] after [`finalize_set`](Self::finalize_set).
    pub fn add_all(&mut self, values: &[i64]) -> Result<()> {
        self.builder_mut()?.add_all(values);
        Ok(())
    }

    /// Adds the first `count` values of `values`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinalized`] after [`finalize_set`](Self::finalize_set).
    pub fn add_prefix(&mut self, values: &[i64], count: usize) -> Result<()> {
        self.builder_mut()?.add_prefix(values, count);
        Ok(())
    }

    /// Builds the lookup table. One-shot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinalized`] if called twice.
    pub fn finalize_set(&mut self) -> Result<()> {
        let builder = std::mem::take(self.builder_mut()?);
        self.state = State::Finalized(builder.finalize());
        Ok(())
    }

    /// Returns whether `value` is a member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFinalized`] before [`finalize_set`](Self::finalize_set).
    pub fn contains(&self, value: i64) -> Result<bool> {
        Ok(self.frozen()?.contains(value))
    }

    /// The finalized set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFinalized`] before [`finalize_set`](Self::finalize_set).
    pub fn frozen(&self) -> Result<&FrozenLongSet> {
        match &self.state {
            State::Open(_) => Err(Error::NotFinalized),
            State::Finalized(set) => Ok(set),
        }
    }

    /// Consumes the set, returning the finalized table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFinalized`] before [`finalize_set`](Self::finalize_set).
    pub fn into_frozen(self) -> Result<FrozenLongSet> {
        match self.state {
            State::Open(_) => Err(Error::NotFinalized),
            State::Finalized(set) => Ok(set),
        }
    }

    /// Values accepted so far, duplicates included.
    pub fn size(&self) -> usize {
        match &self.state {
            State::Open(builder) => builder.len(),
            State::Finalized(set) => set.len(),
        }
    }

    /// Heap footprint in bytes of the buffer or of the finalized table.
    pub fn memory_usage(&self) -> usize {
        match &self.state {
            State::Open(builder) => builder.memory_usage(),
            State::Finalized(set) => set.memory_usage(),
        }
    }

    /// Average collisions per lookup; `0.0` while open.
    pub fn lookup_statistics(&self) -> f64 {
        self.frozen().map_or(0.0, FrozenLongSet::lookup_statistics)
    }

    /// Most collisions seen by one lookup; `0` while open.
    pub fn max_collisions(&self) -> usize {
        self.frozen().map_or(0, FrozenLongSet::max_collisions)
    }
}

impl Default for LongSet {
    fn default() -> Self {
        Self::new()
    }
}

impl From<LongSetBuilder> for LongSet {
    fn from(builder: LongSetBuilder) -> Self {
        Self::from_builder(builder)
    }
}

impl From<FrozenLongSet> for LongSet {
    fn from(set: FrozenLongSet) -> Self {
        Self {
            state: State::Finalized(set),
        }
    }
}
