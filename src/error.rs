/// Errors returned by the mutating operations of this crate.
///
/// Queries never fail: looking up a key or value that cannot be present
/// simply reports it as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A negative key was passed to an operation that stores it.
    OutOfRange {
        /// The rejected key.
        key: i64,
    },

    /// The set has already been finalized and no longer accepts values.
    AlreadyFinalized,

    /// The set has to be finalized before it can answer membership queries.
    NotFinalized,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::OutOfRange { key } => write!(f, "key {key} is out of range"),
            Error::AlreadyFinalized => {
                write!(f, "no data can be added after the set is finalized")
            }
            Error::NotFinalized => write!(f, "the set has not been finalized"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type for fallible operations.
pub type Result<T> = std::result::Result<T, Error>;
