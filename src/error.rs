// Crate-wide error type.
//
// Every fallible operation returns `Result<T, Error>`. Errors propagate to
// the immediate caller; the crate never retries internally, and output bytes
// already written before a failure stay valid.

use crate::filter::FilterId;

/// Errors surfaced by pipeline assembly, stage processing, and the
/// filter-flags codec.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Caller-supplied filter options are out of range, inconsistent, or
    /// missing where a filter requires them.
    #[error("invalid filter options: {0}")]
    Options(String),

    /// A filter id with no registered implementation.
    #[error("unsupported filter id {0}")]
    UnsupportedFilter(FilterId),

    /// The destination buffer cannot hold the predicted or declared size.
    #[error("output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes the operation would have written.
        needed: usize,
        /// Bytes actually available at the cursor.
        available: usize,
    },

    /// Untrusted header bytes failed validation: malformed varint, declared
    /// size disagreeing with the actual payload, or a size over the limit.
    #[error("corrupt filter flags: {0}")]
    HeaderCorruption(String),

    /// A filter's data payload could not be processed.
    #[error("corrupt filter payload: {0}")]
    Data(String),

    /// An internal consistency check failed. This never happens when the
    /// crate is correct; it exists so a bug turns into an error instead of
    /// bad output.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
