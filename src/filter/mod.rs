// Filter identities, per-filter options, and the stage implementations.
//
// # Modules
//
// - `ring`  — bounded lookback window used by the delta filter
// - `stage` — the contract every pipeline stage implements
// - `delta` — byte-wise delta filter (the reference stage)
// - `copy`  — passthrough filter
// - `lzma`  — LZMA entropy-coder stage and its option codec
// - `chain` — pipeline assembly and end-to-end processing

use std::fmt;

use crate::error::{Error, Result};

pub mod chain;
pub mod copy;
pub mod delta;
pub mod lzma;
pub mod ring;
pub mod stage;

// Re-export key types for convenience.
pub use chain::Pipeline;
pub use delta::{DeltaKind, DeltaOptions};
pub use lzma::LzmaOptions;
pub use stage::{Action, Direction, Progress, Stage};

// ---------------------------------------------------------------------------
// Filter identity
// ---------------------------------------------------------------------------

/// Numeric identity of a filter, as stored in filter-flags records.
///
/// Ids are opaque 64-bit values drawn from a registry. Unknown ids are
/// rejected by both the pipeline composer and the flags codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId(pub u64);

impl FilterId {
    /// Passthrough filter. No options.
    pub const COPY: FilterId = FilterId(0x00);

    /// Byte-wise delta filter.
    pub const DELTA: FilterId = FilterId(0x03);

    /// LZMA entropy coder.
    pub const LZMA: FilterId = FilterId(0x21);

    /// Reserved "no filter" marker. Never valid on the wire or in a chain.
    pub const NONE: FilterId = FilterId(u64::MAX);
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Chain entries
// ---------------------------------------------------------------------------

/// Filter-specific options, keyed by filter id.
///
/// The variant must agree with the [`FilterEntry::id`] it travels with; a
/// mismatch is reported as an options error wherever the entry is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FilterOptions {
    /// Options for [`FilterId::DELTA`].
    Delta(DeltaOptions),
    /// Options for [`FilterId::LZMA`].
    Lzma(LzmaOptions),
}

/// One entry in a filter chain: a filter identity plus its options.
///
/// `options: None` means "filter defaults" and is only meaningful for
/// filters whose wire payload is empty (copy). Filters that carry a payload
/// (delta, LZMA) require explicit options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterEntry {
    /// Which filter this entry names.
    pub id: FilterId,
    /// Filter-specific options, or `None` for defaults.
    pub options: Option<FilterOptions>,
}

impl FilterEntry {
    /// An entry with default options.
    pub fn new(id: FilterId) -> Self {
        Self { id, options: None }
    }

    /// A passthrough entry.
    pub fn copy() -> Self {
        Self::new(FilterId::COPY)
    }

    /// A delta entry with the given options.
    pub fn delta(options: DeltaOptions) -> Self {
        Self {
            id: FilterId::DELTA,
            options: Some(FilterOptions::Delta(options)),
        }
    }

    /// An LZMA entry with the given options.
    pub fn lzma(options: LzmaOptions) -> Self {
        Self {
            id: FilterId::LZMA,
            options: Some(FilterOptions::Lzma(options)),
        }
    }

    /// The delta options of this entry, or an options error if they are
    /// missing or belong to a different filter.
    pub(crate) fn delta_options(&self) -> Result<DeltaOptions> {
        match self.options {
            Some(FilterOptions::Delta(opts)) => Ok(opts),
            Some(_) => Err(Error::Options(format!(
                "filter {} was given options for a different filter",
                self.id
            ))),
            None => Err(Error::Options("delta filter requires options".into())),
        }
    }

    /// The LZMA options of this entry, or an options error if they are
    /// missing or belong to a different filter.
    pub(crate) fn lzma_options(&self) -> Result<LzmaOptions> {
        match self.options {
            Some(FilterOptions::Lzma(opts)) => Ok(opts),
            Some(_) => Err(Error::Options(format!(
                "filter {} was given options for a different filter",
                self.id
            ))),
            None => Err(Error::Options("LZMA filter requires options".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
