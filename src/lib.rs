//! Rawfilt: streaming filter-chain compression core.
//!
//! The crate provides:
//! - Composable byte-transform filter stages (`filter`)
//! - Pipeline assembly and end-to-end processing (`filter::chain`)
//! - The self-describing Filter Flags header codec (`wire`)
//!
//! A filter chain is an ordered list of `(filter id, options)` entries. The
//! same list drives two independent mechanisms: the pipeline composer turns
//! it into a live chain of stages that data flows through, and the Filter
//! Flags codec serializes it into a compact, validated wire record so a
//! decoder with no prior knowledge of the content can rebuild the pipeline.
//!
//! # Quick Start
//!
//! ```
//! use rawfilt::filter::{chain, DeltaOptions, FilterEntry};
//!
//! let filters = [FilterEntry::delta(DeltaOptions::new(4))];
//! let data = b"abcdabceabcfabcg";
//!
//! let encoded = chain::encode_all(&filters, data).unwrap();
//! let decoded = chain::decode_all(&filters, &encoded).unwrap();
//! assert_eq!(decoded, data);
//! ```

pub mod error;
pub mod filter;
pub mod wire;

pub use error::{Error, Result};
