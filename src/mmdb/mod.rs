//! MaxMind DB (MMDB) Reader
//!
//! This module provides the structural half of reading MaxMind DB files:
//! locating the metadata trailer, deriving the file layout, and walking the
//! binary search tree down to a data section offset.
//!
//! ## Architecture
//!
//! - **types**: MMDB-specific types and constants
//! - **format**: Metadata discovery, validation and layout
//! - **tree**: Search tree traversal for IP lookups
//!
//! Decoding the values the tree points at is done by
//! `crate::data_section::DataDecoder`, which also decodes the metadata map.

pub mod format;
pub mod tree;
pub mod types;

pub use format::{find_metadata_marker, Metadata, MmdbHeader};
pub use tree::{SearchTree, TreeHit};
pub use types::{IpVersion, RecordSize, METADATA_MARKER};
