//! MMDB Binary Format Parsing
//!
//! Locates and decodes the metadata trailer, then derives the layout of the
//! search tree and data section from it. Nothing outside the metadata is
//! copied; the tree and data stay in the caller's buffer.
//!
//! Layout:
//! ```text
//! [search tree][16 zero bytes][data section][marker][metadata map]
//! ```

use super::types::{
    IpVersion, RecordSize, DATA_SECTION_SEPARATOR_SIZE, METADATA_MARKER, METADATA_MAX_SIZE,
    SUPPORTED_MAJOR_VERSION,
};
use crate::data_section::{DataDecoder, DataValue};
use crate::error::{GeoDbError, Result};
use serde::Serialize;
use std::ops::Range;

/// MMDB file header - the fields needed for lookups
#[derive(Debug, Clone)]
pub struct MmdbHeader {
    /// Number of nodes in the search tree
    pub node_count: u32,
    /// Record size in bits (24, 28, or 32)
    pub record_size: RecordSize,
    /// IP version (4 or 6)
    pub ip_version: IpVersion,
    /// Size of the search tree in bytes
    pub tree_size: usize,
    /// Byte range of the data section within the file
    pub data_section: Range<usize>,
    /// Byte offset where the metadata map starts (just after the marker)
    pub metadata_start: usize,
}

impl MmdbHeader {
    /// Parse the metadata trailer and derive the file layout
    pub fn from_file(data: &[u8]) -> Result<(Self, Metadata)> {
        let marker_offset = find_metadata_marker(data)?;
        let metadata_start = marker_offset + METADATA_MARKER.len();

        let value = DataDecoder::new(&data[metadata_start..])
            .decode(0)
            .map_err(|e| GeoDbError::CorruptMetadata(format!("Failed to decode metadata: {}", e)))?;
        let metadata = Metadata::from_value(&value)?;

        let record_size = RecordSize::from_bits(metadata.record_size as u64)?;
        let ip_version = IpVersion::from_number(metadata.ip_version as u64)?;

        let tree_size = (metadata.node_count as usize)
            .checked_mul(record_size.node_bytes())
            .ok_or_else(|| GeoDbError::Truncated("Search tree size overflows".to_string()))?;
        let data_start = tree_size + DATA_SECTION_SEPARATOR_SIZE;

        if data_start > marker_offset {
            return Err(GeoDbError::Truncated(format!(
                "Search tree of {} nodes ({} bytes) does not fit before metadata at offset {}",
                metadata.node_count, tree_size, marker_offset
            )));
        }

        let header = MmdbHeader {
            node_count: metadata.node_count,
            record_size,
            ip_version,
            tree_size,
            data_section: data_start..marker_offset,
            metadata_start,
        };

        Ok((header, metadata))
    }
}

/// Decoded metadata map
///
/// Required fields are validated on open; the rest default to empty when
/// a database omits them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Number of nodes in the search tree
    pub node_count: u32,
    /// Bits per tree record
    pub record_size: u16,
    /// 4 or 6
    pub ip_version: u16,
    /// Must be 2
    pub binary_format_major_version: u16,
    /// Informational
    pub binary_format_minor_version: u16,
    /// Unix timestamp of the build
    pub build_epoch: u64,
    /// e.g. "GeoLite2-City"
    pub database_type: String,
    /// Locale codes present in names maps
    pub languages: Vec<String>,
    /// Language code -> description, in on-disk order
    pub description: Vec<(String, String)>,
}

impl Metadata {
    /// Extract metadata fields from a decoded map
    pub fn from_value(value: &DataValue) -> Result<Self> {
        if !matches!(value, DataValue::Map(_)) {
            return Err(GeoDbError::CorruptMetadata(format!(
                "Metadata is a {}, not a map",
                value.type_name()
            )));
        }

        // Version is checked first so a future format fails as unsupported
        // rather than as a missing field
        let major = required_uint(value, "binary_format_major_version")?;
        if major != SUPPORTED_MAJOR_VERSION {
            return Err(GeoDbError::UnsupportedVersion(format!(
                "Binary format major version {} (expected {})",
                major, SUPPORTED_MAJOR_VERSION
            )));
        }

        let node_count = required_uint(value, "node_count")?;
        let node_count = u32::try_from(node_count).map_err(|_| {
            GeoDbError::CorruptMetadata(format!("node_count {} exceeds 32 bits", node_count))
        })?;

        let record_size = RecordSize::from_bits(required_uint(value, "record_size")?)?;
        let ip_version = IpVersion::from_number(required_uint(value, "ip_version")?)?;

        Ok(Metadata {
            node_count,
            record_size: record_size as u16,
            ip_version: match ip_version {
                IpVersion::V4 => 4,
                IpVersion::V6 => 6,
            },
            binary_format_major_version: major as u16,
            binary_format_minor_version: value
                .get("binary_format_minor_version")
                .and_then(DataValue::as_u64)
                .and_then(|n| u16::try_from(n).ok())
                .unwrap_or(0),
            build_epoch: value
                .get("build_epoch")
                .and_then(DataValue::as_u64)
                .unwrap_or(0),
            database_type: value
                .get("database_type")
                .and_then(DataValue::as_str)
                .unwrap_or_default()
                .to_string(),
            languages: match value.get("languages") {
                Some(DataValue::Array(items)) => items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            },
            description: match value.get("description") {
                Some(DataValue::Map(entries)) => entries
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect(),
                _ => Vec::new(),
            },
        })
    }
}

/// Find the metadata marker (zero allocation)
///
/// The marker appears somewhere in the last 128KB of the file and the
/// metadata comes AFTER it. If the marker occurs more than once the last
/// occurrence wins.
pub fn find_metadata_marker(data: &[u8]) -> Result<usize> {
    let search_start = data.len().saturating_sub(METADATA_MAX_SIZE);

    memchr::memmem::rfind(&data[search_start..], METADATA_MARKER)
        .map(|pos| search_start + pos)
        .ok_or_else(|| GeoDbError::CorruptMetadata("Metadata marker not found".to_string()))
}

fn required_uint(map: &DataValue, key: &str) -> Result<u64> {
    match map.get(key) {
        Some(DataValue::Uint16(n)) => Ok(*n as u64),
        Some(DataValue::Uint32(n)) => Ok(*n as u64),
        Some(DataValue::Uint64(n)) => Ok(*n),
        Some(other) => Err(GeoDbError::CorruptMetadata(format!(
            "Field '{}' is a {}, not an unsigned integer",
            key,
            other.type_name()
        ))),
        None => Err(GeoDbError::CorruptMetadata(format!(
            "Required field '{}' not found",
            key
        ))),
    }
}
