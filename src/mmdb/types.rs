//! MMDB-specific Type Definitions
//!
//! Constants and small enums shared by the format parser and the search
//! tree. Data values use `DataValue` from the `data_section` module.

use crate::error::GeoDbError;

/// MMDB metadata marker: "\xAB\xCD\xEFMaxMind.com"
pub const METADATA_MARKER: &[u8] = b"\xAB\xCD\xEFMaxMind.com";

/// The marker always lives within this many bytes of the end of the file
pub const METADATA_MAX_SIZE: usize = 128 * 1024;

/// Zero bytes between the search tree and the data section
pub const DATA_SECTION_SEPARATOR_SIZE: usize = 16;

/// The only binary format major version this reader understands
pub const SUPPORTED_MAJOR_VERSION: u64 = 2;

/// IP version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    /// IPv4 only
    V4,
    /// IPv6 (may include IPv4 addresses under ::/96)
    V6,
}

impl IpVersion {
    /// Create from the metadata `ip_version` field
    pub fn from_number(n: u64) -> Result<Self, GeoDbError> {
        match n {
            4 => Ok(IpVersion::V4),
            6 => Ok(IpVersion::V6),
            _ => Err(GeoDbError::CorruptMetadata(format!(
                "Invalid IP version: {}",
                n
            ))),
        }
    }

    /// Number of address bits the tree is keyed on
    pub fn bit_width(self) -> u8 {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }
}

/// Record size in bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSize {
    /// 24-bit records (3 bytes per record, 6 bytes per node)
    Bits24 = 24,
    /// 28-bit records (3.5 bytes per record, 7 bytes per node)
    Bits28 = 28,
    /// 32-bit records (4 bytes per record, 8 bytes per node)
    Bits32 = 32,
}

impl RecordSize {
    /// Get the size of a node (2 records) in bytes
    pub fn node_bytes(self) -> usize {
        match self {
            RecordSize::Bits24 => 6,
            RecordSize::Bits28 => 7,
            RecordSize::Bits32 => 8,
        }
    }

    /// Create from bit size
    pub fn from_bits(bits: u64) -> Result<Self, GeoDbError> {
        match bits {
            24 => Ok(RecordSize::Bits24),
            28 => Ok(RecordSize::Bits28),
            32 => Ok(RecordSize::Bits32),
            _ => Err(GeoDbError::UnsupportedVersion(format!(
                "Invalid record size: {} bits",
                bits
            ))),
        }
    }
}
