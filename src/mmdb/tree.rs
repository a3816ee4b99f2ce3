//! MMDB Search Tree Traversal
//!
//! Implements binary search tree traversal for IP address lookups.
//! The tree uses a compact binary representation where each node contains
//! two records (left and right) that point to either:
//! - Another node (continue traversal)
//! - A data section offset (found)
//! - A "not found" marker (the record equals `node_count`)

use super::format::MmdbHeader;
use super::types::{IpVersion, RecordSize, DATA_SECTION_SEPARATOR_SIZE};
use crate::error::{GeoDbError, Result};
use std::net::IpAddr;

/// Terminal point of a successful descent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeHit {
    /// Offset into the data section (relative to data section start)
    pub data_offset: usize,
    /// Network prefix length (netmask) in the queried address family
    pub prefix_len: u8,
}

/// Search tree for IP address lookups
pub struct SearchTree<'a> {
    /// The search tree bytes (exactly `header.tree_size` long)
    data: &'a [u8],
    /// Parsed header information
    header: &'a MmdbHeader,
}

impl<'a> SearchTree<'a> {
    /// Create a new search tree
    pub fn new(data: &'a [u8], header: &'a MmdbHeader) -> Self {
        Self { data, header }
    }

    /// Look up an IP address, starting IPv4 queries on an IPv6 tree at
    /// `ipv4_start` (see [`find_ipv4_start_node`](Self::find_ipv4_start_node)).
    pub fn lookup(&self, ip: IpAddr, ipv4_start: u32) -> Result<Option<TreeHit>> {
        match (ip, self.header.ip_version) {
            (IpAddr::V4(addr), IpVersion::V4) => self.descend(0, u32::from(addr) as u128, 32),
            (IpAddr::V4(addr), IpVersion::V6) => {
                self.descend(ipv4_start, u32::from(addr) as u128, 32)
            }
            // An IPv4 tree only answers IPv6 queries for ::ffff:a.b.c.d
            (IpAddr::V6(addr), IpVersion::V4) => match addr.to_ipv4_mapped() {
                Some(v4) => self.descend(0, u32::from(v4) as u128, 32),
                None => Ok(None),
            },
            (IpAddr::V6(addr), IpVersion::V6) => self.descend(0, u128::from(addr), 128),
        }
    }

    /// Walk `width` bits of `bits`, most significant first, from `start`.
    ///
    /// `start` may already be a terminal record when the IPv4 subtree of a
    /// dual-stack database resolves above /96.
    fn descend(&self, start: u32, bits: u128, width: u8) -> Result<Option<TreeHit>> {
        let node_count = self.header.node_count;
        let mut record = start;

        for depth in 0..width {
            if record >= node_count {
                return self.resolve(record, depth);
            }
            let bit = (bits >> (width - 1 - depth)) & 1;
            let (left, right) = self.read_node(record)?;
            record = if bit == 0 { left } else { right };
        }

        if record >= node_count {
            return self.resolve(record, width);
        }

        Err(GeoDbError::CorruptTrie(format!(
            "Descent consumed all {} address bits without reaching data (at node {})",
            width, record
        )))
    }

    /// Turn a terminal record into "no data" or a data section offset
    fn resolve(&self, record: u32, prefix_len: u8) -> Result<Option<TreeHit>> {
        let node_count = self.header.node_count;
        if record == node_count {
            return Ok(None);
        }

        // data_offset = (record - node_count) - 16, where 16 is the separator
        let past_tree = (record - node_count) as usize;
        let data_offset = past_tree
            .checked_sub(DATA_SECTION_SEPARATOR_SIZE)
            .ok_or_else(|| {
                GeoDbError::CorruptTrie(format!(
                    "Record {} points into the data section separator (node_count = {})",
                    record, node_count
                ))
            })?;

        Ok(Some(TreeHit {
            data_offset,
            prefix_len,
        }))
    }

    /// Read both records of a node
    pub fn read_node(&self, index: u32) -> Result<(u32, u32)> {
        if index >= self.header.node_count {
            return Err(GeoDbError::CorruptTrie(format!(
                "Node index {} exceeds node count {}",
                index, self.header.node_count
            )));
        }

        let node_bytes = self.header.record_size.node_bytes();
        let offset = index as usize * node_bytes;
        let bytes = self.data.get(offset..offset + node_bytes).ok_or_else(|| {
            GeoDbError::Truncated(format!(
                "Node {} at offset {} exceeds tree size {}",
                index,
                offset,
                self.data.len()
            ))
        })?;

        Ok(unpack_node(self.header.record_size, bytes))
    }

    /// Find the IPv4 start node in an IPv6 tree
    ///
    /// IPv4 addresses in IPv6 trees live under ::/96, so we follow 96 zero
    /// bits (left record each time). The result is a node index, or a
    /// terminal record if the tree resolves before bit 96. IPv4 trees start
    /// at the root.
    pub fn find_ipv4_start_node(&self) -> Result<u32> {
        if self.header.ip_version == IpVersion::V4 {
            return Ok(0);
        }

        let mut record = 0u32;
        for _ in 0..96 {
            if record >= self.header.node_count {
                break;
            }
            record = self.read_node(record)?.0;
        }

        Ok(record)
    }
}

/// Split one node's bytes into its (left, right) records
fn unpack_node(record_size: RecordSize, bytes: &[u8]) -> (u32, u32) {
    match record_size {
        RecordSize::Bits24 => unpack_24(bytes),
        RecordSize::Bits28 => unpack_28(bytes),
        RecordSize::Bits32 => unpack_32(bytes),
    }
}

/// `[L2 L1 L0][R2 R1 R0]`
fn unpack_24(b: &[u8]) -> (u32, u32) {
    let left = (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32;
    let right = (b[3] as u32) << 16 | (b[4] as u32) << 8 | b[5] as u32;
    (left, right)
}

/// `[L2 L1 L0][Lh:Rh][R2 R1 R0]`
///
/// The middle byte carries bits 24-27 of the left record in its high nibble
/// and bits 24-27 of the right record in its low nibble.
fn unpack_28(b: &[u8]) -> (u32, u32) {
    let left_high = ((b[3] >> 4) & 0x0F) as u32;
    let right_high = (b[3] & 0x0F) as u32;
    let left = left_high << 24 | (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32;
    let right = right_high << 24 | (b[4] as u32) << 16 | (b[5] as u32) << 8 | b[6] as u32;
    (left, right)
}

/// `[L3 L2 L1 L0][R3 R2 R1 R0]`
fn unpack_32(b: &[u8]) -> (u32, u32) {
    let left = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
    let right = u32::from_be_bytes([b[4], b[5], b[6], b[7]]);
    (left, right)
}
