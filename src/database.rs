//! Geo Database API
//!
//! Opens an MMDB file (memory-mapped) or an in-memory buffer, validates its
//! metadata once, and answers IP lookups with decoded data section values.
//!
//! A `Database` never changes after it is opened. It has no interior
//! mutability, so a single instance can be shared across threads behind an
//! `Arc` and queried concurrently.

use crate::data_section::{DataDecoder, DataValue};
use crate::error::{GeoDbError, Result};
use crate::mmdb::{IpVersion, Metadata, MmdbHeader, SearchTree, TreeHit};
use memmap2::Mmap;
use std::fs::File;
use std::net::IpAddr;
use std::path::Path;
use tracing::info;

/// Result of a successful IP lookup
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    /// The record associated with the network containing the address
    pub data: DataValue,
    /// Network prefix length (CIDR) of the matching network
    pub prefix_len: u8,
}

/// Storage backing for database data
enum DatabaseStorage {
    Owned(Vec<u8>),
    Mmap(Mmap),
}

impl DatabaseStorage {
    fn as_slice(&self) -> &[u8] {
        match self {
            DatabaseStorage::Owned(v) => v.as_slice(),
            DatabaseStorage::Mmap(m) => &m[..],
        }
    }
}

/// An opened, validated MMDB database
///
/// # Examples
///
/// ```rust,no_run
/// use ipsearch::Database;
///
/// let db = Database::open("GeoLite2-City.mmdb")?;
/// if let Some(result) = db.lookup("203.0.113.5")? {
///     println!("/{}: {:?}", result.prefix_len, result.data);
/// }
/// # Ok::<(), ipsearch::GeoDbError>(())
/// ```
pub struct Database {
    data: DatabaseStorage,
    header: MmdbHeader,
    metadata: Metadata,
    /// Where IPv4 descents begin (root for IPv4 trees)
    ipv4_start: u32,
}

impl Database {
    /// Open a database file using memory mapping
    ///
    /// The file is validated before this returns; a database that opens
    /// successfully has a consistent layout.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            GeoDbError::Io(format!("Failed to open {}: {}", path.display(), e))
        })?;

        // SAFETY: the mapping is read-only and the file is expected not to be
        // modified while mapped; databases are replaced by rename, not in place.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
            GeoDbError::Io(format!("Failed to mmap {}: {}", path.display(), e))
        })?;

        let db = Self::from_storage(DatabaseStorage::Mmap(mmap))?;
        info!(
            path = %path.display(),
            database_type = %db.metadata.database_type,
            node_count = db.metadata.node_count,
            record_size = db.metadata.record_size,
            ip_version = db.metadata.ip_version,
            "opened geo database"
        );
        Ok(db)
    }

    /// Create a database from an owned buffer
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_storage(DatabaseStorage::Owned(data))
    }

    fn from_storage(storage: DatabaseStorage) -> Result<Self> {
        let (header, metadata) = MmdbHeader::from_file(storage.as_slice())?;
        let ipv4_start = {
            let bytes = storage.as_slice();
            SearchTree::new(&bytes[..header.tree_size], &header).find_ipv4_start_node()?
        };

        Ok(Database {
            data: storage,
            header,
            metadata,
            ipv4_start,
        })
    }

    /// Metadata decoded at open time
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Address family the search tree is keyed on
    pub fn ip_version(&self) -> IpVersion {
        self.header.ip_version
    }

    /// Layout derived from the metadata
    pub fn header(&self) -> &MmdbHeader {
        &self.header
    }

    /// Total size of the database in bytes
    pub fn size(&self) -> usize {
        self.data.as_slice().len()
    }

    /// Bounds-checked view of `length` bytes at `offset`
    pub fn read_bytes(&self, offset: usize, length: usize) -> Result<&[u8]> {
        let data = self.data.as_slice();
        offset
            .checked_add(length)
            .and_then(|end| data.get(offset..end))
            .ok_or_else(|| {
                GeoDbError::Truncated(format!(
                    "Read of {} bytes at offset {} exceeds database size {}",
                    length,
                    offset,
                    data.len()
                ))
            })
    }

    /// Read the (left, right) records of a search tree node
    pub fn read_node(&self, index: u32) -> Result<(u32, u32)> {
        self.tree().read_node(index)
    }

    /// Walk the search tree for `addr` without decoding the record
    pub fn lookup_pointer(&self, addr: IpAddr) -> Result<Option<TreeHit>> {
        self.tree().lookup(addr, self.ipv4_start)
    }

    /// Decode the value at `offset` within the data section
    pub fn decode(&self, offset: usize) -> Result<DataValue> {
        let section = &self.data.as_slice()[self.header.data_section.clone()];
        DataDecoder::new(section).decode(offset)
    }

    /// Look up an IP address given as text
    ///
    /// Returns `Ok(None)` when the database has no data for the address and
    /// `InvalidAddress` when the text is not an IPv4 or IPv6 literal.
    pub fn lookup(&self, query: &str) -> Result<Option<LookupResult>> {
        let addr = query
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| GeoDbError::InvalidAddress(query.to_string()))?;
        self.lookup_ip(addr)
    }

    /// Look up an IP address
    pub fn lookup_ip(&self, addr: IpAddr) -> Result<Option<LookupResult>> {
        let hit = match self.lookup_pointer(addr)? {
            Some(hit) => hit,
            None => return Ok(None),
        };

        let data = self.decode(hit.data_offset)?;
        Ok(Some(LookupResult {
            data,
            prefix_len: hit.prefix_len,
        }))
    }

    fn tree(&self) -> SearchTree<'_> {
        SearchTree::new(&self.data.as_slice()[..self.header.tree_size], &self.header)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("database_type", &self.metadata.database_type)
            .field("node_count", &self.header.node_count)
            .field("record_size", &self.header.record_size)
            .field("ip_version", &self.header.ip_version)
            .field("size", &self.size())
            .finish()
    }
}
