//! ipsearch - IP Geolocation over MaxMind DB Files
//!
//! ipsearch answers "where is this IP address and what language does it
//! likely speak". The core is a reader for the MaxMind DB (MMDB) binary
//! format: a bit-level search tree mapping IPv4/IPv6 networks to records in
//! a self-describing data section.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ipsearch::{CityRecord, GeoReader};
//!
//! let city = GeoReader::open("city", "Data/GeoLite2-City.mmdb")?;
//!
//! if let Some(record) = city.lookup_city("203.0.113.5")? {
//!     println!("{} ({}, {})", record.country, record.latitude, record.longitude);
//! }
//!
//! // Every failure collapses to default fields
//! let record: CityRecord = city.lookup_or_default("not an ip");
//! assert!(record.country.is_empty());
//! # Ok::<(), ipsearch::GeoDbError>(())
//! ```
//!
//! Raw records are available through [`Database`]:
//!
//! ```rust,no_run
//! use ipsearch::Database;
//!
//! let db = Database::open("Data/GeoLite2-ASN.mmdb")?;
//! if let Some(result) = db.lookup("2001:db8::1")? {
//!     println!("/{} {:?}", result.prefix_len, result.data.get("autonomous_system_number"));
//! }
//! # Ok::<(), ipsearch::GeoDbError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  MMDB File Format                    │
//! ├──────────────────────────────────────┤
//! │  1. Search Tree (binary trie)        │
//! │  2. 16-byte separator                │
//! │  3. Data Section (typed values)      │
//! │  4. Marker + Metadata map            │
//! └──────────────────────────────────────┘
//!          ↓ mmap()
//! ┌──────────────────────────────────────┐
//! │  Database (read-only, Send + Sync)   │
//! │    SearchTree -> DataDecoder         │
//! └──────────────────────────────────────┘
//!          ↓ Arc
//! ┌──────────────────────────────────────┐
//! │  GeoReader (city / asn)              │
//! │    -> CityRecord / AsnRecord         │
//! └──────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Data section decoding
pub mod data_section;
/// Opened database and raw lookups
pub mod database;
/// Error types for database operations
pub mod error;
/// Flat city and ASN records
pub mod geo;
/// Country code to culture tag table
pub mod language;
/// MMDB format: metadata, layout and search tree
pub mod mmdb;
/// Lookup facade and database lifecycle
pub mod reader;
/// HTTP service
#[cfg(feature = "server")]
pub mod server;

pub use crate::data_section::DataValue;
pub use crate::database::{Database, LookupResult};
pub use crate::error::{GeoDbError, Result};
pub use crate::geo::{AsnRecord, CityRecord, FromRecord, GeoResult};
pub use crate::language::{language_for_country, DEFAULT_LANGUAGE};
pub use crate::mmdb::{IpVersion, Metadata, RecordSize};
pub use crate::reader::{DatabaseHandle, GeoReader};

/// Version of the ipsearch library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
