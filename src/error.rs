/// Error types for the ipsearch library
use std::fmt;

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, GeoDbError>;

/// Main error type for opening and querying geo databases
///
/// "No match" is not an error: lookups return `Ok(None)` for addresses the
/// database does not cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoDbError {
    /// Query text is not an IPv4 or IPv6 literal
    InvalidAddress(String),

    /// Metadata trailer missing, undecodable, or missing required fields
    CorruptMetadata(String),

    /// Format version or record size this reader does not understand
    UnsupportedVersion(String),

    /// A region declared by the metadata lies outside the buffer
    Truncated(String),

    /// Search tree references a node that does not exist or never resolves
    CorruptTrie(String),

    /// Data section value could not be decoded
    CorruptRecord(String),

    /// I/O errors while opening or mapping the file
    Io(String),

    /// Lookup attempted on a database handle that has been closed
    Closed(String),
}

impl GeoDbError {
    /// True for errors that describe damage in the database bytes
    /// (as opposed to bad input or I/O failure)
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GeoDbError::CorruptMetadata(_)
                | GeoDbError::UnsupportedVersion(_)
                | GeoDbError::Truncated(_)
                | GeoDbError::CorruptTrie(_)
                | GeoDbError::CorruptRecord(_)
        )
    }
}

impl fmt::Display for GeoDbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoDbError::InvalidAddress(msg) => write!(f, "Invalid IP address: {}", msg),
            GeoDbError::CorruptMetadata(msg) => write!(f, "Corrupt metadata: {}", msg),
            GeoDbError::UnsupportedVersion(msg) => write!(f, "Unsupported database: {}", msg),
            GeoDbError::Truncated(msg) => write!(f, "Database truncated: {}", msg),
            GeoDbError::CorruptTrie(msg) => write!(f, "Corrupt search tree: {}", msg),
            GeoDbError::CorruptRecord(msg) => write!(f, "Corrupt record: {}", msg),
            GeoDbError::Io(msg) => write!(f, "I/O error: {}", msg),
            GeoDbError::Closed(msg) => write!(f, "Database closed: {}", msg),
        }
    }
}

impl std::error::Error for GeoDbError {}

impl From<std::io::Error> for GeoDbError {
    fn from(err: std::io::Error) -> Self {
        GeoDbError::Io(err.to_string())
    }
}
