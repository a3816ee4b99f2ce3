//! Lookup facade used by the HTTP layer
//!
//! [`DatabaseHandle`] owns the open/close lifecycle of one database file.
//! [`GeoReader`] sits on top of a handle and turns text addresses into flat
//! geo records, keeping structural problems out of the caller's way: they
//! are logged, counted and reported as "no match".

use crate::database::Database;
use crate::error::{GeoDbError, Result};
use crate::geo::{AsnRecord, CityRecord, FromRecord};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared, closable reference to an opened database
///
/// Lookups clone the inner `Arc` and release the lock before touching the
/// database, so `close` never waits on (or invalidates) a running lookup.
pub struct DatabaseHandle {
    path: PathBuf,
    inner: RwLock<Option<Arc<Database>>>,
}

impl DatabaseHandle {
    /// Handle for `path`, not yet opened
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        DatabaseHandle {
            path: path.into(),
            inner: RwLock::new(None),
        }
    }

    /// Create a handle and open it
    pub fn open_path<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let handle = Self::new(path);
        handle.open()?;
        Ok(handle)
    }

    /// Wrap an already opened database (e.g. one built from bytes)
    pub fn from_database(db: Database) -> Self {
        DatabaseHandle {
            path: PathBuf::new(),
            inner: RwLock::new(Some(Arc::new(db))),
        }
    }

    /// Open the database file. Does nothing if already open.
    pub fn open(&self) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.is_none() {
            *inner = Some(Arc::new(Database::open(&self.path)?));
        }
        Ok(())
    }

    /// Release the handle's reference to the database
    ///
    /// The mapping is unmapped once the last in-flight lookup drops its
    /// clone.
    pub fn close(&self) {
        if self.inner.write().take().is_some() {
            info!(path = %self.path.display(), "closed geo database");
        }
    }

    /// True between a successful `open` and `close`
    pub fn is_open(&self) -> bool {
        self.inner.read().is_some()
    }

    /// The database, or `Closed` if the handle is not open
    pub fn get(&self) -> Result<Arc<Database>> {
        self.inner
            .read()
            .clone()
            .ok_or_else(|| GeoDbError::Closed(self.path.display().to_string()))
    }

    /// Path this handle opens
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Typed lookups against one logical database (city or ASN)
pub struct GeoReader {
    name: String,
    handle: DatabaseHandle,
    anomalies: AtomicU64,
}

impl GeoReader {
    /// Reader named `name` (used in log lines) over `handle`
    pub fn new(name: impl Into<String>, handle: DatabaseHandle) -> Self {
        GeoReader {
            name: name.into(),
            handle,
            anomalies: AtomicU64::new(0),
        }
    }

    /// Open the database at `path` and wrap it in a reader
    pub fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(name, DatabaseHandle::open_path(path)?))
    }

    /// Look up `ip` and project the record into `R`
    ///
    /// `Ok(None)` means the database has no data for the address.
    pub fn lookup<R: FromRecord>(&self, ip: &str) -> Result<Option<R>> {
        let db = self.handle.get()?;
        Ok(db
            .lookup(ip)?
            .map(|result| R::from_record(&result.data)))
    }

    /// City projection for `ip`
    pub fn lookup_city(&self, ip: &str) -> Result<Option<CityRecord>> {
        self.lookup(ip)
    }

    /// ASN projection for `ip`
    pub fn lookup_asn(&self, ip: &str) -> Result<Option<AsnRecord>> {
        self.lookup(ip)
    }

    /// Look up `ip`, treating every failure as "no match"
    ///
    /// Structural errors are logged at warn and counted in
    /// [`anomalies`](Self::anomalies); unparseable addresses are logged at
    /// debug.
    pub fn lookup_or_default<R: FromRecord>(&self, ip: &str) -> R {
        match self.lookup(ip) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(db = %self.name, ip, "no match");
                R::default()
            }
            Err(GeoDbError::InvalidAddress(_)) => {
                debug!(db = %self.name, ip, "not an IP address");
                R::default()
            }
            Err(e) => {
                if e.is_structural() {
                    self.anomalies.fetch_add(1, Ordering::Relaxed);
                }
                warn!(db = %self.name, ip, error = %e, "lookup failed");
                R::default()
            }
        }
    }

    /// Number of lookups that hit a structural error since creation
    pub fn anomalies(&self) -> u64 {
        self.anomalies.load(Ordering::Relaxed)
    }

    /// Name used in log lines
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying handle
    pub fn handle(&self) -> &DatabaseHandle {
        &self.handle
    }

    /// Close the underlying database
    pub fn close(&self) {
        self.handle.close();
    }
}
