//! Storage collaborator abstraction
//!
//! The update engine never owns records. It reads, writes and scans through
//! [`RecordStore`], which lets the in-memory reference store be swapped for
//! any backend that can provide per-key compare-and-swap.
//!
//! Thread safety: all methods must be safe to call concurrently from
//! multiple threads (requires Send + Sync).

use crate::error::Result;
use crate::predicate::Predicate;
use crate::record::{PrimaryKey, Record, SpaceSchema, StoredRecord};

/// Lazy, finite, single-pass sequence of scan results
pub type RecordScan<'a> = Box<dyn Iterator<Item = (PrimaryKey, Record)> + Send + 'a>;

/// Storage collaborator consumed by the update engine
pub trait RecordStore: Send + Sync {
    /// Get a space's schema
    ///
    /// # Errors
    ///
    /// Returns `UnknownSpace` if the space does not exist.
    fn schema(&self, space: &str) -> Result<SpaceSchema>;

    /// Get the current record and its version
    ///
    /// Returns `None` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSpace` if the space does not exist.
    fn get(&self, space: &str, key: &PrimaryKey) -> Result<Option<StoredRecord>>;

    /// Write a record, returning its new version
    ///
    /// With `expected_version = Some(v)` the write only succeeds if the
    /// stored record still has version `v`; with `None` it is an
    /// unconditional upsert.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the stored version differs from
    /// `expected_version` (including a record deleted since it was read).
    fn put(&self, space: &str, record: Record, expected_version: Option<u64>) -> Result<u64>;

    /// Remove a record, returning what was removed
    ///
    /// With `expected_version = Some(v)` the record is only removed if it
    /// still has version `v`. A key that does not exist yields `Ok(None)`
    /// in either mode.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the record exists with a version other than
    /// `expected_version`, and `UnknownSpace` if the space does not exist.
    fn delete(
        &self,
        space: &str,
        key: &PrimaryKey,
        expected_version: Option<u64>,
    ) -> Result<Option<StoredRecord>>;

    /// Yield every record in the space that matches `predicate`
    ///
    /// No ordering is guaranteed. Whether writes that race with the scan are
    /// observed is undefined.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSpace` if the space does not exist.
    fn scan(&self, space: &str, predicate: &Predicate) -> Result<RecordScan<'_>>;
}
