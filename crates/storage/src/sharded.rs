//! Sharded in-memory record store
//!
//! DashMap keyed by space name, FxHashMap of records within each space.
//!
//! # Design
//!
//! - DashMap: sharded by space, reads never block other spaces
//! - FxHashMap: O(1) lookups, fast non-crypto hash
//! - One global AtomicU64 hands out record versions
//!
//! # Compare-and-swap
//!
//! `put` with an expected version holds the space's write guard while it
//! compares and installs the new record, so two writers that read the same
//! version can never both succeed. The loser gets `Conflict` and is expected
//! to re-read.
//!
//! # Scan consistency
//!
//! `scan` copies matching records out under a read guard and then yields
//! them lazily. Writes that land after the copy are not seen; a record
//! written or deleted concurrently with the copy may or may not be included.
//! Callers must not rely on either outcome.

use atomdoc_core::{
    Error, Predicate, PrimaryKey, Record, RecordScan, RecordStore, Result, SpaceSchema,
    StoredRecord,
};
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Records of one space
#[derive(Debug)]
pub struct Shard {
    schema: SpaceSchema,
    /// HashMap with FxHash for O(1) lookups
    pub(crate) data: FxHashMap<PrimaryKey, StoredRecord>,
}

impl Shard {
    /// Create a new empty shard for a space
    pub fn new(schema: SpaceSchema) -> Self {
        Self {
            schema,
            data: FxHashMap::default(),
        }
    }

    /// Get the space schema
    pub fn schema(&self) -> &SpaceSchema {
        &self.schema
    }

    /// Get number of records in this shard
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if shard is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Sharded record store - DashMap by space, HashMap within
///
/// # Example
///
/// ```
/// use atomdoc_core::{Record, RecordStore, SpaceSchema};
/// use atomdoc_storage::ShardedStore;
///
/// let store = ShardedStore::new();
/// store.create_space(SpaceSchema::new("kv", "k"));
/// let version = store.put("kv", Record::new("a"), None).unwrap();
/// assert_eq!(store.get("kv", &"a".into()).unwrap().unwrap().version, version);
/// ```
pub struct ShardedStore {
    /// Per-space shards using DashMap
    shards: DashMap<String, Shard>,
    /// Last version handed out
    version: AtomicU64,
}

impl ShardedStore {
    /// Create new sharded store
    pub fn new() -> Self {
        Self {
            shards: DashMap::new(),
            version: AtomicU64::new(0),
        }
    }

    /// Create with expected number of spaces
    pub fn with_capacity(num_spaces: usize) -> Self {
        Self {
            shards: DashMap::with_capacity(num_spaces),
            version: AtomicU64::new(0),
        }
    }

    /// Get the last version handed out
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    #[inline]
    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Define a space
    ///
    /// Returns `false` (and leaves the existing space untouched) if a space
    /// with the same name already exists.
    pub fn create_space(&self, schema: SpaceSchema) -> bool {
        let name = schema.name.clone();
        match self.shards.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                debug!(
                    target: "atomdoc::storage",
                    space = %schema.name,
                    key_attribute = %schema.key_attribute,
                    "Created space"
                );
                slot.insert(Shard::new(schema));
                true
            }
        }
    }

    /// Check if a space exists
    pub fn has_space(&self, space: &str) -> bool {
        self.shards.contains_key(space)
    }

    /// Get number of spaces
    pub fn space_count(&self) -> usize {
        self.shards.len()
    }

    /// Get number of records in a space
    pub fn len(&self, space: &str) -> Result<usize> {
        self.shards
            .get(space)
            .map(|shard| shard.len())
            .ok_or_else(|| Error::unknown_space(space))
    }

    /// Check if a space holds no records
    pub fn is_empty(&self, space: &str) -> Result<bool> {
        self.len(space).map(|n| n == 0)
    }

}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStore")
            .field("space_count", &self.space_count())
            .field("version", &self.version())
            .finish()
    }
}

impl RecordStore for ShardedStore {
    fn schema(&self, space: &str) -> Result<SpaceSchema> {
        self.shards
            .get(space)
            .map(|shard| shard.schema.clone())
            .ok_or_else(|| Error::unknown_space(space))
    }

    fn get(&self, space: &str, key: &PrimaryKey) -> Result<Option<StoredRecord>> {
        let shard = self
            .shards
            .get(space)
            .ok_or_else(|| Error::unknown_space(space))?;
        Ok(shard.data.get(key).cloned())
    }

    fn put(&self, space: &str, record: Record, expected_version: Option<u64>) -> Result<u64> {
        let mut shard = self
            .shards
            .get_mut(space)
            .ok_or_else(|| Error::unknown_space(space))?;

        if let Some(expected) = expected_version {
            let current = shard.data.get(&record.key).map(|stored| stored.version);
            if current != Some(expected) {
                debug!(
                    target: "atomdoc::storage",
                    space,
                    key = %record.key,
                    expected,
                    ?current,
                    "Version mismatch on put"
                );
                return Err(Error::conflict(space, record.key.to_string()));
            }
        }

        let version = self.next_version();
        let key = record.key.clone();
        shard.data.insert(key, StoredRecord { record, version });
        Ok(version)
    }

    fn delete(
        &self,
        space: &str,
        key: &PrimaryKey,
        expected_version: Option<u64>,
    ) -> Result<Option<StoredRecord>> {
        let mut shard = self
            .shards
            .get_mut(space)
            .ok_or_else(|| Error::unknown_space(space))?;

        if let (Some(expected), Some(stored)) = (expected_version, shard.data.get(key)) {
            if stored.version != expected {
                debug!(
                    target: "atomdoc::storage",
                    space,
                    %key,
                    expected,
                    current = stored.version,
                    "Version mismatch on delete"
                );
                return Err(Error::conflict(space, key.to_string()));
            }
        }
        Ok(shard.data.remove(key))
    }

    fn scan(&self, space: &str, predicate: &Predicate) -> Result<RecordScan<'_>> {
        let shard = self
            .shards
            .get(space)
            .ok_or_else(|| Error::unknown_space(space))?;
        let key_attribute = shard.schema.key_attribute.as_str();
        let matched: Vec<(PrimaryKey, Record)> = shard
            .data
            .iter()
            .filter(|(_, stored)| predicate.matches(key_attribute, &stored.record))
            .map(|(key, stored)| (key.clone(), stored.record.clone()))
            .collect();
        Ok(Box::new(matched.into_iter()))
    }
}
