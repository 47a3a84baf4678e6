//! atomdoc - atomic document-field updates for a key/value store
//!
//! atomdoc addresses nested values inside document attributes with dotted
//! field paths, applies typed atomic operations to them, and extends this to
//! group updates that select records with a predicate first.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use atomdoc::{DocumentEngine, FieldUpdate, Predicate, Record, ShardedStore, SpaceSchema};
//!
//! let store = Arc::new(ShardedStore::new());
//! store.create_space(SpaceSchema::new("kv", "k"));
//! let engine = DocumentEngine::new(store);
//!
//! engine
//!     .put("kv", Record::new("a").with("v", serde_json::json!({"c": {"d": 1}})))
//!     .unwrap();
//!
//! let matched = Predicate::new().equals("k", "a").unwrap();
//! let add = FieldUpdate::add("v.c.d", 1i64).unwrap();
//! assert!(engine.group_update("kv", &matched, &[add]));
//! ```
//!
//! # Architecture
//!
//! - `atomdoc-core`: document model, path resolver, executor, predicates,
//!   the `RecordStore` trait
//! - `atomdoc-storage`: `ShardedStore`, an in-memory `RecordStore`
//! - `atomdoc-engine`: `DocumentEngine`, the single-key and group update
//!   paths

pub use atomdoc_core::*;
pub use atomdoc_engine::{
    CancellationToken, DocumentEngine, EngineConfig, FieldUpdate, GroupReport, KeyResult,
    MetricsSnapshot, RetryConfig, UpdateOutcome, CONFIG_FILE_NAME,
};
pub use atomdoc_storage::ShardedStore;
