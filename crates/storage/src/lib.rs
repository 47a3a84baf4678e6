//! Storage layer for atomdoc
//!
//! This crate implements the in-memory storage collaborator consumed by the
//! update engine:
//! - ShardedStore: DashMap by space, FxHashMap of records within
//! - Version tokens from a global AtomicU64
//! - Compare-and-swap `put` for per-key atomic read-modify-write
//! - Snapshot `scan` filtered by a Predicate

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sharded;

pub use sharded::{Shard, ShardedStore};
