//! Update engine for atomdoc
//!
//! This crate drives a `RecordStore` to perform document-field updates:
//! - DocumentEngine: single-key updates, group updates, count and search
//! - FieldUpdate: one atomic operation addressed by a field path
//! - GroupReport: per-key breakdown of a group update
//! - EngineConfig: TOML configuration (retry policy, limits, dispatch)
//! - EngineMetrics: relaxed atomic counters
//!
//! The engine never owns records. Per-key atomicity comes from the store's
//! compare-and-swap `put`; conflicts are retried with exponential backoff.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod group;
pub mod metrics;
pub mod update;

pub use config::{EngineConfig, RetryConfig, CONFIG_FILE_NAME};
pub use engine::DocumentEngine;
pub use group::{GroupReport, KeyResult};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use update::{apply_batch, validate_batch, FieldUpdate, UpdateOutcome};
pub use tokio_util::sync::CancellationToken;
