//! Document update engine
//!
//! `DocumentEngine` drives the storage collaborator:
//! - `update_one`: get, apply the batch to a private copy, compare-and-swap
//!   put, restarting on conflict
//! - `group_update`: scan with a predicate, then `update_one` per candidate
//! - `group_delete`: the same scan and verdict, removing each candidate
//!
//! # Consistency
//!
//! Each key is updated atomically: the put only succeeds if the record still
//! has the version that was read. There is no atomicity across keys. A group
//! update that fails part-way leaves the keys it already updated in place.
//!
//! The candidate set of a group update comes from one scan. Records inserted,
//! modified or deleted while the scan runs may or may not be included; that
//! outcome is undefined. Records deleted after the scan are reported as
//! vanished and make the group result false.

use crate::config::EngineConfig;
use crate::group::{GroupReport, KeyResult};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::update::{apply_batch, validate_batch, FieldUpdate, UpdateOutcome};
use atomdoc_core::{Error, Predicate, PrimaryKey, Record, RecordStore, Result, SpaceSchema};
use rayon::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Atomic document-field update engine over a record store
pub struct DocumentEngine<S: RecordStore> {
    store: Arc<S>,
    config: EngineConfig,
    metrics: EngineMetrics,
}

impl<S: RecordStore> DocumentEngine<S> {
    /// Create an engine with the default configuration
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
            metrics: EngineMetrics::new(),
        }
    }

    /// Create an engine with a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn with_config(store: Arc<S>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            metrics: EngineMetrics::new(),
        })
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // ========================================================================
    // Plain reads and writes
    // ========================================================================

    /// Write a whole record after validating it against the limits
    ///
    /// # Errors
    ///
    /// `UnknownSpace`, or `LimitExceeded` if any attribute is too large.
    pub fn put(&self, space: &str, record: Record) -> Result<u64> {
        for doc in record.attributes.values() {
            self.config.limits.validate_document(doc)?;
        }
        self.store.put(space, record, None)
    }

    /// Read a record
    pub fn get(&self, space: &str, key: &PrimaryKey) -> Result<Option<Record>> {
        Ok(self.store.get(space, key)?.map(|stored| stored.record))
    }

    /// Count records matching `predicate`
    pub fn count(&self, space: &str, predicate: &Predicate) -> Result<usize> {
        Ok(self.store.scan(space, predicate)?.count())
    }

    /// Return records matching `predicate`, in no particular order
    pub fn search(&self, space: &str, predicate: &Predicate) -> Result<Vec<Record>> {
        Ok(self
            .store
            .scan(space, predicate)?
            .map(|(_, record)| record)
            .collect())
    }

    // ========================================================================
    // Single-key update path
    // ========================================================================

    /// Apply `updates` to one record, all or nothing
    ///
    /// Returns `NotApplied` if the key does not exist. Any path, type or
    /// limit error aborts the whole batch and nothing is written. A write
    /// conflict restarts the get-mutate-put sequence up to
    /// `retry.max_retries` times before `Conflict` is returned.
    pub fn update_one(
        &self,
        space: &str,
        key: &PrimaryKey,
        updates: &[FieldUpdate],
    ) -> Result<UpdateOutcome> {
        let schema = self.store.schema(space)?;
        validate_batch(&schema, updates, &self.config.limits)?;
        self.update_validated(&schema, key, updates)
    }

    fn update_validated(
        &self,
        schema: &SpaceSchema,
        key: &PrimaryKey,
        updates: &[FieldUpdate],
    ) -> Result<UpdateOutcome> {
        self.with_conflict_retry(schema, key, || self.try_update(schema, key, updates))
    }

    /// Run one single-key attempt, restarting it while it conflicts
    fn with_conflict_retry<F>(
        &self,
        schema: &SpaceSchema,
        key: &PrimaryKey,
        mut attempt_once: F,
    ) -> Result<UpdateOutcome>
    where
        F: FnMut() -> Result<UpdateOutcome>,
    {
        let retry = &self.config.retry;
        let mut last_error = None;

        for attempt in 0..=retry.max_retries {
            match attempt_once() {
                Ok(outcome) => {
                    match outcome {
                        UpdateOutcome::Applied { .. } => self.metrics.record_applied(),
                        UpdateOutcome::NotApplied => self.metrics.record_not_applied(),
                    }
                    return Ok(outcome);
                }
                Err(e) if e.is_conflict() && attempt < retry.max_retries => {
                    debug!(
                        target: "atomdoc::update",
                        space = %schema.name,
                        %key,
                        attempt,
                        "Write conflict, retrying"
                    );
                    self.metrics.record_conflict_retry();
                    last_error = Some(e);
                    std::thread::sleep(retry.calculate_delay(attempt));
                }
                Err(e) => {
                    warn!(
                        target: "atomdoc::update",
                        space = %schema.name,
                        %key,
                        error = %e,
                        "Update aborted"
                    );
                    self.metrics.record_failed();
                    return Err(e);
                }
            }
        }

        // The loop returns on its final attempt; this only guards the types
        self.metrics.record_failed();
        Err(last_error.unwrap_or_else(|| Error::conflict(&schema.name, key.to_string())))
    }

    fn try_update(
        &self,
        schema: &SpaceSchema,
        key: &PrimaryKey,
        updates: &[FieldUpdate],
    ) -> Result<UpdateOutcome> {
        let Some(stored) = self.store.get(&schema.name, key)? else {
            return Ok(UpdateOutcome::NotApplied);
        };
        let mut working = stored.record;
        apply_batch(&mut working, updates, &self.config.limits)?;
        let version = self.store.put(&schema.name, working, Some(stored.version))?;
        Ok(UpdateOutcome::Applied { version })
    }

    fn try_delete(&self, schema: &SpaceSchema, key: &PrimaryKey) -> Result<UpdateOutcome> {
        let Some(stored) = self.store.get(&schema.name, key)? else {
            return Ok(UpdateOutcome::NotApplied);
        };
        match self.store.delete(&schema.name, key, Some(stored.version))? {
            Some(removed) => {
                self.metrics.record_deleted();
                Ok(UpdateOutcome::Applied {
                    version: removed.version,
                })
            }
            None => Ok(UpdateOutcome::NotApplied),
        }
    }

    /// Remove one record
    ///
    /// Returns false if the key does not exist. A concurrent write between
    /// the read and the delete restarts the attempt, like `update_one`.
    pub fn delete_one(&self, space: &str, key: &PrimaryKey) -> Result<bool> {
        let schema = self.store.schema(space)?;
        let outcome = self.with_conflict_retry(&schema, key, || self.try_delete(&schema, key))?;
        Ok(outcome.is_applied())
    }

    // ========================================================================
    // Group update coordinator
    // ========================================================================

    /// Apply `updates` to every record matching `predicate`
    ///
    /// True only if at least one record matched and every matched record was
    /// updated. Failures on some keys do not stop the others and are not
    /// rolled back. Errors that prevent the scan (unknown space, invalid
    /// batch) also yield false.
    pub fn group_update(&self, space: &str, predicate: &Predicate, updates: &[FieldUpdate]) -> bool {
        match self.group_update_report(space, predicate, updates) {
            Ok(report) => report.succeeded(),
            Err(e) => {
                warn!(target: "atomdoc::group", space, error = %e, "Group update rejected");
                false
            }
        }
    }

    /// Like [`group_update`](Self::group_update), with a per-key breakdown
    pub fn group_update_report(
        &self,
        space: &str,
        predicate: &Predicate,
        updates: &[FieldUpdate],
    ) -> Result<GroupReport> {
        self.group_update_cancellable(space, predicate, updates, &CancellationToken::new())
    }

    /// Group update that stops between keys once `cancel` is triggered
    ///
    /// Keys already updated stay updated; keys not yet reached are counted
    /// as skipped.
    pub fn group_update_cancellable(
        &self,
        space: &str,
        predicate: &Predicate,
        updates: &[FieldUpdate],
        cancel: &CancellationToken,
    ) -> Result<GroupReport> {
        let schema = self.store.schema(space)?;
        validate_batch(&schema, updates, &self.config.limits)?;
        self.run_group("update", &schema, predicate, cancel, |key| {
            self.update_validated(&schema, key, updates)
        })
    }

    /// Remove every record matching `predicate`
    ///
    /// Same verdict as [`group_update`](Self::group_update): true only if at
    /// least one record matched and every matched record was removed. A key
    /// that is already gone when its turn comes counts against the verdict.
    pub fn group_delete(&self, space: &str, predicate: &Predicate) -> bool {
        match self.group_delete_report(space, predicate) {
            Ok(report) => report.succeeded(),
            Err(e) => {
                warn!(target: "atomdoc::group", space, error = %e, "Group delete rejected");
                false
            }
        }
    }

    /// Like [`group_delete`](Self::group_delete), with a per-key breakdown
    pub fn group_delete_report(&self, space: &str, predicate: &Predicate) -> Result<GroupReport> {
        self.group_delete_cancellable(space, predicate, &CancellationToken::new())
    }

    /// Group delete that stops between keys once `cancel` is triggered
    pub fn group_delete_cancellable(
        &self,
        space: &str,
        predicate: &Predicate,
        cancel: &CancellationToken,
    ) -> Result<GroupReport> {
        let schema = self.store.schema(space)?;
        self.run_group("delete", &schema, predicate, cancel, |key| {
            self.with_conflict_retry(&schema, key, || self.try_delete(&schema, key))
        })
    }

    /// Scan once, run `per_key` on every candidate and fold the results
    fn run_group<F>(
        &self,
        operation: &'static str,
        schema: &SpaceSchema,
        predicate: &Predicate,
        cancel: &CancellationToken,
        per_key: F,
    ) -> Result<GroupReport>
    where
        F: Fn(&PrimaryKey) -> Result<UpdateOutcome> + Sync,
    {
        let space = schema.name.as_str();
        let keys: Vec<PrimaryKey> = self
            .store
            .scan(space, predicate)?
            .map(|(key, _)| key)
            .collect();
        debug!(target: "atomdoc::group", space, operation, candidates = keys.len(), "Scan complete");

        let run = |key: &PrimaryKey| -> KeyResult {
            if cancel.is_cancelled() {
                return KeyResult::Skipped;
            }
            match per_key(key) {
                Ok(UpdateOutcome::Applied { .. }) => KeyResult::Applied,
                Ok(UpdateOutcome::NotApplied) => {
                    debug!(target: "atomdoc::group", space, %key, "Candidate vanished");
                    KeyResult::Vanished
                }
                Err(e) => KeyResult::Failed(e),
            }
        };

        let results: Vec<KeyResult> = if self.config.parallel_group_updates {
            keys.par_iter().map(run).collect()
        } else {
            keys.iter().map(run).collect()
        };
        let report = GroupReport::from_results(keys.into_iter().zip(results));

        let succeeded = report.succeeded();
        self.metrics.record_group(succeeded);
        info!(
            target: "atomdoc::group",
            space,
            operation,
            matched = report.matched,
            applied = report.applied,
            vanished = report.vanished.len(),
            failed = report.failed.len(),
            skipped = report.skipped,
            succeeded,
            "Group operation finished"
        );
        Ok(report)
    }
}

impl<S: RecordStore> std::fmt::Debug for DocumentEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentEngine")
            .field("config", &self.config)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
