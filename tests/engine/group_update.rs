//! Group update coordinator
//!
//! The verdict is true only when at least one record matched and every
//! matched record was updated. Failures never roll back other keys.

use crate::common::*;
use atomdoc::{CancellationToken, KeyResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn seed(t: &TestEngine, n: i64) {
    for i in 0..n {
        t.engine
            .put(SPACE, Record::new(i).with("v", json!({"n": i, "tag": "x"})))
            .unwrap();
    }
}

#[test]
fn zero_matches_is_false_and_mutates_nothing() {
    let t = TestEngine::new();
    seed(&t, 3);
    let before: Vec<_> = (0..3i64).map(|i| t.record(i)).collect();

    let pred = Predicate::new().equals("v.tag", "nope").unwrap();
    let report = t.engine.group_update_report(SPACE, &pred, &[add("v.n", 1)]).unwrap();
    assert_eq!(report.matched, 0);
    assert!(!report.succeeded());
    assert!(!t.engine.group_update(SPACE, &pred, &[add("v.n", 1)]));

    let after: Vec<_> = (0..3i64).map(|i| t.record(i)).collect();
    assert_eq!(before, after);
}

#[test]
fn empty_space_is_false() {
    let t = TestEngine::new();
    assert!(!t.engine.group_update(SPACE, &Predicate::new(), &[add("v.n", 1)]));
}

#[test]
fn all_matches_updated_is_true() {
    let t = TestEngine::new();
    seed(&t, 10);
    let pred = Predicate::new()
        .condition("v.n", Comparator::GreaterEqual(5i64.into()))
        .unwrap();

    let report = t.engine.group_update_report(SPACE, &pred, &[add("v.n", 100)]).unwrap();
    assert!(report.succeeded());
    assert_eq!(report.matched, 5);
    assert_eq!(report.applied, 5);

    for i in 0..10i64 {
        let expected = if i >= 5 { i + 100 } else { i };
        assert_eq!(t.field(i, "v.n"), Some(Document::Int(expected)));
    }
}

#[test]
fn one_failure_forces_false_but_others_persist() {
    let t = TestEngine::new();
    seed(&t, 4);
    // Key 2 holds a string where the others hold ints
    t.engine
        .put(SPACE, Record::new(2i64).with("v", json!({"n": "two", "tag": "x"})))
        .unwrap();

    let pred = Predicate::new().equals("v.tag", "x").unwrap();
    let report = t.engine.group_update_report(SPACE, &pred, &[add("v.n", 10)]).unwrap();

    assert!(!report.succeeded());
    assert_eq!(report.matched, 4);
    assert_eq!(report.applied, 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, PrimaryKey::Int(2));
    assert!(report.failed[0].1.is_type_error());

    assert_eq!(t.field(0i64, "v.n"), Some(Document::Int(10)));
    assert_eq!(t.field(1i64, "v.n"), Some(Document::Int(11)));
    assert_eq!(t.field(2i64, "v.n"), Some(Document::from("two")));
    assert_eq!(t.field(3i64, "v.n"), Some(Document::Int(13)));
}

#[test]
fn predicate_path_mismatch_is_unmatched_not_error() {
    let t = TestEngine::new();
    t.put_doc("list", json!({"c": [1, 2]}));
    t.put_doc("map", json!({"c": {"d": 1}}));

    let pred = Predicate::new().equals("v.c.d", 1i64).unwrap();
    let report = t.engine.group_update_report(SPACE, &pred, &[add("v.hits", 1)]).unwrap();
    assert_eq!(report.matched, 1);
    assert!(report.succeeded());
    assert_eq!(t.field("map", "v.hits"), Some(Document::Int(1)));
    assert_eq!(t.field("list", "v.hits"), None);
}

#[test]
fn invalid_batch_is_rejected_up_front() {
    let t = TestEngine::new();
    seed(&t, 2);
    let err = t
        .engine
        .group_update_report(SPACE, &Predicate::new(), &[FieldUpdate::set(KEY_ATTR, 1i64).unwrap()])
        .unwrap_err();
    assert!(matches!(err, Error::KeyAttributeImmutable { .. }));
    assert!(!t.engine.group_update(SPACE, &Predicate::new(), &[FieldUpdate::set(KEY_ATTR, 1i64).unwrap()]));
}

#[test]
fn parallel_dispatch_gives_same_verdict() {
    let t = TestEngine::parallel();
    seed(&t, 200);
    t.engine
        .put(SPACE, Record::new(77i64).with("v", json!({"n": [], "tag": "x"})))
        .unwrap();

    let pred = Predicate::new().equals("v.tag", "x").unwrap();
    let report = t.engine.group_update_report(SPACE, &pred, &[add("v.n", 1)]).unwrap();
    assert_eq!(report.matched, 200);
    assert_eq!(report.applied, 199);
    assert_eq!(report.failed.len(), 1);
    assert!(!report.succeeded());
    assert_eq!(t.field(5i64, "v.n"), Some(Document::Int(6)));
}

#[test]
fn parallel_all_success() {
    let t = TestEngine::parallel();
    seed(&t, 64);
    assert!(t.engine.group_update(SPACE, &Predicate::new(), &[add("v.n", 1)]));
    for i in 0..64i64 {
        assert_eq!(t.field(i, "v.n"), Some(Document::Int(i + 1)));
    }
}

// ============================================================================
// Keys that vanish between scan and update
// ============================================================================

#[test]
fn vanished_key_forces_false() {
    init_tracing();
    let store = Arc::new(VanishingStore::new());
    let engine = DocumentEngine::new(Arc::clone(&store));
    for i in 0..3i64 {
        engine
            .put(SPACE, Record::new(i).with("v", json!({"n": 0})))
            .unwrap();
    }

    let report = engine
        .group_update_report(SPACE, &Predicate::new(), &[add("v.n", 1)])
        .unwrap();
    assert_eq!(report.matched, 3);
    assert_eq!(report.vanished.len(), 1);
    assert_eq!(report.applied, 2);
    assert!(report.failed.is_empty());
    assert!(!report.succeeded());

    // The vanished key is not resurrected
    let gone = &report.vanished[0];
    assert!(engine.get(SPACE, gone).unwrap().is_none());
}

// ============================================================================
// Cancellation
// ============================================================================

/// Store that triggers a cancellation token on its Nth read
struct CancellingStore {
    inner: ShardedStore,
    reads: AtomicUsize,
    cancel_after: usize,
    cancel: CancellationToken,
}

impl CancellingStore {
    fn new(cancel_after: usize, cancel: CancellationToken) -> Self {
        let inner = ShardedStore::new();
        inner.create_space(SpaceSchema::new(SPACE, KEY_ATTR));
        CancellingStore {
            inner,
            reads: AtomicUsize::new(0),
            cancel_after,
            cancel,
        }
    }
}

impl RecordStore for CancellingStore {
    fn schema(&self, space: &str) -> atomdoc::Result<SpaceSchema> {
        self.inner.schema(space)
    }

    fn get(&self, space: &str, key: &PrimaryKey) -> atomdoc::Result<Option<StoredRecord>> {
        if self.reads.fetch_add(1, Ordering::SeqCst) + 1 == self.cancel_after {
            self.cancel.cancel();
        }
        self.inner.get(space, key)
    }

    fn put(&self, space: &str, record: Record, expected: Option<u64>) -> atomdoc::Result<u64> {
        self.inner.put(space, record, expected)
    }

    fn delete(
        &self,
        space: &str,
        key: &PrimaryKey,
        expected: Option<u64>,
    ) -> atomdoc::Result<Option<StoredRecord>> {
        self.inner.delete(space, key, expected)
    }

    fn scan(&self, space: &str, predicate: &Predicate) -> atomdoc::Result<RecordScan<'_>> {
        self.inner.scan(space, predicate)
    }
}

#[test]
fn cancellation_stops_between_keys() {
    init_tracing();
    const CANCEL_AFTER: usize = 7;
    let cancel = CancellationToken::new();
    let store = Arc::new(CancellingStore::new(CANCEL_AFTER, cancel.clone()));
    let engine = DocumentEngine::new(Arc::clone(&store));
    for i in 0..50i64 {
        store
            .inner
            .put(SPACE, Record::new(i).with("v", json!({"n": 0})), None)
            .unwrap();
    }

    // The key whose read triggers the token still finishes; the rest are skipped
    let report = engine
        .group_update_cancellable(SPACE, &Predicate::new(), &[add("v.n", 1)], &cancel)
        .unwrap();
    assert_eq!(report.matched, 50);
    assert_eq!(report.applied, CANCEL_AFTER);
    assert_eq!(report.skipped, 50 - CANCEL_AFTER);
    assert!(report.cancelled);
    assert!(!report.succeeded());

    let updated = engine
        .count(SPACE, &Predicate::new().equals("v.n", 1i64).unwrap())
        .unwrap();
    assert_eq!(updated, CANCEL_AFTER);
}

#[test]
fn cancelled_token_skips_every_key() {
    let t = TestEngine::new();
    seed(&t, 50);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = t
        .engine
        .group_update_cancellable(SPACE, &Predicate::new(), &[add("v.n", 1)], &cancel)
        .unwrap();
    assert_eq!(report.skipped, 50);
    assert_eq!(report.applied, 0);
    assert!(!report.succeeded());
    assert_eq!(t.field(0i64, "v.n"), Some(Document::Int(0)));
}

// ============================================================================
// Storage failures
// ============================================================================

/// Store whose reads fail for one key
struct FlakyStore {
    inner: ShardedStore,
    broken: PrimaryKey,
}

impl RecordStore for FlakyStore {
    fn schema(&self, space: &str) -> atomdoc::Result<SpaceSchema> {
        self.inner.schema(space)
    }

    fn get(&self, space: &str, key: &PrimaryKey) -> atomdoc::Result<Option<StoredRecord>> {
        if *key == self.broken {
            return Err(Error::storage(format!("read of {} timed out", key)));
        }
        self.inner.get(space, key)
    }

    fn put(&self, space: &str, record: Record, expected: Option<u64>) -> atomdoc::Result<u64> {
        self.inner.put(space, record, expected)
    }

    fn delete(
        &self,
        space: &str,
        key: &PrimaryKey,
        expected: Option<u64>,
    ) -> atomdoc::Result<Option<StoredRecord>> {
        self.inner.delete(space, key, expected)
    }

    fn scan(&self, space: &str, predicate: &Predicate) -> atomdoc::Result<RecordScan<'_>> {
        self.inner.scan(space, predicate)
    }
}

#[test]
fn storage_error_fails_only_that_key() {
    init_tracing();
    let store = Arc::new(FlakyStore {
        inner: ShardedStore::new(),
        broken: PrimaryKey::Int(1),
    });
    store.inner.create_space(SpaceSchema::new(SPACE, KEY_ATTR));
    let engine = DocumentEngine::new(Arc::clone(&store));
    for i in 0..3i64 {
        engine
            .put(SPACE, Record::new(i).with("v", json!({"n": 0})))
            .unwrap();
    }

    let report = engine
        .group_update_report(SPACE, &Predicate::new(), &[add("v.n", 1)])
        .unwrap();
    assert!(!report.succeeded());
    assert_eq!(report.applied, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, PrimaryKey::Int(1));
    assert!(matches!(report.failed[0].1, Error::Storage(_)));
    assert!(!report.failed[0].1.is_conflict());

    // Not retried: one failure recorded, no conflict restarts
    let m = engine.metrics();
    assert_eq!(m.updates_failed, 1);
    assert_eq!(m.conflict_retries, 0);
}

#[test]
fn skipped_keys_reported_as_skipped() {
    let results = vec![
        (PrimaryKey::Int(1), KeyResult::Applied),
        (PrimaryKey::Int(2), KeyResult::Skipped),
        (PrimaryKey::Int(3), KeyResult::Skipped),
    ];
    let report = GroupReport::from_results(results);
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 2);
    assert!(report.cancelled);
}
