//! Group delete
//!
//! Same scan and verdict as a group update: true only when at least one
//! record matched and every matched record was removed.

use crate::common::*;
use atomdoc::CancellationToken;
use std::sync::Arc;

fn seed(t: &TestEngine, n: i64) {
    for i in 0..n {
        let tier = if i % 2 == 0 { "even" } else { "odd" };
        t.engine
            .put(SPACE, Record::new(i).with("v", json!({"n": i, "tier": tier})))
            .unwrap();
    }
}

#[test]
fn removes_exactly_the_matches() {
    let t = TestEngine::new();
    seed(&t, 10);
    let pred = Predicate::new().equals("v.tier", "odd").unwrap();

    let report = t.engine.group_delete_report(SPACE, &pred).unwrap();
    assert!(report.succeeded());
    assert_eq!(report.matched, 5);
    assert_eq!(report.applied, 5);

    for i in 0..10i64 {
        assert_eq!(t.record(i).is_some(), i % 2 == 0, "key {i}");
    }
    assert_eq!(t.engine.metrics().records_deleted, 5);
}

#[test]
fn zero_matches_is_false() {
    let t = TestEngine::new();
    seed(&t, 4);
    let pred = Predicate::new().equals("v.tier", "none").unwrap();
    assert!(!t.engine.group_delete(SPACE, &pred));
    assert_eq!(t.engine.count(SPACE, &Predicate::new()).unwrap(), 4);

    let empty = TestEngine::new();
    assert!(!empty.engine.group_delete(SPACE, &Predicate::new()));
}

#[test]
fn unknown_space_is_false() {
    let t = TestEngine::new();
    assert!(!t.engine.group_delete("missing", &Predicate::new()));
    assert!(matches!(
        t.engine.group_delete_report("missing", &Predicate::new()),
        Err(Error::UnknownSpace { .. })
    ));
}

#[test]
fn delete_on_key_predicate() {
    let t = TestEngine::new();
    t.put_doc("k", scenario_doc());
    t.put_doc("other", scenario_doc());

    assert!(t.engine.group_delete(SPACE, &key_is("k")));
    assert!(t.record("k").is_none());
    assert!(t.record("other").is_some());

    // Already gone: nothing matches the second time
    assert!(!t.engine.group_delete(SPACE, &key_is("k")));
}

#[test]
fn parallel_delete_clears_the_space() {
    let t = TestEngine::parallel();
    seed(&t, 300);
    assert!(t.engine.group_delete(SPACE, &Predicate::new()));
    assert_eq!(t.store.len(SPACE).unwrap(), 0);
}

#[test]
fn cancelled_delete_keeps_records() {
    let t = TestEngine::new();
    seed(&t, 8);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = t
        .engine
        .group_delete_cancellable(SPACE, &Predicate::new(), &cancel)
        .unwrap();
    assert!(report.cancelled);
    assert_eq!(report.skipped, 8);
    assert!(!report.succeeded());
    assert_eq!(t.store.len(SPACE).unwrap(), 8);
}

#[test]
fn delete_one_then_update_is_not_applied() {
    let t = TestEngine::new();
    t.put_doc("k", scenario_doc());
    assert!(t.engine.delete_one(SPACE, &"k".into()).unwrap());
    let outcome = t.engine.update_one(SPACE, &"k".into(), &[add("v.c.d", 1)]).unwrap();
    assert_eq!(outcome, UpdateOutcome::NotApplied);
    assert!(!t.engine.delete_one(SPACE, &"k".into()).unwrap());
}

#[test]
fn vanished_key_forces_false() {
    let store = Arc::new(VanishingStore::new());
    let engine = DocumentEngine::new(Arc::clone(&store));
    for i in 0..4i64 {
        engine
            .put(SPACE, Record::new(i).with("v", json!({"n": i})))
            .unwrap();
    }

    let report = engine.group_delete_report(SPACE, &Predicate::new()).unwrap();
    assert_eq!(report.matched, 4);
    assert_eq!(report.vanished.len(), 1);
    assert_eq!(report.applied, 3);
    assert!(!report.succeeded());
    assert_eq!(store.inner.len(SPACE).unwrap(), 0);
}
