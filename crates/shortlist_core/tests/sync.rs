use pretty_assertions::assert_eq;
use shortlist_core::{
    Effect, FailureKind, MemoryStorage, Msg, ReconcilePolicy, ShortlistConfig, ShortlistStore,
    SyncFailure, SyncState,
};

fn server_store(policy: ReconcilePolicy) -> ShortlistStore<MemoryStorage> {
    ShortlistStore::new(MemoryStorage::new(), ShortlistConfig::server_backed(policy))
}

fn single_toggle(effects: Vec<Effect>) -> (String, u64) {
    match effects.as_slice() {
        [Effect::SyncToggle { job_id, seq }] => (job_id.clone(), *seq),
        other => panic!("expected one toggle effect, got {other:?}"),
    }
}

fn failure(kind: FailureKind) -> SyncFailure {
    SyncFailure::new(kind, "test")
}

#[test]
fn local_only_mode_emits_no_effects() {
    let mut store = ShortlistStore::local(MemoryStorage::new());
    assert!(store.toggle("job1"));
    assert!(!store.begin_reconcile());
    assert!(store.take_effects().is_empty());
    assert_eq!(store.sync_state("job1"), SyncState::Idle);
}

#[test]
fn toggle_is_local_first_and_marks_syncing() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    assert!(store.toggle("job1"));

    assert!(store.contains("job1"));
    assert_eq!(store.sync_state("job1"), SyncState::Syncing);
    let (job_id, _) = single_toggle(store.take_effects());
    assert_eq!(job_id, "job1");
    assert!(store.take_effects().is_empty());
}

#[test]
fn successful_sync_returns_to_idle() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    store.toggle("job1");
    let (job_id, seq) = single_toggle(store.take_effects());

    store.apply(Msg::ToggleSynced {
        job_id,
        seq,
        outcome: Ok(true),
    });
    assert_eq!(store.sync_state("job1"), SyncState::Idle);
    assert!(store.failed_syncs().is_empty());
}

#[test]
fn failed_sync_keeps_local_state_and_can_be_retried() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    store.toggle("job1");
    let (job_id, seq) = single_toggle(store.take_effects());

    store.apply(Msg::ToggleSynced {
        job_id,
        seq,
        outcome: Err(failure(FailureKind::Timeout)),
    });
    assert!(store.contains("job1"));
    assert_eq!(store.sync_state("job1"), SyncState::SyncFailed);
    assert_eq!(store.failed_syncs(), vec!["job1"]);

    assert_eq!(store.retry_failed(), 1);
    assert_eq!(store.sync_state("job1"), SyncState::Syncing);
    let (job_id, retry_seq) = single_toggle(store.take_effects());
    assert_eq!(job_id, "job1");
    assert!(retry_seq > seq);
}

#[test]
fn server_disagreement_is_flagged_without_rollback() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    store.toggle("job1");
    let (job_id, seq) = single_toggle(store.take_effects());

    store.apply(Msg::ToggleSynced {
        job_id,
        seq,
        outcome: Ok(false),
    });
    assert!(store.contains("job1"));
    assert_eq!(store.sync_state("job1"), SyncState::SyncFailed);
}

#[test]
fn unauthorized_switches_to_local_only() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    store.toggle("job1");
    let (job_id, seq) = single_toggle(store.take_effects());

    store.apply(Msg::ToggleSynced {
        job_id,
        seq,
        outcome: Err(failure(FailureKind::Unauthorized)),
    });
    assert!(!store.server_available());
    assert_eq!(store.sync_state("job1"), SyncState::Idle);
    assert!(store.contains("job1"));

    assert!(store.toggle("job2"));
    assert!(store.take_effects().is_empty());
    assert!(!store.begin_reconcile());
}

#[test]
fn stale_and_cancelled_results_are_ignored() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    store.toggle("job1");
    let (_, first) = single_toggle(store.take_effects());
    store.toggle("job1");
    let (_, second) = single_toggle(store.take_effects());
    assert!(!store.contains("job1"));

    store.apply(Msg::ToggleSynced {
        job_id: "job1".into(),
        seq: first,
        outcome: Err(failure(FailureKind::Cancelled)),
    });
    store.apply(Msg::ToggleSynced {
        job_id: "job1".into(),
        seq: first,
        outcome: Err(failure(FailureKind::Network)),
    });
    assert_eq!(store.sync_state("job1"), SyncState::Syncing);

    store.apply(Msg::ToggleSynced {
        job_id: "job1".into(),
        seq: second,
        outcome: Ok(false),
    });
    assert_eq!(store.sync_state("job1"), SyncState::Idle);
}

#[test]
fn reconcile_merges_union_without_removing_local() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    store.add("b");
    store.add("c");

    assert!(store.begin_reconcile());
    assert_eq!(store.take_effects(), vec![Effect::FetchServerShortlist]);
    store.apply(Msg::ServerShortlistFetched(Ok(vec![
        "a".to_string(),
        "b".to_string(),
    ])));

    let mut ids = store.read();
    ids.sort();
    assert_eq!(ids, vec!["a", "b", "c"]);
    // Pull-only never pushes back.
    assert!(store.take_effects().is_empty());
}

#[test]
fn merge_reports_added_and_local_only() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    store.add("b");
    store.add("c");

    let outcome = store.merge_server_ids(&["a".to_string(), "b".to_string(), "".to_string()]);
    assert_eq!(outcome.added, vec!["a"]);
    assert_eq!(outcome.local_only, vec!["c"]);
    assert_eq!(outcome.pushed, 0);
    assert_eq!(store.read(), vec!["b", "c", "a"]);
}

#[test]
fn bidirectional_policy_pushes_local_only_identifiers() {
    let mut store = server_store(ReconcilePolicy::Bidirectional);
    store.add("b");
    store.add("c");

    let outcome = store.merge_server_ids(&["a".to_string(), "b".to_string()]);
    assert_eq!(outcome.pushed, 1);
    let (job_id, seq) = single_toggle(store.take_effects());
    assert_eq!(job_id, "c");
    assert_eq!(store.sync_state("c"), SyncState::Syncing);

    store.apply(Msg::ToggleSynced {
        job_id,
        seq,
        outcome: Ok(true),
    });
    assert_eq!(store.sync_state("c"), SyncState::Idle);
}

#[test]
fn failed_fetch_leaves_local_untouched() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    store.add("c");

    store.apply(Msg::ServerShortlistFetched(Err(failure(FailureKind::Network))));
    assert_eq!(store.read(), vec!["c"]);
    assert!(store.server_available());

    store.apply(Msg::ServerShortlistFetched(Err(failure(
        FailureKind::Unauthorized,
    ))));
    assert_eq!(store.read(), vec!["c"]);
    assert!(!store.server_available());
}

#[test]
fn clear_resets_sync_states() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    store.toggle("job1");
    store.take_effects();

    store.clear();
    assert!(store.read().is_empty());
    assert_eq!(store.sync_state("job1"), SyncState::Idle);
}

#[test]
fn bidirectional_merge_skips_ids_with_a_pending_toggle() {
    let mut store = server_store(ReconcilePolicy::Bidirectional);
    store.toggle("c");
    let (_, seq) = single_toggle(store.take_effects());
    store.add("d");

    let outcome = store.merge_server_ids(&["a".to_string()]);

    assert_eq!(outcome.local_only, vec!["c", "d"]);
    assert_eq!(outcome.pushed, 1);
    let (job_id, _) = single_toggle(store.take_effects());
    assert_eq!(job_id, "d");
    assert!(store.is_current("c", seq));
}

#[test]
fn is_current_tracks_the_latest_attempt() {
    let mut store = server_store(ReconcilePolicy::PullOnly);
    assert!(!store.is_current("job1", 1));
    store.toggle("job1");
    let (_, first) = single_toggle(store.take_effects());
    assert!(store.is_current("job1", first));
    store.toggle("job1");
    let (_, second) = single_toggle(store.take_effects());
    assert!(!store.is_current("job1", first));
    assert!(store.is_current("job1", second));
}
