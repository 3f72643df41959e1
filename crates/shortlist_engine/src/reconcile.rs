use shortlist_core::{Effect, JobId, Msg, ShortlistStore, Storage, SyncFailure};

use crate::api::ShortlistApi;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Whether server mode is still usable after the reconcile.
    pub server_available: bool,
    /// Server identifiers newly persisted locally.
    pub added: Vec<JobId>,
    /// Toggles delivered to the server, including pushes of local-only ids.
    pub synced: usize,
    pub failed: usize,
    /// Why the fetch failed, if it did.
    pub error: Option<SyncFailure>,
}

/// Fetches the server shortlist, merges it into `store` and delivers any
/// toggles the merge (or earlier calls) queued.
///
/// Local state is never reduced. Without server mode this returns at once.
pub async fn reconcile<S: Storage>(
    store: &mut ShortlistStore<S>,
    api: &dyn ShortlistApi,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    if !store.server_available() {
        return report;
    }

    match api.fetch_shortlist().await {
        Ok(server_ids) => {
            report.added = store.merge_server_ids(&server_ids).added;
        }
        Err(failure) => {
            store.apply(Msg::ServerShortlistFetched(Err(failure.clone())));
            report.error = Some(failure);
        }
    }

    let (synced, failed) = run_effects(store, api).await;
    report.synced = synced;
    report.failed = failed;
    report.server_available = store.server_available();
    report
}

/// Executes the store's queued toggles inline, one after another.
/// Returns `(delivered, failed)`.
pub async fn run_effects<S: Storage>(
    store: &mut ShortlistStore<S>,
    api: &dyn ShortlistApi,
) -> (usize, usize) {
    let mut delivered = 0;
    let mut failed = 0;
    for effect in store.take_effects() {
        let Effect::SyncToggle { job_id, seq } = effect else {
            // Fetches are driven by `reconcile`.
            continue;
        };
        if !store.server_available() || !store.is_current(&job_id, seq) {
            continue;
        }
        let outcome = api.toggle(&job_id).await;
        if outcome.is_ok() {
            delivered += 1;
        } else {
            failed += 1;
        }
        store.apply(Msg::ToggleSynced {
            job_id,
            seq,
            outcome,
        });
    }
    (delivered, failed)
}
