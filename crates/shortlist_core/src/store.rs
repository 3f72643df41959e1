use std::collections::{HashMap, HashSet};

use shortlist_logging::{shortlist_debug, shortlist_info, shortlist_warn};

use crate::codec::{decode_ids, encode_ids};
use crate::{Effect, JobId, Msg, ReconcilePolicy, ShortlistConfig, Storage, SyncFailure, SyncState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SyncEntry {
    state: SyncState,
    seq: u64,
}

/// Result of merging the server's identifiers into local storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Server identifiers that were missing locally and are now persisted.
    pub added: Vec<JobId>,
    /// Local identifiers the server does not know about.
    pub local_only: Vec<JobId>,
    /// Local-only identifiers queued for upload (bidirectional policy only).
    pub pushed: usize,
}

/// Saved job identifiers, persisted through a [`Storage`] under one key.
///
/// Storage is the source of truth: every call reads the persisted sequence and
/// every mutation rewrites it in full. Failures never escape; reads degrade to
/// an empty sequence and writes to a no-op.
pub struct ShortlistStore<S> {
    storage: S,
    config: ShortlistConfig,
    server_available: bool,
    sync: HashMap<JobId, SyncEntry>,
    next_seq: u64,
    effects: Vec<Effect>,
}

impl<S: Storage> ShortlistStore<S> {
    pub fn new(storage: S, config: ShortlistConfig) -> Self {
        let server_available = config.server_mode;
        Self {
            storage,
            config,
            server_available,
            sync: HashMap::new(),
            next_seq: 0,
            effects: Vec::new(),
        }
    }

    /// Local-only store under the default key.
    pub fn local(storage: S) -> Self {
        Self::new(storage, ShortlistConfig::default())
    }

    pub fn config(&self) -> &ShortlistConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Whether server calls are currently attempted. Starts as the configured
    /// flag and drops to false for the session after a 401.
    pub fn server_available(&self) -> bool {
        self.server_available
    }

    pub fn read(&self) -> Vec<JobId> {
        let key = &self.config.storage_key;
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                shortlist_warn!("Failed to read shortlist {:?}: {}", key, err);
                return Vec::new();
            }
        };
        match decode_ids(&raw) {
            Ok(ids) => ids,
            Err(err) => {
                shortlist_warn!("Ignoring corrupt shortlist {:?}: {}", key, err);
                Vec::new()
            }
        }
    }

    pub fn contains(&self, job_id: &str) -> bool {
        !job_id.is_empty() && self.read().iter().any(|id| id == job_id)
    }

    /// Appends `job_id` if absent. Returns whether the insertion was persisted.
    pub fn add(&mut self, job_id: &str) -> bool {
        if job_id.is_empty() {
            return false;
        }
        let mut ids = self.read();
        if ids.iter().any(|id| id == job_id) {
            return false;
        }
        ids.push(job_id.to_string());
        self.write(&ids)
    }

    /// Deletes `job_id` if present. Returns whether the deletion was persisted.
    pub fn remove(&mut self, job_id: &str) -> bool {
        if job_id.is_empty() {
            return false;
        }
        let mut ids = self.read();
        let before = ids.len();
        ids.retain(|id| id != job_id);
        if ids.len() == before {
            return false;
        }
        self.write(&ids)
    }

    /// Flips membership of `job_id` and returns whether it is now saved.
    ///
    /// The local change is applied first. In server-backed mode a
    /// [`Effect::SyncToggle`] is queued; its outcome never rolls the local
    /// change back.
    pub fn toggle(&mut self, job_id: &str) -> bool {
        if job_id.is_empty() {
            return false;
        }
        let (changed, saved) = if self.contains(job_id) {
            let removed = self.remove(job_id);
            (removed, !removed)
        } else {
            let added = self.add(job_id);
            (added, added)
        };
        if changed && self.server_available {
            self.queue_sync(job_id);
        }
        saved
    }

    pub fn clear(&mut self) {
        let key = &self.config.storage_key;
        if let Err(err) = self.storage.remove(key) {
            shortlist_warn!("Failed to clear shortlist {:?}: {}", key, err);
            return;
        }
        self.sync.clear();
    }

    pub fn sync_state(&self, job_id: &str) -> SyncState {
        self.sync
            .get(job_id)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// Whether `seq` is the latest sync attempt queued for `job_id`.
    pub fn is_current(&self, job_id: &str, seq: u64) -> bool {
        self.sync.get(job_id).is_some_and(|entry| entry.seq == seq)
    }

    pub fn failed_syncs(&self) -> Vec<JobId> {
        let mut failed: Vec<JobId> = self
            .sync
            .iter()
            .filter(|(_, entry)| entry.state == SyncState::SyncFailed)
            .map(|(id, _)| id.clone())
            .collect();
        failed.sort();
        failed
    }

    /// Queues another toggle for every identifier whose sync failed.
    /// Returns how many were queued.
    pub fn retry_failed(&mut self) -> usize {
        if !self.server_available {
            return 0;
        }
        let failed = self.failed_syncs();
        for job_id in &failed {
            self.queue_sync(job_id);
        }
        failed.len()
    }

    /// Starts a reconcile by queueing [`Effect::FetchServerShortlist`].
    /// Returns false when server mode is off or unavailable.
    pub fn begin_reconcile(&mut self) -> bool {
        if !self.server_available {
            shortlist_debug!("Reconcile skipped: server mode unavailable");
            return false;
        }
        self.effects.push(Effect::FetchServerShortlist);
        true
    }

    /// Persists the union of local and server identifiers.
    ///
    /// Local order is kept; server-only identifiers follow in server order.
    /// Nothing local is ever removed. Under [`ReconcilePolicy::Bidirectional`]
    /// local-only identifiers are queued for upload.
    pub fn merge_server_ids(&mut self, server_ids: &[JobId]) -> MergeOutcome {
        let mut ids = self.read();
        let server: HashSet<&str> = server_ids.iter().map(String::as_str).collect();
        let local_only: Vec<JobId> = ids
            .iter()
            .filter(|id| !server.contains(id.as_str()))
            .cloned()
            .collect();

        let mut known: HashSet<JobId> = ids.iter().cloned().collect();
        let mut added = Vec::new();
        for id in server_ids {
            if !id.is_empty() && known.insert(id.clone()) {
                added.push(id.clone());
            }
        }

        if !added.is_empty() {
            ids.extend(added.iter().cloned());
            if !self.write(&ids) {
                added.clear();
            }
        }

        let mut pushed = 0;
        if self.config.reconcile_policy == ReconcilePolicy::Bidirectional && self.server_available
        {
            for job_id in &local_only {
                // A queued toggle of a locally saved id already saves it remotely.
                if self.sync_state(job_id) == SyncState::Syncing {
                    continue;
                }
                self.queue_sync(job_id);
                pushed += 1;
            }
        }

        shortlist_info!(
            "Reconciled shortlist: {} added from server, {} local-only, {} pushed",
            added.len(),
            local_only.len(),
            pushed
        );
        MergeOutcome {
            added,
            local_only,
            pushed,
        }
    }

    /// Applies a server result produced by executing one of this store's
    /// effects.
    pub fn apply(&mut self, msg: Msg) {
        match msg {
            Msg::ToggleSynced {
                job_id,
                seq,
                outcome,
            } => self.apply_toggle_synced(job_id, seq, outcome),
            Msg::ServerShortlistFetched(Ok(server_ids)) => {
                self.merge_server_ids(&server_ids);
            }
            Msg::ServerShortlistFetched(Err(failure)) => {
                if failure.is_unauthorized() {
                    self.mark_server_unavailable();
                } else {
                    shortlist_warn!("Reconcile fetch failed, keeping local shortlist: {}", failure);
                }
            }
        }
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    fn apply_toggle_synced(&mut self, job_id: JobId, seq: u64, outcome: Result<bool, SyncFailure>) {
        let current = match self.sync.get(&job_id) {
            Some(entry) if entry.seq == seq => *entry,
            _ => {
                shortlist_debug!("Dropping stale sync result for {} (seq {})", job_id, seq);
                return;
            }
        };

        let state = match outcome {
            Ok(server_saved) => {
                let local_saved = self.contains(&job_id);
                if server_saved == local_saved {
                    shortlist_debug!("Synced {} (saved={})", job_id, server_saved);
                    SyncState::Idle
                } else {
                    shortlist_warn!(
                        "Server disagrees on {} (server saved={}, local saved={}); keeping local",
                        job_id,
                        server_saved,
                        local_saved
                    );
                    SyncState::SyncFailed
                }
            }
            Err(failure) if failure.is_unauthorized() => {
                self.mark_server_unavailable();
                SyncState::Idle
            }
            Err(failure) if failure.kind == crate::FailureKind::Cancelled => {
                return;
            }
            Err(failure) => {
                shortlist_warn!("Sync of {} failed: {}", job_id, failure);
                SyncState::SyncFailed
            }
        };

        self.sync.insert(job_id, SyncEntry { state, ..current });
    }

    fn queue_sync(&mut self, job_id: &str) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.sync.insert(
            job_id.to_string(),
            SyncEntry {
                state: SyncState::Syncing,
                seq,
            },
        );
        self.effects.push(Effect::SyncToggle {
            job_id: job_id.to_string(),
            seq,
        });
    }

    fn mark_server_unavailable(&mut self) {
        if self.server_available {
            shortlist_info!("Server rejected the session; continuing in local-only mode");
        }
        self.server_available = false;
        for entry in self.sync.values_mut() {
            if entry.state == SyncState::Syncing {
                entry.state = SyncState::Idle;
            }
        }
    }

    fn write(&mut self, ids: &[JobId]) -> bool {
        let key = &self.config.storage_key;
        let encoded = match encode_ids(ids) {
            Ok(encoded) => encoded,
            Err(err) => {
                shortlist_warn!("Failed to encode shortlist: {}", err);
                return false;
            }
        };
        match self.storage.set(key, &encoded) {
            Ok(()) => true,
            Err(err) => {
                shortlist_warn!("Failed to write shortlist {:?}: {}", key, err);
                false
            }
        }
    }
}
