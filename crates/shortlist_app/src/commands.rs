use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use shortlist_core::{ShortlistStore, Storage, SyncState};
use shortlist_engine::{reconcile, FileStorage, ReqwestShortlistApi, SyncHandle};
use shortlist_logging::{shortlist_info, shortlist_warn};

use crate::cli::Command;
use crate::config::AppConfig;

/// Extra time allowed past the request timeout before giving up on a sync.
const SYNC_GRACE: Duration = Duration::from_secs(1);

pub fn run(command: Command, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let storage = FileStorage::new(&config.data_dir);
    let mut store = ShortlistStore::new(storage, config.shortlist_config());

    match command {
        Command::List => {
            for job_id in store.read() {
                println!("{job_id}");
            }
        }
        Command::Add { job_id } => {
            if store.add(&job_id) {
                println!("saved {job_id}");
            } else {
                println!("{job_id} not added (empty, already saved or not writable)");
            }
        }
        Command::Remove { job_id } => {
            if store.remove(&job_id) {
                println!("removed {job_id}");
            } else {
                println!("{job_id} not removed (empty, not saved or not writable)");
            }
        }
        Command::Toggle { job_id } => {
            let saved = store.toggle(&job_id);
            println!("{job_id} {}", if saved { "saved" } else { "unsaved" });
            deliver_pending(&mut store, config);
            if config.server.enabled {
                println!("sync: {}", describe(store.sync_state(&job_id), store.server_available()));
            }
        }
        Command::Contains { job_id } => {
            let saved = store.contains(&job_id);
            println!("{saved}");
            if !saved {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Clear => {
            store.clear();
            println!("cleared");
        }
        Command::Reconcile => {
            if !config.server.enabled {
                println!("server mode is off; nothing to reconcile");
                return Ok(ExitCode::SUCCESS);
            }
            let api = ReqwestShortlistApi::new(config.api_settings())
                .map_err(|failure| anyhow::anyhow!("cannot reach server: {failure}"))?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let report = runtime.block_on(reconcile(&mut store, &api));
            if let Some(error) = &report.error {
                println!("server unavailable ({error}); local shortlist kept");
            }
            println!(
                "{} added from server, {} pushed, {} failed, {} total",
                report.added.len(),
                report.synced,
                report.failed,
                store.read().len()
            );
        }
        Command::Status => {
            println!("storage: {}", store.storage().path_for(&config.storage_key).display());
            println!("saved: {}", store.read().len());
            println!(
                "server mode: {}",
                if config.server.enabled { "on" } else { "off" }
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Hands queued toggles to a sync worker and applies whatever answers arrive
/// in time. Local state is already written; nothing here can undo it.
fn deliver_pending<S: Storage>(store: &mut ShortlistStore<S>, config: &AppConfig) {
    let effects = store.take_effects();
    if effects.is_empty() {
        return;
    }

    let api = match ReqwestShortlistApi::new(config.api_settings()) {
        Ok(api) => api,
        Err(failure) => {
            shortlist_warn!("Skipping sync: {}", failure);
            return;
        }
    };
    let handle = match SyncHandle::new(Arc::new(api)) {
        Ok(handle) => handle,
        Err(err) => {
            shortlist_warn!("Skipping sync: failed to start runtime: {}", err);
            return;
        }
    };

    let expected = effects.len();
    handle.submit(effects);
    let wait = Duration::from_millis(config.server.request_timeout_ms) + SYNC_GRACE;
    for _ in 0..expected {
        match handle.recv_timeout(wait) {
            Some(msg) => store.apply(msg),
            None => {
                shortlist_info!("Sync still pending after {:?}; leaving it", wait);
                break;
            }
        }
    }
}

fn describe(state: SyncState, server_available: bool) -> &'static str {
    if !server_available {
        return "local only (server session unavailable)";
    }
    match state {
        SyncState::Idle => "in sync",
        SyncState::Syncing => "pending",
        SyncState::SyncFailed => "failed (kept locally)",
    }
}
