//! Shortlist engine: file storage, the server client and sync execution.
mod api;
mod engine;
mod filename;
mod persist;
mod reconcile;

pub use api::{ApiSettings, ReqwestShortlistApi, ShortlistApi};
pub use engine::SyncHandle;
pub use filename::storage_filename;
pub use persist::{ensure_dir, AtomicFileWriter, FileStorage, PersistError};
pub use reconcile::{reconcile, run_effects, ReconcileReport};
