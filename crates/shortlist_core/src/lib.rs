//! Shortlist core: local-first store of saved job identifiers.
//!
//! Everything here is synchronous and free of network IO. Work that needs the
//! server leaves the store as [`Effect`] values and comes back as [`Msg`]
//! values.
mod codec;
mod config;
mod effect;
mod msg;
mod storage;
mod store;
mod sync;

pub use codec::{decode_ids, encode_ids, CodecError};
pub use config::{ReconcilePolicy, ShortlistConfig, DEFAULT_STORAGE_KEY};
pub use effect::Effect;
pub use msg::Msg;
pub use storage::{MemoryStorage, Storage, StorageError};
pub use store::{MergeOutcome, ShortlistStore};
pub use sync::{FailureKind, SyncFailure, SyncState};

/// Opaque identifier of a job listing.
pub type JobId = String;
