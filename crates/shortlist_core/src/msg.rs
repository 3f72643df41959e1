use crate::{JobId, SyncFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Server answered (or failed) a toggle sent for [`crate::Effect::SyncToggle`].
    ToggleSynced {
        job_id: JobId,
        seq: u64,
        /// Server-side membership after the toggle.
        outcome: Result<bool, SyncFailure>,
    },
    /// Server identifier set requested by [`crate::Effect::FetchServerShortlist`].
    ServerShortlistFetched(Result<Vec<JobId>, SyncFailure>),
}
