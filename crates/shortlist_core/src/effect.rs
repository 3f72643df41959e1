#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a toggle for `job_id` to the server. `seq` identifies this attempt
    /// so late answers to superseded attempts can be dropped.
    SyncToggle { job_id: crate::JobId, seq: u64 },
    /// Fetch the server's identifier set for a reconcile.
    FetchServerShortlist,
}
