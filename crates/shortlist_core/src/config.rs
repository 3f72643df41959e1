use serde::{Deserialize, Serialize};

/// Key the shortlist is persisted under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "aidjobs.shortlist";

/// How [`crate::ShortlistStore`] treats identifiers that exist only locally
/// when merging with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReconcilePolicy {
    /// Pull server identifiers into local storage; never push.
    #[default]
    PullOnly,
    /// Also push local-only identifiers to the server after pulling.
    Bidirectional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortlistConfig {
    pub storage_key: String,
    /// Server-backed mode. Off means every operation stays local.
    pub server_mode: bool,
    pub reconcile_policy: ReconcilePolicy,
}

impl Default for ShortlistConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            server_mode: false,
            reconcile_policy: ReconcilePolicy::PullOnly,
        }
    }
}

impl ShortlistConfig {
    pub fn server_backed(reconcile_policy: ReconcilePolicy) -> Self {
        Self {
            server_mode: true,
            reconcile_policy,
            ..Self::default()
        }
    }
}
