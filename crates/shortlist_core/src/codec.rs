use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::JobId;

#[derive(Debug, Error)]
#[error("invalid shortlist payload: {0}")]
pub struct CodecError(#[from] serde_json::Error);

/// Older clients stored objects instead of bare identifiers.
#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedEntry {
    Id(String),
    Object(LegacyEntry),
    Other(serde_json::Value),
}

#[derive(Deserialize)]
struct LegacyEntry {
    id: Option<String>,
    job_id: Option<String>,
}

impl LegacyEntry {
    fn into_id(self) -> Option<JobId> {
        self.id.filter(|id| !id.is_empty()).or(self.job_id)
    }
}

/// Decodes a persisted JSON array into identifiers.
///
/// Elements may be strings or objects with an `id`/`job_id` field. Anything
/// else, empty identifiers and repeats are dropped; the first occurrence wins.
pub fn decode_ids(raw: &str) -> Result<Vec<JobId>, CodecError> {
    let entries: Vec<PersistedEntry> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(entries.len());
    let ids = entries
        .into_iter()
        .filter_map(|entry| match entry {
            PersistedEntry::Id(id) => Some(id),
            PersistedEntry::Object(legacy) => legacy.into_id(),
            PersistedEntry::Other(_) => None,
        })
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.clone()))
        .collect();
    Ok(ids)
}

/// Encodes identifiers as the canonical JSON string array.
pub fn encode_ids(ids: &[JobId]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(ids)?)
}
