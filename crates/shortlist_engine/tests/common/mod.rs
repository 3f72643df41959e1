use std::sync::Mutex;
use std::time::Duration;

use shortlist_core::{FailureKind, JobId, SyncFailure};
use shortlist_engine::ShortlistApi;

/// In-process server shortlist with switchable failure modes.
#[derive(Default)]
pub struct FakeApi {
    pub saved: Mutex<Vec<JobId>>,
    pub unauthorized: bool,
    pub fail_toggles: bool,
    pub toggle_delay: Option<Duration>,
    pub toggle_calls: Mutex<Vec<JobId>>,
}

impl FakeApi {
    pub fn with_saved(ids: &[&str]) -> Self {
        Self {
            saved: Mutex::new(ids.iter().map(|id| id.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<JobId> {
        let mut ids = self.saved.lock().unwrap().clone();
        ids.sort();
        ids
    }

    pub fn toggle_calls(&self) -> Vec<JobId> {
        self.toggle_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ShortlistApi for FakeApi {
    async fn fetch_shortlist(&self) -> Result<Vec<JobId>, SyncFailure> {
        if self.unauthorized {
            return Err(SyncFailure::new(FailureKind::Unauthorized, "401"));
        }
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn toggle(&self, job_id: &str) -> Result<bool, SyncFailure> {
        self.toggle_calls.lock().unwrap().push(job_id.to_string());
        if let Some(delay) = self.toggle_delay {
            tokio::time::sleep(delay).await;
        }
        if self.unauthorized {
            return Err(SyncFailure::new(FailureKind::Unauthorized, "401"));
        }
        if self.fail_toggles {
            return Err(SyncFailure::new(FailureKind::HttpStatus(500), "boom"));
        }
        let mut saved = self.saved.lock().unwrap();
        if let Some(pos) = saved.iter().position(|id| id == job_id) {
            saved.remove(pos);
            Ok(false)
        } else {
            saved.push(job_id.to_string());
            Ok(true)
        }
    }
}
