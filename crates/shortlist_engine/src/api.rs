use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shortlist_core::{FailureKind, JobId, SyncFailure};
use shortlist_logging::shortlist_debug;
use url::Url;

const SHORTLIST_PATH: &str = "api/shortlist";
const TOGGLE_PATH: &str = "api/shortlist/toggle";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    /// Raw `Cookie` header value carrying the session. Treated as opaque.
    pub session_cookie: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_cookie: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_bytes: 1024 * 1024,
        }
    }
}

/// Server side of the shortlist.
///
/// A 401 is reported as [`FailureKind::Unauthorized`] so callers can fall back
/// to local-only mode.
#[async_trait::async_trait]
pub trait ShortlistApi: Send + Sync {
    async fn fetch_shortlist(&self) -> Result<Vec<JobId>, SyncFailure>;

    /// Flips the server membership of `job_id`; returns whether it is now saved.
    async fn toggle(&self, job_id: &str) -> Result<bool, SyncFailure>;
}

#[derive(Debug, Deserialize)]
struct ShortlistResponse {
    job_ids: Vec<JobId>,
}

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    saved: bool,
}

#[derive(Debug, Clone)]
pub struct ReqwestShortlistApi {
    client: reqwest::Client,
    base_url: Url,
    settings: ApiSettings,
}

impl ReqwestShortlistApi {
    pub fn new(settings: ApiSettings) -> Result<Self, SyncFailure> {
        let mut base = settings.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|err| SyncFailure::new(FailureKind::InvalidUrl, err.to_string()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SyncFailure::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            settings,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncFailure> {
        self.base_url
            .join(path)
            .map_err(|err| SyncFailure::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn with_session(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.settings.session_cookie.as_deref() {
            Some(cookie) if !cookie.is_empty() => request.header(COOKIE, cookie),
            _ => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SyncFailure> {
        let response = self
            .with_session(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncFailure::new(
                FailureKind::Unauthorized,
                "no authenticated session",
            ));
        }
        if !status.is_success() {
            return Err(SyncFailure::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(SyncFailure::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(SyncFailure::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| SyncFailure::new(FailureKind::MalformedResponse, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ShortlistApi for ReqwestShortlistApi {
    async fn fetch_shortlist(&self) -> Result<Vec<JobId>, SyncFailure> {
        let url = self.endpoint(SHORTLIST_PATH)?;
        shortlist_debug!("GET {}", url);
        let body: ShortlistResponse = self.send(self.client.get(url)).await?;
        Ok(body.job_ids)
    }

    async fn toggle(&self, job_id: &str) -> Result<bool, SyncFailure> {
        let url = self.endpoint(TOGGLE_PATH)?;
        let payload = serde_json::json!({ "job_id": job_id }).to_string();
        shortlist_debug!("POST {} job_id={}", url, job_id);
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        let body: ToggleResponse = self.send(request).await?;
        Ok(body.saved)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SyncFailure {
    if err.is_timeout() {
        return SyncFailure::new(FailureKind::Timeout, err.to_string());
    }
    SyncFailure::new(FailureKind::Network, err.to_string())
}
