//! HTTP implementation of the remote store port.
//!
//! Talks to a `canon-server` (or anything speaking the same wire shapes from
//! [`canon_engine::wire`]):
//!
//! - `GET  /snapshot`: current head
//! - `PUT  /snapshot`: conditional replace, `409` when the base is stale
//! - `GET  /health`: reachability

use async_trait::async_trait;
use canon_engine::{
    error::Result,
    wire::{
        ConflictResponse, PushRequest, PushResponse, SnapshotResponse, HEALTH_PATH,
        SNAPSHOT_PATH,
    },
    Error, PushReceipt, RemoteStore, Snapshot, SnapshotContent,
};
use reqwest::{RequestBuilder, StatusCode};
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reported as the remote version when a `409` body cannot be decoded.
pub const UNKNOWN_VERSION: &str = "unknown";

/// A remote store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRemote {
    /// Create a client for `base_url` with [`DEFAULT_TIMEOUT`].
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(unavailable)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Send `token` as a bearer credential on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn unavailable(err: reqwest::Error) -> Error {
    Error::RemoteUnavailable(err.to_string())
}

async fn unexpected_status(method: &str, path: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::RemoteUnavailable(format!("{method} {path} returned {status}: {body}"))
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn fetch(&self) -> Result<Snapshot> {
        let response = self
            .authorize(self.client.get(self.url(SNAPSHOT_PATH)))
            .send()
            .await
            .map_err(unavailable)?;

        if !response.status().is_success() {
            return Err(unexpected_status("GET", SNAPSHOT_PATH, response).await);
        }

        let body: SnapshotResponse = response.json().await.map_err(unavailable)?;
        let snapshot = Snapshot::from(body);
        let meta = snapshot.summary(Some(chrono::Utc::now()));
        tracing::debug!(
            version_id = %snapshot.version_id,
            records = meta.record_count,
            "fetched snapshot"
        );

        Ok(snapshot.with_meta(meta))
    }

    async fn push(
        &self,
        base_version_id: &str,
        candidate: SnapshotContent,
    ) -> Result<PushReceipt> {
        let request = PushRequest::new(base_version_id, candidate);
        let response = self
            .authorize(self.client.put(self.url(SNAPSHOT_PATH)))
            .json(&request)
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            status if status.is_success() => {
                let body: PushResponse = response.json().await.map_err(unavailable)?;
                tracing::debug!(
                    base = base_version_id,
                    new = %body.new_version_id,
                    "push accepted"
                );
                Ok(PushReceipt {
                    new_version_id: body.new_version_id,
                })
            }
            StatusCode::CONFLICT => {
                let actual = match response.json::<ConflictResponse>().await {
                    Ok(body) => body.actual_version_id,
                    Err(err) => {
                        tracing::warn!(error = %err, "unreadable conflict body");
                        UNKNOWN_VERSION.to_string()
                    }
                };
                Err(Error::OutOfDate {
                    base: base_version_id.to_string(),
                    actual,
                })
            }
            _ => Err(unexpected_status("PUT", SNAPSHOT_PATH, response).await),
        }
    }

    async fn probe(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url(HEALTH_PATH))
            .send()
            .await
            .map_err(unavailable)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(unexpected_status("GET", HEALTH_PATH, response).await)
        }
    }
}
