//! Thin async client for the subset of the Meilisearch HTTP API this service
//! talks to. Every call is bearer-authenticated with the configured key and
//! scoped to a single index.

pub mod types;

pub use types::{
    EnqueuedTask, FacetDistribution, Health, IndexStats, SearchQuery, SearchResult, Settings,
    Task, Version,
};

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum MeiliError {
    #[error("meilisearch request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("meilisearch returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
}

impl MeiliError {
    /// True for a missing document. A missing index is not included.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MeiliError::Api { status: 404, code, .. } if code != "index_not_found")
    }
}

#[derive(Clone)]
pub struct MeiliClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    index: String,
}

impl MeiliClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        index: &str,
        timeout: Duration,
    ) -> Result<Self, MeiliError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            index: index.to_string(),
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn index_url(&self, suffix: &str) -> String {
        format!(
            "{}/indexes/{}{}",
            self.base_url,
            urlencoding::encode(&self.index),
            suffix
        )
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, MeiliError> {
        let req = if self.api_key.is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        };
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<types::ErrorBody>(&body) {
            Ok(err) => (err.code, err.message),
            Err(_) => (String::new(), body),
        };
        Err(MeiliError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, MeiliError> {
        tracing::debug!(index = %self.index, q = %query.q, filter = ?query.filter, "meili search");
        self.send(self.http.post(self.index_url("/search")).json(query))
            .await
    }

    pub async fn get_document(&self, id: &str) -> Result<serde_json::Value, MeiliError> {
        let path = format!("/documents/{}", urlencoding::encode(id));
        self.send(self.http.get(self.index_url(&path))).await
    }

    pub async fn add_documents<T>(
        &self,
        documents: &[T],
        primary_key: &str,
    ) -> Result<EnqueuedTask, MeiliError>
    where
        T: Serialize + Sync,
    {
        let req = self
            .http
            .post(self.index_url("/documents"))
            .query(&[("primaryKey", primary_key)])
            .json(documents);
        self.send(req).await
    }

    pub async fn update_settings(&self, settings: &Settings) -> Result<EnqueuedTask, MeiliError> {
        self.send(self.http.patch(self.index_url("/settings")).json(settings))
            .await
    }

    pub async fn stats(&self) -> Result<IndexStats, MeiliError> {
        self.send(self.http.get(self.index_url("/stats"))).await
    }

    pub async fn get_task(&self, uid: u64) -> Result<Task, MeiliError> {
        self.send(self.http.get(self.url(&format!("/tasks/{uid}"))))
            .await
    }

    /// Polls a task until it reaches a terminal status or `timeout` elapses.
    /// Sleeps never run past the deadline. On timeout the last observed task
    /// is returned; check [`Task::is_finished`].
    pub async fn wait_for_task(
        &self,
        uid: u64,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Task, MeiliError> {
        let deadline = Instant::now() + timeout;
        loop {
            let task = self.get_task(uid).await?;
            let now = Instant::now();
            if task.is_finished() || now >= deadline {
                return Ok(task);
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }

    pub async fn health(&self) -> Result<Health, MeiliError> {
        self.send(self.http.get(self.url("/health"))).await
    }

    pub async fn version(&self) -> Result<Version, MeiliError> {
        self.send(self.http.get(self.url("/version"))).await
    }
}
