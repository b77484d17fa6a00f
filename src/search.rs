//! Card database lookup
//!
//! Client for the librarian sidecar, a small HTTP service that answers
//! free-text card searches.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One card returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardHit {
    pub name: String,
    #[serde(rename = "type")]
    pub type_line: String,
    pub text: String,
}

#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("card search is not configured; set LIBRARIAN_URL to enable it")]
    NotConfigured,
    #[error("librarian request failed: {0}")]
    Network(String),
    #[error("librarian returned an unexpected response: {0}")]
    Protocol(String),
    #[error("librarian error: {0}")]
    Service(String),
}

/// Free-text search over the card database.
#[async_trait]
pub trait CardSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CardHit>, SearchError>;
}

/// HTTP client for a running librarian instance.
pub struct LibrarianClient {
    client: Client,
    endpoint: String,
}

impl LibrarianClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let endpoint = format!("{}/search", base_url.trim_end_matches('/'));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, endpoint }
    }
}

#[async_trait]
impl CardSearch for LibrarianClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CardHit>, SearchError> {
        let request = SearchRequest { query, limit };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(SearchError::Service(format!("HTTP {status}: {body}")));
        }

        match serde_json::from_str::<SearchResponse>(&body) {
            Ok(SearchResponse::Hits(hits)) => Ok(hits),
            Ok(SearchResponse::Failure { message, .. }) => Err(SearchError::Service(message)),
            Err(e) => Err(SearchError::Protocol(format!("{e} - body: {body}"))),
        }
    }
}

/// Stand-in used when no librarian endpoint is configured. Every search
/// reports the missing configuration instead of failing silently.
pub struct UnconfiguredSearch;

#[async_trait]
impl CardSearch for UnconfiguredSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<CardHit>, SearchError> {
        Err(SearchError::NotConfigured)
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

/// The librarian answers either a bare hit array or an error envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Hits(Vec<CardHit>),
    Failure {
        #[allow(dead_code)]
        status: String,
        message: String,
    },
}
