use crate::config::{RetrievalConfig, RetrievalMode};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Trait for the retrieval (vector search) collaborator.
/// Returns the single most relevant passage for `query`, if any.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    async fn search(&self, query: &str) -> Result<Option<String>>;
}

/// Retrieval disabled
pub struct NoopRetriever;

#[async_trait::async_trait]
impl Retriever for NoopRetriever {
    async fn search(&self, _query: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Always answers with the same configured passage (simulated search)
pub struct StaticRetriever {
    passage: String,
}

impl StaticRetriever {
    pub fn new(passage: impl Into<String>) -> Self {
        Self { passage: passage.into() }
    }
}

#[async_trait::async_trait]
impl Retriever for StaticRetriever {
    async fn search(&self, _query: &str) -> Result<Option<String>> {
        let passage = self.passage.trim();
        Ok((!passage.is_empty()).then(|| passage.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    content: String,
    #[serde(default)]
    score: f32,
}

/// Client for an external vector search service (`POST {base_url}/search`)
pub struct HttpRetriever {
    client: Client,
    base_url: String,
    top_k: usize,
}

impl HttpRetriever {
    pub fn new(config: &RetrievalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            top_k: config.top_k.max(1),
        })
    }
}

#[async_trait::async_trait]
impl Retriever for HttpRetriever {
    async fn search(&self, query: &str) -> Result<Option<String>> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&SearchRequest { query, top_k: self.top_k })
            .send()
            .await
            .context("Failed to connect to search service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Search API error ({}): {}", status, body);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;

        debug!("Search returned {} hits", parsed.results.len());

        Ok(parsed
            .results
            .into_iter()
            .filter(|hit| !hit.content.trim().is_empty())
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|hit| hit.content))
    }
}

pub fn build_retriever(config: &RetrievalConfig) -> Result<Arc<dyn Retriever>> {
    let retriever: Arc<dyn Retriever> = match config.mode {
        RetrievalMode::Disabled => Arc::new(NoopRetriever),
        RetrievalMode::Static => Arc::new(StaticRetriever::new(config.static_passage.clone())),
        RetrievalMode::Http => Arc::new(HttpRetriever::new(config)?),
    };
    info!("Retrieval mode: {:?}", config.mode);
    Ok(retriever)
}
