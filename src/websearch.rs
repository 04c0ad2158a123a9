//! Web-search fallback.
//!
//! When the index has nothing relevant, [`lookup`] queries an external
//! search provider and normalizes the results into a context string plus a
//! citation list. Provider failure is an explicit empty result, never an
//! error — callers handle "no grounding available" uniformly.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::config::WebSearchConfig;
use crate::error::Error;
use crate::models::Citation;

/// A ranked result from the external search provider.
#[derive(Debug, Clone)]
pub struct WebHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// External web-search capability.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebHit>>;
}

/// Normalize up to `limit` provider results: contents joined with newlines
/// and citations built in provider order. On failure, logs and returns
/// `("", [])`.
pub async fn lookup(
    provider: &dyn WebSearch,
    query: &str,
    limit: usize,
) -> (String, Vec<Citation>) {
    match provider.search(query, limit).await {
        Ok(hits) => {
            let mut contents = Vec::new();
            let mut citations = Vec::new();
            for hit in hits.into_iter().take(limit) {
                contents.push(hit.content);
                citations.push(Citation {
                    title: hit.title,
                    url: hit.url,
                });
            }
            (contents.join("\n"), citations)
        }
        Err(e) => {
            tracing::error!(error = %e, "web search failed");
            (String::new(), Vec::new())
        }
    }
}

// ============ Tavily provider ============

/// Search client for the Tavily API.
///
/// Requires `TAVILY_API_KEY` in the environment, checked at construction.
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
}

impl TavilySearch {
    pub fn new(config: &WebSearchConfig) -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| Error::Config("TAVILY_API_KEY environment variable not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebHit>> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": limit,
        });

        let response = self
            .client
            .post("https://api.tavily.com/search")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Provider(format!(
                "Tavily search returned {}",
                response.status()
            ))
            .into());
        }

        let payload: serde_json::Value =
            response.json().await.map_err(|e| Error::Provider(e.to_string()))?;

        let results = payload
            .get("results")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        let hits = results
            .iter()
            .map(|item| WebHit {
                title: item
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                url: item
                    .get("url")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                content: item
                    .get("content")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect();

        Ok(hits)
    }
}
