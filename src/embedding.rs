//! Embedding capability seam and the OpenAI-backed implementation.
//!
//! The [`Embedder`] trait is the boundary the indexer and retriever depend
//! on; [`OpenAiEmbedder`] implements it against `POST /v1/embeddings` with a
//! per-call timeout and exponential backoff for 429/5xx responses.
//!
//! [`embed_all`] fans out one request per text concurrently and gathers the
//! vectors back in input order — the embedding for `texts[i]` always lands
//! at position `i` regardless of completion order.
//!
//! Also hosts the vector utilities shared with the SQLite store:
//! [`vec_to_blob`], [`blob_to_vec`], and [`cosine_similarity`].

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::Error;

/// External embedding capability: text in, fixed-dimensionality vector out.
/// Implementations must support concurrent outstanding calls.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embed a batch of texts concurrently, preserving input order.
///
/// Any single failure fails the whole batch — during indexing there is no
/// per-chunk fallback for a missing vector.
pub async fn embed_all(embedder: &dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let futures = texts.iter().map(|t| embedder.embed(t));
    futures::future::try_join_all(futures).await
}

// ============ OpenAI embedder ============

/// Embedding client for the OpenAI API.
///
/// Requires `OPENAI_API_KEY` in the environment; its absence is a
/// configuration error surfaced at construction, before any work begins.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Config("OPENAI_API_KEY environment variable not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let json = post_with_retry(
            &self.client,
            "https://api.openai.com/v1/embeddings",
            &self.api_key,
            &body,
            self.max_retries,
        )
        .await?;

        let embedding = json
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|d| d.first())
            .and_then(|item| item.get("embedding"))
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                anyhow::Error::from(Error::Provider(
                    "invalid embeddings response: missing data[0].embedding".to_string(),
                ))
            })?;

        Ok(embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect())
    }
}

/// POST a JSON body with bearer auth, retrying 429/5xx and network errors
/// with exponential backoff (1s, 2s, 4s, ... capped at 32s). Other client
/// errors fail immediately.
pub(crate) async fn post_with_retry(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &serde_json::Value,
    max_retries: u32,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                let body_text = response.text().await.unwrap_or_default();
                let err = Error::Provider(format!("{} returned {}: {}", url, status, body_text));

                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(anyhow::Error::from(err));
                    continue;
                }

                return Err(err.into());
            }
            Err(e) => {
                last_err = Some(anyhow::Error::from(Error::Provider(e.to_string())));
                continue;
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| Error::Provider("request failed after retries".to_string()).into()))
}

// ============ Vector utilities ============

/// Encode a float vector as little-endian f32 bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity in `[-1.0, 1.0]`. Returns `0.0` for empty vectors or
/// mismatched lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    struct IndexedEmbedder;

    #[async_trait]
    impl Embedder for IndexedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            // Vector encodes the text's trailing number so order is checkable.
            let n: f32 = text.rsplit(' ').next().unwrap().parse().unwrap();
            Ok(vec![n, n * 2.0])
        }
    }

    #[tokio::test]
    async fn embed_all_preserves_input_order() {
        let texts: Vec<String> = (0..20).map(|i| format!("text {}", i)).collect();
        let vectors = embed_all(&IndexedEmbedder, &texts).await.unwrap();
        assert_eq!(vectors.len(), 20);
        for (i, v) in vectors.iter().enumerate() {
            assert_eq!(v[0], i as f32);
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::Provider("rate limited".to_string()).into())
        }
    }

    #[tokio::test]
    async fn embed_all_propagates_failure() {
        let texts = vec!["a".to_string(), "b".to_string()];
        assert!(embed_all(&FailingEmbedder, &texts).await.is_err());
    }

    #[test]
    fn blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        assert_eq!(blob_to_vec(&vec_to_blob(&vec)), vec);
    }

    #[test]
    fn cosine_identical_and_orthogonal() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);

        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
