//! Remote rule document retrieval.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::rules::RuleDocumentError;

/// Any reason a remote rule set could not be used.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("document exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error(transparent)]
    Document(#[from] RuleDocumentError),
}

/// Default cap on the size of a remote rule document.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

/// Retrieves a rule document as parsed JSON.
#[async_trait]
pub trait RuleFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

/// Fetches rule documents over HTTP(S), refusing bodies over `max_bytes`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::default(), DEFAULT_MAX_DOCUMENT_BYTES)
    }
}

#[async_trait]
impl RuleFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        let limit = self.max_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchError::TooLarge { limit });
        }

        // Content-Length may be absent or wrong; enforce the cap while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        let value = serde_json::from_slice(&body).map_err(RuleDocumentError::Json)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tokio::net::TcpListener;

    async fn serve(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/rules.json", get(move || async move { body }));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}/rules.json")
    }

    fn fetcher(max_bytes: usize) -> HttpFetcher {
        HttpFetcher::new(reqwest::Client::builder().no_proxy().build().unwrap(), max_bytes)
    }

    #[tokio::test]
    async fn test_fetch_within_limit() {
        let url = serve(r#"[{"a": 1}]"#).await;
        let value = fetcher(64).fetch(&url).await.unwrap();
        assert!(value.is_array());
    }

    #[tokio::test]
    async fn test_oversized_document_rejected() {
        let url = serve(r#"[{"padding": "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx"}]"#).await;
        let err = fetcher(16).fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { limit: 16 }));
    }
}
