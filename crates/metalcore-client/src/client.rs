//! HTTP connection management and the shared graph source seam.

use std::time::Duration;

use async_trait::async_trait;
use metalcore_core::{ApiConfig, RawGraph};

use crate::queries::GraphQuery;

/// Errors from graph fetches. Recoverable through an explicit retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Setup(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("API {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode graph response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Message suitable for the error banner next to the retry control.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Setup(_) | FetchError::Transport(_) => {
                "Could not reach the network service. Check your connection and retry.".to_string()
            }
            FetchError::Status { status, .. } if *status >= 500 => {
                format!("The network service failed ({status}). Retry in a moment.")
            }
            FetchError::Status { status, .. } => {
                format!("The network request was rejected ({status}).")
            }
            FetchError::Decode(_) => {
                "The network service returned an unreadable graph.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Anything that can answer a graph query.
#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn fetch_graph(&self, query: &GraphQuery) -> Result<RawGraph, FetchError>;
}

/// HTTP client for `GET /api/network/graph`.
///
/// Clone is cheap (inner Arc in `reqwest::Client`).
#[derive(Clone)]
pub struct GraphFetchClient {
    http: reqwest::Client,
    base_url: String,
}

impl GraphFetchClient {
    /// Create a client from the API section of the dashboard config.
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
