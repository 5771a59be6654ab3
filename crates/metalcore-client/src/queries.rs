//! The graph query and its HTTP rendering.

use async_trait::async_trait;
use metalcore_core::RawGraph;
use serde::{Deserialize, Serialize};

use crate::client::{FetchError, GraphFetchClient, GraphSource};

const GRAPH_PATH: &str = "/api/network/graph";

/// Parameters of one subgraph request.
///
/// `top` only applies to the uncentered overview and is never sent alongside
/// a center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQuery {
    pub center: Option<String>,
    pub depth: u8,
    pub top: Option<u32>,
}

impl GraphQuery {
    pub fn overview(depth: u8, top: Option<u32>) -> Self {
        Self {
            center: None,
            depth,
            top,
        }
    }

    pub fn centered(center: impl Into<String>, depth: u8) -> Self {
        Self {
            center: Some(center.into()),
            depth,
            top: None,
        }
    }

    /// Query-string pairs in the order the backend documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(3);
        if let Some(center) = &self.center {
            params.push(("center", center.clone()));
        }
        params.push(("depth", self.depth.to_string()));
        if self.center.is_none() {
            if let Some(top) = self.top {
                params.push(("top", top.to_string()));
            }
        }
        params
    }
}

impl GraphFetchClient {
    /// Fetch the subgraph described by `query`.
    pub async fn get_graph(&self, query: &GraphQuery) -> Result<RawGraph, FetchError> {
        let url = format!("{}{}", self.base_url(), GRAPH_PATH);
        let params = query.params();

        tracing::debug!(url = %url, ?params, "Requesting network graph");

        let response = self
            .http()
            .get(&url)
            .query(&params)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Network graph request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let graph: RawGraph = response.json().await?;
        tracing::info!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            center = ?query.center,
            depth = query.depth,
            "Network graph fetched"
        );
        Ok(graph)
    }
}

#[async_trait]
impl GraphSource for GraphFetchClient {
    async fn fetch_graph(&self, query: &GraphQuery) -> Result<RawGraph, FetchError> {
        self.get_graph(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_params_include_top() {
        let query = GraphQuery::overview(2, Some(50));
        assert_eq!(
            query.params(),
            vec![("depth", "2".to_string()), ("top", "50".to_string())]
        );
    }

    #[test]
    fn test_centered_params_omit_top() {
        let mut query = GraphQuery::centered("Knocked Loose", 3);
        query.top = Some(10);
        assert_eq!(
            query.params(),
            vec![
                ("center", "Knocked Loose".to_string()),
                ("depth", "3".to_string())
            ]
        );
    }

    #[test]
    fn test_overview_without_cap() {
        let query = GraphQuery::overview(1, None);
        assert_eq!(query.params(), vec![("depth", "1".to_string())]);
    }
}
