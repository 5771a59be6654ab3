//! Query controls and fetch supersession.
//!
//! Every setter issues a new [`FetchRequest`] tagged with a monotonically
//! increasing sequence number. Only the response carrying the latest issued
//! seq is accepted; anything older is discarded no matter when it arrives.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metalcore_client::{FetchError, GraphQuery};
use metalcore_core::{NetworkConfig, NodeId, RawGraph};
use serde::Serialize;

use crate::error::NetworkError;
use crate::graph::{Graph, WeightConfig};

pub const MIN_DEPTH: u8 = 1;
pub const MAX_DEPTH: u8 = 3;

/// A query to run, tagged for staleness checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query: GraphQuery,
}

/// Loading banner state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading { seq: u64 },
    Ready,
    /// The previous graph (if any) stays on screen under this banner.
    Failed { message: String, detail: String },
}

/// What the center text resolved to in the loaded graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum CenterResolution {
    Overview,
    Resolved { node_id: NodeId },
    NotFound { center: String },
}

/// The graph currently on screen.
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub graph: Arc<Graph>,
    pub seq: u64,
    pub query: GraphQuery,
    pub center: CenterResolution,
    pub fetched_at: DateTime<Utc>,
}

/// Result of feeding a response to the controller.
#[derive(Debug)]
pub enum Completion {
    /// The response replaced the on-screen graph.
    Applied,
    /// A newer request superseded this one; the response was dropped.
    Stale { seq: u64 },
    /// The latest request failed; the previous graph stays.
    Failed(NetworkError),
}

/// Owns the query parameters and the fetched graph.
#[derive(Debug)]
pub struct RecenterController {
    center: Option<String>,
    depth: u8,
    top_n: Option<u32>,
    default_top_n: Option<u32>,
    weights: WeightConfig,
    next_seq: u64,
    pending: Option<FetchRequest>,
    status: LoadStatus,
    loaded: Option<LoadedGraph>,
}

impl RecenterController {
    pub fn new(config: &NetworkConfig) -> Self {
        let default_top_n = Some(config.default_top_n).filter(|&n| n > 0);
        Self {
            center: None,
            depth: config.default_depth.clamp(MIN_DEPTH, MAX_DEPTH),
            top_n: default_top_n,
            default_top_n,
            weights: WeightConfig::from(config),
            next_seq: 0,
            pending: None,
            status: LoadStatus::Idle,
            loaded: None,
        }
    }

    /// Start centered on `center` instead of the overview.
    pub fn with_center(mut self, center: Option<&str>) -> Self {
        self.apply_center(center);
        self
    }

    // ── Query controls ────────────────────────────────────────

    /// Set or clear the center. A non-empty center drops the top-N cap;
    /// clearing it restores the default cap.
    pub fn set_center(&mut self, center: Option<&str>) -> FetchRequest {
        self.apply_center(center);
        self.issue()
    }

    /// Set the traversal depth, clamped to `1..=3`.
    pub fn set_depth(&mut self, depth: u8) -> FetchRequest {
        self.depth = depth.clamp(MIN_DEPTH, MAX_DEPTH);
        self.issue()
    }

    pub fn set_top_n(&mut self, top_n: Option<u32>) -> FetchRequest {
        self.top_n = top_n;
        self.issue()
    }

    /// Issue the current query (initial load).
    pub fn refresh(&mut self) -> FetchRequest {
        self.issue()
    }

    /// Re-issue the current query after a failure. Always allowed.
    pub fn retry(&mut self) -> FetchRequest {
        tracing::info!(status = ?self.status, "Retrying graph fetch");
        self.issue()
    }

    fn apply_center(&mut self, center: Option<&str>) {
        match center.map(str::trim).filter(|c| !c.is_empty()) {
            Some(center) => {
                self.center = Some(center.to_string());
                self.top_n = None;
            }
            None => {
                self.center = None;
                self.top_n = self.default_top_n;
            }
        }
    }

    fn issue(&mut self) -> FetchRequest {
        self.next_seq += 1;
        let request = FetchRequest {
            seq: self.next_seq,
            query: self.query(),
        };
        if let Some(superseded) = self.pending.replace(request.clone()) {
            tracing::debug!(
                superseded = superseded.seq,
                seq = request.seq,
                "Fetch superseded"
            );
        }
        self.status = LoadStatus::Loading { seq: request.seq };
        request
    }

    /// The query implied by the current controls.
    pub fn query(&self) -> GraphQuery {
        match &self.center {
            Some(center) => GraphQuery::centered(center.clone(), self.depth),
            None => GraphQuery::overview(self.depth, self.top_n),
        }
    }

    // ── Responses ─────────────────────────────────────────────

    pub fn is_latest(&self, seq: u64) -> bool {
        self.pending.as_ref().is_some_and(|p| p.seq == seq)
    }

    /// Feed the response for request `seq`.
    pub fn complete(&mut self, seq: u64, result: Result<RawGraph, FetchError>) -> Completion {
        let request = match self.pending.take() {
            Some(request) if request.seq == seq => request,
            other => {
                self.pending = other;
                tracing::debug!(seq, latest = ?self.pending.as_ref().map(|p| p.seq), "Discarding stale response");
                return Completion::Stale { seq };
            }
        };

        let built = result
            .map_err(NetworkError::from)
            .and_then(|raw| Graph::build(&raw, &self.weights).map_err(NetworkError::from));

        match built {
            Ok(graph) => {
                let center = match &request.query.center {
                    None => CenterResolution::Overview,
                    Some(text) => match graph.find_center(text) {
                        Some(node) => CenterResolution::Resolved {
                            node_id: node.id.clone(),
                        },
                        None => CenterResolution::NotFound {
                            center: text.clone(),
                        },
                    },
                };
                tracing::info!(
                    seq,
                    nodes = graph.node_count(),
                    links = graph.link_count(),
                    center = ?center,
                    "Graph applied"
                );
                self.loaded = Some(LoadedGraph {
                    graph: Arc::new(graph),
                    seq,
                    query: request.query,
                    center,
                    fetched_at: Utc::now(),
                });
                self.status = LoadStatus::Ready;
                Completion::Applied
            }
            Err(err) => {
                tracing::warn!(seq, error = %err, "Graph load failed");
                self.status = LoadStatus::Failed {
                    message: failure_message(&err),
                    detail: err.to_string(),
                };
                Completion::Failed(err)
            }
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn center(&self) -> Option<&str> {
        self.center.as_deref()
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn top_n(&self) -> Option<u32> {
        self.top_n
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn loaded(&self) -> Option<&LoadedGraph> {
        self.loaded.as_ref()
    }

    pub fn pending(&self) -> Option<&FetchRequest> {
        self.pending.as_ref()
    }
}

fn failure_message(err: &NetworkError) -> String {
    match err {
        NetworkError::Fetch(fetch) => fetch.user_message(),
        NetworkError::Model(model) if model.is_malformed() => {
            "The network service returned an inconsistent graph.".to_string()
        }
        NetworkError::Model(_) => {
            "The network service returned data this dashboard does not understand.".to_string()
        }
        other => other.to_string(),
    }
}
