//! In-memory graph built from a fetched response.
//!
//! Converts the wire `RawGraph` into an arena: nodes and links live in dense
//! vectors and links refer to nodes by index. A built `Graph` is never mutated;
//! every successful fetch produces a new one.

use std::collections::HashMap;

use metalcore_core::{EntityKind, ModelError, NetworkConfig, NodeId, RawGraph, RelationshipKind};

/// Node sizing constants handed to the render adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightConfig {
    pub score_scale: f64,
    pub default_artist_weight: f64,
    pub auxiliary_weight: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for WeightConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            score_scale: config.score_scale,
            default_artist_weight: config.default_artist_weight,
            auxiliary_weight: config.auxiliary_weight,
        }
    }
}

/// A node with its derived visual weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Dense index (0..N-1).
    pub index: usize,
    pub id: NodeId,
    pub label: String,
    pub kind: EntityKind,
    /// Composite score, only for scored artists.
    pub score: Option<f64>,
    /// Detail-view reference, only for artists.
    pub external_ref: Option<String>,
    /// Size hint for the renderer. Carries no other meaning.
    pub visual_weight: f64,
}

/// A link between two node indices. Undirected for connectivity, but the
/// source/target orientation is kept for direction reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Dense index (0..M-1).
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub relationship: RelationshipKind,
}

impl Link {
    /// The endpoint opposite `node`, if `node` is an endpoint at all.
    pub fn other(&self, node: usize) -> Option<usize> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}

/// An immutable graph snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    /// Map from node id → dense index.
    pub node_index: HashMap<NodeId, usize>,
}

impl Graph {
    /// Validate and normalize a fetched graph.
    ///
    /// Fails on the first unknown kind, duplicate id, or link endpoint that is
    /// not among the nodes. No partial graph is ever returned.
    pub fn build(raw: &RawGraph, weights: &WeightConfig) -> Result<Self, ModelError> {
        let mut node_index = HashMap::with_capacity(raw.nodes.len());
        let mut nodes = Vec::with_capacity(raw.nodes.len());

        for (i, record) in raw.nodes.iter().enumerate() {
            let kind: EntityKind = record.kind.parse()?;
            let id = NodeId::new(record.id.clone());
            if node_index.insert(id.clone(), i).is_some() {
                return Err(ModelError::DuplicateNode { id: record.id.clone() });
            }

            nodes.push(Node {
                index: i,
                id,
                label: record.label.clone(),
                kind,
                score: record.score,
                external_ref: record.external_ref.clone().filter(|_| kind.is_artist()),
                visual_weight: visual_weight(kind, record.score, weights),
            });
        }

        let mut links = Vec::with_capacity(raw.links.len());
        for (i, record) in raw.links.iter().enumerate() {
            let endpoint = |id: &str| {
                node_index
                    .get(id)
                    .copied()
                    .ok_or_else(|| ModelError::MalformedGraph {
                        link_index: i,
                        source_id: record.source.clone(),
                        target_id: record.target.clone(),
                        missing_id: id.to_string(),
                    })
            };
            let source = endpoint(&record.source)?;
            let target = endpoint(&record.target)?;
            let relationship: RelationshipKind = record.relationship.parse()?;

            links.push(Link {
                index: i,
                source,
                target,
                relationship,
            });
        }

        tracing::debug!(nodes = nodes.len(), links = links.len(), "Graph built");

        Ok(Self {
            nodes,
            links,
            node_index,
        })
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Find the node a free-text center refers to.
    ///
    /// Tries a case-insensitive exact label match, then an exact id match,
    /// then a label containing the text, which must be unique.
    pub fn find_center(&self, text: &str) -> Option<&Node> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Some(node) = self.nodes.iter().find(|n| n.label.to_lowercase() == needle) {
            return Some(node);
        }
        if let Some(node) = self.node(text.trim()) {
            return Some(node);
        }

        let mut partial = self
            .nodes
            .iter()
            .filter(|n| n.label.to_lowercase().contains(&needle));
        match (partial.next(), partial.next()) {
            (Some(node), None) => Some(node),
            _ => None,
        }
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links in the graph.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

/// Size of a node as drawn by the renderer. A zero score counts as unscored.
pub fn visual_weight(kind: EntityKind, score: Option<f64>, weights: &WeightConfig) -> f64 {
    match (kind, score) {
        (EntityKind::Artist, Some(score)) if score != 0.0 => score / weights.score_scale,
        (EntityKind::Artist, _) => weights.default_artist_weight,
        _ => weights.auxiliary_weight,
    }
}
