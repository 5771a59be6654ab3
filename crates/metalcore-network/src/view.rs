//! The visible graph: index sets over an immutable graph snapshot.
//!
//! A `VisibleGraph` is derived from `(Arc<Graph>, RelationshipFilter)` and
//! never patched. [`ViewCache`] memoizes the last derivation on the identity
//! of the graph snapshot and the filter value.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::filter::RelationshipFilter;
use crate::graph::{Graph, Link, Node};
use crate::prune;

/// Nodes and links that survive filtering, plus visible adjacency.
#[derive(Debug, Clone)]
pub struct VisibleGraph {
    graph: Arc<Graph>,
    filter: RelationshipFilter,
    node_indices: Vec<usize>,
    link_indices: Vec<usize>,
    node_visible: Vec<bool>,
    link_visible: Vec<bool>,
    /// `incident[i]` = visible link indices touching node `i`.
    incident: Vec<Vec<usize>>,
}

impl VisibleGraph {
    /// Run the filter and the pruner over `graph`.
    pub fn derive(graph: Arc<Graph>, filter: RelationshipFilter) -> Self {
        let link_indices = filter.visible_links(&graph);
        let node_indices = prune::visible_nodes(&graph, &link_indices, filter.artist_only());

        let mut node_visible = vec![false; graph.node_count()];
        for &i in &node_indices {
            node_visible[i] = true;
        }

        let mut link_visible = vec![false; graph.link_count()];
        let mut incident = vec![Vec::new(); graph.node_count()];
        for &i in &link_indices {
            link_visible[i] = true;
            let link = &graph.links[i];
            incident[link.source].push(i);
            if link.target != link.source {
                incident[link.target].push(i);
            }
        }

        Self {
            graph,
            filter,
            node_indices,
            link_indices,
            node_visible,
            link_visible,
            incident,
        }
    }

    /// An empty view, shown before the first graph arrives.
    pub fn empty() -> Self {
        Self::derive(Arc::new(Graph::default()), RelationshipFilter::default())
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub fn filter(&self) -> RelationshipFilter {
        self.filter
    }

    pub fn node_indices(&self) -> &[usize] {
        &self.node_indices
    }

    pub fn link_indices(&self) -> &[usize] {
        &self.link_indices
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.node_indices.iter().map(|&i| &self.graph.nodes[i])
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.link_indices.iter().map(|&i| &self.graph.links[i])
    }

    pub fn contains_node(&self, index: usize) -> bool {
        self.node_visible.get(index).copied().unwrap_or(false)
    }

    pub fn contains_link(&self, index: usize) -> bool {
        self.link_visible.get(index).copied().unwrap_or(false)
    }

    /// Look up a node by id; hidden nodes are not found.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.graph
            .node(id)
            .filter(|node| self.contains_node(node.index))
    }

    /// Visible links touching the node at `index`.
    pub fn incident_links(&self, index: usize) -> impl Iterator<Item = &Link> + '_ {
        self.incident
            .get(index)
            .into_iter()
            .flatten()
            .map(|&i| &self.graph.links[i])
    }

    /// The node itself plus every node one visible link away.
    /// `None` when the node is not visible.
    pub fn adjacency(&self, id: &str) -> Option<BTreeSet<usize>> {
        let node = self.node(id)?;
        let mut set = BTreeSet::new();
        set.insert(node.index);
        for link in self.incident_links(node.index) {
            if let Some(other) = link.other(node.index) {
                set.insert(other);
            }
        }
        Some(set)
    }

    pub fn node_count(&self) -> usize {
        self.node_indices.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_indices.len()
    }
}

/// Memoizes the most recent visible graph.
#[derive(Debug, Default)]
pub struct ViewCache {
    current: Option<Arc<VisibleGraph>>,
    misses: u64,
}

impl ViewCache {
    /// Return the visible graph for `(graph, filter)`, deriving it only when
    /// either input changed since the last call.
    pub fn get(&mut self, graph: &Arc<Graph>, filter: RelationshipFilter) -> Arc<VisibleGraph> {
        if let Some(view) = &self.current {
            if Arc::ptr_eq(view.graph(), graph) && view.filter() == filter {
                return view.clone();
            }
        }

        self.misses += 1;
        let view = Arc::new(VisibleGraph::derive(graph.clone(), filter));
        tracing::debug!(
            nodes = view.node_count(),
            links = view.link_count(),
            "Visible graph derived"
        );
        self.current = Some(view.clone());
        view
    }

    /// Number of derivations performed so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}
