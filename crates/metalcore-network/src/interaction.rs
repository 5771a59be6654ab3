//! Hover and selection state.
//!
//! Hover and selection are independent axes: a node can be hovered while
//! another is selected. The state is a plain serializable value; every change
//! goes through [`reduce`], and everything the renderer or the side panel
//! needs is derived from `(state, visible graph)`.

use std::collections::{BTreeMap, BTreeSet};

use metalcore_core::{EntityKind, NodeId, RelationshipKind};
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};
use crate::graph::Link;
use crate::view::VisibleGraph;

/// Current hover and selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    pub hovered: Option<NodeId>,
    pub selected: Option<NodeId>,
}

/// Input to the interaction reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEvent {
    HoverEnter(NodeId),
    HoverExit,
    NodeClick(NodeId),
    ClearSelection,
}

/// Apply one event. Hover and click only accept nodes that are currently
/// visible; a node hidden by the filters cannot be hovered or selected.
pub fn reduce(
    state: &InteractionState,
    event: &InteractionEvent,
    view: &VisibleGraph,
) -> Result<InteractionState> {
    let mut next = state.clone();
    match event {
        InteractionEvent::HoverEnter(id) => {
            let node = view.node(id.as_str()).ok_or_else(|| NetworkError::NodeNotVisible {
                node_id: id.to_string(),
            })?;
            next.hovered = Some(node.id.clone());
        }
        InteractionEvent::HoverExit => next.hovered = None,
        InteractionEvent::NodeClick(id) => {
            let node = view.node(id.as_str()).ok_or_else(|| NetworkError::NodeNotVisible {
                node_id: id.to_string(),
            })?;
            next.selected = Some(node.id.clone());
        }
        InteractionEvent::ClearSelection => next.selected = None,
    }
    Ok(next)
}

/// Drop hover/selection that point at nodes the view no longer shows.
pub fn reconcile(state: &InteractionState, view: &VisibleGraph) -> InteractionState {
    let keep = |id: &Option<NodeId>| id.clone().filter(|id| view.node(id.as_str()).is_some());
    InteractionState {
        hovered: keep(&state.hovered),
        selected: keep(&state.selected),
    }
}

// ── Highlight ─────────────────────────────────────────────────────

/// Dimming derived from the hovered node.
///
/// With no hover, nothing is dimmed and no link label is a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight {
    adjacency: Option<BTreeSet<usize>>,
}

impl Highlight {
    pub fn derive(state: &InteractionState, view: &VisibleGraph) -> Self {
        let adjacency = state
            .hovered
            .as_ref()
            .and_then(|id| view.adjacency(id.as_str()));
        Self { adjacency }
    }

    pub fn is_active(&self) -> bool {
        self.adjacency.is_some()
    }

    pub fn adjacency(&self) -> Option<&BTreeSet<usize>> {
        self.adjacency.as_ref()
    }

    pub fn node_dimmed(&self, index: usize) -> bool {
        self.adjacency
            .as_ref()
            .is_some_and(|adj| !adj.contains(&index))
    }

    /// Both endpoints inside the adjacency set.
    pub fn link_label_candidate(&self, link: &Link) -> bool {
        self.adjacency
            .as_ref()
            .is_some_and(|adj| adj.contains(&link.source) && adj.contains(&link.target))
    }

    pub fn link_dimmed(&self, link: &Link) -> bool {
        self.is_active() && !self.link_label_candidate(link)
    }

    /// Final label decision, given the renderer's zoom and threshold.
    pub fn label_visible(&self, link: &Link, zoom: f64, threshold: f64) -> bool {
        zoom > threshold && self.link_label_candidate(link)
    }
}

// ── Selection panel ───────────────────────────────────────────────

/// Which end of the link the selected node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The selected node is the link source; the neighbor is the target.
    Source,
    /// The selected node is the link target; the neighbor is the source.
    Target,
}

/// One neighbor in the selection panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub node_id: NodeId,
    pub label: String,
    pub kind: EntityKind,
    pub score: Option<f64>,
    pub direction: Direction,
}

/// Side-panel data for the selected node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionPanel {
    pub node_id: NodeId,
    pub label: String,
    pub kind: EntityKind,
    pub score: Option<f64>,
    pub external_ref: Option<String>,
    pub connections: BTreeMap<RelationshipKind, Vec<Connection>>,
}

impl SelectionPanel {
    pub fn connection_count(&self) -> usize {
        self.connections.values().map(Vec::len).sum()
    }
}

/// Neighbors of the selected node over visible links, grouped by relationship.
pub fn selection_panel(state: &InteractionState, view: &VisibleGraph) -> Option<SelectionPanel> {
    let node = view.node(state.selected.as_ref()?.as_str())?;
    let graph = view.graph();

    let mut connections: BTreeMap<RelationshipKind, Vec<Connection>> = BTreeMap::new();
    for link in view.incident_links(node.index) {
        let (other, direction) = if link.source == node.index {
            (link.target, Direction::Source)
        } else {
            (link.source, Direction::Target)
        };
        let neighbor = &graph.nodes[other];
        connections
            .entry(link.relationship)
            .or_default()
            .push(Connection {
                node_id: neighbor.id.clone(),
                label: neighbor.label.clone(),
                kind: neighbor.kind,
                score: neighbor.score,
                direction,
            });
    }

    Some(SelectionPanel {
        node_id: node.id.clone(),
        label: node.label.clone(),
        kind: node.kind,
        score: node.score,
        external_ref: node.external_ref.clone(),
        connections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RelationshipFilter;
    use crate::graph::tests::graph;
    use std::sync::Arc;

    fn view(filter: RelationshipFilter) -> VisibleGraph {
        let g = graph(
            &[
                ("A", "artist"),
                ("B", "artist"),
                ("C", "artist"),
                ("P", "producer"),
                ("L", "label"),
            ],
            &[
                ("A", "B", "similar_artist"),
                ("P", "A", "produced_by"),
                ("A", "L", "signed_to"),
                ("C", "P", "produced_by"),
            ],
        );
        VisibleGraph::derive(Arc::new(g), filter)
    }

    fn hover(id: &str, view: &VisibleGraph) -> InteractionState {
        reduce(
            &InteractionState::default(),
            &InteractionEvent::HoverEnter(NodeId::from(id)),
            view,
        )
        .unwrap()
    }

    #[test]
    fn test_hover_dims_everything_outside_adjacency() {
        let mut filter = RelationshipFilter::new();
        filter.toggle(RelationshipKind::ProducedBy);
        filter.toggle(RelationshipKind::SignedTo);
        let v = view(filter);

        let state = hover("A", &v);
        let highlight = Highlight::derive(&state, &v);
        assert_eq!(highlight.adjacency(), Some(&BTreeSet::from([0, 1])));

        // C is the only other visible node (retained isolated artist).
        assert!(!highlight.node_dimmed(0));
        assert!(!highlight.node_dimmed(1));
        assert!(highlight.node_dimmed(2));
        for link in v.links() {
            assert!(!highlight.link_dimmed(link));
        }
    }

    #[test]
    fn test_hover_exit_clears_dimming() {
        let v = view(RelationshipFilter::new());
        let state = hover("A", &v);
        let state = reduce(&state, &InteractionEvent::HoverExit, &v).unwrap();
        let highlight = Highlight::derive(&state, &v);

        assert!(!highlight.is_active());
        assert!(v.node_indices().iter().all(|&i| !highlight.node_dimmed(i)));
        assert!(v.links().all(|l| !highlight.link_dimmed(l)));
    }

    #[test]
    fn test_link_dimming_and_labels() {
        let v = view(RelationshipFilter::new());
        let state = hover("P", &v);
        let highlight = Highlight::derive(&state, &v);
        let g = v.graph();

        // P touches A and C; the A-B link leaves the set.
        assert!(highlight.link_dimmed(&g.links[0]));
        assert!(!highlight.link_dimmed(&g.links[1]));
        assert!(highlight.label_visible(&g.links[1], 2.0, 1.5));
        assert!(!highlight.label_visible(&g.links[1], 1.0, 1.5));
        assert!(!highlight.label_visible(&g.links[0], 2.0, 1.5));
    }

    #[test]
    fn test_hidden_node_cannot_be_selected_or_hovered() {
        let mut filter = RelationshipFilter::new();
        filter.toggle(RelationshipKind::SignedTo);
        let v = view(filter);
        let state = InteractionState::default();

        let err = reduce(&state, &InteractionEvent::NodeClick(NodeId::from("L")), &v).unwrap_err();
        assert!(matches!(err, NetworkError::NodeNotVisible { ref node_id } if node_id == "L"));
        assert!(reduce(&state, &InteractionEvent::HoverEnter(NodeId::from("L")), &v).is_err());
    }

    #[test]
    fn test_hover_and_selection_are_independent() {
        let v = view(RelationshipFilter::new());
        let state = reduce(
            &InteractionState::default(),
            &InteractionEvent::NodeClick(NodeId::from("B")),
            &v,
        )
        .unwrap();
        let state = reduce(&state, &InteractionEvent::HoverEnter(NodeId::from("C")), &v).unwrap();
        assert_eq!(state.selected, Some(NodeId::from("B")));
        assert_eq!(state.hovered, Some(NodeId::from("C")));

        let state = reduce(&state, &InteractionEvent::ClearSelection, &v).unwrap();
        assert_eq!(state.selected, None);
        assert_eq!(state.hovered, Some(NodeId::from("C")));
    }

    #[test]
    fn test_selection_panel_groups_by_relationship() {
        let v = view(RelationshipFilter::new());
        let state = InteractionState {
            hovered: None,
            selected: Some(NodeId::from("A")),
        };
        let panel = selection_panel(&state, &v).unwrap();

        assert_eq!(panel.label, "A");
        assert_eq!(panel.connection_count(), 3);
        let produced = &panel.connections[&RelationshipKind::ProducedBy];
        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].node_id, NodeId::from("P"));
        assert_eq!(produced[0].kind, EntityKind::Producer);
        assert_eq!(produced[0].direction, Direction::Target);

        let signed = &panel.connections[&RelationshipKind::SignedTo];
        assert_eq!(signed[0].direction, Direction::Source);
        assert!(!panel.connections.contains_key(&RelationshipKind::BookedBy));
    }

    #[test]
    fn test_selection_panel_follows_visible_links() {
        let mut filter = RelationshipFilter::new();
        filter.toggle(RelationshipKind::SimilarArtist);
        let v = view(filter);
        let state = InteractionState {
            hovered: None,
            selected: Some(NodeId::from("A")),
        };
        let panel = selection_panel(&state, &v).unwrap();
        assert!(!panel.connections.contains_key(&RelationshipKind::SimilarArtist));
        assert_eq!(panel.connection_count(), 2);
    }

    #[test]
    fn test_reconcile_drops_hidden_ids() {
        let v = view(RelationshipFilter::new());
        let state = InteractionState {
            hovered: Some(NodeId::from("L")),
            selected: Some(NodeId::from("B")),
        };

        let mut filter = RelationshipFilter::new();
        filter.toggle(RelationshipKind::SignedTo);
        let narrowed = view(filter);

        assert_eq!(reconcile(&state, &v), state);
        let reconciled = reconcile(&state, &narrowed);
        assert_eq!(reconciled.hovered, None);
        assert_eq!(reconciled.selected, Some(NodeId::from("B")));
    }

    #[test]
    fn test_state_serializes() {
        let state = InteractionState {
            hovered: Some(NodeId::from("A")),
            selected: None,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"hovered":"A","selected":null}"#);
    }

    #[test]
    fn test_direction_serializes_as_link_end() {
        assert_eq!(serde_json::to_string(&Direction::Source).unwrap(), r#""source""#);
        assert_eq!(serde_json::to_string(&Direction::Target).unwrap(), r#""target""#);
    }
}
