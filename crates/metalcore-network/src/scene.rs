//! Render hand-off: the visible graph flattened into plain serializable rows.

use std::collections::BTreeMap;

use metalcore_core::{EntityKind, NodeId, RelationshipKind};
use serde::Serialize;

use crate::filter::RelationshipFilter;
use crate::interaction::{Highlight, InteractionState};
use crate::view::VisibleGraph;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub label: String,
    /// Hover text: `"<label> (<rounded score>)"` for scored nodes.
    pub tooltip: String,
    pub kind: EntityKind,
    pub score: Option<f64>,
    pub visual_weight: f64,
    pub hovered: bool,
    pub selected: bool,
    pub dimmed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneLink {
    pub source: NodeId,
    pub target: NodeId,
    pub relationship: RelationshipKind,
    pub dimmed: bool,
    /// Label may be drawn once the renderer is zoomed in far enough.
    pub label_candidate: bool,
}

/// One filter chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub enabled: bool,
    /// Links of this kind in the fetched graph, before filtering.
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub links: Vec<SceneLink>,
    pub legend: BTreeMap<RelationshipKind, LegendEntry>,
    pub artist_only: bool,
    pub label_zoom_threshold: f64,
}

impl Scene {
    pub fn project(
        view: &VisibleGraph,
        state: &InteractionState,
        label_zoom_threshold: f64,
    ) -> Self {
        let highlight = Highlight::derive(state, view);
        let graph = view.graph();
        let is = |slot: &Option<NodeId>, id: &NodeId| slot.as_ref() == Some(id);

        let nodes = view
            .nodes()
            .map(|node| SceneNode {
                id: node.id.clone(),
                label: node.label.clone(),
                tooltip: tooltip(&node.label, node.score),
                kind: node.kind,
                score: node.score,
                visual_weight: node.visual_weight,
                hovered: is(&state.hovered, &node.id),
                selected: is(&state.selected, &node.id),
                dimmed: highlight.node_dimmed(node.index),
            })
            .collect();

        let links = view
            .links()
            .map(|link| SceneLink {
                source: graph.nodes[link.source].id.clone(),
                target: graph.nodes[link.target].id.clone(),
                relationship: link.relationship,
                dimmed: highlight.link_dimmed(link),
                label_candidate: highlight.link_label_candidate(link),
            })
            .collect();

        let filter = view.filter();
        let legend = RelationshipFilter::link_counts(graph)
            .into_iter()
            .map(|(kind, count)| {
                let entry = LegendEntry {
                    enabled: filter.is_enabled(kind),
                    count,
                };
                (kind, entry)
            })
            .collect();

        Self {
            nodes,
            links,
            legend,
            artist_only: filter.artist_only(),
            label_zoom_threshold,
        }
    }
}

fn tooltip(label: &str, score: Option<f64>) -> String {
    match score {
        Some(score) if score != 0.0 => format!("{label} ({score:.0})"),
        _ => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::graph;
    use std::sync::Arc;

    fn view(filter: RelationshipFilter) -> VisibleGraph {
        let g = graph(
            &[("A", "artist"), ("B", "artist"), ("P", "producer"), ("M", "management")],
            &[("A", "B", "similar_artist"), ("A", "P", "produced_by")],
        );
        VisibleGraph::derive(Arc::new(g), filter)
    }

    #[test]
    fn test_tooltip() {
        assert_eq!(tooltip("Spiritbox", Some(87.6)), "Spiritbox (88)");
        assert_eq!(tooltip("Spiritbox", None), "Spiritbox");
        assert_eq!(tooltip("Spiritbox", Some(0.0)), "Spiritbox");
    }

    #[test]
    fn test_scene_without_hover() {
        let v = view(RelationshipFilter::new());
        let scene = Scene::project(&v, &InteractionState::default(), 1.5);

        // The isolated management node is pruned.
        let ids: Vec<_> = scene.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "P"]);
        assert!(scene.nodes.iter().all(|n| !n.dimmed && !n.hovered));
        assert!(scene.links.iter().all(|l| !l.dimmed && !l.label_candidate));
        assert_eq!(scene.label_zoom_threshold, 1.5);
    }

    #[test]
    fn test_scene_with_hover_and_selection() {
        let v = view(RelationshipFilter::new());
        let state = InteractionState {
            hovered: Some(NodeId::from("B")),
            selected: Some(NodeId::from("P")),
        };
        let scene = Scene::project(&v, &state, 1.5);

        let by_id = |id: &str| scene.nodes.iter().find(|n| n.id.as_str() == id).unwrap();
        assert!(by_id("B").hovered);
        assert!(by_id("P").selected);
        assert!(!by_id("A").dimmed);
        assert!(by_id("P").dimmed);

        let ab = &scene.links[0];
        assert_eq!((ab.source.as_str(), ab.target.as_str()), ("A", "B"));
        assert!(ab.label_candidate && !ab.dimmed);
        assert!(scene.links[1].dimmed);
    }

    #[test]
    fn test_legend_counts_whole_graph() {
        let mut filter = RelationshipFilter::new();
        filter.toggle(RelationshipKind::ProducedBy);
        let scene = Scene::project(&view(filter), &InteractionState::default(), 1.5);

        let produced = scene.legend[&RelationshipKind::ProducedBy];
        assert!(!produced.enabled);
        assert_eq!(produced.count, 1);
        assert_eq!(scene.links.len(), 1);
        assert_eq!(scene.legend.len(), RelationshipKind::ALL.len());
    }

    #[test]
    fn test_scene_serializes_kinds_as_wire_names() {
        let scene = Scene::project(&view(RelationshipFilter::new()), &InteractionState::default(), 1.5);
        let json = serde_json::to_value(&scene).unwrap();
        assert_eq!(json["nodes"][2]["kind"], "producer");
        assert_eq!(json["links"][1]["relationship"], "produced_by");
        assert!(json["legend"]["signed_to"].is_object());
    }
}
