//! Visible node derivation.
//!
//! Nodes are kept when a visible link touches them. Outside artist-only mode,
//! artists are kept even when every one of their links was filtered out, so a
//! searched-for artist never vanishes from the view. Auxiliary entities
//! (producers, labels, management, agencies) only matter as connectors and are
//! dropped once disconnected.

use crate::graph::Graph;

/// Indices of the nodes to show, in graph order.
pub fn visible_nodes(graph: &Graph, visible_links: &[usize], artist_only: bool) -> Vec<usize> {
    let mut connected = vec![false; graph.node_count()];
    for &link_idx in visible_links {
        let link = &graph.links[link_idx];
        connected[link.source] = true;
        connected[link.target] = true;
    }

    graph
        .nodes
        .iter()
        .filter(|node| {
            let linked = connected[node.index];
            if artist_only {
                linked && node.kind.is_artist()
            } else {
                linked || node.kind.is_artist()
            }
        })
        .map(|node| node.index)
        .collect()
}
