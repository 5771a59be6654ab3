//! Relationship visibility toggles.
//!
//! The filter is a small `Copy` value, so a snapshot of it doubles as the
//! memoization key for the visible graph.

use std::collections::BTreeMap;

use metalcore_core::{ModelError, RelationshipKind};

use crate::graph::{Graph, Link};

/// Per-relationship toggles plus the artist-only mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationshipFilter {
    enabled: [bool; RelationshipKind::COUNT],
    artist_only: bool,
}

impl Default for RelationshipFilter {
    fn default() -> Self {
        Self {
            enabled: [true; RelationshipKind::COUNT],
            artist_only: false,
        }
    }
}

impl RelationshipFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, kind: RelationshipKind) -> bool {
        self.enabled[kind.index()]
    }

    pub fn artist_only(&self) -> bool {
        self.artist_only
    }

    /// The current state as a memoization key.
    pub fn snapshot(&self) -> Self {
        *self
    }

    /// Flip one relationship kind. Returns the new state.
    pub fn toggle(&mut self, kind: RelationshipKind) -> bool {
        let flag = &mut self.enabled[kind.index()];
        *flag = !*flag;
        *flag
    }

    /// Flip a relationship kind given by its wire name.
    pub fn toggle_named(&mut self, name: &str) -> Result<bool, ModelError> {
        let kind: RelationshipKind = name.parse()?;
        Ok(self.toggle(kind))
    }

    pub fn set_enabled(&mut self, kind: RelationshipKind, enabled: bool) {
        self.enabled[kind.index()] = enabled;
    }

    pub fn set_artist_only(&mut self, artist_only: bool) {
        self.artist_only = artist_only;
    }

    /// Re-enable every relationship kind. Artist-only mode is left as is.
    pub fn show_all(&mut self) {
        self.enabled = [true; RelationshipKind::COUNT];
    }

    /// Toggle state keyed by kind, for display.
    pub fn toggles(&self) -> BTreeMap<RelationshipKind, bool> {
        RelationshipKind::ALL
            .into_iter()
            .map(|kind| (kind, self.is_enabled(kind)))
            .collect()
    }

    /// Whether `link` passes both conditions: its kind is on, and in
    /// artist-only mode both endpoints are artists.
    pub fn allows(&self, graph: &Graph, link: &Link) -> bool {
        if !self.is_enabled(link.relationship) {
            return false;
        }
        !self.artist_only
            || (graph.nodes[link.source].kind.is_artist()
                && graph.nodes[link.target].kind.is_artist())
    }

    /// Indices of the links that survive the filter, in graph order.
    pub fn visible_links(&self, graph: &Graph) -> Vec<usize> {
        graph
            .links
            .iter()
            .filter(|link| self.allows(graph, link))
            .map(|link| link.index)
            .collect()
    }

    /// Number of links per relationship kind in the unfiltered graph.
    pub fn link_counts(graph: &Graph) -> BTreeMap<RelationshipKind, usize> {
        let mut counts: BTreeMap<RelationshipKind, usize> =
            RelationshipKind::ALL.into_iter().map(|k| (k, 0)).collect();
        for link in &graph.links {
            *counts.entry(link.relationship).or_insert(0) += 1;
        }
        counts
    }
}
