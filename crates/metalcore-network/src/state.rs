//! Dashboard state for the network view.
//!
//! `NetworkState` is the single writer. It folds [`UserAction`]s and fetch
//! completions into the query controller, the relationship filter and the
//! interaction state, and reports the side effects the caller must run.
//! Nothing here performs I/O.

use std::sync::Arc;
use std::time::Duration;

use metalcore_client::FetchError;
use metalcore_core::{Navigation, NetworkConfig, NodeId, RawGraph, UserAction};
use tokio::time::Instant;

use crate::debounce::Debouncer;
use crate::error::{NetworkError, Result};
use crate::filter::RelationshipFilter;
use crate::graph::{Graph, Node};
use crate::interaction::{self, InteractionEvent, InteractionState, SelectionPanel};
use crate::recenter::{Completion, FetchRequest, LoadStatus, LoadedGraph, RecenterController};
use crate::scene::Scene;
use crate::view::{ViewCache, VisibleGraph};

/// Work the caller must carry out after a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run this query; feed the result back through [`NetworkState::complete_fetch`].
    Fetch(FetchRequest),
    /// Call [`NetworkState::poll_search`] at (or after) this instant.
    ScheduleSearch(Instant),
    /// Hand control to the host page.
    Navigate(Navigation),
}

#[derive(Debug)]
struct PanelMemo {
    view: Arc<VisibleGraph>,
    selected: Option<NodeId>,
    panel: Option<SelectionPanel>,
}

#[derive(Debug)]
pub struct NetworkState {
    recenter: RecenterController,
    filter: RelationshipFilter,
    interaction: InteractionState,
    debouncer: Debouncer,
    views: ViewCache,
    panel_memo: Option<PanelMemo>,
    empty: Arc<Graph>,
    label_zoom_threshold: f64,
    stale_discarded: u64,
}

impl NetworkState {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            recenter: RecenterController::new(config),
            filter: RelationshipFilter::new(),
            interaction: InteractionState::default(),
            debouncer: Debouncer::new(Duration::from_millis(config.search_debounce_ms)),
            views: ViewCache::default(),
            panel_memo: None,
            empty: Arc::new(Graph::default()),
            label_zoom_threshold: config.label_zoom_threshold,
            stale_discarded: 0,
        }
    }

    /// Start centered on `center` rather than the overview.
    pub fn with_center(mut self, center: Option<&str>) -> Self {
        self.recenter = self.recenter.with_center(center);
        self
    }

    /// Start with a different relationship filter.
    pub fn with_filter(mut self, filter: RelationshipFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Issue the initial load.
    pub fn refresh(&mut self) -> FetchRequest {
        self.recenter.refresh()
    }

    /// Apply one user action.
    ///
    /// Errors leave the state unchanged.
    pub fn dispatch(&mut self, action: UserAction, now: Instant) -> Result<Vec<Effect>> {
        tracing::debug!(?action, "Dispatch");
        let effects = match action {
            UserAction::ToggleRelationship { relationship } => {
                let mut filter = self.filter;
                let enabled = filter.toggle_named(&relationship)?;
                tracing::debug!(%relationship, enabled, "Relationship toggled");
                self.set_filter(filter);
                Vec::new()
            }
            UserAction::SetArtistOnly { enabled } => {
                let mut filter = self.filter;
                filter.set_artist_only(enabled);
                self.set_filter(filter);
                Vec::new()
            }
            UserAction::ShowAllRelationships => {
                let mut filter = self.filter;
                filter.show_all();
                self.set_filter(filter);
                Vec::new()
            }

            UserAction::HoverEnter { node_id } => {
                self.interact(InteractionEvent::HoverEnter(node_id))?;
                Vec::new()
            }
            UserAction::HoverExit => {
                self.interact(InteractionEvent::HoverExit)?;
                Vec::new()
            }
            UserAction::NodeClick { node_id } => {
                self.interact(InteractionEvent::NodeClick(node_id))?;
                Vec::new()
            }
            UserAction::ClearSelection => {
                self.interact(InteractionEvent::ClearSelection)?;
                Vec::new()
            }

            UserAction::SetCenter { center } => {
                self.debouncer.cancel();
                vec![Effect::Fetch(self.recenter.set_center(center.as_deref()))]
            }
            UserAction::SetDepth { depth } => {
                vec![Effect::Fetch(self.recenter.set_depth(depth))]
            }
            UserAction::SetTopN { top_n } => {
                vec![Effect::Fetch(self.recenter.set_top_n(top_n))]
            }
            UserAction::SearchInput { text } => {
                vec![Effect::ScheduleSearch(self.debouncer.push(text, now))]
            }
            UserAction::Retry => vec![Effect::Fetch(self.recenter.retry())],

            UserAction::CenterOnNode { node_id } => {
                let label = self.visible_node(&node_id, |node| node.label.clone())?;
                self.debouncer.cancel();
                let request = self.recenter.set_center(Some(&label));
                vec![
                    Effect::Fetch(request),
                    Effect::Navigate(Navigation::CenterOn { label }),
                ]
            }
            UserAction::ViewProfile { node_id } => {
                let external_ref = self
                    .visible_node(&node_id, |node| node.external_ref.clone())?
                    .ok_or_else(|| NetworkError::NoProfile {
                        node_id: node_id.to_string(),
                    })?;
                vec![Effect::Navigate(Navigation::ViewProfile { external_ref })]
            }
        };
        Ok(effects)
    }

    /// Fire the debounced search if its quiet period has elapsed.
    pub fn poll_search(&mut self, now: Instant) -> Option<FetchRequest> {
        let text = self.debouncer.due(now)?;
        tracing::debug!(text = %text, "Search settled");
        Some(self.recenter.set_center(Some(&text)))
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Feed a fetch result. An applied graph resets hover and selection.
    pub fn complete_fetch(
        &mut self,
        seq: u64,
        result: std::result::Result<RawGraph, FetchError>,
    ) -> Completion {
        let completion = self.recenter.complete(seq, result);
        match &completion {
            Completion::Applied => self.interaction = InteractionState::default(),
            Completion::Stale { .. } => self.stale_discarded += 1,
            Completion::Failed(_) => {}
        }
        completion
    }

    // ── Derived views ─────────────────────────────────────────

    /// The current visible graph (memoized).
    pub fn view(&mut self) -> Arc<VisibleGraph> {
        let graph = self
            .recenter
            .loaded()
            .map(|loaded| loaded.graph.clone())
            .unwrap_or_else(|| self.empty.clone());
        self.views.get(&graph, self.filter.snapshot())
    }

    pub fn scene(&mut self) -> Scene {
        let view = self.view();
        Scene::project(&view, &self.interaction, self.label_zoom_threshold)
    }

    /// Side-panel data for the selected node, recomputed only when the
    /// visible graph or the selection changed.
    pub fn panel(&mut self) -> Option<SelectionPanel> {
        let view = self.view();
        if let Some(memo) = &self.panel_memo {
            if Arc::ptr_eq(&memo.view, &view) && memo.selected == self.interaction.selected {
                return memo.panel.clone();
            }
        }
        let panel = interaction::selection_panel(&self.interaction, &view);
        self.panel_memo = Some(PanelMemo {
            view,
            selected: self.interaction.selected.clone(),
            panel: panel.clone(),
        });
        panel
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn filter(&self) -> RelationshipFilter {
        self.filter
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn recenter(&self) -> &RecenterController {
        &self.recenter
    }

    pub fn status(&self) -> &LoadStatus {
        self.recenter.status()
    }

    pub fn loaded(&self) -> Option<&LoadedGraph> {
        self.recenter.loaded()
    }

    pub fn label_zoom_threshold(&self) -> f64 {
        self.label_zoom_threshold
    }

    /// Responses dropped because a newer request had been issued.
    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    // ── Internals ─────────────────────────────────────────────

    fn set_filter(&mut self, filter: RelationshipFilter) {
        self.filter = filter;
        let view = self.view();
        let reconciled = interaction::reconcile(&self.interaction, &view);
        if reconciled != self.interaction {
            tracing::debug!(
                hovered = ?reconciled.hovered,
                selected = ?reconciled.selected,
                "Interaction cleared by filter change"
            );
            self.interaction = reconciled;
        }
    }

    fn interact(&mut self, event: InteractionEvent) -> Result<()> {
        let view = self.view();
        self.interaction = interaction::reduce(&self.interaction, &event, &view)?;
        Ok(())
    }

    fn visible_node<T>(
        &mut self,
        id: &NodeId,
        project: impl FnOnce(&Node) -> T,
    ) -> Result<T> {
        let view = self.view();
        view.node(id.as_str())
            .map(project)
            .ok_or_else(|| NetworkError::NodeNotVisible {
                node_id: id.to_string(),
            })
    }
}
