//! Async driver around [`NetworkState`].
//!
//! One tokio task owns the state. Actions arrive on an mpsc channel, fetches
//! run as child tasks through a [`GraphSource`], and every change publishes a
//! fresh [`SessionView`] on a watch channel. A newer fetch aborts the task of
//! the one it supersedes; responses still carry their seq, so a response that
//! slipped through before the abort is dropped by the state.
//!
//! Pointer actions are checked against the graph on screen when they arrive.
//! Callers replaying a script use [`SessionHandle::settle`] between actions
//! so each one sees the graph its predecessors loaded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metalcore_client::{FetchError, GraphQuery, GraphSource};
use metalcore_core::{Navigation, RawGraph, UserAction};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use crate::error::{NetworkError, Result};
use crate::interaction::{InteractionState, SelectionPanel};
use crate::recenter::{CenterResolution, Completion, FetchRequest, LoadStatus};
use crate::scene::Scene;
use crate::state::{Effect, NetworkState};

const ACTION_BUFFER: usize = 64;

/// Everything the page renders, published after every change.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub scene: Scene,
    pub panel: Option<SelectionPanel>,
    pub interaction: InteractionState,
    pub status: LoadStatus,
    /// Query the next (or in-flight) fetch uses.
    pub query: GraphQuery,
    /// How the center of the on-screen graph resolved.
    pub center: Option<CenterResolution>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub search_pending: bool,
    pub stale_discarded: u64,
    /// Actions the session has dispatched so far, accepted or rejected.
    pub actions_applied: u64,
    /// Last action the state rejected.
    pub last_error: Option<String>,
    pub last_navigation: Option<Navigation>,
}

type FetchResult = std::result::Result<RawGraph, FetchError>;

/// Client side of a running session.
pub struct SessionHandle {
    actions: mpsc::Sender<UserAction>,
    view: watch::Receiver<SessionView>,
    task: JoinHandle<()>,
    sent: u64,
}

impl SessionHandle {
    pub async fn send(&mut self, action: UserAction) -> Result<()> {
        self.actions
            .send(action)
            .await
            .map_err(|_| NetworkError::SessionClosed)?;
        self.sent += 1;
        Ok(())
    }

    /// Latest published view.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Wait until a published view satisfies `predicate`.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&SessionView) -> bool,
    ) -> Result<SessionView> {
        let view = self
            .view
            .wait_for(|view| predicate(view))
            .await
            .map_err(|_| NetworkError::SessionClosed)?;
        Ok(view.clone())
    }

    /// Wait until every action sent so far has been dispatched, no fetch is
    /// loading and no search is waiting out its quiet period.
    pub async fn settle(&mut self) -> Result<SessionView> {
        let sent = self.sent;
        self.wait_for(|view| {
            view.actions_applied >= sent
                && !view.search_pending
                && !matches!(view.status, LoadStatus::Loading { .. })
        })
        .await
    }

    /// Stop accepting actions, let outstanding fetches and searches finish,
    /// and return the final view.
    pub async fn close(self) -> Result<SessionView> {
        let SessionHandle {
            actions,
            view,
            task,
            ..
        } = self;
        drop(actions);
        task.await.map_err(|_| NetworkError::SessionClosed)?;
        let last = view.borrow().clone();
        Ok(last)
    }
}

pub struct NetworkSession {
    state: NetworkState,
    source: Arc<dyn GraphSource>,
    actions: mpsc::Receiver<UserAction>,
    view_tx: watch::Sender<SessionView>,
    responses_tx: mpsc::UnboundedSender<(u64, FetchResult)>,
    responses_rx: mpsc::UnboundedReceiver<(u64, FetchResult)>,
    in_flight: Option<(u64, JoinHandle<()>)>,
    last_error: Option<String>,
    last_navigation: Option<Navigation>,
    actions_applied: u64,
}

impl NetworkSession {
    /// Spawn the driver and issue the initial load.
    pub fn spawn(source: Arc<dyn GraphSource>, mut state: NetworkState) -> SessionHandle {
        let (actions_tx, actions_rx) = mpsc::channel(ACTION_BUFFER);
        let (responses_tx, responses_rx) = mpsc::unbounded_channel();
        // Issued before the first publish so no view ever shows an idle session.
        let initial = state.refresh();
        let (view_tx, view_rx) = watch::channel(snapshot(&mut state, None, None, 0));

        let session = NetworkSession {
            state,
            source,
            actions: actions_rx,
            view_tx,
            responses_tx,
            responses_rx,
            in_flight: None,
            last_error: None,
            last_navigation: None,
            actions_applied: 0,
        };
        let task = tokio::spawn(session.run(initial));

        SessionHandle {
            actions: actions_tx,
            view: view_rx,
            task,
            sent: 0,
        }
    }

    async fn run(mut self, initial: FetchRequest) {
        self.start_fetch(initial);
        self.publish();

        let mut accepting = true;
        loop {
            if !accepting && self.in_flight.is_none() && self.state.search_deadline().is_none() {
                break;
            }
            let deadline = self.state.search_deadline();

            tokio::select! {
                action = self.actions.recv(), if accepting => match action {
                    Some(action) => self.handle_action(action),
                    None => {
                        tracing::debug!("Action channel closed, draining");
                        accepting = false;
                    }
                },
                Some((seq, result)) = self.responses_rx.recv() => {
                    self.handle_response(seq, result);
                }
                (seq, joined) = join_in_flight(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.handle_joined(seq, joined);
                }
                _ = sleep_until(deadline) => {
                    if let Some(request) = self.state.poll_search(Instant::now()) {
                        self.start_fetch(request);
                    }
                }
            }
            self.publish();
        }

        tracing::debug!(stale = self.state.stale_discarded(), "Session finished");
    }

    fn handle_action(&mut self, action: UserAction) {
        self.actions_applied += 1;
        match self.state.dispatch(action, Instant::now()) {
            Ok(effects) => {
                self.last_error = None;
                for effect in effects {
                    match effect {
                        Effect::Fetch(request) => self.start_fetch(request),
                        // The loop picks the deadline up from the state.
                        Effect::ScheduleSearch(_) => {}
                        Effect::Navigate(navigation) => {
                            tracing::info!(?navigation, "Navigation");
                            self.last_navigation = Some(navigation);
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Action rejected");
                self.last_error = Some(err.to_string());
            }
        }
    }

    fn handle_response(&mut self, seq: u64, result: FetchResult) {
        if self.in_flight.as_ref().is_some_and(|(s, _)| *s == seq) {
            self.in_flight = None;
        }
        match self.state.complete_fetch(seq, result) {
            Completion::Applied | Completion::Stale { .. } => {}
            Completion::Failed(err) => {
                tracing::warn!(seq, error = %err, "Fetch failed; keeping previous graph");
            }
        }
    }

    /// The in-flight task ended. Its response, if it sent one, is already
    /// queued; a task that died without answering fails the request.
    fn handle_joined(&mut self, seq: u64, joined: std::result::Result<(), JoinError>) {
        self.in_flight = None;
        while let Ok((queued, result)) = self.responses_rx.try_recv() {
            self.handle_response(queued, result);
        }
        if let Err(err) = joined {
            if err.is_panic() {
                tracing::error!(seq, "Fetch task panicked");
                self.handle_response(
                    seq,
                    Err(FetchError::Transport("fetch task panicked".to_string())),
                );
            }
        }
    }

    fn start_fetch(&mut self, request: FetchRequest) {
        if let Some((seq, handle)) = self.in_flight.take() {
            tracing::debug!(superseded = seq, seq = request.seq, "Aborting superseded fetch");
            handle.abort();
        }

        let source = self.source.clone();
        let tx = self.responses_tx.clone();
        let seq = request.seq;
        let handle = tokio::spawn(async move {
            let result = source.fetch_graph(&request.query).await;
            // The session may have finished already.
            let _ = tx.send((request.seq, result));
        });
        self.in_flight = Some((seq, handle));
    }

    fn publish(&mut self) {
        let view = snapshot(
            &mut self.state,
            self.last_error.clone(),
            self.last_navigation.clone(),
            self.actions_applied,
        );
        self.view_tx.send_replace(view);
    }
}

fn snapshot(
    state: &mut NetworkState,
    last_error: Option<String>,
    last_navigation: Option<Navigation>,
    actions_applied: u64,
) -> SessionView {
    let loaded = state.loaded();
    let center = loaded.map(|l| l.center.clone());
    let fetched_at = loaded.map(|l| l.fetched_at);

    SessionView {
        scene: state.scene(),
        panel: state.panel(),
        interaction: state.interaction().clone(),
        status: state.status().clone(),
        query: state.recenter().query(),
        center,
        fetched_at,
        search_pending: state.search_deadline().is_some(),
        stale_discarded: state.stale_discarded(),
        actions_applied,
        last_error,
        last_navigation,
    }
}

async fn join_in_flight(
    in_flight: &mut Option<(u64, JoinHandle<()>)>,
) -> (u64, std::result::Result<(), JoinError>) {
    match in_flight {
        Some((seq, handle)) => (*seq, handle.await),
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{raw_link, raw_node};
    use async_trait::async_trait;
    use metalcore_core::{NetworkConfig, NodeId};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Clone)]
    struct Reply {
        gate: Option<Arc<Notify>>,
        delay: Option<Duration>,
        panics: bool,
        result: FetchResult,
    }

    impl Reply {
        fn ok(graph: RawGraph) -> Self {
            Self {
                gate: None,
                delay: None,
                panics: false,
                result: Ok(graph),
            }
        }

        fn gated(graph: RawGraph, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::ok(graph)
            }
        }

        fn slow(graph: RawGraph, delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::ok(graph)
            }
        }

        fn err(err: FetchError) -> Self {
            Self {
                result: Err(err),
                ..Self::ok(RawGraph::default())
            }
        }

        fn panicking() -> Self {
            Self {
                panics: true,
                ..Self::ok(RawGraph::default())
            }
        }
    }

    /// Replies keyed by query center. The last reply for a key repeats.
    #[derive(Default)]
    struct ScriptedSource {
        replies: Mutex<HashMap<Option<String>, VecDeque<Reply>>>,
        queries: Mutex<Vec<GraphQuery>>,
    }

    impl ScriptedSource {
        fn reply(self, center: Option<&str>, reply: Reply) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry(center.map(str::to_string))
                .or_default()
                .push_back(reply);
            self
        }

        fn queries(&self) -> Vec<GraphQuery> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GraphSource for ScriptedSource {
        async fn fetch_graph(&self, query: &GraphQuery) -> FetchResult {
            self.queries.lock().unwrap().push(query.clone());
            let reply = {
                let mut replies = self.replies.lock().unwrap();
                let queue = replies.get_mut(&query.center);
                match queue {
                    Some(queue) if queue.len() > 1 => queue.pop_front(),
                    Some(queue) => queue.front().cloned(),
                    None => None,
                }
            };
            let Some(reply) = reply else {
                return Err(FetchError::Status {
                    status: 404,
                    body: "no script".to_string(),
                });
            };
            if let Some(gate) = reply.gate {
                gate.notified().await;
            }
            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }
            if reply.panics {
                panic!("graph source blew up");
            }
            reply.result
        }
    }

    fn single(id: &str) -> RawGraph {
        RawGraph {
            nodes: vec![raw_node(id, "artist", None)],
            links: vec![],
        }
    }

    fn overview() -> RawGraph {
        let mut a = raw_node("A", "artist", Some(64.0));
        a.external_ref = Some("sp-a".to_string());
        RawGraph {
            nodes: vec![a, raw_node("P", "producer", None)],
            links: vec![raw_link("A", "P", "produced_by")],
        }
    }

    fn config() -> NetworkConfig {
        NetworkConfig {
            search_debounce_ms: 40,
            ..NetworkConfig::default()
        }
    }

    fn start(source: &Arc<ScriptedSource>) -> SessionHandle {
        let source: Arc<dyn GraphSource> = source.clone();
        NetworkSession::spawn(source, NetworkState::new(&config()))
    }

    fn node_ids(view: &SessionView) -> Vec<&str> {
        view.scene.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_initial_load() {
        let source = Arc::new(ScriptedSource::default().reply(None, Reply::ok(overview())));
        let mut handle = start(&source);

        let view = handle
            .wait_for(|v| v.status == LoadStatus::Ready)
            .await
            .unwrap();
        assert_eq!(node_ids(&view), vec!["A", "P"]);
        assert_eq!(view.center, Some(CenterResolution::Overview));
        assert!(view.fetched_at.is_some());
        assert_eq!(source.queries(), vec![GraphQuery::overview(2, Some(50))]);
    }

    #[tokio::test]
    async fn test_superseded_fetch_never_lands() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(
            ScriptedSource::default()
                .reply(None, Reply::gated(single("OLD"), gate.clone()))
                .reply(Some("NEW"), Reply::ok(single("NEW"))),
        );
        let mut handle = start(&source);

        handle
            .send(UserAction::SetCenter {
                center: Some("NEW".to_string()),
            })
            .await
            .unwrap();
        let view = handle
            .wait_for(|v| v.status == LoadStatus::Ready)
            .await
            .unwrap();
        assert_eq!(node_ids(&view), vec!["NEW"]);

        // Releasing the old request changes nothing.
        gate.notify_waiters();
        let last = handle.close().await.unwrap();
        assert_eq!(node_ids(&last), vec!["NEW"]);
        assert_eq!(
            last.center,
            Some(CenterResolution::Resolved {
                node_id: NodeId::from("NEW")
            })
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_graph_and_retry_recovers() {
        let source = Arc::new(
            ScriptedSource::default()
                .reply(None, Reply::ok(overview()))
                .reply(None, Reply::err(FetchError::Transport("refused".to_string())))
                .reply(None, Reply::ok(single("A"))),
        );
        let mut handle = start(&source);
        handle
            .wait_for(|v| v.status == LoadStatus::Ready)
            .await
            .unwrap();

        handle.send(UserAction::SetDepth { depth: 3 }).await.unwrap();
        let failed = handle
            .wait_for(|v| matches!(v.status, LoadStatus::Failed { .. }))
            .await
            .unwrap();
        assert_eq!(node_ids(&failed), vec!["A", "P"]);

        handle.send(UserAction::Retry).await.unwrap();
        let last = handle.close().await.unwrap();
        assert_eq!(last.status, LoadStatus::Ready);
        assert_eq!(node_ids(&last), vec!["A"]);
        assert_eq!(last.query.depth, 3);
    }

    #[tokio::test]
    async fn test_search_input_is_debounced() {
        let source = Arc::new(
            ScriptedSource::default()
                .reply(None, Reply::ok(overview()))
                .reply(Some("Lorna"), Reply::ok(single("Lorna"))),
        );
        let mut handle = start(&source);

        for text in ["L", "Lor", "Lorna"] {
            handle
                .send(UserAction::SearchInput {
                    text: text.to_string(),
                })
                .await
                .unwrap();
        }
        let last = handle.close().await.unwrap();

        assert_eq!(node_ids(&last), vec!["Lorna"]);
        assert!(!last.search_pending);
        let centers: Vec<_> = source.queries().into_iter().map(|q| q.center).collect();
        assert_eq!(centers, vec![None, Some("Lorna".to_string())]);
    }

    #[tokio::test]
    async fn test_interaction_and_navigation() {
        let source = Arc::new(ScriptedSource::default().reply(None, Reply::ok(overview())));
        let mut handle = start(&source);
        handle
            .wait_for(|v| v.status == LoadStatus::Ready)
            .await
            .unwrap();

        handle
            .send(UserAction::NodeClick {
                node_id: "A".into(),
            })
            .await
            .unwrap();
        handle
            .send(UserAction::HoverEnter {
                node_id: "ghost".into(),
            })
            .await
            .unwrap();
        handle
            .send(UserAction::ViewProfile {
                node_id: "A".into(),
            })
            .await
            .unwrap();

        let view = handle
            .wait_for(|v| v.last_navigation.is_some())
            .await
            .unwrap();
        assert_eq!(
            view.last_navigation,
            Some(Navigation::ViewProfile {
                external_ref: "sp-a".to_string()
            })
        );
        assert_eq!(view.panel.as_ref().map(|p| p.connection_count()), Some(1));
        assert_eq!(view.interaction.hovered, None);

        handle
            .send(UserAction::HoverEnter {
                node_id: "ghost".into(),
            })
            .await
            .unwrap();
        let view = handle
            .wait_for(|v| v.last_error.is_some())
            .await
            .unwrap();
        assert!(view.last_error.unwrap().contains("ghost"));
        handle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_settle_lets_click_see_loaded_graph() {
        let source = Arc::new(
            ScriptedSource::default()
                .reply(None, Reply::slow(overview(), Duration::from_millis(20)))
                .reply(Some("P"), Reply::slow(overview(), Duration::from_millis(20))),
        );
        let mut handle = start(&source);

        let view = handle.settle().await.unwrap();
        assert_eq!(view.status, LoadStatus::Ready);

        handle
            .send(UserAction::NodeClick {
                node_id: "A".into(),
            })
            .await
            .unwrap();
        let view = handle.settle().await.unwrap();
        assert_eq!(view.interaction.selected, Some(NodeId::from("A")));
        assert_eq!(view.last_error, None);

        // A recentre resets the selection; the next click lands on the new graph.
        handle
            .send(UserAction::SetCenter {
                center: Some("P".to_string()),
            })
            .await
            .unwrap();
        let view = handle.settle().await.unwrap();
        assert_eq!(
            view.center,
            Some(CenterResolution::Resolved {
                node_id: NodeId::from("P")
            })
        );
        assert_eq!(view.interaction.selected, None);

        handle
            .send(UserAction::NodeClick {
                node_id: "P".into(),
            })
            .await
            .unwrap();
        let last = handle.close().await.unwrap();
        assert_eq!(last.interaction.selected, Some(NodeId::from("P")));
        assert_eq!(last.actions_applied, 3);
    }

    #[tokio::test]
    async fn test_panicking_fetch_fails_instead_of_hanging() {
        let source = Arc::new(ScriptedSource::default().reply(None, Reply::panicking()));
        let handle = start(&source);

        let last = tokio::time::timeout(Duration::from_secs(5), handle.close())
            .await
            .expect("session did not finish")
            .unwrap();
        assert!(matches!(
            last.status,
            LoadStatus::Failed { ref detail, .. } if detail.contains("panicked")
        ));
    }
}
