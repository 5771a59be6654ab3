//! metalcore-network: Relationship graph view engine for the Metalcore dashboard.
//!
//! Fetches an artist/producer/label subgraph from the scoring API, builds an
//! immutable in-memory graph, and derives what the force layout should draw:
//! relationship filtering, connectivity pruning with isolated-artist
//! retention, hover adjacency highlighting, node selection and recentring.
//! Responses to superseded queries are discarded by sequence number.

pub mod debounce;
pub mod error;
pub mod filter;
pub mod graph;
pub mod interaction;
pub mod prune;
pub mod recenter;
pub mod scene;
pub mod session;
pub mod state;
pub mod view;

pub use error::NetworkError;
pub use filter::RelationshipFilter;
pub use graph::{Graph, WeightConfig};
pub use interaction::{Highlight, InteractionState, SelectionPanel};
pub use recenter::{CenterResolution, Completion, FetchRequest, LoadStatus, RecenterController};
pub use scene::Scene;
pub use session::{NetworkSession, SessionHandle, SessionView};
pub use state::{Effect, NetworkState};
pub use view::{ViewCache, VisibleGraph};
