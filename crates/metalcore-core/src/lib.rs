//! metalcore-core: Shared vocabulary for the Metalcore network dashboard.
//!
//! This crate provides the foundational types used by the fetch client and the
//! network view engine:
//! - Entity kinds (artist, producer, label, ...) and relationship kinds
//! - Raw wire types for the `/api/network/graph` response
//! - User actions and the navigation contract with the host page
//! - Configuration loading
//! - Contract errors for data that violates the closed enumerations

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::{ApiConfig, DashboardConfig, NetworkConfig};
pub use error::{ConfigError, ModelError};
pub use events::{Navigation, UserAction};
pub use types::{EntityKind, NodeId, RawGraph, RawLink, RawNode, RelationshipKind};
