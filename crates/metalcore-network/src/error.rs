//! Error types for the metalcore-network crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Graph data error: {0}")]
    Model(#[from] metalcore_core::ModelError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] metalcore_client::FetchError),

    #[error("Node not visible: {node_id}")]
    NodeNotVisible { node_id: String },

    #[error("Node {node_id} has no profile to open")]
    NoProfile { node_id: String },

    #[error("Config error: {0}")]
    Config(#[from] metalcore_core::ConfigError),

    #[error("Session closed")]
    SessionClosed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
