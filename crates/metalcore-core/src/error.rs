use thiserror::Error;

/// Contract violations in graph data received from the backend.
///
/// None of these are coerced to a fallback: an unknown kind means the backend
/// drifted from the closed enumerations and the load must fail visibly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Malformed graph: link {link_index} ({source_id} -> {target_id}) references missing node {missing_id}")]
    MalformedGraph {
        link_index: usize,
        source_id: String,
        target_id: String,
        missing_id: String,
    },

    #[error("Malformed graph: duplicate node id {id}")]
    DuplicateNode { id: String },

    #[error("Unknown relationship kind: {value}")]
    UnknownRelationship { value: String },

    #[error("Unknown entity kind: {value}")]
    UnknownEntityKind { value: String },
}

impl ModelError {
    /// Whether the error is a structural violation of the graph invariants
    /// rather than an out-of-vocabulary value.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ModelError::MalformedGraph { .. } | ModelError::DuplicateNode { .. }
        )
    }
}

/// Errors while loading or validating dashboard configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
