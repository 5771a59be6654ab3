//! Core domain types for the artist relationship graph.
//!
//! The kind enumerations are closed: parsing anything outside them fails with
//! a [`ModelError`] instead of falling back to a default bucket.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

// ── Identifiers ───────────────────────────────────────────────────

/// Identifier of a node, unique within one fetched graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ── Entity Kinds ──────────────────────────────────────────────────

/// The category of a graph node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Artist,
    Producer,
    Label,
    Management,
    Agency,
}

impl EntityKind {
    pub const ALL: [Self; 5] = [
        Self::Artist,
        Self::Producer,
        Self::Label,
        Self::Management,
        Self::Agency,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Producer => "producer",
            Self::Label => "label",
            Self::Management => "management",
            Self::Agency => "agency",
        }
    }

    pub fn is_artist(self) -> bool {
        self == Self::Artist
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ModelError::UnknownEntityKind {
                value: s.to_string(),
            })
    }
}

// ── Relationship Kinds ────────────────────────────────────────────

/// The category of a graph edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    ProducedBy,
    SharedProducer,
    SimilarArtist,
    SignedTo,
    ManagedBy,
    BookedBy,
    RelatedArtist,
}

impl RelationshipKind {
    /// Number of relationship kinds.
    pub const COUNT: usize = 7;

    pub const ALL: [Self; Self::COUNT] = [
        Self::ProducedBy,
        Self::SharedProducer,
        Self::SimilarArtist,
        Self::SignedTo,
        Self::ManagedBy,
        Self::BookedBy,
        Self::RelatedArtist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProducedBy => "produced_by",
            Self::SharedProducer => "shared_producer",
            Self::SimilarArtist => "similar_artist",
            Self::SignedTo => "signed_to",
            Self::ManagedBy => "managed_by",
            Self::BookedBy => "booked_by",
            Self::RelatedArtist => "related_artist",
        }
    }

    /// Dense position in [`RelationshipKind::ALL`], used for flag arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ModelError::UnknownRelationship {
                value: s.to_string(),
            })
    }
}

// ── Wire Types ────────────────────────────────────────────────────

/// A node as returned by `GET /api/network/graph`.
///
/// `kind` stays a string here so that out-of-vocabulary values reach the
/// model builder and fail there with a typed error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, alias = "spotify_id", skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
}

/// A link as returned by `GET /api/network/graph`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawLink {
    pub source: String,
    pub target: String,
    pub relationship: String,
}

/// The full response body of a graph query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}
