//! User actions and the navigation contract with the host page.
//!
//! Every state change in the network view is driven by one of these actions.
//! They are serializable so that an interaction can be recorded and replayed.

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// A discrete event from the user or the page shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    // ── Filter controls ───────────────────────────────────────
    /// Flip visibility of one relationship kind (wire name, validated on dispatch).
    ToggleRelationship { relationship: String },
    /// Restrict the view to artist-to-artist links.
    SetArtistOnly { enabled: bool },
    /// Re-enable every relationship kind.
    ShowAllRelationships,

    // ── Pointer interaction ───────────────────────────────────
    HoverEnter { node_id: NodeId },
    HoverExit,
    NodeClick { node_id: NodeId },
    ClearSelection,

    // ── Query controls ────────────────────────────────────────
    /// Center button / reset button. Fetches immediately.
    SetCenter { center: Option<String> },
    SetDepth { depth: u8 },
    SetTopN { top_n: Option<u32> },
    /// Keystroke in the search box. Debounced before it recentres.
    SearchInput { text: String },
    /// Re-issue the last query after a failed load.
    Retry,

    // ── Navigation ────────────────────────────────────────────
    /// Recentre the graph on a visible node's label.
    CenterOnNode { node_id: NodeId },
    /// Open the full profile of a visible artist.
    ViewProfile { node_id: NodeId },
}

/// Control handed back to the host application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "navigate", rename_all = "snake_case")]
pub enum Navigation {
    /// The graph was recentred on this label.
    CenterOn { label: String },
    /// Route to the artist detail view keyed by this reference.
    ViewProfile { external_ref: String },
}
