//! Error types for graph editing and document loading.

use thiserror::Error;

/// The kind of entity an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A waypoint node
    Node,
    /// A walkable link between two nodes
    Link,
    /// A polygon outline
    Polygon,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Node => "node",
            Self::Link => "link",
            Self::Polygon => "polygon",
        })
    }
}

/// Errors raised by the editing engine.
///
/// Every variant is local and recoverable; the operation that returned it
/// has left the graph untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    /// A reference crosses floors, or names a floor the project does not have.
    #[error("invalid floor: {0}")]
    InvalidFloor(String),

    /// The unordered node pair is already connected.
    #[error("nodes are already connected by link {existing}")]
    DuplicateLink { existing: String },

    /// A link would connect a node to itself.
    #[error("a link cannot connect node {0} to itself")]
    SelfLink(String),

    /// A polygon has fewer than three usable vertices.
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// Lookup or mutation of an entity that does not exist.
    #[error("unknown {kind} id: {id}")]
    UnknownId { kind: EntityKind, id: String },

    /// A coordinate or scale is not a finite, usable number.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The north reference is missing nodes or has an out-of-range azimuth.
    #[error("invalid north reference: {0}")]
    InvalidNorthReference(String),

    /// Serializer input is unreadable or structurally unusable.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

impl EditorError {
    pub(crate) fn unknown(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::UnknownId {
            kind,
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedDocument(err.to_string())
    }
}

/// Result type for editing operations.
pub type EditorResult<T> = Result<T, EditorError>;
