//! # Navmap Editor
//!
//! The editing engine behind a multi-floor indoor navigation map editor. A
//! user places nodes (waypoints) over floor-plan images, joins them with
//! links (walkable edges), outlines rooms as polygons of nodes, and calibrates
//! true north from two nodes. The result is exported as a portable
//! navigation-graph document.
//!
//! ## Components
//! - **Identifier allocation**: global ids and per-floor sequence numbers
//! - **Graph store**: validated mutations, including link splitting
//! - **Snap engine**: axis alignment to nearby geometry
//! - **View transform**: pan/zoom mapping between viewport and image
//! - **History**: snapshot undo/redo with branch discarding
//! - **Serializer**: lossless conversion to and from the wire document
//!
//! Rendering, input capture and byte transport are left to the caller, which
//! drives everything through [`EditorSession`].

#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod document;
pub mod editor;
pub mod error;
pub mod serializer;
mod types;

// Re-export public types and functions
pub use config::EditorConfig;
pub use document::WireDocument;
pub use editor::{
    EditorSession, GraphStore, History, HistoryEntry, IdAllocator, LinkPickOutcome, SnapEngine,
    SnapModifiers, ViewTransform,
};
pub use error::{EditorError, EditorResult, EntityKind};
pub use serializer::{from_document, from_json, to_document, to_json, LoadedProject};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_default() {
        let session = EditorSession::default();
        assert!(session.graph().nodes.is_empty());
        assert_eq!(session.settings().floor_count(), constants::DEFAULT_FLOOR_COUNT);
        assert_eq!(session.selection(), &Selection::None);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_error_messages() {
        let err = EditorError::UnknownId {
            kind: EntityKind::Link,
            id: "lk_9".into(),
        };
        assert_eq!(err.to_string(), "unknown link id: lk_9");
        assert_eq!(
            EditorError::TooFewVertices(2).to_string(),
            "polygon needs at least 3 vertices, got 2"
        );
    }
}
