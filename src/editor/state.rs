//! Session state structures.
//!
//! [`EditorSession`] owns one open project: the graph store, its history, the
//! project settings, the view, and the transient state of in-progress
//! gestures. Nothing here is global; callers hold the session and pass it by
//! reference.

use super::canvas::ViewTransform;
use super::snap::SnapEngine;
use super::store::GraphStore;
use super::undo::History;
use crate::config::EditorConfig;
use crate::document::WireDocument;
use crate::error::EditorError;
use crate::types::*;
use egui::Pos2;

/// A node drag in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDrag {
    /// Node being moved
    pub node: NodeId,
    /// Position of the node when the drag began
    pub origin: Pos2,
}

/// Transient state of pointer gestures that span several events.
///
/// None of this is part of the history or the saved document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    /// First node picked for a new link
    pub link_start: Option<NodeId>,
    /// Vertices of the polygon being drawn
    pub polygon_draft: Vec<NodeId>,
    /// Active node drag
    pub drag: Option<NodeDrag>,
    /// Most recently placed node; reference point for the orthogonal lock
    pub last_created: Option<NodeId>,
}

impl InteractionState {
    /// Abandons every gesture in progress.
    pub fn clear_gestures(&mut self) {
        self.link_start = None;
        self.polygon_draft.clear();
        self.drag = None;
    }

    /// Forgets every reference to a node that no longer exists.
    pub(crate) fn forget_node(&mut self, id: &str) {
        if self.link_start.as_deref() == Some(id) {
            self.link_start = None;
        }
        self.polygon_draft.retain(|n| n != id);
        if self.drag.as_ref().is_some_and(|d| d.node == id) {
            self.drag = None;
        }
        if self.last_created.as_deref() == Some(id) {
            self.last_created = None;
        }
    }
}

/// Result of picking a node during two-click link creation.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkPickOutcome {
    /// The node was remembered as the first endpoint
    Started(NodeId),
    /// A new link joins the two picked nodes
    Created(Link),
    /// The same node was picked twice; nothing was created
    Cancelled,
    /// The pair is already linked; that link is now selected
    AlreadyLinked(LinkId),
    /// The pick was refused (unknown node, other floor, ...)
    Rejected(EditorError),
}

/// Saved-state bookkeeping for unsaved-changes detection.
#[derive(Debug, Clone, Default)]
pub struct FileState {
    /// Document as of the last save or load
    pub(crate) saved_document: Option<WireDocument>,
}

/// One open project and everything needed to edit it.
#[derive(Debug, Clone)]
pub struct EditorSession {
    pub(crate) config: EditorConfig,
    pub(crate) store: GraphStore,
    pub(crate) history: History,
    pub(crate) settings: ProjectSettings,
    pub(crate) snap: SnapEngine,
    pub(crate) view: ViewTransform,
    pub(crate) current_floor: FloorIndex,
    pub(crate) selection: Selection,
    pub(crate) interaction: InteractionState,
    pub(crate) file: FileState,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// A session holding an empty project.
    pub fn new(config: EditorConfig) -> Self {
        let (width, height) = config.default_image_size;
        let view = ViewTransform::new(egui::vec2(width, height), egui::vec2(width, height))
            .with_zoom_limits(config.min_zoom, config.max_zoom)
            .with_pan_speed(config.pan_speed);
        let mut session = Self {
            store: GraphStore::new().with_split_tolerance(config.split_tolerance),
            history: History::new(config.max_history),
            settings: ProjectSettings::with_floors(config.default_floor_count),
            snap: SnapEngine::new(config.snap_tolerance),
            view,
            current_floor: 0,
            selection: Selection::None,
            interaction: InteractionState::default(),
            file: FileState::default(),
            config,
        };
        session.new_project();
        session
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The graph store, for floor-scoped queries.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn graph(&self) -> &Graph {
        self.store.graph()
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn current_floor(&self) -> FloorIndex {
        self.current_floor
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// Mutable view access for pan, zoom and viewport resizing.
    pub fn view_mut(&mut self) -> &mut ViewTransform {
        &mut self.view
    }

    pub fn snap_engine(&self) -> &SnapEngine {
        &self.snap
    }

    pub fn snap_engine_mut(&mut self) -> &mut SnapEngine {
        &mut self.snap
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Intrinsic size of a floor's image, or the configured fallback.
    pub fn floor_image_size(&self, floor: FloorIndex) -> (f32, f32) {
        self.settings
            .floors
            .get(floor)
            .and_then(|f| f.image_size)
            .unwrap_or(self.config.default_image_size)
    }

    /// Points the view at the current floor's image geometry.
    pub(crate) fn sync_view_to_floor(&mut self) {
        let (width, height) = self.floor_image_size(self.current_floor);
        self.view.set_image_size(egui::vec2(width, height));
    }
}
