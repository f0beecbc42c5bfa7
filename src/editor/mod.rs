//! The stateful editing engine.
//!
//! Each user gesture maps to one method on [`EditorSession`]: the method
//! performs one graph-store mutation and records one history checkpoint.
//! Continuous gestures (drags) only checkpoint when they finish.

pub mod canvas;
mod file_ops;
pub mod ids;
pub mod snap;
mod state;
pub mod store;
pub mod undo;

pub use canvas::ViewTransform;
pub use ids::IdAllocator;
pub use snap::{SnapCandidates, SnapEngine, SnapModifiers, SnapOutcome};
pub use state::{EditorSession, FileState, InteractionState, LinkPickOutcome, NodeDrag};
pub use store::{GraphStore, LinkPatch, LinkSplit, NodeCreated, NodePatch, PolygonPatch};
pub use undo::{History, HistoryEntry};

use crate::constants::MAX_FLOORS;
use crate::error::{EditorError, EditorResult, EntityKind};
use crate::types::*;
use egui::Pos2;

impl EditorSession {
    /// Records the live state as a new history entry.
    fn checkpoint(&mut self) {
        let entry = self.snapshot();
        self.history.checkpoint(entry);
    }

    pub(crate) fn snapshot(&self) -> HistoryEntry {
        HistoryEntry {
            graph: self.store.graph().clone(),
            current_floor: self.current_floor,
            selection: self.selection.clone(),
        }
    }

    fn apply_entry(&mut self, entry: HistoryEntry) {
        self.store.restore(entry.graph);
        self.current_floor = entry.current_floor.min(self.settings.floor_count() - 1);
        self.selection = entry.selection;
        self.interaction.clear_gestures();
        if let Some(last) = self.interaction.last_created.clone() {
            if self.store.graph().node(&last).is_none() {
                self.interaction.last_created = None;
            }
        }
        self.sync_view_to_floor();
    }

    /// Steps back one checkpoint. Returns `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(entry) => {
                self.apply_entry(entry);
                true
            }
            None => false,
        }
    }

    /// Steps forward one checkpoint. Returns `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(entry) => {
                self.apply_entry(entry);
                true
            }
            None => false,
        }
    }

    fn node_on_current_floor(&self, id: &str) -> EditorResult<&Node> {
        let node = self.store.node(id)?;
        if node.floor != self.current_floor {
            return Err(EditorError::InvalidFloor(format!(
                "node {id} is on floor {}, not the current floor {}",
                node.floor, self.current_floor
            )));
        }
        Ok(node)
    }

    // ---------------------------------------------------------------------
    // Placement
    // ---------------------------------------------------------------------

    /// Places a node at an image-space point on the current floor.
    ///
    /// The point is snapped first; the orthogonal lock is taken from the most
    /// recently placed node when it is on this floor. Dropping the node onto
    /// a link splits that link.
    pub fn place_node(&mut self, point: Pos2, modifiers: SnapModifiers) -> EditorResult<NodeCreated> {
        let floor = self.current_floor;
        let reference = self
            .interaction
            .last_created
            .as_deref()
            .and_then(|id| self.store.graph().node(id))
            .filter(|n| n.floor == floor)
            .map(Node::position);
        let snapped = self
            .snap
            .snap_point(self.store.graph(), floor, point, reference, modifiers)
            .point;

        let created = self.store.create_node(floor, snapped.x, snapped.y)?;
        self.selection = Selection::Node(created.node.id.clone());
        self.interaction.last_created = Some(created.node.id.clone());
        self.checkpoint();
        log::debug!("placed node {} at ({}, {})", created.node.id, snapped.x, snapped.y);
        Ok(created)
    }

    /// Places a node at a viewport point; clicks outside the floor image are ignored.
    pub fn place_node_at_screen(
        &mut self,
        screen_pos: Pos2,
        modifiers: SnapModifiers,
    ) -> EditorResult<Option<NodeCreated>> {
        let point = self.view.screen_to_image(screen_pos);
        if !self.view.contains_image_point(point) {
            return Ok(None);
        }
        self.place_node(point, modifiers).map(Some)
    }

    // ---------------------------------------------------------------------
    // Link and polygon drawing
    // ---------------------------------------------------------------------

    /// Feeds one node click into two-click link creation.
    pub fn pick_link_node(&mut self, node: &str) -> LinkPickOutcome {
        if let Err(err) = self.node_on_current_floor(node) {
            return LinkPickOutcome::Rejected(err);
        }

        let Some(start) = self.interaction.link_start.take() else {
            self.interaction.link_start = Some(node.to_string());
            return LinkPickOutcome::Started(node.to_string());
        };
        if start == node {
            return LinkPickOutcome::Cancelled;
        }
        if let Some(existing) = self.store.graph().link_between(&start, node) {
            let id = existing.id.clone();
            self.selection = Selection::Link(id.clone());
            return LinkPickOutcome::AlreadyLinked(id);
        }

        match self.store.create_link(self.current_floor, &start, node) {
            Ok(link) => {
                self.selection = Selection::Link(link.id.clone());
                self.checkpoint();
                LinkPickOutcome::Created(link)
            }
            Err(err) => LinkPickOutcome::Rejected(err),
        }
    }

    /// Appends a vertex to the polygon being drawn.
    ///
    /// Returns `false` when the node is unknown, on another floor, or repeats
    /// the previous vertex.
    pub fn add_polygon_vertex(&mut self, node: &str) -> bool {
        if self.node_on_current_floor(node).is_err() {
            return false;
        }
        let draft = &mut self.interaction.polygon_draft;
        if draft.last().map(String::as_str) == Some(node) {
            return false;
        }
        draft.push(node.to_string());
        true
    }

    /// Turns the draft into a polygon. On error the draft is kept for further editing.
    pub fn finish_polygon(&mut self) -> EditorResult<Polygon> {
        let polygon = self
            .store
            .create_polygon(self.current_floor, &self.interaction.polygon_draft)?;
        self.interaction.polygon_draft.clear();
        self.selection = Selection::Polygon(polygon.id.clone());
        self.checkpoint();
        Ok(polygon)
    }

    pub fn cancel_polygon(&mut self) {
        self.interaction.polygon_draft.clear();
    }

    // ---------------------------------------------------------------------
    // Dragging
    // ---------------------------------------------------------------------

    /// Starts moving a node on the current floor.
    pub fn begin_node_drag(&mut self, node: &str) -> EditorResult<()> {
        let origin = self.node_on_current_floor(node)?.position();
        self.interaction.drag = Some(NodeDrag {
            node: node.to_string(),
            origin,
        });
        self.selection = Selection::Node(node.to_string());
        Ok(())
    }

    /// Moves the dragged node to follow the pointer, without a checkpoint.
    ///
    /// The orthogonal modifier keeps the move on the dominant axis from where
    /// the drag began. Returns the committed position, or `None` when no drag
    /// is active.
    pub fn drag_node_to(&mut self, point: Pos2, modifiers: SnapModifiers) -> EditorResult<Option<Pos2>> {
        let Some(drag) = self.interaction.drag.clone() else {
            return Ok(None);
        };
        let anchors =
            snap::collect_anchors_excluding(self.store.graph(), self.current_floor, Some(drag.node.as_str()));
        let target = self
            .snap
            .snap_among(&anchors, point, Some(drag.origin), modifiers)
            .point;
        self.store.update_node(
            &drag.node,
            NodePatch {
                x: Some(target.x),
                y: Some(target.y),
                ..NodePatch::default()
            },
        )?;
        Ok(Some(target))
    }

    /// Finishes a drag. Returns `true` if the node moved, which records one checkpoint.
    pub fn end_node_drag(&mut self) -> bool {
        let Some(drag) = self.interaction.drag.take() else {
            return false;
        };
        let moved = self
            .store
            .graph()
            .node(&drag.node)
            .is_some_and(|n| n.position() != drag.origin);
        if moved {
            self.checkpoint();
        }
        moved
    }

    // ---------------------------------------------------------------------
    // Selection and deletion
    // ---------------------------------------------------------------------

    pub fn select(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Deletes the selected entity. Returns `false` when nothing was selected.
    pub fn delete_selection(&mut self) -> EditorResult<bool> {
        match self.selection.clone() {
            Selection::None => return Ok(false),
            Selection::Node(id) => {
                self.store.delete_node(&id)?;
                self.interaction.forget_node(&id);
            }
            Selection::Link(id) => {
                self.store.delete_link(&id)?;
            }
            Selection::Polygon(id) => {
                self.store.delete_polygon(&id)?;
            }
        }
        self.selection = Selection::None;
        self.checkpoint();
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Property edits
    // ---------------------------------------------------------------------

    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> EditorResult<()> {
        self.store.update_node(id, patch)?;
        self.checkpoint();
        Ok(())
    }

    pub fn update_link(&mut self, id: &str, patch: LinkPatch) -> EditorResult<()> {
        self.store.update_link(id, patch)?;
        self.checkpoint();
        Ok(())
    }

    pub fn update_polygon(&mut self, id: &str, patch: PolygonPatch) -> EditorResult<()> {
        self.store.update_polygon(id, patch)?;
        self.checkpoint();
        Ok(())
    }

    pub fn set_north_reference(&mut self, from: &str, to: &str, azimuth: f32) -> EditorResult<()> {
        self.store.set_north_reference(from, to, azimuth)?;
        self.checkpoint();
        Ok(())
    }

    pub fn clear_north_reference(&mut self) {
        self.store.clear_north_reference();
        self.checkpoint();
    }

    pub fn set_scale(&mut self, scale: f32) -> EditorResult<()> {
        self.store.set_scale(scale)?;
        self.checkpoint();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Labels
    // ---------------------------------------------------------------------

    pub fn node_label(&self, id: &str) -> Option<String> {
        self.store.graph().node(id).map(Node::label)
    }

    pub fn link_label(&self, id: &str) -> Option<String> {
        self.store.graph().link(id).map(Link::label)
    }

    pub fn link_endpoints_label(&self, id: &str) -> Option<String> {
        let graph = self.store.graph();
        graph.link(id).and_then(|l| graph.link_endpoints_label(l))
    }

    // ---------------------------------------------------------------------
    // View
    // ---------------------------------------------------------------------

    /// One wheel notch of zoom around the pointer, using the configured step.
    pub fn zoom_wheel(&mut self, pointer: Pos2, zoom_in: bool) -> bool {
        let step = self.config.zoom_step;
        self.view.zoom_step(pointer, step, zoom_in)
    }

    // ---------------------------------------------------------------------
    // Floors and project settings
    // ---------------------------------------------------------------------

    fn check_floor(&self, floor: FloorIndex) -> EditorResult<()> {
        if floor >= self.settings.floor_count() {
            return Err(EditorError::InvalidFloor(format!(
                "floor {floor} does not exist (project has {})",
                self.settings.floor_count()
            )));
        }
        Ok(())
    }

    /// Switches the floor being edited. Gestures in progress are abandoned.
    pub fn set_current_floor(&mut self, floor: FloorIndex) -> EditorResult<()> {
        self.check_floor(floor)?;
        if floor != self.current_floor {
            self.current_floor = floor;
            self.selection = Selection::None;
            self.interaction.clear_gestures();
            self.sync_view_to_floor();
            self.view.reset();
        }
        Ok(())
    }

    /// Resizes the project to `count` floors.
    ///
    /// The count cannot drop below one or below a floor that still holds entities.
    pub fn set_floor_count(&mut self, count: usize) -> EditorResult<()> {
        if count > MAX_FLOORS {
            return Err(EditorError::InvalidFloor(format!(
                "cannot have {count} floors; the limit is {MAX_FLOORS}"
            )));
        }
        let required = self.store.graph().max_floor().map_or(1, |f| f.saturating_add(1));
        if count < required {
            return Err(EditorError::InvalidFloor(format!(
                "cannot reduce to {count} floors; floor {} is in use",
                required - 1
            )));
        }
        let floors = &mut self.settings.floors;
        floors.truncate(count);
        while floors.len() < count {
            let next = floors.len();
            floors.push(FloorInfo::numbered(next));
        }
        self.settings.start_floor = self.settings.start_floor.min(count - 1);
        if self.current_floor >= count {
            self.set_current_floor(count - 1)?;
        }
        Ok(())
    }

    /// Renames a floor; a blank name restores the default.
    pub fn rename_floor(&mut self, floor: FloorIndex, name: &str) -> EditorResult<()> {
        self.check_floor(floor)?;
        let trimmed = name.trim();
        self.settings.floors[floor].name = if trimmed.is_empty() {
            default_floor_name(floor)
        } else {
            trimmed.to_string()
        };
        Ok(())
    }

    /// Sets a floor's image reference and intrinsic size.
    pub fn set_floor_image(
        &mut self,
        floor: FloorIndex,
        source: Option<String>,
        size: Option<(f32, f32)>,
    ) -> EditorResult<()> {
        self.check_floor(floor)?;
        if let Some((w, h)) = size {
            if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
                return Err(EditorError::InvalidGeometry(format!(
                    "image size {w}x{h} must be positive"
                )));
            }
        }
        let info = &mut self.settings.floors[floor];
        info.image_source = source.filter(|s| !s.trim().is_empty());
        info.image_size = size;
        if floor == self.current_floor {
            self.sync_view_to_floor();
        }
        Ok(())
    }

    pub fn set_start_floor(&mut self, floor: FloorIndex) -> EditorResult<()> {
        self.check_floor(floor)?;
        self.settings.start_floor = floor;
        Ok(())
    }

    /// Sets the background image opacity, clamped to `[0, 1]`.
    pub fn set_background_opacity(&mut self, opacity: f32) {
        if opacity.is_finite() {
            self.settings.background_opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn set_project_meta(&mut self, name: &str, author: &str) {
        self.settings.meta = ProjectMeta {
            name: name.trim().to_string(),
            author: author.trim().to_string(),
        };
    }

    /// Looks up an entity of any kind by id, for status displays.
    pub fn describe(&self, selection: &Selection) -> EditorResult<String> {
        let graph = self.store.graph();
        match selection {
            Selection::None => Ok(String::new()),
            Selection::Node(id) => graph
                .node(id)
                .map(Node::label)
                .ok_or_else(|| EditorError::unknown(EntityKind::Node, id.as_str())),
            Selection::Link(id) => graph
                .link(id)
                .map(|l| match graph.link_endpoints_label(l) {
                    Some(ends) => format!("{} ({ends})", l.label()),
                    None => l.label(),
                })
                .ok_or_else(|| EditorError::unknown(EntityKind::Link, id.as_str())),
            Selection::Polygon(id) => graph
                .polygon(id)
                .map(Polygon::label)
                .ok_or_else(|| EditorError::unknown(EntityKind::Polygon, id.as_str())),
        }
    }
}
