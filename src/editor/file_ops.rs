//! Project lifecycle: new, open and save.
//!
//! The engine never touches files or the network; these methods turn the
//! session into a wire document (or JSON text) and back, and the caller moves
//! the bytes.

use super::state::EditorSession;
use super::store::GraphStore;
use crate::constants::MAX_FLOORS;
use crate::document::WireDocument;
use crate::error::EditorResult;
use crate::serializer::{self, LoadedProject};
use crate::types::*;

impl EditorSession {
    /// Replaces the open project with an empty one.
    pub fn new_project(&mut self) {
        self.store = GraphStore::new().with_split_tolerance(self.config.split_tolerance);
        self.settings = ProjectSettings::with_floors(self.config.default_floor_count.clamp(1, MAX_FLOORS));
        log::info!("new project with {} floors", self.settings.floor_count());
        self.install(0);
    }

    /// Opens a project from a wire document.
    ///
    /// On error the current project is left untouched.
    pub fn open_document(&mut self, doc: &WireDocument) -> EditorResult<()> {
        let loaded = serializer::from_document(doc, &self.config)?;
        self.open_loaded(loaded);
        Ok(())
    }

    /// Opens a project from JSON text.
    pub fn open_json(&mut self, json: &str) -> EditorResult<()> {
        let loaded = serializer::from_json(json, &self.config)?;
        self.open_loaded(loaded);
        Ok(())
    }

    fn open_loaded(&mut self, loaded: LoadedProject) {
        log::info!(
            "opened project {:?} ({} nodes, {} floors)",
            loaded.settings.meta.name,
            loaded.graph.nodes.len(),
            loaded.settings.floor_count()
        );
        self.store = GraphStore::from_graph(loaded.graph).with_split_tolerance(self.config.split_tolerance);
        self.settings = loaded.settings;
        self.install(loaded.current_floor);
    }

    /// Resets every piece of per-project state around a freshly installed graph.
    fn install(&mut self, current_floor: FloorIndex) {
        self.current_floor = current_floor.min(self.settings.floor_count() - 1);
        self.selection = Selection::None;
        self.interaction = Default::default();
        self.sync_view_to_floor();
        self.view.reset();
        let entry = self.snapshot();
        self.history.reset_to(entry);
        self.mark_saved();
    }

    /// The open project as a wire document.
    pub fn to_document(&self) -> WireDocument {
        serializer::to_document(self.store.graph(), &self.settings, self.current_floor)
    }

    /// The open project as pretty JSON.
    pub fn to_json(&self) -> EditorResult<String> {
        serializer::to_json(self.store.graph(), &self.settings, self.current_floor)
    }

    /// Serializes the project and marks it saved.
    pub fn save_json(&mut self) -> EditorResult<String> {
        let json = self.to_json()?;
        self.mark_saved();
        log::info!("saved project {:?}", self.settings.meta.name);
        Ok(json)
    }

    /// Records the current project as the saved baseline.
    pub fn mark_saved(&mut self) {
        self.file.saved_document = Some(self.fingerprint());
    }

    /// Whether the project differs from what was last saved or loaded.
    ///
    /// Switching floors alone does not count as a change.
    pub fn has_unsaved_changes(&self) -> bool {
        self.file.saved_document.as_ref() != Some(&self.fingerprint())
    }

    fn fingerprint(&self) -> WireDocument {
        let mut doc = self.to_document();
        if let Some(editor) = doc.editor.as_mut() {
            editor.current_floor = None;
        }
        doc
    }
}
