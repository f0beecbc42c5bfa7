//! Engine configuration.
//!
//! All fields fall back to the values in [`crate::constants`] when missing, so a
//! partial JSON object is a valid configuration.

use crate::constants::*;
use crate::error::EditorResult;
use serde::{Deserialize, Serialize};

/// Tunable parameters of an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Axis-snap radius in image units
    pub snap_tolerance: f32,
    /// Perpendicular distance at which a new node splits an existing link
    pub split_tolerance: f32,
    /// Search radius used when mapping legacy polygon points onto nodes
    pub nearest_node_distance: f32,
    /// Lower zoom clamp
    pub min_zoom: f32,
    /// Upper zoom clamp
    pub max_zoom: f32,
    /// Zoom factor applied per wheel step
    pub zoom_step: f32,
    /// Pan multiplier on top of the image-units-per-pixel ratio
    pub pan_speed: f32,
    /// Undo history capacity
    pub max_history: usize,
    /// Floor count for new projects
    pub default_floor_count: usize,
    /// Fallback image geometry (width, height) for floors without one
    pub default_image_size: (f32, f32),
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: SNAP_TOLERANCE,
            split_tolerance: SPLIT_TOLERANCE,
            nearest_node_distance: NEAREST_NODE_DISTANCE,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
            pan_speed: PAN_SPEED,
            max_history: MAX_UNDO_HISTORY,
            default_floor_count: DEFAULT_FLOOR_COUNT,
            default_image_size: DEFAULT_IMAGE_SIZE,
        }
    }
}

impl EditorConfig {
    /// Reads a configuration from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
