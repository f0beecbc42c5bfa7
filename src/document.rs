//! Wire shapes of the portable navigation-graph document.
//!
//! The top-level fields form the flattened graph that routing consumers read.
//! `floors` repeats the same data split per floor, and `_editor` carries the
//! private metadata that makes a save/load cycle lossless. Every collection
//! defaults to empty so partial or legacy documents still deserialize.

use crate::constants::MAX_FLOORS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `{ nodeId: { otherNodeId: distance } }`
pub type ConnectionMap = BTreeMap<String, BTreeMap<String, f64>>;

/// The complete document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireDocument {
    #[serde(default)]
    pub scale: f32,
    #[serde(default)]
    pub north_reference: WireNorthReference,
    #[serde(default)]
    pub nodes: BTreeMap<String, WireNode>,
    #[serde(default)]
    pub connections: ConnectionMap,
    #[serde(default)]
    pub special_points: BTreeMap<String, String>,
    /// Keyed by the floor index rendered as a string
    #[serde(default)]
    pub floors: BTreeMap<String, FloorBucket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<WireMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<WireImages>,
    #[serde(rename = "_editor", default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorMeta>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireNorthReference {
    #[serde(default)]
    pub from_node: Option<String>,
    #[serde(default)]
    pub to_node: Option<String>,
    #[serde(default)]
    pub azimuth: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_id: Option<String>,
}

/// One floor's slice of the flattened graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FloorBucket {
    #[serde(default)]
    pub nodes: BTreeMap<String, WireNode>,
    #[serde(default)]
    pub connections: ConnectionMap,
    #[serde(default)]
    pub special_points: BTreeMap<String, String>,
    #[serde(default)]
    pub polygons: Vec<BucketPolygon>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BucketPolygon {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub pseq: u32,
}

/// Descriptive project metadata.
///
/// The floor fields are only read, as a fallback for documents whose
/// `_editor` block lacks them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireMeta {
    #[serde(rename = "projectName", default)]
    pub project_name: String,
    #[serde(rename = "projectAuthor", default)]
    pub project_author: String,
    #[serde(rename = "startFloor", default, skip_serializing_if = "Option::is_none")]
    pub start_floor: Option<usize>,
    #[serde(rename = "floorNames", default, skip_serializing_if = "Vec::is_empty")]
    pub floor_names: Vec<String>,
    #[serde(rename = "bgOpacity", default, skip_serializing_if = "Option::is_none")]
    pub background_opacity: Option<f32>,
}

/// Per-floor image references, written as a list but also read from an
/// index-keyed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireImages {
    List(Vec<Option<String>>),
    Map(BTreeMap<String, Option<String>>),
}

impl WireImages {
    /// Image reference per floor index; gaps are `None`.
    ///
    /// Keys at or above [`MAX_FLOORS`] are skipped.
    pub fn to_list(&self) -> Vec<Option<String>> {
        match self {
            Self::List(list) => list.iter().take(MAX_FLOORS).cloned().collect(),
            Self::Map(map) => {
                let indexed: Vec<(usize, &Option<String>)> = map
                    .iter()
                    .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
                    .filter(|(i, _)| *i < MAX_FLOORS)
                    .collect();
                let len = indexed.iter().map(|(i, _)| i.saturating_add(1)).max().unwrap_or(0);
                let mut list = vec![None; len];
                for (i, v) in indexed {
                    list[i] = v.clone();
                }
                list
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireImageSize {
    pub width: f32,
    pub height: f32,
}

/// Editor-private round-trip metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditorMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<usize>,
    #[serde(rename = "startFloor", default, skip_serializing_if = "Option::is_none")]
    pub start_floor: Option<usize>,
    #[serde(rename = "currentFloor", default, skip_serializing_if = "Option::is_none")]
    pub current_floor: Option<usize>,
    #[serde(rename = "bgOpacity", default, skip_serializing_if = "Option::is_none")]
    pub background_opacity: Option<f32>,
    #[serde(rename = "floorNames", default)]
    pub floor_names: Vec<String>,
    #[serde(rename = "imageSizes", default)]
    pub image_sizes: Vec<Option<WireImageSize>>,
    #[serde(default)]
    pub node_meta: BTreeMap<String, NodeMeta>,
    #[serde(default)]
    pub links: Vec<WireLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shapes: Option<WireShapes>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default)]
    pub floor: Option<usize>,
    #[serde(default)]
    pub nseq: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireLink {
    #[serde(default)]
    pub id: String,
    pub a: String,
    pub b: String,
    #[serde(default)]
    pub floor: Option<usize>,
    #[serde(default)]
    pub lseq: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireShapes {
    #[serde(default)]
    pub polygons: Vec<WireShape>,
}

/// A polygon with its floor and sequence number.
///
/// `points` holds rounded vertex coordinates. It is informational on output;
/// on input it is only used when `nodes` is empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireShape {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub floor: usize,
    #[serde(default)]
    pub pseq: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub points: Vec<[f32; 2]>,
}
