//! Core data types for the navigation map editor.
//!
//! This module defines the in-memory model shared by every component: nodes,
//! links, polygons, the north reference, the aggregate graph, the transient
//! selection, and the per-floor project settings.

use serde::{Deserialize, Serialize};

/// Globally unique identifier of a node (`N_<n>` when generated).
pub type NodeId = String;

/// Globally unique identifier of a link (`lk_<n>` when generated).
pub type LinkId = String;

/// Globally unique identifier of a polygon (`pg_<n>` when generated).
pub type PolygonId = String;

/// Zero-based index of a drawing layer.
pub type FloorIndex = usize;

/// A waypoint placed over a floor image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique, immutable identifier
    pub id: NodeId,
    /// Floor the node lives on for its whole lifetime
    pub floor: FloorIndex,
    /// Per-floor display number; 0 means "not yet assigned"
    pub nseq: u32,
    /// Optional user-facing name
    pub name: Option<String>,
    /// X coordinate in the floor's image space
    pub x: f32,
    /// Y coordinate in the floor's image space
    pub y: f32,
    /// Optional special-point label (entrance, elevator, ...)
    pub kind: Option<String>,
}

impl Node {
    /// Creates an unnamed, untyped node.
    pub fn new(id: impl Into<NodeId>, floor: FloorIndex, nseq: u32, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            floor,
            nseq,
            name: None,
            x,
            y,
            kind: None,
        }
    }

    /// Position as an image-space point.
    pub fn position(&self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }

    /// Display label: the name if set, otherwise `N_<nseq>`, otherwise the id.
    pub fn label(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ if self.nseq > 0 => format!("N_{}", self.nseq),
            _ => self.id.clone(),
        }
    }
}

/// An undirected walkable edge between two nodes on the same floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Unique identifier
    pub id: LinkId,
    /// Floor shared by both endpoints
    pub floor: FloorIndex,
    /// Per-floor display number; 0 means "not yet assigned"
    pub lseq: u32,
    /// First endpoint
    pub a: NodeId,
    /// Second endpoint
    pub b: NodeId,
}

impl Link {
    /// Creates a link between `a` and `b`.
    pub fn new(
        id: impl Into<LinkId>,
        floor: FloorIndex,
        lseq: u32,
        a: impl Into<NodeId>,
        b: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            floor,
            lseq,
            a: a.into(),
            b: b.into(),
        }
    }

    /// Whether this link joins the unordered pair `{a, b}`.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }

    /// Whether either endpoint is `node`.
    pub fn touches(&self, node: &str) -> bool {
        self.a == node || self.b == node
    }

    /// Display label: `lk_<lseq>`, or the id when no sequence is assigned.
    pub fn label(&self) -> String {
        if self.lseq > 0 {
            format!("lk_{}", self.lseq)
        } else {
            self.id.clone()
        }
    }
}

/// A closed outline whose vertices are node references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Unique identifier
    pub id: PolygonId,
    /// Floor of the polygon and all of its vertices
    pub floor: FloorIndex,
    /// Per-floor display number; 0 means "not yet assigned"
    pub pseq: u32,
    /// Optional room or zone name
    pub name: Option<String>,
    /// Vertex node ids in drawing order, without a closing repeat
    pub nodes: Vec<NodeId>,
}

impl Polygon {
    /// Display label: the name if set, otherwise `pg_<pseq>`, otherwise the id.
    pub fn label(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ if self.pseq > 0 => format!("pg_{}", self.pseq),
            _ => self.id.clone(),
        }
    }
}

/// Drops immediate repeats and a closing repeat of the first vertex.
///
/// Non-adjacent repeats are kept, so a polygon may touch itself.
pub fn normalize_polygon_nodes<S: AsRef<str>>(nodes: &[S]) -> Vec<NodeId> {
    let mut cleaned: Vec<NodeId> = Vec::with_capacity(nodes.len());
    for id in nodes.iter().map(AsRef::as_ref) {
        if id.is_empty() {
            continue;
        }
        if cleaned.last().map(String::as_str) != Some(id) {
            cleaned.push(id.to_string());
        }
    }
    if cleaned.len() > 2 && cleaned.first() == cleaned.last() {
        cleaned.pop();
    }
    cleaned
}

/// Two-node true-north calibration shared by all floors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NorthReference {
    /// Node the reference direction starts at
    pub from_node: Option<NodeId>,
    /// Node the reference direction points to
    pub to_node: Option<NodeId>,
    /// Compass angle of `from_node -> to_node` in degrees, `[0, 360)`
    pub azimuth: f32,
}

impl NorthReference {
    /// Whether both reference nodes are set.
    pub fn is_set(&self) -> bool {
        self.from_node.is_some() && self.to_node.is_some()
    }

    /// Whether either endpoint names `node`.
    pub fn mentions(&self, node: &str) -> bool {
        self.from_node.as_deref() == Some(node) || self.to_node.as_deref() == Some(node)
    }
}

/// The complete editable navigation graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    /// All nodes on all floors, in creation order
    pub nodes: Vec<Node>,
    /// All links on all floors, in creation order
    pub links: Vec<Link>,
    /// All polygons on all floors, in creation order
    pub polygons: Vec<Polygon>,
    /// Project-wide north calibration
    pub north_reference: NorthReference,
    /// Length per image pixel
    pub scale: f32,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up a link by id.
    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Looks up a polygon by id.
    pub fn polygon(&self, id: &str) -> Option<&Polygon> {
        self.polygons.iter().find(|p| p.id == id)
    }

    /// Finds the link joining the unordered pair `{a, b}`, if any.
    pub fn link_between(&self, a: &str, b: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.connects(a, b))
    }

    /// Highest floor index referenced by any entity.
    pub fn max_floor(&self) -> Option<FloorIndex> {
        let nodes = self.nodes.iter().map(|n| n.floor);
        let links = self.links.iter().map(|l| l.floor);
        let polygons = self.polygons.iter().map(|p| p.floor);
        nodes.chain(links).chain(polygons).max()
    }

    /// The node on `floor` closest to `point`, if within `max_distance`.
    ///
    /// Ties keep the first node in creation order.
    pub fn nearest_node(&self, floor: FloorIndex, point: egui::Pos2, max_distance: f32) -> Option<&Node> {
        let mut best: Option<(&Node, f32)> = None;
        for node in self.nodes.iter().filter(|n| n.floor == floor) {
            let d2 = node.position().distance_sq(point);
            if best.map_or(true, |(_, best_d2)| d2 < best_d2) {
                best = Some((node, d2));
            }
        }
        best.filter(|(_, d2)| d2.sqrt() <= max_distance)
            .map(|(node, _)| node)
    }

    /// `"A → B"` label of a link's endpoints, or `None` if either is missing.
    pub fn link_endpoints_label(&self, link: &Link) -> Option<String> {
        let a = self.node(&link.a)?;
        let b = self.node(&link.b)?;
        Some(format!("{} → {}", a.label(), b.label()))
    }
}

/// The entity currently selected in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    /// Nothing selected
    #[default]
    None,
    /// A node
    Node(NodeId),
    /// A link
    Link(LinkId),
    /// A polygon
    Polygon(PolygonId),
}

impl Selection {
    /// Whether the selection points at `id`, whatever its kind.
    pub fn is(&self, id: &str) -> bool {
        match self {
            Self::None => false,
            Self::Node(sel) | Self::Link(sel) | Self::Polygon(sel) => sel == id,
        }
    }
}

/// Default display name of a floor: its one-based number.
pub fn default_floor_name(index: FloorIndex) -> String {
    format!("{}", index + 1)
}

/// Per-floor presentation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorInfo {
    /// Display name
    pub name: String,
    /// Reference to the floor image (URL or file name); never decoded here
    pub image_source: Option<String>,
    /// Intrinsic image size (width, height) when known
    pub image_size: Option<(f32, f32)>,
}

impl FloorInfo {
    /// A floor with its default name and no image.
    pub fn numbered(index: FloorIndex) -> Self {
        Self {
            name: default_floor_name(index),
            image_source: None,
            image_size: None,
        }
    }
}

/// Descriptive project metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// Project name
    pub name: String,
    /// Project author
    pub author: String,
}

/// Project-level settings that live outside the graph and its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Name and author
    pub meta: ProjectMeta,
    /// One entry per floor; never empty
    pub floors: Vec<FloorInfo>,
    /// Floor shown first when the project opens
    pub start_floor: FloorIndex,
    /// Background image opacity in `[0, 1]`
    pub background_opacity: f32,
}

impl ProjectSettings {
    /// Settings for a project with `floor_count` numbered floors (at least one).
    pub fn with_floors(floor_count: usize) -> Self {
        Self {
            meta: ProjectMeta::default(),
            floors: (0..floor_count.max(1)).map(FloorInfo::numbered).collect(),
            start_floor: 0,
            background_opacity: 1.0,
        }
    }

    /// Number of floors.
    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    /// Display name of a floor, falling back to its number when blank or out of range.
    pub fn floor_name(&self, index: FloorIndex) -> String {
        self.floors
            .get(index)
            .map(|f| f.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_floor_name(index))
    }

    /// Replaces blank floor names with their defaults and trims the rest.
    pub fn sanitize_floor_names(&mut self) {
        for (index, floor) in self.floors.iter_mut().enumerate() {
            let trimmed = floor.name.trim();
            floor.name = if trimmed.is_empty() {
                default_floor_name(index)
            } else {
                trimmed.to_string()
            };
        }
    }
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self::with_floors(crate::constants::DEFAULT_FLOOR_COUNT)
    }
}
