//! Axis-snap assistance for placing and dragging nodes.
//!
//! Anchors are the positions of existing geometry on a floor. A query point
//! close to an anchor's x offers a vertical guide, close to its y a
//! horizontal guide. Resolution lives on [`SnapCandidates::resolve`].

use crate::constants::SNAP_TOLERANCE;
use crate::types::*;
use egui::Pos2;

/// Modifier keys that influence snapping for one interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapModifiers {
    /// Lock movement to the dominant axis from a reference point (Shift)
    pub orthogonal: bool,
    /// Disable all snapping (Alt)
    pub precision: bool,
}

/// A vertical guide line at `x`, found from the anchor at `anchor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalGuide {
    pub x: f32,
    pub anchor: Pos2,
    /// `|point.x - anchor.x|`
    pub dx: f32,
}

/// A horizontal guide line at `y`, found from the anchor at `anchor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalGuide {
    pub y: f32,
    pub anchor: Pos2,
    /// `|point.y - anchor.y|`
    pub dy: f32,
}

/// Best guide per axis for one query point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapCandidates {
    pub vertical: Option<VerticalGuide>,
    pub horizontal: Option<HorizontalGuide>,
}

impl SnapCandidates {
    /// Whether no guide was found.
    pub fn is_empty(&self) -> bool {
        self.vertical.is_none() && self.horizontal.is_none()
    }

    /// Applies the guides to `point`: both guides snap to their intersection,
    /// one guide snaps only its axis.
    pub fn resolve(&self, point: Pos2) -> Pos2 {
        let x = self.vertical.map_or(point.x, |v| v.x);
        let y = self.horizontal.map_or(point.y, |h| h.y);
        egui::pos2(x, y)
    }
}

/// Positions of every node, link endpoint and polygon vertex on `floor`.
///
/// Repeats are kept; they only influence which equally-near anchor wins.
pub fn collect_anchors(graph: &Graph, floor: FloorIndex) -> Vec<Pos2> {
    collect_anchors_excluding(graph, floor, None)
}

/// Like [`collect_anchors`], skipping every anchor that comes from `exclude`.
///
/// Used while dragging, so a node never snaps to its own position.
pub fn collect_anchors_excluding(graph: &Graph, floor: FloorIndex, exclude: Option<&str>) -> Vec<Pos2> {
    let on_floor = |id: &str| {
        graph
            .node(id)
            .filter(|n| n.floor == floor && Some(id) != exclude)
            .map(Node::position)
    };

    let mut anchors: Vec<Pos2> = graph
        .nodes
        .iter()
        .filter(|n| n.floor == floor && Some(n.id.as_str()) != exclude)
        .map(Node::position)
        .collect();
    for link in graph.links.iter().filter(|l| l.floor == floor) {
        anchors.extend(on_floor(link.a.as_str()));
        anchors.extend(on_floor(link.b.as_str()));
    }
    for polygon in graph.polygons.iter().filter(|p| p.floor == floor) {
        anchors.extend(polygon.nodes.iter().filter_map(|id| on_floor(id.as_str())));
    }
    anchors
}

/// Nearest vertical and horizontal guides within `tolerance` of `point`.
///
/// Each axis is searched independently; on equal distance the first anchor wins.
pub fn axis_snap_candidates(anchors: &[Pos2], point: Pos2, tolerance: f32) -> SnapCandidates {
    let mut candidates = SnapCandidates::default();
    for anchor in anchors {
        let dx = (point.x - anchor.x).abs();
        let dy = (point.y - anchor.y).abs();

        if dx <= tolerance && candidates.vertical.map_or(true, |v| dx < v.dx) {
            candidates.vertical = Some(VerticalGuide {
                x: anchor.x,
                anchor: *anchor,
                dx,
            });
        }
        if dy <= tolerance && candidates.horizontal.map_or(true, |h| dy < h.dy) {
            candidates.horizontal = Some(HorizontalGuide {
                y: anchor.y,
                anchor: *anchor,
                dy,
            });
        }
    }
    candidates
}

/// Zeroes the smaller of `|Δx|` and `|Δy|` between `origin` and `point`.
///
/// Equal deltas lock to the horizontal axis.
pub fn orthogonal_from(origin: Pos2, point: Pos2) -> Pos2 {
    let delta = point - origin;
    if delta.x.abs() >= delta.y.abs() {
        egui::pos2(point.x, origin.y)
    } else {
        egui::pos2(origin.x, point.y)
    }
}

/// Result of snapping one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapOutcome {
    /// The point to commit
    pub point: Pos2,
    /// Guides that were considered, for drawing
    pub candidates: SnapCandidates,
}

/// Snapping settings for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapEngine {
    /// Guide radius in image units
    pub tolerance: f32,
    /// Global on/off switch
    pub enabled: bool,
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self {
            tolerance: SNAP_TOLERANCE,
            enabled: true,
        }
    }
}

impl SnapEngine {
    pub fn new(tolerance: f32) -> Self {
        Self {
            tolerance,
            enabled: true,
        }
    }

    /// Guides for `point` on `floor`, or none when snapping is off for this interaction.
    pub fn candidates(
        &self,
        graph: &Graph,
        floor: FloorIndex,
        point: Pos2,
        modifiers: SnapModifiers,
    ) -> SnapCandidates {
        if !self.enabled || modifiers.precision {
            return SnapCandidates::default();
        }
        axis_snap_candidates(&collect_anchors(graph, floor), point, self.tolerance)
    }

    /// Snaps a point being committed.
    ///
    /// Axis guides apply first; with the orthogonal modifier and a reference
    /// point (normally the last created node), the orthogonal lock then
    /// overrides them. The precision modifier bypasses both.
    pub fn snap_point(
        &self,
        graph: &Graph,
        floor: FloorIndex,
        point: Pos2,
        reference: Option<Pos2>,
        modifiers: SnapModifiers,
    ) -> SnapOutcome {
        self.snap_among(&collect_anchors(graph, floor), point, reference, modifiers)
    }

    /// [`Self::snap_point`] over an explicit anchor list.
    pub fn snap_among(
        &self,
        anchors: &[Pos2],
        point: Pos2,
        reference: Option<Pos2>,
        modifiers: SnapModifiers,
    ) -> SnapOutcome {
        if !self.enabled || modifiers.precision {
            return SnapOutcome {
                point,
                candidates: SnapCandidates::default(),
            };
        }
        let candidates = axis_snap_candidates(anchors, point, self.tolerance);
        let mut snapped = candidates.resolve(point);
        if modifiers.orthogonal {
            if let Some(origin) = reference {
                snapped = orthogonal_from(origin, snapped);
            }
        }
        SnapOutcome {
            point: snapped,
            candidates,
        }
    }
}
