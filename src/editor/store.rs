//! The authoritative in-memory graph and its mutation primitives.
//!
//! Every mutating method validates first and commits second, so a returned
//! error means the graph is unchanged.

use super::ids::IdAllocator;
use crate::constants::{SPLIT_END_EXCLUSION, SPLIT_TOLERANCE};
use crate::error::{EditorError, EditorResult, EntityKind};
use crate::types::*;
use egui::Pos2;

/// Field-level changes to a node. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    /// New name; `Some(None)` clears it
    pub name: Option<Option<String>>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    /// New special-point label; `Some(None)` clears it
    pub kind: Option<Option<String>>,
}

/// Endpoint changes to a link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub a: Option<NodeId>,
    pub b: Option<NodeId>,
}

/// Name or vertex changes to a polygon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonPatch {
    pub name: Option<Option<String>>,
    pub nodes: Option<Vec<NodeId>>,
}

/// A link that was replaced by two links through a newly created node.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSplit {
    /// The removed link
    pub removed: Link,
    /// `A -> new` and `new -> B`
    pub added: [LinkId; 2],
}

/// Result of [`GraphStore::create_node`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCreated {
    pub node: Node,
    /// Set when the node landed on an existing link and subdivided it
    pub split: Option<LinkSplit>,
}

/// Closest point on a segment to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Euclidean distance from the query point to the clamped projection
    pub distance: f32,
    /// Projection parameter along the segment, clamped to `[0, 1]`
    pub t: f32,
    /// The clamped projection itself
    pub point: Pos2,
}

/// Projects `p` onto the segment `a..b`.
///
/// A zero-length segment is treated as having length one, which keeps `t`
/// finite and places the projection at `a`.
pub fn project_onto_segment(p: Pos2, a: Pos2, b: Pos2) -> SegmentProjection {
    let v = b - a;
    let len2 = match v.length_sq() {
        l if l == 0.0 => 1.0,
        l => l,
    };
    let t = ((p - a).dot(v) / len2).clamp(0.0, 1.0);
    let point = a + v * t;
    SegmentProjection {
        distance: p.distance(point),
        t,
        point,
    }
}

/// Owns the graph and the id allocator that numbers its entities.
#[derive(Debug, Clone)]
pub struct GraphStore {
    graph: Graph,
    ids: IdAllocator,
    split_tolerance: f32,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            ids: IdAllocator::new(),
            split_tolerance: SPLIT_TOLERANCE,
        }
    }

    /// Adopts a loaded graph, reseeding ids and filling missing sequence numbers.
    pub fn from_graph(mut graph: Graph) -> Self {
        let mut ids = IdAllocator::new();
        ids.reseed(&mut graph);
        Self {
            graph,
            ids,
            split_tolerance: SPLIT_TOLERANCE,
        }
    }

    /// Sets the perpendicular distance within which a new node splits a link.
    pub fn with_split_tolerance(mut self, tolerance: f32) -> Self {
        self.split_tolerance = tolerance;
        self
    }

    /// Read-only access to the whole graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Replaces the graph with a restored snapshot.
    ///
    /// Counters are only raised, so ids retired earlier in the session are not reissued.
    pub fn restore(&mut self, graph: Graph) {
        self.ids.absorb(&graph);
        self.graph = graph;
    }

    pub fn node(&self, id: &str) -> EditorResult<&Node> {
        self.graph
            .node(id)
            .ok_or_else(|| EditorError::unknown(EntityKind::Node, id))
    }

    pub fn link(&self, id: &str) -> EditorResult<&Link> {
        self.graph
            .link(id)
            .ok_or_else(|| EditorError::unknown(EntityKind::Link, id))
    }

    pub fn polygon(&self, id: &str) -> EditorResult<&Polygon> {
        self.graph
            .polygon(id)
            .ok_or_else(|| EditorError::unknown(EntityKind::Polygon, id))
    }

    /// Nodes whose `floor` equals `floor`, copied out.
    pub fn nodes_on_floor(&self, floor: FloorIndex) -> Vec<Node> {
        self.graph
            .nodes
            .iter()
            .filter(|n| n.floor == floor)
            .cloned()
            .collect()
    }

    /// Links whose `floor` equals `floor`, copied out.
    pub fn links_on_floor(&self, floor: FloorIndex) -> Vec<Link> {
        self.graph
            .links
            .iter()
            .filter(|l| l.floor == floor)
            .cloned()
            .collect()
    }

    /// Polygons whose `floor` equals `floor`, copied out.
    pub fn polygons_on_floor(&self, floor: FloorIndex) -> Vec<Polygon> {
        self.graph
            .polygons
            .iter()
            .filter(|p| p.floor == floor)
            .cloned()
            .collect()
    }

    /// The same-floor node closest to `point`, if it lies within `max_distance`.
    ///
    /// Ties keep the first node in creation order.
    pub fn find_nearest_node(
        &self,
        floor: FloorIndex,
        point: Pos2,
        max_distance: f32,
    ) -> Option<&Node> {
        self.graph.nearest_node(floor, point, max_distance)
    }

    /// Creates a node at `(x, y)` on `floor`.
    ///
    /// If the node lands within the split tolerance of a same-floor link,
    /// strictly inside its middle section, that link is replaced by two links
    /// through the new node.
    pub fn create_node(&mut self, floor: FloorIndex, x: f32, y: f32) -> EditorResult<NodeCreated> {
        if !x.is_finite() || !y.is_finite() {
            return Err(EditorError::InvalidGeometry(format!(
                "node position ({x}, {y}) is not a finite point"
            )));
        }
        let id = self.ids.next_node_id();
        let nseq = self.ids.next_node_seq(floor);
        let node = Node::new(id, floor, nseq, x, y);
        self.graph.nodes.push(node.clone());

        let split = self.split_link_at(&node);
        if let Some(split) = &split {
            log::debug!(
                "node {} split link {} into {} and {}",
                node.id,
                split.removed.id,
                split.added[0],
                split.added[1]
            );
        }
        Ok(NodeCreated { node, split })
    }

    fn split_link_at(&mut self, node: &Node) -> Option<LinkSplit> {
        let point = node.position();
        let index = self.graph.links.iter().position(|link| {
            if link.floor != node.floor || link.touches(&node.id) {
                return false;
            }
            let (Some(a), Some(b)) = (self.graph.node(&link.a), self.graph.node(&link.b)) else {
                return false;
            };
            let hit = project_onto_segment(point, a.position(), b.position());
            hit.distance <= self.split_tolerance
                && hit.t > SPLIT_END_EXCLUSION
                && hit.t < 1.0 - SPLIT_END_EXCLUSION
        })?;

        let removed = self.graph.links.remove(index);
        let floor = node.floor;
        let first = Link::new(
            self.ids.next_link_id(),
            floor,
            self.ids.next_link_seq(floor),
            removed.a.clone(),
            node.id.clone(),
        );
        let second = Link::new(
            self.ids.next_link_id(),
            floor,
            self.ids.next_link_seq(floor),
            node.id.clone(),
            removed.b.clone(),
        );
        let added = [first.id.clone(), second.id.clone()];
        self.graph.links.push(first);
        self.graph.links.push(second);
        Some(LinkSplit { removed, added })
    }

    /// Checks that `a` and `b` can be joined by a link on `floor`.
    ///
    /// `ignore` skips one existing link in the duplicate check, so a link can
    /// be re-validated against its own pair while its endpoints are edited.
    fn validate_link(
        &self,
        floor: FloorIndex,
        a: &str,
        b: &str,
        ignore: Option<&str>,
    ) -> EditorResult<()> {
        let node_a = self.node(a)?;
        let node_b = self.node(b)?;
        if a == b {
            return Err(EditorError::SelfLink(a.to_string()));
        }
        if node_a.floor != node_b.floor || node_a.floor != floor {
            return Err(EditorError::InvalidFloor(format!(
                "link on floor {floor} cannot join {a} (floor {}) and {b} (floor {})",
                node_a.floor, node_b.floor
            )));
        }
        if let Some(existing) = self
            .graph
            .links
            .iter()
            .find(|l| l.connects(a, b) && Some(l.id.as_str()) != ignore)
        {
            return Err(EditorError::DuplicateLink {
                existing: existing.id.clone(),
            });
        }
        Ok(())
    }

    /// Connects two same-floor nodes.
    pub fn create_link(&mut self, floor: FloorIndex, a: &str, b: &str) -> EditorResult<Link> {
        self.validate_link(floor, a, b, None)?;
        let link = Link::new(
            self.ids.next_link_id(),
            floor,
            self.ids.next_link_seq(floor),
            a,
            b,
        );
        self.graph.links.push(link.clone());
        Ok(link)
    }

    /// Normalizes `nodes` and checks they exist on `floor`.
    fn validate_polygon_nodes(
        &self,
        floor: FloorIndex,
        nodes: &[NodeId],
    ) -> EditorResult<Vec<NodeId>> {
        let cleaned = normalize_polygon_nodes(nodes);
        if cleaned.len() < 3 {
            return Err(EditorError::TooFewVertices(cleaned.len()));
        }
        for id in &cleaned {
            let node = self.node(id)?;
            if node.floor != floor {
                return Err(EditorError::InvalidFloor(format!(
                    "polygon on floor {floor} cannot use node {id} from floor {}",
                    node.floor
                )));
            }
        }
        Ok(cleaned)
    }

    /// Creates a polygon from vertex node ids in drawing order.
    pub fn create_polygon(&mut self, floor: FloorIndex, nodes: &[NodeId]) -> EditorResult<Polygon> {
        let cleaned = self.validate_polygon_nodes(floor, nodes)?;
        let polygon = Polygon {
            id: self.ids.next_polygon_id(),
            floor,
            pseq: self.ids.next_polygon_seq(floor),
            name: None,
            nodes: cleaned,
        };
        self.graph.polygons.push(polygon.clone());
        Ok(polygon)
    }

    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> EditorResult<&Node> {
        let finite = |v: Option<f32>| v.map_or(true, f32::is_finite);
        if !finite(patch.x) || !finite(patch.y) {
            return Err(EditorError::InvalidGeometry(format!(
                "node {id} cannot move to a non-finite position"
            )));
        }
        let node = self
            .graph
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| EditorError::unknown(EntityKind::Node, id))?;
        if let Some(name) = patch.name {
            node.name = non_blank(name);
        }
        if let Some(x) = patch.x {
            node.x = x;
        }
        if let Some(y) = patch.y {
            node.y = y;
        }
        if let Some(kind) = patch.kind {
            node.kind = non_blank(kind);
        }
        Ok(node)
    }

    /// Changes a link's endpoints, re-checking the same-floor and uniqueness rules.
    pub fn update_link(&mut self, id: &str, patch: LinkPatch) -> EditorResult<&Link> {
        let current = self.link(id)?;
        let a = patch.a.unwrap_or_else(|| current.a.clone());
        let b = patch.b.unwrap_or_else(|| current.b.clone());
        self.validate_link(current.floor, &a, &b, Some(id))?;

        let link = self
            .graph
            .links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| EditorError::unknown(EntityKind::Link, id))?;
        link.a = a;
        link.b = b;
        Ok(link)
    }

    pub fn update_polygon(&mut self, id: &str, patch: PolygonPatch) -> EditorResult<&Polygon> {
        let floor = self.polygon(id)?.floor;
        let nodes = match &patch.nodes {
            Some(nodes) => Some(self.validate_polygon_nodes(floor, nodes)?),
            None => None,
        };

        let polygon = self
            .graph
            .polygons
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| EditorError::unknown(EntityKind::Polygon, id))?;
        if let Some(name) = patch.name {
            polygon.name = non_blank(name);
        }
        if let Some(nodes) = nodes {
            polygon.nodes = nodes;
        }
        Ok(polygon)
    }

    /// Removes a node with its incident links, and strips it from polygons.
    ///
    /// Polygons left with fewer than three vertices are dropped, and a north
    /// reference endpoint naming the node is cleared.
    pub fn delete_node(&mut self, id: &str) -> EditorResult<Node> {
        let index = self
            .graph
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| EditorError::unknown(EntityKind::Node, id))?;
        let node = self.graph.nodes.remove(index);

        self.graph.links.retain(|l| !l.touches(id));
        for polygon in &mut self.graph.polygons {
            polygon.nodes.retain(|n| n != id);
        }
        self.graph.polygons.retain(|p| {
            let keep = p.nodes.len() >= 3;
            if !keep {
                log::debug!("polygon {} pruned after deleting node {}", p.id, id);
            }
            keep
        });

        let north = &mut self.graph.north_reference;
        if north.from_node.as_deref() == Some(id) {
            north.from_node = None;
        }
        if north.to_node.as_deref() == Some(id) {
            north.to_node = None;
        }
        Ok(node)
    }

    pub fn delete_link(&mut self, id: &str) -> EditorResult<Link> {
        let index = self
            .graph
            .links
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| EditorError::unknown(EntityKind::Link, id))?;
        Ok(self.graph.links.remove(index))
    }

    pub fn delete_polygon(&mut self, id: &str) -> EditorResult<Polygon> {
        let index = self
            .graph
            .polygons
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EditorError::unknown(EntityKind::Polygon, id))?;
        Ok(self.graph.polygons.remove(index))
    }

    /// Sets the two-node north calibration.
    ///
    /// The azimuth is rounded to one decimal place.
    pub fn set_north_reference(&mut self, from: &str, to: &str, azimuth: f32) -> EditorResult<()> {
        if from == to {
            return Err(EditorError::InvalidNorthReference(
                "choose two different nodes".to_string(),
            ));
        }
        if !(0.0..360.0).contains(&azimuth) {
            return Err(EditorError::InvalidNorthReference(format!(
                "azimuth {azimuth} is outside [0, 360)"
            )));
        }
        self.node(from)?;
        self.node(to)?;
        self.graph.north_reference = NorthReference {
            from_node: Some(from.to_string()),
            to_node: Some(to.to_string()),
            azimuth: (azimuth * 10.0).round() / 10.0 % 360.0,
        };
        Ok(())
    }

    pub fn clear_north_reference(&mut self) {
        self.graph.north_reference = NorthReference::default();
    }

    /// Sets the length-per-pixel scale.
    pub fn set_scale(&mut self, scale: f32) -> EditorResult<()> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(EditorError::InvalidGeometry(format!(
                "scale {scale} must be a finite, non-negative number"
            )));
        }
        self.graph.scale = scale;
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_link() -> (GraphStore, NodeId, NodeId, LinkId) {
        let mut store = GraphStore::new();
        let a = store.create_node(0, 0.0, 0.0).unwrap().node.id;
        let b = store.create_node(0, 100.0, 0.0).unwrap().node.id;
        let link = store.create_link(0, &a, &b).unwrap().id;
        (store, a, b, link)
    }

    #[test]
    fn test_create_node_assigns_id_and_floor_sequence() {
        let mut store = GraphStore::new();
        let first = store.create_node(0, 1.0, 2.0).unwrap().node;
        let second = store.create_node(1, 3.0, 4.0).unwrap().node;
        let third = store.create_node(0, 5.0, 6.0).unwrap().node;

        assert_eq!(first.id, "N_1");
        assert_eq!(first.nseq, 1);
        assert_eq!(second.nseq, 1);
        assert_eq!(third.id, "N_3");
        assert_eq!(third.nseq, 2);
        assert_eq!(store.nodes_on_floor(0).len(), 2);
    }

    #[test]
    fn test_sequence_not_reused_after_delete() {
        let mut store = GraphStore::new();
        store.create_node(0, 0.0, 0.0).unwrap();
        let second = store.create_node(0, 50.0, 50.0).unwrap().node;
        store.delete_node(&second.id).unwrap();
        let third = store.create_node(0, 90.0, 90.0).unwrap().node;
        assert_eq!(third.nseq, 3);
        assert_eq!(third.id, "N_3");
    }

    #[test]
    fn test_create_link_rejects_cross_floor() {
        let mut store = GraphStore::new();
        let a = store.create_node(0, 0.0, 0.0).unwrap().node.id;
        let b = store.create_node(1, 10.0, 0.0).unwrap().node.id;

        let result = store.create_link(0, &a, &b);
        assert!(matches!(result, Err(EditorError::InvalidFloor(_))));
        assert!(store.graph().links.is_empty());
    }

    #[test]
    fn test_create_link_rejects_floor_mismatch_with_endpoints() {
        let mut store = GraphStore::new();
        let a = store.create_node(1, 0.0, 0.0).unwrap().node.id;
        let b = store.create_node(1, 10.0, 0.0).unwrap().node.id;
        assert!(matches!(
            store.create_link(0, &a, &b),
            Err(EditorError::InvalidFloor(_))
        ));
    }

    #[test]
    fn test_create_link_rejects_duplicate_pair_in_either_order() {
        let (mut store, a, b, link) = store_with_link();
        let result = store.create_link(0, &b, &a);
        assert_eq!(result, Err(EditorError::DuplicateLink { existing: link }));
        assert_eq!(store.graph().links.len(), 1);
    }

    #[test]
    fn test_create_link_rejects_self_and_unknown() {
        let (mut store, a, _, _) = store_with_link();
        assert!(matches!(store.create_link(0, &a, &a), Err(EditorError::SelfLink(_))));
        assert!(matches!(
            store.create_link(0, &a, "N_99"),
            Err(EditorError::UnknownId { kind: EntityKind::Node, .. })
        ));
    }

    #[test]
    fn test_node_on_link_midpoint_splits_it() {
        let (mut store, a, b, link) = store_with_link();
        let created = store.create_node(0, 50.0, 0.0).unwrap();
        let split = created.split.expect("link should be split");
        let new_id = created.node.id;

        assert_eq!(split.removed.id, link);
        let links = store.links_on_floor(0);
        assert_eq!(links.len(), 2);
        assert!(links.iter().any(|l| l.connects(&a, &new_id)));
        assert!(links.iter().any(|l| l.connects(&new_id, &b)));
        assert!(store.graph().link_between(&a, &b).is_none());
        assert_eq!(links[0].lseq, 2);
        assert_eq!(links[1].lseq, 3);
    }

    #[test]
    fn test_node_near_link_end_does_not_split() {
        let (mut store, _, _, _) = store_with_link();
        let created = store.create_node(0, 4.0, 1.0).unwrap();
        assert!(created.split.is_none());
        assert_eq!(store.graph().links.len(), 1);

        let created = store.create_node(0, 96.0, 0.0).unwrap();
        assert!(created.split.is_none());
    }

    #[test]
    fn test_node_off_link_or_other_floor_does_not_split() {
        let (mut store, _, _, _) = store_with_link();
        assert!(store.create_node(0, 50.0, 7.0).unwrap().split.is_none());
        assert!(store.create_node(1, 50.0, 0.0).unwrap().split.is_none());
        assert_eq!(store.graph().links.len(), 1);
    }

    #[test]
    fn test_node_within_tolerance_splits() {
        let (mut store, _, _, _) = store_with_link();
        assert!(store.create_node(0, 30.0, 6.0).unwrap().split.is_some());
    }

    #[test]
    fn test_create_polygon_normalizes_vertices() {
        let mut store = GraphStore::new();
        let ids: Vec<NodeId> = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]
            .iter()
            .map(|(x, y)| store.create_node(0, *x, *y).unwrap().node.id)
            .collect();
        let draft = vec![
            ids[0].clone(),
            ids[1].clone(),
            ids[1].clone(),
            ids[2].clone(),
            ids[0].clone(),
        ];
        let polygon = store.create_polygon(0, &draft).unwrap();
        assert_eq!(polygon.nodes, ids);
        assert_eq!(polygon.pseq, 1);
        assert_eq!(polygon.id, "pg_1");
    }

    #[test]
    fn test_create_polygon_rejects_too_few_and_cross_floor() {
        let mut store = GraphStore::new();
        let a = store.create_node(0, 0.0, 0.0).unwrap().node.id;
        let b = store.create_node(0, 10.0, 0.0).unwrap().node.id;
        let c = store.create_node(1, 10.0, 10.0).unwrap().node.id;

        assert_eq!(
            store.create_polygon(0, &[a.clone(), b.clone(), a.clone()]),
            Err(EditorError::TooFewVertices(2))
        );
        assert!(matches!(
            store.create_polygon(0, &[a, b, c]),
            Err(EditorError::InvalidFloor(_))
        ));
        assert!(store.graph().polygons.is_empty());
    }

    #[test]
    fn test_delete_node_cascades() {
        let mut store = GraphStore::new();
        let x = store.create_node(0, 0.0, 0.0).unwrap().node.id;
        let y = store.create_node(0, 10.0, 0.0).unwrap().node.id;
        let z = store.create_node(0, 10.0, 10.0).unwrap().node.id;
        store.create_link(0, &x, &y).unwrap();
        store.create_link(0, &y, &z).unwrap();
        store.create_link(0, &x, &z).unwrap();
        store
            .create_polygon(0, &[x.clone(), y.clone(), z.clone()])
            .unwrap();
        store.set_north_reference(&y, &z, 90.0).unwrap();

        store.delete_node(&y).unwrap();

        assert_eq!(store.graph().links.len(), 1);
        assert!(store.graph().links[0].connects(&x, &z));
        assert!(store.graph().polygons.is_empty());
        assert_eq!(store.graph().north_reference.from_node, None);
        assert_eq!(store.graph().north_reference.to_node.as_deref(), Some(z.as_str()));
    }

    #[test]
    fn test_delete_node_shrinks_larger_polygon() {
        let mut store = GraphStore::new();
        let ids: Vec<NodeId> = (0..4)
            .map(|i| store.create_node(0, i as f32 * 10.0, (i % 2) as f32 * 30.0).unwrap().node.id)
            .collect();
        let polygon = store.create_polygon(0, &ids).unwrap();
        store.delete_node(&ids[1]).unwrap();
        let remaining = store.polygon(&polygon.id).unwrap();
        assert_eq!(remaining.nodes, vec![ids[0].clone(), ids[2].clone(), ids[3].clone()]);
    }

    #[test]
    fn test_update_link_revalidates() {
        let mut store = GraphStore::new();
        let a = store.create_node(0, 0.0, 0.0).unwrap().node.id;
        let b = store.create_node(0, 100.0, 0.0).unwrap().node.id;
        let c = store.create_node(0, 0.0, 100.0).unwrap().node.id;
        let other = store.create_node(1, 0.0, 0.0).unwrap().node.id;
        let ab = store.create_link(0, &a, &b).unwrap().id;
        let ac = store.create_link(0, &a, &c).unwrap().id;

        let cross = store.update_link(&ab, LinkPatch { a: None, b: Some(other) });
        assert!(matches!(cross, Err(EditorError::InvalidFloor(_))));

        let dup = store.update_link(&ab, LinkPatch { a: None, b: Some(c.clone()) });
        assert_eq!(dup, Err(EditorError::DuplicateLink { existing: ac }));

        // Swapping endpoints of the same link is not a duplicate of itself.
        let swapped = store
            .update_link(&ab, LinkPatch { a: Some(b.clone()), b: Some(a.clone()) })
            .unwrap();
        assert_eq!(swapped.a, b);
    }

    #[test]
    fn test_update_node_fields() {
        let mut store = GraphStore::new();
        let id = store.create_node(0, 0.0, 0.0).unwrap().node.id;
        let node = store
            .update_node(
                &id,
                NodePatch {
                    name: Some(Some("Stairs".into())),
                    x: Some(12.5),
                    kind: Some(Some("stairs".into())),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(node.name.as_deref(), Some("Stairs"));
        assert_eq!(node.x, 12.5);
        assert_eq!(node.y, 0.0);

        let cleared = store
            .update_node(&id, NodePatch { name: Some(Some("  ".into())), ..Default::default() })
            .unwrap();
        assert_eq!(cleared.name, None);

        assert!(store
            .update_node(&id, NodePatch { y: Some(f32::NAN), ..Default::default() })
            .is_err());
        assert!(store.update_node("N_42", NodePatch::default()).is_err());
    }

    #[test]
    fn test_update_polygon_validates_vertices() {
        let mut store = GraphStore::new();
        let ids: Vec<NodeId> = (0..3)
            .map(|i| store.create_node(0, i as f32 * 10.0, (i * i) as f32).unwrap().node.id)
            .collect();
        let polygon = store.create_polygon(0, &ids).unwrap();

        let short = store.update_polygon(
            &polygon.id,
            PolygonPatch { name: Some(Some("Hall".into())), nodes: Some(ids[..2].to_vec()) },
        );
        assert_eq!(short, Err(EditorError::TooFewVertices(2)));
        assert_eq!(store.polygon(&polygon.id).unwrap().name, None);

        let renamed = store
            .update_polygon(&polygon.id, PolygonPatch { name: Some(Some("Hall".into())), nodes: None })
            .unwrap();
        assert_eq!(renamed.label(), "Hall");
    }

    #[test]
    fn test_find_nearest_node() {
        let mut store = GraphStore::new();
        store.create_node(0, 0.0, 0.0).unwrap();
        let near = store.create_node(0, 10.0, 0.0).unwrap().node.id;
        store.create_node(1, 9.0, 0.0).unwrap();

        let found = store.find_nearest_node(0, egui::pos2(8.0, 0.0), 20.0).unwrap();
        assert_eq!(found.id, near);
        assert!(store.find_nearest_node(0, egui::pos2(60.0, 0.0), 20.0).is_none());
        assert!(store.find_nearest_node(2, egui::pos2(0.0, 0.0), 20.0).is_none());
    }

    #[test]
    fn test_north_reference_validation() {
        let (mut store, a, b, _) = store_with_link();
        assert!(matches!(
            store.set_north_reference(&a, &a, 10.0),
            Err(EditorError::InvalidNorthReference(_))
        ));
        assert!(matches!(
            store.set_north_reference(&a, &b, 360.0),
            Err(EditorError::InvalidNorthReference(_))
        ));
        assert!(store.set_north_reference(&a, "N_77", 10.0).is_err());

        store.set_north_reference(&a, &b, 123.456).unwrap();
        let north = &store.graph().north_reference;
        assert!(north.is_set());
        assert!((north.azimuth - 123.5).abs() < 1e-4);

        store.clear_north_reference();
        assert!(!store.graph().north_reference.is_set());
    }

    #[test]
    fn test_project_onto_segment() {
        let hit = project_onto_segment(egui::pos2(50.0, 5.0), egui::pos2(0.0, 0.0), egui::pos2(100.0, 0.0));
        assert!((hit.t - 0.5).abs() < 1e-6);
        assert!((hit.distance - 5.0).abs() < 1e-6);

        let clamped = project_onto_segment(egui::pos2(-10.0, 0.0), egui::pos2(0.0, 0.0), egui::pos2(100.0, 0.0));
        assert_eq!(clamped.t, 0.0);
        assert!((clamped.distance - 10.0).abs() < 1e-6);

        let degenerate = project_onto_segment(egui::pos2(3.0, 4.0), egui::pos2(0.0, 0.0), egui::pos2(0.0, 0.0));
        assert!((degenerate.distance - 5.0).abs() < 1e-6);
    }
}
