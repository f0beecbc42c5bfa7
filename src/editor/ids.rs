//! Identifier and per-floor sequence allocation.
//!
//! Global ids (`N_<n>`, `lk_<n>`, `pg_<n>`) are unique for the whole project;
//! sequence numbers (`nseq`, `lseq`, `pseq`) are unique within one floor and
//! are what users see.

use crate::constants::{LINK_ID_PREFIX, NODE_ID_PREFIX, POLYGON_ID_PREFIX};
use crate::types::*;
use std::collections::{BTreeMap, HashSet};

/// Issues fresh ids and per-floor sequence numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct IdAllocator {
    next_node: u64,
    next_link: u64,
    next_polygon: u64,
    /// floor -> highest nseq handed out
    node_seq: BTreeMap<FloorIndex, u32>,
    /// floor -> highest lseq handed out
    link_seq: BTreeMap<FloorIndex, u32>,
    /// floor -> highest pseq handed out
    polygon_seq: BTreeMap<FloorIndex, u32>,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    /// A fresh allocator whose first ids are `N_1`, `lk_1` and `pg_1`.
    pub fn new() -> Self {
        Self {
            next_node: 1,
            next_link: 1,
            next_polygon: 1,
            node_seq: BTreeMap::new(),
            link_seq: BTreeMap::new(),
            polygon_seq: BTreeMap::new(),
        }
    }

    pub fn next_node_id(&mut self) -> NodeId {
        let id = format!("{NODE_ID_PREFIX}{}", self.next_node);
        self.next_node += 1;
        id
    }

    pub fn next_link_id(&mut self) -> LinkId {
        let id = format!("{LINK_ID_PREFIX}{}", self.next_link);
        self.next_link += 1;
        id
    }

    pub fn next_polygon_id(&mut self) -> PolygonId {
        let id = format!("{POLYGON_ID_PREFIX}{}", self.next_polygon);
        self.next_polygon += 1;
        id
    }

    pub fn next_node_seq(&mut self, floor: FloorIndex) -> u32 {
        bump(&mut self.node_seq, floor)
    }

    pub fn next_link_seq(&mut self, floor: FloorIndex) -> u32 {
        bump(&mut self.link_seq, floor)
    }

    pub fn next_polygon_seq(&mut self, floor: FloorIndex) -> u32 {
        bump(&mut self.polygon_seq, floor)
    }

    /// Resets every counter from `graph`.
    ///
    /// Id counters become `max(existing) + 1`. Per floor, the highest stored
    /// sequence number is kept; entities without one (0) or repeating an
    /// earlier entity's number on the same floor are numbered after it in
    /// graph order. Running this twice yields the same graph and counters.
    pub fn reseed(&mut self, graph: &mut Graph) {
        self.next_node = max_tagged(graph.nodes.iter().map(|n| n.id.as_str()), NODE_ID_PREFIX) + 1;
        self.next_link = max_tagged(graph.links.iter().map(|l| l.id.as_str()), LINK_ID_PREFIX) + 1;
        self.next_polygon =
            max_tagged(graph.polygons.iter().map(|p| p.id.as_str()), POLYGON_ID_PREFIX) + 1;

        self.node_seq = renumber(graph.nodes.iter_mut().map(|n| (n.floor, &mut n.nseq)));
        self.link_seq = renumber(graph.links.iter_mut().map(|l| (l.floor, &mut l.lseq)));
        self.polygon_seq = renumber(graph.polygons.iter_mut().map(|p| (p.floor, &mut p.pseq)));
    }

    /// Raises counters so they cover everything in `graph`, never lowering them.
    ///
    /// Used when a history entry is restored: ids handed out earlier in the
    /// session stay retired even if the restored graph no longer holds them.
    pub fn absorb(&mut self, graph: &Graph) {
        let node = max_tagged(graph.nodes.iter().map(|n| n.id.as_str()), NODE_ID_PREFIX) + 1;
        let link = max_tagged(graph.links.iter().map(|l| l.id.as_str()), LINK_ID_PREFIX) + 1;
        let polygon =
            max_tagged(graph.polygons.iter().map(|p| p.id.as_str()), POLYGON_ID_PREFIX) + 1;
        self.next_node = self.next_node.max(node);
        self.next_link = self.next_link.max(link);
        self.next_polygon = self.next_polygon.max(polygon);

        raise(&mut self.node_seq, graph.nodes.iter().map(|n| (n.floor, n.nseq)));
        raise(&mut self.link_seq, graph.links.iter().map(|l| (l.floor, l.lseq)));
        raise(&mut self.polygon_seq, graph.polygons.iter().map(|p| (p.floor, p.pseq)));
    }
}

fn bump(counters: &mut BTreeMap<FloorIndex, u32>, floor: FloorIndex) -> u32 {
    let seq = counters.entry(floor).or_insert(0);
    *seq += 1;
    *seq
}

/// Numeric suffix of a generated id, if `id` follows the `<prefix><digits>` pattern.
pub fn tagged_number(id: &str, prefix: &str) -> Option<u64> {
    let digits = id.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn max_tagged<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> u64 {
    ids.filter_map(|id| tagged_number(id, prefix)).max().unwrap_or(0)
}

fn renumber<'a>(
    entries: impl Iterator<Item = (FloorIndex, &'a mut u32)>,
) -> BTreeMap<FloorIndex, u32> {
    let entries: Vec<_> = entries.collect();
    let mut maxima: BTreeMap<FloorIndex, u32> = BTreeMap::new();
    for (floor, seq) in &entries {
        let max = maxima.entry(*floor).or_insert(0);
        *max = (*max).max(**seq);
    }

    let mut seen: HashSet<(FloorIndex, u32)> = HashSet::new();
    for (floor, seq) in entries {
        if *seq > 0 && seen.insert((floor, *seq)) {
            continue;
        }
        if *seq > 0 {
            log::warn!("duplicate sequence number {} on floor {}, renumbering", seq, floor);
        }
        let max = maxima.entry(floor).or_insert(0);
        *max += 1;
        *seq = *max;
        seen.insert((floor, *seq));
    }
    maxima
}

fn raise(
    counters: &mut BTreeMap<FloorIndex, u32>,
    entries: impl Iterator<Item = (FloorIndex, u32)>,
) {
    for (floor, seq) in entries {
        let current = counters.entry(floor).or_insert(0);
        *current = (*current).max(seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(nodes: &[(&str, FloorIndex, u32)]) -> Graph {
        let mut graph = Graph::new();
        for (id, floor, nseq) in nodes {
            graph.nodes.push(Node::new(*id, *floor, *nseq, 0.0, 0.0));
        }
        graph
    }

    #[test]
    fn ids_increase_from_one() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_node_id(), "N_1");
        assert_eq!(ids.next_node_id(), "N_2");
        assert_eq!(ids.next_link_id(), "lk_1");
        assert_eq!(ids.next_polygon_id(), "pg_1");
    }

    #[test]
    fn sequences_are_per_floor() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_node_seq(0), 1);
        assert_eq!(ids.next_node_seq(0), 2);
        assert_eq!(ids.next_node_seq(1), 1);
        assert_eq!(ids.next_link_seq(1), 1);
        assert_eq!(ids.next_polygon_seq(0), 1);
    }

    #[test]
    fn tagged_number_requires_exact_pattern() {
        assert_eq!(tagged_number("N_12", "N_"), Some(12));
        assert_eq!(tagged_number("N_", "N_"), None);
        assert_eq!(tagged_number("N_1a", "N_"), None);
        assert_eq!(tagged_number("n_3", "N_"), None);
        assert_eq!(tagged_number("lk_4", "lk_"), Some(4));
    }

    #[test]
    fn reseed_continues_after_highest_id() {
        let mut graph = graph_with(&[("N_3", 0, 1), ("N_10", 0, 2), ("door", 1, 1)]);
        graph.links.push(Link::new("lk_7", 0, 1, "N_3", "N_10"));
        let mut ids = IdAllocator::new();
        ids.reseed(&mut graph);

        assert_eq!(ids.next_node_id(), "N_11");
        assert_eq!(ids.next_link_id(), "lk_8");
        assert_eq!(ids.next_polygon_id(), "pg_1");
        assert_eq!(ids.next_node_seq(0), 3);
        assert_eq!(ids.next_node_seq(1), 2);
    }

    #[test]
    fn reseed_fills_missing_sequences_after_stored_maximum() {
        let mut graph = graph_with(&[("N_1", 0, 0), ("N_2", 0, 5), ("N_3", 0, 0), ("N_4", 1, 0)]);
        let mut ids = IdAllocator::new();
        ids.reseed(&mut graph);

        let seqs: Vec<u32> = graph.nodes.iter().map(|n| n.nseq).collect();
        assert_eq!(seqs, vec![6, 5, 7, 1]);
        assert_eq!(ids.next_node_seq(0), 8);
    }

    #[test]
    fn reseed_renumbers_duplicates() {
        let mut graph = graph_with(&[("N_1", 0, 2), ("N_2", 0, 2), ("N_3", 0, 1)]);
        let mut ids = IdAllocator::new();
        ids.reseed(&mut graph);

        let seqs: Vec<u32> = graph.nodes.iter().map(|n| n.nseq).collect();
        assert_eq!(seqs, vec![2, 3, 1]);
    }

    #[test]
    fn reseed_is_idempotent() {
        let mut graph = graph_with(&[("N_1", 0, 0), ("N_2", 0, 4), ("N_3", 2, 0)]);
        let mut first = IdAllocator::new();
        first.reseed(&mut graph);
        let snapshot = graph.clone();

        let mut second = IdAllocator::new();
        second.reseed(&mut graph);
        assert_eq!(graph, snapshot);
        assert_eq!(first, second);
    }

    #[test]
    fn absorb_never_lowers_counters() {
        let mut ids = IdAllocator::new();
        for _ in 0..5 {
            ids.next_node_id();
            ids.next_node_seq(0);
        }
        let graph = graph_with(&[("N_2", 0, 2)]);
        ids.absorb(&graph);
        assert_eq!(ids.next_node_id(), "N_6");
        assert_eq!(ids.next_node_seq(0), 6);

        let graph = graph_with(&[("N_40", 3, 9)]);
        ids.absorb(&graph);
        assert_eq!(ids.next_node_id(), "N_41");
        assert_eq!(ids.next_node_seq(3), 10);
    }
}
