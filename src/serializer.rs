//! Conversion between the in-memory graph and the wire document.
//!
//! Writing is total: any graph produces a document. Reading is lenient, so a
//! partially corrupt document opens with its bad references dropped (and
//! logged) instead of failing. Only structurally unusable input is rejected.

use crate::config::EditorConfig;
use crate::constants::{LINK_ID_PREFIX, MAX_FLOORS, NODE_ID_PREFIX, POLYGON_ID_PREFIX};
use crate::document::*;
use crate::editor::ids::{tagged_number, IdAllocator};
use crate::error::{EditorError, EditorResult};
use crate::types::*;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Everything a document restores.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProject {
    pub graph: Graph,
    pub settings: ProjectSettings,
    pub current_floor: FloorIndex,
}

/// Euclidean length of a link, rounded to two decimals.
pub fn link_distance(a: &Node, b: &Node) -> f64 {
    let d = f64::from(a.x - b.x).hypot(f64::from(a.y - b.y));
    (d * 100.0).round() / 100.0
}

fn wire_node(node: &Node) -> WireNode {
    WireNode {
        x: node.x,
        y: node.y,
        name: node.name.clone(),
        special_id: node.kind.clone(),
    }
}

fn connect(connections: &mut ConnectionMap, a: &str, b: &str, distance: f64) {
    connections.entry(a.to_string()).or_default().insert(b.to_string(), distance);
    connections.entry(b.to_string()).or_default().insert(a.to_string(), distance);
}

/// Builds the wire document for a project.
///
/// # Arguments
///
/// * `graph` - The graph to export
/// * `settings` - Floor names, images, metadata
/// * `current_floor` - Floor being viewed, stored so reopening lands on it
pub fn to_document(graph: &Graph, settings: &ProjectSettings, current_floor: FloorIndex) -> WireDocument {
    let floor_count = settings
        .floor_count()
        .max(graph.max_floor().map_or(0, |f| f.saturating_add(1)));
    let mut buckets: BTreeMap<String, FloorBucket> = (0..floor_count)
        .map(|f| (f.to_string(), FloorBucket::default()))
        .collect();

    let mut nodes = BTreeMap::new();
    let mut special_points = BTreeMap::new();
    for node in &graph.nodes {
        let item = wire_node(node);
        let bucket = buckets.entry(node.floor.to_string()).or_default();
        if let Some(kind) = &node.kind {
            special_points.insert(node.id.clone(), kind.clone());
            bucket.special_points.insert(node.id.clone(), kind.clone());
        }
        bucket.nodes.insert(node.id.clone(), item.clone());
        nodes.insert(node.id.clone(), item);
    }

    let mut connections = ConnectionMap::new();
    for link in &graph.links {
        let (Some(a), Some(b)) = (graph.node(&link.a), graph.node(&link.b)) else {
            continue;
        };
        let distance = link_distance(a, b);
        connect(&mut connections, &a.id, &b.id, distance);
        if a.floor == b.floor {
            let bucket = buckets.entry(a.floor.to_string()).or_default();
            connect(&mut bucket.connections, &a.id, &b.id, distance);
        }
    }

    for polygon in &graph.polygons {
        buckets
            .entry(polygon.floor.to_string())
            .or_default()
            .polygons
            .push(BucketPolygon {
                id: polygon.id.clone(),
                name: polygon.name.clone().unwrap_or_default(),
                nodes: polygon.nodes.clone(),
                pseq: polygon.pseq,
            });
    }

    let shapes = WireShapes {
        polygons: graph
            .polygons
            .iter()
            .map(|p| WireShape {
                id: p.id.clone(),
                floor: p.floor,
                pseq: p.pseq,
                name: p.name.clone().unwrap_or_default(),
                nodes: p.nodes.clone(),
                points: p
                    .nodes
                    .iter()
                    .filter_map(|id| graph.node(id))
                    .map(|n| [n.x.round(), n.y.round()])
                    .collect(),
            })
            .collect(),
    };

    let floor_info = |i: FloorIndex| settings.floors.get(i);
    let editor = EditorMeta {
        floors: Some(floor_count),
        start_floor: Some(settings.start_floor),
        current_floor: Some(current_floor),
        background_opacity: Some(settings.background_opacity),
        floor_names: (0..floor_count).map(|i| settings.floor_name(i)).collect(),
        image_sizes: (0..floor_count)
            .map(|i| {
                floor_info(i)
                    .and_then(|f| f.image_size)
                    .map(|(width, height)| WireImageSize { width, height })
            })
            .collect(),
        node_meta: graph
            .nodes
            .iter()
            .map(|n| {
                let meta = NodeMeta {
                    floor: Some(n.floor),
                    nseq: n.nseq,
                };
                (n.id.clone(), meta)
            })
            .collect(),
        links: graph
            .links
            .iter()
            .map(|l| WireLink {
                id: l.id.clone(),
                a: l.a.clone(),
                b: l.b.clone(),
                floor: Some(l.floor),
                lseq: l.lseq,
            })
            .collect(),
        shapes: Some(shapes),
    };

    let images = settings
        .floors
        .iter()
        .any(|f| f.image_source.is_some())
        .then(|| {
            WireImages::List(
                (0..floor_count)
                    .map(|i| floor_info(i).and_then(|f| f.image_source.clone()))
                    .collect(),
            )
        });

    let north = &graph.north_reference;
    WireDocument {
        scale: graph.scale,
        north_reference: WireNorthReference {
            from_node: north.from_node.clone(),
            to_node: north.to_node.clone(),
            azimuth: north.azimuth,
        },
        nodes,
        connections,
        special_points,
        floors: buckets,
        meta: Some(WireMeta {
            project_name: settings.meta.name.clone(),
            project_author: settings.meta.author.clone(),
            ..WireMeta::default()
        }),
        images,
        editor: Some(editor),
    }
}

/// Serializes a project as pretty JSON.
pub fn to_json(graph: &Graph, settings: &ProjectSettings, current_floor: FloorIndex) -> EditorResult<String> {
    Ok(serde_json::to_string_pretty(&to_document(graph, settings, current_floor))?)
}

/// Parses a JSON document and rebuilds the project from it.
pub fn from_json(json: &str, config: &EditorConfig) -> EditorResult<LoadedProject> {
    let doc: WireDocument = serde_json::from_str(json)?;
    from_document(&doc, config)
}

/// Rebuilds a project from a wire document.
///
/// Per-floor sequence numbers come from `_editor` when stored; the rest are
/// assigned after the highest stored number on their floor. Links and polygons
/// that reference missing nodes or cross floors are dropped with a warning.
///
/// # Errors
///
/// `MalformedDocument` for empty node ids, non-finite coordinates or scale,
/// and floor indices or counts beyond [`MAX_FLOORS`].
pub fn from_document(doc: &WireDocument, config: &EditorConfig) -> EditorResult<LoadedProject> {
    if !doc.scale.is_finite() {
        return Err(EditorError::MalformedDocument(format!(
            "scale {} is not a finite number",
            doc.scale
        )));
    }

    let default_editor = EditorMeta::default();
    let editor = doc.editor.as_ref().unwrap_or(&default_editor);
    let meta = doc.meta.as_ref();
    check_floor_bounds(doc, editor)?;
    let fallback_floor = editor
        .start_floor
        .or_else(|| meta.and_then(|m| m.start_floor))
        .unwrap_or(0);

    let buckets = sorted_buckets(doc);
    let mut graph = Graph::new();
    graph.scale = doc.scale;
    graph.nodes = read_nodes(doc, editor, &buckets, fallback_floor)?;
    graph.links = read_links(doc, editor, &graph);
    graph.polygons = read_polygons(editor, &buckets, &graph, config.nearest_node_distance);
    graph.north_reference = read_north_reference(&doc.north_reference, &graph);
    IdAllocator::new().reseed(&mut graph);

    let settings = read_settings(doc, editor, &buckets, &graph, fallback_floor, config);
    let last_floor = settings.floor_count() - 1;
    let current_floor = editor
        .current_floor
        .unwrap_or(settings.start_floor)
        .min(last_floor);

    log::info!(
        "loaded {} nodes, {} links, {} polygons on {} floors",
        graph.nodes.len(),
        graph.links.len(),
        graph.polygons.len(),
        settings.floor_count()
    );
    Ok(LoadedProject {
        graph,
        settings,
        current_floor,
    })
}

/// Rejects any floor index or declared floor count the project could not hold.
fn check_floor_bounds(doc: &WireDocument, editor: &EditorMeta) -> EditorResult<()> {
    let out_of_range = |what: &str, floor: usize| {
        EditorError::MalformedDocument(format!(
            "{what} floor {floor} exceeds the limit of {MAX_FLOORS} floors"
        ))
    };

    if let Some(count) = editor.floors.filter(|&n| n > MAX_FLOORS) {
        return Err(EditorError::MalformedDocument(format!(
            "document declares {count} floors, the limit is {MAX_FLOORS}"
        )));
    }
    let mut start_floors = editor
        .start_floor
        .into_iter()
        .chain(doc.meta.as_ref().and_then(|m| m.start_floor));
    if let Some(floor) = start_floors.find(|&f| f >= MAX_FLOORS) {
        return Err(out_of_range("start", floor));
    }
    if let Some(floor) = doc
        .floors
        .keys()
        .filter_map(|key| key.parse::<usize>().ok())
        .find(|&f| f >= MAX_FLOORS)
    {
        return Err(out_of_range("bucket", floor));
    }
    if let Some((id, floor)) = editor
        .node_meta
        .iter()
        .find_map(|(id, m)| m.floor.filter(|&f| f >= MAX_FLOORS).map(|f| (id, f)))
    {
        return Err(out_of_range(&format!("node {id}"), floor));
    }
    if let Some(floor) = editor.links.iter().filter_map(|l| l.floor).find(|&f| f >= MAX_FLOORS) {
        return Err(out_of_range("link", floor));
    }
    if let Some(floor) = editor
        .shapes
        .iter()
        .flat_map(|s| s.polygons.iter().map(|p| p.floor))
        .find(|&f| f >= MAX_FLOORS)
    {
        return Err(out_of_range("polygon", floor));
    }
    if let Some(WireImages::Map(map)) = &doc.images {
        if let Some(floor) = map
            .keys()
            .filter_map(|key| key.parse::<usize>().ok())
            .find(|&f| f >= MAX_FLOORS)
        {
            return Err(out_of_range("image", floor));
        }
    }
    Ok(())
}

/// Floor buckets with numeric keys, in floor order.
fn sorted_buckets(doc: &WireDocument) -> Vec<(FloorIndex, &FloorBucket)> {
    let mut buckets: Vec<(FloorIndex, &FloorBucket)> = doc
        .floors
        .iter()
        .filter_map(|(key, bucket)| match key.parse::<FloorIndex>() {
            Ok(floor) => Some((floor, bucket)),
            Err(_) => {
                log::warn!("ignoring floor bucket with non-numeric key {:?}", key);
                None
            }
        })
        .collect();
    buckets.sort_by_key(|(floor, _)| *floor);
    buckets
}

/// Sort key restoring creation order: generated ids by number, then the rest by id.
fn creation_order<'a>(id: &'a str, prefix: &str) -> (bool, u64, &'a str) {
    match tagged_number(id, prefix) {
        Some(n) => (false, n, id),
        None => (true, 0, id),
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).cloned()
}

fn read_nodes(
    doc: &WireDocument,
    editor: &EditorMeta,
    buckets: &[(FloorIndex, &FloorBucket)],
    fallback_floor: FloorIndex,
) -> EditorResult<Vec<Node>> {
    let mut bucket_floor: HashMap<&str, FloorIndex> = HashMap::new();
    for (floor, bucket) in buckets {
        for id in bucket.nodes.keys() {
            bucket_floor.entry(id.as_str()).or_insert(*floor);
        }
    }

    let mut nodes = Vec::with_capacity(doc.nodes.len());
    for (id, wire) in &doc.nodes {
        if id.trim().is_empty() {
            return Err(EditorError::MalformedDocument("node with an empty id".to_string()));
        }
        if !wire.x.is_finite() || !wire.y.is_finite() {
            return Err(EditorError::MalformedDocument(format!(
                "node {id} has a non-finite position"
            )));
        }
        let stored = editor.node_meta.get(id);
        let floor = stored
            .and_then(|m| m.floor)
            .or_else(|| bucket_floor.get(id.as_str()).copied())
            .unwrap_or(fallback_floor);
        let mut node = Node::new(id.clone(), floor, stored.map_or(0, |m| m.nseq), wire.x, wire.y);
        node.name = non_blank(wire.name.as_ref());
        node.kind = non_blank(wire.special_id.as_ref())
            .or_else(|| non_blank(doc.special_points.get(id)));
        nodes.push(node);
    }

    for id in doc.special_points.keys().filter(|id| !doc.nodes.contains_key(*id)) {
        log::warn!("special point {} names a missing node", id);
    }

    nodes.sort_by(|a, b| creation_order(&a.id, NODE_ID_PREFIX).cmp(&creation_order(&b.id, NODE_ID_PREFIX)));
    Ok(nodes)
}

/// Unordered pairs from the flat connectivity map, first occurrence only.
///
/// The map is read in sorted key order, not document order, so a pair listed
/// both ways always comes out oriented from the lower id.
fn legacy_links(connections: &ConnectionMap) -> Vec<WireLink> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut links = Vec::new();
    for (a, targets) in connections {
        for b in targets.keys() {
            let key = if a <= b {
                (a.as_str(), b.as_str())
            } else {
                (b.as_str(), a.as_str())
            };
            if seen.insert(key) {
                links.push(WireLink {
                    a: a.clone(),
                    b: b.clone(),
                    ..WireLink::default()
                });
            }
        }
    }
    links
}

fn read_links(doc: &WireDocument, editor: &EditorMeta, graph: &Graph) -> Vec<Link> {
    let source = if editor.links.is_empty() {
        legacy_links(&doc.connections)
    } else {
        editor.links.clone()
    };

    let mut pairs: HashSet<(String, String)> = HashSet::new();
    let mut ids: HashSet<String> = HashSet::new();
    let mut links = Vec::with_capacity(source.len());
    for wire in source {
        let (Some(a), Some(b)) = (graph.node(&wire.a), graph.node(&wire.b)) else {
            log::warn!("dropping link {} -> {}: unknown node", wire.a, wire.b);
            continue;
        };
        if a.id == b.id {
            log::warn!("dropping link from {} to itself", a.id);
            continue;
        }
        let floor = wire.floor.unwrap_or(a.floor);
        if a.floor != b.floor || a.floor != floor {
            log::warn!(
                "dropping link {} -> {}: floors {} and {} differ from link floor {}",
                a.id,
                b.id,
                a.floor,
                b.floor,
                floor
            );
            continue;
        }
        let pair = if a.id <= b.id {
            (a.id.clone(), b.id.clone())
        } else {
            (b.id.clone(), a.id.clone())
        };
        if !pairs.insert(pair) {
            log::warn!("dropping duplicate link {} -> {}", a.id, b.id);
            continue;
        }

        let id = if wire.id.is_empty() || !ids.insert(wire.id.clone()) {
            String::new()
        } else {
            wire.id
        };
        links.push(Link::new(id, floor, wire.lseq, wire.a, wire.b));
    }

    fill_missing_ids(links.iter_mut().map(|l| &mut l.id), LINK_ID_PREFIX);
    links
}

fn read_polygons(
    editor: &EditorMeta,
    buckets: &[(FloorIndex, &FloorBucket)],
    graph: &Graph,
    nearest_node_distance: f32,
) -> Vec<Polygon> {
    let shapes: Vec<WireShape> = match &editor.shapes {
        Some(shapes) => shapes.polygons.clone(),
        None => buckets
            .iter()
            .flat_map(|(floor, bucket)| {
                bucket.polygons.iter().map(move |p| WireShape {
                    id: p.id.clone(),
                    floor: *floor,
                    pseq: p.pseq,
                    name: p.name.clone(),
                    nodes: p.nodes.clone(),
                    points: Vec::new(),
                })
            })
            .collect(),
    };

    let mut ids: HashSet<String> = HashSet::new();
    let mut polygons = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let floor = shape.floor;
        let mut vertices: Vec<NodeId> = if shape.nodes.is_empty() {
            shape
                .points
                .iter()
                .filter_map(|[x, y]| graph.nearest_node(floor, egui::pos2(*x, *y), nearest_node_distance))
                .map(|n| n.id.clone())
                .collect()
        } else {
            shape.nodes
        };

        vertices.retain(|id| match graph.node(id) {
            Some(node) if node.floor == floor => true,
            Some(node) => {
                log::warn!(
                    "polygon {} on floor {} drops vertex {} from floor {}",
                    shape.id,
                    floor,
                    id,
                    node.floor
                );
                false
            }
            None => {
                log::warn!("polygon {} drops unknown vertex {}", shape.id, id);
                false
            }
        });
        let vertices = normalize_polygon_nodes(&vertices);
        if vertices.len() < 3 {
            log::warn!(
                "dropping polygon {}: only {} usable vertices",
                shape.id,
                vertices.len()
            );
            continue;
        }

        let id = if shape.id.is_empty() || !ids.insert(shape.id.clone()) {
            String::new()
        } else {
            shape.id
        };
        polygons.push(Polygon {
            id,
            floor,
            pseq: shape.pseq,
            name: non_blank(Some(&shape.name)),
            nodes: vertices,
        });
    }

    fill_missing_ids(polygons.iter_mut().map(|p| &mut p.id), POLYGON_ID_PREFIX);
    polygons
}

/// Gives every empty id the next free `<prefix><n>` tag.
fn fill_missing_ids<'a>(ids: impl Iterator<Item = &'a mut String>, prefix: &str) {
    let mut ids: Vec<&mut String> = ids.collect();
    let mut next = ids
        .iter()
        .filter_map(|id| tagged_number(id, prefix))
        .max()
        .unwrap_or(0)
        + 1;
    for id in ids.iter_mut().filter(|id| id.is_empty()) {
        **id = format!("{prefix}{next}");
        next += 1;
    }
}

fn read_north_reference(wire: &WireNorthReference, graph: &Graph) -> NorthReference {
    let endpoint = |id: &Option<String>| -> Option<NodeId> {
        let id = id.as_ref().filter(|id| !id.is_empty())?;
        if graph.node(id).is_none() {
            log::warn!("north reference names missing node {}", id);
            return None;
        }
        Some(id.clone())
    };

    let azimuth = if wire.azimuth.is_finite() {
        let a = wire.azimuth.rem_euclid(360.0);
        if a >= 360.0 {
            0.0
        } else {
            a
        }
    } else {
        0.0
    };
    NorthReference {
        from_node: endpoint(&wire.from_node),
        to_node: endpoint(&wire.to_node),
        azimuth,
    }
}

fn read_settings(
    doc: &WireDocument,
    editor: &EditorMeta,
    buckets: &[(FloorIndex, &FloorBucket)],
    graph: &Graph,
    fallback_floor: FloorIndex,
    config: &EditorConfig,
) -> ProjectSettings {
    let meta = doc.meta.as_ref();
    let names: &[String] = if editor.floor_names.is_empty() {
        meta.map_or(&[][..], |m| m.floor_names.as_slice())
    } else {
        &editor.floor_names
    };
    let images = doc.images.as_ref().map(WireImages::to_list).unwrap_or_default();

    let declared = editor.floors.unwrap_or_else(|| {
        buckets
            .iter()
            .map(|(floor, _)| floor.saturating_add(1))
            .max()
            .unwrap_or(0)
            .max(names.len())
    });
    let used = graph.max_floor().map_or(0, |f| f.saturating_add(1));
    let floor_count = match declared.max(used).min(MAX_FLOORS) {
        0 => config.default_floor_count.clamp(1, MAX_FLOORS),
        n => n,
    };

    let mut settings = ProjectSettings::with_floors(floor_count);
    for (i, floor) in settings.floors.iter_mut().enumerate() {
        if let Some(name) = names.get(i) {
            floor.name = name.clone();
        }
        floor.image_source = non_blank(images.get(i).and_then(Option::as_ref));
        floor.image_size = editor
            .image_sizes
            .get(i)
            .copied()
            .flatten()
            .filter(|s| s.width.is_finite() && s.height.is_finite() && s.width > 0.0 && s.height > 0.0)
            .map(|s| (s.width, s.height));
    }
    settings.sanitize_floor_names();

    if let Some(meta) = meta {
        settings.meta = ProjectMeta {
            name: meta.project_name.clone(),
            author: meta.project_author.clone(),
        };
    }
    settings.start_floor = fallback_floor.min(floor_count - 1);
    settings.background_opacity = editor
        .background_opacity
        .or_else(|| meta.and_then(|m| m.background_opacity))
        .filter(|o| o.is_finite())
        .map_or(1.0, |o| o.clamp(0.0, 1.0));
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::store::GraphStore;

    fn two_floor_graph() -> Graph {
        let mut store = GraphStore::new();
        let mut ids = Vec::new();
        for floor in 0..2 {
            let a = store.create_node(floor, 0.0, 0.0).unwrap().node.id;
            let b = store.create_node(floor, 30.0, 40.0).unwrap().node.id;
            let c = store.create_node(floor, 0.0, 40.0).unwrap().node.id;
            store.create_link(floor, &a, &b).unwrap();
            store.create_link(floor, &b, &c).unwrap();
            store
                .create_polygon(floor, &[a.clone(), b.clone(), c.clone()])
                .unwrap();
            ids.push(a);
        }
        store
            .update_node(
                "N_2",
                crate::editor::store::NodePatch {
                    name: Some(Some("Lobby".into())),
                    kind: Some(Some("entrance".into())),
                    ..Default::default()
                },
            )
            .unwrap();
        store.set_north_reference("N_1", "N_2", 12.5).unwrap();
        store.set_scale(0.05).unwrap();
        store.graph().clone()
    }

    #[test]
    fn test_round_trip_preserves_graph() {
        let graph = two_floor_graph();
        let mut settings = ProjectSettings::with_floors(3);
        settings.floors[1].name = "Mezzanine".into();
        settings.floors[0].image_source = Some("ground.png".into());
        settings.floors[0].image_size = Some((1200.0, 800.0));
        settings.meta.name = "HQ".into();
        settings.start_floor = 1;
        settings.background_opacity = 0.4;

        let json = to_json(&graph, &settings, 1).unwrap();
        let loaded = from_json(&json, &EditorConfig::default()).unwrap();

        assert_eq!(loaded.graph, graph);
        assert_eq!(loaded.settings, settings);
        assert_eq!(loaded.current_floor, 1);
    }

    #[test]
    fn test_document_shape() {
        let graph = two_floor_graph();
        let doc = to_document(&graph, &ProjectSettings::with_floors(2), 0);

        assert_eq!(doc.connections["N_1"]["N_2"], 50.0);
        assert_eq!(doc.connections["N_2"]["N_1"], 50.0);
        assert_eq!(doc.floors["1"].connections["N_4"]["N_5"], 50.0);
        assert!(!doc.floors["0"].nodes.contains_key("N_4"));
        assert_eq!(doc.special_points["N_2"], "entrance");
        assert_eq!(doc.floors["0"].special_points["N_2"], "entrance");
        assert_eq!(doc.nodes["N_2"].special_id.as_deref(), Some("entrance"));
        assert_eq!(doc.floors["1"].polygons[0].pseq, 1);

        let editor = doc.editor.unwrap();
        assert_eq!(editor.node_meta["N_4"].nseq, 1);
        assert_eq!(editor.links.len(), 4);
        let shape = &editor.shapes.unwrap().polygons[0];
        assert_eq!(shape.points, vec![[0.0, 0.0], [30.0, 40.0], [0.0, 40.0]]);
    }

    #[test]
    fn test_distances_are_rounded() {
        let a = Node::new("N_1", 0, 1, 0.0, 0.0);
        let b = Node::new("N_2", 0, 2, 1.0, 1.0);
        assert_eq!(link_distance(&a, &b), 1.41);
    }

    #[test]
    fn test_legacy_connections_become_links() {
        let json = r#"{
            "nodes": {
                "N_1": {"x": 0, "y": 0},
                "N_2": {"x": 10, "y": 0},
                "N_3": {"x": 10, "y": 10}
            },
            "connections": {
                "N_1": {"N_2": 10, "N_9": 3},
                "N_2": {"N_1": 10, "N_3": 10},
                "N_3": {"N_2": 10}
            },
            "special_points": {"N_3": "stairs", "N_8": "lost"}
        }"#;
        let loaded = from_json(json, &EditorConfig::default()).unwrap();
        let graph = &loaded.graph;

        assert_eq!(graph.links.len(), 2);
        assert!(graph.link_between("N_1", "N_2").is_some());
        assert!(graph.link_between("N_2", "N_3").is_some());
        assert_eq!(graph.links[0].id, "lk_1");
        assert_eq!(graph.links[1].lseq, 2);
        assert_eq!(graph.node("N_3").unwrap().kind.as_deref(), Some("stairs"));
        assert_eq!(loaded.settings.floor_count(), 1);
    }

    #[test]
    fn test_nodes_without_meta_use_bucket_floor_and_fresh_sequences() {
        let json = r#"{
            "nodes": {
                "N_1": {"x": 0, "y": 0},
                "N_2": {"x": 5, "y": 5},
                "N_10": {"x": 9, "y": 9}
            },
            "floors": {"1": {"nodes": {"N_2": {"x": 5, "y": 5}}}},
            "_editor": {
                "floors": 2,
                "startFloor": 0,
                "node_meta": {"N_1": {"floor": 0, "nseq": 4}}
            }
        }"#;
        let loaded = from_json(json, &EditorConfig::default()).unwrap();
        let graph = &loaded.graph;

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["N_1", "N_2", "N_10"]);
        assert_eq!(graph.node("N_1").unwrap().nseq, 4);
        assert_eq!(graph.node("N_2").unwrap().floor, 1);
        assert_eq!(graph.node("N_2").unwrap().nseq, 1);
        assert_eq!(graph.node("N_10").unwrap().floor, 0);
        assert_eq!(graph.node("N_10").unwrap().nseq, 5);
    }

    #[test]
    fn test_bad_references_are_dropped() {
        let json = r#"{
            "nodes": {
                "N_1": {"x": 0, "y": 0},
                "N_2": {"x": 10, "y": 0},
                "N_3": {"x": 10, "y": 10},
                "N_4": {"x": 0, "y": 10}
            },
            "north_reference": {"from_node": "N_1", "to_node": "N_99", "azimuth": 370},
            "_editor": {
                "node_meta": {
                    "N_1": {"floor": 0, "nseq": 1},
                    "N_2": {"floor": 0, "nseq": 2},
                    "N_3": {"floor": 0, "nseq": 3},
                    "N_4": {"floor": 1, "nseq": 1}
                },
                "links": [
                    {"id": "lk_1", "a": "N_1", "b": "N_2", "floor": 0, "lseq": 1},
                    {"id": "lk_2", "a": "N_2", "b": "N_1", "floor": 0, "lseq": 2},
                    {"id": "lk_3", "a": "N_1", "b": "N_4", "floor": 0, "lseq": 3},
                    {"id": "lk_4", "a": "N_1", "b": "N_77", "floor": 0, "lseq": 4}
                ],
                "shapes": {"polygons": [
                    {"id": "pg_1", "floor": 0, "pseq": 1, "nodes": ["N_1", "N_2", "N_3", "N_1"]},
                    {"id": "pg_2", "floor": 0, "pseq": 2, "nodes": ["N_1", "N_4", "N_2", "N_3"]},
                    {"id": "pg_3", "floor": 0, "pseq": 3, "nodes": ["N_1", "N_55", "N_2"]}
                ]}
            }
        }"#;
        let loaded = from_json(json, &EditorConfig::default()).unwrap();
        let graph = &loaded.graph;

        let link_ids: Vec<&str> = graph.links.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(link_ids, vec!["lk_1"]);

        assert_eq!(graph.polygons.len(), 2);
        assert_eq!(graph.polygons[0].nodes, vec!["N_1", "N_2", "N_3"]);
        assert_eq!(graph.polygons[1].nodes, vec!["N_1", "N_2", "N_3"]);

        assert_eq!(graph.north_reference.from_node.as_deref(), Some("N_1"));
        assert_eq!(graph.north_reference.to_node, None);
        assert_eq!(graph.north_reference.azimuth, 10.0);
    }

    #[test]
    fn test_legacy_polygon_points_map_to_nearest_nodes() {
        let json = r#"{
            "nodes": {
                "N_1": {"x": 0, "y": 0},
                "N_2": {"x": 100, "y": 0},
                "N_3": {"x": 100, "y": 100}
            },
            "_editor": {
                "shapes": {"polygons": [
                    {"floor": 0, "name": "Hall", "points": [[3, 2], [98, 1], [101, 97], [500, 500]]}
                ]}
            }
        }"#;
        let loaded = from_json(json, &EditorConfig::default()).unwrap();
        let polygon = &loaded.graph.polygons[0];
        assert_eq!(polygon.id, "pg_1");
        assert_eq!(polygon.pseq, 1);
        assert_eq!(polygon.name.as_deref(), Some("Hall"));
        assert_eq!(polygon.nodes, vec!["N_1", "N_2", "N_3"]);
    }

    #[test]
    fn test_bucket_polygons_used_without_shapes() {
        let json = r#"{
            "nodes": {
                "N_1": {"x": 0, "y": 0},
                "N_2": {"x": 10, "y": 0},
                "N_3": {"x": 10, "y": 10}
            },
            "floors": {"0": {
                "nodes": {"N_1": {"x": 0, "y": 0}, "N_2": {"x": 10, "y": 0}, "N_3": {"x": 10, "y": 10}},
                "polygons": [{"id": "room", "name": "", "nodes": ["N_1", "N_2", "N_3"], "pseq": 0}]
            }}
        }"#;
        let loaded = from_json(json, &EditorConfig::default()).unwrap();
        let polygon = &loaded.graph.polygons[0];
        assert_eq!(polygon.id, "room");
        assert_eq!(polygon.pseq, 1);
        assert_eq!(polygon.name, None);
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        let config = EditorConfig::default();
        assert!(matches!(
            from_json("{not json", &config),
            Err(EditorError::MalformedDocument(_))
        ));
        assert!(matches!(
            from_json(r#"{"nodes": {"": {"x": 1, "y": 2}}}"#, &config),
            Err(EditorError::MalformedDocument(_))
        ));
        assert!(matches!(
            from_json(r#"{"nodes": {"N_1": {"y": 2}}}"#, &config),
            Err(EditorError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_out_of_range_floors_are_rejected() {
        let config = EditorConfig::default();
        let documents = [
            r#"{"nodes": {"N_1": {"x": 0, "y": 0}},
                "_editor": {"node_meta": {"N_1": {"floor": 18446744073709551615, "nseq": 1}}}}"#,
            r#"{"images": {"18446744073709551615": "a.png"}}"#,
            r#"{"images": {"9999999999": "a.png"}}"#,
            r#"{"_editor": {"floors": 4294967296}}"#,
            r#"{"floors": {"9999999999": {}}}"#,
            r#"{"_editor": {"startFloor": 100000}}"#,
            r#"{"nodes": {"N_1": {"x": 0, "y": 0}, "N_2": {"x": 1, "y": 0}},
                "_editor": {"links": [{"a": "N_1", "b": "N_2", "floor": 10000000000}]}}"#,
        ];
        for json in documents {
            assert!(
                matches!(from_json(json, &config), Err(EditorError::MalformedDocument(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn test_floors_up_to_the_limit_load() {
        let last = MAX_FLOORS - 1;
        let json = format!(
            r#"{{"nodes": {{"N_1": {{"x": 0, "y": 0}}}},
                "images": {{"{last}": "top.png"}},
                "_editor": {{"node_meta": {{"N_1": {{"floor": {last}, "nseq": 1}}}}}}}}"#
        );
        let loaded = from_json(&json, &EditorConfig::default()).unwrap();
        assert_eq!(loaded.settings.floor_count(), MAX_FLOORS);
        assert_eq!(loaded.graph.nodes[0].floor, last);
        assert_eq!(
            loaded.settings.floors[last].image_source.as_deref(),
            Some("top.png")
        );
    }

    #[test]
    fn test_legacy_pairs_orient_from_lower_id() {
        let json = r#"{
            "nodes": {"N_1": {"x": 0, "y": 0}, "N_2": {"x": 10, "y": 0}},
            "connections": {"N_2": {"N_1": 10}, "N_1": {"N_2": 10}}
        }"#;
        let loaded = from_json(json, &EditorConfig::default()).unwrap();
        let link = &loaded.graph.links[0];
        assert_eq!((link.a.as_str(), link.b.as_str()), ("N_1", "N_2"));
    }

    #[test]
    fn test_empty_document_uses_default_floor_count() {
        let loaded = from_json("{}", &EditorConfig::default()).unwrap();
        assert!(loaded.graph.nodes.is_empty());
        assert_eq!(loaded.settings.floor_count(), crate::constants::DEFAULT_FLOOR_COUNT);
        assert_eq!(loaded.current_floor, 0);
    }

    #[test]
    fn test_reload_is_stable() {
        let graph = two_floor_graph();
        let settings = ProjectSettings::with_floors(2);
        let first = to_document(&graph, &settings, 0);
        let loaded = from_document(&first, &EditorConfig::default()).unwrap();
        let second = to_document(&loaded.graph, &loaded.settings, loaded.current_floor);
        assert_eq!(first, second);
    }
}
