use navmap_editor::{from_json, EditorConfig, EditorError, EditorSession};
use std::process::ExitCode;

const USAGE: &str = "usage:
  navmap_editor normalize <input.json> [output.json]
  navmap_editor stats <input.json>

Set NAVMAP_CONFIG to a JSON file to override editor defaults.";

fn load_config() -> Result<EditorConfig, String> {
    match std::env::var("NAVMAP_CONFIG") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path).map_err(|e| format!("{path}: {e}"))?;
            EditorConfig::from_json(&text).map_err(|e| format!("{path}: {e}"))
        }
        Err(_) => Ok(EditorConfig::default()),
    }
}

fn read_input(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))
}

/// Loads a document, reseeds its numbering, and writes it back out.
fn normalize(config: EditorConfig, input: &str, output: Option<&str>) -> Result<(), String> {
    let json = read_input(input)?;
    let mut session = EditorSession::new(config);
    session.open_json(&json).map_err(|e: EditorError| format!("{input}: {e}"))?;
    let normalized = session.save_json().map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            std::fs::write(path, normalized).map_err(|e| format!("failed to write {path}: {e}"))?;
            log::info!("wrote {}", path);
        }
        None => println!("{normalized}"),
    }
    Ok(())
}

/// Prints per-floor entity counts.
fn stats(config: EditorConfig, input: &str) -> Result<(), String> {
    let json = read_input(input)?;
    let project = from_json(&json, &config).map_err(|e| format!("{input}: {e}"))?;
    let graph = &project.graph;

    println!(
        "{} floors, {} nodes, {} links, {} polygons",
        project.settings.floor_count(),
        graph.nodes.len(),
        graph.links.len(),
        graph.polygons.len()
    );
    for floor in 0..project.settings.floor_count() {
        let nodes = graph.nodes.iter().filter(|n| n.floor == floor).count();
        let links = graph.links.iter().filter(|l| l.floor == floor).count();
        let polygons = graph.polygons.iter().filter(|p| p.floor == floor).count();
        println!(
            "  [{floor}] {}: {nodes} nodes, {links} links, {polygons} polygons",
            project.settings.floor_name(floor)
        );
    }
    let north = &graph.north_reference;
    if north.is_set() {
        println!("north reference: {}° set", north.azimuth);
    }
    Ok(())
}

fn main() -> ExitCode {
    // Set up logging; RUST_LOG=debug shows engine activity
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = load_config().and_then(|config| match args.as_slice() {
        [cmd, input] if cmd == "normalize" => normalize(config, input, None),
        [cmd, input, output] if cmd == "normalize" => normalize(config, input, Some(output.as_str())),
        [cmd, input] if cmd == "stats" => stats(config, input),
        _ => Err(USAGE.to_string()),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
