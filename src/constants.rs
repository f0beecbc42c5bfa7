//! Shared engine-wide constants.
//! Centralizes tweakable defaults used by the store, snapping, view and history.

// Snapping and hit distances
/// Radius (in image units) within which an anchor offers an axis guide.
pub const SNAP_TOLERANCE: f32 = 10.0;
/// Maximum perpendicular distance (in image units) at which a new node splits a link.
pub const SPLIT_TOLERANCE: f32 = 6.0;
/// Projection parameters at or outside this band from either end never split a link.
pub const SPLIT_END_EXCLUSION: f32 = 0.05;
/// Default search radius for nearest-node lookups.
pub const NEAREST_NODE_DISTANCE: f32 = 20.0;

// View transform
/// Lowest allowed zoom factor.
pub const MIN_ZOOM: f32 = 0.1;
/// Highest allowed zoom factor.
pub const MAX_ZOOM: f32 = 8.0;
/// Multiplicative zoom step applied per wheel notch.
pub const ZOOM_STEP: f32 = 1.12;
/// Image units moved per screen pixel of pan, relative to the visible window.
pub const PAN_SPEED: f32 = 1.0;
/// Image geometry assumed for a floor whose image size is unknown.
pub const DEFAULT_IMAGE_SIZE: (f32, f32) = (1000.0, 1000.0);

// Project
/// Floor count of a freshly created project.
pub const DEFAULT_FLOOR_COUNT: usize = 4;
/// Upper bound on the number of floors a project may have.
pub const MAX_FLOORS: usize = 256;

// Undo/redo
/// Maximum number of undo history entries to retain.
pub const MAX_UNDO_HISTORY: usize = 100;

// Wire format
/// Prefix of generated node identifiers.
pub const NODE_ID_PREFIX: &str = "N_";
/// Prefix of generated link identifiers.
pub const LINK_ID_PREFIX: &str = "lk_";
/// Prefix of generated polygon identifiers.
pub const POLYGON_ID_PREFIX: &str = "pg_";
