//! Map, storage and lookup configuration constants.
//!
//! These values are shared by every frontend so the browser shell and the CLI
//! agree on where reports live and how the map and lookups behave.
//!
//! # Usage
//!
//! ```
//! use flare_core::config::{MAP_MAX_BOUNDS, DEFAULT_MAP_CENTER};
//!
//! assert!(MAP_MAX_BOUNDS.contains(DEFAULT_MAP_CENTER));
//! ```

use crate::report::Geocode;
use crate::viewport::BoundingBox;

// =============================================================================
// Storage
// =============================================================================

/// Storage slot holding the JSON array of reports.
pub const REPORTS_STORAGE_KEY: &str = "reports";

// =============================================================================
// Map
// =============================================================================

/// Initial map center (New Westminster / Burnaby).
pub const DEFAULT_MAP_CENTER: Geocode = Geocode {
    lat: 49.259065,
    lng: -122.91798,
};

/// Initial zoom level.
pub const DEFAULT_ZOOM: u8 = 13;

/// Zoom limits for the map widget.
pub const MIN_ZOOM: u8 = 10;
pub const MAX_ZOOM: u8 = 18;

/// Zoom level used when re-centering on a focused report.
pub const FOCUS_ZOOM: u8 = 15;

/// Panning limit for the map widget (Lower Mainland).
pub const MAP_MAX_BOUNDS: BoundingBox = BoundingBox {
    south: 48.2,
    west: -125.6833,
    north: 50.499998,
    east: -121.8,
};

// =============================================================================
// Geocoding
// =============================================================================

/// Public Nominatim endpoint.
pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Typeahead does not query the service below this many characters.
pub const MIN_SUGGESTION_QUERY_CHARS: usize = 3;

/// Maximum number of address suggestions requested per query.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Client-side timeout for a single lookup.
pub const LOOKUP_TIMEOUT_SECS: u64 = 10;

/// User agent sent with lookups (Nominatim's usage policy requires one).
pub const USER_AGENT: &str = concat!(
    "Flare/",
    env!("CARGO_PKG_VERSION"),
    " (emergency report map)"
);
