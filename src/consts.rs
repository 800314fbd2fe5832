//! Shared numeric and wire constants for the palette crate.

// ── CRS ─────────────────────────────────────────────────────────

/// The single CRS all stored geometry is kept in (geographic degrees).
pub const CANONICAL_CRS: &str = "EPSG:4326";

/// Web Mercator, the usual projected CRS of browser map engines.
pub const WEB_MERCATOR: &str = "EPSG:3857";

/// Legacy alias some engines still report for Web Mercator.
pub const WEB_MERCATOR_LEGACY: &str = "EPSG:900913";

/// Spherical earth radius used by the Web Mercator projection, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

// ── Gestures ────────────────────────────────────────────────────

/// Minimum mouse displacement, in screen pixels, for the fallback drag to
/// count as an intended drag rather than an accidental click-and-release.
pub const DRAG_MIN_DISTANCE_PX: f64 = 6.0;

/// Default click-to-select radius in canonical-CRS degrees (≈50 m at the
/// equator). Configurable on the engine because it ignores zoom level.
pub const DEFAULT_NEAREST_SELECT_EPS_DEG: f64 = 0.0005;

// ── Icon style ──────────────────────────────────────────────────

/// Icon size, in pixels, given to a freshly placed marker.
pub const ICON_SIZE_DEFAULT: f64 = 44.0;

/// Lower clamp for icon resizing.
pub const ICON_SIZE_MIN: f64 = 12.0;

/// Upper clamp for icon resizing.
pub const ICON_SIZE_MAX: f64 = 160.0;

/// Opacity given to every icon symbolizer.
pub const ICON_OPACITY_DEFAULT: f64 = 1.0;

// ── Selection halo ──────────────────────────────────────────────

/// Extra pixels the halo extends beyond the icon it surrounds.
pub const HALO_SIZE_PAD: f64 = 12.0;

/// Lower clamp for the halo size.
pub const HALO_SIZE_MIN: f64 = 12.0;

/// Upper clamp for the halo size.
pub const HALO_SIZE_MAX: f64 = 200.0;

/// The fixed two-ring marker image drawn beneath the selected entity.
pub const HALO_IMAGE: &str = "markers/selection-halo.png";

// ── Entity layer ────────────────────────────────────────────────

/// Id of the single entity layer; its identity never changes once created.
pub const ENTITY_LAYER_ID: &str = "entitypalette";

/// Display name of the entity layer.
pub const ENTITY_LAYER_NAME: &str = "Entity Palette";

/// Layer group the entity layer is created under.
pub const ENTITY_LAYER_GROUP: &str = "annotations";

// ── Drag payload ────────────────────────────────────────────────

/// Custom MIME type the drag payload is serialized under. A plain-text copy
/// rides along for engines that strip custom types.
pub const ENTITY_MIME: &str = "application/x-entity";

/// Known map-surface selectors, most specific first. The drop handler walks
/// up from the element under the cursor until one of these matches, because
/// overlapping DOM layers can intercept the raw drop target.
pub const MAP_SURFACE_SELECTORS: &[&str] = &[
    ".mapstore-map",
    ".leaflet-container",
    ".mapboxgl-map",
    ".ol-viewport",
    "#map",
];

// ── UI timing ───────────────────────────────────────────────────

/// Debounce window preventing duplicate rapid metadata saves, in ms.
pub const METADATA_SAVE_DEBOUNCE_MS: u64 = 600;

/// How long the transient "saved" indicator stays visible, in ms.
pub const SAVED_INDICATOR_MS: u64 = 2_000;
