//! Input capture: the three gesture sources and payload normalization.
//!
//! Click, native drag-and-drop, and the mouse-based fallback drag each start
//! from a different browser event shape but funnel into the same downstream
//! handling. This module normalizes the payloads (click coordinate
//! extraction, drag payload codec, map-surface search) and arbitrates the
//! two drag kinds through [`GestureState`] so they are mutually exclusive at
//! any instant — starting one cancels the other, in one place rather than in
//! each handler.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::catalog::PaletteItem;
use crate::consts::{CANONICAL_CRS, DRAG_MIN_DISTANCE_PX, MAP_SURFACE_SELECTORS};
use crate::geo::is_projected;

/// Normalized output of a drag/drop gesture source, consumed once by the
/// engine to create a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest {
    /// Longitude (or projected x, converted downstream).
    pub lng: f64,
    /// Latitude (or projected y, converted downstream).
    pub lat: f64,
    /// The catalog item to instantiate.
    pub item: PaletteItem,
}

/// Geographic point as host click payloads spell it (`lng` or `lon`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude.
    #[serde(alias = "lon")]
    pub lng: f64,
    /// Latitude.
    pub lat: f64,
}

/// The host map-click payload. Every field is optional because map engines
/// disagree about where the coordinate lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickPayload {
    /// Geographic pair, present on leaflet-style engines.
    pub latlng: Option<GeoPoint>,
    /// Native-CRS pair, present on projected engines.
    pub coordinate: Option<[f64; 2]>,
    /// Loose longitude field.
    pub lon: Option<f64>,
    /// Loose latitude field.
    pub lat: Option<f64>,
    /// Loose x field.
    pub x: Option<f64>,
    /// Loose y field.
    pub y: Option<f64>,
}

/// A click coordinate plus the CRS it is expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickCoordinate {
    /// `[lng, lat]` or `[x, y]`, depending on `crs`.
    pub point: [f64; 2],
    /// CRS of `point`.
    pub crs: String,
}

/// Pull a usable coordinate out of a click payload.
///
/// Projected hosts (3857/900913) put the authoritative pair in `coordinate`,
/// so that field wins there; otherwise the geographic `latlng` pair comes
/// first, then the loose `lon`/`lat` and `x`/`y` fields, then `coordinate`
/// as a last resort. `None` means the click carries nothing usable and is
/// dropped.
#[must_use]
pub fn extract_coordinate(payload: &ClickPayload, host_crs: &str) -> Option<ClickCoordinate> {
    if is_projected(host_crs) {
        if let Some(point) = payload.coordinate {
            return Some(ClickCoordinate { point, crs: host_crs.to_string() });
        }
    }
    if let Some(latlng) = payload.latlng {
        return Some(ClickCoordinate { point: [latlng.lng, latlng.lat], crs: CANONICAL_CRS.to_string() });
    }
    if let (Some(lon), Some(lat)) = (payload.lon, payload.lat) {
        return Some(ClickCoordinate { point: [lon, lat], crs: CANONICAL_CRS.to_string() });
    }
    if let (Some(x), Some(y)) = (payload.x, payload.y) {
        return Some(ClickCoordinate { point: [x, y], crs: host_crs.to_string() });
    }
    if let Some(point) = payload.coordinate {
        return Some(ClickCoordinate { point, crs: host_crs.to_string() });
    }
    tracing::debug!("click payload carried no usable coordinate");
    None
}

/// Serialize an item for the drag transfer. The same string goes under the
/// custom MIME type and the plain-text fallback.
#[must_use]
pub fn encode_drag_payload(item: &PaletteItem) -> String {
    serde_json::to_string(item).unwrap_or_default()
}

/// Parse a drag payload back into an item. Garbage yields `None` and the
/// drop is discarded.
#[must_use]
pub fn decode_drag_payload(raw: &str) -> Option<PaletteItem> {
    match serde_json::from_str(raw) {
        Ok(item) => Some(item),
        Err(err) => {
            tracing::debug!(%err, "discarding unparseable drag payload");
            None
        }
    }
}

/// A DOM-ish node the host exposes for the drop-target walk.
pub trait SurfaceNode: Sized {
    /// Whether this node matches a CSS selector from the known-surface list.
    fn matches(&self, selector: &str) -> bool;
    /// Parent node; `None` at the document root.
    fn parent(&self) -> Option<Self>;
}

/// Walk up from the element under the cursor to the actual map surface,
/// testing each ancestor against the ordered selector list. Overlapping DOM
/// layers can intercept the raw drop target, which is why the raw target
/// cannot be trusted directly.
#[must_use]
pub fn find_map_surface<N: SurfaceNode>(start: N) -> Option<N> {
    let mut current = Some(start);
    while let Some(node) = current {
        if MAP_SURFACE_SELECTORS.iter().any(|sel| node.matches(sel)) {
            return Some(node);
        }
        current = node.parent();
    }
    None
}

/// Drag-gesture arbiter. Only one drag kind can be in flight; starting
/// either cancels the other so a single gesture can never place twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    /// No drag in flight.
    #[default]
    Idle,
    /// A native browser drag is in flight.
    NativeDrag {
        /// The item being dragged.
        item: PaletteItem,
    },
    /// The mouse-based fallback drag is in flight.
    FallbackDrag {
        /// The item being dragged.
        item: PaletteItem,
        /// Screen position of the mouse-down, for the distance check.
        start: [f64; 2],
    },
}

impl GestureState {
    /// Start a native drag, cancelling any fallback drag.
    pub fn start_native(&mut self, item: PaletteItem) {
        *self = Self::NativeDrag { item };
    }

    /// Start the fallback drag at `start`, cancelling any native drag.
    pub fn start_fallback(&mut self, item: PaletteItem, start: [f64; 2]) {
        *self = Self::FallbackDrag { item, start };
    }

    /// Cancel whatever is in flight.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Whether no drag is in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Finish a native drag, yielding the dragged item. `None` when no
    /// native drag was in flight (a stale drop event).
    pub fn finish_native(&mut self) -> Option<PaletteItem> {
        match std::mem::take(self) {
            Self::NativeDrag { item } => Some(item),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Finish the fallback drag at `end`. The displacement must exceed
    /// [`DRAG_MIN_DISTANCE_PX`] — a shorter gesture is an accidental
    /// click-and-release and yields `None`.
    pub fn finish_fallback(&mut self, end: [f64; 2]) -> Option<PaletteItem> {
        match std::mem::take(self) {
            Self::FallbackDrag { item, start } => {
                if displacement(start, end) > DRAG_MIN_DISTANCE_PX {
                    Some(item)
                } else {
                    tracing::debug!("fallback drag below threshold, treating as a click");
                    None
                }
            }
            other => {
                *self = other;
                None
            }
        }
    }
}

fn displacement(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt()
}
