//! The placement state machine.
//!
//! [`PaletteEngine`] consumes normalized gestures (map clicks, drag/drop
//! completions) and UI intents (arm, move, delete, restyle, edit metadata),
//! owns the single entity layer as a copy-on-write value, and returns
//! [`Action`]s for the host to apply through its layer-upsert and selection
//! calls — the sole write path out of the engine.
//!
//! Arming, moving, and dragging are mutually exclusive intents: entering any
//! one of them cancels the others at the entry point, before the gesture can
//! complete, which narrows the window in which two sources could race on the
//! same click.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use uuid::Uuid;

use crate::catalog::PaletteItem;
use crate::consts::{CANONICAL_CRS, DEFAULT_NEAREST_SELECT_EPS_DEG};
use crate::geo::{self, PixelToCoordinate};
use crate::input::{extract_coordinate, ClickPayload, GestureState, PlacementRequest};
use crate::layer::{
    next_available_name, EntityFeature, EntityId, EntityLayer, EntityProperties,
};
use crate::session::{Mode, PlacementSession};
use crate::style::{self, IconStyle};

/// Actions returned from engine entry points for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// First placement: hand the freshly built layer to the host.
    AddLayer(EntityLayer),
    /// Replace the existing layer node wholesale with a new value.
    UpdateLayer {
        /// Layer node to replace.
        id: String,
        /// The replacement value.
        layer: EntityLayer,
    },
    /// The highlighted feature changed.
    SelectionChanged(Option<EntityId>),
}

/// Engine knobs. The nearest-selection radius is an explicit parameter
/// because the fixed default ignores zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// CRS the host map reports native click coordinates in.
    pub host_crs: String,
    /// Maximum distance, in canonical-CRS degrees, for click-to-select.
    pub nearest_select_eps_deg: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host_crs: CANONICAL_CRS.to_string(),
            nearest_select_eps_deg: DEFAULT_NEAREST_SELECT_EPS_DEG,
        }
    }
}

/// Sparse metadata edit from the palette's detail form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataUpdate {
    /// New display name.
    pub name: String,
    /// New reference code; digits only, or the save is rejected.
    pub code: Option<String>,
    /// New affiliation.
    pub faction: Option<String>,
    /// New notes.
    pub notes: Option<String>,
}

/// A `code` may only contain ASCII digits; empty or absent is fine.
#[must_use]
pub fn is_valid_code(code: Option<&str>) -> bool {
    code.is_none_or(|c| c.bytes().all(|b| b.is_ascii_digit()))
}

/// The placement engine. Owns the session FSM, the drag-gesture arbiter and
/// the single entity layer.
#[derive(Debug, Default)]
pub struct PaletteEngine {
    /// Session state (mode, selection, panel visibility).
    pub session: PlacementSession,
    /// Drag-gesture arbiter.
    pub gesture: GestureState,
    /// Engine knobs.
    pub config: EngineConfig,
    /// The single entity layer; `None` until the first placement. Treated
    /// as copy-on-write — never mutated in place, only replaced.
    pub layer: Option<EntityLayer>,
}

impl PaletteEngine {
    /// Engine with default configuration (geographic host CRS).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with explicit configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// The currently highlighted feature id.
    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.session.selected_id.as_deref()
    }

    // --- Intents ---

    /// Arm a catalog item for click placement. Cancels any pending move and
    /// any in-flight drag so only one intent can fire on the next click.
    pub fn arm(&mut self, item: PaletteItem) -> Vec<Action> {
        self.gesture.cancel();
        self.session.arm(item);
        Vec::new()
    }

    /// Arm relocation of feature `id` and halo it. No-op when the feature
    /// does not exist.
    pub fn start_move(&mut self, id: &str) -> Vec<Action> {
        let exists = self.layer.as_ref().is_some_and(|l| l.find_feature(id).is_some());
        if !exists {
            tracing::debug!(id, "move requested for unknown feature");
            return Vec::new();
        }
        self.gesture.cancel();
        self.session.start_move(id.to_string());
        self.apply_selection(Some(id.to_string()))
    }

    /// Select (or clear) the highlighted feature; the halo rides the same
    /// layer update. Selecting an unknown id is a no-op.
    pub fn select(&mut self, id: Option<&str>) -> Vec<Action> {
        if let Some(wanted) = id {
            let exists = self.layer.as_ref().is_some_and(|l| l.find_feature(wanted).is_some());
            if !exists {
                return Vec::new();
            }
        }
        self.apply_selection(id.map(ToString::to_string))
    }

    // --- Map clicks ---

    /// React to a host map click according to the current mode. A click
    /// whose payload carries no usable coordinate is dropped without
    /// touching the mode.
    pub fn map_click(&mut self, payload: &ClickPayload) -> Vec<Action> {
        let Some(click) = extract_coordinate(payload, &self.config.host_crs) else {
            return Vec::new();
        };
        let [lng, lat] = geo::to_canonical(click.point, &click.crs);
        match std::mem::take(&mut self.session.mode) {
            Mode::Armed(item) => self.create_feature(lng, lat, &item),
            Mode::MoveArmed(id) => self.relocate_feature(&id, lng, lat),
            Mode::Idle => self.select_nearest(lng, lat),
        }
    }

    // --- Drag gestures ---

    /// Start a native browser drag of `item`. Disarms any click intent and
    /// cancels a pending fallback drag.
    pub fn begin_native_drag(&mut self, item: PaletteItem) {
        self.session.disarm();
        self.gesture.start_native(item);
    }

    /// Start the mouse-fallback drag of `item` at screen position `start`.
    /// Disarms any click intent and cancels a pending native drag.
    pub fn begin_fallback_drag(&mut self, item: PaletteItem, start: [f64; 2]) {
        self.session.disarm();
        self.gesture.start_fallback(item, start);
    }

    /// Finish a native drag at `pixel` (relative to the map surface),
    /// resolving through the host's inversion hook. Stale drops — no native
    /// drag in flight — place nothing.
    pub fn complete_drop(
        &mut self,
        pixel: [f64; 2],
        bridge: &dyn PixelToCoordinate,
    ) -> Vec<Action> {
        let Some(item) = self.gesture.finish_native() else {
            return Vec::new();
        };
        self.resolve_and_place(pixel, bridge, item)
    }

    /// Finish the fallback drag: `end_screen` is the mouse-up position for
    /// the distance check, `pixel` the drop point relative to the map
    /// surface. Below-threshold releases are accidental clicks and place
    /// nothing.
    pub fn complete_fallback_drop(
        &mut self,
        end_screen: [f64; 2],
        pixel: [f64; 2],
        bridge: &dyn PixelToCoordinate,
    ) -> Vec<Action> {
        let Some(item) = self.gesture.finish_fallback(end_screen) else {
            return Vec::new();
        };
        self.resolve_and_place(pixel, bridge, item)
    }

    /// Place from a drag/drop source; coordinates arrive pre-resolved in
    /// the host CRS. Identical creation semantics to an armed click, without
    /// requiring prior arming.
    pub fn place_at(&mut self, request: PlacementRequest) -> Vec<Action> {
        let [lng, lat] = geo::to_canonical([request.lng, request.lat], &self.config.host_crs);
        self.create_feature(lng, lat, &request.item)
    }

    // --- Feature mutation ---

    /// Delete a feature and its style rule. No-op when the layer or feature
    /// is missing.
    pub fn delete_feature(&mut self, id: &str) -> Vec<Action> {
        let Some(layer) = &self.layer else {
            return Vec::new();
        };
        if layer.find_feature(id).is_none() {
            return Vec::new();
        }
        let updated = layer.with_feature_removed(id).with_rule_removed(id);
        self.layer = Some(updated.clone());
        let mut actions = vec![Action::UpdateLayer { id: updated.id.clone(), layer: updated }];
        if self.session.selected_id.as_deref() == Some(id) {
            self.session.select(None);
            actions.push(Action::SelectionChanged(None));
        }
        if matches!(&self.session.mode, Mode::MoveArmed(target) if target == id) {
            self.session.disarm();
        }
        actions
    }

    /// Resize and/or rotate a feature's icon. Size clamps to its legal
    /// range; rotation wraps into `[0, 360)`. The rule is rebuilt through
    /// the single choke point, so the halo stays consistent.
    pub fn update_icon_style(&mut self, id: &str, size_delta: f64, rotate_delta: f64) -> Vec<Action> {
        let Some(layer) = &self.layer else {
            return Vec::new();
        };
        let Some(mut icon) = layer.find_rule(id).and_then(style::icon_of) else {
            return Vec::new();
        };
        icon.size = style::clamp_icon_size(icon.size + size_delta);
        icon.rotate = style::wrap_rotation(icon.rotate + rotate_delta);
        let selected = self.session.selected_id.as_deref() == Some(id);
        let updated = layer.with_rule_replaced(style::rebuild_rule(id, &icon, selected));
        self.layer = Some(updated.clone());
        vec![Action::UpdateLayer { id: updated.id.clone(), layer: updated }]
    }

    /// Overwrite a feature's metadata. A non-empty `code` containing
    /// anything but digits blocks the save here as well, even though the UI
    /// already disables the action.
    pub fn update_metadata(&mut self, id: &str, update: MetadataUpdate) -> Vec<Action> {
        if !is_valid_code(update.code.as_deref()) {
            tracing::debug!(id, "metadata save rejected: code must be digits only");
            return Vec::new();
        }
        let Some(layer) = &self.layer else {
            return Vec::new();
        };
        let Some(existing) = layer.find_feature(id) else {
            return Vec::new();
        };
        let mut feature = existing.clone();
        feature.properties.name = update.name;
        feature.properties.code = update.code;
        feature.properties.faction = update.faction;
        feature.properties.notes = update.notes;
        let updated = layer.with_feature_upserted(feature);
        self.layer = Some(updated.clone());
        vec![Action::UpdateLayer { id: updated.id.clone(), layer: updated }]
    }

    // --- Import / export ---

    /// The live features, for serialization by [`crate::io::to_geojson`].
    #[must_use]
    pub fn export_features(&self) -> Vec<EntityFeature> {
        self.layer.as_ref().map(|l| l.features.clone()).unwrap_or_default()
    }

    /// Replace the feature set from an imported collection (already
    /// validated by [`crate::io::from_geojson`]). One default icon rule is
    /// regenerated per feature so geometry and style stay joined; a
    /// selection pointing at a vanished feature is cleared.
    pub fn import_features(&mut self, features: Vec<EntityFeature>) -> Vec<Action> {
        let rules = features
            .iter()
            .map(|f| style::rebuild_rule(&f.eid, &IconStyle::with_image(&f.properties.image), false))
            .collect();
        let was_absent = self.layer.is_none();
        let base = match &self.layer {
            Some(layer) => layer.with_features_replaced(features, rules),
            None => EntityLayer::empty().with_features_replaced(features, rules),
        };
        let mut selection_actions = Vec::new();
        let synced = match self.session.selected_id.clone() {
            Some(sel) if base.find_feature(&sel).is_some() => {
                style::with_selection_synced(&base, Some(&sel))
            }
            Some(_) => {
                self.session.select(None);
                selection_actions.push(Action::SelectionChanged(None));
                base
            }
            None => base,
        };
        self.layer = Some(synced.clone());
        let mut actions = vec![layer_action(was_absent, synced)];
        actions.extend(selection_actions);
        actions
    }

    // --- Internals ---

    fn create_feature(&mut self, lng: f64, lat: f64, item: &PaletteItem) -> Vec<Action> {
        let id = new_entity_id();
        let name = match &self.layer {
            Some(layer) => next_available_name(&item.label, &layer.features),
            None => next_available_name(&item.label, &[]),
        };
        let properties = EntityProperties { name, image: item.icon.clone(), ..Default::default() };
        let feature = EntityFeature::new(id.clone(), lng, lat, properties);
        let rule = style::rebuild_rule(&id, &IconStyle::with_image(&item.icon), false);
        let was_absent = self.layer.is_none();
        let base = match &self.layer {
            Some(layer) => layer.with_feature_upserted(feature).with_rule_replaced(rule),
            None => EntityLayer::bootstrap(feature, rule),
        };
        self.session.select(Some(id.clone()));
        let synced = style::with_selection_synced(&base, Some(&id));
        self.layer = Some(synced.clone());
        vec![layer_action(was_absent, synced), Action::SelectionChanged(Some(id))]
    }

    fn relocate_feature(&mut self, id: &str, lng: f64, lat: f64) -> Vec<Action> {
        let Some(layer) = &self.layer else {
            return Vec::new();
        };
        let Some(existing) = layer.find_feature(id) else {
            tracing::debug!(id, "move target vanished before the click");
            return Vec::new();
        };
        let moved = EntityFeature::new(id.to_string(), lng, lat, existing.properties.clone());
        // migrate first so a legacy-CRS layer comes along in the same update
        let updated = layer.with_features_migrated().with_feature_upserted(moved);
        self.session.select(Some(id.to_string()));
        let synced = style::with_selection_synced(&updated, Some(id));
        self.layer = Some(synced.clone());
        vec![
            Action::UpdateLayer { id: synced.id.clone(), layer: synced },
            Action::SelectionChanged(Some(id.to_string())),
        ]
    }

    fn select_nearest(&mut self, lng: f64, lat: f64) -> Vec<Action> {
        let nearest = {
            let Some(layer) = &self.layer else {
                return Vec::new();
            };
            let mut best: Option<(&EntityFeature, f64)> = None;
            for feature in &layer.features {
                let [fx, fy] = feature.geometry.coordinates();
                let dist = ((fx - lng).powi(2) + (fy - lat).powi(2)).sqrt();
                if best.as_ref().is_none_or(|(_, d)| dist < *d) {
                    best = Some((feature, dist));
                }
            }
            match best {
                Some((feature, dist)) if dist <= self.config.nearest_select_eps_deg => {
                    Some(feature.id.clone())
                }
                _ => None,
            }
        };
        match nearest {
            Some(id) => self.apply_selection(Some(id)),
            None => Vec::new(),
        }
    }

    /// Selection change + halo sync as one atomic layer update.
    fn apply_selection(&mut self, id: Option<EntityId>) -> Vec<Action> {
        self.session.select(id.clone());
        let mut actions = Vec::new();
        if let Some(layer) = &self.layer {
            let synced = style::with_selection_synced(layer, id.as_deref());
            self.layer = Some(synced.clone());
            actions.push(Action::UpdateLayer { id: synced.id.clone(), layer: synced });
        }
        actions.push(Action::SelectionChanged(id));
        actions
    }

    fn resolve_and_place(
        &mut self,
        pixel: [f64; 2],
        bridge: &dyn PixelToCoordinate,
        item: PaletteItem,
    ) -> Vec<Action> {
        let Some([lng, lat]) = bridge.pixel_to_coordinate(pixel) else {
            tracing::debug!(?pixel, "drop discarded: pixel did not resolve to a coordinate");
            return Vec::new();
        };
        self.place_at(PlacementRequest { lng, lat, item })
    }
}

fn new_entity_id() -> EntityId {
    format!("entity-{}", Uuid::new_v4())
}

fn layer_action(was_absent: bool, layer: EntityLayer) -> Action {
    if was_absent {
        Action::AddLayer(layer)
    } else {
        Action::UpdateLayer { id: layer.id.clone(), layer }
    }
}
