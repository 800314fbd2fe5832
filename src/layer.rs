//! Entity layer model and projector.
//!
//! This module defines the wire-shaped types that make up the single entity
//! layer — point features, geostyler-style rules, and the layer descriptor
//! itself — plus the pure functions that derive the next layer value from
//! the previous one. The layer is treated as a copy-on-write value: every
//! projector function takes a reference and returns a new layer, so shared
//! feature and rule containers are never mutated in place.

#[cfg(test)]
#[path = "layer_test.rs"]
mod layer_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::consts::{
    CANONICAL_CRS, ENTITY_LAYER_GROUP, ENTITY_LAYER_ID, ENTITY_LAYER_NAME, ICON_OPACITY_DEFAULT,
};
use crate::geo;

/// Stable identifier of a placed entity; also the style-rule join key.
pub type EntityId = String;

/// Per-feature metadata, editable from the palette's detail form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityProperties {
    /// Display name; defaults to `"<label> <N>"` on placement.
    pub name: String,
    /// Numeric reference code; digits only when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Free-form affiliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Marker image, carried on the feature so a restyle or reload can
    /// recover it without the catalog.
    #[serde(default)]
    pub image: String,
}

/// Point geometry, tagged the GeoJSON way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A single position, `[lng, lat]` in the canonical CRS.
    Point {
        /// Longitude, latitude.
        coordinates: [f64; 2],
    },
}

impl Geometry {
    /// Point geometry at `(lng, lat)`.
    #[must_use]
    pub fn point(lng: f64, lat: f64) -> Self {
        Self::Point { coordinates: [lng, lat] }
    }

    /// The stored `[lng, lat]` pair.
    #[must_use]
    pub fn coordinates(&self) -> [f64; 2] {
        match self {
            Self::Point { coordinates } => *coordinates,
        }
    }
}

/// GeoJSON `"type"` tag of a single feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    /// The only valid value.
    #[default]
    Feature,
}

/// A placed entity: one point feature of the entity layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFeature {
    /// Always `"Feature"`.
    #[serde(rename = "type", default)]
    pub feature_type: FeatureType,
    /// Stable id, generated at placement.
    pub id: EntityId,
    /// Always equal to `id`; the join key style-rule filters reference.
    #[serde(default)]
    pub eid: EntityId,
    /// Stored geometry, canonical CRS.
    pub geometry: Geometry,
    /// Editable metadata.
    pub properties: EntityProperties,
}

impl EntityFeature {
    /// Build a feature at `(lng, lat)`. `eid` is derived from `id`, which is
    /// the only way the two stay equal by construction.
    #[must_use]
    pub fn new(id: EntityId, lng: f64, lat: f64, properties: EntityProperties) -> Self {
        Self {
            feature_type: FeatureType::Feature,
            eid: id.clone(),
            id,
            geometry: Geometry::point(lng, lat),
            properties,
        }
    }
}

/// Equality filter selecting exactly one feature's rule, serialized as
/// `["==", "eid", <id>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EidFilter(pub EntityId);

impl Serialize for EidFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ("==", "eid", self.0.as_str()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EidFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (op, field, value): (String, String, String) = Deserialize::deserialize(deserializer)?;
        // "id" is the pre-eid field name still found in saved documents
        if op != "==" || (field != "eid" && field != "id") {
            return Err(D::Error::custom("expected an [\"==\", \"eid\", <id>] filter"));
        }
        Ok(Self(value))
    }
}

fn default_opacity() -> f64 {
    ICON_OPACITY_DEFAULT
}

/// Geostyler-shaped symbolizer. The selection halo is an `Icon` carrying the
/// fixed two-ring image from [`crate::consts::HALO_IMAGE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Symbolizer {
    /// An image marker.
    Icon {
        /// Asset path or URL of the image.
        image: String,
        /// Rendered size in pixels.
        size: f64,
        /// Clockwise rotation in degrees, `[0, 360)`.
        #[serde(default)]
        rotate: f64,
        /// Opacity in `[0, 1]`.
        #[serde(default = "default_opacity")]
        opacity: f64,
    },
}

/// One filter + symbolizer pairing controlling how one feature renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    /// Rule name; unused, kept for the wire shape.
    #[serde(default)]
    pub name: String,
    /// Which feature this rule applies to.
    pub filter: EidFilter,
    /// Halo (when selected) followed by the real icon.
    pub symbolizers: Vec<Symbolizer>,
}

impl StyleRule {
    /// The feature id this rule is keyed on.
    #[must_use]
    pub fn eid(&self) -> &str {
        &self.filter.0
    }
}

/// The `style.body` of the layer descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleBody {
    /// Style name; unused, kept for the wire shape.
    #[serde(default)]
    pub name: String,
    /// One rule per live feature.
    pub rules: Vec<StyleRule>,
}

/// The layer's style envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    /// Always `"geostyler"`.
    pub format: String,
    /// The rules themselves.
    pub body: StyleBody,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self { format: "geostyler".to_string(), body: StyleBody::default() }
    }
}

/// The single layer owning all placed entities. Created lazily on first
/// placement and mutated copy-on-write afterwards; its `id` never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityLayer {
    /// Always [`crate::consts::ENTITY_LAYER_ID`].
    pub id: String,
    /// Always `"vector"`.
    #[serde(rename = "type")]
    pub layer_type: String,
    /// Display name.
    pub name: String,
    /// Containing layer group.
    pub group: String,
    /// Whether the layer renders.
    pub visibility: bool,
    /// CRS the stored feature coordinates are expressed in.
    #[serde(rename = "featuresCrs")]
    pub features_crs: String,
    /// The placed entities.
    pub features: Vec<EntityFeature>,
    /// One style rule per feature.
    pub style: LayerStyle,
}

impl EntityLayer {
    /// An empty layer descriptor: visible, canonical CRS, no features.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: ENTITY_LAYER_ID.to_string(),
            layer_type: "vector".to_string(),
            name: ENTITY_LAYER_NAME.to_string(),
            group: ENTITY_LAYER_GROUP.to_string(),
            visibility: true,
            features_crs: CANONICAL_CRS.to_string(),
            features: Vec::new(),
            style: LayerStyle::default(),
        }
    }

    /// First-placement bootstrap: the empty layer plus one feature and its
    /// rule.
    #[must_use]
    pub fn bootstrap(feature: EntityFeature, rule: StyleRule) -> Self {
        let mut layer = Self::empty();
        layer.features.push(feature);
        layer.style.body.rules.push(rule);
        layer
    }

    /// Look up a feature by id.
    #[must_use]
    pub fn find_feature(&self, id: &str) -> Option<&EntityFeature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Look up the rule keyed on `eid`.
    #[must_use]
    pub fn find_rule(&self, eid: &str) -> Option<&StyleRule> {
        self.style.body.rules.iter().find(|r| r.eid() == eid)
    }

    /// New layer with `feature` replacing its same-id predecessor, or
    /// appended when there is none.
    #[must_use]
    pub fn with_feature_upserted(&self, feature: EntityFeature) -> Self {
        let mut layer = self.clone();
        match layer.features.iter_mut().find(|f| f.id == feature.id) {
            Some(existing) => *existing = feature,
            None => layer.features.push(feature),
        }
        layer
    }

    /// New layer without the feature `id` (rules are untouched; pair with
    /// [`Self::with_rule_removed`]).
    #[must_use]
    pub fn with_feature_removed(&self, id: &str) -> Self {
        let mut layer = self.clone();
        layer.features.retain(|f| f.id != id);
        layer
    }

    /// New layer with `rule` replacing the rule keyed on the same eid, or
    /// appended when there is none.
    #[must_use]
    pub fn with_rule_replaced(&self, rule: StyleRule) -> Self {
        let mut layer = self.clone();
        match layer.style.body.rules.iter_mut().find(|r| r.eid() == rule.eid()) {
            Some(existing) => *existing = rule,
            None => layer.style.body.rules.push(rule),
        }
        layer
    }

    /// New layer without the rule keyed on `eid`.
    #[must_use]
    pub fn with_rule_removed(&self, eid: &str) -> Self {
        let mut layer = self.clone();
        layer.style.body.rules.retain(|r| r.eid() != eid);
        layer
    }

    /// New layer with the feature set and rule set replaced wholesale
    /// (import path).
    #[must_use]
    pub fn with_features_replaced(&self, features: Vec<EntityFeature>, rules: Vec<StyleRule>) -> Self {
        let mut layer = self.clone();
        layer.features = features;
        layer.style.body.rules = rules;
        layer.features_crs = CANONICAL_CRS.to_string();
        layer
    }

    /// New layer with every stored coordinate migrated into the canonical
    /// CRS. Identity when the layer is already canonical; per-coordinate
    /// failures keep the original value.
    #[must_use]
    pub fn with_features_migrated(&self) -> Self {
        if geo::normalize_crs(&self.features_crs).eq_ignore_ascii_case(CANONICAL_CRS) {
            return self.clone();
        }
        let mut layer = self.clone();
        for feature in &mut layer.features {
            let [lng, lat] = geo::to_canonical(feature.geometry.coordinates(), &self.features_crs);
            feature.geometry = Geometry::point(lng, lat);
        }
        layer.features_crs = CANONICAL_CRS.to_string();
        layer
    }
}

/// Next free `"<base> <N>"` name: scans existing feature names matching the
/// pattern (base compared case-insensitively) and returns `max(N) + 1`, or
/// `1` when nothing matches.
#[must_use]
pub fn next_available_name(base: &str, features: &[EntityFeature]) -> String {
    let next = features
        .iter()
        .filter_map(|f| trailing_index(base, &f.properties.name))
        .max()
        .map_or(1, |n| n + 1);
    format!("{base} {next}")
}

/// Parse `"<base><ws*><N>"` into `N`. The separator is optional to match
/// names written by hand.
fn trailing_index(base: &str, name: &str) -> Option<u32> {
    let name = name.trim();
    if !name.is_char_boundary(base.len()) || name.len() <= base.len() {
        return None;
    }
    let (head, tail) = name.split_at(base.len());
    if !head.eq_ignore_ascii_case(base) {
        return None;
    }
    let digits = tail.trim_start();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.parse() {
        Ok(n) => Some(n),
        Err(_) => None,
    }
}
