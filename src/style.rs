//! Selection halo and icon-transform synchronization.
//!
//! The invariant: the rule of the currently selected feature — and only that
//! rule — carries a leading halo symbolizer, sized from the icon it
//! surrounds. Every path that could affect a rule's visual composition goes
//! through [`rebuild_rule`], which recomputes halo and icon together, so a
//! rule can never end up with a stale, duplicate, or orphaned halo.

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

use crate::consts::{
    HALO_IMAGE, HALO_SIZE_MAX, HALO_SIZE_MIN, HALO_SIZE_PAD, ICON_OPACITY_DEFAULT,
    ICON_SIZE_DEFAULT, ICON_SIZE_MAX, ICON_SIZE_MIN,
};
use crate::layer::{EidFilter, EntityLayer, StyleRule, Symbolizer};

/// The icon half of a rule, independent of selection state.
#[derive(Debug, Clone, PartialEq)]
pub struct IconStyle {
    /// Marker image.
    pub image: String,
    /// Size in pixels, kept within `[ICON_SIZE_MIN, ICON_SIZE_MAX]`.
    pub size: f64,
    /// Rotation in degrees, kept within `[0, 360)`.
    pub rotate: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

impl IconStyle {
    /// Default-sized, unrotated icon showing `image`.
    #[must_use]
    pub fn with_image(image: &str) -> Self {
        Self {
            image: image.to_string(),
            size: ICON_SIZE_DEFAULT,
            rotate: 0.0,
            opacity: ICON_OPACITY_DEFAULT,
        }
    }
}

/// Clamp an icon size into its legal range.
#[must_use]
pub fn clamp_icon_size(size: f64) -> f64 {
    size.clamp(ICON_SIZE_MIN, ICON_SIZE_MAX)
}

/// Wrap a rotation into `[0, 360)` degrees.
#[must_use]
pub fn wrap_rotation(degrees: f64) -> f64 {
    degrees.rem_euclid(360.0)
}

/// Halo size for an icon of `icon_size` pixels.
#[must_use]
pub fn halo_size(icon_size: f64) -> f64 {
    (icon_size + HALO_SIZE_PAD).clamp(HALO_SIZE_MIN, HALO_SIZE_MAX)
}

/// Whether a symbolizer is the selection halo.
#[must_use]
pub fn is_halo(symbolizer: &Symbolizer) -> bool {
    match symbolizer {
        Symbolizer::Icon { image, .. } => image == HALO_IMAGE,
    }
}

/// Rebuild one feature's rule from scratch. This is the single choke point
/// for rule composition: the halo leads iff `selected`, and the icon's size
/// and rotation are normalized on the way through.
#[must_use]
pub fn rebuild_rule(eid: &str, icon: &IconStyle, selected: bool) -> StyleRule {
    let mut symbolizers = Vec::with_capacity(2);
    if selected {
        symbolizers.push(Symbolizer::Icon {
            image: HALO_IMAGE.to_string(),
            size: halo_size(clamp_icon_size(icon.size)),
            rotate: 0.0,
            opacity: ICON_OPACITY_DEFAULT,
        });
    }
    symbolizers.push(Symbolizer::Icon {
        image: icon.image.clone(),
        size: clamp_icon_size(icon.size),
        rotate: wrap_rotation(icon.rotate),
        opacity: icon.opacity,
    });
    StyleRule { name: String::new(), filter: EidFilter(eid.to_string()), symbolizers }
}

/// Extract the real icon from a rule, skipping a halo. `None` for a rule
/// that somehow carries no icon at all.
#[must_use]
pub fn icon_of(rule: &StyleRule) -> Option<IconStyle> {
    rule.symbolizers.iter().find(|s| !is_halo(s)).map(|s| match s {
        Symbolizer::Icon { image, size, rotate, opacity } => IconStyle {
            image: image.clone(),
            size: *size,
            rotate: *rotate,
            opacity: *opacity,
        },
    })
}

/// New layer with every rule rebuilt so that exactly the rule of `selected`
/// (when present) carries the halo. Applied on every selection change so the
/// halo can never desynchronize from the geometry it decorates.
#[must_use]
pub fn with_selection_synced(layer: &EntityLayer, selected: Option<&str>) -> EntityLayer {
    let rules = layer
        .style
        .body
        .rules
        .iter()
        .map(|rule| {
            let icon = icon_of(rule).unwrap_or_else(|| IconStyle::with_image(""));
            rebuild_rule(rule.eid(), &icon, Some(rule.eid()) == selected)
        })
        .collect();
    let mut synced = layer.clone();
    synced.style.body.rules = rules;
    synced
}
