#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use serde_json::json;

use crate::consts::{HALO_IMAGE, ICON_SIZE_DEFAULT, ICON_SIZE_MAX, WEB_MERCATOR_LEGACY};
use crate::layer::Symbolizer;

use super::*;

// =============================================================
// Helpers
// =============================================================

fn make_item(id: &str, label: &str) -> PaletteItem {
    PaletteItem {
        id: id.to_string(),
        label: label.to_string(),
        icon: format!("markers/{id}.png"),
        group_id: None,
    }
}

fn click_at(lng: f64, lat: f64) -> ClickPayload {
    serde_json::from_value(json!({ "latlng": { "lng": lng, "lat": lat } })).unwrap()
}

/// Arm `item` and click. Returns the placed feature id.
fn place(engine: &mut PaletteEngine, item: &PaletteItem, lng: f64, lat: f64) -> EntityId {
    engine.arm(item.clone());
    let actions = engine.map_click(&click_at(lng, lat));
    selected_id(&actions).expect("placement should select the new feature")
}

/// The id carried by the last SelectionChanged in `actions`, if any.
fn selected_id(actions: &[Action]) -> Option<EntityId> {
    actions.iter().rev().find_map(|a| match a {
        Action::SelectionChanged(id) => id.clone(),
        _ => None,
    })
}

fn final_layer(actions: &[Action]) -> &EntityLayer {
    actions
        .iter()
        .rev()
        .find_map(|a| match a {
            Action::AddLayer(layer) | Action::UpdateLayer { layer, .. } => Some(layer),
            Action::SelectionChanged(_) => None,
        })
        .expect("expected a layer action")
}

fn rule_has_halo(layer: &EntityLayer, eid: &str) -> bool {
    layer
        .find_rule(eid)
        .is_some_and(|rule| rule.symbolizers.iter().any(style::is_halo))
}

/// Fixed-answer inversion hook for drop tests.
struct FixedBridge(Option<[f64; 2]>);

impl PixelToCoordinate for FixedBridge {
    fn pixel_to_coordinate(&self, _pixel: [f64; 2]) -> Option<[f64; 2]> {
        self.0
    }
}

// =============================================================
// Armed placement
// =============================================================

#[test]
fn first_placement_adds_the_layer() {
    let mut engine = PaletteEngine::new();
    engine.arm(make_item("car-red", "Car"));
    let actions = engine.map_click(&click_at(10.0, 20.0));

    assert!(matches!(actions[0], Action::AddLayer(_)));
    let layer = final_layer(&actions);
    assert_eq!(layer.features.len(), 1);
    assert_eq!(layer.style.body.rules.len(), 1);
    assert_eq!(layer.features[0].geometry.coordinates(), [10.0, 20.0]);
    assert_eq!(layer.features[0].properties.name, "Car 1");
}

#[test]
fn placement_selects_and_halos_the_new_feature() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);

    assert_eq!(engine.selection(), Some(id.as_str()));
    let layer = engine.layer.as_ref().unwrap();
    assert!(rule_has_halo(layer, &id));
}

#[test]
fn placement_consumes_the_armed_mode() {
    let mut engine = PaletteEngine::new();
    place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    assert_eq!(engine.session.mode, Mode::Idle);
}

#[test]
fn second_placement_updates_the_layer() {
    let mut engine = PaletteEngine::new();
    let item = make_item("car-red", "Car");
    place(&mut engine, &item, 10.0, 20.0);
    engine.arm(item);
    let actions = engine.map_click(&click_at(11.0, 21.0));

    assert!(matches!(actions[0], Action::UpdateLayer { .. }));
    assert_eq!(final_layer(&actions).features.len(), 2);
}

#[test]
fn sequential_names_skip_to_max_plus_one() {
    let mut engine = PaletteEngine::new();
    let item = make_item("car-red", "Car");
    let first = place(&mut engine, &item, 10.0, 20.0);
    place(&mut engine, &item, 11.0, 21.0);
    engine.delete_feature(&first);
    let third = place(&mut engine, &item, 12.0, 22.0);

    let layer = engine.layer.as_ref().unwrap();
    // "Car 2" survives, so the next index counts from it
    assert_eq!(layer.find_feature(&third).unwrap().properties.name, "Car 3");
}

#[test]
fn placement_ids_are_unique_and_prefixed() {
    let mut engine = PaletteEngine::new();
    let item = make_item("car-red", "Car");
    let a = place(&mut engine, &item, 10.0, 20.0);
    let b = place(&mut engine, &item, 11.0, 21.0);
    assert_ne!(a, b);
    assert!(a.starts_with("entity-"));
}

#[test]
fn feature_id_matches_its_rule_eid() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    let layer = engine.layer.as_ref().unwrap();
    assert!(layer.find_rule(&id).is_some());
    assert_eq!(layer.find_feature(&id).unwrap().eid, id);
}

#[test]
fn unusable_click_keeps_the_armed_mode() {
    let mut engine = PaletteEngine::new();
    engine.arm(make_item("car-red", "Car"));
    let actions = engine.map_click(&ClickPayload::default());
    assert!(actions.is_empty());
    assert!(matches!(engine.session.mode, Mode::Armed(_)));
}

#[test]
fn arming_cancels_an_in_flight_drag() {
    let mut engine = PaletteEngine::new();
    engine.begin_native_drag(make_item("car-red", "Car"));
    engine.arm(make_item("tank", "Tank"));
    assert!(engine.gesture.is_idle());
}

// =============================================================
// CRS handling
// =============================================================

#[test]
fn projected_click_is_stored_in_degrees() {
    let mut engine = PaletteEngine::with_config(EngineConfig {
        host_crs: "EPSG:3857".to_string(),
        ..EngineConfig::default()
    });
    engine.arm(make_item("car-red", "Car"));
    let payload =
        serde_json::from_value(json!({ "coordinate": [1_113_194.907_932_736_2, 0.0] })).unwrap();
    let actions = engine.map_click(&payload);

    let [lng, lat] = final_layer(&actions).features[0].geometry.coordinates();
    assert!((lng - 10.0).abs() < 1e-9);
    assert!(lat.abs() < 1e-9);
}

#[test]
fn latlng_on_projected_host_is_not_reconverted() {
    let mut engine = PaletteEngine::with_config(EngineConfig {
        host_crs: "EPSG:3857".to_string(),
        ..EngineConfig::default()
    });
    engine.arm(make_item("car-red", "Car"));
    // payload has only the geographic pair; it must pass through untouched
    let actions = engine.map_click(&click_at(10.0, 20.0));
    assert_eq!(final_layer(&actions).features[0].geometry.coordinates(), [10.0, 20.0]);
}

#[test]
fn unknown_host_crs_keeps_raw_values() {
    let mut engine = PaletteEngine::with_config(EngineConfig {
        host_crs: "EPSG:2154".to_string(),
        ..EngineConfig::default()
    });
    let actions = engine.place_at(PlacementRequest {
        lng: 700_000.0,
        lat: 6_600_000.0,
        item: make_item("car-red", "Car"),
    });
    // best-effort fallback: the unsupported CRS leaves coordinates as-is
    assert_eq!(final_layer(&actions).features[0].geometry.coordinates(), [700_000.0, 6_600_000.0]);
}

// =============================================================
// Move
// =============================================================

#[test]
fn move_relocates_and_preserves_properties() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.update_metadata(
        &id,
        MetadataUpdate {
            name: "Recon car".to_string(),
            code: Some("1234".to_string()),
            faction: Some("blue".to_string()),
            notes: None,
        },
    );

    engine.start_move(&id);
    let actions = engine.map_click(&click_at(30.0, 40.0));

    let layer = final_layer(&actions);
    assert_eq!(layer.features.len(), 1);
    assert_eq!(layer.style.body.rules.len(), 1);
    let feature = layer.find_feature(&id).unwrap();
    assert_eq!(feature.geometry.coordinates(), [30.0, 40.0]);
    assert_eq!(feature.properties.name, "Recon car");
    assert_eq!(feature.properties.code.as_deref(), Some("1234"));
}

#[test]
fn move_consumes_the_armed_mode() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.start_move(&id);
    engine.map_click(&click_at(30.0, 40.0));
    assert_eq!(engine.session.mode, Mode::Idle);
}

#[test]
fn start_move_selects_the_target() {
    let mut engine = PaletteEngine::new();
    let item = make_item("car-red", "Car");
    let a = place(&mut engine, &item, 10.0, 20.0);
    let b = place(&mut engine, &item, 11.0, 21.0);
    assert_eq!(engine.selection(), Some(b.as_str()));

    let actions = engine.start_move(&a);
    assert_eq!(selected_id(&actions), Some(a.clone()));
    let layer = engine.layer.as_ref().unwrap();
    assert!(rule_has_halo(layer, &a));
    assert!(!rule_has_halo(layer, &b));
}

#[test]
fn move_of_unknown_feature_is_a_no_op() {
    let mut engine = PaletteEngine::new();
    place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    let actions = engine.start_move("entity-missing");
    assert!(actions.is_empty());
    assert_eq!(engine.session.mode, Mode::Idle);
}

#[test]
fn move_migrates_a_legacy_crs_layer() {
    let mut engine = PaletteEngine::new();
    let item = make_item("car-red", "Car");
    let a = place(&mut engine, &item, 10.0, 0.0);
    let b = place(&mut engine, &item, 20.0, 0.0);

    // simulate a layer saved before the canonical-CRS migration
    let mut stale = engine.layer.clone().unwrap();
    stale.features_crs = WEB_MERCATOR_LEGACY.to_string();
    for feature in &mut stale.features {
        let [lng, _] = feature.geometry.coordinates();
        feature.geometry = crate::layer::Geometry::point(lng * 111_319.490_793_273_62, 0.0);
    }
    engine.layer = Some(stale);

    engine.start_move(&a);
    let actions = engine.map_click(&click_at(30.0, 40.0));

    let layer = final_layer(&actions);
    assert_eq!(layer.features_crs, CANONICAL_CRS);
    let [b_lng, _] = layer.find_feature(&b).unwrap().geometry.coordinates();
    assert!((b_lng - 20.0).abs() < 1e-9);
}

// =============================================================
// Idle-click selection
// =============================================================

#[test]
fn idle_click_selects_the_nearest_feature() {
    let mut engine = PaletteEngine::new();
    let item = make_item("car-red", "Car");
    let a = place(&mut engine, &item, 10.0, 20.0);
    let b = place(&mut engine, &item, 10.01, 20.0);

    let actions = engine.map_click(&click_at(10.0001, 20.0));
    assert_eq!(selected_id(&actions), Some(a.clone()));
    let layer = engine.layer.as_ref().unwrap();
    assert!(rule_has_halo(layer, &a));
    assert!(!rule_has_halo(layer, &b));
}

#[test]
fn idle_click_beyond_threshold_selects_nothing() {
    let mut engine = PaletteEngine::new();
    place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.select(None);

    let actions = engine.map_click(&click_at(10.01, 20.0));
    assert!(actions.is_empty());
    assert_eq!(engine.selection(), None);
}

#[test]
fn selection_radius_is_configurable() {
    let mut engine = PaletteEngine::with_config(EngineConfig {
        nearest_select_eps_deg: 0.1,
        ..EngineConfig::default()
    });
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.select(None);

    let actions = engine.map_click(&click_at(10.05, 20.0));
    assert_eq!(selected_id(&actions), Some(id));
}

#[test]
fn idle_click_with_no_layer_is_a_no_op() {
    let mut engine = PaletteEngine::new();
    assert!(engine.map_click(&click_at(10.0, 20.0)).is_empty());
}

#[test]
fn select_unknown_id_is_a_no_op() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    assert!(engine.select(Some("entity-missing")).is_empty());
    assert_eq!(engine.selection(), Some(id.as_str()));
}

#[test]
fn reselecting_moves_the_halo() {
    let mut engine = PaletteEngine::new();
    let item = make_item("car-red", "Car");
    let a = place(&mut engine, &item, 10.0, 20.0);
    let b = place(&mut engine, &item, 11.0, 21.0);

    engine.select(Some(&a));
    let layer = engine.layer.as_ref().unwrap();
    assert!(rule_has_halo(layer, &a));
    assert!(!rule_has_halo(layer, &b));
}

#[test]
fn clearing_the_selection_drops_every_halo() {
    let mut engine = PaletteEngine::new();
    let a = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    let actions = engine.select(None);
    assert_eq!(selected_id(&actions), None);
    assert!(!rule_has_halo(engine.layer.as_ref().unwrap(), &a));
}

// =============================================================
// Drag and drop
// =============================================================

#[test]
fn native_drop_places_through_the_bridge() {
    let mut engine = PaletteEngine::new();
    engine.begin_native_drag(make_item("car-red", "Car"));
    let actions = engine.complete_drop([120.0, 80.0], &FixedBridge(Some([10.0, 20.0])));

    let layer = final_layer(&actions);
    assert_eq!(layer.features[0].geometry.coordinates(), [10.0, 20.0]);
    assert!(engine.gesture.is_idle());
}

#[test]
fn drop_without_a_drag_places_nothing() {
    let mut engine = PaletteEngine::new();
    let actions = engine.complete_drop([120.0, 80.0], &FixedBridge(Some([10.0, 20.0])));
    assert!(actions.is_empty());
    assert!(engine.layer.is_none());
}

#[test]
fn drop_with_unresolvable_pixel_places_nothing() {
    let mut engine = PaletteEngine::new();
    engine.begin_native_drag(make_item("car-red", "Car"));
    let actions = engine.complete_drop([120.0, 80.0], &FixedBridge(None));
    assert!(actions.is_empty());
    assert!(engine.layer.is_none());
    assert!(engine.gesture.is_idle());
}

#[test]
fn fallback_drop_above_threshold_places() {
    let mut engine = PaletteEngine::new();
    engine.begin_fallback_drag(make_item("car-red", "Car"), [0.0, 0.0]);
    let actions =
        engine.complete_fallback_drop([10.0, 0.0], [120.0, 80.0], &FixedBridge(Some([10.0, 20.0])));
    assert_eq!(final_layer(&actions).features.len(), 1);
}

#[test]
fn fallback_drop_below_threshold_is_discarded() {
    let mut engine = PaletteEngine::new();
    engine.begin_fallback_drag(make_item("car-red", "Car"), [0.0, 0.0]);
    let actions =
        engine.complete_fallback_drop([3.0, 0.0], [120.0, 80.0], &FixedBridge(Some([10.0, 20.0])));
    assert!(actions.is_empty());
    assert!(engine.layer.is_none());
}

#[test]
fn starting_a_drag_disarms_the_click_intent() {
    let mut engine = PaletteEngine::new();
    engine.arm(make_item("car-red", "Car"));
    engine.begin_native_drag(make_item("tank", "Tank"));
    assert_eq!(engine.session.mode, Mode::Idle);
}

#[test]
fn the_two_drag_kinds_are_mutually_exclusive() {
    let mut engine = PaletteEngine::new();
    engine.begin_native_drag(make_item("car-red", "Car"));
    engine.begin_fallback_drag(make_item("tank", "Tank"), [0.0, 0.0]);
    // the native drop is stale now
    let actions = engine.complete_drop([120.0, 80.0], &FixedBridge(Some([10.0, 20.0])));
    assert!(actions.is_empty());
}

#[test]
fn drop_converts_from_a_projected_host() {
    let mut engine = PaletteEngine::with_config(EngineConfig {
        host_crs: "EPSG:3857".to_string(),
        ..EngineConfig::default()
    });
    engine.begin_native_drag(make_item("car-red", "Car"));
    let actions =
        engine.complete_drop([0.0, 0.0], &FixedBridge(Some([1_113_194.907_932_736_2, 0.0])));
    let [lng, _] = final_layer(&actions).features[0].geometry.coordinates();
    assert!((lng - 10.0).abs() < 1e-9);
}

// =============================================================
// Delete
// =============================================================

#[test]
fn delete_removes_feature_and_rule() {
    let mut engine = PaletteEngine::new();
    let item = make_item("car-red", "Car");
    let a = place(&mut engine, &item, 10.0, 20.0);
    let b = place(&mut engine, &item, 11.0, 21.0);

    let actions = engine.delete_feature(&a);
    let layer = final_layer(&actions);
    assert!(layer.find_feature(&a).is_none());
    assert!(layer.find_rule(&a).is_none());
    assert!(layer.find_feature(&b).is_some());
}

#[test]
fn deleting_the_selected_feature_clears_the_selection() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    let actions = engine.delete_feature(&id);
    assert!(actions.contains(&Action::SelectionChanged(None)));
    assert_eq!(engine.selection(), None);
}

#[test]
fn deleting_an_unselected_feature_keeps_the_selection() {
    let mut engine = PaletteEngine::new();
    let item = make_item("car-red", "Car");
    let a = place(&mut engine, &item, 10.0, 20.0);
    let b = place(&mut engine, &item, 11.0, 21.0);

    let actions = engine.delete_feature(&a);
    assert!(!actions.iter().any(|action| matches!(action, Action::SelectionChanged(_))));
    assert_eq!(engine.selection(), Some(b.as_str()));
}

#[test]
fn deleting_the_move_target_disarms_the_move() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.start_move(&id);
    engine.delete_feature(&id);
    assert_eq!(engine.session.mode, Mode::Idle);
}

#[test]
fn delete_of_unknown_feature_is_a_no_op() {
    let mut engine = PaletteEngine::new();
    place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    assert!(engine.delete_feature("entity-missing").is_empty());
}

// =============================================================
// Icon restyle
// =============================================================

fn icon_of_feature(engine: &PaletteEngine, id: &str) -> IconStyle {
    let layer = engine.layer.as_ref().unwrap();
    style::icon_of(layer.find_rule(id).unwrap()).unwrap()
}

#[test]
fn size_deltas_accumulate() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.update_icon_style(&id, 6.0, 0.0);
    engine.update_icon_style(&id, 6.0, 0.0);
    assert_eq!(icon_of_feature(&engine, &id).size, ICON_SIZE_DEFAULT + 12.0);
}

#[test]
fn size_clamps_at_the_ceiling() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.update_icon_style(&id, 1_000.0, 0.0);
    assert_eq!(icon_of_feature(&engine, &id).size, ICON_SIZE_MAX);
}

#[test]
fn rotation_wraps_forward_and_backward() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.update_icon_style(&id, 0.0, 350.0);
    engine.update_icon_style(&id, 0.0, 20.0);
    assert_eq!(icon_of_feature(&engine, &id).rotate, 10.0);
    engine.update_icon_style(&id, 0.0, -30.0);
    assert_eq!(icon_of_feature(&engine, &id).rotate, 340.0);
}

#[test]
fn restyle_keeps_the_halo_of_a_selected_feature() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.update_icon_style(&id, 6.0, 0.0);

    let layer = engine.layer.as_ref().unwrap();
    let rule = layer.find_rule(&id).unwrap();
    assert!(style::is_halo(&rule.symbolizers[0]));
    // halo tracks the grown icon
    let Symbolizer::Icon { size, .. } = &rule.symbolizers[0];
    assert_eq!(*size, style::halo_size(ICON_SIZE_DEFAULT + 6.0));
}

#[test]
fn restyle_adds_no_halo_to_an_unselected_feature() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.select(None);
    engine.update_icon_style(&id, 6.0, 0.0);
    assert!(!rule_has_halo(engine.layer.as_ref().unwrap(), &id));
}

#[test]
fn restyle_of_unknown_feature_is_a_no_op() {
    let mut engine = PaletteEngine::new();
    place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    assert!(engine.update_icon_style("entity-missing", 6.0, 0.0).is_empty());
}

// =============================================================
// Metadata
// =============================================================

#[test]
fn metadata_overwrites_but_keeps_the_image() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    let actions = engine.update_metadata(
        &id,
        MetadataUpdate {
            name: "Scout".to_string(),
            code: Some("007".to_string()),
            faction: Some("red".to_string()),
            notes: Some("parked".to_string()),
        },
    );

    let feature = final_layer(&actions).find_feature(&id).unwrap();
    assert_eq!(feature.properties.name, "Scout");
    assert_eq!(feature.properties.code.as_deref(), Some("007"));
    assert_eq!(feature.properties.image, "markers/car-red.png");
}

#[test]
fn metadata_clears_fields_omitted_from_the_update() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    engine.update_metadata(
        &id,
        MetadataUpdate { name: "Scout".to_string(), notes: Some("parked".to_string()), ..Default::default() },
    );
    let actions = engine.update_metadata(
        &id,
        MetadataUpdate { name: "Scout".to_string(), ..Default::default() },
    );
    assert_eq!(final_layer(&actions).find_feature(&id).unwrap().properties.notes, None);
}

#[test]
fn non_digit_code_blocks_the_save() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    let actions = engine.update_metadata(
        &id,
        MetadataUpdate { name: "Scout".to_string(), code: Some("12a".to_string()), ..Default::default() },
    );
    assert!(actions.is_empty());
    let feature = engine.layer.as_ref().unwrap().find_feature(&id).unwrap();
    assert_eq!(feature.properties.name, "Car 1");
}

#[test]
fn code_validation() {
    assert!(is_valid_code(None));
    assert!(is_valid_code(Some("")));
    assert!(is_valid_code(Some("0042")));
    assert!(!is_valid_code(Some("12a")));
    assert!(!is_valid_code(Some("1 2")));
    assert!(!is_valid_code(Some("-1")));
}

// =============================================================
// Import / export
// =============================================================

#[test]
fn export_of_an_empty_engine_is_empty() {
    let engine = PaletteEngine::new();
    assert!(engine.export_features().is_empty());
}

#[test]
fn import_replaces_features_and_regenerates_rules() {
    let mut engine = PaletteEngine::new();
    place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);

    let incoming = vec![
        EntityFeature::new(
            "entity-a".to_string(),
            1.0,
            2.0,
            EntityProperties { name: "A".to_string(), image: "markers/a.png".to_string(), ..Default::default() },
        ),
        EntityFeature::new(
            "entity-b".to_string(),
            3.0,
            4.0,
            EntityProperties { name: "B".to_string(), image: "markers/b.png".to_string(), ..Default::default() },
        ),
    ];
    let actions = engine.import_features(incoming);

    let layer = final_layer(&actions);
    assert_eq!(layer.features.len(), 2);
    assert_eq!(layer.style.body.rules.len(), 2);
    let rule = layer.find_rule("entity-a").unwrap();
    assert_eq!(style::icon_of(rule).unwrap().image, "markers/a.png");
}

#[test]
fn import_into_an_empty_engine_adds_the_layer() {
    let mut engine = PaletteEngine::new();
    let feature = EntityFeature::new(
        "entity-a".to_string(),
        1.0,
        2.0,
        EntityProperties { name: "A".to_string(), ..Default::default() },
    );
    let actions = engine.import_features(vec![feature]);
    assert!(matches!(actions[0], Action::AddLayer(_)));
}

#[test]
fn import_clears_a_selection_that_vanished() {
    let mut engine = PaletteEngine::new();
    place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);

    let feature = EntityFeature::new(
        "entity-a".to_string(),
        1.0,
        2.0,
        EntityProperties { name: "A".to_string(), ..Default::default() },
    );
    let actions = engine.import_features(vec![feature]);
    assert!(actions.contains(&Action::SelectionChanged(None)));
    assert_eq!(engine.selection(), None);
}

#[test]
fn import_keeps_a_selection_that_survived() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);

    let survivor = engine.layer.as_ref().unwrap().find_feature(&id).unwrap().clone();
    let actions = engine.import_features(vec![survivor]);
    assert!(!actions.iter().any(|action| matches!(action, Action::SelectionChanged(_))));
    assert_eq!(engine.selection(), Some(id.as_str()));
    assert!(rule_has_halo(final_layer(&actions), &id));
}

#[test]
fn export_round_trips_through_import() {
    let mut engine = PaletteEngine::new();
    place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    let exported = engine.export_features();

    let mut other = PaletteEngine::new();
    other.import_features(exported.clone());
    assert_eq!(other.export_features(), exported);
}

#[test]
fn imported_halo_uses_the_halo_image() {
    let mut engine = PaletteEngine::new();
    let id = place(&mut engine, &make_item("car-red", "Car"), 10.0, 20.0);
    let layer = engine.layer.as_ref().unwrap();
    let rule = layer.find_rule(&id).unwrap();
    let Symbolizer::Icon { image, .. } = &rule.symbolizers[0];
    assert_eq!(image, HALO_IMAGE);
}
