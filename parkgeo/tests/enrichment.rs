//! Tests d'intégration du moteur : grouping, surface, régions, année, ajout seulement

use geo::{polygon, MultiPolygon};
use parkgeo::area::geodesic_area_m2;
use parkgeo::{enrich, DatasetDocument, HintsStore, RegionIndex, RegionLayer};
use serde_json::{json, Value};

fn square_json(x: f64, y: f64, size: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]]
    })
}

fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x, y: y),
        (x: x + size, y: y),
        (x: x + size, y: y + size),
        (x: x, y: y + size),
        (x: x, y: y),
    ]])
}

fn layer(label: &str, features: Value) -> RegionLayer {
    let doc = json!({"type": "FeatureCollection", "features": features});
    RegionLayer::load_from_json(label, &doc.to_string()).unwrap()
}

fn vk_dataset() -> DatasetDocument {
    serde_json::from_value(json!({
        "dataset": {
            "name": "Norges nasjonalparker",
            "features": [
                {
                    "type": "Feature",
                    "geometry": square_json(10.90, 59.00, 0.05),
                    "properties": {"id": 1, "code": "VK", "name": "Vestre øy", "source": "park"}
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [10.7, 59.9]},
                    "properties": {"id": 2, "name": "Utsiktspunkt", "source": "user"}
                },
                {
                    "type": "Feature",
                    "geometry": square_json(11.00, 59.02, 0.04),
                    "properties": {"id": 3, "code": "VK", "name": "Østre øy", "source": "park"}
                }
            ]
        },
        "version": 3
    }))
    .unwrap()
}

fn vk_regions() -> RegionIndex {
    RegionIndex::new(
        layer(
            "fylker",
            json!([
                {"type": "Feature", "properties": {"fylkesnavn": "Viken"}, "geometry": square_json(10.5, 58.5, 1.0)},
                {"type": "Feature", "properties": {"fylkesnavn": "Innlandet"}, "geometry": square_json(9.0, 60.5, 2.0)}
            ]),
        ),
        layer(
            "kommuner",
            json!([
                {"type": "Feature", "properties": {"kommunenavn": "Hvaler"}, "geometry": square_json(10.80, 58.95, 0.18)},
                {"type": "Feature", "properties": {"kommunenavn": "Fredrikstad"}, "geometry": square_json(10.98, 59.00, 0.5)}
            ]),
        ),
    )
}

fn vk_hints() -> HintsStore {
    serde_json::from_value(json!({
        "parks": {
            "ytrehvaler": {"name": "Ytre Hvaler", "code": "VK", "hints": ["Marin park", "Opprettet i 1999"]}
        }
    }))
    .unwrap()
}

#[test]
fn test_end_to_end_islands_share_metadata() {
    let mut doc = vk_dataset();
    let outcome = enrich(&mut doc, &vk_regions(), &vk_hints());

    assert_eq!(outcome.groups_total, 1);
    assert_eq!(outcome.features_updated, 2);

    let islands_m2 = geodesic_area_m2(&square(10.90, 59.00, 0.05))
        + geodesic_area_m2(&square(11.00, 59.02, 0.04));
    let expected_area = (islands_m2 / 1_000_000.0 * 10.0).round() / 10.0;

    let features = &doc.dataset.features;
    for i in [0, 2] {
        let props = &features[i].properties;
        let area = props["areaKm2"].as_f64().unwrap();
        assert!((area - expected_area).abs() <= 0.1, "{area} vs {expected_area}");
        assert_eq!(props["counties"], json!(["Viken"]));
        assert_eq!(props["establishedYear"], json!(1999));
    }
    assert_eq!(features[0].properties["areaKm2"], features[2].properties["areaKm2"]);
    // L'île ouest est dans Hvaler, l'île est dans Fredrikstad : le parc a les deux
    assert_eq!(features[0].properties["municipalities"], json!(["Fredrikstad", "Hvaler"]));
    assert_eq!(features[0].properties, {
        let mut p = features[2].properties.clone();
        p.insert("id".into(), json!(1));
        p.insert("name".into(), json!("Vestre øy"));
        p
    });

    // La feature utilisateur n'est pas touchée
    assert!(features[1].properties.get("areaKm2").is_none());

    // Les clés inconnues sont conservées
    assert_eq!(doc.extra["version"], json!(3));
    assert_eq!(doc.dataset.extra["name"], json!("Norges nasjonalparker"));
}

#[test]
fn test_second_run_changes_nothing() {
    let mut doc = vk_dataset();
    let regions = vk_regions();
    let hints = vk_hints();

    assert!(enrich(&mut doc, &regions, &hints).has_changes());
    let after_first = serde_json::to_string(&doc).unwrap();

    let second = enrich(&mut doc, &regions, &hints);
    assert!(!second.has_changes());
    assert_eq!(second.features_unchanged, 2);
    assert_eq!(serde_json::to_string(&doc).unwrap(), after_first);
}

#[test]
fn test_populated_fields_are_bit_for_bit_unchanged() {
    let mut doc = vk_dataset();
    {
        let props = &mut doc.dataset.features[0].properties;
        props.insert("areaKm2".into(), json!(12));
        props.insert("counties".into(), json!(["Østfold"]));
        props.insert("establishedYear".into(), json!(2009));
    }
    let outcome = enrich(&mut doc, &vk_regions(), &vk_hints());

    let props = &doc.dataset.features[0].properties;
    assert_eq!(props["areaKm2"], json!(12));
    assert_eq!(serde_json::to_string(&props["areaKm2"]).unwrap(), "12");
    assert_eq!(props["counties"], json!(["Østfold"]));
    assert_eq!(props["establishedYear"], json!(2009));
    // Les municipalities étaient vides : elles sont ajoutées
    assert_eq!(props["municipalities"], json!(["Fredrikstad", "Hvaler"]));
    assert_eq!(outcome.features_updated, 2);
}

#[test]
fn test_free_form_derived_values_keep_member_in_park() {
    let mut doc = vk_dataset();
    {
        let props = &mut doc.dataset.features[2].properties;
        props.insert("establishedYear".into(), json!("1999"));
        props.insert("counties".into(), json!("Viken"));
    }
    let outcome = enrich(&mut doc, &vk_regions(), &vk_hints());

    assert!(outcome.skipped.is_empty());
    assert_eq!(outcome.features_updated, 2);

    let islands_m2 = geodesic_area_m2(&square(10.90, 59.00, 0.05))
        + geodesic_area_m2(&square(11.00, 59.02, 0.04));
    let expected_area = (islands_m2 / 1_000_000.0 * 10.0).round() / 10.0;

    let features = &doc.dataset.features;
    assert_eq!(features[0].properties["areaKm2"], features[2].properties["areaKm2"]);
    let area = features[2].properties["areaKm2"].as_f64().unwrap();
    assert!((area - expected_area).abs() <= 0.1, "{area} vs {expected_area}");

    let props = &features[2].properties;
    assert_eq!(props["establishedYear"], json!("1999"));
    assert_eq!(props["counties"], json!(["Viken"]));
    assert_eq!(props["municipalities"], json!(["Fredrikstad", "Hvaler"]));
    assert_eq!(features[0].properties["establishedYear"], json!(1999));
}

#[test]
fn test_null_dataset_has_nothing_to_enrich() {
    let mut doc: DatasetDocument = serde_json::from_value(json!({"dataset": null})).unwrap();
    let outcome = enrich(&mut doc, &vk_regions(), &vk_hints());

    assert_eq!(outcome.groups_total, 0);
    assert!(!outcome.has_changes());
}

#[test]
fn test_no_year_hint_leaves_field_absent() {
    let mut doc = vk_dataset();
    let hints: HintsStore = serde_json::from_value(json!({
        "parks": {"ytrehvaler": {"code": "VK", "hints": ["Marin nasjonalpark"]}}
    }))
    .unwrap();
    enrich(&mut doc, &vk_regions(), &hints);

    for feature in &doc.dataset.features {
        assert!(feature.properties.get("establishedYear").is_none());
    }
}

#[test]
fn test_bad_group_does_not_stop_others() {
    let mut doc: DatasetDocument = serde_json::from_value(json!({
        "dataset": {
            "features": [
                {"type": "Feature", "geometry": null, "properties": {"code": "XX", "source": "park"}},
                {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": "bad"}, "properties": {"code": "XX", "source": "park"}},
                {"type": "Feature", "geometry": square_json(10.9, 59.0, 0.05), "properties": {"code": "VK", "source": "park"}}
            ]
        }
    }))
    .unwrap();
    let outcome = enrich(&mut doc, &vk_regions(), &HintsStore::default());

    assert_eq!(outcome.groups_total, 2);
    assert_eq!(outcome.groups_skipped, 1);
    assert_eq!(outcome.groups_enriched, 1);
    assert_eq!(outcome.features_updated, 1);
    assert!(doc.dataset.features[0].properties.get("areaKm2").is_none());
    assert!(doc.dataset.features[1].properties.get("areaKm2").is_none());
    assert!(doc.dataset.features[2].properties.get("areaKm2").is_some());
    // 2 géométries de membres + le groupe lui-même
    assert_eq!(outcome.skipped.len(), 3);
}

#[test]
fn test_deleted_parks_are_ignored() {
    let mut doc: DatasetDocument = serde_json::from_value(json!({
        "dataset": {
            "features": [
                {"type": "Feature", "geometry": square_json(10.9, 59.0, 0.05), "properties": {"code": "VK", "source": "park", "status": "deleted"}}
            ]
        }
    }))
    .unwrap();
    let before = doc.clone();
    let outcome = enrich(&mut doc, &vk_regions(), &vk_hints());

    assert_eq!(outcome.groups_total, 0);
    assert_eq!(doc, before);
}
