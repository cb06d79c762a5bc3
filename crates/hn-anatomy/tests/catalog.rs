use hn_anatomy::*;
use serde_json::json;

fn write_temp(name: &str, value: &serde_json::Value) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn cow_features() -> serde_json::Value {
    json!({
        "1": {
            "BA": [{ "segment": {"start": 15, "end": 16},
                     "radius": {"mean": 1.3, "median": 1.4}, "length": 9.0 }],
            "BA bifurcation": [{ "id": 16 }]
        },
        "2": {
            "P1": [{ "segment": {"start": 16, "end": 21},
                     "radius": {"mean": 0.9, "median": 1.0}, "length": 7.0 }],
            "P2": [{ "segment": {"start": 21, "end": 22},
                     "radius": {"mean": 0.8, "median": 0.85}, "length": 30.0 }]
        },
        "3": {
            "P1": [{ "segment": {"start": 16, "end": 31},
                     "radius": {"mean": 0.9, "median": 1.0}, "length": 7.0 }]
        }
    })
}

#[test]
fn load_input_from_files() {
    let features = write_temp("hn_anatomy_features.json", &cow_features());
    let variants = write_temp(
        "hn_anatomy_variants.json",
        &json!({ "posterior": { "R-P1": true, "L-P1": false } }),
    );

    let input = load_input(&features, None, Some(&variants)).unwrap();
    assert_eq!(input.features.len(), 3);
    assert!(input.variants.is_some());
    assert!(input.landmarks.is_none());
}

#[test]
fn absent_variant_branch_is_skipped_entirely() {
    let input = AnatomyInput::new(serde_json::from_value(cow_features()).unwrap()).with_variants(
        serde_json::from_value(json!({ "posterior": { "R-P1": true, "L-P1": false } })).unwrap(),
    );
    let config = CatalogConfig {
        variant_gates: vec![
            VariantGate {
                section: "posterior".into(),
                flag: "R-P1".into(),
                group: "2".into(),
                vessel: "P1".into(),
            },
            VariantGate {
                section: "posterior".into(),
                flag: "L-P1".into(),
                group: "3".into(),
                vessel: "P1".into(),
            },
        ],
        ..CatalogConfig::default()
    };

    let catalog = GeometryCatalog::from_input(&input, config);
    let ids: Vec<&str> = catalog.vessels().iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["BA_1", "P1_2", "P2_2"]);
    assert!(
        catalog
            .skipped()
            .iter()
            .any(|s| s.group == "3" && s.reason == SkipReason::VariantAbsent)
    );
}

#[test]
fn every_vessel_satisfies_invariants() {
    let mut features = cow_features();
    features["4"] = json!({ "ICA": [{ "start": 40, "end": 41, "radius": {"median": -1.0} }] });
    let input = AnatomyInput::new(serde_json::from_value(features).unwrap());
    let catalog = GeometryCatalog::from_input(&input, CatalogConfig::default());

    for vessel in catalog.vessels() {
        vessel.check().unwrap();
    }
    let ica = catalog.vessels().iter().find(|v| v.id == "ICA_4").unwrap();
    assert_eq!(ica.source, GeometrySource::Fallback);
}

#[test]
fn multiple_records_get_distinct_ids() {
    let input = AnatomyInput::new(
        serde_json::from_value(json!({
            "5": { "MCA": [
                { "start": 1, "end": 2, "radius": {"median": 1.2}, "length": 10.0 },
                { "start": 2, "end": 3, "radius": {"median": 1.1}, "length": 12.0 }
            ]}
        }))
        .unwrap(),
    );
    let catalog = GeometryCatalog::from_input(&input, CatalogConfig::default());
    let ids: Vec<&str> = catalog.vessels().iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["MCA_5_1", "MCA_5_2"]);
}
