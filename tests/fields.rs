mod common;

use common::dataset_from_columns;

use vizier::classify::FieldType;
use vizier::config::EngineConfig;
use vizier::fields::{DatasetStructure, compute_dataset_properties, compute_field_properties};

#[test]
fn properties_are_ordered_by_column_index() {
    let ds = dataset_from_columns(
        "orders",
        vec![
            ("region", vec!["east", "west", "east"]),
            ("amount", vec!["10.5", "20.5", "30.5"]),
            ("note", vec!["a", "b", "c"]),
        ],
    );
    let config = EngineConfig::default();
    let props = compute_field_properties(&ds, &config);
    assert_eq!(props.len(), 3);
    for (idx, prop) in props.iter().enumerate() {
        assert_eq!(prop.index, idx);
    }
    assert_eq!(props[0].name, "region");
    assert_eq!(props[1].field_type, FieldType::Decimal);
}

#[test]
fn recomputing_properties_is_idempotent() {
    let ds = dataset_from_columns(
        "orders",
        vec![
            ("region", vec!["east", "west", "east", "west"]),
            ("amount", vec!["10", "20", "30", "20"]),
        ],
    );
    let config = EngineConfig::default();
    let first = compute_field_properties(&ds, &config);
    let second = compute_field_properties(&ds, &config);
    assert_eq!(
        serde_json::to_value(&first).expect("serialize"),
        serde_json::to_value(&second).expect("serialize"),
    );
}

#[test]
fn stats_are_degenerate_for_categorical_columns() {
    let ds = dataset_from_columns(
        "orders",
        vec![
            ("label", vec!["alpha", "beta", "gamma", "alpha"]),
            ("amount", vec!["1", "2", "3", "4"]),
        ],
    );
    let config = EngineConfig::default();
    let props = compute_field_properties(&ds, &config);
    assert_eq!(props[0].stats.count, 0);
    assert_eq!(props[0].stats.mean, None);
    assert_eq!(props[1].stats.count, 4);
    assert_eq!(props[1].stats.mean, Some(2.5));
    assert_eq!(props[1].stats.min, Some(1.0));
    assert_eq!(props[1].stats.max, Some(4.0));
}

#[test]
fn normality_flag_is_computed_for_large_quantitative_columns() {
    // A symmetric bell over enough samples: the omnibus test accepts.
    let mut cells: Vec<String> = Vec::new();
    for (count, value) in [
        (1, -3),
        (4, -2),
        (11, -1),
        (18, 0),
        (11, 1),
        (4, 2),
        (1, 3),
    ] {
        for _ in 0..count {
            cells.push(value.to_string());
        }
    }
    let ds = dataset_from_columns(
        "bell",
        vec![("v", cells.iter().map(|v| v.as_str()).collect())],
    );
    let config = EngineConfig::default();
    let props = compute_field_properties(&ds, &config);
    assert_eq!(props[0].is_normal, Some(true));
}

#[test]
fn hierarchy_detection_is_asymmetric_and_capped() {
    let ds = dataset_from_columns(
        "geo",
        vec![
            ("continent", vec!["Europe", "Europe", "Asia", "Asia", "Europe", "Asia"]),
            ("country", vec!["france", "spain", "japan", "india", "france", "japan"]),
        ],
    );
    let config = EngineConfig::default();
    let props = compute_field_properties(&ds, &config);
    assert_eq!(props[0].child.as_deref(), Some("country"));
    assert!(props[1].is_child);
    // Irreflexive and no 2-cycles by construction.
    assert!(props[0].child.as_deref() != Some("continent"));
    assert!(!props[0].is_child);
    assert_eq!(props[1].child, None);
}

#[test]
fn wide_datasets_report_a_time_series_descriptor() {
    let ds = dataset_from_columns(
        "metrics",
        vec![
            ("2020-01", vec!["1", "2"]),
            ("2020-02", vec!["3", "4"]),
            ("2020-03", vec!["5", "6"]),
            ("value", vec!["7", "8"]),
        ],
    );
    let config = EngineConfig::default();
    let props = compute_field_properties(&ds, &config);
    let dataset_props = compute_dataset_properties(&ds, &props);
    assert_eq!(dataset_props.structure, DatasetStructure::Wide);
    let ts = dataset_props.time_series.expect("time series");
    assert_eq!(ts.start_index, 0);
    assert_eq!(ts.start_name, "2020-01");
    assert_eq!(ts.end_index, 2);
    assert_eq!(ts.end_name, "2020-03");
    assert_eq!(ts.num_elements, 3);
}

#[test]
fn non_dated_headers_classify_as_long() {
    let ds = dataset_from_columns(
        "orders",
        vec![
            ("region", vec!["east", "west"]),
            ("amount", vec!["1", "2"]),
        ],
    );
    let config = EngineConfig::default();
    let props = compute_field_properties(&ds, &config);
    let dataset_props = compute_dataset_properties(&ds, &props);
    assert_eq!(dataset_props.structure, DatasetStructure::Long);
    assert!(dataset_props.time_series.is_none());
    assert_eq!(dataset_props.row_count, 2);
    assert_eq!(dataset_props.column_count, 2);
}
