//! End-to-end enumeration + attachment scenarios.

mod common;

use common::dataset_from_columns;

use vizier::attach::attach_and_score;
use vizier::conditionals::Conditionals;
use vizier::config::EngineConfig;
use vizier::enumerate::{
    AggregateFunction, GeneratingProcedure, SpecArgs, TypeStructure, enumerate_specs,
};
use vizier::fields::compute_field_properties;

#[test]
fn lone_quantitative_column_yields_the_summary_family() {
    let ds = dataset_from_columns("numbers", vec![("v", vec!["1", "2", "2", "3", "4", "100"])]);
    let config = EngineConfig::default();
    let fields = compute_field_properties(&ds, &config);
    let skeletons = enumerate_specs(&fields, None).expect("enumerate");

    let aggregates: Vec<AggregateFunction> = skeletons
        .iter()
        .filter_map(|s| match (&s.generating_procedure, &s.args) {
            (
                GeneratingProcedure::SingleAggregate,
                SpecArgs::SingleField {
                    agg_fn: Some(agg), ..
                },
            ) => Some(*agg),
            _ => None,
        })
        .collect();
    assert_eq!(
        aggregates,
        vec![
            AggregateFunction::Sum,
            AggregateFunction::Min,
            AggregateFunction::Max,
            AggregateFunction::Mean,
            AggregateFunction::Count,
        ]
    );
    // Not unique, so the distribution spec is value:count.
    assert_eq!(
        skeletons
            .iter()
            .filter(|s| s.generating_procedure == GeneratingProcedure::ValueCount)
            .count(),
        1
    );
    assert_eq!(
        skeletons
            .iter()
            .filter(|s| s.generating_procedure == GeneratingProcedure::BinAggregate)
            .count(),
        1
    );

    let scored = attach_and_score(skeletons, &ds, None, &Conditionals::default(), &config)
        .expect("attach");
    for spec in &scored {
        assert_eq!(spec.scores.stats.get("size"), Some(&Some(6.0)));
        assert!(spec.scores.stats.get("gini").expect("gini").is_some());
        assert!(spec.scores.stats.get("entropy").expect("entropy").is_some());
        assert!(
            spec.scores
                .stats
                .get("variance")
                .expect("variance")
                .is_some()
        );
    }
}

#[test]
fn unique_id_against_quantitative_yields_a_raw_pairing() {
    let ids: Vec<String> = (1..=100).map(|i| format!("user-{i}")).collect();
    let ages: Vec<String> = (1..=100).map(|i| (18 + i % 60).to_string()).collect();
    let ds = dataset_from_columns(
        "people",
        vec![
            ("id", ids.iter().map(|v| v.as_str()).collect()),
            ("age", ages.iter().map(|v| v.as_str()).collect()),
        ],
    );
    let config = EngineConfig::default();
    let fields = compute_field_properties(&ds, &config);
    assert!(fields[0].is_unique);

    let skeletons = enumerate_specs(&fields, None).expect("enumerate");
    let pairing = skeletons
        .iter()
        .find(|s| s.generating_procedure == GeneratingProcedure::ValueValue)
        .expect("value:value spec");
    assert_eq!(pairing.type_structure, TypeStructure::CQ);
    assert!(matches!(
        &pairing.args,
        SpecArgs::Pair { field_a, field_b } if field_a == "id" && field_b == "age"
    ));
    // No group-by aggregation for a unique categorical.
    assert!(
        !skeletons
            .iter()
            .any(|s| s.generating_procedure == GeneratingProcedure::ValueAggregate)
    );
}

#[test]
fn enumeration_output_is_stable_across_calls() {
    let ds = dataset_from_columns(
        "wide",
        vec![
            ("region", vec!["east", "west", "north", "east", "west", "north"]),
            ("channel", vec!["web", "store", "web", "store", "web", "store"]),
            ("sales", vec!["10", "20", "30", "40", "50", "55"]),
            ("units", vec!["1", "2", "3", "4", "5", "5"]),
        ],
    );
    let config = EngineConfig::default();
    let fields = compute_field_properties(&ds, &config);
    let first = enumerate_specs(&fields, None).expect("enumerate");
    let second = enumerate_specs(&fields, None).expect("enumerate");
    assert_eq!(first, second);

    let selection = vec!["sales".to_string(), "region".to_string()];
    let first_selected = enumerate_specs(&fields, Some(&selection)).expect("enumerate");
    let second_selected = enumerate_specs(&fields, Some(&selection)).expect("enumerate");
    assert_eq!(first_selected, second_selected);
}

#[test]
fn selection_tiers_surface_unselected_neighbors() {
    let ds = dataset_from_columns(
        "orders",
        vec![
            ("region", vec!["east", "west", "north", "east", "west", "north"]),
            ("channel", vec!["web", "store", "web", "store", "web", "store"]),
            ("sales", vec!["10", "20", "30", "40", "50", "55"]),
        ],
    );
    let config = EngineConfig::default();
    let fields = compute_field_properties(&ds, &config);
    let selection = vec!["sales".to_string()];
    let skeletons = enumerate_specs(&fields, Some(&selection)).expect("enumerate");

    // Baseline: sales' own summary family.
    assert!(skeletons.iter().any(|s| {
        s.generating_procedure == GeneratingProcedure::SingleAggregate
            && s.field_names() == vec!["sales"]
    }));
    // Expanded: sales crossed with each non-selected categorical field.
    for neighbor in ["region", "channel"] {
        assert!(
            skeletons.iter().any(|s| {
                matches!(
                    &s.args,
                    SpecArgs::GroupBy { group, value, .. }
                        if group == neighbor && value == "sales"
                )
            }),
            "missing expanded cross with {neighbor}"
        );
    }
}

#[test]
fn captions_render_from_the_token_grammar() {
    let ds = dataset_from_columns(
        "orders",
        vec![
            ("region", vec!["east", "west", "north", "east", "west", "north"]),
            ("sales", vec!["10", "20", "30", "40", "50", "55"]),
        ],
    );
    let config = EngineConfig::default();
    let fields = compute_field_properties(&ds, &config);
    let skeletons = enumerate_specs(&fields, None).expect("enumerate");
    let group_by = skeletons
        .iter()
        .find(|s| {
            matches!(
                &s.args,
                SpecArgs::GroupBy {
                    agg_fn: AggregateFunction::Mean,
                    ..
                }
            )
        })
        .expect("mean group-by spec");
    assert_eq!(group_by.meta.description, "mean of sales by region");
    assert!(!group_by.meta.tokens.is_empty());
}
