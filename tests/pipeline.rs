mod common;

use common::dataset_from_columns;

use vizier::conditionals::{Conditional, ConditionalOperator, ConditionalValue, Conditionals};
use vizier::config::EngineConfig;
use vizier::error::SpecError;
use vizier::pipeline::{Engine, MemorySink, spec_set_key};

fn orders() -> vizier::dataset::Dataset {
    dataset_from_columns(
        "orders",
        vec![
            (
                "region",
                vec!["east", "west", "north", "east", "west", "north"],
            ),
            ("sales", vec!["10", "20", "30", "40", "50", "55"]),
        ],
    )
}

#[test]
fn ingest_feeds_the_sink_with_upserts() {
    let ds = orders();
    let mut engine = Engine::new(EngineConfig::default());
    let mut sink = MemorySink::default();

    engine.ingest(&ds, &mut sink).expect("ingest");
    assert_eq!(sink.field_properties[&ds.id].len(), 2);
    assert!(sink.dataset_properties.contains_key(&ds.id));

    // Second ingest reuses the cached profile; the sink still holds one
    // record set per dataset.
    engine.ingest(&ds, &mut sink).expect("re-ingest");
    assert_eq!(sink.field_properties.len(), 1);
}

#[test]
fn recommend_replaces_the_spec_set_for_its_key() {
    let ds = orders();
    let mut engine = Engine::new(EngineConfig::default());
    let mut sink = MemorySink::default();

    let scored = engine
        .recommend(&ds, None, &Conditionals::default(), &mut sink)
        .expect("recommend");
    assert!(!scored.is_empty());

    let key = spec_set_key(ds.id, None, &Conditionals::default());
    assert_eq!(sink.specs[&key].len(), scored.len());

    // Recomputing for the same key replaces rather than appends.
    engine
        .recommend(&ds, None, &Conditionals::default(), &mut sink)
        .expect("recompute");
    assert_eq!(sink.specs.len(), 1);
    assert_eq!(sink.specs[&key].len(), scored.len());
}

#[test]
fn spec_set_keys_are_selection_order_insensitive() {
    let ds = orders();
    let a = vec!["region".to_string(), "sales".to_string()];
    let b = vec!["sales".to_string(), "region".to_string()];
    let empty = Conditionals::default();
    assert_eq!(
        spec_set_key(ds.id, Some(&a), &empty),
        spec_set_key(ds.id, Some(&b), &empty)
    );
    assert_ne!(
        spec_set_key(ds.id, Some(&a), &empty),
        spec_set_key(ds.id, None, &empty)
    );

    let filtered = Conditionals {
        and: vec![Conditional {
            field: "sales".to_string(),
            operator: ConditionalOperator::Ge,
            value: ConditionalValue::Number(25.0),
        }],
        or: Vec::new(),
    };
    assert_ne!(
        spec_set_key(ds.id, Some(&a), &empty),
        spec_set_key(ds.id, Some(&a), &filtered)
    );
}

#[test]
fn unknown_selection_surfaces_as_a_validation_error() {
    let ds = orders();
    let mut engine = Engine::new(EngineConfig::default());
    let mut sink = MemorySink::default();
    let selection = vec!["ghost".to_string()];
    let err = engine
        .recommend(&ds, Some(&selection), &Conditionals::default(), &mut sink)
        .expect_err("must fail");
    let spec_err = err.downcast_ref::<SpecError>().expect("typed error");
    assert!(matches!(spec_err, SpecError::UnknownField { .. }));
}

#[test]
fn relate_spans_every_ingested_dataset() {
    let left = dataset_from_columns(
        "left",
        vec![("country", vec!["US", "CA", "MX", "US", "CA", "MX"])],
    );
    let right = dataset_from_columns(
        "right",
        vec![("country", vec!["US", "CA", "US", "CA"])],
    );
    let mut engine = Engine::new(EngineConfig::default());
    let mut sink = MemorySink::default();
    engine.ingest(&left, &mut sink).expect("ingest left");
    engine.ingest(&right, &mut sink).expect("ingest right");

    let relationships = engine.relate(&mut sink).expect("relate");
    assert_eq!(relationships.len(), 1);
    assert_eq!(sink.relationships.len(), 1);

    // A second pass adds nothing: the pair was already compared.
    let rerun = engine.relate(&mut sink).expect("relate again");
    assert!(rerun.is_empty());
    assert_eq!(sink.relationships.len(), 1);
}
