//! Spec materialization, filtering, and scoring.
//!
//! Each skeleton's generating procedure dispatches to a materialization
//! branch that emits three parallel projections: `score` (compact numeric
//! arrays for statistical testing), `visualize` (per-point records for chart
//! rendering), and `table` (columns plus a row matrix). Degenerate specs are
//! dropped, a failing spec is dropped with a logged reason without aborting
//! the batch, and a failing statistical test yields an explicit null score.
//!
//! Single-field specs put the field's raw coerced series in the score
//! projection, so their statistics describe the underlying distribution no
//! matter how the visual slices it; grouped and paired specs score the
//! derived series instead.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use crate::{
    conditionals::{Conditionals, row_mask},
    config::EngineConfig,
    dataset::Dataset,
    enumerate::{AggregateFunction, GeneratingProcedure, SpecArgs, SpecSkeleton},
    error::SpecError,
    stats,
};

pub const RELEVANCE_PER_SELECTED_FIELD: f64 = 10.0;

/// Categories below this make a value:count spec non-discriminative.
const MIN_DISCRIMINATIVE_CATEGORIES: usize = 3;

/// Compact numeric series feeding the statistical tests: one series for
/// univariate tests, two for bivariate.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreProjection {
    pub series: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableProjection {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecData {
    pub score: ScoreProjection,
    pub visualize: Vec<JsonValue>,
    pub table: TableProjection,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecScores {
    pub relevance: f64,
    /// A key mapped to null means the test ran and was inapplicable or
    /// failed; an absent key means the test was never attempted.
    pub stats: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredSpec {
    #[serde(flatten)]
    pub spec: SpecSkeleton,
    pub data: SpecData,
    pub scores: SpecScores,
}

/// Materializes, filters, scores, and ranks the candidate set.
///
/// Validation failures (an unknown field in a conditional) surface to the
/// caller; every per-spec failure is isolated to that spec.
pub fn attach_and_score(
    skeletons: Vec<SpecSkeleton>,
    dataset: &Dataset,
    selection: Option<&[String]>,
    conditionals: &Conditionals,
    config: &EngineConfig,
) -> Result<Vec<ScoredSpec>, SpecError> {
    let mask = row_mask(dataset, conditionals)?;

    let mut scored = Vec::new();
    for skeleton in skeletons {
        match materialize(&skeleton, dataset, &mask, config) {
            Ok(Some(data)) => {
                let scores = SpecScores {
                    relevance: relevance(&skeleton, selection),
                    stats: series_stats(&data.score.series),
                };
                scored.push(ScoredSpec {
                    spec: skeleton,
                    data,
                    scores,
                });
            }
            Ok(None) => {
                debug!("dropping degenerate spec '{}'", skeleton.meta.description);
            }
            Err(err) => {
                warn!("dropping spec '{}': {err}", skeleton.meta.description);
            }
        }
    }

    // Stable sort keeps enumeration order within equal relevance.
    scored.sort_by(|a, b| {
        b.scores
            .relevance
            .partial_cmp(&a.scores.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(scored)
}

fn relevance(skeleton: &SpecSkeleton, selection: Option<&[String]>) -> f64 {
    let Some(selection) = selection else {
        return 0.0;
    };
    let names = skeleton.field_names();
    let matched = selection
        .iter()
        .filter(|s| names.contains(&s.as_str()))
        .count();
    matched as f64 * RELEVANCE_PER_SELECTED_FIELD
}

fn series_stats(series: &[Vec<f64>]) -> BTreeMap<String, Option<f64>> {
    let mut map = BTreeMap::new();
    match series {
        [single] => {
            map.insert("gini".to_string(), stats::gini(single));
            map.insert("entropy".to_string(), stats::shannon_entropy(single));
            map.insert("normality".to_string(), stats::normality_p(single));
            map.insert("variance".to_string(), stats::variance(single));
            map.insert("size".to_string(), Some(single.len() as f64));
        }
        [a, b] => {
            map.insert("correlation".to_string(), stats::pearson(a, b));
            map.insert("size".to_string(), Some(a.len().min(b.len()) as f64));
        }
        _ => {}
    }
    map
}

fn materialize(
    skeleton: &SpecSkeleton,
    dataset: &Dataset,
    mask: &[bool],
    config: &EngineConfig,
) -> Result<Option<SpecData>> {
    match (skeleton.generating_procedure, &skeleton.args) {
        (
            GeneratingProcedure::SingleAggregate,
            SpecArgs::SingleField {
                field,
                agg_fn: Some(agg),
            },
        ) => single_aggregate(dataset, mask, field, *agg),
        (GeneratingProcedure::IndexValue, SpecArgs::SingleField { field, .. }) => {
            index_value(dataset, mask, field)
        }
        (GeneratingProcedure::ValueCount, SpecArgs::SingleField { field, .. }) => {
            value_count(dataset, mask, field)
        }
        (
            GeneratingProcedure::BinAggregate,
            SpecArgs::SingleField {
                field,
                agg_fn: Some(agg),
            },
        ) => bin_aggregate(dataset, mask, field, *agg, config.max_bins),
        (
            GeneratingProcedure::ValueAggregate,
            SpecArgs::GroupBy {
                group,
                value,
                agg_fn,
            },
        ) => value_aggregate(dataset, mask, group, value, *agg_fn),
        (GeneratingProcedure::ValueValue, SpecArgs::Pair { field_a, field_b }) => {
            value_value(dataset, mask, field_a, field_b)
        }
        (
            GeneratingProcedure::AggregateAggregate,
            SpecArgs::GroupPair {
                group,
                value_a,
                value_b,
                agg_fn,
            },
        ) => aggregate_aggregate(dataset, mask, group, value_a, value_b, *agg_fn),
        (
            GeneratingProcedure::ValueValueQuantitative,
            SpecArgs::PairWithAttributes {
                field_a,
                field_b,
                attributes,
            },
        ) => value_value_quantitative(dataset, mask, field_a, field_b, attributes),
        (
            GeneratingProcedure::SingleAggregate | GeneratingProcedure::BinAggregate,
            SpecArgs::SingleField { agg_fn: None, .. },
        ) => Err(SpecError::MissingParameter {
            role: "aggregation function",
            procedure: skeleton.generating_procedure.as_str().to_string(),
        }
        .into()),
        _ => Err(SpecError::MalformedArgs {
            procedure: skeleton.generating_procedure.as_str().to_string(),
        }
        .into()),
    }
}

fn masked_cells<'a>(
    dataset: &'a Dataset,
    mask: &[bool],
    name: &str,
) -> Result<Vec<Option<&'a str>>> {
    let column = dataset
        .column_by_name(name)
        .ok_or_else(|| anyhow!("column '{name}' not found in dataset"))?;
    Ok(column
        .values
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(value, _)| value.as_deref())
        .collect())
}

fn parse_number(value: &str) -> Option<f64> {
    value.replace(',', "").parse::<f64>().ok()
}

fn numeric_values(cells: &[Option<&str>]) -> Vec<f64> {
    cells
        .iter()
        .copied()
        .flatten()
        .filter_map(parse_number)
        .collect()
}

fn single_aggregate(
    dataset: &Dataset,
    mask: &[bool],
    field: &str,
    agg: AggregateFunction,
) -> Result<Option<SpecData>> {
    let cells = masked_cells(dataset, mask, field)?;
    let numeric = numeric_values(&cells);
    let Some(value) = agg.apply(&numeric) else {
        return Ok(None);
    };
    let header = format!("{}({field})", agg.as_str());
    Ok(Some(SpecData {
        score: ScoreProjection {
            series: vec![numeric],
        },
        visualize: vec![json!({ "aggregate": agg.as_str(), "value": value })],
        table: TableProjection {
            columns: vec![header],
            rows: vec![vec![json!(value)]],
        },
    }))
}

fn index_value(dataset: &Dataset, mask: &[bool], field: &str) -> Result<Option<SpecData>> {
    let cells = masked_cells(dataset, mask, field)?;
    let mut visualize = Vec::new();
    let mut rows = Vec::new();
    let mut series = Vec::new();
    for (index, cell) in cells.iter().copied().enumerate() {
        let Some(raw) = cell else { continue };
        let point = cell_json(raw);
        visualize.push(json!({ "index": index, "value": point.clone() }));
        rows.push(vec![json!(index), point]);
        if let Some(number) = parse_number(raw) {
            series.push(number);
        }
    }
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(SpecData {
        score: ScoreProjection {
            series: vec![series],
        },
        visualize,
        table: TableProjection {
            columns: vec!["index".to_string(), field.to_string()],
            rows,
        },
    }))
}

/// Frequency table of distinct values. The score projection carries the raw
/// numeric series when the whole column coerces and the count distribution
/// otherwise.
fn value_count(dataset: &Dataset, mask: &[bool], field: &str) -> Result<Option<SpecData>> {
    let cells = masked_cells(dataset, mask, field)?;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut non_empty = 0usize;
    for cell in cells.iter().copied().flatten() {
        *counts.entry(cell).or_insert(0) += 1;
        non_empty += 1;
    }
    if counts.len() < MIN_DISCRIMINATIVE_CATEGORIES {
        return Ok(None);
    }

    let mut items: Vec<(&str, usize)> = counts.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let numeric = numeric_values(&cells);
    let series = if !numeric.is_empty() && numeric.len() == non_empty {
        numeric
    } else {
        items.iter().map(|(_, count)| *count as f64).collect()
    };

    let visualize = items
        .iter()
        .map(|(value, count)| json!({ "value": value, "count": count }))
        .collect();
    let rows = items
        .iter()
        .map(|(value, count)| vec![json!(value), json!(count)])
        .collect();
    Ok(Some(SpecData {
        score: ScoreProjection {
            series: vec![series],
        },
        visualize,
        table: TableProjection {
            columns: vec![field.to_string(), "count".to_string()],
            rows,
        },
    }))
}

fn bin_aggregate(
    dataset: &Dataset,
    mask: &[bool],
    field: &str,
    agg: AggregateFunction,
    max_bins: usize,
) -> Result<Option<SpecData>> {
    let cells = masked_cells(dataset, mask, field)?;
    let numeric = numeric_values(&cells);
    let Some(edges) = stats::bin_edges(&numeric, max_bins) else {
        return Ok(None);
    };

    let bin_count = edges.len() - 1;
    let mut members: Vec<Vec<f64>> = vec![Vec::new(); bin_count];
    for value in &numeric {
        if let Some(index) = stats::bin_index(&edges, *value) {
            members[index].push(*value);
        }
    }

    let mut visualize = Vec::with_capacity(bin_count);
    let mut rows = Vec::with_capacity(bin_count);
    for (index, bin_values) in members.iter().enumerate() {
        let value = match agg.apply(bin_values) {
            Some(value) => value,
            // Empty bins still count zero rows; other aggregates have no
            // defined value there.
            None if agg == AggregateFunction::Count => 0.0,
            None => continue,
        };
        let label = format!("[{:.4}, {:.4})", edges[index], edges[index + 1]);
        visualize.push(json!({
            "bin_start": edges[index],
            "bin_end": edges[index + 1],
            "value": value,
        }));
        rows.push(vec![json!(label), json!(value)]);
    }
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(SpecData {
        score: ScoreProjection {
            series: vec![numeric],
        },
        visualize,
        table: TableProjection {
            columns: vec![
                format!("{field} (binned)"),
                format!("{}({field})", agg.as_str()),
            ],
            rows,
        },
    }))
}

fn value_aggregate(
    dataset: &Dataset,
    mask: &[bool],
    group: &str,
    value: &str,
    agg: AggregateFunction,
) -> Result<Option<SpecData>> {
    let group_cells = masked_cells(dataset, mask, group)?;
    let value_cells = masked_cells(dataset, mask, value)?;

    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (group_cell, value_cell) in group_cells.iter().copied().zip(value_cells.iter().copied()) {
        let (Some(key), Some(raw)) = (group_cell, value_cell) else {
            continue;
        };
        let Some(number) = parse_number(raw) else {
            continue;
        };
        groups.entry(key).or_default().push(number);
    }
    if groups.is_empty() {
        return Ok(None);
    }

    let mut series = Vec::with_capacity(groups.len());
    let mut visualize = Vec::with_capacity(groups.len());
    let mut rows = Vec::with_capacity(groups.len());
    for (key, values) in &groups {
        let Some(aggregated) = agg.apply(values) else {
            continue;
        };
        series.push(aggregated);
        visualize.push(json!({ "group": key, "value": aggregated }));
        rows.push(vec![json!(key), json!(aggregated)]);
    }
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(SpecData {
        score: ScoreProjection {
            series: vec![series],
        },
        visualize,
        table: TableProjection {
            columns: vec![group.to_string(), format!("{}({value})", agg.as_str())],
            rows,
        },
    }))
}

fn value_value(
    dataset: &Dataset,
    mask: &[bool],
    field_a: &str,
    field_b: &str,
) -> Result<Option<SpecData>> {
    let cells_a = masked_cells(dataset, mask, field_a)?;
    let cells_b = masked_cells(dataset, mask, field_b)?;

    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for (cell_a, cell_b) in cells_a.iter().copied().zip(cells_b.iter().copied()) {
        if let (Some(a), Some(b)) = (cell_a, cell_b) {
            pairs.push((a, b));
        }
    }
    if pairs.is_empty() {
        return Ok(None);
    }

    // Only fully-numeric sides join the score projection; a categorical
    // axis contributes points but no test series.
    let numeric_a: Vec<f64> = pairs.iter().filter_map(|(a, _)| parse_number(a)).collect();
    let numeric_b: Vec<f64> = pairs.iter().filter_map(|(_, b)| parse_number(b)).collect();
    let mut series = Vec::new();
    if numeric_a.len() == pairs.len() {
        series.push(numeric_a);
    }
    if numeric_b.len() == pairs.len() {
        series.push(numeric_b);
    }

    let visualize = pairs
        .iter()
        .map(|(a, b)| json!({ field_a: cell_json(a), field_b: cell_json(b) }))
        .collect();
    let rows = pairs
        .iter()
        .map(|(a, b)| vec![cell_json(a), cell_json(b)])
        .collect();
    Ok(Some(SpecData {
        score: ScoreProjection { series },
        visualize,
        table: TableProjection {
            columns: vec![field_a.to_string(), field_b.to_string()],
            rows,
        },
    }))
}

fn aggregate_aggregate(
    dataset: &Dataset,
    mask: &[bool],
    group: &str,
    value_a: &str,
    value_b: &str,
    agg: AggregateFunction,
) -> Result<Option<SpecData>> {
    let group_cells = masked_cells(dataset, mask, group)?;
    let cells_a = masked_cells(dataset, mask, value_a)?;
    let cells_b = masked_cells(dataset, mask, value_b)?;

    let mut groups: BTreeMap<&str, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for ((group_cell, cell_a), cell_b) in group_cells
        .iter()
        .copied()
        .zip(cells_a.iter().copied())
        .zip(cells_b.iter().copied())
    {
        let (Some(key), Some(raw_a), Some(raw_b)) = (group_cell, cell_a, cell_b) else {
            continue;
        };
        let (Some(number_a), Some(number_b)) = (parse_number(raw_a), parse_number(raw_b)) else {
            continue;
        };
        let entry = groups.entry(key).or_default();
        entry.0.push(number_a);
        entry.1.push(number_b);
    }
    if groups.is_empty() {
        return Ok(None);
    }

    let mut series_a = Vec::with_capacity(groups.len());
    let mut series_b = Vec::with_capacity(groups.len());
    let mut visualize = Vec::with_capacity(groups.len());
    let mut rows = Vec::with_capacity(groups.len());
    for (key, (values_a, values_b)) in &groups {
        let (Some(agg_a), Some(agg_b)) = (agg.apply(values_a), agg.apply(values_b)) else {
            continue;
        };
        series_a.push(agg_a);
        series_b.push(agg_b);
        visualize.push(json!({ "group": key, value_a: agg_a, value_b: agg_b }));
        rows.push(vec![json!(key), json!(agg_a), json!(agg_b)]);
    }
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(SpecData {
        score: ScoreProjection {
            series: vec![series_a, series_b],
        },
        visualize,
        table: TableProjection {
            columns: vec![
                group.to_string(),
                format!("{}({value_a})", agg.as_str()),
                format!("{}({value_b})", agg.as_str()),
            ],
            rows,
        },
    }))
}

fn value_value_quantitative(
    dataset: &Dataset,
    mask: &[bool],
    field_a: &str,
    field_b: &str,
    attributes: &[String],
) -> Result<Option<SpecData>> {
    let cells_a = masked_cells(dataset, mask, field_a)?;
    let cells_b = masked_cells(dataset, mask, field_b)?;
    let attribute_cells: Vec<Vec<Option<&str>>> = attributes
        .iter()
        .map(|attr| masked_cells(dataset, mask, attr))
        .collect::<Result<_>>()?;

    let mut visualize = Vec::new();
    let mut rows = Vec::new();
    let mut attribute_series: Vec<Vec<f64>> = vec![Vec::new(); attributes.len()];
    for (row_idx, (cell_a, cell_b)) in cells_a
        .iter()
        .copied()
        .zip(cells_b.iter().copied())
        .enumerate()
    {
        let (Some(a), Some(b)) = (cell_a, cell_b) else {
            continue;
        };
        let mut point = serde_json::Map::new();
        point.insert("source".to_string(), json!(a));
        point.insert("target".to_string(), json!(b));
        let mut row = vec![json!(a), json!(b)];
        for (attr_idx, attr_name) in attributes.iter().enumerate() {
            let value = attribute_cells[attr_idx]
                .get(row_idx)
                .copied()
                .flatten()
                .and_then(parse_number);
            if let Some(number) = value {
                attribute_series[attr_idx].push(number);
            }
            let rendered = value.map(|n| json!(n)).unwrap_or(JsonValue::Null);
            point.insert(attr_name.clone(), rendered.clone());
            row.push(rendered);
        }
        visualize.push(JsonValue::Object(point));
        rows.push(row);
    }
    if rows.is_empty() {
        return Ok(None);
    }

    let mut columns = vec![field_a.to_string(), field_b.to_string()];
    columns.extend(attributes.iter().cloned());
    Ok(Some(SpecData {
        score: ScoreProjection {
            series: attribute_series,
        },
        visualize,
        table: TableProjection { columns, rows },
    }))
}

fn cell_json(raw: &str) -> JsonValue {
    parse_number(raw)
        .map(|n| json!(n))
        .unwrap_or_else(|| json!(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        conditionals::{Conditional, ConditionalOperator, ConditionalValue},
        dataset::{Column, Dataset, normalize_cell},
        enumerate::enumerate_specs,
        fields::compute_field_properties,
    };

    fn dataset(columns: Vec<(&str, Vec<&str>)>) -> Dataset {
        let columns = columns
            .into_iter()
            .map(|(name, values)| {
                Column::new(name, values.iter().map(|v| normalize_cell(v)).collect())
            })
            .collect();
        Dataset::new("fixture", columns).expect("valid fixture dataset")
    }

    fn recommend(ds: &Dataset) -> Vec<ScoredSpec> {
        let config = EngineConfig::default();
        let fields = compute_field_properties(ds, &config);
        let skeletons = enumerate_specs(&fields, None).expect("enumerate");
        attach_and_score(skeletons, ds, None, &Conditionals::default(), &config)
            .expect("attach and score")
    }

    #[test]
    fn single_quantitative_family_scores_the_raw_series() {
        let ds = dataset(vec![("v", vec!["1", "2", "2", "3", "4", "100"])]);
        let scored = recommend(&ds);
        assert!(!scored.is_empty());
        for spec in &scored {
            assert_eq!(spec.scores.stats.get("size"), Some(&Some(6.0)));
            assert!(spec.scores.stats.get("gini").expect("gini key").is_some());
            assert!(
                spec.scores
                    .stats
                    .get("entropy")
                    .expect("entropy key")
                    .is_some()
            );
            assert!(
                spec.scores
                    .stats
                    .get("variance")
                    .expect("variance key")
                    .is_some()
            );
            // Six samples sit below the normality minimum: explicit null.
            assert_eq!(spec.scores.stats.get("normality"), Some(&None));
        }
    }

    #[test]
    fn value_count_with_two_categories_is_dropped() {
        let ds = dataset(vec![(
            "flaglike",
            vec!["on", "off", "on", "off", "on", "off"],
        )]);
        let scored = recommend(&ds);
        assert!(
            scored
                .iter()
                .all(|s| s.spec.generating_procedure != GeneratingProcedure::ValueCount)
        );
    }

    #[test]
    fn group_by_aggregate_materializes_sorted_groups() {
        let ds = dataset(vec![
            ("region", vec!["west", "east", "west", "east", "north"]),
            ("sales", vec!["10", "20", "30", "40", "50"]),
        ]);
        let scored = recommend(&ds);
        let sum_spec = scored
            .iter()
            .find(|s| {
                s.spec.generating_procedure == GeneratingProcedure::ValueAggregate
                    && matches!(
                        &s.spec.args,
                        SpecArgs::GroupBy {
                            agg_fn: AggregateFunction::Sum,
                            ..
                        }
                    )
            })
            .expect("sum group-by spec");
        assert_eq!(
            sum_spec.data.table.rows,
            vec![
                vec![json!("east"), json!(60.0)],
                vec![json!("north"), json!(50.0)],
                vec![json!("west"), json!(40.0)],
            ]
        );
        assert_eq!(sum_spec.data.score.series, vec![vec![60.0, 50.0, 40.0]]);
    }

    #[test]
    fn conditional_filter_restricts_the_working_table() {
        let ds = dataset(vec![
            ("region", vec!["west", "east", "west", "east"]),
            ("sales", vec!["10", "20", "30", "20"]),
        ]);
        let config = EngineConfig::default();
        let fields = compute_field_properties(&ds, &config);
        let skeletons = enumerate_specs(&fields, None).expect("enumerate");
        let conditionals = Conditionals {
            and: vec![Conditional {
                field: "sales".to_string(),
                operator: ConditionalOperator::Ge,
                value: ConditionalValue::Number(25.0),
            }],
            or: Vec::new(),
        };
        let scored =
            attach_and_score(skeletons, &ds, None, &conditionals, &config).expect("attach");
        let agg = scored
            .iter()
            .find(|s| {
                matches!(
                    &s.spec.args,
                    SpecArgs::SingleField {
                        agg_fn: Some(AggregateFunction::Sum),
                        ..
                    }
                ) && s.spec.generating_procedure == GeneratingProcedure::SingleAggregate
            })
            .expect("sum spec");
        assert_eq!(agg.data.table.rows, vec![vec![json!(30.0)]]);
    }

    #[test]
    fn relevance_orders_selected_fields_first() {
        let ds = dataset(vec![
            (
                "region",
                vec!["west", "east", "west", "east", "north", "south"],
            ),
            ("sales", vec!["10", "20", "30", "40", "50", "60"]),
            ("units", vec!["1", "2", "3", "4", "5", "6"]),
        ]);
        let config = EngineConfig::default();
        let fields = compute_field_properties(&ds, &config);
        let selection = vec!["sales".to_string()];
        let skeletons = enumerate_specs(&fields, Some(&selection)).expect("enumerate");
        let scored = attach_and_score(
            skeletons,
            &ds,
            Some(&selection),
            &Conditionals::default(),
            &config,
        )
        .expect("attach");
        assert!(!scored.is_empty());
        assert!(scored[0].scores.relevance >= RELEVANCE_PER_SELECTED_FIELD);
        for window in scored.windows(2) {
            assert!(window[0].scores.relevance >= window[1].scores.relevance);
        }
    }

    #[test]
    fn unique_pairing_materializes_raw_rows() {
        let ids: Vec<String> = (1..=100).map(|i| format!("u{i}")).collect();
        let ages: Vec<String> = (1..=100).map(|i| (20 + i % 50).to_string()).collect();
        let ds = dataset(vec![
            ("id", ids.iter().map(|v| v.as_str()).collect()),
            ("age", ages.iter().map(|v| v.as_str()).collect()),
        ]);
        let scored = recommend(&ds);
        let pairing = scored
            .iter()
            .find(|s| s.spec.generating_procedure == GeneratingProcedure::ValueValue)
            .expect("raw pairing spec");
        assert_eq!(pairing.data.table.rows.len(), 100);
        // One quantitative side feeds the univariate tests.
        assert_eq!(pairing.data.score.series.len(), 1);
    }
}
