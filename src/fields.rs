//! Per-dataset field profiling.
//!
//! Combines the type classification with descriptive statistics, uniqueness
//! detection, normality testing, and intra-dataset parent/child hierarchy
//! detection, plus the dataset-level structure (wide/long) and time-series
//! descriptors derived from date-like column headers.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::{
    classify::{self, FieldType, GeneralType},
    config::EngineConfig,
    dataset::{Column, Dataset},
    stats::{self, DescribeStats},
};

const NORMALITY_ALPHA: f64 = 0.05;

/// One column of a dataset plus its inferred metadata.
#[derive(Debug, Clone, Serialize)]
pub struct FieldProperties {
    pub name: String,
    pub index: usize,
    pub field_type: FieldType,
    pub general_type: GeneralType,
    pub score: f64,
    pub type_scores: BTreeMap<FieldType, f64>,
    pub is_unique: bool,
    pub is_id: bool,
    /// Distinct values in first-seen order; omitted for unique or purely
    /// quantitative fields to bound memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_values: Option<Vec<String>>,
    pub stats: DescribeStats,
    /// Explicit null means the test ran (or was inapplicable), never "not
    /// yet computed".
    pub is_normal: Option<bool>,
    /// Name of the child field when this field heads a hierarchy level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<String>,
    pub is_child: bool,
}

impl FieldProperties {
    pub fn is_quantitative(&self) -> bool {
        self.general_type == GeneralType::Quantitative
    }
}

/// Computes one [`FieldProperties`] record per column, ordered by column
/// index. Pure: repeated invocations over the same dataset yield the same
/// records modulo floating-point nondeterminism.
pub fn compute_field_properties(dataset: &Dataset, config: &EngineConfig) -> Vec<FieldProperties> {
    let classifications = classify::classify_columns(dataset, config);
    let mut properties: Vec<FieldProperties> = dataset
        .columns()
        .iter()
        .zip(classifications)
        .enumerate()
        .map(|(index, (column, classification))| {
            let non_empty: Vec<&str> = column.non_empty().collect();
            let distinct: HashSet<&str> = non_empty.iter().copied().collect();
            let is_unique = !non_empty.is_empty()
                && distinct.len() as f64 / non_empty.len() as f64
                    >= config.unique_ratio_threshold;
            let is_id = classification.field_type == FieldType::Integer && is_unique;

            let quantitative = classification.general_type == GeneralType::Quantitative;
            let unique_values = if quantitative || is_unique {
                None
            } else {
                Some(distinct_in_order(&non_empty))
            };

            let numeric: Vec<f64> = non_empty
                .iter()
                .filter_map(|v| v.replace(',', "").parse::<f64>().ok())
                .collect();
            let field_stats = stats::describe(&numeric, &config.percentile_cuts);

            let is_normal = if quantitative && numeric.len() >= config.normality_min_samples {
                stats::normality_p(&numeric).map(|p| p >= NORMALITY_ALPHA)
            } else {
                None
            };

            FieldProperties {
                name: column.name.clone(),
                index,
                field_type: classification.field_type,
                general_type: classification.general_type,
                score: classification.score,
                type_scores: classification.type_scores,
                is_unique,
                is_id,
                unique_values,
                stats: field_stats,
                is_normal,
                child: None,
                is_child: false,
            }
        })
        .collect();

    detect_hierarchies(dataset, &mut properties, config.hierarchy_value_cap);
    properties
}

fn distinct_in_order(values: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for value in values {
        if seen.insert(*value) {
            ordered.push((*value).to_string());
        }
    }
    ordered
}

/// Marks parent→child pointers between categorical, non-unique fields.
///
/// Candidate pairs are ordered left-to-right only, which makes the relation
/// irreflexive and acyclic without a cycle check. A field is child of at
/// most one parent, and each parent points at most one child.
fn detect_hierarchies(dataset: &Dataset, properties: &mut [FieldProperties], cap: usize) {
    let candidates: Vec<usize> = properties
        .iter()
        .filter(|p| !p.is_quantitative() && !p.is_unique)
        .map(|p| p.index)
        .collect();

    for (pos, &parent_idx) in candidates.iter().enumerate() {
        if properties[parent_idx].child.is_some() {
            continue;
        }
        for &child_idx in &candidates[pos + 1..] {
            if properties[child_idx].is_child {
                continue;
            }
            let (Some(parent), Some(child)) =
                (dataset.column(parent_idx), dataset.column(child_idx))
            else {
                continue;
            };
            if is_hierarchical(parent, child, cap) {
                let child_name = properties[child_idx].name.clone();
                properties[parent_idx].child = Some(child_name);
                properties[child_idx].is_child = true;
                break;
            }
        }
    }
}

/// True when every distinct parent value maps to a child value-set disjoint
/// from every other parent's. Parents with more than `cap` distinct values
/// are skipped rather than scanned, the pipeline's main backpressure valve.
fn is_hierarchical(parent: &Column, child: &Column, cap: usize) -> bool {
    let mut groups: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (parent_cell, child_cell) in parent.values.iter().zip(&child.values) {
        let (Some(parent_value), Some(child_value)) = (parent_cell, child_cell) else {
            continue;
        };
        groups
            .entry(parent_value.as_str())
            .or_default()
            .insert(child_value.as_str());
        if groups.len() > cap {
            debug!(
                "hierarchy scan of '{}' -> '{}' exceeded {} distinct parent values, skipping",
                parent.name, child.name, cap
            );
            return false;
        }
    }
    if groups.len() < 2 {
        return false;
    }
    let total: usize = groups.values().map(|set| set.len()).sum();
    let mut union: BTreeSet<&str> = BTreeSet::new();
    for set in groups.values() {
        union.extend(set.iter().copied());
    }
    total == union.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetStructure {
    Wide,
    Long,
}

impl DatasetStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetStructure::Wide => "wide",
            DatasetStructure::Long => "long",
        }
    }
}

impl Serialize for DatasetStructure {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Descriptor for a contiguous run of date-like column headers.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesProperties {
    pub start_index: usize,
    pub start_name: String,
    pub end_index: usize,
    pub end_name: String,
    pub num_elements: usize,
    /// Interval between the first two header dates; null when the headers
    /// parse but only one interval spacing cannot be derived.
    pub interval_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetProperties {
    pub row_count: usize,
    pub column_count: usize,
    pub field_names: Vec<String>,
    pub field_types: Vec<FieldType>,
    pub structure: DatasetStructure,
    pub time_series: Option<TimeSeriesProperties>,
}

pub fn compute_dataset_properties(
    dataset: &Dataset,
    fields: &[FieldProperties],
) -> DatasetProperties {
    let headers: Vec<&str> = dataset.columns().iter().map(|c| c.name.as_str()).collect();
    let time_series = detect_time_series(&headers);
    let structure = if time_series.is_some() {
        DatasetStructure::Wide
    } else {
        DatasetStructure::Long
    };
    DatasetProperties {
        row_count: dataset.row_count(),
        column_count: dataset.column_count(),
        field_names: headers.iter().map(|h| h.to_string()).collect(),
        field_types: fields.iter().map(|f| f.field_type).collect(),
        structure,
        time_series,
    }
}

/// Finds the first contiguous run of at least two date-like headers.
pub fn detect_time_series(headers: &[&str]) -> Option<TimeSeriesProperties> {
    let parsed: Vec<Option<NaiveDate>> = headers.iter().map(|h| parse_header_date(h)).collect();

    let mut run_start = None;
    for (idx, date) in parsed.iter().enumerate() {
        match (date.is_some(), run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                if idx - start >= 2 {
                    return Some(build_time_series(headers, &parsed, start, idx - 1));
                }
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start
        && headers.len() - start >= 2
    {
        return Some(build_time_series(headers, &parsed, start, headers.len() - 1));
    }
    None
}

fn build_time_series(
    headers: &[&str],
    parsed: &[Option<NaiveDate>],
    start: usize,
    end: usize,
) -> TimeSeriesProperties {
    let interval_seconds = match (parsed.get(start), parsed.get(start + 1)) {
        (Some(Some(first)), Some(Some(second))) => {
            Some(second.signed_duration_since(*first).num_seconds())
        }
        _ => None,
    };
    TimeSeriesProperties {
        start_index: start,
        start_name: headers[start].to_string(),
        end_index: end,
        end_name: headers[end].to_string(),
        num_elements: end - start + 1,
        interval_seconds,
    }
}

/// Parses a column header as a calendar point: full dates, year-month,
/// month/year, or a bare year.
fn parse_header_date(header: &str) -> Option<NaiveDate> {
    let trimmed = header.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(date) = classify::parse_date_token(trimmed) {
        return Some(date);
    }
    for fmt in ["%Y-%m-%d", "%Y-%m", "%Y/%m", "%m/%Y"] {
        let candidate = match fmt {
            "%Y-%m" => format!("{trimmed}-01"),
            "%Y/%m" => format!("{trimmed}/01"),
            "%m/%Y" => {
                let Some((month, year)) = trimmed.split_once('/') else {
                    continue;
                };
                format!("{year}-{month}-01")
            }
            _ => trimmed.to_string(),
        };
        let parse_fmt = match fmt {
            "%Y-%m" => "%Y-%m-%d",
            "%Y/%m" => "%Y/%m/%d",
            "%m/%Y" => "%Y-%m-%d",
            other => other,
        };
        if let Ok(date) = NaiveDate::parse_from_str(&candidate, parse_fmt) {
            return Some(date);
        }
    }
    if trimmed.len() == 4
        && let Ok(year) = trimmed.parse::<i32>()
        && (1000..=2099).contains(&year)
    {
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::normalize_cell;

    fn dataset(columns: Vec<(&str, Vec<&str>)>) -> Dataset {
        let columns = columns
            .into_iter()
            .map(|(name, values)| {
                Column::new(name, values.iter().map(|v| normalize_cell(v)).collect())
            })
            .collect();
        Dataset::new("fixture", columns).expect("valid fixture dataset")
    }

    #[test]
    fn unique_detection_uses_the_ratio_threshold() {
        let config = EngineConfig::default();
        let ds = dataset(vec![(
            "id",
            (1..=100).map(|_| "x").collect::<Vec<_>>(),
        )]);
        let props = compute_field_properties(&ds, &config);
        assert!(!props[0].is_unique);

        let values: Vec<String> = (1..=100).map(|i| i.to_string()).collect();
        let ds = dataset(vec![(
            "id",
            values.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
        )]);
        let props = compute_field_properties(&ds, &config);
        assert!(props[0].is_unique);
        assert!(props[0].is_id);
        assert!(props[0].unique_values.is_none());
    }

    #[test]
    fn unique_values_materialize_only_for_non_unique_categoricals() {
        let config = EngineConfig::default();
        let ds = dataset(vec![
            ("region", vec!["east", "west", "east", "west"]),
            ("amount", vec!["1.5", "2.5", "3.5", "4.5"]),
        ]);
        let props = compute_field_properties(&ds, &config);
        assert_eq!(
            props[0].unique_values.as_deref(),
            Some(&["east".to_string(), "west".to_string()][..])
        );
        assert!(props[1].unique_values.is_none(), "quantitative field");
    }

    #[test]
    fn normality_is_null_for_small_or_categorical_fields() {
        let config = EngineConfig::default();
        let ds = dataset(vec![
            ("few", vec!["1", "2", "3"]),
            ("label", vec!["a", "b", "a"]),
        ]);
        let props = compute_field_properties(&ds, &config);
        assert_eq!(props[0].is_normal, None);
        assert_eq!(props[1].is_normal, None);
    }

    #[test]
    fn hierarchy_links_country_to_city() {
        let config = EngineConfig::default();
        let ds = dataset(vec![
            (
                "country",
                vec!["US", "US", "CA", "CA", "US", "CA"],
            ),
            (
                "city",
                vec![
                    "new york", "chicago", "toronto", "vancouver", "new york", "toronto",
                ],
            ),
        ]);
        let props = compute_field_properties(&ds, &config);
        assert_eq!(props[0].child.as_deref(), Some("city"));
        assert!(props[1].is_child);
        assert!(!props[0].is_child, "no 2-cycles");
    }

    #[test]
    fn overlapping_groups_are_not_hierarchical() {
        let config = EngineConfig::default();
        // "shared" appears under both parents, breaking injectivity.
        let ds = dataset(vec![
            ("parent", vec!["a", "a", "b", "b"]),
            ("child", vec!["shared", "x", "shared", "y"]),
        ]);
        let props = compute_field_properties(&ds, &config);
        assert_eq!(props[0].child, None);
        assert!(!props[1].is_child);
    }

    #[test]
    fn hierarchy_scan_respects_the_value_cap() {
        let mut config = EngineConfig::default();
        config.hierarchy_value_cap = 3;
        config.unique_ratio_threshold = 2.0; // keep both fields non-unique
        let parents: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();
        let children: Vec<String> = (0..10).map(|i| format!("c{i}")).collect();
        let ds = dataset(vec![
            (
                "parent",
                parents.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            ),
            (
                "child",
                children.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            ),
        ]);
        let props = compute_field_properties(&ds, &config);
        assert_eq!(props[0].child, None, "cap short-circuits, no error");
    }

    #[test]
    fn wide_structure_detected_from_date_headers() {
        let headers = ["2020-01", "2020-02", "2020-03", "value"];
        let ts = detect_time_series(&headers).expect("time series");
        assert_eq!(ts.start_index, 0);
        assert_eq!(ts.start_name, "2020-01");
        assert_eq!(ts.end_index, 2);
        assert_eq!(ts.num_elements, 3);
        // January 2020 has 31 days.
        assert_eq!(ts.interval_seconds, Some(31 * 86_400));
    }

    #[test]
    fn long_structure_when_no_date_run_exists() {
        assert!(detect_time_series(&["name", "2020-01", "total"]).is_none());
        assert!(detect_time_series(&["name", "total"]).is_none());
    }
}
