//! Combinatorial enumeration of visualization-spec skeletons.
//!
//! Given the typed field set (and optionally a user selection), a case table
//! keyed on the categorical/quantitative field counts drives a small set of
//! reusable generator functions. Each skeleton names its generating
//! procedure (the shape of the computation), its type structure (the axis
//! signature), the concrete fields involved, and a caption assembled from a
//! token grammar that preserves field names verbatim.
//!
//! This stage is pure: identical inputs produce identical output, order
//! included. No I/O, no randomness.

use std::collections::HashSet;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    classify::GeneralType,
    error::SpecError,
    fields::FieldProperties,
};

/// The shape of computation deriving a spec's data from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratingProcedure {
    SingleAggregate,
    IndexValue,
    ValueCount,
    BinAggregate,
    ValueAggregate,
    ValueValue,
    AggregateAggregate,
    ValueValueQuantitative,
}

impl GeneratingProcedure {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratingProcedure::SingleAggregate => "agg",
            GeneratingProcedure::IndexValue => "ind:val",
            GeneratingProcedure::ValueCount => "val:count",
            GeneratingProcedure::BinAggregate => "bin:agg",
            GeneratingProcedure::ValueAggregate => "val:agg",
            GeneratingProcedure::ValueValue => "val:val",
            GeneratingProcedure::AggregateAggregate => "agg:agg",
            GeneratingProcedure::ValueValueQuantitative => "val:val:q",
        }
    }
}

impl Serialize for GeneratingProcedure {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// The axis/type signature of a spec's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeStructure {
    /// One quantitative value.
    Q,
    /// Categorical axis against a quantitative axis.
    CQ,
    /// Binned quantitative axis against a quantitative axis.
    BQ,
    /// Two quantitative axes.
    QQ,
    /// Categorical pair with a quantitative attribute.
    CCQ,
    /// Two quantitative series grouped by one categorical axis.
    GroupedQQ,
}

impl TypeStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeStructure::Q => "q",
            TypeStructure::CQ => "c:q",
            TypeStructure::BQ => "b:q",
            TypeStructure::QQ => "q:q",
            TypeStructure::CCQ => "c:c:q",
            TypeStructure::GroupedQQ => "[c]:q:q",
        }
    }
}

impl Serialize for TypeStructure {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Sum,
    Min,
    Max,
    Mean,
    Count,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Mean => "mean",
            AggregateFunction::Count => "count",
        }
    }

    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        match self {
            AggregateFunction::Sum => Some(values.iter().sum()),
            AggregateFunction::Min => values.iter().copied().reduce(f64::min),
            AggregateFunction::Max => values.iter().copied().reduce(f64::max),
            AggregateFunction::Mean => crate::stats::mean(values),
            AggregateFunction::Count => Some(values.len() as f64),
        }
    }
}

impl Serialize for AggregateFunction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// All aggregate functions applied to a lone quantitative field.
pub const SINGLE_AGGREGATES: &[AggregateFunction] = &[
    AggregateFunction::Sum,
    AggregateFunction::Min,
    AggregateFunction::Max,
    AggregateFunction::Mean,
    AggregateFunction::Count,
];

/// Group-by crosses skip `count`, which would collapse into the grouping
/// field's own value:count spec.
pub const CROSS_AGGREGATES: &[AggregateFunction] = &[
    AggregateFunction::Sum,
    AggregateFunction::Min,
    AggregateFunction::Max,
    AggregateFunction::Mean,
];

/// Concrete fields and functions feeding a generating procedure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecArgs {
    SingleField {
        field: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        agg_fn: Option<AggregateFunction>,
    },
    GroupBy {
        group: String,
        value: String,
        agg_fn: AggregateFunction,
    },
    Pair {
        field_a: String,
        field_b: String,
    },
    GroupPair {
        group: String,
        value_a: String,
        value_b: String,
        agg_fn: AggregateFunction,
    },
    PairWithAttributes {
        field_a: String,
        field_b: String,
        attributes: Vec<String>,
    },
}

/// Caption token; field names pass through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum TermToken {
    Plain(String),
    Field(String),
    Operation(String),
    Transformation(String),
}

impl TermToken {
    pub fn text(&self) -> &str {
        match self {
            TermToken::Plain(s)
            | TermToken::Field(s)
            | TermToken::Operation(s)
            | TermToken::Transformation(s) => s,
        }
    }
}

fn plain(text: &str) -> TermToken {
    TermToken::Plain(text.to_string())
}

fn field_token(name: &str) -> TermToken {
    TermToken::Field(name.to_string())
}

fn operation(name: &str) -> TermToken {
    TermToken::Operation(name.to_string())
}

fn transformation(name: &str) -> TermToken {
    TermToken::Transformation(name.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpecMeta {
    pub description: String,
    pub tokens: Vec<TermToken>,
}

impl SpecMeta {
    pub fn from_tokens(tokens: Vec<TermToken>) -> Self {
        let description = tokens
            .iter()
            .map(|t| t.text())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            description,
            tokens,
        }
    }
}

/// An un-materialized visualization candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpecSkeleton {
    pub generating_procedure: GeneratingProcedure,
    pub type_structure: TypeStructure,
    pub args: SpecArgs,
    pub meta: SpecMeta,
}

impl SpecSkeleton {
    /// Names of every field the spec touches, for relevance scoring.
    pub fn field_names(&self) -> Vec<&str> {
        match &self.args {
            SpecArgs::SingleField { field, .. } => vec![field],
            SpecArgs::GroupBy { group, value, .. } => vec![group, value],
            SpecArgs::Pair { field_a, field_b } => vec![field_a, field_b],
            SpecArgs::GroupPair {
                group,
                value_a,
                value_b,
                ..
            } => vec![group, value_a, value_b],
            SpecArgs::PairWithAttributes {
                field_a,
                field_b,
                attributes,
            } => {
                let mut names = vec![field_a.as_str(), field_b.as_str()];
                names.extend(attributes.iter().map(|a| a.as_str()));
                names
            }
        }
    }
}

/// Aggregate-of-one, distribution, and binned-count specs for a lone
/// quantitative field. Unique fields trade the value:count distribution for
/// a raw index:value series.
fn single_quantitative_specs(field: &FieldProperties) -> Vec<SpecSkeleton> {
    let mut specs = Vec::new();
    for agg in SINGLE_AGGREGATES {
        specs.push(SpecSkeleton {
            generating_procedure: GeneratingProcedure::SingleAggregate,
            type_structure: TypeStructure::Q,
            args: SpecArgs::SingleField {
                field: field.name.clone(),
                agg_fn: Some(*agg),
            },
            meta: SpecMeta::from_tokens(vec![
                operation(agg.as_str()),
                plain("of"),
                field_token(&field.name),
            ]),
        });
    }
    if field.is_unique {
        specs.push(SpecSkeleton {
            generating_procedure: GeneratingProcedure::IndexValue,
            type_structure: TypeStructure::QQ,
            args: SpecArgs::SingleField {
                field: field.name.clone(),
                agg_fn: None,
            },
            meta: SpecMeta::from_tokens(vec![
                field_token(&field.name),
                plain("across rows"),
            ]),
        });
    } else {
        specs.push(SpecSkeleton {
            generating_procedure: GeneratingProcedure::ValueCount,
            type_structure: TypeStructure::CQ,
            args: SpecArgs::SingleField {
                field: field.name.clone(),
                agg_fn: None,
            },
            meta: SpecMeta::from_tokens(vec![
                operation("count"),
                plain("of rows by"),
                field_token(&field.name),
            ]),
        });
    }
    specs.push(SpecSkeleton {
        generating_procedure: GeneratingProcedure::BinAggregate,
        type_structure: TypeStructure::BQ,
        args: SpecArgs::SingleField {
            field: field.name.clone(),
            agg_fn: Some(AggregateFunction::Count),
        },
        meta: SpecMeta::from_tokens(vec![
            operation("count"),
            plain("of rows"),
            transformation("binned by"),
            field_token(&field.name),
        ]),
    });
    specs
}

fn single_categorical_specs(field: &FieldProperties) -> Vec<SpecSkeleton> {
    vec![SpecSkeleton {
        generating_procedure: GeneratingProcedure::ValueCount,
        type_structure: TypeStructure::CQ,
        args: SpecArgs::SingleField {
            field: field.name.clone(),
            agg_fn: None,
        },
        meta: SpecMeta::from_tokens(vec![
            operation("count"),
            plain("of rows by"),
            field_token(&field.name),
        ]),
    }]
}

/// Categorical-against-quantitative cross: a group-by aggregate, or the raw
/// pairing when the categorical field is unique (every group would hold one
/// row, so aggregation adds nothing).
fn cross_specs(categorical: &FieldProperties, quantitative: &FieldProperties) -> Vec<SpecSkeleton> {
    if categorical.is_unique {
        return vec![SpecSkeleton {
            generating_procedure: GeneratingProcedure::ValueValue,
            type_structure: TypeStructure::CQ,
            args: SpecArgs::Pair {
                field_a: categorical.name.clone(),
                field_b: quantitative.name.clone(),
            },
            meta: SpecMeta::from_tokens(vec![
                field_token(&quantitative.name),
                plain("by"),
                field_token(&categorical.name),
            ]),
        }];
    }
    CROSS_AGGREGATES
        .iter()
        .map(|agg| SpecSkeleton {
            generating_procedure: GeneratingProcedure::ValueAggregate,
            type_structure: TypeStructure::CQ,
            args: SpecArgs::GroupBy {
                group: categorical.name.clone(),
                value: quantitative.name.clone(),
                agg_fn: *agg,
            },
            meta: SpecMeta::from_tokens(vec![
                operation(agg.as_str()),
                plain("of"),
                field_token(&quantitative.name),
                plain("by"),
                field_token(&categorical.name),
            ]),
        })
        .collect()
}

/// Pairwise quantitative specs are reserved until elementwise derived
/// columns land; the case table still routes through here so the dispatch
/// stays exhaustive.
fn quantitative_pair_specs(_quantitative: &[&FieldProperties]) -> Vec<SpecSkeleton> {
    Vec::new()
}

/// Categorical-pair specs without an attribute are likewise reserved.
fn categorical_pair_specs(_categorical: &[&FieldProperties]) -> Vec<SpecSkeleton> {
    Vec::new()
}

/// Two free quantitative fields aggregated independently under one
/// categorical grouping.
fn grouped_pair_specs(
    categorical: &FieldProperties,
    value_a: &FieldProperties,
    value_b: &FieldProperties,
) -> Vec<SpecSkeleton> {
    vec![SpecSkeleton {
        generating_procedure: GeneratingProcedure::AggregateAggregate,
        type_structure: TypeStructure::GroupedQQ,
        args: SpecArgs::GroupPair {
            group: categorical.name.clone(),
            value_a: value_a.name.clone(),
            value_b: value_b.name.clone(),
            agg_fn: AggregateFunction::Mean,
        },
        meta: SpecMeta::from_tokens(vec![
            operation("mean"),
            plain("of"),
            field_token(&value_a.name),
            plain("and"),
            field_token(&value_b.name),
            plain("by"),
            field_token(&categorical.name),
        ]),
    }]
}

/// Categorical pair carrying a quantitative attribute, the shape behind
/// network/connection visuals.
fn linked_pair_specs(
    cat_a: &FieldProperties,
    cat_b: &FieldProperties,
    quantitative: &FieldProperties,
) -> Vec<SpecSkeleton> {
    vec![SpecSkeleton {
        generating_procedure: GeneratingProcedure::ValueValueQuantitative,
        type_structure: TypeStructure::CCQ,
        args: SpecArgs::PairWithAttributes {
            field_a: cat_a.name.clone(),
            field_b: cat_b.name.clone(),
            attributes: vec![quantitative.name.clone()],
        },
        meta: SpecMeta::from_tokens(vec![
            field_token(&cat_a.name),
            plain("linked to"),
            field_token(&cat_b.name),
            plain("weighted by"),
            field_token(&quantitative.name),
        ]),
    }]
}

/// Case dispatch over (|C|, |Q|). Unique and id fields keep their place in
/// the counts and in cross generators but are skipped by single-field
/// summary generation.
pub fn enumerate_baseline(fields: &[&FieldProperties]) -> Vec<SpecSkeleton> {
    let qs: Vec<&FieldProperties> = fields
        .iter()
        .filter(|f| matches!(f.general_type, GeneralType::Quantitative))
        .copied()
        .collect();
    let cs: Vec<&FieldProperties> = fields
        .iter()
        .filter(|f| matches!(f.general_type, GeneralType::Categorical | GeneralType::Temporal))
        .copied()
        .collect();
    let summary_qs: Vec<&FieldProperties> = qs
        .iter()
        .filter(|f| !f.is_unique && !f.is_id)
        .copied()
        .collect();
    let summary_cs: Vec<&FieldProperties> = cs
        .iter()
        .filter(|f| !f.is_unique && !f.is_id)
        .copied()
        .collect();

    let mut specs = Vec::new();
    match (cs.len(), qs.len()) {
        (0, 0) => {}
        (0, 1) => {
            for q in &summary_qs {
                specs.extend(single_quantitative_specs(q));
            }
        }
        (0, _) => {
            for q in &summary_qs {
                specs.extend(single_quantitative_specs(q));
            }
            specs.extend(quantitative_pair_specs(&qs));
        }
        (1, 0) => {
            for c in &summary_cs {
                specs.extend(single_categorical_specs(c));
            }
        }
        (1, 1) => {
            for q in &summary_qs {
                specs.extend(single_quantitative_specs(q));
            }
            for c in &summary_cs {
                specs.extend(single_categorical_specs(c));
            }
            specs.extend(cross_specs(cs[0], qs[0]));
        }
        (1, _) => {
            for q in &qs {
                specs.extend(cross_specs(cs[0], q));
            }
            for c in &summary_cs {
                specs.extend(single_categorical_specs(c));
            }
            specs.extend(quantitative_pair_specs(&qs));
            for (a, b) in qs.iter().tuple_combinations() {
                specs.extend(grouped_pair_specs(cs[0], a, b));
            }
        }
        (_, 0) => {
            for c in &summary_cs {
                specs.extend(single_categorical_specs(c));
            }
            specs.extend(categorical_pair_specs(&cs));
        }
        (_, 1) => {
            for c in &cs {
                specs.extend(cross_specs(c, qs[0]));
            }
            specs.extend(categorical_pair_specs(&cs));
            for (a, b) in cs.iter().tuple_combinations() {
                specs.extend(linked_pair_specs(a, b, qs[0]));
            }
        }
        (_, _) => {
            for c in &summary_cs {
                specs.extend(single_categorical_specs(c));
            }
            for c in &cs {
                for q in &qs {
                    specs.extend(cross_specs(c, q));
                }
            }
            for c in &cs {
                for (a, b) in qs.iter().tuple_combinations() {
                    specs.extend(grouped_pair_specs(c, a, b));
                }
            }
            for q in &summary_qs {
                specs.extend(single_quantitative_specs(q));
            }
            for q in &qs {
                for (a, b) in cs.iter().tuple_combinations() {
                    specs.extend(linked_pair_specs(a, b, q));
                }
            }
            specs.extend(quantitative_pair_specs(&qs));
            specs.extend(categorical_pair_specs(&cs));
        }
    }
    specs
}

/// Enumerates candidate skeletons for a dataset's field set.
///
/// With a selection, three tiers are generated: (a) single-field baselines
/// for each selected field (explicit selection overrides the unique/id
/// skip), (b) cascading specs treating the selection as the whole dataset,
/// and (c) expanded specs pairing each selected field with each compatible
/// non-selected field. Duplicates across tiers collapse to their first
/// occurrence.
pub fn enumerate_specs(
    fields: &[FieldProperties],
    selection: Option<&[String]>,
) -> Result<Vec<SpecSkeleton>, SpecError> {
    let all: Vec<&FieldProperties> = fields.iter().collect();
    let Some(selection) = selection else {
        return Ok(dedup(enumerate_baseline(&all)));
    };

    let mut selected: Vec<&FieldProperties> = Vec::with_capacity(selection.len());
    for name in selection {
        let field = fields
            .iter()
            .find(|f| &f.name == name)
            .ok_or_else(|| SpecError::UnknownField {
                field: name.clone(),
                context: "selection",
            })?;
        selected.push(field);
    }

    let mut specs = Vec::new();
    for field in &selected {
        match field.general_type {
            GeneralType::Quantitative => specs.extend(single_quantitative_specs(field)),
            GeneralType::Categorical | GeneralType::Temporal => {
                specs.extend(single_categorical_specs(field));
            }
        }
    }

    specs.extend(enumerate_baseline(&selected));

    let selected_names: HashSet<&str> = selected.iter().map(|f| f.name.as_str()).collect();
    for field in &selected {
        for other in fields.iter().filter(|f| !selected_names.contains(f.name.as_str())) {
            match (field.general_type, other.general_type) {
                (GeneralType::Quantitative, GeneralType::Categorical | GeneralType::Temporal) => {
                    specs.extend(cross_specs(other, field));
                }
                (GeneralType::Categorical | GeneralType::Temporal, GeneralType::Quantitative) => {
                    specs.extend(cross_specs(field, other));
                }
                // Same-bucket expansion rides on the reserved pairwise
                // generators and currently yields nothing.
                _ => {}
            }
        }
    }

    Ok(dedup(specs))
}

fn dedup(specs: Vec<SpecSkeleton>) -> Vec<SpecSkeleton> {
    let mut seen: HashSet<(GeneratingProcedure, SpecArgs)> = HashSet::new();
    specs
        .into_iter()
        .filter(|spec| seen.insert((spec.generating_procedure, spec.args.clone())))
        .collect()
}
