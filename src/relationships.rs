//! Cross-dataset field relationship detection.
//!
//! Every unordered pair of datasets is compared field-by-field over the
//! materialized unique-value sets (quantitative and unique fields never
//! materialize one, so they never participate). Overlap is measured as
//! `|A∩B| / |A∪B|`; pairs at or above the configured threshold are emitted
//! with a cardinality classification from the source's perspective.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::{dataset::DatasetId, pipeline::DatasetProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "11",
            Cardinality::OneToMany => "1N",
            Cardinality::ManyToOne => "N1",
        }
    }
}

impl Serialize for Cardinality {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Relationship {
    pub source_dataset: DatasetId,
    pub source_field: String,
    pub target_dataset: DatasetId,
    pub target_field: String,
    pub distance: f64,
    pub cardinality: Cardinality,
}

/// Jaccard overlap of two value sets, in [0, 1]. Symmetric; 1.0 for any
/// non-empty set compared with itself, 0.0 when either side is empty.
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(|v| v.as_str()).collect();
    let set_b: HashSet<&str> = b.iter().map(|v| v.as_str()).collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / union as f64
}

fn classify_cardinality(len_a: usize, len_b: usize) -> Cardinality {
    if len_a == len_b {
        Cardinality::OneToOne
    } else if len_a > len_b {
        Cardinality::ManyToOne
    } else {
        Cardinality::OneToMany
    }
}

/// Pairwise detector that remembers which dataset pairs it has already
/// compared, so re-running after new datasets arrive only scans the new
/// combinations.
#[derive(Debug, Default)]
pub struct RelationshipDetector {
    threshold: f64,
    compared: BTreeSet<(DatasetId, DatasetId)>,
}

impl RelationshipDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            compared: BTreeSet::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Compares every not-yet-seen dataset pair and returns the
    /// relationships at or above the threshold.
    pub fn detect(&mut self, profiles: &[&DatasetProfile]) -> Vec<Relationship> {
        let mut relationships = Vec::new();
        for (pos, source) in profiles.iter().enumerate() {
            for target in &profiles[pos + 1..] {
                let key = pair_key(source.dataset_id, target.dataset_id);
                if !self.compared.insert(key) {
                    continue;
                }
                self.compare_pair(source, target, &mut relationships);
            }
        }
        relationships
    }

    fn compare_pair(
        &self,
        source: &DatasetProfile,
        target: &DatasetProfile,
        out: &mut Vec<Relationship>,
    ) {
        for field_a in &source.fields {
            let Some(values_a) = field_a.unique_values.as_ref() else {
                continue;
            };
            for field_b in &target.fields {
                let Some(values_b) = field_b.unique_values.as_ref() else {
                    continue;
                };
                let distance = jaccard(values_a, values_b);
                if distance < self.threshold {
                    continue;
                }
                out.push(Relationship {
                    source_dataset: source.dataset_id,
                    source_field: field_a.name.clone(),
                    target_dataset: target.dataset_id,
                    target_field: field_b.name.clone(),
                    distance,
                    cardinality: classify_cardinality(values_a.len(), values_b.len()),
                });
            }
        }
    }
}

fn pair_key(a: DatasetId, b: DatasetId) -> (DatasetId, DatasetId) {
    if a <= b { (a, b) } else { (b, a) }
}
