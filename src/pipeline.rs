//! Pipeline composition and the output-collaborator seam.
//!
//! The five stages compose as a straight line — classify, profile, relate,
//! enumerate, attach/score — with one barrier (hierarchy detection inside
//! profiling needs every column) and two natural fan-outs (relationship
//! pairs, spec materialization). Every stage is idempotent: re-running over
//! identical inputs yields identical records modulo floating-point noise,
//! and a cancelled run leaves no partial output because nothing is emitted
//! until a stage completes.

use std::collections::BTreeMap;

use anyhow::Result;
use log::info;
use sha2::{Digest, Sha256};

use crate::{
    attach::{ScoredSpec, attach_and_score},
    conditionals::Conditionals,
    config::EngineConfig,
    dataset::{Dataset, DatasetId},
    enumerate::enumerate_specs,
    fields::{DatasetProperties, FieldProperties, compute_dataset_properties,
             compute_field_properties},
    relationships::{Relationship, RelationshipDetector},
};

/// Everything the pipeline derives from one dataset.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatasetProfile {
    pub dataset_id: DatasetId,
    pub name: String,
    pub fields: Vec<FieldProperties>,
    pub properties: DatasetProperties,
}

/// Profiles a dataset: field properties (with the hierarchy barrier) plus
/// dataset-level structure.
pub fn profile_dataset(dataset: &Dataset, config: &EngineConfig) -> DatasetProfile {
    let fields = compute_field_properties(dataset, config);
    let properties = compute_dataset_properties(dataset, &fields);
    DatasetProfile {
        dataset_id: dataset.id,
        name: dataset.name.clone(),
        fields,
        properties,
    }
}

/// Output collaborator. The engine never talks to storage directly; a
/// hosting layer implements this against whatever persistence it owns.
pub trait PropertySink {
    /// Upsert-by-(dataset, field name) semantics.
    fn upsert_field_properties(
        &mut self,
        dataset_id: DatasetId,
        fields: &[FieldProperties],
    ) -> Result<()>;

    /// Upsert-by-dataset semantics.
    fn upsert_dataset_properties(
        &mut self,
        dataset_id: DatasetId,
        properties: &DatasetProperties,
    ) -> Result<()>;

    /// Insert-only.
    fn insert_relationships(&mut self, relationships: &[Relationship]) -> Result<()>;

    /// Full replacement of the spec set stored under `key`.
    fn replace_specs(&mut self, key: &str, specs: &[ScoredSpec]) -> Result<()>;
}

/// In-memory sink for tests and the CLI.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub field_properties: BTreeMap<DatasetId, Vec<FieldProperties>>,
    pub dataset_properties: BTreeMap<DatasetId, DatasetProperties>,
    pub relationships: Vec<Relationship>,
    pub specs: BTreeMap<String, Vec<ScoredSpec>>,
}

impl PropertySink for MemorySink {
    fn upsert_field_properties(
        &mut self,
        dataset_id: DatasetId,
        fields: &[FieldProperties],
    ) -> Result<()> {
        self.field_properties.insert(dataset_id, fields.to_vec());
        Ok(())
    }

    fn upsert_dataset_properties(
        &mut self,
        dataset_id: DatasetId,
        properties: &DatasetProperties,
    ) -> Result<()> {
        self.dataset_properties
            .insert(dataset_id, properties.clone());
        Ok(())
    }

    fn insert_relationships(&mut self, relationships: &[Relationship]) -> Result<()> {
        self.relationships.extend_from_slice(relationships);
        Ok(())
    }

    fn replace_specs(&mut self, key: &str, specs: &[ScoredSpec]) -> Result<()> {
        self.specs.insert(key.to_string(), specs.to_vec());
        Ok(())
    }
}

/// Replacement key for a spec set: one dataset, one selection, one
/// conditional tree. Selections are order-insensitive.
pub fn spec_set_key(
    dataset_id: DatasetId,
    selection: Option<&[String]>,
    conditionals: &Conditionals,
) -> String {
    let mut sorted_selection: Vec<&str> = selection
        .map(|s| s.iter().map(|v| v.as_str()).collect())
        .unwrap_or_default();
    sorted_selection.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(dataset_id.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(sorted_selection.join(",").as_bytes());
    hasher.update(b"|");
    hasher.update(conditionals.canonical_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stateful front door over the pure stages: caches profiles, tracks
/// already-compared dataset pairs, and feeds the sink.
pub struct Engine {
    config: EngineConfig,
    detector: RelationshipDetector,
    profiles: BTreeMap<DatasetId, DatasetProfile>,
    spec_sets: BTreeMap<String, Vec<ScoredSpec>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let detector = RelationshipDetector::new(config.relationship_threshold);
        Self {
            config,
            detector,
            profiles: BTreeMap::new(),
            spec_sets: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profile(&self, dataset_id: DatasetId) -> Option<&DatasetProfile> {
        self.profiles.get(&dataset_id)
    }

    /// Profiles a dataset and hands the records to the sink. Reuses a
    /// cached profile unless the recompute flag is set.
    pub fn ingest(
        &mut self,
        dataset: &Dataset,
        sink: &mut dyn PropertySink,
    ) -> Result<&DatasetProfile> {
        if self.config.recompute_properties || !self.profiles.contains_key(&dataset.id) {
            let profile = profile_dataset(dataset, &self.config);
            info!(
                "profiled dataset '{}' ({} rows, {} columns)",
                dataset.name,
                dataset.row_count(),
                dataset.column_count()
            );
            sink.upsert_field_properties(dataset.id, &profile.fields)?;
            sink.upsert_dataset_properties(dataset.id, &profile.properties)?;
            self.profiles.insert(dataset.id, profile);
        }
        Ok(&self.profiles[&dataset.id])
    }

    /// Detects relationships across every ingested dataset, skipping pairs
    /// compared on earlier runs, and inserts the new ones.
    pub fn relate(&mut self, sink: &mut dyn PropertySink) -> Result<Vec<Relationship>> {
        let profiles: Vec<&DatasetProfile> = self.profiles.values().collect();
        let relationships = self.detector.detect(&profiles);
        if !relationships.is_empty() {
            info!("detected {} new relationship(s)", relationships.len());
            sink.insert_relationships(&relationships)?;
        }
        Ok(relationships)
    }

    /// Enumerates, materializes, and scores specs for one dataset, then
    /// replaces the stored set for the (dataset, selection, conditionals)
    /// key.
    pub fn recommend(
        &mut self,
        dataset: &Dataset,
        selection: Option<&[String]>,
        conditionals: &Conditionals,
        sink: &mut dyn PropertySink,
    ) -> Result<Vec<ScoredSpec>> {
        self.ingest(dataset, sink)?;
        let key = spec_set_key(dataset.id, selection, conditionals);
        if !self.config.recompute_specs
            && let Some(existing) = self.spec_sets.get(&key)
        {
            return Ok(existing.clone());
        }
        let profile = &self.profiles[&dataset.id];
        let skeletons = enumerate_specs(&profile.fields, selection)?;
        let scored = attach_and_score(skeletons, dataset, selection, conditionals, &self.config)?;
        info!(
            "scored {} spec(s) for dataset '{}'",
            scored.len(),
            dataset.name
        );
        sink.replace_specs(&key, &scored)?;
        self.spec_sets.insert(key, scored.clone());
        Ok(scored)
    }
}
