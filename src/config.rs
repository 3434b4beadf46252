//! The externally-supplied configuration surface.
//!
//! The engine consumes these knobs but does not own them; a hosting layer
//! may load them from YAML, environment plumbing, or hardcode the defaults.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Values sampled per column for type detection (0 = full scan).
    pub type_sample_size: usize,
    /// Distinct/non-null ratio at or above which a field counts as unique.
    pub unique_ratio_threshold: f64,
    /// Distinct parent values beyond which a hierarchy scan short-circuits.
    pub hierarchy_value_cap: usize,
    /// Minimum Jaccard overlap for a cross-dataset relationship.
    pub relationship_threshold: f64,
    /// Upper bound on histogram bin count.
    pub max_bins: usize,
    /// Minimum coercible samples before the normality test runs.
    pub normality_min_samples: usize,
    /// Percentile cut points reported by describe().
    pub percentile_cuts: Vec<f64>,
    /// Recompute field/dataset properties even when a profile is cached.
    pub recompute_properties: bool,
    /// Recompute visualization specs even when a set exists for the key.
    pub recompute_specs: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            type_sample_size: 100,
            unique_ratio_threshold: 0.95,
            hierarchy_value_cap: 100,
            relationship_threshold: 0.5,
            max_bins: 20,
            normality_min_samples: 8,
            percentile_cuts: vec![0.25, 0.5, 0.75],
            recompute_properties: false,
            recompute_specs: true,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: EngineConfig =
            serde_yaml::from_reader(reader).context("Parsing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.unique_ratio_threshold),
            "unique_ratio_threshold must be within [0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&self.relationship_threshold),
            "relationship_threshold must be within [0, 1]"
        );
        ensure!(self.max_bins > 0, "max_bins must be positive");
        ensure!(
            self.percentile_cuts.iter().all(|c| (0.0..=1.0).contains(c)),
            "percentile cuts must be within [0, 1]"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().expect("valid defaults");
    }

    #[test]
    fn out_of_range_thresholds_are_rejected() {
        let mut config = EngineConfig::default();
        config.relationship_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config: EngineConfig =
            serde_yaml::from_str("max_bins: 12\n").expect("parse partial config");
        assert_eq!(config.max_bins, 12);
        assert_eq!(config.type_sample_size, 100);
    }
}
