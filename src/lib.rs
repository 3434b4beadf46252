//! Field-type inference and visualization-spec recommendation for tabular
//! datasets.
//!
//! The pipeline runs in five stages, each a pure function of its inputs:
//!
//! 1. [`classify::classify_columns`] scores every column against the semantic
//!    type catalog and resolves one type per column.
//! 2. [`fields::compute_field_properties`] combines the classification with
//!    descriptive statistics, uniqueness detection, normality testing, and
//!    parent/child hierarchy detection.
//! 3. [`relationships::RelationshipDetector`] compares unique-value sets
//!    across datasets and infers 1:1 / 1:N / N:1 field linkages.
//! 4. [`enumerate::enumerate_specs`] expands the typed field set into
//!    candidate visualization-spec skeletons via a case table keyed on the
//!    categorical/quantitative field counts.
//! 5. [`attach::attach_and_score`] materializes, filters, and scores the
//!    candidates, returning a ranked list.
//!
//! Persistence, transport, and scheduling are the caller's concern: the
//! library consumes an already-parsed [`dataset::Dataset`] and emits plain
//! serializable records through the [`pipeline::PropertySink`] trait.

pub mod attach;
pub mod classify;
pub mod cli;
pub mod conditionals;
pub mod config;
pub mod dataset;
pub mod enumerate;
pub mod error;
pub mod fields;
pub mod geo;
pub mod io_utils;
pub mod pipeline;
pub mod relationships;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("vizier", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Probe(args) => cli::handle_probe(&args),
        Commands::Recommend(args) => cli::handle_recommend(&args),
        Commands::Relate(args) => cli::handle_relate(&args),
    }
}
