//! Command-line surface: thin glue that loads delimited files into datasets
//! and prints the engine's records.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use crate::{
    conditionals::{Conditionals, parse_conditional},
    config::EngineConfig,
    dataset::Dataset,
    io_utils,
    pipeline::{Engine, MemorySink, profile_dataset},
    table,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Infer field types and recommend visualization specs for tabular data",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer per-field semantic types and properties for a dataset
    Probe(ProbeArgs),
    /// Enumerate and score candidate visualization specs
    Recommend(RecommendArgs),
    /// Detect field relationships across two or more datasets
    Relate(RelateArgs),
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input CSV/TSV file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Optional engine configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Emit the full property records as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RecommendArgs {
    /// Input CSV/TSV file to analyze
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Optional engine configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Fields to focus the recommendation on
    #[arg(short = 'C', long = "select", value_delimiter = ',')]
    pub select: Vec<String>,
    /// Row-level conditionals such as `amount >= 100` (AND-combined)
    #[arg(long = "where", action = clap::ArgAction::Append)]
    pub conditionals: Vec<String>,
    /// Keep only the highest-ranked specs (0 = all)
    #[arg(long, default_value_t = 0)]
    pub top: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct RelateArgs {
    /// Two or more CSV/TSV files to compare
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Optional engine configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Minimum Jaccard overlap for a relationship
    #[arg(long)]
    pub threshold: Option<f64>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn load_dataset(
    input: &PathBuf,
    delimiter: Option<u8>,
    encoding_label: Option<&str>,
) -> Result<Dataset> {
    let delimiter = io_utils::resolve_input_delimiter(input, delimiter);
    let encoding = io_utils::resolve_encoding(encoding_label)?;
    Dataset::from_delimited_path(input, delimiter, encoding)
        .with_context(|| format!("Loading dataset from {input:?}"))
}

pub fn handle_probe(args: &ProbeArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let dataset = load_dataset(&args.input, args.delimiter, args.input_encoding.as_deref())?;
    let profile = profile_dataset(&dataset, &config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    let headers = vec![
        "field".to_string(),
        "type".to_string(),
        "general".to_string(),
        "score".to_string(),
        "unique".to_string(),
        "id".to_string(),
        "child".to_string(),
    ];
    let rows: Vec<Vec<String>> = profile
        .fields
        .iter()
        .map(|f| {
            vec![
                f.name.clone(),
                f.field_type.to_string(),
                f.general_type.to_string(),
                format!("{:.3}", f.score),
                f.is_unique.to_string(),
                f.is_id.to_string(),
                f.child.clone().unwrap_or_default(),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
    info!(
        "profiled {} field(s), structure {}",
        profile.fields.len(),
        profile.properties.structure.as_str()
    );
    Ok(())
}

pub fn handle_recommend(args: &RecommendArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let dataset = load_dataset(&args.input, args.delimiter, args.input_encoding.as_deref())?;

    let mut conditionals = Conditionals::default();
    for raw in &args.conditionals {
        conditionals.and.push(parse_conditional(raw)?);
    }
    let selection = (!args.select.is_empty()).then_some(args.select.as_slice());

    let mut engine = Engine::new(config);
    let mut sink = MemorySink::default();
    let mut scored = engine.recommend(&dataset, selection, &conditionals, &mut sink)?;
    if args.top > 0 && scored.len() > args.top {
        scored.truncate(args.top);
    }
    println!("{}", serde_json::to_string_pretty(&scored)?);
    Ok(())
}

pub fn handle_relate(args: &RelateArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(threshold) = args.threshold {
        config.relationship_threshold = threshold;
    }
    config.validate()?;

    let mut engine = Engine::new(config);
    let mut sink = MemorySink::default();
    for input in &args.inputs {
        let dataset = load_dataset(input, args.delimiter, args.input_encoding.as_deref())?;
        engine.ingest(&dataset, &mut sink)?;
    }
    let relationships = engine.relate(&mut sink)?;

    let headers = vec![
        "source".to_string(),
        "target".to_string(),
        "distance".to_string(),
        "cardinality".to_string(),
    ];
    let rows: Vec<Vec<String>> = relationships
        .iter()
        .map(|r| {
            vec![
                format!("{}.{}", r.source_dataset, r.source_field),
                format!("{}.{}", r.target_dataset, r.target_field),
                format!("{:.3}", r.distance),
                r.cardinality.as_str().to_string(),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
    info!("emitted {} relationship(s)", relationships.len());
    Ok(())
}
