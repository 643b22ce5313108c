//! ingot-build: turn nested JSON records into a bulk indexing payload
//!
//! Usage:
//!   # Read a JSON array (or a single object) from a file
//!   ingot-build --config pipeline.json records.json > bulk.ndjson
//!
//!   # Stream newline-delimited JSON from stdin
//!   cat events.jsonl | ingot-build --config pipeline.json --ndjson
//!
//!   # Log and skip records that fail validation
//!   ingot-build --config pipeline.json --ndjson --skip-errors events.jsonl

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

use anyhow::{Context, Result};
use clap::Parser;
use ingot::{ingest_ndjson, BuildContext, BulkWriter, DateParsing, DocumentBuilder, IngestStats, PipelineConfig};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ingot-build")]
#[command(about = "Build single-line index documents from nested JSON", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Pipeline configuration (JSON)
    #[arg(long, short = 'c')]
    config: String,

    /// Process newline-delimited JSON (one record per line)
    #[arg(long)]
    ndjson: bool,

    /// Log and skip records that fail to build instead of aborting
    #[arg(long)]
    skip_errors: bool,

    /// Emit document lines only, without bulk action lines
    #[arg(long)]
    no_action_lines: bool,

    /// Also read all-digit date values as Unix epoch offsets
    #[arg(long)]
    epoch_dates: bool,

    /// Parse whole-input documents with simd-json (numbers are read as f64)
    #[arg(long)]
    simd: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = PipelineConfig::from_path(&args.config)
        .with_context(|| format!("Failed to load config: {}", args.config))?;
    if args.epoch_dates {
        config.date_parsing = DateParsing::TextOrEpoch;
    }
    let builder = config.builder().context("Invalid pipeline configuration")?;

    let stdout = std::io::stdout();
    let mut writer = BulkWriter::new(BufWriter::new(stdout.lock()), config.index.name());
    if args.no_action_lines {
        writer = writer.without_action_lines();
    }

    let reader: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(File::open(path).with_context(|| format!("Failed to open input: {path}"))?),
        None => Box::new(std::io::stdin()),
    };

    let stats = if args.ndjson {
        ingest_ndjson(BufReader::new(reader), &builder, &mut writer, args.skip_errors)?
    } else {
        process_document(reader, &builder, &mut writer, args.skip_errors, args.simd)?
    };

    info!(built = stats.built, skipped = stats.skipped, "ingest complete");
    Ok(())
}

/// Process a JSON array of records, or a single record
fn process_document<W: Write>(
    reader: Box<dyn Read>,
    builder: &DocumentBuilder,
    writer: &mut BulkWriter<W>,
    skip_errors: bool,
    simd: bool,
) -> Result<IngestStats> {
    let mut content = Vec::new();
    BufReader::new(reader)
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    // Both paths deserialize through serde so object members keep document order.
    // Only serde_json keeps the source digits of numbers.
    let parsed: std::result::Result<Value, String> = if simd {
        simd_json::serde::from_slice(&mut content).map_err(|e| e.to_string())
    } else {
        serde_json::from_slice(&content).map_err(|e| e.to_string())
    };
    let parsed = match parsed {
        Ok(value) => value,
        Err(e) => anyhow::bail!("Input is not a JSON document (use --ndjson for line-delimited input): {e}"),
    };
    let records = match parsed {
        Value::Array(items) => items,
        single => vec![single],
    };

    let mut ctx = BuildContext::new();
    let mut stats = IngestStats::default();

    for (position, record) in records.iter().enumerate() {
        match builder.build_tree(&mut ctx, record) {
            Ok(built) => {
                writer.write_document(&built)?;
                stats.built += 1;
            }
            Err(err) if skip_errors && !err.is_configuration() => {
                warn!(record = position, error = %err, "skipping document");
                stats.skipped += 1;
            }
            Err(err) => return Err(err).with_context(|| format!("Failed to build record {position}")),
        }
    }

    writer.flush()?;
    Ok(stats)
}
