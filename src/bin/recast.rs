//! recast: Rebuild nested JSON objects from flat query rows
//!
//! Usage:
//!   # Read a JSON array of rows from a file, pretty-print the objects
//!   recast rows.json
//!
//!   # Read newline-delimited rows from stdin, one object per output line
//!   psql-export | recast --ndjson --lines
//!
//!   # Compose only the first row
//!   recast --single row.json

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use recast::{MapConfig, NodeWriter, ObjectComposer, OutputFormat, Row};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "recast")]
#[command(about = "Rebuild nested JSON objects from flat query rows", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one row object per line)
    #[arg(long)]
    ndjson: bool,

    /// Compose only the first row into a single object
    #[arg(long)]
    single: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,

    /// Write one object per line
    #[arg(long, conflicts_with = "compact")]
    lines: bool,

    /// Leading character of identity columns (default: '@')
    #[arg(long)]
    identity_marker: Option<char>,

    /// Leading character of list and array columns (default: '#')
    #[arg(long)]
    collection_marker: Option<char>,

    /// Separator between group name and field name (default: '_')
    #[arg(long)]
    separator: Option<char>,
}

/// A whole document: an array of rows or one row
#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Many(Vec<Row>),
    One(Row),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build config
    let mut config = MapConfig::default();
    if let Some(marker) = args.identity_marker {
        config.identity_marker = marker;
    }
    if let Some(marker) = args.collection_marker {
        config.collection_marker = marker;
    }
    if let Some(sep) = args.separator {
        config.separator = sep;
    }

    let format = if args.lines {
        OutputFormat::Lines
    } else if args.compact {
        OutputFormat::Compact
    } else {
        OutputFormat::Pretty
    };

    let reader = if let Some(file_path) = &args.input {
        let file = File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?;
        Box::new(BufReader::new(file)) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let rows = read_rows(reader, args.ndjson)?;
    info!(rows = rows.len(), "read input rows");

    let composer = ObjectComposer::new(config);
    let mut writer = NodeWriter::new(std::io::stdout().lock(), format);

    if args.single {
        match rows.first() {
            Some(row) => writer.write_node(&composer.compose_one(row)?)?,
            None => warn!("no rows found in input"),
        }
    } else {
        if rows.is_empty() {
            warn!("no rows found in input");
        }
        let nodes = composer.compose_many(&rows)?;
        writer.write_nodes(&nodes)?;
    }

    writer.flush()
}

/// Read all rows using SIMD-accelerated JSON parsing
fn read_rows(reader: Box<dyn Read>, ndjson: bool) -> Result<Vec<Row>> {
    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader.read_to_end(&mut content).context("Failed to read input")?;

    if ndjson {
        let mut rows = Vec::new();
        for (number, line) in content.split(|&b| b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let mut line = line.to_vec();
            let row: Row = simd_json::serde::from_slice(&mut line)
                .with_context(|| format!("Failed to parse row on line {}", number + 1))?;
            rows.push(row);
        }
        return Ok(rows);
    }

    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let document: Document =
        simd_json::serde::from_slice(&mut content).context("Failed to parse JSON rows")?;
    Ok(match document {
        Document::Many(rows) => rows,
        Document::One(row) => vec![row],
    })
}
