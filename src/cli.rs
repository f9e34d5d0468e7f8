//! Command-line interface components.

use crate::config::{CompressionAlgorithm, IngestConfig, default_database_dir};
use crate::constants::{DEFAULT_DATABASE_NAME, DEFAULT_Z_BOUNDS};
use crate::models::{DataKind, RecombinationCase};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sh95")]
#[command(about = "Ingest Storey & Hummer (1995) recombination tables into queryable Parquet databases")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a directory of r*.d.gz files and append the rows to a database
    Ingest(IngestArgs),
    /// Create a database with empty tables
    Init(InitArgs),
    /// Delete a database
    Remove(DatabaseArgs),
    /// Print rows of one table
    Query(QueryArgs),
}

/// Location of a database
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Database name
    #[arg(short, long, default_value = DEFAULT_DATABASE_NAME)]
    pub name: String,

    /// Directory holding databases (defaults to the platform data directory)
    #[arg(long, value_name = "PATH")]
    pub database_dir: Option<PathBuf>,
}

impl DatabaseArgs {
    /// Configuration for the selected database
    pub fn to_config(&self) -> IngestConfig {
        IngestConfig::default()
            .with_database_dir(
                self.database_dir
                    .clone()
                    .unwrap_or_else(default_database_dir),
            )
            .with_database_name(&self.name)
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Clear an existing database first
    #[arg(long)]
    pub replace: bool,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Directory containing the gzipped data files
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Clear an existing database before writing
    #[arg(long)]
    pub replace: bool,

    /// Only ingest files of this recombination case (A or B)
    #[arg(long)]
    pub rec_case: Option<RecombinationCase>,

    /// Data kinds to extract (emi, rec, opa, dep); all when omitted
    #[arg(short, long, value_delimiter = ',')]
    pub kinds: Vec<DataKind>,

    /// Lowest nuclear charge to ingest
    #[arg(long, default_value_t = DEFAULT_Z_BOUNDS.0)]
    pub z_min: u32,

    /// Highest nuclear charge to ingest
    #[arg(long, default_value_t = DEFAULT_Z_BOUNDS.1)]
    pub z_max: u32,

    /// Maximum files parsed concurrently (defaults to the CPU count)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, default_value = "snappy")]
    pub compression: CompressionAlgorithm,
}

impl IngestArgs {
    pub fn to_config(&self) -> IngestConfig {
        let mut config = self
            .database
            .to_config()
            .with_z_bounds(self.z_min, self.z_max)
            .with_compression(self.compression);
        if self.replace {
            config = config.with_replace_existing();
        }
        if let Some(rec_case) = self.rec_case {
            config = config.with_rec_case(rec_case);
        }
        if !self.kinds.is_empty() {
            config = config.with_data_kinds(self.kinds.iter().copied());
        }
        if let Some(jobs) = self.jobs {
            config = config.with_max_concurrent_files(jobs);
        }
        config
    }
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Table to read (emi, rec, opa, dep)
    #[arg(value_name = "KIND")]
    pub kind: DataKind,

    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Columns to print; all when omitted
    #[arg(short, long, value_delimiter = ',')]
    pub columns: Vec<String>,

    #[arg(long)]
    pub rec_case: Option<RecombinationCase>,

    #[arg(short, long)]
    pub z: Option<u32>,

    #[arg(long)]
    pub n_u: Option<u32>,

    #[arg(long)]
    pub n_l: Option<u32>,

    /// Column to sort by
    #[arg(long)]
    pub order_by: Option<String>,

    /// Sort in descending order
    #[arg(long, requires = "order_by")]
    pub descending: bool,

    /// Maximum rows returned
    #[arg(short, long, default_value_t = 20)]
    pub limit: u32,
}
