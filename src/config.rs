//! Configuration management and validation.
//!
//! Provides the configuration passed explicitly to ingestion and
//! persistence entry points: where databases live, which files and data
//! kinds are selected, concurrency, and Parquet compression.

use crate::constants::{DEFAULT_DATABASE_NAME, DEFAULT_Z_BOUNDS};
use crate::error::{Result, Sh95Error};
use crate::models::{DataKind, RecombinationCase};
use crate::processor::discovery::FileFilter;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Supported compression algorithms for persisted tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = Sh95Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "snappy" => Ok(CompressionAlgorithm::Snappy),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            "none" | "uncompressed" => Ok(CompressionAlgorithm::Uncompressed),
            other => Err(Sh95Error::configuration(format!(
                "unknown compression '{}', expected snappy, zstd, lz4 or none",
                other
            ))),
        }
    }
}

/// Configuration for ingestion and persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory holding all databases
    pub database_dir: PathBuf,

    /// Name of the database written to
    pub database_name: String,

    /// Only ingest files of this recombination case
    pub rec_case: Option<RecombinationCase>,

    /// Data kinds to extract from every file
    pub data_kinds: Vec<DataKind>,

    /// Inclusive bounds on the nuclear charge
    pub z_bounds: (u32, u32),

    /// Maximum files parsed concurrently
    pub max_concurrent_files: usize,

    /// Compression of persisted tables
    pub compression: CompressionAlgorithm,

    /// Clear an existing database before writing
    pub replace_existing: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_dir: default_database_dir(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            rec_case: None,
            data_kinds: DataKind::ALL.to_vec(),
            z_bounds: DEFAULT_Z_BOUNDS,
            max_concurrent_files: num_cpus::get().max(1),
            compression: CompressionAlgorithm::Snappy,
            replace_existing: false,
        }
    }
}

/// Platform data directory for databases, or `./databases` when unknown
pub fn default_database_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("sh95").join("databases"),
        None => {
            debug!("No platform data directory, using ./databases");
            PathBuf::from("databases")
        }
    }
}

impl IngestConfig {
    /// Store databases under a custom directory
    pub fn with_database_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.database_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Write to a named database
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Restrict ingestion to one recombination case
    pub fn with_rec_case(mut self, rec_case: RecombinationCase) -> Self {
        self.rec_case = Some(rec_case);
        self
    }

    /// Restrict the data kinds extracted
    pub fn with_data_kinds(mut self, kinds: impl IntoIterator<Item = DataKind>) -> Self {
        let mut kinds: Vec<DataKind> = kinds.into_iter().collect();
        kinds.sort();
        kinds.dedup();
        self.data_kinds = kinds;
        self
    }

    /// Restrict the charge range (inclusive)
    pub fn with_z_bounds(mut self, low: u32, high: u32) -> Self {
        self.z_bounds = (low, high);
        self
    }

    /// Set maximum concurrent files
    pub fn with_max_concurrent_files(mut self, max_files: usize) -> Self {
        self.max_concurrent_files = max_files;
        self
    }

    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Clear any existing database with the same name before writing
    pub fn with_replace_existing(mut self) -> Self {
        self.replace_existing = true;
        self
    }

    /// Path of the configured database
    pub fn database_path(&self) -> PathBuf {
        self.database_dir.join(&self.database_name)
    }

    /// File filter derived from the case and charge restrictions
    pub fn file_filter(&self) -> FileFilter {
        FileFilter {
            rec_case: self.rec_case,
            z_bounds: self.z_bounds,
        }
    }

    /// Reject configurations that can never ingest anything
    pub fn validate(&self) -> Result<()> {
        if self.data_kinds.is_empty() {
            return Err(Sh95Error::configuration("no data kinds selected"));
        }
        if self.z_bounds.0 > self.z_bounds.1 {
            return Err(Sh95Error::configuration(format!(
                "charge bounds ({}, {}) are inverted",
                self.z_bounds.0, self.z_bounds.1
            )));
        }
        if self.max_concurrent_files == 0 {
            return Err(Sh95Error::configuration(
                "max_concurrent_files must be at least 1",
            ));
        }
        self.check_database_name()
    }

    /// Ensure the database name is a single plain directory name
    ///
    /// The database path is removed wholesale on replace and remove, so it
    /// must stay directly under `database_dir`.
    pub fn check_database_name(&self) -> Result<()> {
        let name = self.database_name.as_str();
        let mut components = Path::new(name).components();
        let plain = match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => part == OsStr::new(name),
            _ => false,
        };
        if !plain || name.trim().is_empty() {
            return Err(Sh95Error::configuration(format!(
                "invalid database name '{}', expected a plain directory name",
                name
            )));
        }
        Ok(())
    }
}
