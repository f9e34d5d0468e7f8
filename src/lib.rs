//! Storey & Hummer (1995) recombination data ingester
//!
//! Parses the gzipped fixed-width tables of hydrogenic recombination data
//! (emissivities, recombination coefficients, opacity factors and departure
//! coefficients) into flat, sorted per-kind tables and persists them as
//! Parquet databases that can be queried with polars.
//!
//! The library provides:
//! - A numeric decoder for the dataset's compact exponent notation
//! - Data block and physical state parsers over the raw lines of a file
//! - A record flattener adding transition wavelengths to emissivities
//! - Concurrent batch ingestion of a directory of data files
//! - Parquet persistence and a fluent query API

pub mod block;
pub mod cli;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod header;
pub mod models;
pub mod physics;
pub mod processor;
pub mod query;
pub mod state;
pub mod table;

pub use config::{CompressionAlgorithm, IngestConfig};
pub use decoder::{decode_float, decode_int};
pub use error::{Result, Sh95Error};
pub use models::{
    DataBlock, DataKind, FlatRow, PhysicalState, ProcessingStats, RecombinationCase, ValueIndex,
};
pub use physics::wavelength;
pub use processor::DatasetProcessor;
pub use processor::discovery::{FileDiscovery, FileFilter, is_valid_data_file, is_valid_file_name};
pub use processor::pipeline::{ingest_directory, ingest_file};
pub use processor::writer::DatabaseWriter;
pub use query::TableQuery;
pub use table::{DataTable, IngestedTables, TableBuilder};
