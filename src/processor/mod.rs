//! Ingestion engine.
//!
//! Orchestrates the complete workflow: data file selection, concurrent
//! per-file parsing into per-kind tables, and persistence into a named
//! database.

pub mod discovery;
pub mod pipeline;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{discovery::FileDiscovery, pipeline::ingest_files, writer::DatabaseWriter};

use crate::config::IngestConfig;
use crate::error::{Result, Sh95Error};
use crate::models::ProcessingStats;
use crate::table::IngestedTables;

use colored::*;
use std::path::PathBuf;
use std::time::Instant;

/// Main processor turning a directory of data files into a database
#[derive(Debug)]
pub struct DatasetProcessor {
    data_dir: PathBuf,
    config: IngestConfig,
    file_discovery: FileDiscovery,
    writer: DatabaseWriter,
}

impl DatasetProcessor {
    /// Create a processor for a data directory
    pub fn new(data_dir: PathBuf, config: IngestConfig) -> Result<Self> {
        if !data_dir.is_dir() {
            return Err(Sh95Error::DatasetNotFound { path: data_dir });
        }
        config.validate()?;

        Ok(Self {
            file_discovery: FileDiscovery::new(data_dir.clone(), config.file_filter()),
            writer: DatabaseWriter::new(config.clone()),
            data_dir,
            config,
        })
    }

    /// Reconfigure the processor
    pub fn with_config(self, config: IngestConfig) -> Result<Self> {
        Self::new(self.data_dir, config)
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn writer(&self) -> &DatabaseWriter {
        &self.writer
    }

    /// Select and parse all data files without persisting anything
    pub async fn ingest(&self) -> Result<(usize, IngestedTables)> {
        let files = self.file_discovery.discover()?;
        let tables = ingest_files(
            &files,
            &self.config.data_kinds,
            self.config.max_concurrent_files.min(files.len().max(1)),
        )
        .await?;
        Ok((files.len(), tables))
    }

    /// Main processing entry point: ingest, then append to the database
    pub async fn process(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        println!("{}", "Starting recombination data ingestion".bright_green().bold());
        println!("  {} {}", "Data:".bright_cyan(), self.data_dir.display());
        println!(
            "  {} {}",
            "Database:".bright_cyan(),
            self.writer.database_path().display()
        );

        println!("\n{}", "Parsing data files...".bright_yellow());
        let (files_processed, tables) = self.ingest().await?;
        println!(
            "  {} {} data files",
            "Parsed".bright_green(),
            files_processed.to_string().bright_white().bold()
        );

        println!("\n{}", "Writing tables...".bright_yellow());
        self.writer.initialise(self.config.replace_existing)?;
        let rows_written = self.writer.append(&tables)?;

        let stats = ProcessingStats {
            files_processed,
            rows_per_kind: tables
                .iter()
                .map(|(kind, table)| (*kind, table.len()))
                .collect(),
            rows_written,
            output_path: self.writer.database_path().to_path_buf(),
            processing_time_ms: start_time.elapsed().as_millis(),
        };

        println!("\n{}", "Ingestion Summary".bright_green().bold());
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            stats.processing_time_ms.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Files processed:".bright_cyan(),
            stats.files_processed.to_string().bright_white()
        );
        for (kind, rows) in &stats.rows_per_kind {
            println!(
                "  {} {}",
                format!("{} rows:", kind).bright_cyan(),
                rows.to_string().bright_white()
            );
        }
        println!(
            "  {} {}",
            "Total rows:".bright_cyan(),
            stats.rows_written.to_string().bright_white().bold()
        );

        Ok(stats)
    }
}
