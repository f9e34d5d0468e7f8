//! Persistence of ingested tables
//!
//! A database is a directory holding one Parquet table per data kind
//! (`emi`, `rec`, `opa`, `dep`). Appending reads the existing table, stacks
//! the new rows underneath and rewrites the file. Writes are append-only and
//! there is no rollback across tables.

use crate::config::IngestConfig;
use crate::constants::TABLE_EXTENSION;
use crate::error::{Result, Sh95Error};
use crate::models::DataKind;
use crate::table::{IngestedTables, TableBuilder};

use polars::prelude::{
    DataFrame, ParquetReader, ParquetWriter as PolarsParquetWriter, SerReader, StatisticsOptions,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Writer for one named database
#[derive(Debug, Clone)]
pub struct DatabaseWriter {
    database_path: PathBuf,
    config: IngestConfig,
}

impl DatabaseWriter {
    pub fn new(config: IngestConfig) -> Self {
        Self {
            database_path: config.database_path(),
            config,
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Location of the table holding one data kind
    pub fn table_path(&self, kind: DataKind) -> PathBuf {
        self.database_path
            .join(format!("{}.{}", kind.table_name(), TABLE_EXTENSION))
    }

    pub fn exists(&self) -> bool {
        self.database_path.is_dir()
    }

    /// Create the database directory and any missing empty tables
    ///
    /// With `replace` an existing database is removed first.
    pub fn initialise(&self, replace: bool) -> Result<()> {
        self.config.check_database_name()?;
        if replace && self.exists() {
            info!("Replacing database at {}", self.database_path.display());
            self.remove()?;
        }
        fs::create_dir_all(&self.database_path)?;

        for kind in DataKind::ALL {
            let path = self.table_path(kind);
            if !path.exists() {
                let mut empty = TableBuilder::new(kind).finalize().to_dataframe()?;
                self.write_table(&path, &mut empty)?;
                debug!("Created empty table {}", path.display());
            }
        }
        Ok(())
    }

    /// Append every table to its persisted counterpart, returning rows written
    pub fn append(&self, tables: &IngestedTables) -> Result<usize> {
        self.config.check_database_name()?;
        if !self.exists() {
            self.initialise(false)?;
        }

        let mut written = 0;
        for (kind, table) in tables {
            if table.is_empty() {
                continue;
            }
            let path = self.table_path(*kind);
            let new_rows = table.to_dataframe()?;
            let mut combined = if path.exists() {
                let mut existing = self.read_table(&path)?;
                existing.vstack_mut(&new_rows)?;
                existing
            } else {
                new_rows
            };
            self.write_table(&path, &mut combined)?;

            debug!(
                "Appended {} rows to {} ({} total)",
                table.len(),
                path.display(),
                combined.height()
            );
            written += table.len();
        }
        Ok(written)
    }

    /// Delete the database directory
    pub fn remove(&self) -> Result<()> {
        self.config.check_database_name()?;
        if !self.exists() {
            warn!("No database at {}", self.database_path.display());
            return Err(Sh95Error::DatasetNotFound {
                path: self.database_path.clone(),
            });
        }
        fs::remove_dir_all(&self.database_path)?;
        info!("Removed database {}", self.database_path.display());
        Ok(())
    }

    fn read_table(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;
        Ok(ParquetReader::new(file).finish()?)
    }

    fn write_table(&self, path: &Path, df: &mut DataFrame) -> Result<()> {
        let file = File::create(path)?;
        PolarsParquetWriter::new(file)
            .with_compression(self.config.compression.to_polars_compression())
            .with_statistics(StatisticsOptions::full())
            .finish(df)
            .map_err(|e| Sh95Error::ProcessingFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write table: {}", e),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlatRow, RecombinationCase};
    use tempfile::TempDir;

    fn create_test_writer(temp_dir: &TempDir) -> DatabaseWriter {
        let config = IngestConfig::default()
            .with_database_dir(temp_dir.path())
            .with_database_name("test_db");
        DatabaseWriter::new(config)
    }

    fn tables_with_rows(count: u32) -> IngestedTables {
        let mut builder = TableBuilder::new(DataKind::RecombinationCoefficient);
        for n_l in 1..=count {
            builder.append(FlatRow {
                wave: None,
                rec_case: RecombinationCase::B,
                z: 1,
                n_u: count + 1,
                n_l,
                temp: 1e4,
                dens: 1e2,
                val: f64::from(n_l) * 1e-13,
            });
        }
        let mut tables = IngestedTables::new();
        tables.insert(DataKind::RecombinationCoefficient, builder.finalize());
        tables.insert(
            DataKind::Emissivity,
            TableBuilder::new(DataKind::Emissivity).finalize(),
        );
        tables
    }

    #[test]
    fn test_initialise_creates_empty_tables() {
        let temp_dir = TempDir::new().unwrap();
        let writer = create_test_writer(&temp_dir);

        writer.initialise(false).unwrap();

        for kind in DataKind::ALL {
            let df = writer.read_table(&writer.table_path(kind)).unwrap();
            assert_eq!(df.height(), 0);
            assert_eq!(df.width(), 8);
        }
        assert!(writer.table_path(DataKind::Emissivity).ends_with("test_db/emi.parquet"));
    }

    #[test]
    fn test_append_accumulates_rows() {
        let temp_dir = TempDir::new().unwrap();
        let writer = create_test_writer(&temp_dir);

        assert_eq!(writer.append(&tables_with_rows(3)).unwrap(), 3);
        assert_eq!(writer.append(&tables_with_rows(2)).unwrap(), 2);

        let rec = writer
            .read_table(&writer.table_path(DataKind::RecombinationCoefficient))
            .unwrap();
        assert_eq!(rec.height(), 5);

        let emi = writer.read_table(&writer.table_path(DataKind::Emissivity)).unwrap();
        assert_eq!(emi.height(), 0);
    }

    #[test]
    fn test_initialise_replace_clears_rows() {
        let temp_dir = TempDir::new().unwrap();
        let writer = create_test_writer(&temp_dir);
        writer.append(&tables_with_rows(3)).unwrap();

        writer.initialise(false).unwrap();
        let kept = writer
            .read_table(&writer.table_path(DataKind::RecombinationCoefficient))
            .unwrap();
        assert_eq!(kept.height(), 3);

        writer.initialise(true).unwrap();
        let cleared = writer
            .read_table(&writer.table_path(DataKind::RecombinationCoefficient))
            .unwrap();
        assert_eq!(cleared.height(), 0);
    }

    #[test]
    fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let writer = create_test_writer(&temp_dir);

        assert!(matches!(writer.remove(), Err(Sh95Error::DatasetNotFound { .. })));

        writer.initialise(false).unwrap();
        assert!(writer.exists());
        writer.remove().unwrap();
        assert!(!writer.exists());
    }

    #[test]
    fn test_names_outside_database_dir_are_refused() {
        let temp_dir = TempDir::new().unwrap();
        let database_dir = temp_dir.path().join("precious").join("dbs");
        fs::create_dir_all(database_dir.join("other_db")).unwrap();
        let keep = temp_dir.path().join("precious").join("keep.txt");
        fs::write(&keep, "keep").unwrap();

        for name in ["..", "", "."] {
            let writer = DatabaseWriter::new(
                IngestConfig::default()
                    .with_database_dir(&database_dir)
                    .with_database_name(name),
            );
            assert!(matches!(writer.remove(), Err(Sh95Error::Configuration { .. })));
            assert!(matches!(
                writer.initialise(true),
                Err(Sh95Error::Configuration { .. })
            ));
            assert!(matches!(
                writer.append(&tables_with_rows(1)),
                Err(Sh95Error::Configuration { .. })
            ));
        }

        assert!(keep.exists());
        assert!(database_dir.join("other_db").is_dir());
        assert!(!database_dir.join("rec.parquet").exists());
    }
}
