//! Read-only retrieval over a persisted database
//!
//! Queries are built fluently and executed as a polars lazy scan of one
//! table:
//!
//! ```no_run
//! use polars::prelude::*;
//! use sh95_processor::{DataKind, TableQuery};
//!
//! let df = TableQuery::new("databases/db")
//!     .from(DataKind::Emissivity)
//!     .select(["wave", "n_u", "n_l", "val"])
//!     .filter(col("z").eq(lit(1)))
//!     .order_by("wave", false)
//!     .limit(10)
//!     .collect()?;
//! # Ok::<(), sh95_processor::Sh95Error>(())
//! ```

use crate::constants::{TABLE_COLUMNS, TABLE_EXTENSION};
use crate::error::{Result, Sh95Error};
use crate::models::DataKind;

use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::debug;

/// Fluent query over one table of a database
#[derive(Debug, Clone)]
pub struct TableQuery {
    database_path: PathBuf,
    kind: Option<DataKind>,
    columns: Vec<String>,
    filters: Vec<Expr>,
    order: Vec<(String, bool)>,
    limit: Option<u32>,
}

impl TableQuery {
    pub fn new(database_path: impl AsRef<Path>) -> Self {
        Self {
            database_path: database_path.as_ref().to_path_buf(),
            kind: None,
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Start a query on the table of one data kind
    pub fn from(&self, kind: DataKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::new(&self.database_path)
        }
    }

    /// Restrict the returned columns; all columns when never called
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Keep rows matching `predicate`; repeated filters are combined with AND
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Sort by a column; later calls break ties of earlier ones
    pub fn order_by(mut self, column: impl Into<String>, descending: bool) -> Self {
        self.order.push((column.into(), descending));
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    fn table_path(&self, kind: DataKind) -> PathBuf {
        self.database_path
            .join(format!("{}.{}", kind.table_name(), TABLE_EXTENSION))
    }

    fn check_column(name: &str) -> Result<()> {
        if TABLE_COLUMNS.contains(&name) {
            Ok(())
        } else {
            Err(Sh95Error::configuration(format!(
                "unknown column '{}', expected one of {}",
                name,
                TABLE_COLUMNS.join(", ")
            )))
        }
    }

    /// Lazy plan for this query, validated against the table layout
    pub fn lazy(&self) -> Result<LazyFrame> {
        let kind = self
            .kind
            .ok_or_else(|| Sh95Error::configuration("query has no table, call from() first"))?;
        for name in self.columns.iter().chain(self.order.iter().map(|(c, _)| c)) {
            Self::check_column(name)?;
        }
        if self.limit == Some(0) {
            return Err(Sh95Error::configuration("limit must be at least 1"));
        }

        let path = self.table_path(kind);
        if !path.exists() {
            return Err(Sh95Error::configuration(format!(
                "no {} table at {}",
                kind,
                path.display()
            )));
        }

        let mut frame = LazyFrame::scan_parquet(&path, Default::default())?;
        if let Some(predicate) = self
            .filters
            .iter()
            .cloned()
            .reduce(|acc, next| acc.and(next))
        {
            frame = frame.filter(predicate);
        }
        if !self.order.is_empty() {
            let exprs: Vec<Expr> = self.order.iter().map(|(c, _)| col(c.as_str())).collect();
            let descending: Vec<bool> = self.order.iter().map(|(_, d)| *d).collect();
            frame = frame.sort_by_exprs(
                exprs,
                SortMultipleOptions::default()
                    .with_order_descending_multi(descending)
                    .with_maintain_order(true),
            );
        }
        if !self.columns.is_empty() {
            let exprs: Vec<Expr> = self.columns.iter().map(|c| col(c.as_str())).collect();
            frame = frame.select(exprs);
        }
        if let Some(n) = self.limit {
            frame = frame.limit(n.into());
        }
        Ok(frame)
    }

    /// Execute the query
    pub fn collect(&self) -> Result<DataFrame> {
        let df = self.lazy()?.collect()?;
        debug!("Query returned {} rows", df.height());
        Ok(df)
    }

    /// Execute the query from async code
    ///
    /// Parquet scans block on a runtime owned by polars, which panics on an
    /// executor thread, so the scan runs on the blocking pool.
    pub async fn collect_async(&self) -> Result<DataFrame> {
        let query = self.clone();
        task::spawn_blocking(move || query.collect())
            .await
            .map_err(|e| Sh95Error::ProcessingFailed {
                path: self.database_path.clone(),
                reason: format!("Query task failed: {}", e),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use crate::models::{FlatRow, RecombinationCase};
    use crate::processor::writer::DatabaseWriter;
    use crate::table::{IngestedTables, TableBuilder};
    use tempfile::TempDir;

    fn populated_database(temp_dir: &TempDir) -> PathBuf {
        let config = IngestConfig::default()
            .with_database_dir(temp_dir.path())
            .with_database_name("query_db");
        let writer = DatabaseWriter::new(config.clone());

        let mut builder = TableBuilder::new(DataKind::OpacityFactor);
        for z in 1..=2 {
            for n_u in 2..=4 {
                for n_l in 1..n_u {
                    builder.append(FlatRow {
                        wave: None,
                        rec_case: RecombinationCase::A,
                        z,
                        n_u,
                        n_l,
                        temp: 1e4,
                        dens: 1e2,
                        val: f64::from(z * 100 + n_u * 10 + n_l),
                    });
                }
            }
        }
        let mut tables = IngestedTables::new();
        tables.insert(DataKind::OpacityFactor, builder.finalize());
        writer.append(&tables).unwrap();

        config.database_path()
    }

    #[test]
    fn test_select_all() {
        let temp_dir = TempDir::new().unwrap();
        let query = TableQuery::new(populated_database(&temp_dir));

        let df = query.from(DataKind::OpacityFactor).collect().unwrap();
        assert_eq!(df.height(), 12);
        assert_eq!(df.width(), 8);
    }

    #[test]
    fn test_filter_order_limit() {
        let temp_dir = TempDir::new().unwrap();
        let query = TableQuery::new(populated_database(&temp_dir));

        let df = query
            .from(DataKind::OpacityFactor)
            .select(["n_u", "n_l", "val"])
            .filter(col("z").eq(lit(2i64)))
            .filter(col("n_u").gt_eq(lit(3i64)))
            .order_by("val", true)
            .limit(2)
            .collect()
            .unwrap();

        assert_eq!(df.width(), 3);
        assert_eq!(df.height(), 2);
        let values: Vec<f64> = df
            .column("val")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(values, vec![243.0, 242.0]);
    }

    #[tokio::test]
    async fn test_collect_from_async_context() {
        let temp_dir = TempDir::new().unwrap();
        let query = TableQuery::new(populated_database(&temp_dir))
            .from(DataKind::OpacityFactor)
            .filter(col("z").eq(lit(1i64)));

        let df = query.collect_async().await.unwrap();
        assert_eq!(df.height(), 6);

        let invalid = query.select(["nope"]).collect_async().await;
        assert!(matches!(invalid, Err(Sh95Error::Configuration { .. })));
    }

    #[test]
    fn test_empty_table() {
        let temp_dir = TempDir::new().unwrap();
        let query = TableQuery::new(populated_database(&temp_dir));

        let df = query.from(DataKind::Emissivity).collect().unwrap();
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn test_invalid_queries() {
        let temp_dir = TempDir::new().unwrap();
        let query = TableQuery::new(populated_database(&temp_dir));

        assert!(matches!(
            query.collect(),
            Err(Sh95Error::Configuration { .. })
        ));
        assert!(matches!(
            query.from(DataKind::OpacityFactor).select(["nope"]).collect(),
            Err(Sh95Error::Configuration { .. })
        ));
        assert!(matches!(
            query.from(DataKind::OpacityFactor).order_by("nope", false).collect(),
            Err(Sh95Error::Configuration { .. })
        ));
        assert!(matches!(
            query.from(DataKind::OpacityFactor).limit(0).collect(),
            Err(Sh95Error::Configuration { .. })
        ));

        let missing = TableQuery::new(temp_dir.path().join("absent"));
        assert!(matches!(
            missing.from(DataKind::OpacityFactor).collect(),
            Err(Sh95Error::Configuration { .. })
        ));
    }
}
