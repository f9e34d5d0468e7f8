//! Record flattening and per-kind table assembly.
//!
//! Every (lower level, value) pair of a data block becomes one [`FlatRow`].
//! Rows of one data kind are accumulated in a [`TableBuilder`] and sorted by
//! `(rec_case, z, n_l, n_u)` when the builder is finalised.

use crate::error::Result;
use crate::models::{DataBlock, DataKind, FlatRow, PhysicalState};
use crate::physics::wavelength;
use polars::prelude::*;
use std::collections::BTreeMap;

impl DataBlock {
    /// Expand this block into one row per lower level
    pub fn flatten(&self) -> Result<Vec<FlatRow>> {
        self.pairs()
            .map(|(n_l, val)| {
                let wave = if self.data_kind.has_wavelength() {
                    Some(wavelength(n_l, self.upper_level, self.charge)?)
                } else {
                    None
                };
                Ok(FlatRow {
                    wave,
                    rec_case: self.rec_case,
                    z: self.charge,
                    n_u: self.upper_level,
                    n_l,
                    temp: self.temperature,
                    dens: self.density,
                    val,
                })
            })
            .collect()
    }
}

impl PhysicalState {
    /// Expand every block of this state, in block order
    pub fn flatten(&self) -> Result<Vec<FlatRow>> {
        let mut rows = Vec::with_capacity(self.value_count());
        for block in &self.data_blocks {
            rows.extend(block.flatten()?);
        }
        Ok(rows)
    }
}

/// Accumulates the rows of one data kind across files
#[derive(Debug, Clone)]
pub struct TableBuilder {
    kind: DataKind,
    rows: Vec<FlatRow>,
}

impl TableBuilder {
    pub fn new(kind: DataKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn append(&mut self, row: FlatRow) {
        self.rows.push(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = FlatRow>) {
        self.rows.extend(rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sort by `(rec_case, z, n_l, n_u)` and freeze the table
    pub fn finalize(mut self) -> DataTable {
        self.rows
            .sort_by_key(|row| (row.rec_case, row.z, row.n_l, row.n_u));
        DataTable {
            kind: self.kind,
            rows: self.rows,
        }
    }
}

/// Sorted rows of one data kind, ready for persistence
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    kind: DataKind,
    rows: Vec<FlatRow>,
}

impl DataTable {
    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Columnar form with the persisted column layout
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let df = DataFrame::new(vec![
            Column::new("wave".into(), rows.iter().map(|r| r.wave).collect::<Vec<_>>()),
            Column::new(
                "rec_case".into(),
                rows.iter()
                    .map(|r| r.rec_case.letter().to_string())
                    .collect::<Vec<_>>(),
            ),
            Column::new("z".into(), rows.iter().map(|r| i64::from(r.z)).collect::<Vec<_>>()),
            Column::new("n_u".into(), rows.iter().map(|r| i64::from(r.n_u)).collect::<Vec<_>>()),
            Column::new("n_l".into(), rows.iter().map(|r| i64::from(r.n_l)).collect::<Vec<_>>()),
            Column::new("temp".into(), rows.iter().map(|r| r.temp).collect::<Vec<_>>()),
            Column::new("dens".into(), rows.iter().map(|r| r.dens).collect::<Vec<_>>()),
            Column::new("val".into(), rows.iter().map(|r| r.val).collect::<Vec<_>>()),
        ])?;
        Ok(df)
    }
}

/// Finalised tables of one ingestion run, keyed by data kind
pub type IngestedTables = BTreeMap<DataKind, DataTable>;
