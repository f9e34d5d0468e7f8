//! Per-file ingestion and batch merging
//!
//! Each file is decompressed once and scanned once per requested data kind.
//! Files are parsed concurrently on the blocking pool, but results are merged
//! in discovery order so every table sees rows in a deterministic sequence
//! before its final sort. The first failing file aborts the batch.

use crate::error::{Result, Sh95Error};
use crate::models::{DataKind, FlatRow, PhysicalState};
use crate::processor::discovery::{FileDiscovery, FileFilter, read_gz_lines};
use crate::table::{IngestedTables, TableBuilder};

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error, info, warn};

/// Flattened rows of one file, keyed by data kind
pub type FileTables = BTreeMap<DataKind, Vec<FlatRow>>;

/// Parse every requested kind from the lines of one file
pub fn ingest_lines(lines: &[String], kinds: &[DataKind]) -> Result<FileTables> {
    let mut tables = FileTables::new();
    for &kind in kinds {
        let state = PhysicalState::from_lines(lines, kind)?;
        if state.dropped_trailing_group {
            warn!("Unterminated trailing {} block was not ingested", kind);
        }
        tables.insert(kind, state.flatten()?);
    }
    Ok(tables)
}

/// Decompress and parse one data file
pub fn ingest_file(path: &Path, kinds: &[DataKind]) -> Result<FileTables> {
    debug!("Ingesting file: {}", path.display());
    let lines = read_gz_lines(path).map_err(|e| e.in_file(path))?;
    ingest_lines(&lines, kinds).map_err(|e| e.in_file(path))
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Ingest an explicit list of files, merging rows per kind in list order
pub async fn ingest_files(
    files: &[PathBuf],
    kinds: &[DataKind],
    max_concurrent: usize,
) -> Result<IngestedTables> {
    let mut builders: BTreeMap<DataKind, TableBuilder> = kinds
        .iter()
        .map(|&kind| (kind, TableBuilder::new(kind)))
        .collect();

    let pb = progress_bar(files.len());
    pb.set_message("Parsing files");

    let shared_kinds: Arc<[DataKind]> = kinds.into();
    let mut results = stream::iter(files.iter().cloned())
        .map(|path| {
            let kinds = Arc::clone(&shared_kinds);
            async move {
                let task_path = path.clone();
                task::spawn_blocking(move || ingest_file(&task_path, &kinds))
                    .await
                    .map_err(|e| Sh95Error::ProcessingFailed {
                        path: path.clone(),
                        reason: format!("Parsing task failed: {}", e),
                    })?
            }
        })
        .buffered(max_concurrent.max(1));

    while let Some(result) = results.next().await {
        let tables = match result {
            Ok(tables) => tables,
            Err(e) => {
                pb.abandon_with_message("Ingestion aborted");
                error!("{}", e);
                return Err(e);
            }
        };
        for (kind, rows) in tables {
            if let Some(builder) = builders.get_mut(&kind) {
                builder.extend(rows);
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("All data files parsed");

    let tables: IngestedTables = builders
        .into_iter()
        .map(|(kind, builder)| (kind, builder.finalize()))
        .collect();
    for (kind, table) in &tables {
        info!("{} table: {} rows", kind, table.len());
    }
    Ok(tables)
}

/// Select, parse and merge every data file in a directory
pub async fn ingest_directory(
    data_dir: &Path,
    filter: &FileFilter,
    kinds: &[DataKind],
    max_concurrent: usize,
) -> Result<IngestedTables> {
    let files = FileDiscovery::new(data_dir.to_path_buf(), *filter).discover()?;
    info!(
        "Selected {} data files from {}",
        files.len(),
        data_dir.display()
    );
    ingest_files(&files, kinds, max_concurrent).await
}
