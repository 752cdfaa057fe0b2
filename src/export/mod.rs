// src/export/mod.rs
pub mod columnar;
pub mod delimited;
pub mod merge;
pub mod records;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, instrument};

use crate::process::registry::TableSet;

/// Leading column of every exported table: the row kind (`Data`, `SubTotal`, `Total`, ...).
pub const ROW_KIND_COLUMN: &str = "Header";

/// On-disk encodings a table set can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// One delimited text file per table.
    Csv,
    /// One JSON array of records per table, plus a per-year snapshot.
    Json,
    /// One Parquet file per table.
    Parquet,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Parquet => "parquet",
        }
    }
}

/// Outcome of writing one year's tables.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    /// `(table id, error)` for every table file that could not be written.
    pub failed: Vec<(String, String)>,
    pub snapshot: Option<PathBuf>,
}

pub fn year_dir(out_root: &Path, year: &str) -> PathBuf {
    out_root.join(format!("ibkr_{}", year))
}

pub fn snapshot_path(out_root: &Path, year: &str) -> PathBuf {
    out_root.join(format!("ibkr_{}.json", year))
}

/// Write every table of `tables` under `out_root/ibkr_<year>/` in each of `formats`.
///
/// A table that fails to write is logged and recorded in the report; the
/// remaining tables are still written. Failing to create the year directory or
/// the snapshot is an error.
#[instrument(level = "info", skip(out_root, tables, formats), fields(year = %year))]
pub fn export_year(
    out_root: &Path,
    year: &str,
    tables: &TableSet,
    formats: &[Format],
) -> Result<ExportReport> {
    let dir = year_dir(out_root, year);
    fs::create_dir_all(&dir).with_context(|| format!("creating output directory {:?}", dir))?;

    let mut report = ExportReport::default();
    for entry in tables.iter() {
        for &format in formats {
            let path = dir.join(format!("{}.{}", entry.id, format.extension()));
            let result = match format {
                Format::Csv => delimited::write_table(&entry.table, &path),
                Format::Json => records::write_table(&entry.table, &path),
                Format::Parquet => columnar::write_table(&entry.table, &path),
            };
            match result {
                Ok(()) => report.written.push(path),
                Err(e) => {
                    error!(table = %entry.key, path = %path.display(), "failed to save table: {:#}", e);
                    report.failed.push((entry.id.clone(), format!("{:#}", e)));
                }
            }
        }
    }

    if formats.contains(&Format::Json) {
        let path = snapshot_path(out_root, year);
        records::write_snapshot(tables, &path)?;
        report.snapshot = Some(path);
    }

    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        "exported {} tables",
        tables.len()
    );
    Ok(report)
}
