// src/export/merge.rs
use anyhow::{bail, Context, Result};
use std::{
    collections::BTreeMap,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

use crate::export::{records::read_snapshot, snapshot_path, Format};
use crate::process::registry::TableSet;

/// Table sets nested by year, oldest first.
pub type MergedTables = BTreeMap<String, TableSet>;

pub fn merged_path(out_root: &Path, first: &str, last: &str) -> PathBuf {
    out_root.join(format!("ibkr_{}_{}.json", first, last))
}

/// Read back the per-year snapshots of `years` and write them as one
/// `ibkr_<first>_<last>.json` document keyed by year.
#[instrument(level = "info", skip(out_root))]
pub fn merge_years(out_root: &Path, years: &[String]) -> Result<MergedTables> {
    let mut merged = MergedTables::new();
    for year in years {
        let tables = read_snapshot(&snapshot_path(out_root, year))
            .with_context(|| format!("loading tables for {}", year))?;
        merged.insert(year.clone(), tables);
    }

    let (Some(first), Some(last)) = (merged.keys().next(), merged.keys().next_back()) else {
        bail!("no years to merge");
    };
    let path = merged_path(out_root, first, last);
    let file = File::create(&path).with_context(|| format!("creating {:?}", path))?;
    serde_json::to_writer(BufWriter::new(file), &merged)
        .with_context(|| format!("writing merged tables to {:?}", path))?;

    info!(years = merged.len(), path = %path.display(), "merged yearly tables");
    Ok(merged)
}

/// Merge after an export run. Snapshots exist only when `formats` includes
/// JSON; without it nothing is merged and `None` is returned.
pub fn merge_exported(
    out_root: &Path,
    formats: &[Format],
    years: &[String],
) -> Result<Option<MergedTables>> {
    if !formats.contains(&Format::Json) {
        warn!(?formats, "merge skipped: yearly snapshots are only written with the json format");
        return Ok(None);
    }
    if years.is_empty() {
        info!("no yearly snapshots to merge");
        return Ok(None);
    }
    merge_years(out_root, years).map(Some)
}
