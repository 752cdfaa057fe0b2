// src/discover.rs
use anyhow::{Context, Result};
use glob::glob;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("static regex"));

/// All `*.csv` files directly under `root`, sorted by path.
pub fn list_input_files(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = root.join("*.csv");
    let pattern = pattern.to_string_lossy();
    let mut files: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("Invalid glob pattern: {}", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    debug!(root = %root.display(), count = files.len(), "listed input files");
    Ok(files)
}

/// The last run of four digits in `name`, scanning left to right without overlap.
/// `"U1234567_2023.csv"` → `"2023"`; `"activity.csv"` → `None`.
pub fn year_from_file_name(name: &str) -> Option<String> {
    YEAR_TOKEN
        .find_iter(name)
        .last()
        .map(|m| m.as_str().to_string())
}
