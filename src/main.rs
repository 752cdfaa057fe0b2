use anyhow::{Context, Result};
use clap::Parser;
use ibkr_tables::{
    config::Config,
    discover::{list_input_files, year_from_file_name},
    export::{export_year, merge::merge_exported, Format},
    load_activity_tables, TableSet,
};
use rayon::prelude::*;
use std::{collections::BTreeMap, fs, path::PathBuf, time::Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Split Interactive Brokers activity statements into typed tables.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Optional YAML file with `input_root`, `output_root` and `formats`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the `*.csv` activity exports
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory receiving `ibkr_<year>/` folders
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output formats; repeat or comma-separate
    #[arg(long = "format", value_enum, value_delimiter = ',')]
    formats: Vec<Format>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    // ─── 2) resolve configuration ────────────────────────────────────
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_yaml_file(path)?,
        None => Config::default(),
    }
    .with_overrides(args.input, args.output, args.formats);
    info!(
        input = %config.input_root.display(),
        output = %config.output_root.display(),
        formats = ?config.formats,
        "startup"
    );
    fs::create_dir_all(&config.output_root)
        .with_context(|| format!("creating output root {:?}", config.output_root))?;

    // ─── 3) discover statements and their years ──────────────────────
    let files: Vec<(String, PathBuf)> = list_input_files(&config.input_root)?
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().to_string();
            match year_from_file_name(&name) {
                Some(year) => Some((year, path)),
                None => {
                    warn!(file = %name, "no year in file name; skipped");
                    None
                }
            }
        })
        .collect();
    if files.is_empty() {
        info!("no statements found; exit");
        return Ok(());
    }
    info!("{} statements to process", files.len());

    // ─── 4) load every file in parallel ──────────────────────────────
    let start = Instant::now();
    let loaded: Vec<(String, PathBuf, TableSet)> = files
        .into_par_iter()
        .filter_map(|(year, path)| match load_activity_tables(&path) {
            Ok(tables) => Some((year, path, tables)),
            Err(e) => {
                error!(file = %path.display(), "failed to load statement: {:#}", e);
                None
            }
        })
        .collect();
    info!(elapsed = ?start.elapsed(), "loaded {} statements", loaded.len());

    let mut by_year: BTreeMap<String, TableSet> = BTreeMap::new();
    for (year, path, tables) in loaded {
        if by_year.insert(year.clone(), tables).is_some() {
            warn!(%year, file = %path.display(), "several statements for one year; keeping the last");
        }
    }

    // ─── 5) export each year ─────────────────────────────────────────
    let mut exported = Vec::new();
    for (year, tables) in &by_year {
        match export_year(&config.output_root, year, tables, &config.formats) {
            Ok(report) => {
                info!(
                    %year,
                    tables = tables.len(),
                    files = report.written.len(),
                    failed = report.failed.len(),
                    "year summary"
                );
                for (id, err) in &report.failed {
                    warn!(%year, table = %id, "not saved: {}", err);
                }
                if report.snapshot.is_some() {
                    exported.push(year.clone());
                }
            }
            Err(e) => error!(%year, "export failed: {:#}", e),
        }
    }

    // ─── 6) merge the yearly snapshots ───────────────────────────────
    merge_exported(&config.output_root, &config.formats, &exported)?;

    info!("all done");
    Ok(())
}
