use anyhow::Result;
use clap::Parser;
use ibkr_tables::load_activity_tables;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// Print the tables found in one activity statement, with their column types.
#[derive(Parser, Debug)]
struct Args {
    /// Activity statement CSV
    path: PathBuf,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    let args = Args::parse();
    let tables = load_activity_tables(&args.path)?;

    println!("=== {} ({} tables) ===", args.path.display(), tables.len());
    for entry in tables.iter() {
        println!();
        println!(
            "{}  [{}]  rows: {}",
            entry.id,
            entry.key,
            entry.table.num_rows()
        );
        for column in entry.table.columns() {
            println!(
                "  - {:<40} | {:<8} | nulls: {}",
                column.name,
                column.data.column_type().to_string(),
                column.data.null_count()
            );
        }
    }
    Ok(())
}
