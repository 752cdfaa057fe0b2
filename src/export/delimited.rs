use anyhow::{Context, Result};
use std::path::Path;

use crate::export::ROW_KIND_COLUMN;
use crate::process::table::{CellValue, Table};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a cell for text output; nulls are empty.
pub fn cell_text(value: &CellValue<'_>) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Text(s) => s.to_string(),
        CellValue::Number(n) => n.to_string(),
        CellValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
    }
}

/// Write `table` as a delimited text file with a header row; the row kind leads each line.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("creating CSV file {:?}", path))?;
    let mut header = vec![ROW_KIND_COLUMN];
    header.extend(table.headers());
    wtr.write_record(&header).context("writing CSV header")?;
    for (row, kind) in table.labels().iter().enumerate() {
        let record: Vec<String> = std::iter::once(kind.clone())
            .chain(table.record(row).iter().map(|(_, v)| cell_text(v)))
            .collect();
        wtr.write_record(&record)
            .with_context(|| format!("writing CSV row {}", row))?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}
