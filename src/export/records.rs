use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use crate::export::{delimited::DATETIME_FORMAT, ROW_KIND_COLUMN};
use crate::process::{
    registry::TableSet,
    table::{CellValue, Table},
};

fn cell_json(value: &CellValue<'_>) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Text(s) => Value::String(s.to_string()),
        CellValue::Number(n) => Value::from(*n),
        CellValue::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
    }
}

/// One JSON object per row, keyed by header in column order, led by the row kind.
pub fn table_records(table: &Table) -> Vec<Value> {
    table
        .labels()
        .iter()
        .enumerate()
        .map(|(row, kind)| {
            let mut record = Map::new();
            record.insert(ROW_KIND_COLUMN.to_string(), Value::String(kind.clone()));
            for (header, value) in table.record(row) {
                record.insert(header.to_string(), cell_json(&value));
            }
            Value::Object(record)
        })
        .collect()
}

pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating JSON file {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &table_records(table))
        .with_context(|| format!("writing JSON records to {:?}", path))?;
    Ok(())
}

/// Persist a whole table set with its column types, so it can be read back for merging.
pub fn write_snapshot(tables: &TableSet, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating snapshot {:?}", path))?;
    serde_json::to_writer(BufWriter::new(file), tables)
        .with_context(|| format!("writing snapshot {:?}", path))?;
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<TableSet> {
    let file = File::open(path).with_context(|| format!("opening snapshot {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("decoding snapshot {:?}", path))
}
