// src/export/columnar.rs
use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{fs::File, path::Path, sync::Arc};

use crate::export::ROW_KIND_COLUMN;
use crate::process::table::{ColumnData, Table};

/// Arrow type used for each column type:
/// - Text     → Utf8
/// - Numeric  → Float64
/// - DateTime → Timestamp(ms), no zone
fn arrow_type(data: &ColumnData) -> DataType {
    match data {
        ColumnData::Text(_) => DataType::Utf8,
        ColumnData::Numeric(_) => DataType::Float64,
        ColumnData::DateTime(_) => DataType::Timestamp(TimeUnit::Millisecond, None),
    }
}

fn arrow_array(data: &ColumnData) -> ArrayRef {
    match data {
        ColumnData::Text(v) => Arc::new(StringArray::from(
            v.iter().map(|c| c.as_deref()).collect::<Vec<Option<&str>>>(),
        )),
        ColumnData::Numeric(v) => Arc::new(Float64Array::from(v.clone())),
        ColumnData::DateTime(v) => Arc::new(TimestampMillisecondArray::from(
            v.iter()
                .map(|c| c.map(|dt| dt.and_utc().timestamp_millis()))
                .collect::<Vec<Option<i64>>>(),
        )),
    }
}

/// Build a single record batch holding the whole table. The row kind leads as
/// a non-null Utf8 field; every data field is nullable.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(ROW_KIND_COLUMN, DataType::Utf8, false)];
    fields.extend(
        table
            .columns()
            .iter()
            .map(|c| Field::new(&c.name, arrow_type(&c.data), true)),
    );

    let kinds: ArrayRef = Arc::new(StringArray::from(
        table.labels().iter().map(String::as_str).collect::<Vec<&str>>(),
    ));
    let mut arrays = vec![kinds];
    arrays.extend(table.columns().iter().map(|c| arrow_array(&c.data)));

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("building record batch")
}

pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let batch = to_record_batch(table)?;
    let file = File::create(path).with_context(|| format!("creating Parquet file {:?}", path))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer")?;
    writer.write(&batch).context("writing table batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}
