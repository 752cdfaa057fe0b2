// src/process/rows.rs
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{fs, path::Path};
use tracing::{debug, instrument, trace};

/// One line of the export, already split into trimmed cells.
pub type Row = Vec<String>;

/// Annotation the broker appends to some cells (" - Held with Interactive Brokers ...").
const HELD_WITH: &str = " - Held with";

fn reader_for(data: &[u8]) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // every section has its own width
        .quote(b'"')
        .trim(Trim::All)
        .from_reader(data)
}

/// Read `path` and normalize it into a rectangular grid.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Row>> {
    let bytes = fs::read(path.as_ref())
        .with_context(|| format!("Failed to read activity export: {:?}", path.as_ref()))?;
    let text = String::from_utf8_lossy(&bytes);
    normalize_rows(&text)
        .with_context(|| format!("Failed to parse activity export: {:?}", path.as_ref()))
}

/// Split `text` into rows of trimmed cells, padded to the widest row.
///
/// - a record that collapses into one cell holding both `,` and `"` is re-read as
///   an embedded record (double-quoting artifact of the export)
/// - everything from ` - Held with` onward is dropped from a cell
/// - the last non-blank cell of each row loses any trailing `;`
pub fn normalize_rows(text: &str) -> Result<Vec<Row>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rdr = reader_for(text.as_bytes());

    let mut rows: Vec<Row> = Vec::new();
    let mut width = 0;
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let record = match unwrap_embedded_record(&record)? {
            Some(inner) => {
                trace!(record = idx, "re-parsed double-quoted record");
                inner
            }
            None => record,
        };

        let row: Row = record.iter().map(clean_cell).collect();
        width = width.max(row.len());
        rows.push(row);
    }

    for row in rows.iter_mut() {
        row.resize(width, String::new());
        strip_row_terminator(row);
    }

    debug!(rows = rows.len(), width, "normalized export rows");
    Ok(rows)
}

fn unwrap_embedded_record(record: &StringRecord) -> Result<Option<StringRecord>> {
    if record.len() != 1 {
        return Ok(None);
    }
    let cell = &record[0];
    if !(cell.contains(',') && cell.contains('"')) {
        return Ok(None);
    }
    let mut inner = reader_for(cell.as_bytes());
    match inner.records().next() {
        Some(parsed) => Ok(Some(parsed.context("re-parsing embedded record")?)),
        None => Ok(None),
    }
}

fn clean_cell(raw: &str) -> String {
    let cell = raw.trim();
    match cell.split_once(HELD_WITH) {
        Some((kept, _)) => kept.trim().to_string(),
        None => cell.to_string(),
    }
}

fn strip_row_terminator(row: &mut Row) {
    if let Some(last) = row.iter_mut().rev().find(|c| !c.trim().is_empty()) {
        let stripped = last.trim_end_matches(';').to_string();
        *last = stripped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn pads_every_row_to_widest() -> Result<()> {
        let text = "Statement,Header,Field Name,Field Value\nStatement,Data,Period\nA,B\n";
        let rows = normalize_rows(text)?;

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == 4));
        assert_eq!(rows[1], vec!["Statement", "Data", "Period", ""]);
        assert_eq!(rows[2], vec!["A", "B", "", ""]);
        Ok(())
    }

    #[test]
    fn strips_held_with_annotation_and_whitespace() -> Result<()> {
        let text = "Open Positions,Data,  Stocks ,AAPL - Held with Interactive Brokers (U.K.) Limited\n";
        let rows = normalize_rows(text)?;
        assert_eq!(rows[0], vec!["Open Positions", "Data", "Stocks", "AAPL"]);
        Ok(())
    }

    #[test]
    fn strips_semicolon_only_from_last_filled_cell() -> Result<()> {
        let text = "Notes,Data,a;b,end;;,,\n";
        let rows = normalize_rows(text)?;
        assert_eq!(rows[0], vec!["Notes", "Data", "a;b", "end", "", ""]);
        Ok(())
    }

    #[test]
    fn recovers_double_quoted_records() -> Result<()> {
        let text = "\"Trades,Data,\"\"Stocks\"\",AAPL\"\nTrades,Data,Stocks,MSFT\n";
        let rows = normalize_rows(text)?;
        assert_eq!(rows[0], vec!["Trades", "Data", "Stocks", "AAPL"]);
        assert_eq!(rows[1], vec!["Trades", "Data", "Stocks", "MSFT"]);
        Ok(())
    }

    #[test]
    fn keeps_quoted_commas_inside_cells() -> Result<()> {
        let text = "Trades,Data,Order,\"2025-11-27, 15:41:12\",\"1,000\"\n";
        let rows = normalize_rows(text)?;
        assert_eq!(rows[0][3], "2025-11-27, 15:41:12");
        assert_eq!(rows[0][4], "1,000");
        Ok(())
    }

    #[test]
    fn reads_file_with_bom() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all("\u{feff}Statement,Header,Field Name\n".as_bytes())?;
        let rows = read_rows(tmp.path())?;
        assert_eq!(rows[0][0], "Statement");
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_rows("/definitely/not/here.csv").unwrap_err();
        assert!(format!("{:#}", err).contains("here.csv"));
    }
}
