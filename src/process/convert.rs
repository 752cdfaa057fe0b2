use crate::process::date_parser;
use crate::process::table::ColumnData;

/// Parse a numeric cell, ignoring thousands separators. Non-finite results count as failures.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Headers naming a date column (`Date`, `Settle Date`, `Date/Time`, ...).
pub fn is_date_header(name: &str) -> bool {
    name.to_ascii_lowercase().contains("date")
}

/// Decide the type of a column from its header and its cells (`None` = blank).
///
/// Date-named columns always become `DateTime`. Otherwise the column is numeric
/// when at least one cell parses and at least half of the non-blank cells do;
/// cells that fail become null.
pub fn coerce_column(name: &str, cells: Vec<Option<String>>) -> ColumnData {
    if is_date_header(name) {
        return ColumnData::DateTime(
            cells
                .iter()
                .map(|c| c.as_deref().and_then(date_parser::parse_datetime))
                .collect(),
        );
    }

    let non_blank = cells.iter().flatten().count();
    let parsed: Vec<Option<f64>> = cells
        .iter()
        .map(|c| c.as_deref().and_then(parse_number))
        .collect();
    let ok = parsed.iter().flatten().count();

    if ok > 0 && ok * 2 >= non_blank {
        ColumnData::Numeric(parsed)
    } else {
        ColumnData::Text(cells)
    }
}
