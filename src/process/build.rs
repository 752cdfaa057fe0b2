// src/process/build.rs
use std::collections::HashSet;
use tracing::trace;

use crate::process::{
    convert::coerce_column,
    rows::Row,
    split::Section,
    table::{Column, Table},
};

/// Sections whose subtotal rows carry the symbol in the account column.
const SUBTOTAL_REPAIR_SECTIONS: &[&str] = &["Trades"];
const ACCOUNT_HEADER: &str = "account";

/// Cells before this index hold the section name and the row kind.
const FIRST_DATA_CELL: usize = 2;

const COLUMN_RENAMES: &[(&str, &str)] = &[("Qty", "Quantity")];

/// Raw cells of one column before typing; `None` is a blank cell.
type RawColumn = (String, Vec<Option<String>>);

/// Build the typed table of `section`, or `None` when no data rows survive.
///
/// Cell 0 of every row is the section name and cell 1 the row kind, so data
/// headers start at cell 2. Blank header cells are dropped first; the i-th
/// remaining header reads content cell `2 + i`.
pub fn build_table(grid: &[Row], section: &Section) -> Option<Table> {
    let headers = declared_headers(section.marker(grid));
    if headers.is_empty() {
        return None;
    }

    let mut labels: Vec<String> = Vec::new();
    let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for row in section.content(grid) {
        if row.len() < 2 {
            continue;
        }
        let cells: Vec<Option<String>> = headers
            .iter()
            .enumerate()
            .map(|(i, _)| {
                row.get(FIRST_DATA_CELL + i)
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
            })
            .collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }
        labels.push(row[1].trim().to_string());
        for (column, cell) in values.iter_mut().zip(cells) {
            column.push(cell);
        }
    }

    if labels.is_empty() {
        trace!(section = %section.name, "no data rows");
        return None;
    }

    let names = dedup_headers(headers.iter().map(String::as_str));
    let mut columns: Vec<RawColumn> = names
        .into_iter()
        .zip(values)
        .filter(|(name, _)| !name.trim().is_empty())
        .collect();

    if SUBTOTAL_REPAIR_SECTIONS.contains(&section.name.as_str()) {
        repair_subtotal_accounts(&labels, &mut columns);
    }

    columns.retain(|(_, cells)| cells.iter().any(Option::is_some));
    if columns.is_empty() {
        return None;
    }

    let existing: HashSet<String> = columns.iter().map(|(n, _)| n.clone()).collect();
    let columns = columns
        .into_iter()
        .map(|(name, cells)| {
            let data = coerce_column(&name, cells);
            Column {
                name: rename_column(name, &existing),
                data,
            }
        })
        .collect();

    Some(Table::new(labels, columns))
}

/// Non-empty header cells from index 2 onward.
fn declared_headers(marker: &[String]) -> Vec<String> {
    marker
        .iter()
        .skip(FIRST_DATA_CELL)
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect()
}

/// `X, X, X` becomes `X, X_1, X_2`, in first-seen order.
pub fn dedup_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for header in headers {
        let mut candidate = header.to_string();
        let mut n = 0;
        while used.contains(&candidate) {
            n += 1;
            candidate = format!("{}_{}", header, n);
        }
        used.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// On subtotal lines the export writes the symbol into the account column:
/// move it one column right and blank the account cell.
fn repair_subtotal_accounts(labels: &[String], columns: &mut [RawColumn]) {
    let Some(account) = columns
        .iter()
        .position(|(name, _)| name.eq_ignore_ascii_case(ACCOUNT_HEADER))
    else {
        return;
    };
    if account + 1 >= columns.len() {
        return;
    }

    for (row, label) in labels.iter().enumerate() {
        if !label.to_ascii_lowercase().contains("subtotal") {
            continue;
        }
        if let Some(moved) = columns[account].1[row].take() {
            columns[account + 1].1[row] = Some(moved);
        }
    }
}

fn rename_column(name: String, existing: &HashSet<String>) -> String {
    match COLUMN_RENAMES.iter().find(|(from, _)| *from == name) {
        Some((_, to)) if !existing.contains(*to) => to.to_string(),
        _ => name,
    }
}
