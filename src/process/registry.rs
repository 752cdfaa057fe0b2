// src/process/registry.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::process::{
    split::{Section, GENERAL_CATEGORY},
    table::{ColumnData, Table},
};

/// Sections exported once per asset class.
pub const SPLIT_BY_ASSET_SECTIONS: &[&str] = &["Trades", "Transfers", "Open Positions"];
pub const ASSET_CATEGORY_HEADER: &str = "Asset Category";

static NON_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("static regex"));
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").expect("static regex"));

/// Turn a table key such as `"Trades.Stocks"` or `"Mark-to-Market Performance Summary"`
/// into a stable identifier (`Trades_Stocks`, `Mark_to_Market_Performance_Summary`).
///
/// Idempotent: `canonicalize(canonicalize(k)) == canonicalize(k)`.
pub fn canonicalize(key: &str) -> String {
    let replaced = NON_IDENT.replace_all(key, "_");
    let mut id = UNDERSCORE_RUNS
        .replace_all(&replaced, "_")
        .trim_matches('_')
        .to_string();
    while let Some(stripped) = id.strip_suffix("_Header") {
        id = stripped.trim_end_matches('_').to_string();
    }
    if id.is_empty() {
        id = "table".to_string();
    }
    id
}

/// `name` for uncategorised sections, `name.category` otherwise.
pub fn table_key(name: &str, category: Option<&str>) -> String {
    match category {
        None | Some(GENERAL_CATEGORY) => name.to_string(),
        Some(category) => format!("{}.{}", name, category),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Human readable key, e.g. `Trades.Stocks`.
    pub key: String,
    /// Canonical form of `key`; unique within a set.
    pub id: String,
    pub table: Table,
}

/// All tables reconstructed from one export file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSet {
    entries: Vec<TableEntry>,
}

impl TableSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Table> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.table)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Table> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.table)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }
}

/// Collects built tables under unique keys. Consumed by [`TableRegistry::finish`].
#[derive(Debug, Default)]
pub struct TableRegistry {
    entries: Vec<TableEntry>,
    ids: HashSet<String>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the table built from `section`. Asset-split sections are
    /// partitioned by their `Asset Category` column; rows without a usable
    /// category stay with the section's own category, or go under the bare
    /// section name when it has none.
    pub fn insert(&mut self, section: &Section, table: Table) {
        let category = section.category.as_deref();

        if SPLIT_BY_ASSET_SECTIONS.contains(&section.name.as_str()) {
            let own = category.filter(|c| *c != GENERAL_CATEGORY);
            if let Some(parts) = partition_by_asset(&table, own) {
                for (asset, rows) in parts {
                    let part_key = table_key(&section.name, asset.as_deref());
                    self.push(part_key, table.select_rows(&rows));
                }
                return;
            }
        }

        self.push(table_key(&section.name, category), table);
    }

    fn push(&mut self, key: String, table: Table) {
        let mut candidate = key.clone();
        let mut suffix = 1;
        while self.ids.contains(&canonicalize(&candidate)) {
            candidate = format!("{}_{}", key, suffix);
            suffix += 1;
        }
        if candidate != key {
            debug!(%key, renamed = %candidate, "table key already taken");
        }

        let id = canonicalize(&candidate);
        self.ids.insert(id.clone());
        self.entries.push(TableEntry {
            key: candidate,
            id,
            table,
        });
    }

    pub fn finish(self) -> TableSet {
        TableSet {
            entries: self.entries,
        }
    }
}

/// Row indices grouped by asset category, in first-seen order. Rows without a
/// usable category (blank or a `Total` label) are grouped under `fallback`.
fn partition_by_asset(
    table: &Table,
    fallback: Option<&str>,
) -> Option<Vec<(Option<String>, Vec<usize>)>> {
    let column = table.column(ASSET_CATEGORY_HEADER)?;
    let ColumnData::Text(values) = &column.data else {
        return None;
    };

    let mut parts: Vec<(Option<String>, Vec<usize>)> = Vec::new();
    for (row, value) in values.iter().enumerate() {
        let asset = value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.contains("Total"))
            .or(fallback)
            .map(str::to_string);
        match parts.iter_mut().find(|(a, _)| *a == asset) {
            Some((_, rows)) => rows.push(row),
            None => parts.push((asset, vec![row])),
        }
    }
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::table::Column;

    fn section(name: &str, category: Option<&str>) -> Section {
        Section {
            name: name.to_string(),
            category: category.map(str::to_string),
            start: 0,
            end: 1,
        }
    }

    fn one_column(name: &str, values: &[&str]) -> Table {
        Table::new(
            values.iter().map(|_| "Data".to_string()).collect(),
            vec![Column {
                name: name.to_string(),
                data: ColumnData::Text(values.iter().map(|v| Some(v.to_string())).collect()),
            }],
        )
    }

    #[test]
    fn canonicalize_examples() {
        assert_eq!(canonicalize("Trades.Stocks"), "Trades_Stocks");
        assert_eq!(
            canonicalize("Mark-to-Market Performance Summary"),
            "Mark_to_Market_Performance_Summary"
        );
        assert_eq!(canonicalize("  Deposits & Withdrawals "), "Deposits_Withdrawals");
        assert_eq!(canonicalize("Trades Header"), "Trades");
        assert_eq!(canonicalize("Notes_Header__Header"), "Notes");
        assert_eq!(canonicalize("Header"), "Header");
        assert_eq!(canonicalize("..."), "table");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        for key in [
            "Trades.Stocks",
            "Open Positions.Equity and Index Options",
            "Change in NAV_1",
            "__weird__key__Header_",
            "Net Asset Value",
            "Time Weighted Rate of Return",
            "Ünïcode Header",
        ] {
            let once = canonicalize(key);
            assert_eq!(canonicalize(&once), once, "key {:?}", key);
        }
    }

    #[test]
    fn general_category_is_left_out_of_key() {
        assert_eq!(table_key("Fees", Some(GENERAL_CATEGORY)), "Fees");
        assert_eq!(table_key("Trades", Some("Forex")), "Trades.Forex");
        assert_eq!(table_key("Time Weighted Rate of Return", None), "Time Weighted Rate of Return");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut registry = TableRegistry::new();
        registry.insert(&section("Notes", Some(GENERAL_CATEGORY)), one_column("Text", &["a"]));
        registry.insert(&section("Notes", Some(GENERAL_CATEGORY)), one_column("Text", &["b"]));
        registry.insert(&section("Notes", Some(GENERAL_CATEGORY)), one_column("Text", &["c"]));
        let set = registry.finish();

        assert_eq!(set.keys(), vec!["Notes", "Notes_1", "Notes_2"]);
        assert_eq!(set.ids(), vec!["Notes", "Notes_1", "Notes_2"]);
    }

    #[test]
    fn keys_that_canonicalize_alike_stay_distinct() {
        let mut registry = TableRegistry::new();
        registry.insert(&section("Cash Report", None), one_column("Text", &["a"]));
        registry.insert(&section("Cash.Report", None), one_column("Text", &["b"]));
        let set = registry.finish();

        let ids: HashSet<&str> = set.ids().into_iter().collect();
        assert_eq!(ids.len(), 2);
        assert!(set.get_by_id("Cash_Report_1").is_some());
    }

    #[test]
    fn asset_sections_are_partitioned() {
        let mut registry = TableRegistry::new();
        registry.insert(
            &section("Trades", Some(GENERAL_CATEGORY)),
            one_column(ASSET_CATEGORY_HEADER, &["Stocks", "Forex", "Stocks", "Total"]),
        );
        let set = registry.finish();

        assert_eq!(set.keys(), vec!["Trades.Stocks", "Trades.Forex", "Trades"]);
        assert_eq!(set.get("Trades.Stocks").map(Table::num_rows), Some(2));
        assert_eq!(set.get_by_id("Trades_Forex").map(Table::num_rows), Some(1));
    }

    #[test]
    fn uncategorised_rows_join_the_section_category() {
        let mut registry = TableRegistry::new();
        registry.insert(
            &section("Trades", Some("Stocks")),
            one_column(ASSET_CATEGORY_HEADER, &["Stocks", "", "Total"]),
        );
        registry.insert(
            &section("Trades", Some("Forex")),
            one_column(ASSET_CATEGORY_HEADER, &["Forex", "Total"]),
        );
        let set = registry.finish();

        assert_eq!(set.keys(), vec!["Trades.Stocks", "Trades.Forex"]);
        assert_eq!(set.get("Trades.Stocks").map(Table::num_rows), Some(3));
        assert_eq!(set.get("Trades.Forex").map(Table::num_rows), Some(2));
    }
}
