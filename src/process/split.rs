// src/process/split.rs
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::process::rows::Row;

/// Token in the second cell of a row that opens a new embedded table.
pub const MARKER_TOKEN: &str = "Header";

/// Category given to sections that are not split further.
pub const GENERAL_CATEGORY: &str = "General";

/// A contiguous run of rows `[start, end)` belonging to one embedded table.
/// `start` is always the marker row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub category: Option<String>,
    pub start: usize,
    pub end: usize,
}

impl Section {
    pub fn marker<'a>(&self, grid: &'a [Row]) -> &'a Row {
        &grid[self.start]
    }

    /// Rows after the marker, up to the next marker.
    pub fn content<'a>(&self, grid: &'a [Row]) -> &'a [Row] {
        &grid[self.start + 1..self.end]
    }
}

/// Where the category of a repeated section is found.
///
/// `index` is the raw cell index (cell 0 is the section name, cell 1 the row kind).
/// If the marker row declares `header`, its position takes precedence.
struct CategoryProbe {
    section: &'static str,
    header: &'static str,
    index: usize,
}

const CATEGORY_PROBES: &[CategoryProbe] = &[
    CategoryProbe {
        section: "Trades",
        header: "Asset Category",
        index: 3,
    },
    CategoryProbe {
        section: "Open Positions",
        header: "Asset Category",
        index: 3,
    },
    CategoryProbe {
        section: "Transfers",
        header: "Asset Category",
        index: 2,
    },
];

/// A repeated section that is really a different table, recognised by the
/// third cell of its marker row.
struct SectionAlias {
    section: &'static str,
    marker_label: &'static str,
    alias: &'static str,
}

const SECTION_ALIASES: &[SectionAlias] = &[SectionAlias {
    section: "Net Asset Value",
    marker_label: "Time Weighted Rate of Return",
    alias: "Time Weighted Rate of Return",
}];

pub fn is_marker(row: &[String]) -> bool {
    row.len() > 1 && row[1].trim().eq_ignore_ascii_case(MARKER_TOKEN)
}

/// Cut the grid into sections and resolve the (name, category) of each.
///
/// Rows before the first marker belong to no section.
pub fn find_sections(grid: &[Row]) -> Vec<Section> {
    let markers: Vec<usize> = grid
        .iter()
        .enumerate()
        .filter(|(_, row)| is_marker(row))
        .map(|(idx, _)| idx)
        .collect();

    let mut sections: Vec<Section> = markers
        .iter()
        .enumerate()
        .map(|(n, &start)| Section {
            name: grid[start][0].trim().to_string(),
            category: None,
            start,
            end: markers.get(n + 1).copied().unwrap_or(grid.len()),
        })
        .collect();

    let mut occurrences: HashMap<String, usize> = HashMap::new();
    for section in &sections {
        *occurrences.entry(section.name.clone()).or_default() += 1;
    }

    for section in sections.iter_mut() {
        let repeated = occurrences.get(&section.name).copied().unwrap_or(0) > 1;
        if !repeated {
            section.category = Some(GENERAL_CATEGORY.to_string());
            continue;
        }

        if let Some(alias) = find_alias(section, grid) {
            trace!(section = %section.name, alias, "section renamed by marker label");
            section.name = alias.to_string();
            section.category = None;
            continue;
        }

        let category = probe_category(section, grid).unwrap_or_else(|| GENERAL_CATEGORY.to_string());
        trace!(section = %section.name, %category, start = section.start, "resolved category");
        section.category = Some(category);
    }

    debug!(markers = markers.len(), "found sections");
    sections
}

fn find_alias(section: &Section, grid: &[Row]) -> Option<&'static str> {
    let label = section.marker(grid).get(2).map(|c| c.trim()).unwrap_or("");
    SECTION_ALIASES
        .iter()
        .find(|a| a.section == section.name && a.marker_label == label)
        .map(|a| a.alias)
}

fn probe_category(section: &Section, grid: &[Row]) -> Option<String> {
    let probe = CATEGORY_PROBES.iter().find(|p| p.section == section.name)?;
    // blank header cells do not occupy a content cell
    let index = section
        .marker(grid)
        .iter()
        .skip(2)
        .filter(|c| !c.trim().is_empty())
        .position(|c| c.trim() == probe.header)
        .map(|i| i + 2)
        .unwrap_or(probe.index);

    section
        .content(grid)
        .iter()
        .filter_map(|row| row.get(index))
        .map(|cell| cell.trim())
        .find(|cell| !cell.is_empty() && !cell.contains("Total"))
        .map(str::to_string)
}
