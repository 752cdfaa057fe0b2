// src/process/mod.rs
pub mod build;
pub mod convert;
pub mod date_parser;
pub mod registry;
pub mod rows;
pub mod split;
pub mod table;

use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::process::{
    build::build_table,
    registry::{TableRegistry, TableSet},
    rows::{read_rows, Row},
    split::find_sections,
};

/// Read one activity export and reconstruct all of its embedded tables.
///
/// Fails only when the file cannot be read or parsed as delimited text; sections
/// without usable rows are skipped.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_activity_tables<P: AsRef<Path>>(path: P) -> Result<TableSet> {
    let rows = read_rows(path.as_ref())?;
    Ok(extract_tables(&rows))
}

/// Segment → build → collect over an already normalized grid.
pub fn extract_tables(grid: &[Row]) -> TableSet {
    let sections = find_sections(grid);

    let mut registry = TableRegistry::new();
    for section in &sections {
        match build_table(grid, section) {
            Some(table) => registry.insert(section, table),
            None => debug!(
                section = %section.name,
                start = section.start,
                "section has no usable rows; skipped"
            ),
        }
    }

    let tables = registry.finish();
    info!(sections = sections.len(), tables = tables.len(), "extracted tables");
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::registry::canonicalize;
    use crate::process::table::{CellValue, ColumnType};
    use std::collections::HashSet;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,ibkr_tables::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    const STATEMENT: &str = r#"Statement,Header,Field Name,Field Value
Statement,Data,BrokerName,Interactive Brokers LLC
Statement,Data,Period,"January 1, 2024 - December 31, 2024"
Net Asset Value,Header,Asset Class,Prior Total,Current Total
Net Asset Value,Data,Cash,"1,000.50","2,000.25"
Net Asset Value,Data,Total,"1,000.50","2,000.25"
Net Asset Value,Header,Time Weighted Rate of Return
Net Asset Value,Data,4.21%
Open Positions,Header,DataDiscriminator,Asset Category,Currency,Symbol,Quantity,Cost Price
Open Positions,Data,Summary,Stocks,USD,AAPL - Held with Interactive Brokers (U.K.) Limited,10,150.2
Open Positions,Total,,Stocks,USD,,,
Trades,Header,DataDiscriminator,Asset Category,Currency,Account,Symbol,Date/Time,Quantity,Proceeds
Trades,Data,Order,Stocks,USD,U1234567,AAPL,"2024-03-01, 10:15:00","1,000",-150200
Trades,SubTotal,,Stocks,USD,AAPL,,,"1,000",-150200
Trades,Total,,Stocks,USD,,,,,-150200
Trades,Header,DataDiscriminator,Asset Category,Currency,Account,Symbol,Date/Time,Quantity,Proceeds,Code
Trades,Data,Order,Forex,EUR,U1234567,EUR.USD,"2024-04-02, 09:00:00",500,-540,O;
Deposits & Withdrawals,Header,Currency,Settle Date,Description,Amount
Deposits & Withdrawals,Data,EUR,2024-01-05,Cash Transfer,"5,000"
Deposits & Withdrawals,Data,Total,,,"5,000"
Notes/Legal Notes,Header,Type,Note
"#;

    fn write_statement(content: &str) -> Result<NamedTempFile> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(content.as_bytes())?;
        Ok(tmp)
    }

    #[test]
    fn single_trades_section_is_keyed_by_asset_category() -> Result<()> {
        init_test_logging();
        let tmp = write_statement(
            "Trades,Header,Asset Category,Symbol\nTrades,Data,Stocks,AAPL\nFees,Header,Date\n",
        )?;
        let tables = load_activity_tables(tmp.path())?;

        assert_eq!(tables.ids(), vec!["Trades_Stocks"]);
        let trades = tables.get_by_id("Trades_Stocks").expect("Trades_Stocks");
        assert_eq!(trades.num_rows(), 1);
        assert_eq!(
            trades.record(0),
            vec![
                ("Asset Category", CellValue::Text("Stocks")),
                ("Symbol", CellValue::Text("AAPL")),
            ]
        );
        Ok(())
    }

    #[test]
    fn full_statement_round_trip() -> Result<()> {
        init_test_logging();
        let tmp = write_statement(STATEMENT)?;
        let tables = load_activity_tables(tmp.path())?;

        assert_eq!(
            tables.ids(),
            vec![
                "Statement",
                "Net_Asset_Value",
                "Time_Weighted_Rate_of_Return",
                "Open_Positions_Stocks",
                "Trades_Stocks",
                "Trades_Forex",
                "Deposits_Withdrawals",
            ]
        );

        let nav = tables.get("Net Asset Value").expect("nav");
        assert_eq!(nav.value(0, "Prior Total"), Some(CellValue::Number(1000.5)));

        let positions = tables.get("Open Positions.Stocks").expect("positions");
        assert_eq!(positions.value(0, "Symbol"), Some(CellValue::Text("AAPL")));
        assert_eq!(positions.num_rows(), 2);

        let stocks = tables.get("Trades.Stocks").expect("stock trades");
        assert_eq!(stocks.num_rows(), 3);
        assert_eq!(stocks.value(1, "Account"), Some(CellValue::Null));
        assert_eq!(stocks.value(1, "Symbol"), Some(CellValue::Text("AAPL")));
        assert_eq!(stocks.value(0, "Quantity"), Some(CellValue::Number(1000.0)));
        assert_eq!(
            stocks.column("Date/Time").map(|c| c.data.column_type()),
            Some(ColumnType::DateTime)
        );

        let forex = tables.get("Trades.Forex").expect("forex trades");
        assert_eq!(forex.value(0, "Code"), Some(CellValue::Text("O")));

        let deposits = tables.get("Deposits & Withdrawals").expect("deposits");
        assert_eq!(
            deposits.column("Settle Date").map(|c| c.data.column_type()),
            Some(ColumnType::DateTime)
        );
        assert_eq!(deposits.value(1, "Settle Date"), Some(CellValue::Null));
        Ok(())
    }

    #[test]
    fn canonical_ids_are_unique() -> Result<()> {
        let mut content = String::from(STATEMENT);
        content.push_str("Statement,Header,Field Name,Field Value\nStatement,Data,Title,Again\n");
        content.push_str("Statement Header,Header,Field\nStatement Header,Data,x\n");
        let grid = rows::normalize_rows(&content)?;
        let tables = extract_tables(&grid);

        let ids = tables.ids();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len(), "ids: {:?}", ids);
        for entry in tables.iter() {
            assert_eq!(canonicalize(&entry.key), entry.id);
        }
        Ok(())
    }

    #[test]
    fn unreadable_file_fails_whole_load() {
        assert!(load_activity_tables("/no/such/activity_2024.csv").is_err());
    }
}
