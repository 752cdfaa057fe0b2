pub mod config;
pub mod discover;
pub mod export;
pub mod process;

pub use process::{
    load_activity_tables,
    registry::{canonicalize, TableSet},
    table::{CellValue, Column, ColumnData, ColumnType, Table},
};
