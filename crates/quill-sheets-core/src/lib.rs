//! # quill-sheets-core
//!
//! Core data structures shared by the quill-sheets readers.
//!
//! This crate holds the value model a format reader writes into:
//! - [`CellValue`] - cell contents (numbers, strings, booleans, errors, formulas)
//! - [`Row`] - a sparse row of cells with per-cell format indices
//! - [`Font`] and [`Format`] - formatting records captured from the file
//!
//! It deliberately knows nothing about any on-disk format beyond the byte
//! values of Excel error codes.

pub mod cell;
pub mod row;
pub mod style;

pub use cell::{CellError, CellValue, FormulaCell, SharedString};
pub use row::Row;
pub use style::{Font, Format};

/// Maximum number of rows in a worksheet (Excel limit).
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit).
pub const MAX_COLS: u16 = 16_384;
