//! # quill-sheets-xls
//!
//! Reader for the legacy Excel binary workbook format (.xls): BIFF
//! versions 5, 7 and 8 inside an OLE2 compound document.
//!
//! Reading is two-phase: opening a file parses the workbook globals and
//! indexes where every sheet and row lives; cell data is decoded lazily,
//! one row block at a time, when [`Workbook::row`] is called.
//!
//! # Example
//!
//! ```rust,no_run
//! use quill_sheets_xls::XlsReader;
//!
//! let mut workbook = XlsReader::read_file("input.xls").unwrap();
//! let sheet = workbook.worksheet_index("Sheet1").unwrap();
//! let row = workbook.row(sheet, 0).unwrap();
//! println!("{:?}", row.cell(0));
//! ```

pub mod biff;
pub mod codepage;
pub mod error;
pub mod reader;
mod sst;
pub mod styles;
pub mod workbook;
pub mod worksheet;

pub use biff::BiffVersion;
pub use codepage::Encoder;
pub use error::{XlsError, XlsResult};
pub use reader::XlsReader;
pub use styles::StyleEntry;
pub use workbook::{BoundsheetStats, DateBase, Workbook};
pub use worksheet::{Dimensions, RowAddress, SheetKind, SheetVisibility, Worksheet};
