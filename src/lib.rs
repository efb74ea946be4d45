//! # excelexport
//!
//! Streaming export of tabular rows into single-sheet spreadsheet (`.xlsx`) packages.
//!
//! Rows are classified into typed columns once, then written straight into the zip
//! archive one at a time. Memory stays bounded by the shared string table no matter
//! how many rows are exported.
//!
//! ## Quick Start
//!
//! ```no_run
//! use excelexport::{ColumnSet, ExportOptions, FieldType, FieldValue, StreamingWorkbook};
//!
//! let columns = ColumnSet::from_fields(
//!     &[("Name", FieldType::String), ("Age", FieldType::I32), ("Joined", FieldType::DateTime)],
//!     true,
//! )?;
//! let mut workbook = StreamingWorkbook::create("people.xlsx", columns, ExportOptions::default())?;
//! workbook.write_row(&["Ann".into(), FieldValue::Int(30), "2024-01-15T00:00:00".into()])?;
//! workbook.write_row(&["Bo".into(), FieldValue::Int(41), "2023-06-01T00:00:00".into()])?;
//! workbook.close()?;
//! # Ok::<(), excelexport::ExcelError>(())
//! ```
//!
//! ## One-call export
//!
//! ```no_run
//! use excelexport::{export_source, ExportOptions, FieldType, FieldValue, MemorySource};
//!
//! let mut source = MemorySource::new(vec![("id".to_string(), FieldType::I64)])
//!     .with_rows(vec![vec![FieldValue::Int(1)], vec![FieldValue::Int(2)]]);
//! let options = ExportOptions::new().with_core_properties(true).with_fix_content_types(true);
//! let rows = export_source(&mut source, "ids.xlsx", &options)?;
//! assert_eq!(rows, 2);
//! # Ok::<(), excelexport::ExcelError>(())
//! ```
//!
//! ## Live connections
//!
//! With [`ExportOptions::with_live_connection`] the package carries no row data; the
//! spreadsheet application runs the embedded SQL statement itself when the file opens.

pub mod batch;
pub mod columns;
pub mod error;
pub mod fast_writer;
pub mod formatter;
pub mod options;
pub mod package;
pub mod source;
pub mod types;

pub use batch::{BatchExporter, BatchReport, ExportJob, JobOutcome};
pub use columns::ColumnSet;
pub use error::{ExcelError, Result};
pub use fast_writer::{SessionState, SharedStrings, StreamingWorkbook};
pub use options::{
    sanitize_text, sheet_name_from_file, ExportMode, ExportOptions, NullCellPolicy, MAX_ROWS_PER_SHEET,
};
pub use package::PackageFixer;
pub use source::{export_source, MemorySource, RowSource};
pub use types::{column_code, ColumnDescriptor, ColumnType, FieldType, FieldValue};
