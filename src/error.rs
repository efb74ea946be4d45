//! Error types for the export pipeline

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Main error type for all export operations
#[derive(Error, Debug)]
pub enum ExcelError {
    /// The row source described no columns
    #[error("Schema has no columns")]
    EmptySchema,

    /// A row carried a different number of values than the schema has columns
    #[error("Row {row} has {found} values, expected {expected}")]
    RowWidthMismatch {
        row: u32,
        expected: usize,
        found: usize,
    },

    /// The worksheet is full
    #[error("Worksheet row limit of {limit} reached")]
    RowLimitExceeded { limit: u32 },

    /// Error occurred while reading a package back
    #[error("Failed to read package: {0}")]
    ReadError(String),

    /// Error occurred while writing the package
    #[error("Failed to write Excel file: {0}")]
    WriteError(String),

    /// Error occurred while writing a row
    #[error("Failed to write row {row} to sheet '{sheet}': {source}")]
    WriteRowError {
        row: u32,
        sheet: String,
        #[source]
        source: Box<ExcelError>,
    },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Operation not valid in the current session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl ExcelError {
    /// Wrap a zip-layer failure as a write error with context
    pub(crate) fn zip_write(context: &str, err: impl std::fmt::Display) -> Self {
        ExcelError::WriteError(format!("{}: {}", context, err))
    }

    /// Wrap a zip-layer failure as a read error with context
    pub(crate) fn zip_read(context: &str, err: impl std::fmt::Display) -> Self {
        ExcelError::ReadError(format!("{}: {}", context, err))
    }

    /// Attach row/sheet context to an error raised while writing a row
    pub(crate) fn at_row(self, row: u32, sheet: &str) -> Self {
        match self {
            // Already carries its own row context
            e @ ExcelError::RowWidthMismatch { .. } | e @ ExcelError::RowLimitExceeded { .. } => e,
            e => ExcelError::WriteRowError {
                row,
                sheet: sheet.to_string(),
                source: Box::new(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_context() {
        let err = ExcelError::WriteError("disk full".to_string()).at_row(7, "sheet1");
        assert_eq!(
            err.to_string(),
            "Failed to write row 7 to sheet 'sheet1': Failed to write Excel file: disk full"
        );

        let err = ExcelError::RowLimitExceeded { limit: 10 }.at_row(11, "sheet1");
        assert!(matches!(err, ExcelError::RowLimitExceeded { limit: 10 }));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ExcelError = io.into();
        assert!(matches!(err, ExcelError::IoError(_)));
    }
}
