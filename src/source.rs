//! Row sources and the one-call export
//!
//! A [`RowSource`] is forward-only: the export visits every row exactly once and never
//! seeks back.

use std::path::Path;

use log::{debug, info};

use crate::columns::ColumnSet;
use crate::error::{ExcelError, Result};
use crate::fast_writer::StreamingWorkbook;
use crate::options::ExportOptions;
use crate::package::PackageFixer;
use crate::types::{FieldType, FieldValue};

/// Forward-only supplier of typed rows
pub trait RowSource {
    /// Declared `(name, type)` pairs, or `None` when types are only known from the data
    fn schema(&self) -> Option<Vec<(String, FieldType)>>;

    /// Field names, used with the first record when there is no declared schema
    fn field_names(&self) -> Vec<String> {
        self.schema()
            .map(|fields| fields.into_iter().map(|(name, _)| name).collect())
            .unwrap_or_default()
    }

    /// Next row, or `None` once the source is exhausted
    fn next_row(&mut self) -> Option<Result<Vec<FieldValue>>>;
}

/// Rows held in memory
///
/// # Examples
///
/// ```
/// use excelexport::{FieldType, FieldValue, MemorySource, RowSource};
///
/// let mut source = MemorySource::new(vec![("Name".to_string(), FieldType::String)])
///     .with_rows(vec![vec![FieldValue::from("Ann")]]);
/// assert_eq!(source.field_names(), ["Name"]);
/// assert!(source.next_row().is_some());
/// assert!(source.next_row().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    fields: Vec<(String, FieldType)>,
    names: Vec<String>,
    declared: bool,
    rows: std::collections::VecDeque<Vec<FieldValue>>,
}

impl MemorySource {
    /// Source with a declared schema
    pub fn new(fields: Vec<(String, FieldType)>) -> Self {
        MemorySource {
            names: fields.iter().map(|(name, _)| name.clone()).collect(),
            fields,
            declared: true,
            rows: Default::default(),
        }
    }

    /// Source whose column types come from its first row
    pub fn untyped<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemorySource {
            names: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<FieldValue>>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn push_row(&mut self, row: Vec<FieldValue>) {
        self.rows.push_back(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowSource for MemorySource {
    fn schema(&self) -> Option<Vec<(String, FieldType)>> {
        self.declared.then(|| self.fields.clone())
    }

    fn field_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn next_row(&mut self) -> Option<Result<Vec<FieldValue>>> {
        self.rows.pop_front().map(Ok)
    }
}

/// Export every row of `source` into a new package at `path`
///
/// Columns come from the declared schema, or from the first record when the source
/// has none. Returns the number of data rows written. On any error the partial file
/// is removed.
pub fn export_source<S, P>(source: &mut S, path: P, options: &ExportOptions) -> Result<u64>
where
    S: RowSource + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let (columns, first) = match source.schema() {
        Some(fields) => (ColumnSet::from_fields(&fields, options.dates_as_text)?, None),
        None => {
            let first = source.next_row().transpose()?.ok_or(ExcelError::EmptySchema)?;
            let record: Vec<(String, FieldValue)> =
                source.field_names().into_iter().zip(first.iter().cloned()).collect();
            (ColumnSet::from_record(&record, options.dates_as_text)?, Some(first))
        }
    };
    debug!("Exporting {} columns to {}", columns.len(), path.display());

    let mut workbook = StreamingWorkbook::create(path, columns, options.clone())?;
    let result = stream_rows(&mut workbook, source, first).and_then(|()| workbook.close());
    if let Err(e) = result {
        workbook.abort();
        return Err(e);
    }
    let rows = workbook.rows_written();
    drop(workbook);

    let fixer = PackageFixer::new(options);
    if fixer.is_enabled() {
        if let Err(e) = fixer.apply(path) {
            let _ = std::fs::remove_file(path);
            return Err(e);
        }
    }

    info!("Exported {} rows to {}", rows, path.display());
    Ok(rows)
}

fn stream_rows<W, S>(
    workbook: &mut StreamingWorkbook<W>,
    source: &mut S,
    first: Option<Vec<FieldValue>>,
) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
    S: RowSource + ?Sized,
{
    workbook.open()?;
    if let Some(row) = first {
        workbook.write_row(&row)?;
    }
    while let Some(row) = source.next_row() {
        workbook.write_row(&row?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::untyped(["a", "b"]).with_rows(vec![vec![FieldValue::Int(1), FieldValue::Null]]);
        assert!(source.schema().is_none());
        assert_eq!(source.field_names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(source.len(), 1);
        assert!(matches!(source.next_row(), Some(Ok(row)) if row.len() == 2));
        assert!(source.is_empty());
    }

    #[test]
    fn test_export_classifies_from_first_record() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("untyped.xlsx");
        let mut source = MemorySource::untyped(["id", "label"]).with_rows(vec![
            vec![FieldValue::Int(1), FieldValue::from("one")],
            vec![FieldValue::Int(2), FieldValue::from("two")],
        ]);

        let rows = export_source(&mut source, &path, &ExportOptions::default())?;
        assert_eq!(rows, 2);
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn test_empty_untyped_source_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.xlsx");
        let mut source = MemorySource::untyped(["id"]);

        let err = export_source(&mut source, &path, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExcelError::EmptySchema));
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_failed_export_removes_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.xlsx");
        let mut source = MemorySource::new(vec![("id".to_string(), FieldType::I64)])
            .with_rows(vec![vec![FieldValue::Int(1), FieldValue::Int(2)]]);

        let err = export_source(&mut source, &path, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExcelError::RowWidthMismatch { expected: 1, found: 2, .. }));
        assert!(!path.exists());
        Ok(())
    }
}
