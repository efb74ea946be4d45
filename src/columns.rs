//! Column classification
//!
//! Turns a source schema, or the first record of a streaming source, into the
//! ordered set of column descriptors a document is written with.

use crate::error::{ExcelError, Result};
use crate::types::{ColumnDescriptor, ColumnType, FieldType, FieldValue};

/// Ordered, non-empty set of column descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSet {
    /// Classify a fixed list of `(name, declared type)` pairs
    ///
    /// # Examples
    ///
    /// ```
    /// use excelexport::{ColumnSet, ColumnType, FieldType};
    ///
    /// let columns = ColumnSet::from_fields(
    ///     &[("Name", FieldType::String), ("Age", FieldType::I32)],
    ///     true,
    /// )?;
    /// assert_eq!(columns.get(1).unwrap().column_type, ColumnType::Integer);
    /// # Ok::<(), excelexport::ExcelError>(())
    /// ```
    pub fn from_fields<S: AsRef<str>>(fields: &[(S, FieldType)], dates_as_text: bool) -> Result<Self> {
        let columns = fields
            .iter()
            .enumerate()
            .map(|(index, (name, field_type))| classify(index, name.as_ref(), field_type, dates_as_text))
            .collect();
        Self::checked(columns)
    }

    /// Classify from a sample record using each value's runtime type
    pub fn from_record<S: AsRef<str>>(record: &[(S, FieldValue)], dates_as_text: bool) -> Result<Self> {
        let columns = record
            .iter()
            .enumerate()
            .map(|(index, (name, value))| {
                classify(index, name.as_ref(), &value.field_type(), dates_as_text)
            })
            .collect();
        Self::checked(columns)
    }

    fn checked(columns: Vec<ColumnDescriptor>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ExcelError::EmptySchema);
        }
        Ok(ColumnSet { columns })
    }

    /// Replace header captions, in column order
    ///
    /// Extra captions are ignored; columns without one keep their name.
    pub fn with_captions<I, S>(mut self, captions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (column, caption) in self.columns.iter_mut().zip(captions) {
            column.caption = caption.as_ref().to_string();
        }
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false: an empty set cannot be built
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDescriptor> {
        self.columns.iter()
    }

    /// Code of the last column (e.g. "C" for three columns)
    pub fn last_code(&self) -> &str {
        self.columns.last().map_or("A", |c| c.code.as_str())
    }
}

impl<'a> IntoIterator for &'a ColumnSet {
    type Item = &'a ColumnDescriptor;
    type IntoIter = std::slice::Iter<'a, ColumnDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// Classify one field; the first matching rule wins
pub fn classify(index: usize, name: &str, field_type: &FieldType, dates_as_text: bool) -> ColumnDescriptor {
    let (column_type, shared) = match field_type {
        FieldType::Bool => (ColumnType::Boolean, false),
        t if t.is_float() => (ColumnType::Float, false),
        t if t.is_date() => (ColumnType::DateTime, dates_as_text),
        t if t.is_integer() => (ColumnType::Integer, false),
        FieldType::String | FieldType::Char | FieldType::Guid => (ColumnType::Text, true),
        _ => (ColumnType::Text, true),
    };
    ColumnDescriptor::new(index, name, column_type, shared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade() {
        let cases = [
            (FieldType::Bool, ColumnType::Boolean, false),
            (FieldType::Decimal, ColumnType::Float, false),
            (FieldType::F32, ColumnType::Float, false),
            (FieldType::Date, ColumnType::DateTime, true),
            (FieldType::U8, ColumnType::Integer, false),
            (FieldType::I64, ColumnType::Integer, false),
            (FieldType::Guid, ColumnType::Text, true),
            (FieldType::Char, ColumnType::Text, true),
            (FieldType::Bytes, ColumnType::Text, true),
            (FieldType::Other("xml".into()), ColumnType::Text, true),
        ];

        for (field_type, expected, shared) in cases {
            let column = classify(0, "c", &field_type, true);
            assert_eq!(column.column_type, expected, "{:?}", field_type);
            assert_eq!(column.shared, shared, "{:?}", field_type);
        }
    }

    #[test]
    fn test_dates_native() {
        let column = classify(0, "Joined", &FieldType::DateTime, false);
        assert_eq!(column.column_type, ColumnType::DateTime);
        assert!(!column.shared);
    }

    #[test]
    fn test_empty_schema() {
        let fields: [(&str, FieldType); 0] = [];
        assert!(matches!(
            ColumnSet::from_fields(&fields, true),
            Err(ExcelError::EmptySchema)
        ));
    }

    #[test]
    fn test_from_record() -> Result<()> {
        let record = [
            ("Name", FieldValue::from("Ann")),
            ("Age", FieldValue::Int(30)),
            ("Note", FieldValue::Null),
        ];
        let columns = ColumnSet::from_record(&record, true)?;
        assert_eq!(columns.len(), 3);
        assert_eq!(columns.get(1).map(|c| c.column_type), Some(ColumnType::Integer));
        assert_eq!(columns.get(2).map(|c| c.column_type), Some(ColumnType::Text));
        assert_eq!(columns.last_code(), "C");
        Ok(())
    }

    #[test]
    fn test_captions() -> Result<()> {
        let columns = ColumnSet::from_fields(&[("cust_id", FieldType::I32), ("nm", FieldType::String)], true)?
            .with_captions(["Customer"]);
        assert_eq!(columns.get(0).map(|c| c.caption.as_str()), Some("Customer"));
        assert_eq!(columns.get(1).map(|c| c.caption.as_str()), Some("nm"));
        Ok(())
    }
}
