//! Type definitions for source fields and output columns

use chrono::NaiveDateTime;
use std::fmt;

/// Declared or runtime type of a source field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Fixed-point decimal (carried as text to keep its precision)
    Decimal,
    DateTime,
    Date,
    String,
    Char,
    /// Unique identifier (GUID/UUID)
    Guid,
    Bytes,
    /// Any other driver type, by name
    Other(String),
}

impl FieldType {
    /// Signed or unsigned integer of any width
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            FieldType::I8
                | FieldType::I16
                | FieldType::I32
                | FieldType::I64
                | FieldType::U8
                | FieldType::U16
                | FieldType::U32
                | FieldType::U64
        )
    }

    /// Decimal, double or single precision
    pub fn is_float(&self) -> bool {
        matches!(self, FieldType::Decimal | FieldType::F64 | FieldType::F32)
    }

    pub fn is_date(&self) -> bool {
        matches!(self, FieldType::DateTime | FieldType::Date)
    }
}

/// One value of a source row
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Missing value (SQL NULL)
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Decimal in its textual form
    Decimal(String),
    DateTime(NaiveDateTime),
    Text(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Check if the value is the missing-value sentinel
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Runtime type of the value, used when classifying from a sample record
    ///
    /// `Null` carries no type information and maps to `FieldType::Other`.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Null => FieldType::Other("null".to_string()),
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::Int(_) => FieldType::I64,
            FieldValue::UInt(_) => FieldType::U64,
            FieldValue::Float(_) => FieldType::F64,
            FieldValue::Decimal(_) => FieldType::Decimal,
            FieldValue::DateTime(_) => FieldType::DateTime,
            FieldValue::Text(_) => FieldType::String,
            FieldValue::Bytes(_) => FieldType::Bytes,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::UInt(u) => write!(f, "{}", u),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Decimal(d) => f.write_str(d),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(u: u64) -> Self {
        FieldValue::UInt(u)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(dt: NaiveDateTime) -> Self {
        FieldValue::DateTime(dt)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Semantic type of an output column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    DateTime,
    Text,
}

/// One output column, fixed for the lifetime of a document
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Ordinal index (0-based)
    pub index: usize,
    /// Internal (source) name
    pub name: String,
    /// Header caption
    pub caption: String,
    pub column_type: ColumnType,
    /// Values go through the shared string table
    pub shared: bool,
    /// Spreadsheet column code (A, B, ..., AA, ...)
    pub code: String,
}

impl ColumnDescriptor {
    pub fn new(index: usize, name: &str, column_type: ColumnType, shared: bool) -> Self {
        ColumnDescriptor {
            index,
            name: name.to_string(),
            caption: name.to_string(),
            column_type,
            shared,
            code: column_code(index),
        }
    }

    /// Append the cell reference for a 1-based row number (e.g. "C7")
    pub fn push_reference(&self, buf: &mut Vec<u8>, row: u32) {
        let mut numbers = itoa::Buffer::new();
        buf.extend_from_slice(self.code.as_bytes());
        buf.extend_from_slice(numbers.format(row).as_bytes());
    }
}

/// Convert a 0-based column index to its spreadsheet code (0 -> A, 25 -> Z, 26 -> AA)
pub fn column_code(index: usize) -> String {
    let mut result = String::new();
    let mut col = index + 1;

    while col > 0 {
        col -= 1;
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        col /= 26;
    }

    result
}
