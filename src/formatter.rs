//! Canonical string forms of cell values
//!
//! Formatting never fails: a value that does not parse as its column's type is
//! passed through in its default string form.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::types::{ColumnDescriptor, ColumnType, FieldValue};

/// Date format used when dates are written as text
pub const TEXT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sortable date format used for native date cells
pub const SORTABLE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const PARSE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Format a raw value for the given column
///
/// # Examples
///
/// ```
/// use excelexport::formatter::format_value;
/// use excelexport::{ColumnDescriptor, ColumnType, FieldValue};
///
/// let column = ColumnDescriptor::new(0, "Price", ColumnType::Float, false);
/// let text = format_value(&FieldValue::Decimal("3.14000".into()), &column, true);
/// assert_eq!(text, "3.14");
/// ```
pub fn format_value<'a>(value: &'a FieldValue, column: &ColumnDescriptor, dates_as_text: bool) -> Cow<'a, str> {
    match (value, column.column_type) {
        (FieldValue::Null, _) => Cow::Borrowed(""),
        (_, ColumnType::Float) => format_float(value),
        (_, ColumnType::DateTime) => format_date(value, dates_as_text),
        _ => default_string(value),
    }
}

fn default_string(value: &FieldValue) -> Cow<'_, str> {
    match value {
        FieldValue::Text(s) | FieldValue::Decimal(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

fn format_float(value: &FieldValue) -> Cow<'_, str> {
    let parsed = match value {
        FieldValue::Float(v) => Some(*v),
        FieldValue::Int(i) => Some(*i as f64),
        FieldValue::UInt(u) => Some(*u as f64),
        other => default_string(other).trim().parse::<f64>().ok(),
    };

    match parsed {
        Some(v) if v.is_finite() => Cow::Owned(v.to_string()),
        _ => default_string(value),
    }
}

fn format_date(value: &FieldValue, dates_as_text: bool) -> Cow<'_, str> {
    let parsed = match value {
        FieldValue::DateTime(dt) => Some(*dt),
        FieldValue::Text(s) => parse_date(s),
        _ => None,
    };

    match parsed {
        Some(dt) => {
            let format = if dates_as_text {
                TEXT_DATE_FORMAT
            } else {
                SORTABLE_DATE_FORMAT
            };
            Cow::Owned(dt.format(format).to_string())
        }
        None => default_string(value),
    }
}

/// Parse the date/time text forms a source commonly produces
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    PARSE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(column_type: ColumnType) -> ColumnDescriptor {
        ColumnDescriptor::new(0, "c", column_type, false)
    }

    #[test]
    fn test_float_reformat() {
        let col = column(ColumnType::Float);
        assert_eq!(format_value(&FieldValue::from("3.14000"), &col, true), "3.14");
        assert_eq!(format_value(&FieldValue::Decimal("100.50".into()), &col, true), "100.5");
        assert_eq!(format_value(&FieldValue::Float(30.0), &col, true), "30");
        assert_eq!(format_value(&FieldValue::Int(-2), &col, true), "-2");
    }

    #[test]
    fn test_float_passthrough() {
        let col = column(ColumnType::Float);
        assert_eq!(format_value(&FieldValue::from("n/a"), &col, true), "n/a");
        assert_eq!(format_value(&FieldValue::Float(f64::NAN), &col, true), "NaN");
        // Locale separators are not understood
        assert_eq!(format_value(&FieldValue::from("3,5"), &col, true), "3,5");
    }

    #[test]
    fn test_dates() {
        let col = column(ColumnType::DateTime);
        let value = FieldValue::from("2024-01-15T00:00:00");
        assert_eq!(format_value(&value, &col, true), "2024-01-15 00:00:00");
        assert_eq!(format_value(&value, &col, false), "2024-01-15T00:00:00");

        let value = FieldValue::from("2023-06-01");
        assert_eq!(format_value(&value, &col, true), "2023-06-01 00:00:00");

        let value = FieldValue::from("2023-06-01T10:30:00+02:00");
        assert_eq!(format_value(&value, &col, false), "2023-06-01T08:30:00");

        let value = FieldValue::from("yesterday");
        assert_eq!(format_value(&value, &col, true), "yesterday");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(format_value(&FieldValue::Null, &column(ColumnType::Float), true), "");
        assert_eq!(format_value(&FieldValue::Int(41), &column(ColumnType::Integer), true), "41");
        assert_eq!(format_value(&FieldValue::Bool(true), &column(ColumnType::Boolean), true), "true");
        assert_eq!(format_value(&FieldValue::from("Ann"), &column(ColumnType::Text), true), "Ann");
    }
}
