//! Streaming workbook writer
//!
//! A [`StreamingWorkbook`] is one document session: it writes a single-sheet package
//! row by row, keeping only the shared string table and one row of XML in memory.
//! Every fixed part is written when the session opens; closing appends the worksheet
//! trailer and the shared strings, then finishes the archive.

use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{debug, trace, warn};

use super::parts::{self, CellStyle, Part};
use super::shared_strings::SharedStrings;
use super::xml_writer::{escape_into, XmlWriter};
use super::StreamingZipWriter;
use crate::columns::ColumnSet;
use crate::error::{ExcelError, Result};
use crate::formatter::{format_value, SORTABLE_DATE_FORMAT};
use crate::options::{ExportMode, ExportOptions, NullCellPolicy, MAX_ROWS_PER_SHEET};
use crate::types::{ColumnDescriptor, ColumnType, FieldValue};

/// Widest sheet a workbook can hold (column XFD)
pub const MAX_COLUMNS: usize = 16_384;

const MAX_SHEET_NAME_CHARS: usize = 31;
const PROGRESS_INTERVAL: u32 = 100_000;

/// Lifecycle of a document session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing written yet, the sink does not exist
    Unopened,
    /// Fixed parts written, worksheet entry started
    Open,
    /// Header (if any) written, rows flowing
    Streaming,
    Closing,
    /// Package finished or abandoned; further writes are ignored
    Closed,
}

type SinkOpener<W> = Box<dyn FnOnce() -> io::Result<W>>;

/// Lets part writers stream straight into the current archive entry
pub(crate) struct EntryWriter<'a, W: Write + Seek> {
    zip: &'a mut StreamingZipWriter<W>,
}

impl<'a, W: Write + Seek> EntryWriter<'a, W> {
    pub(crate) fn new(zip: &'a mut StreamingZipWriter<W>) -> Self {
        EntryWriter { zip }
    }
}

impl<W: Write + Seek> Write for EntryWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.zip
            .write_data(buf)
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Start `name` in the archive and fill it through an [`XmlWriter`]
fn write_part<W, F>(zip: &mut StreamingZipWriter<W>, name: &str, body: F) -> Result<()>
where
    W: Write + Seek,
    F: FnOnce(&mut XmlWriter<EntryWriter<'_, W>>) -> Result<()>,
{
    zip.start_entry(name)
        .map_err(|e| ExcelError::zip_write(&format!("Failed to start {}", name), e))?;
    let mut writer = XmlWriter::new(EntryWriter::new(zip));
    body(&mut writer)?;
    writer.flush()
}

fn write_static_part<W: Write + Seek>(
    zip: &mut StreamingZipWriter<W>,
    name: &str,
    xml: &str,
) -> Result<()> {
    zip.start_entry(name)
        .map_err(|e| ExcelError::zip_write(&format!("Failed to start {}", name), e))?;
    zip.write_data(xml.as_bytes())
        .map_err(|e| ExcelError::zip_write(&format!("Failed to write {}", name), e))
}

/// Single-sheet spreadsheet package written as a stream
///
/// # Examples
///
/// ```no_run
/// use excelexport::{ColumnSet, ExportOptions, FieldType, FieldValue, StreamingWorkbook};
///
/// let columns = ColumnSet::from_fields(&[("Name", FieldType::String), ("Age", FieldType::I32)], true)?;
/// let mut workbook = StreamingWorkbook::create("people.xlsx", columns, ExportOptions::default())?;
/// workbook.write_row(&[FieldValue::from("Ann"), FieldValue::Int(30)])?;
/// workbook.close()?;
/// # Ok::<(), excelexport::ExcelError>(())
/// ```
pub struct StreamingWorkbook<W: Write + Seek> {
    columns: ColumnSet,
    options: ExportOptions,
    shared_strings: SharedStrings,
    state: SessionState,
    opener: Option<SinkOpener<W>>,
    zip: Option<StreamingZipWriter<W>>,
    /// Output file, removed when the document is abandoned
    path: Option<PathBuf>,
    finished: Option<W>,
    /// A write error reached the caller; dropping abandons instead of closing
    failed: bool,
    current_row: u32,
    data_rows: u64,
    skipped_rows: u64,
    xml_buffer: Vec<u8>,
}

impl StreamingWorkbook<BufWriter<File>> {
    /// Session writing to a file; the file is created when the session opens
    pub fn create<P: AsRef<Path>>(path: P, columns: ColumnSet, options: ExportOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let target = path.clone();
        let opener: SinkOpener<BufWriter<File>> =
            Box::new(move || Ok(BufWriter::with_capacity(64 * 1024, File::create(&target)?)));

        let mut workbook = Self::with_opener(opener, columns, options)?;
        workbook.path = Some(path);
        Ok(workbook)
    }
}

impl<W: Write + Seek + 'static> StreamingWorkbook<W> {
    /// Session writing to any seekable sink, returned by [`into_inner`](Self::into_inner)
    pub fn from_writer(writer: W, columns: ColumnSet, options: ExportOptions) -> Result<Self> {
        Self::with_opener(Box::new(move || Ok(writer)), columns, options)
    }
}

impl<W: Write + Seek> StreamingWorkbook<W> {
    fn with_opener(opener: SinkOpener<W>, columns: ColumnSet, options: ExportOptions) -> Result<Self> {
        if columns.is_empty() {
            return Err(ExcelError::EmptySchema);
        }
        if columns.len() > MAX_COLUMNS {
            return Err(ExcelError::InvalidFormat(format!(
                "{} columns exceed the sheet width of {}",
                columns.len(),
                MAX_COLUMNS
            )));
        }
        validate_sheet_name(&options.sheet_name)?;
        if options.max_rows_per_sheet == 0 || options.max_rows_per_sheet > MAX_ROWS_PER_SHEET {
            return Err(ExcelError::InvalidFormat(format!(
                "Row limit {} must be between 1 and {}",
                options.max_rows_per_sheet, MAX_ROWS_PER_SHEET
            )));
        }

        Ok(StreamingWorkbook {
            xml_buffer: Vec::with_capacity(columns.len() * 64),
            columns,
            options,
            shared_strings: SharedStrings::with_capacity(1024),
            state: SessionState::Unopened,
            opener: Some(opener),
            zip: None,
            path: None,
            finished: None,
            failed: false,
            current_row: 0,
            data_rows: 0,
            skipped_rows: 0,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Data rows written so far, header excluded
    pub fn rows_written(&self) -> u64 {
        self.data_rows
    }

    /// Rows ignored in live-connection mode
    pub fn skipped_rows(&self) -> u64 {
        self.skipped_rows
    }

    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    /// Create the sink and write every part known before the first row
    ///
    /// Called implicitly by the first [`write_row`](Self::write_row) or
    /// [`close`](Self::close). Opening an already opened session does nothing.
    pub fn open(&mut self) -> Result<()> {
        if self.state != SessionState::Unopened {
            return Ok(());
        }

        match self.write_fixed_parts() {
            Ok(()) => {
                self.state = SessionState::Open;
                debug!(
                    "Opened workbook '{}' with {} columns",
                    self.options.sheet_name,
                    self.columns.len()
                );
                Ok(())
            }
            Err(e) => {
                self.abort();
                Err(e)
            }
        }
    }

    fn write_fixed_parts(&mut self) -> Result<()> {
        let opener = self
            .opener
            .take()
            .ok_or_else(|| ExcelError::InvalidState("Package sink already consumed".to_string()))?;
        let sink = opener()?;
        let zip = StreamingZipWriter::from_writer_with_compression(sink, self.options.compression_level)
            .map_err(|e| ExcelError::zip_write("Failed to create ZIP writer", e))?;
        let zip = self.zip.insert(zip);

        let options = &self.options;
        let columns = &self.columns;
        let relative = options.use_relative_paths;
        let layout = parts::layout(options);
        let present = |part: &Part| layout.contains(part);

        write_part(zip, parts::CONTENT_TYPES, |w| parts::write_content_types(w, &layout))?;

        let package_rels: Vec<Part> = [parts::WORKBOOK, parts::CORE_PROPERTIES, parts::EXTENDED_PROPERTIES]
            .into_iter()
            .filter(present)
            .collect();
        write_part(zip, parts::PACKAGE_RELS, |w| {
            parts::write_relationships(w, &package_rels, "", relative)
        })?;

        if options.create_core_properties {
            let author = options.resolved_author();
            write_part(zip, parts::CORE_PROPERTIES.name, |w| {
                parts::write_core_properties(w, &author)
            })?;
        }
        if options.create_extended_properties {
            write_static_part(zip, parts::EXTENDED_PROPERTIES.name, parts::EXTENDED_PROPERTIES_XML)?;
        }

        write_part(zip, parts::WORKBOOK.name, |w| parts::write_workbook(w, options, columns))?;

        let workbook_rels: Vec<Part> = [
            parts::WORKSHEET,
            parts::THEME,
            parts::STYLES,
            parts::SHARED_STRINGS,
            parts::CONNECTIONS,
        ]
        .into_iter()
        .filter(present)
        .collect();
        write_part(zip, parts::WORKBOOK_RELS, |w| {
            parts::write_relationships(w, &workbook_rels, "xl", relative)
        })?;

        write_static_part(zip, parts::STYLES.name, parts::STYLES_XML)?;
        if options.create_theme {
            write_static_part(zip, parts::THEME.name, parts::THEME_XML)?;
        }

        if let ExportMode::LiveConnection {
            table_name,
            connection_string,
            sql_statement,
        } = &options.mode
        {
            write_part(zip, parts::CONNECTIONS.name, |w| {
                parts::write_connections(w, table_name, connection_string, sql_statement)
            })?;
            write_part(zip, parts::QUERY_TABLE.name, |w| {
                parts::write_query_table(w, table_name)
            })?;
            write_part(zip, parts::WORKSHEET_RELS, |w| {
                parts::write_relationships(w, &[parts::QUERY_TABLE], "xl/worksheets", relative)
            })?;
        }

        // Must stay the current entry until close
        write_part(zip, parts::WORKSHEET.name, |w| parts::write_worksheet_start(w, columns))
    }

    /// Append one row of values, in column order
    ///
    /// A row with the wrong number of values, or a row past the sheet limit, is
    /// rejected without touching the document; the session stays usable. Any I/O
    /// failure abandons the document. Rows written after close are ignored.
    ///
    /// Once a row has failed, dropping the session without an explicit
    /// [`close`](Self::close) abandons the document instead of finishing it.
    pub fn write_row(&mut self, values: &[FieldValue]) -> Result<()> {
        let result = self.append_row(values);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn append_row(&mut self, values: &[FieldValue]) -> Result<()> {
        match self.state {
            SessionState::Closing | SessionState::Closed => {
                debug!("Ignoring row written after close");
                return Ok(());
            }
            SessionState::Unopened => self.open()?,
            SessionState::Open | SessionState::Streaming => {}
        }

        if values.len() != self.columns.len() {
            return Err(ExcelError::RowWidthMismatch {
                row: self.next_row_number(),
                expected: self.columns.len(),
                found: values.len(),
            });
        }

        self.guarded(Self::begin_rows)?;

        if self.options.mode.is_live_connection() {
            if self.skipped_rows == 0 {
                warn!("Live-connection workbook carries no row data; ignoring rows");
            }
            self.skipped_rows += 1;
            return Ok(());
        }

        if self.current_row >= self.options.max_rows_per_sheet {
            return Err(ExcelError::RowLimitExceeded {
                limit: self.options.max_rows_per_sheet,
            });
        }

        self.guarded(|workbook| workbook.emit_row(values))?;
        self.data_rows += 1;

        if self.current_row % PROGRESS_INTERVAL == 0 {
            trace!("Wrote {} rows to '{}'", self.current_row, self.options.sheet_name);
        }
        Ok(())
    }

    /// Worksheet row the next data row lands on, counting a pending header
    fn next_row_number(&self) -> u32 {
        let header_pending = self.state == SessionState::Open
            && self.options.include_header
            && !self.options.mode.is_live_connection();
        self.current_row + 1 + u32::from(header_pending)
    }

    /// Run a write step, abandoning the document if it fails
    fn guarded<F>(&mut self, step: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        step(self).map_err(|e| {
            let row = self.current_row;
            self.abort();
            e.at_row(row, &self.options.sheet_name)
        })
    }

    /// Leave the Open state, writing the header row first if one is wanted
    fn begin_rows(&mut self) -> Result<()> {
        if self.state != SessionState::Open {
            return Ok(());
        }
        self.state = SessionState::Streaming;

        if !self.options.include_header || self.options.mode.is_live_connection() {
            return Ok(());
        }

        self.current_row += 1;
        let row = self.current_row;
        let mut buf = std::mem::take(&mut self.xml_buffer);
        buf.clear();
        open_row(&mut buf, row);
        for column in &self.columns {
            open_cell(&mut buf, column, row, CellStyle::Header);
            if self.options.shared_strings {
                let position = self.shared_strings.find_or_create(&column.caption);
                shared_value(&mut buf, position);
            } else {
                inline_value(&mut buf, &column.caption);
            }
        }
        buf.extend_from_slice(b"</row>");

        let result = self.stream(&buf);
        self.xml_buffer = buf;
        result
    }

    fn emit_row(&mut self, values: &[FieldValue]) -> Result<()> {
        self.current_row += 1;
        let row = self.current_row;

        let mut buf = std::mem::take(&mut self.xml_buffer);
        buf.clear();
        open_row(&mut buf, row);
        for (column, value) in self.columns.iter().zip(values) {
            encode_cell(&mut buf, &mut self.shared_strings, &self.options, column, value, row);
        }
        buf.extend_from_slice(b"</row>");

        let result = self.stream(&buf);
        self.xml_buffer = buf;
        result
    }

    fn stream(&mut self, data: &[u8]) -> Result<()> {
        let zip = self
            .zip
            .as_mut()
            .ok_or_else(|| ExcelError::InvalidState("Workbook is not open".to_string()))?;
        zip.write_data(data)
            .map_err(|e| ExcelError::zip_write("Failed to write worksheet data", e))
    }

    /// Finish the package
    ///
    /// Closing twice, or closing an abandoned session, does nothing. A session that
    /// was never opened is opened first, so the result is always a valid package.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            SessionState::Closing | SessionState::Closed => return Ok(()),
            SessionState::Unopened => self.open()?,
            SessionState::Open | SessionState::Streaming => {}
        }

        self.guarded(Self::begin_rows)?;
        self.state = SessionState::Closing;

        match self.finish_package() {
            Ok(()) => {
                self.state = SessionState::Closed;
                debug!(
                    "Closed workbook '{}': {} rows, {} shared strings",
                    self.options.sheet_name,
                    self.data_rows,
                    self.shared_strings.unique_count()
                );
                Ok(())
            }
            Err(e) => {
                self.abort();
                Err(e)
            }
        }
    }

    fn finish_package(&mut self) -> Result<()> {
        let mut zip = self
            .zip
            .take()
            .ok_or_else(|| ExcelError::InvalidState("Workbook is not open".to_string()))?;

        zip.write_data(parts::WORKSHEET_END.as_bytes())
            .map_err(|e| ExcelError::zip_write("Failed to write worksheet trailer", e))?;

        if !self.options.mode.is_live_connection() {
            let strings = &self.shared_strings;
            write_part(&mut zip, parts::SHARED_STRINGS.name, |w| strings.write_xml(w))?;
        }

        let mut sink = zip
            .finish()
            .map_err(|e| ExcelError::zip_write("Failed to finish ZIP", e))?;
        sink.flush()?;

        if self.path.is_none() {
            self.finished = Some(sink);
        }
        Ok(())
    }

    /// Abandon the document, releasing the sink and removing a partial output file
    ///
    /// Does nothing once the package has been finished.
    pub fn abort(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        let started = self.opener.is_none();
        self.state = SessionState::Closed;
        self.opener = None;
        self.zip = None;

        if let (true, Some(path)) = (started, &self.path) {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove partial output {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Close the session and hand back the sink given to [`from_writer`](Self::from_writer)
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        self.finished
            .take()
            .ok_or_else(|| ExcelError::InvalidState("Package has no in-memory sink".to_string()))
    }
}

impl<W: Write + Seek> Drop for StreamingWorkbook<W> {
    fn drop(&mut self) {
        if !matches!(self.state, SessionState::Open | SessionState::Streaming) {
            return;
        }
        if self.failed {
            warn!(
                "Abandoning workbook '{}' dropped after a failed write",
                self.options.sheet_name
            );
            self.abort();
        } else if let Err(e) = self.close() {
            warn!("Failed to close workbook '{}' on drop: {}", self.options.sheet_name, e);
        }
    }
}

fn validate_sheet_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().count() > MAX_SHEET_NAME_CHARS {
        return Err(ExcelError::InvalidFormat(format!(
            "Sheet name '{}' must be 1 to {} characters",
            name, MAX_SHEET_NAME_CHARS
        )));
    }
    if name.contains(['[', ']', ':', '*', '?', '/', '\\']) {
        return Err(ExcelError::InvalidFormat(format!(
            "Sheet name '{}' contains a character not allowed in sheet names",
            name
        )));
    }
    Ok(())
}

fn open_row(buf: &mut Vec<u8>, row: u32) {
    let mut numbers = itoa::Buffer::new();
    buf.extend_from_slice(b"<row r=\"");
    buf.extend_from_slice(numbers.format(row).as_bytes());
    buf.extend_from_slice(b"\">");
}

/// `<c r=".." s=".."` without the closing `>`
fn open_cell(buf: &mut Vec<u8>, column: &ColumnDescriptor, row: u32, style: CellStyle) {
    let mut numbers = itoa::Buffer::new();
    buf.extend_from_slice(b"<c r=\"");
    column.push_reference(buf, row);
    buf.extend_from_slice(b"\"");
    if style != CellStyle::Default {
        buf.extend_from_slice(b" s=\"");
        buf.extend_from_slice(numbers.format(style.index()).as_bytes());
        buf.extend_from_slice(b"\"");
    }
}

fn shared_value(buf: &mut Vec<u8>, position: u32) {
    let mut numbers = itoa::Buffer::new();
    buf.extend_from_slice(b" t=\"s\"><v>");
    buf.extend_from_slice(numbers.format(position).as_bytes());
    buf.extend_from_slice(b"</v></c>");
}

fn inline_value(buf: &mut Vec<u8>, text: &str) {
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        buf.extend_from_slice(b" t=\"inlineStr\"><is><t xml:space=\"preserve\">");
    } else {
        buf.extend_from_slice(b" t=\"inlineStr\"><is><t>");
    }
    escape_into(buf, text);
    buf.extend_from_slice(b"</t></is></c>");
}

fn typed_value(buf: &mut Vec<u8>, cell_type: &[u8], text: &str) {
    buf.extend_from_slice(b" t=\"");
    buf.extend_from_slice(cell_type);
    buf.extend_from_slice(b"\"><v>");
    escape_into(buf, text);
    buf.extend_from_slice(b"</v></c>");
}

fn text_cell(
    buf: &mut Vec<u8>,
    strings: &mut SharedStrings,
    shared: bool,
    column: &ColumnDescriptor,
    row: u32,
    text: &str,
    style: CellStyle,
) {
    open_cell(buf, column, row, style);
    if shared {
        shared_value(buf, strings.find_or_create(text));
    } else {
        inline_value(buf, text);
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        t if t.eq_ignore_ascii_case("true") || t == "1" => Some(true),
        t if t.eq_ignore_ascii_case("false") || t == "0" => Some(false),
        _ => None,
    }
}

fn is_number(text: &str) -> bool {
    text.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Append one cell for `value` according to its column's classification
fn encode_cell(
    buf: &mut Vec<u8>,
    strings: &mut SharedStrings,
    options: &ExportOptions,
    column: &ColumnDescriptor,
    value: &FieldValue,
    row: u32,
) {
    let dates_as_text = options.dates_as_text;
    let textual = column.column_type == ColumnType::Text
        || (column.column_type == ColumnType::DateTime && dates_as_text);
    let shared = options.shared_strings && column.shared;

    if value.is_null() {
        match options.null_cells {
            NullCellPolicy::Skip => {}
            NullCellPolicy::EmptyCell if textual => {
                text_cell(buf, strings, shared, column, row, "", style_of(column.column_type))
            }
            NullCellPolicy::EmptyCell => {
                open_cell(buf, column, row, style_of(column.column_type));
                buf.extend_from_slice(b"/>");
            }
        }
        return;
    }

    let text = format_value(value, column, dates_as_text);
    let style = style_of(column.column_type);

    match column.column_type {
        ColumnType::Integer | ColumnType::Float if is_number(&text) => {
            open_cell(buf, column, row, style);
            typed_value(buf, b"n", &text);
        }
        ColumnType::Boolean => match parse_bool(&text) {
            Some(flag) => {
                open_cell(buf, column, row, style);
                typed_value(buf, b"b", if flag { "1" } else { "0" });
            }
            None => text_cell(buf, strings, options.shared_strings, column, row, &text, CellStyle::Default),
        },
        ColumnType::DateTime
            if !dates_as_text && NaiveDateTime::parse_from_str(&text, SORTABLE_DATE_FORMAT).is_ok() =>
        {
            open_cell(buf, column, row, style);
            typed_value(buf, b"d", &text);
        }
        ColumnType::Text | ColumnType::DateTime => text_cell(buf, strings, shared, column, row, &text, style),
        // Unparseable numbers keep their text
        ColumnType::Integer | ColumnType::Float => {
            text_cell(buf, strings, options.shared_strings, column, row, &text, CellStyle::Default)
        }
    }
}

fn style_of(column_type: ColumnType) -> CellStyle {
    match column_type {
        ColumnType::Integer => CellStyle::Integer,
        ColumnType::Float => CellStyle::Float,
        ColumnType::DateTime => CellStyle::Date,
        ColumnType::Text => CellStyle::Text,
        ColumnType::Boolean => CellStyle::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use std::io::Cursor;

    fn people() -> ColumnSet {
        ColumnSet::from_fields(
            &[
                ("Name", FieldType::String),
                ("Age", FieldType::I32),
                ("Joined", FieldType::DateTime),
            ],
            true,
        )
        .unwrap()
    }

    fn encode(column: &ColumnDescriptor, value: FieldValue, options: &ExportOptions) -> String {
        let mut buf = Vec::new();
        let mut strings = SharedStrings::new();
        encode_cell(&mut buf, &mut strings, options, column, &value, 2);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_encode_cells() {
        let options = ExportOptions::default();
        let columns = people();
        let [name, age, joined] = [0, 1, 2].map(|i| columns.get(i).unwrap().clone());

        assert_eq!(encode(&name, "Ann".into(), &options), r#"<c r="A2" s="4" t="s"><v>0</v></c>"#);
        assert_eq!(encode(&age, FieldValue::Int(30), &options), r#"<c r="B2" s="1" t="n"><v>30</v></c>"#);
        assert_eq!(
            encode(&joined, "2024-01-15T00:00:00".into(), &options),
            r#"<c r="C2" s="3" t="s"><v>0</v></c>"#
        );
        assert_eq!(
            encode(&age, "n/a".into(), &options.clone().with_shared_strings(false)),
            r#"<c r="B2" t="inlineStr"><is><t>n/a</t></is></c>"#
        );
    }

    #[test]
    fn test_encode_native_dates_and_booleans() {
        let options = ExportOptions::default().with_dates_as_text(false);
        let columns = ColumnSet::from_fields(&[("When", FieldType::DateTime), ("Ok", FieldType::Bool)], false)
            .unwrap();

        assert_eq!(
            encode(columns.get(0).unwrap(), "2024-01-15 08:30:00".into(), &options),
            r#"<c r="A2" s="3" t="d"><v>2024-01-15T08:30:00</v></c>"#
        );
        assert_eq!(
            encode(columns.get(1).unwrap(), FieldValue::Bool(true), &options),
            r#"<c r="B2" t="b"><v>1</v></c>"#
        );
    }

    #[test]
    fn test_encode_nulls() {
        let columns = people();
        let options = ExportOptions::default();
        assert_eq!(
            encode(columns.get(1).unwrap(), FieldValue::Null, &options),
            r#"<c r="B2" s="1"/>"#
        );
        assert_eq!(
            encode(columns.get(0).unwrap(), FieldValue::Null, &options.clone().with_null_cells(NullCellPolicy::Skip)),
            ""
        );
    }

    #[test]
    fn test_sheet_name_validation() {
        assert!(validate_sheet_name("sheet1").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name("a/b").is_err());
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
    }

    #[test]
    fn test_too_many_columns_rejected() {
        let names: Vec<String> = (0..=MAX_COLUMNS).map(|i| format!("c{}", i)).collect();
        let fields: Vec<(&str, FieldType)> = names.iter().map(|n| (n.as_str(), FieldType::I32)).collect();
        let columns = ColumnSet::from_fields(&fields, true).unwrap();
        assert_eq!(columns.len(), 16_385);

        let result = StreamingWorkbook::from_writer(Cursor::new(Vec::new()), columns, ExportOptions::default());
        assert!(matches!(result, Err(ExcelError::InvalidFormat(_))));
    }

    #[test]
    fn test_row_limit_validated() {
        let mut options = ExportOptions::default();
        options.max_rows_per_sheet = 0;
        let result = StreamingWorkbook::from_writer(Cursor::new(Vec::new()), people(), options.clone());
        assert!(matches!(result, Err(ExcelError::InvalidFormat(_))));

        options.max_rows_per_sheet = MAX_ROWS_PER_SHEET + 1;
        let result = StreamingWorkbook::from_writer(Cursor::new(Vec::new()), people(), options);
        assert!(matches!(result, Err(ExcelError::InvalidFormat(_))));
    }

    #[test]
    fn test_width_mismatch_reports_sheet_row() -> Result<()> {
        let mut workbook = StreamingWorkbook::from_writer(Cursor::new(Vec::new()), people(), ExportOptions::default())?;
        // Header still pending, so the first data row would be row 2
        let err = workbook.write_row(&[FieldValue::Int(1)]).unwrap_err();
        assert!(matches!(err, ExcelError::RowWidthMismatch { row: 2, .. }));

        workbook.write_row(&["Ann".into(), FieldValue::Int(30), FieldValue::Null])?;
        let err = workbook.write_row(&[FieldValue::Int(1)]).unwrap_err();
        assert!(matches!(err, ExcelError::RowWidthMismatch { row: 3, .. }));

        let options = ExportOptions::default().with_header(false);
        let mut workbook = StreamingWorkbook::from_writer(Cursor::new(Vec::new()), people(), options)?;
        let err = workbook.write_row(&[FieldValue::Int(1)]).unwrap_err();
        assert!(matches!(err, ExcelError::RowWidthMismatch { row: 1, .. }));
        workbook.close()
    }

    #[test]
    fn test_session_lifecycle() -> Result<()> {
        let mut workbook = StreamingWorkbook::from_writer(Cursor::new(Vec::new()), people(), ExportOptions::default())?;
        assert_eq!(workbook.state(), SessionState::Unopened);

        workbook.write_row(&["Ann".into(), FieldValue::Int(30), "2024-01-15T00:00:00".into()])?;
        assert_eq!(workbook.state(), SessionState::Streaming);

        let err = workbook.write_row(&[FieldValue::from("Bob")]).unwrap_err();
        assert!(matches!(err, ExcelError::RowWidthMismatch { expected: 3, found: 1, .. }));
        assert_eq!(workbook.state(), SessionState::Streaming);

        workbook.close()?;
        workbook.close()?;
        workbook.write_row(&["late".into(), FieldValue::Null, FieldValue::Null])?;
        assert_eq!(workbook.state(), SessionState::Closed);
        assert_eq!(workbook.rows_written(), 1);
        // Three captions plus Ann and the date
        assert_eq!(workbook.shared_strings().count(), 5);

        let bytes = workbook.into_inner()?.into_inner();
        assert_eq!(&bytes[..2], b"PK");
        Ok(())
    }

    #[test]
    fn test_row_limit_counts_header() -> Result<()> {
        let options = ExportOptions::default().with_max_rows(2);
        let mut workbook = StreamingWorkbook::from_writer(Cursor::new(Vec::new()), people(), options)?;
        let row = ["Ann".into(), FieldValue::Int(30), FieldValue::Null];

        workbook.write_row(&row)?;
        let err = workbook.write_row(&row).unwrap_err();
        assert!(matches!(err, ExcelError::RowLimitExceeded { limit: 2 }));
        assert_eq!(workbook.rows_written(), 1);
        workbook.close()
    }

    #[test]
    fn test_live_connection_ignores_rows() -> Result<()> {
        let options = ExportOptions::default().with_live_connection("orders", "DSN=sales", "SELECT 1");
        let mut workbook = StreamingWorkbook::from_writer(Cursor::new(Vec::new()), people(), options)?;
        workbook.write_row(&["Ann".into(), FieldValue::Int(30), FieldValue::Null])?;
        assert_eq!(workbook.rows_written(), 0);
        assert_eq!(workbook.skipped_rows(), 1);
        assert!(workbook.shared_strings().is_empty());
        workbook.close()
    }
}
