//! Export configuration

/// Maximum number of rows a single worksheet can hold
pub const MAX_ROWS_PER_SHEET: u32 = 1_048_576;

/// Longest sheet name derived from a file name
const MAX_SHEET_NAME_LENGTH: usize = 30;

/// What a null source value turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NullCellPolicy {
    /// Write an empty cell at the null's position
    #[default]
    EmptyCell,
    /// Write no cell element at all
    Skip,
}

/// Generation mode, selected once per document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExportMode {
    /// Literal row data
    #[default]
    Data,
    /// No row data; the workbook carries a database connection and query that the
    /// spreadsheet application runs itself on open
    LiveConnection {
        table_name: String,
        connection_string: String,
        sql_statement: String,
    },
}

impl ExportMode {
    pub fn is_live_connection(&self) -> bool {
        matches!(self, ExportMode::LiveConnection { .. })
    }
}

/// Options for one exported document
///
/// # Examples
///
/// ```
/// use excelexport::ExportOptions;
///
/// let options = ExportOptions::new()
///     .with_sheet_name("orders")
///     .with_core_properties(true)
///     .with_fix_content_types(true);
/// assert!(options.needs_post_processing());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExportOptions {
    pub include_header: bool,
    /// Render date/time values as shared text instead of native date cells
    pub dates_as_text: bool,
    pub sheet_name: String,
    pub create_extended_properties: bool,
    pub create_core_properties: bool,
    pub create_theme: bool,
    /// Relationship targets relative to their owning part instead of absolute package paths
    pub use_relative_paths: bool,
    pub fix_content_types: bool,
    pub normalize_xml_declarations: bool,
    pub strip_namespace_aliases: bool,
    pub max_rows_per_sheet: u32,
    pub null_cells: NullCellPolicy,
    /// Deduplicate text through the shared string table (otherwise inline strings)
    pub shared_strings: bool,
    /// Deflate level 0-9
    pub compression_level: u32,
    /// Creator recorded in the core properties
    pub author: Option<String>,
    /// Pre-computed `<workbookProtection .../>` element embedded verbatim
    pub workbook_protection: Option<String>,
    pub mode: ExportMode,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            include_header: true,
            dates_as_text: true,
            sheet_name: "sheet1".to_string(),
            create_extended_properties: false,
            create_core_properties: false,
            create_theme: false,
            use_relative_paths: false,
            fix_content_types: false,
            normalize_xml_declarations: false,
            strip_namespace_aliases: false,
            max_rows_per_sheet: MAX_ROWS_PER_SHEET,
            null_cells: NullCellPolicy::EmptyCell,
            shared_strings: true,
            compression_level: 6,
            author: None,
            workbook_protection: None,
            mode: ExportMode::Data,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    pub fn with_dates_as_text(mut self, enabled: bool) -> Self {
        self.dates_as_text = enabled;
        self
    }

    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = name.to_string();
        self
    }

    pub fn with_extended_properties(mut self, enabled: bool) -> Self {
        self.create_extended_properties = enabled;
        self
    }

    pub fn with_core_properties(mut self, enabled: bool) -> Self {
        self.create_core_properties = enabled;
        self
    }

    pub fn with_theme(mut self, enabled: bool) -> Self {
        self.create_theme = enabled;
        self
    }

    pub fn with_relative_paths(mut self, enabled: bool) -> Self {
        self.use_relative_paths = enabled;
        self
    }

    pub fn with_fix_content_types(mut self, enabled: bool) -> Self {
        self.fix_content_types = enabled;
        self
    }

    pub fn with_normalized_declarations(mut self, enabled: bool) -> Self {
        self.normalize_xml_declarations = enabled;
        self
    }

    pub fn with_stripped_namespace_aliases(mut self, enabled: bool) -> Self {
        self.strip_namespace_aliases = enabled;
        self
    }

    /// Cap the worksheet row count (header row included), between 1 and 1 048 576
    pub fn with_max_rows(mut self, rows: u32) -> Self {
        self.max_rows_per_sheet = rows.clamp(1, MAX_ROWS_PER_SHEET);
        self
    }

    pub fn with_null_cells(mut self, policy: NullCellPolicy) -> Self {
        self.null_cells = policy;
        self
    }

    pub fn with_shared_strings(mut self, enabled: bool) -> Self {
        self.shared_strings = enabled;
        self
    }

    /// Set the deflate compression level
    ///
    /// * `0` - No compression (fastest, largest)
    /// * `6` - Balanced (default)
    /// * `9` - Maximum compression (slowest)
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn with_workbook_protection(mut self, element: &str) -> Self {
        self.workbook_protection = Some(element.to_string());
        self
    }

    /// Switch to live-connection mode: the workbook re-runs `sql_statement` on open
    pub fn with_live_connection(
        mut self,
        table_name: &str,
        connection_string: &str,
        sql_statement: &str,
    ) -> Self {
        self.mode = ExportMode::LiveConnection {
            table_name: table_name.to_string(),
            connection_string: connection_string.to_string(),
            sql_statement: sql_statement.to_string(),
        };
        self
    }

    /// Any of the package fix-ups is enabled
    pub fn needs_post_processing(&self) -> bool {
        self.fix_content_types || self.strip_namespace_aliases || self.normalize_xml_declarations
    }

    /// Name written as document creator
    pub(crate) fn resolved_author(&self) -> String {
        self.author
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "excelexport".to_string())
    }
}

/// Derive a sheet name from a source file stem
///
/// Spaces are removed, the name is cut to 30 characters and `-` becomes `_`.
pub fn sheet_name_from_file(stem: &str) -> String {
    stem.chars()
        .filter(|c| *c != ' ')
        .take(MAX_SHEET_NAME_LENGTH)
        .map(|c| if c == '-' { '_' } else { c })
        .collect()
}

/// Clean a text value before export
///
/// Control characters are dropped and runs of line breaks collapse into a single `\n`.
pub fn sanitize_text(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .map(|line| line.chars().filter(|c| !c.is_control()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExportOptions::default();
        assert!(options.include_header);
        assert!(options.dates_as_text);
        assert_eq!(options.sheet_name, "sheet1");
        assert_eq!(options.max_rows_per_sheet, 1_048_576);
        assert_eq!(options.null_cells, NullCellPolicy::EmptyCell);
        assert_eq!(options.mode, ExportMode::Data);
        assert!(!options.needs_post_processing());
    }

    #[test]
    fn test_builder() {
        let options = ExportOptions::new()
            .with_max_rows(5_000_000)
            .with_compression_level(12)
            .with_live_connection("orders", "DSN=sales", "SELECT * FROM orders");
        assert_eq!(options.max_rows_per_sheet, MAX_ROWS_PER_SHEET);
        assert_eq!(options.compression_level, 9);
        assert!(options.mode.is_live_connection());
    }

    #[test]
    fn test_sheet_name_from_file() {
        assert_eq!(sheet_name_from_file("monthly sales-2024"), "monthlysales_2024");
        let long = "a".repeat(40);
        assert_eq!(sheet_name_from_file(&long).len(), 30);
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("line1\r\n\r\nline2\u{7}"), "line1\nline2");
        assert_eq!(sanitize_text("plain"), "plain");
    }

    #[test]
    fn test_author_override() {
        let options = ExportOptions::new().with_author("reporting");
        assert_eq!(options.resolved_author(), "reporting");
    }
}
