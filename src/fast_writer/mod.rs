//! Streaming spreadsheet package writer
//!
//! Parts are generated straight into the archive through s-zip; nothing but the
//! shared string table and the row being built is held in memory.

pub mod parts;
pub mod shared_strings;
pub mod workbook;
pub mod xml_writer;

pub use s_zip::{StreamingZipReader, StreamingZipWriter};
pub use shared_strings::SharedStrings;
pub use workbook::{SessionState, StreamingWorkbook, MAX_COLUMNS};
pub use xml_writer::XmlWriter;
