//! Post-processing of a finished package
//!
//! Some consumers are strict about details the streaming writer cannot always settle in
//! one pass. [`PackageFixer`] reopens the archive, rewrites the few small parts those
//! details live in, and swaps the result in place of the original file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{ExcelError, Result};
use crate::fast_writer::parts::{self, Part, ALL_PARTS};
use crate::fast_writer::workbook::EntryWriter;
use crate::fast_writer::xml_writer::{XmlWriter, XML_DECLARATION};
use crate::fast_writer::{StreamingZipReader, StreamingZipWriter};
use crate::options::ExportOptions;

/// Parts whose `x:` namespace alias is stripped
pub const ALIAS_TARGETS: [&str; 4] = [
    "xl/sharedStrings.xml",
    "xl/styles.xml",
    "xl/workbook.xml",
    "xl/worksheets/sheet1.xml",
];

/// Parts whose XML declaration is forced to the standalone form
pub const DECLARATION_TARGETS: [&str; 2] = [parts::WORKBOOK_RELS, parts::PACKAGE_RELS];

const ALIAS: &str = "x";

/// Rewrites targeted entries of a finished package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageFixer {
    fix_content_types: bool,
    strip_namespace_aliases: bool,
    normalize_declarations: bool,
    compression_level: u32,
}

impl PackageFixer {
    pub fn new(options: &ExportOptions) -> Self {
        PackageFixer {
            fix_content_types: options.fix_content_types,
            strip_namespace_aliases: options.strip_namespace_aliases,
            normalize_declarations: options.normalize_xml_declarations,
            compression_level: options.compression_level,
        }
    }

    /// At least one fix-up is switched on
    pub fn is_enabled(&self) -> bool {
        self.fix_content_types || self.strip_namespace_aliases || self.normalize_declarations
    }

    /// Rewrite the package at `path` in place, returning how many entries changed
    ///
    /// Entries no fix-up targets are streamed across unchanged and in their original
    /// order; only targeted entries are held in memory. If anything fails the original
    /// file is left as it was.
    pub fn apply<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let path = path.as_ref();
        let staging = staging_path(path);

        match self.rewrite_into(path, &staging) {
            Ok(changed) => {
                fs::rename(&staging, path)?;
                debug!("Post-processed {}: {} entries rewritten", path.display(), changed);
                Ok(changed)
            }
            Err(e) => {
                let _ = fs::remove_file(&staging);
                Err(e)
            }
        }
    }

    fn rewrite_into(&self, source: &Path, staging: &Path) -> Result<usize> {
        let mut reader = StreamingZipReader::open(source)
            .map_err(|e| ExcelError::zip_read("Failed to open package", e))?;
        let names: Vec<String> = reader.entries().iter().map(|e| e.name.clone()).collect();

        let present: Vec<Part> = ALL_PARTS
            .into_iter()
            .filter(|part| names.iter().any(|name| name == part.name))
            .collect();

        let sink = BufWriter::new(File::create(staging)?);
        let mut zip = StreamingZipWriter::from_writer_with_compression(sink, self.compression_level)
            .map_err(|e| ExcelError::zip_write("Failed to create ZIP writer", e))?;

        let mut changed = 0;
        for name in &names {
            if !self.targets(name) {
                let mut entry = reader
                    .read_entry_streaming_by_name(name)
                    .map_err(|e| ExcelError::zip_read(&format!("Failed to open {}", name), e))?;
                zip.start_entry(name)
                    .map_err(|e| ExcelError::zip_write(&format!("Failed to start {}", name), e))?;
                io::copy(&mut entry, &mut EntryWriter::new(&mut zip))?;
                continue;
            }

            let data = reader
                .read_entry_by_name(name)
                .map_err(|e| ExcelError::zip_read(&format!("Failed to read {}", name), e))?;
            let data = match self.rewrite(name, &data, &present)? {
                Some(rewritten) => {
                    changed += 1;
                    rewritten
                }
                None => data,
            };

            zip.start_entry(name)
                .map_err(|e| ExcelError::zip_write(&format!("Failed to start {}", name), e))?;
            zip.write_data(&data)
                .map_err(|e| ExcelError::zip_write(&format!("Failed to write {}", name), e))?;
        }

        self.log_missing(&names);

        let mut sink = zip
            .finish()
            .map_err(|e| ExcelError::zip_write("Failed to finish ZIP", e))?;
        sink.flush()?;
        Ok(changed)
    }

    /// Some enabled fix-up rewrites entry `name`
    pub fn targets(&self, name: &str) -> bool {
        (self.fix_content_types && name == parts::CONTENT_TYPES)
            || (self.strip_namespace_aliases && ALIAS_TARGETS.contains(&name))
            || (self.normalize_declarations && DECLARATION_TARGETS.contains(&name))
    }

    /// New contents for entry `name`, or `None` when no enabled fix-up targets it
    pub fn rewrite(&self, name: &str, data: &[u8], present: &[Part]) -> Result<Option<Vec<u8>>> {
        if self.fix_content_types && name == parts::CONTENT_TYPES {
            let mut writer = XmlWriter::new(Vec::new());
            parts::write_content_types(&mut writer, present)?;
            return writer.into_inner().map(Some);
        }

        let strip = self.strip_namespace_aliases && ALIAS_TARGETS.contains(&name);
        let normalize = self.normalize_declarations && DECLARATION_TARGETS.contains(&name);
        if !strip && !normalize {
            return Ok(None);
        }

        let text = std::str::from_utf8(data)
            .map_err(|e| ExcelError::InvalidFormat(format!("{} is not UTF-8: {}", name, e)))?;
        let text = if strip {
            strip_namespace_alias(text, ALIAS)
        } else {
            text.to_string()
        };
        let text = if normalize {
            normalize_declaration(&text)
        } else {
            text
        };
        Ok(Some(text.into_bytes()))
    }

    fn log_missing(&self, names: &[String]) {
        let mut targets: Vec<&str> = Vec::new();
        if self.strip_namespace_aliases {
            targets.extend(ALIAS_TARGETS);
        }
        if self.normalize_declarations {
            targets.extend(DECLARATION_TARGETS);
        }
        for target in targets {
            if !names.iter().any(|name| name == target) {
                debug!("Skipping {}: not in package", target);
            }
        }
    }
}

/// Sibling file the rewritten package is staged in
fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "package".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

/// Move elements from the `prefix:` alias into the default namespace
pub fn strip_namespace_alias(xml: &str, prefix: &str) -> String {
    let mut out = xml
        .replace(&format!("</{}:", prefix), "</")
        .replace(&format!("<{}:", prefix), "<");

    let declaration = format!(" xmlns:{}=", prefix);
    if let Some(start) = out.find(&declaration) {
        let value_start = start + declaration.len();
        let has_default = out.contains(" xmlns=\"") || out.contains(" xmlns='");
        match (has_default, attribute_end(&out, value_start)) {
            // A default namespace already exists; the alias declaration just goes away
            (true, Some(end)) => out.replace_range(start..end, ""),
            _ => out.replace_range(start..value_start, " xmlns="),
        }
    }

    out.replace(" xmlns=\"\"", "")
}

/// Index just past the quoted attribute value starting at `value_start`
fn attribute_end(xml: &str, value_start: usize) -> Option<usize> {
    let quote = xml[value_start..].chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let close = xml[value_start + 1..].find(quote)?;
    Some(value_start + 1 + close + 1)
}

/// Replace (or add) the XML declaration with the standalone UTF-8 form
pub fn normalize_declaration(xml: &str) -> String {
    let xml = xml.trim_start_matches('\u{feff}');
    let body = match xml.strip_prefix("<?xml") {
        Some(rest) => rest.find("?>").map_or(xml, |end| &rest[end + 2..]),
        None => xml,
    };
    format!("{}\n{}", XML_DECLARATION, body.trim_start())
}
