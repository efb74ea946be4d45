//! Shared strings table for string deduplication

use super::xml_writer::XmlWriter;
use crate::error::Result;
use indexmap::IndexSet;
use std::io::Write;

const SST_NAMESPACE: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Deduplicating table of cell strings
///
/// Positions are handed out in first-encounter order, so the same inputs in the same
/// order always produce the same table. `count` is the number of cell references,
/// `unique_count` the number of distinct strings.
#[derive(Debug, Default)]
pub struct SharedStrings {
    strings: IndexSet<String>,
    references: u64,
}

impl SharedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SharedStrings {
            strings: IndexSet::with_capacity(capacity),
            references: 0,
        }
    }

    /// Position of `value`, inserting it if absent; counts one cell reference
    pub fn find_or_create(&mut self, value: &str) -> u32 {
        self.references += 1;
        let index = match self.strings.get_index_of(value) {
            Some(index) => index,
            None => self.strings.insert_full(value.to_string()).0,
        };
        index as u32
    }

    /// Total number of cell references
    pub fn count(&self) -> u64 {
        self.references
    }

    /// Number of distinct strings
    pub fn unique_count(&self) -> usize {
        self.strings.len()
    }

    pub fn get(&self, position: u32) -> Option<&str> {
        self.strings.get_index(position as usize).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Write the `sst` part; counts must be final
    pub fn write_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.declaration()?;

        writer.start_element("sst")?;
        writer.attribute("xmlns", SST_NAMESPACE)?;
        writer.attribute_int("count", self.references)?;
        writer.attribute_int("uniqueCount", self.strings.len() as u64)?;
        writer.close_start_tag()?;

        for s in &self.strings {
            writer.start_element("si")?;
            writer.close_start_tag()?;

            writer.start_element("t")?;
            if needs_space_preserve(s) {
                writer.attribute("xml:space", "preserve")?;
            }
            writer.close_start_tag()?;
            writer.write_escaped(s)?;
            writer.end_element("t")?;

            writer.end_element("si")?;
        }

        writer.end_element("sst")?;
        writer.flush()
    }
}

fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_strings() {
        let mut ss = SharedStrings::new();

        assert_eq!(ss.find_or_create("Hello"), 0);
        assert_eq!(ss.find_or_create("World"), 1);
        assert_eq!(ss.find_or_create("Hello"), 0);

        assert_eq!(ss.unique_count(), 2);
        assert_eq!(ss.count(), 3);
        assert_eq!(ss.get(1), Some("World"));
        assert_eq!(ss.get(2), None);
    }

    #[test]
    fn test_write_xml() -> Result<()> {
        let mut ss = SharedStrings::new();
        ss.find_or_create("a&b");
        ss.find_or_create(" padded");
        ss.find_or_create("a&b");

        let mut writer = XmlWriter::new(Vec::new());
        ss.write_xml(&mut writer)?;
        let xml = String::from_utf8(writer.into_inner()?).unwrap();

        assert!(xml.contains(r#"count="3" uniqueCount="2">"#));
        assert!(xml.contains("<si><t>a&amp;b</t></si><si><t xml:space=\"preserve\"> padded</t></si>"));
        assert!(xml.ends_with("</sst>"));
        Ok(())
    }

    #[test]
    fn test_deterministic_positions() {
        let values = ["x", "y", "x", "z", "y"];
        let run = || {
            let mut ss = SharedStrings::new();
            values.iter().map(|v| ss.find_or_create(v)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
        assert_eq!(run(), vec![0, 1, 0, 2, 1]);
    }
}
