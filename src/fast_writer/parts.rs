//! Fixed package parts and the relationship graph between them
//!
//! Everything here except the worksheet body and the shared strings is known before the
//! first row is written.

use std::io::Write;

use super::xml_writer::XmlWriter;
use crate::columns::ColumnSet;
use crate::error::Result;
use crate::options::ExportOptions;

pub const MAIN_NAMESPACE: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/content-types";

pub const CONTENT_TYPES: &str = "[Content_Types].xml";
pub const PACKAGE_RELS: &str = "_rels/.rels";
pub const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
pub const WORKSHEET_RELS: &str = "xl/worksheets/_rels/sheet1.xml.rels";

/// A package part addressed by a relationship from its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    /// Path inside the archive
    pub name: &'static str,
    pub content_type: &'static str,
    pub relationship_type: &'static str,
    /// Relationship id in the owner's relationship part
    pub id: &'static str,
}

pub const WORKBOOK: Part = Part {
    name: "xl/workbook.xml",
    content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
    relationship_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
    id: "rId1",
};

pub const CORE_PROPERTIES: Part = Part {
    name: "docProps/core.xml",
    content_type: "application/vnd.openxmlformats-package.core-properties+xml",
    relationship_type: "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
    id: "rId2",
};

pub const EXTENDED_PROPERTIES: Part = Part {
    name: "docProps/app.xml",
    content_type: "application/vnd.openxmlformats-officedocument.extended-properties+xml",
    relationship_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties",
    id: "rId3",
};

pub const WORKSHEET: Part = Part {
    name: "xl/worksheets/sheet1.xml",
    content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
    relationship_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
    id: "rId1",
};

pub const THEME: Part = Part {
    name: "xl/theme/theme1.xml",
    content_type: "application/vnd.openxmlformats-officedocument.theme+xml",
    relationship_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme",
    id: "rId2",
};

pub const STYLES: Part = Part {
    name: "xl/styles.xml",
    content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
    relationship_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
    id: "rId3",
};

pub const SHARED_STRINGS: Part = Part {
    name: "xl/sharedStrings.xml",
    content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml",
    relationship_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings",
    id: "rId4",
};

pub const CONNECTIONS: Part = Part {
    name: "xl/connections.xml",
    content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.connections+xml",
    relationship_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/connections",
    id: "rId5",
};

pub const QUERY_TABLE: Part = Part {
    name: "xl/queryTables/queryTable1.xml",
    content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.queryTable+xml",
    relationship_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/queryTable",
    id: "rId1",
};

/// Every part this crate can produce, in content-types order
pub const ALL_PARTS: [Part; 9] = [
    WORKBOOK,
    WORKSHEET,
    THEME,
    STYLES,
    SHARED_STRINGS,
    CONNECTIONS,
    QUERY_TABLE,
    CORE_PROPERTIES,
    EXTENDED_PROPERTIES,
];

/// Cell format ids defined by the styles part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Default = 0,
    /// numFmtId 1 (`0`)
    Integer = 1,
    /// numFmtId 4 (`#,##0.00`)
    Float = 2,
    /// numFmtId 14 (short date)
    Date = 3,
    /// numFmtId 49 (`@`)
    Text = 4,
    /// Bold Calibri 11
    Header = 5,
}

impl CellStyle {
    /// Get the style index for XML
    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Parts present in a package produced with `options`
pub fn layout(options: &ExportOptions) -> Vec<Part> {
    let live = options.mode.is_live_connection();
    ALL_PARTS
        .into_iter()
        .filter(|part| match part.name {
            n if n == THEME.name => options.create_theme,
            n if n == SHARED_STRINGS.name => !live,
            n if n == CONNECTIONS.name || n == QUERY_TABLE.name => live,
            n if n == CORE_PROPERTIES.name => options.create_core_properties,
            n if n == EXTENDED_PROPERTIES.name => options.create_extended_properties,
            _ => true,
        })
        .collect()
}

/// Relationship target of `part` as seen from a part living in `owner_dir`
///
/// Absolute targets are package paths (`/xl/styles.xml`); relative targets are resolved
/// against the owner's directory (`styles.xml`, `../queryTables/queryTable1.xml`).
pub fn target(part: &Part, owner_dir: &str, relative: bool) -> String {
    if !relative {
        return format!("/{}", part.name);
    }

    let from: Vec<&str> = owner_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = part.name.split('/').collect();
    let common = from
        .iter()
        .zip(to.iter().take(to.len() - 1))
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = "../".repeat(from.len() - common);
    result.push_str(&to[common..].join("/"));
    result
}

pub fn write_content_types<W: Write>(writer: &mut XmlWriter<W>, parts: &[Part]) -> Result<()> {
    writer.declaration()?;
    writer.start_element("Types")?;
    writer.attribute("xmlns", CONTENT_TYPES_NAMESPACE)?;
    writer.close_start_tag()?;

    for (extension, content_type) in [
        (
            "bin",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.printerSettings",
        ),
        ("rels", "application/vnd.openxmlformats-package.relationships+xml"),
        ("xml", "application/xml"),
    ] {
        writer.start_element("Default")?;
        writer.attribute("Extension", extension)?;
        writer.attribute("ContentType", content_type)?;
        writer.close_empty()?;
    }

    for part in parts {
        writer.start_element("Override")?;
        writer.attribute("PartName", &format!("/{}", part.name))?;
        writer.attribute("ContentType", part.content_type)?;
        writer.close_empty()?;
    }

    writer.end_element("Types")?;
    writer.flush()
}

/// Write a relationships part listing `parts` as seen from `owner_dir`
pub fn write_relationships<W: Write>(
    writer: &mut XmlWriter<W>,
    parts: &[Part],
    owner_dir: &str,
    relative: bool,
) -> Result<()> {
    writer.declaration()?;
    writer.start_element("Relationships")?;
    writer.attribute("xmlns", PACKAGE_RELATIONSHIPS_NAMESPACE)?;
    writer.close_start_tag()?;

    for part in parts {
        writer.start_element("Relationship")?;
        writer.attribute("Id", part.id)?;
        writer.attribute("Type", part.relationship_type)?;
        writer.attribute("Target", &target(part, owner_dir, relative))?;
        writer.close_empty()?;
    }

    writer.end_element("Relationships")?;
    writer.flush()
}

pub fn write_workbook<W: Write>(
    writer: &mut XmlWriter<W>,
    options: &ExportOptions,
    columns: &ColumnSet,
) -> Result<()> {
    writer.declaration()?;
    writer.start_element("workbook")?;
    writer.attribute("xmlns", MAIN_NAMESPACE)?;
    writer.attribute("xmlns:r", RELATIONSHIPS_NAMESPACE)?;
    writer.close_start_tag()?;

    writer.write_str(
        r#"<fileVersion appName="xl" lastEdited="6" lowestEdited="5" rupBuild="14420"/><workbookPr codeName="ThisWorkbook" defaultThemeVersion="124226"/>"#,
    )?;
    if let Some(protection) = &options.workbook_protection {
        writer.write_str(protection)?;
    }
    writer.write_str("<bookViews><workbookView/></bookViews>")?;

    writer.write_str("<sheets>")?;
    writer.start_element("sheet")?;
    writer.attribute("name", &options.sheet_name)?;
    writer.attribute_int("sheetId", 1)?;
    writer.attribute("r:id", WORKSHEET.id)?;
    writer.close_empty()?;
    writer.write_str("</sheets>")?;

    if let crate::options::ExportMode::LiveConnection { table_name, .. } = &options.mode {
        writer.write_str("<definedNames>")?;
        writer.start_element("definedName")?;
        writer.attribute("name", table_name)?;
        writer.attribute("description", table_name)?;
        writer.attribute("comment", table_name)?;
        writer.close_start_tag()?;
        let range = format!(
            "'{}'!$A$1:${}$1",
            options.sheet_name.replace('\'', "''"),
            columns.last_code()
        );
        writer.write_escaped(&range)?;
        writer.end_element("definedName")?;
        writer.write_str("</definedNames>")?;
    }

    writer.write_str(r#"<calcPr fullCalcOnLoad="1"/>"#)?;
    writer.end_element("workbook")?;
    writer.flush()
}

/// Worksheet preamble up to and including `<sheetData>`
pub fn write_worksheet_start<W: Write>(writer: &mut XmlWriter<W>, columns: &ColumnSet) -> Result<()> {
    writer.declaration()?;
    writer.start_element("worksheet")?;
    writer.attribute("xmlns", MAIN_NAMESPACE)?;
    writer.attribute("xmlns:r", RELATIONSHIPS_NAMESPACE)?;
    writer.write_str(
        r#" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" xmlns:x14ac="http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac" xmlns:xr="http://schemas.microsoft.com/office/spreadsheetml/2014/revision" xmlns:xr2="http://schemas.microsoft.com/office/spreadsheetml/2015/revision2" xmlns:xr3="http://schemas.microsoft.com/office/spreadsheetml/2016/revision3" mc:Ignorable="x14ac xr xr2 xr3" xr:uid="{00000000-0001-0000-0000-000000000000}">"#,
    )?;
    writer.write_str(
        r#"<sheetViews><sheetView tabSelected="1" workbookViewId="0"/></sheetViews><sheetFormatPr defaultRowHeight="15" x14ac:dyDescent="0.25"/>"#,
    )?;

    writer.write_str("<cols>")?;
    writer.start_element("col")?;
    writer.attribute_int("min", 1)?;
    writer.attribute_int("max", columns.len() as u64)?;
    writer.attribute("width", "20")?;
    writer.attribute("customWidth", "1")?;
    writer.close_empty()?;
    writer.write_str("</cols>")?;

    writer.write_str("<sheetData>")?;
    writer.flush()
}

/// Worksheet trailer after the last row
pub const WORKSHEET_END: &str = r#"</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/><headerFooter/></worksheet>"#;

pub fn write_core_properties<W: Write>(writer: &mut XmlWriter<W>, author: &str) -> Result<()> {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    writer.declaration()?;
    writer.write_str(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    )?;
    writer.text_element("dc:creator", author)?;
    writer.text_element("cp:lastModifiedBy", author)?;
    for element in ["dcterms:created", "dcterms:modified"] {
        writer.start_element(element)?;
        writer.attribute("xsi:type", "dcterms:W3CDTF")?;
        writer.close_start_tag()?;
        writer.write_str(&now)?;
        writer.end_element(element)?;
    }
    writer.end_element("cp:coreProperties")?;
    writer.flush()
}

pub const EXTENDED_PROPERTIES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>Microsoft Excel</Application><DocSecurity>0</DocSecurity><ScaleCrop>false</ScaleCrop><LinksUpToDate>false</LinksUpToDate><SharedDoc>false</SharedDoc><HyperlinksChanged>false</HyperlinksChanged><AppVersion>14.0000</AppVersion></Properties>"#;

/// Four number formats plus the bold header, in `CellStyle` order
pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" xmlns:x14ac="http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac" mc:Ignorable="x14ac"><numFmts count="0"/><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><color rgb="FF000000"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="6"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1" applyFont="1" applyProtection="1"/><xf numFmtId="1" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="4" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="49" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyNumberFormat="1" applyFont="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles><dxfs count="0"/></styleSheet>"#;

/// Default Office theme
pub const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2><a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2><a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4><a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6><a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Cambria"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:tint val="50000"/><a:satMod val="300000"/></a:schemeClr></a:gs><a:gs pos="35000"><a:schemeClr val="phClr"><a:tint val="37000"/><a:satMod val="300000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:tint val="15000"/><a:satMod val="350000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="16200000" scaled="1"/></a:gradFill><a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:shade val="51000"/><a:satMod val="130000"/></a:schemeClr></a:gs><a:gs pos="80000"><a:schemeClr val="phClr"><a:shade val="93000"/><a:satMod val="130000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="94000"/><a:satMod val="135000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="16200000" scaled="0"/></a:gradFill></a:fillStyleLst><a:lnStyleLst><a:ln w="9525" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"><a:shade val="95000"/><a:satMod val="105000"/></a:schemeClr></a:solidFill><a:prstDash val="solid"/></a:ln><a:ln w="25400" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/></a:ln><a:ln w="38100" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst><a:outerShdw blurRad="40000" dist="23000" dir="5400000" rotWithShape="0"><a:srgbClr val="000000"><a:alpha val="35000"/></a:srgbClr></a:outerShdw></a:effectLst></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:tint val="40000"/><a:satMod val="350000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="20000"/><a:satMod val="255000"/></a:schemeClr></a:gs></a:gsLst><a:path path="circle"><a:fillToRect l="50000" t="-80000" r="50000" b="180000"/></a:path></a:gradFill><a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:tint val="80000"/><a:satMod val="300000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="30000"/><a:satMod val="200000"/></a:schemeClr></a:gs></a:gsLst><a:path path="circle"><a:fillToRect l="50000" t="50000" r="50000" b="50000"/></a:path></a:gradFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#;

/// Database connection the workbook refreshes on open
pub fn write_connections<W: Write>(
    writer: &mut XmlWriter<W>,
    table_name: &str,
    connection_string: &str,
    sql_statement: &str,
) -> Result<()> {
    writer.declaration()?;
    writer.start_element("connections")?;
    writer.attribute("xmlns", MAIN_NAMESPACE)?;
    writer.close_start_tag()?;

    writer.start_element("connection")?;
    writer.attribute_int("id", 1)?;
    writer.attribute("name", table_name)?;
    writer.attribute_int("type", 1)?;
    writer.attribute_int("refreshedVersion", 5)?;
    writer.attribute("background", "1")?;
    writer.attribute("saveData", "1")?;
    writer.attribute("refreshOnLoad", "1")?;
    writer.attribute("credentials", "integrated")?;
    writer.attribute("savePassword", "0")?;
    writer.attribute("onlyUseConnectionFile", "0")?;
    writer.attribute("keepAlive", "0")?;
    writer.close_start_tag()?;

    writer.start_element("dbPr")?;
    writer.attribute("connection", connection_string)?;
    writer.attribute("command", sql_statement)?;
    writer.attribute_int("commandType", 2)?;
    writer.close_empty()?;

    writer.end_element("connection")?;
    writer.end_element("connections")?;
    writer.flush()
}

pub fn write_query_table<W: Write>(writer: &mut XmlWriter<W>, table_name: &str) -> Result<()> {
    writer.declaration()?;
    writer.start_element("queryTable")?;
    writer.attribute("xmlns", MAIN_NAMESPACE)?;
    writer.attribute("name", table_name)?;
    writer.attribute_int("connectionId", 1)?;
    writer.attribute_int("autoFormatId", 16)?;
    writer.write_str(
        r#" applyNumberFormats="1" applyBorderFormats="1" applyFontFormats="1" applyPatternFormats="1" applyAlignmentFormats="0" applyWidthHeightFormats="0" refreshOnLoad="1""#,
    )?;
    writer.close_empty()?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    fn render(f: impl FnOnce(&mut XmlWriter<Vec<u8>>) -> Result<()>) -> String {
        let mut writer = XmlWriter::new(Vec::new());
        f(&mut writer).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_targets() {
        assert_eq!(target(&WORKBOOK, "", true), "xl/workbook.xml");
        assert_eq!(target(&WORKBOOK, "", false), "/xl/workbook.xml");
        assert_eq!(target(&STYLES, "xl", true), "styles.xml");
        assert_eq!(target(&WORKSHEET, "xl", true), "worksheets/sheet1.xml");
        assert_eq!(target(&QUERY_TABLE, "xl/worksheets", true), "../queryTables/queryTable1.xml");
    }

    #[test]
    fn test_layout() {
        let parts = layout(&ExportOptions::default());
        let names: Vec<_> = parts.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            ["xl/workbook.xml", "xl/worksheets/sheet1.xml", "xl/styles.xml", "xl/sharedStrings.xml"]
        );

        let live = ExportOptions::new()
            .with_theme(true)
            .with_core_properties(true)
            .with_live_connection("t", "DSN=x", "SELECT 1");
        let parts = layout(&live);
        assert!(parts.contains(&CONNECTIONS));
        assert!(parts.contains(&QUERY_TABLE));
        assert!(parts.contains(&THEME));
        assert!(parts.contains(&CORE_PROPERTIES));
        assert!(!parts.contains(&SHARED_STRINGS));
        assert!(!parts.contains(&EXTENDED_PROPERTIES));
    }

    #[test]
    fn test_relationships() {
        let xml = render(|w| write_relationships(w, &[WORKSHEET, STYLES], "xl", true));
        assert!(xml.contains(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#));
        assert!(xml.contains(r#"Id="rId3""#));
    }

    #[test]
    fn test_workbook_defined_name() {
        let options = ExportOptions::new()
            .with_sheet_name("orders")
            .with_live_connection("orders", "DSN=x", "SELECT 1");
        let columns =
            ColumnSet::from_fields(&[("a", FieldType::I32), ("b", FieldType::String)], true).unwrap();
        let xml = render(|w| write_workbook(w, &options, &columns));
        assert!(xml.contains(r#"<sheet name="orders" sheetId="1" r:id="rId1"/>"#));
        assert!(xml.contains(r#"<definedName name="orders" description="orders" comment="orders">&apos;orders&apos;!$A$1:$B$1</definedName>"#));
        assert!(xml.contains(r#"<calcPr fullCalcOnLoad="1"/>"#));
    }

    #[test]
    fn test_connection_escaping() {
        let xml = render(|w| write_connections(w, "t", "DSN=sales;UID=a&b", "SELECT * FROM t WHERE x < 1"));
        assert!(xml.contains(r#"connection="DSN=sales;UID=a&amp;b""#));
        assert!(xml.contains(r#"command="SELECT * FROM t WHERE x &lt; 1" commandType="2"/>"#));
    }
}
