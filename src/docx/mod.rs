mod styles;

use std::borrow::Cow;
use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Error;
use crate::model::{
    DEFAULT_TITLE, DocumentStyle, HEADER_SHADING, MissingDelimiter, PageGeometry, Section,
    column_widths_pt,
};
use crate::parse::ParseOptions;

use styles::{styles_xml, table_borders};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const DOC_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const STYLES_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const CORE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Clone, Debug)]
pub struct DocxOptions {
    pub title: String,
    pub style: DocumentStyle,
    pub page: PageGeometry,
    /// Shade the first table row.
    pub shade_header: bool,
    pub parse: ParseOptions,
}

impl Default for DocxOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            style: DocumentStyle::default(),
            page: PageGeometry::default(),
            shade_header: true,
            parse: ParseOptions::with_policy(MissingDelimiter::Skip),
        }
    }
}

pub(crate) fn pts_to_twips(pts: f32) -> u32 {
    (pts * 20.0).round().max(0.0) as u32
}

pub(crate) fn half_points(pts: f32) -> u32 {
    (pts * 2.0).round().max(1.0) as u32
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Escape text for element content and attribute values. Characters that
/// XML 1.0 cannot carry at all (C0 controls) are removed.
pub(crate) fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s
        .chars()
        .any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'') || !is_xml_char(c))
    {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_xml_char(c) => out.push(c),
            c => log::warn!("dropping control character U+{:04X} not representable in XML", c as u32),
        }
    }
    Cow::Owned(out)
}

fn run_xml(text: &str, bold: bool) -> String {
    if text.is_empty() {
        return String::new();
    }
    let rpr = if bold { "<w:rPr><w:b/><w:bCs/></w:rPr>" } else { "" };
    format!(
        r#"<w:r>{rpr}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape_xml(text)
    )
}

fn cell_xml(text: &str, width_twips: u32, shading: Option<[u8; 3]>, bold: bool) -> String {
    let shd = shading
        .map(|[r, g, b]| format!(r#"<w:shd w:val="clear" w:color="auto" w:fill="{r:02X}{g:02X}{b:02X}"/>"#))
        .unwrap_or_default();
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="{width_twips}" w:type="dxa"/>{shd}</w:tcPr><w:p>{}</w:p></w:tc>"#,
        run_xml(text, bold)
    )
}

fn table_xml(sections: &[Section], shade_header: bool) -> String {
    let widths = column_widths_pt().map(pts_to_twips);
    let total: u32 = widths.iter().sum();

    let mut out = String::with_capacity(256 + sections.len() * 256);
    out.push_str("<w:tbl><w:tblPr>");
    out.push_str(r#"<w:tblStyle w:val="TableGrid"/>"#);
    out.push_str(&format!(r#"<w:tblW w:w="{total}" w:type="dxa"/>"#));
    out.push_str(&table_borders());
    out.push_str(r#"<w:tblLayout w:type="fixed"/>"#);
    out.push_str(r#"<w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/>"#);
    out.push_str("</w:tblPr><w:tblGrid>");
    for w in widths {
        out.push_str(&format!(r#"<w:gridCol w:w="{w}"/>"#));
    }
    out.push_str("</w:tblGrid>");

    for (i, section) in sections.iter().enumerate() {
        let shading = (shade_header && i == 0).then_some(HEADER_SHADING);
        out.push_str("<w:tr>");
        out.push_str(&cell_xml(&section.name, widths[0], shading, true));
        out.push_str(&cell_xml(&section.content, widths[1], shading, false));
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
    out
}

fn section_properties_xml(page: &PageGeometry) -> String {
    format!(
        r#"<w:sectPr><w:pgSz w:w="{}" w:h="{}"/><w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#,
        pts_to_twips(page.width),
        pts_to_twips(page.height),
        pts_to_twips(page.margin_top),
        pts_to_twips(page.margin_right),
        pts_to_twips(page.margin_bottom),
        pts_to_twips(page.margin_left),
    )
}

/// Build `word/document.xml`: a Heading 1 title followed by a two-column
/// table with one row per section.
pub(crate) fn document_xml(sections: &[Section], opts: &DocxOptions) -> String {
    let mut out = String::with_capacity(1024 + sections.len() * 300);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<w:document xmlns:w="{WML_NS}"><w:body>"#));

    out.push_str(r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>"#);
    out.push_str(&run_xml(&opts.title, false));
    out.push_str("</w:p>");

    // Word rejects a w:tbl without rows, so an empty plan is heading only.
    if !sections.is_empty() {
        out.push_str(&table_xml(sections, opts.shade_header));
        // A table may not be the last body element before w:sectPr.
        out.push_str("<w:p/>");
    }

    out.push_str(&section_properties_xml(&opts.page));
    out.push_str("</w:body></w:document>");
    out
}

fn content_types_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#
}

fn package_rels_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{DOC_REL_TYPE}" Target="word/document.xml"/><Relationship Id="rId2" Type="{CORE_REL_TYPE}" Target="docProps/core.xml"/></Relationships>"#
    )
}

fn document_rels_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{STYLES_REL_TYPE}" Target="styles.xml"/></Relationships>"#
    )
}

fn core_xml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title><dc:creator>lessonplan</dc:creator></cp:coreProperties>"#,
        escape_xml(title)
    )
}

/// Render sections into a complete DOCX package held in memory.
pub fn render(sections: &[Section], opts: &DocxOptions) -> Result<Vec<u8>, Error> {
    let parts: [(&str, Cow<'_, str>); 6] = [
        ("[Content_Types].xml", Cow::Borrowed(content_types_xml())),
        ("_rels/.rels", Cow::Owned(package_rels_xml())),
        ("docProps/core.xml", Cow::Owned(core_xml(&opts.title))),
        ("word/document.xml", Cow::Owned(document_xml(sections, opts))),
        ("word/styles.xml", Cow::Owned(styles_xml(&opts.style))),
        ("word/_rels/document.xml.rels", Cow::Owned(document_rels_xml())),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, xml) in &parts {
        zip.start_file(*name, options)?;
        zip.write_all(xml.as_bytes())?;
    }
    let bytes = zip.finish()?.into_inner();

    log::debug!(
        "docx: {} rows, {} bytes, font={} {}pt",
        sections.len(),
        bytes.len(),
        opts.style.font_family,
        opts.style.font_size,
    );
    Ok(bytes)
}
