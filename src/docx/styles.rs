use crate::model::DocumentStyle;

use super::{WML_NS, escape_xml, half_points};

const HEADING_SIZE_DELTA: f32 = 4.0;

/// Build `word/styles.xml`. The body font and size live in the document
/// defaults so every paragraph and table cell inherits them.
pub(super) fn styles_xml(style: &DocumentStyle) -> String {
    let font = escape_xml(&style.font_family);
    let body_sz = half_points(style.font_size);
    let heading_sz = half_points(style.font_size + HEADING_SIZE_DELTA);

    let mut out = String::with_capacity(2048);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<w:styles xmlns:w="{WML_NS}">"#));

    out.push_str("<w:docDefaults><w:rPrDefault><w:rPr>");
    out.push_str(&format!(
        r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:eastAsia="{font}" w:cs="{font}"/>"#
    ));
    out.push_str(&format!(r#"<w:sz w:val="{body_sz}"/><w:szCs w:val="{body_sz}"/>"#));
    out.push_str("</w:rPr></w:rPrDefault>");
    out.push_str(r#"<w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="240" w:lineRule="auto"/></w:pPr></w:pPrDefault>"#);
    out.push_str("</w:docDefaults>");

    out.push_str(
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    );

    out.push_str(r#"<w:style w:type="paragraph" w:styleId="Heading1">"#);
    out.push_str(r#"<w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>"#);
    out.push_str(r#"<w:pPr><w:keepNext/><w:spacing w:before="240" w:after="240"/><w:jc w:val="center"/><w:outlineLvl w:val="0"/></w:pPr>"#);
    out.push_str(&format!(
        r#"<w:rPr><w:b/><w:bCs/><w:sz w:val="{heading_sz}"/><w:szCs w:val="{heading_sz}"/></w:rPr>"#
    ));
    out.push_str("</w:style>");

    out.push_str(r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal">"#);
    out.push_str(r#"<w:name w:val="Normal Table"/><w:tblPr><w:tblInd w:w="0" w:type="dxa"/>"#);
    out.push_str(r#"<w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar>"#);
    out.push_str("</w:tblPr></w:style>");

    out.push_str(r#"<w:style w:type="table" w:styleId="TableGrid">"#);
    out.push_str(r#"<w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/>"#);
    out.push_str(r#"<w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr>"#);
    out.push_str("<w:tblPr>");
    out.push_str(&table_borders());
    out.push_str("</w:tblPr></w:style>");

    out.push_str("</w:styles>");
    out
}

/// Single 0.5pt borders on every edge, shared by the style and the table itself.
pub(super) fn table_borders() -> String {
    let mut out = String::from("<w:tblBorders>");
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        out.push_str(&format!(
            r#"<w:{edge} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#
        ));
    }
    out.push_str("</w:tblBorders>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_font_and_size() {
        let xml = styles_xml(&DocumentStyle::default());
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let fonts = doc
            .descendants()
            .find(|n| n.has_tag_name((WML_NS, "rFonts")))
            .unwrap();
        assert_eq!(fonts.attribute((WML_NS, "ascii")), Some("Times New Roman"));
        let sz = doc
            .descendants()
            .find(|n| n.has_tag_name((WML_NS, "sz")))
            .unwrap();
        assert_eq!(sz.attribute((WML_NS, "val")), Some("24"));
    }

    #[test]
    fn heading_style_is_larger_and_bold() {
        let style = DocumentStyle {
            font_family: "Arial".into(),
            font_size: 11.0,
        };
        let xml = styles_xml(&style);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let heading = doc
            .descendants()
            .find(|n| n.attribute((WML_NS, "styleId")) == Some("Heading1"))
            .unwrap();
        assert!(heading.descendants().any(|n| n.has_tag_name((WML_NS, "b"))));
        let sz = heading
            .descendants()
            .find(|n| n.has_tag_name((WML_NS, "sz")))
            .unwrap();
        assert_eq!(sz.attribute((WML_NS, "val")), Some("30"));
    }

    #[test]
    fn font_name_is_escaped() {
        let style = DocumentStyle {
            font_family: "Fancy \"Quoted\" & Co".into(),
            font_size: 12.0,
        };
        assert!(roxmltree::Document::parse(&styles_xml(&style)).is_ok());
    }
}
