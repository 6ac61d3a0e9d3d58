#![allow(dead_code)]

use std::io::{Cursor, Read};

pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub const SAMPLE_PLAN: &str = "\
Title of lesson: The Water Cycle / Судың айналымы
Grade level: 6
Learning objectives: Describe evaporation, condensation and precipitation
Assessment criteria: Learners label a diagram: evaporation, condensation
Subject vocabulary (EN + KZ): evaporation – булану, condensation – конденсация
Bloom’s level: Understand
4Cs focus: Content, Communication, Cognition, Culture
Lesson stages (Beginning – Middle – End): Warm-up video; group diagram; exit ticket
Values: Respect for nature
ICT used: Padlet, Kahoot
Resources: https://www.nationalgeographic.org/ (diagrams)";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn docx_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    let mut part = archive.by_name(name).unwrap_or_else(|_| panic!("missing part {name}"));
    let mut xml = String::new();
    part.read_to_string(&mut xml).expect("utf-8 part");
    xml
}

pub fn docx_part_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// Text of every table cell, row by row.
pub fn docx_table(bytes: &[u8]) -> Vec<Vec<String>> {
    let xml = docx_part(bytes, "word/document.xml");
    let doc = roxmltree::Document::parse(&xml).expect("well-formed document.xml");
    doc.descendants()
        .filter(|n| n.has_tag_name((WML_NS, "tr")))
        .map(|tr| {
            tr.children()
                .filter(|n| n.has_tag_name((WML_NS, "tc")))
                .map(|tc| {
                    tc.descendants()
                        .filter(|n| n.has_tag_name((WML_NS, "t")))
                        .filter_map(|n| n.text())
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Text of the first paragraph in the body.
pub fn docx_heading(bytes: &[u8]) -> String {
    let xml = docx_part(bytes, "word/document.xml");
    let doc = roxmltree::Document::parse(&xml).expect("well-formed document.xml");
    let p = doc
        .descendants()
        .find(|n| n.has_tag_name((WML_NS, "p")))
        .expect("heading paragraph");
    p.descendants()
        .filter(|n| n.has_tag_name((WML_NS, "t")))
        .filter_map(|n| n.text())
        .collect()
}

/// Page count from the `/Count` entry of the page tree.
pub fn pdf_page_count(bytes: &[u8]) -> usize {
    let needle = b"/Count ";
    let pos = bytes
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("page tree with /Count");
    bytes[pos + needle.len()..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0, |n, b| n * 10 + (b - b'0') as usize)
}

pub fn assert_pdf(bytes: &[u8]) {
    assert!(bytes.starts_with(b"%PDF-"), "missing PDF header");
    let tail = String::from_utf8_lossy(&bytes[bytes.len().saturating_sub(16)..]);
    assert!(tail.contains("%%EOF"), "missing EOF marker");
}

/// Inflated Flate-compressed streams in file order. Page content streams are
/// the only compressed streams, so this is one entry per page.
pub fn pdf_content_streams(bytes: &[u8]) -> Vec<String> {
    let marker = b">>\nstream\n";
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(off) = bytes[pos..].windows(marker.len()).position(|w| w == marker) {
        let dict_end = pos + off;
        let data_start = dict_end + marker.len();
        let data_len = bytes[data_start..]
            .windows(b"\nendstream".len())
            .position(|w| w == b"\nendstream")
            .expect("endstream");
        let dict_start = bytes[..dict_end]
            .windows(b" obj".len())
            .rposition(|w| w == b" obj")
            .unwrap_or(0);
        let dict = String::from_utf8_lossy(&bytes[dict_start..dict_end]);
        if dict.contains("/FlateDecode") {
            let data = &bytes[data_start..data_start + data_len];
            let raw = miniz_oxide::inflate::decompress_to_vec_zlib(data).expect("zlib stream");
            out.push(String::from_utf8_lossy(&raw).into_owned());
        }
        pos = data_start + data_len;
    }
    out
}

/// Shown strings of a content stream with the baseline each was drawn on.
/// Only meaningful for WinAnsi (literal string) text.
pub fn text_runs(content: &str) -> Vec<(f32, String)> {
    let mut runs = Vec::new();
    let mut y = 0.0f32;
    for line in content.lines() {
        if line == "BT" {
            y = 0.0;
        } else if let Some(operands) = line.strip_suffix(" Td") {
            let ty = operands
                .split_whitespace()
                .nth(1)
                .and_then(|v| v.parse::<f32>().ok())
                .expect("Td operands");
            y += ty;
        } else if let Some(operand) = line.strip_suffix(" Tj") {
            let literal = operand
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .expect("literal string operand");
            runs.push((y, unescape_literal(literal)));
        }
    }
    runs
}

fn unescape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Text runs of every page of a PDF rendered with the standard font.
pub fn pdf_pages_text(bytes: &[u8]) -> Vec<Vec<(f32, String)>> {
    pdf_content_streams(bytes)
        .iter()
        .map(|c| text_runs(c))
        .collect()
}
