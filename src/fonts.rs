use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref, Str};
use ttf_parser::Face;

/// Family name that selects the built-in Helvetica without embedding.
pub(crate) const STANDARD_FAMILY: &str = "Helvetica";

/// Families tried after the configured one. All of them cover Cyrillic,
/// including the Kazakh letters.
pub(crate) const FALLBACK_FAMILIES: &[&str] = &[
    "Liberation Serif",
    "DejaVu Serif",
    "Noto Serif",
    "Times New Roman",
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Arial",
];

#[derive(Clone, Copy)]
struct Glyph {
    gid: u16,
    width_1000: f32,
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) ascender_ratio: f32,
    /// `None` for the standard Helvetica fallback (WinAnsi encoded).
    glyphs: Option<HashMap<char, Glyph>>,
}

impl FontEntry {
    pub(crate) fn is_embedded(&self) -> bool {
        self.glyphs.is_some()
    }

    fn char_width_1000(&self, ch: char) -> f32 {
        match &self.glyphs {
            Some(map) => map.get(&ch).map_or(0.0, |g| g.width_1000),
            None => helvetica_width(char_to_winansi(ch).unwrap_or(b'?')),
        }
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    /// Encode text for a `Tj` operand: two-byte glyph ids for embedded fonts,
    /// WinAnsi bytes for Helvetica with `?` for anything WinAnsi lacks.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.glyphs {
            Some(map) => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for ch in text.chars() {
                    let gid = map.get(&ch).map_or(0, |g| g.gid);
                    out.extend_from_slice(&gid.to_be_bytes());
                }
                out
            }
            None => text
                .chars()
                .map(|ch| char_to_winansi(ch).unwrap_or(b'?'))
                .collect(),
        }
    }

    /// Characters the font cannot show. Helvetica covers WinAnsi only.
    pub(crate) fn missing_chars(&self, used: &HashSet<char>) -> Vec<char> {
        let mut missing: Vec<char> = used
            .iter()
            .copied()
            .filter(|&ch| !ch.is_control())
            .filter(|&ch| match &self.glyphs {
                Some(map) => !map.contains_key(&ch),
                None => char_to_winansi(ch).is_none(),
            })
            .collect();
        missing.sort_unstable();
        missing
    }
}

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    // Name ID 1 keeps "Noto Serif Display" apart from "Noto Serif".
    face.names()
        .into_iter()
        .find(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .and_then(|name| name.to_string())
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("LESSONPLAN_FONTS") {
        dirs.extend(std::env::split_paths(&val).filter(|p| !p.as_os_str().is_empty()));
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        match std::env::var("WINDIR") {
            Ok(windir) => dirs.push(PathBuf::from(windir).join("Fonts")),
            Err(_) => dirs.push("C:\\Windows\\Fonts".into()),
        }
    }

    dirs
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn index_font_file(index: &mut FontLookup, path: &Path) {
    let Ok(file) = std::fs::File::open(path) else {
        return;
    };
    // SAFETY: the mapping is read-only and dropped before this function returns.
    let Ok(data) = (unsafe { Mmap::map(&file) }) else {
        return;
    };
    let face_count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
    for face_idx in 0..face_count {
        let Ok(face) = Face::parse(&data, face_idx) else {
            continue;
        };
        if let Some(family) = font_family_name(&face) {
            index
                .entry((family.to_lowercase(), face.is_bold(), face.is_italic()))
                .or_insert((path.to_path_buf(), face_idx));
        }
    }
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut files = 0u32;

    let mut stack = font_directories();
    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if is_font_file(&path) {
                files += 1;
                index_font_file(&mut index, &path);
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} dirs, {} files → {} faces",
        t0.elapsed().as_secs_f64() * 1000.0,
        visited.len(),
        files,
        index.len(),
    );
    index
}

/// Find a font file by family name, falling back to the regular face when the
/// bold one is not installed.
fn find_font_file(family: &str, bold: bool) -> Option<(PathBuf, u32)> {
    let index = FONT_INDEX.get_or_init(scan_font_dirs);
    let key = family.trim().to_lowercase();
    index
        .get(&(key.clone(), bold, false))
        .or_else(|| bold.then(|| index.get(&(key, false, false))).flatten())
        .cloned()
}

/// Map a char to its Windows-1252 byte.
fn char_to_winansi(c: char) -> Option<u8> {
    let byte = match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Approximate Helvetica advance widths at 1000 units/em.
fn helvetica_width(byte: u8) -> f32 {
    match byte {
        32 => 278.0,
        33..=47 => 333.0,
        48..=57 => 556.0,
        58..=64 => 333.0,
        73 | 74 => 278.0,
        77 => 833.0,
        65..=90 => 667.0,
        91..=96 => 333.0,
        102 | 105 | 106 | 108 | 116 => 278.0,
        109 | 119 => 833.0,
        97..=122 => 556.0,
        _ => 556.0,
    }
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    }
}

struct FontRefs {
    font: Ref,
    descriptor: Ref,
    data: Ref,
    cid_font: Ref,
    to_unicode: Ref,
}

/// Embed a TrueType/OpenType face as a Type0 font with Identity-H encoding,
/// subset to the glyphs of `used_chars`.
fn embed_truetype(
    pdf: &mut Pdf,
    refs: &FontRefs,
    family: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &HashSet<char>,
) -> Option<(HashMap<char, Glyph>, f32)> {
    let face = Face::parse(font_data, face_index).ok()?;
    let units = face.units_per_em() as f32;
    let scale = |v: f32| v / units * 1000.0;

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut glyphs = HashMap::new();
    let mut sorted: Vec<char> = used_chars.iter().copied().collect();
    sorted.sort_unstable();
    for ch in sorted {
        if let Some(gid) = face.glyph_index(ch) {
            let width_1000 = face
                .glyph_hor_advance(gid)
                .map(|adv| scale(adv as f32))
                .unwrap_or(0.0);
            let new_gid = remapper.remap(gid.0);
            glyphs.insert(ch, Glyph { gid: new_gid, width_1000 });
        }
    }

    let subset_data = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {family}: {e}, embedding full font");
        font_data.to_vec()
    });
    let data_len = i32::try_from(subset_data.len()).ok()?;
    pdf.stream(refs.data, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = family.replace(' ', "");
    let bb = face.global_bounding_box();
    pdf.font_descriptor(refs.descriptor)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(
            scale(bb.x_min as f32),
            scale(bb.y_min as f32),
            scale(bb.x_max as f32),
            scale(bb.y_max as f32),
        ))
        .italic_angle(0.0)
        .ascent(scale(face.ascender() as f32))
        .descent(scale(face.descender() as f32))
        .cap_height(face.capital_height().map_or(700.0, |h| scale(h as f32)))
        .stem_v(80.0)
        .font_file2(refs.data);

    {
        let mut cid = pdf.cid_font(refs.cid_font);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(identity_system_info());
        cid.font_descriptor(refs.descriptor);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut widths: Vec<(u16, f32)> = glyphs.values().map(|g| (g.gid, g.width_1000)).collect();
        widths.sort_by_key(|&(gid, _)| gid);
        if !widths.is_empty() {
            let mut w = cid.widths();
            for (gid, width) in widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    for (&ch, g) in &glyphs {
        cmap.pair(g.gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(refs.to_unicode, cmap_data.as_slice());

    pdf.type0_font(refs.font)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(refs.cid_font)
        .to_unicode(refs.to_unicode);

    Some((glyphs, face.ascender() as f32 / units))
}

/// Register a font under `pdf_name`. The configured family is tried first,
/// then [`FALLBACK_FAMILIES`], then the standard Helvetica font. Asking for
/// [`STANDARD_FAMILY`] goes straight to Helvetica.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    family: &str,
    bold: bool,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> FontEntry {
    let t0 = std::time::Instant::now();
    let refs = FontRefs {
        font: alloc(),
        descriptor: alloc(),
        data: alloc(),
        cid_font: alloc(),
        to_unicode: alloc(),
    };

    // The standard font is used as-is, without a system lookup.
    let standard = family.trim().eq_ignore_ascii_case(STANDARD_FAMILY);
    let candidates = std::iter::once(family)
        .chain(FALLBACK_FAMILIES.iter().copied())
        .filter(|c| !standard && !c.trim().is_empty());

    let mut embedded = None;
    for candidate in candidates {
        let Some((path, face_index)) = find_font_file(candidate, bold) else {
            continue;
        };
        let Ok(data) = std::fs::read(&path) else {
            continue;
        };
        if let Some(found) = embed_truetype(pdf, &refs, candidate, &data, face_index, used_chars) {
            if !candidate.eq_ignore_ascii_case(family) {
                log::info!("Font {family} not installed, using {candidate}");
            }
            embedded = Some(found);
            break;
        }
    }

    let entry = match embedded {
        Some((glyphs, ascender_ratio)) => FontEntry {
            pdf_name,
            font_ref: refs.font,
            ascender_ratio,
            glyphs: Some(glyphs),
        },
        None => {
            let base: &[u8] = if bold { b"Helvetica-Bold" } else { b"Helvetica" };
            if !standard {
                log::warn!("No usable font for {family} bold={bold}, using standard Helvetica");
            }
            pdf.type1_font(refs.font)
                .base_font(Name(base))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            FontEntry {
                pdf_name,
                font_ref: refs.font,
                ascender_ratio: 0.75,
                glyphs: None,
            }
        }
    };

    log::debug!(
        "register_font: {family} bold={bold} embedded={} → {:.1}ms",
        entry.is_embedded(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    entry
}

#[cfg(test)]
pub(crate) fn helvetica_entry(pdf_name: &str) -> FontEntry {
    FontEntry {
        pdf_name: pdf_name.to_string(),
        font_ref: Ref::new(1),
        ascender_ratio: 0.75,
        glyphs: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winansi_covers_latin_only() {
        assert_eq!(char_to_winansi('A'), Some(b'A'));
        assert_eq!(char_to_winansi('é'), Some(0xE9));
        assert_eq!(char_to_winansi('–'), Some(0x96));
        assert_eq!(char_to_winansi('Қ'), None);
    }

    #[test]
    fn helvetica_encoding_substitutes_unmappable() {
        let entry = helvetica_entry("F1");
        assert_eq!(entry.encode("Aә"), b"A?".to_vec());
        let used: HashSet<char> = "Aәb".chars().collect();
        assert_eq!(entry.missing_chars(&used), vec!['ә']);
    }

    #[test]
    fn helvetica_widths_scale_with_size() {
        let entry = helvetica_entry("F1");
        let w12 = entry.text_width("mm", 12.0);
        let w24 = entry.text_width("mm", 24.0);
        assert!((w12 - 2.0 * 833.0 * 12.0 / 1000.0).abs() < 1e-3);
        assert!((w24 - 2.0 * w12).abs() < 1e-3);
    }

    #[test]
    fn helvetica_family_is_not_embedded() {
        let mut pdf = Pdf::new();
        let mut next = 1;
        let mut alloc = || {
            next += 1;
            Ref::new(next)
        };
        let used: HashSet<char> = "Abc".chars().collect();
        for family in ["Helvetica", " helvetica "] {
            let entry = register_font(&mut pdf, family, true, "F2".into(), &mut alloc, &used);
            assert!(!entry.is_embedded());
        }
    }

    #[test]
    fn font_files_are_recognised_by_extension() {
        assert!(is_font_file(Path::new("/x/DejaVuSerif.TTF")));
        assert!(is_font_file(Path::new("a.ttc")));
        assert!(!is_font_file(Path::new("a.woff2")));
    }
}
