/// One `(name, content)` pair parsed from a single line of lesson plan text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub content: String,
}

impl Section {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// What the parser does with a line that has no delimiter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingDelimiter {
    /// Drop the line.
    #[default]
    Skip,
    /// Keep the trimmed line as the section name with empty content.
    KeepAsName,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentStyle {
    pub font_family: String,
    pub font_size: f32, // points
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            font_family: "Times New Roman".to_string(),
            font_size: 12.0,
        }
    }
}

/// Page size and margins in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    /// US Letter with 50pt margins all around.
    pub const LETTER: PageGeometry = PageGeometry {
        width: 612.0,
        height: 792.0,
        margin_top: 50.0,
        margin_bottom: 50.0,
        margin_left: 50.0,
        margin_right: 50.0,
    };

    pub fn text_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Baseline/cursor position at the top of a fresh page.
    pub fn top(&self) -> f32 {
        self.height - self.margin_top
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::LETTER
    }
}

pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// Name column and content column widths, 100mm and 80mm.
pub const COLUMN_WIDTHS_MM: [f32; 2] = [100.0, 80.0];

pub fn column_widths_pt() -> [f32; 2] {
    COLUMN_WIDTHS_MM.map(|mm| mm * MM_TO_PT)
}

/// Light grey used for the first table row in both formats.
pub const HEADER_SHADING: [u8; 3] = [0xD9, 0xD9, 0xD9];

pub const DEFAULT_TITLE: &str = "CLIL Lesson Plan";
