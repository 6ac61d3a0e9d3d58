use pdf_writer::{Content, Name, Str};

use crate::fonts::FontEntry;

/// Width of a piece of text at a fixed font and size.
pub(super) trait Measure {
    fn width(&self, text: &str) -> f32;
}

/// A font at a size: measures text and writes it into a content stream.
#[derive(Clone, Copy)]
pub(super) struct Pen<'a> {
    pub(super) font: &'a FontEntry,
    pub(super) size: f32,
}

impl Measure for Pen<'_> {
    fn width(&self, text: &str) -> f32 {
        self.font.text_width(text, self.size)
    }
}

impl<'a> Pen<'a> {
    pub(super) fn new(font: &'a FontEntry, size: f32) -> Self {
        Self { font, size }
    }

    pub(super) fn ascent(&self) -> f32 {
        self.font.ascender_ratio * self.size
    }

    pub(super) fn select(&self, content: &mut Content) {
        content.set_font(Name(self.font.pdf_name.as_bytes()), self.size);
    }

    /// Show one line of text with its baseline starting at `(x, y)`.
    pub(super) fn show(&self, content: &mut Content, x: f32, y: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        content.begin_text();
        self.select(content);
        content.next_line(x, y);
        content.show(Str(&self.font.encode(text)));
        content.end_text();
    }
}

/// Greedy word wrap. Whitespace runs between words collapse to one space;
/// a word wider than `max_width` is cut by characters so nothing is lost.
pub(super) fn wrap_words(text: &str, max_width: f32, measure: &impl Measure) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() {
            let candidate = format!("{current} {word}");
            if measure.width(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            lines.push(std::mem::take(&mut current));
        }
        if measure.width(word) <= max_width {
            current.push_str(word);
        } else {
            let mut pieces = split_to_width(word, max_width, measure);
            if let Some(last) = pieces.pop() {
                lines.extend(pieces);
                current = last;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Cut a single word into pieces no wider than `max_width`, at least one
/// character per piece.
fn split_to_width(word: &str, max_width: f32, measure: &impl Measure) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && measure.width(&current) > max_width {
            current.pop();
            pieces.push(std::mem::replace(&mut current, ch.to_string()));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
pub(super) struct Mono(pub(super) f32);

#[cfg(test)]
impl Measure for Mono {
    fn width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.0
    }
}
