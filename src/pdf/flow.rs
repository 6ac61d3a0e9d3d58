//! Manual text flow: hard character wrapping and cursor-driven page breaks.

use pdf_writer::{Content, Str};

use super::layout::Pen;

/// Cut a line into chunks of at most `max_chars` characters. The cut ignores
/// word boundaries, so concatenating the chunks gives back the line exactly.
pub(super) fn wrap_chunks(line: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in line.char_indices() {
        if count == max_chars {
            chunks.push(&line[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < line.len() {
        chunks.push(&line[start..]);
    }
    chunks
}

/// All printable lines of the text after wrapping. An empty source line has
/// no chunks and takes no vertical space.
pub(super) fn flow_lines(text: &str, max_chars: usize) -> Vec<String> {
    let mut out: Vec<String> = text
        .lines()
        .flat_map(|line| wrap_chunks(line, max_chars))
        .map(str::to_string)
        .collect();
    // Whitespace-only input renders as the title alone.
    if out.iter().all(|l| l.trim().is_empty()) {
        out.clear();
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct FlowMetrics {
    /// Cursor start on the first page (below the title).
    pub(super) first_top: f32,
    /// Cursor start on every following page.
    pub(super) top: f32,
    pub(super) bottom: f32,
    pub(super) line_height: f32,
}

impl FlowMetrics {
    /// How many lines a fresh page takes before the cursor passes the bottom
    /// margin.
    pub(super) fn lines_per_page(&self) -> usize {
        if self.line_height <= 0.0 {
            return usize::MAX;
        }
        ((self.top - self.bottom) / self.line_height).floor().max(0.0) as usize + 1
    }
}

#[derive(Debug, Default, PartialEq)]
pub(super) struct FlowPage {
    /// First baseline on this page.
    pub(super) start_y: f32,
    pub(super) lines: Vec<String>,
}

/// Place lines on pages. Each line is emitted at the cursor, which then moves
/// down one line height; once it falls below the bottom margin the page is
/// closed and the next line starts a new page at the top. A page is only
/// opened when a line needs it, so there is never a trailing empty page.
pub(super) fn paginate(lines: Vec<String>, m: &FlowMetrics) -> Vec<FlowPage> {
    let mut pages = vec![FlowPage {
        start_y: m.first_top,
        lines: Vec::new(),
    }];
    let mut y = m.first_top;
    let mut page_full = false;

    for line in lines {
        if page_full {
            log::debug!("flow: page {} full, breaking", pages.len());
            pages.push(FlowPage {
                start_y: m.top,
                lines: Vec::new(),
            });
            y = m.top;
            page_full = false;
        }
        if let Some(page) = pages.last_mut() {
            page.lines.push(line);
        }
        y -= m.line_height;
        if y < m.bottom {
            page_full = true;
        }
    }
    pages
}

/// Write one page of flowed text as a single text object.
pub(super) fn draw_page(content: &mut Content, page: &FlowPage, pen: Pen, x: f32, line_height: f32) {
    if page.lines.is_empty() {
        return;
    }
    content.begin_text();
    pen.select(content);
    content.next_line(x, page.start_y);
    for (i, line) in page.lines.iter().enumerate() {
        if i > 0 {
            content.next_line(0.0, -line_height);
        }
        if !line.is_empty() {
            content.show(Str(&pen.font.encode(line)));
        }
    }
    content.end_text();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_page() -> FlowMetrics {
        // 100pt page, 10pt margins, 30pt lines: three lines per page.
        FlowMetrics {
            first_top: 90.0,
            top: 90.0,
            bottom: 10.0,
            line_height: 30.0,
        }
    }

    fn numbered(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn five_times_max_chars_gives_five_chunks() {
        let line = "x".repeat(500);
        let chunks = wrap_chunks(&line, 100);
        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.len() == 100));
    }

    #[test]
    fn chunks_reconstruct_the_line() {
        let line = "Оқушылар CLIL әдісімен жұмыс істейді: reading, speaking and writing tasks";
        for max in [1, 3, 7, 10, 100] {
            let chunks = wrap_chunks(line, max);
            assert_eq!(chunks.concat(), line, "max_chars={max}");
            assert!(chunks.iter().all(|c| c.chars().count() <= max));
        }
    }

    #[test]
    fn cut_falls_mid_word() {
        assert_eq!(wrap_chunks("abcdefgh", 3), ["abc", "def", "gh"]);
    }

    #[test]
    fn empty_line_has_no_chunks() {
        assert!(wrap_chunks("", 10).is_empty());
    }

    #[test]
    fn zero_max_chars_is_treated_as_one() {
        assert_eq!(wrap_chunks("ab", 0), ["a", "b"]);
    }

    #[test]
    fn empty_lines_take_no_slot() {
        let lines = flow_lines("one\n\ntwo", 10);
        assert_eq!(lines, ["one", "two"]);
    }

    #[test]
    fn empty_lines_do_not_add_pages() {
        let pages = paginate(flow_lines("a\n\nb\n\nc\n\nd", 10), &small_page());
        let counts: Vec<usize> = pages.iter().map(|p| p.lines.len()).collect();
        assert_eq!(counts, [3, 1]);
        assert_eq!(pages[1].lines, ["d"]);
    }

    #[test]
    fn blank_input_has_no_lines() {
        assert!(flow_lines("", 10).is_empty());
        assert!(flow_lines("\n  \n", 10).is_empty());
    }

    #[test]
    fn seven_lines_three_per_page() {
        let m = small_page();
        assert_eq!(m.lines_per_page(), 3);
        let pages = paginate(numbered(7), &m);
        let counts: Vec<usize> = pages.iter().map(|p| p.lines.len()).collect();
        assert_eq!(counts, [3, 3, 1]);
        assert_eq!(pages[2].lines, ["line 7"]);
    }

    #[test]
    fn exact_fill_has_no_trailing_page() {
        let pages = paginate(numbered(6), &small_page());
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn no_lines_still_one_page() {
        let pages = paginate(Vec::new(), &small_page());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].lines.is_empty());
    }

    #[test]
    fn first_page_starts_below_title() {
        let m = FlowMetrics {
            first_top: 60.0,
            ..small_page()
        };
        let pages = paginate(numbered(4), &m);
        let counts: Vec<usize> = pages.iter().map(|p| p.lines.len()).collect();
        assert_eq!(counts, [2, 2]);
        assert_eq!(pages[0].start_y, 60.0);
        assert_eq!(pages[1].start_y, 90.0);
    }

    #[test]
    fn letter_defaults_fit_47_lines() {
        let m = FlowMetrics {
            first_top: 742.0,
            top: 742.0,
            bottom: 50.0,
            line_height: 15.0,
        };
        assert_eq!(m.lines_per_page(), 47);
        let pages = paginate(numbered(100), &m);
        let counts: Vec<usize> = pages.iter().map(|p| p.lines.len()).collect();
        assert_eq!(counts, [47, 47, 6]);
    }

    #[test]
    fn long_line_spans_pages_in_order() {
        let line: String = ('a'..='z').cycle().take(10 * 4).collect();
        let lines = flow_lines(&line, 4);
        assert_eq!(lines.len(), 10);
        let pages = paginate(lines, &small_page());
        assert_eq!(pages.len(), 4);
        let rebuilt: String = pages.iter().flat_map(|p| p.lines.iter()).map(String::as_str).collect();
        assert_eq!(rebuilt, line);
    }
}
