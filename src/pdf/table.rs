use pdf_writer::Content;

use crate::model::{HEADER_SHADING, Section, column_widths_pt};

use super::layout::{Measure, Pen, wrap_words};

const GRID_LINE_WIDTH: f32 = 0.5;

/// Wrapped lines of the name cell and the content cell of one row.
pub(super) type CellLines = [Vec<String>; 2];

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct TableMetrics {
    pub(super) left: f32,
    pub(super) col_widths: [f32; 2],
    pub(super) padding: f32,
    pub(super) line_height: f32,
    /// Top of the table on the first page (below the title).
    pub(super) first_top: f32,
    pub(super) top: f32,
    pub(super) bottom: f32,
}

impl TableMetrics {
    /// Text lines a row segment starting at `slot_top` can hold.
    pub(super) fn lines_fitting(&self, slot_top: f32) -> usize {
        ((slot_top - self.bottom - 2.0 * self.padding) / self.line_height)
            .floor()
            .max(0.0) as usize
    }
}

/// The 100mm/80mm columns, scaled down proportionally when the text area is
/// narrower than both together.
pub(super) fn fit_columns(text_width: f32) -> [f32; 2] {
    let widths = column_widths_pt();
    let total: f32 = widths.iter().sum();
    if total <= text_width || text_width <= 0.0 {
        return widths;
    }
    let scale = text_width / total;
    widths.map(|w| w * scale)
}

pub(super) fn wrap_rows(
    sections: &[Section],
    m: &TableMetrics,
    name: &impl Measure,
    content: &impl Measure,
) -> Vec<CellLines> {
    let name_w = (m.col_widths[0] - 2.0 * m.padding).max(1.0);
    let content_w = (m.col_widths[1] - 2.0 * m.padding).max(1.0);
    sections
        .iter()
        .map(|s| {
            [
                wrap_words(&s.name, name_w, name),
                wrap_words(&s.content, content_w, content),
            ]
        })
        .collect()
}

/// A row, or the part of a row that landed on one page.
#[derive(Debug, PartialEq)]
pub(super) struct RowSegment {
    pub(super) row: usize,
    pub(super) top: f32,
    pub(super) height: f32,
    pub(super) cells: CellLines,
}

#[derive(Debug, Default, PartialEq)]
pub(super) struct TablePage {
    pub(super) segments: Vec<RowSegment>,
}

/// Distribute rows over pages. A row that does not fit in the space left
/// moves to the next page; a row taller than a whole page is split line by
/// line, continuing on as many pages as it needs.
pub(super) fn paginate(rows: Vec<CellLines>, m: &TableMetrics) -> Vec<TablePage> {
    let mut pages = vec![TablePage::default()];
    let mut slot_top = m.first_top;
    let fresh_capacity = m.lines_fitting(m.top).max(1);

    for (ri, [name, content]) in rows.into_iter().enumerate() {
        let total = name.len().max(content.len()).max(1);
        let mut name = name.into_iter();
        let mut content = content.into_iter();
        let mut remaining = total;

        while remaining > 0 {
            let at_page_top = pages.last().is_none_or(|p| p.segments.is_empty());
            let avail = m.lines_fitting(slot_top);
            let take = if remaining <= avail {
                remaining
            } else if !at_page_top && (remaining <= fresh_capacity || avail == 0) {
                log::debug!(
                    "TABLE row={ri} lines={remaining} avail={avail} → next page"
                );
                pages.push(TablePage::default());
                slot_top = m.top;
                continue;
            } else {
                avail.max(1)
            };

            let height = take as f32 * m.line_height + 2.0 * m.padding;
            let cells = [
                name.by_ref().take(take).collect(),
                content.by_ref().take(take).collect(),
            ];
            if let Some(page) = pages.last_mut() {
                page.segments.push(RowSegment {
                    row: ri,
                    top: slot_top,
                    height,
                    cells,
                });
            }
            slot_top -= height;
            remaining -= take;
        }
    }
    pages
}

fn fill_rect(content: &mut Content, [r, g, b]: [u8; 3], x: f32, y: f32, w: f32, h: f32) {
    content.save_state();
    content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    content.rect(x, y, w, h);
    content.fill_nonzero();
    content.restore_state();
}

/// Draw one page of the table: first-row shading, cell text, then the grid.
pub(super) fn draw_page(
    content: &mut Content,
    page: &TablePage,
    m: &TableMetrics,
    pens: [Pen; 2],
    shade_first_row: bool,
) {
    for seg in &page.segments {
        let bottom = seg.top - seg.height;
        let mut x = m.left;
        for (col, lines) in seg.cells.iter().enumerate() {
            let w = m.col_widths[col];
            if shade_first_row && seg.row == 0 {
                fill_rect(content, HEADER_SHADING, x, bottom, w, seg.height);
            }
            let pen = pens[col];
            for (i, line) in lines.iter().enumerate() {
                let baseline = seg.top - m.padding - pen.ascent() - i as f32 * m.line_height;
                pen.show(content, x + m.padding, baseline, line);
            }
            x += w;
        }
    }

    if page.segments.is_empty() {
        return;
    }
    content.save_state();
    content.set_line_width(GRID_LINE_WIDTH);
    for seg in &page.segments {
        let mut x = m.left;
        for w in m.col_widths {
            content.rect(x, seg.top - seg.height, w, seg.height);
            x += w;
        }
    }
    content.stroke();
    content.restore_state();
}
