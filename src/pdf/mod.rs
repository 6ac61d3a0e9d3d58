mod flow;
mod layout;
mod table;

use std::collections::HashSet;
use std::time::Instant;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::error::Error;
use crate::fonts::{FontEntry, register_font};
use crate::model::{DEFAULT_TITLE, DocumentStyle, MissingDelimiter, PageGeometry};
use crate::parse::{ParseOptions, parse_sections};

use flow::{FlowMetrics, FlowPage};
use layout::{Measure, Pen, wrap_words};
use table::{TableMetrics, TablePage};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

const TITLE_SIZE_DELTA: f32 = 4.0;
const LINE_HEIGHT_FACTOR: f32 = 1.25;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PdfLayout {
    /// Sections in a two-column grid; rows move or split across pages.
    #[default]
    Table,
    /// Raw lines, hard-wrapped at `max_chars` and flowed down the page.
    Flow,
}

#[derive(Clone, Debug)]
pub struct PdfOptions {
    pub title: String,
    pub style: DocumentStyle,
    pub page: PageGeometry,
    pub layout: PdfLayout,
    /// Flow layout: characters per wrapped chunk.
    pub max_chars: usize,
    /// Flow layout: cursor advance per chunk, in points.
    pub line_height: f32,
    /// Table layout: inner cell padding, in points.
    pub cell_padding: f32,
    pub shade_header: bool,
    pub parse: ParseOptions,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            style: DocumentStyle::default(),
            page: PageGeometry::default(),
            layout: PdfLayout::default(),
            max_chars: 100,
            line_height: 15.0,
            cell_padding: 4.0,
            shade_header: true,
            parse: ParseOptions::with_policy(MissingDelimiter::KeepAsName),
        }
    }
}

enum Body {
    Table {
        pages: Vec<TablePage>,
        metrics: TableMetrics,
    },
    Flow {
        pages: Vec<FlowPage>,
        metrics: FlowMetrics,
    },
}

impl Body {
    fn page_count(&self) -> usize {
        match self {
            Body::Table { pages, .. } => pages.len(),
            Body::Flow { pages, .. } => pages.len(),
        }
    }
}

enum Source {
    Sections(Vec<crate::model::Section>),
    Lines(Vec<String>),
}

fn warn_missing_glyphs(font: &FontEntry, used: &HashSet<char>) {
    let missing = font.missing_chars(used);
    if missing.is_empty() {
        return;
    }
    let sample: String = missing.iter().take(12).collect();
    if font.is_embedded() {
        log::warn!("{} characters have no glyph in the embedded font: {sample}", missing.len());
    } else {
        log::warn!(
            "{} characters are outside WinAnsi and print as '?': {sample}",
            missing.len()
        );
    }
}

/// Render lesson plan text to PDF bytes using the configured layout.
pub fn render(text: &str, opts: &PdfOptions) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();
    let page = &opts.page;
    if page.width <= 0.0 || page.height <= 0.0 || page.text_width() <= 0.0 {
        return Err(Error::Pdf(format!(
            "page {}x{} leaves no room for text",
            page.width, page.height
        )));
    }

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };
    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: source text and the characters each font must carry
    let source = match opts.layout {
        PdfLayout::Table => Source::Sections(parse_sections(text, &opts.parse)),
        PdfLayout::Flow => Source::Lines(flow::flow_lines(text, opts.max_chars)),
    };
    let mut regular_chars: HashSet<char> = HashSet::from([' ', '?']);
    let mut bold_chars: HashSet<char> = HashSet::from([' ', '?']);
    bold_chars.extend(opts.title.chars());
    match &source {
        Source::Sections(sections) => {
            for s in sections {
                bold_chars.extend(s.name.chars());
                regular_chars.extend(s.content.chars());
            }
        }
        Source::Lines(lines) => {
            for line in lines {
                regular_chars.extend(line.chars());
            }
        }
    }
    let t_collect = t0.elapsed();

    // Phase 2: fonts
    let family = &opts.style.font_family;
    let regular = register_font(&mut pdf, family, false, "F1".into(), &mut alloc, &regular_chars);
    let bold = register_font(&mut pdf, family, true, "F2".into(), &mut alloc, &bold_chars);
    warn_missing_glyphs(&regular, &regular_chars);
    warn_missing_glyphs(&bold, &bold_chars);
    let t_fonts = t0.elapsed();

    // Phase 3: layout
    let size = opts.style.font_size;
    let body_pen = Pen::new(&regular, size);
    let name_pen = Pen::new(&bold, size);
    let title_pen = Pen::new(&bold, size + TITLE_SIZE_DELTA);
    let title_lh = title_pen.size * LINE_HEIGHT_FACTOR;
    let title_lines = wrap_words(&opts.title, page.text_width(), &title_pen);
    let title_per_page = ((page.top() - page.margin_bottom) / title_lh).floor().max(1.0) as usize;
    let title_pages: Vec<&[String]> = title_lines.chunks(title_per_page).collect();
    // The body continues on the page holding the last title line.
    let (first_top, title_end) = match title_pages.last() {
        Some(last) => (
            page.top() - last.len() as f32 * title_lh - size,
            title_pages.len() - 1,
        ),
        None => (page.top(), 0),
    };
    let untitled = title_pages.is_empty();

    let (body, body_start) = match source {
        Source::Sections(sections) => {
            let mut metrics = TableMetrics {
                left: page.margin_left,
                col_widths: table::fit_columns(page.text_width()),
                padding: opts.cell_padding.max(0.0),
                line_height: size * LINE_HEIGHT_FACTOR,
                first_top,
                top: page.top(),
                bottom: page.margin_bottom,
            };
            let rows = table::wrap_rows(&sections, &metrics, &name_pen, &body_pen);
            let mut start = title_end;
            if !untitled && !rows.is_empty() && metrics.lines_fitting(first_top) == 0 {
                log::debug!("table: no room under the title, starting on a new page");
                metrics.first_top = metrics.top;
                start += 1;
            }
            log::debug!("table: {} rows", rows.len());
            let body = Body::Table {
                pages: table::paginate(rows, &metrics),
                metrics,
            };
            (body, start)
        }
        Source::Lines(lines) => {
            let mut metrics = FlowMetrics {
                first_top,
                top: page.top(),
                bottom: page.margin_bottom,
                line_height: opts.line_height.max(0.1),
            };
            let mut start = title_end;
            if !untitled && !lines.is_empty() && first_top - metrics.line_height < metrics.bottom {
                log::debug!("flow: no room under the title, starting on a new page");
                metrics.first_top = metrics.top;
                start += 1;
            }
            log::debug!(
                "flow: {} lines, {} per page",
                lines.len(),
                metrics.lines_per_page()
            );
            let body = Body::Flow {
                pages: flow::paginate(lines, &metrics),
                metrics,
            };
            (body, start)
        }
    };
    let t_layout = t0.elapsed();

    // Phase 4: content streams
    let page_count = title_pages.len().max(body_start + body.page_count()).max(1);
    let mut contents: Vec<Content> = Vec::with_capacity(page_count);
    for i in 0..page_count {
        let mut content = Content::new();
        if let Some(lines) = title_pages.get(i) {
            for (li, line) in lines.iter().enumerate() {
                let x = page.margin_left + (page.text_width() - title_pen.width(line)).max(0.0) / 2.0;
                let y = page.top() - title_pen.ascent() - li as f32 * title_lh;
                title_pen.show(&mut content, x, y, line);
            }
        }
        match (&body, i.checked_sub(body_start)) {
            (Body::Table { pages, metrics }, Some(bi)) if bi < pages.len() => table::draw_page(
                &mut content,
                &pages[bi],
                metrics,
                [name_pen, body_pen],
                opts.shade_header,
            ),
            (Body::Flow { pages, metrics }, Some(bi)) if bi < pages.len() => flow::draw_page(
                &mut content,
                &pages[bi],
                body_pen,
                page.margin_left,
                metrics.line_height,
            ),
            _ => {}
        }
        contents.push(content);
    }

    // Phase 5: assemble
    let n = contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);
    pdf.document_info(info_id)
        .title(TextStr(&opts.title))
        .producer(TextStr("lessonplan"));

    let fonts = [&regular, &bold];
    for i in 0..n {
        let mut pdf_page = pdf.page(page_ids[i]);
        pdf_page
            .media_box(Rect::new(0.0, 0.0, page.width, page.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = pdf_page.resources();
        let mut font_dict = resources.fonts();
        for font in fonts {
            font_dict.pair(Name(font.pdf_name.as_bytes()), font.font_ref);
        }
    }

    let bytes = pdf.finish();
    let t_total = t0.elapsed();
    log::info!(
        "PDF {:?}: {} pages, collect={:.1}ms, fonts={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({} bytes)",
        opts.layout,
        n,
        t_collect.as_secs_f64() * 1000.0,
        (t_fonts - t_collect).as_secs_f64() * 1000.0,
        (t_layout - t_fonts).as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        bytes.len(),
    );
    Ok(bytes)
}
