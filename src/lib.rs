mod artifact;
mod docx;
mod error;
mod fonts;
mod model;
mod parse;
mod pdf;

#[cfg(feature = "server")]
pub mod server;

pub use artifact::{Artifact, ArtifactKind};
pub use docx::{DOCX_CONTENT_TYPE, DocxOptions};
pub use error::Error;
pub use model::{DEFAULT_TITLE, DocumentStyle, MissingDelimiter, PageGeometry, Section};
pub use parse::{DEFAULT_DELIMITER, ParseOptions, parse_sections};
pub use pdf::{PDF_CONTENT_TYPE, PdfLayout, PdfOptions};

use std::path::Path;
use std::time::Instant;

/// Parse lesson plan text and render it as a DOCX table document.
pub fn render_docx(text: &str, opts: &DocxOptions) -> Result<Vec<u8>, Error> {
    let sections = parse_sections(text, &opts.parse);
    docx::render(&sections, opts)
}

/// Render lesson plan text as a paginated PDF.
pub fn render_pdf(text: &str, opts: &PdfOptions) -> Result<Vec<u8>, Error> {
    pdf::render(text, opts)
}

fn export(
    kind: ArtifactKind,
    temp_dir: Option<&Path>,
    render: impl FnOnce() -> Result<Vec<u8>, Error>,
) -> Result<Artifact, Error> {
    let t0 = Instant::now();

    // Render fully in memory first so a failure never leaves a partial file.
    let bytes = render()?;
    let t_render = t0.elapsed();

    let artifact = Artifact::create(kind, &bytes, temp_dir)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: render={:.1}ms, write={:.1}ms, total={:.1}ms ({} {} bytes)",
        t_render.as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        kind.extension(),
        bytes.len(),
    );

    Ok(artifact)
}

/// Render a DOCX into a temporary artifact that is deleted on drop.
pub fn export_docx(
    text: &str,
    opts: &DocxOptions,
    temp_dir: Option<&Path>,
) -> Result<Artifact, Error> {
    export(ArtifactKind::Docx, temp_dir, || render_docx(text, opts))
}

/// Render a PDF into a temporary artifact that is deleted on drop.
pub fn export_pdf(text: &str, opts: &PdfOptions, temp_dir: Option<&Path>) -> Result<Artifact, Error> {
    export(ArtifactKind::Pdf, temp_dir, || render_pdf(text, opts))
}
