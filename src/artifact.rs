use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::docx::DOCX_CONTENT_TYPE;
use crate::error::Error;
use crate::pdf::PDF_CONTENT_TYPE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    Docx,
    Pdf,
}

impl ArtifactKind {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Docx => "docx",
            ArtifactKind::Pdf => "pdf",
        }
    }

    /// File name offered to the caller when the artifact is downloaded.
    pub fn download_name(self) -> &'static str {
        match self {
            ArtifactKind::Docx => "lesson_plan.docx",
            ArtifactKind::Pdf => "lesson_plan.pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::Docx => DOCX_CONTENT_TYPE,
            ArtifactKind::Pdf => PDF_CONTENT_TYPE,
        }
    }
}

/// A rendered document held in a uniquely named temporary file.
///
/// The file is removed when the artifact is dropped, whether it was streamed
/// to a caller, copied elsewhere, or abandoned on an error path.
#[derive(Debug)]
pub struct Artifact {
    kind: ArtifactKind,
    file: NamedTempFile,
    len: u64,
}

impl Artifact {
    /// Write fully rendered bytes to a new temporary file in `dir`, or in the
    /// system temp directory when `dir` is `None`. On failure the partial
    /// file is removed before the error is returned.
    pub fn create(kind: ArtifactKind, bytes: &[u8], dir: Option<&Path>) -> Result<Self, Error> {
        let suffix = format!(".{}", kind.extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix("lesson_plan_").suffix(&suffix);
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        log::debug!("artifact {} ({} bytes)", file.path().display(), bytes.len());
        Ok(Self {
            kind,
            file,
            len: bytes.len() as u64,
        })
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, Error> {
        let file = self.file.as_file_mut();
        file.seek(SeekFrom::Start(0))?;
        let mut out = Vec::with_capacity(self.len as usize);
        file.read_to_end(&mut out)?;
        Ok(out)
    }

    /// Read the artifact and delete the temporary file.
    pub fn into_bytes(mut self) -> Result<Vec<u8>, Error> {
        self.read_bytes()
    }

    /// Copy the artifact to `dest` and delete the temporary file. Copying
    /// rather than renaming works across filesystems.
    pub fn save_to(self, dest: &Path) -> Result<PathBuf, Error> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(self.file.path(), dest).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, dest.display())))
        })?;
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_is_removed_on_drop() {
        let artifact = Artifact::create(ArtifactKind::Pdf, b"%PDF-1.7", None).unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn into_bytes_round_trips_and_cleans_up() {
        let artifact = Artifact::create(ArtifactKind::Docx, b"PK\x03\x04", None).unwrap();
        let path = artifact.path().to_path_buf();
        assert_eq!(artifact.len(), 4);
        assert_eq!(artifact.into_bytes().unwrap(), b"PK\x03\x04");
        assert!(!path.exists());
    }

    #[test]
    fn names_are_unique() {
        let a = Artifact::create(ArtifactKind::Pdf, b"a", None).unwrap();
        let b = Artifact::create(ArtifactKind::Pdf, b"b", None).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = Artifact::create(
            ArtifactKind::Pdf,
            b"x",
            Some(Path::new("/nonexistent/lessonplan/dir")),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn download_metadata() {
        assert_eq!(ArtifactKind::Docx.download_name(), "lesson_plan.docx");
        assert_eq!(ArtifactKind::Pdf.content_type(), "application/pdf");
    }
}
