use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Reading input or writing the temporary artifact failed.
    Io(std::io::Error),
    /// The DOCX package could not be assembled.
    Docx(String),
    /// Font embedding or PDF assembly failed.
    Pdf(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Docx(msg) => write!(f, "DOCX packaging failed: {msg}"),
            Error::Pdf(msg) => write!(f, "PDF rendering failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => Error::Io(io),
            other => Error::Docx(other.to_string()),
        }
    }
}
