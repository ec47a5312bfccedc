use std::path::PathBuf;
use thiserror::Error;

/// Failure reading a source document or frequency table
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a ZIP container")]
    NotZipContainer,
    #[error("ZIP error: {0}")]
    Zip(String),
    #[error("missing package part: {0}")]
    MissingPart(String),
    #[error("XML parse error: {0}")]
    Xml(String),
    #[error("invalid cell address: {0}")]
    InvalidAddress(String),
    #[error("shared string index {0} out of bounds")]
    SharedStringOutOfBounds(usize),
    #[error("workbook has no worksheets")]
    NoWorksheet,
    #[error("unsupported source type: {0}")]
    UnsupportedSource(String),
}

/// Failure writing an output artifact
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("row index {0} exceeds the worksheet limit")]
    RowOutOfRange(usize),
}

/// Run-level failure, tagged with the artifact it concerns
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to read {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: SourceError,
    },
    #[error("failed to write {}: {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: SinkError,
    },
}

impl RunError {
    pub fn source_read(path: impl Into<PathBuf>, source: impl Into<SourceError>) -> Self {
        RunError::SourceRead { path: path.into(), source: source.into() }
    }

    pub fn sink_write(path: impl Into<PathBuf>, source: impl Into<SinkError>) -> Self {
        RunError::SinkWrite { path: path.into(), source: source.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            RunError::SourceRead { path, .. } | RunError::SinkWrite { path, .. } => path,
        }
    }
}
