// WHY: collaborator seams for paragraph sources and annotated-document sinks
// The pipelines only see these traits, never a concrete file format

use std::path::Path;

use crate::docx::DocxSource;
use crate::duplicates::AnnotatedLine;
use crate::error::{SinkError, SourceError};

/// Yields the ordered paragraph texts of a fully loaded document
pub trait DocumentSource {
    fn paragraphs(&self, bytes: &[u8]) -> Result<Vec<String>, SourceError>;
}

/// Serializes annotated paragraphs, preserving order
pub trait DocumentSink {
    fn render(&self, lines: &[AnnotatedLine]) -> Result<Vec<u8>, SinkError>;
}

/// Plain UTF-8 text, one paragraph per line (`\n` or `\r\n`)
#[derive(Debug, Default, Clone, Copy)]
pub struct TextSource;

impl DocumentSource for TextSource {
    fn paragraphs(&self, bytes: &[u8]) -> Result<Vec<String>, SourceError> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            SourceError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        Ok(text.lines().map(str::to_string).collect())
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Pick a paragraph source from the file extension
pub fn source_for_path(path: &Path) -> Result<Box<dyn DocumentSource + Send + Sync>, SourceError> {
    match extension(path).as_str() {
        "docx" => Ok(Box::new(DocxSource)),
        "txt" | "text" => Ok(Box::new(TextSource)),
        other => Err(SourceError::UnsupportedSource(if other.is_empty() {
            path.display().to_string()
        } else {
            format!(".{other}")
        })),
    }
}
