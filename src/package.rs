//! ZIP-based Office Open XML packages, shared by the `.docx` and `.xlsx`
//! bindings.
//!
//! Reading validates that `[Content_Types].xml` is present; writing assembles
//! a package from named parts.

use std::io::{Cursor, Read, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{SinkError, SourceError};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Read-only view of a package held in memory
pub struct OpcPackage<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> OpcPackage<'a> {
    pub fn open(bytes: &'a [u8]) -> Result<Self, SourceError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|err| match err {
            ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => {
                SourceError::NotZipContainer
            }
            ZipError::Io(e) => SourceError::Io(e),
            other => SourceError::Zip(other.to_string()),
        })?;

        if archive.by_name(CONTENT_TYPES_PART).is_err() {
            return Err(SourceError::MissingPart(CONTENT_TYPES_PART.to_string()));
        }

        Ok(Self { archive })
    }

    /// Read a required part
    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>, SourceError> {
        self.read_part_optional(name)?
            .ok_or_else(|| SourceError::MissingPart(name.to_string()))
    }

    /// Read a part that may legitimately be absent
    pub fn read_part_optional(&mut self, name: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(other) => return Err(SourceError::Zip(format!("{name}: {other}"))),
        };
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(Some(buf))
    }
}

/// Assemble a package from `(part name, content)` pairs
pub fn write_package(parts: &[(&str, &str)]) -> Result<Vec<u8>, SinkError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, content) in parts {
        writer.start_file(*name, options)?;
        writer.write_all(content.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_parts() {
        let bytes = write_package(&[(CONTENT_TYPES_PART, "<Types/>"), ("a/b.xml", "<b/>")]).unwrap();
        let mut package = OpcPackage::open(&bytes).unwrap();

        assert_eq!(package.read_part("a/b.xml").unwrap(), b"<b/>");
        assert!(package.read_part_optional("missing.xml").unwrap().is_none());
        assert!(matches!(
            package.read_part("missing.xml"),
            Err(SourceError::MissingPart(name)) if name == "missing.xml"
        ));
    }

    #[test]
    fn test_rejects_non_zip() {
        assert!(matches!(
            OpcPackage::open(b"plain text, not a package"),
            Err(SourceError::NotZipContainer)
        ));
    }

    #[test]
    fn test_rejects_zip_without_content_types() {
        let bytes = write_package(&[("only.xml", "<x/>")]).unwrap();
        assert!(matches!(
            OpcPackage::open(&bytes),
            Err(SourceError::MissingPart(name)) if name == CONTENT_TYPES_PART
        ));
    }
}
