// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use redline::config::RunConfig;
use redline::document::{DocumentSink, DocumentSource};
use redline::docx::{DocxSink, DocxSource};
use redline::duplicates::AnnotatedLine;
use redline::package::OpcPackage;
use redline::xlsx::{read_active_sheet, SheetRow};

/// Test fixture helper for creating temporary directories with source documents and tables
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();

        Self { temp_dir, root_path }
    }

    /// Path inside the fixture directory
    pub fn path<P: AsRef<Path>>(&self, relative_path: P) -> PathBuf {
        self.root_path.join(relative_path)
    }

    /// Run configuration that keeps every output inside the fixture directory
    pub fn config(&self) -> RunConfig {
        RunConfig {
            frequency_report: self.path("frequencyTable.xlsx"),
            reference_table: self.path("referenceTable.xlsx"),
            progress: false,
            ..Default::default()
        }
    }

    /// Create a `.docx` source with one paragraph per line
    pub fn create_docx<P: AsRef<Path>>(&self, relative_path: P, lines: &[&str]) -> PathBuf {
        let file_path = self.root_path.join(relative_path);
        let annotated: Vec<AnnotatedLine> = lines.iter().map(|l| AnnotatedLine::plain(*l)).collect();
        let bytes = DocxSink::default()
            .render(&annotated)
            .expect("Failed to render docx fixture");
        write_with_parents(&file_path, &bytes);
        file_path
    }

    /// Create a plain text source
    pub fn create_text<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);
        write_with_parents(&file_path, content.as_bytes());
        file_path
    }

    /// Create a frequency-table workbook: key in column A, count in column B
    pub fn create_table_xlsx<P: AsRef<Path>>(&self, relative_path: P, entries: &[(&str, f64)]) -> PathBuf {
        let file_path = self.root_path.join(relative_path);
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (row, (key, count)) in (0u32..).zip(entries) {
            worksheet.write_string(row, 0, *key).expect("Failed to write key");
            worksheet.write_number(row, 1, *count).expect("Failed to write count");
        }
        let bytes = workbook.save_to_buffer().expect("Failed to save table fixture");
        write_with_parents(&file_path, &bytes);
        file_path
    }
}

fn write_with_parents(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    fs::write(path, bytes).expect("Failed to write test file");
}

/// Paragraph texts of a `.docx` file
pub fn read_docx_lines(path: &Path) -> Vec<String> {
    let bytes = fs::read(path).expect("Failed to read docx");
    DocxSource.paragraphs(&bytes).expect("Failed to parse docx")
}

/// Per-paragraph underline flags of a `.docx` file
pub fn read_docx_underlines(path: &Path) -> Vec<bool> {
    let xml = read_part_string(path, "word/document.xml");
    xml.split("</w:p>")
        .filter(|segment| segment.contains("<w:p>") || segment.contains("<w:p "))
        .map(|segment| segment.contains("<w:u "))
        .collect()
}

/// Raw XML of one package part
pub fn read_part_string(path: &Path, part: &str) -> String {
    let bytes = fs::read(path).expect("Failed to read package");
    let mut package = OpcPackage::open(&bytes).expect("Failed to open package");
    let data = package.read_part(part).expect("Missing package part");
    String::from_utf8(data).expect("Part is not UTF-8")
}

/// Rows of the active worksheet of a workbook
pub fn read_sheet(path: &Path) -> Vec<SheetRow> {
    let bytes = fs::read(path).expect("Failed to read workbook");
    read_active_sheet(&bytes).expect("Failed to parse workbook")
}

/// Text of every populated cell, row by row
pub fn sheet_text(path: &Path) -> Vec<Vec<String>> {
    read_sheet(path)
        .iter()
        .map(|row| row.cells.iter().map(|(_, value)| value.as_text()).collect())
        .collect()
}
