// WHY: end-to-end runs: load everything, transform in memory, then write artifacts
// I/O failures surface as RunError tagged with the path involved

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::classify::{classify_line, RowKind};
use crate::config::RunConfig;
use crate::document::{source_for_path, DocumentSink};
use crate::docx::DocxSink;
use crate::duplicates::mark_duplicates;
use crate::error::{RunError, SinkError};
use crate::frequency::{count_lines, FrequencyTable};
use crate::output::frequency_report_rows;
use crate::reader::{AsyncFileReader, ReaderConfig};
use crate::xlsx::{FrequencyTableSource, TabularSink, XlsxTableSink, XlsxTableSource};

/// Output collaborators and the external table reader used by a run
pub struct Collaborators {
    pub document_sink: Box<dyn DocumentSink + Send + Sync>,
    pub table_source: Box<dyn FrequencyTableSource + Send + Sync>,
    pub table_sink: Box<dyn TabularSink + Send + Sync>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            document_sink: Box::new(DocxSink::default()),
            table_source: Box::new(XlsxTableSource),
            table_sink: Box::new(XlsxTableSink),
        }
    }
}

/// Summary of an annotate run
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnnotateStats {
    pub source: String,
    pub bytes_read: u64,
    pub lines_read: u64,
    pub distinct_lines: u64,
    pub duplicate_lines: u64,
    pub annotated_document: String,
    pub frequency_report: String,
    pub processing_time_ms: u64,
}

/// Summary of a classify run
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClassifyStats {
    pub source: String,
    pub frequency_table: String,
    pub bytes_read: u64,
    pub lines_read: u64,
    pub table_entries: u64,
    pub sorted_lines: u64,
    pub single_token_rows: u64,
    pub top_token_rows: u64,
    pub reference_table: String,
    pub processing_time_ms: u64,
}

/// Annotated copy path used when none is configured: `<stem>_annotated.docx`
/// beside the source
pub fn default_annotated_path(source_path: &Path) -> PathBuf {
    let file_stem = source_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    source_path.with_file_name(format!("{file_stem}_annotated.docx"))
}

/// Underline repeated lines and report line frequencies
pub async fn annotate(input: &Path, config: &RunConfig) -> Result<AnnotateStats, RunError> {
    annotate_with(input, config, &Collaborators::default()).await
}

pub async fn annotate_with(
    input: &Path,
    config: &RunConfig,
    collaborators: &Collaborators,
) -> Result<AnnotateStats, RunError> {
    let start_time = Instant::now();
    let annotated_path = config
        .annotated_document
        .clone()
        .unwrap_or_else(|| default_annotated_path(input));

    let (lines, bytes_read) = load_paragraphs(input, config).await?;

    let frequencies = count_lines(&lines);
    let annotated = mark_duplicates(&lines);
    let duplicate_lines = annotated.iter().filter(|line| line.underline).count() as u64;
    debug!(
        "Counted {} distinct lines, {} immediate repeats",
        frequencies.len(),
        duplicate_lines
    );

    let document = collaborators
        .document_sink
        .render(&annotated)
        .map_err(|e| RunError::sink_write(&annotated_path, e))?;
    let report = collaborators
        .table_sink
        .render(&frequency_report_rows(frequencies.sorted_by_count()))
        .map_err(|e| RunError::sink_write(&config.frequency_report, e))?;

    // Both artifacts are rendered before either is written
    write_artifact(&annotated_path, &document).await?;
    write_artifact(&config.frequency_report, &report).await?;

    let stats = AnnotateStats {
        source: input.display().to_string(),
        bytes_read,
        lines_read: lines.len() as u64,
        distinct_lines: frequencies.len() as u64,
        duplicate_lines,
        annotated_document: annotated_path.display().to_string(),
        frequency_report: config.frequency_report.display().to_string(),
        processing_time_ms: start_time.elapsed().as_millis() as u64,
    };
    info!(
        "Annotated {} lines from {} ({} repeats) in {}ms",
        stats.lines_read, stats.source, stats.duplicate_lines, stats.processing_time_ms
    );
    Ok(stats)
}

/// Reorganize each line around its dominant token from an external table
pub async fn classify(
    input: &Path,
    frequency_table: &Path,
    config: &RunConfig,
) -> Result<ClassifyStats, RunError> {
    classify_with(input, frequency_table, config, &Collaborators::default()).await
}

pub async fn classify_with(
    input: &Path,
    frequency_table: &Path,
    config: &RunConfig,
    collaborators: &Collaborators,
) -> Result<ClassifyStats, RunError> {
    let start_time = Instant::now();

    let (lines, bytes_read) = load_paragraphs(input, config).await?;
    let table = load_table(frequency_table, config, collaborators).await?;

    let progress = progress_bar(lines.len() as u64, config.progress);
    let mut rows = Vec::with_capacity(lines.len());
    let (mut sorted_lines, mut single_token_rows, mut top_token_rows) = (0u64, 0u64, 0u64);

    for line in &lines {
        let classified = classify_line(line, &table);
        match classified.kind() {
            RowKind::SortedLine => sorted_lines += 1,
            RowKind::SingleToken => single_token_rows += 1,
            RowKind::TopTokenRow => top_token_rows += 1,
        }
        rows.push(classified.to_row());
        progress.inc(1);
    }
    progress.finish_and_clear();

    let workbook = collaborators
        .table_sink
        .render(&rows)
        .map_err(|e| RunError::sink_write(&config.reference_table, e))?;
    write_artifact(&config.reference_table, &workbook).await?;

    let stats = ClassifyStats {
        source: input.display().to_string(),
        frequency_table: frequency_table.display().to_string(),
        bytes_read,
        lines_read: lines.len() as u64,
        table_entries: table.len() as u64,
        sorted_lines,
        single_token_rows,
        top_token_rows,
        reference_table: config.reference_table.display().to_string(),
        processing_time_ms: start_time.elapsed().as_millis() as u64,
    };
    info!(
        "Classified {} lines against {} table entries in {}ms",
        stats.lines_read, stats.table_entries, stats.processing_time_ms
    );
    Ok(stats)
}

fn reader_for(config: &RunConfig) -> AsyncFileReader {
    AsyncFileReader::new(ReaderConfig {
        use_mmap: config.use_mmap,
        ..Default::default()
    })
}

/// Read and parse the source document completely before any processing
async fn load_paragraphs(input: &Path, config: &RunConfig) -> Result<(Vec<String>, u64), RunError> {
    let source = source_for_path(input).map_err(|e| RunError::source_read(input, e))?;
    let (bytes, stats) = reader_for(config)
        .read_bytes(input)
        .await
        .map_err(|e| RunError::source_read(input, e))?;
    let paragraphs = source
        .paragraphs(&bytes)
        .map_err(|e| RunError::source_read(input, e))?;
    info!("Loaded {} paragraphs from {}", paragraphs.len(), input.display());
    Ok((paragraphs, stats.bytes_read))
}

async fn load_table(
    path: &Path,
    config: &RunConfig,
    collaborators: &Collaborators,
) -> Result<FrequencyTable, RunError> {
    let (bytes, _stats) = reader_for(config)
        .read_bytes(path)
        .await
        .map_err(|e| RunError::source_read(path, e))?;
    let table = collaborators
        .table_source
        .load(&bytes)
        .map_err(|e| RunError::source_read(path, e))?;
    info!("Loaded {} frequency entries from {}", table.len(), path.display());
    Ok(table)
}

async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), RunError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RunError::sink_write(path, SinkError::Io(e)))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| RunError::sink_write(path, SinkError::Io(e)))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn progress_bar(len: u64, enabled: bool) -> ProgressBar {
    if !enabled || len == 0 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} lines") {
        bar.set_style(style);
    }
    bar
}
