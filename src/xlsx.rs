//! SpreadsheetML (`.xlsx`) bindings for the tabular collaborators.
//!
//! The frequency-table source reads the workbook's active sheet (shared
//! strings, inline strings, numbers) and keeps rows whose first two cells are
//! both populated. The sink writes plain, underlined, rich and numeric cells
//! with `rust_xlsxwriter`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rust_xlsxwriter::{Format, FormatUnderline, Workbook};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{SinkError, SourceError};
use crate::frequency::FrequencyTable;
use crate::output::{Cell, Row};
use crate::package::OpcPackage;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Builds a key -> count table from a fully loaded tabular source
pub trait FrequencyTableSource {
    fn load(&self, bytes: &[u8]) -> Result<FrequencyTable, SourceError>;
}

/// Serializes rows addressed by sequential zero-based index
pub trait TabularSink {
    fn render(&self, rows: &[Row]) -> Result<Vec<u8>, SinkError>;
}

/// Value of one populated worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    /// Numeric cell; keeps the stored text alongside the parsed value
    Number { value: f64, raw: String },
    Bool(bool),
    Error(String),
}

impl CellValue {
    /// Textual form, as stored in the sheet
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(text) | CellValue::Error(text) => text.clone(),
            CellValue::Number { raw, .. } => raw.clone(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
        }
    }

    /// Non-negative whole count, if this cell holds one
    pub fn as_count(&self) -> Option<u64> {
        match *self {
            CellValue::Number { value, .. }
                if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 =>
            {
                Some(value as u64)
            }
            _ => None,
        }
    }
}

/// Populated cells of one worksheet row, by zero-based column
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub index: u32,
    pub cells: Vec<(u32, CellValue)>,
}

impl SheetRow {
    pub fn cell(&self, col: u32) -> Option<&CellValue> {
        self.cells.iter().find(|(c, _)| *c == col).map(|(_, v)| v)
    }
}

/// Reads a frequency table from column A (key) and column B (count)
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxTableSource;

impl FrequencyTableSource for XlsxTableSource {
    fn load(&self, bytes: &[u8]) -> Result<FrequencyTable, SourceError> {
        let rows = read_active_sheet(bytes)?;
        Ok(table_from_rows(&rows))
    }
}

/// Rows with fewer than two populated leading cells, or with a count that is
/// not a non-negative whole number, are skipped.
pub fn table_from_rows(rows: &[SheetRow]) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    for row in rows {
        let (key, count) = match (row.cell(0), row.cell(1)) {
            (Some(key), Some(count)) => (key, count),
            _ => {
                debug!("Skipping row {}: fewer than two populated cells", row.index + 1);
                continue;
            }
        };
        match count.as_count() {
            Some(count) => table.insert(key.as_text(), count),
            None => warn!(
                "Skipping row {}: count {:?} is not a non-negative whole number",
                row.index + 1,
                count.as_text()
            ),
        }
    }
    table
}

/// All populated rows of the workbook's active sheet, in sheet order
pub fn read_active_sheet(bytes: &[u8]) -> Result<Vec<SheetRow>, SourceError> {
    let mut package = OpcPackage::open(bytes)?;

    let workbook = parse_workbook_xml(&package.read_part(WORKBOOK_PART)?)?;
    let relationships = match package.read_part_optional(WORKBOOK_RELS_PART)? {
        Some(xml) => parse_relationships(&xml)?,
        None => HashMap::new(),
    };
    let shared_strings = match package.read_part_optional(SHARED_STRINGS_PART)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let index = workbook.active_tab.min(workbook.sheets.len().saturating_sub(1));
    let sheet = workbook.sheets.get(index).ok_or(SourceError::NoWorksheet)?;
    let target = resolve_sheet_target(sheet, &relationships, index);
    debug!("Reading worksheet '{}' from {}", sheet.name, target);

    parse_sheet_xml(&package.read_part(&target)?, &shared_strings)
}

struct SheetDescriptor {
    name: String,
    rel_id: Option<String>,
    sheet_id: Option<u32>,
}

struct WorkbookInfo {
    sheets: Vec<SheetDescriptor>,
    active_tab: usize,
}

fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, SourceError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"si" => {
                current.clear();
                in_si = true;
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"rPh" => in_phonetic = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"rPh" => in_phonetic = false,
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" && in_si && !in_phonetic => {
                current.push_str(&read_text(&mut reader, &e)?);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"si" => {
                strings.push(std::mem::take(&mut current));
                in_si = false;
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

fn parse_workbook_xml(xml: &[u8]) -> Result<WorkbookInfo, SourceError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();
    let mut active_tab = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                let name = get_attr_value(&e, b"name")?;
                let rel_id = get_attr_value(&e, b"r:id")?;
                let sheet_id = get_attr_value(&e, b"sheetId")?.and_then(|v| v.parse::<u32>().ok());
                if let Some(name) = name {
                    sheets.push(SheetDescriptor { name, rel_id, sheet_id });
                }
            }
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"workbookView" && active_tab.is_none() =>
            {
                active_tab = Some(
                    get_attr_value(&e, b"activeTab")?
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0),
                );
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }

    if sheets.is_empty() {
        return Err(SourceError::NoWorksheet);
    }

    Ok(WorkbookInfo { sheets, active_tab: active_tab.unwrap_or(0) })
}

fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>, SourceError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut map = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"Relationship" => {
                let id = get_attr_value(&e, b"Id")?;
                let target = get_attr_value(&e, b"Target")?;
                let rel_type = get_attr_value(&e, b"Type")?;
                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    if rel_type.contains("worksheet") {
                        map.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(map)
}

fn resolve_sheet_target(
    sheet: &SheetDescriptor,
    relationships: &HashMap<String, String>,
    index: usize,
) -> String {
    if let Some(target) = sheet.rel_id.as_ref().and_then(|id| relationships.get(id)) {
        return normalize_target(target);
    }

    let guessed = sheet
        .sheet_id
        .map(|id| format!("xl/worksheets/sheet{id}.xml"))
        .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", index + 1));
    normalize_target(&guessed)
}

fn normalize_target(target: &str) -> String {
    let trimmed = target.trim_start_matches('/');
    if trimmed.starts_with("xl/") {
        trimmed.to_string()
    } else {
        format!("xl/{trimmed}")
    }
}

fn parse_sheet_xml(xml: &[u8], shared_strings: &[String]) -> Result<Vec<SheetRow>, SourceError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut rows: Vec<SheetRow> = Vec::new();
    let mut current: Option<SheetRow> = None;
    let mut next_row = 0u32;
    let mut next_col = 0u32;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"row" => {
                let index = row_index(&e)?.unwrap_or(next_row);
                next_row = index + 1;
                next_col = 0;
                current = Some(SheetRow { index, cells: Vec::new() });
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"row" => {
                next_row = row_index(&e)?.unwrap_or(next_row) + 1;
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"row" => {
                if let Some(row) = current.take() {
                    if !row.cells.is_empty() {
                        rows.push(row);
                    }
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"c" => {
                let col = cell_column(&e)?.unwrap_or(next_col);
                next_col = col + 1;
                let value = parse_cell(&mut reader, &e, shared_strings)?;
                if let (Some(row), Some(value)) = (current.as_mut(), value) {
                    row.cells.push((col, value));
                }
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"c" => {
                next_col = cell_column(&e)?.unwrap_or(next_col) + 1;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

fn row_index(element: &BytesStart<'_>) -> Result<Option<u32>, SourceError> {
    Ok(get_attr_value(element, b"r")?
        .and_then(|r| r.trim().parse::<u32>().ok())
        .and_then(|r| r.checked_sub(1)))
}

fn cell_column(element: &BytesStart<'_>) -> Result<Option<u32>, SourceError> {
    match get_attr_value(element, b"r")? {
        Some(address) => address_to_column(&address)
            .map(Some)
            .ok_or(SourceError::InvalidAddress(address)),
        None => Ok(None),
    }
}

/// Zero-based column of an A1-style address ("B7" -> 1)
fn address_to_column(address: &str) -> Option<u32> {
    let letters: Vec<u8> = address
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .collect();
    let digits = &address[letters.len()..];
    if letters.is_empty() || letters.len() > 3 || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let col = letters
        .iter()
        .fold(0u32, |acc, b| acc * 26 + u32::from(b.to_ascii_uppercase() - b'A' + 1));
    Some(col - 1)
}

fn parse_cell(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    shared_strings: &[String],
) -> Result<Option<CellValue>, SourceError> {
    let cell_type = get_attr_value(start, b"t")?;

    let mut value_text: Option<String> = None;
    let mut inline_text: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"v" => {
                value_text = Some(read_text(reader, &e)?);
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"is" => {
                inline_text = Some(read_inline_string(reader)?);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == start.local_name().as_ref() => break,
            Ok(Event::Eof) => return Err(SourceError::Xml("unexpected EOF inside cell".into())),
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }

    match inline_text {
        Some(text) => Ok(Some(CellValue::Text(text))),
        None => convert_value(value_text.as_deref(), cell_type.as_deref(), shared_strings),
    }
}

fn read_inline_string(reader: &mut Reader<&[u8]>) -> Result<String, SourceError> {
    let mut buf = Vec::new();
    let mut value = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                value.push_str(&read_text(reader, &e)?);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"is" => break,
            Ok(Event::Eof) => {
                return Err(SourceError::Xml("unexpected EOF inside inline string".into()));
            }
            Err(e) => return Err(to_xml_err(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(value)
}

fn convert_value(
    value_text: Option<&str>,
    cell_type: Option<&str>,
    shared_strings: &[String],
) -> Result<Option<CellValue>, SourceError> {
    let raw = match value_text {
        Some(t) => t,
        None => return Ok(None),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Some(CellValue::Text(String::new())));
    }

    match cell_type {
        Some("s") => {
            let idx = trimmed
                .parse::<usize>()
                .map_err(|e| SourceError::Xml(e.to_string()))?;
            let text = shared_strings
                .get(idx)
                .ok_or(SourceError::SharedStringOutOfBounds(idx))?;
            Ok(Some(CellValue::Text(text.clone())))
        }
        Some("b") => Ok(match trimmed {
            "1" => Some(CellValue::Bool(true)),
            "0" => Some(CellValue::Bool(false)),
            _ => None,
        }),
        Some("e") => Ok(Some(CellValue::Error(trimmed.to_string()))),
        Some("str") | Some("inlineStr") => Ok(Some(CellValue::Text(raw.to_string()))),
        _ => match trimmed.parse::<f64>() {
            Ok(value) => Ok(Some(CellValue::Number { value, raw: trimmed.to_string() })),
            Err(_) => Ok(Some(CellValue::Text(trimmed.to_string()))),
        },
    }
}

/// Element text up to its end tag, entities resolved
fn read_text(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<String, SourceError> {
    let raw = reader.read_text(start.name()).map_err(to_xml_err)?;
    let text = quick_xml::escape::unescape(&raw).map_err(|e| SourceError::Xml(e.to_string()))?;
    Ok(text.into_owned())
}

fn get_attr_value(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, SourceError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| SourceError::Xml(e.to_string()))?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value().map_err(to_xml_err)?.into_owned()));
        }
    }
    Ok(None)
}

fn to_xml_err(err: quick_xml::Error) -> SourceError {
    SourceError::Xml(err.to_string())
}

/// Most characters a worksheet cell may hold
pub const MAX_CELL_CHARS: usize = 32_767;

/// Longest prefix of `text` with at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Writes rows to the first worksheet of a new workbook.
///
/// Cell text beyond [`MAX_CELL_CHARS`] is cut off with a warning; for rich
/// cells the limit applies to the runs combined.
#[derive(Debug, Default, Clone)]
pub struct XlsxTableSink;

impl TabularSink for XlsxTableSink {
    fn render(&self, rows: &[Row]) -> Result<Vec<u8>, SinkError> {
        let mut workbook = Workbook::new();
        let underline = Format::new().set_underline(FormatUnderline::Single);
        let plain = Format::new();

        let worksheet = workbook.add_worksheet();
        for (index, row) in rows.iter().enumerate() {
            let row_num = u32::try_from(index).map_err(|_| SinkError::RowOutOfRange(index))?;
            for (col, cell) in (0u16..).zip(&row.cells) {
                match cell {
                    Cell::Text(text) => {
                        let text = fit_cell(text, index, col);
                        worksheet.write_string(row_num, col, text)?;
                    }
                    Cell::Emphasized(text) => {
                        let text = fit_cell(text, index, col);
                        worksheet.write_string_with_format(row_num, col, text, &underline)?;
                    }
                    Cell::Count(count) => {
                        worksheet.write_number(row_num, col, *count as f64)?;
                    }
                    Cell::Rich(runs) => {
                        let mut budget = MAX_CELL_CHARS;
                        let mut segments: Vec<(&Format, &str)> = Vec::with_capacity(runs.len());
                        for run in runs {
                            let text = truncate_chars(&run.text, budget);
                            if text.len() < run.text.len() {
                                warn!(row = index, column = col, "Rich cell exceeds {MAX_CELL_CHARS} characters; truncated");
                            }
                            budget -= text.chars().count();
                            // WHY: a rich string segment may not be empty
                            if !text.is_empty() {
                                segments.push((if run.emphasis { &underline } else { &plain }, text));
                            }
                        }
                        match segments.as_slice() {
                            [] => {
                                worksheet.write_string(row_num, col, "")?;
                            }
                            [(format, text)] => {
                                worksheet.write_string_with_format(row_num, col, *text, *format)?;
                            }
                            _ => {
                                worksheet.write_rich_string(row_num, col, &segments)?;
                            }
                        }
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

fn fit_cell(text: &str, row: usize, col: u16) -> &str {
    let fitted = truncate_chars(text, MAX_CELL_CHARS);
    if fitted.len() < text.len() {
        warn!(row, column = col, "Cell exceeds {MAX_CELL_CHARS} characters; truncated");
    }
    fitted
}
