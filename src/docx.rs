//! WordprocessingML (`.docx`) bindings for the document collaborators.
//!
//! Reading yields the text of the top-level body paragraphs of
//! `word/document.xml`. Writing produces a minimal package with one run per
//! paragraph, single-underlined when the line is marked.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

use crate::document::{DocumentSink, DocumentSource};
use crate::duplicates::AnnotatedLine;
use crate::error::{SinkError, SourceError};
use crate::package::{self, OpcPackage, CONTENT_TYPES_PART};

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const PACKAGE_RELS_PART: &str = "_rels/.rels";

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Reads paragraphs from a `.docx` package
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxSource;

impl DocumentSource for DocxSource {
    fn paragraphs(&self, bytes: &[u8]) -> Result<Vec<String>, SourceError> {
        let mut package = OpcPackage::open(bytes)?;
        let xml = package.read_part(DOCUMENT_PART)?;
        parse_document_xml(&xml)
    }
}

/// Paragraph texts of the direct `w:p` children of `w:body`.
///
/// Run text (`w:t`) is concatenated; `w:tab` becomes `\t`, text-wrapping
/// `w:br` and `w:cr` become `\n`. Paragraphs inside tables are skipped, as is
/// text of paragraphs nested in text boxes and of Office Math (`m:oMath`).
pub fn parse_document_xml(xml: &[u8]) -> Result<Vec<String>, SourceError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    let mut current: Option<String> = None;
    let mut paragraph_depth = 0usize;
    let mut nested = 0usize;
    let mut math = 0usize;
    let mut run_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"body" if body_depth.is_none() => body_depth = Some(depth),
                    b"p" => {
                        if current.is_some() {
                            nested += 1;
                        } else if body_depth.map(|b| depth == b + 1).unwrap_or(false) {
                            current = Some(String::new());
                            paragraph_depth = depth;
                        }
                    }
                    b"oMath" | b"oMathPara" if current.is_some() => math += 1,
                    b"r" if current.is_some() && nested == 0 && math == 0 => run_depth += 1,
                    b"t" if run_depth > 0 && nested == 0 && math == 0 => {
                        let raw = reader
                            .read_text(e.name())
                            .map_err(|e| SourceError::Xml(e.to_string()))?;
                        let text = quick_xml::escape::unescape(&raw)
                            .map_err(|e| SourceError::Xml(e.to_string()))?;
                        if let Some(paragraph) = current.as_mut() {
                            paragraph.push_str(&text);
                        }
                        // read_text consumed the matching end tag
                        depth -= 1;
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" if current.is_none() && body_depth == Some(depth) => {
                    paragraphs.push(String::new());
                }
                b"tab" if run_depth > 0 && nested == 0 && math == 0 => {
                    if let Some(paragraph) = current.as_mut() {
                        paragraph.push('\t');
                    }
                }
                b"br" | b"cr" if run_depth > 0 && nested == 0 && math == 0 => {
                    if is_line_break(&e)? {
                        if let Some(paragraph) = current.as_mut() {
                            paragraph.push('\n');
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"p" if current.is_some() => {
                        if depth == paragraph_depth {
                            paragraphs.extend(current.take());
                            run_depth = 0;
                            math = 0;
                        } else {
                            nested = nested.saturating_sub(1);
                        }
                    }
                    b"oMath" | b"oMathPara" if math > 0 => math -= 1,
                    b"r" if run_depth > 0 && nested == 0 && math == 0 => run_depth -= 1,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// `w:cr` always breaks; `w:br` only when it is a text-wrapping break
fn is_line_break(element: &BytesStart<'_>) -> Result<bool, SourceError> {
    if element.local_name().as_ref() == b"cr" {
        return Ok(true);
    }
    for attr in element.attributes() {
        let attr = attr.map_err(|e| SourceError::Xml(e.to_string()))?;
        if attr.key.local_name().as_ref() == b"type" {
            let value = attr.unescape_value().map_err(|e| SourceError::Xml(e.to_string()))?;
            return Ok(value == "textWrapping");
        }
    }
    Ok(true)
}

/// Writes annotated lines as a `.docx` package
#[derive(Debug, Default, Clone)]
pub struct DocxSink {
    /// Space after each paragraph, in twentieths of a point
    pub space_after_twips: u32,
}

impl DocumentSink for DocxSink {
    fn render(&self, lines: &[AnnotatedLine]) -> Result<Vec<u8>, SinkError> {
        for (index, line) in lines.iter().enumerate() {
            if !line.text.chars().all(is_xml_char) {
                warn!(line = index, "Dropping characters not allowed in XML");
            }
        }
        let document = document_xml(lines);
        let styles = styles_xml(self.space_after_twips);
        package::write_package(&[
            (CONTENT_TYPES_PART, CONTENT_TYPES_XML),
            (PACKAGE_RELS_PART, PACKAGE_RELS_XML),
            (DOCUMENT_RELS_PART, DOCUMENT_RELS_XML),
            (DOCUMENT_PART, document.as_str()),
            (STYLES_PART, styles.as_str()),
        ])
    }
}

fn document_xml(lines: &[AnnotatedLine]) -> String {
    let mut xml = String::with_capacity(256 + lines.len() * 64);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(r#"<w:document xmlns:w="{WORDML_NS}"><w:body>"#));
    for line in lines {
        xml.push_str("<w:p><w:r>");
        if line.underline {
            xml.push_str(r#"<w:rPr><w:u w:val="single"/></w:rPr>"#);
        }
        push_run_content(&mut xml, &line.text);
        xml.push_str("</w:r></w:p>");
    }
    xml.push_str("</w:body></w:document>");
    xml
}

/// Run content with tabs and line breaks as their own elements; characters
/// XML forbids are dropped
fn push_run_content(xml: &mut String, text: &str) {
    let mut segment_start = 0;
    for (i, ch) in text.char_indices() {
        let element = match ch {
            '\t' => "<w:tab/>",
            '\n' | '\r' => "<w:br/>",
            ch if !is_xml_char(ch) => "",
            _ => continue,
        };
        push_text(xml, &text[segment_start..i]);
        xml.push_str(element);
        segment_start = i + ch.len_utf8();
    }
    push_text(xml, &text[segment_start..]);
}

/// Characters XML 1.0 permits in content
fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn push_text(xml: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    xml.push_str(r#"<w:t xml:space="preserve">"#);
    xml.push_str(&quick_xml::escape::escape(text));
    xml.push_str("</w:t>");
}

fn styles_xml(space_after_twips: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{WORDML_NS}"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:after="{space_after_twips}"/></w:pPr></w:style></w:styles>"#
    )
}
