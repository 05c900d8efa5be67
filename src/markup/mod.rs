/*!
 * In-place translation of word-processor packages.
 *
 * A DOCX file is a zip of XML parts. Only the text of `w:t` elements in the
 * main document part is replaced; every other byte of markup, and every other
 * part of the package, is carried over unchanged. All text nodes are
 * translated in one oracle batch, and nothing is patched unless the batch
 * comes back complete.
 */

use log::{debug, info};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::errors::{MarkupError, TranslationError};
use crate::providers::TranslationOracle;
use crate::translation::params::TranslationParams;
use crate::translation::units::{all_blank, TranslationUnits};

/// Main document part of a DOCX package
pub const DOCUMENT_PART: &str = "word/document.xml";

const TEXT_TAG: &[u8] = b"w:t";

/// How translated text is fitted back into nodes that are not whitespace-significant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitespacePolicy {
    /// Leading and trailing whitespace collapse to at most one space each
    #[default]
    CollapseEdges,
    /// Translated text is written exactly as returned
    Verbatim,
}

/// One `w:t` element's content
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub text: String,
    /// The element carries `xml:space="preserve"`
    pub preserve: bool,
}

/// The text nodes of a document part in document order
#[derive(Debug, Clone, PartialEq)]
pub struct TextNodeSet {
    pub nodes: Vec<TextNode>,
    pub policy: WhitespacePolicy,
}

/// Collapse leading and trailing whitespace runs to one space each.
pub fn collapse_edges(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return if text.is_empty() { String::new() } else { " ".to_string() };
    }

    let mut out = String::with_capacity(text.len());
    if text.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(trimmed);
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out
}

impl TextNodeSet {
    /// Final text for one node under the whitespace policy
    fn fit(&self, node: &TextNode, translated: String) -> String {
        if node.preserve && !translated.trim().is_empty() {
            return translated;
        }
        match self.policy {
            WhitespacePolicy::CollapseEdges => collapse_edges(&translated),
            WhitespacePolicy::Verbatim => translated,
        }
    }
}

impl TranslationUnits for TextNodeSet {
    type Output = Vec<String>;

    fn units(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.text.clone()).collect()
    }

    fn reinsert(&self, translated: Vec<String>) -> Result<Vec<String>, TranslationError> {
        if translated.len() != self.nodes.len() {
            return Err(TranslationError::Cardinality {
                expected: self.nodes.len(),
                actual: translated.len(),
            });
        }
        Ok(self
            .nodes
            .iter()
            .zip(translated)
            .map(|(node, text)| self.fit(node, text))
            .collect())
    }
}

fn xml_error(e: impl std::fmt::Display) -> MarkupError {
    MarkupError::Xml {
        part: DOCUMENT_PART.to_string(),
        message: e.to_string(),
    }
}

fn is_preserve(element: &BytesStart) -> bool {
    element
        .attributes()
        .flatten()
        .any(|attr| attr.key.as_ref() == b"xml:space" && attr.value.as_ref() == b"preserve")
}

/// Collect every `w:t` element's text in document order, empty ones included.
pub fn collect_text_nodes(xml: &str, policy: WhitespacePolicy) -> Result<TextNodeSet, MarkupError> {
    let mut reader = Reader::from_str(xml);
    let mut nodes = Vec::new();
    let mut current: Option<TextNode> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.name().as_ref() == TEXT_TAG => {
                current = Some(TextNode {
                    text: String::new(),
                    preserve: is_preserve(&e),
                });
            }
            Event::Empty(e) if e.name().as_ref() == TEXT_TAG => {
                nodes.push(TextNode {
                    text: String::new(),
                    preserve: is_preserve(&e),
                });
            }
            Event::Text(e) => {
                if let Some(node) = current.as_mut() {
                    node.text.push_str(&e.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(e) => {
                if let Some(node) = current.as_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) if e.name().as_ref() == TEXT_TAG => {
                if let Some(node) = current.take() {
                    nodes.push(node);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(TextNodeSet { nodes, policy })
}

/// Rewrite the part with `texts[i]` as the content of the i-th `w:t` element.
///
/// Everything outside `w:t` content is written back event by event.
pub fn replace_text_nodes(xml: &str, texts: &[String]) -> Result<String, MarkupError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(xml.len())));
    let mut texts = texts.iter();
    let mut inside = false;

    loop {
        let event = reader.read_event().map_err(xml_error)?;
        match event {
            Event::Start(e) if e.name().as_ref() == TEXT_TAG => {
                let text = texts.next().map(String::as_str).unwrap_or_default();
                writer.write_event(Event::Start(e)).map_err(xml_error)?;
                if !text.is_empty() {
                    writer.write_event(Event::Text(BytesText::new(text))).map_err(xml_error)?;
                }
                inside = true;
            }
            Event::Empty(e) if e.name().as_ref() == TEXT_TAG => {
                let text = texts.next().map(String::as_str).unwrap_or_default();
                if text.is_empty() {
                    writer.write_event(Event::Empty(e)).map_err(xml_error)?;
                } else {
                    let end = BytesEnd::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    writer.write_event(Event::Start(e)).map_err(xml_error)?;
                    writer.write_event(Event::Text(BytesText::new(text))).map_err(xml_error)?;
                    writer.write_event(Event::End(end)).map_err(xml_error)?;
                }
            }
            Event::Text(_) | Event::CData(_) if inside => {}
            Event::End(e) if e.name().as_ref() == TEXT_TAG => {
                inside = false;
                writer.write_event(Event::End(e)).map_err(xml_error)?;
            }
            Event::Eof => break,
            other => writer.write_event(other).map_err(xml_error)?,
        }
    }

    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_error)
}

fn package_error(e: impl std::fmt::Display) -> MarkupError {
    MarkupError::InvalidPackage(e.to_string())
}

/// Read the main document part of a package.
pub fn read_document_part(package: &[u8]) -> Result<String, MarkupError> {
    let mut archive = ZipArchive::new(Cursor::new(package)).map_err(package_error)?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| MarkupError::MissingPart(DOCUMENT_PART.to_string()))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml).map_err(xml_error)?;
    Ok(xml)
}

/// Rebuild the package with a new main document part.
///
/// Entries keep their order; all other entries are copied without recompression.
pub fn repackage(package: &[u8], document_xml: &str) -> Result<Vec<u8>, MarkupError> {
    let mut archive = ZipArchive::new(Cursor::new(package)).map_err(package_error)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(package.len())));

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(package_error)?;
        if entry.name() == DOCUMENT_PART {
            let options = SimpleFileOptions::default().compression_method(entry.compression());
            let name = entry.name().to_string();
            drop(entry);
            writer.start_file(name, options).map_err(package_error)?;
            writer.write_all(document_xml.as_bytes()).map_err(package_error)?;
        } else {
            writer.raw_copy_file(entry).map_err(package_error)?;
        }
    }

    let cursor = writer.finish().map_err(package_error)?;
    Ok(cursor.into_inner())
}

/// Translate a DOCX package in place.
///
/// All text nodes go to the oracle in a single batch. If every node is blank
/// the oracle is not called and the input is returned unchanged. A response of
/// the wrong length fails the whole operation without producing output.
pub async fn translate_markup_package(
    package: &[u8],
    oracle: &dyn TranslationOracle,
    params: &TranslationParams,
    policy: WhitespacePolicy,
) -> Result<Vec<u8>, MarkupError> {
    let xml = read_document_part(package)?;
    let nodes = collect_text_nodes(&xml, policy)?;
    let units = nodes.units();
    debug!("Collected {} text nodes from {}", units.len(), DOCUMENT_PART);

    if all_blank(&units) {
        info!("Document has no text to translate");
        return Ok(package.to_vec());
    }

    let translated = oracle
        .translate_units(&units, params)
        .await
        .map_err(TranslationError::from)?;
    let texts = nodes.reinsert(translated)?;

    let patched = replace_text_nodes(&xml, &texts)?;
    let output = repackage(package, &patched)?;
    info!("Translated {} text nodes", texts.len());
    Ok(output)
}
