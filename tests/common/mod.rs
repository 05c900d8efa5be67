/*!
 * Common test utilities for the doctran test suite
 */

use anyhow::Result;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use doctran::app_config::Config;
use doctran::app_controller::Controller;
use doctran::database::HistoryRepository;
use doctran::document::{BoundingBox, DocumentBlock, Page};
use doctran::providers::{ExtractionOracle, TranslationOracle};
use doctran::storage::DocumentStore;


/// Route library logs through the test harness; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// The lease page: a heading with a 2x2 table carrying OCR metadata
pub fn lease_page() -> Page {
    let mut table = DocumentBlock::table_from_texts("t1", &[vec!["A", "B"], vec!["C", "D"]]);
    if let DocumentBlock::Table { rows, .. } = &mut table {
        rows[0][0].confidence = Some(0.91);
        rows[1][1].confidence = Some(0.42);
    }

    Page::new(1)
        .with_block(
            DocumentBlock::heading("h1", 1, "Lease")
                .with_bbox(BoundingBox::new(0.1, 0.05, 0.9, 0.1))
                .with_confidence(0.98),
        )
        .with_block(table.with_bbox(BoundingBox::new(0.1, 0.2, 0.9, 0.5)))
}

/// `count` single-paragraph pages numbered from 1
pub fn numbered_pages(count: u32) -> Vec<Page> {
    (1..=count)
        .map(|n| {
            Page::new(n)
                .with_block(DocumentBlock::heading(format!("h{}", n), 2, format!("Section {}", n)))
                .with_block(DocumentBlock::paragraph(format!("p{}", n), format!("Body of page {}", n)))
        })
        .collect()
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Title"/></w:styles>"#;

/// Wrap runs of text into a minimal word/document.xml
pub fn document_xml(runs: &[&str]) -> String {
    let body: String = runs
        .iter()
        .map(|text| {
            if text.starts_with(' ') || text.ends_with(' ') {
                format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text)
            } else {
                format!("<w:r><w:t>{}</w:t></w:r>", text)
            }
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p>{}</w:p></w:body></w:document>"#,
        body
    )
}

/// Build a minimal DOCX package around `document_xml`
pub fn build_docx(document_xml: &str) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    writer.start_file("[Content_Types].xml", stored)?;
    writer.write_all(CONTENT_TYPES.as_bytes())?;
    writer.start_file("word/document.xml", deflated)?;
    writer.write_all(document_xml.as_bytes())?;
    writer.start_file("word/styles.xml", deflated)?;
    writer.write_all(STYLES.as_bytes())?;
    writer.start_file("word/media/image1.png", stored)?;
    writer.write_all(&[0x89, b'P', b'N', b'G', 0, 1, 2, 3])?;

    Ok(writer.finish()?.into_inner())
}

/// Raw bytes of every entry in a zip package, by name
pub fn zip_entries(package: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(package))?;
    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut bytes)?;
        entries.push((entry.name().to_string(), bytes));
    }
    Ok(entries)
}

/// A configuration that passes validation, with storage and output under `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.target_language = "es".to_string();
    config.translation.active_provider_config_mut().api_key = "test-key".to_string();
    config.storage.directory = dir.join("uploads");
    config
}

/// Controller over mock collaborators with an in-memory history
pub fn test_controller(
    config: Config,
    translation: Arc<dyn TranslationOracle>,
    extraction: Arc<dyn ExtractionOracle>,
    store: Arc<dyn DocumentStore>,
) -> Result<Controller> {
    init_logging();
    let history = HistoryRepository::new_in_memory()?;
    Ok(Controller::with_collaborators(config, translation, extraction, store, Some(history)).with_progress(false))
}
