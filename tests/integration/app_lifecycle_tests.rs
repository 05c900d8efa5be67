/*!
 * Integration tests for the application controller.
 *
 * Every test runs the controller over mock oracles, a temporary upload
 * directory and an in-memory history database.
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use doctran::app_config::{Config, ProcessingMode};
use doctran::app_controller::{Controller, OUTCOMES_SUFFIX, PAGES_SUFFIX};
use doctran::document::{Document, Page, TranslatedLine, TranslationOutcome};
use doctran::errors::{AppError, ExtractionError};
use doctran::markup::read_document_part;
use doctran::providers::mock::{MockBehavior, MockOracle};
use doctran::render::OutputFormat;
use doctran::storage::FileSystemStore;
use crate::common;
use crate::common::mock_collaborators::StickyStore;

const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn text_config(dir: &Path) -> Config {
    let mut config = common::test_config(dir);
    config.output.formats = vec![OutputFormat::Text];
    config
}

fn controller(config: Config, translation: MockOracle, extraction: MockOracle) -> Result<Controller> {
    let store = Arc::new(FileSystemStore::new(&config.storage.directory));
    common::test_controller(config, Arc::new(translation), Arc::new(extraction), store)
}

fn write_pages(dir: &Path, name: &str, pages: Vec<Page>) -> Result<std::path::PathBuf> {
    let json = serde_json::to_vec_pretty(&Document::new(pages))?;
    common::create_test_file(dir, name, &json)
}

fn upload_count(config: &Config) -> usize {
    fs::read_dir(&config.storage.directory)
        .map(|entries| entries.count())
        .unwrap_or(0)
}

/// Test that a failed extraction returns its own error even when cleaning up the upload fails too
#[tokio::test]
async fn test_extractPages_whenExtractionAndDeleteFail_shouldReturnExtractionError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let store = StickyStore::new(FileSystemStore::new(&config.storage.directory));
    let controller = common::test_controller(
        config,
        Arc::new(MockOracle::working()),
        Arc::new(MockOracle::working()),
        Arc::new(store.clone()),
    )?;

    let result = controller.extract_pages("scan.pdf", b"%PDF-1.7", "application/pdf").await;

    assert!(matches!(result, Err(AppError::Extraction(ExtractionError::Malformed(_)))));
    let attempts = store.delete_attempts();
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].ends_with("-scan.pdf"));
    Ok(())
}

/// Test that an extracted document with broken numbering is rejected and its upload removed
#[tokio::test]
async fn test_extractPages_withPageGap_shouldRejectAndDeleteUpload() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let extraction = MockOracle::working().with_extracted(vec![Page::new(1), Page::new(3)]);
    let controller = controller(config.clone(), MockOracle::working(), extraction)?;

    let result = controller.extract_pages("scan.pdf", b"%PDF", "application/pdf").await;

    assert!(matches!(result, Err(AppError::Extraction(ExtractionError::Structure(_)))));
    assert_eq!(upload_count(&config), 0);
    Ok(())
}

/// Test that uploads are kept only when the configuration asks for it
#[tokio::test]
async fn test_extractPages_keepUploads_shouldLeaveUploadInStore() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.storage.keep_uploads = true;
    let extraction = MockOracle::working().with_extracted(vec![common::lease_page()]);
    let controller = controller(config.clone(), MockOracle::working(), extraction)?;

    let pages = tokio_test::assert_ok!(controller.extract_pages("lease.png", &PNG_HEADER, "image/png").await);

    assert_eq!(pages, vec![common::lease_page()]);
    assert_eq!(upload_count(&config), 1);
    Ok(())
}

/// Test that a structured image run extracts, translates and renders text output
#[tokio::test]
async fn test_translateFile_structuredImage_shouldWriteTranslatedText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = text_config(temp_dir.path());
    let input = common::create_test_file(temp_dir.path(), "lease.png", &PNG_HEADER)?;
    let output_dir = temp_dir.path().join("out");
    let extraction = MockOracle::working().with_extracted(vec![common::lease_page()]);
    let controller = controller(config.clone(), MockOracle::working(), extraction)?;

    let report = controller.translate_file(&input, &output_dir, false).await?;

    let output = output_dir.join("lease_translated.txt");
    assert_eq!(report.output_files, vec![output.clone()]);
    assert_eq!(
        fs::read_to_string(&output)?,
        "[es] Lease\n\n[es] A\t[es] B\n[es] C\t[es] D\n"
    );
    assert_eq!(upload_count(&config), 0);

    let history = controller.list_history(None, true).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].file_name, "lease.png");
    assert_eq!(history[0].page_count, 1);
    Ok(())
}

/// Test that existing outputs are skipped unless overwriting is forced
#[tokio::test]
async fn test_translateFile_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = write_pages(temp_dir.path(), "memo_pages.json", common::numbered_pages(1))?;
    let output_dir = temp_dir.path().join("out");
    let translation = MockOracle::working();
    let controller = controller(text_config(temp_dir.path()), translation.clone(), MockOracle::working())?;

    controller.translate_file(&input, &output_dir, false).await?;
    let skipped = controller.translate_file(&input, &output_dir, false).await?;
    let forced = controller.translate_file(&input, &output_dir, true).await?;

    assert!(skipped.skipped);
    assert!(!forced.skipped);
    assert_eq!(translation.call_count(), 2);
    assert!(output_dir.join("memo_translated.txt").exists());
    Ok(())
}

/// Test the whole partial failure cycle: side files, partial output, then retry
#[tokio::test]
async fn test_translateFile_thenRetryFailed_shouldCompleteDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = write_pages(temp_dir.path(), "report_pages.json", common::numbered_pages(3))?;
    let output_dir = temp_dir.path().join("out");
    let controller = controller(
        text_config(temp_dir.path()),
        MockOracle::new(MockBehavior::FailOnCall(2)),
        MockOracle::working(),
    )?;

    let report = controller.translate_file(&input, &output_dir, false).await?;

    assert_eq!(report.failed_pages, vec![2]);
    let output = output_dir.join("report_translated.txt");
    let partial = fs::read_to_string(&output)?;
    assert!(partial.contains("[es] Section 1"));
    assert!(!partial.contains("Section 2"));

    let pages_file = output_dir.join(format!("report{}", PAGES_SUFFIX));
    let outcomes_file = output_dir.join(format!("report{}", OUTCOMES_SUFFIX));
    assert!(pages_file.exists());
    let saved: Vec<TranslationOutcome> = serde_json::from_slice(&fs::read(&outcomes_file)?)?;
    assert_eq!(saved.iter().filter(|o| !o.is_success()).count(), 1);

    let retried = controller.retry_failed(&pages_file, &outcomes_file, &output_dir).await?;

    assert!(retried.failed_pages.is_empty());
    let complete = fs::read_to_string(&output)?;
    assert!(complete.contains("[es] Section 2"));
    assert!(complete.find("Section 1") < complete.find("Section 2"));
    let rewritten: Vec<TranslationOutcome> = serde_json::from_slice(&fs::read(&outcomes_file)?)?;
    assert!(rewritten.iter().all(TranslationOutcome::is_success));

    let history = controller.list_history(None, false).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].failed_pages, vec![2]);
    Ok(())
}

/// Test that retrying a cancelled run translates the pages it never reached
#[tokio::test]
async fn test_retryFailed_afterCancelledRun_shouldTranslateMissingPages() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output_dir = temp_dir.path().join("out");
    let pages_file = write_pages(temp_dir.path(), "memo_pages.json", common::numbered_pages(3))?;
    let first_page = common::numbered_pages(1).remove(0);
    let outcomes = serde_json::to_vec(&vec![TranslationOutcome::Success(first_page)])?;
    let outcomes_file = common::create_test_file(temp_dir.path(), "memo_outcomes.json", &outcomes)?;
    let translation = MockOracle::working();
    let controller = controller(text_config(temp_dir.path()), translation.clone(), MockOracle::working())?;

    let report = controller.retry_failed(&pages_file, &outcomes_file, &output_dir).await?;

    assert!(report.failed_pages.is_empty());
    assert_eq!(translation.call_count(), 2);
    let output = fs::read_to_string(output_dir.join("memo_translated.txt"))?;
    assert!(output.contains("[es] Section 2"));
    assert!(output.contains("[es] Section 3"));
    let rewritten: Vec<TranslationOutcome> = serde_json::from_slice(&fs::read(&outcomes_file)?)?;
    let numbers: Vec<u32> = rewritten.iter().map(TranslationOutcome::page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    Ok(())
}

/// Test that a run where every page fails produces no output but keeps the retry state
#[tokio::test]
async fn test_translateFile_allPagesFail_shouldErrorAndSaveRetryState() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = write_pages(temp_dir.path(), "deed_pages.json", common::numbered_pages(2))?;
    let output_dir = temp_dir.path().join("out");
    let controller = controller(text_config(temp_dir.path()), MockOracle::failing(), MockOracle::working())?;

    let result = controller.translate_file(&input, &output_dir, false).await;

    tokio_test::assert_err!(result);
    assert!(!output_dir.join("deed_translated.txt").exists());
    assert!(output_dir.join(format!("deed{}", OUTCOMES_SUFFIX)).exists());
    Ok(())
}

/// Test that direct mode sends images straight to the image oracle
#[tokio::test]
async fn test_translateFile_directImage_shouldRenderReturnedLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = text_config(temp_dir.path());
    config.output.mode = ProcessingMode::Direct;
    let input = common::create_test_file(temp_dir.path(), "sign.png", &PNG_HEADER)?;
    let translation = MockOracle::working().with_lines(vec![
        TranslatedLine::new("Prohibido fumar", true),
        TranslatedLine::new("Multa de 50 euros", false),
    ]);
    let extraction = MockOracle::failing();
    let controller = controller(config, translation, extraction.clone())?;

    controller.translate_file(&input, temp_dir.path(), false).await?;

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("sign_translated.txt"))?,
        "Prohibido fumar\n\nMulta de 50 euros\n"
    );
    assert_eq!(extraction.call_count(), 0);
    Ok(())
}

/// Test that DOCX input is translated in place whatever formats are configured
#[tokio::test]
async fn test_translateFile_docx_shouldWriteTranslatedPackage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let package = common::build_docx(&common::document_xml(&["Terms", "Signature"]))?;
    let input = common::create_test_file(temp_dir.path(), "terms.docx", &package)?;
    let controller = controller(text_config(temp_dir.path()), MockOracle::working(), MockOracle::failing())?;

    let report = controller.translate_file(&input, temp_dir.path(), false).await?;

    let output = temp_dir.path().join("terms_translated.docx");
    assert_eq!(report.output_files, vec![output.clone()]);
    assert!(read_document_part(&fs::read(&output)?)?.contains("<w:t>[es] Signature</w:t>"));
    assert!(!temp_dir.path().join("terms_translated.txt").exists());
    Ok(())
}

/// Test that a folder run translates each document once and skips them on a second pass
#[tokio::test]
async fn test_runFolder_shouldProcessDocumentsAndSkipOutputs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let docs = temp_dir.path().join("docs");
    fs::create_dir_all(&docs)?;
    for name in ["a.docx", "b.docx"] {
        common::create_test_file(&docs, name, &common::build_docx(&common::document_xml(&["Hello"]))?)?;
    }
    common::create_test_file(&docs, "notes.md", b"# not a document")?;
    let translation = MockOracle::working();
    let controller = controller(text_config(temp_dir.path()), translation.clone(), MockOracle::failing())?;

    let first = controller.run_folder(&docs, false).await?;
    let second = controller.run_folder(&docs, false).await?;

    assert_eq!((first.succeeded, first.failed, first.skipped), (2, 0, 0));
    assert_eq!((second.succeeded, second.failed, second.skipped), (0, 0, 2));
    assert_eq!(translation.call_count(), 2);
    Ok(())
}

/// Test that extraction to a pages file round-trips into a translation run
#[tokio::test]
async fn test_extractToFile_thenTranslate_shouldUseEditedPages() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "lease.pdf", b"%PDF-1.4")?;
    let extraction = MockOracle::working().with_extracted(vec![common::lease_page()]);
    let controller = controller(text_config(temp_dir.path()), MockOracle::working(), extraction)?;

    let pages_file = controller.extract_to_file(&input, None).await?;
    assert_eq!(pages_file, temp_dir.path().join("lease_pages.json"));

    let mut document: Document = serde_json::from_slice(&fs::read(&pages_file)?)?;
    assert!(document.pages[0].edit_text("h1", None, "Lease agreement"));
    fs::write(&pages_file, serde_json::to_vec(&document)?)?;

    let output_dir = temp_dir.path().join("out");
    controller.translate_file(&pages_file, &output_dir, false).await?;

    let text = fs::read_to_string(output_dir.join("lease_translated.txt"))?;
    assert!(text.starts_with("[es] Lease agreement\n"));
    Ok(())
}

/// Test that history records can be deleted by id
#[tokio::test]
async fn test_deleteHistory_shouldRemoveRecord() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = write_pages(temp_dir.path(), "memo_pages.json", common::numbered_pages(1))?;
    let controller = controller(text_config(temp_dir.path()), MockOracle::working(), MockOracle::working())?;
    controller.translate_file(&input, temp_dir.path(), false).await?;
    let id = controller.list_history(Some(1), true).await?[0].id.clone();

    assert!(controller.delete_history(&id).await?);
    assert!(!controller.delete_history(&id).await?);
    assert!(controller.list_history(None, true).await?.is_empty());
    Ok(())
}
