/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;

use doctran::file_utils::{FileManager, FileType};
use doctran::render::OutputFormat;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "lease.pdf", b"%PDF-1.4")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test that dir_exists returns false for non-existent directories
#[test]
fn test_dir_exists_withNonExistentDir_shouldReturnFalse() {
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));
}

/// Test that output paths follow the translated naming pattern for every format
#[test]
fn test_generate_output_path_withEachFormat_shouldUseExtension() {
    let input = Path::new("/data/in/contract.scan.pdf");
    let output_dir = Path::new("/data/out");

    assert_eq!(
        FileManager::generate_output_path(input, output_dir, OutputFormat::Pdf),
        Path::new("/data/out/contract.scan_translated.pdf")
    );
    assert_eq!(
        FileManager::generate_output_path(input, output_dir, OutputFormat::Text),
        Path::new("/data/out/contract.scan_translated.txt")
    );
}

/// Test that a file with no usable stem still gets a name
#[test]
fn test_file_stem_withoutStem_shouldFallBackToDocument() {
    assert_eq!(FileManager::file_stem("/"), "document");
    assert_eq!(FileManager::file_stem("notes_pages.txt"), "notes_pages");
}

/// Test that a zip without an extension is taken for a word-processor package
#[test]
fn test_detect_file_type_withZipMagic_shouldReturnDocx() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let package = common::build_docx(&common::document_xml(&["Hello"]))?;
    let path = common::create_test_file(temp_dir.path(), "upload", &package)?;

    assert_eq!(FileManager::detect_file_type(&path)?, FileType::Docx);
    Ok(())
}

/// Test that a missing file cannot be classified
#[test]
fn test_detect_file_type_withMissingFile_shouldFail() {
    assert!(FileManager::detect_file_type("/nonexistent/file.pdf").is_err());
}

/// Test that mime types are reported for supported kinds only
#[test]
fn test_file_type_mimeType_shouldMatchKind() {
    assert_eq!(FileType::Pdf.mime_type(), Some("application/pdf"));
    assert_eq!(FileType::Image("image/webp").mime_type(), Some("image/webp"));
    assert_eq!(FileType::Unknown.mime_type(), None);
    assert!(!FileType::Unknown.is_supported());
}

/// Test that documents are found recursively in sorted order
#[test]
fn test_find_documents_withNestedDirs_shouldRecurse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("2024");
    fs::create_dir_all(&nested)?;
    common::create_test_file(&nested, "b.pdf", b"%PDF")?;
    common::create_test_file(temp_dir.path(), "a.jpg", &[0xff, 0xd8, 0xff])?;
    common::create_test_file(temp_dir.path(), "readme.md", b"# docs")?;

    let found = FileManager::find_documents(temp_dir.path())?;

    assert_eq!(found.len(), 2);
    assert!(found[0].ends_with("2024/b.pdf"));
    assert!(found[1].ends_with("a.jpg"));
    Ok(())
}
