/*!
 * Tests for the structural document model and its JSON wire format
 */

use anyhow::Result;
use serde_json::json;

use doctran::document::{validate_pages, Document, DocumentBlock, Page, Stage, TranslationOutcome};
use doctran::errors::StructureError;
use crate::common;

/// Test that a page written by the extraction oracle decodes with defaults filled in
#[test]
fn test_page_fromOracleJson_shouldDecodeBlocks() -> Result<()> {
    let value = json!({
        "pages": [{
            "pageNumber": 1,
            "blocks": [
                { "type": "heading", "id": "h1", "level": 2, "text": "Lease" },
                { "type": "list_item", "id": "l1", "text": "Rent", "confidence": 0.8 },
                { "type": "table", "id": "t1", "rows": [[
                    { "id": "c1", "text": "A", "row": 0, "col": 0 },
                    { "id": "c2", "row": 0, "col": 1 }
                ]]}
            ]
        }]
    });

    let document: Document = serde_json::from_value(value)?;
    document.validate()?;

    let page = &document.pages[0];
    assert_eq!(page.stage, Stage::Source);
    assert_eq!(page.blocks.len(), 3);
    assert_eq!(page.blocks[1].confidence(), Some(0.8));
    assert_eq!(page.blocks[2].rows()[0][1].text, "");
    Ok(())
}

/// Test that outcomes use the status tag with camelCase failure fields
#[test]
fn test_translationOutcome_serialize_shouldUseStatusTag() -> Result<()> {
    let failure = TranslationOutcome::Failure {
        page_number: 2,
        error_message: "timeout".to_string(),
    };
    let success = TranslationOutcome::Success(Page::new(1));

    let failure_json = serde_json::to_value(&failure)?;
    let success_json = serde_json::to_value(&success)?;

    assert_eq!(failure_json, json!({ "status": "failure", "pageNumber": 2, "errorMessage": "timeout" }));
    assert_eq!(success_json["status"], "success");
    assert_eq!(success_json["pageNumber"], 1);

    let decoded: TranslationOutcome = serde_json::from_value(failure_json)?;
    assert_eq!(decoded, failure);
    Ok(())
}

/// Test that the lease fixture satisfies every page invariant
#[test]
fn test_validate_leasePage_shouldHaveNoProblems() {
    assert!(common::lease_page().validate().is_empty());
}

/// Test that a table cell id colliding with a block id is reported
#[test]
fn test_validate_duplicateIdAcrossCell_shouldReportDuplicate() {
    let page = Page::new(1)
        .with_block(DocumentBlock::paragraph("t1-cell-0-0", "clash"))
        .with_block(DocumentBlock::table_from_texts("t1", &[vec!["A"]]));

    let problems = page.validate();

    assert_eq!(
        problems,
        vec![StructureError::DuplicateId { page: 1, id: "t1-cell-0-0".to_string() }]
    );
}

/// Test that jagged tables and bad heading levels are both reported
#[test]
fn test_validate_jaggedTableAndBadLevel_shouldReportBoth() {
    let page = Page::new(1)
        .with_block(DocumentBlock::heading("h", 9, "Too deep"))
        .with_block(DocumentBlock::table_from_texts("t", &[vec!["A", "B"], vec!["C"]]));

    let problems = page.validate();

    assert_eq!(problems.len(), 2);
    assert!(matches!(problems[0], StructureError::HeadingLevel { level: 9, .. }));
    assert!(matches!(problems[1], StructureError::JaggedTable { row: 1, expected: 2, found: 1, .. }));
}

/// Test that page numbers must run from 1 without gaps
#[test]
fn test_validatePages_withGap_shouldFail() {
    let pages = vec![Page::new(1), Page::new(3)];

    let result = validate_pages(&pages);

    assert_eq!(result, Err(StructureError::PageNumbering { expected: 2, found: 3 }));
}

/// Test that user corrections reach both plain blocks and single cells
#[test]
fn test_editText_shouldCorrectBlockAndCell() {
    let mut page = common::lease_page();

    assert!(page.edit_text("h1", None, "Lease agreement"));
    assert!(page.edit_text("t1", Some("t1-cell-1-0"), "C corrected"));
    assert!(!page.edit_text("t1", None, "tables need a cell"));
    assert!(!page.edit_text("missing", None, "x"));

    assert_eq!(page.blocks[0].text(), Some("Lease agreement"));
    assert_eq!(page.blocks[1].rows()[1][0].text, "C corrected");
}
