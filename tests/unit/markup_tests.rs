/*!
 * Tests for in-place translation of word-processor packages
 */

use anyhow::Result;

use doctran::errors::{MarkupError, TranslationError};
use doctran::markup::{read_document_part, translate_markup_package, WhitespacePolicy, DOCUMENT_PART};
use doctran::providers::mock::{MockBehavior, MockOracle};
use doctran::translation::TranslationParams;
use crate::common;
use crate::common::mock_collaborators::ScriptedOracle;

fn params() -> TranslationParams {
    TranslationParams::new("en", "es")
}

/// Test that every text node is sent in one batch and every other part is untouched
#[tokio::test]
async fn test_translateMarkupPackage_shouldPatchOnlyDocumentText() -> Result<()> {
    let package = common::build_docx(&common::document_xml(&["Lease", "Tenant", "Rent"]))?;
    let oracle = MockOracle::working();

    let output = translate_markup_package(&package, &oracle, &params(), WhitespacePolicy::CollapseEdges).await?;

    assert_eq!(oracle.call_count(), 1);
    assert_eq!(oracle.batches(), vec![vec!["Lease", "Tenant", "Rent"]]);

    let xml = read_document_part(&output)?;
    assert!(xml.contains("<w:t>[es] Lease</w:t>"));
    assert!(xml.contains("<w:t>[es] Rent</w:t>"));

    let before = common::zip_entries(&package)?;
    let after = common::zip_entries(&output)?;
    assert_eq!(
        before.iter().map(|(name, _)| name).collect::<Vec<_>>(),
        after.iter().map(|(name, _)| name).collect::<Vec<_>>()
    );
    for ((name, original), (_, patched)) in before.iter().zip(&after) {
        if name != DOCUMENT_PART {
            assert_eq!(original, patched, "{} changed", name);
        }
    }
    Ok(())
}

/// Test that a short oracle answer fails the whole package
#[tokio::test]
async fn test_translateMarkupPackage_withShortResponse_shouldFailWithoutOutput() -> Result<()> {
    let package = common::build_docx(&common::document_xml(&["One", "Two", "Three"]))?;
    let oracle = MockOracle::new(MockBehavior::ShortResponse);

    let result = translate_markup_package(&package, &oracle, &params(), WhitespacePolicy::CollapseEdges).await;

    assert!(matches!(
        result,
        Err(MarkupError::Translation(TranslationError::Cardinality { expected: 3, actual: 2 }))
    ));
    Ok(())
}

/// Test that edge whitespace collapses only where the node does not preserve it
#[tokio::test]
async fn test_translateMarkupPackage_collapseEdges_shouldRespectPreserve() -> Result<()> {
    let package = common::build_docx(&common::document_xml(&["Hello", " big "]))?;
    let oracle = ScriptedOracle::new(vec![vec!["   Hola   ", "   grande   "]]);

    let output = translate_markup_package(&package, &oracle, &params(), WhitespacePolicy::CollapseEdges).await?;
    let xml = read_document_part(&output)?;

    assert!(xml.contains("<w:t> Hola </w:t>"));
    assert!(xml.contains(r#"<w:t xml:space="preserve">   grande   </w:t>"#));
    Ok(())
}

/// Test that the verbatim policy writes text exactly as returned
#[tokio::test]
async fn test_translateMarkupPackage_verbatim_shouldKeepWhitespace() -> Result<()> {
    let package = common::build_docx(&common::document_xml(&["Hello"]))?;
    let oracle = ScriptedOracle::new(vec![vec!["  Hola  "]]);

    let output = translate_markup_package(&package, &oracle, &params(), WhitespacePolicy::Verbatim).await?;

    assert!(read_document_part(&output)?.contains("<w:t>  Hola  </w:t>"));
    assert_eq!(oracle.requests(), vec![vec!["Hello".to_string()]]);
    Ok(())
}

/// Test that a package with only blank text is returned unchanged without an oracle call
#[tokio::test]
async fn test_translateMarkupPackage_allBlank_shouldSkipOracle() -> Result<()> {
    let package = common::build_docx(&common::document_xml(&[" ", ""]))?;
    let oracle = MockOracle::failing();

    let output = translate_markup_package(&package, &oracle, &params(), WhitespacePolicy::CollapseEdges).await?;

    assert_eq!(output, package);
    assert_eq!(oracle.call_count(), 0);
    Ok(())
}

/// Test that bytes that are not a zip package are rejected
#[tokio::test]
async fn test_translateMarkupPackage_withGarbage_shouldRejectPackage() {
    let oracle = MockOracle::working();

    let result = translate_markup_package(b"plain text", &oracle, &params(), WhitespacePolicy::CollapseEdges).await;

    let error = tokio_test::assert_err!(result);
    assert!(matches!(error, MarkupError::InvalidPackage(_)));
    assert_eq!(oracle.call_count(), 0);
}
