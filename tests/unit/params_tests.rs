/*!
 * Tests for translation parameters and glossaries
 */

use anyhow::Result;
use std::str::FromStr;

use doctran::translation::{Formality, Glossary, GlossaryTerm, TranslationParams};
use crate::common;

/// Test that formality parses common spellings
#[test]
fn test_formality_fromStr_shouldAcceptAliases() -> Result<()> {
    assert_eq!(Formality::from_str("FORMAL")?, Formality::Formal);
    assert_eq!(Formality::from_str("neutral")?, Formality::Default);
    assert!(Formality::from_str("polite").is_err());
    Ok(())
}

/// Test that a glossary file is loaded in the line format
#[test]
fn test_glossary_fromFile_shouldLoadTerms() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "glossary.txt",
        b"# legal terms\nlease: contrato de arrendamiento\ntenant : inquilino\n",
    )?;

    let glossary = Glossary::from_file(&path)?;

    assert_eq!(
        glossary.terms(),
        &[
            GlossaryTerm::new("lease", "contrato de arrendamiento"),
            GlossaryTerm::new("tenant", "inquilino"),
        ]
    );
    Ok(())
}

/// Test that a missing glossary file is an error
#[test]
fn test_glossary_fromMissingFile_shouldFail() {
    assert!(Glossary::from_file("/nonexistent/glossary.txt").is_err());
}

/// Test that params without glossary give empty glossary text
#[test]
fn test_translationParams_withoutGlossary_shouldHaveEmptyText() {
    let params = TranslationParams::new("auto", "es").with_formality(Formality::Informal);

    assert_eq!(params.glossary_text(), "");
    assert_eq!(params.formality.tone(), "informal");
}

/// Test that a glossary survives a JSON round trip as a plain array
#[test]
fn test_glossary_serialize_shouldBeTransparentArray() -> Result<()> {
    let glossary = Glossary::from(vec![GlossaryTerm::new("deposit", "fianza")]);

    let value = serde_json::to_value(&glossary)?;

    assert_eq!(value, serde_json::json!([{ "source": "deposit", "target": "fianza" }]));
    Ok(())
}
