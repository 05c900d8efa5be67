/*!
 * Tests for language utility functions
 */

use anyhow::Result;

use doctran::language_utils::{
    get_language_name, is_auto, language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t,
    source_language_name, validate_language_code, validate_source_language, LanguageCodeType,
};

/// Test that ISO 639-1 codes validate as part 1
#[test]
fn test_validate_language_code_withPart1_shouldSucceed() -> Result<()> {
    assert_eq!(validate_language_code("es")?, LanguageCodeType::Part1);
    assert_eq!(validate_language_code(" FR ")?, LanguageCodeType::Part1);
    Ok(())
}

/// Test that auto is only accepted as a source language
#[test]
fn test_auto_asTarget_shouldBeRejected() {
    assert!(is_auto(" Auto "));
    assert!(validate_source_language("auto").is_ok());
    assert!(validate_language_code("auto").is_err());
}

/// Test that bibliographic and terminological codes normalize together
#[test]
fn test_normalize_to_part2t_withBibliographicCode_shouldConvert() -> Result<()> {
    assert_eq!(normalize_to_part2t("chi")?, "zho");
    assert_eq!(normalize_to_part2t("zh")?, "zho");
    assert!(language_codes_match("cze", "cs"));
    Ok(())
}

/// Test that languages without a two-letter code keep their three-letter code
#[test]
fn test_normalize_to_part1_or_part2t_withoutPart1_shouldKeepPart2t() -> Result<()> {
    assert_eq!(normalize_to_part1_or_part2t("haw")?, "haw");
    assert_eq!(normalize_to_part1_or_part2t("spa")?, "es");
    Ok(())
}

/// Test that language names are resolved in English
#[test]
fn test_get_language_name_shouldReturnEnglishName() -> Result<()> {
    assert_eq!(get_language_name("es")?, "Spanish");
    assert_eq!(get_language_name("ger")?, "German");
    assert!(get_language_name("xx").is_err());
    Ok(())
}

/// Test that the instruction name for the source handles auto and raw codes
#[test]
fn test_source_language_name_shouldNeverFail() {
    assert_eq!(source_language_name("fr"), "French");
    assert_eq!(source_language_name("AUTO"), "the auto-detected source language");
    assert_eq!(source_language_name(" latin-ish "), "latin-ish");
}
