/*!
 * Tests for application configuration
 */

use anyhow::Result;
use std::str::FromStr;

use doctran::app_config::{Config, ProcessingMode, ProviderKind};
use doctran::markup::WhitespacePolicy;
use doctran::providers::PagePayload;
use doctran::render::OutputFormat;
use doctran::translation::Formality;
use crate::common;

/// Test that a full configuration file is read with every section
#[test]
fn test_from_file_withAllSections_shouldLoadValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let json = r#"{
        "source_language": "en",
        "target_language": "de",
        "translation": {
            "provider": "anthropic",
            "available_providers": [
                { "type": "anthropic", "model": "claude-test", "api_key": "key-1", "endpoint": "", "timeout_secs": 30 }
            ],
            "formality": "formal",
            "glossary": [{ "source": "lease", "target": "Mietvertrag" }],
            "page_payload": "structured",
            "temperature": 0.5
        },
        "output": { "formats": ["docx", "text"], "whitespace": "verbatim", "mode": "direct" },
        "storage": { "directory": "/tmp/doctran-uploads", "keep_uploads": true },
        "history": { "enabled": false },
        "log_level": "debug"
    }"#;
    let path = common::create_test_file(temp_dir.path(), "conf.json", json.as_bytes())?;

    let config = Config::from_file(&path)?;
    config.validate()?;

    assert_eq!(config.translation.provider, ProviderKind::Anthropic);
    assert_eq!(config.translation.get_model(), "claude-test");
    assert_eq!(config.translation.get_endpoint(), "https://api.anthropic.com");
    assert_eq!(config.translation.get_timeout_secs(), 30);
    assert_eq!(config.translation.formality, Formality::Formal);
    assert_eq!(config.translation.page_payload, PagePayload::Structured);
    assert_eq!(config.output.formats, vec![OutputFormat::Docx, OutputFormat::Text]);
    assert_eq!(config.output.whitespace, WhitespacePolicy::Verbatim);
    assert_eq!(config.output.mode, ProcessingMode::Direct);
    assert!(config.storage.keep_uploads);
    assert!(!config.history.enabled);
    assert_eq!(config.translation_params().glossary_text(), "lease: Mietvertrag");
    Ok(())
}

/// Test that a saved configuration reads back identically
#[test]
fn test_save_thenFromFile_shouldPreserveSettings() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    let mut config = common::test_config(temp_dir.path());
    config.output.formats = vec![OutputFormat::Text];

    config.save(&path)?;
    let loaded = Config::from_file(&path)?;

    assert_eq!(loaded.output.formats, vec![OutputFormat::Text]);
    assert_eq!(loaded.translation.get_api_key(), "test-key");
    assert_eq!(loaded.storage.directory, config.storage.directory);
    Ok(())
}

/// Test that an invalid JSON file is reported as a parse error
#[test]
fn test_from_file_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", b"{ not json")?;

    let error = Config::from_file(&path).unwrap_err();

    assert!(format!("{:#}", error).contains("Failed to parse config file"));
    Ok(())
}

/// Test that validation rejects an empty format list and bad target language
#[test]
fn test_validate_withEmptyFormatsOrAutoTarget_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let mut no_formats = common::test_config(temp_dir.path());
    no_formats.output.formats.clear();
    assert!(no_formats.validate().is_err());

    let mut auto_target = common::test_config(temp_dir.path());
    auto_target.target_language = "auto".to_string();
    assert!(auto_target.validate().is_err());

    common::test_config(temp_dir.path()).validate()?;
    Ok(())
}

/// Test that provider and mode names parse case-insensitively
#[test]
fn test_fromStr_providerAndMode_shouldParse() -> Result<()> {
    assert_eq!(ProviderKind::from_str("Gemini")?, ProviderKind::Gemini);
    assert_eq!(ProviderKind::Anthropic.to_string(), "anthropic");
    assert_eq!(ProcessingMode::from_str("DIRECT")?, ProcessingMode::Direct);
    assert!(ProviderKind::from_str("ollama").is_err());
    Ok(())
}
