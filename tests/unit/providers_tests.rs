/*!
 * Tests for provider clients and the completion-backed oracle
 */

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

use doctran::document::{DocumentBlock, Page, Stage};
use doctran::errors::{ProviderError, TranslationError};
use doctran::providers::anthropic::AnthropicRequest;
use doctran::providers::gemini::{Gemini, GeminiRequest};
use doctran::providers::mock::MockProvider;
use doctran::providers::{CompletionRequest, InlineData, LlmOracle, PagePayload, Provider};
use doctran::translation::{DocumentTranslator, TranslationParams};
use crate::common;

/// Test that the Gemini wire request uses the generateContent field names
#[test]
fn test_geminiRequest_serialize_shouldUseCamelCaseFields() -> Result<()> {
    let request = CompletionRequest::new("Translate")
        .system("rules")
        .attachment(InlineData::new("image/png", vec![1, 2, 3]))
        .json(None);

    let value = serde_json::to_value(GeminiRequest::from_completion(request, 0.3))?;

    assert_eq!(value["systemInstruction"]["parts"][0]["text"], "rules");
    assert_eq!(value["contents"][0]["role"], "user");
    assert_eq!(value["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(value["contents"][0]["parts"][0]["inlineData"]["data"], "AQID");
    assert_eq!(value["contents"][0]["parts"][1]["text"], "Translate");
    assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
    Ok(())
}

/// Test that the Anthropic wire request carries the system prompt and a PDF document block
#[test]
fn test_anthropicRequest_serialize_shouldCarrySystemAndDocument() -> Result<()> {
    let request = CompletionRequest::new("Extract")
        .system("rules")
        .attachment(InlineData::new("application/pdf", b"%PDF".to_vec()));

    let value = serde_json::to_value(AnthropicRequest::from_completion("claude-test", 1024, request))?;

    assert_eq!(value["model"], "claude-test");
    assert_eq!(value["system"], "rules");
    assert_eq!(value["max_tokens"], 1024);
    assert_eq!(value["messages"][0]["content"][0]["type"], "document");
    assert_eq!(value["messages"][0]["content"][0]["source"]["media_type"], "application/pdf");
    Ok(())
}

/// Test that an unreachable endpoint is reported as a provider error
#[tokio::test]
async fn test_gemini_complete_withUnreachableEndpoint_shouldFail() {
    let gemini = Gemini::new("key", "http://127.0.0.1:1", "gemini-test", 5);

    let result = gemini.complete(CompletionRequest::new("Hi")).await;

    assert!(matches!(
        result,
        Err(ProviderError::ConnectionError(_)) | Err(ProviderError::RequestFailed(_))
    ));
}

/// Test that a structured page answer is merged back onto the source metadata
#[tokio::test]
async fn test_structuredPayload_throughTranslator_shouldRestoreMetadata() -> Result<()> {
    let answer = json!({
        "pageNumber": 1,
        "blocks": [
            { "type": "heading", "id": "h1", "level": 1, "text": "Contrato" },
            { "type": "table", "id": "t1", "rows": [
                [{ "id": "t1-cell-0-0", "text": "A'", "row": 0, "col": 0 },
                 { "id": "t1-cell-0-1", "text": "B'", "row": 0, "col": 1 }],
                [{ "id": "t1-cell-1-0", "text": "C'", "row": 1, "col": 0 },
                 { "id": "t1-cell-1-1", "text": "D'", "row": 1, "col": 1 }]
            ]}
        ]
    });
    let provider = MockProvider::with_responses(vec![format!("```json\n{}\n```", answer)]);
    let oracle = LlmOracle::new(provider.clone()).with_payload(PagePayload::Structured);
    let translator = DocumentTranslator::new(Arc::new(oracle), TranslationParams::new("en", "es"));
    let source = common::lease_page();

    let translated = translator.translate_page(&source).await?;

    assert_eq!(translated.stage, Stage::Translated);
    assert_eq!(translated.blocks[0].text(), Some("Contrato"));
    assert_eq!(translated.blocks[0].confidence(), Some(0.98));
    assert_eq!(translated.blocks[1].bbox(), source.blocks[1].bbox());
    assert_eq!(translated.blocks[1].rows()[1][1].text, "D'");
    assert_eq!(translated.blocks[1].rows()[1][1].confidence, Some(0.42));

    let sent: serde_json::Value = serde_json::from_str(&provider.requests()[0].prompt)?;
    assert!(sent["blocks"][0].get("confidence").is_none());
    Ok(())
}

/// Test that a structured answer with a missing block is rejected
#[tokio::test]
async fn test_structuredPayload_withMissingBlock_shouldFailCongruence() {
    let answer = json!({ "pageNumber": 1, "blocks": [{ "type": "paragraph", "id": "p", "text": "Hola" }] });
    let provider = MockProvider::with_responses(vec![answer.to_string()]);
    let oracle = LlmOracle::new(provider).with_payload(PagePayload::Structured);
    let translator = DocumentTranslator::new(Arc::new(oracle), TranslationParams::new("en", "es"));
    let source = Page::new(1)
        .with_block(DocumentBlock::paragraph("p", "Hello"))
        .with_block(DocumentBlock::paragraph("q", "World"));

    let result = translator.translate_page(&source).await;

    assert!(matches!(result, Err(TranslationError::Congruence(_))));
}
