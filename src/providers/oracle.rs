/*!
 * Oracle implementation backed by a completion provider.
 *
 * `LlmOracle` builds the instructions for each oracle operation, sends them
 * through a `Provider`, and decodes the JSON answer. Model output is often
 * wrapped in prose or markdown fences, so decoding first isolates the JSON
 * value before parsing it.
 */

use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::document::{Document, Page, Stage, TranslatedLine};
use crate::errors::{ExtractionError, ProviderError, TranslationError};
use crate::language_utils;
use crate::providers::{
    CompletionRequest, ExtractionOracle, InlineData, Provider, TranslationOracle,
};
use crate::translation::params::TranslationParams;
use crate::translation::units::{all_blank, TranslationUnits};

/// Markdown code fence, optionally tagged as JSON
static FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").unwrap()
});

/// What one page-level oracle call exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePayload {
    /// Send the page's units as a JSON string array, reinsert the answer
    #[default]
    Units,
    /// Send the page as JSON (text fields only) and expect the same shape back
    Structured,
}

/// Translation and extraction oracle over any completion provider
#[derive(Debug)]
pub struct LlmOracle<P: Provider> {
    provider: P,
    payload: PagePayload,
}

#[derive(Debug, Deserialize)]
struct LinesResponse {
    lines: Vec<TranslatedLine>,
}

impl<P: Provider> LlmOracle<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            payload: PagePayload::Units,
        }
    }

    /// Select the page payload style
    pub fn with_payload(mut self, payload: PagePayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn translate_structured(
        &self,
        page: &Page,
        params: &TranslationParams,
    ) -> Result<Page, TranslationError> {
        let stripped = page.reinsert(page.units())?;
        let payload = serde_json::to_string(&stripped)
            .map_err(|e| ProviderError::ParseError(format!("Failed to encode page: {}", e)))?;

        let request = CompletionRequest::new(payload)
            .system(page_instructions(params)?)
            .json(None);
        let response = self.provider.complete(request).await?;

        let json = extract_json(&response, '{', '}')
            .ok_or_else(|| ProviderError::ParseError("Could not extract JSON from response".to_string()))?;
        let mut translated: Page = serde_json::from_str(json)
            .map_err(|e| ProviderError::ParseError(format!("Translated page is not valid JSON: {}", e)))?;
        translated.page_number = page.page_number;
        translated.stage = Stage::Translated;
        Ok(translated)
    }
}

#[async_trait]
impl<P: Provider> TranslationOracle for LlmOracle<P> {
    async fn translate_units(
        &self,
        units: &[String],
        params: &TranslationParams,
    ) -> Result<Vec<String>, ProviderError> {
        if all_blank(units) {
            return Ok(units.to_vec());
        }

        let payload = serde_json::to_string(units)
            .map_err(|e| ProviderError::ParseError(format!("Failed to encode units: {}", e)))?;
        debug!("Sending {} units ({} bytes) to {}", units.len(), payload.len(), self.provider.name());

        let request = CompletionRequest::new(format!("Translate the following array of text:\n{}", payload))
            .system(units_instructions(params)?)
            .json(Some(json!({ "type": "ARRAY", "items": { "type": "STRING" } })));
        let response = self.provider.complete(request).await?;

        let json = extract_json(&response, '[', ']')
            .ok_or_else(|| ProviderError::ParseError("Could not extract JSON array from response".to_string()))?;
        let translated: Vec<String> = serde_json::from_str(json)
            .map_err(|e| ProviderError::ParseError(format!("Translation response is not a string array: {}", e)))?;

        if translated.len() != units.len() {
            warn!("Oracle returned {} units for {} sent", translated.len(), units.len());
        }
        Ok(translated)
    }

    async fn translate_page(
        &self,
        page: &Page,
        params: &TranslationParams,
    ) -> Result<Page, TranslationError> {
        match self.payload {
            PagePayload::Units => {
                let translated = self.translate_units(&page.units(), params).await?;
                page.reinsert(translated)
            }
            PagePayload::Structured => self.translate_structured(page, params).await,
        }
    }

    async fn translate_image(
        &self,
        image: &InlineData,
        params: &TranslationParams,
    ) -> Result<Vec<TranslatedLine>, ProviderError> {
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "lines": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "text": { "type": "STRING" },
                            "isHeading": { "type": "BOOLEAN" }
                        },
                        "required": ["text", "isHeading"]
                    }
                }
            },
            "required": ["lines"]
        });

        let request = CompletionRequest::new(image_instructions(params)?)
            .attachment(image.clone())
            .json(Some(schema));
        let response = self.provider.complete(request).await?;

        let json = extract_json(&response, '{', '}')
            .ok_or_else(|| ProviderError::ParseError("Could not extract JSON from response".to_string()))?;
        let decoded: LinesResponse = serde_json::from_str(json)
            .map_err(|e| ProviderError::ParseError(format!("Invalid lines response: {}", e)))?;
        Ok(decoded.lines)
    }
}

#[async_trait]
impl<P: Provider> ExtractionOracle for LlmOracle<P> {
    async fn extract(&self, file: &InlineData) -> Result<Vec<Page>, ExtractionError> {
        debug!("Extracting {} bytes of {} via {}", file.data.len(), file.mime_type, self.provider.name());

        let request = CompletionRequest::new(EXTRACTION_INSTRUCTIONS)
            .attachment(file.clone())
            .json(Some(document_schema()));
        let response = self.provider.complete(request).await?;

        let json = extract_json(&response, '{', '}')
            .ok_or_else(|| ExtractionError::Malformed("response contains no JSON object".to_string()))?;
        let document: Document = serde_json::from_str(json)
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        if document.pages.is_empty() {
            return Err(ExtractionError::Malformed("no pages were extracted".to_string()));
        }
        Ok(document.pages)
    }
}

/// Isolate a JSON value delimited by `open`/`close` inside a model response.
///
/// Accepts bare JSON, fenced blocks, and JSON surrounded by prose (first `open`
/// to last `close`).
pub fn extract_json(response: &str, open: char, close: char) -> Option<&str> {
    let trimmed = response.trim();
    if trimmed.starts_with(open) && trimmed.ends_with(close) {
        return Some(trimmed);
    }

    if let Some(captures) = FENCE_REGEX.captures(trimmed) {
        if let Some(inner) = captures.get(1) {
            let inner = inner.as_str().trim();
            if inner.starts_with(open) {
                return Some(inner);
            }
        }
    }

    let start = trimmed.find(open)?;
    let end = trimmed.rfind(close)?;
    (end > start).then(|| &trimmed[start..=end])
}

fn language_pair(params: &TranslationParams) -> Result<(String, String), ProviderError> {
    let source = language_utils::source_language_name(&params.source_language);
    let target = language_utils::get_language_name(&params.target_language).map_err(|_| {
        ProviderError::InvalidRequest(format!("Invalid target language: {}", params.target_language))
    })?;
    Ok((source, target))
}

fn glossary_rule(params: &TranslationParams) -> String {
    let glossary = params.glossary_text();
    if glossary.trim().is_empty() {
        String::new()
    } else {
        format!(
            "- Strictly apply the following custom translations:\n{}\n",
            glossary.trim()
        )
    }
}

fn units_instructions(params: &TranslationParams) -> Result<String, ProviderError> {
    let (source, target) = language_pair(params)?;
    Ok(format!(
        "You are an expert translation engine.\n\
         - Source language: {source}. If it is auto-detected, identify the language from the text.\n\
         - Target language: {target}.\n\
         - Apply a {tone} tone.\n\
         {glossary}\
         - Preserve formatting inside each string, such as markdown or special characters.\n\
         - Translate every string in the provided JSON array.\n\
         - Return a JSON array with exactly the same number of elements as the input, \
         each element being the translation of the element at the same position.\n\
         - Return only the JSON array, without comments or code fences.",
        tone = params.formality.tone(),
        glossary = glossary_rule(params),
    ))
}

fn page_instructions(params: &TranslationParams) -> Result<String, ProviderError> {
    let (source, target) = language_pair(params)?;
    Ok(format!(
        "You are a precise JSON translation API. Translate the values of every \"text\" key \
         in the provided page object from {source} to {target}.\n\
         - Apply a {tone} tone.\n\
         {glossary}\
         - The output must have exactly the same structure, keys, ids and order as the input. \
         Only \"text\" values change.\n\
         - The output must be one complete, valid JSON object. Escape double quotes inside \
         translated text. Do not add explanations or code fences.",
        tone = params.formality.tone(),
        glossary = glossary_rule(params),
    ))
}

fn image_instructions(params: &TranslationParams) -> Result<String, ProviderError> {
    let (source, target) = language_pair(params)?;
    Ok(format!(
        "You are an expert translator and document analyst. Translate all text visible in the \
         provided image and identify its structure.\n\
         - Source language: {source}. If it is auto-detected, identify the language from the text.\n\
         - Target language: {target}.\n\
         - Identify headings and subheadings from their visual prominence.\n\
         - Return a JSON object {{ \"lines\": [{{ \"text\": string, \"isHeading\": boolean }}] }} \
         with one entry per line, top to bottom.\n\
         - Return only the JSON object."
    ))
}

const EXTRACTION_INSTRUCTIONS: &str = "You are an expert document processor. Perform OCR and layout analysis on the provided document.\n\
- Extract all content: headings, paragraphs, list items and tables.\n\
- Give heading levels (H1 = 1, H2 = 2, ...).\n\
- For every heading, paragraph, list item and table cell give a confidence score between 0 and 1.\n\
- Every block and cell needs an id that is unique within its page.\n\
- Table content goes in 'rows' (a rectangular grid, 0-based row/col); tables have no 'text'.\n\
- Return { \"pages\": [...] } with pageNumber starting at 1.";

fn document_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "pages": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "pageNumber": { "type": "INTEGER" },
                        "blocks": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "id": { "type": "STRING" },
                                    "type": {
                                        "type": "STRING",
                                        "enum": ["heading", "paragraph", "list_item", "table"]
                                    },
                                    "level": { "type": "INTEGER" },
                                    "text": { "type": "STRING" },
                                    "confidence": { "type": "NUMBER" },
                                    "bbox": {
                                        "type": "OBJECT",
                                        "properties": {
                                            "x1": { "type": "NUMBER" },
                                            "y1": { "type": "NUMBER" },
                                            "x2": { "type": "NUMBER" },
                                            "y2": { "type": "NUMBER" }
                                        }
                                    },
                                    "rows": {
                                        "type": "ARRAY",
                                        "items": {
                                            "type": "ARRAY",
                                            "items": {
                                                "type": "OBJECT",
                                                "properties": {
                                                    "id": { "type": "STRING" },
                                                    "text": { "type": "STRING" },
                                                    "row": { "type": "INTEGER" },
                                                    "col": { "type": "INTEGER" },
                                                    "confidence": { "type": "NUMBER" }
                                                },
                                                "required": ["id", "text", "row", "col"]
                                            }
                                        }
                                    }
                                },
                                "required": ["id", "type"]
                            }
                        }
                    },
                    "required": ["pageNumber", "blocks"]
                }
            }
        },
        "required": ["pages"]
    })
}
