/*!
 * Provider implementations and oracle interfaces.
 *
 * A `Provider` is a raw completion client for one LLM service:
 * - Gemini: Google generateContent API
 * - Anthropic: Anthropic messages API
 *
 * The oracle traits describe what the pipeline needs from the outside world
 * (unit translation, image translation, structured extraction). `LlmOracle`
 * implements them on top of any provider; `mock` has scriptable test doubles.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::document::{Page, TranslatedLine};
use crate::errors::{ExtractionError, ProviderError, TranslationError};
use crate::translation::params::TranslationParams;
use crate::translation::units::TranslationUnits;

/// A file or image sent inline with a request.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineData {
    /// MIME type such as `application/pdf` or `image/png`
    pub mime_type: String,
    /// Raw bytes; providers encode them as they need
    pub data: Vec<u8>,
}

impl InlineData {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Provider-neutral completion request.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// System instructions
    pub system: Option<String>,
    /// User message text
    pub prompt: String,
    /// Optional inline attachment, sent before the prompt text
    pub attachment: Option<InlineData>,
    /// Ask the provider for a JSON-only answer
    pub json_response: bool,
    /// Optional response schema for providers that support one
    pub response_schema: Option<serde_json::Value>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn attachment(mut self, attachment: InlineData) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Request JSON output, optionally constrained by a schema.
    pub fn json(mut self, schema: Option<serde_json::Value>) -> Self {
        self.json_response = true;
        self.response_schema = schema;
        self
    }
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably behind `LlmOracle`.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request and return the response text
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.complete(CompletionRequest::new("Hello")).await.map(|_| ())
    }

    /// Short provider name for logs
    fn name(&self) -> &'static str;
}

/// External text/image translation service.
#[async_trait]
pub trait TranslationOracle: Send + Sync {
    /// Translate an ordered sequence of units.
    ///
    /// The response must have the same length as `units`; callers treat any other
    /// length as a protocol error.
    async fn translate_units(
        &self,
        units: &[String],
        params: &TranslationParams,
    ) -> Result<Vec<String>, ProviderError>;

    /// Translate one page in a single round trip.
    ///
    /// The default sends the page's units and reinserts the answer. Implementations
    /// may instead exchange page-shaped payloads; the caller validates the shape.
    async fn translate_page(
        &self,
        page: &Page,
        params: &TranslationParams,
    ) -> Result<Page, TranslationError> {
        let translated = self.translate_units(&page.units(), params).await?;
        page.reinsert(translated)
    }

    /// Translate the text visible in an image into top-to-bottom lines.
    async fn translate_image(
        &self,
        image: &InlineData,
        params: &TranslationParams,
    ) -> Result<Vec<TranslatedLine>, ProviderError>;
}

/// External OCR/layout extraction service.
#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    /// Extract structured pages from a file. Pages are not yet validated.
    async fn extract(&self, file: &InlineData) -> Result<Vec<Page>, ExtractionError>;
}

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod oracle;

pub use oracle::{LlmOracle, PagePayload};
