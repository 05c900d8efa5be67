/*!
 * Mock provider and oracle implementations for testing.
 *
 * - `MockProvider` replays scripted completion texts and records requests,
 *   which exercises the real prompt building and JSON decoding in `LlmOracle`.
 * - `MockOracle` implements the oracle traits directly with a chosen behavior:
 *   - `MockBehavior::Working` - prefixes every non-blank unit with the target language
 *   - `MockBehavior::ShortResponse` - drops the last unit of every batch
 *   - `MockBehavior::FailOnCall` - fails only the n-th call (1-based)
 *   - `MockBehavior::Incongruent` - returns pages with one block missing
 *   - `MockBehavior::Failing` - always fails with an error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::document::{Page, Stage, TranslatedLine};
use crate::errors::{ExtractionError, ProviderError, TranslationError};
use crate::providers::{
    CompletionRequest, ExtractionOracle, InlineData, Provider, TranslationOracle,
};
use crate::translation::params::TranslationParams;
use crate::translation::units::TranslationUnits;

/// Provider that answers with queued texts
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a provider that returns `responses` in order, then fails
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().push(request);
        self.responses.lock().pop_front().ok_or_else(|| ProviderError::ApiError {
            status_code: 500,
            message: "No scripted response left".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Behavior mode for the mock oracle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Returns one unit fewer than requested
    ShortResponse,
    /// Fails the n-th call (1-based) and succeeds otherwise
    FailOnCall(usize),
    /// Returns page-shaped answers with the last block removed
    Incongruent,
    /// Always fails with an error
    Failing,
}

/// Mock oracle for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockOracle {
    /// Behavior mode
    behavior: MockBehavior,
    /// Oracle call counter, shared between clones
    call_count: Arc<AtomicUsize>,
    /// Unit batches received, in call order
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    /// Pages returned by `extract`
    extracted: Vec<Page>,
    /// Lines returned by `translate_image`
    lines: Vec<TranslatedLine>,
}

impl MockOracle {
    /// Create a new mock oracle with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
            batches: Arc::new(Mutex::new(Vec::new())),
            extracted: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Create a working mock oracle that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock oracle that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Pages to return from extraction
    pub fn with_extracted(mut self, pages: Vec<Page>) -> Self {
        self.extracted = pages;
        self
    }

    /// Lines to return from image translation
    pub fn with_lines(mut self, lines: Vec<TranslatedLine>) -> Self {
        self.lines = lines;
        self
    }

    /// Number of oracle calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Unit batches received so far
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }

    /// Deterministic fake translation of one unit
    pub fn fake_translation(unit: &str, target_language: &str) -> String {
        if unit.trim().is_empty() {
            unit.to_string()
        } else {
            format!("[{}] {}", target_language, unit)
        }
    }

    /// Count a call and decide whether it fails
    fn begin_call(&self) -> Result<(), ProviderError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated oracle failure".to_string(),
            }),
            MockBehavior::FailOnCall(n) if n == call => Err(ProviderError::ApiError {
                status_code: 503,
                message: format!("Simulated failure on call #{}", call),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TranslationOracle for MockOracle {
    async fn translate_units(
        &self,
        units: &[String],
        params: &TranslationParams,
    ) -> Result<Vec<String>, ProviderError> {
        self.begin_call()?;
        self.batches.lock().push(units.to_vec());

        let mut translated: Vec<String> = units
            .iter()
            .map(|unit| Self::fake_translation(unit, &params.target_language))
            .collect();
        if self.behavior == MockBehavior::ShortResponse {
            translated.pop();
        }
        Ok(translated)
    }

    async fn translate_page(
        &self,
        page: &Page,
        params: &TranslationParams,
    ) -> Result<Page, TranslationError> {
        let translated = self.translate_units(&page.units(), params).await?;
        if self.behavior == MockBehavior::Incongruent {
            let mut shape = page.reinsert(page.units())?;
            shape.blocks.pop();
            shape.stage = Stage::Translated;
            return Ok(shape);
        }
        page.reinsert(translated)
    }

    async fn translate_image(
        &self,
        _image: &InlineData,
        _params: &TranslationParams,
    ) -> Result<Vec<TranslatedLine>, ProviderError> {
        self.begin_call()?;
        Ok(self.lines.clone())
    }
}

#[async_trait]
impl ExtractionOracle for MockOracle {
    async fn extract(&self, _file: &InlineData) -> Result<Vec<Page>, ExtractionError> {
        self.begin_call()?;
        if self.extracted.is_empty() {
            return Err(ExtractionError::Malformed("no pages were extracted".to_string()));
        }
        Ok(self.extracted.clone())
    }
}
