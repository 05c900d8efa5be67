/*!
 * Page-by-page translation driver.
 *
 * Each page is translated with exactly one oracle round trip (none for pages
 * without units), checked for structural congruence, and merged with its
 * source metadata. Pages run strictly one after another in ascending page
 * order. A failing page becomes a `Failure` outcome and the driver moves on;
 * failed pages can later be retried one at a time.
 */

use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::document::{Page, TranslationOutcome};
use crate::errors::TranslationError;
use crate::providers::TranslationOracle;
use crate::translation::merge::merge_metadata;
use crate::translation::params::TranslationParams;
use crate::translation::units::TranslationUnits;

/// Failure message for pages a cancelled run never reached
pub const NOT_ATTEMPTED: &str = "Not attempted: the run was cancelled first";

/// Cooperative cancellation checked between pages.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the page in flight still completes.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of translating a whole document.
#[derive(Debug, Clone)]
pub struct DocumentTranslation {
    /// One outcome per processed page, in page order
    pub outcomes: Vec<TranslationOutcome>,

    /// True when the run stopped early on cancellation
    pub cancelled: bool,

    /// Wall-clock time spent
    pub duration: Duration,
}

impl DocumentTranslation {
    /// Wrap previously saved outcomes, e.g. for retrying failures.
    pub fn from_outcomes(outcomes: Vec<TranslationOutcome>) -> Self {
        Self {
            outcomes,
            cancelled: false,
            duration: Duration::ZERO,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Page numbers of failed pages, ascending.
    pub fn failed_pages(&self) -> Vec<u32> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(TranslationOutcome::page_number)
            .collect()
    }

    /// Translated pages of the successful outcomes, in page order.
    pub fn translated_pages(&self) -> Vec<Page> {
        self.outcomes.iter().filter_map(|o| o.page().cloned()).collect()
    }

    /// Record every source page without an outcome as a `Failure`, keeping page order.
    ///
    /// Pages skipped by a cancelled run become retryable this way. Returns how
    /// many entries were added.
    pub fn mark_pending(&mut self, sources: &[Page]) -> usize {
        let mut added = 0;
        for page in sources {
            if self.outcomes.iter().all(|o| o.page_number() != page.page_number) {
                self.outcomes.push(TranslationOutcome::Failure {
                    page_number: page.page_number,
                    error_message: NOT_ATTEMPTED.to_string(),
                });
                added += 1;
            }
        }
        if added > 0 {
            self.outcomes.sort_by_key(TranslationOutcome::page_number);
        }
        added
    }

    /// Get a summary of the run
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("Duration: {:.2}s", self.duration.as_secs_f32()),
            format!("Pages: {} succeeded, {} failed", self.succeeded(), self.failed()),
        ];

        let failed = self.failed_pages();
        if !failed.is_empty() {
            let list: Vec<String> = failed.iter().map(u32::to_string).collect();
            parts.push(format!("Failed pages: {}", list.join(", ")));
        }

        if self.cancelled {
            parts.push("Cancelled".to_string());
        }

        parts.join(" | ")
    }
}

/// Translates pages through an oracle with fixed document-level parameters.
#[derive(Clone)]
pub struct DocumentTranslator {
    oracle: Arc<dyn TranslationOracle>,
    params: TranslationParams,
}

impl DocumentTranslator {
    pub fn new(oracle: Arc<dyn TranslationOracle>, params: TranslationParams) -> Self {
        Self { oracle, params }
    }

    pub fn params(&self) -> &TranslationParams {
        &self.params
    }

    /// Translate one page with a single oracle round trip.
    ///
    /// The result has the source page's shape and metadata with translated text.
    /// The source page is not modified.
    pub async fn translate_page(&self, source: &Page) -> Result<Page, TranslationError> {
        if source.unit_count() == 0 {
            return source.reinsert(Vec::new());
        }

        let translated = self.oracle.translate_page(source, &self.params).await?;
        Ok(merge_metadata(source, &translated)?)
    }

    async fn translate_to_outcome(&self, source: &Page) -> TranslationOutcome {
        match self.translate_page(source).await {
            Ok(page) => {
                info!("Page {} translated ({} blocks)", source.page_number, page.blocks.len());
                TranslationOutcome::Success(page)
            }
            Err(e) => {
                warn!("Page {} failed: {}", source.page_number, e);
                TranslationOutcome::Failure {
                    page_number: source.page_number,
                    error_message: e.to_string(),
                }
            }
        }
    }

    /// Translate every page sequentially, continuing past failed pages.
    ///
    /// `on_progress` receives completed/total after each page. Cancellation is
    /// checked before each page; the outcomes gathered so far are returned.
    pub async fn translate_document<F>(
        &self,
        pages: &[Page],
        on_progress: F,
        cancel: &CancellationFlag,
    ) -> DocumentTranslation
    where
        F: Fn(f32),
    {
        let start = Instant::now();
        let mut ordered: Vec<&Page> = pages.iter().collect();
        ordered.sort_by_key(|page| page.page_number);

        let total = ordered.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut cancelled = false;

        info!(
            "Translating {} pages from {} to {}",
            total, self.params.source_language, self.params.target_language
        );

        for (index, page) in ordered.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("Translation cancelled after {} of {} pages", index, total);
                cancelled = true;
                break;
            }

            outcomes.push(self.translate_to_outcome(page).await);
            on_progress((index + 1) as f32 / total as f32);
        }

        let result = DocumentTranslation {
            outcomes,
            cancelled,
            duration: start.elapsed(),
        };
        info!("{}", result.summary());
        result
    }

    /// Re-run one failed page and replace its outcome in `result`.
    ///
    /// A page that already succeeded is left untouched and no oracle call is
    /// made. Fails only when the page is unknown to `sources` or `result`.
    pub async fn retry_page<'r>(
        &self,
        sources: &[Page],
        result: &'r mut DocumentTranslation,
        page_number: u32,
    ) -> Result<&'r TranslationOutcome, TranslationError> {
        let source = sources
            .iter()
            .find(|page| page.page_number == page_number)
            .ok_or(TranslationError::UnknownPage(page_number))?;
        let index = result
            .outcomes
            .iter()
            .position(|o| o.page_number() == page_number)
            .ok_or(TranslationError::UnknownPage(page_number))?;

        if !result.outcomes[index].is_success() {
            info!("Retrying page {}", page_number);
            result.outcomes[index] = self.translate_to_outcome(source).await;
        }
        Ok(&result.outcomes[index])
    }

    /// Retry every failed or never attempted page once, in page order.
    /// Returns how many now succeed.
    pub async fn retry_failed(&self, sources: &[Page], result: &mut DocumentTranslation) -> usize {
        let pending = result.mark_pending(sources);
        if pending > 0 {
            info!("{} pages were never attempted", pending);
        }

        let mut recovered = 0;
        for page_number in result.failed_pages() {
            match self.retry_page(sources, result, page_number).await {
                Ok(outcome) if outcome.is_success() => recovered += 1,
                Ok(_) => {}
                Err(e) => warn!("Cannot retry page {}: {}", page_number, e),
            }
        }
        recovered
    }
}
