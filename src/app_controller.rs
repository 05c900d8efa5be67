use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::{Config, ProcessingMode, ProviderKind};
use crate::database::{DatabaseConnection, HistoryRecord, HistoryRepository, NewHistoryRecord};
use crate::document::{page_from_lines, validate_pages, Document, Page, TranslationOutcome};
use crate::errors::{AppError, ExtractionError};
use crate::file_utils::{FileManager, FileType};
use crate::markup::translate_markup_package;
use crate::providers::anthropic::Anthropic;
use crate::providers::gemini::Gemini;
use crate::providers::{ExtractionOracle, InlineData, LlmOracle, TranslationOracle};
use crate::render::{render, OutputFormat};
use crate::storage::{DocumentStore, FileSystemStore};
use crate::translation::{CancellationFlag, DocumentTranslation, DocumentTranslator};

// @module: Application controller for document translation

/// Side file holding the source pages of a partially failed run
pub const PAGES_SUFFIX: &str = "_pages.json";

/// Side file holding the outcomes of a partially failed run
pub const OUTCOMES_SUFFIX: &str = "_outcomes.json";

/// What one processed input produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub input: PathBuf,
    pub page_count: usize,
    pub failed_pages: Vec<u32>,
    pub output_files: Vec<PathBuf>,
    /// Outputs already existed and overwriting was not forced
    pub skipped: bool,
    pub cancelled: bool,
}

impl RunReport {
    fn skipped(input: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            skipped: true,
            ..Self::default()
        }
    }
}

/// Counts for a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Main application controller for document translation
pub struct Controller {
    config: Config,
    translation_oracle: Arc<dyn TranslationOracle>,
    extraction_oracle: Arc<dyn ExtractionOracle>,
    store: Arc<dyn DocumentStore>,
    history: Option<HistoryRepository>,
    show_progress: bool,
}

impl Controller {
    /// Create a controller whose oracles talk to the configured provider
    pub fn with_config(config: Config) -> Result<Self> {
        let (translation_oracle, extraction_oracle) = Self::build_oracles(&config);
        let store: Arc<dyn DocumentStore> = Arc::new(FileSystemStore::new(&config.storage.directory));

        let history = if config.history.enabled {
            let path = match &config.history.database_path {
                Some(path) => path.clone(),
                None => DatabaseConnection::default_database_path()?,
            };
            Some(HistoryRepository::new(DatabaseConnection::new(path)?))
        } else {
            None
        };

        Ok(Self {
            config,
            translation_oracle,
            extraction_oracle,
            store,
            history,
            show_progress: true,
        })
    }

    /// Create a controller over explicit collaborators
    pub fn with_collaborators(
        config: Config,
        translation_oracle: Arc<dyn TranslationOracle>,
        extraction_oracle: Arc<dyn ExtractionOracle>,
        store: Arc<dyn DocumentStore>,
        history: Option<HistoryRepository>,
    ) -> Self {
        Self {
            config,
            translation_oracle,
            extraction_oracle,
            store,
            history,
            show_progress: true,
        }
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn build_oracles(config: &Config) -> (Arc<dyn TranslationOracle>, Arc<dyn ExtractionOracle>) {
        let translation = &config.translation;
        let api_key = translation.get_api_key();
        let endpoint = translation.get_endpoint();
        let model = translation.get_model();
        let timeout = translation.get_timeout_secs();
        info!("Using {} model {}", translation.provider.display_name(), model);

        match translation.provider {
            ProviderKind::Gemini => {
                let provider = Gemini::new(api_key, endpoint, model, timeout).temperature(translation.temperature);
                Self::share_oracle(LlmOracle::new(provider).with_payload(translation.page_payload))
            }
            ProviderKind::Anthropic => {
                let provider = Anthropic::new(api_key, endpoint, model, timeout);
                Self::share_oracle(LlmOracle::new(provider).with_payload(translation.page_payload))
            }
        }
    }

    fn share_oracle<O>(oracle: O) -> (Arc<dyn TranslationOracle>, Arc<dyn ExtractionOracle>)
    where
        O: TranslationOracle + ExtractionOracle + 'static,
    {
        let oracle = Arc::new(oracle);
        let translation: Arc<dyn TranslationOracle> = oracle.clone();
        let extraction: Arc<dyn ExtractionOracle> = oracle;
        (translation, extraction)
    }

    fn translator(&self) -> DocumentTranslator {
        DocumentTranslator::new(self.translation_oracle.clone(), self.config.translation_params())
    }

    fn new_progress_bar(&self, multi_progress: &MultiProgress, len: u64, unit: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = multi_progress.add(ProgressBar::new(len));
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    /// Store the upload, extract it, and clean up.
    ///
    /// If extraction fails the orphaned upload is deleted and the extraction
    /// error is returned; a failed delete is only logged. After a successful
    /// extraction the upload is deleted unless the configuration keeps uploads.
    pub async fn extract_pages(&self, file_name: &str, bytes: &[u8], mime_type: &str) -> Result<Vec<Page>, AppError> {
        let key = self.store.put(file_name, bytes).await?;
        info!("Extracting {} ({} bytes)", file_name, bytes.len());

        let extracted = self
            .extraction_oracle
            .extract(&InlineData::new(mime_type, bytes.to_vec()))
            .await
            .and_then(|mut pages| {
                pages.sort_by_key(|page| page.page_number);
                validate_pages(&pages)?;
                Ok(pages)
            });

        let pages = match extracted {
            Ok(pages) => pages,
            Err(e) => {
                self.discard_upload(&key).await;
                return Err(e.into());
            }
        };

        if !self.config.storage.keep_uploads {
            self.discard_upload(&key).await;
        }
        info!("Extracted {} pages from {}", pages.len(), file_name);
        Ok(pages)
    }

    async fn discard_upload(&self, key: &str) {
        match self.store.delete(key).await {
            Ok(()) => debug!("Removed upload {}", key),
            Err(e) => warn!("Failed to remove upload {}: {}", key, e),
        }
    }

    /// Source pages for a PDF, image or saved pages file
    async fn load_source_pages(&self, input: &Path, bytes: &[u8], file_type: FileType) -> Result<Vec<Page>> {
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        match file_type {
            FileType::Pages => {
                let document: Document = serde_json::from_slice(bytes)
                    .with_context(|| format!("Failed to parse pages file: {:?}", input))?;
                document
                    .validate()
                    .map_err(ExtractionError::from)
                    .with_context(|| format!("Invalid pages file: {:?}", input))?;
                Ok(document.pages)
            }
            FileType::Pdf | FileType::Image(_) => {
                let mime = file_type.mime_type().unwrap_or("application/octet-stream");
                Ok(self.extract_pages(&file_name, bytes, mime).await?)
            }
            FileType::Docx | FileType::Unknown => Err(anyhow!("Cannot extract pages from {:?}", input)),
        }
    }

    /// Translate pages sequentially with a progress bar; Ctrl-C stops after the current page
    pub async fn translate_pages(&self, pages: &[Page]) -> DocumentTranslation {
        let multi_progress = MultiProgress::new();
        let progress_bar = self.new_progress_bar(&multi_progress, 100, "%");
        progress_bar.set_message("Translating");

        let cancel = CancellationFlag::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping after the current page");
                    cancel.cancel();
                }
            })
        };

        let result = self
            .translator()
            .translate_document(
                pages,
                |fraction| progress_bar.set_position((fraction * 100.0).round() as u64),
                &cancel,
            )
            .await;

        watcher.abort();
        progress_bar.finish_and_clear();
        result
    }

    /// Render every configured format, returning all artifacts or none
    fn render_outputs(&self, input: &Path, output_dir: &Path, pages: &[Page]) -> Result<Vec<(PathBuf, Vec<u8>)>> {
        self.config
            .output
            .formats
            .iter()
            .map(|format| {
                let bytes = render(pages, *format, &self.config.output.render)
                    .with_context(|| format!("Failed to render {}", format))?;
                Ok((FileManager::generate_output_path(input, output_dir, *format), bytes))
            })
            .collect()
    }

    fn write_outputs(artifacts: Vec<(PathBuf, Vec<u8>)>) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(artifacts.len());
        for (path, bytes) in artifacts {
            FileManager::write_bytes(&path, &bytes)?;
            info!("Success: {}", path.display());
            written.push(path);
        }
        Ok(written)
    }

    fn outputs_exist(&self, input: &Path, output_dir: &Path, formats: &[OutputFormat]) -> bool {
        formats
            .iter()
            .any(|format| FileManager::generate_output_path(input, output_dir, *format).exists())
    }

    /// Save what is needed to retry failed pages later
    fn save_retry_state(&self, input: &Path, output_dir: &Path, sources: &[Page], result: &DocumentTranslation) -> Result<()> {
        let pages_path = FileManager::generate_side_path(input, output_dir, PAGES_SUFFIX);
        let outcomes_path = FileManager::generate_side_path(input, output_dir, OUTCOMES_SUFFIX);

        let mut pending = result.clone();
        pending.mark_pending(sources);

        let pages_json = serde_json::to_vec_pretty(&Document::new(sources.to_vec()))?;
        let outcomes_json = serde_json::to_vec_pretty(&pending.outcomes)?;
        FileManager::write_bytes(&pages_path, &pages_json)?;
        FileManager::write_bytes(&outcomes_path, &outcomes_json)?;

        warn!(
            "Pages {:?} not translated. Retry with: doctran translate {} --retry-failed {}",
            pending.failed_pages(),
            pages_path.display(),
            outcomes_path.display()
        );
        Ok(())
    }

    /// Render the successful pages and write the artifacts
    fn finish_pages(
        &self,
        input: &Path,
        output_dir: &Path,
        sources: &[Page],
        result: &DocumentTranslation,
    ) -> Result<RunReport> {
        if result.failed() > 0 || result.cancelled {
            self.save_retry_state(input, output_dir, sources, result)?;
        }

        let translated = result.translated_pages();
        if translated.is_empty() && !sources.is_empty() {
            return Err(anyhow!("No page of {:?} could be translated", input));
        }

        let artifacts = self.render_outputs(input, output_dir, &translated)?;
        let output_files = Self::write_outputs(artifacts)?;

        Ok(RunReport {
            input: input.to_path_buf(),
            page_count: sources.len(),
            failed_pages: result.failed_pages(),
            output_files,
            skipped: false,
            cancelled: result.cancelled,
        })
    }

    async fn translate_docx(&self, input: &Path, bytes: &[u8], output_dir: &Path) -> Result<RunReport> {
        let output = translate_markup_package(
            bytes,
            self.translation_oracle.as_ref(),
            &self.config.translation_params(),
            self.config.output.whitespace,
        )
        .await
        .map_err(AppError::from)?;

        let path = FileManager::generate_output_path(input, output_dir, OutputFormat::Docx);
        let output_files = Self::write_outputs(vec![(path, output)])?;
        Ok(RunReport {
            input: input.to_path_buf(),
            page_count: 1,
            output_files,
            ..RunReport::default()
        })
    }

    async fn translate_image_direct(&self, input: &Path, bytes: &[u8], mime: &str, output_dir: &Path) -> Result<RunReport> {
        info!("Translating image {:?} directly", input);
        let lines = self
            .translation_oracle
            .translate_image(&InlineData::new(mime, bytes.to_vec()), &self.config.translation_params())
            .await
            .map_err(AppError::from)?;
        let page = page_from_lines(1, &lines);

        let artifacts = self.render_outputs(input, output_dir, &[page])?;
        let output_files = Self::write_outputs(artifacts)?;
        Ok(RunReport {
            input: input.to_path_buf(),
            page_count: 1,
            output_files,
            ..RunReport::default()
        })
    }

    /// Translate one input file into `output_dir`
    pub async fn translate_file(&self, input: &Path, output_dir: &Path, force_overwrite: bool) -> Result<RunReport> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }
        FileManager::ensure_dir(output_dir)?;

        let file_type = FileManager::detect_file_type(input)?;
        let formats: Vec<OutputFormat> = match file_type {
            FileType::Docx => vec![OutputFormat::Docx],
            FileType::Unknown => return Err(anyhow!("Unsupported input file: {:?}", input)),
            _ => self.config.output.formats.clone(),
        };
        if self.outputs_exist(input, output_dir, &formats) && !force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", input);
            return Ok(RunReport::skipped(input));
        }

        let bytes = FileManager::read_bytes(input)?;
        let report = match file_type {
            FileType::Docx => self.translate_docx(input, &bytes, output_dir).await?,
            FileType::Image(mime) if self.config.output.mode == ProcessingMode::Direct => {
                self.translate_image_direct(input, &bytes, mime, output_dir).await?
            }
            _ => {
                let sources = self.load_source_pages(input, &bytes, file_type).await?;
                let result = self.translate_pages(&sources).await;
                self.finish_pages(input, output_dir, &sources, &result)?
            }
        };

        self.record_history(input, &bytes, &report).await;
        info!(
            "Processed {:?} in {}",
            input,
            Self::format_duration(start_time.elapsed())
        );
        Ok(report)
    }

    /// Retry the failed pages of a saved run and re-render its outputs
    pub async fn retry_failed(
        &self,
        pages_file: &Path,
        outcomes_file: &Path,
        output_dir: &Path,
    ) -> Result<RunReport> {
        let bytes = FileManager::read_bytes(pages_file)?;
        let sources = self.load_source_pages(pages_file, &bytes, FileType::Pages).await?;

        let outcomes: Vec<TranslationOutcome> = serde_json::from_slice(&FileManager::read_bytes(outcomes_file)?)
            .with_context(|| format!("Failed to parse outcomes file: {:?}", outcomes_file))?;
        let mut result = DocumentTranslation::from_outcomes(outcomes);
        result.mark_pending(&sources);

        let failed = result.failed();
        let recovered = self.translator().retry_failed(&sources, &mut result).await;
        info!("Recovered {} of {} failed pages", recovered, failed);

        FileManager::write_bytes(outcomes_file, &serde_json::to_vec_pretty(&result.outcomes)?)?;
        FileManager::ensure_dir(output_dir)?;
        let report = self.finish_pages(pages_file, output_dir, &sources, &result)?;
        self.record_history(pages_file, &bytes, &report).await;
        Ok(report)
    }

    /// Extract pages and save them as JSON for review
    pub async fn extract_to_file(&self, input: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
        if !FileManager::file_exists(input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }
        let file_type = FileManager::detect_file_type(input)?;
        if !matches!(file_type, FileType::Pdf | FileType::Image(_)) {
            return Err(anyhow!("Only PDF and image files can be extracted: {:?}", input));
        }

        let bytes = FileManager::read_bytes(input)?;
        let pages = self.load_source_pages(input, &bytes, file_type).await?;

        let output = output.unwrap_or_else(|| {
            let dir = input.parent().unwrap_or(Path::new("."));
            FileManager::generate_side_path(input, dir, PAGES_SUFFIX)
        });
        FileManager::write_bytes(&output, &serde_json::to_vec_pretty(&Document::new(pages))?)?;
        info!("Success: {}", output.display());
        Ok(output)
    }

    /// Translate every supported document under `input_dir`, next to its source
    pub async fn run_folder(&self, input_dir: &Path, force_overwrite: bool) -> Result<FolderSummary> {
        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let documents: Vec<PathBuf> = FileManager::find_documents(input_dir)?
            .into_iter()
            .filter(|path| !matches!(FileManager::detect_file_type(path), Ok(FileType::Pages)))
            .filter(|path| !FileManager::file_stem(path).ends_with("_translated"))
            .collect();
        if documents.is_empty() {
            return Err(anyhow!("No documents found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = self.new_progress_bar(&multi_progress, documents.len() as u64, "files");
        let mut summary = FolderSummary::default();

        for document in &documents {
            let file_name = document
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = document.parent().unwrap_or(input_dir);
            match self.translate_file(document, output_dir, force_overwrite).await {
                Ok(report) if report.skipped => summary.skipped += 1,
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    error!("Error processing {:?}: {:#}", document, e);
                    summary.failed += 1;
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");
        info!(
            "Folder done: {} succeeded, {} failed, {} skipped",
            summary.succeeded, summary.failed, summary.skipped
        );
        Ok(summary)
    }

    async fn record_history(&self, input: &Path, bytes: &[u8], report: &RunReport) {
        let Some(history) = &self.history else {
            return;
        };
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let record = NewHistoryRecord::new(file_name, bytes, &self.config.source_language, &self.config.target_language)
            .with_pages(report.page_count as u32, report.failed_pages.clone())
            .with_output_files(report.output_files.iter().map(|p| p.display().to_string()).collect());

        if let Err(e) = history.append(record).await {
            warn!("Failed to record history: {:#}", e);
        }
    }

    fn history(&self) -> Result<&HistoryRepository> {
        self.history
            .as_ref()
            .ok_or_else(|| anyhow!("History is disabled in the configuration"))
    }

    pub async fn list_history(&self, limit: Option<usize>, most_recent_first: bool) -> Result<Vec<HistoryRecord>> {
        self.history()?.list(limit, most_recent_first).await
    }

    pub async fn delete_history(&self, id: &str) -> Result<bool> {
        self.history()?.delete(id).await
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
