// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use doctran::app_config::{Config, LogLevel, ProcessingMode, ProviderKind};
use doctran::app_controller::Controller;
use doctran::providers::PagePayload;
use doctran::render::OutputFormat;
use doctran::translation::{Formality, Glossary};

/// CLI wrapper for ProviderKind
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliProvider {
    Gemini,
    Anthropic,
}

impl From<CliProvider> for ProviderKind {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::Gemini => ProviderKind::Gemini,
            CliProvider::Anthropic => ProviderKind::Anthropic,
        }
    }
}

/// CLI wrapper for LogLevel
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormality {
    Default,
    Formal,
    Informal,
}

impl From<CliFormality> for Formality {
    fn from(cli_formality: CliFormality) -> Self {
        match cli_formality {
            CliFormality::Default => Formality::Default,
            CliFormality::Formal => Formality::Formal,
            CliFormality::Informal => Formality::Informal,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Pdf,
    Docx,
    Text,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli_format: CliOutputFormat) -> Self {
        match cli_format {
            CliOutputFormat::Pdf => OutputFormat::Pdf,
            CliOutputFormat::Docx => OutputFormat::Docx,
            CliOutputFormat::Text => OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    /// Extract structured pages, then translate
    Structured,
    /// Translate images in one step
    Direct,
}

impl From<CliMode> for ProcessingMode {
    fn from(cli_mode: CliMode) -> Self {
        match cli_mode {
            CliMode::Structured => ProcessingMode::Structured,
            CliMode::Direct => ProcessingMode::Direct,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPayload {
    Units,
    Structured,
}

impl From<CliPayload> for PagePayload {
    fn from(cli_payload: CliPayload) -> Self {
        match cli_payload {
            CliPayload::Units => PagePayload::Units,
            CliPayload::Structured => PagePayload::Structured,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a document, or every document in a folder
    Translate(TranslateArgs),

    /// Extract a PDF or image into an editable pages file
    Extract(ExtractArgs),

    /// Inspect or prune the run history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Generate shell completions for doctran
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input document (PDF, DOCX, image, pages JSON) or directory
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Source language code, or 'auto'
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Tone of the translation
    #[arg(long, value_enum)]
    formality: Option<CliFormality>,

    /// Glossary file with one 'source: target' pair per line
    #[arg(long, value_name = "FILE")]
    glossary: Option<PathBuf>,

    /// Output formats for PDF and image sources
    #[arg(long, value_enum, value_delimiter = ',')]
    format: Vec<CliOutputFormat>,

    /// How image inputs are processed
    #[arg(long, value_enum)]
    mode: Option<CliMode>,

    /// What each page-level oracle call exchanges
    #[arg(long, value_enum)]
    payload: Option<CliPayload>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the selected provider
    #[arg(long, env = "DOCTRAN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long, value_name = "OUTDIR")]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Retry only the failed pages recorded in this outcomes file; INPUT must be the saved pages file
    #[arg(long, value_name = "OUTCOMES")]
    retry_failed: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// PDF or image to extract
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Pages file to write (defaults to <stem>_pages.json next to the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Translation provider to use for extraction
    #[arg(short, long, value_enum)]
    provider: Option<CliProvider>,

    /// API key for the selected provider
    #[arg(long, env = "DOCTRAN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List recorded runs
    List {
        /// Maximum number of entries
        #[arg(long)]
        limit: Option<usize>,

        /// Show the oldest entries first
        #[arg(long)]
        oldest_first: bool,
    },

    /// Delete one entry
    Delete {
        /// Entry id as shown by 'history list'
        id: String,
    },
}

/// doctran - structure-preserving document translation
///
/// Translates PDFs, scanned images and DOCX files while keeping their
/// headings, lists and tables.
#[derive(Parser, Debug)]
#[command(name = "doctran")]
#[command(version)]
#[command(about = "Structure-preserving document translation")]
#[command(long_about = "doctran extracts the structure of a document, translates it page by page and renders the result.

EXAMPLES:
    doctran translate lease.pdf -t es                     # Translate a PDF to Spanish
    doctran translate contract.docx -t fr --formality formal
    doctran translate scan.png --mode direct --format pdf,text
    doctran extract lease.pdf                             # Write lease_pages.json for review
    doctran translate lease_pages.json -t es              # Translate the reviewed pages
    doctran translate lease_pages.json --retry-failed lease_outcomes.json
    doctran history list --limit 10
    doctran completions bash > doctran.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (color, tag) = Self::style_for_level(record.level());
        let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, tag, record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the config file, creating it with defaults when missing
fn load_config(options: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&options.config_path)?;

    match options.log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }
    Ok(config)
}

fn apply_provider_overrides(config: &mut Config, provider: Option<CliProvider>, model: Option<&String>, api_key: Option<&String>) {
    if let Some(provider) = provider {
        config.translation.provider = provider.into();
    }
    let active = config.translation.active_provider_config_mut();
    if let Some(model) = model {
        active.model = model.clone();
    }
    if let Some(api_key) = api_key.filter(|key| !key.is_empty()) {
        active.api_key = api_key.clone();
    }
}

fn apply_translate_overrides(config: &mut Config, args: &TranslateArgs) -> Result<()> {
    apply_provider_overrides(config, args.provider, args.model.as_ref(), args.api_key.as_ref());

    if let Some(source_language) = &args.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &args.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(formality) = args.formality {
        config.translation.formality = formality.into();
    }
    if let Some(path) = &args.glossary {
        config.translation.glossary = Glossary::from_file(path)?;
    }
    if !args.format.is_empty() {
        config.output.formats = args.format.iter().map(|f| (*f).into()).collect();
    }
    if let Some(mode) = args.mode {
        config.output.mode = mode.into();
    }
    if let Some(payload) = args.payload {
        config.translation.page_payload = payload.into();
    }
    Ok(())
}

fn default_output_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

async fn run_translate(mut config: Config, args: TranslateArgs) -> Result<()> {
    apply_translate_overrides(&mut config, &args)?;
    config.validate().context("Configuration validation failed")?;
    let controller = Controller::with_config(config)?;

    if let Some(outcomes) = &args.retry_failed {
        let output_dir = args.output_dir.clone().unwrap_or_else(|| default_output_dir(&args.input_path));
        let report = controller.retry_failed(&args.input_path, outcomes, &output_dir).await?;
        if !report.failed_pages.is_empty() {
            warn!("Pages still failing: {:?}", report.failed_pages);
        }
        return Ok(());
    }

    if args.input_path.is_dir() {
        if args.output_dir.is_some() {
            warn!("--output-dir is ignored for folders; outputs are written next to each document");
        }
        let summary = controller.run_folder(&args.input_path, args.force_overwrite).await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} document(s) failed", summary.failed));
        }
        return Ok(());
    }

    let output_dir = args.output_dir.clone().unwrap_or_else(|| default_output_dir(&args.input_path));
    let report = controller
        .translate_file(&args.input_path, &output_dir, args.force_overwrite)
        .await?;
    if report.cancelled {
        warn!("Translation was interrupted; outputs contain the pages finished so far");
    }
    Ok(())
}

async fn run_extract(mut config: Config, args: ExtractArgs) -> Result<()> {
    apply_provider_overrides(&mut config, args.provider, None, args.api_key.as_ref());
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    controller.extract_to_file(&args.input_path, args.output).await?;
    Ok(())
}

async fn run_history(config: Config, command: HistoryCommand) -> Result<()> {
    let controller = Controller::with_config(config)?;

    match command {
        HistoryCommand::List { limit, oldest_first } => {
            let records = controller.list_history(limit, !oldest_first).await?;
            if records.is_empty() {
                info!("History is empty");
            }
            for record in records {
                println!("{}", record);
            }
        }
        HistoryCommand::Delete { id } => {
            if controller.delete_history(&id).await? {
                info!("Deleted history entry {}", id);
            } else {
                return Err(anyhow!("No history entry with id {}", id));
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CommandLineOptions::parse();

    let initial_level = cli
        .log_level
        .map(|level| LogLevel::from(level).to_level_filter())
        .unwrap_or(LevelFilter::Info);
    CustomLogger::init(initial_level)?;

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "doctran", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    match cli.command {
        Commands::Translate(args) => run_translate(config, args).await,
        Commands::Extract(args) => run_extract(config, args).await,
        Commands::History { command } => run_history(config, command).await,
        Commands::Completions { .. } => Ok(()),
    }
}
