use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::markup::WhitespacePolicy;
use crate::providers::PagePayload;
use crate::render::{OutputFormat, RenderConfig};
use crate::translation::{Formality, Glossary, TranslationParams};

/// Application configuration module
/// This module handles loading, validating and saving `conf.json`.
/// Command-line flags are applied on top of the loaded values by the binary.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO), or `auto`
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Output formats and rendering
    #[serde(default)]
    pub output: OutputConfig,

    /// Upload storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Run history
    #[serde(default)]
    pub history: HistoryConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Oracle provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    Anthropic,
}

impl ProviderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::Anthropic => "Anthropic",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Per-provider connection settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: ProviderKind,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Defaults for a provider; the API key is left empty
    pub fn new(provider_type: ProviderKind) -> Self {
        match provider_type {
            ProviderKind::Gemini => Self {
                provider_type,
                model: default_gemini_model(),
                api_key: String::new(),
                endpoint: default_gemini_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            ProviderKind::Anthropic => Self {
                provider_type,
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_anthropic_timeout_secs(),
            },
        }
    }
}

/// How image inputs are processed
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Extract structured pages, then translate them
    #[default]
    Structured,
    /// Send the image straight to the image translation oracle
    Direct,
}

impl std::str::FromStr for ProcessingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "structured" => Ok(Self::Structured),
            "direct" => Ok(Self::Direct),
            _ => Err(anyhow!("Invalid processing mode: {}", s)),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: ProviderKind,

    /// Configured providers
    #[serde(default = "default_providers")]
    pub available_providers: Vec<ProviderConfig>,

    #[serde(default)]
    pub formality: Formality,

    /// Terms that must be translated a fixed way
    #[serde(default)]
    pub glossary: Glossary,

    /// Page payload exchanged with the oracle
    #[serde(default)]
    pub page_payload: PagePayload,

    /// Sampling temperature (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            available_providers: default_providers(),
            formality: Formality::default(),
            glossary: Glossary::default(),
            page_payload: PagePayload::default(),
            temperature: default_temperature(),
        }
    }
}

impl TranslationConfig {
    /// Settings for the selected provider, falling back to built-in defaults
    pub fn active_provider_config(&self) -> ProviderConfig {
        self.available_providers
            .iter()
            .find(|p| p.provider_type == self.provider)
            .cloned()
            .unwrap_or_else(|| ProviderConfig::new(self.provider))
    }

    /// Mutable settings for the selected provider, inserting defaults if absent
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider = self.provider;
        let index = match self.available_providers.iter().position(|p| p.provider_type == provider) {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    pub fn get_model(&self) -> String {
        let config = self.active_provider_config();
        if config.model.is_empty() {
            ProviderConfig::new(self.provider).model
        } else {
            config.model
        }
    }

    pub fn get_api_key(&self) -> String {
        self.active_provider_config().api_key
    }

    pub fn get_endpoint(&self) -> String {
        let config = self.active_provider_config();
        if config.endpoint.is_empty() {
            ProviderConfig::new(self.provider).endpoint
        } else {
            config.endpoint
        }
    }

    pub fn get_timeout_secs(&self) -> u64 {
        self.active_provider_config().timeout_secs
    }
}

/// Output formats and rendering settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    /// Formats written for PDF and image sources
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,

    #[serde(default)]
    pub render: RenderConfig,

    /// Whitespace handling for DOCX text nodes
    #[serde(default)]
    pub whitespace: WhitespacePolicy,

    /// Image processing mode
    #[serde(default)]
    pub mode: ProcessingMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            render: RenderConfig::default(),
            whitespace: WhitespacePolicy::default(),
            mode: ProcessingMode::default(),
        }
    }
}

/// Upload storage settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_directory")]
    pub directory: PathBuf,

    /// Keep uploads after the run instead of deleting them
    #[serde(default)]
    pub keep_uploads: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_storage_directory(),
            keep_uploads: false,
        }
    }
}

/// Run history settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Database file; the platform data directory is used when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    crate::language_utils::AUTO.to_string()
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_anthropic_timeout_secs() -> u64 {
    180
}

fn default_temperature() -> f32 {
    0.2
}

fn default_true() -> bool {
    true
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-latest".to_string()
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(ProviderKind::Gemini),
        ProviderConfig::new(ProviderKind::Anthropic),
    ]
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Pdf]
}

fn default_storage_directory() -> PathBuf {
    PathBuf::from("uploads")
}

impl Config {
    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open config file: {:?}", path))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config file: {:?}", path))
    }

    /// Load `path`, or create it with defaults when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_source_language(&self.source_language)
            .with_context(|| format!("Invalid source language: {}", self.source_language))?;
        crate::language_utils::validate_language_code(&self.target_language)
            .with_context(|| format!("Invalid target language: {}", self.target_language))?;

        if self.translation.get_api_key().trim().is_empty() {
            return Err(anyhow!(
                "An API key is required for the {} provider",
                self.translation.provider.display_name()
            ));
        }

        let endpoint = self.translation.get_endpoint();
        let parsed = url::Url::parse(&endpoint).with_context(|| format!("Invalid provider endpoint: {}", endpoint))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("Provider endpoint must use http or https: {}", endpoint));
        }

        if !(0.0..=1.0).contains(&self.translation.temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 1.0"));
        }

        if self.output.formats.is_empty() {
            return Err(anyhow!("At least one output format is required"));
        }

        self.output
            .render
            .validate()
            .map_err(|e| anyhow!("Invalid render settings: {}", e))?;

        Ok(())
    }

    /// Parameters for one translation run
    pub fn translation_params(&self) -> TranslationParams {
        TranslationParams::new(&self.source_language, &self.target_language)
            .with_formality(self.translation.formality)
            .with_glossary(self.translation.glossary.clone())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            output: OutputConfig::default(),
            storage: StorageConfig::default(),
            history: HistoryConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
