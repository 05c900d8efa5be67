/*!
 * Error types for the doctran application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions. Page-level
 * translation errors are collected into outcomes by the orchestrator; every
 * other error class aborts the current operation.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The request cannot be expressed for this provider (e.g. unknown target language)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// A single structural defect found while validating a document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error("page numbers must be dense from 1: expected {expected}, found {found}")]
    PageNumbering { expected: u32, found: u32 },

    #[error("page {page}: heading '{block_id}' has level {level}, expected 1..=6")]
    HeadingLevel { page: u32, block_id: String, level: u8 },

    #[error("page {page}: duplicate id '{id}'")]
    DuplicateId { page: u32, id: String },

    #[error("page {page}: confidence {value} on '{id}' is outside [0, 1]")]
    Confidence { page: u32, id: String, value: f32 },

    #[error("page {page}: table '{block_id}' row {row} has {found} cells, expected {expected}")]
    JaggedTable { page: u32, block_id: String, row: usize, expected: usize, found: usize },

    #[error("page {page}: cell '{cell_id}' claims position ({claimed_row}, {claimed_col}) but sits at ({row}, {col})")]
    CellPosition {
        page: u32,
        cell_id: String,
        claimed_row: usize,
        claimed_col: usize,
        row: usize,
        col: usize,
    },
}

/// Errors from the extraction step (upload bytes -> structured pages)
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The extraction oracle could not be reached or refused the request
    #[error("Extraction oracle error: {0}")]
    Provider(#[from] ProviderError),

    /// The oracle answered but the payload is not a well-formed document
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// The decoded document violates structural invariants
    #[error("Invalid document structure: {0}")]
    Structure(#[from] StructureError),
}

/// Shape mismatch between a source page and its translation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CongruenceError {
    #[error("block count mismatch: source has {source_count}, translation has {translated_count}")]
    BlockCount { source_count: usize, translated_count: usize },

    #[error("block {index} type mismatch: source is {source_kind}, translation is {translated_kind}")]
    BlockKind { index: usize, source_kind: &'static str, translated_kind: &'static str },

    #[error("table at block {index}: source has {source_rows} rows, translation has {translated_rows}")]
    RowCount { index: usize, source_rows: usize, translated_rows: usize },

    #[error("table at block {index}, row {row}: source has {source_cells} cells, translation has {translated_cells}")]
    CellCount { index: usize, row: usize, source_cells: usize, translated_cells: usize },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The oracle returned a different number of units than were sent
    #[error("Cardinality mismatch: sent {expected} units, received {actual}")]
    Cardinality { expected: usize, actual: usize },

    /// The translated page does not have the source page's shape
    #[error("Structural congruence failure: {0}")]
    Congruence(#[from] CongruenceError),

    /// Retry was requested for a page that is not part of the document
    #[error("Page {0} is not part of this document")]
    UnknownPage(u32),
}

/// Errors from the word-processor markup surgeon
#[derive(Error, Debug)]
pub enum MarkupError {
    /// The input is not a readable zip package
    #[error("Invalid DOCX file: {0}")]
    InvalidPackage(String),

    /// A required part is missing from the package
    #[error("Invalid DOCX file: {0} not found")]
    MissingPart(String),

    /// The main document part is not well-formed XML
    #[error("XML error in {part}: {message}")]
    Xml { part: String, message: String },

    /// Translating the collected text nodes failed; nothing was patched
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),
}

/// Errors from the storage collaborator
#[derive(Error, Debug)]
pub enum StorageError {
    /// Storing an upload failed
    #[error("Upload failed for '{key}': {message}")]
    Upload { key: String, message: String },

    /// Deleting an upload failed
    #[error("Could not delete '{key}' from storage: {message}")]
    Delete { key: String, message: String },

    /// The key does not exist
    #[error("No stored object with key '{0}'")]
    NotFound(String),
}

/// Errors from output rendering
#[derive(Error, Debug)]
pub enum RenderError {
    /// The output engine failed while producing the artifact
    #[error("Failed to generate {format}: {message}")]
    Engine { format: &'static str, message: String },

    /// Layout settings leave no room for content
    #[error("Invalid page geometry: {0}")]
    Geometry(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from extraction
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the markup surgeon
    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),

    /// Error from storage
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Error from rendering
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
