/*!
 * History record types.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 of the source bytes
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// A run about to be recorded; id and timestamp are assigned on append
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    pub file_name: String,
    pub file_hash: String,
    pub source_language: String,
    pub target_language: String,
    pub page_count: u32,
    pub failed_pages: Vec<u32>,
    pub output_files: Vec<String>,
}

impl NewHistoryRecord {
    pub fn new(file_name: impl Into<String>, source_bytes: &[u8], source_language: &str, target_language: &str) -> Self {
        Self {
            file_name: file_name.into(),
            file_hash: content_hash(source_bytes),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            page_count: 0,
            failed_pages: Vec::new(),
            output_files: Vec::new(),
        }
    }

    pub fn with_pages(mut self, page_count: u32, failed_pages: Vec<u32>) -> Self {
        self.page_count = page_count;
        self.failed_pages = failed_pages;
        self
    }

    pub fn with_output_files(mut self, output_files: Vec<String>) -> Self {
        self.output_files = output_files;
        self
    }
}

/// A stored history entry
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub id: String,
    pub file_name: String,
    pub file_hash: String,
    pub source_language: String,
    pub target_language: String,
    pub page_count: u32,
    pub failed_pages: Vec<u32>,
    pub output_files: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn succeeded_pages(&self) -> u32 {
        self.page_count.saturating_sub(self.failed_pages.len() as u32)
    }
}

impl fmt::Display for HistoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  {}  {} -> {}  {}/{} pages",
            self.id,
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
            self.file_name,
            self.source_language,
            self.target_language,
            self.succeeded_pages(),
            self.page_count
        )?;
        if !self.failed_pages.is_empty() {
            let failed: Vec<String> = self.failed_pages.iter().map(u32::to_string).collect();
            write!(f, "  (failed: {})", failed.join(", "))?;
        }
        Ok(())
    }
}
