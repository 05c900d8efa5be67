/*!
 * Output rendering of translated pages.
 *
 * - `layout`: flow layout and pagination shared by print output
 * - `pdf`: PDF writer (base-14 Helvetica, WinAnsi)
 * - `docx`: regenerated word-processor document
 * - `text`: plain text
 *
 * Every render is derived from the translated pages alone. Output bytes are
 * returned only after a complete render, so a failure never leaves a partial
 * artifact behind.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::Page;
use crate::errors::RenderError;

pub mod docx;
pub mod layout;
pub mod pdf;
pub mod text;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Docx,
    Text,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Text => "txt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Docx => write!(f, "docx"),
            Self::Text => write!(f, "text"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::Docx),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(anyhow::anyhow!("Invalid output format: {}", s)),
        }
    }
}

fn default_page_width() -> f32 {
    595.28
}

fn default_page_height() -> f32 {
    841.89
}

fn default_margin() -> f32 {
    56.69
}

fn default_body_font_size() -> f32 {
    11.0
}

fn default_heading_step() -> f32 {
    1.5
}

fn default_line_height_factor() -> f32 {
    1.5
}

fn default_paragraph_gap() -> f32 {
    8.5
}

fn default_cell_padding() -> f32 {
    3.0
}

/// Page geometry and typography, in points. Defaults describe A4 with 20 mm margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_page_width")]
    pub page_width: f32,

    #[serde(default = "default_page_height")]
    pub page_height: f32,

    #[serde(default = "default_margin")]
    pub margin: f32,

    #[serde(default = "default_body_font_size")]
    pub body_font_size: f32,

    /// Extra size per heading level above 6
    #[serde(default = "default_heading_step")]
    pub heading_step: f32,

    #[serde(default = "default_line_height_factor")]
    pub line_height_factor: f32,

    /// Vertical gap between blocks
    #[serde(default = "default_paragraph_gap")]
    pub paragraph_gap: f32,

    #[serde(default = "default_cell_padding")]
    pub cell_padding: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            margin: default_margin(),
            body_font_size: default_body_font_size(),
            heading_step: default_heading_step(),
            line_height_factor: default_line_height_factor(),
            paragraph_gap: default_paragraph_gap(),
            cell_padding: default_cell_padding(),
        }
    }
}

impl RenderConfig {
    /// Heading size for `level`; level 1 is the largest.
    pub fn heading_font_size(&self, level: u8) -> f32 {
        let level = level.clamp(1, 6);
        self.body_font_size + self.heading_step * f32::from(7 - level)
    }

    pub fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_height_factor
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Check that the geometry leaves room for at least one line of the largest heading.
    pub fn validate(&self) -> Result<(), RenderError> {
        let values = [
            self.page_width,
            self.page_height,
            self.body_font_size,
            self.line_height_factor,
        ];
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(RenderError::Geometry("page size, font size and line height must be positive".to_string()));
        }
        if self.margin < 0.0 || self.paragraph_gap < 0.0 || self.cell_padding < 0.0 || self.heading_step < 0.0 {
            return Err(RenderError::Geometry("margins, gaps and padding cannot be negative".to_string()));
        }
        if self.content_width() <= 0.0 {
            return Err(RenderError::Geometry("margins leave no horizontal space".to_string()));
        }
        if self.page_height - 2.0 * self.margin < self.line_height(self.heading_font_size(1)) {
            return Err(RenderError::Geometry("margins leave no room for a line".to_string()));
        }
        Ok(())
    }
}

/// Render translated pages into `format`.
pub fn render(pages: &[Page], format: OutputFormat, config: &RenderConfig) -> Result<Vec<u8>, RenderError> {
    match format {
        OutputFormat::Pdf => pdf::render_pdf(pages, config),
        OutputFormat::Docx => docx::render_docx(pages, config),
        OutputFormat::Text => Ok(text::render_text(pages).into_bytes()),
    }
}

/// Output file name for a source stem: `<stem>_translated.<ext>`
pub fn output_file_name(stem: &str, format: OutputFormat) -> String {
    format!("{}_translated.{}", stem, format.extension())
}
