/*!
 * Document-level translation parameters.
 *
 * Formality and glossary apply uniformly to every oracle call made for one
 * document. The glossary is passed to the oracle as literal text; nothing
 * here validates or matches terms.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Requested register of the translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    #[default]
    Default,
    Formal,
    Informal,
}

impl Formality {
    /// Tone description used in oracle instructions.
    pub fn tone(&self) -> &'static str {
        match self {
            Self::Default => "neutral",
            Self::Formal => "formal",
            Self::Informal => "informal",
        }
    }
}

impl fmt::Display for Formality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Formal => write!(f, "formal"),
            Self::Informal => write!(f, "informal"),
        }
    }
}

impl FromStr for Formality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" | "neutral" => Ok(Self::Default),
            "formal" => Ok(Self::Formal),
            "informal" => Ok(Self::Informal),
            _ => Err(anyhow::anyhow!("Invalid formality: {}", s)),
        }
    }
}

/// A source term and its required translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub source: String,
    pub target: String,
}

impl GlossaryTerm {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Ordered list of glossary terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    terms: Vec<GlossaryTerm>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term, ignoring entries whose source or target is blank.
    pub fn add_term(&mut self, source: &str, target: &str) {
        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() || target.is_empty() {
            return;
        }
        self.terms.push(GlossaryTerm::new(source, target));
    }

    pub fn terms(&self) -> &[GlossaryTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render as `source: target` lines joined by newlines.
    pub fn to_prompt_text(&self) -> String {
        self.terms
            .iter()
            .map(|term| format!("{}: {}", term.source, term.target))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse `source: target` lines. Blank lines and lines starting with `#` are skipped;
    /// lines without a separator are ignored.
    pub fn parse(text: &str) -> Self {
        let mut glossary = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((source, target)) = line.split_once(':') {
                glossary.add_term(source, target);
            }
        }
        glossary
    }

    /// Load a glossary file in the `source: target` line format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read glossary file: {:?}", path))?;
        Ok(Self::parse(&text))
    }
}

impl From<Vec<GlossaryTerm>> for Glossary {
    fn from(terms: Vec<GlossaryTerm>) -> Self {
        let mut glossary = Self::new();
        for term in terms {
            glossary.add_term(&term.source, &term.target);
        }
        glossary
    }
}

/// Everything the oracle needs besides the text itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationParams {
    pub source_language: String,
    pub target_language: String,
    pub formality: Formality,
    pub glossary: Glossary,
}

impl TranslationParams {
    pub fn new(source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            source_language: source_language.into(),
            target_language: target_language.into(),
            formality: Formality::Default,
            glossary: Glossary::new(),
        }
    }

    pub fn with_formality(mut self, formality: Formality) -> Self {
        self.formality = formality;
        self
    }

    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    /// Glossary text as handed to the oracle; empty when there are no terms.
    pub fn glossary_text(&self) -> String {
        self.glossary.to_prompt_text()
    }
}
