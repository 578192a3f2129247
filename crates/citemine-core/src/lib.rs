use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod text_utils;

// Re-export for convenience
pub use text_utils::{
    clean_title, extract_doi, extract_pages, extract_url, extract_volume_issue, extract_year,
    normalize_author_name, normalize_text, strip_identifiers,
};

/// Citation format a style parser targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CitationStyle {
    Apa,
    Mla,
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationStyle::Apa => write!(f, "APA"),
            CitationStyle::Mla => write!(f, "MLA"),
        }
    }
}

/// Kind of work a citation refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationType {
    Article,
    Book,
    Web,
    Chapter,
    #[default]
    Unknown,
}

/// A bibliographic record extracted from one chunk of citation text.
///
/// All metadata fields are optional; `authors` is empty (not absent) when no
/// author was found, so "no author" citations stay distinguishable from parse
/// failure. The original chunk text and the derived confidence score are
/// read-only after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub title: Option<String>,
    /// Journal, book, or site name the cited work appeared in.
    pub source: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub publisher: Option<String>,
    pub citation_type: CitationType,
    #[serde(rename = "format")]
    style: CitationStyle,
    original_text: String,
    #[serde(rename = "confidence_score")]
    confidence: f64,
}

impl Citation {
    /// Create an empty record for the given style, keeping the exact source
    /// text for audit and debugging.
    pub fn new(style: CitationStyle, original_text: impl Into<String>) -> Self {
        Self {
            authors: Vec::new(),
            year: None,
            title: None,
            source: None,
            doi: None,
            url: None,
            volume: None,
            issue: None,
            pages: None,
            publisher: None,
            citation_type: CitationType::Unknown,
            style,
            original_text: original_text.into(),
            confidence: 0.0,
        }
    }

    pub fn style(&self) -> CitationStyle {
        self.style
    }

    /// The exact chunk this record was parsed from. Never mutated.
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// Derived confidence score in `[0.0, 1.0]`.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Finalize the record with a computed confidence score, clamped to
    /// `[0.0, 1.0]`. Style parsers call this once, after field population.
    pub fn with_confidence(mut self, score: f64) -> Self {
        self.confidence = score.clamp(0.0, 1.0);
        self
    }

    /// True if at least one of the required components (authors, title,
    /// source-or-publisher) was extracted. A record where this is false is
    /// a parse failure, not a low-confidence citation.
    pub fn has_required_component(&self) -> bool {
        !self.authors.is_empty()
            || self.title.is_some()
            || self.source.is_some()
            || self.publisher.is_some()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The only hard error of the engine: no author, title, or source could
    /// be extracted from a single-citation chunk. Always recoverable by
    /// skipping the chunk.
    #[error("no author, title, or source could be extracted")]
    NothingExtracted,
}

/// Counts of chunks dropped during batch extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipStats {
    /// Shorter than the minimum chunk length.
    pub too_short: usize,
    /// No digit and no quoted-title marker (failed the shape check).
    pub no_shape: usize,
    /// Passed the filters but yielded no required component.
    pub parse_failed: usize,
    /// Candidate chunks before any filtering.
    pub total_raw: usize,
}

impl SkipStats {
    pub fn dropped(&self) -> usize {
        self.too_short + self.no_shape + self.parse_failed
    }
}

/// Result of extracting all citations from a body of text.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    /// Parsed citations, in source order.
    pub citations: Vec<Citation>,
    pub skip_stats: SkipStats,
}
