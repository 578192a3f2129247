use regex::Regex;

pub mod apa;
pub mod confidence;
pub mod config;
pub mod mla;
pub mod section;

pub use apa::ApaParser;
pub use confidence::ConfidenceWeights;
pub use config::{ParsingConfig, ParsingConfigBuilder};
pub use mla::MlaParser;
// Re-export domain types from core (canonical definitions live there)
pub use citemine_core::{
    Citation, CitationStyle, CitationType, ExtractionResult, ParseError, SkipStats,
};

/// The capability set every style parser implements.
///
/// Parsers are polymorphic over the style tag: callers pick an
/// implementation via [`parser_for`] and use it through `dyn StyleParser`.
/// A parser's only internal state is its compiled pattern set, built at
/// construction time, so instances are freely shareable across threads.
pub trait StyleParser: Send + Sync {
    /// Style tag this parser handles.
    fn style(&self) -> CitationStyle;

    /// Segmentation and filtering knobs for this instance.
    fn config(&self) -> &ParsingConfig;

    /// Pattern marking the start of an author list in this style, consumed
    /// by the shared fallback chunk splitter.
    fn author_boundary(&self) -> &Regex;

    /// Parse exactly one already-segmented citation chunk.
    ///
    /// Partial extraction (e.g. a missing year) is not a failure — it yields
    /// a low-confidence [`Citation`]. `Err(ParseError::NothingExtracted)` is
    /// returned only when none of authors, title, or source can be found.
    fn parse(&self, text: &str) -> Result<Citation, ParseError>;

    /// Deterministic confidence score from the populated fields only.
    fn calculate_confidence(&self, citation: &Citation) -> f64;

    /// Locate and parse all citations within a larger body of text.
    ///
    /// Never fails: chunks that cannot be parsed are dropped silently, and
    /// the surviving citations come back in source order.
    fn extract_citations(&self, text: &str) -> Vec<Citation> {
        section::extract_all(self, text).citations
    }

    /// Like [`extract_citations`](Self::extract_citations), but also reports
    /// how many chunks were dropped and why.
    fn extract_citations_with_stats(&self, text: &str) -> ExtractionResult {
        section::extract_all(self, text)
    }
}

/// Construct the parser for a style tag, with default configuration.
pub fn parser_for(style: CitationStyle) -> Box<dyn StyleParser> {
    match style {
        CitationStyle::Apa => Box::new(ApaParser::new()),
        CitationStyle::Mla => Box::new(MlaParser::new()),
    }
}
