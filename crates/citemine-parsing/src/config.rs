use regex::Regex;

use crate::confidence::ConfidenceWeights;

/// Configuration for segmentation and chunk filtering.
///
/// All regex fields are `Option<Regex>` — `None` means "use the built-in
/// default". Use [`ParsingConfigBuilder`] to construct from string patterns.
/// Each parser instance owns its config, so instances with different
/// settings can coexist.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    /// Regex locating the references-section header (References, Works
    /// Cited, Bibliography).
    pub(crate) section_header_re: Option<Regex>,
    /// Chunks shorter than this are discarded before parsing (default: 20).
    pub(crate) min_chunk_len: usize,
    /// Minimum chunk count the blank-line split must produce before the
    /// sentence-boundary fallback kicks in (default: 2).
    pub(crate) min_chunks: usize,
    /// Weights for the confidence model.
    pub(crate) confidence_weights: Option<ConfidenceWeights>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            section_header_re: None,
            min_chunk_len: 20,
            min_chunks: 2,
            confidence_weights: None,
        }
    }
}

impl ParsingConfig {
    pub fn min_chunk_len(&self) -> usize {
        self.min_chunk_len
    }

    /// Get the confidence weights, using defaults if not configured.
    pub(crate) fn confidence_weights(&self) -> ConfidenceWeights {
        self.confidence_weights.clone().unwrap_or_default()
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled in [`build()`](Self::build).
/// Fails fast with `regex::Error` if a pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    section_header_re: Option<String>,
    min_chunk_len: Option<usize>,
    min_chunks: Option<usize>,
    confidence_weights: Option<ConfidenceWeights>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section_header_regex(mut self, pattern: &str) -> Self {
        self.section_header_re = Some(pattern.to_string());
        self
    }

    pub fn min_chunk_len(mut self, len: usize) -> Self {
        self.min_chunk_len = Some(len);
        self
    }

    pub fn min_chunks(mut self, n: usize) -> Self {
        self.min_chunks = Some(n);
        self
    }

    pub fn confidence_weights(mut self, weights: ConfidenceWeights) -> Self {
        self.confidence_weights = Some(weights);
        self
    }

    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let section_header_re = self
            .section_header_re
            .map(|p| Regex::new(&p))
            .transpose()?;
        Ok(ParsingConfig {
            section_header_re,
            min_chunk_len: self.min_chunk_len.unwrap_or(20),
            min_chunks: self.min_chunks.unwrap_or(2),
            confidence_weights: self.confidence_weights,
        })
    }
}
