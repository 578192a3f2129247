use once_cell::sync::Lazy;
use regex::Regex;

use citemine_core::{Citation, CitationStyle, CitationType, ParseError, text_utils};

use crate::confidence::{self, ConfidenceWeights};
use crate::{ParsingConfig, StyleParser};

static ET_AL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bet al\.?").unwrap());

/// Parser for APA-style citations:
/// `Author, A. A., & Author, B. B. (Year). Title. Source, Volume(Issue), Pages.`
///
/// Parsing is a priority-ordered cascade: the full pattern binds every group
/// in one pass; when it fails, each component is extracted independently by
/// a dedicated sub-pattern and the results merged. DOI and URL are scanned
/// over the whole chunk regardless of cascade stage — identifiers can sit
/// anywhere, including after the page range.
pub struct ApaParser {
    config: ParsingConfig,
    weights: ConfidenceWeights,
    full: Regex,
    author: Regex,
    author_boundary: Regex,
    title_after_year: Regex,
    source_tail: Regex,
    publisher_tail: Regex,
    publisher_hint: Regex,
    year_paren: Regex,
}

impl ApaParser {
    pub fn new() -> Self {
        Self::with_config(ParsingConfig::default())
    }

    /// Compile the pattern set once, at construction. Instances with
    /// different configs can coexist; nothing is module-global.
    pub fn with_config(config: ParsingConfig) -> Self {
        let weights = config.confidence_weights();
        Self {
            weights,
            full: Regex::new(
                r#"^(?P<authors>[^()"]+?)\s*\((?P<year>1[5-9]\d{2}|20\d{2})[a-z]?\)\.?\s*(?P<title>[^.]+)\.\s*(?P<source>[^,.]+),\s*(?P<volume>\d{1,3})\s*(?:\((?P<issue>\d{1,3})\))?\s*,\s*(?P<pages>\d+\s*-\s*\d+)"#,
            )
            .unwrap(),
            author: Regex::new(
                r"(?P<surname>\p{Lu}[\p{L}'-]+(?:\s\p{Lu}[\p{L}'-]+)?),\s*(?P<initials>(?:\p{Lu}\.\s*)+)",
            )
            .unwrap(),
            author_boundary: Regex::new(r"\p{Lu}[\p{L}'-]+,\s+\p{Lu}\.").unwrap(),
            title_after_year: Regex::new(
                r"\((?:1[5-9]\d{2}|20\d{2})[a-z]?\)\.?\s*(?P<title>[^.]+)",
            )
            .unwrap(),
            source_tail: Regex::new(
                r"(?P<source>\p{Lu}[^,.]{2,}),\s*(?P<volume>\d{1,3})\s*(?:\((?P<issue>\d{1,3})\))?(?:\s*,\s*(?P<pages>\d+\s*-\s*\d+))?",
            )
            .unwrap(),
            publisher_tail: Regex::new(r"^\.?\s*(?P<publisher>\p{Lu}[\p{L}&' -]{2,}?)\.?\s*$")
                .unwrap(),
            publisher_hint: Regex::new(r"(?i)\b(?:press|publish\w*|books|publications)\b").unwrap(),
            year_paren: Regex::new(r"\((?:1[5-9]\d{2}|20\d{2})[a-z]?\)").unwrap(),
            config,
        }
    }

    /// Parse an APA author list: `Surname, I. I.` pairs joined by commas and
    /// a final `&`, with an optional trailing `et al.`. Organization names
    /// (no initials) are kept whole when `allow_org` is set — that only
    /// happens when the chunk showed APA structure (a parenthesized year).
    fn parse_author_list(&self, head: &str, allow_org: bool) -> Vec<String> {
        let mut authors = Vec::new();
        for caps in self.author.captures_iter(head) {
            let surname = caps["surname"].trim().to_string();
            let initials = caps["initials"].trim();
            authors.push(text_utils::normalize_author_name(&format!(
                "{surname}, {initials}"
            )));
        }
        let has_et_al = ET_AL_RE.is_match(head);

        if authors.is_empty() && allow_org {
            let org = head.trim().trim_end_matches([',', '.', ' ']);
            if !org.is_empty()
                && org.chars().count() <= 80
                && org.chars().next().is_some_and(|ch| ch.is_uppercase())
                && !ET_AL_RE.is_match(org)
            {
                authors.push(org.to_string());
            }
        }
        if has_et_al {
            authors.push("et al.".to_string());
        }
        authors
    }

    fn classify(citation: &Citation) -> CitationType {
        if citation.volume.is_some()
            || citation.issue.is_some()
            || (citation.source.is_some() && citation.pages.is_some())
        {
            CitationType::Article
        } else if citation.publisher.is_some() {
            CitationType::Book
        } else if citation.url.is_some() && citation.source.is_none() {
            CitationType::Web
        } else {
            CitationType::Unknown
        }
    }
}

impl Default for ApaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleParser for ApaParser {
    fn style(&self) -> CitationStyle {
        CitationStyle::Apa
    }

    fn config(&self) -> &ParsingConfig {
        &self.config
    }

    fn author_boundary(&self) -> &Regex {
        &self.author_boundary
    }

    fn parse(&self, text: &str) -> Result<Citation, ParseError> {
        let raw = text.trim();
        let mut citation = Citation::new(CitationStyle::Apa, raw);
        let normalized = text_utils::collapse_whitespace(&text_utils::normalize_text(raw));

        citation.doi = text_utils::extract_doi(&normalized);
        citation.url = text_utils::extract_url(&normalized);
        let working = text_utils::strip_identifiers(&normalized);

        if let Some(caps) = self.full.captures(&working) {
            citation.authors = self.parse_author_list(&caps["authors"], true);
            citation.year = caps["year"].parse().ok();
            citation.title = Some(text_utils::clean_title(&caps["title"]));
            citation.source = Some(caps["source"].trim().to_string());
            citation.volume = Some(caps["volume"].to_string());
            citation.issue = caps.name("issue").map(|m| m.as_str().to_string());
            citation.pages = Some(caps["pages"].replace(' ', ""));
        } else {
            // Best-effort decomposition: every sub-extraction runs whether or
            // not its siblings succeeded.
            let (head, head_is_structured) = match self.year_paren.find(&working) {
                Some(m) => (&working[..m.start()], true),
                None => (
                    text_utils::find_first_real_period(&working)
                        .map(|p| &working[..p])
                        .unwrap_or(""),
                    false,
                ),
            };
            citation.authors = self.parse_author_list(head, head_is_structured);
            citation.year = text_utils::extract_year(&working);

            let tail = if let Some(caps) = self.title_after_year.captures(&working) {
                let m = caps.name("title").unwrap();
                citation.title = Some(text_utils::clean_title(m.as_str()));
                &working[m.end()..]
            } else {
                working.as_str()
            };

            if let Some(caps) = self.source_tail.captures(tail) {
                citation.source = Some(caps["source"].trim().to_string());
                citation.volume = Some(caps["volume"].to_string());
                citation.issue = caps.name("issue").map(|m| m.as_str().to_string());
                if let Some(pages) = caps.name("pages") {
                    citation.pages = Some(pages.as_str().replace(' ', ""));
                }
            } else if let Some(caps) = self.publisher_tail.captures(tail) {
                let segment = caps["publisher"].trim().to_string();
                if self.publisher_hint.is_match(&segment) {
                    citation.publisher = Some(segment);
                } else {
                    citation.source = Some(segment);
                }
            }
            if citation.pages.is_none() {
                citation.pages = text_utils::extract_pages(tail);
            }
            if citation.volume.is_none() && citation.issue.is_none() {
                let (volume, issue) = text_utils::extract_volume_issue(tail);
                citation.volume = volume;
                citation.issue = issue;
            }
        }

        if !citation.has_required_component() {
            return Err(ParseError::NothingExtracted);
        }
        citation.citation_type = Self::classify(&citation);
        let score = self.calculate_confidence(&citation);
        Ok(citation.with_confidence(score))
    }

    fn calculate_confidence(&self, citation: &Citation) -> f64 {
        confidence::score(citation, &self.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_pattern() {
        let parser = ApaParser::new();
        let c = parser
            .parse("Smith, J. (2020). Title. Journal, 15(2), 45-67.")
            .unwrap();
        assert_eq!(c.authors, vec!["Smith, J."]);
        assert_eq!(c.year, Some(2020));
        assert_eq!(c.title.as_deref(), Some("Title"));
        assert_eq!(c.source.as_deref(), Some("Journal"));
        assert_eq!(c.volume.as_deref(), Some("15"));
        assert_eq!(c.issue.as_deref(), Some("2"));
        assert_eq!(c.pages.as_deref(), Some("45-67"));
        assert_eq!(c.citation_type, CitationType::Article);
        assert!((c.confidence() - 1.0).abs() < 1e-9, "got {}", c.confidence());
    }

    #[test]
    fn test_parse_multiple_authors_with_ampersand() {
        let parser = ApaParser::new();
        let c = parser
            .parse("Smith, J. A., Jones, K., & Brown, L. M. (2019). A longer title here. Review, 8(1), 12-30.")
            .unwrap();
        assert_eq!(c.authors, vec!["Smith, J. A.", "Jones, K.", "Brown, L. M."]);
        assert_eq!(c.year, Some(2019));
    }

    #[test]
    fn test_parse_et_al() {
        let parser = ApaParser::new();
        let c = parser
            .parse("Garcia, M., et al. (2021). Methods in practice. Studies, 3(4), 100-115.")
            .unwrap();
        assert_eq!(c.authors.last().map(String::as_str), Some("et al."));
        assert!(c.authors.contains(&"Garcia, M.".to_string()));
    }

    #[test]
    fn test_parse_missing_year_is_not_failure() {
        let parser = ApaParser::new();
        let c = parser
            .parse("Smith, J. Title without a year. Journal, 15(2), 45-67.")
            .unwrap();
        assert_eq!(c.year, None);
        assert!(c.confidence() < 1.0);
        assert!(!c.authors.is_empty());
    }

    #[test]
    fn test_parse_book_with_publisher() {
        let parser = ApaParser::new();
        let c = parser
            .parse("Chen, W. (2018). Foundations of citation analysis. Academic Press.")
            .unwrap();
        assert_eq!(c.publisher.as_deref(), Some("Academic Press"));
        assert_eq!(c.citation_type, CitationType::Book);
        assert_eq!(c.title.as_deref(), Some("Foundations of citation analysis"));
    }

    #[test]
    fn test_parse_organization_author() {
        let parser = ApaParser::new();
        let c = parser
            .parse("World Health Organization. (2020). Global report on something. Report Press.")
            .unwrap();
        assert_eq!(c.authors, vec!["World Health Organization"]);
        assert_eq!(c.year, Some(2020));
    }

    #[test]
    fn test_doi_extracted_from_anywhere() {
        let parser = ApaParser::new();
        let c = parser
            .parse("Smith, J. (2020). Title. Journal, 15(2), 45-67. https://doi.org/10.1234/abc.5")
            .unwrap();
        assert_eq!(c.doi.as_deref(), Some("10.1234/abc.5"));
        // DOI digits must not leak into pages/volume
        assert_eq!(c.pages.as_deref(), Some("45-67"));
    }

    #[test]
    fn test_parse_failure_on_garbage() {
        let parser = ApaParser::new();
        assert_eq!(parser.parse("p. 347").unwrap_err(), ParseError::NothingExtracted);
        assert!(parser.parse("   ").is_err());
    }

    #[test]
    fn test_confidence_idempotent() {
        let parser = ApaParser::new();
        let c = parser
            .parse("Smith, J. (2020). Title. Journal, 15(2), 45-67.")
            .unwrap();
        let first = parser.calculate_confidence(&c);
        let second = parser.calculate_confidence(&c);
        assert_eq!(first, second);
        assert_eq!(first, c.confidence());
    }

    #[test]
    fn test_curly_punctuation_tolerated() {
        let parser = ApaParser::new();
        let c = parser
            .parse("Smith, J. (2020). Title. Journal, 15(2), 45\u{2013}67.")
            .unwrap();
        assert_eq!(c.pages.as_deref(), Some("45-67"));
    }
}
