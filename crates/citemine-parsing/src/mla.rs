use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use citemine_core::{Citation, CitationStyle, CitationType, ParseError, text_utils};

use crate::confidence::{self, ConfidenceWeights};
use crate::{ParsingConfig, StyleParser};

static ET_AL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i),?\s*\bet al\.?").unwrap());
static AND_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i),?\s+and\s+").unwrap());

/// Surname particles that may legitimately appear lowercase in a name.
static PARTICLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "van", "von", "de", "del", "della", "di", "da", "der", "la", "le", "al", "bin", "ibn",
    ]
    .into_iter()
    .collect()
});

/// Parser for MLA-style citations.
///
/// MLA differs from APA in author grammar (full names, first author
/// inverted, `and` between two, `et al.` for three or more), in date
/// handling (`Day Mon. Year` web dates next to bare years), and in carrying
/// an explicit work-type classifier driven by surface signals (`edited by`,
/// quoted titles, `vol.`/`no.` markers).
pub struct MlaParser {
    config: ParsingConfig,
    weights: ConfidenceWeights,
    author_boundary: Regex,
    et_al_head: Regex,
    quoted_title: Regex,
    container_after_title: Regex,
    edited_by: Regex,
    month_date: Regex,
    vol_no: Regex,
    publisher_year: Regex,
}

impl MlaParser {
    pub fn new() -> Self {
        Self::with_config(ParsingConfig::default())
    }

    /// Compile the pattern set once, at construction.
    pub fn with_config(config: ParsingConfig) -> Self {
        let weights = config.confidence_weights();
        Self {
            weights,
            author_boundary: Regex::new(r"\p{Lu}[\p{L}'-]+,\s+\p{Lu}\p{Ll}+").unwrap(),
            // MLA names carry no initials, so no period may precede "et al."
            et_al_head: Regex::new(r#"(?i)^[^."]{0,60}\bet al\."#).unwrap(),
            quoted_title: Regex::new(r#""(?P<title>[^"]+)""#).unwrap(),
            container_after_title: Regex::new(r"^\s*,?\s*(?P<container>\p{Lu}[^,.]+)").unwrap(),
            edited_by: Regex::new(r"(?i)\bedited by\s+(?P<editor>[^,.]+)").unwrap(),
            month_date: Regex::new(
                r"\b(?:\d{1,2}\s+)?(?:Jan(?:\.|uary)?|Feb(?:\.|ruary)?|Mar(?:\.|ch)?|Apr(?:\.|il)?|May|June?|July?|Aug(?:\.|ust)?|Sept?(?:\.|ember)?|Oct(?:\.|ober)?|Nov(?:\.|ember)?|Dec(?:\.|ember)?)\s+(?P<year>1[5-9]\d{2}|20\d{2})\b",
            )
            .unwrap(),
            vol_no: Regex::new(r"(?i)\bvol\.\s*(?P<volume>\d{1,3})(?:\s*,\s*no\.\s*(?P<issue>\d{1,3}))?")
                .unwrap(),
            publisher_year: Regex::new(
                r"(?P<publisher>\p{Lu}[^,.;]*?)\s*,\s*(?P<year>1[5-9]\d{2}|20\d{2})\b",
            )
            .unwrap(),
            config,
        }
    }

    /// Parse an MLA author list. The first author is inverted
    /// (`Surname, First`), later authors come in natural order after `and`;
    /// `et al.` truncates the list. Every name is normalized to natural
    /// `First Last` order. A non-name head (a title starting the chunk)
    /// yields an empty list.
    fn parse_authors(&self, head: &str) -> Vec<String> {
        let head = head.trim();
        let has_et_al = ET_AL_RE.is_match(head);
        let head = ET_AL_RE.replace_all(head, "");

        let mut authors = Vec::new();
        for (i, part) in AND_SPLIT_RE.split(&head).enumerate() {
            let part = part.trim().trim_end_matches(',').trim();
            if part.is_empty() {
                continue;
            }
            let name = if i == 0 && part.contains(',') {
                let mut pieces = part.splitn(2, ',');
                let surname = pieces.next().unwrap_or("").trim();
                let first = pieces.next().unwrap_or("").trim();
                format!("{first} {surname}")
            } else {
                part.to_string()
            };
            let name = text_utils::normalize_author_name(&name);
            if looks_like_person(&name) {
                authors.push(name);
            }
        }
        if !authors.is_empty() && has_et_al {
            authors.push("et al.".to_string());
        }
        authors
    }
}

/// A plausible person name: one to four words, each capitalized or a known
/// surname particle. Filters out title sentences mistaken for author heads.
fn looks_like_person(name: &str) -> bool {
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.is_empty() || parts.len() > 4 {
        return false;
    }
    parts.iter().all(|p| {
        p.chars().next().is_some_and(char::is_uppercase)
            || PARTICLES.contains(p.trim_end_matches('.').to_lowercase().as_str())
    })
}

/// A cleaned title segment must look like a title, not a stray token.
fn plausible_title(candidate: &str) -> Option<String> {
    let cleaned = text_utils::clean_title(candidate);
    if cleaned.chars().count() >= 4 && cleaned.chars().filter(|c| c.is_alphabetic()).count() >= 2 {
        Some(cleaned)
    } else {
        None
    }
}

impl Default for MlaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleParser for MlaParser {
    fn style(&self) -> CitationStyle {
        CitationStyle::Mla
    }

    fn config(&self) -> &ParsingConfig {
        &self.config
    }

    fn author_boundary(&self) -> &Regex {
        &self.author_boundary
    }

    fn parse(&self, text: &str) -> Result<Citation, ParseError> {
        let raw = text.trim();
        let mut citation = Citation::new(CitationStyle::Mla, raw);
        let normalized = text_utils::collapse_whitespace(&text_utils::normalize_text(raw));

        citation.doi = text_utils::extract_doi(&normalized);
        citation.url = text_utils::extract_url(&normalized);
        let working = text_utils::strip_identifiers(&normalized);

        // Author head: everything before the first real sentence period,
        // unless the chunk opens with a quoted or italicized title (a
        // missing author is valid in MLA).
        let mut rest: &str = &working;
        if !working.starts_with(['"', '*']) {
            // "et al." ends the author list outright; otherwise the head runs
            // to the first real sentence period.
            let head_cut = self
                .et_al_head
                .find(&working)
                .map(|m| (m.end(), m.end()))
                .or_else(|| text_utils::find_first_real_period(&working).map(|p| (p, p + 1)));
            if let Some((head_end, rest_start)) = head_cut {
                let parsed = self.parse_authors(&working[..head_end]);
                if !parsed.is_empty() {
                    citation.authors = parsed;
                    rest = working[rest_start..].trim_start();
                }
            }
        }

        // Classification signals, first matching rule wins
        let has_edited = self.edited_by.is_match(&working);
        let has_quote = self.quoted_title.is_match(rest);
        let month_year = self
            .month_date
            .captures(&working)
            .and_then(|caps| caps["year"].parse::<i32>().ok());
        let vol_caps = self.vol_no.captures(&working);
        let publisher_caps = self.publisher_year.captures(rest);

        citation.citation_type = if has_edited {
            CitationType::Chapter
        } else if has_quote && (citation.url.is_some() || month_year.is_some()) {
            CitationType::Web
        } else if vol_caps.is_some() {
            CitationType::Article
        } else if publisher_caps.is_some() {
            CitationType::Book
        } else {
            CitationType::Unknown
        };

        // Title: quoted wins; otherwise the first sentence of the remainder
        // (an italicized book title arrives as plain text).
        let after_title = if let Some(caps) = self.quoted_title.captures(rest) {
            let m = caps.name("title").unwrap();
            citation.title = plausible_title(m.as_str());
            &rest[m.end() + 1..]
        } else if let Some(p) = text_utils::find_first_real_period(rest) {
            citation.title = plausible_title(&rest[..p]);
            &rest[p + 1..]
        } else {
            citation.title = plausible_title(rest);
            ""
        };

        // Container (journal, site, or book the chapter appears in)
        if has_quote {
            if let Some(caps) = self.container_after_title.captures(after_title) {
                citation.source = Some(caps["container"].trim().to_string());
            }
        }

        if let Some(caps) = &vol_caps {
            citation.volume = Some(caps["volume"].to_string());
            citation.issue = caps.name("issue").map(|m| m.as_str().to_string());
        }
        citation.pages = text_utils::extract_pages(&working);

        // `Day Mon. Year` dates normalize to the bare year
        citation.year = month_year.or_else(|| text_utils::extract_year(&working));

        if matches!(
            citation.citation_type,
            CitationType::Book | CitationType::Chapter
        ) {
            if let Some(caps) = &publisher_caps {
                citation.publisher = Some(caps["publisher"].trim().to_string());
            }
        }

        if !citation.has_required_component() {
            return Err(ParseError::NothingExtracted);
        }
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
    fn test_parse_book() {
        let parser = MlaParser::new();
        let c = parser
            .parse("Wilson, Robert. Understanding Academic Citations. University Press, 2019.")
            .unwrap();
        assert_eq!(c.citation_type, CitationType::Book);
        assert_eq!(c.authors, vec!["Robert Wilson"]);
        assert_eq!(c.title.as_deref(), Some("Understanding Academic Citations"));
        assert_eq!(c.publisher.as_deref(), Some("University Press"));
        assert_eq!(c.year, Some(2019));
    }

    #[test]
    fn test_parse_article_vol_no() {
        let parser = MlaParser::new();
        let c = parser
            .parse("Davis, Mary. \"Citation Patterns in Science.\" Journal of Documentation, vol. 45, no. 3, 2021, pp. 210-225.")
            .unwrap();
        assert_eq!(c.citation_type, CitationType::Article);
        assert_eq!(c.authors, vec!["Mary Davis"]);
        assert_eq!(c.title.as_deref(), Some("Citation Patterns in Science"));
        assert_eq!(c.source.as_deref(), Some("Journal of Documentation"));
        assert_eq!(c.volume.as_deref(), Some("45"));
        assert_eq!(c.issue.as_deref(), Some("3"));
        assert_eq!(c.pages.as_deref(), Some("210-225"));
        assert_eq!(c.year, Some(2021));
        assert!((c.confidence() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_web_without_author() {
        let parser = MlaParser::new();
        let c = parser
            .parse("\"How to Cite Sources.\" Style Guide Online, 12 Mar. 2021, https://styleguide.example.org/cite.")
            .unwrap();
        assert_eq!(c.citation_type, CitationType::Web);
        assert!(c.authors.is_empty(), "no-author web citation keeps an empty list");
        assert_eq!(c.title.as_deref(), Some("How to Cite Sources"));
        assert_eq!(c.source.as_deref(), Some("Style Guide Online"));
        assert_eq!(c.year, Some(2021));
        assert_eq!(c.url.as_deref(), Some("https://styleguide.example.org/cite"));
    }

    #[test]
    fn test_parse_chapter_edited_by() {
        let parser = MlaParser::new();
        let c = parser
            .parse("Lee, Anna. \"Chapter Five.\" The Big Handbook, edited by John Editor, Scholarly Press, 2018, pp. 95-120.")
            .unwrap();
        assert_eq!(c.citation_type, CitationType::Chapter);
        assert_eq!(c.source.as_deref(), Some("The Big Handbook"));
        assert_eq!(c.publisher.as_deref(), Some("Scholarly Press"));
        assert_eq!(c.pages.as_deref(), Some("95-120"));
    }

    #[test]
    fn test_parse_two_authors() {
        let parser = MlaParser::new();
        let c = parser
            .parse("Wilson, Robert, and Jane Smith. Shared Work on Citations. Example Books, 2020.")
            .unwrap();
        assert_eq!(c.authors, vec!["Robert Wilson", "Jane Smith"]);
    }

    #[test]
    fn test_parse_et_al() {
        let parser = MlaParser::new();
        let c = parser
            .parse("Brown, Lisa, et al. Research Methods in Practice. Study Press, 2017.")
            .unwrap();
        assert_eq!(c.authors, vec!["Lisa Brown", "et al."]);
    }

    #[test]
    fn test_title_first_chunk_yields_no_author() {
        let parser = MlaParser::new();
        let c = parser
            .parse("Understanding the Web. Example Press, 2019.")
            .unwrap();
        assert!(c.authors.is_empty());
        assert_eq!(c.title.as_deref(), Some("Understanding the Web"));
        assert_eq!(c.citation_type, CitationType::Book);
    }

    #[test]
    fn test_month_date_normalizes_to_year() {
        let parser = MlaParser::new();
        let c = parser
            .parse("\"Archive Notes.\" Records Site, 3 Sept. 2019, https://records.example.org/notes.")
            .unwrap();
        assert_eq!(c.year, Some(2019));
    }

    #[test]
    fn test_parse_failure_on_garbage() {
        let parser = MlaParser::new();
        assert_eq!(parser.parse("p. 347").unwrap_err(), ParseError::NothingExtracted);
    }

    #[test]
    fn test_vol_without_no() {
        let parser = MlaParser::new();
        let c = parser
            .parse("Davis, Mary. \"Short Note.\" Journal of Notes, vol. 7, 2020, pp. 1-4.")
            .unwrap();
        assert_eq!(c.volume.as_deref(), Some("7"));
        assert_eq!(c.issue, None);
    }
}
