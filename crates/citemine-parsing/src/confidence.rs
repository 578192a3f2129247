use citemine_core::Citation;

/// Weights for the confidence model.
///
/// The score is a pure function of which fields are populated:
///
/// - each required component (authors, title, source) contributes
///   `required_field`, plus `required_bonus` when all three are present
///   (full trio = 0.50 with defaults). A publisher stands in for the
///   source — a book citation has no container;
/// - each present optional field adds its own weight;
/// - the sum is capped at 1.0.
///
/// With the default weights, a citation carrying the full trio plus year,
/// volume, issue, and pages scores exactly 1.0, and each additional missing
/// optional field strictly lowers the score until the cap no longer binds.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceWeights {
    pub required_field: f64,
    pub required_bonus: f64,
    pub year: f64,
    pub volume: f64,
    pub issue: f64,
    pub pages: f64,
    pub doi: f64,
    pub url: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            required_field: 0.15,
            required_bonus: 0.05,
            year: 0.20,
            volume: 0.10,
            issue: 0.10,
            pages: 0.10,
            doi: 0.10,
            url: 0.10,
        }
    }
}

/// Score a citation from its populated fields. Deterministic and
/// side-effect free: the same record always yields the same score.
pub fn score(citation: &Citation, weights: &ConfidenceWeights) -> f64 {
    let has_authors = !citation.authors.is_empty();
    let has_title = citation.title.is_some();
    let has_source = citation.source.is_some() || citation.publisher.is_some();

    let mut total = 0.0;
    for present in [has_authors, has_title, has_source] {
        if present {
            total += weights.required_field;
        }
    }
    if has_authors && has_title && has_source {
        total += weights.required_bonus;
    }

    if citation.year.is_some() {
        total += weights.year;
    }
    if citation.volume.is_some() {
        total += weights.volume;
    }
    if citation.issue.is_some() {
        total += weights.issue;
    }
    if citation.pages.is_some() {
        total += weights.pages;
    }
    if citation.doi.is_some() {
        total += weights.doi;
    }
    if citation.url.is_some() {
        total += weights.url;
    }

    total.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use citemine_core::CitationStyle;

    fn full_article() -> Citation {
        let mut c = Citation::new(CitationStyle::Apa, "x");
        c.authors = vec!["Smith, J.".into()];
        c.title = Some("Title".into());
        c.source = Some("Journal".into());
        c.year = Some(2020);
        c.volume = Some("15".into());
        c.issue = Some("2".into());
        c.pages = Some("45-67".into());
        c
    }

    #[test]
    fn test_full_article_scores_one() {
        let s = score(&full_article(), &ConfidenceWeights::default());
        assert!((s - 1.0).abs() < 1e-9, "expected 1.0, got {s}");
    }

    #[test]
    fn test_doi_on_top_stays_capped() {
        let mut c = full_article();
        c.doi = Some("10.1234/x".into());
        let s = score(&c, &ConfidenceWeights::default());
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_each_missing_optional_lowers_score() {
        let w = ConfidenceWeights::default();
        let mut c = full_article();
        let full = score(&c, &w);

        c.pages = None;
        let no_pages = score(&c, &w);
        c.issue = None;
        let no_issue = score(&c, &w);
        c.volume = None;
        let no_volume = score(&c, &w);
        c.year = None;
        let no_year = score(&c, &w);

        assert!(no_pages < full);
        assert!(no_issue < no_pages);
        assert!(no_volume < no_issue);
        assert!(no_year < no_volume);
        assert!((no_year - 0.5).abs() < 1e-9, "bare trio scores 0.5, got {no_year}");
    }

    #[test]
    fn test_publisher_stands_in_for_source() {
        let mut c = Citation::new(CitationStyle::Mla, "x");
        c.authors = vec!["Robert Wilson".into()];
        c.title = Some("Understanding Academic Citations".into());
        c.publisher = Some("University Press".into());
        c.year = Some(2019);
        let s = score(&c, &ConfidenceWeights::default());
        assert!((s - 0.7).abs() < 1e-9, "trio + year = 0.7, got {s}");
    }

    #[test]
    fn test_partial_trio_below_full_trio() {
        let w = ConfidenceWeights::default();
        let mut c = Citation::new(CitationStyle::Apa, "x");
        c.title = Some("Title".into());
        let title_only = score(&c, &w);
        assert!((title_only - 0.15).abs() < 1e-9);

        c.authors = vec!["Smith, J.".into()];
        let two = score(&c, &w);
        assert!((two - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_idempotent() {
        let c = full_article();
        let w = ConfidenceWeights::default();
        assert_eq!(score(&c, &w), score(&c, &w));
    }
}
