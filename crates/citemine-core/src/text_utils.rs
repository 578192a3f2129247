use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Normalize irregular input text before pattern matching.
///
/// - NFC-composes separated diacritics from copy-pasted or crawled text
/// - Replaces curly quotes with straight quotes
/// - Unifies en/em dashes and the minus sign to `-`
/// - Drops control characters (newlines and tabs survive)
///
/// Idempotent: normalizing already-normalized text is a no-op.
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    composed
        .chars()
        .filter_map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => Some('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => Some('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => Some('-'),
            '\u{00A0}' => Some(' '),
            c if c.is_control() && c != '\n' && c != '\t' => None,
            c => Some(c),
        })
        .collect()
}

/// Collapse all whitespace runs (including newlines) to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    WS_RE.replace_all(text.trim(), " ").to_string()
}

/// Normalize an author name: collapse whitespace, separate run-together
/// initials (`J.A.` -> `J. A.`), strip trailing separators.
///
/// Idempotent: a normalized name maps to itself.
pub fn normalize_author_name(name: &str) -> String {
    static TIGHT_INITIALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(\p{Lu})").unwrap());

    let name = collapse_whitespace(name);
    let name = TIGHT_INITIALS.replace_all(&name, ". $1");
    name.trim_end_matches([',', ';', ' ']).to_string()
}

/// Extract a publication year from citation text.
///
/// A parenthesized year like `(2020)` or `(2020a)` wins; otherwise the last
/// bare 4-digit token in 1500..=2099 is taken (MLA puts the year near the
/// end). Returns `None` when no plausible year is present.
pub fn extract_year(text: &str) -> Option<i32> {
    static PAREN_YEAR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\((1[5-9]\d{2}|20\d{2})[a-z]?\)").unwrap());
    static BARE_YEAR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b(1[5-9]\d{2}|20\d{2})\b").unwrap());

    if let Some(caps) = PAREN_YEAR.captures(text) {
        return caps[1].parse().ok();
    }
    BARE_YEAR
        .captures_iter(text)
        .last()
        .and_then(|caps| caps[1].parse().ok())
}

/// Strip trailing punctuation and unbalanced closing parentheses from a DOI.
fn clean_doi(doi: &str) -> String {
    let mut doi = doi.trim_end_matches(['.', ',', ';', ':']);
    // DOIs may legitimately contain balanced parens: 10.1016/0021-9681(87)90171-8
    while doi.ends_with(')') && doi.matches(')').count() > doi.matches('(').count() {
        doi = doi[..doi.len() - 1].trim_end_matches(['.', ',', ';', ':']);
    }
    doi.to_string()
}

/// Extract a DOI from citation text.
///
/// Handles `10.1234/example`, `doi:10.1234/example`, and resolver URLs like
/// `https://doi.org/10.1234/example`. DOIs can appear anywhere in the chunk,
/// including after the page range.
pub fn extract_doi(text: &str) -> Option<String> {
    // Resolver URL form is the most reliable, try it first
    static URL_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)https?://(?:dx\.)?doi\.org/(10\.\d{4,}/[^\s\]>},]+)").unwrap()
    });
    if let Some(caps) = URL_RE.captures(text) {
        return Some(clean_doi(caps.get(1).unwrap().as_str()));
    }

    static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"10\.\d{4,}/[^\s\]>},]+").unwrap());
    DOI_RE.find(text).map(|m| clean_doi(m.as_str()))
}

/// Extract a plain URL from citation text.
///
/// DOI resolver URLs are excluded; they surface through [`extract_doi`]
/// instead, so the two fields never duplicate one another.
pub fn extract_url(text: &str) -> Option<String> {
    static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+"#).unwrap());

    for m in URL_RE.find_iter(text) {
        let url = m.as_str();
        if url.contains("doi.org/") {
            continue;
        }
        let mut url = url.trim_end_matches(['.', ',', ';', ':']);
        while url.ends_with(')') && url.matches(')').count() > url.matches('(').count() {
            url = url[..url.len() - 1].trim_end_matches(['.', ',', ';', ':']);
        }
        return Some(url.to_string());
    }
    None
}

/// Clean an extracted title: strip wrapping quotes and italic markers,
/// collapse whitespace, drop the trailing sentence period.
pub fn clean_title(title: &str) -> String {
    let mut t = collapse_whitespace(title);
    loop {
        let stripped = t
            .trim_matches(['*', '_'])
            .trim()
            .trim_start_matches(['"', '\''])
            .trim_end_matches(['"', '\''])
            .trim();
        if stripped == t {
            break;
        }
        t = stripped.to_string();
    }
    t.trim_end_matches(['.', ',']).trim().to_string()
}

/// Extract a page range or single page reference.
///
/// Prefers an explicit `pp. 45-67` / `p. 45` marker; falls back to a bare
/// `45-67` range. Dash variants are already unified by [`normalize_text`];
/// the result always uses `-`. Leading-zero ranges are rejected so DOI
/// suffixes like `0021-9681` never masquerade as pages.
pub fn extract_pages(text: &str) -> Option<String> {
    static PP_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\bpp?\.\s*(\d+)(?:\s*-\s*(\d+))?").unwrap());
    static RANGE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b([1-9]\d{0,3})\s*-\s*([1-9]\d{0,3})\b").unwrap());

    if let Some(caps) = PP_RE.captures(text) {
        return Some(match caps.get(2) {
            Some(end) => format!("{}-{}", &caps[1], end.as_str()),
            None => caps[1].to_string(),
        });
    }
    RANGE_RE
        .captures(text)
        .map(|caps| format!("{}-{}", &caps[1], &caps[2]))
}

/// Extract volume and issue numbers.
///
/// Understands both the APA form `15(2)` and the MLA form `vol. 15, no. 2`.
/// In the MLA form the issue is only parsed after a `vol.` prefix — the
/// grammar never presents `no.` on its own.
pub fn extract_volume_issue(text: &str) -> (Option<String>, Option<String>) {
    static MLA_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\bvol\.\s*(\d+)(?:\s*,\s*no\.\s*(\d+))?").unwrap());
    static APA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,3})\s*\((\d{1,3})\)").unwrap());

    if let Some(caps) = MLA_RE.captures(text) {
        return (
            Some(caps[1].to_string()),
            caps.get(2).map(|m| m.as_str().to_string()),
        );
    }
    if let Some(caps) = APA_RE.captures(text) {
        return (Some(caps[1].to_string()), Some(caps[2].to_string()));
    }
    (None, None)
}

/// Remove URLs and DOIs from working text so field patterns never match
/// inside an identifier (DOI suffixes are full of digits and dashes).
/// Callers capture the identifiers first via [`extract_doi`]/[`extract_url`].
pub fn strip_identifiers(text: &str) -> String {
    static ID_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?i)(?:https?://[^\s<>"']+|\bdoi:\s*\S+|\b10\.\d{4,}/[^\s\]>},]+)"#).unwrap()
    });
    collapse_whitespace(&ID_RE.replace_all(text, " "))
}

/// Find the first "real" sentence period — one not belonging to an author
/// initial like `J.` or an abbreviation run like `J. R. R.`.
pub fn find_first_real_period(text: &str) -> Option<usize> {
    static PERIOD_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(\s|$)").unwrap());

    for m in PERIOD_SPACE.find_iter(text) {
        let pos = m.start();
        if pos == 0 {
            continue;
        }
        let bytes = text.as_bytes();
        let char_before = bytes[pos - 1];
        if char_before.is_ascii_uppercase() && (pos == 1 || !bytes[pos - 2].is_ascii_alphabetic()) {
            // Likely an initial
            continue;
        }
        // "et al." is part of the author list, not a sentence end
        if text[..pos].ends_with("et al") {
            continue;
        }
        return Some(pos);
    }
    None
}
