use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use citemine_core::{ExtractionResult, SkipStats, text_utils};

use crate::{ParsingConfig, StyleParser};

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\n)\s*(?:References|Works\s+Cited|Bibliography)\s*:?\s*(?:\n|$)")
        .unwrap()
});

/// Locate the references section, returning the text after the header.
///
/// Uses the LAST header occurrence: body text can mention "references"
/// before the actual list (e.g. "see the references below"). Returns `None`
/// when no header is found or nothing follows it — callers then operate on
/// the full input.
pub fn find_references_section<'a>(text: &'a str, config: &ParsingConfig) -> Option<&'a str> {
    let re = config.section_header_re.as_ref().unwrap_or(&HEADER_RE);
    re.find_iter(text)
        .last()
        .map(|m| &text[m.end()..])
        .filter(|rest| !rest.trim().is_empty())
}

static BLANK_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Split a references body into candidate citation chunks.
///
/// Blank-line splitting first; if that yields fewer than `min_chunks`
/// pieces, fall back to cutting at sentence-ending punctuation followed by
/// an author-like token. The regex crate has no look-ahead, so author
/// matches are found first and the preceding text is checked in code.
pub(crate) fn split_chunks<'a>(
    body: &'a str,
    author_boundary: &Regex,
    config: &ParsingConfig,
) -> Vec<&'a str> {
    let chunks: Vec<&str> = BLANK_LINE_RE
        .split(body)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    if chunks.len() >= config.min_chunks {
        return chunks;
    }

    let mut cuts = Vec::new();
    for m in author_boundary.find_iter(body) {
        let before = body[..m.start()].trim_end();
        if before.ends_with(['.', '!', '?']) {
            cuts.push(m.start());
        }
    }
    if cuts.is_empty() {
        return chunks;
    }
    trace!(cuts = cuts.len(), "sentence-boundary fallback split");

    let mut out = Vec::new();
    let mut start = 0;
    for cut in cuts {
        let piece = body[start..cut].trim();
        if !piece.is_empty() {
            out.push(piece);
        }
        start = cut;
    }
    let last = body[start..].trim();
    if !last.is_empty() {
        out.push(last);
    }
    out
}

/// Minimal shape check: a citation carries at least a digit (year, volume,
/// pages) or a quoted/italic title marker. Trades recall for precision —
/// prose fragments are dropped, real citations essentially never are.
fn has_citation_shape(chunk: &str) -> bool {
    chunk.chars().any(|c| c.is_ascii_digit()) || chunk.contains('"') || chunk.contains('*')
}

/// Shared extraction pipeline behind `StyleParser::extract_citations`.
///
/// 1. Normalize irregular punctuation and encoding
/// 2. Restrict to the references section when a header is present
/// 3. Split into candidate chunks (blank lines, then sentence fallback)
/// 4. Filter chunks too short or shapeless to be citations
/// 5. Parse each survivor; unparseable chunks are counted and dropped
pub fn extract_all<P: StyleParser + ?Sized>(parser: &P, text: &str) -> ExtractionResult {
    let config = parser.config();
    let normalized = text_utils::normalize_text(text);
    let body = find_references_section(&normalized, config).unwrap_or(normalized.as_str());
    let chunks = split_chunks(body, parser.author_boundary(), config);

    let mut stats = SkipStats {
        total_raw: chunks.len(),
        ..Default::default()
    };
    let mut citations = Vec::new();

    for chunk in chunks {
        if chunk.len() < config.min_chunk_len {
            stats.too_short += 1;
            trace!(len = chunk.len(), "chunk below minimum length");
            continue;
        }
        if !has_citation_shape(chunk) {
            stats.no_shape += 1;
            trace!("chunk failed shape check");
            continue;
        }
        match parser.parse(chunk) {
            Ok(citation) => citations.push(citation),
            Err(err) => {
                stats.parse_failed += 1;
                debug!(%err, "dropping unparseable chunk");
            }
        }
    }

    debug!(
        style = %parser.style(),
        total = stats.total_raw,
        kept = citations.len(),
        dropped = stats.dropped(),
        "citation extraction complete"
    );
    ExtractionResult {
        citations,
        skip_stats: stats,
    }
}
