//! Labelled fields found anywhere on the page: `Editor: ...` and `Keywords: ...`.

use once_cell::sync::Lazy;
use regex::Regex;

use frontmatter_core::{ParseWarning, Span};

use crate::config::{LengthBounds, ParsingConfig};
use crate::text_processing::normalize_whitespace;

static EDITOR_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Editor").unwrap());
static KEYWORDS_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Keywords?").unwrap());

// A value consisting of nothing but the label.
static BARE_EDITOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^editors?\s*:?$").unwrap());
static BARE_KEYWORDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^key\s*words?\s*:?$").unwrap());

/// Raw text of a label: from the match to the end of its span, plus the rest
/// of that line. With `continuation`, following lines in the font of the
/// previous line are appended while they sit directly below it.
fn label_candidate(spans: &[Span], re: &Regex, continuation: bool) -> Option<String> {
    let (index, start) = spans
        .iter()
        .enumerate()
        .find_map(|(i, s)| re.find(&s.text).map(|m| (i, m.start())))?;

    let label = &spans[index];
    let mut parts = vec![label.text[start..].to_string()];
    let mut end = index + 1;
    while end < spans.len() && label.shares_line_with(&spans[end]) {
        parts.push(spans[end].text.clone());
        end += 1;
    }

    if continuation {
        let mut prev = &spans[end - 1];
        while let Some(next) = spans.get(end) {
            let gap = next.rect.y0 - prev.rect.y1;
            if !next.same_font(prev) || gap > prev.rect.height() {
                break;
            }
            parts.push(next.text.clone());
            prev = next;
            end += 1;
        }
    }

    Some(normalize_whitespace(&parts.join(" ")))
}

/// Drop the label itself: everything up to and including the first `:`.
fn strip_label(candidate: &str) -> String {
    match candidate.split_once(':') {
        Some((_, value)) => value.trim().to_string(),
        None => candidate.trim().to_string(),
    }
}

fn accept(
    candidate: Option<String>,
    bounds: LengthBounds,
    bare: &Regex,
) -> Result<String, Option<String>> {
    match candidate {
        Some(raw) if bounds.contains(raw.chars().count()) => {
            let value = strip_label(&raw);
            if value.is_empty() || bare.is_match(&value) {
                Err(Some(raw))
            } else {
                Ok(value)
            }
        }
        other => Err(other),
    }
}

/// Handling editor from an `Editor` label on the page.
pub fn search_editor(page: &[Span], config: &ParsingConfig) -> Result<String, ParseWarning> {
    accept(
        label_candidate(page, &EDITOR_LABEL_RE, false),
        config.editor_bounds,
        &BARE_EDITOR_RE,
    )
    .map_err(|candidate| ParseWarning::EditorLabel { candidate })
}

/// Keyword list from a `Keywords` label, looking at the second page when
/// the first has none and the fallback is enabled.
pub fn search_keywords(pages: &[&[Span]], config: &ParsingConfig) -> Result<String, ParseWarning> {
    let searched = if config.keywords_second_page { 2 } else { 1 };
    let candidate = pages
        .iter()
        .take(searched)
        .find_map(|page| label_candidate(page, &KEYWORDS_LABEL_RE, true));
    accept(candidate, config.keywords_bounds, &BARE_KEYWORDS_RE)
        .map_err(|candidate| ParseWarning::KeywordsLabel { candidate })
}
