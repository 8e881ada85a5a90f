use once_cell::sync::Lazy;
use regex::Regex;

use frontmatter_core::{Author, ExtractionError, Span};

use crate::config::ParsingConfig;
use crate::text_processing::{normalize_whitespace, strip_trailing_markers};

static EDITOR_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*Editors?\s*:").unwrap());

/// Authors of a normal-format block plus the editor named under it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorBlock {
    pub authors: Vec<Author>,
    pub editor: Option<String>,
}

/// Index of the first `Editor:` marker at or after `start`.
pub fn find_editor_marker(spans: &[Span], start: usize) -> Option<usize> {
    spans
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, s)| EDITOR_MARKER_RE.is_match(&s.text))
        .map(|(i, _)| i)
}

/// Indices in `start..marker` typeset in exactly the font of `spans[start]`.
pub fn author_rows(spans: &[Span], start: usize, marker: usize) -> Vec<usize> {
    let Some(first) = spans.get(start).filter(|_| start < marker) else {
        return Vec::new();
    };
    (start..marker).filter(|&i| spans[i].same_font(first)).collect()
}

fn check_alignment(
    spans: &[Span],
    rows: &[usize],
    config: &ParsingConfig,
) -> Result<(), ExtractionError> {
    let x0 = spans[rows[0]].rect.x0;
    for &row in rows {
        let offset = (spans[row].rect.x0 - x0).abs();
        if offset > config.alignment_tolerance {
            return Err(ExtractionError::AuthorsNotAligned {
                author: spans[row].text.clone(),
                offset,
            });
        }
    }
    Ok(())
}

/// Editor named by the marker: the text after its colon, or the next span
/// when the marker holds only the label.
fn editor_after_marker(spans: &[Span], marker: usize) -> Option<String> {
    let inline = spans[marker]
        .text
        .split_once(':')
        .map(|(_, rest)| normalize_whitespace(rest))
        .unwrap_or_default();
    let editor = if inline.is_empty() {
        spans
            .get(marker + 1)
            .map(|s| normalize_whitespace(&s.text))
            .unwrap_or_default()
    } else {
        inline
    };
    (!editor.is_empty()).then_some(editor)
}

/// Give every author with no affiliation of its own the affiliation of its
/// nearest successor that has one. Walks right to left so chains resolve.
pub fn backfill_affiliations(authors: &mut [Author]) {
    for i in (0..authors.len().saturating_sub(1)).rev() {
        if authors[i].affiliation.is_empty() {
            authors[i].affiliation = authors[i + 1].affiliation.clone();
        }
    }
}

/// Extract authors, affiliations and the editor from a normal-format block.
///
/// `start` is the first span below the title block. The block ends at the
/// `Editor:` marker.
pub fn extract_authors(
    spans: &[Span],
    start: usize,
    config: &ParsingConfig,
) -> Result<AuthorBlock, ExtractionError> {
    let marker = find_editor_marker(spans, start).ok_or(ExtractionError::NoEditor)?;

    let rows = author_rows(spans, start, marker);
    if rows.is_empty() {
        return Err(ExtractionError::NoAuthors);
    }
    tracing::debug!(rows = rows.len(), marker, "author rows");

    check_alignment(spans, &rows, config)?;

    let bound = |k: usize| rows.get(k + 1).copied().unwrap_or(marker);

    for (k, &row) in rows.iter().enumerate() {
        let has_email = spans[row + 1..bound(k)].iter().any(|s| s.text.contains('@'));
        if !has_email {
            return Err(ExtractionError::EmailLocation {
                author: spans[row].text.clone(),
            });
        }
    }

    let mut authors = Vec::with_capacity(rows.len());
    for (k, &row) in rows.iter().enumerate() {
        let name_span = &spans[row];
        let name = strip_trailing_markers(&name_span.text, &config.name_markers);
        let end = bound(k);

        let mut line = row + 1;
        while line < end && name_span.shares_line_with(&spans[line]) {
            line += 1;
        }

        let mut affiliation = Vec::new();
        for span in &spans[line..end] {
            let mut chars = span.text.chars();
            if let (Some(ch), None) = (chars.next(), chars.next())
                && !ch.is_ascii_alphanumeric()
                && !config.affiliation_punctuation.contains(&ch)
            {
                return Err(ExtractionError::UnexpectedCharacter { author: name, ch });
            }
            affiliation.push(span.text.clone());
        }
        authors.push(Author { name, affiliation });
    }

    if let Some(last) = authors.last()
        && last.affiliation.is_empty()
    {
        return Err(ExtractionError::EmptyAffiliation {
            author: last.name.clone(),
        });
    }

    backfill_affiliations(&mut authors);

    let editor = editor_after_marker(spans, marker);
    tracing::debug!(authors = authors.len(), editor = ?editor, "extracted authors");

    Ok(AuthorBlock { authors, editor })
}
