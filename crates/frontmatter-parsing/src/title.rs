use frontmatter_core::{ExtractionError, Span};

use crate::text_processing::projection;

/// Location of the resolved title inside the span list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleBlock {
    /// Exposed title: the canonical identifier, not the accumulated text.
    pub title: String,
    /// Index of the first title span.
    pub first: usize,
    /// Index of the last title span.
    pub last: usize,
    /// First index below the title's last line.
    pub next: usize,
}

/// Strip a trailing `.pdf` (any case) from a document identifier.
pub fn canonical_identifier(identifier: &str) -> &str {
    let len = identifier.len();
    if len >= 4
        && identifier.is_char_boundary(len - 4)
        && identifier[len - 4..].eq_ignore_ascii_case(".pdf")
    {
        &identifier[..len - 4]
    } else {
        identifier
    }
}

/// Accumulate spans from `start` until their projection equals the
/// identifier's projection.
///
/// Accumulation stops early once the running projection is no longer a
/// prefix of the target. An identifier that projects to nothing never
/// matches.
pub fn resolve_title(
    spans: &[Span],
    start: usize,
    identifier: &str,
) -> Result<TitleBlock, ExtractionError> {
    let title = canonical_identifier(identifier);
    let target = projection(title);
    if target.is_empty() {
        tracing::debug!(identifier, "identifier has no alphanumeric content");
        return Err(ExtractionError::TitleNotFound);
    }

    let mut accumulated = String::new();
    let mut last = None;
    for (i, span) in spans.iter().enumerate().skip(start) {
        accumulated.push_str(&projection(&span.text));
        if accumulated == target {
            last = Some(i);
            break;
        }
        if !target.starts_with(&accumulated) {
            break;
        }
    }

    let Some(last) = last else {
        tracing::debug!(identifier, start, "title spans do not match identifier");
        return Err(ExtractionError::TitleNotFound);
    };

    let bottom = &spans[last];
    let mut next = last + 1;
    while next < spans.len() && bottom.shares_line_with(&spans[next]) {
        next += 1;
    }

    tracing::debug!(title, first = start, last, next, "resolved title");
    Ok(TitleBlock {
        title: title.to_string(),
        first: start,
        last,
        next,
    })
}
