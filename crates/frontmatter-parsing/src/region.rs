//! Front-matter window: everything above the abstract plus the running footer.

use once_cell::sync::Lazy;
use regex::Regex;

use frontmatter_core::{ExtractionError, Span};

static EDITOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Editor").unwrap());
static ABSTRACT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Abstract").unwrap());
static COPYRIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("(c\u{20DD})|(c\n\u{20DD})|(c\u{25CB})|(\u{00A9})").unwrap());

/// Where the front matter ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeftAnchor {
    /// Span index of the first `Editor` marker.
    Editor(usize),
    /// Span index of the first `Abstract` heading.
    Abstract(usize),
}

/// The retained front matter of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    /// Spans before the cut followed by the footer spans, in reading order.
    pub spans: Vec<Span>,
    /// Number of leading spans that belong to the header/title/author block.
    /// `spans[cut..]` is the footer.
    pub cut: usize,
    pub anchor: LeftAnchor,
}

impl FrontMatter {
    /// Spans above the cut, without the footer.
    pub fn body(&self) -> &[Span] {
        &self.spans[..self.cut]
    }
}

/// Locate the left anchor: an `Editor` span wins over an `Abstract` span.
/// An `Abstract` at index 0 has no preceding span and counts as absent.
pub fn find_left_anchor(spans: &[Span]) -> Option<LeftAnchor> {
    if let Some(i) = spans.iter().position(|s| EDITOR_RE.is_match(&s.text)) {
        return Some(LeftAnchor::Editor(i));
    }
    spans
        .iter()
        .position(|s| ABSTRACT_RE.is_match(&s.text))
        .filter(|&i| i > 0)
        .map(LeftAnchor::Abstract)
}

/// Index of the first span carrying a copyright glyph.
pub fn find_copyright(spans: &[Span]) -> Option<usize> {
    spans.iter().position(|s| COPYRIGHT_RE.is_match(&s.text))
}

/// Exclusive end of the retained head for a given anchor.
///
/// An editor marker keeps its own line so the author block stays bounded by
/// it; an abstract heading drops itself and the span right before it.
fn cut_point(spans: &[Span], anchor: LeftAnchor) -> usize {
    match anchor {
        LeftAnchor::Editor(i) => {
            let marker = &spans[i];
            let mut end = i + 1;
            while end < spans.len() && marker.shares_line_with(&spans[end]) {
                end += 1;
            }
            end
        }
        LeftAnchor::Abstract(i) => i - 1,
    }
}

/// Split sorted page spans into front matter and footer, dropping the
/// abstract and body text in between.
///
/// The input is only borrowed; on failure callers still hold the full dump.
pub fn segment(spans: &[Span]) -> Result<FrontMatter, ExtractionError> {
    if spans.is_empty() {
        return Err(ExtractionError::NoSpans);
    }

    let anchor = find_left_anchor(spans);
    let copyright = find_copyright(spans);

    let (anchor, right) = match (anchor, copyright) {
        (Some(a), Some(r)) => {
            let left = match a {
                LeftAnchor::Editor(i) | LeftAnchor::Abstract(i) => i,
            };
            if left >= r {
                tracing::debug!(left, copyright = r, "anchors out of order");
                return Err(ExtractionError::ExtractionAnchor {
                    left: Some(left),
                    copyright: Some(r),
                });
            }
            (a, r)
        }
        (a, r) => {
            let left = a.map(|a| match a {
                LeftAnchor::Editor(i) | LeftAnchor::Abstract(i) => i,
            });
            return Err(ExtractionError::ExtractionAnchor {
                left,
                copyright: r,
            });
        }
    };

    let cut = cut_point(spans, anchor).min(right);
    let mut kept = Vec::with_capacity(cut + spans.len() - right);
    kept.extend_from_slice(&spans[..cut]);
    kept.extend_from_slice(&spans[right..]);

    tracing::debug!(
        ?anchor,
        copyright = right,
        kept = kept.len(),
        dropped = spans.len() - kept.len(),
        "segmented front matter"
    );

    Ok(FrontMatter {
        spans: kept,
        cut,
        anchor,
    })
}
