use frontmatter_core::{HeaderInfo, ParseWarning, Span};

use crate::config::ParsingConfig;
use crate::text_processing::normalize_whitespace;

/// Result of reading the citation header off the front of the span list.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderParse {
    pub info: HeaderInfo,
    /// Number of leading spans that belong to the header.
    pub consumed: usize,
    pub warning: Option<ParseWarning>,
}

/// Convert an `M/YY` date into `YYYY.MM`.
///
/// Two-digit years of 90 and above fall in the 1900s, the rest in the 2000s.
/// Returns `None` for anything that is not two numbers separated by `/`.
pub fn normalize_date(date: &str) -> Option<String> {
    let (month, year) = date.trim().split_once('/')?;
    let month: u32 = month.trim().parse().ok()?;
    let year: u32 = year.trim().parse().ok()?;
    let century = if year >= 90 { 1900 } else { 2000 };
    Some(format!("{}.{:02}", century + year, month))
}

/// Match a full header string against the configured grammar.
pub fn parse_header_text(text: &str, config: &ParsingConfig) -> Option<HeaderInfo> {
    let caps = config.header_re.captures(text)?;
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().trim().parse::<u32>().ok());

    let start_page = number(3);
    let end_page = number(4);
    let n_pages = match (start_page, end_page) {
        (Some(start), Some(end)) if end >= start => Some(end - start + 1),
        _ => None,
    };

    // Several revisions may be listed; keep the most recent one.
    let revised = caps
        .get(6)
        .and_then(|m| m.as_str().split('&').map(str::trim).rfind(|s| !s.is_empty()))
        .and_then(normalize_date);

    Some(HeaderInfo {
        volume: number(1),
        year: number(2),
        n_pages,
        submitted: caps.get(5).and_then(|m| normalize_date(m.as_str())),
        revised,
        published: caps.get(7).and_then(|m| normalize_date(m.as_str())),
    })
}

/// Case-insensitive, like the header grammar.
fn starts_with_literal(text: &str, literal: &str) -> bool {
    text.trim_start()
        .to_lowercase()
        .starts_with(&literal.to_lowercase())
}

/// Parse the citation header from the first span(s) of the front matter.
///
/// When the first span does not start with the journal literal nothing is
/// consumed. When it does but the grammar fails, spans on the same text
/// line are appended one at a time and the grammar retried; if that still
/// fails only the first span is consumed.
pub fn parse_header(spans: &[Span], config: &ParsingConfig) -> HeaderParse {
    let Some(first) = spans.first() else {
        return HeaderParse {
            info: HeaderInfo::default(),
            consumed: 0,
            warning: Some(ParseWarning::MissingJournalLiteral {
                first_span: String::new(),
            }),
        };
    };

    if !starts_with_literal(&first.text, &config.journal_literal) {
        tracing::warn!(first_span = %first.text, "first piece lacks the journal name");
        return HeaderParse {
            info: HeaderInfo::default(),
            consumed: 0,
            warning: Some(ParseWarning::MissingJournalLiteral {
                first_span: first.text.clone(),
            }),
        };
    }

    let mut header = normalize_whitespace(&first.text);
    let mut end = 1;
    loop {
        if let Some(info) = parse_header_text(&header, config) {
            tracing::debug!(header = %header, spans = end, ?info, "parsed header");
            return HeaderParse {
                info,
                consumed: end,
                warning: None,
            };
        }
        match spans.get(end) {
            Some(next) if first.shares_line_with(next) => {
                header = normalize_whitespace(&format!("{} {}", header, next.text));
                end += 1;
            }
            _ => break,
        }
    }

    tracing::warn!(header = %first.text, "cannot parse header info");
    HeaderParse {
        info: HeaderInfo::default(),
        consumed: 1,
        warning: Some(ParseWarning::HeaderGrammar {
            header: first.text.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontmatter_core::Rect;

    fn config() -> ParsingConfig {
        ParsingConfig::default()
    }

    fn span(text: &str, x0: f32, y0: f32) -> Span {
        Span::new(text, Rect::new(x0, y0, x0 + 200.0, y0 + 9.0), "CMR9", 9.0)
    }

    #[test]
    fn test_full_header_example() {
        let info = parse_header_text(
            "Journal of Machine Learning Research 21 (2020) 1-37 Submitted 9/18; Revised 12/19; Published 9/20",
            &config(),
        )
        .unwrap();
        assert_eq!(
            info,
            HeaderInfo {
                volume: Some(21),
                year: Some(2020),
                n_pages: Some(37),
                submitted: Some("2018.09".into()),
                revised: Some("2019.12".into()),
                published: Some("2020.09".into()),
            }
        );
    }

    #[test]
    fn test_header_without_revision_and_en_dash() {
        let info = parse_header_text(
            "Journal of Machine Learning Research 24 (2023) 12–40 Submitted 3/22; Published 1/23",
            &config(),
        )
        .unwrap();
        assert_eq!(info.n_pages, Some(29));
        assert_eq!(info.revised, None);
        assert_eq!(info.published.as_deref(), Some("2023.01"));
    }

    #[test]
    fn test_header_multiple_revisions_keeps_last() {
        let info = parse_header_text(
            "Journal of Machine Learning Research 22 (2021) 1-10 Submitted 1/19; Revised 3/20 & 11/20; Published 2/21",
            &config(),
        )
        .unwrap();
        assert_eq!(info.revised.as_deref(), Some("2020.11"));
    }

    #[test]
    fn test_header_without_volume() {
        let info = parse_header_text(
            "Journal of Machine Learning Research (2020) 1-5 Submitted 9/18; Published 9/20",
            &config(),
        )
        .unwrap();
        assert_eq!(info.volume, None);
        assert_eq!(info.year, Some(2020));
    }

    #[test]
    fn test_normalize_date_century_boundary() {
        assert_eq!(normalize_date("9/89").as_deref(), Some("2089.09"));
        assert_eq!(normalize_date("9/90").as_deref(), Some("1990.09"));
        assert_eq!(normalize_date("12/05").as_deref(), Some("2005.12"));
        assert_eq!(normalize_date("1/5").as_deref(), Some("2005.01"));
        assert_eq!(normalize_date("garbage"), None);
    }

    #[test]
    fn test_missing_literal_consumes_nothing() {
        let spans = vec![span("Proceedings of Something", 72.0, 10.0)];
        let parse = parse_header(&spans, &config());
        assert_eq!(parse.consumed, 0);
        assert_eq!(parse.info, HeaderInfo::default());
        assert_eq!(parse.warning.unwrap().kind(), "HeaderGrammarWarning");
    }

    #[test]
    fn test_uppercase_header_is_recognised() {
        let spans = vec![span(
            "JOURNAL OF MACHINE LEARNING RESEARCH 5 (2004) 1-20 SUBMITTED 1/03; PUBLISHED 6/04",
            72.0,
            10.0,
        )];
        let parse = parse_header(&spans, &config());
        assert!(parse.warning.is_none(), "{:?}", parse.warning);
        assert_eq!(parse.consumed, 1);
        assert_eq!(parse.info.volume, Some(5));
        assert_eq!(parse.info.n_pages, Some(20));
        assert_eq!(parse.info.published.as_deref(), Some("2004.06"));
    }

    #[test]
    fn test_grammar_failure_consumes_header_span() {
        let spans = vec![
            span("Journal of Machine Learning Research 21 (2020)", 72.0, 10.0),
            span("A Title", 72.0, 60.0),
        ];
        let parse = parse_header(&spans, &config());
        assert_eq!(parse.consumed, 1);
        assert!(matches!(parse.warning, Some(ParseWarning::HeaderGrammar { .. })));
        assert_eq!(parse.info.volume, None);
    }

    #[test]
    fn test_two_span_header_on_one_line() {
        let spans = vec![
            span("Journal of Machine Learning Research 21 (2020) 1-37", 72.0, 10.0),
            span("Submitted 9/18; Revised 12/19; Published 9/20", 330.0, 11.0),
            span("A Title", 72.0, 60.0),
        ];
        let parse = parse_header(&spans, &config());
        assert_eq!(parse.consumed, 2);
        assert!(parse.warning.is_none());
        assert_eq!(parse.info.n_pages, Some(37));
    }
}
