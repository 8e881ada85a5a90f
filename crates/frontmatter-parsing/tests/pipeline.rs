//! End-to-end tests of the extraction pipeline on synthetic JMLR first pages.
//!
//! Pages are built span by span with the fonts and coordinates a typical
//! JMLR paper produces: a 9pt header line, a bold title, bold author names
//! with a monospace email on the same line, 9pt affiliation lines and an
//! `Editor:` line above the abstract.

use frontmatter_core::{
    ExtractionError, HeaderInfo, Outcome, PageSpans, ParseWarning, Rect, Span,
};
use frontmatter_parsing::{MetadataExtractor, ParsingConfigBuilder, parse_document};

const HEADER: &str = "Journal of Machine Learning Research 21 (2020) 1-37 Submitted 9/18; Revised 12/19; Published 9/20";
const DOC: &str = "Efficient Classification for Sparse Data.pdf";

fn at(text: &str, x0: f32, y0: f32, font: &str, size: f32) -> Span {
    let width = 6.0 * text.chars().count() as f32;
    Span::new(text, Rect::new(x0, y0, x0 + width, y0 + size + 2.0), font, size)
}

fn header() -> Span {
    at(HEADER, 72.0, 40.0, "CMR9", 9.0)
}

fn title_lines() -> Vec<Span> {
    vec![
        at("E\u{FB03}cient Classi\u{FB01}cation", 150.0, 90.0, "CMBX12", 14.4),
        at("for Sparse Data", 200.0, 108.0, "CMBX12", 14.4),
    ]
}

fn author(name: &str, email: &str, y0: f32, affiliation: &[&str]) -> Vec<Span> {
    let mut spans = vec![
        at(name, 72.0, y0, "CMBX10", 10.0),
        at(email, 400.0, y0, "CMTT9", 9.0),
    ];
    for (i, line) in affiliation.iter().enumerate() {
        spans.push(at(line, 72.0, y0 + 12.0 + 10.0 * i as f32, "CMR9", 9.0));
    }
    spans
}

fn editor_and_body() -> Vec<Span> {
    vec![
        at("Editor:", 72.0, 240.0, "CMBX9", 9.0),
        at("Ada Lovelace", 110.0, 240.0, "CMR9", 9.0),
        at("Abstract", 280.0, 270.0, "CMBX10", 10.0),
        at("We study classification when features are sparse.", 90.0, 290.0, "CMR10", 10.0),
        at("Keywords: sparse coding, dictionary learning", 90.0, 600.0, "CMR10", 10.0),
    ]
}

fn footer() -> Vec<Span> {
    vec![
        at("\u{00A9}2020 Jane Doe and John Roe.", 72.0, 700.0, "CMR8", 8.0),
        at("License: CC-BY 4.0", 72.0, 712.0, "CMR8", 8.0),
    ]
}

fn normal_page() -> PageSpans {
    let mut spans = vec![header()];
    spans.extend(title_lines());
    spans.extend(author(
        "Jane Doe*",
        "jane@uni.edu",
        150.0,
        &["Department of Statistics", "University of Somewhere"],
    ));
    spans.extend(author("John Roe", "john@lab.org", 200.0, &["Research Lab"]));
    spans.extend(editor_and_body());
    spans.extend(footer());
    // Backends hand spans over in arbitrary order.
    spans.reverse();
    PageSpans::new(spans)
}

#[test]
fn parses_normal_layout() {
    let report = parse_document(DOC, &[normal_page()]);
    assert_eq!(report.document_id, DOC);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let Outcome::Success(meta) = report.outcome else {
        panic!("expected success, got {:?}", report.outcome);
    };
    assert_eq!(meta.title, "Efficient Classification for Sparse Data");
    assert_eq!(meta.authors.len(), 2);
    assert_eq!(meta.authors[0].name, "Jane Doe");
    assert_eq!(
        meta.authors[0].affiliation_text(),
        "Department of Statistics, University of Somewhere"
    );
    assert_eq!(meta.authors[1].name, "John Roe");
    assert_eq!(meta.authors[1].affiliation, vec!["Research Lab"]);
    assert_eq!(meta.editor.as_deref(), Some("Ada Lovelace"));
    assert_eq!(meta.keywords.as_deref(), Some("sparse coding, dictionary learning"));

    assert_eq!(meta.header.volume, Some(21));
    assert_eq!(meta.header.year, Some(2020));
    assert_eq!(meta.header.n_pages, Some(37));
    assert_eq!(meta.header.submitted.as_deref(), Some("2018.09"));
    assert_eq!(meta.header.revised.as_deref(), Some("2019.12"));
    assert_eq!(meta.header.published.as_deref(), Some("2020.09"));
}

#[test]
fn rejects_id_layout() {
    let mut spans = vec![header()];
    spans.extend(title_lines());
    spans.push(at("Jane Doe", 72.0, 150.0, "CMBX10", 10.0));
    spans.push(at("1, 2", 125.0, 150.0, "CMR7", 7.0));
    spans.push(at("John Roe", 200.0, 150.0, "CMBX10", 10.0));
    spans.push(at("2", 250.0, 150.0, "CMR7", 7.0));
    spans.push(at("1 University of Somewhere", 72.0, 170.0, "CMR9", 9.0));
    spans.push(at("2 Research Lab", 72.0, 180.0, "CMR9", 9.0));
    spans.extend(editor_and_body());
    spans.extend(footer());

    let report = parse_document(DOC, &[PageSpans::new(spans)]);
    match report.outcome {
        Outcome::Rejected { title, reason } => {
            assert_eq!(title, "Efficient Classification for Sparse Data");
            assert_eq!(reason.to_string(), "id format");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[test]
fn missing_copyright_fails_with_full_dump() {
    let page = PageSpans::new(
        normal_page()
            .iter()
            .filter(|s| !s.text.contains('\u{00A9}'))
            .cloned()
            .collect(),
    );
    let report = parse_document(DOC, std::slice::from_ref(&page));
    match report.outcome {
        Outcome::Failed {
            title_or_identifier,
            error,
            diagnostics,
        } => {
            assert_eq!(title_or_identifier, "Efficient Classification for Sparse Data");
            assert!(matches!(
                error,
                ExtractionError::ExtractionAnchor {
                    copyright: None,
                    ..
                }
            ));
            assert_eq!(error.kind(), "ExtractionAnchorError");
            assert_eq!(diagnostics, page.to_vec());
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn title_mismatch_fails() {
    let report = parse_document("Some Other Paper.pdf", &[normal_page()]);
    assert_eq!(report.outcome.reason().as_deref(), Some("TitleNotFoundError"));
    assert_eq!(report.outcome.title(), "Some Other Paper");
}

#[test]
fn shared_affiliation_is_backfilled() {
    let mut spans = vec![header()];
    spans.extend(title_lines());
    spans.extend(author("Ann One", "ann@x.org", 150.0, &[]));
    spans.extend(author("Bo Two", "bo@x.org", 170.0, &[]));
    spans.extend(author("Cy Three", "cy@x.org", 190.0, &["Shared Institute", "Some City"]));
    spans.extend(editor_and_body());
    spans.extend(footer());

    let report = parse_document(DOC, &[PageSpans::new(spans)]);
    let Outcome::Success(meta) = report.outcome else {
        panic!("expected success, got {:?}", report.outcome);
    };
    assert_eq!(meta.authors.len(), 3);
    for author in &meta.authors {
        assert_eq!(author.affiliation, vec!["Shared Institute", "Some City"]);
    }
}

#[test]
fn misaligned_author_fails() {
    let mut spans = vec![header()];
    spans.extend(title_lines());
    spans.extend(author("Jane Doe", "jane@uni.edu", 150.0, &["Uni A"]));
    let mut second = author("John Roe", "john@lab.org", 190.0, &["Lab B"]);
    second[0].rect.x0 = 90.0;
    spans.extend(second);
    spans.extend(editor_and_body());
    spans.extend(footer());

    let report = parse_document(DOC, &[PageSpans::new(spans)]);
    assert_eq!(report.outcome.reason().as_deref(), Some("AuthorsNotAlignedError"));
}

#[test]
fn unparsable_header_is_a_warning_only() {
    let page = PageSpans::new(
        normal_page()
            .iter()
            .map(|s| {
                let mut s = s.clone();
                if s.text == HEADER {
                    s.text = "Journal of Machine Learning Research (preprint)".into();
                }
                s
            })
            .collect(),
    );
    let report = parse_document(DOC, &[page]);
    assert!(report.outcome.is_success(), "{:?}", report.outcome);
    assert!(matches!(
        report.warnings.as_slice(),
        [ParseWarning::HeaderGrammar { .. }]
    ));
    let Outcome::Success(meta) = report.outcome else {
        unreachable!()
    };
    assert_eq!(meta.header, HeaderInfo::default());
}

#[test]
fn keywords_found_on_second_page() {
    let first = PageSpans::new(
        normal_page()
            .iter()
            .filter(|s| !s.text.starts_with("Keywords"))
            .cloned()
            .collect(),
    );
    let second = PageSpans::new(vec![at(
        "Keywords: kernels, Gaussian processes",
        90.0,
        80.0,
        "CMR10",
        10.0,
    )]);

    let report = parse_document(DOC, &[first.clone(), second]);
    let Outcome::Success(meta) = report.outcome else {
        panic!("expected success");
    };
    assert_eq!(meta.keywords.as_deref(), Some("kernels, Gaussian processes"));

    let report = parse_document(DOC, &[first]);
    assert!(report.outcome.is_success());
    assert_eq!(
        report.warnings,
        vec![ParseWarning::KeywordsLabel { candidate: None }]
    );
}

#[test]
fn custom_tolerance_accepts_wider_offsets() {
    let mut spans = vec![header()];
    spans.extend(title_lines());
    spans.extend(author("Jane Doe", "jane@uni.edu", 150.0, &["Uni A"]));
    let mut second = author("John Roe", "john@lab.org", 190.0, &["Lab B"]);
    second[0].rect.x0 = 80.0;
    spans.extend(second);
    spans.extend(editor_and_body());
    spans.extend(footer());
    let page = PageSpans::new(spans);

    let config = ParsingConfigBuilder::new()
        .alignment_tolerance(10.0)
        .build()
        .unwrap();
    let report = MetadataExtractor::with_config(config).parse(DOC, std::slice::from_ref(&page));
    assert!(report.outcome.is_success(), "{:?}", report.outcome);

    let report = MetadataExtractor::new().parse(DOC, &[page]);
    assert!(!report.outcome.is_success());
}

#[test]
fn no_pages_is_a_failure() {
    let report = parse_document(DOC, &[]);
    assert_eq!(report.outcome.reason().as_deref(), Some("NoSpansError"));
    assert_eq!(report.document_id, DOC);
}
