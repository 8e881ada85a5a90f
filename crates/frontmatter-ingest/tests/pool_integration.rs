//! Integration tests for the [`ExtractionPool`].
//!
//! A mock span source serves synthetic first pages keyed by file name, so no
//! PDF is ever opened.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use frontmatter_core::{BackendError, Outcome, Rect, Span, SpanSource};
use frontmatter_ingest::{DocumentJob, ExtractionPool, JobResult, MetadataExtractor};
use tokio_util::sync::CancellationToken;

fn at(text: &str, x0: f32, y0: f32, font: &str, size: f32) -> Span {
    Span::new(text, Rect::new(x0, y0, x0 + 300.0, y0 + size + 2.0), font, size)
}

/// A parseable JMLR-like first page whose title is `title`.
fn page_for(title: &str) -> Vec<Span> {
    vec![
        at(
            "Journal of Machine Learning Research 5 (2004) 1-20 Submitted 1/03; Published 6/04",
            72.0,
            40.0,
            "CMR9",
            9.0,
        ),
        at(title, 150.0, 90.0, "CMBX12", 14.4),
        at("Jane Doe", 72.0, 150.0, "CMBX10", 10.0),
        at("jane@uni.edu", 400.0, 150.0, "CMTT9", 9.0),
        at("University of Somewhere", 72.0, 162.0, "CMR9", 9.0),
        at("Editor:", 72.0, 200.0, "CMBX9", 9.0),
        at("Ada Lovelace", 110.0, 200.0, "CMR9", 9.0),
        at("Abstract", 280.0, 240.0, "CMBX10", 10.0),
        at("Keywords: kernels, margins", 90.0, 500.0, "CMR10", 10.0),
        at("\u{00A9}2004 Jane Doe.", 72.0, 700.0, "CMR8", 8.0),
    ]
}

#[derive(Default)]
struct MockSource {
    pages: HashMap<String, Vec<Span>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSource {
    fn with_titles(titles: &[&str]) -> Self {
        let pages = titles
            .iter()
            .map(|t| (format!("{t}.pdf"), page_for(t)))
            .collect();
        Self {
            pages,
            ..Default::default()
        }
    }

    fn lookup(&self, path: &Path) -> Result<&Vec<Span>, BackendError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        self.pages
            .get(name)
            .ok_or_else(|| BackendError::OpenError(format!("no such document: {name}")))
    }
}

impl SpanSource for MockSource {
    fn page_count(&self, path: &Path) -> Result<usize, BackendError> {
        self.lookup(path).map(|_| 1)
    }

    fn extract_spans(&self, path: &Path, page: usize) -> Result<Vec<Span>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        match page {
            0 => self.lookup(path).cloned(),
            _ => Err(BackendError::PageOutOfRange { page, count: 1 }),
        }
    }
}

async fn run(
    source: Arc<MockSource>,
    paths: Vec<PathBuf>,
    workers: usize,
    timeout: Option<Duration>,
) -> Vec<JobResult> {
    let (pool, mut results) = ExtractionPool::new(
        source,
        Arc::new(MetadataExtractor::new()),
        CancellationToken::new(),
        workers,
        timeout,
    );
    for (index, path) in paths.into_iter().enumerate() {
        pool.submit(DocumentJob { index, path }).await;
    }
    pool.shutdown().await;

    let mut collected = Vec::new();
    while let Some(result) = results.recv().await {
        collected.push(result);
    }
    collected.sort_by_key(|r| r.index);
    collected
}

#[tokio::test]
async fn single_job_completes() {
    let source = Arc::new(MockSource::with_titles(&["Large Margin Kernels"]));
    let results = run(source, vec![PathBuf::from("/in/Large Margin Kernels.pdf")], 2, None).await;

    assert_eq!(results.len(), 1);
    let Outcome::Success(meta) = &results[0].report.outcome else {
        panic!("expected success, got {:?}", results[0].report.outcome);
    };
    assert_eq!(meta.title, "Large Margin Kernels");
    assert_eq!(meta.authors[0].affiliation_text(), "University of Somewhere");
    assert_eq!(meta.keywords.as_deref(), Some("kernels, margins"));
    assert_eq!(meta.header.n_pages, Some(20));
}

#[tokio::test]
async fn multiple_jobs_all_collected() {
    let titles: Vec<String> = (0..6).map(|i| format!("Paper Number {i}")).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let source = Arc::new(MockSource::with_titles(&refs));
    let paths = titles
        .iter()
        .map(|t| PathBuf::from(format!("/in/{t}.pdf")))
        .collect();

    let results = run(source.clone(), paths, 3, None).await;
    assert_eq!(results.len(), 6);
    for (i, r) in results.iter().enumerate() {
        assert_eq!(r.index, i);
        assert!(r.report.outcome.is_success(), "{:?}", r.report.outcome);
        assert_eq!(r.report.outcome.title(), titles[i]);
    }
    assert_eq!(source.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn backend_failure_does_not_abort_batch() {
    let source = Arc::new(MockSource::with_titles(&["Known Paper"]));
    let paths = vec![
        PathBuf::from("/in/Unknown Paper.pdf"),
        PathBuf::from("/in/Known Paper.pdf"),
    ];
    let results = run(source, paths, 1, None).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].report.outcome.reason().as_deref(), Some("BackendError"));
    assert_eq!(results[0].report.outcome.title(), "Unknown Paper");
    assert!(results[1].report.outcome.is_success());
}

#[tokio::test]
async fn slow_document_times_out() {
    let mut source = MockSource::with_titles(&["Slow Paper"]);
    source.delay = Some(Duration::from_millis(500));
    let results = run(
        Arc::new(source),
        vec![PathBuf::from("/in/Slow Paper.pdf")],
        1,
        Some(Duration::from_millis(50)),
    )
    .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].report.outcome.reason().as_deref(), Some("TimeoutError"));
    assert_eq!(results[0].report.document_id, "Slow Paper.pdf");
}

#[tokio::test]
async fn cancelled_pool_takes_no_new_jobs() {
    let source = Arc::new(MockSource::with_titles(&["Any Paper"]));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (pool, mut results) = ExtractionPool::new(
        source.clone(),
        Arc::new(MetadataExtractor::new()),
        cancel,
        2,
        None,
    );
    pool.submit(DocumentJob {
        index: 0,
        path: PathBuf::from("/in/Any Paper.pdf"),
    })
    .await;
    pool.shutdown().await;

    assert!(results.recv().await.is_none());
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}
