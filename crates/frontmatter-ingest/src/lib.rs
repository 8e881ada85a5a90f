use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

pub mod pool;

// Re-export domain types for convenience
pub use frontmatter_core::{ExtractionReport, Outcome, PageSpans, SpanSource};
pub use frontmatter_parsing::MetadataExtractor;
pub use pool::{DocumentJob, ExtractionPool, JobResult};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a PDF file or directory: {0}")]
    NotPdf(PathBuf),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of frontmatter-ingest)")]
    NoPdfSupport,
}

/// Document identifier handed to the parser: the file name.
///
/// The file name is the canonical title of the paper, so no stem
/// transformation beyond `.pdf` stripping (done by the parser) is applied.
pub fn document_identifier(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn collect_dir(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), IngestError> {
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_dir(&path, out)?;
        } else if is_pdf(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Expand files and directories into a sorted, de-duplicated list of PDFs.
///
/// Directories are walked recursively; explicitly named files must carry a
/// `.pdf` extension.
pub fn discover_pdfs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, IngestError> {
    let mut found = Vec::new();
    for input in inputs {
        if input.is_dir() {
            collect_dir(input, &mut found)?;
        } else if is_pdf(input) {
            found.push(input.clone());
        } else if !input.exists() {
            return Err(IngestError::Io {
                path: input.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        } else {
            return Err(IngestError::NotPdf(input.clone()));
        }
    }
    found.sort();
    found.dedup();
    tracing::debug!(count = found.len(), "discovered PDFs");
    Ok(found)
}

/// Extract the leading pages of one document and parse them.
///
/// Backend failures become a `Failed` outcome; nothing here aborts a batch.
pub fn process_document(
    backend: &dyn SpanSource,
    extractor: &MetadataExtractor,
    path: &Path,
) -> ExtractionReport {
    let document_id = document_identifier(path);
    let pages_needed = extractor.config().pages_needed();

    match backend.extract_leading_pages(path, pages_needed) {
        Ok(pages) => {
            let pages: Vec<PageSpans> = pages.into_iter().map(PageSpans::new).collect();
            extractor.parse(&document_id, &pages)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "span extraction failed");
            let mut report = ExtractionReport::failed(
                frontmatter_parsing::canonical_identifier(&document_id),
                e.into(),
            );
            report.document_id = document_id;
            report
        }
    }
}

/// The MuPDF span source, shared across workers.
#[cfg(feature = "pdf")]
pub fn default_backend() -> Result<Arc<dyn SpanSource>, IngestError> {
    Ok(Arc::new(frontmatter_pdf_mupdf::MupdfBackend::default()))
}

#[cfg(not(feature = "pdf"))]
pub fn default_backend() -> Result<Arc<dyn SpanSource>, IngestError> {
    Err(IngestError::NoPdfSupport)
}
