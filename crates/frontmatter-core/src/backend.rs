use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Span;

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract spans: {0}")]
    ExtractionError(String),
    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },
}

/// Trait for span extraction backends.
///
/// Implementors decode a PDF page into positioned text spans; the metadata
/// pipeline itself lives in `frontmatter-parsing` and never touches PDF
/// internals. Spans are returned in extraction order, not reading order.
pub trait SpanSource: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self, path: &Path) -> Result<usize, BackendError>;

    /// Extract the spans of one zero-based page.
    fn extract_spans(&self, path: &Path, page: usize) -> Result<Vec<Span>, BackendError>;

    /// Extract up to `max_pages` leading pages.
    ///
    /// The first page is mandatory; later pages that do not exist are
    /// simply omitted. Backends that can keep the document open across
    /// pages should override this.
    fn extract_leading_pages(
        &self,
        path: &Path,
        max_pages: usize,
    ) -> Result<Vec<Vec<Span>>, BackendError> {
        let count = self.page_count(path)?;
        if count == 0 {
            return Err(BackendError::PageOutOfRange { page: 0, count });
        }
        (0..max_pages.min(count))
            .map(|page| self.extract_spans(path, page))
            .collect()
    }
}
