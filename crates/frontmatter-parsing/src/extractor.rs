use frontmatter_core::{
    ExtractionError, ExtractionReport, Outcome, PageSpans, PaperMetadata, ParseWarning,
    RejectReason, Span,
};

use crate::authors::{self, AuthorBlock};
use crate::config::ParsingConfig;
use crate::format::{self, LayoutFormat};
use crate::header::{self, HeaderParse};
use crate::labels;
use crate::region::{self, FrontMatter};
use crate::title::{self, TitleBlock};

/// A configurable front-matter extraction pipeline.
///
/// Holds a [`ParsingConfig`] and exposes each pipeline step as a method.
/// The default constructor uses built-in defaults; use
/// [`MetadataExtractor::with_config`] to supply custom patterns and
/// thresholds.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    config: ParsingConfig,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParsingConfig::default(),
        }
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Cut the page down to header, title and author block plus footer (step 1).
    pub fn segment(&self, spans: &[Span]) -> Result<FrontMatter, ExtractionError> {
        region::segment(spans)
    }

    /// Read the citation header (step 2).
    pub fn parse_header(&self, spans: &[Span]) -> HeaderParse {
        header::parse_header(spans, &self.config)
    }

    /// Find the title spans matching the document identifier (step 3).
    pub fn resolve_title(
        &self,
        spans: &[Span],
        start: usize,
        identifier: &str,
    ) -> Result<TitleBlock, ExtractionError> {
        title::resolve_title(spans, start, identifier)
    }

    /// Tell normal layouts from footnote-id layouts (step 4).
    pub fn classify(&self, spans: &[Span], start: usize) -> LayoutFormat {
        format::classify(spans, start, &self.config)
    }

    /// Extract authors and affiliations of a normal layout (step 5).
    pub fn extract_authors(
        &self,
        spans: &[Span],
        start: usize,
    ) -> Result<AuthorBlock, ExtractionError> {
        authors::extract_authors(spans, start, &self.config)
    }

    /// Run the full pipeline over the leading pages of one document.
    ///
    /// Only the first page feeds the structural stages; later pages are
    /// consulted for the keywords label. Never panics and never returns an
    /// error: every failure is folded into the report's outcome.
    pub fn parse(&self, document_id: &str, pages: &[PageSpans]) -> ExtractionReport {
        let span = tracing::info_span!("parse", document = %document_id);
        let _enter = span.enter();

        let identifier = title::canonical_identifier(document_id).to_string();
        let mut warnings = Vec::new();

        let Some(first) = pages.first() else {
            tracing::info!(error = "NoSpansError", "document failed");
            let mut report = ExtractionReport::failed(identifier, ExtractionError::NoSpans);
            report.document_id = document_id.to_string();
            return report;
        };

        let outcome = match self.run_stages(document_id, first, &mut warnings) {
            Ok(Stage::Rejected(reason)) => {
                tracing::info!(reason = %reason, "document rejected");
                Outcome::Rejected {
                    title: identifier.clone(),
                    reason,
                }
            }
            Ok(Stage::Parsed(mut meta)) => {
                let page_slices: Vec<&[Span]> = pages.iter().map(|p| &**p).collect();

                if meta.editor.is_none() {
                    match labels::search_editor(first, &self.config) {
                        Ok(editor) => meta.editor = Some(editor),
                        Err(warning) => {
                            tracing::warn!(%warning, "editor label");
                            warnings.push(warning);
                        }
                    }
                }

                match labels::search_keywords(&page_slices, &self.config) {
                    Ok(keywords) => meta.keywords = Some(keywords),
                    Err(warning) => {
                        tracing::warn!(%warning, "keywords label");
                        warnings.push(warning);
                    }
                }

                tracing::info!(authors = meta.authors.len(), "document parsed");
                Outcome::Success(meta)
            }
            Err(error) => {
                tracing::info!(error = error.kind(), detail = %error, "document failed");
                Outcome::Failed {
                    title_or_identifier: identifier.clone(),
                    error,
                    diagnostics: first.to_vec(),
                }
            }
        };

        ExtractionReport {
            document_id: document_id.to_string(),
            outcome,
            warnings,
        }
    }

    fn run_stages(
        &self,
        document_id: &str,
        page: &[Span],
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<Stage, ExtractionError> {
        let front = self.segment(page)?;
        let body = front.body();

        let header = self.parse_header(body);
        if let Some(warning) = header.warning {
            warnings.push(warning);
        }

        let title = self.resolve_title(body, header.consumed, document_id)?;

        if self.classify(body, title.next) == LayoutFormat::Id {
            return Ok(Stage::Rejected(RejectReason::IdFormat));
        }

        let block = self.extract_authors(body, title.next)?;

        Ok(Stage::Parsed(PaperMetadata {
            title: title.title,
            authors: block.authors,
            editor: block.editor,
            keywords: None,
            header: header.info,
        }))
    }
}

enum Stage {
    Parsed(PaperMetadata),
    Rejected(RejectReason),
}
