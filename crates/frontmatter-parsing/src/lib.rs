//! Heuristic front-matter metadata extraction for journal PDFs.
//!
//! Works on positioned text spans only; PDF decoding is a
//! [`frontmatter_core::SpanSource`] concern.

pub mod authors;
pub mod config;
pub mod extractor;
pub mod format;
pub mod header;
pub mod labels;
pub mod region;
pub mod text_processing;
pub mod title;

pub use authors::AuthorBlock;
pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use extractor::MetadataExtractor;
pub use format::LayoutFormat;
pub use header::{HeaderParse, normalize_date};
pub use region::{FrontMatter, LeftAnchor};
pub use title::{TitleBlock, canonical_identifier};

use frontmatter_core::{ExtractionReport, PageSpans};

/// Parse one document with the default configuration.
pub fn parse_document(document_id: &str, pages: &[PageSpans]) -> ExtractionReport {
    MetadataExtractor::new().parse(document_id, pages)
}
