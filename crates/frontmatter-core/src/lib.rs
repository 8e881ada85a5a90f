use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod span;

// Re-export for convenience
pub use backend::{BackendError, SpanSource};
pub use span::{PageSpans, Rect, Span, StyleFlags, reading_order, sort_spans};

/// Bibliographic fields parsed from the citation header line.
///
/// Fields the header does not carry stay `None`; nothing is defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderInfo {
    pub volume: Option<u32>,
    pub year: Option<u32>,
    pub n_pages: Option<u32>,
    /// `YYYY.MM`
    pub submitted: Option<String>,
    /// `YYYY.MM`, the most recent revision when several are listed.
    pub revised: Option<String>,
    /// `YYYY.MM`
    pub published: Option<String>,
}

/// One author with the affiliation lines typeset below the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub affiliation: Vec<String>,
}

impl Author {
    /// Affiliation tokens flattened into a single string for output records.
    pub fn affiliation_text(&self) -> String {
        self.affiliation
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Metadata of a successfully parsed paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    pub authors: Vec<Author>,
    pub editor: Option<String>,
    pub keywords: Option<String>,
    pub header: HeaderInfo,
}

/// Why a recognised document was deliberately not parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Authors marked only by footnote ids, institutions listed separately.
    IdFormat,
}

impl RejectReason {
    pub fn kind(&self) -> &'static str {
        match self {
            RejectReason::IdFormat => "IdFormatRejected",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::IdFormat => f.write_str("id format"),
        }
    }
}

/// Per-document failure. None of these abort a batch.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtractionError {
    #[error("no pieces extracted")]
    NoSpans,
    #[error(
        "cannot find 'Editor' / 'Abstract' and copyright anchors in order (editor/abstract: {left:?}, copyright: {copyright:?})"
    )]
    ExtractionAnchor {
        left: Option<usize>,
        copyright: Option<usize>,
    },
    #[error("cannot find title")]
    TitleNotFound,
    #[error("no editor marker")]
    NoEditor,
    #[error("no authors")]
    NoAuthors,
    #[error("authors not aligned: {author:?} is {offset:.2} units off the first author")]
    AuthorsNotAligned { author: String, offset: f32 },
    #[error("no email found for author {author:?}")]
    EmailLocation { author: String },
    #[error("unexpected character {ch:?} in affiliation of {author:?}")]
    UnexpectedCharacter { author: String, ch: char },
    #[error("empty affiliation for last author {author:?}")]
    EmptyAffiliation { author: String },
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl ExtractionError {
    /// Stable name used in reports and failure lists.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::NoSpans => "NoSpansError",
            ExtractionError::ExtractionAnchor { .. } => "ExtractionAnchorError",
            ExtractionError::TitleNotFound => "TitleNotFoundError",
            ExtractionError::NoEditor => "NoEditorError",
            ExtractionError::NoAuthors => "NoAuthorsError",
            ExtractionError::AuthorsNotAligned { .. } => "AuthorsNotAlignedError",
            ExtractionError::EmailLocation { .. } => "EmailLocationError",
            ExtractionError::UnexpectedCharacter { .. } => "UnexpectedCharacterError",
            ExtractionError::EmptyAffiliation { .. } => "EmptyAffiliationError",
            ExtractionError::Backend(_) => "BackendError",
            ExtractionError::Timeout { .. } => "TimeoutError",
        }
    }
}

/// Non-fatal findings recorded next to the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseWarning {
    /// The first span does not start with the journal literal.
    MissingJournalLiteral { first_span: String },
    /// The header starts with the literal but does not match the grammar.
    HeaderGrammar { header: String },
    /// No editor label within the configured length bounds.
    EditorLabel { candidate: Option<String> },
    /// No keywords label within the configured length bounds.
    KeywordsLabel { candidate: Option<String> },
}

impl ParseWarning {
    pub fn kind(&self) -> &'static str {
        match self {
            ParseWarning::MissingJournalLiteral { .. } | ParseWarning::HeaderGrammar { .. } => {
                "HeaderGrammarWarning"
            }
            ParseWarning::EditorLabel { .. } | ParseWarning::KeywordsLabel { .. } => {
                "EditorKeywordWarning"
            }
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::MissingJournalLiteral { first_span } => {
                write!(f, "first piece lacks the journal name: {:?}", first_span)
            }
            ParseWarning::HeaderGrammar { header } => {
                write!(f, "cannot parse header info from {:?}", header)
            }
            ParseWarning::EditorLabel { candidate } => {
                write!(f, "cannot find 'Editor' info (candidate: {:?})", candidate)
            }
            ParseWarning::KeywordsLabel { candidate } => {
                write!(f, "cannot find 'Keywords' info (candidate: {:?})", candidate)
            }
        }
    }
}

/// The single discriminated result of parsing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Success(PaperMetadata),
    Rejected {
        title: String,
        reason: RejectReason,
    },
    Failed {
        title_or_identifier: String,
        error: ExtractionError,
        /// Sorted span dump for manual inspection; empty when the spans were
        /// never obtained.
        diagnostics: Vec<Span>,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Best-known title, or the document identifier for failures.
    pub fn title(&self) -> &str {
        match self {
            Outcome::Success(meta) => &meta.title,
            Outcome::Rejected { title, .. } => title,
            Outcome::Failed {
                title_or_identifier,
                ..
            } => title_or_identifier,
        }
    }

    /// Reason string for non-successful outcomes.
    pub fn reason(&self) -> Option<String> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Rejected { reason, .. } => Some(reason.to_string()),
            Outcome::Failed { error, .. } => Some(error.kind().to_string()),
        }
    }
}

/// Outcome plus the warnings recorded while producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub document_id: String,
    pub outcome: Outcome,
    pub warnings: Vec<ParseWarning>,
}

impl ExtractionReport {
    /// Report for a document whose spans could not be obtained at all.
    pub fn failed(document_id: impl Into<String>, error: ExtractionError) -> Self {
        let document_id = document_id.into();
        Self {
            outcome: Outcome::Failed {
                title_or_identifier: document_id.clone(),
                error,
                diagnostics: Vec::new(),
            },
            document_id,
            warnings: Vec::new(),
        }
    }
}
