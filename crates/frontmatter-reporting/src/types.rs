use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use frontmatter_core::{Author, ExtractionReport, Outcome, PaperMetadata, RejectReason};

/// Export format for batch results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Toml,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Toml => "toml",
        }
    }

    /// Infer the format from an output file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        ext.parse().ok()
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "toml" => Ok(ExportFormat::Toml),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub name: String,
    /// Affiliation lines joined with `", "`.
    pub affiliation: String,
}

impl From<&Author> for AuthorRecord {
    fn from(author: &Author) -> Self {
        Self {
            name: author.name.clone(),
            affiliation: author.affiliation_text(),
        }
    }
}

/// One successfully parsed paper, flattened for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    pub authors: Vec<AuthorRecord>,
    pub editor: Option<String>,
    pub keywords: Option<String>,
    pub volume: Option<u32>,
    pub year: Option<u32>,
    pub n_pages: Option<u32>,
    pub submitted: Option<String>,
    pub revised: Option<String>,
    pub published: Option<String>,
}

impl From<&PaperMetadata> for MetadataRecord {
    fn from(meta: &PaperMetadata) -> Self {
        Self {
            title: meta.title.clone(),
            authors: meta.authors.iter().map(AuthorRecord::from).collect(),
            editor: meta.editor.clone(),
            keywords: meta.keywords.clone(),
            volume: meta.header.volume,
            year: meta.header.year,
            n_pages: meta.header.n_pages,
            submitted: meta.header.submitted.clone(),
            revised: meta.header.revised.clone(),
            published: meta.header.published.clone(),
        }
    }
}

/// A recognised document that was deliberately not parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub title: String,
    pub reason: String,
}

/// A document that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub title_or_identifier: String,
    /// Error kind name, e.g. `EmailLocationError`.
    pub reason: String,
}

/// Boundary record for a single outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutputRecord {
    Success(MetadataRecord),
    Rejected(RejectedRecord),
    Failed(FailureRecord),
}

impl From<&Outcome> for OutputRecord {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success(meta) => OutputRecord::Success(meta.into()),
            Outcome::Rejected { title, reason } => OutputRecord::Rejected(RejectedRecord {
                title: title.clone(),
                reason: reason.to_string(),
            }),
            Outcome::Failed {
                title_or_identifier,
                error,
                ..
            } => OutputRecord::Failed(FailureRecord {
                title_or_identifier: title_or_identifier.clone(),
                reason: error.kind().to_string(),
            }),
        }
    }
}

impl From<&ExtractionReport> for OutputRecord {
    fn from(report: &ExtractionReport) -> Self {
        (&report.outcome).into()
    }
}

impl RejectedRecord {
    pub fn id_format(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            reason: RejectReason::IdFormat.to_string(),
        }
    }
}
