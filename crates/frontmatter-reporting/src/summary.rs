use frontmatter_core::ExtractionReport;

use crate::types::{FailureRecord, MetadataRecord, OutputRecord, RejectedRecord};

/// Aggregate of a batch run: records per outcome class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub papers: Vec<MetadataRecord>,
    pub rejected: Vec<RejectedRecord>,
    pub failed: Vec<FailureRecord>,
    /// Documents that produced at least one warning.
    pub with_warnings: usize,
}

impl BatchSummary {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a ExtractionReport>) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.add(report);
        }
        summary
    }

    pub fn add(&mut self, report: &ExtractionReport) {
        if !report.warnings.is_empty() {
            self.with_warnings += 1;
        }
        match OutputRecord::from(report) {
            OutputRecord::Success(r) => self.papers.push(r),
            OutputRecord::Rejected(r) => self.rejected.push(r),
            OutputRecord::Failed(r) => self.failed.push(r),
        }
    }

    pub fn total(&self) -> usize {
        self.papers.len() + self.rejected.len() + self.failed.len()
    }

    /// `(title-or-identifier, reason)` for every document not parsed,
    /// rejections first.
    pub fn failure_pairs(&self) -> Vec<(&str, &str)> {
        self.rejected
            .iter()
            .map(|r| (r.title.as_str(), r.reason.as_str()))
            .chain(
                self.failed
                    .iter()
                    .map(|f| (f.title_or_identifier.as_str(), f.reason.as_str())),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontmatter_core::{ExtractionError, Outcome, ParseWarning, RejectReason};

    fn report(outcome: Outcome, warnings: Vec<ParseWarning>) -> ExtractionReport {
        ExtractionReport {
            document_id: outcome.title().to_string(),
            outcome,
            warnings,
        }
    }

    #[test]
    fn test_counts_and_pairs() {
        let reports = vec![
            report(
                Outcome::Rejected {
                    title: "Id Paper".into(),
                    reason: RejectReason::IdFormat,
                },
                vec![],
            ),
            report(
                Outcome::Failed {
                    title_or_identifier: "Broken".into(),
                    error: ExtractionError::NoEditor,
                    diagnostics: vec![],
                },
                vec![ParseWarning::HeaderGrammar { header: "x".into() }],
            ),
        ];
        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.with_warnings, 1);
        assert_eq!(
            summary.failure_pairs(),
            vec![("Id Paper", "id format"), ("Broken", "NoEditorError")]
        );
    }
}
