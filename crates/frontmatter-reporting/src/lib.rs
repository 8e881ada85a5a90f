pub mod export;
pub mod summary;
pub mod types;

pub use export::{ExportError, export_failures, export_records, render_failures, render_records};
pub use summary::BatchSummary;
pub use types::{
    AuthorRecord, ExportFormat, FailureRecord, MetadataRecord, OutputRecord, RejectedRecord,
};
