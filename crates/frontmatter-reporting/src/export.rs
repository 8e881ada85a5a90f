use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::summary::BatchSummary;
use crate::types::{ExportFormat, MetadataRecord};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML serialization failed: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Render parsed papers in the given format.
pub fn render_records(
    records: &[MetadataRecord],
    format: ExportFormat,
) -> Result<String, ExportError> {
    Ok(match format {
        ExportFormat::Json => export_json(records)?,
        ExportFormat::Csv => export_csv(records)?,
        ExportFormat::Toml => export_toml(records)?,
    })
}

/// Export parsed papers to `path`.
pub fn export_records(
    records: &[MetadataRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let content = render_records(records, format)?;
    write_file(path, &content)
}

/// Write the `(title_or_identifier, reason)` list of a batch as CSV.
pub fn export_failures(summary: &BatchSummary, path: &Path) -> Result<(), ExportError> {
    write_file(path, &render_failures(summary))
}

pub fn render_failures(summary: &BatchSummary) -> String {
    let mut out = String::from("title_or_identifier,reason\n");
    for (title, reason) in summary.failure_pairs() {
        out.push_str(&format!("{},{}\n", csv_escape(title), csv_escape(reason)));
    }
    out
}

fn write_file(path: &Path, content: &str) -> Result<(), ExportError> {
    let io_err = |source: std::io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::create(path).map_err(io_err)?;
    file.write_all(content.as_bytes()).map_err(io_err)?;
    Ok(())
}

fn export_json(records: &[MetadataRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[derive(Serialize)]
struct TomlDocument<'a> {
    paper: &'a [MetadataRecord],
}

fn export_toml(records: &[MetadataRecord]) -> Result<String, ExportError> {
    Ok(toml::to_string(&TomlDocument { paper: records })?)
}

fn csv_escape(s: &str) -> String {
    if s.contains('"') || s.contains(',') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn opt_str(v: &Option<String>) -> String {
    v.as_deref().map(csv_escape).unwrap_or_default()
}

fn opt_num(v: Option<u32>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

/// One row per paper; the author list goes in as a JSON array.
fn export_csv(records: &[MetadataRecord]) -> Result<String, ExportError> {
    let mut out = String::from(
        "title,authors,editor,keywords,volume,year,n_pages,submitted,revised,published\n",
    );
    for r in records {
        let authors = serde_json::to_string(&r.authors)?;
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            csv_escape(&r.title),
            csv_escape(&authors),
            opt_str(&r.editor),
            opt_str(&r.keywords),
            opt_num(r.volume),
            opt_num(r.year),
            opt_num(r.n_pages),
            opt_str(&r.submitted),
            opt_str(&r.revised),
            opt_str(&r.published),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthorRecord, FailureRecord, RejectedRecord};

    fn record() -> MetadataRecord {
        MetadataRecord {
            title: "Kernels, Margins and You".into(),
            authors: vec![
                AuthorRecord {
                    name: "Jane Doe".into(),
                    affiliation: "Dept. of Statistics, Uni A".into(),
                },
                AuthorRecord {
                    name: "John Roe".into(),
                    affiliation: "Lab B".into(),
                },
            ],
            editor: Some("Ada Lovelace".into()),
            keywords: Some("kernels, margins".into()),
            volume: Some(5),
            year: Some(2004),
            n_pages: Some(20),
            submitted: Some("2003.01".into()),
            revised: None,
            published: Some("2004.06".into()),
        }
    }

    #[test]
    fn test_csv_escape_quotes() {
        assert_eq!(csv_escape(r#"say "hi""#), r#""say ""hi""""#);
    }

    #[test]
    fn test_csv_escape_comma() {
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
    }

    #[test]
    fn test_csv_escape_clean() {
        assert_eq!(csv_escape("plain"), "plain");
    }

    #[test]
    fn test_json_export_uses_boundary_field_names() {
        let out = render_records(&[record()], ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let paper = &value[0];
        assert_eq!(paper["title"], "Kernels, Margins and You");
        assert_eq!(paper["authors"][0]["affiliation"], "Dept. of Statistics, Uni A");
        assert_eq!(paper["n_pages"], 20);
        assert!(paper["revised"].is_null());
    }

    #[test]
    fn test_toml_export_array_of_tables() {
        let out = render_records(&[record(), record()], ExportFormat::Toml).unwrap();
        assert_eq!(out.matches("[[paper]]").count(), 2);
        assert!(!out.contains("revised"));

        #[derive(serde::Deserialize)]
        struct Doc {
            paper: Vec<MetadataRecord>,
        }
        let doc: Doc = toml::from_str(&out).unwrap();
        assert_eq!(doc.paper[1], record());
    }

    #[test]
    fn test_csv_export() {
        let out = render_records(&[record()], ExportFormat::Csv).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "title,authors,editor,keywords,volume,year,n_pages,submitted,revised,published"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"Kernels, Margins and You\",\"[{\"\"name\"\":\"\"Jane Doe\"\""));
        assert!(row.ends_with(",5,2004,20,2003.01,,2004.06"));
    }

    #[test]
    fn test_export_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("papers.json");
        export_records(&[record()], ExportFormat::Json, &out).unwrap();
        assert!(std::fs::read_to_string(&out).unwrap().contains("Ada Lovelace"));

        let summary = BatchSummary {
            rejected: vec![RejectedRecord::id_format("Id, Paper")],
            failed: vec![FailureRecord {
                title_or_identifier: "Broken".into(),
                reason: "NoEditorError".into(),
            }],
            ..Default::default()
        };
        let failures = dir.path().join("failures.csv");
        export_failures(&summary, &failures).unwrap();
        assert_eq!(
            std::fs::read_to_string(&failures).unwrap(),
            "title_or_identifier,reason\n\"Id, Paper\",id format\nBroken,NoEditorError\n"
        );
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let err = export_records(&[], ExportFormat::Csv, Path::new("/nonexistent/dir/out.csv"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
