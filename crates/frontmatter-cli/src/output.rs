use std::io::Write;

use frontmatter_core::{ExtractionReport, Outcome, PaperMetadata, Span};
use frontmatter_reporting::BatchSummary;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn opt(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("-")
}

fn print_metadata(w: &mut dyn Write, meta: &PaperMetadata, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", meta.title.bold().cyan())?;
    } else {
        writeln!(w, "{}", meta.title)?;
    }

    let h = &meta.header;
    let num = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
    writeln!(
        w,
        "  Volume {} ({}), {} pages; submitted {}, revised {}, published {}",
        num(h.volume),
        num(h.year),
        num(h.n_pages),
        opt(&h.submitted),
        opt(&h.revised),
        opt(&h.published),
    )?;

    for author in &meta.authors {
        if color.enabled() {
            writeln!(w, "  {} {}", author.name.bold(), author.affiliation_text().dimmed())?;
        } else {
            writeln!(w, "  {} ({})", author.name, author.affiliation_text())?;
        }
    }
    writeln!(w, "  Editor:   {}", opt(&meta.editor))?;
    writeln!(w, "  Keywords: {}", opt(&meta.keywords))?;
    Ok(())
}

/// Print the outcome of one document with its warnings.
pub fn print_report(
    w: &mut dyn Write,
    report: &ExtractionReport,
    color: ColorMode,
) -> std::io::Result<()> {
    match &report.outcome {
        Outcome::Success(meta) => print_metadata(w, meta, color)?,
        Outcome::Rejected { title, reason } => {
            if color.enabled() {
                writeln!(w, "{} {} ({})", "SKIPPED".yellow().bold(), title, reason)?;
            } else {
                writeln!(w, "SKIPPED {} ({})", title, reason)?;
            }
        }
        Outcome::Failed {
            title_or_identifier,
            error,
            ..
        } => {
            if color.enabled() {
                writeln!(
                    w,
                    "{} {}: {} [{}]",
                    "FAILED".red().bold(),
                    title_or_identifier,
                    error,
                    error.kind().dimmed()
                )?;
            } else {
                writeln!(w, "FAILED {}: {} [{}]", title_or_identifier, error, error.kind())?;
            }
        }
    }

    for warning in &report.warnings {
        if color.enabled() {
            writeln!(w, "  {} {}", "warning:".yellow(), warning)?;
        } else {
            writeln!(w, "  warning: {}", warning)?;
        }
    }
    Ok(())
}

/// Print a one-line status for a document as it completes in a batch.
pub fn print_batch_line(
    w: &mut dyn Write,
    report: &ExtractionReport,
    color: ColorMode,
) -> std::io::Result<()> {
    let (tag, detail) = match &report.outcome {
        Outcome::Success(_) => ("ok", String::new()),
        Outcome::Rejected { reason, .. } => ("skipped", format!(" ({})", reason)),
        Outcome::Failed { error, .. } => ("failed", format!(" ({})", error.kind())),
    };
    if color.enabled() {
        let tag = match tag {
            "ok" => tag.green().to_string(),
            "skipped" => tag.yellow().to_string(),
            _ => tag.red().to_string(),
        };
        writeln!(w, "[{}] {}{}", tag, report.outcome.title(), detail.dimmed())
    } else {
        writeln!(w, "[{}] {}{}", tag, report.outcome.title(), detail)
    }
}

/// Print the sorted span dump used for manual inspection.
pub fn print_spans(w: &mut dyn Write, spans: &[Span], color: ColorMode) -> std::io::Result<()> {
    for (i, span) in spans.iter().enumerate() {
        let r = &span.rect;
        let position = format!("({:7.2}, {:7.2}, {:7.2}, {:7.2})", r.x0, r.y0, r.x1, r.y1);
        let style = format!(
            "{} {:.1}pt {}",
            span.font_name,
            span.font_size,
            span.style_flags.describe()
        );
        if color.enabled() {
            writeln!(
                w,
                "{:>4} {} {} {:?}",
                i.dimmed(),
                position.dimmed(),
                style.cyan(),
                span.text
            )?;
        } else {
            writeln!(w, "{:>4} {} {} {:?}", i, position, style, span.text)?;
        }
    }
    Ok(())
}

/// Print batch counts followed by every `(title, reason)` pair.
pub fn print_summary(
    w: &mut dyn Write,
    summary: &BatchSummary,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "Summary".bold())?;
        writeln!(w, "  Parsed:   {}", summary.papers.len().to_string().green())?;
        writeln!(w, "  Skipped:  {}", summary.rejected.len().to_string().yellow())?;
        writeln!(w, "  Failed:   {}", summary.failed.len().to_string().red())?;
    } else {
        writeln!(w, "Summary")?;
        writeln!(w, "  Parsed:   {}", summary.papers.len())?;
        writeln!(w, "  Skipped:  {}", summary.rejected.len())?;
        writeln!(w, "  Failed:   {}", summary.failed.len())?;
    }
    writeln!(w, "  Warnings: {}", summary.with_warnings)?;
    writeln!(w, "  Total:    {}", summary.total())?;

    let pairs = summary.failure_pairs();
    if !pairs.is_empty() {
        writeln!(w)?;
        for (title, reason) in pairs {
            if color.enabled() {
                writeln!(w, "  {} {}", title, format!("[{}]", reason).dimmed())?;
            } else {
                writeln!(w, "  {} [{}]", title, reason)?;
            }
        }
    }
    Ok(())
}
