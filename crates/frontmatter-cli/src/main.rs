use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use frontmatter_core::config_file::{self, ConfigFile};
use frontmatter_core::{Outcome, PageSpans};
use frontmatter_ingest::{DocumentJob, ExtractionPool, MetadataExtractor, pool::default_workers};
use frontmatter_parsing::ParsingConfigBuilder;
use frontmatter_reporting::{BatchSummary, ExportFormat, OutputRecord};
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Journal front-matter extractor - pull title, authors and header metadata out of JMLR PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Path to a TOML config file (replaces the platform and CWD config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the front-matter metadata of a single PDF
    Extract {
        /// Path to the PDF
        pdf: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Print the sorted span dump when parsing fails
        #[arg(long)]
        dump_spans: bool,
    },

    /// Extract metadata from many PDFs (files or directories)
    Batch {
        /// PDF files or directories to scan recursively
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write parsed papers to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format: json, csv or toml (default: from output extension)
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Write the (title, reason) list of unparsed documents as CSV
        #[arg(long)]
        failures: Option<PathBuf>,

        /// Number of concurrent workers
        #[arg(long)]
        workers: Option<usize>,

        /// Per-document timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Print the positioned spans of one page
    Spans {
        /// Path to the PDF
        pdf: PathBuf,

        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Print the spans as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let file_config = match &cli.config {
        Some(path) => match config_file::load_from_path(path) {
            Some(config) => config,
            None => anyhow::bail!("Cannot load config file: {}", path.display()),
        },
        None => config_file::load_config(),
    };
    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Extract {
            pdf,
            json,
            dump_spans,
        } => extract(&pdf, json, dump_spans, &file_config, color).await,
        Command::Batch {
            paths,
            output,
            format,
            failures,
            workers,
            timeout_secs,
        } => {
            let options = BatchOptions::resolve(
                &file_config,
                output,
                format,
                failures,
                workers,
                timeout_secs,
            )?;
            batch(paths, options, &file_config, color).await
        }
        Command::Spans { pdf, page, json } => spans(&pdf, page, json, color),
    }
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn build_extractor(file_config: &ConfigFile) -> anyhow::Result<MetadataExtractor> {
    let builder = match &file_config.parsing {
        Some(section) => ParsingConfigBuilder::from_section(section),
        None => ParsingConfigBuilder::new(),
    };
    let config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid pattern in [parsing] config: {}", e))?;
    Ok(MetadataExtractor::with_config(config))
}

fn env_number<T: std::str::FromStr>(key: &str) -> anyhow::Result<Option<T>> {
    match std::env::var(key) {
        Ok(value) => match value.trim().parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => anyhow::bail!("{} must be a number, got {:?}", key, value),
        },
        Err(_) => Ok(None),
    }
}

async fn extract(
    pdf: &Path,
    json: bool,
    dump_spans: bool,
    file_config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !pdf.exists() {
        anyhow::bail!("File not found: {}", pdf.display());
    }
    let backend = frontmatter_ingest::default_backend()?;
    let extractor = build_extractor(file_config)?;

    let path = pdf.to_path_buf();
    let report = tokio::task::spawn_blocking(move || {
        frontmatter_ingest::process_document(backend.as_ref(), &extractor, &path)
    })
    .await?;

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    if json {
        let record = OutputRecord::from(&report);
        writeln!(writer, "{}", serde_json::to_string_pretty(&record)?)?;
    } else {
        output::print_report(&mut writer, &report, color)?;
    }

    if dump_spans
        && let Outcome::Failed { diagnostics, .. } = &report.outcome
        && !diagnostics.is_empty()
    {
        writeln!(writer)?;
        output::print_spans(&mut writer, diagnostics, color)?;
    }
    Ok(())
}

/// Batch settings after applying CLI > env > config file > defaults.
#[derive(Debug)]
struct BatchOptions {
    output: Option<PathBuf>,
    format: ExportFormat,
    failures: Option<PathBuf>,
    workers: usize,
    timeout: Option<Duration>,
}

impl BatchOptions {
    fn resolve(
        file_config: &ConfigFile,
        output: Option<PathBuf>,
        format: Option<ExportFormat>,
        failures: Option<PathBuf>,
        workers: Option<usize>,
        timeout_secs: Option<u64>,
    ) -> anyhow::Result<Self> {
        let batch = file_config.batch.as_ref();
        let out = file_config.output.as_ref();

        let workers = match workers {
            Some(n) => n,
            None => env_number("FRONTMATTER_WORKERS")?
                .or_else(|| batch.and_then(|b| b.num_workers))
                .unwrap_or_else(default_workers),
        };
        if workers == 0 {
            anyhow::bail!("Worker count must be at least 1");
        }

        let timeout_secs = match timeout_secs {
            Some(n) => Some(n),
            None => env_number("FRONTMATTER_TIMEOUT")?.or_else(|| batch.and_then(|b| b.timeout_secs)),
        };

        let format = match format {
            Some(f) => f,
            None => {
                let from_output = output
                    .as_ref()
                    .and_then(|p| p.extension())
                    .and_then(|e| e.to_str())
                    .and_then(ExportFormat::from_extension);
                match (from_output, out.and_then(|o| o.format.as_deref())) {
                    (Some(f), _) => f,
                    (None, Some(name)) => name.parse().map_err(anyhow::Error::msg)?,
                    (None, None) => ExportFormat::default(),
                }
            }
        };

        let failures = failures.or_else(|| {
            out.and_then(|o| o.failures_path.as_ref())
                .map(PathBuf::from)
        });

        Ok(Self {
            output,
            format,
            failures,
            workers,
            timeout: timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
        })
    }
}

async fn batch(
    paths: Vec<PathBuf>,
    options: BatchOptions,
    file_config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let documents = frontmatter_ingest::discover_pdfs(&paths)?;
    if documents.is_empty() {
        anyhow::bail!("No PDF files found");
    }
    let backend = frontmatter_ingest::default_backend()?;
    let extractor = Arc::new(build_extractor(file_config)?);

    tracing::info!(
        documents = documents.len(),
        workers = options.workers,
        timeout = ?options.timeout,
        "starting batch"
    );

    let cancel = CancellationToken::new();

    // Set up Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let (pool, mut results) = ExtractionPool::new(
        backend,
        extractor,
        cancel.clone(),
        options.workers,
        options.timeout,
    );
    let total = documents.len();
    for (index, path) in documents.into_iter().enumerate() {
        pool.submit(DocumentJob { index, path }).await;
    }
    let shutdown = tokio::spawn(pool.shutdown());

    let bar_style = ProgressStyle::with_template(
        "{spinner:.green} {msg} [{bar:40.green/dim}] {pos}/{len} (eta {eta})",
    )
    .unwrap()
    .progress_chars("=> ");
    let bar = ProgressBar::new(total as u64);
    bar.set_style(bar_style);
    bar.set_message("Parsing");
    bar.enable_steady_tick(Duration::from_millis(120));

    let mut collected = Vec::with_capacity(total);
    while let Some(result) = results.recv().await {
        let mut line = Vec::new();
        output::print_batch_line(&mut line, &result.report, color)?;
        bar.println(String::from_utf8_lossy(&line).trim_end());
        bar.inc(1);
        collected.push(result);
    }
    bar.finish_and_clear();
    shutdown.await?;

    if cancel.is_cancelled() {
        tracing::warn!(
            completed = collected.len(),
            total,
            "interrupted; reporting completed documents only"
        );
    }

    collected.sort_by_key(|r| r.index);
    let summary = BatchSummary::from_reports(collected.iter().map(|r| &r.report));

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    output::print_summary(&mut writer, &summary, color)?;

    if let Some(path) = &options.output {
        frontmatter_reporting::export_records(&summary.papers, options.format, path)?;
        writeln!(writer, "Wrote {} papers to {}", summary.papers.len(), path.display())?;
    }
    if let Some(path) = &options.failures {
        frontmatter_reporting::export_failures(&summary, path)?;
        writeln!(
            writer,
            "Wrote {} unparsed documents to {}",
            summary.failure_pairs().len(),
            path.display()
        )?;
    }
    Ok(())
}

fn spans(pdf: &Path, page: usize, json: bool, color: ColorMode) -> anyhow::Result<()> {
    if !pdf.exists() {
        anyhow::bail!("File not found: {}", pdf.display());
    }
    let backend = frontmatter_ingest::default_backend()?;
    let page_spans = PageSpans::new(backend.extract_spans(pdf, page)?);

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&page_spans)?)?;
    } else {
        output::print_spans(&mut writer, &page_spans, color)?;
    }
    Ok(())
}
