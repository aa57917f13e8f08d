//! Batch command - extract keys from a dataset or many files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use kie_core::{DatasetTextSource, ExtractionPipeline, FileTextSource, KieConfig, TextColumn};

use super::{load_config, render_line, PipelineArgs};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// A Kleister-style in.tsv, or a glob pattern of document files
    #[arg(required = true)]
    input: String,

    /// Output file, one result line per document (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Text column of the dataset (djvu, tesseract, textract, best)
    #[arg(long, default_value = "best")]
    column: TextColumn,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Also write a per-document summary CSV
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Write an empty line for failed documents instead of stopping
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of extracting a single document.
struct DocumentResult {
    document_id: String,
    line: Option<String>,
    chunks: usize,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.pipeline.apply(&mut config);

    let bar_style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents")?
        .progress_chars("=>-");

    // The pipeline may own a blocking HTTP client, which must be created and
    // dropped off the async runtime
    let input = args.input.clone();
    let column = args.column;
    let (pipeline, document_ids) =
        tokio::task::spawn_blocking(move || open_input(&input, column, &config)).await??;
    let pipeline = Arc::new(pipeline);

    eprintln!(
        "{} Found {} documents to process",
        style("ℹ").blue(),
        document_ids.len()
    );

    let overall_pb = ProgressBar::new(document_ids.len() as u64);
    overall_pb.set_style(bar_style);

    let outcome = extract_all(
        Arc::clone(&pipeline),
        &document_ids,
        args.jobs.max(1),
        args.continue_on_error,
        &overall_pb,
    )
    .await;
    tokio::task::spawn_blocking(move || drop(pipeline)).await?;
    let results = outcome?;

    overall_pb.finish_and_clear();

    write_lines(args.output.as_deref(), &results)?;

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    eprintln!(
        "{} Processed {} documents in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!("{}", style("Failed documents:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.document_id,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Build a pipeline over the input and list its documents in output order.
fn open_input(
    input: &str,
    column: TextColumn,
    config: &KieConfig,
) -> anyhow::Result<(ExtractionPipeline, Vec<String>)> {
    let path = Path::new(input);
    if path.is_file() && is_dataset(path) {
        let source = DatasetTextSource::from_path(path, column)?;
        let ids = source.document_ids().to_vec();
        if ids.is_empty() {
            anyhow::bail!("No documents found in dataset: {}", input);
        }
        debug!("Dataset {} has {} documents", path.display(), ids.len());
        return Ok((ExtractionPipeline::from_config(config, source)?, ids));
    }

    let mut files: Vec<PathBuf> = glob(input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", input);
    }

    let ids = files.iter().map(|p| p.display().to_string()).collect();
    Ok((ExtractionPipeline::from_config(config, FileTextSource::new())?, ids))
}

fn is_dataset(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"))
}

/// Run every document, at most `jobs` at a time, keeping input order.
async fn extract_all(
    pipeline: Arc<ExtractionPipeline>,
    document_ids: &[String],
    jobs: usize,
    continue_on_error: bool,
    pb: &ProgressBar,
) -> anyhow::Result<Vec<DocumentResult>> {
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut tasks = JoinSet::new();
    let mut slots: Vec<Option<DocumentResult>> = document_ids.iter().map(|_| None).collect();

    for (index, document_id) in document_ids.iter().cloned().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let pipeline = Arc::clone(&pipeline);

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let doc_start = Instant::now();
            let result = pipeline
                .raw_outputs(&document_id)
                .map(|chunks| (chunks.len(), render_line(&pipeline.parse_raw(&chunks.outputs))));
            (index, document_id, result, doc_start.elapsed().as_millis() as u64)
        });

        // Collect whatever already finished so failures stop the run early
        while let Some(joined) = tasks.try_join_next() {
            record_result(joined?, continue_on_error, &mut slots, pb)?;
        }
    }

    while let Some(joined) = tasks.join_next().await {
        record_result(joined?, continue_on_error, &mut slots, pb)?;
    }

    Ok(slots.into_iter().flatten().collect())
}

type TaskOutput = (usize, String, kie_core::Result<(usize, String)>, u64);

fn record_result(
    (index, document_id, result, processing_time_ms): TaskOutput,
    continue_on_error: bool,
    slots: &mut [Option<DocumentResult>],
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    pb.inc(1);

    let entry = match result {
        Ok((chunks, line)) => DocumentResult {
            document_id,
            line: Some(line),
            chunks,
            error: None,
            processing_time_ms,
        },
        Err(e) => {
            let error_msg = e.to_string();
            if !continue_on_error {
                error!("Failed to process {}: {}", document_id, error_msg);
                anyhow::bail!("Processing failed for {}: {}", document_id, error_msg);
            }
            warn!("Failed to process {}: {}", document_id, error_msg);
            DocumentResult {
                document_id,
                line: None,
                chunks: 0,
                error: Some(error_msg),
                processing_time_ms,
            }
        }
    };

    slots[index] = Some(entry);
    Ok(())
}

/// One line per document; failed documents leave an empty line.
fn write_lines(output: Option<&Path>, results: &[DocumentResult]) -> anyhow::Result<()> {
    let mut content = String::new();
    for result in results {
        content.push_str(result.line.as_deref().unwrap_or(""));
        content.push('\n');
    }

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
            eprintln!("{} Output written to {}", style("✓").green(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(content.as_bytes())?;
            handle.flush()?;
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[DocumentResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["document", "status", "chunks", "processing_time_ms", "error"])?;

    for result in results {
        let status = if result.error.is_some() { "error" } else { "success" };
        wtr.write_record([
            result.document_id.as_str(),
            status,
            &result.chunks.to_string(),
            &result.processing_time_ms.to_string(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
