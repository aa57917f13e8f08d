//! Extract command - pull keys out of a single document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use kie_core::{DatasetTextSource, ExtractionPipeline, FileTextSource, KieConfig, TextColumn};

use super::{load_config, render_pretty, PipelineArgs};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Document file (PDF or text), or a filename from --dataset
    #[arg(required = true)]
    document: String,

    /// Read the document from a Kleister-style in.tsv
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Text column used with --dataset (djvu, tesseract, textract, best)
    #[arg(long, default_value = "best")]
    column: TextColumn,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the raw output of every chunk into this directory
    #[arg(long)]
    save_raw: Option<PathBuf>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.pipeline.apply(&mut config);

    if args.dataset.is_none() && !PathBuf::from(&args.document).is_file() {
        anyhow::bail!("Input file not found: {}", args.document);
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Extracting {}...", args.document));
    pb.enable_steady_tick(Duration::from_millis(100));

    // Backends may block on network I/O, so the pipeline lives off the runtime
    let dataset = args.dataset.clone();
    let column = args.column;
    let document_id = args.document.clone();
    let (chunks, output) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let pipeline = build_pipeline(dataset.as_deref(), column, &config)?;
        debug!("Pipeline: {:?}", pipeline);

        let chunks = pipeline.raw_outputs(&document_id)?;
        let output = pipeline.parse_raw(&chunks.outputs);
        Ok((chunks, output))
    })
    .await??;

    pb.finish_and_clear();
    info!("{} produced {} raw output(s)", args.document, chunks.len());

    if let Some(dir) = &args.save_raw {
        fs::create_dir_all(dir)?;
        for (index, raw) in chunks.outputs.iter().enumerate() {
            fs::write(dir.join(format!("chunk-{:03}.txt", index)), raw)?;
        }
        eprintln!(
            "{} Saved {} raw output(s) to {}",
            style("ℹ").blue(),
            chunks.len(),
            dir.display()
        );
    }

    let rendered = render_pretty(&output)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, format!("{}\n", rendered))?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", rendered);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn build_pipeline(
    dataset: Option<&Path>,
    column: TextColumn,
    config: &KieConfig,
) -> anyhow::Result<ExtractionPipeline> {
    match dataset {
        Some(dataset) => {
            let source = DatasetTextSource::from_path(dataset, column)?;
            info!("Loaded {} documents from {}", source.len(), dataset.display());
            Ok(ExtractionPipeline::from_config(config, source)?)
        }
        None => Ok(ExtractionPipeline::from_config(config, FileTextSource::new())?),
    }
}
