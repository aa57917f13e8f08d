//! Parse command - turn saved raw model outputs into results.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use tracing::{debug, info};

use kie_core::{OutputMode, OutputParser};

use super::{load_config, render_pretty};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Raw output files; several files are the chunks of one document
    #[arg(required = true, num_args = 1..)]
    raw: Vec<PathBuf>,

    /// Output format (line, mapping)
    #[arg(short, long)]
    format: Option<OutputMode>,
}

pub fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let schema = config.schema.resolve()?;
    let mode = args.format.unwrap_or(config.output.mode);

    let mut outputs = Vec::with_capacity(args.raw.len());
    for path in &args.raw {
        let raw = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        debug!("Read {} bytes from {}", raw.len(), path.display());
        outputs.push(raw);
    }

    if outputs.len() > 1 {
        info!("Reconciling {} chunk outputs", outputs.len());
    }

    let parser = mode.create_parser(&schema);
    let output = parser.parse_chunks(&outputs);

    println!("{}", render_pretty(&output)?);

    Ok(())
}
