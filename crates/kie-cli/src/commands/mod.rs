//! Subcommands and the options they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod parse;

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::debug;

use kie_core::models::config::BackendKind;
use kie_core::{ChunkStrategy, KieConfig, OutputMode, ParsedOutput};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kie")
        .join("config.json")
}

/// The file a command reads and writes configuration from.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration. An explicit path must exist; the default one is
/// optional.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<KieConfig> {
    if let Some(path) = explicit {
        return KieConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config file {}", path.display());
        Ok(KieConfig::from_file(&path)?)
    } else {
        Ok(KieConfig::default())
    }
}

/// Command-line overrides of the pipeline configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Generation backend (echo, completion, baseline)
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// Output format (line, mapping)
    #[arg(short, long)]
    format: Option<OutputMode>,

    /// Long document handling (split, truncate-middle)
    #[arg(long)]
    chunking: Option<ChunkStrategy>,

    /// Model name for the completion backend
    #[arg(long)]
    model: Option<String>,
}

impl PipelineArgs {
    /// Apply the overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut KieConfig) {
        if let Some(backend) = self.backend {
            config.generation.backend = backend;
        }
        if let Some(mode) = self.format {
            config.output.mode = mode;
        }
        if let Some(strategy) = self.chunking {
            config.chunking.strategy = strategy;
        }
        if let Some(model) = &self.model {
            config.generation.completion.model = model.clone();
        }
    }
}

/// Render a result as a single output line.
pub fn render_line(output: &ParsedOutput) -> String {
    output.to_string()
}

/// Render a result for a human reader.
pub fn render_pretty(output: &ParsedOutput) -> anyhow::Result<String> {
    match output {
        ParsedOutput::Line(line) => Ok(line.clone()),
        ParsedOutput::Record(record) => Ok(serde_json::to_string_pretty(record)?),
    }
}
