//! Extraction pipeline: text source, model input, generation, parsing.
//!
//! The pipeline only sequences its collaborators. It fetches the document
//! text, produces one raw output per chunk, and hands the outputs to the
//! configured [`OutputParser`], which picks single-output parsing or
//! multi-chunk reconciliation by itself.

use std::fmt;

use tracing::{debug, info};

use kie_generate::{EchoGenerator, Generator};

use crate::baseline::{FuzzyBaseline, HeuristicExtractor};
use crate::error::{KieError, Result};
use crate::models::config::{BackendKind, KieConfig};
use crate::models::output::ParsedOutput;
use crate::models::schema::KeySchema;
use crate::parse::{OutputMode, OutputParser};
use crate::prompt::{Chunker, NeutralPrompt, PromptBuilder, Shot};
use crate::source::TextSource;

/// How raw output is produced from document text.
pub enum Strategy {
    /// Prompt a generator, chunking long documents.
    Generative {
        prompt: Box<dyn PromptBuilder>,
        generator: Box<dyn Generator>,
        chunker: Chunker,
    },
    /// Read the document directly, no model.
    Heuristic(Box<dyn HeuristicExtractor>),
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Generative { generator, chunker, .. } => f
                .debug_struct("Generative")
                .field("generator", &generator.name())
                .field("chunker", chunker)
                .finish(),
            Strategy::Heuristic(extractor) => f.debug_tuple("Heuristic").field(&extractor.name()).finish(),
        }
    }
}

/// Raw outputs produced for one document, one per chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSet {
    pub document_id: String,
    /// Token count of each model input (empty for heuristic runs).
    pub input_tokens: Vec<usize>,
    pub outputs: Vec<String>,
}

impl ChunkSet {
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Runs documents through a source, a strategy and a parser.
pub struct ExtractionPipeline {
    schema: KeySchema,
    source: Box<dyn TextSource>,
    parser: Box<dyn OutputParser>,
    strategy: Strategy,
}

impl ExtractionPipeline {
    pub fn builder() -> ExtractionPipelineBuilder {
        ExtractionPipelineBuilder::default()
    }

    /// Assemble a pipeline from configuration.
    pub fn from_config(config: &KieConfig, source: impl TextSource + 'static) -> Result<Self> {
        let schema = config.schema.resolve()?;

        let strategy = match config.generation.backend {
            BackendKind::Baseline => {
                Strategy::Heuristic(Box::new(FuzzyBaseline::new(config.baseline.min_similarity)))
            }
            backend => {
                let generator: Box<dyn Generator> = match backend {
                    BackendKind::Completion => completion_generator(config)?,
                    _ => Box::new(EchoGenerator::new()),
                };
                Strategy::Generative {
                    prompt: Box::new(neutral_prompt(config, &schema)?),
                    generator,
                    chunker: Chunker::new(config.chunking.strategy)
                        .with_overlap(config.chunking.overlap_tokens)
                        .with_safety_margin(config.chunking.safety_margin_tokens),
                }
            }
        };

        Self::builder()
            .schema(schema)
            .source(source)
            .output_mode(config.output.mode)
            .strategy(strategy)
            .build()
    }

    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Produce the raw output of every chunk of a document.
    pub fn raw_outputs(&self, document_id: &str) -> Result<ChunkSet> {
        let text = self.source.get_text(document_id)?;
        info!("Document {}: {} chars", document_id, text.len());

        let (input_tokens, outputs) = match &self.strategy {
            Strategy::Generative {
                prompt,
                generator,
                chunker,
            } => {
                let inputs = chunker.model_inputs(&text, prompt.as_ref(), generator.max_input_tokens())?;
                info!("Running {} on {} model input(s)", generator.name(), inputs.len());

                let mut outputs = Vec::with_capacity(inputs.len());
                for (index, input) in inputs.iter().enumerate() {
                    let output = generator.generate(&input.text)?;
                    debug!("Raw output {} ({} tokens in): {:?}", index, input.token_count, output);
                    outputs.push(output);
                }
                (inputs.iter().map(|input| input.token_count).collect(), outputs)
            }
            Strategy::Heuristic(extractor) => {
                info!("Running {}", extractor.name());
                let output = extractor.extract(&text, &self.schema);
                debug!("Raw output: {:?}", output);
                (Vec::new(), vec![output])
            }
        };

        Ok(ChunkSet {
            document_id: document_id.to_string(),
            input_tokens,
            outputs,
        })
    }

    /// Extract the schema's keys from a document.
    pub fn predict(&self, document_id: &str) -> Result<ParsedOutput> {
        let chunks = self.raw_outputs(document_id)?;
        if chunks.len() > 1 {
            info!("Reconciling {} chunk outputs for {}", chunks.len(), document_id);
        }
        Ok(self.parser.parse_chunks(&chunks.outputs))
    }

    /// Parse raw outputs produced earlier, as the chunks of one document.
    pub fn parse_raw(&self, outputs: &[String]) -> ParsedOutput {
        self.parser.parse_chunks(outputs)
    }
}

impl fmt::Debug for ExtractionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionPipeline")
            .field("schema", &self.schema.name())
            .field("strategy", &self.strategy)
            .finish()
    }
}

fn neutral_prompt(config: &KieConfig, schema: &KeySchema) -> Result<NeutralPrompt> {
    let mut prompt = NeutralPrompt::new(schema, &config.prompt.stop_key);

    if let Some(path) = &config.prompt.shots_file {
        let shots = Shot::load_all(path)?;
        prompt = prompt.with_shots(&shots);
    }

    if let Some(path) = &config.prompt.tokenizer_file {
        #[cfg(feature = "hf-tokenizer")]
        {
            prompt = prompt.with_tokenizer(crate::prompt::HfTokenizer::from_file(path)?);
        }
        #[cfg(not(feature = "hf-tokenizer"))]
        {
            return Err(KieError::Config(format!(
                "prompt.tokenizer_file {} needs the hf-tokenizer feature",
                path.display()
            )));
        }
    }

    Ok(prompt)
}

#[cfg(feature = "http")]
fn completion_generator(config: &KieConfig) -> Result<Box<dyn Generator>> {
    let generator = kie_generate::CompletionGenerator::from_config(config.generation.completion.clone())?;
    Ok(Box::new(generator))
}

#[cfg(not(feature = "http"))]
fn completion_generator(_config: &KieConfig) -> Result<Box<dyn Generator>> {
    Err(KieError::Config(
        "the completion backend needs the http feature".to_string(),
    ))
}

/// Builder for [`ExtractionPipeline`].
#[derive(Default)]
pub struct ExtractionPipelineBuilder {
    schema: Option<KeySchema>,
    source: Option<Box<dyn TextSource>>,
    parser: Option<Box<dyn OutputParser>>,
    output_mode: OutputMode,
    strategy: Option<Strategy>,
}

impl ExtractionPipelineBuilder {
    /// Key vocabulary. Required.
    pub fn schema(mut self, schema: KeySchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Where document text comes from. Required.
    pub fn source(mut self, source: impl TextSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Presentation mode, used when no explicit parser is given.
    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Explicit output parser.
    pub fn parser(mut self, parser: impl OutputParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Prompt a generator.
    pub fn generative(
        mut self,
        prompt: impl PromptBuilder + 'static,
        generator: impl Generator + 'static,
        chunker: Chunker,
    ) -> Self {
        self.strategy = Some(Strategy::Generative {
            prompt: Box::new(prompt),
            generator: Box::new(generator),
            chunker,
        });
        self
    }

    /// Use a heuristic extractor instead of a model.
    pub fn heuristic(mut self, extractor: impl HeuristicExtractor + 'static) -> Self {
        self.strategy = Some(Strategy::Heuristic(Box::new(extractor)));
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn build(self) -> Result<ExtractionPipeline> {
        let schema = self
            .schema
            .ok_or_else(|| KieError::Config("pipeline needs a key schema".to_string()))?;
        let source = self
            .source
            .ok_or_else(|| KieError::Config("pipeline needs a text source".to_string()))?;
        let strategy = self
            .strategy
            .ok_or_else(|| KieError::Config("pipeline needs a generator or a heuristic extractor".to_string()))?;
        let parser = self
            .parser
            .unwrap_or_else(|| self.output_mode.create_parser(&schema));

        info!("Pipeline ready: schema {}, {:?}", schema.name(), strategy);

        Ok(ExtractionPipeline {
            schema,
            source,
            parser,
            strategy,
        })
    }
}
