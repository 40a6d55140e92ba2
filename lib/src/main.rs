use clap::{Parser, ValueEnum};
use seqlabel::backend::Backend;
use seqlabel::config::PipelineConfig;
use seqlabel::dataset::{InMemoryDataset, PermutationTask, SequenceSource};
use seqlabel::pipeline;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    Cpu,
    Ndarray,
}

/// Train an LSTM sequence labeller and report per-sequence argmax agreement.
#[derive(Debug, Parser)]
#[command(name = "seqlabel", version, about)]
struct Cli {
    /// Dataset file: `.json`, or the `X_shape = [...]` assignment format
    #[arg(long, conflicts_with = "synthetic")]
    dataset: Option<PathBuf>,

    /// Use the built-in 5×5×5 permutation task (default without --dataset)
    #[arg(long)]
    synthetic: bool,

    /// JSON file with run hyperparameters; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    epochs: Option<usize>,

    /// LSTM hidden units
    #[arg(long)]
    hidden: Option<usize>,

    #[arg(long)]
    learning_rate: Option<f64>,

    /// Seed for weight initialisation
    #[arg(long)]
    seed: Option<u64>,

    /// Log per-epoch loss at debug level only
    #[arg(long)]
    quiet: bool,

    #[arg(long, value_enum, default_value_t = BackendKind::Cpu)]
    backend: BackendKind,
}

impl Cli {
    fn pipeline_config(&self) -> seqlabel::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(hidden) = self.hidden {
            config.hidden_units = hidden;
        }
        if let Some(lr) = self.learning_rate {
            config.learning_rate = lr;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.quiet {
            config.verbose = false;
        }
        config.validate()?;
        Ok(config)
    }

    fn source(&self) -> seqlabel::Result<SequenceSource> {
        match &self.dataset {
            Some(path) if !self.synthetic => SequenceSource::from_path(path),
            _ => Ok(PermutationTask::default().source()),
        }
    }
}

/// Prints the tensors, the model summary and the results table to stdout.
fn execute<B: Backend>(source: SequenceSource, config: &PipelineConfig) -> seqlabel::Result<()> {
    let (input, target) = pipeline::load_tensors::<B>(&source)?;
    println!("X:\n {input}");
    println!("y:\n {target}");

    let model = pipeline::build_model::<B>(&source, config)?;
    println!("{}", model.summary());

    let dataset = InMemoryDataset::from_source(source)?;
    let (fitted, _) = pipeline::train(model, &dataset, config)?;
    let (_, report) = pipeline::predict_and_evaluate(&fitted, &input, &target)?;

    println!("results:");
    println!("{report}");
    Ok(())
}

fn run(cli: &Cli) -> seqlabel::Result<()> {
    let config = cli.pipeline_config()?;
    let source = cli.source()?;
    match cli.backend {
        #[cfg(feature = "cpu")]
        BackendKind::Cpu => execute::<seqlabel::backend::CpuBackend>(source, &config),
        #[cfg(not(feature = "cpu"))]
        BackendKind::Cpu => Err(seqlabel::SeqLabelError::InvalidConfig(
            "built without the `cpu` feature".into(),
        )),
        #[cfg(feature = "ndarray")]
        BackendKind::Ndarray => execute::<seqlabel::backend::NdarrayBackend>(source, &config),
        #[cfg(not(feature = "ndarray"))]
        BackendKind::Ndarray => Err(seqlabel::SeqLabelError::InvalidConfig(
            "built without the `ndarray` feature".into(),
        )),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
