//! Permutation labelling walkthrough.
//!
//! This example trains the LSTM on a shuffled permutation task and shows:
//! - Generating a dataset and writing it in the assignment-module format
//! - Reading it back and reshaping into tensors
//! - Building a seeded model and printing its summary
//! - Training with the `Trainer` directly, keeping the loss history
//! - Per-sequence evaluation
//!
//! Run with: cargo run --example permutation_task

use seqlabel::{
    backend::CpuBackend,
    dataset::{InMemoryDataset, PermutationTask, SequenceSource},
    evaluate::evaluate,
    loss::MSELoss,
    model::{InferenceModel, LstmConfig, LstmModel, Unfitted},
    optimizer::Adam,
    trainer::Trainer,
};
use std::error::Error;

const SEQUENCES: usize = 6;
const TIMESTEPS: usize = 4;
const CLASSES: usize = 6;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();

    println!("=== Permutation Labelling ===\n");

    // 1. Generate the task and serialise it the way an exporter would
    let task = PermutationTask::shuffled(SEQUENCES, TIMESTEPS, CLASSES, 2024)?;
    println!("permutation: {:?}", task.permutation());
    let module_text = task.source().to_module_string();
    println!("exported {} bytes of dataset text\n", module_text.len());

    // 2. Parse it back
    let source = SequenceSource::parse_module(&module_text)?;
    let dataset = InMemoryDataset::from_source(source)?;
    let (x, y) = dataset.tensors::<CpuBackend>()?;
    println!("input shape {}, target shape {}\n", x.shape(), y.shape());

    // 3. Model
    let config = LstmConfig::for_shapes(x.shape(), y.shape()).with_hidden_units(16);
    let model = LstmModel::<CpuBackend, Unfitted>::with_seed(config, 7)?;
    println!("{}\n", model.summary());

    // 4. Train
    let trainer = Trainer::builder(MSELoss, Adam::<CpuBackend, _>::new(0.01))
        .max_epochs(400)
        .verbose(false)
        .build();
    let (fitted, history) = trainer.fit_with_history(model, &dataset)?;
    for (epoch, loss) in history.losses.iter().enumerate().step_by(100) {
        println!("epoch {epoch:>4}: loss = {loss:.6}");
    }
    if let Some(loss) = history.final_loss() {
        println!("final loss = {loss:.6}\n");
    }

    // 5. Evaluate on the training sequences
    let report = evaluate(&fitted.predict_batch(&x), &y)?;
    println!("{report}");
    println!(
        "\n{}/{} sequences labelled correctly",
        report.matched_count(),
        report.len()
    );
    Ok(())
}
