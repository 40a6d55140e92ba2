//! Benchmark fixtures and timing utilities for seqlabel.
//!
//! - Permutation-task workloads of configurable size
//! - A single-epoch training step shared by the criterion benches and the
//!   backend comparison binary
//! - Timing statistics

pub mod utils;

pub use utils::{benchmark_with_warmup, time_fn, BenchmarkStats};

use seqlabel::{
    backend::{Backend, Tensor3D},
    dataset::{InMemoryDataset, PermutationTask},
    loss::MSELoss,
    model::{Fitted, LstmConfig, LstmModel, LstmParams, Unfitted},
    optimizer::Adam,
    trainer::Trainer,
};

/// Size of a synthetic benchmark workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Workload {
    pub sequences: usize,
    pub timesteps: usize,
    pub classes: usize,
    pub hidden_units: usize,
}

impl Workload {
    pub const fn new(
        sequences: usize,
        timesteps: usize,
        classes: usize,
        hidden_units: usize,
    ) -> Self {
        Self {
            sequences,
            timesteps,
            classes,
            hidden_units,
        }
    }

    /// The 5 × 5 × 5 task with 32 hidden units.
    pub const SMALL: Self = Self::new(5, 5, 5, 32);
    pub const MEDIUM: Self = Self::new(32, 20, 16, 64);
    pub const LARGE: Self = Self::new(128, 50, 32, 128);

    pub fn label(&self) -> String {
        format!(
            "{}x{}x{}_h{}",
            self.sequences, self.timesteps, self.classes, self.hidden_units
        )
    }

    pub fn dataset(&self) -> seqlabel::Result<InMemoryDataset> {
        PermutationTask::new(self.sequences, self.timesteps, self.classes)?.dataset()
    }

    pub fn config(&self) -> LstmConfig {
        LstmConfig::new(self.timesteps, self.classes, self.classes)
            .with_hidden_units(self.hidden_units)
    }

    /// Seeded untrained model for this workload.
    pub fn model<B: Backend>(&self) -> seqlabel::Result<LstmModel<B, Unfitted>> {
        LstmModel::with_seed(self.config(), 0)
    }

    pub fn tensors<B: Backend>(&self) -> seqlabel::Result<(Tensor3D<B>, Tensor3D<B>)> {
        self.dataset()?.tensors()
    }
}

/// Trains `model` for `epochs` full-batch epochs with the default Adam.
pub fn train_epochs<B: Backend>(
    model: LstmModel<B, Unfitted>,
    dataset: &InMemoryDataset,
    epochs: usize,
) -> seqlabel::Result<LstmModel<B, Fitted>> {
    let trainer: Trainer<B, MSELoss, Adam<B, LstmParams<B>>, LstmModel<B, Unfitted>, _> =
        Trainer::builder(MSELoss, Adam::default())
            .max_epochs(epochs)
            .verbose(false)
            .build();
    trainer.fit(model, dataset)
}
