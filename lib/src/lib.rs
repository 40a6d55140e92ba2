//! # seqlabel
//!
//! Sequence labelling with a single-layer LSTM: every timestep of an input
//! sequence is mapped to an output vector, and a prediction counts as correct
//! when the argmax of every timestep matches the target's.
//!
//! ## Core Design Principles
//!
//! - **Stateful Type Safety**: models carry their training state in the type
//!   system (`Unfitted` vs `Fitted`), so predicting with an untrained model or
//!   training a frozen one does not compile.
//! - **Training/Inference Separation**: losses, optimizers and the trainer are
//!   separate components; a fitted model only predicts.
//! - **Backend Agnosticism**: the `Backend` trait lets the same model run on the
//!   pure-Rust CPU backend or on `ndarray`.
//!
//! ## Quick Start
//!
//! ```rust
//! use seqlabel::backend::CpuBackend;
//! use seqlabel::dataset::PermutationTask;
//! use seqlabel::evaluate::evaluate;
//! use seqlabel::loss::MSELoss;
//! use seqlabel::model::{InferenceModel, LstmConfig, LstmModel, Unfitted};
//! use seqlabel::optimizer::Adam;
//! use seqlabel::trainer::Trainer;
//!
//! let task = PermutationTask::default();
//! let dataset = task.dataset().unwrap();
//! let (x, y) = dataset.tensors::<CpuBackend>().unwrap();
//!
//! let config = LstmConfig::for_shapes(x.shape(), y.shape());
//! let model = LstmModel::<CpuBackend, Unfitted>::with_seed(config, 0).unwrap();
//!
//! let trainer = Trainer::builder(MSELoss, Adam::<CpuBackend, _>::new(0.001))
//!     .max_epochs(5)
//!     .verbose(false)
//!     .build();
//! let fitted = trainer.fit(model, &dataset).unwrap();
//!
//! let report = evaluate(&fitted.predict_batch(&x), &y).unwrap();
//! assert_eq!(report.len(), 5);
//! ```
//!
//! ## Module Structure
//!
//! - `backend`: tensor abstractions (`Tensor1D`, `Tensor2D`, `Tensor3D`)
//! - `dataset`: dataset sources, the `Dataset` trait, the synthetic task
//! - `model`: the LSTM sequence labeller and its summary
//! - `loss`: differentiable losses (MSE)
//! - `optimizer`: parameter update rules (SGD, Adam)
//! - `trainer`: the training loop
//! - `evaluate`: per-timestep argmax comparison
//! - `config` / `pipeline`: run configuration and the end-to-end flow

pub mod backend;

/// Dataset sources and batching.
pub mod dataset;

pub mod error;

/// Differentiable loss functions for model training.
pub mod loss;

/// Models with compile-time state safety.
pub mod model;

/// Optimization algorithms for parameter updates.
pub mod optimizer;

/// High-level training loop orchestration.
pub mod trainer;

pub mod evaluate;

pub mod config;

pub mod pipeline;

pub use backend::{Backend, Scalar, ScalarOps, Shape3, Tensor1D, Tensor2D, Tensor3D};
#[cfg(feature = "cpu")]
pub use backend::CpuBackend;
pub use error::{Result, SeqLabelError};
