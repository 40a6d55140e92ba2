//! Models with compile-time training state.
//!
//! A model starts as `Model<B, Unfitted>`, implementing [`TrainableModel`]; the
//! trainer converts it into `Model<B, Fitted>`, which implements
//! [`InferenceModel`]. Calling `predict` on an untrained model is a type error.

pub mod state;
pub use state::{Fitted, Unfitted};

pub mod lstm;
pub use lstm::{LstmConfig, LstmModel, LstmParams, DEFAULT_HIDDEN_UNITS};

pub mod summary;
pub use summary::{LayerSummary, ModelSummary};

use crate::backend::{Backend, Scalar};

/// A model whose parameters can be fitted by gradient descent.
pub trait TrainableModel<B: Backend> {
    type Input;
    type Prediction;
    type Params;
    type Gradients;
    type Output;

    /// Forward pass.
    fn forward(&self, input: &Self::Input) -> Self::Prediction;

    /// Gradients of the loss w.r.t. every parameter, given the gradient of
    /// the loss w.r.t. the prediction for `input`.
    fn backward(&self, input: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients;

    fn params(&self) -> &Self::Params;

    /// Replaces the parameters wholesale.
    fn update_params(&mut self, new_params: &Self::Params);

    /// Freezes the parameters into an inference-only model.
    fn into_fitted(self) -> Self::Output;
}

/// Arithmetic over a whole parameter set, used by the optimizers.
///
/// All binary operations pair tensors positionally and panic if the two sets
/// have different shapes.
pub trait ParamOps<B: Backend>: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, scalar: Scalar<B>) -> Self;

    /// Element-wise product.
    fn mul(&self, other: &Self) -> Self;

    /// Element-wise quotient.
    fn div(&self, other: &Self) -> Self;

    /// Element-wise square root.
    fn sqrt(&self) -> Self;

    /// Adds `scalar` to every element.
    fn add_scalar(&self, scalar: Scalar<B>) -> Self;

    /// A parameter set of the same shapes, filled with zeros.
    fn zeros_like(&self) -> Self;

    /// `self - other`.
    fn sub(&self, other: &Self) -> Self {
        self.add(&other.scale(Scalar::new(-1.0)))
    }
}

/// Prediction interface of a trained model.
pub trait InferenceModel<B: Backend> {
    type InputSingle;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;

    /// Predicts for one sample.
    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle;

    /// Predicts for a batch of samples.
    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch;
}
