// trainer/mod.rs
use crate::{
    backend::{Backend, Scalar, Tensor3D},
    dataset::Dataset,
    error::{Result, SeqLabelError},
    loss::Loss,
    model::{ParamOps, TrainableModel},
    optimizer::Optimizer,
};
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

/// Per-epoch mean loss recorded by [`Trainer::fit_with_history`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    pub losses: Vec<f64>,
}

impl History {
    pub fn epochs(&self) -> usize {
        self.losses.len()
    }

    pub fn first_loss(&self) -> Option<f64> {
        self.losses.first().copied()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}

/// Orchestrates the training loop for a `TrainableModel`.
///
/// Combines a loss function and an optimizer to fit a model on a dataset.
/// Once built via `TrainerBuilder` it is immutable and can be reused across
/// models: every call to `fit` works on a fresh clone of the optimizer.
pub struct Trainer<B, L, O, M, P>
where
    B: Backend,
    L: Loss<B>,
    M: TrainableModel<B, Params = P, Gradients = P>,
    O: Optimizer<B, P>,
{
    pub(crate) batch_size: Option<usize>,
    pub(crate) max_epochs: usize,
    pub(crate) verbose: bool,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    _phantom_backend: PhantomData<B>,
    _phantom_model: PhantomData<M>,
}

/// Fluent builder for constructing a `Trainer`.
///
/// Defaults:
/// - `batch_size`: the whole dataset
/// - `max_epochs`: 1000
/// - `verbose`: true
pub struct TrainerBuilder<B, L, O, M, P>
where
    B: Backend,
    L: Loss<B>,
    M: TrainableModel<B, Params = P, Gradients = P>,
    O: Optimizer<B, P>,
{
    batch_size: Option<usize>,
    max_epochs: usize,
    verbose: bool,
    loss_fn: L,
    optimizer: O,
    _phantom_backend: PhantomData<B>,
    _phantom_model: PhantomData<M>,
}

pub const DEFAULT_MAX_EPOCHS: usize = 1000;

impl<B, L, O, M, P> TrainerBuilder<B, L, O, M, P>
where
    B: Backend,
    L: Loss<B>,
    M: TrainableModel<B, Params = P, Gradients = P>,
    O: Optimizer<B, P>,
{
    pub fn new(loss_fn: L, optimizer: O) -> Self {
        Self {
            batch_size: None,
            max_epochs: DEFAULT_MAX_EPOCHS,
            verbose: true,
            loss_fn,
            optimizer,
            _phantom_backend: PhantomData,
            _phantom_model: PhantomData,
        }
    }

    /// Sequences per optimizer step; `None` uses the whole dataset as one
    /// batch.
    pub fn batch_size(mut self, size: impl Into<Option<usize>>) -> Self {
        self.batch_size = size.into();
        self
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// When `false`, per-epoch loss is logged at `debug` instead of `info`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Trainer<B, L, O, M, P> {
        Trainer {
            batch_size: self.batch_size,
            max_epochs: self.max_epochs,
            verbose: self.verbose,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            _phantom_backend: PhantomData,
            _phantom_model: PhantomData,
        }
    }
}

impl<B, L, O, M, P> Trainer<B, L, O, M, P>
where
    B: Backend,
    L: Loss<B>,
    M: TrainableModel<B, Params = P, Gradients = P>,
    O: Optimizer<B, P>,
{
    /// Starts the builder; equivalent to `TrainerBuilder::new(...)`.
    pub fn builder(loss_fn: L, optimizer: O) -> TrainerBuilder<B, L, O, M, P> {
        TrainerBuilder::new(loss_fn, optimizer)
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn batch_size(&self) -> Option<usize> {
        self.batch_size
    }
}

impl<B, L, O, M, P> Trainer<B, L, O, M, P>
where
    B: Backend,
    L: Loss<B, Prediction = Tensor3D<B>, Target = Tensor3D<B>>,
    M: TrainableModel<B, Input = Tensor3D<B>, Prediction = Tensor3D<B>, Params = P, Gradients = P>,
    O: Optimizer<B, P>,
    P: ParamOps<B>,
{
    /// Trains the model for exactly `max_epochs` epochs and freezes it.
    ///
    /// # Errors
    /// - [`SeqLabelError::UnknownDatasetLength`] if the dataset cannot report
    ///   its length
    /// - [`SeqLabelError::EmptyDataset`] if it holds no sequences
    /// - [`SeqLabelError::InvalidConfig`] for an explicit batch size of zero
    /// - [`SeqLabelError::Data`] if a batch fails to load
    pub fn fit<D: Dataset>(&self, model: M, dataset: &D) -> Result<M::Output> {
        self.fit_with_history(model, dataset).map(|(fitted, _)| fitted)
    }

    /// Like [`fit`](Self::fit), also returning the mean loss of every epoch.
    ///
    /// The epoch loss is the batch losses weighted by batch size, so with the
    /// default single batch it is exactly the loss of that batch.
    pub fn fit_with_history<D: Dataset>(
        &self,
        mut model: M,
        dataset: &D,
    ) -> Result<(M::Output, History)> {
        let n_total = dataset.len().ok_or(SeqLabelError::UnknownDatasetLength)?;
        if n_total == 0 {
            return Err(SeqLabelError::EmptyDataset);
        }
        let batch_size = match self.batch_size {
            Some(0) => {
                return Err(SeqLabelError::InvalidConfig(
                    "batch size must be positive".into(),
                ))
            }
            Some(size) => size,
            None => n_total,
        };

        let mut optimizer = self.optimizer.clone();
        let mut history = History {
            losses: Vec::with_capacity(self.max_epochs),
        };
        debug!(
            epochs = self.max_epochs,
            batch_size,
            sequences = n_total,
            "starting training"
        );

        for epoch in 0..self.max_epochs {
            let mut total_loss = Scalar::<B>::new(0.0);
            for batch_result in dataset.batches::<B>(batch_size) {
                let (batch_x, batch_y) =
                    batch_result.map_err(|e| SeqLabelError::Data(e.to_string()))?;
                let weight = Scalar::<B>::new(batch_x.shape().batch as f64);

                let preds = model.forward(&batch_x);
                total_loss = total_loss + self.loss_fn.loss(&preds, &batch_y) * weight;
                let grad_preds = self.loss_fn.grad_wrt_prediction(&preds, &batch_y);
                let grads = model.backward(&batch_x, &grad_preds);

                let new_params = optimizer.step(model.params(), &grads);
                model.update_params(&new_params);
            }

            let avg_loss = (total_loss / Scalar::<B>::new(n_total as f64)).to_f64();
            if !avg_loss.is_finite() {
                warn!(epoch, loss = avg_loss, "loss is not finite");
            }
            if self.verbose {
                info!(epoch, loss = avg_loss, "epoch finished");
            } else {
                debug!(epoch, loss = avg_loss, "epoch finished");
            }
            history.losses.push(avg_loss);
        }

        Ok((model.into_fitted(), history))
    }
}
