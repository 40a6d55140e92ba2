//! LSTM sequence labeller.
//!
//! One LSTM layer that emits a hidden vector at every timestep, followed by a
//! dense projection shared across timesteps (no activation):
//!
//! ```text
//! z_t = x_t·W + h_{t-1}·U + b          gates in order [i | f | c | o]
//! i = σ(z_i)  f = σ(z_f)  g = tanh(z_c)  o = σ(z_o)
//! c_t = f ⊙ c_{t-1} + i ⊙ g
//! h_t = o ⊙ tanh(c_t)
//! y_t = h_t·V + d
//! ```
//!
//! Hidden and cell state start at zero for every forward pass.
//!
//! - [`LstmModel<B, Unfitted>`] implements [`TrainableModel`]; gradients are
//!   computed by backpropagation through time.
//! - [`LstmModel<B, Fitted>`] implements [`InferenceModel`].

use crate::backend::{Backend, Scalar, Shape3, Tensor1D, Tensor2D, Tensor3D};
use crate::error::{Result, SeqLabelError};
use crate::model::summary::{LayerSummary, ModelSummary};
use crate::model::{Fitted, InferenceModel, ParamOps, TrainableModel, Unfitted};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Hidden width used when none is configured.
pub const DEFAULT_HIDDEN_UNITS: usize = 32;

/// Layer sizes of an [`LstmModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LstmConfig {
    /// Sequence length the model is built for. Only reported in the summary;
    /// the recurrence itself accepts any length.
    pub timesteps: usize,
    pub input_features: usize,
    pub hidden_units: usize,
    pub output_features: usize,
}

impl LstmConfig {
    /// Configuration with [`DEFAULT_HIDDEN_UNITS`].
    pub fn new(timesteps: usize, input_features: usize, output_features: usize) -> Self {
        Self {
            timesteps,
            input_features,
            hidden_units: DEFAULT_HIDDEN_UNITS,
            output_features,
        }
    }

    pub fn with_hidden_units(mut self, hidden_units: usize) -> Self {
        self.hidden_units = hidden_units;
        self
    }

    /// Sizes the model for a dataset's input and target shapes.
    pub fn for_shapes(input: Shape3, target: Shape3) -> Self {
        Self::new(input.timesteps, input.features, target.features)
    }

    /// Rejects zero-sized layers.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("input_features", self.input_features),
            ("hidden_units", self.hidden_units),
            ("output_features", self.output_features),
        ];
        match sizes.iter().find(|(_, v)| *v == 0) {
            Some((name, _)) => Err(SeqLabelError::InvalidConfig(format!(
                "{name} must be greater than zero"
            ))),
            None => Ok(()),
        }
    }

    /// Trainable parameters of the LSTM layer: `4·(h·(in + h) + h)`.
    pub fn lstm_param_count(&self) -> usize {
        let h = self.hidden_units;
        4 * (h * (self.input_features + h) + h)
    }

    /// Trainable parameters of the dense projection: `h·out + out`.
    pub fn dense_param_count(&self) -> usize {
        self.hidden_units * self.output_features + self.output_features
    }
}

/// Trainable parameters.
///
/// Gate blocks inside `kernel`, `recurrent_kernel` and `bias` are laid out
/// `[input | forget | cell | output]`, each `hidden_units` wide.
#[derive(Clone, Debug)]
pub struct LstmParams<B: Backend> {
    /// `W`, shape `[input_features, 4h]`.
    pub kernel: Tensor2D<B>,
    /// `U`, shape `[h, 4h]`.
    pub recurrent_kernel: Tensor2D<B>,
    /// `b`, length `4h`.
    pub bias: Tensor1D<B>,
    /// `V`, shape `[h, output_features]`.
    pub dense_kernel: Tensor2D<B>,
    /// `d`, length `output_features`.
    pub dense_bias: Tensor1D<B>,
}

impl<B: Backend> LstmParams<B> {
    /// All-zero parameters for `config`.
    pub fn zeros(config: &LstmConfig) -> Self {
        let h = config.hidden_units;
        Self {
            kernel: Tensor2D::zeros(config.input_features, 4 * h),
            recurrent_kernel: Tensor2D::zeros(h, 4 * h),
            bias: Tensor1D::zeros(4 * h),
            dense_kernel: Tensor2D::zeros(h, config.output_features),
            dense_bias: Tensor1D::zeros(config.output_features),
        }
    }

    /// Keras-style initialisation: Glorot-uniform kernels, orthogonal
    /// recurrent kernel, zero biases except a unit forget-gate bias.
    pub fn init<R: Rng + ?Sized>(config: &LstmConfig, rng: &mut R) -> Self {
        let LstmConfig {
            input_features,
            hidden_units: h,
            output_features,
            ..
        } = *config;

        let mut bias = vec![0.0; 4 * h];
        bias[h..2 * h].fill(1.0);

        Self {
            kernel: Tensor2D::from_f64(
                glorot_uniform(input_features, 4 * h, rng),
                input_features,
                4 * h,
            ),
            recurrent_kernel: Tensor2D::from_f64(orthogonal(h, 4 * h, rng), h, 4 * h),
            bias: Tensor1D::from_f64(bias),
            dense_kernel: Tensor2D::from_f64(
                glorot_uniform(h, output_features, rng),
                h,
                output_features,
            ),
            dense_bias: Tensor1D::zeros(output_features),
        }
    }

    /// Every parameter in declaration order, each tensor row-major.
    pub fn to_flat(&self) -> Vec<f64> {
        let mut out = self.kernel.to_vec();
        out.extend(self.recurrent_kernel.to_vec());
        out.extend(self.bias.to_vec());
        out.extend(self.dense_kernel.to_vec());
        out.extend(self.dense_bias.to_vec());
        out
    }

    pub fn num_params(&self) -> usize {
        let count = |t: &Tensor2D<B>| t.shape().0 * t.shape().1;
        count(&self.kernel)
            + count(&self.recurrent_kernel)
            + self.bias.len()
            + count(&self.dense_kernel)
            + self.dense_bias.len()
    }

    fn matches(&self, config: &LstmConfig) -> bool {
        let h = config.hidden_units;
        self.kernel.shape() == (config.input_features, 4 * h)
            && self.recurrent_kernel.shape() == (h, 4 * h)
            && self.bias.len() == 4 * h
            && self.dense_kernel.shape() == (h, config.output_features)
            && self.dense_bias.len() == config.output_features
    }

    fn map(
        &self,
        f2: impl Fn(&Tensor2D<B>) -> Tensor2D<B>,
        f1: impl Fn(&Tensor1D<B>) -> Tensor1D<B>,
    ) -> Self {
        Self {
            kernel: f2(&self.kernel),
            recurrent_kernel: f2(&self.recurrent_kernel),
            bias: f1(&self.bias),
            dense_kernel: f2(&self.dense_kernel),
            dense_bias: f1(&self.dense_bias),
        }
    }

    fn zip(
        &self,
        other: &Self,
        f2: impl Fn(&Tensor2D<B>, &Tensor2D<B>) -> Tensor2D<B>,
        f1: impl Fn(&Tensor1D<B>, &Tensor1D<B>) -> Tensor1D<B>,
    ) -> Self {
        Self {
            kernel: f2(&self.kernel, &other.kernel),
            recurrent_kernel: f2(&self.recurrent_kernel, &other.recurrent_kernel),
            bias: f1(&self.bias, &other.bias),
            dense_kernel: f2(&self.dense_kernel, &other.dense_kernel),
            dense_bias: f1(&self.dense_bias, &other.dense_bias),
        }
    }
}

impl<B: Backend> ParamOps<B> for LstmParams<B> {
    fn add(&self, other: &Self) -> Self {
        self.zip(other, Tensor2D::add, Tensor1D::add)
    }

    fn scale(&self, scalar: Scalar<B>) -> Self {
        self.map(|t| t.scale(&scalar), |t| t.scale(&scalar))
    }

    fn mul(&self, other: &Self) -> Self {
        self.zip(other, Tensor2D::mul, Tensor1D::mul)
    }

    fn div(&self, other: &Self) -> Self {
        self.zip(other, Tensor2D::div, Tensor1D::div)
    }

    fn sqrt(&self) -> Self {
        self.map(Tensor2D::sqrt, Tensor1D::sqrt)
    }

    fn add_scalar(&self, scalar: Scalar<B>) -> Self {
        self.map(|t| t.add_scalar(&scalar), |t| t.add_scalar(&scalar))
    }

    fn zeros_like(&self) -> Self {
        self.map(
            |t| {
                let (r, c) = t.shape();
                Tensor2D::zeros(r, c)
            },
            |t| Tensor1D::zeros(t.len()),
        )
    }
}

fn glorot_uniform<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Vec<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    (0..fan_in * fan_out)
        .map(|_| rng.gen_range(-limit..=limit))
        .collect()
}

/// Row-major `rows × cols` matrix with orthonormal rows (or columns, whichever
/// is shorter), from Gram-Schmidt on a Gaussian matrix.
fn orthogonal<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Vec<f64> {
    // Orthonormalise `k` vectors of length `n`, then lay them out as rows or columns.
    let (n, k) = (rows.max(cols), rows.min(cols));
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(k);
    while basis.len() < k {
        let mut v: Vec<f64> = (0..n)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        for q in &basis {
            let dot: f64 = q.iter().zip(&v).map(|(a, b)| a * b).sum();
            v.iter_mut().zip(q).for_each(|(x, qi)| *x -= dot * qi);
        }
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        // resample the (measure-zero) degenerate draw
        if norm > 1e-10 {
            v.iter_mut().for_each(|x| *x /= norm);
            basis.push(v);
        }
    }

    let mut out = vec![0.0; rows * cols];
    for (j, q) in basis.iter().enumerate() {
        for (i, &val) in q.iter().enumerate() {
            if rows <= cols {
                out[j * cols + i] = val;
            } else {
                out[i * cols + j] = val;
            }
        }
    }
    out
}

/// Activations of one timestep kept for the backward pass.
struct StepCache<B: Backend> {
    x: Tensor2D<B>,
    h_prev: Tensor2D<B>,
    c_prev: Tensor2D<B>,
    i: Tensor2D<B>,
    f: Tensor2D<B>,
    g: Tensor2D<B>,
    o: Tensor2D<B>,
    tanh_c: Tensor2D<B>,
    h: Tensor2D<B>,
}

/// LSTM + time-distributed dense model with the training state encoded in `S`.
pub struct LstmModel<B: Backend, S> {
    config: LstmConfig,
    params: LstmParams<B>,
    _state: PhantomData<S>,
}

impl<B: Backend, S> Clone for LstmModel<B, S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            params: self.params.clone(),
            _state: PhantomData,
        }
    }
}

impl<B: Backend> LstmModel<B, Unfitted> {
    /// Builds a freshly initialised model.
    ///
    /// # Errors
    /// [`SeqLabelError::InvalidConfig`] for zero-sized layers.
    pub fn new<R: Rng + ?Sized>(config: LstmConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            params: LstmParams::init(&config, rng),
            _state: PhantomData,
        })
    }

    /// [`LstmModel::new`] with a seeded [`StdRng`], for reproducible runs.
    ///
    /// # Example
    /// ```
    /// use seqlabel::backend::CpuBackend;
    /// use seqlabel::model::{LstmConfig, LstmModel, TrainableModel, Unfitted};
    ///
    /// let config = LstmConfig::new(5, 5, 5);
    /// let a = LstmModel::<CpuBackend, Unfitted>::with_seed(config, 7).unwrap();
    /// let b = LstmModel::<CpuBackend, Unfitted>::with_seed(config, 7).unwrap();
    /// assert_eq!(a.params().to_flat(), b.params().to_flat());
    /// ```
    pub fn with_seed(config: LstmConfig, seed: u64) -> Result<Self> {
        Self::new(config, &mut StdRng::seed_from_u64(seed))
    }

    /// Builds a model from explicit parameters (warm start, tests).
    ///
    /// # Errors
    /// [`SeqLabelError::InvalidConfig`] if the parameter shapes do not match.
    pub fn from_params(config: LstmConfig, params: LstmParams<B>) -> Result<Self> {
        config.validate()?;
        if !params.matches(&config) {
            return Err(SeqLabelError::InvalidConfig(
                "parameter shapes do not match the model configuration".into(),
            ));
        }
        Ok(Self {
            config,
            params,
            _state: PhantomData,
        })
    }
}

impl<B: Backend> LstmModel<B, Fitted> {
    /// Read-only view of the trained parameters.
    pub fn params(&self) -> &LstmParams<B> {
        &self.params
    }
}

impl<B: Backend, S> LstmModel<B, S> {
    pub fn config(&self) -> &LstmConfig {
        &self.config
    }

    /// Keras-style layer table.
    pub fn summary(&self) -> ModelSummary {
        let c = &self.config;
        ModelSummary::new(
            "sequential",
            vec![
                LayerSummary::new(
                    "lstm",
                    "LSTM",
                    vec![None, Some(c.timesteps), Some(c.hidden_units)],
                    c.lstm_param_count(),
                ),
                LayerSummary::new(
                    "time_distributed",
                    "TimeDistributed",
                    vec![None, Some(c.timesteps), Some(c.output_features)],
                    c.dense_param_count(),
                ),
            ],
        )
    }

    /// Runs the recurrence over per-timestep `[batch, input_features]`
    /// matrices, returning per-timestep outputs and the activation cache.
    ///
    /// # Panics
    /// If the feature width differs from the configuration.
    fn run(&self, steps: &[Tensor2D<B>]) -> (Vec<Tensor2D<B>>, Vec<StepCache<B>>) {
        let h = self.config.hidden_units;
        let p = &self.params;
        let batch = steps.first().map_or(0, |s| s.shape().0);

        let mut h_prev = Tensor2D::zeros(batch, h);
        let mut c_prev = Tensor2D::zeros(batch, h);
        let mut outputs = Vec::with_capacity(steps.len());
        let mut cache = Vec::with_capacity(steps.len());

        for x in steps {
            assert_eq!(
                x.shape().1,
                self.config.input_features,
                "LSTM input has {} features, model expects {}",
                x.shape().1,
                self.config.input_features
            );
            let z = x
                .matmul(&p.kernel)
                .add(&h_prev.matmul(&p.recurrent_kernel))
                .add_row_vector(&p.bias);
            let i = z.column_block(0, h).sigmoid();
            let f = z.column_block(h, h).sigmoid();
            let g = z.column_block(2 * h, h).tanh();
            let o = z.column_block(3 * h, h).sigmoid();

            let c = f.mul(&c_prev).add(&i.mul(&g));
            let tanh_c = c.tanh();
            let h_t = o.mul(&tanh_c);

            outputs.push(h_t.matmul(&p.dense_kernel).add_row_vector(&p.dense_bias));
            cache.push(StepCache {
                x: x.clone(),
                h_prev,
                c_prev,
                i,
                f,
                g,
                o,
                tanh_c,
                h: h_t.clone(),
            });
            h_prev = h_t;
            c_prev = c;
        }
        (outputs, cache)
    }

    fn forward_tensor(&self, input: &Tensor3D<B>) -> Tensor3D<B> {
        let (outputs, _) = self.run(input.steps());
        let shape = Shape3 {
            features: self.config.output_features,
            ..input.shape()
        };
        match Tensor3D::from_timesteps(outputs) {
            Ok(t) => t,
            // zero timesteps: nothing was computed
            Err(_) => Tensor3D::zeros(shape),
        }
    }

    /// Backpropagation through time for an MSE-style upstream gradient.
    fn gradients(&self, input: &Tensor3D<B>, grad_output: &Tensor3D<B>) -> LstmParams<B> {
        let h = self.config.hidden_units;
        let p = &self.params;
        let (_, cache) = self.run(input.steps());
        assert_eq!(
            cache.len(),
            grad_output.shape().timesteps,
            "gradient has {} timesteps, input has {}",
            grad_output.shape().timesteps,
            cache.len()
        );

        let mut grads = self.params.zeros_like();
        let batch = input.shape().batch;
        let mut dh_next = Tensor2D::zeros(batch, h);
        let mut dc_next = Tensor2D::zeros(batch, h);

        for (step, dy) in cache.iter().zip(grad_output.steps()).rev() {
            // dense projection
            grads.dense_kernel = grads.dense_kernel.add(&step.h.t_matmul(dy));
            grads.dense_bias = grads.dense_bias.add(&dy.col_sum());
            let dh = dy.matmul_t(&p.dense_kernel).add(&dh_next);

            // output gate and cell
            let dzo = dh
                .mul(&step.tanh_c)
                .mul(&step.o)
                .mul(&step.o.one_minus());
            let dc = dh
                .mul(&step.o)
                .mul(&step.tanh_c.square().one_minus())
                .add(&dc_next);

            let dzi = dc.mul(&step.g).mul(&step.i).mul(&step.i.one_minus());
            let dzg = dc.mul(&step.i).mul(&step.g.square().one_minus());
            let dzf = dc
                .mul(&step.c_prev)
                .mul(&step.f)
                .mul(&step.f.one_minus());

            let dz = Tensor2D::hcat(&[dzi, dzf, dzg, dzo]);
            grads.kernel = grads.kernel.add(&step.x.t_matmul(&dz));
            grads.recurrent_kernel = grads.recurrent_kernel.add(&step.h_prev.t_matmul(&dz));
            grads.bias = grads.bias.add(&dz.col_sum());

            dh_next = dz.matmul_t(&p.recurrent_kernel);
            dc_next = dc.mul(&step.f);
        }
        grads
    }
}

impl<B: Backend> TrainableModel<B> for LstmModel<B, Unfitted> {
    type Input = Tensor3D<B>;
    type Prediction = Tensor3D<B>;
    type Params = LstmParams<B>;
    type Gradients = LstmParams<B>;
    type Output = LstmModel<B, Fitted>;

    /// `[batch, timesteps, in] → [batch, timesteps, out]`.
    fn forward(&self, input: &Self::Input) -> Self::Prediction {
        self.forward_tensor(input)
    }

    fn backward(&self, input: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients {
        self.gradients(input, grad_output)
    }

    fn params(&self) -> &Self::Params {
        &self.params
    }

    fn update_params(&mut self, new_params: &Self::Params) {
        self.params = new_params.clone();
    }

    fn into_fitted(self) -> Self::Output {
        LstmModel {
            config: self.config,
            params: self.params,
            _state: PhantomData,
        }
    }
}

/// Prediction for a trained model.
///
/// - Single sequence: `[timesteps, in]` → `[timesteps, out]`
/// - Batch: `[batch, timesteps, in]` → `[batch, timesteps, out]`
impl<B: Backend> InferenceModel<B> for LstmModel<B, Fitted> {
    type InputSingle = Tensor2D<B>;
    type OutputSingle = Tensor2D<B>;
    type InputBatch = Tensor3D<B>;
    type OutputBatch = Tensor3D<B>;

    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle {
        let (timesteps, features) = input.shape();
        let rows = input.to_vec();
        let steps: Vec<Tensor2D<B>> = (0..timesteps)
            .map(|t| {
                let row = rows[t * features..(t + 1) * features].to_vec();
                Tensor2D::from_f64(row, 1, features)
            })
            .collect();
        let (outputs, _) = self.run(&steps);
        let out_features = self.config.output_features;
        let flat: Vec<f64> = outputs.iter().flat_map(Tensor2D::to_vec).collect();
        Tensor2D::from_f64(flat, timesteps, out_features)
    }

    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch {
        self.forward_tensor(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    type Model = LstmModel<CpuBackend, Unfitted>;

    fn small_config() -> LstmConfig {
        LstmConfig::new(3, 2, 2).with_hidden_units(3)
    }

    fn small_input() -> (Tensor3D<CpuBackend>, Tensor3D<CpuBackend>) {
        let x = [
            0.5, -0.1, 0.3, 0.8, -0.7, 0.2, //
            -0.4, 0.9, 0.1, -0.3, 0.6, 0.6,
        ];
        let y = [
            1.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
            0.0, 1.0, 0.5, 0.5, 0.0, 1.0,
        ];
        (
            Tensor3D::from_flat(&x, Shape3::new(2, 3, 2)).unwrap(),
            Tensor3D::from_flat(&y, Shape3::new(2, 3, 2)).unwrap(),
        )
    }

    fn mse(model: &Model, x: &Tensor3D<CpuBackend>, y: &Tensor3D<CpuBackend>) -> f64 {
        let diff = model.forward(x).sub(y);
        diff.mul(&diff).mean().to_f64()
    }

    fn mse_grad(
        model: &Model,
        x: &Tensor3D<CpuBackend>,
        y: &Tensor3D<CpuBackend>,
    ) -> Tensor3D<CpuBackend> {
        let pred = model.forward(x);
        pred.sub(y).scale(&Scalar::new(2.0 / pred.len() as f64))
    }

    /// Rebuilds parameters of `config` from a flat vector in `to_flat` order.
    fn params_from_flat(config: &LstmConfig, flat: &[f64]) -> LstmParams<CpuBackend> {
        let (i, h, o) = (config.input_features, config.hidden_units, config.output_features);
        let mut rest = flat;
        let mut take = |n: usize| {
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head.to_vec()
        };
        LstmParams {
            kernel: Tensor2D::from_f64(take(i * 4 * h), i, 4 * h),
            recurrent_kernel: Tensor2D::from_f64(take(h * 4 * h), h, 4 * h),
            bias: Tensor1D::from_f64(take(4 * h)),
            dense_kernel: Tensor2D::from_f64(take(h * o), h, o),
            dense_bias: Tensor1D::from_f64(take(o)),
        }
    }

    #[test]
    fn test_param_counts_match_keras() {
        let config = LstmConfig::new(5, 5, 5);
        assert_eq!(config.hidden_units, 32);
        assert_eq!(config.lstm_param_count(), 4864);
        assert_eq!(config.dense_param_count(), 165);

        let model = Model::with_seed(config, 0).unwrap();
        assert_eq!(model.params().num_params(), 4864 + 165);
        assert_eq!(model.params().to_flat().len(), 5029);
    }

    #[test]
    fn test_initialisation() {
        let config = LstmConfig::new(4, 3, 2).with_hidden_units(4);
        let model = Model::with_seed(config, 11).unwrap();
        let p = model.params();

        // biases: zero except the forget gate
        assert_eq!(
            p.bias.to_vec(),
            [vec![0.0; 4], vec![1.0; 4], vec![0.0; 8]].concat()
        );
        assert_eq!(p.dense_bias.to_vec(), vec![0.0; 2]);

        // Glorot limits
        let limit = (6.0f64 / (3 + 16) as f64).sqrt();
        assert!(p.kernel.to_vec().iter().all(|w| w.abs() <= limit));
        let limit = (6.0f64 / (4 + 2) as f64).sqrt();
        assert!(p.dense_kernel.to_vec().iter().all(|w| w.abs() <= limit));

        // U·Uᵀ = I for the [h, 4h] recurrent kernel
        let u = &p.recurrent_kernel;
        let gram = u.matmul_t(u).to_vec();
        for r in 0..4 {
            for c in 0..4 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((gram[r * 4 + c] - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_orthogonal_tall_matrix_has_orthonormal_columns() {
        let mut rng = StdRng::seed_from_u64(3);
        let q = Tensor2D::<CpuBackend>::from_f64(orthogonal(6, 3, &mut rng), 6, 3);
        let gram = q.t_matmul(&q).to_vec();
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((gram[r * 3 + c] - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_orthogonal_wide_matrix_has_orthonormal_rows() {
        let draw = |seed| orthogonal(3, 12, &mut StdRng::seed_from_u64(seed));
        let q = Tensor2D::<CpuBackend>::from_f64(draw(11), 3, 12);
        let gram = q.matmul_t(&q).to_vec();
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((gram[r * 3 + c] - expected).abs() < 1e-10);
            }
        }
        assert_eq!(draw(11), draw(11));
        assert_ne!(draw(11), draw(12));
    }

    #[test]
    fn test_forward_output_shape() {
        let model = Model::with_seed(LstmConfig::new(5, 4, 3).with_hidden_units(6), 1).unwrap();
        let x = Tensor3D::<CpuBackend>::zeros(Shape3::new(7, 5, 4));
        assert_eq!(model.forward(&x).shape(), Shape3::new(7, 5, 3));
    }

    #[test]
    fn test_zero_input_matches_hand_computation() {
        // With zero input and zero kernels only the biases act:
        // i = f = o = σ(0) = 0.5, g = tanh(0) = 0, so c = 0, h = 0 and y = d.
        let config = LstmConfig::new(2, 1, 2).with_hidden_units(1);
        let mut params = LstmParams::<CpuBackend>::zeros(&config);
        params.dense_bias = Tensor1D::from_f64(vec![0.25, -0.5]);
        let model = Model::from_params(config, params).unwrap();

        let y = model.forward(&Tensor3D::zeros(Shape3::new(1, 2, 1)));
        assert_eq!(y.to_flat(), vec![0.25, -0.5, 0.25, -0.5]);
    }

    #[test]
    fn test_first_step_hand_computation() {
        // h = 1, input 1, one timestep: z = x·W with W = [1, 2, 3, 4]
        let config = LstmConfig::new(1, 1, 1).with_hidden_units(1);
        let mut params = LstmParams::<CpuBackend>::zeros(&config);
        params.kernel = Tensor2D::from_f64(vec![1.0, 2.0, 3.0, 4.0], 1, 4);
        params.dense_kernel = Tensor2D::from_f64(vec![1.0], 1, 1);
        let model = Model::from_params(config, params).unwrap();

        let sig = |z: f64| 1.0 / (1.0 + (-z).exp());
        let c = sig(1.0) * 3.0f64.tanh();
        let expected = sig(4.0) * c.tanh();

        let x = Tensor3D::from_flat(&[1.0], Shape3::new(1, 1, 1)).unwrap();
        let y = model.forward(&x).to_flat();
        assert!((y[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_sequences_in_a_batch_are_independent() {
        let model = Model::with_seed(small_config(), 5).unwrap();
        let (x, _) = small_input();
        let full = model.forward(&x);
        let second = model.forward(&x.select_sequences(&[1]));
        let expected: Vec<f64> = full.select_sequences(&[1]).to_flat();
        for (a, b) in second.to_flat().iter().zip(&expected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_backward_matches_finite_differences() {
        let config = small_config();
        let model = Model::with_seed(config, 21).unwrap();
        let (x, y) = small_input();

        let analytic = model.backward(&x, &mse_grad(&model, &x, &y)).to_flat();
        let base = model.params().to_flat();
        let eps = 1e-6;

        for (k, &g) in analytic.iter().enumerate() {
            let mut plus = base.clone();
            plus[k] += eps;
            let mut minus = base.clone();
            minus[k] -= eps;
            let mp = Model::from_params(config, params_from_flat(&config, &plus)).unwrap();
            let mm = Model::from_params(config, params_from_flat(&config, &minus)).unwrap();
            let numeric = (mse(&mp, &x, &y) - mse(&mm, &x, &y)) / (2.0 * eps);

            let tol = 1e-6 + 1e-4 * numeric.abs().max(g.abs());
            assert!(
                (numeric - g).abs() < tol,
                "parameter {k}: analytic {g}, numeric {numeric}"
            );
        }
    }

    #[test]
    fn test_param_ops() {
        let config = small_config();
        let p = Model::with_seed(config, 2).unwrap().params().clone();
        let twice = p.add(&p);
        let scaled = p.scale(Scalar::new(2.0));
        assert_eq!(twice.to_flat(), scaled.to_flat());
        assert!(p.sub(&p).to_flat().iter().all(|v| *v == 0.0));
        assert!(p.zeros_like().to_flat().iter().all(|v| *v == 0.0));

        let sq = p.mul(&p);
        let back = sq.sqrt();
        for (a, b) in back.to_flat().iter().zip(p.to_flat()) {
            assert!((a - b.abs()).abs() < 1e-12);
        }
        let ones = p.zeros_like().add_scalar(Scalar::new(1.0));
        assert_eq!(p.div(&ones).to_flat(), p.to_flat());
    }

    #[test]
    fn test_from_params_rejects_wrong_shapes() {
        let config = small_config();
        let other = LstmParams::<CpuBackend>::zeros(&config.with_hidden_units(4));
        assert!(Model::from_params(config, other).is_err());
        assert!(Model::with_seed(config.with_hidden_units(0), 0).is_err());
    }

    #[test]
    #[should_panic(expected = "model expects 2")]
    fn test_forward_rejects_wrong_feature_width() {
        let model = Model::with_seed(small_config(), 0).unwrap();
        let _ = model.forward(&Tensor3D::zeros(Shape3::new(1, 3, 5)));
    }

    #[test]
    fn test_fitted_predict_single_matches_batch() {
        let fitted = Model::with_seed(small_config(), 8).unwrap().into_fitted();
        let (x, _) = small_input();
        let batch = fitted.predict_batch(&x);

        let seq0: Vec<f64> = (0..3).flat_map(|t| x.feature_vector(0, t).unwrap()).collect();
        let single = fitted.predict(&Tensor2D::from_f64(seq0, 3, 2));
        assert_eq!(single.shape(), (3, 2));
        let expected: Vec<f64> = batch.select_sequences(&[0]).to_flat();
        for (a, b) in single.to_vec().iter().zip(&expected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_summary_table() {
        let model = Model::with_seed(LstmConfig::new(5, 5, 5), 0).unwrap();
        let summary = model.summary();
        assert_eq!(summary.total_params(), 5029);
        let text = summary.to_string();
        assert!(text.contains("(None, 5, 32)"));
        assert!(text.contains("4,864"));
        assert!(text.contains("Total params: 5,029"));
    }
}
