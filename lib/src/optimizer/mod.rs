use crate::backend::{Backend, Scalar};
use crate::model::ParamOps;

/// Trait for gradient-based optimizers.
///
/// Optimizers turn a parameter set and its gradients into the next parameter
/// set. Training logic lives in the `Trainer`; any model whose parameters
/// implement [`ParamOps`] can be paired with any optimizer without dynamic
/// dispatch.
///
/// Stateful optimizers (such as [`Adam`]) keep their moment estimates inside
/// `self`. The trainer clones the optimizer at the start of every `fit`, so
/// that state never leaks between training runs.
///
/// # Example
/// ```
/// use seqlabel::backend::CpuBackend;
/// use seqlabel::model::{LstmConfig, LstmParams, ParamOps};
/// use seqlabel::optimizer::{Optimizer, SGD};
///
/// let config = LstmConfig::new(2, 3, 3).with_hidden_units(4);
/// let params = LstmParams::<CpuBackend>::zeros(&config);
/// let grads = params.zeros_like();
/// let mut sgd = SGD::<CpuBackend>::new(0.01);
/// let updated = sgd.step(&params, &grads);
/// assert_eq!(updated.to_flat(), params.to_flat());
/// ```
pub trait Optimizer<B: Backend, P>: Clone {
    /// Applies one update and returns the new parameters. Inputs are not
    /// mutated.
    fn step(&mut self, params: &P, gradients: &P) -> P;
}

/// Stochastic Gradient Descent.
///
/// ```text
/// θ ← θ - η · ∇L(θ)
/// ```
#[derive(Clone, Debug)]
pub struct SGD<B: Backend> {
    lr: Scalar<B>,
}

impl<B: Backend> SGD<B> {
    pub fn new(lr: f64) -> Self {
        Self { lr: Scalar::new(lr) }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr.to_f64()
    }
}

impl<B: Backend, P: ParamOps<B>> Optimizer<B, P> for SGD<B> {
    fn step(&mut self, params: &P, gradients: &P) -> P {
        // (-lr) lets a single scale + add do the update
        let neg_lr = Scalar::<B>::new(0.0) - self.lr;
        params.add(&gradients.scale(neg_lr))
    }
}

pub const DEFAULT_LEARNING_RATE: f64 = 0.001;
pub const DEFAULT_BETA1: f64 = 0.9;
pub const DEFAULT_BETA2: f64 = 0.999;
pub const DEFAULT_EPSILON: f64 = 1e-7;

/// Adam with bias correction folded into the step size:
///
/// ```text
/// m ← β₁·m + (1-β₁)·g
/// v ← β₂·v + (1-β₂)·g²
/// α_t = η · √(1-β₂ᵗ) / (1-β₁ᵗ)
/// θ ← θ - α_t · m / (√v + ε)
/// ```
///
/// Moments are allocated lazily on the first step, shaped like the
/// gradients.
#[derive(Clone, Debug)]
pub struct Adam<B: Backend, P> {
    lr: Scalar<B>,
    beta1: Scalar<B>,
    beta2: Scalar<B>,
    epsilon: Scalar<B>,
    m: Option<P>,
    v: Option<P>,
    t: i32,
}

impl<B: Backend, P> Adam<B, P> {
    /// Adam with the usual defaults for β₁, β₂ and ε.
    pub fn new(lr: f64) -> Self {
        Self::with_hyperparams(lr, DEFAULT_BETA1, DEFAULT_BETA2, DEFAULT_EPSILON)
    }

    pub fn with_hyperparams(lr: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            lr: Scalar::new(lr),
            beta1: Scalar::new(beta1),
            beta2: Scalar::new(beta2),
            epsilon: Scalar::new(epsilon),
            m: None,
            v: None,
            t: 0,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr.to_f64()
    }

    /// Number of steps taken so far.
    pub fn iterations(&self) -> i32 {
        self.t
    }
}

impl<B: Backend, P> Default for Adam<B, P> {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNING_RATE)
    }
}

impl<B: Backend, P: ParamOps<B>> Optimizer<B, P> for Adam<B, P> {
    fn step(&mut self, params: &P, gradients: &P) -> P {
        let one = Scalar::<B>::new(1.0);
        self.t += 1;

        let m_prev = self.m.take().unwrap_or_else(|| gradients.zeros_like());
        let v_prev = self.v.take().unwrap_or_else(|| gradients.zeros_like());

        let m = m_prev
            .scale(self.beta1)
            .add(&gradients.scale(one - self.beta1));
        let v = v_prev
            .scale(self.beta2)
            .add(&gradients.mul(gradients).scale(one - self.beta2));

        let correction1 = one - self.beta1.powi(self.t);
        let correction2 = one - self.beta2.powi(self.t);
        let step_size = self.lr * Scalar::new(correction2.to_f64().sqrt()) / correction1;

        let update = m.div(&v.sqrt().add_scalar(self.epsilon));
        let neg_step = Scalar::<B>::new(0.0) - step_size;
        let next = params.add(&update.scale(neg_step));

        self.m = Some(m);
        self.v = Some(v);
        next
    }
}
