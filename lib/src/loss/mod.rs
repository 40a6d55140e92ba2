//! Differentiable loss functions.

use crate::backend::{Backend, Scalar, Tensor3D};

/// A loss function that can report both its value and its gradient with
/// respect to the prediction.
pub trait Loss<B: Backend> {
    type Prediction;
    type Target;

    /// Scalar loss for a batch.
    fn loss(&self, prediction: &Self::Prediction, target: &Self::Target) -> Scalar<B>;

    /// `∂loss / ∂prediction`, shaped like the prediction.
    fn grad_wrt_prediction(
        &self,
        prediction: &Self::Prediction,
        target: &Self::Target,
    ) -> Self::Prediction;
}

/// Mean squared error over every element of a `[batch, timesteps, features]`
/// tensor:
///
/// ```text
/// L = 1/N · Σ (p - t)²          ∂L/∂p = 2/N · (p - t)
/// ```
///
/// # Example
/// ```
/// use seqlabel::backend::{CpuBackend, Shape3, Tensor3D};
/// use seqlabel::loss::{Loss, MSELoss};
///
/// let shape = Shape3::new(1, 1, 2);
/// let p = Tensor3D::<CpuBackend>::from_flat(&[1.0, 0.0], shape).unwrap();
/// let t = Tensor3D::<CpuBackend>::from_flat(&[0.0, 0.0], shape).unwrap();
/// assert_eq!(MSELoss.loss(&p, &t).to_f64(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss;

impl<B: Backend> Loss<B> for MSELoss {
    type Prediction = Tensor3D<B>;
    type Target = Tensor3D<B>;

    fn loss(&self, prediction: &Tensor3D<B>, target: &Tensor3D<B>) -> Scalar<B> {
        let diff = prediction.sub(target);
        diff.mul(&diff).mean()
    }

    fn grad_wrt_prediction(&self, prediction: &Tensor3D<B>, target: &Tensor3D<B>) -> Tensor3D<B> {
        let n = prediction.len().max(1) as f64;
        prediction.sub(target).scale(&Scalar::new(2.0 / n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CpuBackend, Shape3};

    fn t3(data: &[f64], shape: Shape3) -> Tensor3D<CpuBackend> {
        Tensor3D::from_flat(data, shape).unwrap()
    }

    #[test]
    fn test_mse_zero_for_identical() {
        let shape = Shape3::new(2, 2, 2);
        let p = t3(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8], shape);
        let loss = MSELoss.loss(&p, &p.clone());
        assert_eq!(loss.to_f64(), 0.0);
    }

    #[test]
    fn test_mse_value() {
        let shape = Shape3::new(2, 1, 2);
        let p = t3(&[1.0, 2.0, 3.0, 4.0], shape);
        let t = t3(&[0.0, 2.0, 1.0, 0.0], shape);
        // (1 + 0 + 4 + 16) / 4
        assert!((MSELoss.loss(&p, &t).to_f64() - 5.25).abs() < 1e-12);
    }

    #[test]
    fn test_mse_gradient() {
        let shape = Shape3::new(1, 2, 2);
        let p = t3(&[1.0, 2.0, 3.0, 4.0], shape);
        let t = t3(&[0.0, 2.0, 1.0, 0.0], shape);
        let g = MSELoss.grad_wrt_prediction(&p, &t);
        assert_eq!(g.shape(), shape);
        // 2/4 · (p - t)
        assert_eq!(g.to_flat(), vec![0.5, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_mse_gradient_matches_finite_difference() {
        let shape = Shape3::new(1, 1, 3);
        let base = [0.3, -0.2, 0.9];
        let t = t3(&[0.0, 1.0, 0.0], shape);
        let g = MSELoss.grad_wrt_prediction(&t3(&base, shape), &t).to_flat();
        let eps = 1e-6;
        for i in 0..3 {
            let mut plus = base;
            let mut minus = base;
            plus[i] += eps;
            minus[i] -= eps;
            let numeric = (MSELoss.loss(&t3(&plus, shape), &t).to_f64()
                - MSELoss.loss(&t3(&minus, shape), &t).to_f64())
                / (2.0 * eps);
            assert!((numeric - g[i]).abs() < 1e-6, "element {i}");
        }
    }
}
