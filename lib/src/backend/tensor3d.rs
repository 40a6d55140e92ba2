//! Three-dimensional `[batch, timestep, feature]` tensors.
//!
//! [`Tensor3D::from_flat`] is the reshaper: it reinterprets a flat, row-major
//! sequence of numbers as a 3-D tensor, and [`Tensor3D::to_flat`] is its exact
//! inverse. Internally the tensor is stored time-major, one `[batch, features]`
//! matrix per timestep, which is what the recurrent layer consumes step by step.

use super::scalar::Scalar;
use super::tensor2d::Tensor2D;
use crate::backend::Backend;
use crate::error::{Result, SeqLabelError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a 3-D tensor: `(batch, timesteps, features)`.
///
/// Serialized as a plain `[batch, timesteps, features]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 3]", into = "[usize; 3]")]
pub struct Shape3 {
    pub batch: usize,
    pub timesteps: usize,
    pub features: usize,
}

impl Shape3 {
    pub const fn new(batch: usize, timesteps: usize, features: usize) -> Self {
        Self {
            batch,
            timesteps,
            features,
        }
    }

    /// Number of elements, `batch * timesteps * features`.
    pub const fn num_elements(&self) -> usize {
        self.batch * self.timesteps * self.features
    }

    /// Builds a shape from a dimension list read from a dataset file.
    ///
    /// Fails unless exactly three dimensions are given.
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        match dims {
            [b, t, f] => Ok(Self::new(*b, *t, *f)),
            _ => Err(SeqLabelError::InvalidShape(format!(
                "expected 3 dimensions, got {}",
                dims.len()
            ))),
        }
    }

    pub const fn to_array(&self) -> [usize; 3] {
        [self.batch, self.timesteps, self.features]
    }
}

impl From<[usize; 3]> for Shape3 {
    fn from(d: [usize; 3]) -> Self {
        Self::new(d[0], d[1], d[2])
    }
}

impl From<Shape3> for [usize; 3] {
    fn from(s: Shape3) -> Self {
        s.to_array()
    }
}

impl fmt::Display for Shape3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.batch, self.timesteps, self.features)
    }
}

/// Backend-typed `[batch, timestep, feature]` tensor.
///
/// # Example
/// ```
/// use seqlabel::backend::{CpuBackend, Shape3, Tensor3D};
///
/// let flat: Vec<f64> = (0..12).map(f64::from).collect();
/// let x = Tensor3D::<CpuBackend>::from_flat(&flat, Shape3::new(2, 3, 2)).unwrap();
/// assert_eq!(x.get(1, 0, 1), Some(7.0));
/// assert_eq!(x.to_flat(), flat);
/// ```
#[derive(Clone)]
pub struct Tensor3D<B: Backend> {
    steps: Vec<Tensor2D<B>>,
    shape: Shape3,
}

impl<B: Backend> Tensor3D<B> {
    /// Reshapes a flat row-major sequence into a 3-D tensor.
    ///
    /// # Errors
    /// [`SeqLabelError::ShapeMismatch`] if `data.len()` is not
    /// `batch * timesteps * features`.
    pub fn from_flat(data: &[f64], shape: Shape3) -> Result<Self> {
        let expected = shape.num_elements();
        if data.len() != expected {
            return Err(SeqLabelError::ShapeMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        let Shape3 {
            batch,
            timesteps,
            features,
        } = shape;
        let steps = (0..timesteps)
            .map(|t| {
                let mut rows = Vec::with_capacity(batch * features);
                for b in 0..batch {
                    let start = (b * timesteps + t) * features;
                    rows.extend_from_slice(&data[start..start + features]);
                }
                Tensor2D::from_f64(rows, batch, features)
            })
            .collect();
        Ok(Self { steps, shape })
    }

    /// Zero tensor of the given shape.
    pub fn zeros(shape: Shape3) -> Self {
        Self {
            steps: (0..shape.timesteps)
                .map(|_| Tensor2D::zeros(shape.batch, shape.features))
                .collect(),
            shape,
        }
    }

    /// Assembles a tensor from per-timestep `[batch, features]` matrices.
    ///
    /// # Errors
    /// [`SeqLabelError::InvalidShape`] if `steps` is empty or the matrices
    /// disagree in shape.
    pub fn from_timesteps(steps: Vec<Tensor2D<B>>) -> Result<Self> {
        let (batch, features) = steps
            .first()
            .map(Tensor2D::shape)
            .ok_or_else(|| SeqLabelError::InvalidShape("no timesteps given".into()))?;
        if let Some((t, s)) = steps
            .iter()
            .enumerate()
            .find(|(_, s)| s.shape() != (batch, features))
        {
            return Err(SeqLabelError::InvalidShape(format!(
                "timestep {t} has shape {:?}, expected {:?}",
                s.shape(),
                (batch, features)
            )));
        }
        let shape = Shape3::new(batch, steps.len(), features);
        Ok(Self { steps, shape })
    }

    pub fn shape(&self) -> Shape3 {
        self.shape
    }

    /// The `[batch, features]` matrix at timestep `t`.
    ///
    /// # Panics
    /// If `t >= timesteps`.
    pub fn step(&self, t: usize) -> &Tensor2D<B> {
        &self.steps[t]
    }

    /// All timesteps in order.
    pub fn steps(&self) -> &[Tensor2D<B>] {
        &self.steps
    }

    /// Row-major `[batch, timestep, feature]` host copy; inverse of
    /// [`Tensor3D::from_flat`].
    pub fn to_flat(&self) -> Vec<f64> {
        let Shape3 {
            batch,
            timesteps,
            features,
        } = self.shape;
        let mut out = vec![0.0; self.shape.num_elements()];
        for (t, step) in self.steps.iter().enumerate() {
            let rows = step.to_vec();
            for (b, row) in rows.chunks(features.max(1)).enumerate().take(batch) {
                let start = (b * timesteps + t) * features;
                out[start..start + features].copy_from_slice(&row[..features]);
            }
        }
        out
    }

    /// Element at `(sequence, timestep, feature)`, `None` when out of range.
    pub fn get(&self, sequence: usize, timestep: usize, feature: usize) -> Option<f64> {
        self.feature_vector(sequence, timestep)?.get(feature).copied()
    }

    /// Feature vector of one sequence at one timestep.
    pub fn feature_vector(&self, sequence: usize, timestep: usize) -> Option<Vec<f64>> {
        let Shape3 {
            batch, features, ..
        } = self.shape;
        if sequence >= batch {
            return None;
        }
        let step = self.steps.get(timestep)?.to_vec();
        Some(step[sequence * features..(sequence + 1) * features].to_vec())
    }

    /// Keeps the listed sequences (in order), used to cut mini-batches.
    ///
    /// # Panics
    /// If an index is out of range.
    pub fn select_sequences(&self, indices: &[usize]) -> Self {
        let Shape3 {
            batch,
            timesteps,
            features,
        } = self.shape;
        assert!(
            indices.iter().all(|&i| i < batch),
            "select_sequences: index out of range for batch {batch}"
        );
        let steps = self
            .steps
            .iter()
            .map(|s| {
                let data = s.to_vec();
                let rows: Vec<f64> = indices
                    .iter()
                    .flat_map(|&i| data[i * features..(i + 1) * features].iter().copied())
                    .collect();
                Tensor2D::from_f64(rows, indices.len(), features)
            })
            .collect();
        Self {
            steps,
            shape: Shape3::new(indices.len(), timesteps, features),
        }
    }

    fn zip_steps(
        &self,
        other: &Self,
        f: impl Fn(&Tensor2D<B>, &Tensor2D<B>) -> Tensor2D<B>,
    ) -> Self {
        assert_eq!(
            self.shape, other.shape,
            "Tensor3D shape mismatch: {} vs {}",
            self.shape, other.shape
        );
        Self {
            steps: self
                .steps
                .iter()
                .zip(&other.steps)
                .map(|(a, b)| f(a, b))
                .collect(),
            shape: self.shape,
        }
    }

    /// Element-wise `self - other`.
    ///
    /// # Panics
    /// If shapes differ.
    pub fn sub(&self, other: &Self) -> Self {
        self.zip_steps(other, Tensor2D::sub)
    }

    /// Element-wise product.
    ///
    /// # Panics
    /// If shapes differ.
    pub fn mul(&self, other: &Self) -> Self {
        self.zip_steps(other, Tensor2D::mul)
    }

    pub fn scale(&self, s: &Scalar<B>) -> Self {
        Self {
            steps: self.steps.iter().map(|m| m.scale(s)).collect(),
            shape: self.shape,
        }
    }

    /// Sum of all elements.
    pub fn sum(&self) -> Scalar<B> {
        self.steps
            .iter()
            .map(Tensor2D::sum)
            .fold(Scalar::new(0.0), |acc, s| acc + s)
    }

    /// Mean of all elements.
    pub fn mean(&self) -> Scalar<B> {
        self.sum() / Scalar::new(self.shape.num_elements() as f64)
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.shape.num_elements()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<B: Backend> fmt::Debug for Tensor3D<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor3D")
            .field("shape", &self.shape)
            .field("data", &self.to_flat())
            .finish()
    }
}

fn format_element(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.0}.")
    } else if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        let s = if v > 0.0 { "inf" } else { "-inf" };
        s.to_string()
    } else {
        let s = format!("{v:.8}");
        s.trim_end_matches('0').to_string()
    }
}

/// NumPy-style nested rendering, e.g. `[[[0. 1.]\n  [1. 0.]]]`.
impl<B: Backend> fmt::Display for Tensor3D<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Shape3 {
            batch,
            timesteps,
            features,
        } = self.shape;
        let cells: Vec<String> = self.to_flat().into_iter().map(format_element).collect();
        let width = cells.iter().map(String::len).max().unwrap_or(0);

        f.write_str("[")?;
        for b in 0..batch {
            if b > 0 {
                f.write_str("\n\n ")?;
            }
            f.write_str("[")?;
            for t in 0..timesteps {
                if t > 0 {
                    f.write_str("\n  ")?;
                }
                f.write_str("[")?;
                let start = (b * timesteps + t) * features;
                for (i, cell) in cells[start..start + features].iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{cell:>width$}")?;
                }
                f.write_str("]")?;
            }
            f.write_str("]")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    type T3 = Tensor3D<CpuBackend>;

    fn iota(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_shape3_display_and_dims() {
        let s = Shape3::new(5, 5, 35);
        assert_eq!(s.to_string(), "(5, 5, 35)");
        assert_eq!(s.num_elements(), 875);
        assert_eq!(Shape3::from([1, 2, 3]), Shape3::new(1, 2, 3));
        assert_eq!(Shape3::from_dims(&[4, 2, 1]).unwrap().to_array(), [4, 2, 1]);
        assert!(matches!(
            Shape3::from_dims(&[4, 2]),
            Err(SeqLabelError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_shape3_serializes_as_array() {
        let s = Shape3::new(5, 4, 3);
        assert_eq!(serde_json::to_string(&s).unwrap(), "[5,4,3]");
        let back: Shape3 = serde_json::from_str("[5,4,3]").unwrap();
        assert_eq!(back, s);
        assert!(serde_json::from_str::<Shape3>("[5,4]").is_err());
    }

    #[test]
    fn test_from_flat_preserves_row_major_order() {
        let shape = Shape3::new(2, 3, 4);
        let data = iota(24);
        let x = T3::from_flat(&data, shape).unwrap();

        for b in 0..2 {
            for t in 0..3 {
                for f in 0..4 {
                    let expected = (b * 12 + t * 4 + f) as f64;
                    assert_eq!(x.get(b, t, f), Some(expected));
                }
            }
        }
        assert_eq!(x.to_flat(), data);
        // timestep 1 holds rows for both sequences
        assert_eq!(x.step(1).to_vec(), vec![4.0, 5.0, 6.0, 7.0, 16.0, 17.0, 18.0, 19.0]);
    }

    #[test]
    fn test_from_flat_rejects_wrong_length() {
        let err = T3::from_flat(&iota(23), Shape3::new(2, 3, 4)).unwrap_err();
        match err {
            SeqLabelError::ShapeMismatch {
                shape,
                expected,
                got,
            } => {
                assert_eq!(shape, Shape3::new(2, 3, 4));
                assert_eq!(expected, 24);
                assert_eq!(got, 23);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_sized_dimensions() {
        let x = T3::from_flat(&[], Shape3::new(0, 3, 2)).unwrap();
        assert!(x.is_empty());
        assert_eq!(x.to_flat(), Vec::<f64>::new());
        assert_eq!(x.to_string(), "[]");
    }

    #[test]
    fn test_get_out_of_range() {
        let x = T3::from_flat(&iota(6), Shape3::new(1, 2, 3)).unwrap();
        assert_eq!(x.get(1, 0, 0), None);
        assert_eq!(x.get(0, 2, 0), None);
        assert_eq!(x.get(0, 0, 3), None);
        assert_eq!(x.feature_vector(0, 1), Some(vec![3.0, 4.0, 5.0]));
    }

    #[test]
    fn test_from_timesteps_and_select_sequences() {
        let x = T3::from_flat(&iota(12), Shape3::new(3, 2, 2)).unwrap();
        let rebuilt = T3::from_timesteps(x.steps().to_vec()).unwrap();
        assert_eq!(rebuilt.shape(), x.shape());
        assert_eq!(rebuilt.to_flat(), x.to_flat());

        let picked = x.select_sequences(&[2, 0]);
        assert_eq!(picked.shape(), Shape3::new(2, 2, 2));
        assert_eq!(picked.to_flat(), vec![8.0, 9.0, 10.0, 11.0, 0.0, 1.0, 2.0, 3.0]);

        assert!(T3::from_timesteps(Vec::new()).is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = T3::from_flat(&[1.0, 2.0, 3.0, 4.0], Shape3::new(1, 2, 2)).unwrap();
        let b = T3::from_flat(&[0.5, 0.5, 1.0, 1.0], Shape3::new(1, 2, 2)).unwrap();
        assert_eq!(a.sub(&b).to_flat(), vec![0.5, 1.5, 2.0, 3.0]);
        assert_eq!(a.mul(&b).to_flat(), vec![0.5, 1.0, 3.0, 4.0]);
        assert_eq!(a.scale(&Scalar::new(2.0)).to_flat(), vec![2.0, 4.0, 6.0, 8.0]);
        assert_eq!(a.sum().to_f64(), 10.0);
        assert_eq!(a.mean().to_f64(), 2.5);
    }

    #[test]
    fn test_display_numpy_style() {
        let x = T3::from_flat(
            &[0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0],
            Shape3::new(2, 2, 2),
        )
        .unwrap();
        assert_eq!(x.to_string(), "[[[0. 1.]\n  [1. 0.]]\n\n [[1. 1.]\n  [0. 0.]]]");
    }

    #[test]
    fn test_display_pads_fractional_values() {
        let x = T3::from_flat(&[0.5, 1.0], Shape3::new(1, 1, 2)).unwrap();
        assert_eq!(x.to_string(), "[[[0.5  1.]]]");
    }
}
