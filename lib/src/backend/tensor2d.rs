use super::scalar::Scalar;
use super::tensor1d::Tensor1D;
use crate::backend::Backend;
use std::fmt;
use std::marker::PhantomData;

/// Backend-typed row-major matrix.
///
/// Weight matrices, per-timestep activations (`[batch, features]`) and their
/// gradients are all `Tensor2D`. Operations delegate directly to the backend.
///
/// # Example
/// ```
/// use seqlabel::backend::{CpuBackend, Tensor1D, Tensor2D};
///
/// let x: Tensor2D<CpuBackend> = Tensor2D::from_f64(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
/// let b: Tensor1D<CpuBackend> = Tensor1D::from_f64(vec![10.0, 20.0]);
/// assert_eq!(x.add_row_vector(&b).to_vec(), vec![11.0, 22.0, 13.0, 24.0]);
/// ```
#[derive(Clone)]
pub struct Tensor2D<B: Backend> {
    pub(crate) data: B::Tensor2D,
    pub(crate) backend: PhantomData<B>,
}

impl<B: Backend> Tensor2D<B> {
    pub(crate) fn from_raw(data: B::Tensor2D) -> Self {
        Self {
            data,
            backend: PhantomData,
        }
    }

    /// Creates a matrix from row-major `f64` data without precision loss.
    ///
    /// # Panics
    /// If `data.len() != rows * cols`.
    pub fn from_f64(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        Self::from_raw(B::from_f64_2d(data, rows, cols))
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_raw(B::zeros_2d(rows, cols))
    }

    pub fn add(&self, other: &Self) -> Self {
        Self::from_raw(B::add_2d(&self.data, &other.data))
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::from_raw(B::sub_2d(&self.data, &other.data))
    }

    /// Hadamard product.
    pub fn mul(&self, other: &Self) -> Self {
        Self::from_raw(B::mul_2d(&self.data, &other.data))
    }

    pub fn div(&self, other: &Self) -> Self {
        Self::from_raw(B::div_2d(&self.data, &other.data))
    }

    pub fn scale(&self, s: &Scalar<B>) -> Self {
        Self::from_raw(B::mul_scalar_2d(&self.data, &s.data))
    }

    pub fn add_scalar(&self, s: &Scalar<B>) -> Self {
        Self::from_raw(B::add_scalar_2d(&self.data, &s.data))
    }

    pub fn sqrt(&self) -> Self {
        Self::from_raw(B::sqrt_2d(&self.data))
    }

    /// `1 - self`, element-wise.
    pub fn one_minus(&self) -> Self {
        self.scale(&Scalar::new(-1.0)).add_scalar(&Scalar::new(1.0))
    }

    /// `self ⊙ self`.
    pub fn square(&self) -> Self {
        self.mul(self)
    }

    pub fn sigmoid(&self) -> Self {
        Self::from_raw(B::sigmoid_2d(&self.data))
    }

    pub fn tanh(&self) -> Self {
        Self::from_raw(B::tanh_2d(&self.data))
    }

    /// Sum of all elements.
    pub fn sum(&self) -> Scalar<B> {
        Scalar::from_raw(B::sum_all_2d(&self.data))
    }

    /// Mean of all elements.
    pub fn mean(&self) -> Scalar<B> {
        Scalar::from_raw(B::mean_all_2d(&self.data))
    }

    /// Column sums (reduction over rows), length `cols`.
    pub fn col_sum(&self) -> Tensor1D<B> {
        Tensor1D::from_raw(B::col_sum_2d(&self.data))
    }

    /// `self · other`.
    ///
    /// # Panics
    /// If inner dimensions differ.
    pub fn matmul(&self, other: &Self) -> Self {
        Self::from_raw(B::matmul(&self.data, &other.data))
    }

    /// `selfᵀ · other`.
    pub fn t_matmul(&self, other: &Self) -> Self {
        Self::from_raw(B::matmul_transposed_lhs(&self.data, &other.data))
    }

    /// `self · otherᵀ`.
    pub fn matmul_t(&self, other: &Self) -> Self {
        Self::from_raw(B::matmul_transposed_rhs(&self.data, &other.data))
    }

    /// Adds `v` to every row.
    ///
    /// # Panics
    /// If `v.len()` differs from the column count.
    pub fn add_row_vector(&self, v: &Tensor1D<B>) -> Self {
        Self::from_raw(B::broadcast_add_1d_to_2d_rows(&self.data, &v.data))
    }

    /// Concatenates matrices with equal row counts side by side.
    ///
    /// # Panics
    /// If `parts` is empty or row counts differ.
    pub fn hcat(parts: &[Self]) -> Self {
        let raw: Vec<B::Tensor2D> = parts.iter().map(|p| p.data.clone()).collect();
        Self::from_raw(B::hcat_2d(&raw))
    }

    /// Columns `start..start + width`.
    ///
    /// # Panics
    /// If the range exceeds the column count.
    pub fn column_block(&self, start: usize, width: usize) -> Self {
        let cols: Vec<usize> = (start..start + width).collect();
        Self::from_raw(B::select_columns_2d(&self.data, &cols))
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        B::shape(&self.data)
    }

    /// Row-major host copy.
    pub fn to_vec(&self) -> Vec<f64> {
        B::ravel_2d(&self.data)
    }
}

impl<B: Backend> fmt::Debug for Tensor2D<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.shape();
        f.debug_struct("Tensor2D")
            .field("rows", &rows)
            .field("cols", &cols)
            .field("data", &self.to_vec())
            .finish()
    }
}
