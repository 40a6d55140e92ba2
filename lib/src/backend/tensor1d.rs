use super::scalar::Scalar;
use crate::backend::Backend;
use std::fmt;
use std::marker::PhantomData;

/// Backend-typed 1D tensor.
///
/// Used for bias vectors and their optimizer moments. Wraps the backend's
/// native representation (`B::Tensor1D`) and carries the backend as a phantom
/// type so that tensors from different backends cannot be mixed.
///
/// ```compile_fail
/// use seqlabel::backend::{CpuBackend, NdarrayBackend, Tensor1D};
///
/// let cpu_tensor: Tensor1D<CpuBackend> = Tensor1D::zeros(3);
/// let ndarray_tensor: Tensor1D<NdarrayBackend> = Tensor1D::zeros(3);
/// let _ = cpu_tensor.sub(&ndarray_tensor);
/// ```
///
/// # Example
/// ```
/// use seqlabel::backend::{CpuBackend, Scalar, Tensor1D};
///
/// let x: Tensor1D<CpuBackend> = Tensor1D::from_f64(vec![1.0, 2.0, 3.0]);
/// assert_eq!(x.len(), 3);
///
/// let y = x.scale(&Scalar::<CpuBackend>::new(2.0));
/// assert_eq!(y.to_vec(), vec![2.0, 4.0, 6.0]);
/// ```
#[derive(Clone)]
pub struct Tensor1D<B: Backend> {
    pub(crate) data: B::Tensor1D,
    pub(crate) backend: PhantomData<B>,
}

impl<B: Backend> Tensor1D<B> {
    pub(crate) fn from_raw(data: B::Tensor1D) -> Self {
        Self {
            data,
            backend: PhantomData,
        }
    }

    /// Creates a tensor from `f64` values without precision loss.
    pub fn from_f64(data: Vec<f64>) -> Self {
        Self::from_raw(B::from_f64_1d(data))
    }

    /// Creates a zero-filled tensor of length `len`.
    pub fn zeros(len: usize) -> Self {
        Self::from_raw(B::zeros_1d(len))
    }

    /// Element-wise `self + other`.
    ///
    /// # Panics
    /// If lengths differ.
    pub fn add(&self, other: &Self) -> Self {
        Self::from_raw(B::add_1d(&self.data, &other.data))
    }

    /// Element-wise `self - other`.
    ///
    /// # Panics
    /// If lengths differ.
    pub fn sub(&self, other: &Self) -> Self {
        Self::from_raw(B::sub_1d(&self.data, &other.data))
    }

    /// Element-wise (Hadamard) product.
    pub fn mul(&self, other: &Self) -> Self {
        Self::from_raw(B::mul_1d(&self.data, &other.data))
    }

    /// Element-wise division.
    pub fn div(&self, other: &Self) -> Self {
        Self::from_raw(B::div_1d(&self.data, &other.data))
    }

    /// Multiplies every element by `s`.
    pub fn scale(&self, s: &Scalar<B>) -> Self {
        Self::from_raw(B::mul_scalar_1d(&self.data, &s.data))
    }

    /// Adds `s` to every element.
    pub fn add_scalar(&self, s: &Scalar<B>) -> Self {
        Self::from_raw(B::add_scalar_1d(&self.data, &s.data))
    }

    /// Element-wise square root.
    pub fn sqrt(&self) -> Self {
        Self::from_raw(B::sqrt_1d(&self.data))
    }

    /// Sum of all elements.
    pub fn sum(&self) -> Scalar<B> {
        Scalar::from_raw(B::sum_all_1d(&self.data))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        B::len_1d(&self.data)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Host copy of the values.
    pub fn to_vec(&self) -> Vec<f64> {
        B::to_vec_1d(&self.data)
    }
}

impl<B: Backend> fmt::Debug for Tensor1D<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tensor1D").field(&self.to_vec()).finish()
    }
}
