//! # Backend Abstraction
//!
//! This module provides a trait-based abstraction over computation backends,
//! so the recurrent model, the loss and the optimizers are written once and run
//! on any tensor implementation.
//!
//! ## Design Philosophy
//!
//! - **Minimal trait surface**: only the operations an LSTM forward/backward pass,
//!   an MSE loss and an Adam update need are exposed.
//! - **Zero-cost generics**: backend selection happens at compile time via type
//!   parameters, avoiding runtime dispatch overhead.
//! - **Type-safe tensor handling**: each backend defines its own `Tensor1D` and
//!   `Tensor2D` types; the wrappers in [`tensor1d`], [`tensor2d`] and [`tensor3d`]
//!   expose a uniform API over them.
//! - **Feature-gated implementations**: backends are enabled via Cargo features
//!   (`cpu`, `ndarray`).
//!
//! ## Available Backends
//!
//! | Backend          | Feature    | Use Case                          |
//! |------------------|------------|-----------------------------------|
//! | `CpuBackend`     | `cpu`      | Default, pure-Rust implementation |
//! | `NdarrayBackend` | `ndarray`  | Interop with `ndarray` ecosystem  |
//!
//! ## Example
//!
//! ```rust
//! use seqlabel::backend::{CpuBackend, Tensor2D};
//!
//! let x: Tensor2D<CpuBackend> = Tensor2D::from_f64(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
//! let w: Tensor2D<CpuBackend> = Tensor2D::from_f64(vec![1.0, 0.0, 0.0, 1.0], 2, 2);
//! assert_eq!(x.matmul(&w).to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
//! ```

#[cfg(feature = "cpu")]
pub mod cpu;
#[cfg(feature = "cpu")]
/// Pure-Rust CPU backend implementation with zero external dependencies.
pub use cpu::{CpuBackend, CpuTensor2D};

#[cfg(feature = "ndarray")]
mod ndarray_backend;
#[cfg(feature = "ndarray")]
/// Backend backed by the `ndarray` crate for ecosystem interoperability.
pub use ndarray_backend::{NdarrayBackend, NdarrayTensor2D};

/// Scalar value representation and arithmetic operations.
pub mod scalar;
/// One-dimensional tensor abstraction.
pub mod tensor1d;
/// Two-dimensional tensor abstraction.
pub mod tensor2d;
/// Three-dimensional `[batch, timestep, feature]` tensors and the reshaper.
pub mod tensor3d;

pub use scalar::{Scalar, ScalarOps};
pub use tensor1d::Tensor1D;
pub use tensor2d::Tensor2D;
pub use tensor3d::{Shape3, Tensor3D};

/// Abstraction over tensor storage and operations.
///
/// The `Backend` trait defines the operations required to train and run a
/// recurrent sequence model. Implementations provide concrete tensor types
/// while maintaining a uniform API surface.
///
/// # Type Parameters
///
/// - `Scalar`: Primitive numeric type with arithmetic capabilities
/// - `Tensor1D`: One-dimensional array representation (bias vectors)
/// - `Tensor2D`: Two-dimensional row-major matrix (`[batch, features]` per timestep,
///   weight matrices)
///
/// # Shape checking
///
/// Operations panic on shape mismatch. Shapes flowing through the model are
/// validated once at the pipeline boundary, so these panics indicate a bug
/// rather than bad input.
pub trait Backend: Clone + Copy + 'static {
    /// Scalar type supporting arithmetic operations.
    type Scalar: ScalarOps + Clone;

    /// One-dimensional tensor type.
    type Tensor1D: Clone + Send + Sync;

    /// Two-dimensional tensor type.
    type Tensor2D: Clone + Send + Sync;

    // --- Constructors ---

    /// Creates a 1D tensor filled with zeros of given length.
    fn zeros_1d(len: usize) -> Self::Tensor1D;

    /// Creates a 2D tensor filled with zeros of given dimensions.
    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D;

    /// Constructs a 1D tensor from owned `f64` data without precision loss.
    fn from_f64_1d(data: Vec<f64>) -> Self::Tensor1D;

    /// Constructs a 2D tensor from row-major ordered `f64` data.
    ///
    /// # Panics
    /// If `data.len() != rows * cols`.
    fn from_f64_2d(data: Vec<f64>, rows: usize, cols: usize) -> Self::Tensor2D;

    // --- Element-wise operations (1D) ---

    /// Element-wise addition of two 1D tensors.
    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise subtraction of two 1D tensors.
    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise multiplication of two 1D tensors.
    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise division of two 1D tensors.
    fn div_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Multiplies each element of tensor by a scalar.
    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D;

    /// Adds a scalar to each element of tensor.
    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D;

    /// Element-wise square root.
    fn sqrt_1d(t: &Self::Tensor1D) -> Self::Tensor1D;

    // --- Element-wise operations (2D) ---

    /// Element-wise addition of two 2D tensors.
    ///
    /// # Panics
    /// If tensors have different shapes.
    fn add_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise subtraction of two 2D tensors.
    ///
    /// # Panics
    /// If tensors have different shapes.
    fn sub_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise (Hadamard) product of two 2D tensors.
    ///
    /// # Panics
    /// If tensors have different shapes.
    fn mul_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise division of two 2D tensors.
    ///
    /// # Panics
    /// If tensors have different shapes.
    fn div_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Multiplies each element of a 2D tensor by a scalar.
    fn mul_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D;

    /// Adds a scalar to each element of a 2D tensor.
    fn add_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D;

    /// Element-wise square root of a 2D tensor.
    fn sqrt_2d(t: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise logistic sigmoid `1 / (1 + e^(-x))`, numerically stable for
    /// large magnitudes.
    fn sigmoid_2d(x: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise hyperbolic tangent.
    fn tanh_2d(x: &Self::Tensor2D) -> Self::Tensor2D;

    // --- Reduction operations ---

    /// Sum of all elements in a 1D tensor.
    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar;

    /// Sum of all elements in a 2D tensor.
    fn sum_all_2d(t: &Self::Tensor2D) -> Self::Scalar;

    /// Arithmetic mean of all elements in a 2D tensor.
    fn mean_all_2d(t: &Self::Tensor2D) -> Self::Scalar;

    /// Sum of each column of a 2D tensor (reduction over rows).
    ///
    /// Returns a 1D tensor of length `cols`. Used for bias gradients.
    fn col_sum_2d(t: &Self::Tensor2D) -> Self::Tensor1D;

    // --- Scalar operations ---

    /// Creates a backend-specific scalar from an f64 value.
    fn scalar_f64(value: f64) -> Self::Scalar;

    // --- Data access ---

    /// Converts a 1D tensor to a Vec of f64 values.
    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64>;

    /// Flattens a 2D tensor in row-major order.
    fn ravel_2d(t: &Self::Tensor2D) -> Vec<f64>;

    /// Returns the number of elements in a 1D tensor.
    fn len_1d(t: &Self::Tensor1D) -> usize;

    /// Returns the shape of a 2D tensor as `(rows, cols)`.
    fn shape(t: &Self::Tensor2D) -> (usize, usize);

    // --- Linear algebra ---

    /// Matrix product `A · B` for `A: (m × k)`, `B: (k × n)`.
    ///
    /// # Panics
    /// If the inner dimensions differ.
    fn matmul(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Matrix product `Aᵀ · B` for `A: (k × m)`, `B: (k × n)` without
    /// materialising the transpose. Used for weight gradients.
    ///
    /// # Panics
    /// If the row counts differ.
    fn matmul_transposed_lhs(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Matrix product `A · Bᵀ` for `A: (m × k)`, `B: (n × k)`. Used to
    /// propagate gradients back through a weight matrix.
    ///
    /// # Panics
    /// If the column counts differ.
    fn matmul_transposed_rhs(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    // --- Broadcasting and column manipulation ---

    /// Adds a 1D tensor of length `cols` to every row of a 2D tensor.
    ///
    /// Result[i, j] = t[i, j] + v[j]
    fn broadcast_add_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D;

    /// Horizontally concatenates 2D tensors that share a row count.
    ///
    /// # Panics
    /// If the slice is empty or row counts differ.
    fn hcat_2d(tensors: &[Self::Tensor2D]) -> Self::Tensor2D;

    /// Extracts the given columns (in order) from a 2D tensor.
    ///
    /// # Panics
    /// If any column index is out of bounds.
    fn select_columns_2d(t: &Self::Tensor2D, columns: &[usize]) -> Self::Tensor2D;
}
