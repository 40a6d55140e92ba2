use super::Backend;
use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};

/// Tensor backend built on the `ndarray` crate.
///
/// Matrix products go through `ndarray`'s `dot`, so this backend is the faster
/// choice for wider hidden layers.
///
/// # Type mappings
/// - `Scalar`: `f64`
/// - `Tensor1D`: `ndarray::Array1<f64>`
/// - `Tensor2D`: [`NdarrayTensor2D`] wrapper around `ndarray::Array2<f64>`
#[derive(Clone, Debug, Copy)]
pub struct NdarrayBackend;

/// Wrapper type for 2D tensors using `ndarray::Array2<f64>`.
///
/// # Example
/// ```
/// use seqlabel::backend::{Backend, NdarrayBackend};
///
/// let tensor = NdarrayBackend::from_f64_2d(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
/// assert_eq!(tensor.0.shape(), &[2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NdarrayTensor2D(pub Array2<f64>);

fn stable_sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

fn check_same_shape(a: &Array2<f64>, b: &Array2<f64>) {
    assert_eq!(a.dim(), b.dim(), "Shape mismatch in element-wise op");
}

fn check_same_len(a: &Array1<f64>, b: &Array1<f64>) {
    assert_eq!(a.len(), b.len(), "Length mismatch in element-wise op");
}

impl Backend for NdarrayBackend {
    type Scalar = f64;
    type Tensor1D = Array1<f64>;
    type Tensor2D = NdarrayTensor2D;

    fn zeros_1d(len: usize) -> Self::Tensor1D {
        Array1::zeros(len)
    }

    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D {
        NdarrayTensor2D(Array2::zeros((rows, cols)))
    }

    fn from_f64_1d(data: Vec<f64>) -> Self::Tensor1D {
        Array1::from_vec(data)
    }

    /// # Panics
    /// If `data.len() != rows * cols`.
    fn from_f64_2d(data: Vec<f64>, rows: usize, cols: usize) -> Self::Tensor2D {
        assert_eq!(data.len(), rows * cols, "Inconsistent shape");
        match Array2::from_shape_vec((rows, cols), data) {
            Ok(a) => NdarrayTensor2D(a),
            Err(e) => panic!("Inconsistent shape: {e}"),
        }
    }

    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        check_same_len(a, b);
        a + b
    }

    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        check_same_len(a, b);
        a - b
    }

    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        check_same_len(a, b);
        a * b
    }

    fn div_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        check_same_len(a, b);
        a / b
    }

    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t * *s
    }

    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t + *s
    }

    fn sqrt_1d(t: &Self::Tensor1D) -> Self::Tensor1D {
        t.mapv(f64::sqrt)
    }

    fn add_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        check_same_shape(&a.0, &b.0);
        NdarrayTensor2D(&a.0 + &b.0)
    }

    fn sub_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        check_same_shape(&a.0, &b.0);
        NdarrayTensor2D(&a.0 - &b.0)
    }

    fn mul_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        check_same_shape(&a.0, &b.0);
        NdarrayTensor2D(&a.0 * &b.0)
    }

    fn div_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        check_same_shape(&a.0, &b.0);
        NdarrayTensor2D(&a.0 / &b.0)
    }

    fn mul_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D {
        NdarrayTensor2D(&t.0 * *s)
    }

    fn add_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D {
        NdarrayTensor2D(&t.0 + *s)
    }

    fn sqrt_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(t.0.mapv(f64::sqrt))
    }

    fn sigmoid_2d(x: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(x.0.mapv(stable_sigmoid))
    }

    fn tanh_2d(x: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(x.0.mapv(f64::tanh))
    }

    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.sum()
    }

    fn sum_all_2d(t: &Self::Tensor2D) -> Self::Scalar {
        t.0.sum()
    }

    fn mean_all_2d(t: &Self::Tensor2D) -> Self::Scalar {
        t.0.sum() / t.0.len() as f64
    }

    fn col_sum_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        t.0.sum_axis(Axis(0))
    }

    fn scalar_f64(value: f64) -> Self::Scalar {
        value
    }

    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64> {
        t.to_vec()
    }

    fn ravel_2d(t: &Self::Tensor2D) -> Vec<f64> {
        t.0.iter().copied().collect()
    }

    fn len_1d(t: &Self::Tensor1D) -> usize {
        t.len()
    }

    fn shape(t: &Self::Tensor2D) -> (usize, usize) {
        t.0.dim()
    }

    /// # Panics
    /// If inner dimensions differ.
    fn matmul(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        assert_eq!(
            a.0.ncols(),
            b.0.nrows(),
            "matmul: inner dimensions differ ({} vs {})",
            a.0.ncols(),
            b.0.nrows()
        );
        NdarrayTensor2D(a.0.dot(&b.0))
    }

    fn matmul_transposed_lhs(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        assert_eq!(
            a.0.nrows(),
            b.0.nrows(),
            "matmul_transposed_lhs: row counts differ ({} vs {})",
            a.0.nrows(),
            b.0.nrows()
        );
        NdarrayTensor2D(a.0.t().dot(&b.0))
    }

    fn matmul_transposed_rhs(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        assert_eq!(
            a.0.ncols(),
            b.0.ncols(),
            "matmul_transposed_rhs: column counts differ ({} vs {})",
            a.0.ncols(),
            b.0.ncols()
        );
        NdarrayTensor2D(a.0.dot(&b.0.t()))
    }

    fn broadcast_add_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        assert_eq!(
            t.0.ncols(),
            v.len(),
            "broadcast: vector length must equal column count"
        );
        NdarrayTensor2D(&t.0 + v)
    }

    fn hcat_2d(tensors: &[Self::Tensor2D]) -> Self::Tensor2D {
        assert!(!tensors.is_empty(), "hcat_2d: nothing to concatenate");
        let rows = tensors[0].0.nrows();
        assert!(
            tensors.iter().all(|t| t.0.nrows() == rows),
            "hcat_2d: all tensors must have the same number of rows"
        );
        let views: Vec<ArrayView2<f64>> = tensors.iter().map(|t| t.0.view()).collect();
        match concatenate(Axis(1), &views) {
            Ok(a) => NdarrayTensor2D(a),
            Err(e) => panic!("hcat_2d: {e}"),
        }
    }

    fn select_columns_2d(t: &Self::Tensor2D, columns: &[usize]) -> Self::Tensor2D {
        let ncols = t.0.ncols();
        assert!(
            columns.iter().all(|&c| c < ncols),
            "select_columns_2d: column index out of bounds"
        );
        NdarrayTensor2D(t.0.select(Axis(1), columns))
    }
}
