use super::Backend;

/// Pure-Rust CPU backend.
///
/// Tensors are plain `Vec<f64>` buffers; matrices are stored row-major together
/// with their dimensions. No SIMD or threading, which keeps results bit-for-bit
/// reproducible for a given seed.
#[derive(Clone, Debug, Copy)]
pub struct CpuBackend;

/// Row-major matrix: `(data, rows, cols)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTensor2D(pub Vec<f64>, pub usize, pub usize);

impl CpuTensor2D {
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols, "Inconsistent shape");
        Self(data, rows, cols)
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.iter().map(|&x| f(x)).collect(), self.1, self.2)
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        assert_eq!(
            (self.1, self.2),
            (other.1, other.2),
            "Shape mismatch in element-wise op"
        );
        Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            self.1,
            self.2,
        )
    }
}

fn stable_sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

fn zip_1d(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    assert_eq!(a.len(), b.len(), "Length mismatch in element-wise op");
    a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect()
}

impl Backend for CpuBackend {
    type Scalar = f64;
    type Tensor1D = Vec<f64>;
    type Tensor2D = CpuTensor2D;

    // --- Constructors ---
    fn zeros_1d(len: usize) -> Self::Tensor1D {
        vec![0.; len]
    }
    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D {
        CpuTensor2D::new(vec![0.; rows * cols], rows, cols)
    }
    fn from_f64_1d(data: Vec<f64>) -> Self::Tensor1D {
        data
    }
    fn from_f64_2d(data: Vec<f64>, rows: usize, cols: usize) -> Self::Tensor2D {
        CpuTensor2D::new(data, rows, cols)
    }

    // --- Element-wise ops (1D) ---
    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        zip_1d(a, b, |x, y| x + y)
    }
    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        zip_1d(a, b, |x, y| x - y)
    }
    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        zip_1d(a, b, |x, y| x * y)
    }
    fn div_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        zip_1d(a, b, |x, y| x / y)
    }
    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t.iter().map(|x| x * s).collect()
    }
    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t.iter().map(|x| x + s).collect()
    }
    fn sqrt_1d(t: &Self::Tensor1D) -> Self::Tensor1D {
        t.iter().map(|x| x.sqrt()).collect()
    }

    // --- Element-wise ops (2D) ---
    fn add_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        a.zip_with(b, |x, y| x + y)
    }
    fn sub_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        a.zip_with(b, |x, y| x - y)
    }
    fn mul_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        a.zip_with(b, |x, y| x * y)
    }
    fn div_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        a.zip_with(b, |x, y| x / y)
    }
    fn mul_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D {
        t.map(|x| x * s)
    }
    fn add_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D {
        t.map(|x| x + s)
    }
    fn sqrt_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        t.map(f64::sqrt)
    }
    fn sigmoid_2d(x: &Self::Tensor2D) -> Self::Tensor2D {
        x.map(stable_sigmoid)
    }
    fn tanh_2d(x: &Self::Tensor2D) -> Self::Tensor2D {
        x.map(f64::tanh)
    }

    // --- Reductions ---
    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.iter().sum::<f64>()
    }
    fn sum_all_2d(t: &Self::Tensor2D) -> Self::Scalar {
        t.0.iter().sum::<f64>()
    }
    fn mean_all_2d(t: &Self::Tensor2D) -> Self::Scalar {
        t.0.iter().sum::<f64>() / t.0.len() as f64
    }
    fn col_sum_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        let CpuTensor2D(data, rows, cols) = t;
        let mut out = vec![0.0; *cols];
        for r in 0..*rows {
            for (c, acc) in out.iter_mut().enumerate() {
                *acc += data[r * cols + c];
            }
        }
        out
    }

    fn scalar_f64(value: f64) -> Self::Scalar {
        value
    }

    // --- Access ---
    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64> {
        t.clone()
    }
    fn ravel_2d(t: &Self::Tensor2D) -> Vec<f64> {
        t.0.clone()
    }
    fn len_1d(t: &Self::Tensor1D) -> usize {
        t.len()
    }
    fn shape(t: &Self::Tensor2D) -> (usize, usize) {
        (t.1, t.2)
    }

    // --- Linear algebra ---
    fn matmul(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        let CpuTensor2D(ad, m, k) = a;
        let CpuTensor2D(bd, kb, n) = b;
        assert_eq!(k, kb, "matmul: inner dimensions differ ({} vs {})", k, kb);
        let mut out = vec![0.0; m * n];
        for i in 0..*m {
            for p in 0..*k {
                let aip = ad[i * k + p];
                if aip == 0.0 {
                    continue;
                }
                let row = &bd[p * n..(p + 1) * n];
                let dst = &mut out[i * n..(i + 1) * n];
                for (o, &bv) in dst.iter_mut().zip(row) {
                    *o += aip * bv;
                }
            }
        }
        CpuTensor2D::new(out, *m, *n)
    }

    fn matmul_transposed_lhs(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        let CpuTensor2D(ad, k, m) = a;
        let CpuTensor2D(bd, kb, n) = b;
        assert_eq!(k, kb, "matmul_transposed_lhs: row counts differ ({} vs {})", k, kb);
        let mut out = vec![0.0; m * n];
        for p in 0..*k {
            let brow = &bd[p * n..(p + 1) * n];
            for i in 0..*m {
                let api = ad[p * m + i];
                if api == 0.0 {
                    continue;
                }
                let dst = &mut out[i * n..(i + 1) * n];
                for (o, &bv) in dst.iter_mut().zip(brow) {
                    *o += api * bv;
                }
            }
        }
        CpuTensor2D::new(out, *m, *n)
    }

    fn matmul_transposed_rhs(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        let CpuTensor2D(ad, m, k) = a;
        let CpuTensor2D(bd, n, kb) = b;
        assert_eq!(k, kb, "matmul_transposed_rhs: column counts differ ({} vs {})", k, kb);
        let mut out = Vec::with_capacity(m * n);
        for i in 0..*m {
            let arow = &ad[i * k..(i + 1) * k];
            for j in 0..*n {
                let brow = &bd[j * k..(j + 1) * k];
                out.push(arow.iter().zip(brow).map(|(x, y)| x * y).sum());
            }
        }
        CpuTensor2D::new(out, *m, *n)
    }

    // --- Broadcasting / columns ---
    fn broadcast_add_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        let CpuTensor2D(data, rows, cols) = t;
        assert_eq!(*cols, v.len(), "broadcast: vector length must equal column count");
        let mut out = data.clone();
        for r in 0..*rows {
            for (o, b) in out[r * cols..(r + 1) * cols].iter_mut().zip(v) {
                *o += b;
            }
        }
        CpuTensor2D::new(out, *rows, *cols)
    }

    fn hcat_2d(tensors: &[Self::Tensor2D]) -> Self::Tensor2D {
        assert!(!tensors.is_empty(), "hcat_2d: nothing to concatenate");
        let rows = tensors[0].1;
        assert!(
            tensors.iter().all(|t| t.1 == rows),
            "hcat_2d: all tensors must have the same number of rows"
        );
        let cols: usize = tensors.iter().map(|t| t.2).sum();
        let mut out = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for t in tensors {
                out.extend_from_slice(&t.0[r * t.2..(r + 1) * t.2]);
            }
        }
        CpuTensor2D::new(out, rows, cols)
    }

    fn select_columns_2d(t: &Self::Tensor2D, columns: &[usize]) -> Self::Tensor2D {
        let CpuTensor2D(data, rows, cols) = t;
        assert!(
            columns.iter().all(|&c| c < *cols),
            "select_columns_2d: column index out of bounds"
        );
        let mut out = Vec::with_capacity(rows * columns.len());
        for r in 0..*rows {
            for &c in columns {
                out.push(data[r * cols + c]);
            }
        }
        CpuTensor2D::new(out, *rows, columns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(data: &[f64], rows: usize, cols: usize) -> CpuTensor2D {
        CpuTensor2D::new(data.to_vec(), rows, cols)
    }

    #[test]
    fn test_matmul() {
        // [[1, 2], [3, 4]] @ [[5, 6, 7], [8, 9, 10]]
        let a = m(&[1.0, 2.0, 3.0, 4.0], 2, 2);
        let b = m(&[5.0, 6.0, 7.0, 8.0, 9.0, 10.0], 2, 3);
        let c = CpuBackend::matmul(&a, &b);
        assert_eq!(c, m(&[21.0, 24.0, 27.0, 47.0, 54.0, 61.0], 2, 3));
    }

    #[test]
    fn test_matmul_transposed_variants() {
        // A = [[1, -2], [3, 0.5], [4, -1]], B = [[2, 1], [0, -3], [1.5, 2.5]]
        let a = m(&[1.0, -2.0, 3.0, 0.5, 4.0, -1.0], 3, 2);
        let b = m(&[2.0, 1.0, 0.0, -3.0, 1.5, 2.5], 3, 2);

        // Aᵀ·B
        let lhs = CpuBackend::matmul_transposed_lhs(&a, &b);
        assert_eq!(lhs, m(&[8.0, 2.0, -5.5, -6.0], 2, 2));

        // A·Bᵀ
        let rhs = CpuBackend::matmul_transposed_rhs(&a, &b);
        assert_eq!(rhs, m(&[0.0, 6.0, -3.5, 6.5, -1.5, 5.75, 7.0, 3.0, 3.5], 3, 3));
    }

    #[test]
    #[should_panic(expected = "inner dimensions differ")]
    fn test_matmul_shape_mismatch_panics() {
        let a = m(&[1.0, 2.0], 1, 2);
        let b = m(&[1.0, 2.0, 3.0], 3, 1);
        let _ = CpuBackend::matmul(&a, &b);
    }

    #[test]
    fn test_col_sum_and_broadcast() {
        let x = m(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        assert_eq!(CpuBackend::col_sum_2d(&x), vec![5.0, 7.0, 9.0]);

        let y = CpuBackend::broadcast_add_1d_to_2d_rows(&x, &vec![10.0, 20.0, 30.0]);
        assert_eq!(y, m(&[11.0, 22.0, 33.0, 14.0, 25.0, 36.0], 2, 3));
    }

    #[test]
    fn test_hcat_and_select_columns_are_inverse() {
        let a = m(&[1.0, 2.0, 3.0, 4.0], 2, 2);
        let b = m(&[5.0, 6.0], 2, 1);
        let joined = CpuBackend::hcat_2d(&[a.clone(), b.clone()]);
        assert_eq!(joined, m(&[1.0, 2.0, 5.0, 3.0, 4.0, 6.0], 2, 3));
        assert_eq!(CpuBackend::select_columns_2d(&joined, &[0, 1]), a);
        assert_eq!(CpuBackend::select_columns_2d(&joined, &[2]), b);
    }

    #[test]
    #[should_panic(expected = "same number of rows")]
    fn test_hcat_row_mismatch_panics() {
        let a = m(&[1.0, 2.0], 2, 1);
        let b = m(&[1.0], 1, 1);
        let _ = CpuBackend::hcat_2d(&[a, b]);
    }

    #[test]
    fn test_sigmoid_stability() {
        let x = m(&[-1000.0, 0.0, 1000.0], 1, 3);
        let s = CpuBackend::sigmoid_2d(&x);
        assert_eq!(s.0[0], 0.0);
        assert_eq!(s.0[1], 0.5);
        assert_eq!(s.0[2], 1.0);
        assert!(s.0.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_tanh() {
        let x = m(&[0.0, 1.0], 1, 2);
        let t = CpuBackend::tanh_2d(&x);
        assert_eq!(t.0[0], 0.0);
        assert!((t.0[1] - 1.0f64.tanh()).abs() < 1e-15);
    }

    #[test]
    fn test_mean_and_sum() {
        let x = m(&[1.0, 2.0, 3.0, 4.0], 2, 2);
        assert_eq!(CpuBackend::sum_all_2d(&x), 10.0);
        assert_eq!(CpuBackend::mean_all_2d(&x), 2.5);
        assert_eq!(CpuBackend::sum_all_1d(&vec![1.0, 2.0]), 3.0);
    }
}
