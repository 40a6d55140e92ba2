use crate::backend::Backend;
use std::fmt;
use std::marker::PhantomData;

/// Scalar operations required by numerical backends.
///
/// The minimal set of arithmetic needed by the loss and the optimizers,
/// implemented for the primitive float type each backend stores (`f64`).
///
/// # Example
/// ```
/// use seqlabel::backend::ScalarOps;
///
/// let x = 4.0f64;
/// assert_eq!(ScalarOps::sqrt(x), 2.0);
/// assert_eq!(<f64 as ScalarOps>::zero(), 0.0);
/// assert!(ScalarOps::is_finite(x));
/// ```
pub trait ScalarOps:
    Clone
    + Copy
    + Send
    + Sync
    + fmt::Debug
    + std::ops::Add<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Div<Output = Self>
{
    /// Square root. Negative inputs yield NaN for real-number implementations.
    fn sqrt(self) -> Self;

    /// Absolute value.
    fn abs(self) -> Self;

    /// Additive identity.
    fn zero() -> Self;

    /// Multiplicative identity.
    fn one() -> Self;

    /// Converts an `f64` host value to this scalar type.
    fn from_f64(v: f64) -> Self;

    /// Converts this scalar to an `f64` host value.
    fn to_f64(self) -> f64;

    /// Integer power, used for Adam bias correction.
    fn powi(self, n: i32) -> Self;

    /// `false` for NaN and infinities.
    fn is_finite(self) -> bool;
}

impl ScalarOps for f64 {
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn powi(self, n: i32) -> Self {
        f64::powi(self, n)
    }

    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

/// Backend-typed scalar wrapper.
///
/// Carries phantom information about its originating backend so that a loss
/// value computed on one backend cannot be mixed with another backend's.
///
/// ```compile_fail
/// use seqlabel::backend::{CpuBackend, NdarrayBackend, Scalar};
///
/// let cpu_scalar: Scalar<CpuBackend> = Scalar::new(1.0);
/// let ndarray_scalar: Scalar<NdarrayBackend> = Scalar::new(2.0);
/// let _ = cpu_scalar + ndarray_scalar;
/// ```
///
/// # Example
/// ```
/// use seqlabel::backend::{CpuBackend, Scalar};
///
/// let s: Scalar<CpuBackend> = Scalar::new(2.0);
/// assert_eq!((s * s).to_f64(), 4.0);
/// ```
#[derive(Clone, Debug, Copy)]
pub struct Scalar<B: Backend> {
    pub(crate) data: B::Scalar,
    pub(crate) backend: PhantomData<B>,
}

impl<B: Backend> Scalar<B> {
    /// Creates a scalar from an `f64` host value.
    pub fn new(f: f64) -> Self {
        Self {
            data: B::scalar_f64(f),
            backend: PhantomData,
        }
    }

    pub(crate) fn from_raw(data: B::Scalar) -> Self {
        Self {
            data,
            backend: PhantomData,
        }
    }

    /// Converts to a host `f64` (identity for the bundled backends).
    pub fn to_f64(&self) -> f64 {
        self.data.to_f64()
    }

    /// `x^n`.
    pub fn powi(&self, n: i32) -> Self {
        Self::from_raw(self.data.powi(n))
    }

    /// `true` unless the value is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.data.is_finite()
    }
}

impl<B: Backend> fmt::Display for Scalar<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f64(), f)
    }
}

impl<B: Backend> std::ops::Add for Scalar<B> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_raw(self.data + rhs.data)
    }
}

impl<B: Backend> std::ops::Sub for Scalar<B> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_raw(self.data - rhs.data)
    }
}

impl<B: Backend> std::ops::Mul for Scalar<B> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_raw(self.data * rhs.data)
    }
}

impl<B: Backend> std::ops::Div for Scalar<B> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::from_raw(self.data / rhs.data)
    }
}
