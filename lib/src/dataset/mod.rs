//! Sequence datasets.
//!
//! A [`Dataset`] is a source of `(input, target)` pairs of `[batch, timestep,
//! feature]` tensors. Samples are whole sequences: a batch is a contiguous
//! range of sequences, always with every timestep.
//!
//! - [`source`] reads the four arrays a dataset is made of from files.
//! - [`synthetic`] generates the permutation task used for demos and tests.
//! - [`InMemoryDataset`] holds validated flat arrays and cuts batches from them.
//!
//! # Example
//!
//! ```rust
//! use seqlabel::backend::{CpuBackend, Shape3};
//! use seqlabel::dataset::{Dataset, InMemoryDataset};
//!
//! // 2 sequences × 1 timestep × 2 features, targets with 1 feature
//! let ds = InMemoryDataset::new(
//!     vec![1.0, 0.0, 0.0, 1.0],
//!     Shape3::new(2, 1, 2),
//!     vec![1.0, 0.0],
//!     Shape3::new(2, 1, 1),
//! )
//! .unwrap();
//!
//! for batch in ds.batches::<CpuBackend>(1) {
//!     let (x, y) = batch.unwrap();
//!     assert_eq!(x.shape().batch, 1);
//!     assert_eq!(y.shape().features, 1);
//! }
//! ```

use crate::backend::{Backend, Tensor3D};
use std::fmt::Display;
use std::ops::Range;

pub mod memory;
pub mod source;
pub mod synthetic;

pub use self::memory::InMemoryDataset;
pub use self::source::SequenceSource;
pub use self::synthetic::PermutationTask;

/// Abstract interface for a sequence dataset.
///
/// # Example Implementation
///
/// ```rust
/// use seqlabel::backend::{Backend, Shape3, Tensor3D};
/// use seqlabel::dataset::Dataset;
/// use std::ops::Range;
///
/// struct Zeros;
///
/// impl Dataset for Zeros {
///     type Error = String;
///
///     fn len(&self) -> Option<usize> {
///         Some(4)
///     }
///
///     fn get_batch<B: Backend>(
///         &self,
///         range: Range<usize>,
///     ) -> Result<(Tensor3D<B>, Tensor3D<B>), Self::Error> {
///         let n = range.len();
///         Ok((
///             Tensor3D::zeros(Shape3::new(n, 3, 2)),
///             Tensor3D::zeros(Shape3::new(n, 3, 1)),
///         ))
///     }
/// }
///
/// assert_eq!(Zeros.batches::<seqlabel::backend::CpuBackend>(3).count(), 2);
/// ```
pub trait Dataset {
    /// Error returned when a batch cannot be loaded.
    type Error: Display + 'static;

    /// Number of sequences, `None` if unknown.
    fn len(&self) -> Option<usize>;

    /// `true` when `len()` is `Some(0)`.
    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Iterator over consecutive batches of `batch_size` sequences; the last
    /// batch may be smaller.
    fn batches<B: Backend>(&self, batch_size: usize) -> DatasetBatchIter<'_, B, Self>
    where
        Self: Sized,
    {
        DatasetBatchIter {
            dataset: self,
            batch_size,
            current: 0,
            _backend: std::marker::PhantomData,
        }
    }

    /// Loads sequences `range` as `(input, target)` tensors.
    fn get_batch<B: Backend>(
        &self,
        range: Range<usize>,
    ) -> Result<(Tensor3D<B>, Tensor3D<B>), Self::Error>;
}

/// Iterator over dataset batches, created by [`Dataset::batches`].
///
/// Data is fetched lazily on `next()`; errors from `get_batch` are yielded as
/// `Some(Err(e))`. Yields nothing when the dataset length is unknown or the
/// batch size is zero.
pub struct DatasetBatchIter<'a, B: Backend, D: ?Sized> {
    dataset: &'a D,
    batch_size: usize,
    current: usize,
    _backend: std::marker::PhantomData<B>,
}

impl<B: Backend, D: Dataset> Iterator for DatasetBatchIter<'_, B, D> {
    type Item = Result<(Tensor3D<B>, Tensor3D<B>), D::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len()?;
        if self.batch_size == 0 || self.current >= total {
            return None;
        }

        let end = (self.current + self.batch_size).min(total);
        let range = self.current..end;
        self.current = end;

        Some(self.dataset.get_batch::<B>(range))
    }
}
