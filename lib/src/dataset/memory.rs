use crate::backend::{Backend, Shape3, Tensor3D};
use crate::dataset::{Dataset, SequenceSource};
use crate::error::{Result, SeqLabelError};
use std::ops::Range;

/// A validated dataset held in memory as flat row-major arrays.
///
/// Batches are cut along the sequence axis and reshaped on demand for the
/// requested backend.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    source: SequenceSource,
}

impl InMemoryDataset {
    /// Builds a dataset from flat input and target arrays.
    ///
    /// # Errors
    /// Any [`SequenceSource::validate`] error, or
    /// [`SeqLabelError::EmptyDataset`] when there are no sequences.
    pub fn new(
        input: Vec<f64>,
        input_shape: Shape3,
        target: Vec<f64>,
        target_shape: Shape3,
    ) -> Result<Self> {
        Self::from_source(SequenceSource::new(input_shape, input, target_shape, target))
    }

    pub fn from_source(source: SequenceSource) -> Result<Self> {
        source.validate()?;
        if source.input_shape.batch == 0 {
            return Err(SeqLabelError::EmptyDataset);
        }
        Ok(Self { source })
    }

    pub fn input_shape(&self) -> Shape3 {
        self.source.input_shape
    }

    pub fn target_shape(&self) -> Shape3 {
        self.source.target_shape
    }

    pub fn source(&self) -> &SequenceSource {
        &self.source
    }

    /// The whole dataset as `(input, target)` tensors.
    pub fn tensors<B: Backend>(&self) -> Result<(Tensor3D<B>, Tensor3D<B>)> {
        self.get_batch(0..self.input_shape().batch)
    }
}

fn slice_sequences<'a>(seq: &'a [f64], shape: Shape3, range: &Range<usize>) -> &'a [f64] {
    let per_sequence = shape.timesteps * shape.features;
    &seq[range.start * per_sequence..range.end * per_sequence]
}

impl Dataset for InMemoryDataset {
    type Error = SeqLabelError;

    fn len(&self) -> Option<usize> {
        Some(self.source.input_shape.batch)
    }

    fn get_batch<B: Backend>(
        &self,
        range: Range<usize>,
    ) -> Result<(Tensor3D<B>, Tensor3D<B>)> {
        let total = self.source.input_shape.batch;
        if range.start > range.end || range.end > total {
            return Err(SeqLabelError::Data(format!(
                "batch range {range:?} out of bounds for {total} sequences"
            )));
        }
        let n = range.len();
        let in_shape = Shape3 {
            batch: n,
            ..self.source.input_shape
        };
        let out_shape = Shape3 {
            batch: n,
            ..self.source.target_shape
        };
        let x = Tensor3D::from_flat(
            slice_sequences(&self.source.input_seq, self.source.input_shape, &range),
            in_shape,
        )?;
        let y = Tensor3D::from_flat(
            slice_sequences(&self.source.target_seq, self.source.target_shape, &range),
            out_shape,
        )?;
        Ok((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    fn dataset() -> InMemoryDataset {
        // 3 sequences × 2 timesteps; input width 1, target width 2
        InMemoryDataset::new(
            vec![0.0, 1.0, 10.0, 11.0, 20.0, 21.0],
            Shape3::new(3, 2, 1),
            (0..12).map(|i| i as f64).collect(),
            Shape3::new(3, 2, 2),
        )
        .unwrap()
    }

    #[test]
    fn test_get_batch_slices_sequences() {
        let (x, y) = dataset().get_batch::<CpuBackend>(1..3).unwrap();
        assert_eq!(x.shape(), Shape3::new(2, 2, 1));
        assert_eq!(x.to_flat(), vec![10.0, 11.0, 20.0, 21.0]);
        assert_eq!(y.shape(), Shape3::new(2, 2, 2));
        assert_eq!(y.to_flat(), (4..12).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_get_batch_out_of_bounds() {
        assert!(matches!(
            dataset().get_batch::<CpuBackend>(2..4),
            Err(SeqLabelError::Data(_))
        ));
    }

    #[test]
    fn test_whole_dataset_tensors() {
        let ds = dataset();
        assert_eq!(ds.len(), Some(3));
        let (x, y) = ds.tensors::<CpuBackend>().unwrap();
        assert_eq!(x.to_flat(), ds.source().input_seq);
        assert_eq!(y.to_flat(), ds.source().target_seq);
    }

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            InMemoryDataset::new(vec![], Shape3::new(0, 2, 1), vec![], Shape3::new(0, 2, 1)),
            Err(SeqLabelError::EmptyDataset)
        ));
        assert!(matches!(
            InMemoryDataset::new(vec![0.0], Shape3::new(1, 1, 1), vec![], Shape3::new(1, 1, 1)),
            Err(SeqLabelError::ShapeMismatch { .. })
        ));
    }
}
