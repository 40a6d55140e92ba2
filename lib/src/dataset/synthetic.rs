//! Synthetic permutation task.
//!
//! Every timestep carries a one-hot class; the target at the same timestep is
//! the one-hot of that class mapped through a fixed permutation. Sequence `s`
//! at timestep `t` holds class `(s + t) mod classes`, so with as many sequences
//! as classes every class appears at every position exactly once.

use crate::backend::Shape3;
use crate::dataset::{InMemoryDataset, SequenceSource};
use crate::error::{Result, SeqLabelError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Generator for the one-hot permutation labelling task.
///
/// # Example
/// ```
/// use seqlabel::dataset::PermutationTask;
///
/// let task = PermutationTask::new(5, 5, 5).unwrap();
/// assert_eq!(task.permutation(), &[4, 3, 2, 1, 0]);
/// let src = task.source();
/// assert_eq!(src.input_seq.len(), 125);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermutationTask {
    sequences: usize,
    timesteps: usize,
    permutation: Vec<usize>,
}

impl PermutationTask {
    /// Task whose permutation reverses the class order.
    ///
    /// # Errors
    /// [`SeqLabelError::InvalidConfig`] if any dimension is zero.
    pub fn new(sequences: usize, timesteps: usize, classes: usize) -> Result<Self> {
        let permutation = (0..classes).rev().collect();
        Self::with_permutation(sequences, timesteps, permutation)
    }

    /// Task with a permutation shuffled from `seed`.
    pub fn shuffled(sequences: usize, timesteps: usize, classes: usize, seed: u64) -> Result<Self> {
        let mut permutation: Vec<usize> = (0..classes).collect();
        permutation.shuffle(&mut StdRng::seed_from_u64(seed));
        Self::with_permutation(sequences, timesteps, permutation)
    }

    /// Task with an explicit permutation; `permutation[c]` is the target class
    /// for input class `c`.
    pub fn with_permutation(
        sequences: usize,
        timesteps: usize,
        permutation: Vec<usize>,
    ) -> Result<Self> {
        if sequences == 0 || timesteps == 0 || permutation.is_empty() {
            return Err(SeqLabelError::InvalidConfig(format!(
                "permutation task needs non-zero dimensions, got {sequences} sequences, \
                 {timesteps} timesteps, {} classes",
                permutation.len()
            )));
        }
        let mut seen = vec![false; permutation.len()];
        for &p in &permutation {
            match seen.get_mut(p) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(SeqLabelError::InvalidConfig(format!(
                        "{permutation:?} is not a permutation"
                    )))
                }
            }
        }
        Ok(Self {
            sequences,
            timesteps,
            permutation,
        })
    }

    pub fn classes(&self) -> usize {
        self.permutation.len()
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Input class of `sequence` at `timestep`.
    pub fn input_class(&self, sequence: usize, timestep: usize) -> usize {
        (sequence + timestep) % self.classes()
    }

    /// Target class of `sequence` at `timestep`.
    pub fn target_class(&self, sequence: usize, timestep: usize) -> usize {
        self.permutation[self.input_class(sequence, timestep)]
    }

    pub fn shape(&self) -> Shape3 {
        Shape3::new(self.sequences, self.timesteps, self.classes())
    }

    /// The generated arrays; input and target share one shape.
    pub fn source(&self) -> SequenceSource {
        let shape = self.shape();
        let classes = self.classes();
        let mut input = vec![0.0; shape.num_elements()];
        let mut target = vec![0.0; shape.num_elements()];
        for s in 0..self.sequences {
            for t in 0..self.timesteps {
                let base = (s * self.timesteps + t) * classes;
                input[base + self.input_class(s, t)] = 1.0;
                target[base + self.target_class(s, t)] = 1.0;
            }
        }
        SequenceSource::new(shape, input, shape, target)
    }

    pub fn dataset(&self) -> Result<InMemoryDataset> {
        self.source().into_dataset()
    }
}

impl Default for PermutationTask {
    /// The 5 × 5 × 5 reversal task.
    fn default() -> Self {
        Self {
            sequences: 5,
            timesteps: 5,
            permutation: (0..5).rev().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argmax(v: &[f64]) -> usize {
        v.iter()
            .enumerate()
            .fold(0, |best, (i, &x)| if x > v[best] { i } else { best })
    }

    #[test]
    fn test_default_is_five_cubed_reversal() {
        let task = PermutationTask::default();
        assert_eq!(task, PermutationTask::new(5, 5, 5).unwrap());
        assert_eq!(task.shape(), Shape3::new(5, 5, 5));
    }

    #[test]
    fn test_source_is_one_hot_and_permuted() {
        let task = PermutationTask::new(3, 4, 5).unwrap();
        let src = task.source();
        assert!(src.validate().is_ok());
        for s in 0..3 {
            for t in 0..4 {
                let base = (s * 4 + t) * 5;
                let x = &src.input_seq[base..base + 5];
                let y = &src.target_seq[base..base + 5];
                assert_eq!(x.iter().sum::<f64>(), 1.0);
                assert_eq!(y.iter().sum::<f64>(), 1.0);
                assert_eq!(argmax(x), (s + t) % 5);
                assert_eq!(argmax(y), 4 - (s + t) % 5);
            }
        }
    }

    #[test]
    fn test_shuffled_is_deterministic_permutation() {
        let a = PermutationTask::shuffled(5, 5, 8, 42).unwrap();
        let b = PermutationTask::shuffled(5, 5, 8, 42).unwrap();
        assert_eq!(a, b);
        let mut sorted = a.permutation().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_rejects_invalid_tasks() {
        assert!(PermutationTask::new(0, 5, 5).is_err());
        assert!(PermutationTask::new(5, 5, 0).is_err());
        assert!(PermutationTask::with_permutation(2, 2, vec![0, 0]).is_err());
        assert!(PermutationTask::with_permutation(2, 2, vec![0, 2]).is_err());
        assert!(PermutationTask::with_permutation(2, 2, vec![1, 0]).is_ok());
    }

    #[test]
    fn test_dataset_length() {
        use crate::dataset::Dataset;
        let ds = PermutationTask::default().dataset().unwrap();
        assert_eq!(ds.len(), Some(5));
    }
}
