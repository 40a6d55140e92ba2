//! Per-timestep argmax comparison of predictions against targets.

use crate::backend::{Backend, Tensor3D};
use crate::error::{Result, SeqLabelError};
use serde::Serialize;
use std::fmt;

/// Index of the largest element; the first one wins on ties.
///
/// A NaN counts as the maximum at its first occurrence, so a diverged model
/// reports the index of its first NaN rather than silently picking a finite
/// value. Returns `None` for an empty slice.
///
/// ```
/// use seqlabel::evaluate::argmax;
///
/// assert_eq!(argmax(&[0.1, 0.7, 0.7]), Some(1));
/// assert_eq!(argmax(&[0.1, f64::NAN, 0.9]), Some(1));
/// assert_eq!(argmax(&[]), None);
/// ```
pub fn argmax(values: &[f64]) -> Option<usize> {
    let (first, rest) = values.split_first()?;
    if first.is_nan() {
        return Some(0);
    }
    let mut best = 0;
    let mut best_value = *first;
    for (i, &v) in rest.iter().enumerate() {
        if v.is_nan() {
            return Some(i + 1);
        }
        if v > best_value {
            best = i + 1;
            best_value = v;
        }
    }
    Some(best)
}

/// Outcome for one sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
    pub sequence: usize,
    /// Predicted class per timestep.
    pub predictions: Vec<usize>,
    /// Target class per timestep.
    pub targets: Vec<usize>,
    /// True when every timestep agrees.
    pub matched: bool,
}

impl fmt::Display for SequenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sequence = {} predictions: ", self.sequence)?;
        for p in &self.predictions {
            write!(f, "{p}  ")?;
        }
        write!(f, "targets: ")?;
        for t in &self.targets {
            write!(f, "{t}  ")?;
        }
        f.write_str(if self.matched { "OK" } else { "error" })
    }
}

/// Per-sequence results for a whole prediction tensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    pub sequences: Vec<SequenceReport>,
}

impl EvaluationReport {
    pub fn matched_count(&self) -> usize {
        self.sequences.iter().filter(|s| s.matched).count()
    }

    pub fn all_matched(&self) -> bool {
        self.sequences.iter().all(|s| s.matched)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl fmt::Display for EvaluationReport {
    /// One line per sequence, newline-separated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.sequences.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}

/// Compares the per-timestep argmax of `predictions` and `targets`.
///
/// # Errors
/// - [`SeqLabelError::InvalidShape`] if the two tensors differ in shape
/// - [`SeqLabelError::FeatureMismatch`] if the feature axis is empty
pub fn evaluate<B: Backend>(
    predictions: &Tensor3D<B>,
    targets: &Tensor3D<B>,
) -> Result<EvaluationReport> {
    let shape = predictions.shape();
    if shape != targets.shape() {
        return Err(SeqLabelError::InvalidShape(format!(
            "predictions {} and targets {} differ",
            shape,
            targets.shape()
        )));
    }
    if shape.features == 0 {
        return Err(SeqLabelError::FeatureMismatch {
            expected: 1,
            got: 0,
        });
    }

    let p_flat = predictions.to_flat();
    let t_flat = targets.to_flat();
    let classes = |flat: &[f64], s: usize| -> Vec<usize> {
        flat[s * shape.timesteps * shape.features..(s + 1) * shape.timesteps * shape.features]
            .chunks(shape.features)
            .filter_map(argmax)
            .collect()
    };

    let sequences = (0..shape.batch)
        .map(|s| {
            let predictions = classes(&p_flat, s);
            let targets = classes(&t_flat, s);
            let matched = predictions == targets;
            SequenceReport {
                sequence: s,
                predictions,
                targets,
                matched,
            }
        })
        .collect();
    Ok(EvaluationReport { sequences })
}
