//! Dataset sources: the four arrays a sequence-labelling dataset consists of.
//!
//! Two on-disk formats are understood:
//!
//! - **Module format**, one Python-style assignment per line:
//!
//!   ```text
//!   X_shape = [2,1,2]
//!   X_seq = [1.0,0.0,0.0,1.0]
//!   y_shape = [2,1,2]
//!   y_seq = [0.0,1.0,1.0,0.0]
//!   ```
//!
//!   `#` comments and blank lines are skipped, unknown names are ignored and a
//!   list may continue over several lines until its closing `]`.
//! - **JSON**, an object with the same four keys.

use crate::backend::{Backend, Shape3, Tensor3D};
use crate::dataset::InMemoryDataset;
use crate::error::{Result, SeqLabelError};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

const INPUT_SHAPE: &str = "X_shape";
const INPUT_SEQ: &str = "X_seq";
const TARGET_SHAPE: &str = "y_shape";
const TARGET_SEQ: &str = "y_seq";

/// Shapes and flat row-major values of the input and target tensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceSource {
    #[serde(rename = "X_shape")]
    pub input_shape: Shape3,
    #[serde(rename = "X_seq")]
    pub input_seq: Vec<f64>,
    #[serde(rename = "y_shape")]
    pub target_shape: Shape3,
    #[serde(rename = "y_seq")]
    pub target_seq: Vec<f64>,
}

impl SequenceSource {
    pub fn new(
        input_shape: Shape3,
        input_seq: Vec<f64>,
        target_shape: Shape3,
        target_seq: Vec<f64>,
    ) -> Self {
        Self {
            input_shape,
            input_seq,
            target_shape,
            target_seq,
        }
    }

    /// Parses the module format.
    ///
    /// # Errors
    /// [`SeqLabelError::Parse`] for malformed lines or values,
    /// [`SeqLabelError::MissingField`] when one of the four names is absent.
    ///
    /// # Example
    /// ```
    /// use seqlabel::backend::Shape3;
    /// use seqlabel::dataset::SequenceSource;
    ///
    /// let src = SequenceSource::parse_module(
    ///     "X_shape = [1,1,2]\nX_seq = [0,1]\ny_shape = [1,1,1]\ny_seq = [1]\n",
    /// )
    /// .unwrap();
    /// assert_eq!(src.input_shape, Shape3::new(1, 1, 2));
    /// assert_eq!(src.target_seq, vec![1.0]);
    /// ```
    pub fn parse_module(text: &str) -> Result<Self> {
        let mut input_shape = None;
        let mut input_seq = None;
        let mut target_shape = None;
        let mut target_seq = None;

        for stmt in statements(text)? {
            let Statement { line, name, body } = stmt;
            match name.as_str() {
                INPUT_SHAPE => input_shape = Some(parse_shape(&body, line)?),
                INPUT_SEQ => input_seq = Some(parse_values(&body, line)?),
                TARGET_SHAPE => target_shape = Some(parse_shape(&body, line)?),
                TARGET_SEQ => target_seq = Some(parse_values(&body, line)?),
                other => debug!(line, name = other, "ignoring unknown assignment"),
            }
        }

        let source = Self {
            input_shape: input_shape.ok_or(SeqLabelError::MissingField(INPUT_SHAPE))?,
            input_seq: input_seq.ok_or(SeqLabelError::MissingField(INPUT_SEQ))?,
            target_shape: target_shape.ok_or(SeqLabelError::MissingField(TARGET_SHAPE))?,
            target_seq: target_seq.ok_or(SeqLabelError::MissingField(TARGET_SEQ))?,
        };
        debug!(
            input_shape = %source.input_shape,
            target_shape = %source.target_shape,
            "parsed dataset module"
        );
        Ok(source)
    }

    /// Writes the module format read by [`SequenceSource::parse_module`].
    pub fn to_module_string(&self) -> String {
        let mut out = String::new();
        let shape = |s: Shape3| format!("[{},{},{}]", s.batch, s.timesteps, s.features);
        let values = |v: &[f64]| {
            v.iter()
                .map(|x| format!("{x:?}"))
                .collect::<Vec<_>>()
                .join(",")
        };
        // writing to a String cannot fail
        let _ = writeln!(out, "{INPUT_SHAPE} = {}", shape(self.input_shape));
        let _ = writeln!(out, "{INPUT_SEQ} = [{}]", values(&self.input_seq));
        let _ = writeln!(out, "{TARGET_SHAPE} = {}", shape(self.target_shape));
        let _ = writeln!(out, "{TARGET_SEQ} = [{}]", values(&self.target_seq));
        out
    }

    /// Parses the JSON format.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a dataset file: JSON when the extension is `.json`, the module
    /// format otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        debug!(path = %path.display(), json = is_json, "reading dataset");
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::parse_module(&text)
        }
    }

    /// Checks that each sequence fills its shape exactly and that input and
    /// target agree on batch size and timestep count.
    pub fn validate(&self) -> Result<()> {
        for (shape, seq) in [
            (self.input_shape, &self.input_seq),
            (self.target_shape, &self.target_seq),
        ] {
            if seq.len() != shape.num_elements() {
                return Err(SeqLabelError::ShapeMismatch {
                    shape,
                    expected: shape.num_elements(),
                    got: seq.len(),
                });
            }
        }
        if self.input_shape.batch != self.target_shape.batch {
            return Err(SeqLabelError::BatchMismatch {
                input: self.input_shape.batch,
                target: self.target_shape.batch,
            });
        }
        if self.input_shape.timesteps != self.target_shape.timesteps {
            return Err(SeqLabelError::TimestepMismatch {
                input: self.input_shape.timesteps,
                target: self.target_shape.timesteps,
            });
        }
        Ok(())
    }

    /// Validates and reshapes both sequences into `(input, target)` tensors.
    pub fn to_tensors<B: Backend>(&self) -> Result<(Tensor3D<B>, Tensor3D<B>)> {
        self.validate()?;
        Ok((
            Tensor3D::from_flat(&self.input_seq, self.input_shape)?,
            Tensor3D::from_flat(&self.target_seq, self.target_shape)?,
        ))
    }

    /// Validates and wraps the arrays as a trainable dataset.
    pub fn into_dataset(self) -> Result<InMemoryDataset> {
        InMemoryDataset::from_source(self)
    }
}

struct Statement {
    line: usize,
    name: String,
    body: String,
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(code, _)| code).trim()
}

/// Splits module text into `name = [...]` statements, joining continuation
/// lines of unterminated lists.
fn statements(text: &str) -> Result<Vec<Statement>> {
    let mut out = Vec::new();
    let mut pending: Option<Statement> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let code = strip_comment(raw);
        if code.is_empty() {
            continue;
        }

        if let Some(stmt) = pending.as_mut() {
            stmt.body.push_str(code);
            if code.contains(']') {
                out.extend(pending.take());
            }
            continue;
        }

        if matches!(code.split_whitespace().next(), Some("import" | "from")) {
            debug!(line = line_no, "skipping import");
            continue;
        }

        let (name, body) = code.split_once('=').ok_or_else(|| SeqLabelError::Parse {
            line: line_no,
            message: format!("expected `name = [...]`, found `{code}`"),
        })?;
        let name = name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(SeqLabelError::Parse {
                line: line_no,
                message: format!("invalid name `{name}`"),
            });
        }
        let stmt = Statement {
            line: line_no,
            name: name.to_string(),
            body: body.trim().to_string(),
        };
        if stmt.body.starts_with('[') && !stmt.body.contains(']') {
            pending = Some(stmt);
        } else {
            out.push(stmt);
        }
    }

    if let Some(stmt) = pending {
        return Err(SeqLabelError::Parse {
            line: stmt.line,
            message: format!("unterminated list for `{}`", stmt.name),
        });
    }
    Ok(out)
}

fn list_items(body: &str, line: usize) -> Result<Vec<&str>> {
    let inner = body
        .strip_prefix('[')
        .and_then(|b| b.strip_suffix(']'))
        .ok_or_else(|| SeqLabelError::Parse {
            line,
            message: format!("expected a `[...]` list, found `{body}`"),
        })?;
    let items: Vec<&str> = inner.split(',').map(str::trim).collect();
    // `[]` and a trailing comma are both accepted
    Ok(match items.as_slice() {
        [""] => Vec::new(),
        [rest @ .., ""] => rest.to_vec(),
        _ => items,
    })
}

fn parse_values(body: &str, line: usize) -> Result<Vec<f64>> {
    list_items(body, line)?
        .into_iter()
        .map(|item| {
            item.parse::<f64>().map_err(|_| SeqLabelError::Parse {
                line,
                message: format!("invalid number `{item}`"),
            })
        })
        .collect()
}

fn parse_shape(body: &str, line: usize) -> Result<Shape3> {
    let dims = list_items(body, line)?
        .into_iter()
        .map(|item| {
            item.parse::<usize>().map_err(|_| SeqLabelError::Parse {
                line,
                message: format!("invalid dimension `{item}`"),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Shape3::from_dims(&dims).map_err(|e| SeqLabelError::Parse {
        line,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    const SMALL: &str = "\
# exported dataset
X_shape = [2,1,2]
X_seq = [1.0,0.0,0.0,1.0]

y_shape = [2,1,3]
y_seq = [0.0,0.0,1.0,1.0,0.0,0.0]
";

    fn small() -> SequenceSource {
        SequenceSource::parse_module(SMALL).unwrap()
    }

    #[test]
    fn test_parse_module() {
        let src = small();
        assert_eq!(src.input_shape, Shape3::new(2, 1, 2));
        assert_eq!(src.input_seq, vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(src.target_shape, Shape3::new(2, 1, 3));
        assert_eq!(src.target_seq.len(), 6);
        assert!(src.validate().is_ok());
    }

    #[test]
    fn test_parse_module_tolerates_layout_variations() {
        let text = "\
print(X_seq)
";
        // a bare statement without `=` is rejected
        assert!(matches!(
            SequenceSource::parse_module(text),
            Err(SeqLabelError::Parse { line: 1, .. })
        ));

        let text = "\
import numpy as np
from math import pi  # unused
n_neurons = 32
X_shape = [ 1, 2, 1 ]   # trailing comment
X_seq = [1,
         2,]
y_shape = [1,2,1]
y_seq = [-1.5e0, 2]
";
        let src = SequenceSource::parse_module(text).unwrap();
        assert_eq!(src.input_shape, Shape3::new(1, 2, 1));
        assert_eq!(src.input_seq, vec![1.0, 2.0]);
        assert_eq!(src.target_seq, vec![-1.5, 2.0]);
    }

    #[test]
    fn test_parse_module_errors() {
        let missing = "X_shape = [1,1,1]\nX_seq = [1]\ny_shape = [1,1,1]\n";
        assert!(matches!(
            SequenceSource::parse_module(missing),
            Err(SeqLabelError::MissingField("y_seq"))
        ));

        let bad_number = "X_shape = [1,1,1]\nX_seq = [one]\n";
        match SequenceSource::parse_module(bad_number) {
            Err(SeqLabelError::Parse { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("one"));
            }
            other => panic!("unexpected: {other:?}"),
        }

        let bad_rank = "X_shape = [1,1]\n";
        assert!(matches!(
            SequenceSource::parse_module(bad_rank),
            Err(SeqLabelError::Parse { line: 1, .. })
        ));

        let unterminated = "X_seq = [1,\n2,\n";
        assert!(matches!(
            SequenceSource::parse_module(unterminated),
            Err(SeqLabelError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_module_string_round_trip() {
        let src = SequenceSource::new(
            Shape3::new(1, 2, 2),
            vec![0.25, 1.0, 0.0, -3.5],
            Shape3::new(1, 2, 1),
            vec![1.0, 0.0],
        );
        let text = src.to_module_string();
        assert!(text.starts_with("X_shape = [1,2,2]\nX_seq = [0.25,1.0,0.0,-3.5]\n"));
        assert_eq!(SequenceSource::parse_module(&text).unwrap(), src);
    }

    #[test]
    fn test_json_format() {
        let json = r#"{
            "X_shape": [2, 1, 2],
            "X_seq": [1, 0, 0, 1],
            "y_shape": [2, 1, 3],
            "y_seq": [0, 0, 1, 1, 0, 0]
        }"#;
        let src = SequenceSource::from_json_str(json).unwrap();
        assert_eq!(src, small());
        let again = SequenceSource::from_json_str(&src.to_json_string().unwrap()).unwrap();
        assert_eq!(again, src);

        assert!(matches!(
            SequenceSource::from_json_str("{\"X_shape\": [1,1,1]}"),
            Err(SeqLabelError::Json(_))
        ));
    }

    #[test]
    fn test_validate_reports_each_mismatch() {
        let mut src = small();
        src.input_seq.pop();
        assert!(matches!(
            src.validate(),
            Err(SeqLabelError::ShapeMismatch {
                expected: 4,
                got: 3,
                ..
            })
        ));

        let mut src = small();
        src.target_seq.push(0.0);
        assert!(matches!(
            src.validate(),
            Err(SeqLabelError::ShapeMismatch { expected: 6, got: 7, .. })
        ));

        let src = SequenceSource::new(
            Shape3::new(2, 1, 1),
            vec![0.0; 2],
            Shape3::new(1, 1, 1),
            vec![0.0],
        );
        assert!(matches!(
            src.validate(),
            Err(SeqLabelError::BatchMismatch { input: 2, target: 1 })
        ));

        let src = SequenceSource::new(
            Shape3::new(1, 2, 1),
            vec![0.0; 2],
            Shape3::new(1, 3, 1),
            vec![0.0; 3],
        );
        assert!(matches!(
            src.validate(),
            Err(SeqLabelError::TimestepMismatch { input: 2, target: 3 })
        ));
    }

    #[test]
    fn test_to_tensors() {
        let (x, y) = small().to_tensors::<CpuBackend>().unwrap();
        assert_eq!(x.shape(), Shape3::new(2, 1, 2));
        assert_eq!(y.shape(), Shape3::new(2, 1, 3));
        assert_eq!(y.feature_vector(1, 0), Some(vec![1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_from_path_selects_format() {
        let dir = std::env::temp_dir().join(format!("seqlabel-source-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let module_path = dir.join("dataset.py");
        std::fs::write(&module_path, SMALL).unwrap();
        assert_eq!(SequenceSource::from_path(&module_path).unwrap(), small());

        let json_path = dir.join("dataset.JSON");
        std::fs::write(&json_path, small().to_json_string().unwrap()).unwrap();
        assert_eq!(SequenceSource::from_path(&json_path).unwrap(), small());

        assert!(matches!(
            SequenceSource::from_path(dir.join("absent.py")),
            Err(SeqLabelError::Io(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
