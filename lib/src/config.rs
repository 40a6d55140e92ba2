//! Hyperparameters for a pipeline run, loadable from JSON.

use crate::error::{Result, SeqLabelError};
use crate::model::DEFAULT_HIDDEN_UNITS;
use crate::optimizer::DEFAULT_LEARNING_RATE;
use crate::trainer::DEFAULT_MAX_EPOCHS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Run configuration.
///
/// Missing JSON fields take their defaults, so `{}` is a valid file:
///
/// ```
/// use seqlabel::config::PipelineConfig;
///
/// let cfg: PipelineConfig = serde_json::from_str(r#"{ "epochs": 50 }"#).unwrap();
/// assert_eq!(cfg.epochs, 50);
/// assert_eq!(cfg.hidden_units, 32);
/// assert_eq!(cfg.batch_size, None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub hidden_units: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    /// `None` trains on the whole dataset as one batch.
    pub batch_size: Option<usize>,
    /// Weight initialisation seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Log every epoch at `info` rather than `debug`.
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hidden_units: DEFAULT_HIDDEN_UNITS,
            epochs: DEFAULT_MAX_EPOCHS,
            learning_rate: DEFAULT_LEARNING_RATE,
            batch_size: None,
            seed: None,
            verbose: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// # Errors
    /// [`SeqLabelError::InvalidConfig`] for zero hidden units, a zero batch
    /// size, or a learning rate that is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if self.hidden_units == 0 {
            return Err(SeqLabelError::InvalidConfig(
                "hidden_units must be positive".into(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(SeqLabelError::InvalidConfig(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if self.batch_size == Some(0) {
            return Err(SeqLabelError::InvalidConfig(
                "batch_size must be positive".into(),
            ));
        }
        Ok(())
    }
}
