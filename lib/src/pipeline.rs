//! End-to-end flow: load → reshape → build → train → predict → evaluate.
//!
//! Each stage is a separate function so callers (the binary, benchmarks) can
//! interleave their own output; [`run`] chains all of them.

use crate::backend::{Backend, Tensor3D};
use crate::config::PipelineConfig;
use crate::dataset::{InMemoryDataset, SequenceSource};
use crate::error::{Result, SeqLabelError};
use crate::evaluate::{evaluate, EvaluationReport};
use crate::loss::MSELoss;
use crate::model::{
    Fitted, InferenceModel, LstmConfig, LstmModel, LstmParams, ModelSummary, Unfitted,
};
use crate::optimizer::Adam;
use crate::trainer::{History, Trainer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

/// Everything a pipeline run produces besides the model itself.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub summary: ModelSummary,
    pub history: History,
    pub report: EvaluationReport,
}

/// Validates a source and reshapes both sequences into tensors.
pub fn load_tensors<B: Backend>(source: &SequenceSource) -> Result<(Tensor3D<B>, Tensor3D<B>)> {
    let tensors = source.to_tensors()?;
    debug!(
        input = %source.input_shape,
        target = %source.target_shape,
        "dataset loaded"
    );
    Ok(tensors)
}

/// Builds an untrained model sized for `source`.
///
/// Uses `config.seed` when set, OS entropy otherwise.
pub fn build_model<B: Backend>(
    source: &SequenceSource,
    config: &PipelineConfig,
) -> Result<LstmModel<B, Unfitted>> {
    config.validate()?;
    source.validate()?;
    let model_config = LstmConfig::for_shapes(source.input_shape, source.target_shape)
        .with_hidden_units(config.hidden_units);
    match config.seed {
        Some(seed) => LstmModel::with_seed(model_config, seed),
        None => LstmModel::new(model_config, &mut StdRng::from_entropy()),
    }
}

/// Fits `model` with MSE and Adam for `config.epochs` epochs.
pub fn train<B: Backend>(
    model: LstmModel<B, Unfitted>,
    dataset: &InMemoryDataset,
    config: &PipelineConfig,
) -> Result<(LstmModel<B, Fitted>, History)> {
    config.validate()?;
    let trainer: Trainer<B, MSELoss, Adam<B, LstmParams<B>>, LstmModel<B, Unfitted>, _> =
        Trainer::builder(MSELoss, Adam::new(config.learning_rate))
            .batch_size(config.batch_size)
            .max_epochs(config.epochs)
            .verbose(config.verbose)
            .build();
    let (fitted, history) = trainer.fit_with_history(model, dataset)?;
    if let Some(loss) = history.final_loss() {
        info!(epochs = history.epochs(), loss, "training finished");
    }
    Ok((fitted, history))
}

/// Predicts on `input` and compares against `target`.
///
/// # Errors
/// [`SeqLabelError::FeatureMismatch`] if `input` does not have the width the
/// model was built for, plus any [`evaluate`] error.
pub fn predict_and_evaluate<B: Backend>(
    model: &LstmModel<B, Fitted>,
    input: &Tensor3D<B>,
    target: &Tensor3D<B>,
) -> Result<(Tensor3D<B>, EvaluationReport)> {
    let expected = model.config().input_features;
    let got = input.shape().features;
    if got != expected {
        return Err(SeqLabelError::FeatureMismatch { expected, got });
    }
    let predictions = model.predict_batch(input);
    let report = evaluate(&predictions, target)?;
    info!(
        matched = report.matched_count(),
        sequences = report.len(),
        "evaluation finished"
    );
    Ok((predictions, report))
}

/// Runs every stage on `source`.
///
/// # Example
/// ```
/// use seqlabel::backend::CpuBackend;
/// use seqlabel::config::PipelineConfig;
/// use seqlabel::dataset::PermutationTask;
/// use seqlabel::pipeline;
///
/// let config = PipelineConfig { epochs: 2, seed: Some(1), verbose: false, ..Default::default() };
/// let source = PermutationTask::default().source();
/// let outcome = pipeline::run::<CpuBackend>(source, &config).unwrap();
/// assert_eq!(outcome.history.epochs(), 2);
/// assert_eq!(outcome.report.len(), 5);
/// ```
pub fn run<B: Backend>(source: SequenceSource, config: &PipelineConfig) -> Result<PipelineOutcome> {
    let model = build_model::<B>(&source, config)?;
    let summary = model.summary();
    let dataset = InMemoryDataset::from_source(source)?;
    let (input, target) = dataset.tensors::<B>()?;
    let (fitted, history) = train(model, &dataset, config)?;
    let (_, report) = predict_and_evaluate(&fitted, &input, &target)?;
    Ok(PipelineOutcome {
        summary,
        history,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CpuBackend, Shape3};
    use crate::dataset::PermutationTask;

    fn quick_config() -> PipelineConfig {
        PipelineConfig {
            hidden_units: 4,
            epochs: 3,
            seed: Some(9),
            verbose: false,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_build_model_sizes_from_source() {
        let source = PermutationTask::new(2, 4, 3).unwrap().source();
        let model = build_model::<CpuBackend>(&source, &quick_config()).unwrap();
        let c = model.config();
        assert_eq!((c.timesteps, c.input_features, c.output_features), (4, 3, 3));
        assert_eq!(c.hidden_units, 4);
    }

    #[test]
    fn test_build_model_is_seeded() {
        use crate::model::TrainableModel;
        let source = PermutationTask::default().source();
        let a = build_model::<CpuBackend>(&source, &quick_config()).unwrap();
        let b = build_model::<CpuBackend>(&source, &quick_config()).unwrap();
        assert_eq!(a.params().to_flat(), b.params().to_flat());
    }

    #[test]
    fn test_load_tensors_rejects_mismatch() {
        let mut source = PermutationTask::default().source();
        source.target_seq.pop();
        assert!(matches!(
            load_tensors::<CpuBackend>(&source),
            Err(SeqLabelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let source = PermutationTask::new(2, 3, 3).unwrap().source();
        let model = build_model::<CpuBackend>(&source, &quick_config()).unwrap();
        let dataset = source.into_dataset().unwrap();
        let (fitted, _) = train(model, &dataset, &quick_config()).unwrap();

        let wide = Tensor3D::<CpuBackend>::zeros(Shape3::new(2, 3, 4));
        let target = Tensor3D::<CpuBackend>::zeros(Shape3::new(2, 3, 3));
        assert!(matches!(
            predict_and_evaluate(&fitted, &wide, &target),
            Err(SeqLabelError::FeatureMismatch {
                expected: 3,
                got: 4
            })
        ));
    }

    #[test]
    fn test_run_reports_every_sequence() {
        let source = PermutationTask::new(4, 3, 5).unwrap().source();
        let outcome = run::<CpuBackend>(source, &quick_config()).unwrap();
        assert_eq!(outcome.history.epochs(), 3);
        assert_eq!(outcome.report.len(), 4);
        assert_eq!(outcome.summary.total_params(), 4 * (4 * (5 + 4) + 4) + (4 * 5 + 5));
    }

    #[test]
    fn test_run_rejects_invalid_config() {
        let config = PipelineConfig {
            hidden_units: 0,
            ..quick_config()
        };
        assert!(matches!(
            run::<CpuBackend>(PermutationTask::default().source(), &config),
            Err(SeqLabelError::InvalidConfig(_))
        ));
    }
}
