//! Compare CPU backend vs ndarray backend training and inference time.
//!
//! Usage: backend_comparison [OUTPUT.json] (default: backend_comparison.json)

use benchmarks::{benchmark_with_warmup, time_fn, train_epochs, BenchmarkStats, Workload};
use seqlabel::{
    backend::{Backend, CpuBackend},
    evaluate::evaluate,
    model::InferenceModel,
};
use serde::Serialize;
use serde_json::json;
use std::fs::File;
use std::io::Write;

#[cfg(feature = "ndarray")]
use seqlabel::backend::NdarrayBackend;

const EPOCHS: usize = 50;
const PREDICT_RUNS: usize = 30;

#[derive(Debug, Serialize)]
struct BackendResult {
    backend: &'static str,
    workload: Workload,
    epochs: usize,
    train_ms: f64,
    train_ms_per_epoch: f64,
    predict: BenchmarkStats,
    matched_sequences: usize,
}

fn benchmark_backend<B: Backend>(
    name: &'static str,
    workload: Workload,
) -> seqlabel::Result<BackendResult> {
    let dataset = workload.dataset()?;
    let (x, y) = dataset.tensors::<B>()?;
    let model = workload.model::<B>()?;

    let (fitted, elapsed) = time_fn(|| train_epochs(model, &dataset, EPOCHS));
    let fitted = fitted?;
    let train_ms = elapsed.as_secs_f64() * 1000.0;

    let (_, predict) = benchmark_with_warmup(3, PREDICT_RUNS, || fitted.predict_batch(&x));
    let report = evaluate(&fitted.predict_batch(&x), &y)?;

    println!(
        "  {name:<8} {:<16} train {:>9.2} ms ({:.3} ms/epoch)  predict {:>7.3} ms",
        workload.label(),
        train_ms,
        train_ms / EPOCHS as f64,
        predict.mean_ms
    );

    Ok(BackendResult {
        backend: name,
        workload,
        epochs: EPOCHS,
        train_ms,
        train_ms_per_epoch: train_ms / EPOCHS as f64,
        predict,
        matched_sequences: report.matched_count(),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "backend_comparison.json".to_string());

    println!("=== Backend comparison ({EPOCHS} epochs) ===");
    let mut results = Vec::new();
    for workload in [Workload::SMALL, Workload::MEDIUM] {
        results.push(benchmark_backend::<CpuBackend>("cpu", workload)?);
        #[cfg(feature = "ndarray")]
        results.push(benchmark_backend::<NdarrayBackend>("ndarray", workload)?);
    }
    #[cfg(not(feature = "ndarray"))]
    println!("  (build with --features ndarray to include the ndarray backend)");

    let doc = json!({
        "benchmark": "backend_comparison",
        "results": results,
    });
    let mut file = File::create(&output)?;
    file.write_all(serde_json::to_string_pretty(&doc)?.as_bytes())?;
    println!("\nresults written to {output}");
    Ok(())
}
