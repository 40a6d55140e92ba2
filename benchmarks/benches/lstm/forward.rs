use benchmarks::Workload;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use seqlabel::{
    backend::{CpuBackend, Tensor2D},
    loss::{Loss, MSELoss},
    model::{InferenceModel, TrainableModel},
};

fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("lstm_forward");
    for workload in [Workload::SMALL, Workload::MEDIUM, Workload::LARGE] {
        let model = workload.model::<CpuBackend>().expect("model");
        let (x, _) = workload.tensors::<CpuBackend>().expect("tensors");
        group.bench_with_input(
            BenchmarkId::from_parameter(workload.label()),
            &x,
            |b, x| b.iter(|| black_box(model.forward(black_box(x)))),
        );
    }
    group.finish();
}

fn bench_backward(c: &mut Criterion) {
    let mut group = c.benchmark_group("lstm_backward");
    for workload in [Workload::SMALL, Workload::MEDIUM] {
        let model = workload.model::<CpuBackend>().expect("model");
        let (x, y) = workload.tensors::<CpuBackend>().expect("tensors");
        let pred = model.forward(&x);
        let grad = Loss::<CpuBackend>::grad_wrt_prediction(&MSELoss, &pred, &y);
        group.bench_with_input(
            BenchmarkId::from_parameter(workload.label()),
            &(x, grad),
            |b, (x, grad)| b.iter(|| black_box(model.backward(black_box(x), black_box(grad)))),
        );
    }
    group.finish();
}

fn bench_predict_single(c: &mut Criterion) {
    let workload = Workload::SMALL;
    let fitted = workload.model::<CpuBackend>().expect("model").into_fitted();
    let (x, _) = workload.tensors::<CpuBackend>().expect("tensors");
    let rows: Vec<f64> = (0..workload.timesteps)
        .flat_map(|t| x.feature_vector(0, t).unwrap_or_default())
        .collect();
    let sequence = Tensor2D::<CpuBackend>::from_f64(rows, workload.timesteps, workload.classes);

    c.bench_function("lstm_predict_single", |b| {
        b.iter(|| black_box(fitted.predict(black_box(&sequence))))
    });
}

criterion_group!(benches, bench_forward, bench_backward, bench_predict_single);
criterion_main!(benches);
