use benchmarks::{train_epochs, Workload};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use seqlabel::backend::CpuBackend;

fn bench_train_epoch(c: &mut Criterion) {
    let mut group = c.benchmark_group("train_epoch");
    group.sample_size(20);
    for workload in [Workload::SMALL, Workload::MEDIUM] {
        let dataset = workload.dataset().expect("dataset");
        group.bench_with_input(
            BenchmarkId::from_parameter(workload.label()),
            &dataset,
            |b, dataset| {
                b.iter_batched(
                    || workload.model::<CpuBackend>().expect("model"),
                    |model| black_box(train_epochs(model, dataset, 1).expect("fit")),
                    BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

#[cfg(feature = "ndarray")]
fn bench_train_epoch_ndarray(c: &mut Criterion) {
    use seqlabel::backend::NdarrayBackend;

    let workload = Workload::MEDIUM;
    let dataset = workload.dataset().expect("dataset");
    c.bench_function("train_epoch_ndarray", |b| {
        b.iter_batched(
            || workload.model::<NdarrayBackend>().expect("model"),
            |model| black_box(train_epochs(model, &dataset, 1).expect("fit")),
            BatchSize::SmallInput,
        )
    });
}

#[cfg(not(feature = "ndarray"))]
criterion_group!(benches, bench_train_epoch);
#[cfg(feature = "ndarray")]
criterion_group!(benches, bench_train_epoch, bench_train_epoch_ndarray);
criterion_main!(benches);
