// Entry point listing the available benchmarks

fn main() {
    println!("seqlabel benchmark suite");
    println!();
    println!("Usage:");
    println!("  cargo bench --package benchmarks");
    println!("  cargo bench --package benchmarks --bench <benchmark_name>");
    println!(
        "  cargo run --release --package benchmarks --bin backend_comparison [-- OUTPUT.json]"
    );
    println!();
    println!("Available benchmarks:");
    println!("  - forward: LSTM forward, backward and single-sequence prediction");
    println!("  - train_epoch: one full-batch Adam epoch per workload");
    println!();
    println!("Add --features ndarray to include the ndarray backend.");
}
