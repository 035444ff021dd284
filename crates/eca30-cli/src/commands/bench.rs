use std::time::Instant;

use eca30_core::{grade_min_entropy, quick_quality};

use super::EngineOptions;

pub fn run(opts: &EngineOptions<'_>, n_bytes: usize) {
    let device = super::make_device(opts, false);
    let n_bytes = n_bytes.max(16);
    println!(
        "Benchmarking {n_bytes} bytes (block size {}B)...\n",
        device.block_size()
    );

    let t0 = Instant::now();
    let data = match device.read(n_bytes) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let elapsed = t0.elapsed().as_secs_f64();
    let rate = if elapsed > 0.0 {
        n_bytes as f64 / elapsed
    } else {
        f64::INFINITY
    };

    let report = quick_quality(&data);
    let status = device.status();

    println!("{}", "=".repeat(48));
    println!("  Throughput:       {:>10.1} KiB/s", rate / 1024.0);
    println!("  Generations:      {:>10}", status.stats.steps);
    println!("  Reseeds:          {:>10}", status.stats.reseeds);
    println!("{}", "-".repeat(48));
    println!(
        "  Shannon entropy:  {:>10.4} / 8.0 bits/byte",
        report.shannon_entropy
    );
    println!(
        "  Min-entropy H∞:   {:>10.4} / 8.0 bits/byte ({})",
        report.min_entropy,
        grade_min_entropy(report.min_entropy)
    );
    println!("  Compression:      {:>10.4}", report.compression_ratio);
    println!("  Unique values:    {:>10}", report.unique_values);
    println!("  Mean bit bias:    {:>10.5}", report.bit_bias.overall_bias);
    println!(
        "  Quality score:    {:>10.1} (grade {})",
        report.quality_score, report.grade
    );
    println!("{}", "=".repeat(48));
    if report.bit_bias.has_significant_bias {
        println!("\nWarning: at least one bit position deviates from 0.5 by more than 0.01.");
    }
}
