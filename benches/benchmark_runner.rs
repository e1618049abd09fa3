/// Benchmark runner for container operations.
///
/// Times indexed writes, reads and a serialize/unserialize cycle at a few sizes.

extern crate arrayshim;

use arrayshim::runner::ds::array_object::{ArrayObject, ContainerFlags};
use arrayshim::runner::ds::value::HostValue;
use arrayshim::runner::plugin::types::HostContext;
use std::time::{Duration, Instant};

fn filled(size: i64) -> ArrayObject {
    let mut container = ArrayObject::new(HostValue::Null, ContainerFlags::empty(), None)
        .expect("empty container");
    for i in 0..size {
        container
            .offset_set(&HostValue::from(format!("k{}", i)), HostValue::Integer(i))
            .expect("offset_set");
    }
    container
}

fn run_writes(size: i64, iterations: u32) -> Duration {
    let start = Instant::now();
    for _ in 0..iterations {
        filled(size);
    }
    start.elapsed()
}

fn run_reads(size: i64, iterations: u32) -> Duration {
    let container = filled(size);
    let start = Instant::now();
    for _ in 0..iterations {
        for i in 0..size {
            let _ = container.offset_get(&HostValue::from(format!("k{}", i)));
        }
    }
    start.elapsed()
}

fn run_round_trip(size: i64, iterations: u32) -> Duration {
    let container = filled(size);
    let ctx = HostContext::new().shared();
    let start = Instant::now();
    for _ in 0..iterations {
        let payload = container.serialize().expect("serialize");
        ArrayObject::from_payload(ctx.clone(), &payload).expect("unserialize");
    }
    start.elapsed()
}

fn main() {
    println!("=======================================================");
    println!("  arrayshim - Container Benchmarks");
    println!("=======================================================\n");

    let sizes: Vec<(i64, u32)> = vec![(10, 10000), (100, 1000), (1000, 100), (10000, 10)];

    println!(
        "{:<12} {:>14} {:>14} {:>14}",
        "Entries", "Writes", "Reads", "Round trip"
    );
    println!("{}", "-".repeat(58));

    let mut total = Duration::ZERO;

    for (size, iterations) in &sizes {
        let writes = run_writes(*size, *iterations);
        let reads = run_reads(*size, *iterations);
        let round_trip = run_round_trip(*size, *iterations);
        total += writes + reads + round_trip;

        println!(
            "{:<12} {:>12.2?} {:>12.2?} {:>12.2?}",
            size, writes, reads, round_trip
        );
    }

    println!("{}", "-".repeat(58));
    println!("{:<12} {:>12.2?}", "TOTAL", total);

    println!("\n=======================================================");
    println!("  Correctness Verification");
    println!("=======================================================\n");

    for (size, _) in &sizes {
        let container = filled(*size);
        let payload = container.serialize().expect("serialize");
        let restored =
            ArrayObject::from_payload(container.context().clone(), &payload).expect("restore");
        let status = if restored.count() == container.count() { "✓" } else { "✗" };
        println!("{:<12} {:>4} {:>8} bytes", size, status, payload.len());
    }
}
