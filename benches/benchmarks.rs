//! Performance benchmarks for the Chaos Mesh SDK
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chaosmesh_sdk::{
    ChaosConfig, ChaosExperiment, ChaosMode, ChaosSelector, DelayParams, NetworkDirection,
};

/// Benchmark CRD compilation for selectors of growing size
fn bench_crd_compilation(c: &mut Criterion) {
    let config = ChaosConfig::default();
    let mut group = c.benchmark_group("crd_compilation");

    for label_count in [1, 10, 50].iter() {
        let labels: Vec<(String, String)> = (0..*label_count)
            .map(|i| (format!("label-{}", i), format!("value-{}", i)))
            .collect();

        let selector = ChaosSelector::from_labels(labels).unwrap();
        let experiment = ChaosExperiment::container_kill(
            selector,
            vec!["nginx".to_string(), "sidecar".to_string()],
            Some(10),
        )
        .name("bench-container-kill")
        .mode(ChaosMode::Fixed)
        .value("2")
        .duration("5m")
        .build()
        .unwrap();

        group.throughput(Throughput::Elements(*label_count as u64));
        group.bench_with_input(
            BenchmarkId::new("pod_chaos", label_count),
            &experiment,
            |b, experiment| {
                b.iter(|| black_box(experiment).to_crd(&config));
            },
        );
    }

    group.finish();
}

/// Benchmark compilation and YAML rendering of a partition experiment
fn bench_partition_manifest(c: &mut Criterion) {
    let config = ChaosConfig::default();

    let selector = ChaosSelector::from_labels([("app", "web")]).unwrap();
    let target = ChaosSelector::from_labels([("app", "database")]).unwrap();
    let experiment = ChaosExperiment::network_partition(selector, target, NetworkDirection::Both)
        .name("bench-partition")
        .build()
        .unwrap();

    c.bench_function("partition_to_crd", |b| {
        b.iter(|| black_box(&experiment).to_crd(&config));
    });

    c.bench_function("partition_to_yaml", |b| {
        b.iter(|| black_box(&experiment).to_yaml(&config).unwrap());
    });
}

/// Benchmark experiment validation (build path)
fn bench_experiment_build(c: &mut Criterion) {
    c.bench_function("network_delay_build", |b| {
        b.iter(|| {
            let selector = ChaosSelector::from_labels([("app", "api")]).unwrap();
            ChaosExperiment::network_delay(selector, DelayParams::new("100ms"))
                .name("bench-delay")
                .duration("60s")
                .build()
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_crd_compilation,
    bench_partition_manifest,
    bench_experiment_build
);
criterion_main!(benches);
