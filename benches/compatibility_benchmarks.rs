//! Compatibility Check Benchmarks
//!
//! The gate runs on every admin request, so version comparison, requirement
//! checks and notice rendering sit on a hot path.

use criterion::{criterion_group, criterion_main, Criterion, BenchmarkId, Throughput};
use std::hint::black_box;

use envgate::gate::{
    compare, CompatibilityChecker, EnvironmentSnapshot, NoticeQueue, PluginManifest, Severity,
};
use envgate::gate::notice::sanitize_message;

/// Benchmark raw version comparison across segment counts
fn bench_version_compare(c: &mut Criterion) {
    let pairs = vec![
        ("short", "7.4", "7.0"),
        ("patch", "8.1.27", "8.1.3"),
        ("suffixed", "6.4.2-beta1", "6.4.2"),
        ("long", "1.2.3.4.5.6.7.8", "1.2.3.4.5.6.7.9"),
    ];

    let mut group = c.benchmark_group("version_compare");
    for (label, actual, required) in pairs {
        group.bench_with_input(
            BenchmarkId::new("compare", label),
            &(actual, required),
            |b, &(actual, required)| {
                b.iter(|| compare(black_box(Some(actual)), black_box(required)))
            },
        );
    }
    group.finish();
}

/// Benchmark a full requirement check for compatible and outdated environments
fn bench_compatibility_check(c: &mut Criterion) {
    let checker = CompatibilityChecker::new(PluginManifest::default().requirements());
    let environments = vec![
        ("compatible", EnvironmentSnapshot::new("8.2", "6.4.1", Some("8.5.1"))),
        ("outdated", EnvironmentSnapshot::new("5.6", "4.9", Some("3.6"))),
        ("missing_platform", EnvironmentSnapshot::new("8.2", "6.4.1", None)),
    ];

    let mut group = c.benchmark_group("compatibility_check");
    for (label, environment) in &environments {
        group.bench_with_input(BenchmarkId::new("check", label), environment, |b, environment| {
            b.iter(|| checker.check(black_box(environment)))
        });
    }
    group.finish();
}

/// Benchmark notice queue rendering, including link sanitization
fn bench_notice_rendering(c: &mut Criterion) {
    let message = "Plugin requires WordPress version 5.2 or higher. \
                   Please <a href=\"https://example.test/wp-admin/update-core.php\">update WordPress »</a>";

    c.bench_function("sanitize_message", |b| {
        b.iter(|| sanitize_message(black_box(message)))
    });

    let counts = vec![1, 3, 10];
    let mut group = c.benchmark_group("notice_queue_render");
    for count in counts {
        let mut queue = NoticeQueue::new();
        for i in 0..count {
            queue.enqueue(format!("notice_{}", i), Severity::Error, message);
        }

        group
            .throughput(Throughput::Elements(count as u64))
            .bench_with_input(BenchmarkId::new("render", count), &queue, |b, queue| {
                b.iter(|| queue.render())
            });
    }
    group.finish();
}

criterion_group!(
    compatibility_benches,
    bench_version_compare,
    bench_compatibility_check,
    bench_notice_rendering
);

criterion_main!(compatibility_benches);
