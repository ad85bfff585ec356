//! Criterion benchmarks for rust_logger_stackdriver

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_logger_stackdriver::notify::render_fields;
use rust_logger_stackdriver::prelude::*;
use rust_logger_stackdriver::stackdriver::Classifier;
use serde_json::json;

fn sink_logger() -> Logger {
    Logger::builder()
        .service("bench")
        .writer(std::io::sink())
        .build()
        .unwrap()
}

// ============================================================================
// Write Path Benchmarks
// ============================================================================

fn bench_write_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_path");
    group.throughput(Throughput::Elements(1));

    let logger = sink_logger();

    group.bench_function("info_no_fields", |b| {
        b.iter(|| {
            logger.info(black_box("Info message"), &[]);
        });
    });

    group.bench_function("info_with_fields", |b| {
        b.iter(|| {
            logger.info(
                black_box("Request handled"),
                &[
                    Field::string("path", "/invoices"),
                    Field::int("status", 200_i64),
                    Field::label("tenant", "acme"),
                ],
            );
        });
    });

    let scoped = logger
        .with(&[Field::user("alice"), Field::label("region", "eu")])
        .with(&[Field::string("request_id", "r-1")]);

    group.bench_function("scoped_logger", |b| {
        b.iter(|| {
            scoped.warn(black_box("Slow query"), &[Field::int("ms", 420_i64)]);
        });
    });

    group.bench_function("filtered_level", |b| {
        let quiet = Logger::builder()
            .min_level(LogLevel::Error)
            .writer(std::io::sink())
            .build()
            .unwrap();
        b.iter(|| {
            quiet.debug(black_box("Filtered"), &[]);
        });
    });

    group.finish();
}

// ============================================================================
// Classifier Benchmarks
// ============================================================================

fn bench_classifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");

    let context = ContextInfo::from_cloud_trace_header("105445aa7843bc8bf206b120001000/123;o=1")
        .unwrap_or_default();
    let fields = vec![
        Field::label("a", "1"),
        Field::label("b", "2"),
        Field::context(&context),
        Field::user("alice"),
        Field::string("plain", "value"),
        Field::stack_trace("at main"),
    ];

    group.bench_function("classify_mixed", |b| {
        let classifier = Classifier::new("https://hook").with_project_id("my-project");
        b.iter(|| black_box(classifier.classify(black_box(&fields), Some("message"))));
    });

    group.finish();
}

// ============================================================================
// Rendering Benchmarks
// ============================================================================

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    let fields = vec![
        Field::string("error", "connection refused"),
        Field::int("attempt", 3_i64),
        Field::float("ratio", 0.75_f64),
        Field::object("request", &json!({"method": "POST", "path": "/pay", "status": 502})),
        Field::duration("elapsed", std::time::Duration::from_millis(1500)),
    ];

    group.bench_function("render_fields", |b| {
        b.iter(|| black_box(render_fields(black_box(&fields))));
    });

    group.finish();
}

criterion_group!(benches, bench_write_path, bench_classifier, bench_render);
criterion_main!(benches);
