//! Model-output extraction benchmarks
//!
//! Measures the per-request string work that sits between a successful
//! upstream call and the JSON response (excludes network calls).
//!
//! ## Expected Performance Characteristics
//!
//! - Fence stripping: Tens of nanoseconds (substring scan, no allocation)
//! - Report extraction: Single-digit microseconds (serde_json parse of a small object)
//! - Fallback lookup: Sub-microsecond plus the clone of a three-entry table
//! - Config parsing: Single-digit microseconds (one-time startup cost)
//!
//! **Note**: Actual measurements vary with compiler version, CPU architecture,
//! and system load. Run `cargo bench` to measure on your system.

use agrovisor::config::Config;
use agrovisor::fallback;
use agrovisor::inference::{disease_report, recommendations, strip_fences};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const CLEAN_REPORT: &str = r#"{"disease": "Early Blight", "confidence": 88, "severity": "moderate", "treatment": "Remove affected leaves and apply copper-based fungicide.", "preventionTips": ["Water at the base", "Rotate crops yearly", "Mulch around stems"]}"#;

const RECOMMENDATION_LIST: &str = r#"[
    {"name": "Wheat", "score": 90, "reason": "Primary crop with excellent yields"},
    {"name": "Rice", "score": 87, "reason": "Complementary crop for rotation"},
    {"name": "Maize", "score": 82, "reason": "Growing popularity in the region"}
]"#;

/// Benchmark fence stripping across the response shapes the model emits
///
/// Measures the scan that locates a ```json fence and trims to its payload.
fn bench_strip_fences(c: &mut Criterion) {
    let fenced = format!("```json\n{CLEAN_REPORT}\n```");
    let fenced_with_prose = format!(
        "Here is the analysis you asked for.\n\n```json\n{CLEAN_REPORT}\n```\n\nLet me know if you need more detail."
    );
    let inputs = vec![
        ("bare", CLEAN_REPORT.to_string()),
        ("fenced", fenced),
        ("fenced_with_prose", fenced_with_prose),
    ];

    let mut group = c.benchmark_group("strip_fences");

    for (name, input) in inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, raw| {
            b.iter(|| strip_fences(raw));
        });
    }

    group.finish();
}

/// Benchmark full report extraction (fence strip plus serde parse)
fn bench_disease_report(c: &mut Criterion) {
    let fenced = format!("```json\n{CLEAN_REPORT}\n```");
    let inputs = vec![("bare", CLEAN_REPORT.to_string()), ("fenced", fenced)];

    let mut group = c.benchmark_group("disease_report");

    for (name, input) in inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, raw| {
            b.iter(|| disease_report(raw));
        });
    }

    group.finish();
}

/// Benchmark recommendation extraction including the entry-count check
fn bench_recommendations(c: &mut Criterion) {
    c.bench_function("recommendations", |b| {
        b.iter(|| recommendations(RECOMMENDATION_LIST));
    });
}

/// Benchmark the regional fallback table lookup
///
/// This path runs on every degraded request, so it stays allocation-light.
fn bench_fallback_lookup(c: &mut Criterion) {
    let states = vec![("known", "Punjab"), ("unknown", "Atlantis")];

    let mut group = c.benchmark_group("fallback_lookup");

    for (name, state) in states {
        group.bench_with_input(BenchmarkId::from_parameter(name), &state, |b, s| {
            b.iter(|| fallback::recommendations(s));
        });
    }

    group.finish();
}

/// Benchmark configuration parsing and validation
///
/// This operation is called ONCE during server startup, so even 10ms is
/// acceptable. Typical range: single-digit microseconds.
fn bench_config_parsing(c: &mut Criterion) {
    let toml_str = r#"
[server]
host = "127.0.0.1"
port = 3000

[upstream]
model = "gemini-2.5-flash"
base_url = "https://generativelanguage.googleapis.com"
request_timeout_seconds = 30

[retry]
max_attempts = 5
initial_delay_ms = 2000

[observability]
log_level = "info"
"#;

    c.bench_function("config_parsing", |b| {
        b.iter(|| {
            let config: Config = toml::from_str(toml_str).unwrap();
            config
        });
    });
}

criterion_group!(
    benches,
    bench_strip_fences,
    bench_disease_report,
    bench_recommendations,
    bench_fallback_lookup,
    bench_config_parsing,
);
criterion_main!(benches);
