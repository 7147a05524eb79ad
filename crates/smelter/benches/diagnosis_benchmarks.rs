//! Ingestion, diagnosis and remediation benchmarks.
//!
//! Measures each stage on synthetic catalogs of increasing size.

use std::fs;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use smelter::store::{Dataset, LoadOptions};
use smelter::{DiagnosticEngine, DuplicateResolver, Remediation, RemediationEngine, normalize_barcode};
use tempfile::TempDir;

/// Generate a catalog CSV where roughly one row in five has a problem in
/// each field.
fn generate_catalog(rows: usize) -> String {
    let mut data = String::from(
        "search_ref,manufacturer_ref,name,brand,ncm,barcode,gross_weight,net_weight,width,height,depth\n",
    );

    for row in 0..rows {
        let bad = row % 5 == 0;
        let search_ref = if bad { format!("r-{}", row) } else { format!("REF{:06}", row) };
        let manufacturer_ref = if bad { "M 1".to_string() } else { format!("MFR-{:04}", row % 1000) };
        let name = if bad { "widget" } else { "WIDGET" };
        let brand = if bad { "123" } else { "ACME" };
        let ncm = if bad { "8471.30-12" } else { "84713012" };
        let barcode = if bad {
            format!("{:012}", row)
        } else {
            format!("{:012}0", row)
        };
        let (gross, net) = if bad { ("1.0", "2.0") } else { ("2.5", "2.0") };
        let width = if bad { "0" } else { "10" };

        data.push_str(&format!(
            "{search_ref},{manufacturer_ref},{name},{brand},{ncm},{barcode},{gross},{net},{width},20,30\n"
        ));
    }

    data
}

/// Load `content` into a fresh store inside `dir`.
fn loaded_dataset(dir: &TempDir, content: &str) -> Dataset {
    let source = dir.path().join("upload.csv");
    fs::write(&source, content).unwrap();
    let dataset = Dataset::open(dir.path().join("bench.sqlite"));
    dataset.load(&source, &LoadOptions::default()).unwrap();
    dataset
}

/// Benchmark loading catalogs of various sizes.
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_catalog(*rows);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter_with_setup(
                || TempDir::new().unwrap(),
                |dir| black_box(loaded_dataset(&dir, data)),
            )
        });
    }

    group.finish();
}

/// Benchmark the full diagnostic battery.
fn bench_diagnose(c: &mut Criterion) {
    let mut group = c.benchmark_group("diagnose");
    let engine = DiagnosticEngine::new();

    for rows in [100, 1_000, 10_000].iter() {
        let dir = TempDir::new().unwrap();
        let dataset = loaded_dataset(&dir, &generate_catalog(*rows));

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &dataset, |b, dataset| {
            b.iter(|| black_box(engine.diagnose(dataset).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark remediations that rewrite values through store functions.
fn bench_remediate(c: &mut Criterion) {
    let mut group = c.benchmark_group("remediate");
    let engine = RemediationEngine::new();
    let data = generate_catalog(1_000);

    for remediation in [Remediation::Barcode, Remediation::Codes, Remediation::Uppercase] {
        group.bench_function(remediation.name(), |b| {
            b.iter_with_setup(
                || {
                    let dir = TempDir::new().unwrap();
                    let dataset = loaded_dataset(&dir, &data);
                    (dir, dataset)
                },
                |(_dir, dataset)| black_box(engine.apply(&dataset, remediation).unwrap()),
            )
        });
    }

    group.finish();
}

/// Benchmark duplicate analysis.
fn bench_duplicates(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let mut data = generate_catalog(1_000);
    // Repeat the body so every key appears twice.
    let body: String = data.lines().skip(1).map(|l| format!("{l}\n")).collect();
    data.push_str(&body);
    let dataset = loaded_dataset(&dir, &data);
    let resolver = DuplicateResolver::new();

    c.bench_function("duplicates_analyze", |b| {
        b.iter(|| black_box(resolver.analyze(&dataset).unwrap()))
    });
}

/// Benchmark barcode normalization on its own.
fn bench_normalize_barcode(c: &mut Criterion) {
    let inputs = ["123456789012", "1234567890128", "12-3456-7890-12", "abc", "7.89"];

    c.bench_function("normalize_barcode", |b| {
        b.iter(|| {
            for input in inputs.iter() {
                black_box(normalize_barcode(black_box(*input)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_load,
    bench_diagnose,
    bench_remediate,
    bench_duplicates,
    bench_normalize_barcode
);
criterion_main!(benches);
