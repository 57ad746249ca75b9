// Index build benchmarks: windowed numeric scan vs full scan, string measures
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use matchdep::prelude::*;
use rand::prelude::*;

fn random_ints(n: usize, range: i64) -> EncodedColumn {
    let mut rng = rand::rng();
    let values: Vec<Value> = (0..n).map(|_| Value::Int(rng.random_range(0..range))).collect();
    EncodedColumn::encode(ValueType::Int, values).unwrap()
}

fn random_names(n: usize) -> EncodedColumn {
    const SYLLABLES: [&str; 8] = ["an", "be", "ka", "lo", "mi", "ra", "to", "vi"];
    let mut rng = rand::rng();
    let values: Vec<Value> = (0..n)
        .map(|_| {
            let len = rng.random_range(2..5);
            let name: String = (0..len).map(|_| SYLLABLES[rng.random_range(0..SYLLABLES.len())]).collect();
            Value::String(name)
        })
        .collect();
    EncodedColumn::encode(ValueType::String, values).unwrap()
}

fn benchmark_numeric(c: &mut Criterion) {
    let mut group = c.benchmark_group("numeric_index");
    let measure = SimilarityMeasure::numeric(ValueType::Int, Normalization::Fixed { scale: 1000.0 }).unwrap();
    // A custom distance scores the same way but cannot be windowed
    let full_scan = SimilarityMeasure::distance(
        "abs",
        ValueType::Int,
        Normalization::Fixed { scale: 1000.0 },
        |a, b| Ok((a.as_f64().unwrap_or(0.0) - b.as_f64().unwrap_or(0.0)).abs()),
    )
    .unwrap();

    for size in [1_000, 10_000].iter() {
        let left = random_ints(*size, 100_000);
        let right = random_ints(*size, 100_000);

        group.bench_with_input(BenchmarkId::new("windowed", size), size, |b, _| {
            let pair = ColumnPair::new(&left, &right, &measure);
            b.iter(|| black_box(IndexBuilder::new(0.95, true).build(&pair).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("full_scan", size), size, |b, _| {
            let pair = ColumnPair::new(&left, &right, &full_scan);
            b.iter(|| black_box(IndexBuilder::new(0.95, true).build(&pair).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_index");
    let left = random_names(2_000);
    let right = random_names(2_000);

    for kind in [MeasureKind::Levenshtein, MeasureKind::JaroWinkler, MeasureKind::Trigram] {
        let measure = SimilarityMeasure::new(kind, ValueType::String).unwrap();
        let pair = ColumnPair::new(&left, &right, &measure);
        group.bench_function(kind.as_str(), |b| {
            b.iter(|| black_box(IndexBuilder::new(0.8, true).build(&pair).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_rethreshold(c: &mut Criterion) {
    let left = random_ints(10_000, 100_000);
    let right = random_ints(10_000, 100_000);
    let measure = SimilarityMeasure::numeric(ValueType::Int, Normalization::Fixed { scale: 1000.0 }).unwrap();
    let index = IndexBuilder::new(0.9, true)
        .build(&ColumnPair::new(&left, &right, &measure))
        .unwrap();

    c.bench_function("rethreshold_0.99", |b| {
        b.iter(|| black_box(index.rethreshold(0.99).unwrap()));
    });
}

criterion_group!(benches, benchmark_numeric, benchmark_strings, benchmark_rethreshold);
criterion_main!(benches);
