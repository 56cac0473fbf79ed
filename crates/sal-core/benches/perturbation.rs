use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sal_core::{EmbeddingTable, pairwise_importance, run_as, run_eas};

const DIM: usize = 300;

/// Vocabulary `w0..wN` with random vectors, plus a sentence using all of it.
fn fixture(words: usize) -> (EmbeddingTable, String) {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut table = EmbeddingTable::new();
    let mut sentence = Vec::with_capacity(words);
    for i in 0..words {
        let key = format!("w{i}");
        let vector: Vec<f32> = (0..DIM).map(|_| rng.random_range(-1.0..1.0)).collect();
        table.insert(key.clone(), vector).unwrap();
        sentence.push(key);
    }
    (table, sentence.join(" "))
}

fn bench_as(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_as");
    for words in [10, 50, 200] {
        let (table, text) = fixture(words);
        group.bench_with_input(BenchmarkId::from_parameter(words), &text, |b, text| {
            b.iter(|| run_as(black_box(text), &table, 3).unwrap())
        });
    }
    group.finish();
}

fn bench_eas(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_eas");
    for words in [10, 50, 200] {
        let (table, text) = fixture(words);
        group.bench_with_input(BenchmarkId::from_parameter(words), &text, |b, text| {
            b.iter(|| run_eas(black_box(text), &table).unwrap())
        });
    }
    group.finish();
}

fn bench_pairwise(c: &mut Criterion) {
    let (table, text) = fixture(50);
    c.bench_function("pairwise_50", |b| {
        b.iter(|| pairwise_importance(black_box(&text), &table).unwrap())
    });
}

criterion_group!(benches, bench_as, bench_eas, bench_pairwise);
criterion_main!(benches);
