use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sal_store::{LoadOptions, parse_embeddings};

/// 10k lines of 100-dimensional vectors.
fn embedding_text() -> String {
    let mut text = String::new();
    for i in 0..10_000 {
        text.push_str(&format!("word{i}"));
        for d in 0..100 {
            let value = ((i * 31 + d * 7) % 1000) as f32 / 1000.0 - 0.5;
            text.push_str(&format!(" {value:.4}"));
        }
        text.push('\n');
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let text = embedding_text();
    c.bench_function("parse_10k_x100", |b| {
        b.iter(|| parse_embeddings(black_box(&text), LoadOptions::default()))
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
