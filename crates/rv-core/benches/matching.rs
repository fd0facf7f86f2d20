use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rv_core::Matcher;

fn whitelist(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("^https://site{i}\\.example\\.com/"))
        .collect()
}

fn bench_compile(c: &mut Criterion) {
    let patterns = whitelist(50);
    c.bench_function("compile_50_patterns", |b| {
        b.iter(|| Matcher::compile(black_box(&patterns)))
    });
}

fn bench_match(c: &mut Criterion) {
    let matcher = Matcher::compile(&whitelist(50));
    c.bench_function("match_hit", |b| {
        b.iter(|| matcher.is_match(black_box("https://site25.example.com/deep/path?q=1")))
    });
    c.bench_function("match_miss", |b| {
        b.iter(|| matcher.is_match(black_box("https://unrelated.example.net/deep/path")))
    });
}

criterion_group!(benches, bench_compile, bench_match);
criterion_main!(benches);
