use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use webcore::accept::parse_header;
use webcore::{Accept, AcceptCache, AcceptKind};

fn parse_simple_benchmark(c: &mut Criterion) {
    c.bench_function("accept_parse_simple", |b| {
        b.iter(|| {
            let raw = black_box("text/html");
            let _ = parse_header(raw, AcceptKind::Mime);
        });
    });
}

fn parse_browser_header_benchmark(c: &mut Criterion) {
    let raw = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

    c.bench_function("accept_parse_browser", |b| {
        b.iter(|| {
            let _ = parse_header(black_box(raw), AcceptKind::Mime);
        });
    });
}

fn accepts_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("accept_accepts");

    let accept = Accept::from_header(
        "text/html;q=0.9,application/json;q=0.8,application/*;q=0.5,*/*;q=0.1",
        AcceptKind::Mime,
    );

    let queries = [
        ("exact_hit", "text/html"),
        ("wildcard_hit", "application/pdf"),
        ("full_wildcard", "image/png"),
    ];

    for (name, value) in queries.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), value, |b, value| {
            b.iter(|| {
                let _ = accept.accepts(black_box(value));
            });
        });
    }

    group.finish();
}

fn best_of_benchmark(c: &mut Criterion) {
    let accept = Accept::from_header(
        "text/html;q=0.9,text/plain;q=0.9,application/*;q=0.7",
        AcceptKind::Mime,
    );
    let candidates = ["foo/bar", "application/bar", "text/plain", "text/html"];

    c.bench_function("accept_best_of", |b| {
        b.iter(|| {
            let _ = accept.best_of(black_box(&candidates));
        });
    });
}

fn cached_vs_uncached_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("accept_cache");
    let raw = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

    group.bench_function("uncached", |b| {
        b.iter(|| {
            let _ = parse_header(black_box(raw), AcceptKind::Mime);
        });
    });

    group.bench_function("cached", |b| {
        let mut cache = AcceptCache::from_capacity(8);
        cache.push(raw, AcceptKind::Mime, parse_header(raw, AcceptKind::Mime));
        b.iter(|| {
            let _ = cache.find(black_box(raw), AcceptKind::Mime);
        });
    });

    group.finish();
}

fn language_canonicalization_benchmark(c: &mut Criterion) {
    c.bench_function("accept_parse_language", |b| {
        b.iter(|| {
            let raw = black_box("zh_hans_cn,en_us;q=0.8,en;q=0.5,*;q=0.1");
            let _ = parse_header(raw, AcceptKind::Language);
        });
    });
}

criterion_group!(
    benches,
    parse_simple_benchmark,
    parse_browser_header_benchmark,
    accepts_benchmark,
    best_of_benchmark,
    cached_vs_uncached_benchmark,
    language_canonicalization_benchmark
);
criterion_main!(benches);
