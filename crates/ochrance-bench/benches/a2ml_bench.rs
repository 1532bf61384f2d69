//! A2ML parse/serialize round-trip at a few document sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ochrance_a2ml::{lexer, parser, serialize};

fn document_with_n_audit_entries(n: usize) -> String {
    let mut source = String::from(
        "@manifest {\n  id: \"fs0\"\n  version: \"1\"\n  producer: \"ochrance\"\n  subsystem: \"fs0\"\n  produced_at: \"2026-07-28T00:00:00Z\"\n}\n",
    );
    source.push_str("@refs {\n  algorithm: sha256\n  merkle_root: #aabbccdd\n  block_count: 4\n  tree_depth: 2\n  leaf_size: 4096\n}\n");
    source.push_str("@audit {\n");
    for i in 0..n {
        source.push_str(&format!(
            "  entry{i} {{\n    timestamp: \"2026-07-28T00:00:00Z\"\n    action: \"verify\"\n    detail: \"ok\"\n  }}\n"
        ));
    }
    source.push_str("}\n");
    source
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("a2ml_parse");
    for n in [8usize, 128, 1_024] {
        let source = document_with_n_audit_entries(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &source, |b, source| {
            b.iter(|| {
                let tokens = lexer::tokenize(black_box(source)).unwrap();
                parser::parse(&tokens).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let source = document_with_n_audit_entries(256);
    let tokens = lexer::tokenize(&source).unwrap();
    let manifest = parser::parse(&tokens).unwrap();
    c.bench_function("a2ml_serialize_canonical", |b| {
        b.iter(|| serialize::serialize_canonical(black_box(&manifest)));
    });
}

criterion_group!(benches, bench_parse, bench_serialize);
criterion_main!(benches);
