//! Merkle construction at several leaf counts: construction is O(n), and
//! leaf-layer/first-internal-layer hashing parallelises for large n.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ochrance_merkle::MerkleTree;
use ochrance_oracle::{oracle, Digest, HashAlgorithm};

fn leaves(n: usize) -> Vec<Digest> {
    (0..n).map(|i| oracle(HashAlgorithm::Sha256, &i.to_le_bytes())).collect()
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_build");
    for n in [64usize, 1_024, 16_384, 65_536] {
        let ls = leaves(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &ls, |b, ls| {
            b.iter(|| MerkleTree::build(HashAlgorithm::Sha256, black_box(ls)));
        });
    }
    group.finish();
}

fn bench_proof_generation(c: &mut Criterion) {
    let ls = leaves(16_384);
    let tree = MerkleTree::build(HashAlgorithm::Sha256, &ls);
    c.bench_function("merkle_prove_single_leaf", |b| {
        b.iter(|| tree.prove(black_box(ls.len() / 2)));
    });
}

fn bench_proof_verification(c: &mut Criterion) {
    let ls = leaves(16_384);
    let tree = MerkleTree::build(HashAlgorithm::Sha256, &ls);
    let root = tree.root_digest();
    let proof = tree.prove(ls.len() / 2).unwrap();
    c.bench_function("merkle_verify_inclusion", |b| {
        b.iter(|| proof.verify(black_box(&root)));
    });
}

criterion_group!(benches, bench_construction, bench_proof_generation, bench_proof_verification);
criterion_main!(benches);
