// Run with: cargo bench --bench bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crypto_hashes::{merkle_root, Hash, HashAlgo};

fn create_test_hash(value: u8) -> Hash {
    Hash::from_bytes([value; 32])
}

fn bench_header_digests(c: &mut Criterion) {
    let header = [7u8; 80];
    let mut group = c.benchmark_group("header_digest");
    for algo in [HashAlgo::Sha256d, HashAlgo::Sha256, HashAlgo::Keccak256] {
        group.bench_with_input(BenchmarkId::new("digest", format!("{:?}", algo)), &algo, |b, algo| {
            b.iter(|| algo.digest(black_box(&header)));
        });
    }
    group.finish();
}

fn bench_merkle_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_root");
    for count in [1usize, 16, 256, 2048] {
        let leaves: Vec<Hash> = (0..count).map(|i| create_test_hash(i as u8)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &leaves, |b, leaves| {
            b.iter(|| merkle_root(HashAlgo::Sha256d, black_box(leaves)));
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .sample_size(50)
        .warm_up_time(std::time::Duration::from_secs(1));
    targets = bench_header_digests, bench_merkle_root
);

criterion_main!(benches);
