// Build and query benchmarks over a synthetic contract corpus
use contractsim::{Encoder, HashingEncoder, IndexBuilder, ModelArtifact};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const IDENTIFIERS: &[&str] = &[
    "balance", "owner", "amount", "deposit", "withdraw", "transfer", "allowance", "supply",
    "reserve", "price", "vault", "shares", "mint", "burn", "stake", "reward",
];

fn generate_contract(rng: &mut impl Rng, id: usize) -> String {
    let mut code = format!("// generated contract {}\ncontract C{} {{\n", id, id);
    for _ in 0..rng.random_range(3..12) {
        let name = IDENTIFIERS[rng.random_range(0..IDENTIFIERS.len())];
        let arg = IDENTIFIERS[rng.random_range(0..IDENTIFIERS.len())];
        code.push_str(&format!(
            "    /* {} */\n    function {}(uint {}) public {{ {} += {}; }}\n",
            rng.random::<u32>(),
            name,
            arg,
            name,
            arg
        ));
    }
    code.push_str("}\n");
    code
}

fn write_corpus(root: &Path, size: usize) {
    let mut rng = StdRng::seed_from_u64(42);
    for i in 0..size {
        let dir = root.join(format!("category_{}", i % 8));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("C{}.sol", i)), generate_contract(&mut rng, i)).unwrap();
    }
}

fn encoder() -> Arc<dyn Encoder> {
    Arc::new(HashingEncoder::default())
}

fn build_artifact(root: &Path) -> ModelArtifact {
    IndexBuilder::new(encoder()).build(root).unwrap()
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(10);

    for size in [100, 1000].iter() {
        let dir = TempDir::new().unwrap();
        write_corpus(dir.path(), *size);

        group.bench_with_input(BenchmarkId::new("contractsim", size), size, |b, _| {
            b.iter(|| black_box(build_artifact(dir.path())));
        });
    }

    group.finish();
}

fn benchmark_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    for size in [100, 1000, 5000].iter() {
        let dir = TempDir::new().unwrap();
        write_corpus(dir.path(), *size);
        let artifact = build_artifact(dir.path());
        let mut rng = StdRng::seed_from_u64(7);
        let query = generate_contract(&mut rng, usize::MAX);

        group.bench_with_input(BenchmarkId::new("contractsim", size), size, |b, _| {
            b.iter(|| black_box(artifact.query(&query, 5).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_normalize(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let code: String = (0..50).map(|i| generate_contract(&mut rng, i)).collect();

    c.bench_function("normalize", |b| {
        b.iter(|| black_box(contractsim::normalize(&code)));
    });
}

criterion_group!(benches, benchmark_build, benchmark_query, benchmark_normalize);
criterion_main!(benches);
