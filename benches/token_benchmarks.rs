use std::hint::black_box;
use std::time::Duration;

use authkeep::auth::{CredentialHasher, TokenCodec, UserRole};
use criterion::{criterion_group, criterion_main, Criterion};

fn codec() -> TokenCodec {
    TokenCodec::new(
        b"bench-secret",
        Duration::from_secs(900),
        Duration::from_secs(3600),
        32,
    )
}

fn bench_access_tokens(c: &mut Criterion) {
    let codec = codec();

    c.bench_function("issue_access", |b| {
        b.iter(|| codec.issue_access(black_box("user-id"), UserRole::User, 30))
    });

    let token = codec.issue_access("user-id", UserRole::User, 30).unwrap();
    c.bench_function("parse_access", |b| {
        b.iter(|| codec.parse_access(black_box(&token)))
    });

    c.bench_function("parse_access_garbage", |b| {
        b.iter(|| codec.parse_access(black_box("not.a.token")))
    });
}

fn bench_refresh_tokens(c: &mut Criterion) {
    let codec = codec();

    c.bench_function("issue_refresh", |b| b.iter(|| codec.issue_refresh()));
}

fn bench_refresh_hashing(c: &mut Criterion) {
    let hasher = CredentialHasher::new(4);
    let token = codec().issue_refresh().unwrap();
    let hashed = hasher.hash(&token).unwrap();

    let mut group = c.benchmark_group("bcrypt_cost_4");
    group.sample_size(20);
    group.bench_function("hash", |b| b.iter(|| hasher.hash(black_box(&token))));
    group.bench_function("verify", |b| {
        b.iter(|| hasher.verify(black_box(&hashed), black_box(&token)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_access_tokens,
    bench_refresh_tokens,
    bench_refresh_hashing
);
criterion_main!(benches);
