//! Benchmarks for token issuance and verification hot paths

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rinpass_core::{constant_time_eq, HmacKey, TokenService};
use rinpass_types::Rin;

const SECRET: &str = "bench-signing-secret-0123456789abcdef";

fn bench_hmac_sign(c: &mut Criterion) {
    let key = HmacKey::new(SECRET).unwrap();
    let mut group = c.benchmark_group("hmac_sign");

    for size in [32, 128, 512] {
        let data: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| key.sign(black_box(data)));
        });
    }

    group.finish();
}

fn bench_token(c: &mut Criterion) {
    let service = TokenService::new(SECRET).unwrap();
    let rin = Rin::parse("A1234567").unwrap();
    let ttl = Duration::from_secs(24 * 3600);
    let token = service.issue(&rin, ttl).unwrap().token;

    let mut group = c.benchmark_group("token");

    group.bench_function("issue", |b| {
        b.iter(|| service.issue(black_box(&rin), ttl));
    });

    group.bench_function("verify_valid", |b| {
        b.iter(|| service.verify(black_box(&token)));
    });

    let forged = format!("{}A", &token[..token.len() - 1]);
    group.bench_function("verify_bad_signature", |b| {
        b.iter(|| service.verify(black_box(&forged)));
    });

    group.bench_function("verify_malformed", |b| {
        b.iter(|| service.verify(black_box("not.a")));
    });

    group.finish();
}

fn bench_constant_time_eq(c: &mut Criterion) {
    let a = [0x5au8; 43];
    let mut b = a;
    b[0] ^= 0xff;

    let mut group = c.benchmark_group("constant_time_eq");
    group.bench_function("equal", |bench| {
        bench.iter(|| constant_time_eq(black_box(&a), black_box(&a)));
    });
    group.bench_function("diff_start", |bench| {
        bench.iter(|| constant_time_eq(black_box(&a), black_box(&b)));
    });
    group.finish();
}

criterion_group!(benches, bench_hmac_sign, bench_token, bench_constant_time_eq);
criterion_main!(benches);
