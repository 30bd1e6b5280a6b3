use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use keeper_domain::record::RecordKind;
use keeper_vault::Vault;

fn bench_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_decode");

    let vault = Vault::builder().derived_key("bench-secret", "bench-salt").unwrap().build().unwrap();

    let sizes = [("64B", 64usize), ("1KB", 1024), ("16KB", 16 * 1024)];

    for (label, size) in sizes {
        let text = "x".repeat(size);

        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encode_text", label), &text, |b, t| {
            b.iter(|| vault.encode(RecordKind::Text, &[t.as_str(), "meta"]).unwrap());
        });

        let envelope = vault.encode(RecordKind::Text, &[text.as_str(), "meta"]).unwrap();

        group.bench_with_input(BenchmarkId::new("decode_text", label), &envelope, |b, e| {
            b.iter(|| vault.decode(e).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode_decode);
criterion_main!(benches);
