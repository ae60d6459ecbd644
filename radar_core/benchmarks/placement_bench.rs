use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use radar_core::{place, RadarConfig};
use radar_schema::{Category, Impact, MarketItem};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn items(count: usize) -> Vec<MarketItem> {
    (0..count)
        .map(|index| {
            let category = Category::ALL[index % Category::ALL.len()];
            let impact = Impact::ALL[index % Impact::ALL.len()];
            MarketItem::new(index as i64 + 1, format!("signal {index}"), category, impact)
        })
        .collect()
}

fn bench_placement(c: &mut Criterion) {
    let config = RadarConfig::default();
    let mut group = c.benchmark_group("placement");

    for size in [25usize, 250, 2_500] {
        let input = items(size);
        group.bench_with_input(BenchmarkId::new("items", size), &input, |b, input| {
            b.iter_batched(
                || ChaCha8Rng::seed_from_u64(config.seed),
                |mut rng| place(input, &config, &mut rng),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(placement_benches, bench_placement);
criterion_main!(placement_benches);
