use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use upool::{Config, Pool};

fn pool_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool insert");

    for load_factor in [0.5, 0.75, 1.0] {
        group.bench_function(format!("new blob (max load factor {load_factor})"), |b| {
            let mut pool = Config::new()
                .max_load_factor(load_factor)
                .build()
                .unwrap();

            b.iter(|| {
                let blob = nanoid::nanoid!();
                pool.insert(blob.as_bytes()).unwrap()
            });
        });
    }

    group.bench_function("duplicate blob", |b| {
        let mut pool = Pool::new(1_024).unwrap();
        pool.insert("asset chunk").unwrap();

        b.iter(|| pool.insert("asset chunk").unwrap());
    });

    group.bench_function("10k blobs from empty pool", |b| {
        let blobs = (0..10_000).map(|_| nanoid::nanoid!()).collect::<Vec<_>>();

        b.iter_batched(
            || Pool::new(0).unwrap(),
            |mut pool| pool.insert_all(&blobs).unwrap(),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn pool_lookup(c: &mut Criterion) {
    for item_count in [100, 10_000, 1_000_000] {
        let mut pool = Pool::new(0).unwrap();

        let blobs = (0..item_count)
            .map(|_| nanoid::nanoid!())
            .collect::<Vec<_>>();

        pool.insert_all(&blobs).unwrap();

        let mut rng = rand::rng();

        c.bench_function(&format!("pool lookup, hit ({item_count} blobs)"), |b| {
            b.iter(|| {
                use rand::seq::IndexedRandom;

                let sample = blobs.choose(&mut rng).unwrap();
                assert!(pool.lookup(sample).is_some());
            });
        });

        c.bench_function(&format!("pool lookup, miss ({item_count} blobs)"), |b| {
            b.iter(|| {
                let blob = nanoid::nanoid!();
                assert!(pool.lookup(blob.as_bytes()).is_none());
            });
        });
    }
}

criterion_group!(benches, pool_insert, pool_lookup);
criterion_main!(benches);
