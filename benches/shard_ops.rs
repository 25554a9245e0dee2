use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shardmeta_rs::{ManagerConfig, ShardManager};

fn manager() -> Arc<ShardManager> {
    let config = ManagerConfig::new()
        .with_pgs(1..=8)
        .with_collect_metrics(false);
    Arc::new(ShardManager::new(config).expect("valid config"))
}

fn bench_create(c: &mut Criterion) {
    let manager = manager();
    let mut pg = 0u16;

    c.bench_function("create_shard", |b| {
        b.iter(|| {
            pg = pg % 8 + 1;
            black_box(manager.create_shard(pg, 4096).expect("registered pg"))
        })
    });
}

fn bench_reads(c: &mut Criterion) {
    let manager = manager();
    for pg in 1..=8 {
        for _ in 0..128 {
            manager.create_shard(pg, 0).expect("registered pg");
        }
    }

    c.bench_function("get_shard", |b| {
        let mut id = 0u64;
        b.iter(|| {
            id = id % 1024 + 1;
            black_box(manager.get_shard(id).expect("existing shard"))
        })
    });

    c.bench_function("list_shards_128", |b| {
        b.iter(|| black_box(manager.list_shards(3).expect("registered pg")))
    });
}

criterion_group!(benches, bench_create, bench_reads);
criterion_main!(benches);
