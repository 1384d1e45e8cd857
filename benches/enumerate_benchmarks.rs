//! Wall-clock benchmarks for the two operations whose cost is most visible
//! to a caller: a full enumeration pass and a single metadata probe.
//! `harness = false` per the `[[bench]]` entry in Cargo.toml, the shape
//! criterion's own `benches` examples use.

use criterion::{criterion_group, criterion_main, Criterion};
use fs_volumes::{enumerate_mount_points, get_volume_metadata, Options};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build benchmark runtime")
}

fn bench_enumerate(c: &mut Criterion) {
    let rt = runtime();
    let opts = Options::default();

    c.bench_function("enumerate_mount_points", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = enumerate_mount_points(&opts).await;
        });
    });
}

fn bench_metadata_for_first_mount(c: &mut Criterion) {
    let rt = runtime();
    let opts = Options::default();

    let first_mount = rt.block_on(async {
        enumerate_mount_points(&opts)
            .await
            .ok()
            .and_then(|mounts| mounts.into_iter().next())
            .map(|m| m.mount_point)
    });

    let Some(mount_point) = first_mount else {
        // No mounts visible in this environment (e.g. a minimal container);
        // nothing to benchmark.
        return;
    };

    c.bench_function("get_volume_metadata_first_mount", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = get_volume_metadata(&mount_point, &opts).await;
        });
    });
}

criterion_group!(benches, bench_enumerate, bench_metadata_for_first_mount);
criterion_main!(benches);
