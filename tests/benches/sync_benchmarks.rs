//! # Moderation Sync Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Envelope encode | < 1μs |
//! | Envelope decode + self-filter | < 1μs |
//! | Cached mute lookup (chat path) | < 5μs |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ms_01_synchronization::SynchronizationProtocol;
use ms_02_mute_cache::test_utils::{make_key, make_mute_for, ScriptedMuteQuery};
use ms_02_mute_cache::{MuteCache, MuteCacheConfig, OnDemandMuteCache};
use shared_types::{EnforcementMode, EnforcementOptions, PunishmentRef, PunishmentType};

// ============================================================================
// MS-01: Envelope codec
// ============================================================================

fn bench_envelope_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("ms-01-envelope");
    group.measurement_time(Duration::from_secs(5));

    let sender = SynchronizationProtocol::new();
    let receiver = SynchronizationProtocol::new();
    let reference = PunishmentRef {
        id: 42,
        kind: PunishmentType::Mute,
    };
    let options = EnforcementOptions::global().with_target_argument("griefer_42");

    group.bench_function("serialize_enforce", |b| {
        b.iter(|| {
            black_box(
                sender
                    .serialize(black_box(reference), EnforcementMode::Do, &options)
                    .ok(),
            )
        })
    });

    let Ok(message) = sender.serialize(reference, EnforcementMode::Do, &options) else {
        return;
    };
    group.bench_function("deserialize_foreign", |b| {
        b.iter(|| black_box(receiver.deserialize(message.clone()).ok()))
    });
    group.bench_function("deserialize_own", |b| {
        b.iter(|| black_box(sender.deserialize(message.clone()).ok()))
    });

    group.finish();
}

// ============================================================================
// MS-02: Chat path lookups
// ============================================================================

fn bench_cached_lookup(c: &mut Criterion) {
    let Ok(runtime) = tokio::runtime::Runtime::new() else {
        return;
    };
    let mut group = c.benchmark_group("ms-02-mute-cache");

    for size in [100usize, 10_000] {
        let query = Arc::new(ScriptedMuteQuery::new());
        let cache = Arc::new(OnDemandMuteCache::new(
            query.clone(),
            &MuteCacheConfig::default(),
        ));
        let keys: Vec<_> = (0..size).map(|_| make_key()).collect();
        runtime.block_on(async {
            for (id, key) in keys.iter().enumerate() {
                if id % 10 == 0 {
                    query.set(key.user, make_mute_for(id as i64, key, 0));
                }
                cache.get_cached_mute(*key).await;
            }
        });

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("on_demand_hit", size), &keys, |b, keys| {
            let mut next = 0usize;
            b.to_async(&runtime).iter(|| {
                next = (next + 1) % keys.len();
                let key = keys[next];
                let cache = cache.clone();
                async move { black_box(cache.get_cached_mute(key).await) }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_envelope_codec, bench_cached_lookup);
criterion_main!(benches);
