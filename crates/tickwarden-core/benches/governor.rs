use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tickwarden_core::generation::ColonyConfig;
use tickwarden_core::prelude::*;

fn colony(regions: u32) -> ColonyConfig {
    ColonyConfig {
        regions,
        wild_animals: 300,
        ..ColonyConfig::default()
    }
}

fn bench_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_step");
    group.sample_size(30);

    for regions in [1_u32, 4] {
        for (label, enabled) in [("governed", true), ("ungoverned", false)] {
            let mut settings = GovernorSettings::default();
            settings.wildlife.enabled = enabled;
            settings.prisoners.enabled = enabled;
            settings.turrets.enabled = enabled;
            settings.plants.enabled = enabled;

            group.bench_function(format!("{label}_regions{regions}_2000_ticks"), |b| {
                b.iter_batched(
                    || {
                        let mut session = GovernorSession::new(settings.clone(), 0xBEEF);
                        let _ = session.generate(&colony(regions));
                        // Warm the registries past the first full pass.
                        let _ = session.run(300);
                        session
                    },
                    |mut session| session.run(2_000),
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_steps);
criterion_main!(benches);
