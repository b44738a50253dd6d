use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sim_core::{CelestialBody, Colony, Orbit, Resources};

fn orbit(rng: &mut ChaCha8Rng) -> Orbit {
    let r: f64 = rng.gen_range(0.5..12.0);
    Orbit::circular(r, rng.gen_range(0.0..360.0), 365.25 * r.powf(1.5))
}

fn build_layout(n_colonies: usize, n_sites: usize) -> (Vec<Colony>, Vec<CelestialBody>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let colonies = (0..n_colonies)
        .map(|i| {
            let demand = Resources::new(
                rng.gen_range(10.0..200.0),
                rng.gen_range(10.0..200.0),
                rng.gen_range(10.0..200.0),
                rng.gen_range(10.0..200.0),
            );
            Colony {
                body: CelestialBody::new(format!("c{i}"), format!("Colony {i}"), orbit(&mut rng)),
                population: rng.gen_range(500..20_000),
                demand,
                inventory: demand,
                satisfaction: 75.0,
            }
        })
        .collect();
    let sites = (0..n_sites)
        .map(|i| CelestialBody::new(format!("s{i}"), format!("Site {i}"), orbit(&mut rng)))
        .collect();
    (colonies, sites)
}

fn bench_p_median(c: &mut Criterion) {
    let (colonies, sites) = build_layout(60, 40);
    let matrix = sim_ai::DistanceMatrix::build(&colonies, &sites);
    let weights: Vec<f64> = colonies.iter().map(|c| c.demand.total()).collect();
    c.bench_function("p-median 60 colonies x 40 sites, p=5", |b| {
        b.iter(|| {
            black_box(sim_ai::p_median_with(
                &matrix,
                &weights,
                5,
                sim_ai::DEFAULT_MAX_ITERATIONS,
                sim_ai::SeedStrategy::GreedyMedian,
            ))
        })
    });
    c.bench_function("greedy coverage 60 x 40 within 1.5 AU", |b| {
        b.iter(|| black_box(sim_ai::greedy_coverage(&matrix, 10, 1.5)))
    });
}

criterion_group!(benches, bench_p_median);
criterion_main!(benches);
