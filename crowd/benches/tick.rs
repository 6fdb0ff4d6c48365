use common::shapes::GridRect;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use crowd::{Agent, Config, Model, Strategy, Waypoint};
use heatmap::HeatmapConfig;
use rand::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

const AGENTS: usize = 4_000;

fn scenario() -> (Vec<Agent>, Vec<Arc<Waypoint>>) {
    let area = GridRect::sized(200, 120);
    let mut rng = StdRng::seed_from_u64(7);
    let waypoints: Vec<Arc<Waypoint>> = (0..16)
        .map(|_| {
            let center = area.get_random_cell_inside(8, &mut rng);
            Waypoint::shared(center.x as f64, center.y as f64, 3.0)
        })
        .collect();

    let mut used = HashSet::new();
    let mut agents = Vec::with_capacity(AGENTS);
    while agents.len() < AGENTS {
        let pos = area.get_random_cell_inside(0, &mut rng);
        if used.insert(pos) {
            let first = rng.gen_range(0..waypoints.len());
            let second = rng.gen_range(0..waypoints.len());
            agents.push(
                Agent::new(pos.x, pos.y)
                    .with_waypoints([waypoints[first].clone(), waypoints[second].clone()]),
            );
        }
    }
    (agents, waypoints)
}

fn tick_benchmark(c: &mut Criterion) {
    let config = Config {
        grid: GridRect::sized(256, 256),
        heatmap: HeatmapConfig {
            size: 256,
            ..HeatmapConfig::default()
        },
        ..Config::default()
    };

    let mut group = c.benchmark_group("tick");
    for strategy in Strategy::ALL {
        group.bench_function(strategy.name(), |b| {
            b.iter_batched(
                || {
                    let (agents, waypoints) = scenario();
                    Model::setup_with_config(agents, waypoints, strategy, config).unwrap()
                },
                |mut model| model.tick(),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(crowd_benchmarks, tick_benchmark);
criterion_main!(crowd_benchmarks);
