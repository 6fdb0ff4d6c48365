use anyhow::{ensure, Context, Result};
use clap::Parser;
use common::shapes::{GridPos, GridRect};
use crowd::{AcceleratorKind, Agent, Config, Model, Strategy, TickStats, Waypoint};
use heatmap::HeatmapConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

const REFERENCE: Strategy = Strategy::SequentialCollision;

#[derive(Parser)]
#[command(name = "crowd-bench")]
#[command(about = "Times crowd tick strategies against the sequential collision reference")]
struct Cli {
    /// Number of agents in the synthetic scenario
    #[arg(short, long, default_value_t = 10_000)]
    agents: usize,

    /// Number of shared waypoints
    #[arg(long, default_value_t = 24)]
    waypoints: usize,

    /// Ticks measured per strategy
    #[arg(short, long, default_value_t = 200)]
    ticks: usize,

    /// Scenario seed
    #[arg(long, default_value_t = 36207250)]
    seed: u64,

    /// Worker threads for the parallel strategies
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Side of the square occupancy grid
    #[arg(long, default_value_t = 1024)]
    grid: u32,

    /// Comma separated strategy names or name fragments
    #[arg(short, long)]
    filter: Option<String>,

    /// Accelerator backend: host or gpu
    #[arg(long, default_value = "host")]
    accelerator: AcceleratorKind,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

struct BenchResult {
    strategy: Strategy,
    elapsed: Duration,
    ticks: usize,
    totals: TickStats,
    checked: bool,
}

impl BenchResult {
    fn ticks_per_second(&self) -> f64 {
        self.ticks as f64 / self.elapsed.as_secs_f64().max(f64::EPSILON)
    }
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Agents on distinct cells of `area`, each cycling through two or three of
/// the shared waypoints.
fn generate_scenario(
    seed: u64,
    area: GridRect,
    agents: usize,
    waypoints: usize,
) -> Result<(Vec<Agent>, Vec<Arc<Waypoint>>)> {
    ensure!(
        agents <= area.area(),
        "{} agents do not fit on a {}x{} grid",
        agents,
        area.width,
        area.height
    );
    ensure!(waypoints > 0, "at least one waypoint is needed");

    let mut rng = StdRng::seed_from_u64(seed);
    let shared: Vec<Arc<Waypoint>> = (0..waypoints)
        .map(|_| {
            let center = area.get_random_cell_inside(area.width.min(area.height) / 10, &mut rng);
            let radius = rng.gen_range(2.0..6.0);
            Waypoint::shared(center.x as f64, center.y as f64, radius)
        })
        .collect();

    let mut used = HashSet::with_capacity(agents);
    let mut population = Vec::with_capacity(agents);
    while population.len() < agents {
        let pos = area.get_random_cell_inside(0, &mut rng);
        if !used.insert(pos) {
            continue;
        }
        let stops = rng.gen_range(2..=3);
        let itinerary: Vec<Arc<Waypoint>> = (0..stops)
            .map(|_| shared[rng.gen_range(0..shared.len())].clone())
            .collect();
        population.push(Agent::new(pos.x, pos.y).with_waypoints(itinerary));
    }
    Ok((population, shared))
}

/// Every agent on its own cell and the table agreeing with every agent.
fn verify_occupancy(model: &Model) -> Result<()> {
    let cells: HashSet<GridPos> = model.agents().iter().map(Agent::position).collect();
    ensure!(
        cells.len() == model.agents().len(),
        "{} agents share {} cells",
        model.agents().len(),
        cells.len()
    );
    for agent in model.agents() {
        let occupant = model.occupancy().occupant(agent.position());
        ensure!(
            occupant == Some(agent.id()),
            "cell {} holds {:?}, expected agent {}",
            agent.position(),
            occupant,
            agent.id()
        );
    }
    Ok(())
}

fn run(
    strategy: Strategy,
    scenario: &(Vec<Agent>, Vec<Arc<Waypoint>>),
    config: Config,
    ticks: usize,
) -> Result<BenchResult> {
    let (agents, waypoints) = scenario.clone();
    let mut model = Model::setup_with_config(agents, waypoints, strategy, config)
        .with_context(|| format!("setting up {}", strategy))?;

    let mut totals = TickStats::default();
    let start = Instant::now();
    for _ in 0..ticks {
        model.tick();
        totals += model.last_stats();
    }
    let elapsed = start.elapsed();
    debug!(%strategy, ticks = model.tick_count(), "run finished");

    let checked = strategy.resolves_collisions();
    if checked {
        verify_occupancy(&model).with_context(|| format!("{} broke the occupancy invariant", strategy))?;
    }
    Ok(BenchResult {
        strategy,
        elapsed,
        ticks,
        totals,
        checked,
    })
}

fn print_result(result: &BenchResult, reference: &BenchResult) {
    println!("{}", result.strategy);
    println!("  Elapsed: {:.02}ms", duration_ms(result.elapsed));
    println!("  Ticks/s: {:.01}", result.ticks_per_second());
    println!(
        "  Speedup: {:.02}x",
        reference.elapsed.as_secs_f64() / result.elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!(
        "  Moved: {}, blocked: {}, release conflicts: {}, accelerator failures: {}",
        result.totals.moved,
        result.totals.blocked,
        result.totals.release_conflicts,
        result.totals.accelerator_failures
    );
    if result.checked {
        println!("  Occupancy: consistent");
    }
}

fn should_run(filter: Option<&str>, name: &str) -> bool {
    match filter {
        None => true,
        Some(filter) => filter
            .split(',')
            .map(|entry| entry.trim())
            .filter(|entry| !entry.is_empty())
            .any(|entry| name.contains(entry)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(false).init();

    let grid = GridRect::sized(cli.grid, cli.grid);
    let config = Config {
        threads: cli.threads,
        grid,
        heatmap: HeatmapConfig {
            size: cli.grid as usize,
            ..HeatmapConfig::default()
        },
        accelerator: cli.accelerator,
        ..Config::default()
    };

    println!("Simulation settings:");
    println!("Agents:           {}", cli.agents);
    println!("Waypoints:        {}", cli.waypoints);
    println!("Grid size:        {} x {}", cli.grid, cli.grid);
    println!("Seed:             {}", cli.seed);
    println!("Measure ticks:    {}", cli.ticks);
    println!("Threads:          {}", cli.threads);
    println!("Accelerator:      {}", cli.accelerator);
    println!();

    let scenario = generate_scenario(cli.seed, grid, cli.agents, cli.waypoints)?;
    info!(agents = cli.agents, "scenario generated");

    let reference = run(REFERENCE, &scenario, config, cli.ticks)?;
    print_result(&reference, &reference);

    for strategy in Strategy::ALL {
        if strategy == REFERENCE || !should_run(cli.filter.as_deref(), strategy.name()) {
            continue;
        }
        let result = run(strategy, &scenario, config, cli.ticks)?;
        print_result(&result, &reference);
    }
    Ok(())
}
