use crate::agent::Agent;
use crate::config::Config;
use crate::error::{SimError, SimResult};
use crate::strategy::accelerator::{self, Accelerator};
use crate::strategy::vectorized::AgentLanes;
use crate::strategy::{
    collision, compute_desired_positions, region, sequential, threaded, vectorized, Strategy,
    TickStats,
};
use crate::waypoint::Waypoint;
use common::shapes::GridPos;
use heatmap::Heatmap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use regions::{OccupancyTable, RegionPartition, EMPTY};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// A running simulation: the agents, the shared waypoints, and whatever the
/// selected strategy needs to advance them.
pub struct Model {
    config: Config,
    strategy: Strategy,
    agents: Vec<Agent>,
    waypoints: Vec<Arc<Waypoint>>,
    partition: RegionPartition,
    table: OccupancyTable,
    lanes: AgentLanes,
    heatmap: Option<Heatmap>,
    accelerator: Option<Box<dyn Accelerator>>,
    pool: ThreadPool,
    ticks: u64,
    last_stats: TickStats,
}

impl Model {
    pub fn setup(
        agents: Vec<Agent>,
        waypoints: Vec<Arc<Waypoint>>,
        strategy: Strategy,
    ) -> SimResult<Self> {
        Self::setup_with_config(agents, waypoints, strategy, Config::default())
    }

    /// Numbers the agents `0..n`, builds the occupancy table and the quadrant
    /// partition from their starting cells, and prepares what `strategy`
    /// needs. Every configuration problem surfaces here, before any tick.
    /// Agents sharing a starting cell are rejected when `strategy` keeps
    /// agents apart.
    pub fn setup_with_config(
        mut agents: Vec<Agent>,
        waypoints: Vec<Arc<Waypoint>>,
        strategy: Strategy,
        config: Config,
    ) -> SimResult<Self> {
        config.validate()?;
        if agents.len() >= EMPTY as usize {
            return Err(SimError::InvalidConfig(format!(
                "too many agents: {}",
                agents.len()
            )));
        }

        for (id, agent) in agents.iter_mut().enumerate() {
            agent.set_id(id as u32);
            agent.set_desired(agent.position());
            if !config.grid.contains(agent.position()) {
                return Err(SimError::AgentOutOfBounds {
                    id: id as u32,
                    position: agent.position(),
                });
            }
        }

        let mut table = OccupancyTable::new(config.grid)?;
        let colocated = table.populate(agents.iter().map(|a| (a.id(), a.position())))?;
        if !colocated.is_empty() {
            if strategy.resolves_collisions() {
                return Err(SimError::AgentsColocated { ids: colocated });
            }
            warn!(
                count = colocated.len(),
                "agents start on an occupied cell; the first one keeps it"
            );
            debug!(ids = ?colocated, "co-located agents");
        }

        let mut partition = RegionPartition::new(config.regions);
        region::repartition(&mut agents, &mut partition);
        debug!(sizes = ?partition.sizes(), "initial regions");

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("crowd-worker-{}", i))
            .build()?;

        let accelerator = if strategy.uses_accelerator() {
            Some(accelerator::open(config.accelerator, config.threads)?)
        } else {
            None
        };

        let heatmap = if strategy.uses_heatmap() {
            Some(Heatmap::new(config.heatmap)?)
        } else {
            None
        };

        let lanes = if strategy.uses_lanes() {
            AgentLanes::with_capacity(agents.len())
        } else {
            AgentLanes::new()
        };

        info!(
            agents = agents.len(),
            waypoints = waypoints.len(),
            %strategy,
            threads = config.threads,
            grid_width = config.grid.width,
            grid_height = config.grid.height,
            "simulation ready"
        );

        Ok(Model {
            config,
            strategy,
            agents,
            waypoints,
            partition,
            table,
            lanes,
            heatmap,
            accelerator,
            pool,
            ticks: 0,
            last_stats: TickStats::default(),
        })
    }

    /// Advances every agent by at most one cell.
    pub fn tick(&mut self) {
        let Model {
            config,
            strategy,
            agents,
            partition,
            table,
            lanes,
            heatmap,
            accelerator: device_slot,
            pool,
            ..
        } = self;
        let (pool, table): (&ThreadPool, &OccupancyTable) = (pool, table);

        let stats = match *strategy {
            Strategy::Sequential => sequential::tick(agents),
            Strategy::ThreadParallel => threaded::tick(agents, config.threads),
            Strategy::Vectorized => vectorized::tick(agents, lanes, None),
            Strategy::VectorizedParallel => vectorized::tick(agents, lanes, Some(pool)),
            Strategy::Accelerator => match device_slot.as_deref() {
                Some(device) => accelerator::tick(agents, device),
                None => missing_accelerator(),
            },
            Strategy::RegionCollision => region::tick(agents, partition, table, pool),
            Strategy::SequentialCollision => collision::sequential_tick(agents, table),
            Strategy::SequentialCollisionParallel => collision::parallel_tick(agents, table, pool),
            Strategy::HeatmapRegionCollision => {
                let stats = region::tick(agents, partition, table, pool);
                if let Some(heatmap) = heatmap.as_mut() {
                    heatmap.update(agents.iter().map(Agent::desired));
                }
                stats
            }
            Strategy::AcceleratorHeatmap => match (device_slot.as_deref(), heatmap.as_mut()) {
                (Some(device), Some(heatmap)) => {
                    compute_desired_positions(agents, pool);
                    let desired: Vec<GridPos> = agents.iter().map(Agent::desired).collect();
                    let (stats, heat) = pool.install(|| {
                        rayon::join(
                            || region::resolve_regions(agents, partition, table, pool),
                            || device.update_heatmap(heatmap, &desired),
                        )
                    });
                    match heat {
                        Ok(()) => stats,
                        Err(err) => {
                            error!(device = device.name(), %err, "heatmap update failed");
                            stats
                                + TickStats {
                                    accelerator_failures: 1,
                                    ..TickStats::default()
                                }
                        }
                    }
                }
                _ => missing_accelerator(),
            },
        };

        self.ticks += 1;
        self.last_stats = stats;
        trace!(
            tick = self.ticks,
            moved = stats.moved,
            blocked = stats.blocked,
            conflicts = stats.release_conflicts,
            "tick done"
        );
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn waypoints(&self) -> &[Arc<Waypoint>] {
        &self.waypoints
    }

    /// Blurred heatmap colors, row-major with side [`Model::heatmap_size`].
    /// `None` unless the strategy maintains a heatmap.
    pub fn heatmap(&self) -> Option<&[u32]> {
        self.heatmap.as_ref().map(Heatmap::blurred)
    }

    pub fn heatmap_grid(&self) -> Option<&Heatmap> {
        self.heatmap.as_ref()
    }

    pub fn heatmap_size(&self) -> usize {
        self.config.heatmap.scaled_size()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn partition(&self) -> &RegionPartition {
        &self.partition
    }

    pub fn occupancy(&self) -> &OccupancyTable {
        &self.table
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn last_stats(&self) -> TickStats {
        self.last_stats
    }
}

fn missing_accelerator() -> TickStats {
    error!("strategy needs an accelerator but none was opened");
    TickStats {
        accelerator_failures: 1,
        ..TickStats::default()
    }
}
