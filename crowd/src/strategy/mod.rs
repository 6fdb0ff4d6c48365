//! Tick strategies. Every strategy computes each agent's desired cell from its
//! destination; they differ in how that work is spread over workers and in
//! whether the desired cell is committed blindly or claimed in the occupancy
//! table first.

pub mod accelerator;
pub mod collision;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod region;
pub mod sequential;
pub mod threaded;
pub mod vectorized;

use crate::agent::Agent;
use crate::error::SimError;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Sequential,
    ThreadParallel,
    Vectorized,
    VectorizedParallel,
    Accelerator,
    RegionCollision,
    SequentialCollision,
    SequentialCollisionParallel,
    HeatmapRegionCollision,
    AcceleratorHeatmap,
}

impl Strategy {
    pub const ALL: [Strategy; 10] = [
        Strategy::Sequential,
        Strategy::ThreadParallel,
        Strategy::Vectorized,
        Strategy::VectorizedParallel,
        Strategy::Accelerator,
        Strategy::RegionCollision,
        Strategy::SequentialCollision,
        Strategy::SequentialCollisionParallel,
        Strategy::HeatmapRegionCollision,
        Strategy::AcceleratorHeatmap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::ThreadParallel => "thread-parallel",
            Strategy::Vectorized => "vectorized",
            Strategy::VectorizedParallel => "vectorized-parallel",
            Strategy::Accelerator => "accelerator",
            Strategy::RegionCollision => "region-collision",
            Strategy::SequentialCollision => "sequential-collision",
            Strategy::SequentialCollisionParallel => "sequential-collision-parallel",
            Strategy::HeatmapRegionCollision => "heatmap-region-collision",
            Strategy::AcceleratorHeatmap => "accelerator-heatmap",
        }
    }

    /// Agents never share a cell after a tick of this strategy.
    pub fn resolves_collisions(self) -> bool {
        matches!(
            self,
            Strategy::RegionCollision
                | Strategy::SequentialCollision
                | Strategy::SequentialCollisionParallel
                | Strategy::HeatmapRegionCollision
                | Strategy::AcceleratorHeatmap
        )
    }

    pub fn uses_regions(self) -> bool {
        matches!(
            self,
            Strategy::RegionCollision
                | Strategy::HeatmapRegionCollision
                | Strategy::AcceleratorHeatmap
        )
    }

    pub fn uses_heatmap(self) -> bool {
        matches!(
            self,
            Strategy::HeatmapRegionCollision | Strategy::AcceleratorHeatmap
        )
    }

    pub fn uses_accelerator(self) -> bool {
        matches!(self, Strategy::Accelerator | Strategy::AcceleratorHeatmap)
    }

    pub fn uses_lanes(self) -> bool {
        matches!(self, Strategy::Vectorized | Strategy::VectorizedParallel)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| SimError::UnknownStrategy(s.to_string()))
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Agents whose position changed.
    pub moved: usize,
    /// Agents that wanted to move but found every candidate cell taken.
    pub blocked: usize,
    /// Released cells that held someone other than the leaving agent.
    pub release_conflicts: usize,
    /// Offloaded kernels that failed; their agents stayed put.
    pub accelerator_failures: usize,
}

impl Add for TickStats {
    type Output = TickStats;

    fn add(self, other: TickStats) -> TickStats {
        TickStats {
            moved: self.moved + other.moved,
            blocked: self.blocked + other.blocked,
            release_conflicts: self.release_conflicts + other.release_conflicts,
            accelerator_failures: self.accelerator_failures + other.accelerator_failures,
        }
    }
}

impl AddAssign for TickStats {
    fn add_assign(&mut self, other: TickStats) {
        *self = *self + other;
    }
}

/// Desired positions for every agent, on the pool. Returns once all are done.
pub(crate) fn compute_desired_positions(agents: &mut [Agent], pool: &ThreadPool) {
    pool.install(|| {
        agents
            .par_iter_mut()
            .for_each(Agent::compute_next_desired_position)
    });
}

/// Moves every agent onto its desired cell, no questions asked.
pub(crate) fn commit_all(agents: &mut [Agent]) -> TickStats {
    let mut stats = TickStats::default();
    for agent in agents.iter_mut() {
        if agent.desired() != agent.position() {
            stats.moved += 1;
        }
        agent.commit_desired();
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>().ok(), Some(strategy));
            assert_eq!(strategy.to_string(), strategy.name());
        }
    }

    #[test]
    fn stats_add_up() {
        let mut total = TickStats {
            moved: 1,
            blocked: 2,
            release_conflicts: 0,
            accelerator_failures: 0,
        };
        total += TickStats {
            moved: 3,
            blocked: 0,
            release_conflicts: 1,
            accelerator_failures: 1,
        };
        assert_eq!(
            total,
            TickStats {
                moved: 4,
                blocked: 2,
                release_conflicts: 1,
                accelerator_failures: 1,
            }
        );
    }
}
