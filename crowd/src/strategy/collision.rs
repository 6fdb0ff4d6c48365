//! Collision-resolving ticks over the whole population.

use super::{compute_desired_positions, TickStats};
use crate::agent::Agent;
use collisions::{claim_move, prioritized_alternatives, MoveOutcome, PositionCounts, TakenCells};
use common::shapes::GridPos;
use rayon::prelude::*;
use rayon::ThreadPool;
use regions::OccupancyTable;
use tracing::warn;

/// Moves `agent` to the best free candidate around its desired cell. Cells in
/// `taken` are skipped; the rest must also be claimable in `table`. Returns the
/// cell the agent left, if it moved.
pub(crate) fn resolve<T>(
    agent: &mut Agent,
    table: &OccupancyTable,
    taken: &T,
    stats: &mut TickStats,
) -> Option<GridPos>
where
    T: TakenCells + ?Sized,
{
    let from = agent.position();
    let candidates = prioritized_alternatives(from, agent.desired());
    match claim_move(table, agent.id(), from, &candidates, taken) {
        MoveOutcome::Moved {
            to,
            release_conflict,
        } => {
            if let Some(holder) = release_conflict {
                warn!(
                    agent = agent.id(),
                    cell = %from,
                    holder,
                    "previous cell was not held by the leaving agent"
                );
                stats.release_conflicts += 1;
            }
            agent.set_position(to);
            stats.moved += 1;
            Some(from)
        }
        MoveOutcome::Blocked => {
            if agent.desired() != from {
                stats.blocked += 1;
            }
            None
        }
    }
}

/// One agent at a time, in id order. Every other agent counts as a neighbor,
/// which the position multiset answers without scanning the population.
pub fn sequential_tick(agents: &mut [Agent], table: &OccupancyTable) -> TickStats {
    let mut stats = TickStats::default();
    let mut occupied = PositionCounts::from_positions(agents.iter().map(Agent::position));
    for agent in agents.iter_mut() {
        agent.compute_next_desired_position();
        if let Some(from) = resolve(agent, table, &occupied, &mut stats) {
            occupied.relocate(from, agent.position());
        }
    }
    stats
}

/// Desired cells for everyone first, then contiguous chunks of agents resolve
/// concurrently. The table is both the neighbor query and the arbiter, so two
/// workers racing for one cell cannot both win.
pub fn parallel_tick(agents: &mut [Agent], table: &OccupancyTable, pool: &ThreadPool) -> TickStats {
    compute_desired_positions(agents, pool);
    let chunk = agents.len().div_ceil(pool.current_num_threads()).max(1);
    pool.install(|| {
        agents
            .par_chunks_mut(chunk)
            .map(|chunk| {
                let mut stats = TickStats::default();
                for agent in chunk.iter_mut() {
                    resolve(agent, table, table, &mut stats);
                }
                stats
            })
            .reduce(TickStats::default, |a, b| a + b)
    })
}
