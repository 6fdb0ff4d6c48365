//! Quadrant-partitioned collision resolution.
//!
//! Each quadrant's agents form a bucket of exclusive references, resolved by
//! its own task. A task only looks at agents of its own bucket (within the
//! configured Manhattan distance) as neighbors; cells near a quadrant border can
//! still be contended by two tasks, and the occupancy table settles who gets
//! them. Membership comes from the start of the tick and is rebuilt only after
//! every task has finished, so an agent that crossed a border mid-tick is not
//! seen by its new quadrant until the next tick.

use super::collision::resolve;
use super::{compute_desired_positions, TickStats};
use crate::agent::Agent;
use collisions::NeighborCells;
use common::shapes::GridPos;
use rayon::ThreadPool;
use regions::{OccupancyTable, RegionPartition};
use tracing::trace;

pub fn tick(
    agents: &mut [Agent],
    partition: &mut RegionPartition,
    table: &OccupancyTable,
    pool: &ThreadPool,
) -> TickStats {
    compute_desired_positions(agents, pool);
    resolve_regions(agents, partition, table, pool)
}

/// Collision pass plus repartition, for agents whose desired cells are
/// already computed.
pub fn resolve_regions(
    agents: &mut [Agent],
    partition: &mut RegionPartition,
    table: &OccupancyTable,
    pool: &ThreadPool,
) -> TickStats {
    let distance = partition.config().neighbor_distance;

    let mut buckets = bucket_by_region(agents);
    debug_assert_eq!(
        [
            buckets[0].len(),
            buckets[1].len(),
            buckets[2].len(),
            buckets[3].len()
        ],
        partition.sizes()
    );

    let mut results = [TickStats::default(); 4];
    pool.scope(|s| {
        for (bucket, stats) in buckets.iter_mut().zip(results.iter_mut()) {
            s.spawn(move |_| *stats = resolve_bucket(bucket, table, distance));
        }
    });
    drop(buckets);

    repartition(agents, partition);
    results.into_iter().fold(TickStats::default(), |acc, s| acc + s)
}

/// Splits the agents by their region tag, which is only rewritten by
/// [`repartition`].
fn bucket_by_region(agents: &mut [Agent]) -> [Vec<&mut Agent>; 4] {
    let mut buckets: [Vec<&mut Agent>; 4] = Default::default();
    for agent in agents.iter_mut() {
        buckets[agent.region().index()].push(agent);
    }
    buckets
}

/// Current cells of the bucket members within `distance` of `here`.
fn gather_neighbors(
    bucket: &[&mut Agent],
    here: GridPos,
    distance: i32,
    neighbors: &mut NeighborCells,
) {
    neighbors.clear();
    neighbors.extend(
        bucket
            .iter()
            .map(|agent| agent.position())
            .filter(|pos| pos.manhattan(here) <= distance),
    );
}

fn resolve_bucket(bucket: &mut [&mut Agent], table: &OccupancyTable, distance: i32) -> TickStats {
    let mut stats = TickStats::default();
    let mut neighbors = NeighborCells::new();
    for i in 0..bucket.len() {
        gather_neighbors(bucket, bucket[i].position(), distance, &mut neighbors);
        resolve(&mut *bucket[i], table, &neighbors, &mut stats);
    }
    stats
}

/// Throws away the old membership and files every agent under the quadrant of
/// its current cell, tagging the agent too.
pub(crate) fn repartition(agents: &mut [Agent], partition: &mut RegionPartition) {
    partition.clear();
    for agent in agents.iter_mut() {
        let region = partition.insert(agent.id(), agent.position());
        agent.set_region(region);
    }
    trace!(sizes = ?partition.sizes(), "regions rebuilt");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::Waypoint;
    use collisions::TakenCells;
    use common::shapes::GridRect;
    use regions::{RegionConfig, RegionId};

    /// A walks east over the `split_x` border, B walks west toward it, and
    /// both want (100, 10). Buckets are resolved one after the other so the
    /// order is fixed: NW (A) first, then NE (B).
    #[test]
    fn border_crossing_keeps_old_region_until_repartition() {
        let east = Waypoint::shared(150.0, 10.0, 1.0);
        let west = Waypoint::shared(50.0, 10.0, 1.0);
        let mut agents = vec![
            Agent::new(99, 10).with_waypoints([east]),
            Agent::new(101, 10).with_waypoints([west]),
        ];
        let mut table = OccupancyTable::new(GridRect::sized(200, 120)).unwrap();
        for (id, agent) in agents.iter_mut().enumerate() {
            agent.set_id(id as u32);
        }
        table
            .populate(agents.iter().map(|a| (a.id(), a.position())))
            .unwrap();
        let mut partition = RegionPartition::new(RegionConfig::default());
        repartition(&mut agents, &mut partition);
        assert_eq!(agents[0].region(), RegionId::NorthWest);
        assert_eq!(agents[1].region(), RegionId::NorthEast);

        for agent in agents.iter_mut() {
            agent.compute_next_desired_position();
        }
        assert_eq!(agents[0].desired(), GridPos::new(100, 10));
        assert_eq!(agents[1].desired(), GridPos::new(100, 10));

        let distance = partition.config().neighbor_distance;
        let mut stats = TickStats::default();
        {
            let mut buckets = bucket_by_region(&mut agents);
            stats += resolve_bucket(&mut buckets[RegionId::NorthWest.index()], &table, distance);
            let crossed = &buckets[RegionId::NorthWest.index()][0];
            assert_eq!(crossed.position(), GridPos::new(100, 10));
            // Already east of the border, still tagged and bucketed as west.
            assert_eq!(crossed.region(), RegionId::NorthWest);
            assert_eq!(partition.region_for(crossed.position()), RegionId::NorthEast);

            // B's gather only sees its own bucket, so A's new cell is not in it.
            let mut neighbors = NeighborCells::new();
            let east_bucket = &buckets[RegionId::NorthEast.index()];
            gather_neighbors(east_bucket, east_bucket[0].position(), distance, &mut neighbors);
            assert!(!neighbors.is_taken(GridPos::new(100, 10)));

            // The table still settles the contested cell in A's favour.
            stats += resolve_bucket(&mut buckets[RegionId::NorthEast.index()], &table, distance);
        }
        assert_eq!(agents[1].position(), GridPos::new(100, 9));
        assert_eq!(table.occupant(GridPos::new(100, 10)), Some(0));
        assert_eq!(table.occupant(GridPos::new(100, 9)), Some(1));
        assert_eq!(stats.moved, 2);
        assert_eq!(partition.members(RegionId::NorthWest), &[0]);

        repartition(&mut agents, &mut partition);
        assert_eq!(agents[0].region(), RegionId::NorthEast);
        assert_eq!(partition.members(RegionId::NorthEast), &[0, 1]);
        assert!(partition.members(RegionId::NorthWest).is_empty());
    }
}
