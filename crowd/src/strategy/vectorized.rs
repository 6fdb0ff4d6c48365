//! Batched step arithmetic over a structure-of-arrays copy of the agents.
//!
//! Agents are packed `LANES` at a time into [`Batch`]es holding positions and
//! destinations as `f32` lanes. A batch computes the displacement, its length
//! and the unit step for all lanes in one pass, then rounds to integer desired
//! cells. Lanes without a destination (and the padding after the last agent)
//! carry their own position as destination, so their step is zero.

use super::{commit_all, TickStats};
use crate::agent::Agent;
use common::shapes::GridPos;
use rayon::prelude::*;
use rayon::ThreadPool;

pub const LANES: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Batch {
    pub x: [f32; LANES],
    pub y: [f32; LANES],
    pub dest_x: [f32; LANES],
    pub dest_y: [f32; LANES],
    pub desired_x: [i32; LANES],
    pub desired_y: [i32; LANES],
}

impl Batch {
    pub fn step(&mut self) {
        let mut dx = [0.0f32; LANES];
        let mut dy = [0.0f32; LANES];
        for lane in 0..LANES {
            dx[lane] = self.dest_x[lane] - self.x[lane];
            dy[lane] = self.dest_y[lane] - self.y[lane];
        }

        let mut length = [0.0f32; LANES];
        for lane in 0..LANES {
            length[lane] = (dx[lane] * dx[lane] + dy[lane] * dy[lane]).sqrt();
        }

        for lane in 0..LANES {
            let (step_x, step_y) = if length[lane] > 0.0 {
                (dx[lane] / length[lane], dy[lane] / length[lane])
            } else {
                (0.0, 0.0)
            };
            self.desired_x[lane] = (self.x[lane] + step_x).round() as i32;
            self.desired_y[lane] = (self.y[lane] + step_y).round() as i32;
        }
    }
}

/// One agent's step on the scalar path, bit for bit the same as a batch lane.
#[inline]
pub fn step_lane(x: f32, y: f32, dest_x: f32, dest_y: f32) -> (i32, i32) {
    let mut batch = Batch::default();
    batch.x[0] = x;
    batch.y[0] = y;
    batch.dest_x[0] = dest_x;
    batch.dest_y[0] = dest_y;
    batch.step();
    (batch.desired_x[0], batch.desired_y[0])
}

/// Structure-of-arrays mirror of the agents, padded to whole batches.
#[derive(Debug, Clone, Default)]
pub struct AgentLanes {
    batches: Vec<Batch>,
    len: usize,
}

impl AgentLanes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(agents: usize) -> Self {
        AgentLanes {
            batches: Vec::with_capacity(agents.div_ceil(LANES)),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Copies positions and current destinations out of `agents`.
    /// Destinations must already be advanced for this tick.
    pub fn load(&mut self, agents: &[Agent]) {
        self.len = agents.len();
        self.batches.clear();
        self.batches
            .resize(agents.len().div_ceil(LANES), Batch::default());
        for (batch, group) in self.batches.iter_mut().zip(agents.chunks(LANES)) {
            for (lane, agent) in group.iter().enumerate() {
                let (x, y) = (agent.x() as f32, agent.y() as f32);
                let (dest_x, dest_y) = agent
                    .destination()
                    .map_or((x, y), |wp| (wp.x() as f32, wp.y() as f32));
                batch.x[lane] = x;
                batch.y[lane] = y;
                batch.dest_x[lane] = dest_x;
                batch.dest_y[lane] = dest_y;
            }
        }
    }

    pub fn step(&mut self) {
        for batch in self.batches.iter_mut() {
            batch.step();
        }
    }

    pub fn par_step(&mut self) {
        self.batches.par_iter_mut().for_each(Batch::step);
    }

    pub fn desired(&self, index: usize) -> Option<GridPos> {
        if index >= self.len {
            return None;
        }
        let batch = &self.batches[index / LANES];
        let lane = index % LANES;
        Some(GridPos::new(batch.desired_x[lane], batch.desired_y[lane]))
    }

    /// Writes the computed desired cells back into `agents`.
    pub fn store(&self, agents: &mut [Agent]) {
        for (batch, group) in self.batches.iter().zip(agents.chunks_mut(LANES)) {
            for (lane, agent) in group.iter_mut().enumerate() {
                agent.set_desired(GridPos::new(batch.desired_x[lane], batch.desired_y[lane]));
            }
        }
    }
}

/// Vectorized tick. With a pool, destination bookkeeping and the batches are
/// spread over its workers.
pub fn tick(agents: &mut [Agent], lanes: &mut AgentLanes, pool: Option<&ThreadPool>) -> TickStats {
    match pool {
        Some(pool) => pool.install(|| {
            agents.par_iter_mut().for_each(|agent| {
                agent.advance_destination();
            });
            lanes.load(agents);
            lanes.par_step();
        }),
        None => {
            for agent in agents.iter_mut() {
                agent.advance_destination();
            }
            lanes.load(agents);
            lanes.step();
        }
    }
    lanes.store(agents);
    commit_all(agents)
}
