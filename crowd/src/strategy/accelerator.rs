//! Offloading the step kernel to a separate execution unit.
//!
//! A device receives positions and destinations as parallel arrays and hands
//! back parallel arrays of desired cells. The host never shares memory with the
//! device: inputs are copied in and results copied out on every call.

use super::vectorized::{step_lane, Batch, LANES};
use super::{commit_all, TickStats};
use crate::agent::Agent;
use crate::config::AcceleratorKind;
use crate::error::{SimError, SimResult};
use common::shapes::GridPos;
use heatmap::Heatmap;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error};

/// Host-side staging for one kernel launch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelInput {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub dest_x: Vec<f32>,
    pub dest_y: Vec<f32>,
}

impl KernelInput {
    /// Agents without a destination aim at their own cell.
    pub fn gather(agents: &[Agent]) -> Self {
        let mut input = KernelInput {
            x: Vec::with_capacity(agents.len()),
            y: Vec::with_capacity(agents.len()),
            dest_x: Vec::with_capacity(agents.len()),
            dest_y: Vec::with_capacity(agents.len()),
        };
        for agent in agents {
            let (x, y) = (agent.x() as f32, agent.y() as f32);
            let (dest_x, dest_y) = agent
                .destination()
                .map_or((x, y), |wp| (wp.x() as f32, wp.y() as f32));
            input.x.push(x);
            input.y.push(y);
            input.dest_x.push(dest_x);
            input.dest_y.push(dest_y);
        }
        input
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelOutput {
    pub desired_x: Vec<i32>,
    pub desired_y: Vec<i32>,
}

impl KernelOutput {
    pub fn len(&self) -> usize {
        self.desired_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.desired_x.is_empty()
    }
}

pub trait Accelerator: Send + Sync {
    fn name(&self) -> &str;

    /// One unit step toward each destination, rounded to cells.
    fn desired_positions(&self, input: &KernelInput) -> SimResult<KernelOutput>;

    /// Runs a tiny known kernel and checks the answer.
    fn probe(&self) -> SimResult<()> {
        let input = KernelInput {
            x: vec![0.0, 5.0, 3.0],
            y: vec![0.0, 5.0, 3.0],
            dest_x: vec![10.0, 5.0, 0.0],
            dest_y: vec![0.0, 5.0, 0.0],
        };
        let output = self.desired_positions(&input)?;
        let expected = KernelOutput {
            desired_x: vec![1, 5, 2],
            desired_y: vec![0, 5, 2],
        };
        if output != expected {
            return Err(SimError::AcceleratorUnavailable(format!(
                "{} returned {:?} for the probe kernel",
                self.name(),
                output
            )));
        }
        Ok(())
    }

    fn update_heatmap(&self, heatmap: &mut Heatmap, desired: &[GridPos]) -> SimResult<()> {
        heatmap.par_update(desired);
        Ok(())
    }
}

/// Device emulated by a dedicated worker pool with its own buffers.
pub struct HostDevice {
    pool: ThreadPool,
}

impl HostDevice {
    pub fn new(workers: usize) -> SimResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("host-device-{}", i))
            .build()?;
        Ok(HostDevice { pool })
    }
}

impl Accelerator for HostDevice {
    fn name(&self) -> &str {
        "host device"
    }

    fn desired_positions(&self, input: &KernelInput) -> SimResult<KernelOutput> {
        let n = input.len();
        if input.y.len() != n || input.dest_x.len() != n || input.dest_y.len() != n {
            return Err(SimError::Kernel(format!(
                "input arrays differ in length ({}, {}, {}, {})",
                n,
                input.y.len(),
                input.dest_x.len(),
                input.dest_y.len()
            )));
        }

        // Upload: whole batches go to device memory, the tail runs lane by lane.
        let whole = n / LANES * LANES;
        let mut device: Vec<Batch> = (0..whole)
            .step_by(LANES)
            .map(|base| {
                let mut batch = Batch::default();
                batch.x.copy_from_slice(&input.x[base..base + LANES]);
                batch.y.copy_from_slice(&input.y[base..base + LANES]);
                batch.dest_x.copy_from_slice(&input.dest_x[base..base + LANES]);
                batch.dest_y.copy_from_slice(&input.dest_y[base..base + LANES]);
                batch
            })
            .collect();

        self.pool
            .install(|| device.par_iter_mut().for_each(Batch::step));

        // Download.
        let mut output = KernelOutput {
            desired_x: Vec::with_capacity(n),
            desired_y: Vec::with_capacity(n),
        };
        for batch in &device {
            output.desired_x.extend_from_slice(&batch.desired_x);
            output.desired_y.extend_from_slice(&batch.desired_y);
        }
        for i in whole..n {
            let (x, y) = step_lane(input.x[i], input.y[i], input.dest_x[i], input.dest_y[i]);
            output.desired_x.push(x);
            output.desired_y.push(y);
        }
        Ok(output)
    }

    fn update_heatmap(&self, heatmap: &mut Heatmap, desired: &[GridPos]) -> SimResult<()> {
        self.pool.install(|| heatmap.par_update(desired));
        Ok(())
    }
}

/// Opens and probes the requested device. Failing here is a setup error.
pub fn open(kind: AcceleratorKind, workers: usize) -> SimResult<Box<dyn Accelerator>> {
    let device: Box<dyn Accelerator> = match kind {
        AcceleratorKind::Host => Box::new(HostDevice::new(workers)?),
        AcceleratorKind::Gpu => open_gpu()?,
    };
    device.probe()?;
    debug!(device = device.name(), "accelerator ready");
    Ok(device)
}

#[cfg(feature = "gpu")]
fn open_gpu() -> SimResult<Box<dyn Accelerator>> {
    Ok(Box::new(super::gpu::WgpuDevice::new()?))
}

#[cfg(not(feature = "gpu"))]
fn open_gpu() -> SimResult<Box<dyn Accelerator>> {
    Err(SimError::AcceleratorUnavailable(
        "built without the `gpu` feature".to_string(),
    ))
}

/// Offloaded tick. Destinations advance on the host, the step runs on the
/// device, and the results are committed without collision checks. A failed
/// launch leaves every agent where it was.
pub fn tick(agents: &mut [Agent], device: &dyn Accelerator) -> TickStats {
    for agent in agents.iter_mut() {
        agent.advance_destination();
    }
    let input = KernelInput::gather(agents);
    let output = device.desired_positions(&input).and_then(|output| {
        if output.desired_x.len() != input.len() || output.desired_y.len() != input.len() {
            return Err(SimError::Kernel(format!(
                "expected {} results, got {}",
                input.len(),
                output.len()
            )));
        }
        Ok(output)
    });
    match output {
        Ok(output) => {
            for ((agent, x), y) in agents
                .iter_mut()
                .zip(output.desired_x)
                .zip(output.desired_y)
            {
                agent.set_desired(GridPos::new(x, y));
            }
            commit_all(agents)
        }
        Err(err) => {
            error!(device = device.name(), %err, "kernel launch failed, agents stay put");
            TickStats {
                accelerator_failures: 1,
                ..TickStats::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_device_handles_partial_batches() {
        let device = HostDevice::new(2).unwrap();
        device.probe().unwrap();
        let input = KernelInput {
            x: vec![0.0; 6],
            y: vec![0.0; 6],
            dest_x: vec![5.0, -5.0, 0.0, 0.0, 5.0, 0.0],
            dest_y: vec![0.0, 0.0, 5.0, -5.0, 5.0, 0.0],
        };
        let output = device.desired_positions(&input).unwrap();
        assert_eq!(output.desired_x, vec![1, -1, 0, 0, 1, 0]);
        assert_eq!(output.desired_y, vec![0, 0, 1, -1, 1, 0]);
    }

    #[test]
    fn halves_round_away_from_zero() {
        let device = HostDevice::new(1).unwrap();
        let input = KernelInput {
            x: vec![2.5, -2.5, 0.5, 7.0, 4.5],
            y: vec![-0.5, 1.5, 3.0, 7.0, 4.5],
            dest_x: vec![2.5, -2.5, 0.5, 10.0, 4.5],
            dest_y: vec![-0.5, 1.5, 3.0, 7.0, 4.5],
        };
        let output = device.desired_positions(&input).unwrap();
        assert_eq!(output.desired_x, vec![3, -3, 1, 8, 5]);
        assert_eq!(output.desired_y, vec![-1, 2, 3, 7, 5]);
    }

    #[test]
    fn mismatched_arrays_fail() {
        let device = HostDevice::new(1).unwrap();
        let input = KernelInput {
            x: vec![0.0; 2],
            y: vec![0.0; 1],
            dest_x: vec![0.0; 2],
            dest_y: vec![0.0; 2],
        };
        assert!(matches!(
            device.desired_positions(&input),
            Err(SimError::Kernel(_))
        ));
    }
}
