//! wgpu compute backend for the step kernel.

use super::accelerator::{Accelerator, KernelInput, KernelOutput};
use crate::error::{SimError, SimResult};
use bytemuck::{Pod, Zeroable};
use std::sync::mpsc;
use wgpu::util::DeviceExt;

const WORKGROUP_SIZE: u32 = 64;

const STEP_SHADER: &str = r#"
struct Params {
    count: u32,
    pad0: u32,
    pad1: u32,
    pad2: u32,
}

@group(0) @binding(0) var<storage, read> pos_x: array<f32>;
@group(0) @binding(1) var<storage, read> pos_y: array<f32>;
@group(0) @binding(2) var<storage, read> dest_x: array<f32>;
@group(0) @binding(3) var<storage, read> dest_y: array<f32>;
@group(0) @binding(4) var<storage, read_write> desired_x: array<i32>;
@group(0) @binding(5) var<storage, read_write> desired_y: array<i32>;
@group(0) @binding(6) var<uniform> params: Params;

// WGSL `round` goes to even on halves; the host rounds them away from zero.
fn round_half_away(v: f32) -> f32 {
    return sign(v) * floor(abs(v) + 0.5);
}

@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let i = id.x;
    if (i >= params.count) {
        return;
    }
    let dx = dest_x[i] - pos_x[i];
    let dy = dest_y[i] - pos_y[i];
    let len = sqrt(dx * dx + dy * dy);
    var step = vec2<f32>(0.0, 0.0);
    if (len > 0.0) {
        step = vec2<f32>(dx / len, dy / len);
    }
    desired_x[i] = i32(round_half_away(pos_x[i] + step.x));
    desired_y[i] = i32(round_half_away(pos_y[i] + step.y));
}
"#;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Params {
    count: u32,
    _pad: [u32; 3],
}

pub struct WgpuDevice {
    name: String,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
}

impl WgpuDevice {
    pub fn new() -> SimResult<Self> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> SimResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| SimError::AcceleratorUnavailable("no GPU adapter found".to_string()))?;
        let name = adapter.get_info().name;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Crowd Step Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|err| SimError::AcceleratorUnavailable(err.to_string()))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Step Shader"),
            source: wgpu::ShaderSource::Wgsl(STEP_SHADER.into()),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Step Pipeline"),
            layout: None,
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(WgpuDevice {
            name,
            device,
            queue,
            pipeline,
        })
    }

    fn storage(&self, label: &str, data: &[f32]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE,
            })
    }

    fn read_back(&self, staging: &wgpu::Buffer) -> SimResult<Vec<i32>> {
        let slice = staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|err| SimError::Kernel(err.to_string()))?
            .map_err(|err| SimError::Kernel(err.to_string()))?;
        let values = slice
            .get_mapped_range()
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        staging.unmap();
        Ok(values)
    }
}

impl Accelerator for WgpuDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn desired_positions(&self, input: &KernelInput) -> SimResult<KernelOutput> {
        let n = input.len();
        if input.y.len() != n || input.dest_x.len() != n || input.dest_y.len() != n {
            return Err(SimError::Kernel("input arrays differ in length".to_string()));
        }
        if n == 0 {
            return Ok(KernelOutput::default());
        }

        let bytes = (n * std::mem::size_of::<i32>()) as wgpu::BufferAddress;
        let pos_x = self.storage("Position X", &input.x);
        let pos_y = self.storage("Position Y", &input.y);
        let dest_x = self.storage("Destination X", &input.dest_x);
        let dest_y = self.storage("Destination Y", &input.dest_y);
        let output = |label: &str| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: bytes,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        let staging = |label: &str| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: bytes,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let desired_x = output("Desired X");
        let desired_y = output("Desired Y");
        let staging_x = staging("Desired X Staging");
        let staging_y = staging("Desired Y Staging");
        let params = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Step Params"),
                contents: bytemuck::bytes_of(&Params {
                    count: n as u32,
                    _pad: [0; 3],
                }),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let layout = self.pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Step Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: pos_x.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: pos_y.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: dest_x.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: dest_y.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: desired_x.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: desired_y.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: params.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Step Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Step Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups((n as u32).div_ceil(WORKGROUP_SIZE), 1, 1);
        }
        encoder.copy_buffer_to_buffer(&desired_x, 0, &staging_x, 0, bytes);
        encoder.copy_buffer_to_buffer(&desired_y, 0, &staging_y, 0, bytes);
        self.queue.submit(Some(encoder.finish()));

        Ok(KernelOutput {
            desired_x: self.read_back(&staging_x)?,
            desired_y: self.read_back(&staging_y)?,
        })
    }
}
