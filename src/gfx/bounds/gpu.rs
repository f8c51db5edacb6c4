//! Compute pipeline of the bounds pass

use log::debug;
use wgpu::{Device, Queue};

use super::{BoundsRequest, BoxCorners, FeedbackError, MeshRange};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::ArrayBuffer,
};

const SHADER_SOURCE: &str = include_str!("bounds_reduce.wgsl");

/// Largest workgroup count wgpu guarantees per dispatch dimension
const MAX_DISPATCH_X: u32 = 65535;

/// Splits `count` workgroups into an `x * y` grid with `x` within limits
pub fn dispatch_size(count: u32) -> (u32, u32) {
    if count == 0 {
        return (0, 0);
    }
    let x = count.min(MAX_DISPATCH_X);
    (x, count.div_ceil(x))
}

pub struct BoundsPipeline {
    pipeline: wgpu::ComputePipeline,
    layout: BindGroupLayoutWithDesc,
}

impl BoundsPipeline {
    pub fn new(device: &Device) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_compute(binding_types::storage_buffer_read_only())
            .next_binding_compute(binding_types::storage_buffer_read_only())
            .next_binding_compute(binding_types::storage_buffer_read_write())
            .create(device, "Bounds Bind Group Layout");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bounds Reduce Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bounds Pipeline Layout"),
            bind_group_layouts: &[&layout.layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Bounds Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self { pipeline, layout }
    }

    /// Dispatches the reduction, waits for the GPU and reads the boxes back
    pub fn compute(
        &self,
        device: &Device,
        queue: &Queue,
        request: &BoundsRequest,
    ) -> Result<Vec<BoxCorners>, FeedbackError> {
        let mesh_count = request.mesh_count();
        if mesh_count == 0 {
            return Ok(Vec::new());
        }

        // Storage bindings must not be empty
        let padding = [[0.0f32; 4]];
        let positions: &[[f32; 4]] = if request.positions.is_empty() {
            &padding
        } else {
            &request.positions
        };

        let positions = ArrayBuffer::new_with_data(device, positions, true);
        let ranges = ArrayBuffer::<MeshRange>::new_with_data(device, &request.ranges, true);
        let output = ArrayBuffer::<BoxCorners>::new(device, mesh_count, false);
        let staging = ArrayBuffer::<BoxCorners>::new_staging(device, mesh_count);

        let bind_group = BindGroupBuilder::new(&self.layout)
            .resource(positions.binding_resource())
            .resource(ranges.binding_resource())
            .resource(output.binding_resource())
            .create(device, "Bounds Bind Group");

        let (x, y) = dispatch_size(mesh_count as u32);
        debug!(
            "Dispatching bounds reduction for {} meshes ({} vertices) as {}x{} workgroups",
            mesh_count,
            request.positions.len(),
            x,
            y
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Bounds Encoder"),
        });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Bounds Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(x, y, 1);
        }
        encoder.copy_buffer_to_buffer(
            output.buffer(),
            0,
            staging.buffer(),
            0,
            staging.size_in_bytes(),
        );
        queue.submit(std::iter::once(encoder.finish()));

        staging
            .read_to_vec(device)
            .map_err(FeedbackError::ReadbackFailed)
    }
}
