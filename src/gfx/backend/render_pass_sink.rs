//! [`CommandSink`] that records straight into a `wgpu::RenderPass`

use cgmath::Matrix4;

use super::wgpu_backend::{GpuMaterial, GpuMesh, TRANSFORM_PUSH_CONSTANT_SIZE};
use super::{CommandSink, DrawMode, WgpuBackend};
use crate::gfx::bounds::BoxCorners;

/// Vertices of the 12 box edges drawn as a line list
pub const BOUNDING_BOX_VERTEX_COUNT: u32 = 24;

/// Material bind group index; group 0 belongs to the frame uniforms
pub const MATERIAL_BIND_GROUP: u32 = 1;

pub struct RenderPassSink<'p, 'e> {
    pass: &'p mut wgpu::RenderPass<'e>,
    mesh_pipeline: &'p wgpu::RenderPipeline,
    bounding_box_pipeline: &'p wgpu::RenderPipeline,
}

impl<'p, 'e> RenderPassSink<'p, 'e> {
    pub fn new(
        pass: &'p mut wgpu::RenderPass<'e>,
        mesh_pipeline: &'p wgpu::RenderPipeline,
        bounding_box_pipeline: &'p wgpu::RenderPipeline,
    ) -> Self {
        Self {
            pass,
            mesh_pipeline,
            bounding_box_pipeline,
        }
    }
}

impl CommandSink<WgpuBackend> for RenderPassSink<'_, '_> {
    fn set_draw_mode(&mut self, mode: DrawMode) {
        match mode {
            DrawMode::Mesh => self.pass.set_pipeline(self.mesh_pipeline),
            DrawMode::BoundingBox => self.pass.set_pipeline(self.bounding_box_pipeline),
        }
    }

    fn set_transform(&mut self, transform: &Matrix4<f32>) {
        let columns: [[f32; 4]; 4] = (*transform).into();
        self.pass
            .set_push_constants(wgpu::ShaderStages::VERTEX, 0, bytemuck::bytes_of(&columns));
    }

    fn bind_material(&mut self, material: &GpuMaterial) {
        self.pass
            .set_bind_group(MATERIAL_BIND_GROUP, &material.bind_group, &[]);
    }

    fn set_bounding_corners(&mut self, corners: &BoxCorners) {
        self.pass.set_push_constants(
            wgpu::ShaderStages::VERTEX,
            TRANSFORM_PUSH_CONSTANT_SIZE,
            bytemuck::bytes_of(corners),
        );
    }

    fn draw_mesh(&mut self, mesh: &GpuMesh, mode: DrawMode) {
        match mode {
            DrawMode::Mesh => {
                if mesh.index_count == 0 {
                    return;
                }
                self.pass
                    .set_vertex_buffer(0, mesh.vertex_buffer.buffer().slice(..));
                self.pass.set_index_buffer(
                    mesh.index_buffer.buffer().slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                self.pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
            DrawMode::BoundingBox => self.pass.draw(0..BOUNDING_BOX_VERTEX_COUNT, 0..1),
        }
    }
}
