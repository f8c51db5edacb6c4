//! Rendering backends
//!
//! A scene talks to the GPU through two seams. [`RenderBackend`] creates the
//! resources a scene owns and runs the blocking bounds pass while the scene is
//! built. [`CommandSink`] receives the per-frame command stream the scene emits
//! while it is walked.
//!
//! Two implementations ship with the crate: [`WgpuBackend`] with
//! [`RenderPassSink`] records into a real `wgpu::RenderPass`, and
//! [`RecordingBackend`] with [`CommandRecorder`] keeps everything on the CPU
//! for tests and command-stream inspection.

pub mod recording;
pub mod render_pass_sink;
pub mod wgpu_backend;

pub use recording::{CommandRecorder, RecordedCommand, RecordingBackend};
pub use render_pass_sink::RenderPassSink;
pub use wgpu_backend::{BackendError, GpuMaterial, GpuMesh, WgpuBackend};

use cgmath::Matrix4;

use crate::gfx::bounds::{BoundsRequest, BoxCorners, FeedbackError};
use crate::gfx::resources::{
    image_decoder::DecodedImage, material::MaterialConstants, texture_table::TEXTURE_SLOT_COUNT,
};
use crate::gfx::scene::vertex::Vertex3D;

/// Pipeline selector for a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    /// Opaque, textured triangles
    Mesh,
    /// Wireframe of the mesh's bounding box built from pushed corners
    BoundingBox,
}

/// Creates the GPU resources of a scene
pub trait RenderBackend {
    type MeshBuffers;
    type Texture;
    type MaterialBinding;

    fn create_mesh_buffers(
        &self,
        label: &str,
        vertices: &[Vertex3D],
        indices: &[u32],
    ) -> Self::MeshBuffers;

    fn create_texture(&self, label: &str, image: &DecodedImage) -> Self::Texture;

    /// `textures` are in slot order: ambient, diffuse, specular, emissive, normal
    fn create_material_binding(
        &self,
        label: &str,
        constants: &MaterialConstants,
        textures: [&Self::Texture; TEXTURE_SLOT_COUNT],
    ) -> Self::MaterialBinding;

    /// Runs the bounds reduction and blocks until the boxes are in CPU memory
    ///
    /// Returns one box per requested mesh, in request order.
    /// [`FeedbackError::Unsupported`] reports a missing capability.
    fn compute_bounding_corners(
        &self,
        request: &BoundsRequest,
    ) -> Result<Vec<BoxCorners>, FeedbackError>;
}

/// Receives the commands a scene traversal emits
pub trait CommandSink<B: RenderBackend> {
    fn set_draw_mode(&mut self, mode: DrawMode);

    /// Per-draw object-to-root transform
    fn set_transform(&mut self, transform: &Matrix4<f32>);

    fn bind_material(&mut self, material: &B::MaterialBinding);

    /// Only issued in [`DrawMode::BoundingBox`]
    fn set_bounding_corners(&mut self, corners: &BoxCorners);

    fn draw_mesh(&mut self, mesh: &B::MeshBuffers, mode: DrawMode);
}
