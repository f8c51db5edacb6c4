//! Headless backend that records instead of rendering
//!
//! Resources are plain descriptions with sequential ids, the bounds pass runs
//! the same reduction on the CPU and [`CommandRecorder`] keeps every command it
//! receives. Scenes built on it behave exactly like GPU scenes up to the point
//! where pixels would be produced.

use std::cell::Cell;

use cgmath::Matrix4;

use super::{CommandSink, DrawMode, RenderBackend};
use crate::gfx::bounds::{BoundsRequest, BoxCorners, FeedbackError};
use crate::gfx::resources::{
    image_decoder::DecodedImage, material::MaterialConstants, texture_table::TEXTURE_SLOT_COUNT,
};
use crate::gfx::scene::vertex::Vertex3D;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMesh {
    pub id: usize,
    pub label: String,
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTexture {
    pub id: usize,
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// First pixel, enough to tell the default textures apart
    pub first_pixel: [u8; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMaterial {
    pub id: usize,
    pub label: String,
    pub constants: MaterialConstants,
    /// Ids of the bound textures in slot order
    pub texture_ids: [usize; TEXTURE_SLOT_COUNT],
}

pub struct RecordingBackend {
    next_id: Cell<usize>,
    compute_supported: bool,
    bounds_dispatches: Cell<usize>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            compute_supported: true,
            bounds_dispatches: Cell::new(0),
        }
    }

    /// A backend that reports the bounds pass as unsupported
    pub fn without_compute() -> Self {
        Self {
            compute_supported: false,
            ..Self::new()
        }
    }

    /// How many times the bounds pass ran
    pub fn bounds_dispatches(&self) -> usize {
        self.bounds_dispatches.get()
    }

    fn next_id(&self) -> usize {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl RenderBackend for RecordingBackend {
    type MeshBuffers = RecordedMesh;
    type Texture = RecordedTexture;
    type MaterialBinding = RecordedMaterial;

    fn create_mesh_buffers(
        &self,
        label: &str,
        vertices: &[Vertex3D],
        indices: &[u32],
    ) -> RecordedMesh {
        RecordedMesh {
            id: self.next_id(),
            label: label.to_string(),
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        }
    }

    fn create_texture(&self, label: &str, image: &DecodedImage) -> RecordedTexture {
        let mut first_pixel = [0; 4];
        if let Some(pixel) = image.pixels.get(..4) {
            first_pixel.copy_from_slice(pixel);
        }
        RecordedTexture {
            id: self.next_id(),
            label: label.to_string(),
            width: image.width,
            height: image.height,
            first_pixel,
        }
    }

    fn create_material_binding(
        &self,
        label: &str,
        constants: &MaterialConstants,
        textures: [&RecordedTexture; TEXTURE_SLOT_COUNT],
    ) -> RecordedMaterial {
        RecordedMaterial {
            id: self.next_id(),
            label: label.to_string(),
            constants: *constants,
            texture_ids: textures.map(|texture| texture.id),
        }
    }

    fn compute_bounding_corners(
        &self,
        request: &BoundsRequest,
    ) -> Result<Vec<BoxCorners>, FeedbackError> {
        if !self.compute_supported {
            return Err(FeedbackError::Unsupported(
                "recording backend created without compute".to_string(),
            ));
        }
        self.bounds_dispatches.set(self.bounds_dispatches.get() + 1);
        Ok(request.reduce_on_cpu())
    }
}

/// One command as received by [`CommandRecorder`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    SetDrawMode(DrawMode),
    SetTransform(Matrix4<f32>),
    /// Material id
    BindMaterial(usize),
    SetBoundingCorners(BoxCorners),
    /// Mesh id and the mode it was drawn with
    DrawMesh { mesh: usize, mode: DrawMode },
}

#[derive(Debug, Default, Clone)]
pub struct CommandRecorder {
    commands: Vec<RecordedCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Mesh ids in draw order
    pub fn drawn_meshes(&self) -> Vec<usize> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                RecordedCommand::DrawMesh { mesh, .. } => Some(*mesh),
                _ => None,
            })
            .collect()
    }

    /// Transforms in the order they were set
    pub fn transforms(&self) -> Vec<Matrix4<f32>> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                RecordedCommand::SetTransform(transform) => Some(*transform),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl CommandSink<RecordingBackend> for CommandRecorder {
    fn set_draw_mode(&mut self, mode: DrawMode) {
        self.commands.push(RecordedCommand::SetDrawMode(mode));
    }

    fn set_transform(&mut self, transform: &Matrix4<f32>) {
        self.commands.push(RecordedCommand::SetTransform(*transform));
    }

    fn bind_material(&mut self, material: &RecordedMaterial) {
        self.commands.push(RecordedCommand::BindMaterial(material.id));
    }

    fn set_bounding_corners(&mut self, corners: &BoxCorners) {
        self.commands.push(RecordedCommand::SetBoundingCorners(*corners));
    }

    fn draw_mesh(&mut self, mesh: &RecordedMesh, mode: DrawMode) {
        self.commands.push(RecordedCommand::DrawMesh { mesh: mesh.id, mode });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_across_resource_kinds() {
        let backend = RecordingBackend::new();
        let mesh = backend.create_mesh_buffers("m", &[], &[]);
        let texture = backend.create_texture("t", &DecodedImage::solid_color([9, 8, 7, 6]));
        let material = backend.create_material_binding(
            "mat",
            &MaterialConstants::default(),
            [&texture, &texture, &texture, &texture, &texture],
        );
        assert_eq!((mesh.id, texture.id, material.id), (0, 1, 2));
        assert_eq!(texture.first_pixel, [9, 8, 7, 6]);
        assert_eq!(material.texture_ids, [1; TEXTURE_SLOT_COUNT]);
    }

    #[test]
    fn test_without_compute_reports_unsupported() {
        let backend = RecordingBackend::without_compute();
        let mut request = BoundsRequest::new();
        request.push_mesh(&[[0.0, 0.0, 0.0]]);
        assert!(matches!(
            backend.compute_bounding_corners(&request),
            Err(FeedbackError::Unsupported(_))
        ));
        assert_eq!(backend.bounds_dispatches(), 0);
    }
}
