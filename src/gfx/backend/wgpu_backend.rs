//! `wgpu` implementation of [`RenderBackend`]

use std::sync::Arc;

use log::{info, warn};
use wgpu::{Device, Queue};

use super::RenderBackend;
use crate::gfx::bounds::{BoundsPipeline, BoundsRequest, BoxCorners, FeedbackError};
use crate::gfx::resources::{
    image_decoder::DecodedImage,
    material::{MaterialBindings, MaterialConstants, MaterialUBO},
    texture_resource::{create_material_sampler, ImageTexture},
    texture_table::{TextureSlot, TEXTURE_SLOT_COUNT},
};
use crate::gfx::scene::vertex::Vertex3D;
use crate::wgpu_utils::uniform_buffer::ArrayBuffer;

/// Push-constant bytes holding the per-draw transform
pub const TRANSFORM_PUSH_CONSTANT_SIZE: u32 = 64;
/// Push-constant bytes of the bounding-box pipeline: transform plus eight corners
pub const BOUNDING_PUSH_CONSTANT_SIZE: u32 = TRANSFORM_PUSH_CONSTANT_SIZE + 8 * 16;

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("no suitable adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("device does not have the {0} feature")]
    MissingFeature(&'static str),

    #[error("device allows {available} push-constant bytes, {required} are needed")]
    PushConstantLimit { available: u32, required: u32 },
}

/// Vertex and index buffers of one mesh
pub struct GpuMesh {
    pub vertex_buffer: ArrayBuffer<Vertex3D>,
    pub index_buffer: ArrayBuffer<u32>,
    pub index_count: u32,
}

/// Material constants and the bind group of the material layout
pub struct GpuMaterial {
    pub ubo: MaterialUBO,
    pub bind_group: wgpu::BindGroup,
}

pub struct WgpuBackend {
    device: Arc<Device>,
    queue: Arc<Queue>,
    material_bindings: MaterialBindings,
    sampler: wgpu::Sampler,
    bounds: Result<BoundsPipeline, String>,
}

impl WgpuBackend {
    /// Wraps an existing device
    ///
    /// The device must have been created with `Features::PUSH_CONSTANTS` and at
    /// least 64 push-constant bytes. Without compute shaders or with fewer than
    /// 192 bytes the backend still works but reports the bounds pass as
    /// unsupported.
    pub fn new(
        adapter: &wgpu::Adapter,
        device: Arc<Device>,
        queue: Arc<Queue>,
    ) -> Result<Self, BackendError> {
        if !device.features().contains(wgpu::Features::PUSH_CONSTANTS) {
            return Err(BackendError::MissingFeature("PUSH_CONSTANTS"));
        }
        let available = device.limits().max_push_constant_size;
        if available < TRANSFORM_PUSH_CONSTANT_SIZE {
            return Err(BackendError::PushConstantLimit {
                available,
                required: TRANSFORM_PUSH_CONSTANT_SIZE,
            });
        }

        let compute = adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS);
        let bounds = if !compute {
            Err("adapter does not support compute shaders".to_string())
        } else if available < BOUNDING_PUSH_CONSTANT_SIZE {
            Err(format!(
                "bounding-box overlay needs {} push-constant bytes, device allows {}",
                BOUNDING_PUSH_CONSTANT_SIZE, available
            ))
        } else {
            Ok(BoundsPipeline::new(&device))
        };
        if let Err(reason) = &bounds {
            warn!("Bounding-volume pass disabled: {}", reason);
        }

        let material_bindings = MaterialBindings::new(&device);
        let sampler = create_material_sampler(&device);

        Ok(Self {
            device,
            queue,
            material_bindings,
            sampler,
            bounds,
        })
    }

    /// Creates a device without a surface, for offscreen work and tools
    ///
    /// Mesh draws receive their transform as a push constant, so adapters
    /// without `Features::PUSH_CONSTANTS` (WebGPU and most WebGL or GLES
    /// targets) are refused with [`BackendError::MissingFeature`]. Only the
    /// bounding-box overlay degrades on otherwise capable adapters.
    pub async fn headless() -> Result<Self, BackendError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        if !adapter.features().contains(wgpu::Features::PUSH_CONSTANTS) {
            return Err(BackendError::MissingFeature("PUSH_CONSTANTS"));
        }
        let max_push_constant_size = adapter
            .limits()
            .max_push_constant_size
            .min(BOUNDING_PUSH_CONSTANT_SIZE.next_power_of_two());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Scene Device"),
                required_features: wgpu::Features::PUSH_CONSTANTS,
                required_limits: wgpu::Limits {
                    max_push_constant_size,
                    ..wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits())
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        info!("Using adapter {:?}", adapter.get_info().name);
        Self::new(&adapter, Arc::new(device), Arc::new(queue))
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    /// Layout every material bind group is created with
    pub fn material_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        self.material_bindings.bind_group_layout()
    }

    pub fn supports_bounds(&self) -> bool {
        self.bounds.is_ok()
    }
}

impl RenderBackend for WgpuBackend {
    type MeshBuffers = GpuMesh;
    type Texture = ImageTexture;
    type MaterialBinding = GpuMaterial;

    fn create_mesh_buffers(
        &self,
        label: &str,
        vertices: &[Vertex3D],
        indices: &[u32],
    ) -> GpuMesh {
        // wgpu rejects empty buffer slices, so empty meshes get a zeroed stand-in
        let padding_vertex = [Vertex3D {
            position: [0.0; 3],
            normal: [0.0; 3],
            tex_coord: [0.0; 2],
        }];
        let vertices = if vertices.is_empty() {
            &padding_vertex[..]
        } else {
            vertices
        };
        let indices_or_padding = if indices.is_empty() {
            &[0u32][..]
        } else {
            indices
        };

        GpuMesh {
            vertex_buffer: ArrayBuffer::with_usage(
                &self.device,
                &format!("{} Vertices", label),
                vertices,
                wgpu::BufferUsages::VERTEX,
            ),
            index_buffer: ArrayBuffer::with_usage(
                &self.device,
                &format!("{} Indices", label),
                indices_or_padding,
                wgpu::BufferUsages::INDEX,
            ),
            index_count: indices.len() as u32,
        }
    }

    fn create_texture(&self, label: &str, image: &DecodedImage) -> ImageTexture {
        ImageTexture::create(&self.device, &self.queue, image, label)
    }

    fn create_material_binding(
        &self,
        label: &str,
        constants: &MaterialConstants,
        textures: [&ImageTexture; TEXTURE_SLOT_COUNT],
    ) -> GpuMaterial {
        let ubo =
            MaterialUBO::new_with_data(&self.device, &format!("{} Constants", label), constants);
        let views = std::array::from_fn(|i| textures[i].view(TextureSlot::ALL[i].is_color()));
        let bind_group = self.material_bindings.create_bind_group(
            &self.device,
            label,
            &ubo,
            views,
            &self.sampler,
        );
        GpuMaterial { ubo, bind_group }
    }

    fn compute_bounding_corners(
        &self,
        request: &BoundsRequest,
    ) -> Result<Vec<BoxCorners>, FeedbackError> {
        match &self.bounds {
            Ok(pipeline) => pipeline.compute(&self.device, &self.queue, request),
            Err(reason) => Err(FeedbackError::Unsupported(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_constant_requirements() {
        // a 4x4 transform for meshes, plus eight corners for the overlay
        assert_eq!(TRANSFORM_PUSH_CONSTANT_SIZE, 64);
        assert_eq!(BOUNDING_PUSH_CONSTANT_SIZE, 192);
        assert_eq!(
            BackendError::MissingFeature("PUSH_CONSTANTS").to_string(),
            "device does not have the PUSH_CONSTANTS feature"
        );
    }
}
