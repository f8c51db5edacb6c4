//! Drawing a [`Scene`] into a render pass
//!
//! [`SceneRenderer`] owns the mesh and bounding-box pipelines plus the frame
//! uniforms (projection and light). The per-draw transforms come from the
//! scene traversal as push constants, so a frame is the bounding-box overlay
//! followed by the mesh pass, both rooted at `view * normalization`.

use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, Vector3};
use log::debug;

use super::pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
use crate::error::SceneError;
use crate::gfx::backend::wgpu_backend::{BOUNDING_PUSH_CONSTANT_SIZE, TRANSFORM_PUSH_CONSTANT_SIZE};
use crate::gfx::backend::{DrawMode, RenderPassSink, WgpuBackend};
use crate::gfx::resources::texture_resource::TextureResource;
use crate::gfx::scene::{EmitStats, Scene};
use crate::wgpu_utils::{binding_types, BindGroupBuilder, BindGroupLayoutBuilder, UniformBuffer};

const MESH_PIPELINE: &str = "scene_mesh";
const BOUNDING_BOX_PIPELINE: &str = "bounding_box";

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

#[derive(thiserror::Error, Debug)]
pub enum RendererError {
    #[error("failed to create pipelines: {}", .0.join("; "))]
    PipelineCreation(Vec<String>),

    #[error("pipeline '{0}' is missing")]
    MissingPipeline(&'static str),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Frame-constant shader inputs, bind group 0
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub projection: [[f32; 4]; 4],
    /// View-space direction the light travels in, w unused
    pub light_direction: [f32; 4],
    pub light_color: [f32; 4],
}

impl From<&FrameParams> for FrameUniforms {
    fn from(params: &FrameParams) -> Self {
        let direction = params.light_direction.normalize();
        Self {
            projection: params.projection.into(),
            light_direction: [direction.x, direction.y, direction.z, 0.0],
            light_color: [params.light_color[0], params.light_color[1], params.light_color[2], 1.0],
        }
    }
}

/// Camera, light and overlay switches for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    pub view: Matrix4<f32>,
    /// Already in wgpu clip space, see [`OPENGL_TO_WGPU_MATRIX`]
    pub projection: Matrix4<f32>,
    pub light_direction: Vector3<f32>,
    pub light_color: [f32; 3],
    pub show_meshes: bool,
    pub show_bounding_boxes: bool,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self::looking_at_origin(1.0)
    }
}

impl FrameParams {
    /// Camera two units in front of the normalized scene, looking down -z
    pub fn looking_at_origin(aspect: f32) -> Self {
        let view = Matrix4::look_at_rh(
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        let projection = OPENGL_TO_WGPU_MATRIX * perspective(Deg(45.0), aspect, 0.01, 100.0);
        Self {
            view,
            projection,
            light_direction: Vector3::new(-0.3, -0.5, -1.0),
            light_color: [1.0, 1.0, 1.0],
            show_meshes: true,
            show_bounding_boxes: false,
        }
    }

    pub fn with_bounding_boxes(mut self, show: bool) -> Self {
        self.show_bounding_boxes = show;
        self
    }
}

/// What one [`SceneRenderer::draw`] recorded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub overlay: EmitStats,
    pub meshes: EmitStats,
}

pub struct SceneRenderer {
    pipelines: PipelineManager,
    frame_ubo: UniformBuffer<FrameUniforms>,
    frame_bind_group: wgpu::BindGroup,
}

impl SceneRenderer {
    /// Creates the scene pipelines for a colour target of `color_format` with a
    /// [`TextureResource::DEPTH_FORMAT`] depth attachment
    pub fn new(backend: &WgpuBackend, color_format: wgpu::TextureFormat) -> Result<Self, RendererError> {
        let device = backend.device();

        let frame_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Frame Bind Group");
        let frame_ubo = UniformBuffer::new(device);
        let frame_bind_group = BindGroupBuilder::new(&frame_layout)
            .resource(frame_ubo.binding_resource())
            .create(device, "Frame Bind Group");

        let layouts = vec![
            frame_layout.layout.clone(),
            backend.material_bind_group_layout().clone(),
        ];

        let mut pipelines = PipelineManager::new(device.clone());
        pipelines.load_shader("scene_mesh.wgsl", include_str!("scene_mesh.wgsl"));
        pipelines.register_pipeline(
            MESH_PIPELINE,
            PipelineConfig::default_with_shader("scene_mesh.wgsl")
                .with_label("Scene Mesh Pipeline")
                .with_bind_group_layouts(layouts.clone())
                .with_vertex_push_constants(TRANSFORM_PUSH_CONSTANT_SIZE)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_color_format(color_format)
                .with_cull_mode(None),
        );

        // The overlay needs the larger push-constant block, so it only exists
        // where the bounds pass is available
        if backend.supports_bounds() {
            pipelines.load_shader("bounding_box.wgsl", include_str!("bounding_box.wgsl"));
            pipelines.register_pipeline(
                BOUNDING_BOX_PIPELINE,
                PipelineConfig::default_with_shader("bounding_box.wgsl")
                    .with_label("Bounding Box Pipeline")
                    .with_bind_group_layouts(layouts)
                    .with_vertex_push_constants(BOUNDING_PUSH_CONSTANT_SIZE)
                    .with_depth_format(TextureResource::DEPTH_FORMAT)
                    .with_color_format(color_format)
                    .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                    .with_cull_mode(None)
                    .with_no_vertex_buffers(),
            );
        }

        pipelines
            .create_all_pipelines()
            .map_err(RendererError::PipelineCreation)?;

        Ok(Self {
            pipelines,
            frame_ubo,
            frame_bind_group,
        })
    }

    /// Uploads the frame uniforms; call before the pass that uses them is submitted
    pub fn prepare(&mut self, queue: &wgpu::Queue, params: &FrameParams) {
        self.frame_ubo
            .update_content(queue, FrameUniforms::from(params));
    }

    /// Records the overlay (when enabled and the scene has bounds) and then the meshes
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        scene: &Scene<WgpuBackend>,
        params: &FrameParams,
    ) -> Result<FrameStats, RendererError> {
        let mesh_pipeline = self
            .pipelines
            .pipeline(MESH_PIPELINE)
            .ok_or(RendererError::MissingPipeline(MESH_PIPELINE))?;
        let bounding_box_pipeline = self.pipelines.pipeline(BOUNDING_BOX_PIPELINE);

        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        let root = params.view * scene.normalization_transform();

        let mut stats = FrameStats::default();
        match bounding_box_pipeline {
            Some(box_pipeline) if params.show_bounding_boxes => {
                let mut sink = RenderPassSink::new(pass, mesh_pipeline, box_pipeline);
                stats.overlay = scene.record(&mut sink, root, DrawMode::BoundingBox)?;
            }
            None if params.show_bounding_boxes => {
                debug!("Bounding-box overlay requested but unavailable on this device");
            }
            _ => {}
        }

        if params.show_meshes {
            // The mesh pass never selects the box pipeline
            let mut sink = RenderPassSink::new(
                pass,
                mesh_pipeline,
                bounding_box_pipeline.unwrap_or(mesh_pipeline),
            );
            stats.meshes = scene.record(&mut sink, root, DrawMode::Mesh)?;
        }
        Ok(stats)
    }

    pub fn pipeline_stats(&self) -> PipelineStats {
        self.pipelines.get_stats()
    }
}
