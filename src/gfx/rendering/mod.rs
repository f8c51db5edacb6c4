//! Scene rendering on top of the command emitter
//!
//! - [`pipeline_manager`] registers and creates render pipelines from WGSL
//! - [`scene_renderer`] owns the scene pipelines and frame uniforms and draws
//!   a scene through a [`RenderPassSink`](crate::gfx::backend::RenderPassSink)

pub mod pipeline_manager;
pub mod scene_renderer;

pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use scene_renderer::{FrameParams, FrameStats, FrameUniforms, RendererError, SceneRenderer};
