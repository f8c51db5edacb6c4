//! # Graphics Module
//!
//! Everything between a parsed scene file and a recorded render pass.
//!
//! ## Architecture Overview
//!
//! - **Scene Graph** ([`scene`]) - Node hierarchy over flat mesh, material and texture tables
//! - **Resources** ([`resources`]) - Texture indexing, image decoding and materials
//! - **Bounds** ([`bounds`]) - Per-mesh bounding boxes reduced on the GPU and read back
//! - **Backends** ([`backend`]) - Resource creation and command sinks, `wgpu` or recording
//! - **Rendering** ([`rendering`]) - Mesh and bounding-box pipelines for a `wgpu` render pass
//!
//! ## Usage
//!
//! ```no_run
//! use cairn::gfx::{backend::WgpuBackend, rendering::SceneRenderer, scene::SceneBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = pollster::block_on(WgpuBackend::headless())?;
//! let scene = SceneBuilder::new(&backend).load("assets/sponza.obj")?;
//! let renderer = SceneRenderer::new(&backend, wgpu::TextureFormat::Rgba8UnormSrgb)?;
//! // renderer.draw(&mut render_pass, &scene, &params)?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod bounds;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use backend::{CommandSink, DrawMode, RenderBackend};
pub use rendering::SceneRenderer;
pub use scene::{Scene, SceneBuilder};
