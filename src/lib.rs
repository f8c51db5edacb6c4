// src/lib.rs
//! Cairn scene graph
//!
//! Loads OBJ and glTF scenes into a node hierarchy with shared mesh, material
//! and texture tables, computes per-mesh bounding boxes on the GPU and turns
//! the graph into draw commands for wgpu.

pub mod config;
pub mod error;
pub mod gfx;
pub mod import;
pub mod prelude;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use config::SceneConfig;
pub use error::{IndexKind, SceneError};
pub use gfx::scene::{Scene, SceneBuilder};

/// Opens a headless `wgpu` backend and loads the scene at `path` with default settings
pub fn load_headless(
    path: impl AsRef<std::path::Path>,
) -> Result<(gfx::backend::WgpuBackend, Scene<gfx::backend::WgpuBackend>), Box<dyn std::error::Error>>
{
    let backend = pollster::block_on(gfx::backend::WgpuBackend::headless())?;
    let scene = SceneBuilder::new(&backend).load(path)?;
    Ok((backend, scene))
}
