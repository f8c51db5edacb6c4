//! # Cairn Prelude
//!
//! Commonly used types in one import.
//!
//! ## Usage
//!
//! ```no_run
//! use cairn::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let backend = RecordingBackend::new();
//!     let scene = SceneBuilder::new(&backend)
//!         .with_config(SceneConfig::default().with_compute_bounds(false))
//!         .load("assets/cube.obj")?;
//!
//!     let mut recorder = CommandRecorder::new();
//!     scene.record(&mut recorder, Matrix4::identity(), DrawMode::Mesh)?;
//!     Ok(())
//! }
//! ```

// Re-export configuration and errors
pub use crate::config::SceneConfig;
pub use crate::error::{IndexKind, SceneError};

// Re-export scene graph types
pub use crate::gfx::scene::{Aabb, EmitStats, Mesh, Node, Scene, SceneBuilder, Vertex3D};
pub use crate::import::{load_scene, ParsedMaterial, ParsedMesh, ParsedNode, ParsedScene};

// Re-export resources
pub use crate::gfx::bounds::{BoundsRequest, BoxCorners};
pub use crate::gfx::resources::{DecodedImage, ImageDecoder, MaterialConstants, TextureSlot};

// Re-export backends and rendering
pub use crate::gfx::backend::{
    CommandRecorder, CommandSink, DrawMode, RecordedCommand, RecordingBackend, RenderBackend,
    WgpuBackend,
};
pub use crate::gfx::rendering::{FrameParams, SceneRenderer};

// Re-export common external dependencies
pub use cgmath::{Matrix4, SquareMatrix, Vector3};
