//! # Scene Graph Module
//!
//! Hierarchical scenes of transformation nodes over flat mesh, material and
//! texture tables, and the traversal that turns them into draw commands.
//!
//! ## Key Components
//!
//! - [`Scene`] - Owns the node graph and every resource table
//! - [`SceneBuilder`] - Builds a scene from a file or a [`ParsedScene`](crate::import::ParsedScene)
//! - [`Aabb`] - Axis-aligned bounds with an explicit empty box
//! - [`Vertex3D`] - Vertex layout shared by all meshes
//!
//! ## Usage
//!
//! ```no_run
//! use cairn::gfx::backend::{CommandRecorder, DrawMode, RecordingBackend};
//! use cairn::gfx::scene::SceneBuilder;
//! use cgmath::{Matrix4, SquareMatrix};
//!
//! let backend = RecordingBackend::new();
//! let scene = SceneBuilder::new(&backend).load("assets/sponza.obj")?;
//!
//! let mut recorder = CommandRecorder::new();
//! let stats = scene.record(&mut recorder, Matrix4::identity(), DrawMode::Mesh)?;
//! println!("{} draws", stats.draws);
//! # Ok::<(), cairn::SceneError>(())
//! ```

pub mod aabb;
pub mod builder;
pub mod emitter;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use aabb::Aabb;
pub use builder::SceneBuilder;
pub use emitter::EmitStats;
pub use mesh::Mesh;
pub use node::Node;
pub use scene::{Scene, SceneStatistics, Texture};
pub use vertex::Vertex3D;
