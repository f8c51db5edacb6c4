//! Error types for scene loading and traversal
//!
//! Every fatal condition of a scene load ends up in [`SceneError`]. Capability
//! problems of the bounding-volume pass are reported as [`FeedbackError`] and
//! only become fatal when they are something other than
//! [`FeedbackError::Unsupported`].

use std::path::PathBuf;

use crate::{
    config::ConfigError,
    gfx::{bounds::FeedbackError, resources::image_decoder::ImageDecodeError},
    import::ImportError,
};

/// Which resource table an index was checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Node,
    Mesh,
    Material,
    Texture,
    Vertex,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IndexKind::Node => "node",
            IndexKind::Mesh => "mesh",
            IndexKind::Material => "material",
            IndexKind::Texture => "texture",
            IndexKind::Vertex => "vertex",
        };
        f.write_str(name)
    }
}

/// Errors produced while building or traversing a scene
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error("scene file {0} does not exist")]
    NotFound(PathBuf),

    #[error("failed to import scene: {0}")]
    Import(#[from] ImportError),

    #[error("failed to decode texture {path}: {source}")]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: ImageDecodeError,
    },

    #[error("mesh {mesh}: face {face} has {arity} indices, only triangles are supported")]
    NonTriangularFace { mesh: usize, face: usize, arity: u32 },

    #[error("mesh {mesh} is malformed: {reason}")]
    MalformedMesh { mesh: usize, reason: String },

    #[error("{kind} index {index} is out of range (table holds {len})")]
    InvalidIndex {
        kind: IndexKind,
        index: usize,
        len: usize,
    },

    #[error("bounding-volume feedback failed: {0}")]
    Feedback(#[from] FeedbackError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SceneError {
    pub(crate) fn invalid_index(kind: IndexKind, index: usize, len: usize) -> Self {
        SceneError::InvalidIndex { kind, index, len }
    }
}
