//! Scene file importers
//!
//! Importers turn OBJ/MTL and glTF files into a [`ParsedScene`]: plain CPU data
//! with a node tree, mesh and material tables and texture references relative to
//! [`ParsedScene::base_dir`]. They never touch the GPU, so a `ParsedScene` can
//! also be assembled by hand and fed straight into the scene builder.

pub mod gltf_import;
pub mod obj_import;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cgmath::{Matrix4, SquareMatrix};
use log::info;

use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::gfx::resources::texture_table::TextureSlot;

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("OBJ import failed: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("glTF import failed: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("unsupported scene format '{0}'")]
    UnsupportedFormat(String),

    #[error("mesh '{mesh}' uses primitive mode {mode}, only triangle lists are supported")]
    UnsupportedPrimitive { mesh: String, mode: String },

    #[error("material '{material}' uses an embedded texture, only texture files are supported")]
    EmbeddedTexture { material: String },

    #[error("material '{material}' references texture URI '{uri}' that is not valid UTF-8 once decoded")]
    TextureUri { material: String, uri: String },

    #[error("mesh '{mesh}' has no vertex positions")]
    MissingPositions { mesh: String },
}

/// A node of the imported hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNode {
    pub name: String,
    /// Local-to-parent transform, column vector convention
    pub transform: Matrix4<f32>,
    /// Indices into [`ParsedScene::meshes`], drawn in this order
    pub mesh_indices: Vec<usize>,
    pub children: Vec<ParsedNode>,
}

impl Default for ParsedNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Matrix4::identity(),
            mesh_indices: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl ParsedNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_meshes(mut self, mesh_indices: impl IntoIterator<Item = usize>) -> Self {
        self.mesh_indices.extend(mesh_indices);
        self
    }

    pub fn with_child(mut self, child: ParsedNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(ParsedNode::subtree_len).sum::<usize>()
    }
}

/// Triangle geometry of one imported mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// One normal per position, or empty
    pub normals: Vec<[f32; 3]>,
    /// UV channel 0, origin top-left
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
    /// Index count of each face; empty means every face is a triangle
    pub face_arities: Vec<u32>,
    pub material_index: usize,
}

/// Material description as found in the source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMaterial {
    pub name: String,
    pub ambient: Option<[f32; 3]>,
    pub diffuse: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub emissive: Option<[f32; 3]>,
    pub shininess: f32,
    /// Texture references relative to the scene's base directory
    pub textures: BTreeMap<TextureSlot, PathBuf>,
}

impl ParsedMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_texture(mut self, slot: TextureSlot, path: impl Into<PathBuf>) -> Self {
        self.textures.insert(slot, path.into());
        self
    }
}

/// Everything the scene builder needs, straight out of a scene file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedScene {
    pub root: ParsedNode,
    pub meshes: Vec<ParsedMesh>,
    pub materials: Vec<ParsedMaterial>,
    /// Directory texture references are resolved against
    pub base_dir: PathBuf,
}

/// Material used for meshes whose source names none
pub(crate) fn fallback_material() -> ParsedMaterial {
    ParsedMaterial {
        name: "default".to_string(),
        diffuse: Some([0.8, 0.8, 0.8]),
        ..Default::default()
    }
}

/// Loads a scene file, picking the importer from the file extension
pub fn load_scene(path: &Path, config: &SceneConfig) -> Result<ParsedScene, SceneError> {
    if !path.exists() {
        return Err(SceneError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let scene = match extension.as_str() {
        "obj" => obj_import::load_obj_scene(path, config)?,
        "gltf" | "glb" => gltf_import::load_gltf_scene(path)?,
        _ => return Err(ImportError::UnsupportedFormat(extension).into()),
    };

    info!(
        "Imported {}: {} nodes, {} meshes, {} materials",
        path.display(),
        scene.root.subtree_len(),
        scene.meshes.len(),
        scene.materials.len()
    );
    Ok(scene)
}
