//! Scene graph nodes

use cgmath::{Matrix4, SquareMatrix};

/// One node of the scene graph
///
/// Nodes live in a flat table with the root at index 0. Children and meshes
/// are referenced by index and kept in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    /// Local-to-parent transform
    pub transformation: Matrix4<f32>,
    pub mesh_indices: Vec<usize>,
    pub child_indices: Vec<usize>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            transformation: Matrix4::identity(),
            mesh_indices: Vec::new(),
            child_indices: Vec::new(),
        }
    }
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.child_indices.is_empty()
    }
}
