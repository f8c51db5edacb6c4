//! The scene: node graph plus the resource tables it indexes into
//!
//! A [`Scene`] is created once by the
//! [`SceneBuilder`](crate::gfx::scene::SceneBuilder) and is read-only
//! afterwards. All cross references are plain indices that were checked while
//! building; the accessors still check them again and report
//! [`SceneError::InvalidIndex`] rather than panicking.

use std::path::PathBuf;

use cgmath::Matrix4;

use super::aabb::Aabb;
use super::mesh::Mesh;
use super::node::Node;
use crate::error::{IndexKind, SceneError};
use crate::gfx::backend::RenderBackend;
use crate::gfx::bounds::BoxCorners;
use crate::gfx::resources::material::Material;

/// One entry of a scene's texture table
pub struct Texture<B: RenderBackend> {
    /// Normalized file path, `None` for the three default textures
    pub source: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub handle: B::Texture,
}

impl<B: RenderBackend> std::fmt::Debug for Texture<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("source", &self.source)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Scene statistics for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStatistics {
    pub node_count: usize,
    pub mesh_count: usize,
    pub material_count: usize,
    pub texture_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub has_bounds: bool,
}

pub struct Scene<B: RenderBackend> {
    pub(crate) nodes: Vec<Node>,
    pub(crate) meshes: Vec<Mesh<B>>,
    pub(crate) materials: Vec<Material<B>>,
    pub(crate) textures: Vec<Texture<B>>,
    pub(crate) aabb: Aabb,
    pub(crate) bounds: Option<Vec<BoxCorners>>,
}

/// Pre-order walk over a node table with an explicit stack
///
/// `visit` sees every node reachable from `start` together with its
/// accumulated transform `accumulated * ... * parent * node`. Children are
/// visited in order, exactly as a recursive walk would.
pub(crate) fn walk_nodes<F>(
    nodes: &[Node],
    start: usize,
    accumulated: Matrix4<f32>,
    mut visit: F,
) -> Result<(), SceneError>
where
    F: FnMut(usize, &Node, &Matrix4<f32>) -> Result<(), SceneError>,
{
    let mut stack = vec![(start, accumulated)];
    while let Some((index, parent)) = stack.pop() {
        let node = nodes
            .get(index)
            .ok_or_else(|| SceneError::invalid_index(IndexKind::Node, index, nodes.len()))?;
        let local = parent * node.transformation;
        visit(index, node, &local)?;
        stack.extend(node.child_indices.iter().rev().map(|&child| (child, local)));
    }
    Ok(())
}

/// Union of every mesh occurrence's box in root space
pub(crate) fn occurrence_bounds<B: RenderBackend>(
    nodes: &[Node],
    meshes: &[Mesh<B>],
    root: Matrix4<f32>,
) -> Result<Aabb, SceneError> {
    let mut aabb = Aabb::empty();
    walk_nodes(nodes, 0, root, |_, node, local| {
        for &mesh_index in &node.mesh_indices {
            let mesh = meshes.get(mesh_index).ok_or_else(|| {
                SceneError::invalid_index(IndexKind::Mesh, mesh_index, meshes.len())
            })?;
            aabb = aabb.union(&mesh.aabb.transformed(local));
        }
        Ok(())
    })?;
    Ok(aabb)
}

impl<B: RenderBackend> Scene<B> {
    pub fn node(&self, index: usize) -> Result<&Node, SceneError> {
        self.nodes
            .get(index)
            .ok_or_else(|| SceneError::invalid_index(IndexKind::Node, index, self.nodes.len()))
    }

    pub fn mesh(&self, index: usize) -> Result<&Mesh<B>, SceneError> {
        self.meshes
            .get(index)
            .ok_or_else(|| SceneError::invalid_index(IndexKind::Mesh, index, self.meshes.len()))
    }

    pub fn material(&self, index: usize) -> Result<&Material<B>, SceneError> {
        self.materials.get(index).ok_or_else(|| {
            SceneError::invalid_index(IndexKind::Material, index, self.materials.len())
        })
    }

    pub fn texture(&self, index: usize) -> Result<&Texture<B>, SceneError> {
        self.textures.get(index).ok_or_else(|| {
            SceneError::invalid_index(IndexKind::Texture, index, self.textures.len())
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn meshes(&self) -> &[Mesh<B>] {
        &self.meshes
    }

    pub fn materials(&self) -> &[Material<B>] {
        &self.materials
    }

    pub fn textures(&self) -> &[Texture<B>] {
        &self.textures
    }

    /// World-space bounds of the whole scene
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Per-mesh box corners from the bounds pass, `None` if it did not run
    pub fn bounds(&self) -> Option<&[BoxCorners]> {
        self.bounds.as_deref()
    }

    pub fn has_bounds(&self) -> bool {
        self.bounds.is_some()
    }

    /// Fits the scene into a unit cube around the origin
    pub fn normalization_transform(&self) -> Matrix4<f32> {
        self.aabb.normalization_transform()
    }

    /// Visits every node in pre-order with its accumulated transform
    pub fn walk<F>(&self, root: Matrix4<f32>, visit: F) -> Result<(), SceneError>
    where
        F: FnMut(usize, &Node, &Matrix4<f32>) -> Result<(), SceneError>,
    {
        walk_nodes(&self.nodes, 0, root, visit)
    }

    pub fn statistics(&self) -> SceneStatistics {
        SceneStatistics {
            node_count: self.nodes.len(),
            mesh_count: self.meshes.len(),
            material_count: self.materials.len(),
            texture_count: self.textures.len(),
            vertex_count: self.meshes.iter().map(|m| m.vertex_count).sum(),
            triangle_count: self.meshes.iter().map(Mesh::triangle_count).sum(),
            has_bounds: self.bounds.is_some(),
        }
    }
}

impl<B: RenderBackend> std::fmt::Debug for Scene<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("statistics", &self.statistics())
            .field("aabb", &self.aabb)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector3};

    fn node(children: &[usize], offset: f32) -> Node {
        Node {
            transformation: Matrix4::from_translation(Vector3::new(offset, 0.0, 0.0)),
            child_indices: children.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_walk_is_pre_order_with_accumulated_transforms() {
        // 0 -> [1 -> [3], 2]
        let nodes = vec![
            node(&[1, 2], 1.0),
            node(&[3], 10.0),
            node(&[], 100.0),
            node(&[], 1000.0),
        ];
        let mut visited = Vec::new();
        walk_nodes(&nodes, 0, Matrix4::identity(), |index, _, local| {
            visited.push((index, local.w.x));
            Ok(())
        })
        .unwrap();
        assert_eq!(visited, vec![(0, 1.0), (1, 11.0), (3, 1011.0), (2, 101.0)]);
    }

    #[test]
    fn test_walk_reports_dangling_child() {
        let nodes = vec![node(&[7], 0.0)];
        let result = walk_nodes(&nodes, 0, Matrix4::identity(), |_, _, _| Ok(()));
        assert!(matches!(
            result,
            Err(SceneError::InvalidIndex { kind: IndexKind::Node, index: 7, len: 1 })
        ));
    }

    #[test]
    fn test_walk_handles_deep_chains() {
        let depth = 100_000;
        let nodes: Vec<Node> = (0..depth)
            .map(|i| {
                if i + 1 < depth {
                    node(&[i + 1], 0.0)
                } else {
                    node(&[], 0.0)
                }
            })
            .collect();
        let mut count = 0;
        walk_nodes(&nodes, 0, Matrix4::identity(), |_, _, _| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, depth);
    }
}
