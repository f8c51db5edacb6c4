//! Scene meshes and the geometry checks run before upload

use cgmath::{InnerSpace, Vector3, Zero};
use log::warn;

use super::aabb::Aabb;
use super::vertex::Vertex3D;
use crate::error::{IndexKind, SceneError};
use crate::gfx::backend::RenderBackend;
use crate::import::ParsedMesh;

/// One entry of a scene's mesh table
pub struct Mesh<B: RenderBackend> {
    pub name: String,
    pub buffers: B::MeshBuffers,
    pub material_index: usize,
    /// Mesh-local bounds, empty for meshes without vertices
    pub aabb: Aabb,
    pub vertex_count: usize,
    pub index_count: usize,
}

impl<B: RenderBackend> Mesh<B> {
    pub fn triangle_count(&self) -> usize {
        self.index_count / 3
    }
}

impl<B: RenderBackend> std::fmt::Debug for Mesh<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("material_index", &self.material_index)
            .field("aabb", &self.aabb)
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .finish_non_exhaustive()
    }
}

/// Validated, interleaved geometry ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
    pub aabb: Aabb,
}

/// Area-weighted smooth normals
///
/// Each triangle adds its unnormalized face normal to its three vertices, so
/// larger faces weigh more. Vertices no triangle touches get +Y.
pub fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vector3::<f32>::zero(); positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let v0 = Vector3::from(positions[i0]);
        let v1 = Vector3::from(positions[i1]);
        let v2 = Vector3::from(positions[i2]);
        let face_normal = (v1 - v0).cross(v2 - v0);
        for index in [i0, i1, i2] {
            sums[index] += face_normal;
        }
    }

    sums.into_iter()
        .map(|sum| {
            if sum.magnitude2() > f32::EPSILON * f32::EPSILON {
                sum.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

/// Checks a parsed mesh and interleaves it into [`Vertex3D`]s
///
/// `mesh_index` only labels errors.
pub fn prepare_geometry(
    mesh_index: usize,
    mesh: &ParsedMesh,
    material_count: usize,
    generate_missing_normals: bool,
) -> Result<MeshGeometry, SceneError> {
    let vertex_count = mesh.positions.len();

    if mesh.face_arities.is_empty() {
        if mesh.indices.len() % 3 != 0 {
            return Err(SceneError::NonTriangularFace {
                mesh: mesh_index,
                face: mesh.indices.len() / 3,
                arity: (mesh.indices.len() % 3) as u32,
            });
        }
    } else {
        let bad_face = mesh.face_arities.iter().enumerate().find(|&(_, &a)| a != 3);
        if let Some((face, &arity)) = bad_face {
            return Err(SceneError::NonTriangularFace {
                mesh: mesh_index,
                face,
                arity,
            });
        }
        if mesh.face_arities.len() * 3 != mesh.indices.len() {
            return Err(SceneError::MalformedMesh {
                mesh: mesh_index,
                reason: format!(
                    "{} faces but {} indices",
                    mesh.face_arities.len(),
                    mesh.indices.len()
                ),
            });
        }
    }

    if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(SceneError::invalid_index(
            IndexKind::Vertex,
            index as usize,
            vertex_count,
        ));
    }

    if mesh.material_index >= material_count {
        return Err(SceneError::invalid_index(
            IndexKind::Material,
            mesh.material_index,
            material_count,
        ));
    }

    if let Some(tex_coords) = &mesh.tex_coords {
        if tex_coords.len() != vertex_count {
            return Err(SceneError::MalformedMesh {
                mesh: mesh_index,
                reason: format!(
                    "{} texture coordinates for {} vertices",
                    tex_coords.len(),
                    vertex_count
                ),
            });
        }
    }

    let generated;
    let normals = if mesh.normals.len() == vertex_count {
        &mesh.normals
    } else if generate_missing_normals {
        if !mesh.normals.is_empty() {
            warn!(
                "Mesh {} ('{}') has {} normals for {} vertices, regenerating",
                mesh_index,
                mesh.name,
                mesh.normals.len(),
                vertex_count
            );
        }
        generated = smooth_normals(&mesh.positions, &mesh.indices);
        &generated
    } else {
        return Err(SceneError::MalformedMesh {
            mesh: mesh_index,
            reason: format!(
                "{} normals for {} vertices",
                mesh.normals.len(),
                vertex_count
            ),
        });
    };

    let vertices = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, position)| Vertex3D {
            position: *position,
            normal: normals[i],
            tex_coord: mesh
                .tex_coords
                .as_ref()
                .map_or([0.0, 0.0], |tex_coords| tex_coords[i]),
        })
        .collect();

    Ok(MeshGeometry {
        vertices,
        indices: mesh.indices.clone(),
        aabb: Aabb::from_points(&mesh.positions),
    })
}
