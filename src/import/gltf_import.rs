//! glTF 2.0 import through the `gltf` crate
//!
//! Every primitive becomes its own mesh, so a glTF mesh with several
//! primitives turns into several mesh indices on the node that instances it.
//! Node matrices are column-major in glTF and are taken over unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cgmath::Matrix4;
use log::debug;

use super::{fallback_material, ImportError, ParsedMaterial, ParsedMesh, ParsedNode, ParsedScene};
use crate::gfx::resources::texture_table::TextureSlot;

fn texture_path(texture: gltf::Texture, material: &str) -> Result<PathBuf, ImportError> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
            // glTF URIs are percent-encoded, `my%20tex.png` names `my tex.png`
            let decoded = urlencoding::decode(uri).map_err(|_| ImportError::TextureUri {
                material: material.to_string(),
                uri: uri.to_string(),
            })?;
            Ok(PathBuf::from(decoded.into_owned()))
        }
        _ => Err(ImportError::EmbeddedTexture {
            material: material.to_string(),
        }),
    }
}

fn convert_material(material: &gltf::Material) -> Result<ParsedMaterial, ImportError> {
    let name = material
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or_default()));
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();

    let mut textures = BTreeMap::new();
    if let Some(info) = pbr.base_color_texture() {
        textures.insert(TextureSlot::Diffuse, texture_path(info.texture(), &name)?);
    }
    if let Some(info) = pbr.metallic_roughness_texture() {
        textures.insert(TextureSlot::Specular, texture_path(info.texture(), &name)?);
    }
    if let Some(info) = material.occlusion_texture() {
        textures.insert(TextureSlot::Ambient, texture_path(info.texture(), &name)?);
    }
    if let Some(info) = material.emissive_texture() {
        textures.insert(TextureSlot::Emissive, texture_path(info.texture(), &name)?);
    }
    if let Some(info) = material.normal_texture() {
        textures.insert(TextureSlot::Normal, texture_path(info.texture(), &name)?);
    }

    Ok(ParsedMaterial {
        name,
        ambient: None,
        diffuse: Some([r, g, b]),
        specular: None,
        emissive: Some(material.emissive_factor()),
        shininess: (1.0 - pbr.roughness_factor()) * 128.0,
        textures,
    })
}

fn convert_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    material_index: usize,
) -> Result<ParsedMesh, ImportError> {
    let name = match mesh.name() {
        Some(name) => format!("{}#{}", name, primitive.index()),
        None => format!("mesh_{}#{}", mesh.index(), primitive.index()),
    };

    if primitive.mode() != gltf::mesh::Mode::Triangles {
        return Err(ImportError::UnsupportedPrimitive {
            mesh: name,
            mode: format!("{:?}", primitive.mode()),
        });
    }

    let reader =
        primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .map(|iter| iter.collect())
        .ok_or_else(|| ImportError::MissingPositions { mesh: name.clone() })?;
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| iter.collect())
        .unwrap_or_default();
    let tex_coords: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|read| read.into_f32().collect());
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|read| read.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    Ok(ParsedMesh {
        name,
        positions,
        normals,
        tex_coords,
        indices,
        face_arities: Vec::new(),
        material_index,
    })
}

fn convert_node(node: &gltf::Node, mesh_map: &[Vec<usize>]) -> ParsedNode {
    let mut parsed = ParsedNode::new(
        node.name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{}", node.index())),
    )
    .with_transform(Matrix4::from(node.transform().matrix()));

    if let Some(mesh) = node.mesh() {
        parsed = parsed.with_meshes(mesh_map[mesh.index()].iter().copied());
    }
    for child in node.children() {
        parsed = parsed.with_child(convert_node(&child, mesh_map));
    }
    parsed
}

pub fn load_gltf_scene(path: &Path) -> Result<ParsedScene, ImportError> {
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
    let buffers = gltf::import_buffers(&document, Some(&base_dir), blob)?;

    let mut materials = document
        .materials()
        .map(|material| convert_material(&material))
        .collect::<Result<Vec<_>, _>>()?;
    let mut fallback_index = None;

    let mut meshes = Vec::new();
    let mut mesh_map = Vec::with_capacity(document.meshes().len());
    for mesh in document.meshes() {
        let mut primitive_meshes = Vec::new();
        for primitive in mesh.primitives() {
            let material_index = match primitive.material().index() {
                Some(index) => index,
                None => *fallback_index.get_or_insert_with(|| {
                    materials.push(fallback_material());
                    materials.len() - 1
                }),
            };
            primitive_meshes.push(meshes.len());
            meshes.push(convert_primitive(&mesh, &primitive, &buffers, material_index)?);
        }
        mesh_map.push(primitive_meshes);
    }

    let scene = document.default_scene().or_else(|| document.scenes().next());
    let mut roots: Vec<ParsedNode> = scene
        .map(|scene| {
            scene
                .nodes()
                .map(|node| convert_node(&node, &mesh_map))
                .collect()
        })
        .unwrap_or_default();

    let root = if roots.len() == 1 {
        roots.remove(0)
    } else {
        roots
            .into_iter()
            .fold(ParsedNode::new("root"), |root, child| root.with_child(child))
    };

    debug!(
        "glTF {}: {} buffers, {} primitives",
        path.display(),
        buffers.len(),
        meshes.len()
    );

    Ok(ParsedScene {
        root,
        meshes,
        materials,
        base_dir,
    })
}
