//! OBJ/MTL import through `tobj`
//!
//! OBJ has no hierarchy: the scene gets an identity root with one child per
//! object, each drawing the single mesh `tobj` produced for it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::{fallback_material, ImportError, ParsedMaterial, ParsedMesh, ParsedNode, ParsedScene};
use crate::config::SceneConfig;
use crate::gfx::resources::texture_table::TextureSlot;

/// Parses an MTL colour parameter such as `Ke 1.0 0.5 0.0`
fn parse_color(value: &str) -> Option<[f32; 3]> {
    let mut parts = value.split_whitespace().map(str::parse::<f32>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(r)), Some(Ok(g)), Some(Ok(b))) => Some([r, g, b]),
        _ => None,
    }
}

/// Argument counts `(required, max)` of the MTL texture map options
fn map_option_arity(flag: &str) -> Option<(usize, usize)> {
    match flag {
        "-blendu" | "-blendv" | "-bm" | "-boost" | "-cc" | "-clamp" | "-imfchan"
        | "-texres" | "-type" => Some((1, 1)),
        "-mm" => Some((2, 2)),
        "-o" | "-s" | "-t" => Some((1, 3)),
        _ => None,
    }
}

/// Splits off the first whitespace-separated token
fn split_token(value: &str) -> (&str, &str) {
    let value = value.trim_start();
    match value.find(char::is_whitespace) {
        Some(end) => (&value[..end], value[end..].trim_start()),
        None => (value, ""),
    }
}

/// Strips map options like `-bm 0.5` and keeps the rest of the line as the file name
///
/// Optional option arguments (`v` and `w` of `-o`, `-s` and `-t`) are only
/// consumed when they are numbers, so the file name keeps any inner spaces.
fn texture_reference(value: &str) -> Option<&str> {
    let mut rest = value.trim_start();
    while rest.starts_with('-') {
        let (flag, after_flag) = split_token(rest);
        let Some((required, max)) = map_option_arity(flag) else {
            break;
        };
        rest = after_flag;
        for position in 0..max {
            let (argument, after_argument) = split_token(rest);
            if argument.is_empty() || (position >= required && argument.parse::<f32>().is_err()) {
                break;
            }
            rest = after_argument;
        }
    }
    let path = rest.trim();
    (!path.is_empty()).then_some(path)
}

fn convert_material(mtl: &tobj::Material) -> ParsedMaterial {
    let param = |key: &str| mtl.unknown_param.get(key).map(String::as_str);

    let references = [
        (TextureSlot::Ambient, mtl.ambient_texture.as_deref()),
        (TextureSlot::Diffuse, mtl.diffuse_texture.as_deref()),
        (TextureSlot::Specular, mtl.specular_texture.as_deref()),
        (TextureSlot::Emissive, param("map_Ke")),
        (
            TextureSlot::Normal,
            mtl.normal_texture
                .as_deref()
                .or_else(|| param("map_Bump"))
                .or_else(|| param("bump"))
                .or_else(|| param("norm")),
        ),
    ];

    let textures: BTreeMap<TextureSlot, PathBuf> = references
        .into_iter()
        .filter_map(|(slot, value)| Some((slot, texture_reference(value?)?.into())))
        .collect();

    ParsedMaterial {
        name: mtl.name.clone(),
        ambient: mtl.ambient,
        diffuse: mtl.diffuse,
        specular: mtl.specular,
        emissive: param("Ke").and_then(parse_color),
        shininess: mtl.shininess.unwrap_or(0.0),
        textures,
    }
}

fn convert_mesh(
    model: &tobj::Model,
    material_index: usize,
    flip_texcoords: bool,
) -> Result<ParsedMesh, ImportError> {
    let mesh = &model.mesh;
    if mesh.positions.is_empty() && !mesh.indices.is_empty() {
        return Err(ImportError::MissingPositions {
            mesh: model.name.clone(),
        });
    }

    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let normals = mesh
        .normals
        .chunks_exact(3)
        .map(|n| [n[0], n[1], n[2]])
        .collect();
    let tex_coords = (!mesh.texcoords.is_empty()).then(|| {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| {
                if flip_texcoords {
                    [t[0], 1.0 - t[1]]
                } else {
                    [t[0], t[1]]
                }
            })
            .collect()
    });

    Ok(ParsedMesh {
        name: model.name.clone(),
        positions,
        normals,
        tex_coords,
        indices: mesh.indices.clone(),
        face_arities: mesh.face_arities.clone(),
        material_index,
    })
}

pub fn load_obj_scene(path: &Path, config: &SceneConfig) -> Result<ParsedScene, ImportError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let materials = materials.unwrap_or_else(|e| {
        warn!(
            "No usable MTL for {}: {}, using default materials",
            path.display(),
            e
        );
        Vec::new()
    });

    let mut parsed_materials: Vec<ParsedMaterial> =
        materials.iter().map(convert_material).collect();
    let mut fallback_index = None;

    let mut meshes = Vec::with_capacity(models.len());
    let mut root = ParsedNode::new(
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );

    for model in &models {
        let material_index = match model.mesh.material_id {
            Some(id) if id < parsed_materials.len() => id,
            _ => *fallback_index.get_or_insert_with(|| {
                parsed_materials.push(fallback_material());
                parsed_materials.len() - 1
            }),
        };

        debug!(
            "OBJ object '{}': {} vertices, {} indices, material {}",
            model.name,
            model.mesh.positions.len() / 3,
            model.mesh.indices.len(),
            material_index
        );

        let node = ParsedNode::new(model.name.clone()).with_meshes([meshes.len()]);
        root = root.with_child(node);
        meshes.push(convert_mesh(model, material_index, config.flip_obj_texcoords)?);
    }

    Ok(ParsedScene {
        root,
        meshes,
        materials: parsed_materials,
        base_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
    })
}
