//! Building a [`Scene`] from a [`ParsedScene`]
//!
//! Construction runs in a fixed order: texture scan, meshes, nodes, scene
//! bounds, textures (defaults first), materials and finally the bounds pass.
//! It either returns a complete scene or the first error.

use std::path::Path;

use cgmath::{Matrix4, SquareMatrix};
use log::{debug, info, warn};

use super::mesh::{prepare_geometry, Mesh};
use super::node::Node;
use super::scene::{occurrence_bounds, Scene, Texture};
use crate::config::SceneConfig;
use crate::error::{IndexKind, SceneError};
use crate::gfx::backend::RenderBackend;
use crate::gfx::bounds::{check_result_len, BoundsRequest, BoxCorners, FeedbackError};
use crate::gfx::resources::{
    image_decoder::{DecodedImage, ImageCrateDecoder, ImageDecoder},
    material::{Material, MaterialConstants},
    texture_table::TextureTable,
};
use crate::import::{self, ParsedNode, ParsedScene};

pub struct SceneBuilder<'a, B: RenderBackend> {
    backend: &'a B,
    config: SceneConfig,
    decoder: Box<dyn ImageDecoder + 'a>,
}

impl<'a, B: RenderBackend> SceneBuilder<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            config: SceneConfig::default(),
            decoder: Box::new(ImageCrateDecoder),
        }
    }

    pub fn with_config(mut self, config: SceneConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_decoder(mut self, decoder: impl ImageDecoder + 'a) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Imports a scene file and builds it
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Scene<B>, SceneError> {
        let parsed = import::load_scene(path.as_ref(), &self.config)?;
        self.build(&parsed)
    }

    pub fn build(&self, parsed: &ParsedScene) -> Result<Scene<B>, SceneError> {
        let texture_table = TextureTable::scan(parsed.materials.iter().map(|m| &m.textures));
        debug!(
            "Texture scan found {} distinct texture files",
            texture_table.files().len()
        );

        let (meshes, bounds_request) = self.build_meshes(parsed)?;

        let mut nodes = Vec::with_capacity(parsed.root.subtree_len());
        build_node(&parsed.root, &mut nodes, meshes.len())?;

        let aabb = occurrence_bounds(&nodes, &meshes, Matrix4::identity())?;
        let textures = self.build_textures(parsed, &texture_table)?;
        let materials = self.build_materials(parsed, &texture_table, &textures);
        let bounds = self.compute_bounds(&bounds_request)?;

        let scene = Scene {
            nodes,
            meshes,
            materials,
            textures,
            aabb,
            bounds,
        };
        let stats = scene.statistics();
        info!(
            "Scene built: {} nodes, {} meshes, {} materials, {} textures, {} triangles, bounds {}",
            stats.node_count,
            stats.mesh_count,
            stats.material_count,
            stats.texture_count,
            stats.triangle_count,
            if stats.has_bounds { "available" } else { "unavailable" }
        );
        Ok(scene)
    }

    fn build_meshes(
        &self,
        parsed: &ParsedScene,
    ) -> Result<(Vec<Mesh<B>>, BoundsRequest), SceneError> {
        let mut meshes = Vec::with_capacity(parsed.meshes.len());
        let mut request = BoundsRequest::new();

        for (index, parsed_mesh) in parsed.meshes.iter().enumerate() {
            let geometry = prepare_geometry(
                index,
                parsed_mesh,
                parsed.materials.len(),
                self.config.generate_missing_normals,
            )?;
            let label = format!("Mesh {} '{}'", index, parsed_mesh.name);
            let buffers = self
                .backend
                .create_mesh_buffers(&label, &geometry.vertices, &geometry.indices);
            debug!(
                "{}: {} vertices, {} triangles, material {}",
                label,
                geometry.vertices.len(),
                geometry.indices.len() / 3,
                parsed_mesh.material_index
            );

            request.push_mesh(&parsed_mesh.positions);
            meshes.push(Mesh {
                name: parsed_mesh.name.clone(),
                buffers,
                material_index: parsed_mesh.material_index,
                aabb: geometry.aabb,
                vertex_count: geometry.vertices.len(),
                index_count: geometry.indices.len(),
            });
        }
        Ok((meshes, request))
    }

    fn build_textures(
        &self,
        parsed: &ParsedScene,
        table: &TextureTable,
    ) -> Result<Vec<Texture<B>>, SceneError> {
        let defaults = [
            ("Default White", self.config.default_white),
            ("Default Black", self.config.default_black),
            ("Default Normal", self.config.default_normal),
        ];

        let mut textures = Vec::with_capacity(table.texture_count());
        for (label, color) in defaults {
            let image = DecodedImage::solid_color(color);
            textures.push(Texture {
                source: None,
                width: image.width,
                height: image.height,
                handle: self.backend.create_texture(label, &image),
            });
        }

        for file in table.files() {
            let path = parsed.base_dir.join(file);
            let image = self
                .decoder
                .decode(&path)
                .map_err(|source| SceneError::TextureDecode {
                    path: path.clone(),
                    source,
                })?;
            debug!(
                "Texture {}: {} ({}x{})",
                textures.len(),
                path.display(),
                image.width,
                image.height
            );
            textures.push(Texture {
                source: Some(file.clone()),
                width: image.width,
                height: image.height,
                handle: self.backend.create_texture(&file.to_string_lossy(), &image),
            });
        }
        Ok(textures)
    }

    fn build_materials(
        &self,
        parsed: &ParsedScene,
        table: &TextureTable,
        textures: &[Texture<B>],
    ) -> Vec<Material<B>> {
        parsed
            .materials
            .iter()
            .enumerate()
            .map(|(index, parsed_material)| {
                let constants = MaterialConstants::from_parsed(parsed_material);
                // every resolved index is either a default or came from the scan
                let texture_indices = table.resolve_all(&parsed_material.textures);
                let label = format!("Material {} '{}'", index, parsed_material.name);
                let binding = self.backend.create_material_binding(
                    &label,
                    &constants,
                    texture_indices.map(|i| &textures[i].handle),
                );
                debug!("{}: textures {:?}", label, texture_indices);

                Material {
                    name: parsed_material.name.clone(),
                    constants,
                    texture_indices,
                    binding,
                }
            })
            .collect()
    }

    fn compute_bounds(
        &self,
        request: &BoundsRequest,
    ) -> Result<Option<Vec<BoxCorners>>, SceneError> {
        if !self.config.compute_bounds {
            debug!("Bounding-volume pass disabled by configuration");
            return Ok(None);
        }

        match self.backend.compute_bounding_corners(request) {
            Ok(boxes) => {
                check_result_len(request, &boxes)?;
                Ok(Some(boxes))
            }
            Err(FeedbackError::Unsupported(reason)) => {
                warn!("Bounding-box overlay unavailable: {}", reason);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Appends `parsed` and its subtree to `nodes` in pre-order, returning its index
fn build_node(
    parsed: &ParsedNode,
    nodes: &mut Vec<Node>,
    mesh_count: usize,
) -> Result<usize, SceneError> {
    if let Some(&bad) = parsed.mesh_indices.iter().find(|&&i| i >= mesh_count) {
        return Err(SceneError::invalid_index(IndexKind::Mesh, bad, mesh_count));
    }

    let index = nodes.len();
    nodes.push(Node {
        name: parsed.name.clone(),
        transformation: parsed.transform,
        mesh_indices: parsed.mesh_indices.clone(),
        child_indices: Vec::with_capacity(parsed.children.len()),
    });

    for child in &parsed.children {
        let child_index = build_node(child, nodes, mesh_count)?;
        nodes[index].child_indices.push(child_index);
    }
    Ok(index)
}
