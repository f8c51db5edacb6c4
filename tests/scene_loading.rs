//! Scene construction through the public API, on the recording backend

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cairn::gfx::backend::recording::{RecordedMaterial, RecordedMesh, RecordedTexture};
use cairn::gfx::backend::{CommandRecorder, DrawMode, RecordingBackend, RenderBackend};
use cairn::gfx::bounds::{BoundsRequest, BoxCorners, FeedbackError};
use cairn::gfx::resources::image_decoder::{DecodedImage, ImageDecodeError, ImageDecoder};
use cairn::gfx::resources::material::MaterialConstants;
use cairn::gfx::resources::texture_table::{
    TextureSlot, BLACK_TEXTURE, FIRST_FILE_TEXTURE, FLAT_NORMAL_TEXTURE, TEXTURE_SLOT_COUNT,
    WHITE_TEXTURE,
};
use cairn::gfx::scene::{Aabb, Vertex3D};
use cairn::import::{ParsedMaterial, ParsedMesh, ParsedNode, ParsedScene};
use cairn::{IndexKind, SceneBuilder, SceneConfig, SceneError};
use cgmath::{Deg, Matrix4, SquareMatrix, Vector3};

/// Decodes from a fixed set of in-memory images
#[derive(Default)]
struct MemoryDecoder {
    images: HashMap<PathBuf, DecodedImage>,
}

impl MemoryDecoder {
    fn with_image(mut self, path: impl Into<PathBuf>, rgba: [u8; 4]) -> Self {
        self.images.insert(path.into(), DecodedImage::solid_color(rgba));
        self
    }
}

impl ImageDecoder for MemoryDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageDecodeError> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| ImageDecodeError::NotFound(path.to_path_buf()))
    }
}

/// One triangle whose bounds are exactly [-1, 1]^3
fn unit_mesh(material_index: usize) -> ParsedMesh {
    ParsedMesh {
        name: "unit".to_string(),
        positions: vec![[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 0.0]],
        indices: vec![0, 1, 2],
        material_index,
        ..Default::default()
    }
}

fn assert_vec_eq(actual: Vector3<f32>, expected: [f32; 3]) {
    for axis in 0..3 {
        assert!(
            (actual[axis] - expected[axis]).abs() < 1e-5,
            "{:?} != {:?}",
            actual,
            expected
        );
    }
}

fn scene_with(root: ParsedNode, meshes: Vec<ParsedMesh>, materials: Vec<ParsedMaterial>) -> ParsedScene {
    ParsedScene {
        root,
        meshes,
        materials,
        base_dir: PathBuf::from("assets"),
    }
}

#[test]
fn test_single_mesh_scene_bounds() {
    let parsed = scene_with(
        ParsedNode::new("root").with_meshes([0]),
        vec![unit_mesh(0)],
        vec![ParsedMaterial::new("plain")],
    );
    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend).build(&parsed).unwrap();

    assert_vec_eq(scene.aabb().lower, [-1.0, -1.0, -1.0]);
    assert_vec_eq(scene.aabb().upper, [1.0, 1.0, 1.0]);
    assert_eq!(scene.nodes().len(), 1);
    assert!(scene.node(0).unwrap().child_indices.is_empty());
}

#[test]
fn test_translated_child_bounds() {
    let child = ParsedNode::new("moved")
        .with_transform(Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0)))
        .with_meshes([0]);
    let parsed = scene_with(
        ParsedNode::new("root").with_child(child),
        vec![unit_mesh(0)],
        vec![ParsedMaterial::new("plain")],
    );
    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend).build(&parsed).unwrap();

    assert_vec_eq(scene.aabb().lower, [4.0, -1.0, -1.0]);
    assert_vec_eq(scene.aabb().upper, [6.0, 1.0, 1.0]);
    assert_eq!(scene.node(0).unwrap().child_indices, vec![1]);
}

#[test]
fn test_scene_bounds_are_union_of_occurrences() {
    // The same mesh instanced twice plus a rotated second mesh
    let root = ParsedNode::new("root")
        .with_transform(Matrix4::from_scale(2.0))
        .with_meshes([0])
        .with_child(
            ParsedNode::new("left")
                .with_transform(Matrix4::from_translation(Vector3::new(-3.0, 0.0, 0.0)))
                .with_meshes([0, 1])
                .with_child(
                    ParsedNode::new("spun")
                        .with_transform(Matrix4::from_angle_y(Deg(30.0)))
                        .with_meshes([1]),
                ),
        );
    let mut second = unit_mesh(0);
    second.positions = vec![[0.0, 0.0, 0.0], [0.5, 3.0, 0.0], [0.0, 0.0, 2.0]];
    let parsed = scene_with(root, vec![unit_mesh(0), second], vec![ParsedMaterial::new("plain")]);

    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend).build(&parsed).unwrap();

    let mut expected = Aabb::empty();
    scene
        .walk(Matrix4::identity(), |_, node, local| {
            for &mesh_index in &node.mesh_indices {
                expected = expected.union(&scene.mesh(mesh_index)?.aabb.transformed(local));
            }
            Ok(())
        })
        .unwrap();

    assert_vec_eq(scene.aabb().lower, expected.lower.into());
    assert_vec_eq(scene.aabb().upper, expected.upper.into());
}

#[test]
fn test_missing_diffuse_binds_white_default() {
    let parsed = scene_with(
        ParsedNode::new("root").with_meshes([0]),
        vec![unit_mesh(0)],
        vec![ParsedMaterial::new("untextured")],
    );
    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend).build(&parsed).unwrap();

    let material = scene.material(0).unwrap();
    let diffuse = TextureSlot::Diffuse.index();
    assert_eq!(diffuse, 1);
    assert_eq!(material.texture_indices[diffuse], WHITE_TEXTURE);
    // Identity of the bound resource, not its pixels
    let white = &scene.texture(WHITE_TEXTURE).unwrap().handle;
    assert_eq!(material.binding.texture_ids[diffuse], white.id);
}

#[test]
fn test_undeclared_slots_use_their_defaults() {
    let parsed = scene_with(
        ParsedNode::new("root").with_meshes([0]),
        vec![unit_mesh(0)],
        vec![ParsedMaterial::new("untextured")],
    );
    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend).build(&parsed).unwrap();

    let indices = scene.material(0).unwrap().texture_indices;
    assert_eq!(indices[TextureSlot::Ambient.index()], BLACK_TEXTURE);
    assert_eq!(indices[TextureSlot::Diffuse.index()], WHITE_TEXTURE);
    assert_eq!(indices[TextureSlot::Specular.index()], WHITE_TEXTURE);
    assert_eq!(indices[TextureSlot::Emissive.index()], BLACK_TEXTURE);
    assert_eq!(indices[TextureSlot::Normal.index()], FLAT_NORMAL_TEXTURE);

    let defaults: Vec<_> = scene.textures().iter().map(|t| t.source.clone()).collect();
    assert_eq!(defaults, vec![None, None, None]);
    let normal = &scene.texture(FLAT_NORMAL_TEXTURE).unwrap().handle;
    assert_eq!(normal.first_pixel, SceneConfig::default().default_normal);
}

#[test]
fn test_shared_texture_is_loaded_once() {
    let materials = vec![
        ParsedMaterial::new("wall").with_texture(TextureSlot::Diffuse, "brick.png"),
        ParsedMaterial::new("floor")
            .with_texture(TextureSlot::Diffuse, "./brick.png")
            .with_texture(TextureSlot::Normal, "brick_normal.png"),
    ];
    let mut floor_mesh = unit_mesh(1);
    floor_mesh.name = "floor".to_string();
    let parsed = scene_with(
        ParsedNode::new("root").with_meshes([0, 1]),
        vec![unit_mesh(0), floor_mesh],
        materials,
    );

    let decoder = MemoryDecoder::default()
        .with_image("assets/brick.png", [200, 40, 40, 255])
        .with_image("assets/brick_normal.png", [128, 128, 255, 255]);
    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend)
        .with_decoder(decoder)
        .build(&parsed)
        .unwrap();

    let diffuse = TextureSlot::Diffuse.index();
    let wall = scene.material(0).unwrap();
    let floor = scene.material(1).unwrap();
    assert_eq!(wall.texture_indices[diffuse], FIRST_FILE_TEXTURE);
    assert_eq!(floor.texture_indices[diffuse], FIRST_FILE_TEXTURE);
    assert_eq!(wall.binding.texture_ids[diffuse], floor.binding.texture_ids[diffuse]);
    assert_eq!(floor.texture_indices[TextureSlot::Normal.index()], FIRST_FILE_TEXTURE + 1);

    let files: Vec<_> = scene
        .textures()
        .iter()
        .filter_map(|t| t.source.clone())
        .collect();
    assert_eq!(files, vec![PathBuf::from("brick.png"), PathBuf::from("brick_normal.png")]);
    assert_eq!(scene.statistics().texture_count, 5);
}

#[test]
fn test_unloadable_texture_fails_the_load() {
    let parsed = scene_with(
        ParsedNode::new("root").with_meshes([0]),
        vec![unit_mesh(0)],
        vec![ParsedMaterial::new("broken").with_texture(TextureSlot::Specular, "missing.png")],
    );
    let backend = RecordingBackend::new();
    let result = SceneBuilder::new(&backend)
        .with_decoder(MemoryDecoder::default())
        .build(&parsed);

    match result {
        Err(SceneError::TextureDecode { path, .. }) => {
            assert_eq!(path, PathBuf::from("assets/missing.png"))
        }
        other => panic!("expected a texture decode error, got {:?}", other),
    }
}

#[test]
fn test_bounds_match_mesh_boxes() {
    let mut empty = unit_mesh(0);
    empty.positions.clear();
    empty.indices.clear();
    let parsed = scene_with(
        ParsedNode::new("root")
            .with_meshes([0, 1])
            .with_transform(Matrix4::from_translation(Vector3::new(0.0, 10.0, 0.0))),
        vec![unit_mesh(0), empty],
        vec![ParsedMaterial::new("plain")],
    );
    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend).build(&parsed).unwrap();

    assert_eq!(backend.bounds_dispatches(), 1);
    let bounds = scene.bounds().unwrap();
    assert_eq!(bounds.len(), 2);
    // Mesh-local boxes, the node transform is applied per draw
    assert_eq!(bounds[0].lower(), [-1.0, -1.0, -1.0]);
    assert_eq!(bounds[0].upper(), [1.0, 1.0, 1.0]);
    assert!(bounds[1].is_empty());

    // The empty mesh leaves the scene box alone
    assert_vec_eq(scene.aabb().lower, [-1.0, 9.0, -1.0]);
    assert_vec_eq(scene.aabb().upper, [1.0, 11.0, 1.0]);
}

#[test]
fn test_missing_compute_degrades_to_no_overlay() {
    let parsed = scene_with(
        ParsedNode::new("root").with_meshes([0]),
        vec![unit_mesh(0)],
        vec![ParsedMaterial::new("plain")],
    );
    let backend = RecordingBackend::without_compute();
    let scene = SceneBuilder::new(&backend).build(&parsed).unwrap();
    assert!(!scene.has_bounds());

    let mut recorder = CommandRecorder::new();
    let overlay = scene
        .record(&mut recorder, Matrix4::identity(), DrawMode::BoundingBox)
        .unwrap();
    assert_eq!(overlay.draws, 0);
    assert!(recorder.commands().is_empty());

    let meshes = scene
        .record(&mut recorder, Matrix4::identity(), DrawMode::Mesh)
        .unwrap();
    assert_eq!(meshes.draws, 1);
}

/// Recording backend whose bounds pass loses its last box
struct ShortReadbackBackend(RecordingBackend);

impl RenderBackend for ShortReadbackBackend {
    type MeshBuffers = RecordedMesh;
    type Texture = RecordedTexture;
    type MaterialBinding = RecordedMaterial;

    fn create_mesh_buffers(&self, label: &str, vertices: &[Vertex3D], indices: &[u32]) -> RecordedMesh {
        self.0.create_mesh_buffers(label, vertices, indices)
    }

    fn create_texture(&self, label: &str, image: &DecodedImage) -> RecordedTexture {
        self.0.create_texture(label, image)
    }

    fn create_material_binding(
        &self,
        label: &str,
        constants: &MaterialConstants,
        textures: [&RecordedTexture; TEXTURE_SLOT_COUNT],
    ) -> RecordedMaterial {
        self.0.create_material_binding(label, constants, textures)
    }

    fn compute_bounding_corners(
        &self,
        request: &BoundsRequest,
    ) -> Result<Vec<BoxCorners>, FeedbackError> {
        let mut boxes = self.0.compute_bounding_corners(request)?;
        boxes.pop();
        Ok(boxes)
    }
}

#[test]
fn test_short_bounds_readback_fails_the_load() {
    let parsed = scene_with(
        ParsedNode::new("root").with_meshes([0, 1]),
        vec![unit_mesh(0), unit_mesh(0)],
        vec![ParsedMaterial::new("plain")],
    );
    let backend = ShortReadbackBackend(RecordingBackend::new());
    let result = SceneBuilder::new(&backend).build(&parsed);
    assert!(matches!(
        result,
        Err(SceneError::Feedback(FeedbackError::SizeMismatch { expected: 2, actual: 1 }))
    ));
}

#[test]
fn test_bounds_pass_can_be_disabled() {
    let parsed = scene_with(
        ParsedNode::new("root").with_meshes([0]),
        vec![unit_mesh(0)],
        vec![ParsedMaterial::new("plain")],
    );
    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend)
        .with_config(SceneConfig::default().with_compute_bounds(false))
        .build(&parsed)
        .unwrap();

    assert!(!scene.has_bounds());
    assert_eq!(backend.bounds_dispatches(), 0);
}

#[test]
fn test_dangling_mesh_reference_is_rejected() {
    let parsed = scene_with(
        ParsedNode::new("root").with_child(ParsedNode::new("bad").with_meshes([3])),
        vec![unit_mesh(0)],
        vec![ParsedMaterial::new("plain")],
    );
    let backend = RecordingBackend::new();
    let result = SceneBuilder::new(&backend).build(&parsed);
    assert!(matches!(
        result,
        Err(SceneError::InvalidIndex {
            kind: IndexKind::Mesh,
            index: 3,
            len: 1
        })
    ));
}

#[test]
fn test_mesh_with_unknown_material_is_rejected() {
    let parsed = scene_with(
        ParsedNode::new("root").with_meshes([0]),
        vec![unit_mesh(2)],
        vec![ParsedMaterial::new("plain")],
    );
    let backend = RecordingBackend::new();
    let result = SceneBuilder::new(&backend).build(&parsed);
    assert!(matches!(
        result,
        Err(SceneError::InvalidIndex {
            kind: IndexKind::Material,
            index: 2,
            ..
        })
    ));
}

#[test]
fn test_quad_faces_are_rejected() {
    let mut quad = unit_mesh(0);
    quad.positions.push([-1.0, 1.0, 0.0]);
    quad.indices = vec![0, 1, 2, 3];
    quad.face_arities = vec![4];
    let parsed = scene_with(
        ParsedNode::new("root").with_meshes([0]),
        vec![quad],
        vec![ParsedMaterial::new("plain")],
    );
    let backend = RecordingBackend::new();
    let result = SceneBuilder::new(&backend).build(&parsed);
    assert!(matches!(
        result,
        Err(SceneError::NonTriangularFace {
            mesh: 0,
            face: 0,
            arity: 4
        })
    ));
}

#[test]
fn test_statistics_count_tables() {
    let parsed = scene_with(
        ParsedNode::new("root")
            .with_meshes([0])
            .with_child(ParsedNode::new("a").with_meshes([0])),
        vec![unit_mesh(0)],
        vec![ParsedMaterial::new("plain").with_texture(TextureSlot::Diffuse, "d.png")],
    );
    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend)
        .with_decoder(MemoryDecoder::default().with_image("assets/d.png", [1, 2, 3, 4]))
        .build(&parsed)
        .unwrap();

    let stats = scene.statistics();
    assert_eq!(stats.node_count, 2);
    assert_eq!(stats.mesh_count, 1);
    assert_eq!(stats.material_count, 1);
    assert_eq!(stats.texture_count, 4);
    assert_eq!(stats.vertex_count, 3);
    assert_eq!(stats.triangle_count, 1);
    assert!(stats.has_bounds);
}
