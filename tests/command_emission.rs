//! Command streams produced by scene traversal

use std::path::PathBuf;

use cairn::gfx::backend::{CommandRecorder, DrawMode, RecordedCommand, RecordingBackend};
use cairn::gfx::scene::Scene;
use cairn::import::{ParsedMaterial, ParsedMesh, ParsedNode, ParsedScene};
use cairn::{IndexKind, SceneBuilder, SceneError};
use cgmath::{Deg, Matrix4, Point3, SquareMatrix, Transform, Vector3};

fn triangle(name: &str, offset: f32, material_index: usize) -> ParsedMesh {
    ParsedMesh {
        name: name.to_string(),
        positions: vec![
            [offset, 0.0, 0.0],
            [offset + 1.0, 0.0, 0.0],
            [offset, 1.0, 0.5],
        ],
        indices: vec![0, 1, 2],
        material_index,
        ..Default::default()
    }
}

fn transforms() -> [Matrix4<f32>; 4] {
    [
        Matrix4::from_scale(0.5),
        Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0)),
        Matrix4::from_angle_z(Deg(90.0)),
        Matrix4::from_translation(Vector3::new(0.0, 0.0, -4.0)) * Matrix4::from_angle_x(Deg(45.0)),
    ]
}

/// root (mesh 0)
/// ├── a (meshes 1, 2)
/// │   └── c (mesh 0)
/// └── b (mesh 1)
fn build_tree(backend: &RecordingBackend) -> Scene<RecordingBackend> {
    let [t0, t1, t2, t3] = transforms();
    let root = ParsedNode::new("root")
        .with_transform(t0)
        .with_meshes([0])
        .with_child(
            ParsedNode::new("a")
                .with_transform(t1)
                .with_meshes([1, 2])
                .with_child(ParsedNode::new("c").with_transform(t3).with_meshes([0])),
        )
        .with_child(ParsedNode::new("b").with_transform(t2).with_meshes([1]));

    let parsed = ParsedScene {
        root,
        meshes: vec![
            triangle("first", 0.0, 0),
            triangle("second", 3.0, 1),
            triangle("third", -2.0, 0),
        ],
        materials: vec![ParsedMaterial::new("red"), ParsedMaterial::new("blue")],
        base_dir: PathBuf::new(),
    };
    SceneBuilder::new(backend).build(&parsed).unwrap()
}

fn assert_matrix_eq(actual: &Matrix4<f32>, expected: &Matrix4<f32>) {
    let actual: &[f32; 16] = actual.as_ref();
    let expected: &[f32; 16] = expected.as_ref();
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "{:?} != {:?}", actual, expected);
    }
}

#[test]
fn test_nodes_are_stored_in_pre_order() {
    let backend = RecordingBackend::new();
    let scene = build_tree(&backend);

    let names: Vec<_> = scene.nodes().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["root", "a", "c", "b"]);
    assert_eq!(scene.node(0).unwrap().child_indices, vec![1, 3]);
    assert_eq!(scene.node(1).unwrap().child_indices, vec![2]);
}

#[test]
fn test_draws_follow_node_and_mesh_order() {
    let backend = RecordingBackend::new();
    let scene = build_tree(&backend);

    let mut recorder = CommandRecorder::new();
    let stats = scene
        .record(&mut recorder, Matrix4::identity(), DrawMode::Mesh)
        .unwrap();
    assert_eq!(stats.nodes_visited, 4);
    assert_eq!(stats.draws, 5);

    let mesh_id = |index: usize| scene.mesh(index).unwrap().buffers.id;
    assert_eq!(
        recorder.drawn_meshes(),
        vec![mesh_id(0), mesh_id(1), mesh_id(2), mesh_id(0), mesh_id(1)]
    );
}

#[test]
fn test_each_draw_binds_material_then_transform() {
    let backend = RecordingBackend::new();
    let scene = build_tree(&backend);

    let mut recorder = CommandRecorder::new();
    scene
        .record(&mut recorder, Matrix4::identity(), DrawMode::Mesh)
        .unwrap();
    let commands = recorder.commands();

    assert_eq!(commands[0], RecordedCommand::SetDrawMode(DrawMode::Mesh));
    assert_eq!(commands.len(), 1 + 5 * 3);
    for draw in commands[1..].chunks(3) {
        assert!(matches!(draw[0], RecordedCommand::BindMaterial(_)));
        assert!(matches!(draw[1], RecordedCommand::SetTransform(_)));
        assert!(matches!(
            draw[2],
            RecordedCommand::DrawMesh {
                mode: DrawMode::Mesh,
                ..
            }
        ));
    }

    let red = scene.material(0).unwrap().binding.id;
    let blue = scene.material(1).unwrap().binding.id;
    let bound: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            RecordedCommand::BindMaterial(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(bound, vec![red, blue, red, red, blue]);
}

#[test]
fn test_transforms_accumulate_parent_first() {
    let backend = RecordingBackend::new();
    let scene = build_tree(&backend);
    let [t0, t1, t2, t3] = transforms();
    let view = Matrix4::from_translation(Vector3::new(0.0, 0.0, -10.0));

    let mut recorder = CommandRecorder::new();
    scene.record(&mut recorder, view, DrawMode::Mesh).unwrap();

    let expected = [
        view * t0,
        view * t0 * t1,
        view * t0 * t1,
        view * t0 * t1 * t3,
        view * t0 * t2,
    ];
    let recorded = recorder.transforms();
    assert_eq!(recorded.len(), expected.len());
    for (actual, expected) in recorded.iter().zip(&expected) {
        assert_matrix_eq(actual, expected);
    }
}

#[test]
fn test_child_transform_is_applied_in_parent_space() {
    let root = ParsedNode::new("root")
        .with_transform(Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0)))
        .with_child(
            ParsedNode::new("turn")
                .with_transform(Matrix4::from_angle_z(Deg(90.0)))
                .with_child(
                    ParsedNode::new("arm")
                        .with_transform(Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0)))
                        .with_meshes([0]),
                ),
        );
    let parsed = ParsedScene {
        root,
        meshes: vec![triangle("tip", 0.0, 0)],
        materials: vec![ParsedMaterial::new("plain")],
        base_dir: PathBuf::new(),
    };
    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend).build(&parsed).unwrap();

    let mut recorder = CommandRecorder::new();
    scene
        .record(&mut recorder, Matrix4::identity(), DrawMode::Mesh)
        .unwrap();
    let transform = recorder.transforms()[0];
    let origin = transform.transform_point(Point3::new(0.0, 0.0, 0.0));

    assert!((origin.x - 1.0).abs() < 1e-5);
    assert!((origin.y - 1.0).abs() < 1e-5);
    assert!(origin.z.abs() < 1e-5);
}

#[test]
fn test_bounding_box_mode_pushes_mesh_corners() {
    let backend = RecordingBackend::new();
    let scene = build_tree(&backend);
    let bounds = scene.bounds().unwrap().to_vec();

    let mut recorder = CommandRecorder::new();
    let stats = scene
        .record(&mut recorder, Matrix4::identity(), DrawMode::BoundingBox)
        .unwrap();
    assert_eq!(stats.draws, 5);

    let commands = recorder.commands();
    assert_eq!(commands[0], RecordedCommand::SetDrawMode(DrawMode::BoundingBox));
    assert_eq!(commands.len(), 1 + 5 * 4);

    let corners: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            RecordedCommand::SetBoundingCorners(corners) => Some(*corners),
            _ => None,
        })
        .collect();
    assert_eq!(
        corners,
        vec![bounds[0], bounds[1], bounds[2], bounds[0], bounds[1]]
    );
    assert!(commands.iter().all(|c| !matches!(
        c,
        RecordedCommand::DrawMesh {
            mode: DrawMode::Mesh,
            ..
        }
    )));
}

#[test]
fn test_bounding_box_mode_skips_meshes_without_vertices() {
    let parsed = ParsedScene {
        root: ParsedNode::new("root").with_meshes([0, 1, 0]),
        meshes: vec![triangle("solid", 0.0, 0), ParsedMesh::default()],
        materials: vec![ParsedMaterial::new("red")],
        base_dir: PathBuf::new(),
    };
    let backend = RecordingBackend::new();
    let scene = SceneBuilder::new(&backend).build(&parsed).unwrap();
    let solid = scene.mesh(0).unwrap().buffers.id;
    let empty = scene.mesh(1).unwrap().buffers.id;

    let mut recorder = CommandRecorder::new();
    let stats = scene
        .record(&mut recorder, Matrix4::identity(), DrawMode::BoundingBox)
        .unwrap();
    assert_eq!(stats.draws, 2);
    assert_eq!(recorder.drawn_meshes(), vec![solid, solid]);
    assert!(recorder
        .commands()
        .iter()
        .all(|c| !matches!(c, RecordedCommand::SetBoundingCorners(corners) if corners.is_empty())));

    // The mesh pass still visits the empty mesh in order
    recorder.clear();
    scene
        .record(&mut recorder, Matrix4::identity(), DrawMode::Mesh)
        .unwrap();
    assert_eq!(recorder.drawn_meshes(), vec![solid, empty, solid]);
}

#[test]
fn test_mesh_mode_never_pushes_corners() {
    let backend = RecordingBackend::new();
    let scene = build_tree(&backend);

    let mut recorder = CommandRecorder::new();
    scene
        .record(&mut recorder, Matrix4::identity(), DrawMode::Mesh)
        .unwrap();
    assert!(recorder
        .commands()
        .iter()
        .all(|c| !matches!(c, RecordedCommand::SetBoundingCorners(_))));
}

#[test]
fn test_emit_subtree_uses_caller_transform() {
    let backend = RecordingBackend::new();
    let scene = build_tree(&backend);
    let [_, _, _, t3] = transforms();
    let parent = Matrix4::from_translation(Vector3::new(7.0, 0.0, 0.0));

    // Node 2 is "c", a leaf holding mesh 0
    let mut recorder = CommandRecorder::new();
    let stats = scene
        .emit(&mut recorder, 2, parent, DrawMode::Mesh)
        .unwrap();

    assert_eq!(stats.nodes_visited, 1);
    assert_eq!(recorder.drawn_meshes(), vec![scene.mesh(0).unwrap().buffers.id]);
    assert_matrix_eq(&recorder.transforms()[0], &(parent * t3));
    assert!(!recorder
        .commands()
        .iter()
        .any(|c| matches!(c, RecordedCommand::SetDrawMode(_))));
}

#[test]
fn test_emit_rejects_unknown_node() {
    let backend = RecordingBackend::new();
    let scene = build_tree(&backend);

    let mut recorder = CommandRecorder::new();
    let result = scene.emit(&mut recorder, 42, Matrix4::identity(), DrawMode::Mesh);
    assert!(matches!(
        result,
        Err(SceneError::InvalidIndex {
            kind: IndexKind::Node,
            index: 42,
            len: 4
        })
    ));
}

#[test]
fn test_replaying_a_frame_is_deterministic() {
    let backend = RecordingBackend::new();
    let scene = build_tree(&backend);
    let view = Matrix4::from_angle_y(Deg(20.0));

    let mut first = CommandRecorder::new();
    scene.record(&mut first, view, DrawMode::Mesh).unwrap();
    let mut second = CommandRecorder::new();
    scene.record(&mut second, view, DrawMode::Mesh).unwrap();

    assert_eq!(first.commands(), second.commands());
}
